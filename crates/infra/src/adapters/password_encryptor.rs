//! Concrete `PasswordEncryptor` (C2): RSA PKCS#1 v1.5-encrypts a plaintext
//! password under the cached portal public key, base64-encoded.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use pulsearc_core::ports::{PasswordEncryptor, PublicKeyCache};
use pulsearc_domain::{SyncError, SyncResult};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use tracing::instrument;

/// Encrypts passwords under the key served by a [`PublicKeyCache`].
pub struct RsaPasswordEncryptor {
    public_keys: Arc<dyn PublicKeyCache>,
}

impl RsaPasswordEncryptor {
    #[must_use]
    pub fn new(public_keys: Arc<dyn PublicKeyCache>) -> Self {
        Self { public_keys }
    }
}

#[async_trait]
impl PasswordEncryptor for RsaPasswordEncryptor {
    #[instrument(skip(self, plaintext))]
    async fn encrypt_password(&self, plaintext: &str) -> SyncResult<String> {
        let pem = self.public_keys.get_public_key().await?;
        let pem_str = std::str::from_utf8(&pem)
            .map_err(|err| SyncError::Crypto(format!("public key is not valid UTF-8: {err}")))?;

        let public_key = RsaPublicKey::from_public_key_pem(pem_str)
            .map_err(|err| SyncError::Crypto(format!("invalid public key PEM: {err}")))?;

        let mut rng = rand::thread_rng();
        let ciphertext = public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext.as_bytes())
            .map_err(|err| SyncError::Crypto(format!("RSA encryption failed: {err}")))?;

        Ok(BASE64_STANDARD.encode(ciphertext))
    }
}
