//! Concrete `AcademicProfileFetcher` (C4): fetches a student's academic
//! record through an authenticated portal session.

use std::sync::Arc;

use async_trait::async_trait;
use pulsearc_core::ports::{AcademicData, AcademicProfileFetcher, PortalSession};
use pulsearc_domain::{SyncError, SyncResult};
use serde::Deserialize;
use tracing::instrument;

/// Paged envelope shape returned by the portal's profile endpoint. Only
/// `content` is consumed; other envelope fields (paging metadata) are
/// ignored for forward compatibility.
#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    content: Vec<AcademicData>,
}

pub struct PortalAcademicProfileFetcher {
    session: Arc<dyn PortalSession>,
}

impl PortalAcademicProfileFetcher {
    #[must_use]
    pub fn new(session: Arc<dyn PortalSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl AcademicProfileFetcher for PortalAcademicProfileFetcher {
    #[instrument(skip(self))]
    async fn get_academic_data(&self, portal_id: &str) -> SyncResult<Option<AcademicData>> {
        let path = format!("/AOnline/apix/api/rest/alunos/user/{portal_id}");
        let body = self.session.authed_get(&path).await.map_err(|err| {
            SyncError::Auth(format!("failed to fetch academic profile for {portal_id}: {err}"))
        })?;

        let envelope: ProfileEnvelope = serde_json::from_str(&body)
            .map_err(|err| SyncError::Auth(format!("invalid academic profile response: {err}")))?;

        Ok(envelope.content.into_iter().next())
    }
}
