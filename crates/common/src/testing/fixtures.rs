//! Test fixture generators
//!
//! Provides functions to generate random test data.
//!
//! For deterministic tests, use the `*_seeded` variants with a fixed seed.

use rand::{Rng, SeedableRng};

/// Generate a random string of specified length
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_string_seeded`] instead.
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_string;
///
/// let s = random_string(10);
/// assert_eq!(s.len(), 10);
/// ```
pub fn random_string(len: usize) -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a random string of specified length with a seed (deterministic)
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_string_seeded;
///
/// let s1 = random_string_seeded(10, 42);
/// let s2 = random_string_seeded(10, 42);
/// assert_eq!(s1, s2); // Same seed produces same output
/// assert_eq!(s1.len(), 10);
/// ```
pub fn random_string_seeded(len: usize, seed: u64) -> String {
    use rand::distributions::Alphanumeric;

    let rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a random email address
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_email_seeded`] instead.
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_email;
///
/// let email = random_email();
/// assert!(email.contains('@'));
/// assert!(email.ends_with(".com"));
/// ```
#[must_use]
pub fn random_email() -> String {
    format!("{}@example.com", random_string(10))
}

/// Generate a random email address with a seed (deterministic)
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_email_seeded;
///
/// let email1 = random_email_seeded(42);
/// let email2 = random_email_seeded(42);
/// assert_eq!(email1, email2);
/// assert!(email1.contains('@'));
/// ```
#[must_use]
pub fn random_email_seeded(seed: u64) -> String {
    format!("{}@example.com", random_string_seeded(10, seed))
}

/// Generate a random u64
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_u64_seeded`] instead.
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_u64;
///
/// let num = random_u64();
/// assert!(num > 0);
/// ```
#[must_use]
pub fn random_u64() -> u64 {
    rand::thread_rng().gen()
}

/// Generate a random u64 with a seed (deterministic)
///
/// # Examples
///
/// ```
/// use pulsearc_common::testing::fixtures::random_u64_seeded;
///
/// let num1 = random_u64_seeded(42);
/// let num2 = random_u64_seeded(42);
/// assert_eq!(num1, num2);
/// ```
#[must_use]
pub fn random_u64_seeded(seed: u64) -> u64 {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.gen()
}

/// Generate a random u32
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_u32() -> u32 {
    rand::thread_rng().gen()
}

/// Generate a random u32 with a seed (deterministic)
#[must_use]
pub fn random_u32_seeded(seed: u64) -> u32 {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.gen()
}

/// Generate a random boolean
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_bool() -> bool {
    rand::thread_rng().gen()
}

/// Generate a random boolean with a seed (deterministic)
#[must_use]
pub fn random_bool_seeded(seed: u64) -> bool {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.gen()
}

/// Generate a random u64 in a range
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_u64_range_seeded`] instead.
#[must_use]
pub fn random_u64_range(min: u64, max: u64) -> u64 {
    rand::thread_rng().gen_range(min..max)
}

/// Generate a random u64 in a range with a seed (deterministic)
#[must_use]
pub fn random_u64_range_seeded(min: u64, max: u64, seed: u64) -> u64 {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.gen_range(min..max)
}

/// Generate a random alphanumeric string
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    random_string(len)
}

/// Generate a random numeric string
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_numeric(len: usize) -> String {
    (0..len).map(|_| rand::thread_rng().gen_range(0..10).to_string()).collect()
}

/// Generate a random numeric string with a seed (deterministic)
#[must_use]
pub fn random_numeric_seeded(len: usize, seed: u64) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..10).to_string()).collect()
}

/// Generate a random hex string
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_hex(len: usize) -> String {
    (0..len).map(|_| format!("{:x}", rand::thread_rng().gen_range(0..16))).collect()
}

/// Generate a random hex string with a seed (deterministic)
#[must_use]
pub fn random_hex_seeded(len: usize, seed: u64) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len).map(|_| format!("{:x}", rng.gen_range(0..16))).collect()
}

/// Generate random bytes
///
/// **Note:** This uses a non-deterministic RNG.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|_| rand::thread_rng().gen()).collect()
}

/// Generate random bytes with a seed (deterministic)
#[must_use]
pub fn random_bytes_seeded(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}
