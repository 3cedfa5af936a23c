use argon2::Config;
use log::error;
use rand::Rng;
use rocket::tokio::task;

use crate::error::{Error, Result};

/// Hash a plaintext password into an encoded Argon2 string.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?;
    Ok(hash)
}

/// Check a plaintext password against an encoded Argon2 hash.
///
/// The digest comparison inside `argon2::verify_encoded` is constant-time.
/// A malformed hash never verifies.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    match argon2::verify_encoded(password_hash, password.as_bytes()) {
        Ok(matches) => matches,
        Err(e) => {
            error!("Stored password hash is unusable: {e}");
            false
        }
    }
}

/// [`hash_password`] on the blocking thread pool, off the async workers.
pub async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing did not complete: {e}")))?
}

/// [`verify_password`] on the blocking thread pool, off the async workers.
pub async fn verify_password_blocking(password_hash: &str, password: &str) -> bool {
    let (password_hash, password) = (password_hash.to_owned(), password.to_owned());
    match task::spawn_blocking(move || verify_password(&password_hash, &password)).await {
        Ok(matches) => matches,
        Err(e) => {
            error!("Password check did not complete: {e}");
            false
        }
    }
}
