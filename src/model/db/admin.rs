use rand::{distributions::Alphanumeric, Rng};

use crate::error::Result;
use crate::model::common::{hash_password, IdNumber};

/// The single administrator identity.
///
/// Built once from configuration when the server ignites and held in managed
/// state; it is never written to a store and never changes at runtime.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    pub id_number: IdNumber,
    password_hash: String,
    /// Hash of a random password nobody knows, checked in place of a real
    /// hash when a login names no known identity.
    decoy_hash: String,
}

impl AdminCredential {
    /// Hash the configured plaintext password.
    pub fn new(id_number: IdNumber, password: &str) -> Result<Self> {
        let decoy: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Ok(Self {
            id_number,
            password_hash: hash_password(password)?,
            decoy_hash: hash_password(&decoy)?,
        })
    }

    /// Does this identity token name the administrator?
    pub fn is_admin(&self, id_number: &str) -> bool {
        self.id_number.as_str() == id_number
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}


#[cfg(test)]
pub use examples::ADMIN_EXAMPLE_PASSWORD;
