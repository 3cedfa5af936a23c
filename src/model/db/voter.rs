use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::IdNumber, mongodb::Id};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Voter unique key.
    pub id_number: IdNumber,
    /// Encoded Argon2 hash; the plaintext password is never stored.
    pub password_hash: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Set exactly once, by a successful vote.
    #[serde(default)]
    pub has_voted: bool,
}

impl VoterCore {
    /// A voter who has not voted yet.
    pub fn new(id_number: IdNumber, password_hash: String, profile: Profile) -> Self {
        Self {
            id_number,
            password_hash,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            has_voted: false,
        }
    }
}

/// Optional, normalised profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    /// Trim every field, lowercase the email, and drop blanks.
    pub fn normalised(name: Option<String>, email: Option<String>, phone: Option<String>) -> Self {
        fn clean(s: Option<String>) -> Option<String> {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            name: clean(name),
            email: clean(email).map(|e| e.to_lowercase()),
            phone: clean(phone),
        }
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}


#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_normalisation() {
        let profile = Profile::normalised(
            Some("  Asha  ".into()),
            Some(" Asha@Example.ORG ".into()),
            Some("   ".into()),
        );
        assert_eq!(profile.name.as_deref(), Some("Asha"));
        assert_eq!(profile.email.as_deref(), Some("asha@example.org"));
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn new_voters_have_not_voted() {
        let voter = VoterCore::example();
        assert!(!voter.has_voted);
        assert_eq!(voter.phone.as_deref(), Some("555 0100"));
    }
}
