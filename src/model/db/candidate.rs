use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub party: String,
    /// Only ever incremented, and only by a recorded vote.
    pub vote_count: u64,
    /// Position in insertion order; ties in the results are broken by this.
    pub seq: u64,
}

impl CandidateCore {
    pub fn new(name: String, party: String, seq: u64) -> Self {
        Self {
            name,
            party,
            vote_count: 0,
            seq,
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// A partial update to a candidate's descriptive fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub party: Option<String>,
}

impl CandidateUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.party.is_none()
    }
}

