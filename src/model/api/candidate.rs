use serde::{Deserialize, Serialize};

use crate::model::db::Candidate;

/// Candidate fields submitted by the administrator, for both creation and
/// partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRequest {
    pub name: Option<String>,
    pub party: Option<String>,
}

/// A candidate as listed to voters: no tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: String,
    pub name: String,
    pub party: String,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.to_hex(),
            name: candidate.candidate.name,
            party: candidate.candidate.party,
        }
    }
}

/// A candidate together with their current tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub id: String,
    pub name: String,
    pub party: String,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateTally {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.to_hex(),
            name: candidate.candidate.name,
            party: candidate.candidate.party,
            vote_count: candidate.candidate.vote_count,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateRequest {
        pub fn example(name: &str, party: &str) -> Self {
            Self {
                name: Some(name.into()),
                party: Some(party.into()),
            }
        }
    }
}
