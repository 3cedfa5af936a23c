//! Casting votes.
//!
//! A voter may vote exactly once. The check that they have not voted yet,
//! the increment of the candidate's counter, and the setting of their
//! `has_voted` flag happen as one atomic step inside the store
//! ([`BallotBox::record_vote`]); this module only decides who may call it and
//! how its outcome is reported.

use log::{info, warn};

use crate::authenticator::Identity;
use crate::error::{Error, Result};
use crate::model::{db::Candidate, mongodb::Id, store::BallotBox, store::VoteOutcome};

/// Cast the caller's single vote for the candidate with the given ID.
///
/// The administrator is always refused, before the candidate ID is even
/// looked at. On success, returns the candidate with their updated tally.
pub async fn cast_vote<S>(store: &S, identity: &Identity, candidate_id: &str) -> Result<Candidate>
where
    S: BallotBox + ?Sized,
{
    let voter = match identity {
        Identity::Admin => {
            warn!("Refused a vote from the administrator");
            return Err(Error::forbidden("The administrator cannot vote"));
        }
        Identity::Voter(voter) => voter,
    };
    let candidate_id: Id = candidate_id.parse()?;

    match store.record_vote(&voter.id_number, candidate_id).await? {
        VoteOutcome::Recorded(candidate) => {
            info!(
                "Voter {} voted for candidate {} ({})",
                voter.id, candidate.id, candidate.name
            );
            Ok(candidate)
        }
        VoteOutcome::NoSuchVoter => Err(Error::not_found(format!("Voter {}", voter.id))),
        VoteOutcome::AlreadyVoted => Err(Error::AlreadyVoted),
        VoteOutcome::NoSuchCandidate => Err(Error::InvalidCandidate(candidate_id)),
    }
}
