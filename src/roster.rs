//! Managing and reporting on the candidate roster.
//!
//! Only the administrator may change the roster. Nothing here ever touches a
//! vote counter other than to start it at zero.

use log::info;

use crate::authenticator::Identity;
use crate::error::{Error, Result};
use crate::model::{
    api::candidate::CandidateRequest,
    db::{Candidate, CandidateUpdate},
    mongodb::Id,
    store::{BallotBox, Deletion},
};

/// Trim a field, treating blanks as absent.
fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Add a new candidate with no votes.
pub async fn create_candidate<S>(
    store: &S,
    identity: &Identity,
    request: CandidateRequest,
) -> Result<Candidate>
where
    S: BallotBox + ?Sized,
{
    identity.require_admin()?;
    let name = clean(request.name)
        .ok_or_else(|| Error::InvalidArgument("Candidate name is required".to_string()))?;
    let party = clean(request.party)
        .ok_or_else(|| Error::InvalidArgument("Candidate party is required".to_string()))?;

    let candidate = store.insert_candidate(name, party).await?;
    info!(
        "Created candidate {} ({}, {})",
        candidate.id, candidate.name, candidate.party
    );
    Ok(candidate)
}

/// Change a candidate's name and/or party. Absent or blank fields are left alone.
pub async fn update_candidate<S>(
    store: &S,
    identity: &Identity,
    id: &str,
    request: CandidateRequest,
) -> Result<Candidate>
where
    S: BallotBox + ?Sized,
{
    identity.require_admin()?;
    let id: Id = id.parse()?;
    let update = CandidateUpdate {
        name: clean(request.name),
        party: clean(request.party),
    };

    let candidate = store
        .update_candidate(id, &update)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;
    if !update.is_empty() {
        info!(
            "Updated candidate {} to ({}, {})",
            candidate.id, candidate.name, candidate.party
        );
    }
    Ok(candidate)
}

/// Remove a candidate from the roster.
///
/// A candidate who has received votes cannot be removed, since that would
/// discard counted ballots.
pub async fn delete_candidate<S>(store: &S, identity: &Identity, id: &str) -> Result<()>
where
    S: BallotBox + ?Sized,
{
    identity.require_admin()?;
    let id: Id = id.parse()?;

    match store.delete_candidate(id).await? {
        Deletion::Deleted => {
            info!("Deleted candidate {id}");
            Ok(())
        }
        Deletion::NotFound => Err(Error::not_found(format!("Candidate {id}"))),
        Deletion::HasVotes => Err(Error::Conflict(format!(
            "Candidate {id} has already received votes"
        ))),
    }
}

/// Every candidate, in insertion order. Open to any authenticated caller.
pub async fn list_candidates<S>(store: &S, _identity: &Identity) -> Result<Vec<Candidate>>
where
    S: BallotBox + ?Sized,
{
    store.candidates().await
}

/// Every candidate with their tally, most votes first. Candidates with equal
/// tallies stay in insertion order.
pub async fn results<S>(store: &S, _identity: &Identity) -> Result<Vec<Candidate>>
where
    S: BallotBox + ?Sized,
{
    let mut candidates = store.candidates().await?;
    // `sort_by` is stable, so insertion order survives among ties.
    candidates.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
    Ok(candidates)
}
