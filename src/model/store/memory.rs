//! In-memory [`BallotBox`].
//!
//! Nothing survives a restart. Each voter record has its own mutex, held
//! from the `has_voted` check through the flag write, so votes by different
//! voters never wait on one another. Candidate counters are atomics read
//! under a shared lock; only roster edits take the exclusive lock.

use std::collections::{hash_map::Entry, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::model::{
    common::IdNumber,
    db::{Candidate, CandidateCore, CandidateUpdate, NewVoter, Voter},
    mongodb::Id,
};

use super::{BallotBox, CandidateStore, CredentialStore, Deletion, VoteOutcome};

/// A candidate whose counter can be bumped under a shared lock.
#[derive(Debug)]
struct CandidateEntry {
    name: String,
    party: String,
    vote_count: AtomicU64,
    seq: u64,
}

impl CandidateEntry {
    fn snapshot(&self, id: Id) -> Candidate {
        Candidate {
            id,
            candidate: CandidateCore {
                name: self.name.clone(),
                party: self.party.clone(),
                vote_count: self.vote_count.load(Ordering::SeqCst),
                seq: self.seq,
            },
        }
    }
}

#[derive(Debug, Default)]
struct Roster {
    candidates: HashMap<Id, CandidateEntry>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    voters: RwLock<HashMap<IdNumber, Arc<Mutex<Voter>>>>,
    roster: RwLock<Roster>,
}

// No code panics while holding these locks, so a poisoned lock still guards
// consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding one voter's record, if they exist.
    fn voter_slot(&self, id_number: &IdNumber) -> Option<Arc<Mutex<Voter>>> {
        read(&self.voters).get(id_number).cloned()
    }
}

#[rocket::async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter> {
        let mut voters = write(&self.voters);
        match voters.entry(voter.id_number.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "A voter with ID number {} is already registered",
                voter.id_number
            ))),
            Entry::Vacant(slot) => {
                let voter = Voter {
                    id: Id::new(),
                    voter,
                };
                slot.insert(Arc::new(Mutex::new(voter.clone())));
                Ok(voter)
            }
        }
    }

    async fn voter(&self, id_number: &IdNumber) -> Result<Option<Voter>> {
        let Some(slot) = self.voter_slot(id_number) else {
            return Ok(None);
        };
        let voter = lock(&slot).clone();
        Ok(Some(voter))
    }

    async fn set_password_hash(
        &self,
        id_number: &IdNumber,
        password_hash: String,
    ) -> Result<bool> {
        Ok(match self.voter_slot(id_number) {
            Some(slot) => {
                lock(&slot).password_hash = password_hash;
                true
            }
            None => false,
        })
    }
}

#[rocket::async_trait]
impl CandidateStore for MemoryStore {
    async fn insert_candidate(&self, name: String, party: String) -> Result<Candidate> {
        let mut roster = write(&self.roster);
        let id = Id::new();
        let seq = roster.next_seq;
        roster.next_seq += 1;
        let entry = CandidateEntry {
            name,
            party,
            vote_count: AtomicU64::new(0),
            seq,
        };
        let candidate = entry.snapshot(id);
        roster.candidates.insert(id, entry);
        Ok(candidate)
    }

    async fn candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(read(&self.roster)
            .candidates
            .get(&id)
            .map(|entry| entry.snapshot(id)))
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        let mut candidates = read(&self.roster)
            .candidates
            .iter()
            .map(|(id, entry)| entry.snapshot(*id))
            .collect::<Vec<_>>();
        candidates.sort_by_key(|c| c.seq);
        Ok(candidates)
    }

    async fn update_candidate(
        &self,
        id: Id,
        update: &CandidateUpdate,
    ) -> Result<Option<Candidate>> {
        let mut roster = write(&self.roster);
        Ok(roster.candidates.get_mut(&id).map(|entry| {
            if let Some(name) = &update.name {
                entry.name = name.clone();
            }
            if let Some(party) = &update.party {
                entry.party = party.clone();
            }
            entry.snapshot(id)
        }))
    }

    async fn delete_candidate(&self, id: Id) -> Result<Deletion> {
        let mut roster = write(&self.roster);
        let outcome = match roster.candidates.get(&id) {
            None => Deletion::NotFound,
            Some(entry) if entry.vote_count.load(Ordering::SeqCst) > 0 => Deletion::HasVotes,
            Some(_) => Deletion::Deleted,
        };
        if outcome == Deletion::Deleted {
            roster.candidates.remove(&id);
        }
        Ok(outcome)
    }
}

#[rocket::async_trait]
impl BallotBox for MemoryStore {
    async fn record_vote(&self, voter: &IdNumber, candidate: Id) -> Result<VoteOutcome> {
        let Some(slot) = self.voter_slot(voter) else {
            return Ok(VoteOutcome::NoSuchVoter);
        };

        // Held until the flag is written: this is what serialises duplicate votes.
        let mut voter = lock(&slot);
        if voter.has_voted {
            return Ok(VoteOutcome::AlreadyVoted);
        }

        // A shared lock is enough to bump a counter, and it keeps the
        // candidate from being deleted underneath us.
        let roster = read(&self.roster);
        let Some(entry) = roster.candidates.get(&candidate) else {
            return Ok(VoteOutcome::NoSuchCandidate);
        };
        let vote_count = entry.vote_count.fetch_add(1, Ordering::SeqCst) + 1;
        voter.has_voted = true;

        let mut recorded = entry.snapshot(candidate);
        recorded.vote_count = vote_count;
        Ok(VoteOutcome::Recorded(recorded))
    }
}
