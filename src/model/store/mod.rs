//! Persistence for voters and candidates.
//!
//! The core operations only talk to the [`BallotBox`] trait. Two backends
//! implement it: [`MongoStore`] for deployments and [`MemoryStore`] for
//! development and tests. Whatever the backend, [`BallotBox::record_vote`]
//! must set a voter's `has_voted` flag and increment exactly one candidate's
//! counter as a single atomic unit.

use std::ops::Deref;
use std::sync::Arc;

use mongodb::{Client, Database};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::{
    common::IdNumber,
    db::{Candidate, CandidateUpdate, NewVoter, Voter},
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Persists voter identities.
#[rocket::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new voter. Fails with `Conflict` if the ID number is taken.
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter>;

    /// Look up a voter by ID number.
    async fn voter(&self, id_number: &IdNumber) -> Result<Option<Voter>>;

    /// Replace a voter's password hash. Returns false if there is no such voter.
    async fn set_password_hash(&self, id_number: &IdNumber, password_hash: String)
        -> Result<bool>;
}

/// Persists the candidate roster.
#[rocket::async_trait]
pub trait CandidateStore: Send + Sync {
    /// Insert a new candidate with no votes, at the end of the insertion order.
    async fn insert_candidate(&self, name: String, party: String) -> Result<Candidate>;

    /// Look up a candidate by ID.
    async fn candidate(&self, id: Id) -> Result<Option<Candidate>>;

    /// All candidates, in insertion order.
    async fn candidates(&self) -> Result<Vec<Candidate>>;

    /// Apply an update to a candidate's descriptive fields, returning the
    /// updated candidate, or `None` if there is no such candidate.
    async fn update_candidate(&self, id: Id, update: &CandidateUpdate)
        -> Result<Option<Candidate>>;

    /// Delete a candidate that has not received any votes.
    async fn delete_candidate(&self, id: Id) -> Result<Deletion>;
}

/// What happened to a deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    NotFound,
    /// The candidate has votes; removing them would lose counted ballots.
    HasVotes,
}

/// What happened to an attempt to record a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was counted; holds the candidate as it stands afterwards.
    Recorded(Candidate),
    NoSuchVoter,
    AlreadyVoted,
    NoSuchCandidate,
}

/// Both stores, plus the one operation that must touch them together.
#[rocket::async_trait]
pub trait BallotBox: CredentialStore + CandidateStore {
    /// Atomically mark the voter as having voted and increment the
    /// candidate's counter.
    ///
    /// Checks run in order: voter exists, voter has not voted, candidate
    /// exists. Any outcome other than [`VoteOutcome::Recorded`] leaves every
    /// voter and candidate unchanged. Concurrent calls for the same voter
    /// are serialised, so at most one of them is ever recorded.
    async fn record_vote(&self, voter: &IdNumber, candidate: Id) -> Result<VoteOutcome>;
}

/// A shareable handle on whichever [`BallotBox`] the server is using.
#[derive(Clone)]
pub struct Store(Arc<dyn BallotBox>);

impl Store {
    pub fn new(backend: impl BallotBox + 'static) -> Self {
        Self(Arc::new(backend))
    }

    /// A fresh, empty, volatile store.
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// A store backed by the given MongoDB database.
    pub fn mongo(client: Client, db: Database) -> Self {
        Self::new(MongoStore::new(client, db))
    }
}

impl Deref for Store {
    type Target = dyn BallotBox;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        req.guard::<&State<Store>>()
            .await
            .map(|store| store.inner().clone())
    }
}
