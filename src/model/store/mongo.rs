//! MongoDB-backed [`BallotBox`].
//!
//! Recording a vote is a multi-document transaction, so the server must be
//! talking to a replica set.

use log::{debug, warn};
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Client, ClientSession, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::IdNumber,
    db::{Candidate, CandidateUpdate, NewCandidate, NewVoter, Voter},
    mongodb::{
        candidate_seq_counter_id,
        errors::{is_duplicate_key_error, is_transient_transaction_error, is_unknown_commit_result},
        Coll, Counter, Id,
    },
};

use super::{BallotBox, CandidateStore, CredentialStore, Deletion, VoteOutcome};

/// How many times a vote transaction is attempted before giving up.
const MAX_TRANSACTION_ATTEMPTS: usize = 5;

pub struct MongoStore {
    client: Client,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    counters: Coll<Counter>,
}

fn id_number_filter(id_number: &IdNumber) -> Document {
    doc! { "id_number": id_number.as_str() }
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        Self {
            client,
            voters: Coll::from_db(&db),
            candidates: Coll::from_db(&db),
            counters: Coll::from_db(&db),
        }
    }

    /// The body of the vote transaction. Does not commit or abort.
    async fn record_vote_with_session(
        &self,
        voter: &IdNumber,
        candidate: Id,
        session: &mut ClientSession,
    ) -> Result<VoteOutcome> {
        // Flip the flag only if it is currently false; this write also locks
        // the voter document against concurrent transactions.
        let not_yet_voted = doc! {
            "id_number": voter.as_str(),
            "has_voted": false,
        };
        let mark_voted = doc! {
            "$set": { "has_voted": true }
        };
        let marked = self
            .voters
            .update_one_with_session(not_yet_voted, mark_voted, None, session)
            .await?;
        if marked.matched_count == 0 {
            let exists = self
                .voters
                .find_one_with_session(id_number_filter(voter), None, session)
                .await?
                .is_some();
            return Ok(if exists {
                VoteOutcome::AlreadyVoted
            } else {
                VoteOutcome::NoSuchVoter
            });
        }

        let increment = doc! {
            "$inc": { "vote_count": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let counted = self
            .candidates
            .find_one_and_update_with_session(candidate.as_doc(), increment, options, session)
            .await?;
        Ok(match counted {
            Some(candidate) => VoteOutcome::Recorded(candidate),
            None => VoteOutcome::NoSuchCandidate,
        })
    }

    /// Commit, retrying while the outcome of the commit is unknown.
    async fn commit(session: &mut ClientSession) -> std::result::Result<(), mongodb::error::Error> {
        loop {
            match session.commit_transaction().await {
                Err(e) if is_unknown_commit_result(&e) => {
                    debug!("Retrying commit with unknown result: {e}");
                }
                result => return result,
            }
        }
    }
}

#[rocket::async_trait]
impl CredentialStore for MongoStore {
    async fn insert_voter(&self, voter: NewVoter) -> Result<Voter> {
        let voter = Voter {
            id: Id::new(),
            voter,
        };
        match self.voters.insert_one(&voter, None).await {
            Ok(_) => Ok(voter),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::Conflict(format!(
                "A voter with ID number {} is already registered",
                voter.id_number
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn voter(&self, id_number: &IdNumber) -> Result<Option<Voter>> {
        Ok(self
            .voters
            .find_one(id_number_filter(id_number), None)
            .await?)
    }

    async fn set_password_hash(
        &self,
        id_number: &IdNumber,
        password_hash: String,
    ) -> Result<bool> {
        let update = doc! {
            "$set": { "password_hash": password_hash }
        };
        let result = self
            .voters
            .update_one(id_number_filter(id_number), update, None)
            .await?;
        Ok(result.matched_count == 1)
    }
}

#[rocket::async_trait]
impl CandidateStore for MongoStore {
    async fn insert_candidate(&self, name: String, party: String) -> Result<Candidate> {
        let seq = Counter::next(&self.counters, candidate_seq_counter_id()).await?;
        let candidate = Candidate {
            id: Id::new(),
            candidate: NewCandidate::new(name, party, seq),
        };
        self.candidates.insert_one(&candidate, None).await?;
        Ok(candidate)
    }

    async fn candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(id.as_doc(), None).await?)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        let options = FindOptions::builder().sort(doc! { "seq": 1 }).build();
        let candidates = self
            .candidates
            .find(None, options)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        Ok(candidates)
    }

    async fn update_candidate(
        &self,
        id: Id,
        update: &CandidateUpdate,
    ) -> Result<Option<Candidate>> {
        let mut set = Document::new();
        if let Some(name) = &update.name {
            set.insert("name", name.as_str());
        }
        if let Some(party) = &update.party {
            set.insert("party", party.as_str());
        }
        if set.is_empty() {
            return self.candidate(id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .candidates
            .find_one_and_update(id.as_doc(), doc! { "$set": set }, options)
            .await?)
    }

    async fn delete_candidate(&self, id: Id) -> Result<Deletion> {
        let without_votes = doc! {
            "_id": *id,
            "vote_count": 0,
        };
        let result = self.candidates.delete_one(without_votes, None).await?;
        if result.deleted_count == 1 {
            return Ok(Deletion::Deleted);
        }
        Ok(match self.candidate(id).await? {
            Some(_) => Deletion::HasVotes,
            None => Deletion::NotFound,
        })
    }
}

#[rocket::async_trait]
impl BallotBox for MongoStore {
    async fn record_vote(&self, voter: &IdNumber, candidate: Id) -> Result<VoteOutcome> {
        let mut attempt = 1;
        loop {
            let mut session = self.client.start_session(None).await?;
            session.start_transaction(None).await?;

            let result = match self
                .record_vote_with_session(voter, candidate, &mut session)
                .await
            {
                Ok(VoteOutcome::Recorded(counted)) => Self::commit(&mut session)
                    .await
                    .map(|_| VoteOutcome::Recorded(counted))
                    .map_err(Error::from),
                Ok(refused) => {
                    session.abort_transaction().await?;
                    return Ok(refused);
                }
                Err(e) => Err(e),
            };

            match result {
                Err(Error::Db(e))
                    if is_transient_transaction_error(&e) && attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    // Usually a concurrent vote by the same voter; the retry
                    // will see the flag that vote set.
                    warn!("Retrying vote transaction (attempt {attempt}): {e}");
                    attempt += 1;
                }
                // Dropping the session aborts any transaction still open.
                result => return result,
            }
        }
    }
}
