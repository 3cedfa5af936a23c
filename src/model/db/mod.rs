//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are serialised in MongoDB's own format.
//! - Field names are snake_case.

pub mod admin;
pub use admin::AdminCredential;

pub mod candidate;
pub use candidate::{Candidate, CandidateCore, CandidateUpdate, NewCandidate};

pub mod voter;
pub use voter::{NewVoter, Profile, Voter, VoterCore};
