use log::debug;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{Coll, Id};

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: Id,
    pub next: u64,
}

/// ID of the counter that numbers candidates in insertion order.
pub fn candidate_seq_counter_id() -> Id {
    ObjectId::from_bytes(*b"candidateseq").into()
}

impl Counter {
    /// Atomically retrieve the next value of the counter with the given ID.
    ///
    /// A missing counter is created on first use and yields zero.
    pub async fn next(counters: &Coll<Counter>, id: Id) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .upsert(true)
            .build();
        let counter = counters
            .find_one_and_update(id.as_doc(), update, options)
            .await?;
        Ok(counter.map_or(0, |c| c.next))
    }
}

/// Ensure the candidate sequence counter exists, so that concurrent first
/// uses never race to upsert it.
///
/// This operation is idempotent.
pub async fn ensure_candidate_counter_exists(counters: &Coll<Counter>) -> Result<()> {
    debug!("Ensuring candidate sequence counter exists");
    let id = candidate_seq_counter_id();
    let update = doc! {
        "$setOnInsert": { "next": 0_i64 }
    };
    let options = UpdateOptions::builder().upsert(true).build();
    counters.update_one(id.as_doc(), update, options).await?;
    Ok(())
}

