use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{Candidate, Voter};

use super::counter::Counter;

/// A document type with a fixed home collection.
pub trait MongoCollection {
    const NAME: &'static str;
}

/// A typed handle on the collection that stores `T`.
pub struct Coll<T>(Collection<T>);

impl<T: MongoCollection> Coll<T> {
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// Handles clone cheaply whether or not `T` does.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Bind each stored type to the collection holding it.
macro_rules! collections {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl MongoCollection for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}

collections! {
    Voter => "voters",
    Candidate => "candidates",
    Counter => "counters",
}

/// Create the indexes the stores rely on, if they are missing.
///
/// The unique `id_number` index is what makes duplicate registration fail
/// even when two requests race.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring voter and candidate indexes exist");

    let unique = IndexOptions::builder().unique(true).build();
    let voter_index = IndexModel::builder()
        .keys(doc! {"id_number": 1})
        .options(unique)
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_index, None)
        .await?;

    let candidate_index = IndexModel::builder()
        .keys(doc! {"seq": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    Ok(())
}
