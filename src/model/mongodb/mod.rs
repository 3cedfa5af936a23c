mod bson;
mod collection;
mod counter;
pub mod errors;

pub use bson::Id;
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{candidate_seq_counter_id, ensure_candidate_counter_exists, Counter};
