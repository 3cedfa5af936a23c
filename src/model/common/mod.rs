//! Types shared between the API, the database model and the core operations.

mod id_number;
pub use id_number::{IdNumber, ID_NUMBER_LENGTH};

mod password;
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
