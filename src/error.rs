use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::mongodb::Id;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shared by every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid ID number or password";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Invalid ID number or password")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("This voter has already cast their vote")]
    AlreadyVoted,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid candidate: no candidate with ID {0}")]
    InvalidCandidate(Id),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        Self::Forbidden(why.into())
    }

    /// Stable, caller-visible name of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) | Self::Internal(_) => ErrorKind::Internal,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::AlreadyVoted => ErrorKind::AlreadyVoted,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidCandidate(_) => ErrorKind::InvalidCandidate,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::Internal => Status::InternalServerError,
            ErrorKind::Unauthenticated | ErrorKind::InvalidCredentials => Status::Unauthorized,
            ErrorKind::Forbidden | ErrorKind::AlreadyVoted => Status::Forbidden,
            ErrorKind::NotFound | ErrorKind::InvalidCandidate => Status::NotFound,
            ErrorKind::InvalidArgument => Status::BadRequest,
            ErrorKind::Conflict => Status::Conflict,
        }
    }
}

/// The failure classes a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Internal,
    Unauthenticated,
    InvalidCredentials,
    Forbidden,
    AlreadyVoted,
    NotFound,
    InvalidCandidate,
    InvalidArgument,
    Conflict,
}

/// JSON body sent with every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let id = RequestId::of(req);
        let status = self.status();
        let message = match self.kind() {
            ErrorKind::Internal => {
                error!("req{id} failed internally: {self}");
                // Details stay in the log.
                "Internal server error".to_string()
            }
            _ => {
                warn!("req{id} refused: {self}");
                self.to_string()
            }
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (status, Json(body)).respond_to(req)
    }
}
