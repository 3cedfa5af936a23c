mod request;
mod token;
mod user;

pub use request::{LoginRequest, LoginResponse, PasswordChangeRequest, RegisterRequest};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::Role;
