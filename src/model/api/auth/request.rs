use serde::{Deserialize, Serialize};

use super::user::Role;

/// A registration request. Every field is optional on the wire so that a
/// missing field is reported as an invalid argument rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub id_number: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Raw login credentials, received from a user. These are never stored
/// directly, since the password is in plaintext.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub id_number: Option<String>,
    pub password: Option<String>,
    /// Ask to be authenticated as the administrator.
    #[serde(default)]
    pub is_admin: bool,
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: Role,
    pub id_number: String,
    /// The same JWT that is set in the auth cookie, for clients that prefer
    /// an `Authorization: Bearer` header.
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
