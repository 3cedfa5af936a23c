use serde::{Deserialize, Serialize};

use crate::model::db::{AdminCredential, Voter};

/// What a caller sees of their own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub has_voted: bool,
}

impl From<Voter> for ProfileView {
    fn from(voter: Voter) -> Self {
        let voter = voter.voter;
        Self {
            id_number: voter.id_number.into(),
            name: voter.name,
            email: voter.email,
            phone: voter.phone,
            has_voted: voter.has_voted,
        }
    }
}

impl From<&AdminCredential> for ProfileView {
    /// The administrator has no stored profile; show a placeholder.
    fn from(admin: &AdminCredential) -> Self {
        Self {
            id_number: admin.id_number.to_string(),
            name: Some("Admin User".to_string()),
            email: None,
            phone: None,
            has_voted: false,
        }
    }
}
