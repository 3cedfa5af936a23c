//! Resolving callers to identities.
//!
//! Every request names its caller with an identity token; [`Authenticator`]
//! decides whether that is the administrator, a registered voter, or nobody.
//! Both stores are only ever read here.

use log::{debug, info};
use rocket::{
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::auth::{AuthToken, Role},
    common::{verify_password_blocking, IdNumber},
    db::{AdminCredential, Voter},
    store::{CredentialStore, Store},
};

/// A resolved caller.
#[derive(Debug, Clone)]
pub enum Identity {
    Admin,
    Voter(Voter),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Self::Admin => Role::Admin,
            Self::Voter(_) => Role::Voter,
        }
    }

    /// The ID number this identity is known by.
    pub fn id_number<'a>(&'a self, admin: &'a AdminCredential) -> &'a IdNumber {
        match self {
            Self::Admin => &admin.id_number,
            Self::Voter(voter) => &voter.id_number,
        }
    }

    /// Fail with `Forbidden` unless this is the administrator.
    pub fn require_admin(&self) -> Result<()> {
        match self {
            Self::Admin => Ok(()),
            Self::Voter(_) => Err(Error::forbidden("Administrator access required")),
        }
    }
}

pub struct Authenticator<'a, V: ?Sized> {
    admin: &'a AdminCredential,
    voters: &'a V,
}

impl<'a, V> Authenticator<'a, V>
where
    V: CredentialStore + ?Sized,
{
    pub fn new(admin: &'a AdminCredential, voters: &'a V) -> Self {
        Self { admin, voters }
    }

    /// Resolve an identity token to the caller it names.
    pub async fn identify(&self, id_token: &str) -> Result<Identity> {
        if self.admin.is_admin(id_token) {
            return Ok(Identity::Admin);
        }
        let unknown = || Error::Unauthenticated("Unrecognised identity".to_string());
        let id_number: IdNumber = id_token.parse().map_err(|_| unknown())?;
        let voter = self.voters.voter(&id_number).await?.ok_or_else(unknown)?;
        Ok(Identity::Voter(voter))
    }

    /// Check a password for an identity.
    ///
    /// Every failure is the same `InvalidCredentials`, so callers cannot
    /// tell an unknown ID number from a wrong password. Exactly one Argon2
    /// check runs on every path; a login naming nobody is checked against
    /// the administrator's decoy hash.
    pub async fn login(&self, id_token: &str, password: &str, as_admin: bool) -> Result<Identity> {
        if as_admin && self.admin.is_admin(id_token) {
            if verify_password_blocking(self.admin.password_hash(), password).await {
                info!("Administrator logged in");
                return Ok(Identity::Admin);
            }
            debug!("Administrator login refused");
            return Err(Error::InvalidCredentials);
        }

        let voter = self.voter_for_login(id_token).await?;
        let password_hash = Self::hash_to_check(self.admin, voter.as_ref());
        let verified = verify_password_blocking(password_hash, password).await;
        match voter {
            Some(voter) if verified => {
                debug!("Voter {} logged in", voter.id);
                Ok(Identity::Voter(voter))
            }
            _ => Err(Error::InvalidCredentials),
        }
    }

    async fn voter_for_login(&self, id_token: &str) -> Result<Option<Voter>> {
        match id_token.parse::<IdNumber>() {
            Ok(id_number) => self.voters.voter(&id_number).await,
            Err(_) => Ok(None),
        }
    }

    /// The hash a login password is checked against: the voter's own, or
    /// the decoy when there is no such voter.
    fn hash_to_check<'h>(admin: &'h AdminCredential, voter: Option<&'h Voter>) -> &'h str {
        voter.map_or(admin.decoy_hash(), |voter| voter.password_hash.as_str())
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = Error;

    /// Decode the caller's token and resolve its subject.
    ///
    /// Routes take `Result<Identity, Error>` so that an `Unauthenticated`
    /// failure reaches the caller through the usual error responder.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let result = async {
            let config = req
                .guard::<&State<Config>>()
                .await
                .succeeded()
                .ok_or_else(|| Error::Internal("Application config is not managed".to_string()))?;
            let admin = req
                .guard::<&State<AdminCredential>>()
                .await
                .succeeded()
                .ok_or_else(|| Error::Internal("Administrator credential is not managed".to_string()))?;
            let store = req
                .guard::<Store>()
                .await
                .succeeded()
                .ok_or_else(|| Error::Internal("Store is not managed".to_string()))?;

            let jwt = AuthToken::raw_from_request(req)
                .ok_or_else(|| Error::Unauthenticated("No identity token provided".to_string()))?;
            let token = AuthToken::decode(&jwt, config)
                .map_err(|_| Error::Unauthenticated("Invalid identity token".to_string()))?;

            Authenticator::new(admin, &*store)
                .identify(&token.subject)
                .await
        }
        .await;

        match result {
            Ok(identity) => {
                debug!("Caller identified as {}", identity.role());
                Outcome::Success(identity)
            }
            Err(e) => Outcome::Failure((e.status(), e)),
        }
    }
}
