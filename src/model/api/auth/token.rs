use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

use super::user::Role;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
const BEARER_PREFIX: &str = "Bearer ";

/// An authentication token naming a specific identity.
///
/// The token only carries the identity; the role it was issued for is
/// informational, and every request re-resolves the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "rgt")]
    pub role: Role,
}

impl AuthToken {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// Sign this token into a JWT that expires after the configured lifetime.
    pub fn encode(self, config: &Config) -> Result<String> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(jwt)
    }

    /// Verify and decode a JWT, rejecting it if it has expired.
    pub fn decode(jwt: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }

    /// Wrap a signed JWT in the authentication cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, jwt)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Find the raw JWT a request carries, from the cookie or else an
    /// `Authorization: Bearer` header.
    pub fn raw_from_request(req: &Request<'_>) -> Option<String> {
        if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
            return Some(cookie.value().to_string());
        }
        req.headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(|jwt| jwt.trim().to_string())
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}
