use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which of the two token kinds a set of claims belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // User login
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // Random id, only used to correlate audit log lines
}

/// An access and refresh token issued together
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: i64,  // Seconds
    pub refresh_expires_in: i64, // Seconds
}

/// The authenticated principal, produced once by the session middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub subject: String,
}

impl AuthenticatedIdentity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Request payload for the login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for login and refresh
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenIssuedResponse {
    pub subject: String,
    pub access_expires_in: i64,
    pub refresh_expires_in: i64,
}

impl TokenIssuedResponse {
    pub fn new(subject: &str, pair: &TokenPair) -> Self {
        Self {
            subject: subject.to_string(),
            access_expires_in: pair.access_expires_in,
            refresh_expires_in: pair.refresh_expires_in,
        }
    }
}

/// Response body for the current-user endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MeResponse {
    pub subject: String,
    pub alert_contact: Option<String>,
}
