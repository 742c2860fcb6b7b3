use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unsupported signing algorithm {0:?} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

/// Authentication settings shared by the token codec, the session middleware
/// and the auth handlers. Built once at startup and never mutated.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub secure_cookies: bool,
    pub login_path: String,
}

impl AuthConfig {
    /// Creates a config with the given secret and default settings
    /// (HS256, 15 minute access tokens, 7 day refresh tokens)
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            secure_cookies: false,
            login_path: "/login".to_string(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// Reads auth settings through `lookup`, falling back to defaults for
    /// everything except the secret
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let defaults = Self::new(secret);

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_hmac_algorithm(&raw)?,
            None => defaults.algorithm,
        };

        let access_minutes: i64 = parse_positive(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 15)?;
        let refresh_days: i64 = parse_positive(&lookup, "REFRESH_TOKEN_EXPIRE_DAYS", 7)?;

        let secure_cookies = match lookup("COOKIE_SECURE") {
            Some(raw) => bool::from_str(raw.trim()).map_err(|_| ConfigError::Invalid {
                key: "COOKIE_SECURE",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            algorithm,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
            access_cookie_name: lookup("ACCESS_COOKIE_NAME").unwrap_or(defaults.access_cookie_name),
            refresh_cookie_name: lookup("REFRESH_COOKIE_NAME")
                .unwrap_or(defaults.refresh_cookie_name),
            secure_cookies,
            login_path: lookup("LOGIN_PATH").unwrap_or(defaults.login_path),
            secret: defaults.secret,
        })
    }
}

/// Credentials for the account created at startup when it does not exist yet
#[derive(Clone)]
pub struct AdminBootstrap {
    pub login: String,
    pub password: String,
}

/// Process-wide configuration
#[derive(Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub database_url: Option<String>,
    pub bind_address: String,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => debug!("No .env file found, using process environment"),
            Err(e) => warn!(error = %e, "Failed to read .env file"),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthConfig::from_lookup(&lookup)?;

        let admin = match (lookup("ADMIN_LOGIN"), lookup("ADMIN_PASSWORD")) {
            (Some(login), Some(password)) if !login.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap { login, password })
            }
            _ => None,
        };

        Ok(Self {
            auth,
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            admin,
        })
    }
}

fn parse_hmac_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(raw.trim())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(raw.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(ConfigError::UnsupportedAlgorithm(raw.to_string())),
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
