use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub login: String,
    pub password_hash: String, // Argon2 PHC string
    pub alert_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with generated ID and timestamp
    pub fn new(login: String, password_hash: String, alert_contact: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            login,
            password_hash,
            alert_contact,
            created_at: Utc::now(),
        }
    }
}
