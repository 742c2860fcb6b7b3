use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing.
/// Users are keyed by login and lost on restart.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let user_map = users
            .into_iter()
            .map(|user| (user.login.clone(), user))
            .collect();

        Self {
            users: Mutex::new(user_map),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, UserModel>>, AppError> {
        self.users.lock().map_err(|_| AppError::Internal)
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.lock().map(|users| users.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(login = %user.login, "Creating user in memory");

        let mut users = self.lock()?;
        if users.contains_key(&user.login) {
            warn!(login = %user.login, "User already exists in memory");
            return Err(AppError::Conflict(format!(
                "User {} already exists",
                user.login
            )));
        }
        users.insert(user.login.clone(), user.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError> {
        let user = self.lock()?.get(login).cloned();
        debug!(login = %login, found = user.is_some(), "Looked up user in memory");
        Ok(user)
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(login = %user.login, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, login, password_hash, alert_contact, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&user.id)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.alert_contact)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("User {} already exists", user.login))
            }
            _ => {
                warn!(error = %e, "Failed to create user in database");
                AppError::DatabaseError(e.to_string())
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError> {
        let user = sqlx::query_as::<_, UserModel>(
            "SELECT id, login, password_hash, alert_contact, created_at FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, login = %login, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(login = %login, found = user.is_some(), "Looked up user in database");
        Ok(user)
    }
}
