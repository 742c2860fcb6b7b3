use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::UserModel,
    repository::UserRepository,
    types::{CreateUserRequest, UserResponse},
};
use crate::{auth::password::hash_password, shared::AppError};

const MIN_LOGIN_LEN: usize = 3;
const MAX_LOGIN_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;

/// Service for user account management
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Validates and stores a new account
    #[instrument(skip(self, request), fields(login = %request.username))]
    pub async fn register(&self, request: CreateUserRequest) -> Result<UserResponse, AppError> {
        let login = request.username.trim().to_string();
        let login_len = login.chars().count();
        if !(MIN_LOGIN_LEN..=MAX_LOGIN_LEN).contains(&login_len) {
            return Err(AppError::Validation(format!(
                "Username must be between {} and {} characters",
                MIN_LOGIN_LEN, MAX_LOGIN_LEN
            )));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let alert_contact = request
            .alert_contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let user = UserModel::new(login, hash_password(&request.password)?, alert_contact);
        self.repository.create_user(&user).await?;

        info!(target: "audit", login = %user.login, "User created");
        Ok(user.into())
    }

    /// Creates the bootstrap account unless the login already exists.
    /// Returns whether a new user was created.
    #[instrument(skip(self, password))]
    pub async fn ensure_user(&self, login: &str, password: &str) -> Result<bool, AppError> {
        if self.repository.get_user_by_login(login).await?.is_some() {
            info!(login = %login, "Bootstrap user already present");
            return Ok(false);
        }

        let user = UserModel::new(login.to_string(), hash_password(password)?, None);
        self.repository.create_user(&user).await?;

        info!(target: "audit", login = %login, "Bootstrap user created");
        Ok(true)
    }
}
