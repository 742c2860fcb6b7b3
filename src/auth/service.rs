use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    password::{verify_against_dummy, verify_password},
    token::TokenCodec,
    types::{AuthenticatedIdentity, TokenKind, TokenPair},
};
use crate::{
    shared::{AppError, AppState},
    user::{models::UserModel, repository::UserRepository},
};

/// Service for login, token rotation and identity lookups
pub struct AuthService {
    token_codec: Arc<TokenCodec>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl AuthService {
    pub fn new(
        token_codec: Arc<TokenCodec>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self { token_codec, users }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.token_codec),
            Arc::clone(&state.user_repository),
        )
    }

    /// Checks credentials and issues the first token pair
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        // Stored logins are trimmed at registration
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let verified = match self.users.get_user_by_login(username).await? {
            Some(user) => verify_password(password, &user.password_hash),
            None => {
                verify_against_dummy(password);
                false
            }
        };

        if !verified {
            warn!(target: "audit", subject = %username, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.token_codec.issue_pair(username)?;
        info!(target: "audit", subject = %username, "Login succeeded");
        Ok(pair)
    }

    /// Exchanges a valid refresh token for a brand-new pair. The old refresh
    /// token is not tracked and stays valid until it expires.
    #[instrument(skip(self, refresh_token))]
    pub async fn rotate(
        &self,
        refresh_token: &str,
    ) -> Result<(AuthenticatedIdentity, TokenPair), AppError> {
        let claims = self
            .token_codec
            .decode_kind(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(target: "audit", reason = %e, "Refresh token rejected");
                AppError::from(e)
            })?;

        if self.users.get_user_by_login(&claims.sub).await?.is_none() {
            warn!(
                target: "audit",
                subject = %claims.sub,
                jti = %claims.jti,
                "Refresh token references a user that no longer exists"
            );
            return Err(AppError::Unauthorized(
                "User no longer exists".to_string(),
            ));
        }

        let pair = self.token_codec.issue_pair(&claims.sub)?;
        info!(
            target: "audit",
            subject = %claims.sub,
            previous_jti = %claims.jti,
            "Rotated token pair"
        );

        Ok((AuthenticatedIdentity::new(claims.sub), pair))
    }

    /// Loads the user record behind an identity
    #[instrument(skip(self))]
    pub async fn current_user(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<UserModel, AppError> {
        self.users
            .get_user_by_login(&identity.subject)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use chrono::Duration;

    fn service_with_alice() -> (AuthService, AppState) {
        let state = AppStateBuilder::new()
            .with_user("alice", "wonderland")
            .build();
        (AuthService::from_state(&state), state)
    }

    #[tokio::test]
    async fn test_login_success_issues_pair_for_subject() {
        let (service, state) = service_with_alice();

        let pair = service.login("alice", "wonderland").await.unwrap();
        let claims = state
            .token_codec
            .decode_kind(&pair.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_trims_username_like_registration() {
        let (service, state) = service_with_alice();

        let pair = service.login("  alice ", "wonderland").await.unwrap();
        let claims = state
            .token_codec
            .decode_kind(&pair.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user_look_the_same() {
        let (service, _) = service_with_alice();

        let wrong_password = service.login("alice", "nope").await;
        let unknown_user = service.login("mallory", "wonderland").await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (service, _) = service_with_alice();

        assert!(matches!(
            service.login("", "wonderland").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.login("alice", "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rotate_issues_new_pair() {
        let (service, state) = service_with_alice();
        let pair = service.login("alice", "wonderland").await.unwrap();

        let (identity, rotated) = service.rotate(&pair.refresh_token).await.unwrap();
        assert_eq!(identity.subject, "alice");

        let refresh = state
            .token_codec
            .decode_kind(&rotated.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(refresh.sub, "alice");
    }

    #[tokio::test]
    async fn test_rotate_rejects_access_token() {
        let (service, state) = service_with_alice();
        let access = state
            .token_codec
            .issue("alice", TokenKind::Access, Duration::minutes(5))
            .unwrap();

        assert!(matches!(
            service.rotate(&access).await,
            Err(AppError::InvalidTokenType)
        ));
    }

    #[tokio::test]
    async fn test_rotate_rejects_expired_refresh_token() {
        let (service, state) = service_with_alice();
        let expired = state
            .token_codec
            .issue("alice", TokenKind::Refresh, Duration::seconds(-5))
            .unwrap();

        assert!(matches!(
            service.rotate(&expired).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_rotate_rejects_vanished_user() {
        let (service, state) = service_with_alice();
        let orphan = state
            .token_codec
            .issue("ghost", TokenKind::Refresh, Duration::days(1))
            .unwrap();

        assert!(matches!(
            service.rotate(&orphan).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_current_user_loads_record() {
        let (service, _) = service_with_alice();

        let user = service
            .current_user(&AuthenticatedIdentity::new("alice"))
            .await
            .unwrap();
        assert_eq!(user.login, "alice");

        assert!(service
            .current_user(&AuthenticatedIdentity::new("ghost"))
            .await
            .is_err());
    }
}
