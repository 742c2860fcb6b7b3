use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::UserService,
    types::{CreateUserRequest, UserResponse},
};
use crate::auth::AuthenticatedIdentity;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a user account
///
/// POST /users
/// Only reachable with a valid session
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!(
        created_by = %identity.subject,
        login = %request.username,
        "Creating user"
    );

    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.register(request).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
