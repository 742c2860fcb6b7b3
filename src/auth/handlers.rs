use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{
    cookies::{clear_token_cookies, read_cookie, set_token_cookies},
    service::AuthService,
    types::{AuthenticatedIdentity, LoginRequest, MeResponse, TokenIssuedResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for logging in
///
/// POST /login
/// Sets the access and refresh cookies on success
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<TokenIssuedResponse>), AppError> {
    info!(username = %request.username, "Login attempt");

    let service = AuthService::from_state(&state);
    let pair = service.login(&request.username, &request.password).await?;

    let mut headers = HeaderMap::new();
    set_token_cookies(&mut headers, &state.auth_config, &pair);

    Ok((
        headers,
        Json(TokenIssuedResponse::new(request.username.trim(), &pair)),
    ))
}

/// GET /login
///
/// Browsers without a session are redirected here. The API has no login page
/// of its own, so this only describes how to sign in.
pub async fn login_info() -> Json<Value> {
    Json(json!({
        "message": "Sign in by posting JSON credentials to /login",
        "method": "POST",
        "fields": ["username", "password"]
    }))
}

/// HTTP handler for explicit token rotation
///
/// POST /refresh
/// Reads only the refresh cookie, replaces both cookies on success
#[instrument(name = "refresh", skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<TokenIssuedResponse>), AppError> {
    let token = read_cookie(&headers, &state.auth_config.refresh_cookie_name)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let service = AuthService::from_state(&state);
    let (identity, pair) = service.rotate(&token).await?;

    let mut response_headers = HeaderMap::new();
    set_token_cookies(&mut response_headers, &state.auth_config, &pair);

    Ok((
        response_headers,
        Json(TokenIssuedResponse::new(&identity.subject, &pair)),
    ))
}

/// HTTP handler for logging out
///
/// POST /logout
/// Always succeeds; there is no server-side session to end
#[instrument(name = "logout", skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<Value>) {
    info!(target: "audit", "Logout, clearing session cookies");

    let mut headers = HeaderMap::new();
    clear_token_cookies(&mut headers, &state.auth_config);

    (headers, Json(json!({ "message": "Logged out" })))
}

/// GET /me
#[instrument(name = "me", skip(state))]
pub async fn me(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
) -> Result<Json<MeResponse>, AppError> {
    let user = AuthService::from_state(&state)
        .current_user(&identity)
        .await?;

    Ok(Json(MeResponse {
        subject: identity.subject,
        alert_contact: user.alert_contact,
    }))
}
