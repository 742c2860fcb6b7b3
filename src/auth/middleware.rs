use axum::{
    extract::{Request, State},
    http::{header::ACCEPT, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, instrument, warn};

use super::{
    cookies::{clear_token_cookies, read_cookie, set_token_cookies},
    service::AuthService,
    types::{AuthenticatedIdentity, TokenKind, TokenPair},
};
use crate::shared::{AppError, AppState};

/// Paths that never require a session
const PUBLIC_PATHS: &[&str] = &["/login", "/refresh", "/logout", "/health"];
const PUBLIC_PREFIXES: &[&str] = &["/static/"];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// What the session middleware concluded about a request
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Allow-listed path, forwarded untouched
    Public,
    /// Neither cookie present, request is not forwarded
    NoToken,
    AccessValid(AuthenticatedIdentity),
    /// Access token unusable, refresh token rotated into `pair`
    AccessExpiredRefreshValid {
        identity: AuthenticatedIdentity,
        pair: TokenPair,
    },
    /// Some cookie was present but nothing could be validated
    AccessExpiredRefreshInvalid,
}

/// Classifies a request from its path and cookies, rotating the pair when
/// the access token is unusable but the refresh token is not
pub async fn resolve_session(state: &AppState, path: &str, headers: &HeaderMap) -> SessionState {
    if is_public_path(path) {
        return SessionState::Public;
    }

    let config = &state.auth_config;
    let access = read_cookie(headers, &config.access_cookie_name);
    let refresh = read_cookie(headers, &config.refresh_cookie_name);

    if access.is_none() && refresh.is_none() {
        return SessionState::NoToken;
    }

    if let Some(token) = access.as_deref() {
        match state.token_codec.decode_kind(token, TokenKind::Access) {
            Ok(claims) => return SessionState::AccessValid(AuthenticatedIdentity::new(claims.sub)),
            Err(e) => debug!(reason = %e, "Access token not usable"),
        }
    }

    let Some(refresh) = refresh else {
        return SessionState::AccessExpiredRefreshInvalid;
    };

    match AuthService::from_state(state).rotate(&refresh).await {
        Ok((identity, pair)) => SessionState::AccessExpiredRefreshValid { identity, pair },
        Err(e) => {
            warn!(error = %e, "Refresh during request failed, session will be cleared");
            SessionState::AccessExpiredRefreshInvalid
        }
    }
}

fn wants_html(req: &Request) -> bool {
    req.method() == Method::GET
        && req
            .headers()
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"))
}

/// Cookie session middleware.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::session_guard))
/// Protected handlers then take an `AuthenticatedIdentity` argument.
#[instrument(skip(state, req, next))]
pub async fn session_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let session = resolve_session(&state, &path, req.headers()).await;

    match session {
        SessionState::Public => next.run(req).await,
        SessionState::NoToken => {
            info!(target: "audit", path = %path, "Request without session cookies blocked");
            if wants_html(&req) {
                Redirect::to(&state.auth_config.login_path).into_response()
            } else {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            }
        }
        SessionState::AccessValid(identity) => {
            debug!(subject = %identity.subject, "Access token accepted");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        SessionState::AccessExpiredRefreshValid { identity, pair } => {
            debug!(subject = %identity.subject, "Forwarding with rotated session");
            req.extensions_mut().insert(identity);
            let mut response = next.run(req).await;
            set_token_cookies(response.headers_mut(), &state.auth_config, &pair);
            response
        }
        SessionState::AccessExpiredRefreshInvalid => {
            let mut response = next.run(req).await;
            clear_token_cookies(response.headers_mut(), &state.auth_config);
            response
        }
    }
}
