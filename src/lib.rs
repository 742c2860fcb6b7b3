// Library crate for the certdesk inventory service
// This file exposes the router and the public API for integration tests

pub mod auth;
pub mod certinfo;
pub mod config;
pub mod inventory;
pub mod shared;
pub mod user;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use auth::{AuthenticatedIdentity, SessionState, TokenKind, TokenPair};
pub use config::{AppConfig, AuthConfig};
pub use inventory::{InMemoryInventoryRepository, PostgresInventoryRepository};
pub use shared::{AppError, AppState};
pub use user::repository::{InMemoryUserRepository, PostgresUserRepository};

/// Builds the full application: every route sits behind the session guard,
/// which lets the public ones through untouched
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/login", get(auth::login_info).post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/users", post(user::create_user))
        .route("/certs/inspect", post(certinfo::inspect_certificate))
        .merge(inventory::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
