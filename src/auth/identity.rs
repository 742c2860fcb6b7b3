use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::types::AuthenticatedIdentity;
use crate::shared::AppError;

/// Protected handlers take `AuthenticatedIdentity` as an argument. The session
/// middleware is the only place that puts one into the request.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(|| {
                debug!(path = %parts.uri.path(), "No authenticated identity on request");
                AppError::Unauthorized("Authentication required".to_string())
            })
    }
}
