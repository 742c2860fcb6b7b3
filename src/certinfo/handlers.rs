use axum::{body::Bytes, Json};
use tracing::{info, instrument};

use super::inspector::{inspect, CertMetadata};
use crate::auth::AuthenticatedIdentity;
use crate::shared::AppError;

/// HTTP handler for reading metadata out of an uploaded certificate
///
/// POST /certs/inspect
/// Body is the raw PEM or DER file
#[instrument(name = "inspect_certificate", skip(identity, body), fields(len = body.len()))]
pub async fn inspect_certificate(
    identity: AuthenticatedIdentity,
    body: Bytes,
) -> Result<Json<CertMetadata>, AppError> {
    let metadata = inspect(&body)?;

    info!(
        requested_by = %identity.subject,
        subject = %metadata.subject,
        "Certificate inspected"
    );

    Ok(Json(metadata))
}
