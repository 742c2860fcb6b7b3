use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{OrgModel, PcModel, PersonModel, ServiceModel},
    service::InventoryService,
    types::{
        CertListQuery, CertPayload, CertResponse, CertUploadQuery, OrgPayload, PcDetailResponse,
        PcPayload, PersonPayload, ServicePayload,
    },
};
use crate::auth::AuthenticatedIdentity;
use crate::shared::{AppError, AppState};

fn inventory(state: &AppState) -> InventoryService {
    InventoryService::new(Arc::clone(&state.inventory_repository))
}

// Persons

/// GET /persons
#[instrument(name = "list_persons", skip(state, _identity))]
pub async fn list_persons(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
) -> Result<Json<Vec<PersonModel>>, AppError> {
    Ok(Json(inventory(&state).list_persons().await?))
}

/// POST /persons
#[instrument(name = "create_person", skip(state, payload, _identity))]
pub async fn create_person(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Json(payload): Json<PersonPayload>,
) -> Result<(StatusCode, Json<PersonModel>), AppError> {
    let person = inventory(&state).create_person(payload).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// GET /persons/:id
#[instrument(name = "get_person", skip(state, _identity))]
pub async fn get_person(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(person_id): Path<i64>,
) -> Result<Json<PersonModel>, AppError> {
    Ok(Json(inventory(&state).get_person(person_id).await?))
}

/// PUT /persons/:id
#[instrument(name = "update_person", skip(state, payload, _identity))]
pub async fn update_person(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(person_id): Path<i64>,
    Json(payload): Json<PersonPayload>,
) -> Result<Json<PersonModel>, AppError> {
    Ok(Json(
        inventory(&state).update_person(person_id, payload).await?,
    ))
}

/// DELETE /persons/:id
#[instrument(name = "delete_person", skip(state, identity))]
pub async fn delete_person(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Path(person_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    inventory(&state).delete_person(person_id).await?;
    info!(target: "audit", by = %identity.subject, person_id, "Person deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Orgs

/// GET /orgs
#[instrument(name = "list_orgs", skip(state, _identity))]
pub async fn list_orgs(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
) -> Result<Json<Vec<OrgModel>>, AppError> {
    Ok(Json(inventory(&state).list_orgs().await?))
}

/// POST /orgs
#[instrument(name = "create_org", skip(state, payload, _identity))]
pub async fn create_org(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Json(payload): Json<OrgPayload>,
) -> Result<(StatusCode, Json<OrgModel>), AppError> {
    let org = inventory(&state).create_org(payload).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

/// GET /orgs/:id
#[instrument(name = "get_org", skip(state, _identity))]
pub async fn get_org(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(org_id): Path<i64>,
) -> Result<Json<OrgModel>, AppError> {
    Ok(Json(inventory(&state).get_org(org_id).await?))
}

/// PUT /orgs/:id
#[instrument(name = "update_org", skip(state, payload, _identity))]
pub async fn update_org(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(org_id): Path<i64>,
    Json(payload): Json<OrgPayload>,
) -> Result<Json<OrgModel>, AppError> {
    Ok(Json(inventory(&state).update_org(org_id, payload).await?))
}

/// DELETE /orgs/:id
#[instrument(name = "delete_org", skip(state, identity))]
pub async fn delete_org(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Path(org_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    inventory(&state).delete_org(org_id).await?;
    info!(target: "audit", by = %identity.subject, org_id, "Org deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Certs

/// GET /certs?expiring_within_days=N
#[instrument(name = "list_certs", skip(state, _identity))]
pub async fn list_certs(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Query(query): Query<CertListQuery>,
) -> Result<Json<Vec<CertResponse>>, AppError> {
    Ok(Json(
        inventory(&state)
            .list_certs(query.expiring_within_days)
            .await?,
    ))
}

/// POST /certs
#[instrument(name = "create_cert", skip(state, payload, _identity))]
pub async fn create_cert(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Json(payload): Json<CertPayload>,
) -> Result<(StatusCode, Json<CertResponse>), AppError> {
    let cert = inventory(&state).create_cert(payload).await?;
    Ok((StatusCode::CREATED, Json(cert)))
}

/// POST /certs/upload?person_id=&org_id=
///
/// Body is the raw PEM or DER file; the cert record is filled from its metadata
#[instrument(name = "upload_certificate", skip(state, identity, body), fields(len = body.len()))]
pub async fn upload_certificate(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Query(query): Query<CertUploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<CertResponse>), AppError> {
    let cert = inventory(&state)
        .upload_cert(&body, query.person_id, query.org_id)
        .await?;

    info!(
        target: "audit",
        by = %identity.subject,
        cert_id = cert.cert.cert_id,
        name = %cert.cert.name,
        "Certificate uploaded"
    );
    Ok((StatusCode::CREATED, Json(cert)))
}

/// GET /certs/:id
#[instrument(name = "get_cert", skip(state, _identity))]
pub async fn get_cert(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(cert_id): Path<i64>,
) -> Result<Json<CertResponse>, AppError> {
    Ok(Json(inventory(&state).get_cert(cert_id).await?))
}

/// PUT /certs/:id
#[instrument(name = "update_cert", skip(state, payload, _identity))]
pub async fn update_cert(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(cert_id): Path<i64>,
    Json(payload): Json<CertPayload>,
) -> Result<Json<CertResponse>, AppError> {
    Ok(Json(inventory(&state).update_cert(cert_id, payload).await?))
}

/// DELETE /certs/:id
#[instrument(name = "delete_cert", skip(state, identity))]
pub async fn delete_cert(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Path(cert_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    inventory(&state).delete_cert(cert_id).await?;
    info!(target: "audit", by = %identity.subject, cert_id, "Cert deleted");
    Ok(StatusCode::NO_CONTENT)
}

// PCs

/// GET /pcs
#[instrument(name = "list_pcs", skip(state, _identity))]
pub async fn list_pcs(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
) -> Result<Json<Vec<PcModel>>, AppError> {
    Ok(Json(inventory(&state).list_pcs().await?))
}

/// POST /pcs
#[instrument(name = "create_pc", skip(state, payload, _identity))]
pub async fn create_pc(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Json(payload): Json<PcPayload>,
) -> Result<(StatusCode, Json<PcDetailResponse>), AppError> {
    let pc = inventory(&state).create_pc(payload).await?;
    Ok((StatusCode::CREATED, Json(pc)))
}

/// GET /pcs/:id
#[instrument(name = "get_pc", skip(state, _identity))]
pub async fn get_pc(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(pc_id): Path<i64>,
) -> Result<Json<PcDetailResponse>, AppError> {
    Ok(Json(inventory(&state).get_pc(pc_id).await?))
}

/// PUT /pcs/:id
#[instrument(name = "update_pc", skip(state, payload, _identity))]
pub async fn update_pc(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(pc_id): Path<i64>,
    Json(payload): Json<PcPayload>,
) -> Result<Json<PcDetailResponse>, AppError> {
    Ok(Json(inventory(&state).update_pc(pc_id, payload).await?))
}

/// DELETE /pcs/:id
#[instrument(name = "delete_pc", skip(state, identity))]
pub async fn delete_pc(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Path(pc_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    inventory(&state).delete_pc(pc_id).await?;
    info!(target: "audit", by = %identity.subject, pc_id, "PC deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Services

/// GET /services
#[instrument(name = "list_services", skip(state, _identity))]
pub async fn list_services(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
) -> Result<Json<Vec<ServiceModel>>, AppError> {
    Ok(Json(inventory(&state).list_services().await?))
}

/// POST /services
#[instrument(name = "create_service", skip(state, payload, _identity))]
pub async fn create_service(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Json(payload): Json<ServicePayload>,
) -> Result<(StatusCode, Json<ServiceModel>), AppError> {
    let service = inventory(&state).create_service(payload).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /services/:id
#[instrument(name = "get_service", skip(state, _identity))]
pub async fn get_service(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(service_id): Path<i64>,
) -> Result<Json<ServiceModel>, AppError> {
    Ok(Json(inventory(&state).get_service(service_id).await?))
}

/// PUT /services/:id
#[instrument(name = "update_service", skip(state, payload, _identity))]
pub async fn update_service(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path(service_id): Path<i64>,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<ServiceModel>, AppError> {
    Ok(Json(
        inventory(&state)
            .update_service(service_id, payload)
            .await?,
    ))
}

/// DELETE /services/:id
#[instrument(name = "delete_service", skip(state, identity))]
pub async fn delete_service(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    Path(service_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    inventory(&state).delete_service(service_id).await?;
    info!(target: "audit", by = %identity.subject, service_id, "Service deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Associations

/// POST /pcs/:pc_id/certs/:cert_id
#[instrument(name = "link_cert", skip(state, _identity))]
pub async fn link_cert(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path((pc_id, cert_id)): Path<(i64, i64)>,
) -> Result<Json<PcDetailResponse>, AppError> {
    Ok(Json(inventory(&state).link_cert(pc_id, cert_id).await?))
}

/// DELETE /pcs/:pc_id/certs/:cert_id
#[instrument(name = "unlink_cert", skip(state, _identity))]
pub async fn unlink_cert(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path((pc_id, cert_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    inventory(&state).unlink_cert(pc_id, cert_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /pcs/:pc_id/services/:service_id
#[instrument(name = "link_service", skip(state, _identity))]
pub async fn link_service(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path((pc_id, service_id)): Path<(i64, i64)>,
) -> Result<Json<PcDetailResponse>, AppError> {
    Ok(Json(
        inventory(&state).link_service(pc_id, service_id).await?,
    ))
}

/// DELETE /pcs/:pc_id/services/:service_id
#[instrument(name = "unlink_service", skip(state, _identity))]
pub async fn unlink_service(
    State(state): State<AppState>,
    _identity: AuthenticatedIdentity,
    Path((pc_id, service_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    inventory(&state).unlink_service(pc_id, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
