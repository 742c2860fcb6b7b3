use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use super::{
    models::{CertModel, OrgModel, PcModel, PersonModel, ServiceModel},
    repository::InventoryRepository,
    types::{CertPayload, OrgPayload, PcPayload, PersonPayload, ServicePayload},
};
use crate::shared::AppError;

/// PostgreSQL implementation of InventoryRepository
///
/// Cascades are handled by the schema's ON DELETE CASCADE foreign keys.
pub struct PostgresInventoryRepository {
    pool: PgPool,
}

impl PostgresInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Record already exists".to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Referenced record does not exist".to_string())
        }
        _ => {
            warn!(error = %e, "Inventory query failed");
            AppError::DatabaseError(e.to_string())
        }
    }
}

const PERSON_COLUMNS: &str = "person_id, name, phone, email";
const ORG_COLUMNS: &str = "org_id, name, url";
const CERT_COLUMNS: &str = "cert_id, name, version, date_from, date_to, person_id, org_id";
const PC_COLUMNS: &str = "pc_id, name, domain_name, aud, email, phone";
const SERVICE_COLUMNS: &str = "service_id, name, url";

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    #[instrument(skip(self, person))]
    async fn create_person(&self, person: &PersonPayload) -> Result<PersonModel, AppError> {
        sqlx::query_as::<_, PersonModel>(&format!(
            "INSERT INTO persons (name, phone, email) VALUES ($1, $2, $3) RETURNING {}",
            PERSON_COLUMNS
        ))
        .bind(&person.name)
        .bind(&person.phone)
        .bind(&person.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn get_person(&self, person_id: i64) -> Result<Option<PersonModel>, AppError> {
        sqlx::query_as::<_, PersonModel>(&format!(
            "SELECT {} FROM persons WHERE person_id = $1",
            PERSON_COLUMNS
        ))
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_persons(&self) -> Result<Vec<PersonModel>, AppError> {
        sqlx::query_as::<_, PersonModel>(&format!(
            "SELECT {} FROM persons ORDER BY person_id",
            PERSON_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self, person))]
    async fn update_person(
        &self,
        person_id: i64,
        person: &PersonPayload,
    ) -> Result<Option<PersonModel>, AppError> {
        sqlx::query_as::<_, PersonModel>(&format!(
            "UPDATE persons SET name = $2, phone = $3, email = $4 WHERE person_id = $1 RETURNING {}",
            PERSON_COLUMNS
        ))
        .bind(person_id)
        .bind(&person.name)
        .bind(&person.phone)
        .bind(&person.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn delete_person(&self, person_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM persons WHERE person_id = $1")
            .bind(person_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, org))]
    async fn create_org(&self, org: &OrgPayload) -> Result<OrgModel, AppError> {
        sqlx::query_as::<_, OrgModel>(&format!(
            "INSERT INTO orgs (name, url) VALUES ($1, $2) RETURNING {}",
            ORG_COLUMNS
        ))
        .bind(&org.name)
        .bind(&org.url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match db_error(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("Org {} already exists", org.name)),
            other => other,
        })
    }

    async fn get_org(&self, org_id: i64) -> Result<Option<OrgModel>, AppError> {
        sqlx::query_as::<_, OrgModel>(&format!(
            "SELECT {} FROM orgs WHERE org_id = $1",
            ORG_COLUMNS
        ))
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_orgs(&self) -> Result<Vec<OrgModel>, AppError> {
        sqlx::query_as::<_, OrgModel>(&format!(
            "SELECT {} FROM orgs ORDER BY org_id",
            ORG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self, org))]
    async fn update_org(
        &self,
        org_id: i64,
        org: &OrgPayload,
    ) -> Result<Option<OrgModel>, AppError> {
        sqlx::query_as::<_, OrgModel>(&format!(
            "UPDATE orgs SET name = $2, url = $3 WHERE org_id = $1 RETURNING {}",
            ORG_COLUMNS
        ))
        .bind(org_id)
        .bind(&org.name)
        .bind(&org.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match db_error(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("Org {} already exists", org.name)),
            other => other,
        })
    }

    #[instrument(skip(self))]
    async fn delete_org(&self, org_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM orgs WHERE org_id = $1")
            .bind(org_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, cert))]
    async fn create_cert(&self, cert: &CertPayload) -> Result<CertModel, AppError> {
        sqlx::query_as::<_, CertModel>(&format!(
            "INSERT INTO certs (name, version, date_from, date_to, person_id, org_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CERT_COLUMNS
        ))
        .bind(&cert.name)
        .bind(&cert.version)
        .bind(cert.date_from)
        .bind(cert.date_to)
        .bind(cert.person_id)
        .bind(cert.org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn get_cert(&self, cert_id: i64) -> Result<Option<CertModel>, AppError> {
        sqlx::query_as::<_, CertModel>(&format!(
            "SELECT {} FROM certs WHERE cert_id = $1",
            CERT_COLUMNS
        ))
        .bind(cert_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_certs(&self) -> Result<Vec<CertModel>, AppError> {
        sqlx::query_as::<_, CertModel>(&format!(
            "SELECT {} FROM certs ORDER BY cert_id",
            CERT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self, cert))]
    async fn update_cert(
        &self,
        cert_id: i64,
        cert: &CertPayload,
    ) -> Result<Option<CertModel>, AppError> {
        sqlx::query_as::<_, CertModel>(&format!(
            "UPDATE certs SET name = $2, version = $3, date_from = $4, date_to = $5, \
             person_id = $6, org_id = $7 WHERE cert_id = $1 RETURNING {}",
            CERT_COLUMNS
        ))
        .bind(cert_id)
        .bind(&cert.name)
        .bind(&cert.version)
        .bind(cert.date_from)
        .bind(cert.date_to)
        .bind(cert.person_id)
        .bind(cert.org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn delete_cert(&self, cert_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM certs WHERE cert_id = $1")
            .bind(cert_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, pc))]
    async fn create_pc(&self, pc: &PcPayload) -> Result<PcModel, AppError> {
        sqlx::query_as::<_, PcModel>(&format!(
            "INSERT INTO pcs (name, domain_name, aud, email, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PC_COLUMNS
        ))
        .bind(&pc.name)
        .bind(&pc.domain_name)
        .bind(&pc.aud)
        .bind(&pc.email)
        .bind(&pc.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn get_pc(&self, pc_id: i64) -> Result<Option<PcModel>, AppError> {
        sqlx::query_as::<_, PcModel>(&format!("SELECT {} FROM pcs WHERE pc_id = $1", PC_COLUMNS))
            .bind(pc_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_pcs(&self) -> Result<Vec<PcModel>, AppError> {
        sqlx::query_as::<_, PcModel>(&format!("SELECT {} FROM pcs ORDER BY pc_id", PC_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    #[instrument(skip(self, pc))]
    async fn update_pc(&self, pc_id: i64, pc: &PcPayload) -> Result<Option<PcModel>, AppError> {
        sqlx::query_as::<_, PcModel>(&format!(
            "UPDATE pcs SET name = $2, domain_name = $3, aud = $4, email = $5, phone = $6 \
             WHERE pc_id = $1 RETURNING {}",
            PC_COLUMNS
        ))
        .bind(pc_id)
        .bind(&pc.name)
        .bind(&pc.domain_name)
        .bind(&pc.aud)
        .bind(&pc.email)
        .bind(&pc.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn delete_pc(&self, pc_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pcs WHERE pc_id = $1")
            .bind(pc_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, service))]
    async fn create_service(&self, service: &ServicePayload) -> Result<ServiceModel, AppError> {
        sqlx::query_as::<_, ServiceModel>(&format!(
            "INSERT INTO services (name, url) VALUES ($1, $2) RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(&service.name)
        .bind(&service.url)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn get_service(&self, service_id: i64) -> Result<Option<ServiceModel>, AppError> {
        sqlx::query_as::<_, ServiceModel>(&format!(
            "SELECT {} FROM services WHERE service_id = $1",
            SERVICE_COLUMNS
        ))
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_services(&self) -> Result<Vec<ServiceModel>, AppError> {
        sqlx::query_as::<_, ServiceModel>(&format!(
            "SELECT {} FROM services ORDER BY service_id",
            SERVICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self, service))]
    async fn update_service(
        &self,
        service_id: i64,
        service: &ServicePayload,
    ) -> Result<Option<ServiceModel>, AppError> {
        sqlx::query_as::<_, ServiceModel>(&format!(
            "UPDATE services SET name = $2, url = $3 WHERE service_id = $1 RETURNING {}",
            SERVICE_COLUMNS
        ))
        .bind(service_id)
        .bind(&service.name)
        .bind(&service.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn delete_service(&self, service_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM services WHERE service_id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn link_cert_to_pc(&self, pc_id: i64, cert_id: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO cert_pc (pc_id, cert_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(pc_id)
        .bind(cert_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        debug!(pc_id, cert_id, "Cert linked to PC");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unlink_cert_from_pc(&self, pc_id: i64, cert_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cert_pc WHERE pc_id = $1 AND cert_id = $2")
            .bind(pc_id)
            .bind(cert_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn cert_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT cert_id FROM cert_pc WHERE pc_id = $1 ORDER BY cert_id",
        )
        .bind(pc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn link_service_to_pc(&self, pc_id: i64, service_id: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO service_pc (pc_id, service_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(pc_id)
        .bind(service_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        debug!(pc_id, service_id, "Service linked to PC");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unlink_service_from_pc(
        &self,
        pc_id: i64,
        service_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM service_pc WHERE pc_id = $1 AND service_id = $2")
            .bind(pc_id)
            .bind(service_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn service_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT service_id FROM service_pc WHERE pc_id = $1 ORDER BY service_id",
        )
        .bind(pc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}
