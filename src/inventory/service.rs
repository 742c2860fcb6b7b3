use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{OrgModel, PcModel, PersonModel, ServiceModel},
    repository::InventoryRepository,
    types::{
        CertPayload, CertResponse, OrgPayload, PcDetailResponse, PcPayload, PersonPayload,
        ServicePayload,
    },
};
use crate::{certinfo::inspect, shared::AppError};

fn required_name(name: &str, entity: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} name is required", entity)));
    }
    Ok(trimmed.to_string())
}

fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn found<T>(row: Option<T>, entity: &str, id: i64) -> Result<T, AppError> {
    row.ok_or_else(|| AppError::NotFound(format!("{} {} not found", entity, id)))
}

fn deleted(existed: bool, entity: &str, id: i64) -> Result<(), AppError> {
    if existed {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} {} not found", entity, id)))
    }
}

/// Service for the asset inventory: validation, lookups and associations
pub struct InventoryService {
    repository: Arc<dyn InventoryRepository + Send + Sync>,
}

impl InventoryService {
    pub fn new(repository: Arc<dyn InventoryRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    fn person_payload(payload: PersonPayload) -> Result<PersonPayload, AppError> {
        Ok(PersonPayload {
            name: required_name(&payload.name, "Person")?,
            phone: optional_field(payload.phone),
            email: optional_field(payload.email),
        })
    }

    fn org_payload(payload: OrgPayload) -> Result<OrgPayload, AppError> {
        Ok(OrgPayload {
            name: required_name(&payload.name, "Org")?,
            url: optional_field(payload.url),
        })
    }

    fn pc_payload(payload: PcPayload) -> Result<PcPayload, AppError> {
        Ok(PcPayload {
            name: required_name(&payload.name, "PC")?,
            domain_name: optional_field(payload.domain_name),
            aud: optional_field(payload.aud),
            email: optional_field(payload.email),
            phone: optional_field(payload.phone),
        })
    }

    fn service_payload(payload: ServicePayload) -> Result<ServicePayload, AppError> {
        Ok(ServicePayload {
            name: required_name(&payload.name, "Service")?,
            url: optional_field(payload.url),
        })
    }

    /// Checks the name, the date range and that the owner rows exist
    async fn cert_payload(&self, payload: CertPayload) -> Result<CertPayload, AppError> {
        let name = required_name(&payload.name, "Cert")?;
        if payload.date_from > payload.date_to {
            return Err(AppError::Validation(
                "date_from must not be after date_to".to_string(),
            ));
        }
        found(
            self.repository.get_person(payload.person_id).await?,
            "Person",
            payload.person_id,
        )?;
        found(
            self.repository.get_org(payload.org_id).await?,
            "Org",
            payload.org_id,
        )?;

        Ok(CertPayload {
            name,
            version: optional_field(payload.version),
            ..payload
        })
    }

    // Persons

    #[instrument(skip(self, payload))]
    pub async fn create_person(&self, payload: PersonPayload) -> Result<PersonModel, AppError> {
        let person = self
            .repository
            .create_person(&Self::person_payload(payload)?)
            .await?;
        info!(person_id = person.person_id, "Person created");
        Ok(person)
    }

    pub async fn get_person(&self, person_id: i64) -> Result<PersonModel, AppError> {
        found(
            self.repository.get_person(person_id).await?,
            "Person",
            person_id,
        )
    }

    pub async fn list_persons(&self) -> Result<Vec<PersonModel>, AppError> {
        self.repository.list_persons().await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_person(
        &self,
        person_id: i64,
        payload: PersonPayload,
    ) -> Result<PersonModel, AppError> {
        let payload = Self::person_payload(payload)?;
        found(
            self.repository.update_person(person_id, &payload).await?,
            "Person",
            person_id,
        )
    }

    #[instrument(skip(self))]
    pub async fn delete_person(&self, person_id: i64) -> Result<(), AppError> {
        deleted(
            self.repository.delete_person(person_id).await?,
            "Person",
            person_id,
        )?;
        info!(person_id, "Person deleted with their certs");
        Ok(())
    }

    // Orgs

    #[instrument(skip(self, payload))]
    pub async fn create_org(&self, payload: OrgPayload) -> Result<OrgModel, AppError> {
        let org = self
            .repository
            .create_org(&Self::org_payload(payload)?)
            .await?;
        info!(org_id = org.org_id, name = %org.name, "Org created");
        Ok(org)
    }

    pub async fn get_org(&self, org_id: i64) -> Result<OrgModel, AppError> {
        found(self.repository.get_org(org_id).await?, "Org", org_id)
    }

    pub async fn list_orgs(&self) -> Result<Vec<OrgModel>, AppError> {
        self.repository.list_orgs().await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_org(&self, org_id: i64, payload: OrgPayload) -> Result<OrgModel, AppError> {
        let payload = Self::org_payload(payload)?;
        found(
            self.repository.update_org(org_id, &payload).await?,
            "Org",
            org_id,
        )
    }

    #[instrument(skip(self))]
    pub async fn delete_org(&self, org_id: i64) -> Result<(), AppError> {
        deleted(self.repository.delete_org(org_id).await?, "Org", org_id)?;
        info!(org_id, "Org deleted with its certs");
        Ok(())
    }

    // Certs

    #[instrument(skip(self, payload))]
    pub async fn create_cert(&self, payload: CertPayload) -> Result<CertResponse, AppError> {
        let payload = self.cert_payload(payload).await?;
        let cert = self.repository.create_cert(&payload).await?;
        info!(cert_id = cert.cert_id, date_to = %cert.date_to, "Cert created");
        Ok(cert.into())
    }

    pub async fn get_cert(&self, cert_id: i64) -> Result<CertResponse, AppError> {
        found(self.repository.get_cert(cert_id).await?, "Cert", cert_id).map(Into::into)
    }

    /// All certs, or only those expiring within the given number of days
    /// (already expired certs are excluded from the filtered list)
    #[instrument(skip(self))]
    pub async fn list_certs(
        &self,
        expiring_within_days: Option<i64>,
    ) -> Result<Vec<CertResponse>, AppError> {
        if let Some(days) = expiring_within_days {
            if days < 0 {
                return Err(AppError::Validation(
                    "expiring_within_days must not be negative".to_string(),
                ));
            }
        }

        let certs = self
            .repository
            .list_certs()
            .await?
            .into_iter()
            .map(CertResponse::from)
            .filter(|cert| match expiring_within_days {
                Some(days) => (0..=days).contains(&cert.days_until_expiry),
                None => true,
            })
            .collect();
        Ok(certs)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_cert(
        &self,
        cert_id: i64,
        payload: CertPayload,
    ) -> Result<CertResponse, AppError> {
        let payload = self.cert_payload(payload).await?;
        found(
            self.repository.update_cert(cert_id, &payload).await?,
            "Cert",
            cert_id,
        )
        .map(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_cert(&self, cert_id: i64) -> Result<(), AppError> {
        deleted(self.repository.delete_cert(cert_id).await?, "Cert", cert_id)
    }

    /// Creates a cert record from an uploaded PEM or DER file
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload_cert(
        &self,
        data: &[u8],
        person_id: i64,
        org_id: i64,
    ) -> Result<CertResponse, AppError> {
        let metadata = inspect(data)?;

        self.create_cert(CertPayload {
            name: metadata.subject,
            version: Some(metadata.version.to_string()),
            date_from: metadata.date_from,
            date_to: metadata.date_to,
            person_id,
            org_id,
        })
        .await
    }

    // PCs

    #[instrument(skip(self, payload))]
    pub async fn create_pc(&self, payload: PcPayload) -> Result<PcDetailResponse, AppError> {
        let pc = self
            .repository
            .create_pc(&Self::pc_payload(payload)?)
            .await?;
        info!(pc_id = pc.pc_id, "PC created");
        Ok(PcDetailResponse {
            pc,
            cert_ids: Vec::new(),
            service_ids: Vec::new(),
        })
    }

    pub async fn get_pc(&self, pc_id: i64) -> Result<PcDetailResponse, AppError> {
        let pc = found(self.repository.get_pc(pc_id).await?, "PC", pc_id)?;
        Ok(PcDetailResponse {
            cert_ids: self.repository.cert_ids_for_pc(pc_id).await?,
            service_ids: self.repository.service_ids_for_pc(pc_id).await?,
            pc,
        })
    }

    pub async fn list_pcs(&self) -> Result<Vec<PcModel>, AppError> {
        self.repository.list_pcs().await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_pc(
        &self,
        pc_id: i64,
        payload: PcPayload,
    ) -> Result<PcDetailResponse, AppError> {
        let payload = Self::pc_payload(payload)?;
        found(
            self.repository.update_pc(pc_id, &payload).await?,
            "PC",
            pc_id,
        )?;
        self.get_pc(pc_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_pc(&self, pc_id: i64) -> Result<(), AppError> {
        deleted(self.repository.delete_pc(pc_id).await?, "PC", pc_id)
    }

    // Services

    #[instrument(skip(self, payload))]
    pub async fn create_service(&self, payload: ServicePayload) -> Result<ServiceModel, AppError> {
        let service = self
            .repository
            .create_service(&Self::service_payload(payload)?)
            .await?;
        info!(service_id = service.service_id, "Service created");
        Ok(service)
    }

    pub async fn get_service(&self, service_id: i64) -> Result<ServiceModel, AppError> {
        found(
            self.repository.get_service(service_id).await?,
            "Service",
            service_id,
        )
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceModel>, AppError> {
        self.repository.list_services().await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_service(
        &self,
        service_id: i64,
        payload: ServicePayload,
    ) -> Result<ServiceModel, AppError> {
        let payload = Self::service_payload(payload)?;
        found(
            self.repository.update_service(service_id, &payload).await?,
            "Service",
            service_id,
        )
    }

    #[instrument(skip(self))]
    pub async fn delete_service(&self, service_id: i64) -> Result<(), AppError> {
        deleted(
            self.repository.delete_service(service_id).await?,
            "Service",
            service_id,
        )
    }

    // Associations

    #[instrument(skip(self))]
    pub async fn link_cert(&self, pc_id: i64, cert_id: i64) -> Result<PcDetailResponse, AppError> {
        found(self.repository.get_pc(pc_id).await?, "PC", pc_id)?;
        found(self.repository.get_cert(cert_id).await?, "Cert", cert_id)?;

        self.repository.link_cert_to_pc(pc_id, cert_id).await?;
        info!(pc_id, cert_id, "Cert linked to PC");
        self.get_pc(pc_id).await
    }

    #[instrument(skip(self))]
    pub async fn unlink_cert(&self, pc_id: i64, cert_id: i64) -> Result<(), AppError> {
        if !self.repository.unlink_cert_from_pc(pc_id, cert_id).await? {
            return Err(AppError::NotFound(format!(
                "Cert {} is not linked to PC {}",
                cert_id, pc_id
            )));
        }
        info!(pc_id, cert_id, "Cert unlinked from PC");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn link_service(
        &self,
        pc_id: i64,
        service_id: i64,
    ) -> Result<PcDetailResponse, AppError> {
        found(self.repository.get_pc(pc_id).await?, "PC", pc_id)?;
        found(
            self.repository.get_service(service_id).await?,
            "Service",
            service_id,
        )?;

        self.repository.link_service_to_pc(pc_id, service_id).await?;
        info!(pc_id, service_id, "Service linked to PC");
        self.get_pc(pc_id).await
    }

    #[instrument(skip(self))]
    pub async fn unlink_service(&self, pc_id: i64, service_id: i64) -> Result<(), AppError> {
        if !self
            .repository
            .unlink_service_from_pc(pc_id, service_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Service {} is not linked to PC {}",
                service_id, pc_id
            )));
        }
        info!(pc_id, service_id, "Service unlinked from PC");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certinfo::inspector::tests::self_signed;
    use crate::inventory::repository::{tests::helpers, InMemoryInventoryRepository};
    use chrono::{Duration, NaiveDate, Utc};
    use rstest::rstest;

    fn service() -> InventoryService {
        InventoryService::new(Arc::new(InMemoryInventoryRepository::new()))
    }

    async fn owner(service: &InventoryService) -> (i64, i64) {
        let person = service
            .create_person(helpers::person("alice"))
            .await
            .unwrap();
        let org = service.create_org(helpers::org("acme")).await.unwrap();
        (person.person_id, org.org_id)
    }

    fn cert_ending(name: &str, person_id: i64, org_id: i64, days: i64) -> CertPayload {
        let today = Utc::now().date_naive();
        CertPayload {
            date_from: today - Duration::days(365),
            date_to: today + Duration::days(days),
            ..helpers::cert(name, person_id, org_id)
        }
    }

    #[tokio::test]
    async fn test_names_are_trimmed() {
        let service = service();

        let person = service
            .create_person(PersonPayload {
                name: "  Alice  ".to_string(),
                phone: Some("   ".to_string()),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(person.name, "Alice");
        assert_eq!(person.phone, None);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_blank_names_are_rejected(#[case] name: &str) {
        let service = service();

        assert!(matches!(
            service.create_org(helpers::org(name)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create_pc(helpers::pc(name)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create_service(helpers::service(name)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_org_conflicts_after_trimming() {
        let service = service();
        service.create_org(helpers::org("acme")).await.unwrap();

        assert!(matches!(
            service.create_org(helpers::org(" acme ")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_cert_requires_existing_owner() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;

        assert!(matches!(
            service
                .create_cert(helpers::cert("vpn", person_id + 10, org_id))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .create_cert(helpers::cert("vpn", person_id, org_id + 10))
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cert_rejects_inverted_dates() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;

        let payload = CertPayload {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ..helpers::cert("vpn", person_id, org_id)
        };
        assert!(matches!(
            service.create_cert(payload).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_expiring_filter() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;
        service
            .create_cert(cert_ending("soon", person_id, org_id, 10))
            .await
            .unwrap();
        service
            .create_cert(cert_ending("later", person_id, org_id, 90))
            .await
            .unwrap();
        service
            .create_cert(cert_ending("expired", person_id, org_id, -3))
            .await
            .unwrap();

        let all = service.list_certs(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let expiring = service.list_certs(Some(30)).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].cert.name, "soon");
        assert_eq!(expiring[0].days_until_expiry, 10);
        assert!(expiring[0].is_active);

        assert!(matches!(
            service.list_certs(Some(-1)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_pc_detail_lists_links() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;
        let cert = service
            .create_cert(helpers::cert("vpn", person_id, org_id))
            .await
            .unwrap();
        let wiki = service
            .create_service(helpers::service("wiki"))
            .await
            .unwrap();
        let pc = service.create_pc(helpers::pc("laptop")).await.unwrap();

        service.link_cert(pc.pc.pc_id, cert.cert.cert_id).await.unwrap();
        let detail = service
            .link_service(pc.pc.pc_id, wiki.service_id)
            .await
            .unwrap();
        assert_eq!(detail.cert_ids, vec![cert.cert.cert_id]);
        assert_eq!(detail.service_ids, vec![wiki.service_id]);

        service
            .unlink_cert(pc.pc.pc_id, cert.cert.cert_id)
            .await
            .unwrap();
        let detail = service.get_pc(pc.pc.pc_id).await.unwrap();
        assert!(detail.cert_ids.is_empty());
    }

    #[tokio::test]
    async fn test_link_requires_both_ends() {
        let service = service();
        let pc = service.create_pc(helpers::pc("laptop")).await.unwrap();

        assert!(matches!(
            service.link_cert(pc.pc.pc_id, 99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.link_service(99, 1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.unlink_service(pc.pc.pc_id, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let service = service();

        assert!(matches!(
            service.get_person(1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.update_service(1, helpers::service("wiki")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_org(1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_creates_cert_from_file() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;
        let file = self_signed("vpn.example.org");

        let cert = service
            .upload_cert(file.pem().as_bytes(), person_id, org_id)
            .await
            .unwrap();
        assert_eq!(cert.cert.name, "vpn.example.org");
        assert_eq!(cert.cert.version.as_deref(), Some("3"));
        assert_eq!(
            cert.cert.date_to,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_garbage() {
        let service = service();
        let (person_id, org_id) = owner(&service).await;

        assert!(matches!(
            service.upload_cert(b"nope", person_id, org_id).await,
            Err(AppError::Certificate(_))
        ));
    }
}
