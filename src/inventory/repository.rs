use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::{
    models::{CertModel, OrgModel, PcModel, PersonModel, ServiceModel},
    types::{CertPayload, OrgPayload, PcPayload, PersonPayload, ServicePayload},
};
use crate::shared::AppError;

/// Trait for inventory storage. Payloads are validated by the service before
/// they get here; ids are assigned by the store.
#[async_trait]
pub trait InventoryRepository {
    async fn create_person(&self, person: &PersonPayload) -> Result<PersonModel, AppError>;
    async fn get_person(&self, person_id: i64) -> Result<Option<PersonModel>, AppError>;
    async fn list_persons(&self) -> Result<Vec<PersonModel>, AppError>;
    async fn update_person(
        &self,
        person_id: i64,
        person: &PersonPayload,
    ) -> Result<Option<PersonModel>, AppError>;
    /// Also deletes the person's certs
    async fn delete_person(&self, person_id: i64) -> Result<bool, AppError>;

    async fn create_org(&self, org: &OrgPayload) -> Result<OrgModel, AppError>;
    async fn get_org(&self, org_id: i64) -> Result<Option<OrgModel>, AppError>;
    async fn list_orgs(&self) -> Result<Vec<OrgModel>, AppError>;
    async fn update_org(&self, org_id: i64, org: &OrgPayload)
        -> Result<Option<OrgModel>, AppError>;
    /// Also deletes the org's certs
    async fn delete_org(&self, org_id: i64) -> Result<bool, AppError>;

    async fn create_cert(&self, cert: &CertPayload) -> Result<CertModel, AppError>;
    async fn get_cert(&self, cert_id: i64) -> Result<Option<CertModel>, AppError>;
    async fn list_certs(&self) -> Result<Vec<CertModel>, AppError>;
    async fn update_cert(
        &self,
        cert_id: i64,
        cert: &CertPayload,
    ) -> Result<Option<CertModel>, AppError>;
    async fn delete_cert(&self, cert_id: i64) -> Result<bool, AppError>;

    async fn create_pc(&self, pc: &PcPayload) -> Result<PcModel, AppError>;
    async fn get_pc(&self, pc_id: i64) -> Result<Option<PcModel>, AppError>;
    async fn list_pcs(&self) -> Result<Vec<PcModel>, AppError>;
    async fn update_pc(&self, pc_id: i64, pc: &PcPayload) -> Result<Option<PcModel>, AppError>;
    async fn delete_pc(&self, pc_id: i64) -> Result<bool, AppError>;

    async fn create_service(&self, service: &ServicePayload) -> Result<ServiceModel, AppError>;
    async fn get_service(&self, service_id: i64) -> Result<Option<ServiceModel>, AppError>;
    async fn list_services(&self) -> Result<Vec<ServiceModel>, AppError>;
    async fn update_service(
        &self,
        service_id: i64,
        service: &ServicePayload,
    ) -> Result<Option<ServiceModel>, AppError>;
    async fn delete_service(&self, service_id: i64) -> Result<bool, AppError>;

    /// Idempotent
    async fn link_cert_to_pc(&self, pc_id: i64, cert_id: i64) -> Result<(), AppError>;
    async fn unlink_cert_from_pc(&self, pc_id: i64, cert_id: i64) -> Result<bool, AppError>;
    async fn cert_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError>;

    /// Idempotent
    async fn link_service_to_pc(&self, pc_id: i64, service_id: i64) -> Result<(), AppError>;
    async fn unlink_service_from_pc(&self, pc_id: i64, service_id: i64)
        -> Result<bool, AppError>;
    async fn service_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError>;
}

/// Rows of one entity keyed by a sequential id
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn list(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn replace_with(&mut self, id: i64, build: impl FnOnce(i64) -> T) -> Option<T> {
        let slot = self.rows.get_mut(&id)?;
        *slot = build(id);
        Some(slot.clone())
    }

    fn remove(&mut self, id: i64) -> bool {
        self.rows.remove(&id).is_some()
    }
}

struct InventoryTables {
    persons: Table<PersonModel>,
    orgs: Table<OrgModel>,
    certs: Table<CertModel>,
    pcs: Table<PcModel>,
    services: Table<ServiceModel>,
    cert_pc: BTreeSet<(i64, i64)>,    // (pc_id, cert_id)
    service_pc: BTreeSet<(i64, i64)>, // (pc_id, service_id)
}

impl InventoryTables {
    fn org_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.orgs
            .rows
            .values()
            .any(|org| org.name == name && Some(org.org_id) != except)
    }

    fn remove_certs_where(&mut self, predicate: impl Fn(&CertModel) -> bool) -> usize {
        let doomed: Vec<i64> = self
            .certs
            .rows
            .values()
            .filter(|cert| predicate(cert))
            .map(|cert| cert.cert_id)
            .collect();

        for cert_id in &doomed {
            self.certs.remove(*cert_id);
        }
        self.cert_pc.retain(|(_, cert_id)| !doomed.contains(cert_id));
        doomed.len()
    }
}

/// In-memory implementation of InventoryRepository for development and testing
///
/// Mirrors the cascade rules of the PostgreSQL schema. Data is lost when the
/// application restarts.
pub struct InMemoryInventoryRepository {
    tables: Mutex<InventoryTables>,
}

impl Default for InMemoryInventoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(InventoryTables {
                persons: Table::new(),
                orgs: Table::new(),
                certs: Table::new(),
                pcs: Table::new(),
                services: Table::new(),
                cert_pc: BTreeSet::new(),
                service_pc: BTreeSet::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, InventoryTables>, AppError> {
        self.tables.lock().map_err(|_| AppError::Internal)
    }
}

fn person_from(person_id: i64, p: &PersonPayload) -> PersonModel {
    PersonModel {
        person_id,
        name: p.name.clone(),
        phone: p.phone.clone(),
        email: p.email.clone(),
    }
}

fn org_from(org_id: i64, o: &OrgPayload) -> OrgModel {
    OrgModel {
        org_id,
        name: o.name.clone(),
        url: o.url.clone(),
    }
}

fn cert_from(cert_id: i64, c: &CertPayload) -> CertModel {
    CertModel {
        cert_id,
        name: c.name.clone(),
        version: c.version.clone(),
        date_from: c.date_from,
        date_to: c.date_to,
        person_id: c.person_id,
        org_id: c.org_id,
    }
}

fn pc_from(pc_id: i64, p: &PcPayload) -> PcModel {
    PcModel {
        pc_id,
        name: p.name.clone(),
        domain_name: p.domain_name.clone(),
        aud: p.aud.clone(),
        email: p.email.clone(),
        phone: p.phone.clone(),
    }
}

fn service_from(service_id: i64, s: &ServicePayload) -> ServiceModel {
    ServiceModel {
        service_id,
        name: s.name.clone(),
        url: s.url.clone(),
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    #[instrument(skip(self, person))]
    async fn create_person(&self, person: &PersonPayload) -> Result<PersonModel, AppError> {
        let created = self.lock()?.persons.insert_with(|id| person_from(id, person));
        debug!(person_id = created.person_id, "Person created in memory");
        Ok(created)
    }

    async fn get_person(&self, person_id: i64) -> Result<Option<PersonModel>, AppError> {
        Ok(self.lock()?.persons.get(person_id))
    }

    async fn list_persons(&self) -> Result<Vec<PersonModel>, AppError> {
        Ok(self.lock()?.persons.list())
    }

    #[instrument(skip(self, person))]
    async fn update_person(
        &self,
        person_id: i64,
        person: &PersonPayload,
    ) -> Result<Option<PersonModel>, AppError> {
        Ok(self
            .lock()?
            .persons
            .replace_with(person_id, |id| person_from(id, person)))
    }

    #[instrument(skip(self))]
    async fn delete_person(&self, person_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if !tables.persons.remove(person_id) {
            return Ok(false);
        }
        let removed = tables.remove_certs_where(|cert| cert.person_id == person_id);
        debug!(person_id, removed_certs = removed, "Person deleted from memory");
        Ok(true)
    }

    #[instrument(skip(self, org))]
    async fn create_org(&self, org: &OrgPayload) -> Result<OrgModel, AppError> {
        let mut tables = self.lock()?;
        if tables.org_name_taken(&org.name, None) {
            warn!(name = %org.name, "Org name already exists in memory");
            return Err(AppError::Conflict(format!(
                "Org {} already exists",
                org.name
            )));
        }
        Ok(tables.orgs.insert_with(|id| org_from(id, org)))
    }

    async fn get_org(&self, org_id: i64) -> Result<Option<OrgModel>, AppError> {
        Ok(self.lock()?.orgs.get(org_id))
    }

    async fn list_orgs(&self) -> Result<Vec<OrgModel>, AppError> {
        Ok(self.lock()?.orgs.list())
    }

    #[instrument(skip(self, org))]
    async fn update_org(
        &self,
        org_id: i64,
        org: &OrgPayload,
    ) -> Result<Option<OrgModel>, AppError> {
        let mut tables = self.lock()?;
        if tables.org_name_taken(&org.name, Some(org_id)) {
            return Err(AppError::Conflict(format!(
                "Org {} already exists",
                org.name
            )));
        }
        Ok(tables.orgs.replace_with(org_id, |id| org_from(id, org)))
    }

    #[instrument(skip(self))]
    async fn delete_org(&self, org_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if !tables.orgs.remove(org_id) {
            return Ok(false);
        }
        let removed = tables.remove_certs_where(|cert| cert.org_id == org_id);
        debug!(org_id, removed_certs = removed, "Org deleted from memory");
        Ok(true)
    }

    #[instrument(skip(self, cert))]
    async fn create_cert(&self, cert: &CertPayload) -> Result<CertModel, AppError> {
        let created = self.lock()?.certs.insert_with(|id| cert_from(id, cert));
        debug!(cert_id = created.cert_id, "Cert created in memory");
        Ok(created)
    }

    async fn get_cert(&self, cert_id: i64) -> Result<Option<CertModel>, AppError> {
        Ok(self.lock()?.certs.get(cert_id))
    }

    async fn list_certs(&self) -> Result<Vec<CertModel>, AppError> {
        Ok(self.lock()?.certs.list())
    }

    #[instrument(skip(self, cert))]
    async fn update_cert(
        &self,
        cert_id: i64,
        cert: &CertPayload,
    ) -> Result<Option<CertModel>, AppError> {
        Ok(self
            .lock()?
            .certs
            .replace_with(cert_id, |id| cert_from(id, cert)))
    }

    #[instrument(skip(self))]
    async fn delete_cert(&self, cert_id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.remove_certs_where(|cert| cert.cert_id == cert_id) > 0)
    }

    #[instrument(skip(self, pc))]
    async fn create_pc(&self, pc: &PcPayload) -> Result<PcModel, AppError> {
        Ok(self.lock()?.pcs.insert_with(|id| pc_from(id, pc)))
    }

    async fn get_pc(&self, pc_id: i64) -> Result<Option<PcModel>, AppError> {
        Ok(self.lock()?.pcs.get(pc_id))
    }

    async fn list_pcs(&self) -> Result<Vec<PcModel>, AppError> {
        Ok(self.lock()?.pcs.list())
    }

    #[instrument(skip(self, pc))]
    async fn update_pc(&self, pc_id: i64, pc: &PcPayload) -> Result<Option<PcModel>, AppError> {
        Ok(self.lock()?.pcs.replace_with(pc_id, |id| pc_from(id, pc)))
    }

    #[instrument(skip(self))]
    async fn delete_pc(&self, pc_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if !tables.pcs.remove(pc_id) {
            return Ok(false);
        }
        tables.cert_pc.retain(|(pc, _)| *pc != pc_id);
        tables.service_pc.retain(|(pc, _)| *pc != pc_id);
        Ok(true)
    }

    #[instrument(skip(self, service))]
    async fn create_service(&self, service: &ServicePayload) -> Result<ServiceModel, AppError> {
        Ok(self
            .lock()?
            .services
            .insert_with(|id| service_from(id, service)))
    }

    async fn get_service(&self, service_id: i64) -> Result<Option<ServiceModel>, AppError> {
        Ok(self.lock()?.services.get(service_id))
    }

    async fn list_services(&self) -> Result<Vec<ServiceModel>, AppError> {
        Ok(self.lock()?.services.list())
    }

    #[instrument(skip(self, service))]
    async fn update_service(
        &self,
        service_id: i64,
        service: &ServicePayload,
    ) -> Result<Option<ServiceModel>, AppError> {
        Ok(self
            .lock()?
            .services
            .replace_with(service_id, |id| service_from(id, service)))
    }

    #[instrument(skip(self))]
    async fn delete_service(&self, service_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if !tables.services.remove(service_id) {
            return Ok(false);
        }
        tables.service_pc.retain(|(_, service)| *service != service_id);
        Ok(true)
    }

    async fn link_cert_to_pc(&self, pc_id: i64, cert_id: i64) -> Result<(), AppError> {
        self.lock()?.cert_pc.insert((pc_id, cert_id));
        Ok(())
    }

    async fn unlink_cert_from_pc(&self, pc_id: i64, cert_id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.cert_pc.remove(&(pc_id, cert_id)))
    }

    async fn cert_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .lock()?
            .cert_pc
            .iter()
            .filter(|(pc, _)| *pc == pc_id)
            .map(|(_, cert_id)| *cert_id)
            .collect())
    }

    async fn link_service_to_pc(&self, pc_id: i64, service_id: i64) -> Result<(), AppError> {
        self.lock()?.service_pc.insert((pc_id, service_id));
        Ok(())
    }

    async fn unlink_service_from_pc(
        &self,
        pc_id: i64,
        service_id: i64,
    ) -> Result<bool, AppError> {
        Ok(self.lock()?.service_pc.remove(&(pc_id, service_id)))
    }

    async fn service_ids_for_pc(&self, pc_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .lock()?
            .service_pc
            .iter()
            .filter(|(pc, _)| *pc == pc_id)
            .map(|(_, service_id)| *service_id)
            .collect())
    }
}
