use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::{CertModel, PcModel};

/// Create/replace payload for a person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPayload {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Create/replace payload for an org
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgPayload {
    pub name: String,
    pub url: Option<String>,
}

/// Create/replace payload for a cert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertPayload {
    pub name: String,
    pub version: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub person_id: i64,
    pub org_id: i64,
}

/// Create/replace payload for a PC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcPayload {
    pub name: String,
    pub domain_name: Option<String>,
    pub aud: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Create/replace payload for a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePayload {
    pub name: String,
    pub url: Option<String>,
}

/// Cert with its expiry status computed for today
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CertResponse {
    #[serde(flatten)]
    pub cert: CertModel,
    pub is_active: bool,
    pub days_until_expiry: i64,
}

impl From<CertModel> for CertResponse {
    fn from(cert: CertModel) -> Self {
        Self {
            is_active: cert.is_active(),
            days_until_expiry: cert.days_until_expiry(),
            cert,
        }
    }
}

/// PC together with the ids linked to it
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PcDetailResponse {
    #[serde(flatten)]
    pub pc: PcModel,
    pub cert_ids: Vec<i64>,
    pub service_ids: Vec<i64>,
}

/// Query string for GET /certs
#[derive(Debug, Default, Deserialize)]
pub struct CertListQuery {
    pub expiring_within_days: Option<i64>,
}

/// Query string for POST /certs/upload
#[derive(Debug, Deserialize)]
pub struct CertUploadQuery {
    pub person_id: i64,
    pub org_id: i64,
}
