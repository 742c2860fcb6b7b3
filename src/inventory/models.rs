use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the persons table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PersonModel {
    pub person_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Database model for the orgs table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct OrgModel {
    pub org_id: i64,
    pub name: String, // Unique
    pub url: Option<String>,
}

/// Database model for the certs table. Every cert belongs to one person and
/// one org and is removed together with either of them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct CertModel {
    pub cert_id: i64,
    pub name: String,
    pub version: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub person_id: i64,
    pub org_id: i64,
}

impl CertModel {
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        today <= self.date_to
    }

    /// Days left until `date_to`, negative once expired
    pub fn days_until_expiry_on(&self, today: NaiveDate) -> i64 {
        (self.date_to - today).num_days()
    }

    pub fn is_active(&self) -> bool {
        self.is_active_on(Utc::now().date_naive())
    }

    pub fn days_until_expiry(&self) -> i64 {
        self.days_until_expiry_on(Utc::now().date_naive())
    }
}

/// Database model for the pcs table (workstations)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PcModel {
    pub pc_id: i64,
    pub name: String,
    pub domain_name: Option<String>,
    pub aud: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Database model for the services table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ServiceModel {
    pub service_id: i64,
    pub name: String,
    pub url: Option<String>,
}
