use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use x509_parser::{
    certificate::X509Certificate, parse_x509_certificate, pem::parse_x509_pem, time::ASN1Time,
    x509::X509Name,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertInfoError {
    #[error("certificate file is empty")]
    Empty,

    #[error("file is neither a PEM nor a DER encoded X.509 certificate")]
    Unparseable,

    #[error("certificate {0} has no common name")]
    MissingCommonName(&'static str),

    #[error("certificate {0} date is out of range")]
    InvalidDate(&'static str),
}

/// Fields pulled from an uploaded certificate to prefill a cert record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertMetadata {
    pub issuer: String,
    pub subject: String,
    pub version: u32, // 1-based, so an X.509 v3 certificate reports 3
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Reads a certificate, trying PEM first and falling back to DER
#[instrument(skip(data), fields(len = data.len()))]
pub fn inspect(data: &[u8]) -> Result<CertMetadata, CertInfoError> {
    if data.is_empty() {
        return Err(CertInfoError::Empty);
    }

    match parse_x509_pem(data) {
        Ok((_, pem)) => match pem.parse_x509() {
            Ok(cert) => return metadata_from(&cert),
            Err(e) => debug!(error = ?e, "PEM block is not an X.509 certificate, trying DER"),
        },
        Err(e) => debug!(error = ?e, "Input is not PEM, trying DER"),
    }

    let (_, cert) = parse_x509_certificate(data).map_err(|e| {
        debug!(error = ?e, "Input is not DER either");
        CertInfoError::Unparseable
    })?;

    metadata_from(&cert)
}

fn metadata_from(cert: &X509Certificate<'_>) -> Result<CertMetadata, CertInfoError> {
    let metadata = CertMetadata {
        issuer: common_name(cert.issuer(), "issuer")?,
        subject: common_name(cert.subject(), "subject")?,
        version: cert.version().0 + 1,
        date_from: utc_date(&cert.validity().not_before, "not-before")?,
        date_to: utc_date(&cert.validity().not_after, "not-after")?,
    };

    debug!(
        subject = %metadata.subject,
        issuer = %metadata.issuer,
        date_to = %metadata.date_to,
        "Certificate inspected"
    );
    Ok(metadata)
}

fn common_name(name: &X509Name<'_>, field: &'static str) -> Result<String, CertInfoError> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .ok_or(CertInfoError::MissingCommonName(field))
}

fn utc_date(time: &ASN1Time, field: &'static str) -> Result<NaiveDate, CertInfoError> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .map(|dt| dt.date_naive())
        .ok_or(CertInfoError::InvalidDate(field))
}
