// Public API - what other modules can use
pub use handlers::inspect_certificate;
pub use inspector::{inspect, CertInfoError, CertMetadata};

// Internal modules
mod handlers;
pub(crate) mod inspector;
