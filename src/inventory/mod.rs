use axum::{
    routing::{get, post},
    Router,
};

use crate::shared::AppState;

// Public API - what other modules can use
pub use postgres::PostgresInventoryRepository;
pub use repository::{InMemoryInventoryRepository, InventoryRepository};
pub use service::InventoryService;

// Internal modules
mod handlers;
pub mod models;
mod postgres;
pub mod repository;
mod service;
pub mod types;

/// Inventory routes; all of them sit behind the session guard
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/persons",
            get(handlers::list_persons).post(handlers::create_person),
        )
        .route(
            "/persons/:id",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .route("/orgs", get(handlers::list_orgs).post(handlers::create_org))
        .route(
            "/orgs/:id",
            get(handlers::get_org)
                .put(handlers::update_org)
                .delete(handlers::delete_org),
        )
        .route(
            "/certs",
            get(handlers::list_certs).post(handlers::create_cert),
        )
        .route("/certs/upload", post(handlers::upload_certificate))
        .route(
            "/certs/:id",
            get(handlers::get_cert)
                .put(handlers::update_cert)
                .delete(handlers::delete_cert),
        )
        .route("/pcs", get(handlers::list_pcs).post(handlers::create_pc))
        .route(
            "/pcs/:id",
            get(handlers::get_pc)
                .put(handlers::update_pc)
                .delete(handlers::delete_pc),
        )
        .route(
            "/pcs/:id/certs/:cert_id",
            post(handlers::link_cert).delete(handlers::unlink_cert),
        )
        .route(
            "/pcs/:id/services/:service_id",
            post(handlers::link_service).delete(handlers::unlink_service),
        )
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/services/:id",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
}
