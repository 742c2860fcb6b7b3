// Public API - what other modules can use
pub use handlers::create_user;
pub use service::UserService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
