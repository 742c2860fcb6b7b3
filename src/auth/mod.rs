// Public API - what other modules can use
pub use handlers::{login, login_info, logout, me, refresh};
pub use middleware::{resolve_session, session_guard, SessionState};
pub use types::{
    AuthenticatedIdentity, Claims, LoginRequest, MeResponse, TokenIssuedResponse, TokenKind,
    TokenPair,
};

// Internal modules
pub mod cookies;
mod handlers;
mod identity;
mod middleware;
pub mod password;
pub mod service;
pub mod token;
mod types;
