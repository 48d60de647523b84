//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod app_handlers;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod prompt_handlers;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::require_user;
pub use router::{app_router, auth_router, prompt_router, user_router};
