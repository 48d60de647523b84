//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, the adapter contract and auth schema
//! - `application/` - Use cases and application services
//! - `infra/` - Adapter implementations (SurrealDB over HTTP, in-memory)
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Email + password sign up / sign in
//! - Server-side sessions with HMAC-signed cookie tokens
//! - Password reset links, password change, account deletion
//! - OAuth provider bookkeeping (link / unlink / list)
//! - Dev login for local development and browser tests
//! - AI prompt administration: activation, one default per kind, usage analytics
//!
//! ## Data access
//! Every flow goes through [`domain::adapter::Adapter`], a generic CRUD
//! contract with structured where clauses. [`infra::SurrealAdapter`]
//! renders it as SurrealQL; [`infra::MemoryAdapter`] evaluates it in-process.
//!
//! ## Security Model
//! - Passwords hashed with Argon2id after NFKC normalization
//! - Session cookies HttpOnly, SameSite=Lax, Secure over https
//! - Field names validated before they reach a query string

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, ConfigError};
pub use application::notifier::{LogResetPasswordSender, ResetPasswordSender};
pub use application::prompts::PromptService;
pub use application::session::SessionService;
pub use domain::adapter::{Adapter, AdapterError};
pub use domain::schema::AuthSchema;
pub use error::{AuthError, AuthResult};
pub use infra::{AnyAdapter, DbConfig, MemoryAdapter, SurrealAdapter};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::{app_router, prompt_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
