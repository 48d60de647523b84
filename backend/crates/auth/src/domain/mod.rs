//! Domain Layer
//!
//! Entities, value objects, the auth schema and the adapter contract.

pub mod adapter;
pub mod entity;
pub mod schema;
pub mod value_object;

// Re-exports
pub use adapter::{Adapter, AdapterError, FindMany, Operator, Record, SortDirection, Where};
pub use entity::{account::Account, session::Session, user::User, verification::Verification};
pub use schema::{AuthSchema, models};
