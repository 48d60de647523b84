//! Infrastructure Layer
//!
//! Adapter implementations: in-memory and SurrealDB, plus the transforms they share.

pub mod any;
pub mod memory;
pub mod surreal;
pub mod transform;
pub mod value;

pub use any::AnyAdapter;
pub use memory::MemoryAdapter;
pub use surreal::{DbConfig, SurrealAdapter, SurrealConnection};
