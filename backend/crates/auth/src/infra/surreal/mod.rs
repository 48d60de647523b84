//! SurrealDB adapter over the HTTP `/sql` endpoint

pub mod adapter;
pub mod client;
pub mod connection;

pub use adapter::SurrealAdapter;
pub use client::{DbConfig, HttpSurrealClient, SurrealClient};
pub use connection::{Connector, SurrealConnection};
