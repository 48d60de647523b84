//! Entity Module

pub mod account;
pub mod prompt;
pub mod session;
pub mod user;
pub mod verification;
