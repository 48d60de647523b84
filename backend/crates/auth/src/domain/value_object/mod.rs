//! Value Object Module

pub mod display_name;
pub mod email;
pub mod provider;
pub mod user_password;
