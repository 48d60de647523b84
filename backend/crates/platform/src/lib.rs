//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the auth backend:
//! - Cryptographic utilities (HMAC-SHA256 signing, random ids, base64url)
//! - Password hashing (Argon2id) and length policy
//! - Cookie building and parsing
//! - Client metadata (IP address, User-Agent)
//! - URL component encoding for redirects

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod url;
