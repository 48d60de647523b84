//! Verification Entity
//!
//! Short-lived token records (password reset).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: String,
    /// `<purpose>:<token>`
    pub identifier: String,
    /// Payload, e.g. the user id a reset token belongs to
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Verification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVerification {
    pub identifier: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Identifier of a password reset token
pub fn reset_password_identifier(token: &str) -> String {
    format!("reset-password:{token}")
}
