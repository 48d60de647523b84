//! Account Entity
//!
//! Links a user to an authentication method. Email/password sign-in uses
//! the `credential` provider, which stores the Argon2id hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider id of email/password accounts
pub const CREDENTIAL_PROVIDER: &str = "credential";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub account_id: String,
    pub provider_id: String,
    pub user_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: Option<String>,
    /// PHC string, credential accounts only
    #[serde(default)]
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_credential(&self) -> bool {
        self.provider_id == CREDENTIAL_PROVIDER
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("provider_id", &self.provider_id)
            .field("user_id", &self.user_id)
            .field("has_password", &self.password.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub account_id: String,
    pub provider_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewAccount {
    pub fn credential(user_id: &str, password_hash: String) -> Self {
        Self {
            account_id: user_id.to_string(),
            provider_id: CREDENTIAL_PROVIDER.to_string(),
            user_id: user_id.to_string(),
            password: Some(password_hash),
        }
    }
}
