//! Provider Linking Use Case
//!
//! Maintains the set of OAuth provider names recorded on the user.

use std::sync::Arc;

use serde_json::Value;

use crate::application::store::{AuthStore, user_patch};
use crate::domain::adapter::Adapter;
use crate::domain::entity::user::User;
use crate::domain::value_object::provider::Provider;
use crate::error::{AuthError, AuthResult};

pub struct ProvidersUseCase<A> {
    store: AuthStore<A>,
}

impl<A: Adapter> ProvidersUseCase<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            store: AuthStore::new(adapter),
        }
    }

    async fn user(&self, user_id: &str) -> AuthResult<User> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn save(&self, user: &User, providers: Vec<String>) -> AuthResult<Vec<String>> {
        let value = Value::Array(providers.into_iter().map(Value::String).collect());
        let user = self
            .store
            .update_user(&user.id, user_patch("providers", value))
            .await?;
        Ok(user.providers)
    }

    /// Add a provider; linking twice is a no-op
    pub async fn link(&self, user_id: &str, provider: &str) -> AuthResult<Vec<String>> {
        let provider = Provider::new(provider)?;
        let user = self.user(user_id).await?;
        if user.has_provider(provider.as_str()) {
            return Ok(user.providers);
        }

        let mut providers = user.providers.clone();
        providers.push(provider.as_str().to_string());
        let providers = self.save(&user, providers).await?;

        tracing::info!(user_id = %user.id, provider = %provider.as_str(), "Provider linked");
        Ok(providers)
    }

    /// Remove a provider
    ///
    /// Refuses to remove the last way to sign in when no password is set.
    pub async fn unlink(&self, user_id: &str, provider: &str) -> AuthResult<Vec<String>> {
        let provider = Provider::new(provider)?;
        let user = self.user(user_id).await?;
        if !user.has_provider(provider.as_str()) {
            return Ok(user.providers);
        }

        let has_password = self
            .store
            .credential_account(&user.id)
            .await?
            .is_some_and(|account| account.password.is_some());
        if !has_password && user.providers.len() <= 1 {
            return Err(AuthError::LastAuthMethod);
        }

        let providers = user
            .providers
            .iter()
            .filter(|p| p.as_str() != provider.as_str())
            .cloned()
            .collect();
        let providers = self.save(&user, providers).await?;

        tracing::info!(user_id = %user.id, provider = %provider.as_str(), "Provider unlinked");
        Ok(providers)
    }

    pub async fn list(&self, user_id: &str) -> AuthResult<Vec<String>> {
        Ok(self.user(user_id).await?.providers)
    }
}
