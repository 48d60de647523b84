//! Typed access to the auth tables
//!
//! Wraps an [`Adapter`] with the lookups the use cases need, decoding
//! records into entities.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::adapter::{Adapter, FindMany, Operator, Record, Where, decode_record, encode_record};
use crate::domain::entity::account::{Account, CREDENTIAL_PROVIDER, NewAccount};
use crate::domain::entity::session::{NewSession, Session};
use crate::domain::entity::user::{NewUser, User};
use crate::domain::entity::verification::{NewVerification, Verification};
use crate::domain::schema::models;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;
use crate::infra::value::format_datetime;

/// Same precision as schema `Now` defaults, so `updatedAt` never goes backwards
pub(crate) fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(format_datetime(&at))
}

/// Repository over the four auth models
pub struct AuthStore<A> {
    adapter: Arc<A>,
}

impl<A> Clone for AuthStore<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
        }
    }
}

impl<A: Adapter> AuthStore<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self { adapter }
    }

    async fn find<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        wheres: &[Where],
    ) -> AuthResult<Option<T>> {
        Ok(self
            .adapter
            .find_one(model, wheres, &[])
            .await?
            .map(decode_record)
            .transpose()?)
    }

    async fn find_all<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        query: FindMany,
    ) -> AuthResult<Vec<T>> {
        Ok(self
            .adapter
            .find_many(model, query)
            .await?
            .into_iter()
            .map(decode_record)
            .collect::<Result<_, _>>()?)
    }

    async fn update_by_id<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        id: &str,
        mut patch: Record,
    ) -> AuthResult<T> {
        patch.insert("updatedAt".to_string(), timestamp(Utc::now()));
        let record = self
            .adapter
            .update(model, &[Where::eq("id", id)], patch)
            .await?;
        Ok(decode_record(record)?)
    }

    // ========================================================================
    // User
    // ========================================================================

    pub async fn user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find(models::USER, &[Where::eq("email", email.as_str())])
            .await
    }

    pub async fn user_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        self.find(models::USER, &[Where::eq("id", id)]).await
    }

    pub async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
        let record = self
            .adapter
            .create(models::USER, encode_record(user)?)
            .await?;
        Ok(decode_record(record)?)
    }

    pub async fn update_user(&self, id: &str, patch: Record) -> AuthResult<User> {
        self.update_by_id(models::USER, id, patch).await
    }

    pub async fn delete_user(&self, id: &str) -> AuthResult<()> {
        self.adapter
            .delete(models::USER, &[Where::eq("id", id)])
            .await?;
        Ok(())
    }

    // ========================================================================
    // Account
    // ========================================================================

    pub async fn credential_account(&self, user_id: &str) -> AuthResult<Option<Account>> {
        self.find(
            models::ACCOUNT,
            &[
                Where::eq("userId", user_id),
                Where::eq("providerId", CREDENTIAL_PROVIDER),
            ],
        )
        .await
    }

    pub async fn accounts_for_user(&self, user_id: &str) -> AuthResult<Vec<Account>> {
        self.find_all(
            models::ACCOUNT,
            FindMany::default().filter(Where::eq("userId", user_id)),
        )
        .await
    }

    pub async fn create_account(&self, account: &NewAccount) -> AuthResult<Account> {
        let record = self
            .adapter
            .create(models::ACCOUNT, encode_record(account)?)
            .await?;
        Ok(decode_record(record)?)
    }

    pub async fn set_account_password(&self, account_id: &str, phc: String) -> AuthResult<Account> {
        let mut patch = Record::new();
        patch.insert("password".to_string(), Value::String(phc));
        self.update_by_id(models::ACCOUNT, account_id, patch).await
    }

    pub async fn delete_accounts_for_user(&self, user_id: &str) -> AuthResult<u64> {
        Ok(self
            .adapter
            .delete_many(models::ACCOUNT, &[Where::eq("userId", user_id)])
            .await?)
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub async fn create_session(&self, session: &NewSession) -> AuthResult<Session> {
        let record = self
            .adapter
            .create(models::SESSION, encode_record(session)?)
            .await?;
        Ok(decode_record(record)?)
    }

    pub async fn session_by_token(&self, token: &str) -> AuthResult<Option<Session>> {
        self.find(models::SESSION, &[Where::eq("token", token)])
            .await
    }

    pub async fn extend_session(&self, id: &str, expires_at: DateTime<Utc>) -> AuthResult<Session> {
        let mut patch = Record::new();
        patch.insert("expiresAt".to_string(), timestamp(expires_at));
        self.update_by_id(models::SESSION, id, patch).await
    }

    pub async fn delete_session(&self, id: &str) -> AuthResult<()> {
        self.adapter
            .delete(models::SESSION, &[Where::eq("id", id)])
            .await?;
        Ok(())
    }

    pub async fn sessions_for_user(&self, user_id: &str) -> AuthResult<Vec<Session>> {
        self.find_all(
            models::SESSION,
            FindMany::default().filter(Where::eq("userId", user_id)),
        )
        .await
    }

    pub async fn all_sessions(&self) -> AuthResult<Vec<Session>> {
        self.find_all(models::SESSION, FindMany::default()).await
    }

    /// Delete sessions by id; no-op for an empty list
    pub async fn delete_sessions(&self, ids: Vec<String>) -> AuthResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.into_iter().map(Value::String).collect::<Vec<_>>();
        Ok(self
            .adapter
            .delete_many(models::SESSION, &[Where::new("id", Operator::In, ids)])
            .await?)
    }

    pub async fn delete_sessions_for_user(&self, user_id: &str) -> AuthResult<u64> {
        Ok(self
            .adapter
            .delete_many(models::SESSION, &[Where::eq("userId", user_id)])
            .await?)
    }

    // ========================================================================
    // Verification
    // ========================================================================

    pub async fn create_verification(&self, verification: &NewVerification) -> AuthResult<Verification> {
        let record = self
            .adapter
            .create(models::VERIFICATION, encode_record(verification)?)
            .await?;
        Ok(decode_record(record)?)
    }

    pub async fn verification_by_identifier(&self, identifier: &str) -> AuthResult<Option<Verification>> {
        self.find(models::VERIFICATION, &[Where::eq("identifier", identifier)])
            .await
    }

    pub async fn delete_verification(&self, id: &str) -> AuthResult<()> {
        self.adapter
            .delete(models::VERIFICATION, &[Where::eq("id", id)])
            .await?;
        Ok(())
    }
}

/// Patch setting a single user field
pub(crate) fn user_patch(field: &str, value: impl Into<Value>) -> Record {
    let mut patch = Record::new();
    patch.insert(field.to_string(), value.into());
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryAdapter;

    fn store() -> AuthStore<MemoryAdapter> {
        AuthStore::new(Arc::new(MemoryAdapter::default()))
    }

    async fn user(store: &AuthStore<MemoryAdapter>, email: &str) -> User {
        store
            .create_user(&NewUser {
                name: "Ann".into(),
                email: email.into(),
                image: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_user_lookup() {
        let store = store();
        let created = user(&store, "ann@example.com").await;
        assert!(created.id.starts_with("user:"));
        assert!(created.providers.is_empty());

        let email = Email::parse("ann@example.com").unwrap();
        let found = store.user_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(store.user_by_id(&created.id).await.unwrap(), Some(found));
    }

    #[tokio::test]
    async fn test_update_user_touches_updated_at() {
        let store = store();
        let created = user(&store, "ann@example.com").await;

        let updated = store
            .update_user(&created.id, user_patch("name", "Bob"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Bob");
        assert!(updated.updated_at >= created.updated_at);

        // a second write in the same instant must not step back either
        let again = store
            .update_user(&created.id, user_patch("name", "Cy"))
            .await
            .unwrap();
        assert!(again.updated_at >= updated.updated_at);
    }

    #[test]
    fn test_timestamp_keeps_sub_millisecond_precision() {
        let at = DateTime::parse_from_rfc3339("2025-01-02T03:04:05.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(at), Value::String("2025-01-02T03:04:05.123456789Z".into()));
    }

    #[tokio::test]
    async fn test_credential_account() {
        let store = store();
        let created = user(&store, "ann@example.com").await;
        store
            .create_account(&NewAccount::credential(&created.id, "hash".into()))
            .await
            .unwrap();

        let account = store.credential_account(&created.id).await.unwrap().unwrap();
        assert!(account.is_credential());
        assert_eq!(account.account_id, created.id);
        assert_eq!(account.user_id, created.id);
        assert_eq!(account.password.as_deref(), Some("hash"));

        let account = store
            .set_account_password(&account.id, "hash2".into())
            .await
            .unwrap();
        assert_eq!(account.password.as_deref(), Some("hash2"));
        assert_eq!(store.delete_accounts_for_user(&created.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_sessions_by_id() {
        let store = store();
        let created = user(&store, "ann@example.com").await;
        let mut ids = Vec::new();
        for token in ["a", "b", "c"] {
            let session = store
                .create_session(&NewSession {
                    token: token.into(),
                    user_id: created.id.clone(),
                    expires_at: Utc::now() + chrono::Duration::hours(1),
                    ip_address: None,
                    user_agent: None,
                    remember_me: true,
                })
                .await
                .unwrap();
            assert_eq!(session.user_id, created.id);
            ids.push(session.id);
        }

        assert_eq!(store.delete_sessions(Vec::new()).await.unwrap(), 0);
        assert_eq!(store.delete_sessions(ids[..2].to_vec()).await.unwrap(), 2);
        let left = store.sessions_for_user(&created.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].token, "c");
        assert_eq!(left[0].id, ids[2]);
    }
}
