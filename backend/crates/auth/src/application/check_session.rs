//! Check Session Use Case
//!
//! Verifies and retrieves session information.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::SessionService;
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::{session::Session, user::User};
use crate::error::{AuthError, AuthResult};

/// Live session with its user
#[derive(Debug, Clone)]
pub struct SessionWithUser {
    pub session: Session,
    pub user: User,
    /// Expiry was pushed back; the cookie should be re-issued
    pub refreshed: bool,
}

/// Check session use case
pub struct CheckSessionUseCase<A> {
    adapter: Arc<A>,
    sessions: SessionService<A>,
}

impl<A: Adapter> CheckSessionUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionService::new(adapter.clone(), config),
            adapter,
        }
    }

    /// Check if session is valid and return it with its user
    ///
    /// `dont_remember` sessions are never extended.
    pub async fn execute(&self, cookie_value: &str, dont_remember: bool) -> AuthResult<SessionWithUser> {
        let session = self.sessions.resolve(cookie_value).await?;

        let Some(user) = AuthStore::new(self.adapter.clone())
            .user_by_id(&session.user_id)
            .await?
        else {
            // Orphaned by a deleted user
            self.sessions.revoke(&session).await?;
            return Err(AuthError::SessionInvalid);
        };

        let (session, refreshed) = if dont_remember {
            (session, false)
        } else {
            self.sessions.refresh_if_needed(session).await?
        };

        Ok(SessionWithUser {
            session,
            user,
            refreshed,
        })
    }

    /// Same as [`execute`](Self::execute) with absent cookies and invalid
    /// sessions folded into `None`
    pub async fn optional(
        &self,
        cookie_value: Option<&str>,
        dont_remember: bool,
    ) -> AuthResult<Option<SessionWithUser>> {
        let Some(cookie_value) = cookie_value else {
            return Ok(None);
        };
        match self.execute(cookie_value, dont_remember).await {
            Ok(found) => Ok(Some(found)),
            Err(AuthError::SessionInvalid) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::timestamp;
    use crate::domain::adapter::{Record, Where};
    use crate::domain::entity::user::NewUser;
    use crate::domain::schema::models;
    use crate::infra::memory::MemoryAdapter;
    use chrono::{Duration, Utc};
    use platform::client::ClientInfo;

    async fn setup() -> (Arc<MemoryAdapter>, CheckSessionUseCase<MemoryAdapter>, String, String) {
        let adapter = Arc::new(MemoryAdapter::default());
        let config = Arc::new(AuthConfig::development());
        let user = AuthStore::new(adapter.clone())
            .create_user(&NewUser {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                image: None,
            })
            .await
            .unwrap();
        let issued = SessionService::new(adapter.clone(), config.clone())
            .create(&user.id, &ClientInfo::default(), true)
            .await
            .unwrap();
        (
            adapter.clone(),
            CheckSessionUseCase::new(adapter, config),
            user.id,
            issued.cookie_value,
        )
    }

    async fn age_session(adapter: &MemoryAdapter, user_id: &str, expires_at: chrono::DateTime<Utc>) {
        let mut patch = Record::new();
        patch.insert("expiresAt".into(), timestamp(expires_at));
        adapter
            .update_many(models::SESSION, &[Where::eq("userId", user_id)], patch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_valid_session() {
        let (_, use_case, user_id, cookie) = setup().await;
        let found = use_case.execute(&cookie, false).await.unwrap();
        assert_eq!(found.user.id, user_id);
        assert!(!found.refreshed);
    }

    #[tokio::test]
    async fn test_missing_cookie_is_none() {
        let (_, use_case, _, _) = setup().await;
        assert!(use_case.optional(None, false).await.unwrap().is_none());
        assert!(use_case.optional(Some("x.y"), false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_skipped_for_dont_remember() {
        let (adapter, use_case, user_id, cookie) = setup().await;
        age_session(&adapter, &user_id, Utc::now() + Duration::days(5)).await;

        let found = use_case.execute(&cookie, true).await.unwrap();
        assert!(!found.refreshed);

        let found = use_case.execute(&cookie, false).await.unwrap();
        assert!(found.refreshed);
    }

    #[tokio::test]
    async fn test_session_of_deleted_user() {
        let (adapter, use_case, user_id, cookie) = setup().await;
        AuthStore::new(adapter.clone()).delete_user(&user_id).await.unwrap();

        assert!(matches!(
            use_case.execute(&cookie, false).await,
            Err(AuthError::SessionInvalid)
        ));
        assert_eq!(adapter.count(models::SESSION, &[]).await.unwrap(), 0);
    }
}
