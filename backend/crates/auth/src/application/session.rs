//! Session Lifecycle
//!
//! Issues, refreshes and revokes server-side sessions.

use std::sync::Arc;

use chrono::{Duration, Utc};
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::session::{NewSession, Session};
use crate::error::{AuthError, AuthResult};

/// Session a freshly signed-in user receives
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    /// Signed value for the session cookie
    pub cookie_value: String,
    pub remember_me: bool,
}

/// Lifetime of a session created without "remember me"
pub fn dont_remember_expires_in() -> Duration {
    Duration::days(1)
}

pub struct SessionService<A> {
    store: AuthStore<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> SessionService<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self {
            store: AuthStore::new(adapter),
            config,
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        client: &ClientInfo,
        remember_me: bool,
    ) -> AuthResult<IssuedSession> {
        let expires_in = if remember_me {
            self.config.session_expires_in_chrono()
        } else {
            dont_remember_expires_in()
        };

        let session = self
            .store
            .create_session(&NewSession {
                token: session_token::generate(),
                user_id: user_id.to_string(),
                expires_at: Utc::now() + expires_in,
                ip_address: client.ip_string(),
                user_agent: client.user_agent.clone(),
                remember_me,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            session_id = %session.id,
            remember_me = remember_me,
            "Session created"
        );

        Ok(IssuedSession {
            cookie_value: session_token::sign(&self.config.secret, &session.token),
            session,
            remember_me,
        })
    }

    /// Resolve a cookie value to a live session
    ///
    /// Expired sessions are deleted on sight.
    pub async fn resolve(&self, cookie_value: &str) -> AuthResult<Session> {
        let token = session_token::verify(&self.config.secret, cookie_value)?;
        let session = self
            .store
            .session_by_token(token)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired(Utc::now()) {
            self.store.delete_session(&session.id).await?;
            tracing::debug!(session_id = %session.id, "Expired session removed");
            return Err(AuthError::SessionInvalid);
        }

        Ok(session)
    }

    /// Push the expiry back once `update_age` has elapsed
    ///
    /// Sessions issued without remember-me keep their first expiry.
    pub async fn refresh_if_needed(&self, session: Session) -> AuthResult<(Session, bool)> {
        if !session.remember_me {
            return Ok((session, false));
        }

        let now = Utc::now();
        let expires_in = self.config.session_expires_in_chrono();
        if !session.needs_refresh(now, expires_in, self.config.session_update_age_chrono()) {
            return Ok((session, false));
        }

        let session = self.store.extend_session(&session.id, now + expires_in).await?;
        tracing::debug!(session_id = %session.id, "Session refreshed");
        Ok((session, true))
    }

    pub async fn revoke(&self, session: &Session) -> AuthResult<()> {
        self.store.delete_session(&session.id).await
    }

    /// Active sessions of a user, newest first
    pub async fn list(&self, user_id: &str) -> AuthResult<Vec<Session>> {
        let now = Utc::now();
        let mut sessions: Vec<Session> = self
            .store
            .sessions_for_user(user_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_expired(now))
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Revoke every session of the user except `keep`
    pub async fn revoke_others(&self, user_id: &str, keep: &Session) -> AuthResult<u64> {
        let ids = self
            .store
            .sessions_for_user(user_id)
            .await?
            .into_iter()
            .filter(|s| s.id != keep.id)
            .map(|s| s.id)
            .collect();
        let revoked = self.store.delete_sessions(ids).await?;

        tracing::info!(user_id = %user_id, revoked = revoked, "Other sessions revoked");
        Ok(revoked)
    }

    pub async fn revoke_all(&self, user_id: &str) -> AuthResult<u64> {
        let revoked = self.store.delete_sessions_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked = revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Delete every expired session; run at startup
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let expired = self
            .store
            .all_sessions()
            .await?
            .into_iter()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id)
            .collect();
        self.store.delete_sessions(expired).await
    }
}
