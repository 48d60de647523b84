//! Sign Out Use Case
//!
//! Invalidates a user session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::SessionService;
use crate::domain::adapter::Adapter;
use crate::error::{AuthError, AuthResult};

/// Sign out use case
pub struct SignOutUseCase<A> {
    sessions: SessionService<A>,
}

impl<A: Adapter> SignOutUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionService::new(adapter, config),
        }
    }

    /// Sign out from current session
    ///
    /// A missing or already-gone session is not an error.
    pub async fn execute(&self, cookie_value: Option<&str>) -> AuthResult<()> {
        let Some(cookie_value) = cookie_value else {
            return Ok(());
        };

        match self.sessions.resolve(cookie_value).await {
            Ok(session) => {
                self.sessions.revoke(&session).await?;
                tracing::info!(session_id = %session.id, user_id = %session.user_id, "User signed out");
                Ok(())
            }
            Err(AuthError::SessionInvalid) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
