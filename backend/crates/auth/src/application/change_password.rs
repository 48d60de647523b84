//! Change Password Use Case

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::SessionService;
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::session::Session;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    /// Sign out every other device
    pub revoke_other_sessions: bool,
}

pub struct ChangePasswordUseCase<A> {
    adapter: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> ChangePasswordUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    pub async fn execute(&self, session: &Session, input: ChangePasswordInput) -> AuthResult<()> {
        let new_password = RawPassword::new(input.new_password, &self.config.password_policy)?;

        let store = AuthStore::new(self.adapter.clone());
        let account = store
            .credential_account(&session.user_id)
            .await?
            .ok_or(AuthError::InvalidPassword)?;
        let stored = account
            .password
            .as_deref()
            .ok_or(AuthError::InvalidPassword)
            .and_then(UserPassword::from_stored)?;

        if !stored.verify(&RawPassword::candidate(input.current_password), self.config.pepper()) {
            return Err(AuthError::InvalidPassword);
        }

        let phc = UserPassword::from_raw(&new_password, self.config.pepper())?.into_phc_string();
        store.set_account_password(&account.id, phc).await?;

        if input.revoke_other_sessions {
            SessionService::new(self.adapter.clone(), self.config.clone())
                .revoke_others(&session.user_id, session)
                .await?;
        }

        tracing::info!(user_id = %session.user_id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_up::{SignUpInput, SignUpUseCase};
    use crate::domain::schema::models;
    use crate::infra::memory::MemoryAdapter;
    use platform::client::ClientInfo;

    async fn setup() -> (Arc<MemoryAdapter>, Arc<AuthConfig>, Session) {
        let adapter = Arc::new(MemoryAdapter::default());
        let config = Arc::new(AuthConfig::development());
        let output = SignUpUseCase::new(adapter.clone(), config.clone())
            .execute(
                SignUpInput {
                    name: "Ann".into(),
                    email: "ann@example.com".into(),
                    password: "password1234".into(),
                    image: None,
                    remember_me: true,
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap();
        (adapter, config, output.session.unwrap().session)
    }

    #[tokio::test]
    async fn test_wrong_current_password() {
        let (adapter, config, session) = setup().await;
        let err = ChangePasswordUseCase::new(adapter, config)
            .execute(
                &session,
                ChangePasswordInput {
                    current_password: "nope-nope".into(),
                    new_password: "new-password-1".into(),
                    revoke_other_sessions: false,
                },
            )
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn test_change_and_revoke_others() {
        let (adapter, config, session) = setup().await;
        SessionService::new(adapter.clone(), config.clone())
            .create(&session.user_id, &ClientInfo::default(), true)
            .await
            .unwrap();
        assert_eq!(adapter.count(models::SESSION, &[]).await.unwrap(), 2);

        ChangePasswordUseCase::new(adapter.clone(), config)
            .execute(
                &session,
                ChangePasswordInput {
                    current_password: "password1234".into(),
                    new_password: "new-password-1".into(),
                    revoke_other_sessions: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(adapter.count(models::SESSION, &[]).await.unwrap(), 1);
    }
}
