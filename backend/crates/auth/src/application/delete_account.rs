//! Delete Account Use Case
//!
//! Removes the user's sessions, accounts and user record, in that order.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::session::Session;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

pub struct DeleteAccountUseCase<A> {
    adapter: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> DeleteAccountUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    /// `password` is required when the user has a credential account
    pub async fn execute(&self, session: &Session, password: Option<String>) -> AuthResult<()> {
        let store = AuthStore::new(self.adapter.clone());
        let user_id = session.user_id.as_str();

        if let Some(phc) = store
            .credential_account(user_id)
            .await?
            .and_then(|account| account.password)
        {
            let password = password.ok_or(AuthError::InvalidPassword)?;
            let stored = UserPassword::from_stored(&phc)?;
            if !stored.verify(&RawPassword::candidate(password), self.config.pepper()) {
                return Err(AuthError::InvalidPassword);
            }
        }

        let sessions = store.delete_sessions_for_user(user_id).await?;
        let accounts = store.delete_accounts_for_user(user_id).await?;
        store.delete_user(user_id).await?;

        tracing::info!(
            user_id = %user_id,
            sessions = sessions,
            accounts = accounts,
            "Account deleted"
        );
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

    #[tokio::test]
    async fn test_delete_account() {
        let adapter = Arc::new(MemoryAdapter::default());
        let config = Arc::new(AuthConfig::development());
        let session = SignUpUseCase::new(adapter.clone(), config.clone())
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
            .unwrap()
            .session
            .unwrap()
            .session;

        let use_case = DeleteAccountUseCase::new(adapter.clone(), config);
        assert!(matches!(
            use_case.execute(&session, None).await,
            Err(AuthError::InvalidPassword)
        ));
        assert!(matches!(
            use_case.execute(&session, Some("wrong-password".into())).await,
            Err(AuthError::InvalidPassword)
        ));

        use_case
            .execute(&session, Some("password1234".into()))
            .await
            .unwrap();
        for model in [models::USER, models::ACCOUNT, models::SESSION] {
            assert_eq!(adapter.count(model, &[]).await.unwrap(), 0);
        }
    }
}
