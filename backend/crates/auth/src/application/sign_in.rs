//! Sign In Use Case
//!
//! Authenticates a user by email and password and creates a session.

use std::sync::Arc;

use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, SessionService};
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::user::User;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Remember me flag
    pub remember_me: bool,
}

/// Sign in output
pub struct SignInOutput {
    pub user: User,
    pub session: IssuedSession,
}

/// Sign in use case
pub struct SignInUseCase<A> {
    adapter: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> SignInUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    pub async fn execute(&self, input: SignInInput, client: &ClientInfo) -> AuthResult<SignInOutput> {
        let user = self.verify_credentials(&input.email, input.password).await?;

        let sessions = SessionService::new(self.adapter.clone(), self.config.clone());
        let session = sessions.create(&user.id, client, input.remember_me).await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.session.id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput { user, session })
    }

    /// Every mismatch reports the same error
    async fn verify_credentials(&self, email: &str, password: String) -> AuthResult<User> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let store = AuthStore::new(self.adapter.clone());

        let user = store
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = store
            .credential_account(&user.id)
            .await?
            .and_then(|account| account.password)
            .ok_or(AuthError::InvalidCredentials)?;

        let stored = UserPassword::from_stored(&hash)?;
        if !stored.verify(&RawPassword::candidate(password), self.config.pepper()) {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_up::{SignUpInput, SignUpUseCase};
    use crate::infra::memory::MemoryAdapter;

    async fn setup() -> SignInUseCase<MemoryAdapter> {
        let adapter = Arc::new(MemoryAdapter::default());
        let config = Arc::new(AuthConfig::development());
        SignUpUseCase::new(adapter.clone(), config.clone())
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
        SignInUseCase::new(adapter, config)
    }

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    #[tokio::test]
    async fn test_sign_in() {
        let use_case = setup().await;
        let output = use_case
            .execute(input("ANN@example.com", "password1234"), &ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(output.user.email, "ann@example.com");
        assert!(!output.session.remember_me);
        assert_eq!(output.session.session.user_id, output.user.id);
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_indistinguishable() {
        let use_case = setup().await;
        let client = ClientInfo::default();
        for (email, password) in [
            ("ann@example.com", "wrong-password"),
            ("bob@example.com", "password1234"),
            ("not-an-email", "password1234"),
        ] {
            let err = use_case.execute(input(email, password), &client).await.err().unwrap();
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }
}
