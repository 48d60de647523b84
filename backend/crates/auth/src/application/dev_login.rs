//! Dev Login Use Case
//!
//! One-call login for local development and browser tests: sign in, or
//! create the account first when sign-in fails.

use std::sync::Arc;

use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::sign_in::{SignInInput, SignInOutput, SignInUseCase};
use crate::application::sign_up::{SignUpInput, SignUpUseCase};
use crate::domain::adapter::Adapter;
use crate::error::{AuthError, AuthResult};

pub const DEV_LOGIN_EMAIL: &str = "dev+e2e@example.com";
pub const DEV_LOGIN_PASSWORD: &str = "password1234";
pub const DEV_LOGIN_NAME: &str = "Dev User";

pub struct DevLoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

pub struct DevLoginUseCase<A> {
    adapter: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> DevLoginUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    pub async fn execute(&self, input: DevLoginInput, client: &ClientInfo) -> AuthResult<SignInOutput> {
        if !self.config.dev_login_enabled || self.config.is_production() {
            return Err(AuthError::DevLoginDisabled);
        }

        let non_empty = |v: Option<String>, default: &str| {
            v.filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let email = non_empty(input.email, DEV_LOGIN_EMAIL);
        let password = non_empty(input.password, DEV_LOGIN_PASSWORD);
        let name = non_empty(input.name, DEV_LOGIN_NAME);

        let sign_in = SignInUseCase::new(self.adapter.clone(), self.config.clone());
        let attempt = || SignInInput {
            email: email.clone(),
            password: password.clone(),
            remember_me: true,
        };

        match sign_in.execute(attempt(), client).await {
            Ok(output) => return Ok(output),
            Err(AuthError::InvalidCredentials) => {}
            Err(e) => return Err(e),
        }

        tracing::info!(email = %email, "Dev login: creating account");
        let signed_up = SignUpUseCase::new(self.adapter.clone(), self.config.clone())
            .execute(
                SignUpInput {
                    name,
                    email: email.clone(),
                    password: password.clone(),
                    image: None,
                    remember_me: true,
                },
                client,
            )
            .await?;

        match signed_up.session {
            Some(session) => Ok(SignInOutput {
                user: signed_up.user,
                session,
            }),
            None => sign_in.execute(attempt(), client).await,
        }
    }
}
