//! Sign Up Use Case
//!
//! Creates a new user with a credential account and, when auto sign-in is
//! enabled, a session.

use std::sync::Arc;

use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, SessionService};
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::account::NewAccount;
use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{
    display_name::DisplayName, email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub image: Option<String>,
    pub remember_me: bool,
}

/// Sign up output
pub struct SignUpOutput {
    pub user: User,
    /// Present when auto sign-in is enabled
    pub session: Option<IssuedSession>,
}

/// Sign up use case
pub struct SignUpUseCase<A> {
    adapter: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A: Adapter> SignUpUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    pub async fn execute(&self, input: SignUpInput, client: &ClientInfo) -> AuthResult<SignUpOutput> {
        let email = Email::parse(&input.email)?;
        let name = DisplayName::new(&input.name)?;

        // Validate and hash password
        let raw_password = RawPassword::new(input.password, &self.config.password_policy)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let store = AuthStore::new(self.adapter.clone());
        if store.user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = store
            .create_user(&NewUser {
                name: name.into_inner(),
                email: email.as_str().to_string(),
                image: input.image.filter(|i| !i.trim().is_empty()),
            })
            .await?;

        if let Err(e) = store
            .create_account(&NewAccount::credential(&user.id, password_hash.into_phc_string()))
            .await
        {
            // No half-created users
            let _ = store.delete_user(&user.id).await;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, email_domain = %email.domain(), "User signed up");

        let session = if self.config.auto_sign_in {
            let sessions = SessionService::new(self.adapter.clone(), self.config.clone());
            Some(sessions.create(&user.id, client, input.remember_me).await?)
        } else {
            None
        };

        Ok(SignUpOutput { user, session })
    }
}
