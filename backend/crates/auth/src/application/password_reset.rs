//! Password Reset Use Case
//!
//! Request: a one-hour verification record `reset-password:<token>` whose
//! value is the user id, and a link handed to the [`ResetPasswordSender`].
//! Complete: the token is consumed and the credential password replaced.

use std::sync::Arc;

use chrono::Utc;
use platform::crypto::random_string;
use platform::url::encode_component;

use crate::application::config::AuthConfig;
use crate::application::notifier::ResetPasswordSender;
use crate::application::store::AuthStore;
use crate::domain::adapter::Adapter;
use crate::domain::entity::account::NewAccount;
use crate::domain::entity::verification::{NewVerification, Verification, reset_password_identifier};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

const RESET_TOKEN_LENGTH: usize = 24;

/// Page the reset link lands on when the caller names none
pub const DEFAULT_RESET_CALLBACK: &str = "/auth/reset-password";

/// Password reset use case
pub struct PasswordResetUseCase<A> {
    store: AuthStore<A>,
    config: Arc<AuthConfig>,
    sender: Arc<dyn ResetPasswordSender>,
}

impl<A: Adapter> PasswordResetUseCase<A> {
    pub fn new(adapter: Arc<A>, config: Arc<AuthConfig>, sender: Arc<dyn ResetPasswordSender>) -> Self {
        Self {
            store: AuthStore::new(adapter),
            config,
            sender,
        }
    }

    /// Issue a reset link
    ///
    /// Unknown addresses succeed silently so the endpoint does not reveal
    /// which emails are registered.
    pub async fn request(&self, email: &str, redirect_to: Option<&str>) -> AuthResult<()> {
        let email = Email::parse(email)?;

        let Some(user) = self.store.user_by_email(&email).await? else {
            tracing::info!(email_domain = %email.domain(), "Password reset requested for unknown email");
            return Ok(());
        };

        let token = random_string(RESET_TOKEN_LENGTH);
        self.store
            .create_verification(&NewVerification {
                identifier: reset_password_identifier(&token),
                value: user.id.clone(),
                expires_at: Utc::now() + self.config.reset_token_ttl_chrono(),
            })
            .await?;

        let callback = redirect_to
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_RESET_CALLBACK);
        let url = format!(
            "{}/api/auth/reset-password/{}?callbackURL={}",
            self.config.base_url,
            token,
            encode_component(callback)
        );

        self.sender.send(&user.email, &url)?;
        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Live verification record for `token`; expired ones are removed
    pub async fn check_token(&self, token: &str) -> AuthResult<Verification> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let verification = self
            .store
            .verification_by_identifier(&reset_password_identifier(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if verification.is_expired(Utc::now()) {
            self.store.delete_verification(&verification.id).await?;
            return Err(AuthError::InvalidToken);
        }
        Ok(verification)
    }

    /// Set a new password with a reset token
    pub async fn reset(&self, token: &str, new_password: String) -> AuthResult<()> {
        let raw_password = RawPassword::new(new_password, &self.config.password_policy)?;
        let verification = self.check_token(token).await?;
        let user_id = verification.value.clone();

        if self.store.user_by_id(&user_id).await?.is_none() {
            self.store.delete_verification(&verification.id).await?;
            return Err(AuthError::InvalidToken);
        }

        let phc = UserPassword::from_raw(&raw_password, self.config.pepper())?.into_phc_string();
        match self.store.credential_account(&user_id).await? {
            Some(account) => {
                self.store.set_account_password(&account.id, phc).await?;
            }
            None => {
                self.store
                    .create_account(&NewAccount::credential(&user_id, phc))
                    .await?;
            }
        }

        self.store.delete_verification(&verification.id).await?;
        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notifier::RecordingResetPasswordSender;
    use crate::application::sign_in::{SignInInput, SignInUseCase};
    use crate::application::sign_up::{SignUpInput, SignUpUseCase};
    use crate::application::store::timestamp;
    use crate::domain::adapter::{Record, Where};
    use crate::domain::schema::models;
    use crate::infra::memory::MemoryAdapter;
    use platform::client::ClientInfo;

    struct Fixture {
        adapter: Arc<MemoryAdapter>,
        config: Arc<AuthConfig>,
        sender: Arc<RecordingResetPasswordSender>,
        use_case: PasswordResetUseCase<MemoryAdapter>,
    }

    async fn fixture() -> Fixture {
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
        let sender = Arc::new(RecordingResetPasswordSender::default());
        Fixture {
            use_case: PasswordResetUseCase::new(adapter.clone(), config.clone(), sender.clone()),
            adapter,
            config,
            sender,
        }
    }

    fn token_from(url: &str) -> String {
        let path = url.split('?').next().unwrap();
        path.rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_request_sends_link() {
        let f = fixture().await;
        f.use_case
            .request("ann@example.com", Some("/auth/reset-password"))
            .await
            .unwrap();

        let url = f.sender.last_url_for("ann@example.com").unwrap();
        assert!(url.starts_with("http://localhost:5173/api/auth/reset-password/"));
        assert!(url.ends_with("?callbackURL=%2Fauth%2Freset-password"));
        assert_eq!(token_from(&url).len(), RESET_TOKEN_LENGTH);
        assert_eq!(f.adapter.count(models::VERIFICATION, &[]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_email_is_silent() {
        let f = fixture().await;
        f.use_case.request("bob@example.com", None).await.unwrap();
        assert!(f.sender.sent().is_empty());

        let err = f.use_case.request("not-an-email", None).await.err().unwrap();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn test_reset_replaces_password() {
        let f = fixture().await;
        f.use_case.request("ann@example.com", None).await.unwrap();
        let token = token_from(&f.sender.last_url_for("ann@example.com").unwrap());

        f.use_case.reset(&token, "new-password-1".into()).await.unwrap();

        let sign_in = SignInUseCase::new(f.adapter.clone(), f.config.clone());
        let attempt = |password: &str| SignInInput {
            email: "ann@example.com".into(),
            password: password.into(),
            remember_me: true,
        };
        assert!(sign_in.execute(attempt("password1234"), &ClientInfo::default()).await.is_err());
        assert!(sign_in.execute(attempt("new-password-1"), &ClientInfo::default()).await.is_ok());

        // single use
        let err = f.use_case.reset(&token, "another-password".into()).await.err().unwrap();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let f = fixture().await;
        f.use_case.request("ann@example.com", None).await.unwrap();
        let token = token_from(&f.sender.last_url_for("ann@example.com").unwrap());

        let mut patch = Record::new();
        patch.insert("expiresAt".into(), timestamp(Utc::now() - chrono::Duration::seconds(1)));
        f.adapter
            .update(
                models::VERIFICATION,
                &[Where::eq("identifier", reset_password_identifier(&token))],
                patch,
            )
            .await
            .unwrap();

        assert!(matches!(f.use_case.check_token(&token).await, Err(AuthError::InvalidToken)));
        assert_eq!(f.adapter.count(models::VERIFICATION, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_weak_new_password() {
        let f = fixture().await;
        let err = f.use_case.reset("whatever", "short".into()).await.err().unwrap();
        assert!(matches!(err, AuthError::PasswordValidation(_)));
    }
}
