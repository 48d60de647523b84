//! Application Configuration
//!
//! Configuration for the Auth application layer, read from the process
//! environment by the binary and built directly in tests.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::password::PasswordPolicy;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Prefix of every auth cookie
pub const DEFAULT_COOKIE_PREFIX: &str = "better-auth";

/// Deployment environment (`APP_ENV`, falling back to `NODE_ENV`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Key for HMAC signing of session cookies
    pub secret: Vec<u8>,
    /// Public origin of the app, used for reset links
    pub base_url: String,
    pub cookie_prefix: String,
    /// Whether to require Secure cookie (and the `__Secure-` prefix)
    pub cookie_secure: bool,
    /// Session lifetime (7 days)
    pub session_expires_in: Duration,
    /// Age after which an active session's expiry is pushed back (1 day)
    pub session_update_age: Duration,
    pub password_policy: PasswordPolicy,
    /// Lifetime of password reset tokens (1 hour)
    pub reset_token_ttl: Duration,
    /// Sign the user in right after sign up
    pub auto_sign_in: bool,
    pub environment: Environment,
    pub dev_login_enabled: bool,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("base_url", &self.base_url)
            .field("cookie_prefix", &self.cookie_prefix)
            .field("cookie_secure", &self.cookie_secure)
            .field("session_expires_in", &self.session_expires_in)
            .field("environment", &self.environment)
            .field("dev_login_enabled", &self.dev_login_enabled)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: Vec::new(),
            base_url: "http://localhost:5173".to_string(),
            cookie_prefix: DEFAULT_COOKIE_PREFIX.to_string(),
            cookie_secure: false,
            session_expires_in: Duration::from_secs(7 * 24 * 3600), // 7 days
            session_update_age: Duration::from_secs(24 * 3600),    // 1 day
            password_policy: PasswordPolicy::default(),
            reset_token_ttl: Duration::from_secs(3600),
            auto_sign_in: true,
            environment: Environment::Development,
            dev_login_enabled: false,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, dev login on)
    pub fn development() -> Self {
        Self {
            dev_login_enabled: true,
            ..Self::with_random_secret()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("APP_ENV")
            .or_else(|| non_empty("NODE_ENV"))
            .map(|env| Environment::parse(&env))
            .unwrap_or_default();

        let secret = match non_empty("BETTER_AUTH_SECRET") {
            Some(secret) => secret.into_bytes(),
            None if environment == Environment::Production => {
                return Err(ConfigError::Missing("BETTER_AUTH_SECRET"));
            }
            None => {
                tracing::warn!("BETTER_AUTH_SECRET not set, using a random secret");
                platform::crypto::random_bytes(32)
            }
        };

        let base_url = non_empty("BETTER_AUTH_URL")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "BETTER_AUTH_URL",
                reason: format!("expected an http(s) URL, got {base_url}"),
            });
        }

        let dev_login_requested = non_empty("DEV_LOGIN")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(environment != Environment::Production);

        Ok(Self {
            secret,
            cookie_secure: base_url.starts_with("https://"),
            base_url,
            environment,
            dev_login_enabled: dev_login_requested && environment != Environment::Production,
            password_pepper: non_empty("AUTH_PASSWORD_PEPPER").map(String::into_bytes),
            ..Default::default()
        })
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn session_expires_in_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_expires_in.as_secs() as i64)
    }

    pub fn session_update_age_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_update_age.as_secs() as i64)
    }

    pub fn reset_token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reset_token_ttl.as_secs() as i64)
    }

    /// `better-auth`, or `__Secure-better-auth` when cookies are Secure
    pub fn cookie_name_prefix(&self) -> String {
        if self.cookie_secure {
            format!("__Secure-{}", self.cookie_prefix)
        } else {
            self.cookie_prefix.clone()
        }
    }

    fn cookie(&self, suffix: &str) -> CookieConfig {
        CookieConfig::prefixed(&self.cookie_name_prefix(), suffix, self.cookie_secure)
    }

    /// Session cookie; a browser-session cookie when `remember_me` is off
    pub fn session_cookie(&self, remember_me: bool) -> CookieConfig {
        let cookie = self.cookie("session_token");
        if remember_me {
            cookie.with_max_age(self.session_expires_in.as_secs() as i64)
        } else {
            cookie
        }
    }

    pub fn session_data_cookie(&self) -> CookieConfig {
        self.cookie("session_data")
    }

    pub fn dont_remember_cookie(&self) -> CookieConfig {
        self.cookie("dont_remember")
    }
}
