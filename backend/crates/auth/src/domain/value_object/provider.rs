//! OAuth Provider Name Value Object

use crate::domain::entity::account::CREDENTIAL_PROVIDER;
use crate::error::{AuthError, AuthResult};

const PROVIDER_MAX_LENGTH: usize = 32;

/// Lowercase provider name such as `github` or `google`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provider(String);

impl Provider {
    pub fn new(raw: impl AsRef<str>) -> AuthResult<Self> {
        let name = raw.as_ref().trim().to_ascii_lowercase();

        let valid = !name.is_empty()
            && name.len() <= PROVIDER_MAX_LENGTH
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && name != CREDENTIAL_PROVIDER;

        if !valid {
            return Err(AuthError::InvalidInput(format!(
                "Invalid provider: {}",
                raw.as_ref()
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::new(" GitHub ").unwrap().as_str(), "github");
        assert!(Provider::new("google-oauth2").is_ok());
        assert!(Provider::new("").is_err());
        assert!(Provider::new("credential").is_err());
        assert!(Provider::new("git hub").is_err());
        assert!(Provider::new("a".repeat(33)).is_err());
    }
}
