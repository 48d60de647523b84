//! Display Name Value Object

use crate::error::{AuthError, AuthResult};

pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;

/// Trimmed user name, 1 to 100 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(raw: impl AsRef<str>) -> AuthResult<Self> {
        let name = raw.as_ref().trim();
        let len = name.chars().count();

        if len == 0 {
            return Err(AuthError::InvalidInput("Name is required".to_string()));
        }
        if len > DISPLAY_NAME_MAX_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Name must be at most {DISPLAY_NAME_MAX_LENGTH} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AuthError::InvalidInput(
                "Name contains invalid characters".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(DisplayName::new("").is_err());
        assert!(DisplayName::new("   ").is_err());
        assert!(DisplayName::new("a").is_ok());
        assert!(DisplayName::new("é".repeat(100)).is_ok());
        assert!(DisplayName::new("x".repeat(101)).is_err());
        assert!(DisplayName::new("a\u{0000}b").is_err());
    }

    #[test]
    fn test_trims() {
        assert_eq!(DisplayName::new("  Dev User ").unwrap().as_str(), "Dev User");
    }
}
