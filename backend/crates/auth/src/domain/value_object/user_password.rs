//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: policy errors become
//! `AuthError::PasswordValidation`, hashing failures `AuthError::Internal`.

use platform::password::{
    ClearTextPassword, HashedPassword, PasswordPolicy, PasswordPolicyError,
};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Password as typed by the user, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a new password against `policy`
    pub fn new(raw: String, policy: &PasswordPolicy) -> AuthResult<Self> {
        ClearTextPassword::new(raw, policy)
            .map(Self)
            .map_err(|e| AuthError::PasswordValidation(policy_message(&e)))
    }

    /// Wrap a sign-in attempt; never rejected
    pub fn candidate(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }
}

fn policy_message(error: &PasswordPolicyError) -> String {
    match error {
        PasswordPolicyError::TooShort { min, .. } => {
            format!("Password must be at least {min} characters")
        }
        PasswordPolicyError::TooLong { max, .. } => {
            format!("Password must be at most {max} characters")
        }
        PasswordPolicyError::EmptyOrWhitespace => "Password cannot be empty".to_string(),
        PasswordPolicyError::InvalidCharacter => {
            "Password contains invalid characters".to_string()
        }
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Stored Argon2id hash
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Parse the PHC string stored on a credential account
    pub fn from_stored(phc: &str) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }

    pub fn into_phc_string(self) -> String {
        self.0.as_phc_string().to_string()
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserPassword").field(&"[HASH]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors_are_user_facing() {
        let policy = PasswordPolicy::default();
        let err = RawPassword::new("short".to_string(), &policy).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn test_hash_roundtrip_through_storage() {
        let policy = PasswordPolicy::default();
        let raw = RawPassword::new("password1234".to_string(), &policy).unwrap();
        let stored = UserPassword::from_raw(&raw, None).unwrap().into_phc_string();

        let hashed = UserPassword::from_stored(&stored).unwrap();
        assert!(hashed.verify(&RawPassword::candidate("password1234".into()), None));
        assert!(!hashed.verify(&RawPassword::candidate("password12345".into()), None));
        assert!(UserPassword::from_stored("plain").is_err());
    }
}
