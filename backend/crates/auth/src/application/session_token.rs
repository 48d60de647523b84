//! Session Token
//!
//! The session cookie carries `<token>.<signature>`, where the signature is
//! the base64url HMAC-SHA256 of the token under the configured secret.

use platform::crypto::{from_base64url, hmac_sha256, random_string, to_base64url, verify_hmac_sha256};

use crate::error::{AuthError, AuthResult};

/// Length of the random token stored on the session record
pub const SESSION_TOKEN_LENGTH: usize = 32;

pub fn generate() -> String {
    random_string(SESSION_TOKEN_LENGTH)
}

/// Cookie value for `token`
pub fn sign(secret: &[u8], token: &str) -> String {
    let signature = hmac_sha256(secret, token.as_bytes());
    format!("{token}.{}", to_base64url(&signature))
}

/// Verify a cookie value and return the bare token
pub fn verify<'a>(secret: &[u8], cookie_value: &'a str) -> AuthResult<&'a str> {
    let (token, signature_b64) = cookie_value
        .rsplit_once('.')
        .ok_or(AuthError::SessionInvalid)?;
    if token.is_empty() {
        return Err(AuthError::SessionInvalid);
    }

    let signature = from_base64url(signature_b64).map_err(|_| AuthError::SessionInvalid)?;
    if !verify_hmac_sha256(secret, token.as_bytes(), &signature) {
        return Err(AuthError::SessionInvalid);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_sign_and_verify() {
        let token = generate();
        assert_eq!(token.len(), SESSION_TOKEN_LENGTH);

        let cookie = sign(SECRET, &token);
        assert_eq!(verify(SECRET, &cookie).unwrap(), token);
    }

    #[test]
    fn test_rejects_tampering() {
        let cookie = sign(SECRET, "abc");
        assert!(verify(b"other-secret", &cookie).is_err());
        assert!(verify(SECRET, &cookie.replacen("abc", "abd", 1)).is_err());
        assert!(verify(SECRET, "abc").is_err());
        assert!(verify(SECRET, "abc.!!!").is_err());
        assert!(verify(SECRET, &cookie[3..]).is_err());
    }
}
