//! URL component encoding
//!
//! Percent-encoding for values placed into redirect query strings
//! (`?next=...`, `?callbackURL=...`).

/// Percent-encode everything outside the RFC 3986 unreserved set
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_and_query() {
        assert_eq!(
            encode_component("/user/profile?tab=security"),
            "%2Fuser%2Fprofile%3Ftab%3Dsecurity"
        );
    }

    #[test]
    fn test_unreserved_untouched() {
        assert_eq!(encode_component("abc-XYZ_0.9~"), "abc-XYZ_0.9~");
    }

    #[test]
    fn test_multibyte() {
        assert_eq!(encode_component("é"), "%C3%A9");
    }
}
