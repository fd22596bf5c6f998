//! OAuth 1.0 PLAINTEXT request signing.
//!
//! The controller authenticates API calls with a three-part token and the
//! PLAINTEXT signature method: the signature is the percent-encoded token
//! secret prefixed with `&` (the consumer secret is empty). Every request
//! gets a fresh nonce and timestamp.

use chrono::Utc;
use uuid::Uuid;

use crate::credentials::ApiKey;

/// Percent-encode a value for use inside the OAuth header.
///
/// Only RFC 3986 unreserved characters pass through unescaped.
fn oauth_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Build the `Authorization` header value for one request.
pub(crate) fn authorization_header(key: &ApiKey) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    let timestamp = Utc::now().timestamp();
    let signature = format!("&{}", key.token_secret);

    format!(
        "OAuth oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", \
         oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_signature=\"{}\", \
         oauth_nonce=\"{}\", oauth_timestamp=\"{}\"",
        oauth_encode(&key.consumer_key),
        oauth_encode(&key.token),
        oauth_encode(&signature),
        oauth_encode(&nonce),
        timestamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        "consumer:token:secret".parse().unwrap()
    }

    #[test]
    fn header_carries_all_oauth_fields() {
        let header = authorization_header(&key());
        assert!(header.starts_with("OAuth "));
        for field in [
            "oauth_version=\"1.0\"",
            "oauth_signature_method=\"PLAINTEXT\"",
            "oauth_consumer_key=\"consumer\"",
            "oauth_token=\"token\"",
            "oauth_nonce=",
            "oauth_timestamp=",
        ] {
            assert!(header.contains(field), "missing {field} in {header}");
        }
    }

    #[test]
    fn plaintext_signature_is_encoded_secret() {
        let header = authorization_header(&key());
        // '&' percent-encodes to %26.
        assert!(header.contains("oauth_signature=\"%26secret\""));
    }

    #[test]
    fn nonces_are_unique_per_request() {
        let a = authorization_header(&key());
        let b = authorization_header(&key());
        assert_ne!(a, b);
    }

    #[test]
    fn encode_escapes_reserved_bytes() {
        assert_eq!(oauth_encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(oauth_encode("AZaz09-._~"), "AZaz09-._~");
    }
}
