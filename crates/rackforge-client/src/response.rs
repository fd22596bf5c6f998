//! Decoded API responses.

use serde::Serialize;
use serde_json::Value;

/// A response body: JSON when it parses, raw text otherwise.
///
/// A handful of controller endpoints answer with plain text; a body that
/// fails to parse as JSON is never an error at this layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Successfully decoded JSON document.
    Json(Value),
    /// Raw body text kept opaque.
    Text(String),
}

impl Payload {
    /// Decode a body, falling back to raw text on parse failure.
    #[must_use]
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::Json(value),
            Err(err) => {
                tracing::debug!(error = %err, "response body is not JSON, keeping raw text");
                Self::Text(body.to_string())
            }
        }
    }

    /// The decoded JSON document, if this payload is JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Convert into a plain JSON value (raw text becomes a JSON string).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// A decoded API response.
///
/// `ok` and `data` are derived from the raw HTTP exchange, not transmitted
/// by the controller.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// True for 2xx statuses.
    pub ok: bool,
    /// Decoded body.
    pub data: Payload,
}

impl Response {
    /// Assemble a response from the raw status and body text.
    #[must_use]
    pub fn from_parts(status_code: u16, body: &str) -> Self {
        Self {
            status_code,
            ok: (200..300).contains(&status_code),
            data: Payload::decode(body),
        }
    }

    /// The JSON document, if the body decoded as JSON.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.data.as_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_bodies_decode() {
        let resp = Response::from_parts(200, r#"{"system_id": "xc4n7d"}"#);
        assert!(resp.ok);
        assert_eq!(resp.json().unwrap()["system_id"], json!("xc4n7d"));
    }

    #[test]
    fn non_json_bodies_fall_back_to_text() {
        let resp = Response::from_parts(200, "OK\n");
        assert!(resp.ok);
        assert_eq!(resp.data, Payload::Text("OK\n".to_string()));
    }

    #[test]
    fn ok_tracks_2xx_only() {
        assert!(Response::from_parts(204, "").ok);
        assert!(!Response::from_parts(404, "{}").ok);
        assert!(!Response::from_parts(302, "").ok);
    }

    #[test]
    fn into_value_wraps_text() {
        assert_eq!(
            Payload::Text("gone".to_string()).into_value(),
            json!("gone")
        );
        assert_eq!(Payload::Json(json!([1, 2])).into_value(), json!([1, 2]));
    }
}
