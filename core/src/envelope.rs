//! Decoding of the `{result | error, code}` response envelope.
//!
//! An envelope whose `error` is present and non-null is an API error, no
//! matter what else it carries. Otherwise `result` is decoded into the
//! destination type the endpoint declared. A missing `result` decodes as
//! `null`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    warnings: Option<Value>,
}

/// Decode a response body into `T`, or into `Error::Api` when the envelope
/// carries an error.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope = serde_json::from_str(body)?;

    if let Some(warnings) = &envelope.warnings {
        log_warnings(warnings);
    }

    if let Some(error) = envelope.error {
        return Err(api_error(error, envelope.code));
    }

    let result = envelope.result.unwrap_or(Value::Null);
    Ok(serde_json::from_value(result)?)
}

fn api_error(error: Value, code: Option<Value>) -> Error {
    let code = code.as_ref().map(text).unwrap_or_default();
    match error {
        Value::Object(fields) => Error::Api {
            code: fields.get("code").map(text).unwrap_or(code),
            message: fields.get("message").map(text).unwrap_or_default(),
        },
        other => Error::Api {
            code,
            message: text(&other),
        },
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn log_warnings(warnings: &Value) {
    let Some(items) = warnings.as_array() else {
        warn!(warnings = %warnings, "API returned warnings");
        return;
    };
    for item in items {
        match item.get("warning").and_then(Value::as_str) {
            Some(message) => warn!(%message, "API warning"),
            None => warn!(warning = %item, "API warning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{List, PersonEmail};

    #[test]
    fn success_envelope_decodes_result() {
        let body = r#"{"result": {"email": "a@example.com", "status": "new"}}"#;
        let email: PersonEmail = decode(body).unwrap();
        assert_eq!(email.email, "a@example.com");
        assert_eq!(email.status, "new");
    }

    #[test]
    fn string_error_is_api_error_verbatim() {
        let body = r#"{"error": "invalid_api_key", "code": 1}"#;
        let err = decode::<PersonEmail>(body).unwrap_err();
        match err {
            Error::Api { code, message } => {
                assert_eq!(message, "invalid_api_key");
                assert_eq!(code, "1");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn string_code_is_kept_as_is() {
        let body = r#"{"error": "AK100: Invalid api key", "code": "invalid_api_key"}"#;
        let err = decode::<Vec<List>>(body).unwrap_err();
        assert_eq!(err.api_code(), Some("invalid_api_key"));
        assert_eq!(err.to_string(), "API error [invalid_api_key]: AK100: Invalid api key");
    }

    #[test]
    fn object_error_uses_its_fields() {
        let body = r#"{"error": {"code": "not_found", "message": "no such list"}}"#;
        let err = decode::<Vec<List>>(body).unwrap_err();
        match err {
            Error::Api { code, message } => {
                assert_eq!(code, "not_found");
                assert_eq!(message, "no such list");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn error_wins_over_result() {
        let body = r#"{"result": [], "error": "boom", "code": "x"}"#;
        let err = decode::<Vec<List>>(body).unwrap_err();
        assert!(err.is_api_error());
    }

    #[test]
    fn null_error_is_not_an_error() {
        let body = r#"{"result": [{"id": 1, "title": "News"}], "error": null}"#;
        let lists: Vec<List> = decode(body).unwrap();
        assert_eq!(lists.len(), 1);
    }

    #[test]
    fn shape_mismatch_is_decode_error() {
        let body = r#"{"result": {"id": 1}}"#;
        let err = decode::<Vec<List>>(body).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = decode::<Vec<List>>("<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn missing_result_decodes_as_null() {
        let value: Option<Vec<List>> = decode("{}").unwrap();
        assert!(value.is_none());
        assert!(matches!(decode::<Vec<List>>("{}"), Err(Error::Decode(_))));
    }

    #[test]
    fn warnings_do_not_fail_the_call() {
        let body = r#"{"result": [], "warnings": [{"warning": "list is empty"}]}"#;
        let lists: Vec<List> = decode(body).unwrap();
        assert!(lists.is_empty());
    }
}
