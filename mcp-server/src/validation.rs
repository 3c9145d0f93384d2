//! Parameter schema validation (spec.md §6): every inbound tool argument
//! object is deserialized through `serde_path_to_error` so a malformed or
//! missing field reports a `{field_path, message}` pair rather than a bare
//! serde error string.

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field_path: String,
    pub message: String,
}

/// Deserialize `arguments` into `T`, reporting the first failing field path.
pub fn parse_params<T: DeserializeOwned>(arguments: &serde_json::Value) -> Result<T, FieldError> {
    serde_path_to_error::deserialize(arguments).map_err(|err| {
        let path = err.path().to_string();
        FieldError {
            field_path: if path.is_empty() { "$".to_string() } else { path },
            message: err.into_inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[allow(dead_code)]
        name: String,
        #[allow(dead_code)]
        depth: u8,
    }

    #[test]
    fn reports_the_offending_field_path() {
        let value = json!({"name": "x", "depth": "not-a-number"});
        let err = parse_params::<Sample>(&value).unwrap_err();
        assert_eq!(err.field_path, "depth");
    }

    #[test]
    fn missing_required_field_is_reported() {
        let value = json!({"depth": 1});
        let err = parse_params::<Sample>(&value).unwrap_err();
        assert!(err.message.contains("name") || err.field_path.contains("name"));
    }
}
