//! Maps classified core errors and parameter validation failures onto
//! JSON-RPC error objects (spec.md §7's taxonomy carried across the
//! transport boundary).

use reasoning_core::error::CoreError;
use reasoning_core::error::ErrorCategory;
use reasoning_core::error::classify;
use reasoning_protocol::jsonrpc::JsonRpcErrorObject;
use serde_json::json;

use crate::validation::FieldError;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const SESSION_ERROR: i64 = -32001;
pub const API_ERROR: i64 = -32002;
pub const FILESYSTEM_ERROR: i64 = -32003;
pub const UNKNOWN_ERROR: i64 = -32000;

pub fn from_core_error(err: &CoreError) -> JsonRpcErrorObject {
    let classification = classify(err);
    let code = match classification.category {
        ErrorCategory::Session => SESSION_ERROR,
        ErrorCategory::Api => API_ERROR,
        ErrorCategory::Filesystem => FILESYSTEM_ERROR,
        ErrorCategory::Unknown => UNKNOWN_ERROR,
    };
    JsonRpcErrorObject {
        code,
        message: classification.description.clone(),
        data: Some(json!({
            "code": classification.code.to_string(),
            "retryable": classification.retryable,
            "next_steps": classification.next_steps,
        })),
    }
}

pub fn invalid_params(errors: &[FieldError]) -> JsonRpcErrorObject {
    JsonRpcErrorObject {
        code: INVALID_PARAMS,
        message: "one or more parameters failed validation".to_string(),
        data: Some(json!({ "errors": errors })),
    }
}

pub fn method_not_found(method: &str) -> JsonRpcErrorObject {
    JsonRpcErrorObject {
        code: METHOD_NOT_FOUND,
        message: format!("unknown method `{method}`"),
        data: None,
    }
}

pub fn unknown_tool(name: &str) -> JsonRpcErrorObject {
    JsonRpcErrorObject {
        code: INVALID_PARAMS,
        message: format!("unknown tool `{name}`"),
        data: None,
    }
}
