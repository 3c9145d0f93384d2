//! The closed error taxonomy of spec.md §7, plus the classifier that maps
//! every failure the core can produce — and any heterogeneous third-party
//! error — onto it exactly once.
//!
//! Mirrors the shape of `codex-core::error::CodexErr`: one `thiserror` enum
//! per internal failure mode with `#[from]` conversions for the handful of
//! external error types we actually propagate, plus a separate classifier
//! (spec.md keeps classification as its own component, §4.3) rather than
//! letting call sites interpret errors ad hoc.

use std::fmt;

use strum_macros::Display;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session is locked by another caller")]
    SessionLocked,

    #[error("session has been idle past the timeout")]
    SessionTimeout,

    #[error("session is already completed")]
    SessionCompleted,

    #[error("authentication with the remote service failed: {0}")]
    ApiAuth(String),

    #[error("remote service rate limit exceeded")]
    RateLimit { retry_after_secs: Option<u64> },

    #[error("could not parse a structured result out of the remote response: {0}")]
    ApiParse(String),

    #[error("path `{0}` escapes the project root")]
    PathTraversal(String),

    #[error("`{0}` has a file type outside the allow-list")]
    InvalidFileType(String),

    #[error("`{0}` exceeds the {1} byte size cap")]
    FileTooLarge(String, u64),

    #[error("`{0}` is not a regular file")]
    NotAFile(String),

    #[error("filesystem error on `{0}`: {1}")]
    Fs(String, std::io::Error),

    #[error("{0}")]
    Unknown(String),
}

impl CoreError {
    pub fn fs(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Fs(path.into(), source)
    }
}

/// The four top-level categories of spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Session,
    Api,
    Filesystem,
    Unknown,
}

/// Stable short codes, one per taxonomy entry (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorCode {
    #[strum(serialize = "SESSION_NOT_FOUND")]
    SessionNotFound,
    #[strum(serialize = "SESSION_LOCKED")]
    SessionLocked,
    #[strum(serialize = "SESSION_TIMEOUT")]
    SessionTimeout,
    #[strum(serialize = "SESSION_COMPLETED")]
    SessionCompleted,
    #[strum(serialize = "API_AUTH_ERROR")]
    ApiAuthError,
    #[strum(serialize = "RATE_LIMIT_ERROR")]
    RateLimitError,
    #[strum(serialize = "API_PARSE_ERROR")]
    ApiParseError,
    #[strum(serialize = "PATH_TRAVERSAL")]
    PathTraversal,
    #[strum(serialize = "INVALID_FILE_TYPE")]
    InvalidFileType,
    #[strum(serialize = "FILE_TOO_LARGE")]
    FileTooLarge,
    #[strum(serialize = "NOT_A_FILE")]
    NotAFile,
    #[strum(serialize = "FS_ERROR")]
    FsError,
    #[strum(serialize = "UNKNOWN_ERROR")]
    UnknownError,
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub description: String,
    pub retryable: bool,
    pub next_steps: Vec<String>,
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)
    }
}

impl ErrorClassification {
    fn new(
        category: ErrorCategory,
        code: ErrorCode,
        description: impl Into<String>,
        retryable: bool,
        next_steps: &[&str],
    ) -> Self {
        Self {
            category,
            code,
            description: description.into(),
            retryable,
            next_steps: next_steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Round-trips a classification back into a synthetic [`CoreError`] that
    /// classifies to the same code. Exercised by the idempotence property of
    /// spec.md §8 (`classify(classify(e).asError())`).
    pub fn to_synthetic_error(&self) -> CoreError {
        match self.code {
            ErrorCode::SessionNotFound => CoreError::SessionNotFound,
            ErrorCode::SessionLocked => CoreError::SessionLocked,
            ErrorCode::SessionTimeout => CoreError::SessionTimeout,
            ErrorCode::SessionCompleted => CoreError::SessionCompleted,
            ErrorCode::ApiAuthError => CoreError::ApiAuth(self.description.clone()),
            ErrorCode::RateLimitError => CoreError::RateLimit {
                retry_after_secs: None,
            },
            ErrorCode::ApiParseError => CoreError::ApiParse(self.description.clone()),
            ErrorCode::PathTraversal => CoreError::PathTraversal(self.description.clone()),
            ErrorCode::InvalidFileType => CoreError::InvalidFileType(self.description.clone()),
            ErrorCode::FileTooLarge => CoreError::FileTooLarge(self.description.clone(), 0),
            ErrorCode::NotAFile => CoreError::NotAFile(self.description.clone()),
            ErrorCode::FsError => CoreError::Unknown(self.description.clone()),
            ErrorCode::UnknownError => CoreError::Unknown(self.description.clone()),
        }
    }
}

/// Classify a [`CoreError`] raised internally by this crate.
pub fn classify(err: &CoreError) -> ErrorClassification {
    use ErrorCategory::*;
    use ErrorCode::*;
    match err {
        CoreError::SessionNotFound => ErrorClassification::new(
            Session,
            SessionNotFound,
            "no session exists with that id",
            false,
            &["Start a new conversation", "Check the session id for typos"],
        ),
        CoreError::SessionLocked => ErrorClassification::new(
            Session,
            SessionLocked,
            "another call is already in flight against this session",
            true,
            &["Retry after the in-flight call completes"],
        ),
        CoreError::SessionTimeout => ErrorClassification::new(
            Session,
            SessionTimeout,
            "the session has been idle past the timeout and was abandoned",
            false,
            &["Start a new conversation"],
        ),
        CoreError::SessionCompleted => ErrorClassification::new(
            Session,
            SessionCompleted,
            "the session has already been finalized",
            false,
            &["Start a new conversation to continue investigating"],
        ),
        CoreError::ApiAuth(msg) => ErrorClassification::new(
            Api,
            ApiAuthError,
            format!("authentication with the remote service failed: {msg}"),
            false,
            &["Check that GEMINI_API_KEY is set and valid"],
        ),
        CoreError::RateLimit { retry_after_secs } => ErrorClassification::new(
            Api,
            RateLimitError,
            match retry_after_secs {
                Some(s) => format!("remote service rate limit exceeded, retry after {s}s"),
                None => "remote service rate limit exceeded".to_string(),
            },
            true,
            &["Retry after the suggested delay", "Reduce request concurrency"],
        ),
        CoreError::ApiParse(msg) => ErrorClassification::new(
            Api,
            ApiParseError,
            format!("could not parse a structured result from the remote response: {msg}"),
            false,
            &["Retry the finalize call", "Request a simpler summary format"],
        ),
        CoreError::PathTraversal(path) => ErrorClassification::new(
            Filesystem,
            PathTraversal,
            format!("path `{path}` escapes the project root"),
            false,
            &["Use a path inside the project root"],
        ),
        CoreError::InvalidFileType(path) => ErrorClassification::new(
            Filesystem,
            InvalidFileType,
            format!("`{path}` has a file type outside the allow-list"),
            false,
            &["Request a source, config, or doc file"],
        ),
        CoreError::FileTooLarge(path, cap) => ErrorClassification::new(
            Filesystem,
            FileTooLarge,
            format!("`{path}` exceeds the {cap} byte size cap"),
            false,
            &["Request a smaller file or a narrower excerpt"],
        ),
        CoreError::NotAFile(path) => ErrorClassification::new(
            Filesystem,
            NotAFile,
            format!("`{path}` is not a regular file"),
            false,
            &["Point at a regular file, not a directory or special file"],
        ),
        CoreError::Fs(path, source) => ErrorClassification::new(
            Filesystem,
            FsError,
            format!("filesystem error on `{path}`: {source}"),
            false,
            &["Check that the file exists and is readable"],
        ),
        CoreError::Unknown(msg) => classify_message(msg),
    }
}

/// Classify an arbitrary third-party error by substring heuristics over its
/// message, per spec.md §4.3 ("heterogeneous third-party errors are mapped
/// by substring heuristics over message/code fields").
pub fn classify_message(message: &str) -> ErrorClassification {
    use ErrorCategory::*;
    use ErrorCode::*;
    let lower = message.to_lowercase();

    if lower.contains("rate limit") || lower.contains("429") || lower.contains("too many requests")
    {
        return ErrorClassification::new(
            Api,
            RateLimitError,
            message,
            true,
            &["Retry after a short delay"],
        );
    }
    if lower.contains("unauthorized")
        || lower.contains("401")
        || lower.contains("forbidden")
        || lower.contains("invalid api key")
        || lower.contains("403")
    {
        return ErrorClassification::new(
            Api,
            ApiAuthError,
            message,
            false,
            &["Check that GEMINI_API_KEY is set and valid"],
        );
    }
    if lower.contains("no such file") || lower.contains("permission denied") || lower.contains("i/o")
    {
        return ErrorClassification::new(
            Filesystem,
            FsError,
            message,
            false,
            &["Check that the file exists and is readable"],
        );
    }
    if lower.contains("json") || lower.contains("parse") || lower.contains("deserialize") {
        return ErrorClassification::new(
            Api,
            ApiParseError,
            message,
            false,
            &["Retry the call"],
        );
    }

    ErrorClassification::new(
        Unknown,
        UnknownError,
        message,
        false,
        &["Retry the call", "Report this if it persists"],
    )
}

/// Classify any boxed error, falling back to message heuristics for types
/// this crate does not know about.
pub fn classify_any(err: &(dyn std::error::Error + 'static)) -> ErrorClassification {
    if let Some(core_err) = err.downcast_ref::<CoreError>() {
        return classify(core_err);
    }
    classify_message(&err.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn classification_is_idempotent() {
        for err in [
            CoreError::SessionLocked,
            CoreError::PathTraversal("../x".into()),
            CoreError::RateLimit {
                retry_after_secs: Some(5),
            },
            CoreError::Unknown("some garbled third-party failure".into()),
        ] {
            let first = classify(&err);
            let second = classify(&first.to_synthetic_error());
            assert_eq!(first.code, second.code);
            assert_eq!(first.category, second.category);
        }
    }

    #[test]
    fn retryability_matches_spec() {
        assert!(classify(&CoreError::SessionLocked).retryable);
        assert!(
            classify(&CoreError::RateLimit {
                retry_after_secs: None
            })
            .retryable
        );
        assert!(!classify(&CoreError::PathTraversal("x".into())).retryable);
        assert!(!classify(&CoreError::ApiAuth("x".into())).retryable);
        assert!(!classify(&CoreError::Unknown("x".into())).retryable);
    }

    #[test]
    fn substring_heuristics_classify_third_party_errors() {
        let c = classify_message("HTTP 429 Too Many Requests");
        assert_eq!(c.code, ErrorCode::RateLimitError);
        assert!(c.retryable);

        let c = classify_message("401 Unauthorized: invalid api key");
        assert_eq!(c.code, ErrorCode::ApiAuthError);
    }

    #[test]
    fn next_steps_are_bounded() {
        for err in [
            CoreError::SessionLocked,
            CoreError::RateLimit {
                retry_after_secs: Some(1),
            },
        ] {
            assert!(classify(&err).next_steps.len() <= 4);
        }
    }
}
