//! Process configuration (spec.md §6): one required environment variable
//! for the remote service credential, one optional verbosity toggle, and
//! the project root the Secure Reader is confined to.
//!
//! Shaped like `codex-core::config::Config`'s env-var driven construction,
//! trimmed down since this gateway has no TOML profile layering.

use std::env::VarError;
use std::path::Path;
use std::path::PathBuf;

/// Environment variable carrying the remote service credential (spec.md §6).
pub const GEMINI_API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Optional environment variable enabling verbose diagnostics (spec.md §6).
pub const DEBUG_ENV_VAR: &str = "DEBUG";

/// Optional environment variable pointing the remote dialogue adapter at a
/// different endpoint than Gemini's own. Mirrors `ModelProviderInfo.base_url`
/// being swappable per-provider; here it exists purely so integration tests
/// can aim the gateway at a local mock server instead of the real service.
pub const GEMINI_BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

/// Default per-request time budget in seconds (spec.md §5, §6's
/// `time_budget_seconds` default on `escalate_analysis`).
pub const DEFAULT_REQUEST_BUDGET_SECS: u64 = 60;

/// Default time budget for a full hypothesis tournament (spec.md §5).
pub const DEFAULT_TOURNAMENT_BUDGET_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub gemini_api_key: String,
    pub gemini_base_url: Option<String>,
    pub debug: bool,
    pub project_root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set; the process cannot start without a remote service credential")]
    MissingApiKey(&'static str),
    #[error("project root `{0}` does not exist or is not a directory")]
    InvalidProjectRoot(PathBuf),
}

impl GatewayConfig {
    /// Load configuration from the process environment, resolving the
    /// project root against `cwd` unless an override is supplied.
    pub fn from_env(project_root_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let gemini_api_key = match std::env::var(GEMINI_API_KEY_ENV_VAR) {
            Ok(v) if !v.is_empty() => v,
            Ok(_) | Err(VarError::NotPresent) | Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::MissingApiKey(GEMINI_API_KEY_ENV_VAR));
            }
        };

        let debug = std::env::var(DEBUG_ENV_VAR)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let gemini_base_url = std::env::var(GEMINI_BASE_URL_ENV_VAR).ok().filter(|v| !v.is_empty());

        let project_root = match project_root_override {
            Some(p) => p,
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        let project_root = dunce_canonicalize(&project_root)
            .ok_or_else(|| ConfigError::InvalidProjectRoot(project_root.clone()))?;

        Ok(Self {
            gemini_api_key,
            gemini_base_url,
            debug,
            project_root,
        })
    }

    pub fn tracing_filter(&self) -> &'static str {
        if self.debug {
            "reasoning_core=debug,reasoning_mcp_server=debug,info"
        } else {
            "reasoning_core=info,reasoning_mcp_server=info,warn"
        }
    }
}

fn dunce_canonicalize(path: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    if canonical.is_dir() { Some(canonical) } else { None }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn missing_api_key_is_an_error() {
        // SAFETY: test-only manipulation of process environment, no
        // concurrent access within this test.
        unsafe {
            std::env::remove_var(GEMINI_API_KEY_ENV_VAR);
        }
        let err = GatewayConfig::from_env(Some(PathBuf::from("."))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));
    }

    #[test]
    fn debug_flag_recognizes_common_truthy_values() {
        unsafe {
            std::env::set_var(GEMINI_API_KEY_ENV_VAR, "test-key");
            std::env::set_var(DEBUG_ENV_VAR, "true");
        }
        let cfg = GatewayConfig::from_env(Some(PathBuf::from("."))).unwrap();
        assert!(cfg.debug);
        unsafe {
            std::env::remove_var(DEBUG_ENV_VAR);
            std::env::remove_var(GEMINI_API_KEY_ENV_VAR);
        }
    }
}
