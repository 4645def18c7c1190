//! CLI error types with `miette` diagnostics.
//!
//! Maps `softap_core`/`softap_config` errors into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use softap_config::ConfigStoreError;
use softap_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("invalid value for {field}: {reason}")]
    #[diagnostic(code(softap::validation))]
    Validation { field: String, reason: String },

    #[error("unknown config key '{key}'")]
    #[diagnostic(code(softap::unknown_config_key), help("valid keys: {valid}"))]
    UnknownConfigKey { key: String, valid: String },

    #[error("the SoftAP lifecycle has already terminated")]
    #[diagnostic(code(softap::terminated))]
    Terminated,

    #[error("failed to persist configuration at {path}")]
    #[diagnostic(code(softap::config_store))]
    ConfigStore {
        path: String,
        #[source]
        source: ConfigStoreError,
    },

    #[error("failed to render output as JSON")]
    #[diagnostic(code(softap::json))]
    Json(#[from] serde_json::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Terminated => Self::Terminated,
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::UnknownConfigKey { .. } => exit_code::USAGE,
            Self::Terminated => exit_code::CONFLICT,
            Self::ConfigStore { .. } | Self::Json(_) => exit_code::GENERAL,
        }
    }
}
