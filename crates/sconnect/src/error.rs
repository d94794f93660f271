//! CLI error types with miette diagnostics.
//!
//! Maps library and config errors into user-facing errors with exit codes.

use miette::Diagnostic;
use thiserror::Error;

use steelconnection::Error as ApiError;
use steelconnection_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Controller ───────────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(sconnect::auth_failed),
        help(
            "Check the username and password for this realm.\n\
             Store a password with: sconnect config set-password --profile <name>"
        )
    )]
    AuthFailed {
        #[source]
        source: ApiError,
    },

    #[error("Could not reach the SteelConnect Manager")]
    #[diagnostic(
        code(sconnect::connection_failed),
        help("Check the realm name and network access, or pass --insecure (-k) for lab controllers.")
    )]
    ConnectionFailed {
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    #[diagnostic(code(sconnect::request))]
    Request(ApiError),

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(sconnect::not_found),
        help("Run: sconnect get {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sconnect::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sconnect::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(sconnect::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(sconnect::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            Self::Request(err) => match err {
                ApiError::InvalidResource { .. } | ApiError::NoImage(_) => exit_code::NOT_FOUND,
                ApiError::Timeout(_) => exit_code::TIMEOUT,
                ApiError::Validation(_) => exit_code::USAGE,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error → CliError mapping ─────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { .. } => Self::AuthFailed { source: err },
            ApiError::Connection(_)
            | ApiError::Transport(_)
            | ApiError::Tls(_)
            | ApiError::ApiNotEnabled { .. } => Self::ConnectionFailed { source: err },
            other => Self::Request(other),
        }
    }
}
