//! CLI error types with miette diagnostics.
//!
//! Maps api/core/config errors into user-facing diagnostics, and into
//! process exit codes. A rejected remote fetch exits with the remote's
//! HTTP status; connection failures exit 1 -- a scheduled batch run
//! surfaces exactly what the remote said.

use miette::Diagnostic;
use thiserror::Error;

use meshly_core::CoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote ───────────────────────────────────────────────────────
    #[error("Remote request failed (HTTP {status}): {message}")]
    #[diagnostic(
        code(meshly::remote),
        help("The run was aborted; nothing was reported or stored.")
    )]
    Remote { status: u16, message: String },

    #[error("Could not reach the dashboard: {message}")]
    #[diagnostic(
        code(meshly::connection),
        help("Check the configured URL and your network path to it.")
    )]
    Connection { message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(meshly::auth),
        help("Verify the credentials in your config (or the MESHLY_* env vars).")
    )]
    Auth { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Collected data could not be decoded: {message}")]
    #[diagnostic(code(meshly::decode))]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No collection surface configured")]
    #[diagnostic(
        code(meshly::no_config),
        help(
            "Add an [api] or [dashboard] section to your config.\n\
             Expected at: {path}"
        )
    )]
    NoSurface { path: String },

    #[error("No {surface} credentials configured")]
    #[diagnostic(
        code(meshly::no_credentials),
        help("Set the documented MESHLY_* env vars or the config fields.")
    )]
    NoCredentials { surface: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(meshly::validation))]
    Validation { field: String, reason: String },

    #[error("Config loading failed: {message}")]
    #[diagnostic(code(meshly::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Exit codes: the remote HTTP status when the remote rejected us,
/// otherwise small fixed codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Remote { status, .. } => i32::from(*status),
            Self::Auth { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error mapping ────────────────────────────────────────────────────

impl From<meshly_api::Error> for CliError {
    fn from(err: meshly_api::Error) -> Self {
        match err {
            meshly_api::Error::Api {
                status,
                reason,
                body,
            } => Self::Remote {
                status,
                message: if body.is_empty() {
                    reason
                } else {
                    format!("{reason}: {body}")
                },
            },
            meshly_api::Error::Authentication { message } => Self::Auth { message },
            meshly_api::Error::Transport(e) => Self::Connection {
                message: e.to_string(),
            },
            meshly_api::Error::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            meshly_api::Error::Tls(message) => Self::Connection { message },
            meshly_api::Error::Deserialization { message, .. } => Self::Decode { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api) => api.into(),
            other @ (CoreError::RowShape { .. }
            | CoreError::MissingField { .. }
            | CoreError::FieldValue { .. }
            | CoreError::CheckinGraph(_)) => Self::Decode {
                message: other.to_string(),
            },
        }
    }
}

impl From<meshly_config::ConfigError> for CliError {
    fn from(err: meshly_config::ConfigError) -> Self {
        match err {
            meshly_config::ConfigError::NoCredentials { surface } => Self::NoCredentials {
                surface: surface.into(),
            },
            meshly_config::ConfigError::Validation { field, reason } => {
                Self::Validation { field, reason }
            }
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
