use thiserror::Error;

/// Top-level error type for the `meshly-api` crate.
///
/// Covers every failure mode across both API surfaces: session login,
/// transport, signed-request rejections, and payload decoding.
/// `meshly-core` maps these into collection-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Dashboard login failed (wrong credentials, locked account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Remote API ──────────────────────────────────────────────────
    /// Non-2xx response from the dashboard or the signed API.
    ///
    /// Carries the HTTP status so callers can terminate the run with the
    /// status as the process exit code. There is no partial-result mode:
    /// a single failed fetch aborts the whole collection cycle.
    #[error("API request failed (HTTP {status}): {reason}")]
    Api {
        status: u16,
        reason: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The remote HTTP status, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a transient transport failure worth
    /// retrying with backoff. Anything the remote answered (4xx/5xx)
    /// is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
