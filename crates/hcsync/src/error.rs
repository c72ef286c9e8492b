//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help
//! text, and each of them onto a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use hcsync_config::ConfigError;
use hcsync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REFERENCE: i32 = 3;
    pub const FETCH: i32 = 4;
    pub const SINK: i32 = 5;
    pub const CONFIG: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(hcsync::connection_failed),
        help(
            "{reason}\n\
             Check that the host is reachable. For self-signed certificates try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(hcsync::auth_failed),
        help("Store the right password with: hcsync config set-password hc")
    )]
    AuthFailed { message: String },

    #[error("Request timed out: {url}")]
    #[diagnostic(
        code(hcsync::timeout),
        help("Increase the timeout with --timeout or [hc].timeout.")
    )]
    Timeout { url: String },

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("Could not load {listing} from the controller")]
    #[diagnostic(
        code(hcsync::reference_load),
        help("{reason}\nNo stream was started; every cursor is unchanged.")
    )]
    ReferenceLoad { listing: String, reason: String },

    #[error("Fetch failed for stream '{stream}'")]
    #[diagnostic(
        code(hcsync::fetch),
        help("{reason}\nBatches written before the failure are kept; the next run resumes after them.")
    )]
    Fetch { stream: String, reason: String },

    #[error("InfluxDB rejected the write")]
    #[diagnostic(
        code(hcsync::sink_write),
        help("{reason}\nThe cursor was not advanced past the rejected batch.")
    )]
    SinkWrite { reason: String },

    #[error("{message}")]
    #[diagnostic(code(hcsync::cursor))]
    Cursor { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(hcsync::api_error))]
    Api { message: String },

    // ── Usage ────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(hcsync::usage))]
    Usage {
        message: String,
        #[help]
        hint: Option<String>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration value for {field}: {reason}")]
    #[diagnostic(
        code(hcsync::config),
        help("Config file: {path}\nRun: hcsync config show")
    )]
    Validation {
        field: String,
        reason: String,
        path: String,
    },

    #[error("No password configured for {target}")]
    #[diagnostic(
        code(hcsync::no_credentials),
        help(
            "Store one with: hcsync config set-password {target}\n\
             Or set [{target}].password_env to the name of an environment variable."
        )
    )]
    NoCredentials { target: String },

    #[error("{message}")]
    #[diagnostic(code(hcsync::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::AuthFailed { .. } | Self::Timeout { .. } => {
                exit_code::CONNECTION
            }
            Self::ReferenceLoad { .. } => exit_code::REFERENCE,
            Self::Fetch { .. } => exit_code::FETCH,
            Self::SinkWrite { .. } => exit_code::SINK,
            Self::Usage { .. } => exit_code::USAGE,
            Self::Validation { .. } | Self::NoCredentials { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::Cursor { .. } | Self::Api { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }

    pub fn from_config(err: ConfigError, path: &std::path::Path) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation {
                field,
                reason,
                path: path.display().to_string(),
            },
            ConfigError::NoCredentials { target } => Self::NoCredentials {
                target: target.to_string(),
            },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::ReferenceLoad { listing, reason } => Self::ReferenceLoad { listing, reason },
            CoreError::Fetch { stream, reason } => Self::Fetch { stream, reason },
            CoreError::SinkWrite { reason } => Self::SinkWrite { reason },
            err @ (CoreError::CursorStore(_) | CoreError::CorruptCursor { .. }) => Self::Cursor {
                message: err.to_string(),
            },
            CoreError::Api { message, status: _ } => Self::Api { message },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}
