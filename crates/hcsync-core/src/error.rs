// ── Core error types ──
//
// Sync-level errors from hcsync-core. Callers never match on HTTP status
// codes or JSON parse failures directly: the `From<hcsync_api::Error>` impl
// translates transport-layer errors into domain variants, and the engine
// wraps them with the listing or stream they happened on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    // ── Sync errors ──────────────────────────────────────────────────
    /// One of the device/room/section listings could not be retrieved.
    #[error("Failed to load {listing}: {reason}")]
    ReferenceLoad { listing: String, reason: String },

    /// A paginated fetch failed; the stream stops here.
    #[error("Fetch failed for stream '{stream}': {reason}")]
    Fetch { stream: String, reason: String },

    #[error("Failed to write points: {reason}")]
    SinkWrite { reason: String },

    // ── Cursor errors ────────────────────────────────────────────────
    #[error(transparent)]
    CursorStore(#[from] StoreError),

    #[error("Stored cursor for '{key}' is not valid: '{value}'")]
    CorruptCursor { key: String, value: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failure of a [`CursorStore`](crate::cursor::CursorStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cursor store I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid stream key '{0}'")]
    InvalidKey(String),
}

impl CoreError {
    /// Returns `true` when the error means the remote end was never reached
    /// or refused our credentials.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::AuthenticationFailed { .. } | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hcsync_api::Error> for CoreError {
    fn from(err: hcsync_api::Error) -> Self {
        match err {
            hcsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            hcsync_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            hcsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hcsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            hcsync_api::Error::Status { status, url, body } => CoreError::Api {
                message: if body.trim().is_empty() {
                    format!("HTTP {status} from {url}")
                } else {
                    format!("HTTP {status} from {url}: {}", body.trim())
                },
                status: Some(status),
            },
            hcsync_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unparsable response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_code_and_body() {
        let err = CoreError::from(hcsync_api::Error::Status {
            status: 400,
            url: "http://influx/write".into(),
            body: "partial write: field type conflict\n".into(),
        });
        match err {
            CoreError::Api { message, status } => {
                assert_eq!(status, Some(400));
                assert!(message.ends_with("field type conflict"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn auth_and_tls_count_as_connection_errors() {
        let auth = CoreError::from(hcsync_api::Error::Authentication {
            message: "nope".into(),
        });
        let tls = CoreError::from(hcsync_api::Error::Tls("bad cert".into()));
        assert!(auth.is_connection());
        assert!(tls.is_connection());
        assert!(
            !CoreError::SinkWrite {
                reason: "x".into()
            }
            .is_connection()
        );
    }
}
