// ── Core error types ──
//
// The error stored in a failed resource snapshot and returned to callers
// that await a refresh. It is `Clone` because one failure is delivered to
// every subscriber and every joined caller. The `From<erpdesk_api::Error>`
// impl flattens transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Backend responses ────────────────────────────────────────────
    /// Non-2xx response. Displays exactly as the backend's body text,
    /// or `Request failed: <status>` when the body was empty.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        /// `message` with a JSON `{"message": ..}` envelope unwrapped.
        detail: String,
    },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request failed: {message}")]
    Request { message: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Credential storage error: {message}")]
    Credentials { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected response from backend: {message}")]
    Deserialization { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status of a backend rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the session is missing or was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotSignedIn | Self::Http { status: 401 | 403, .. })
    }

    /// The most readable one-line message for display next to a form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<erpdesk_api::Error> for CoreError {
    fn from(err: erpdesk_api::Error) -> Self {
        match err {
            erpdesk_api::Error::Http(e) => CoreError::Http {
                status: e.status(),
                message: e.to_string(),
                detail: e.detail(),
            },
            erpdesk_api::Error::Transport(ref e) => {
                let url = e.url().map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Request {
                        message: e.to_string(),
                    }
                }
            }
            erpdesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            erpdesk_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            erpdesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Deserialization { message }
            }
            erpdesk_api::Error::Encode(e) => CoreError::Internal(format!("JSON encoding: {e}")),
            erpdesk_api::Error::Credentials(message) => CoreError::Credentials { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use erpdesk_api::HttpError;

    use super::*;

    #[test]
    fn http_error_keeps_body_as_message() {
        let err = CoreError::from(erpdesk_api::Error::from(HttpError::new(
            409,
            "Email already exists",
        )));
        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "Email already exists");
    }

    #[test]
    fn http_error_user_message_unwraps_json() {
        let err = CoreError::from(erpdesk_api::Error::from(HttpError::new(
            422,
            r#"{"message":"Period already closed"}"#,
        )));
        assert_eq!(err.to_string(), r#"{"message":"Period already closed"}"#);
        assert_eq!(err.user_message(), "Period already closed");
    }

    #[test]
    fn empty_body_uses_status_fallback() {
        let err = CoreError::from(erpdesk_api::Error::from(HttpError::new(500, "")));
        assert_eq!(err.to_string(), "Request failed: 500");
    }

    #[test]
    fn unauthorized_detection() {
        assert!(CoreError::NotSignedIn.is_unauthorized());
        assert!(
            CoreError::Http {
                status: 401,
                message: String::new(),
                detail: String::new(),
            }
            .is_unauthorized()
        );
        assert!(!CoreError::Internal("x".into()).is_unauthorized());
    }
}
