use std::fmt;

use thiserror::Error;

/// Top-level error type for the `erpdesk-api` crate.
///
/// `erpdesk-core` maps these into the errors stored in resource snapshots.
#[derive(Debug, Error)]
pub enum Error {
    // ── Backend responses ───────────────────────────────────────────
    /// Non-2xx response. Displays as the raw response body.
    #[error(transparent)]
    Http(#[from] HttpError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable or invalid CA certificate).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be encoded as JSON.
    #[error("JSON encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    // ── Local credential storage ────────────────────────────────────
    /// The token store could not be read, written, or cleared.
    #[error("Credential storage error: {0}")]
    Credentials(String),
}

impl Error {
    /// HTTP status of a non-2xx response, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => Some(e.status()),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the backend rejected the caller's session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` for connection-level failures (no response at all).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

// ── HttpError ────────────────────────────────────────────────────────

/// A non-2xx response: the status code plus the body exactly as received.
///
/// Displays as the body text, or `Request failed: <status>` when the body
/// is empty. The core never interprets structured error codes; callers
/// show this message to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: u16,
    body: String,
}

/// Common JSON error shapes, used only by [`HttpError::detail`].
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The raw response body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// A short human-readable message.
    ///
    /// Pulls `message` / `error` out of a JSON body when there is one,
    /// otherwise falls back to the [`Display`](fmt::Display) form.
    pub fn detail(&self) -> String {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.trim().is_empty() {
            write!(f, "Request failed: {}", self.status)
        } else {
            f.write_str(&self.body)
        }
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_body_verbatim() {
        let err = Error::from(HttpError::new(409, "Email already exists"));
        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn http_error_falls_back_to_status_when_body_empty() {
        assert_eq!(HttpError::new(500, "").to_string(), "Request failed: 500");
        assert_eq!(HttpError::new(502, "  \n").to_string(), "Request failed: 502");
    }

    #[test]
    fn detail_extracts_json_message() {
        let err = HttpError::new(422, r#"{"message":"Amount must be positive"}"#);
        assert_eq!(err.detail(), "Amount must be positive");

        let err = HttpError::new(400, r#"{"error":"Bad period"}"#);
        assert_eq!(err.detail(), "Bad period");

        let err = HttpError::new(400, "plain text");
        assert_eq!(err.detail(), "plain text");
    }

    #[test]
    fn unauthorized_detection() {
        assert!(Error::from(HttpError::new(401, "")).is_unauthorized());
        assert!(Error::from(HttpError::new(403, "no")).is_unauthorized());
        assert!(!Error::from(HttpError::new(404, "")).is_unauthorized());
        assert!(!Error::Credentials("x".into()).is_unauthorized());
    }
}
