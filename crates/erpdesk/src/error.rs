//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use erpdesk_config::ConfigError;
use erpdesk_core::{ApiError, CoreError};

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
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the backend at {url}")]
    #[diagnostic(
        code(erpdesk::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Point at another one with --api-url or ERPDESK_API_URL."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(erpdesk::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { url: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(erpdesk::not_signed_in),
        help("Run: erpdesk login --profile {profile}")
    )]
    NotSignedIn { profile: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(erpdesk::auth_failed),
        help("Check your email and password, then run: erpdesk login")
    )]
    AuthFailed { message: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(erpdesk::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(erpdesk::api_error))]
    Api { status: u16, message: String },

    #[error("Unexpected response from the backend: {message}")]
    #[diagnostic(
        code(erpdesk::bad_response),
        help("The backend may be a different version than this CLI expects.")
    )]
    BadResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(erpdesk::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(erpdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(erpdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: erpdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(erpdesk::config))]
    Config(Box<ConfigError>),

    #[error("Credential storage failed: {message}")]
    #[diagnostic(
        code(erpdesk::credentials),
        help("Switch the profile to another token store: erpdesk config set profiles.<name>.token_store file")
    )]
    Credentials { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(erpdesk::internal))]
    Internal(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotSignedIn { .. }
            | Self::AuthFailed { .. }
            | Self::Api {
                status: 401 | 403, ..
            } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::NotSignedIn => Self::NotSignedIn {
                profile: "default".into(),
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Http {
                status: 404,
                detail,
                ..
            } => Self::NotFound { message: detail },
            CoreError::Http { status, detail, .. } => Self::Api {
                status,
                message: detail,
            },
            CoreError::Request { message } => Self::Api { status: 0, message },
            CoreError::Deserialization { message } => Self::BadResponse { message },
            CoreError::Credentials { message } => Self::Credentials { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> CliError {
        CliError::from(CoreError::Http {
            status,
            message: body.into(),
            detail: body.into(),
        })
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(http(401, "Unauthorized").exit_code(), exit_code::AUTH);
        assert_eq!(http(404, "No such payslip").exit_code(), exit_code::NOT_FOUND);
        assert_eq!(http(409, "Email already exists").exit_code(), exit_code::GENERAL);
        assert_eq!(
            CliError::from(CoreError::Timeout { url: "x".into() }).exit_code(),
            exit_code::TIMEOUT
        );
        assert_eq!(
            CliError::NotSignedIn {
                profile: "prod".into()
            }
            .exit_code(),
            exit_code::AUTH
        );
    }

    #[test]
    fn backend_message_is_shown_verbatim() {
        assert_eq!(http(409, "Email already exists").to_string(), "Email already exists");
    }
}
