// Shared transport configuration for building reqwest::Client instances.
//
// TLS, timeout, and the session cookie store are configured here once so
// the API client never duplicates builder logic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionCookies;
use crate::error::Error;

const USER_AGENT: &str = concat!("erpdesk/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Trust an additional CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed development backends).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookies: Option<Arc<SessionCookies>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookies: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// The cookie store, when present, is what makes requests behave like
    /// `credentials: include`: cookies set by the identity endpoints are
    /// replayed on every later call.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref cookies) = self.cookies {
            builder = builder.cookie_provider(Arc::clone(cookies));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Attach a fresh, empty session cookie store.
    pub fn with_cookies(mut self) -> Self {
        self.cookies = Some(Arc::new(SessionCookies::default()));
        self
    }
}
