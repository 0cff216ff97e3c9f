// ── Runtime configuration ──
//
// Describes *where* the backend lives and how to talk to it. The CLI
// resolves profiles, files, and environment into an `AppConfig`; core
// never reads config files itself.

use std::path::PathBuf;
use std::time::Duration;

use erpdesk_api::{TlsMode, TransportConfig};

use crate::session::GuardPolicy;

/// Backend root used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Everything needed to build an [`AppContext`](crate::AppContext).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend root, e.g. `http://localhost:4000`. Requests go to `<api_url>/api/...`.
    pub api_url: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Which routes need a session.
    pub guard: GuardPolicy,
    /// Page size baked into the list cells.
    pub list_limit: u32,
    /// Months covered by the payroll summary cell.
    pub summary_months: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            guard: GuardPolicy::default(),
            list_limit: 50,
            summary_months: 6,
        }
    }
}

impl AppConfig {
    /// Transport settings for the HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookies: None,
        }
        .with_cookies()
    }
}
