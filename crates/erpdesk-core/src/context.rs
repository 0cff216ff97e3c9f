// ── Application context ──
//
// Owns the HTTP client, the resource registry, and the session gate.
// One per process in the CLI; tests build a fresh one each.

use std::sync::Arc;

use erpdesk_api::{ApiClient, TokenStore};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::registry::{RegistryOptions, ResourceRegistry};
use crate::session::SessionGate;

/// Everything a front-end needs, wired together.
///
/// The registry and the gate share the same `ApiClient`, so a sign-in
/// through the gate authenticates every later resource refresh.
#[derive(Debug)]
pub struct AppContext {
    config: AppConfig,
    api: Arc<ApiClient>,
    resources: ResourceRegistry,
    session: SessionGate<ApiClient>,
}

impl AppContext {
    /// Build the HTTP client from `config` and wire everything to it.
    pub fn new(config: AppConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let api = ApiClient::new(&config.api_url, &config.transport(), tokens)?;
        debug!(api_url = %api.base_url(), "application context created");
        Ok(Self::from_client(config, Arc::new(api)))
    }

    /// Wire an existing client.
    pub fn from_client(config: AppConfig, api: Arc<ApiClient>) -> Self {
        let resources = ResourceRegistry::new(
            Arc::clone(&api),
            RegistryOptions {
                list_limit: config.list_limit,
                summary_months: config.summary_months,
            },
        );
        let session = SessionGate::new(Arc::clone(&api), config.guard.clone());

        Self {
            config,
            api,
            resources,
            session,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn session(&self) -> &SessionGate<ApiClient> {
        &self.session
    }
}
