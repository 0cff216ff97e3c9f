//! CLI configuration: thin wrapper around `erpdesk_config`.
//!
//! Adds the resolution step that applies `GlobalOpts` flag overrides
//! (--api-url, --insecure, --timeout) on top of the profile.

use std::time::Duration;

use erpdesk_config::ConfigError;
use erpdesk_core::{AppConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use erpdesk_config::{
    Config, Profile, TokenStorage, build_token_store, config_path, load_config,
    load_stored_config, save_config, validate_url,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    erpdesk_config::active_profile_name(cfg, global.profile.as_deref())
}

/// Build an `AppConfig` for `profile_name`. Flags beat env, env beats
/// the profile, the profile beats built-in defaults.
pub fn resolve_app_config(
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
) -> Result<AppConfig, CliError> {
    let mut app = erpdesk_config::resolve_app_config(cfg, profile_name).map_err(|e| match e {
        ConfigError::UnknownProfile { profile } => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            CliError::ProfileNotFound {
                name: profile,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            }
        }
        other => other.into(),
    })?;

    if let Some(ref url) = global.api_url {
        validate_url(url)?;
        app.api_url.clone_from(url);
    }
    if global.insecure {
        app.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        app.timeout = Duration::from_secs(secs);
    }

    Ok(app)
}
