//! Shared configuration for the erpdesk CLI.
//!
//! TOML profiles, environment overrides, bearer token storage (file,
//! keyring, or memory), and translation to `erpdesk_core::AppConfig`.

mod tokens;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use erpdesk_api::{MemoryTokenStore, TokenStore};
use erpdesk_core::{AppConfig, DEFAULT_API_URL, GuardPolicy, TlsVerification};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use tokens::{FileTokenStore, KeyringTokenStore};

/// Prefix for environment overrides (`ERPDESK_API_URL`, ...).
pub const ENV_PREFIX: &str = "ERPDESK_";

const KEYRING_SERVICE: &str = "erpdesk";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Backend root that overrides every profile. Usually set through
    /// `ERPDESK_API_URL` rather than in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            api_url: None,
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its bearer token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// A `0600` file under the data directory.
    #[default]
    File,
    /// The system keyring.
    Keyring,
    /// Nothing persisted; every invocation starts signed out.
    Memory,
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend root URL (e.g., "https://erp.example.com").
    pub api_url: String,

    #[serde(default)]
    pub token_store: TokenStorage,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Route prefixes that skip the session check.
    pub public_paths: Option<Vec<String>>,

    /// Where unauthenticated navigation is sent.
    pub login_path: Option<String>,

    /// Page size for list views.
    pub list_limit: Option<u32>,

    /// Months shown by the payroll summary.
    pub summary_months: Option<u32>,
}

impl Profile {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token_store: TokenStorage::default(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            public_paths: None,
            login_path: None,
            list_limit: None,
            summary_months: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "erpdesk", "erpdesk")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("erpdesk");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for persisted state (token files).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file (which need not exist) + environment.
///
/// Precedence, lowest first: built-in defaults, the TOML file,
/// `ERPDESK_API_URL` / `ERPDESK_DEFAULT_PROFILE`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).only(&["api_url", "default_profile"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// The file as written, without environment overrides. Edits go through
/// this so an exported `ERPDESK_API_URL` never lands in the file.
pub fn load_stored_config() -> Result<Config, ConfigError> {
    let path = config_path();
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

/// The profile to use: explicit name, else the configured default,
/// else `"default"`.
pub fn active_profile_name(cfg: &Config, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build an `AppConfig` for `profile_name`.
///
/// A missing profile is only an error when it was asked for by name
/// and isn't the configured default; otherwise built-in defaults apply.
/// The URL comes from the top-level override (`ERPDESK_API_URL`), then
/// the profile, then `http://localhost:4000`.
pub fn resolve_app_config(cfg: &Config, profile_name: &str) -> Result<AppConfig, ConfigError> {
    let profile = cfg.profiles.get(profile_name);
    let is_default = cfg.default_profile.as_deref().unwrap_or("default") == profile_name;
    if profile.is_none() && !is_default {
        return Err(ConfigError::UnknownProfile {
            profile: profile_name.into(),
        });
    }

    let api_url = cfg
        .api_url
        .clone()
        .or_else(|| profile.map(|p| p.api_url.clone()))
        .unwrap_or_else(|| DEFAULT_API_URL.into());
    validate_url(&api_url)?;

    let insecure = profile
        .and_then(|p| p.insecure)
        .unwrap_or(cfg.defaults.insecure);
    let tls = if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca)
    } else {
        TlsVerification::SystemDefaults
    };

    let mut guard = GuardPolicy::default();
    if let Some(paths) = profile.and_then(|p| p.public_paths.clone()) {
        guard.public_prefixes = paths;
    }
    if let Some(login) = profile.and_then(|p| p.login_path.clone()) {
        guard.login_path = login;
    }

    let base = AppConfig::default();
    Ok(AppConfig {
        api_url,
        tls,
        timeout: Duration::from_secs(
            profile
                .and_then(|p| p.timeout)
                .unwrap_or(cfg.defaults.timeout),
        ),
        guard,
        list_limit: profile
            .and_then(|p| p.list_limit)
            .unwrap_or(base.list_limit),
        summary_months: profile
            .and_then(|p| p.summary_months)
            .unwrap_or(base.summary_months),
    })
}

/// Reject anything that isn't an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "api_url".into(),
        reason,
    };
    let url = url::Url::parse(raw).map_err(|e| invalid(format!("{e}: '{raw}'")))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(invalid(format!("expected an http(s) URL, got '{raw}'")));
    }
    Ok(())
}

/// The token store a profile asks for.
pub fn build_token_store(cfg: &Config, profile_name: &str) -> Arc<dyn TokenStore> {
    let storage = cfg
        .profiles
        .get(profile_name)
        .map(|p| p.token_store)
        .unwrap_or_default();
    debug!(profile = profile_name, ?storage, "token storage");

    match storage {
        TokenStorage::File => Arc::new(FileTokenStore::for_profile(profile_name)),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new(KEYRING_SERVICE, profile_name)),
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"
        default_profile = "prod"

        [defaults]
        output = "json"
        timeout = 10

        [profiles.prod]
        api_url = "https://erp.example.com"
        token_store = "keyring"
        public_paths = ["/login", "/status"]
        list_limit = 25

        [profiles.local]
        api_url = "http://localhost:4000"
        insecure = true
    "#;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("missing.toml")).unwrap();
            assert_eq!(cfg, Config::default());

            let app = resolve_app_config(&cfg, "default").unwrap();
            assert_eq!(app.api_url, "http://localhost:4000");
            assert_eq!(app.timeout, Duration::from_secs(30));
            assert_eq!(app.tls, TlsVerification::SystemDefaults);
            Ok(())
        });
    }

    #[test]
    fn toml_profiles_resolve() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(active_profile_name(&cfg, None), "prod");

            let prod = resolve_app_config(&cfg, "prod").unwrap();
            assert_eq!(prod.api_url, "https://erp.example.com");
            assert_eq!(prod.timeout, Duration::from_secs(10));
            assert_eq!(prod.list_limit, 25);
            assert_eq!(prod.guard.public_prefixes, vec!["/login", "/status"]);
            assert_eq!(prod.guard.login_path, "/login");

            let local = resolve_app_config(&cfg, "local").unwrap();
            assert_eq!(local.tls, TlsVerification::DangerAcceptInvalid);

            assert!(matches!(
                resolve_app_config(&cfg, "staging"),
                Err(ConfigError::UnknownProfile { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_profile_url() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("ERPDESK_API_URL", "http://erp.internal:8080");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            let app = resolve_app_config(&cfg, "prod").unwrap();
            assert_eq!(app.api_url, "http://erp.internal:8080");
            Ok(())
        });
    }

    #[test]
    fn invalid_url_is_rejected() {
        let cfg = Config {
            api_url: Some("localhost:4000".into()),
            ..Config::default()
        };
        let err = resolve_app_config(&cfg, "default").unwrap_err();
        assert!(err.to_string().starts_with("invalid api_url"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("https://erp.example.com"));
        save_config_to(&cfg, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        assert!(written.contains(r#"token_store = "file""#));

        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed, cfg);
    }
}
