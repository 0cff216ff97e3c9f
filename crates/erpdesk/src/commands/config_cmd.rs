//! Config subcommand handlers. None of these talk to the backend.

use dialoguer::{Input, Select};

use erpdesk_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, TokenStorage};
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

const SETTABLE_KEYS: &str = "api_url, token_store, ca_cert, insecure, timeout, login_path, \
                             public_paths, list_limit, summary_months";

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

fn parse_token_store(value: &str) -> Result<TokenStorage, CliError> {
    match value {
        "file" => Ok(TokenStorage::File),
        "keyring" => Ok(TokenStorage::Keyring),
        "memory" => Ok(TokenStorage::Memory),
        _ => Err(CliError::Validation {
            field: "token_store".into(),
            reason: "must be 'file', 'keyring' or 'memory'".into(),
        }),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

/// Apply `key = value` to one profile.
fn set_profile_field(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            config::validate_url(&value)?;
            profile.api_url = value;
        }
        "token_store" | "token-store" => profile.token_store = parse_token_store(&value)?,
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(parse_field(key, &value, "must be 'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_field(key, &value, "must be a number (seconds)")?);
        }
        "login_path" | "login-path" => {
            if !value.starts_with('/') {
                return Err(CliError::Validation {
                    field: "login_path".into(),
                    reason: "must start with '/'".into(),
                });
            }
            profile.login_path = Some(value);
        }
        "public_paths" | "public-paths" => {
            let paths: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
            if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
                return Err(CliError::Validation {
                    field: "public_paths".into(),
                    reason: format!("'{bad}' must start with '/'"),
                });
            }
            profile.public_paths = Some(paths);
        }
        "list_limit" | "list-limit" => {
            profile.list_limit = Some(parse_field(key, &value, "must be a positive number")?);
        }
        "summary_months" | "summary-months" => {
            profile.summary_months = Some(parse_field(key, &value, "must be a positive number")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

/// Apply a dotted `key`: `default_profile`, `profiles.<name>.<field>`, or
/// a bare field on `active`.
fn apply_set(cfg: &mut Config, active: &str, key: &str, value: String) -> Result<String, CliError> {
    if key == "default_profile" || key == "default-profile" {
        cfg.default_profile = Some(value);
        return Ok("default profile".into());
    }

    let (profile_name, field) = match key.strip_prefix("profiles.") {
        Some(rest) => rest.split_once('.').ok_or_else(|| CliError::Validation {
            field: key.into(),
            reason: "expected profiles.<name>.<field>".into(),
        })?,
        None => (active, key),
    };

    let profile = cfg
        .profiles
        .entry(profile_name.to_owned())
        .or_insert_with(|| Profile::new(DEFAULT_API_URL));
    set_profile_field(profile, field, value)?;
    Ok(format!("{field} on profile '{profile_name}'"))
}

fn show_detail(cfg: &Config) -> String {
    let mut pairs = vec![
        ("File", config::config_path().display().to_string()),
        (
            "Default profile",
            cfg.default_profile.clone().unwrap_or_else(|| "default".into()),
        ),
    ];
    if let Some(ref url) = cfg.api_url {
        pairs.push(("API URL override", url.clone()));
    }
    let mut sections = vec![output::detail_lines(&pairs)];

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let mut lines = vec![
            ("API URL", p.api_url.clone()),
            ("Token store", format!("{:?}", p.token_store).to_lowercase()),
        ];
        if let Some(ref ca) = p.ca_cert {
            lines.push(("CA cert", ca.display().to_string()));
        }
        if let Some(insecure) = p.insecure {
            lines.push(("Insecure", insecure.to_string()));
        }
        if let Some(timeout) = p.timeout {
            lines.push(("Timeout", format!("{timeout}s")));
        }
        if let Some(ref login) = p.login_path {
            lines.push(("Login path", login.clone()));
        }
        if let Some(ref public) = p.public_paths {
            lines.push(("Public paths", public.join(", ")));
        }
        if let Some(limit) = p.list_limit {
            lines.push(("List limit", limit.to_string()));
        }
        if let Some(months) = p.summary_months {
            lines.push(("Summary months", months.to_string()));
        }
        sections.push(format!("[{name}]\n{}", output::detail_lines(&lines)));
    }
    sections.join("\n\n")
}

fn init_wizard() -> Result<(), CliError> {
    let path = config::config_path();
    eprintln!("erpdesk configuration");
    eprintln!("  Config path: {}\n", path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default(DEFAULT_API_URL.into())
        .validate_with(|input: &String| config::validate_url(input))
        .interact_text()
        .map_err(prompt_err)?;

    let store_choices = &[
        "Token file in the data directory (recommended)",
        "System keyring",
        "Don't keep the session",
    ];
    let token_store = match Select::new()
        .with_prompt("Where should the session token live?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        1 => TokenStorage::Keyring,
        2 => TokenStorage::Memory,
        _ => TokenStorage::File,
    };

    let mut cfg = config::load_stored_config()?;
    let mut profile = Profile::new(api_url);
    profile.token_store = token_store;
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Next: erpdesk login");
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init_wizard(),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, show_detail, |c| {
                c.default_profile.clone().unwrap_or_else(|| "default".into())
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_stored_config()?;
            let active = config::active_profile_name(global, &cfg);
            let what = apply_set(&mut cfg, &active, &key, value)?;
            config::save_config(&cfg)?;
            util::note(global, &format!("Set {what}"));
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                util::note(global, "No profiles configured. Run: erpdesk config init");
                return Ok(());
            }
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_stored_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            util::note(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dotted_key_targets_named_profile() {
        let mut cfg = Config::default();
        let what = apply_set(
            &mut cfg,
            "default",
            "profiles.prod.api_url",
            "https://erp.example.com".into(),
        )
        .unwrap();
        assert_eq!(what, "api_url on profile 'prod'");
        assert_eq!(cfg.profiles["prod"].api_url, "https://erp.example.com");
        assert!(!cfg.profiles.contains_key("default"));
    }

    #[test]
    fn bare_key_targets_active_profile() {
        let mut cfg = Config::default();
        apply_set(&mut cfg, "staging", "token_store", "keyring".into()).unwrap();
        assert_eq!(cfg.profiles["staging"].token_store, TokenStorage::Keyring);
        assert_eq!(cfg.profiles["staging"].api_url, DEFAULT_API_URL);
    }

    #[test]
    fn public_paths_are_split_and_checked() {
        let mut cfg = Config::default();
        apply_set(&mut cfg, "default", "public_paths", "/login, /help".into()).unwrap();
        assert_eq!(
            cfg.profiles["default"].public_paths.as_deref().unwrap(),
            ["/login".to_owned(), "/help".to_owned()]
        );
        assert!(apply_set(&mut cfg, "default", "public_paths", "help".into()).is_err());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(apply_set(&mut cfg, "default", "colour", "red".into()).is_err());
        assert!(apply_set(&mut cfg, "default", "timeout", "soon".into()).is_err());
        assert!(apply_set(&mut cfg, "default", "api_url", "not a url".into()).is_err());
        assert!(apply_set(&mut cfg, "default", "profiles.prod", "x".into()).is_err());
    }

    #[test]
    fn default_profile_is_top_level() {
        let mut cfg = Config::default();
        apply_set(&mut cfg, "default", "default_profile", "prod".into()).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
    }
}
