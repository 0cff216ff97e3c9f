//! Shared helpers for command handlers.

use std::io::IsTerminal;

use erpdesk_core::{AppContext, GuardOutcome, ResourceKey};
use tracing::{debug, warn};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Run the route guard for `route`; a redirect means "not signed in".
///
/// The backend is asked on every call, so an expired session is caught
/// here rather than as a 401 halfway through a command.
pub async fn require_session(
    ctx: &AppContext,
    route: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match ctx.session().guard(route).await {
        GuardOutcome::Public => Ok(()),
        GuardOutcome::Allowed(user) => {
            debug!(route, user = %user.display_name(), "route allowed");
            Ok(())
        }
        GuardOutcome::Redirect { to, from } => {
            debug!(%from, %to, "route guarded");
            Err(CliError::NotSignedIn {
                profile: profile_name(global),
            })
        }
    }
}

pub fn profile_name(global: &GlobalOpts) -> String {
    global.profile.clone().unwrap_or_else(|| "default".into())
}

/// The route a registry key belongs to: `payroll.kpis` -> `/payroll`.
pub fn route_for(key: ResourceKey) -> String {
    let name = key.to_string();
    let section = name.split('.').next().unwrap_or(&name);
    format!("/{section}")
}

/// Parse `payroll.kpis`-style names.
pub fn parse_keys(raw: &[String]) -> Result<Vec<ResourceKey>, CliError> {
    raw.iter()
        .map(|name| {
            name.parse().map_err(|_| CliError::Validation {
                field: "key".into(),
                reason: format!("unknown view '{name}' (see: erpdesk refresh --list)"),
            })
        })
        .collect()
}

/// Re-fetch the views a successful mutation touched.
///
/// This is the same page-level invalidation a long-lived front end needs
/// (`dashboard --watch`, or anything else holding the [`AppContext`]): the
/// shared cells never serve pre-mutation data. A one-shot command exits
/// without rendering them, so it only pays for the extra reads.
///
/// The mutation already happened, so a failed refresh is only a warning.
pub async fn refresh_after(ctx: &AppContext, keys: &[ResourceKey]) {
    if let Err(e) = ctx.resources().refresh_many(keys).await {
        warn!(error = %e, "refresh after update failed");
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Print a status line to stderr unless `--quiet`.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
