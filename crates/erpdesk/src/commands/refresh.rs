//! `erpdesk refresh`: re-fetch registry views by name.

use std::collections::BTreeSet;

use erpdesk_core::{AppContext, JsonSnapshot, ResourceKey, ResourceRegistry};
use tabled::Tabled;

use crate::cli::{GlobalOpts, RefreshArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "View")]
    key: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn snapshot_row(snap: &JsonSnapshot, color: bool) -> SnapshotRow {
    let state = match (&snap.error, &snap.data) {
        (Some(_), _) => "failed",
        (None, Some(_)) => "ready",
        (None, None) => "idle",
    };
    SnapshotRow {
        key: snap.key.clone(),
        state: output::paint_status(state, color),
        error: snap.error.clone().unwrap_or_default(),
    }
}

pub async fn handle(ctx: &AppContext, args: RefreshArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.list {
        for key in ResourceRegistry::keys() {
            println!("{key}");
        }
        return Ok(());
    }

    let keys: Vec<ResourceKey> = if args.all {
        ResourceRegistry::keys().collect()
    } else {
        util::parse_keys(&args.keys)?
    };

    let routes: BTreeSet<String> = keys.iter().copied().map(util::route_for).collect();
    for route in &routes {
        util::require_session(ctx, route, global).await?;
    }

    // Every view is refreshed even when one fails; report the table first.
    let result = ctx.resources().refresh_many(&keys).await;

    let snapshots = keys
        .iter()
        .map(|key| ctx.resources().snapshot_json(*key))
        .collect::<Result<Vec<_>, _>>()?;
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &snapshots,
        |s| snapshot_row(s, color),
        |s| s.key.clone(),
    );
    output::print_output(&out, global.quiet);

    result.map_err(Into::into)
}
