//! Dashboard command: one-shot render or a live-updating watch.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Local;
use erpdesk_core::model::DashboardSummary;
use erpdesk_core::{AppContext, Resource, Snapshot};
use tracing::debug;

use crate::cli::{DashboardArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

const ROUTE: &str = "/dashboard";

fn summary_detail(s: &DashboardSummary) -> String {
    output::detail_lines(&[
        ("Staff", s.staff_count.to_string()),
        ("Active staff", s.active_staff.to_string()),
        ("Pending memos", s.pending_memos.to_string()),
        ("Open circulars", s.open_circulars.to_string()),
        ("Pending budget requests", s.pending_budget_requests.to_string()),
        ("Open procurements", s.open_procurements.to_string()),
        ("Upcoming maintenance", s.upcoming_maintenance.to_string()),
    ])
}

fn render(summary: &DashboardSummary, global: &GlobalOpts) {
    let out = output::render_single(&global.output, summary, summary_detail, summary_detail);
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    ctx: &AppContext,
    args: DashboardArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(ctx, ROUTE, global).await?;
    let cell = ctx.resources().dashboard_summary();

    if !args.watch {
        cell.refresh().await?;
        if let Some(summary) = cell.value() {
            render(&summary, global);
        }
        return Ok(());
    }

    watch(cell, Duration::from_secs(args.interval.max(1)), global).await
}

/// Refresh on a timer and redraw whenever a refresh lands.
///
/// Refreshes are fire-and-forget; a failed one keeps the last good
/// summary on screen with the error underneath.
async fn watch(
    cell: &Resource<DashboardSummary>,
    every: Duration,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut stream = cell.watch();
    let mut ticker = tokio::time::interval(every);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let clear = matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal();

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            changed = stream.changed() => {
                let Some(snap) = changed else { break };
                if !snap.loading {
                    draw(cell, &snap, clear, global);
                }
            }
            _ = ticker.tick() => {
                debug!("dashboard tick");
                drop(cell.refresh());
            }
        }
    }
    Ok(())
}

fn draw(
    cell: &Resource<DashboardSummary>,
    snap: &Snapshot<DashboardSummary>,
    clear: bool,
    global: &GlobalOpts,
) {
    if clear {
        print!("\x1b[2J\x1b[H");
    }
    if let Some(ref summary) = snap.data {
        render(summary, global);
    }
    if !global.quiet {
        if let Some(at) = cell.last_updated() {
            eprintln!("updated {}", at.with_timezone(&Local).format("%H:%M:%S"));
        }
        if let Some(ref err) = snap.error {
            eprintln!("refresh failed: {}", err.user_message());
        }
    }
}
