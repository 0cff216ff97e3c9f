//! Budget request handlers.

use erpdesk_core::model::{BudgetEntry, BudgetKpis, NewBudgetEntry};
use erpdesk_core::{AppContext, ResourceKey};
use tabled::Tabled;

use crate::cli::{BudgetArgs, BudgetCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, money};

use super::util;

const ROUTE: &str = "/budget";

/// Views that change whenever a request is created or decided.
const TOUCHED: [ResourceKey; 2] = [ResourceKey::BudgetEntries, ResourceKey::BudgetKpis];

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn entry_row(e: &BudgetEntry, color: bool) -> EntryRow {
    EntryRow {
        id: e.id.clone(),
        title: e.title.clone(),
        department: e.department.clone().unwrap_or_default(),
        amount: money(e.amount),
        status: output::paint_status(e.status.as_deref().unwrap_or("pending"), color),
        created: e
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}

fn kpi_detail(k: &BudgetKpis) -> String {
    output::detail_lines(&[
        ("Requested", money(k.total_requested)),
        ("Approved", money(k.total_approved)),
        ("Pending", k.pending_count.to_string()),
        ("Rejected", k.rejected_count.to_string()),
    ])
}

fn print_entries(entries: &[BudgetEntry], global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        entries,
        |e| entry_row(e, color),
        |e| e.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(ctx: &AppContext, args: BudgetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::require_session(ctx, ROUTE, global).await?;

    match args.command {
        BudgetCommand::List => {
            let cell = ctx.resources().budget_entries();
            cell.refresh().await?;
            if let Some(page) = cell.value() {
                print_entries(&page.items, global);
            }
        }
        BudgetCommand::Kpis => {
            let cell = ctx.resources().budget_kpis();
            cell.refresh().await?;
            if let Some(kpis) = cell.value() {
                let out = output::render_single(&global.output, &*kpis, kpi_detail, kpi_detail);
                output::print_output(&out, global.quiet);
            }
        }
        BudgetCommand::Create {
            title,
            amount,
            department,
        } => {
            if amount <= 0.0 {
                return Err(CliError::Validation {
                    field: "amount".into(),
                    reason: "must be greater than zero".into(),
                });
            }
            let entry = ctx
                .api()
                .create_budget_entry(&NewBudgetEntry {
                    title,
                    department,
                    amount,
                })
                .await?;
            util::refresh_after(ctx, &TOUCHED).await;
            print_entries(std::slice::from_ref(&entry), global);
        }
        BudgetCommand::Approve { id } => decide(ctx, &id, "approved", global).await?,
        BudgetCommand::Reject { id } => decide(ctx, &id, "rejected", global).await?,
    }
    Ok(())
}

async fn decide(
    ctx: &AppContext,
    id: &str,
    status: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entry = ctx.api().update_budget_entry_status(id, status).await?;
    util::refresh_after(ctx, &TOUCHED).await;
    print_entries(std::slice::from_ref(&entry), global);
    Ok(())
}
