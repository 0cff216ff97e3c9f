//! Payroll command handlers.

use erpdesk_core::model::{
    NewPayslip, NewSalaryDefinition, NewTaxDefinition, PayrollKpis, PayrollMonth, Payslip,
    SalaryDefinition, TaxDefinition,
};
use erpdesk_core::{AppContext, ResourceKey};
use tabled::Tabled;

use crate::cli::{
    GlobalOpts, PayrollArgs, PayrollCommand, PayslipsCommand, SalaryDefinitionFields,
    SalaryDefinitionsCommand, TaxDefinitionsCommand,
};
use crate::error::CliError;
use crate::output::{self, money};

use super::util;

const ROUTE: &str = "/payroll";

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl From<&PayrollMonth> for MonthRow {
    fn from(m: &PayrollMonth) -> Self {
        Self {
            month: m.month.clone(),
            gross: money(m.gross),
            net: money(m.net),
            tax: money(m.tax),
        }
    }
}

#[derive(Tabled)]
struct SalaryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Basic")]
    basic: String,
    #[tabled(rename = "Allowances")]
    allowances: String,
}

impl From<&SalaryDefinition> for SalaryRow {
    fn from(d: &SalaryDefinition) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            grade: d.grade.clone().unwrap_or_default(),
            basic: money(d.basic),
            allowances: money(d.allowances),
        }
    }
}

#[derive(Tabled)]
struct TaxRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Rate %")]
    rate: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
}

impl From<&TaxDefinition> for TaxRow {
    fn from(t: &TaxDefinition) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            rate: format!("{:.2}", t.rate),
            threshold: t.threshold.map(money).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct PayslipRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn payslip_row(p: &Payslip, color: bool) -> PayslipRow {
    PayslipRow {
        id: p.id.clone(),
        staff: p.staff_name.clone().unwrap_or_else(|| p.staff_id.clone()),
        period: p.period.clone(),
        gross: money(p.gross),
        net: money(p.net),
        status: p
            .status
            .as_deref()
            .map(|s| output::paint_status(s, color))
            .unwrap_or_default(),
    }
}

fn kpi_detail(k: &PayrollKpis) -> String {
    output::detail_lines(&[
        ("Gross", money(k.gross)),
        ("Net", money(k.net)),
        ("Tax", money(k.tax)),
        ("Loans", money(k.loan)),
    ])
}

fn salary_detail(d: &SalaryDefinition) -> String {
    output::detail_lines(&[
        ("ID", d.id.clone()),
        ("Name", d.name.clone()),
        ("Grade", d.grade.clone().unwrap_or_default()),
        ("Basic", money(d.basic)),
        ("Allowances", money(d.allowances)),
    ])
}

fn new_salary(fields: SalaryDefinitionFields) -> Result<NewSalaryDefinition, CliError> {
    if fields.basic < 0.0 || fields.allowances < 0.0 {
        return Err(CliError::Validation {
            field: "basic".into(),
            reason: "pay amounts cannot be negative".into(),
        });
    }
    Ok(NewSalaryDefinition {
        name: fields.name,
        grade: fields.grade,
        basic: fields.basic,
        allowances: fields.allowances,
    })
}

fn validate_period(period: &str) -> Result<(), CliError> {
    let ok = period.len() == 7
        && period.as_bytes()[4] == b'-'
        && chrono::NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").is_ok();
    if ok {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "period".into(),
            reason: format!("expected YYYY-MM, got '{period}'"),
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &AppContext,
    args: PayrollArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(ctx, ROUTE, global).await?;
    let resources = ctx.resources();

    match args.command {
        PayrollCommand::Kpis => {
            let cell = resources.payroll_kpis();
            cell.refresh().await?;
            if let Some(kpis) = cell.value() {
                let out = output::render_single(&global.output, &*kpis, kpi_detail, kpi_detail);
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
        PayrollCommand::Summary => {
            let cell = resources.payroll_summary();
            cell.refresh().await?;
            if let Some(summary) = cell.value() {
                let out = output::render_list(
                    &global.output,
                    &summary.months,
                    |m| MonthRow::from(m),
                    |m| m.month.clone(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
        PayrollCommand::SalaryDefinitions(sub) => salary_definitions(ctx, sub.command, global).await,
        PayrollCommand::TaxDefinitions(sub) => tax_definitions(ctx, sub.command, global).await,
        PayrollCommand::Payslips(sub) => payslips(ctx, sub.command, global).await,
    }
}

async fn salary_definitions(
    ctx: &AppContext,
    cmd: SalaryDefinitionsCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let saved = match cmd {
        SalaryDefinitionsCommand::List => {
            let cell = ctx.resources().salary_definitions();
            cell.refresh().await?;
            if let Some(page) = cell.value() {
                let out = output::render_list(&global.output, &page.items, |d| SalaryRow::from(d), |d| {
                    d.id.clone()
                });
                output::print_output(&out, global.quiet);
            }
            return Ok(());
        }
        SalaryDefinitionsCommand::Create(fields) => {
            let def = new_salary(fields)?;
            ctx.api().create_salary_definition(&def).await?
        }
        SalaryDefinitionsCommand::Update { id, fields } => {
            let def = new_salary(fields)?;
            ctx.api().update_salary_definition(&id, &def).await?
        }
        SalaryDefinitionsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete salary definition {id}?"), global.yes)? {
                return Ok(());
            }
            ctx.api().delete_salary_definition(&id).await?;
            util::refresh_after(ctx, &[ResourceKey::SalaryDefinitions]).await;
            util::note(global, &format!("Deleted salary definition {id}"));
            return Ok(());
        }
    };

    util::refresh_after(ctx, &[ResourceKey::SalaryDefinitions]).await;
    let out = output::render_single(&global.output, &saved, salary_detail, |d| d.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn tax_definitions(
    ctx: &AppContext,
    cmd: TaxDefinitionsCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        TaxDefinitionsCommand::List => {
            let cell = ctx.resources().tax_definitions();
            cell.refresh().await?;
            if let Some(page) = cell.value() {
                let out = output::render_list(&global.output, &page.items, |t| TaxRow::from(t), |t| {
                    t.id.clone()
                });
                output::print_output(&out, global.quiet);
            }
        }
        TaxDefinitionsCommand::Create {
            name,
            rate,
            threshold,
        } => {
            if !(0.0..=100.0).contains(&rate) {
                return Err(CliError::Validation {
                    field: "rate".into(),
                    reason: "must be between 0 and 100".into(),
                });
            }
            let created = ctx
                .api()
                .create_tax_definition(&NewTaxDefinition {
                    name,
                    rate,
                    threshold,
                })
                .await?;
            util::refresh_after(ctx, &[ResourceKey::TaxDefinitions]).await;
            util::note(global, &format!("Created tax definition {}", created.id));
        }
        TaxDefinitionsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete tax definition {id}?"), global.yes)? {
                return Ok(());
            }
            ctx.api().delete_tax_definition(&id).await?;
            util::refresh_after(ctx, &[ResourceKey::TaxDefinitions]).await;
            util::note(global, &format!("Deleted tax definition {id}"));
        }
    }
    Ok(())
}

async fn payslips(
    ctx: &AppContext,
    cmd: PayslipsCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let rows: Vec<Payslip> = match cmd {
        PayslipsCommand::List => {
            let cell = ctx.resources().payslips();
            cell.refresh().await?;
            cell.value().map(|page| page.items.clone()).unwrap_or_default()
        }
        PayslipsCommand::Create { staff, period } => {
            validate_period(&period)?;
            let slip = ctx
                .api()
                .create_payslip(&NewPayslip {
                    staff_id: staff,
                    period,
                })
                .await?;
            // Only the payslip list is refreshed; KPIs catch up on their next load.
            util::refresh_after(ctx, &[ResourceKey::Payslips]).await;
            vec![slip]
        }
    };

    let out = output::render_list(
        &global.output,
        &rows,
        |p| payslip_row(p, color),
        |p| p.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
