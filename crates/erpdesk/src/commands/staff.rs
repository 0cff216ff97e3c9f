//! Staff directory handlers.

use erpdesk_core::AppContext;
use erpdesk_core::model::{Staff, StaffQuery};
use tabled::Tabled;

use crate::cli::{GlobalOpts, StaffArgs, StaffCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const ROUTE: &str = "/staff";

#[derive(Tabled)]
struct StaffRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn staff_row(s: &Staff, color: bool) -> StaffRow {
    StaffRow {
        id: s.id.clone(),
        name: s.name.clone(),
        email: s.email.clone().unwrap_or_default(),
        department: s.department.clone().unwrap_or_default(),
        position: s.position.clone().unwrap_or_default(),
        status: s
            .status
            .as_deref()
            .map(|st| output::paint_status(st, color))
            .unwrap_or_default(),
    }
}

fn staff_detail(s: &Staff) -> String {
    output::detail_lines(&[
        ("ID", s.id.clone()),
        ("Name", s.name.clone()),
        ("Email", s.email.clone().unwrap_or_default()),
        ("Department", s.department.clone().unwrap_or_default()),
        ("Position", s.position.clone().unwrap_or_default()),
        ("Status", s.status.clone().unwrap_or_default()),
    ])
}

pub async fn handle(ctx: &AppContext, args: StaffArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::require_session(ctx, ROUTE, global).await?;

    match args.command {
        StaffCommand::Search {
            query,
            department,
            page,
            limit,
        } => {
            if page == 0 || limit == 0 {
                return Err(CliError::Validation {
                    field: "page".into(),
                    reason: "page and limit start at 1".into(),
                });
            }
            let cell = ctx.resources().staff_search(StaffQuery {
                search: query,
                department,
                page,
                limit,
            });
            cell.refresh().await?;
            let color = output::should_color(&global.color);
            if let Some(results) = cell.value() {
                let out = output::render_list(
                    &global.output,
                    &results.items,
                    |s| staff_row(s, color),
                    |s| s.id.clone(),
                );
                output::print_output(&out, global.quiet);
                if let Some(total) = results.total {
                    util::note(global, &format!("{} of {total} shown", results.items.len()));
                }
            }
        }
        StaffCommand::Show { id } => {
            let staff = ctx.api().get_staff(&id).await?;
            let out = output::render_single(&global.output, &staff, staff_detail, |s| s.id.clone());
            output::print_output(&out, global.quiet);
        }
        StaffCommand::Upload { id, file } => {
            let file_name = file
                .file_name()
                .and_then(std::ffi::OsStr::to_str)
                .ok_or_else(|| CliError::Validation {
                    field: "file".into(),
                    reason: format!("'{}' is not a file path", file.display()),
                })?
                .to_owned();
            let bytes = tokio::fs::read(&file).await?;
            let doc = ctx
                .api()
                .upload_staff_document(&id, &file_name, bytes)
                .await?;
            util::note(global, &format!("Uploaded {} ({})", doc.file_name, doc.id));
            if let Some(url) = doc.url {
                output::print_output(&url, global.quiet);
            }
        }
    }
    Ok(())
}
