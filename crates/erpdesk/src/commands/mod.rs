//! Command dispatch: bridges CLI args -> core resources -> output formatting.

pub mod auth;
pub mod budget;
pub mod config_cmd;
pub mod dashboard;
pub mod payroll;
pub mod refresh;
pub mod staff;
pub mod util;

use erpdesk_core::AppContext;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Signup(args) => auth::signup(ctx, args, global).await,
        Command::Logout => auth::logout(ctx, global).await,
        Command::Whoami => auth::whoami(ctx, global).await,
        Command::Dashboard(args) => dashboard::handle(ctx, args, global).await,
        Command::Payroll(args) => payroll::handle(ctx, args, global).await,
        Command::Budget(args) => budget::handle(ctx, args, global).await,
        Command::Staff(args) => staff::handle(ctx, args, global).await,
        Command::Refresh(args) => refresh::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
