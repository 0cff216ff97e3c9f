//! Session command handlers: login, signup, logout, whoami.

use dialoguer::Input;
use secrecy::SecretString;

use erpdesk_core::{AppContext, User};

use crate::cli::{GlobalOpts, LoginArgs, SignupArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn prompt_password(given: Option<String>) -> Result<SecretString, CliError> {
    let password = match given {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").map_err(util::prompt_err)?,
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

fn user_detail(user: &User) -> String {
    output::detail_lines(&[
        ("ID", user.id.clone()),
        ("Name", user.name.clone().unwrap_or_default()),
        ("Email", user.email.clone()),
        ("Role", user.role.clone().unwrap_or_default()),
    ])
}

pub async fn login(ctx: &AppContext, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let password = prompt_password(args.password)?;

    let user = ctx.session().sign_in(&email, &password).await?;
    util::note(global, &format!("Signed in as {}", user.display_name()));
    Ok(())
}

pub async fn signup(
    ctx: &AppContext,
    args: SignupArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = prompt_password(args.password)?;
    let user = ctx
        .session()
        .sign_up(&args.name, &args.email, &password)
        .await?;
    util::note(
        global,
        &format!("Account created; signed in as {}", user.display_name()),
    );
    Ok(())
}

/// Never fails: whatever the backend says, local credentials are gone.
pub async fn logout(ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.session().logout().await;
    util::note(global, "Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(user) = ctx.session().bootstrap().await else {
        return Err(CliError::NotSignedIn {
            profile: util::profile_name(global),
        });
    };
    let out = output::render_single(&global.output, &*user, user_detail, |u| u.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
