//! Login, logout, status and identity handlers.

use dialoguer::Input;
use serde::Serialize;
use url::Url;

use qpw_core::{Connection, Identity};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::{CliError, prompt_err};
use crate::output;

// ── Login ────────────────────────────────────────────────────────────

pub async fn login(
    connection: &Connection,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let authorize = connection.authorize_url(global.region.as_deref())?;

    let pasted = if let Some(redirect) = args.redirect {
        redirect
    } else {
        eprintln!("Open this URL in a browser and sign in:\n");
        eprintln!("  {authorize}\n");
        Input::<String>::new()
            .with_prompt("Paste the address you were redirected to")
            .interact_text()
            .map_err(prompt_err)?
    };

    let mut location: Url = pasted.trim().parse().map_err(|e| CliError::Validation {
        field: "redirect".into(),
        reason: format!("not a URL: {e}"),
    })?;

    let outcome = connection
        .complete_login(&mut location)
        .await
        .ok_or(CliError::LoginIncomplete)?;

    let who = outcome
        .identity
        .as_ref()
        .map_or_else(|| "(identity unconfirmed)".to_owned(), describe_identity);
    let region = connection
        .session()
        .region()
        .unwrap_or("<unknown>")
        .to_owned();

    if !global.quiet {
        eprintln!("Logged in as {who} in {region}");
        if outcome.expires_in_seconds > 0 {
            eprintln!("Token expires in {}m", outcome.expires_in_seconds / 60);
        }
    }
    Ok(())
}

pub fn logout(connection: &Connection, global: &GlobalOpts) {
    connection.logout();
    if !global.quiet {
        eprintln!("Logged out");
    }
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StatusView {
    profile: String,
    client_id: String,
    region: Option<String>,
    logged_in: bool,
    token: Option<String>,
}

pub fn status(connection: &Connection, profile: &str, global: &GlobalOpts) {
    let session = connection.session();
    let view = StatusView {
        profile: profile.to_owned(),
        client_id: connection.config().client_id.clone(),
        region: session
            .region()
            .map(str::to_owned)
            .or_else(|| connection.config().default_region.clone()),
        logged_in: connection.is_logged_in(),
        token: connection.token_hint(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output(),
        &view,
        |v| {
            format!(
                "Profile:    {}\nClient id:  {}\nRegion:     {}\nLogged in:  {}\nToken:      {}",
                v.profile,
                v.client_id,
                v.region.as_deref().unwrap_or("-"),
                output::yes_no(v.logged_in, color),
                v.token.as_deref().unwrap_or("-"),
            )
        },
        |v| if v.logged_in { "logged-in" } else { "logged-out" }.to_owned(),
    );
    output::print_output(&out, global.quiet);
}

// ── Whoami ───────────────────────────────────────────────────────────

pub async fn whoami(connection: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    let identity = connection.whoami().await?;
    let out = output::render_single(
        &global.output(),
        &identity,
        |i| {
            format!(
                "Id:     {}\nName:   {}\nEmail:  {}",
                i.id,
                i.name.as_deref().unwrap_or("-"),
                i.email.as_deref().unwrap_or("-"),
            )
        },
        |i| i.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn describe_identity(identity: &Identity) -> String {
    match (&identity.name, &identity.email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => name.clone(),
        (None, Some(email)) => email.clone(),
        (None, None) => identity.id.clone(),
    }
}
