// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use crate::context::AppContext;
use crate::models::{Credentials, Registration};
use crate::mutation::Submission;
use crate::route::Screen;
use crate::session::{LogoutReason, SessionStatus};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Context, Result};
use serde::Serialize;

pub async fn login(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let username = sub.get_one::<String>("username").unwrap();
    let password = sub.get_one::<String>("password").unwrap();
    let session = ctx
        .session
        .login(&Credentials::new(username.as_str(), password.as_str()))
        .await
        .context("Login failed")?;
    println!("Signed in as {} ({})", session.profile.username, session.user_id);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.logout().await;
    println!("Signed out");
    Ok(())
}

pub async fn register(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let arg = |name: &str| sub.get_one::<String>(name).unwrap().to_string();
    let registration = Registration {
        username: arg("username"),
        email: arg("email"),
        password: arg("password"),
        confirm_password: arg("confirm"),
        phone_number: arg("phone"),
    };
    ctx.session
        .register(&registration)
        .await
        .context("Registration failed")?;
    println!("Account created for {}; sign in with `fintrack login`", registration.username);
    Ok(())
}

pub async fn forgot_password(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").unwrap();
    ctx.session
        .forgot_password(email)
        .await
        .context("Password reset request failed")?;
    println!("If {} belongs to an account, a reset link is on its way", email.trim());
    Ok(())
}

#[derive(Serialize)]
struct StatusRow {
    state: &'static str,
    user_id: Option<String>,
    username: Option<String>,
    email: Option<String>,
}

pub fn status(ctx: &AppContext, json_flag: bool) -> Result<()> {
    let session = ctx.session.current();
    let state = match ctx.session.status() {
        SessionStatus::Pending => "loading",
        SessionStatus::SignedIn { .. } => "signed in",
        SessionStatus::SignedOut {
            reason: Some(LogoutReason::Expired),
        } => "signed out (session expired)",
        SessionStatus::SignedOut {
            reason: Some(LogoutReason::StorageFailed),
        } => "signed out (session could not be stored)",
        SessionStatus::SignedOut { .. } => "signed out",
    };
    let row = StatusRow {
        state,
        user_id: session.as_ref().map(|s| s.user_id.to_string()),
        username: session.as_ref().map(|s| s.profile.username.clone()),
        email: session.as_ref().and_then(|s| s.profile.email.clone()),
    };
    if !maybe_print_json(json_flag, &row)? {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
        println!(
            "{}",
            pretty_table(
                &["State", "User", "Username", "Email"],
                vec![vec![
                    row.state.to_string(),
                    or_dash(&row.user_id),
                    or_dash(&row.username),
                    or_dash(&row.email),
                ]],
            )
        );
    }
    Ok(())
}

pub async fn account(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("delete", sub)) = m.subcommand() {
        require(ctx, Screen::Settings)?;
        if !sub.get_flag("yes") {
            bail!("Refusing to delete the account without --yes");
        }
        match ctx
            .mutations
            .delete_account()
            .await
            .context("Failed to delete account")?
        {
            Submission::Completed(()) => println!("Account deleted; you have been signed out"),
            Submission::Duplicate => println!("Account deletion already in progress"),
        }
    }
    Ok(())
}
