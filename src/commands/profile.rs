// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use crate::context::AppContext;
use crate::models::{PasswordChange, ProfileUpdate};
use crate::mutation::Submission;
use crate::route::Screen;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};

pub async fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::Profile)?;
    match m.subcommand() {
        Some(("show", sub)) => show(ctx, sub).await?,
        Some(("update", sub)) => update(ctx, sub).await?,
        Some(("password", sub)) => password(ctx, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn show(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let profile = ctx.cache.profile().await.context("Failed to load profile")?;
    if !maybe_print_json(sub.get_flag("json"), &profile)? {
        println!(
            "{}",
            pretty_table(
                &["Username", "Email", "Phone"],
                vec![vec![
                    profile.username,
                    profile.email.unwrap_or_default(),
                    profile.phone_number.unwrap_or_default(),
                ]],
            )
        );
    }
    Ok(())
}

async fn update(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let update = ProfileUpdate {
        username: sub.get_one::<String>("username").cloned(),
        email: sub.get_one::<String>("email").cloned(),
        phone_number: sub.get_one::<String>("phone").cloned(),
    };
    match ctx
        .mutations
        .update_profile(update)
        .await
        .context("Failed to update profile")?
    {
        Submission::Completed(p) => println!("Profile updated for {}", p.username),
        Submission::Duplicate => println!("A profile update is already in progress"),
    }
    Ok(())
}

async fn password(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let change = PasswordChange {
        current_password: sub.get_one::<String>("current").unwrap().to_string(),
        new_password: sub.get_one::<String>("new").unwrap().to_string(),
    };
    match ctx
        .mutations
        .change_credential(change)
        .await
        .context("Failed to change password")?
    {
        Submission::Completed(()) => println!("Password changed"),
        Submission::Duplicate => println!("A password change is already in progress"),
    }
    Ok(())
}
