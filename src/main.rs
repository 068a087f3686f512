// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::path::PathBuf;

use fintrack::config::ClientConfig;
use fintrack::{cli, commands, logging, AppContext};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = ClientConfig::load_from(matches.get_one::<PathBuf>("config").map(|p| p.as_path()))
        .context("Failed to load configuration")?;
    logging::init(&config.log.level);

    let ctx = AppContext::from_config(config).context("Failed to initialize client")?;
    ctx.init().await;
    let json_flag = matches.get_flag("json");

    let outcome = match matches.subcommand() {
        Some(("login", sub)) => commands::auth::login(&ctx, sub).await,
        Some(("logout", _)) => commands::auth::logout(&ctx).await,
        Some(("register", sub)) => commands::auth::register(&ctx, sub).await,
        Some(("forgot-password", sub)) => commands::auth::forgot_password(&ctx, sub).await,
        Some(("status", _)) => commands::auth::status(&ctx, json_flag),
        Some(("balance", _)) => commands::transactions::balance(&ctx, json_flag).await,
        Some(("tx", sub)) => commands::transactions::handle(&ctx, sub).await,
        Some(("goal", sub)) => commands::goals::handle(&ctx, sub).await,
        Some(("saving", sub)) => commands::savings::handle(&ctx, sub).await,
        Some(("report", sub)) => commands::reports::handle(&ctx, sub).await,
        Some(("profile", sub)) => commands::profile::handle(&ctx, sub).await,
        Some(("account", sub)) => commands::auth::account(&ctx, sub).await,
        _ => {
            cli::build_cli().print_help()?;
            println!();
            Ok(())
        }
    };
    ctx.teardown();
    outcome
}
