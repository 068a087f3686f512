// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use crate::context::AppContext;
use crate::models::NewGoal;
use crate::mutation::Submission;
use crate::route::Screen;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};

pub async fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::Goals)?;
    match m.subcommand() {
        Some(("add", sub)) => add(ctx, sub).await?,
        Some(("list", sub)) => list(ctx, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn add(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let goal = NewGoal {
        category_name: sub.get_one::<String>("category").unwrap().to_string(),
        limit_amount: parse_decimal(sub.get_one::<String>("limit").unwrap())?,
        starting_date: parse_date(sub.get_one::<String>("start").unwrap())?,
        ending_date: parse_date(sub.get_one::<String>("end").unwrap())?,
    };
    match ctx
        .mutations
        .create_goal(goal)
        .await
        .context("Failed to create goal")?
    {
        Submission::Completed(g) => println!(
            "Goal for {} set to {} ({} to {})",
            g.category_name,
            fmt_money(&g.limit_amount),
            g.starting_date,
            g.ending_date
        ),
        Submission::Duplicate => println!("An identical goal is already being created"),
    }
    Ok(())
}

async fn list(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let goals = ctx.cache.goals().await.context("Failed to load goals")?;
    if !maybe_print_json(sub.get_flag("json"), &goals)? {
        let rows = goals
            .iter()
            .map(|g| {
                vec![
                    g.category_name.clone(),
                    fmt_money(&g.limit_amount),
                    fmt_money(&g.usage_amount),
                    fmt_money(&g.remained_amount),
                    format!("{:.1}%", g.usage_percentage),
                    format!("{} to {}", g.starting_date, g.ending_date),
                    if g.is_valid { "active" } else { "expired" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Category", "Limit", "Used", "Left", "Used %", "Period", "Status"],
                rows,
            )
        );
    }
    Ok(())
}
