// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use crate::context::AppContext;
use crate::models::{NewTransaction, Transaction, TransactionType};
use crate::mutation::Submission;
use crate::route::Screen;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};

pub async fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ctx, sub).await?,
        Some(("list", sub)) => list(ctx, sub).await?,
        Some(("recent", sub)) => recent(ctx, sub).await?,
        Some(("cancel", sub)) => cancel(ctx, sub).await?,
        Some(("cancelled", sub)) => cancelled(ctx, sub).await?,
        _ => {}
    }
    Ok(())
}

pub async fn balance(ctx: &AppContext, json_flag: bool) -> Result<()> {
    require(ctx, Screen::Dashboard)?;
    let agg = ctx.cache.balance().await.context("Failed to load balance")?;
    if !maybe_print_json(json_flag, &agg)? {
        println!(
            "{}",
            pretty_table(
                &["Net balance", "Income", "Expenses", "Savings"],
                vec![vec![
                    fmt_money(&agg.net_balance),
                    fmt_money(&agg.total_income),
                    fmt_money(&agg.total_expenses),
                    fmt_money(&agg.total_savings),
                ]],
            )
        );
    }
    Ok(())
}

fn parse_type(sub: &clap::ArgMatches) -> Result<TransactionType> {
    sub.get_one::<String>("type")
        .unwrap()
        .parse::<TransactionType>()
        .map_err(anyhow::Error::msg)
}

async fn add(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::Transactions)?;
    let ty = parse_type(sub)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let usage_date = sub
        .get_one::<String>("usage-date")
        .map(|s| parse_date(s))
        .transpose()?;

    // The balance gate needs a loaded aggregate.
    if ty.draws_balance() {
        ctx.cache.balance().await.context("Failed to load balance")?;
    }

    let tx = NewTransaction {
        r#type: ty,
        description: sub.get_one::<String>("description").unwrap().to_string(),
        amount,
        category: sub.get_one::<String>("category").unwrap().to_string(),
        usage_date,
    };
    match ctx
        .mutations
        .create_transaction(tx)
        .await
        .context("Failed to record transaction")?
    {
        Submission::Completed(t) => println!(
            "Recorded {} of {} for '{}' ({})",
            t.r#type,
            fmt_money(&t.amount),
            t.description,
            t.id
        ),
        Submission::Duplicate => println!("An identical transaction is already being recorded"),
    }
    Ok(())
}

async fn list(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let ty = parse_type(sub)?;
    let screen = if ty == TransactionType::Saving {
        Screen::Savings
    } else {
        Screen::Transactions
    };
    require(ctx, screen)?;
    let data = ctx
        .cache
        .transactions(ty)
        .await
        .with_context(|| format!("Failed to load {} transactions", ty))?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        println!("{}", transaction_table(&data.transactions));
        println!("Total {}: {}", ty, fmt_money(&data.total));
    }
    Ok(())
}

async fn recent(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::Dashboard)?;
    let data = ctx
        .cache
        .recent()
        .await
        .context("Failed to load recent transactions")?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        println!("{}", transaction_table(&data));
    }
    Ok(())
}

async fn cancel(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::Transactions)?;
    let id = sub.get_one::<String>("id").unwrap();
    match ctx
        .mutations
        .cancel_transaction(id)
        .await
        .with_context(|| format!("Failed to cancel transaction {}", id))?
    {
        Submission::Completed(()) => println!("Cancelled transaction {}", id),
        Submission::Duplicate => println!("Cancellation of {} already in progress", id),
    }
    Ok(())
}

async fn cancelled(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    require(ctx, Screen::History)?;
    let data = ctx
        .cache
        .cancelled()
        .await
        .context("Failed to load cancelled transactions")?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    c.transaction.id.clone(),
                    c.transaction.r#type.to_string(),
                    c.transaction.description.clone(),
                    fmt_money(&c.transaction.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Cancelled", "ID", "Type", "Description", "Amount"], rows)
        );
    }
    Ok(())
}

pub(crate) fn transaction_table(txs: &[Transaction]) -> comfy_table::Table {
    let rows = txs
        .iter()
        .map(|t| {
            vec![
                t.created_at.format("%Y-%m-%d").to_string(),
                t.id.clone(),
                t.r#type.to_string(),
                t.description.clone(),
                t.category.clone(),
                fmt_money(&t.amount),
                t.usage_date.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(
        &["Date", "ID", "Type", "Description", "Category", "Amount", "Usable from"],
        rows,
    )
}
