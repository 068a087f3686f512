// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use super::transactions::transaction_table;
use crate::context::AppContext;
use crate::models::{Report, ReportRange};
use crate::route::Screen;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub async fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    let (range, sub) = match m.subcommand() {
        Some(("day", sub)) => (ReportRange::Day, sub),
        Some(("week", sub)) => (ReportRange::Week, sub),
        Some(("month", sub)) => (ReportRange::Month, sub),
        Some(("custom", sub)) => {
            let start = parse_date(sub.get_one::<String>("from").unwrap())?;
            let end = parse_date(sub.get_one::<String>("to").unwrap())?;
            if start > end {
                bail!("--from {} is after --to {}", start, end);
            }
            (ReportRange::Custom { start, end }, sub)
        }
        _ => return Ok(()),
    };
    require(ctx, Screen::Reports)?;

    let report = ctx
        .cache
        .report(range)
        .await
        .with_context(|| format!("Failed to load {} report", range))?;
    if !maybe_print_json(sub.get_flag("json"), &report)? {
        print_report(range, &report);
    }
    Ok(())
}

fn print_report(range: ReportRange, report: &Report) {
    println!("Report: {}", range);
    println!(
        "{}",
        pretty_table(
            &["Income", "Expenses", "Savings", "Net balance"],
            vec![vec![
                fmt_money(&report.total_income),
                fmt_money(&report.total_expenses),
                fmt_money(&report.total_savings),
                fmt_money(&report.net_balance),
            ]],
        )
    );

    let breakdown = &report.category_breakdown;
    let mut rows = Vec::new();
    let mut push = |kind: &str, map: &BTreeMap<String, Decimal>| {
        for (category, amount) in map {
            rows.push(vec![kind.to_string(), category.clone(), fmt_money(amount)]);
        }
    };
    push("income", &breakdown.income);
    push("expense", &breakdown.expenses);
    push("saving", &breakdown.savings);
    if !rows.is_empty() {
        println!("{}", pretty_table(&["Type", "Category", "Amount"], rows));
    }
    if !report.transactions.is_empty() {
        println!("{}", transaction_table(&report.transactions));
    }
}
