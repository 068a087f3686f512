// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::require;
use crate::context::AppContext;
use crate::models::TransactionType;
use crate::mutation::Submission;
use crate::route::Screen;
use anyhow::{Context, Result};

pub async fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("use", sub)) = m.subcommand() {
        require(ctx, Screen::Savings)?;
        let id = sub.get_one::<String>("id").unwrap();
        // Maturity is checked against the cached saving list.
        ctx.cache
            .transactions(TransactionType::Saving)
            .await
            .context("Failed to load savings")?;
        match ctx
            .mutations
            .use_saving(id)
            .await
            .with_context(|| format!("Cannot use saving {}", id))?
        {
            Submission::Completed(()) => println!("Saving {} released to your balance", id),
            Submission::Duplicate => println!("Saving {} is already being released", id),
        }
    }
    Ok(())
}
