// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod transactions;
pub mod goals;
pub mod savings;
pub mod reports;
pub mod profile;

use crate::context::AppContext;
use crate::route::{RouteDecision, Screen};
use anyhow::{bail, Result};

/// Refuse to run a command whose screen the session may not open.
pub(crate) fn require(ctx: &AppContext, screen: Screen) -> Result<()> {
    match ctx.route.decide(screen) {
        RouteDecision::Render => Ok(()),
        RouteDecision::Placeholder => bail!("Session is still loading"),
        RouteDecision::Redirect(to) => bail!("Not signed in; run `fintrack {}` first", to),
    }
}
