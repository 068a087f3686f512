// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Which screens may render, derived from the session status.

use crate::session::SessionStatus;
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl From<&SessionStatus> for RouteState {
    fn from(status: &SessionStatus) -> Self {
        match status {
            SessionStatus::Pending => RouteState::Loading,
            SessionStatus::SignedIn { .. } => RouteState::Authenticated,
            SessionStatus::SignedOut { .. } => RouteState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Entry,
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Transactions,
    Savings,
    Goals,
    Reports,
    History,
    Profile,
    Settings,
}

impl Screen {
    pub fn is_protected(&self) -> bool {
        !matches!(
            self,
            Screen::Entry | Screen::Login | Screen::Register | Screen::ForgotPassword
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Screen::Entry => "entry",
            Screen::Login => "login",
            Screen::Register => "register",
            Screen::ForgotPassword => "forgot-password",
            Screen::Dashboard => "dashboard",
            Screen::Transactions => "transactions",
            Screen::Savings => "savings",
            Screen::Goals => "goals",
            Screen::Reports => "reports",
            Screen::History => "history",
            Screen::Profile => "profile",
            Screen::Settings => "settings",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    /// Session not resolved yet; show a neutral placeholder.
    Placeholder,
    Redirect(Screen),
}

/// Holds no state of its own; every answer is derived from the session
/// status at the time of the call.
#[derive(Clone)]
pub struct RouteGate {
    status: watch::Receiver<SessionStatus>,
}

impl fmt::Debug for RouteGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGate")
            .field("state", &self.state())
            .finish()
    }
}

impl RouteGate {
    pub fn new(status: watch::Receiver<SessionStatus>) -> Self {
        Self { status }
    }

    /// Current state. Reads the latest session status, so it never lags a
    /// login or logout that has already returned.
    pub fn state(&self) -> RouteState {
        RouteState::from(&*self.status.borrow())
    }

    pub fn decide(&self, screen: Screen) -> RouteDecision {
        if !screen.is_protected() {
            return RouteDecision::Render;
        }
        match self.state() {
            RouteState::Authenticated => RouteDecision::Render,
            RouteState::Loading => RouteDecision::Placeholder,
            RouteState::Unauthenticated => RouteDecision::Redirect(Screen::Login),
        }
    }

    /// Wait for the session to leave `Loading`.
    pub async fn wait_until_resolved(&self) -> RouteState {
        let mut rx = self.status.clone();
        match rx
            .wait_for(|s| !matches!(s, SessionStatus::Pending))
            .await
        {
            Ok(status) => RouteState::from(&*status),
            // Session store dropped; nothing can sign in any more.
            Err(_) => RouteState::Unauthenticated,
        }
    }
}
