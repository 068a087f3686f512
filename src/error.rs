// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by the session, cache and mutation layers.
//!
//! `ClientError` is `Clone` because a coalesced fetch hands the same result to
//! every waiting caller.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Rejected(#[from] ServerRejection),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Local pre-flight rejection. Never reaches the network.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("no balance loaded yet; fetch the balance before recording this transaction")]
    MissingAggregate,

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("this saving can be used on {usage_date}")]
    NotMatured { usage_date: NaiveDate },

    #[error("no saving list loaded yet; list your savings before using one")]
    SavingsNotLoaded,

    #[error("saving {id} not found")]
    UnknownSaving { id: String },

    #[error("usage date {0} is in the past")]
    UsageDateInPast(NaiveDate),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// The server refused the request, or answered with something that does not
/// match the contract types.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServerRejection {
    #[error("request rejected ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("service unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("malformed {resource} response: {reason}")]
    Decode { resource: String, reason: String },
}

impl ClientError {
    pub fn network(e: impl std::fmt::Display) -> Self {
        Self::Network(e.to_string())
    }

    pub fn storage(e: impl std::fmt::Display) -> Self {
        Self::Storage(e.to_string())
    }

    pub fn decode(resource: impl Into<String>, e: impl std::fmt::Display) -> Self {
        Self::Rejected(ServerRejection::Decode {
            resource: resource.into(),
            reason: e.to_string(),
        })
    }

    /// Errors that end the session wherever they surface.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    /// True when the request never left the client.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_) | ClientError::NotSignedIn | ClientError::Config(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Network(format!("request timed out: {e}"))
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for ClientError {
    fn from(e: rusqlite::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}
