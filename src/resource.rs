// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cacheable server resources and their payloads.

use crate::models::{
    Aggregate, CancelledTransaction, Goal, Profile, Report, ReportRange, Transaction,
    TransactionType, TypedTransactions,
};
use std::fmt;

/// A readable server resource, scoped to the signed-in user by the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    NetBalance,
    TransactionList(TransactionType),
    RecentTransactions,
    CancelledTransactions,
    Goals,
    Report(ReportRange),
    Profile,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::NetBalance => "netBalance",
            Resource::TransactionList(_) => "transactionList",
            Resource::RecentTransactions => "recentTransactions",
            Resource::CancelledTransactions => "cancelledTransactions",
            Resource::Goals => "goals",
            Resource::Report(_) => "report",
            Resource::Profile => "profile",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::TransactionList(ty) => write!(f, "transactionList({ty})"),
            Resource::Report(range) => write!(f, "report({range})"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData {
    Balance(Aggregate),
    Transactions(TypedTransactions),
    Recent(Vec<Transaction>),
    Cancelled(Vec<CancelledTransaction>),
    Goals(Vec<Goal>),
    Report(Report),
    Profile(Profile),
}

/// Typed view over a `ResourceData` variant.
pub trait Payload: Sized {
    fn extract(data: ResourceData) -> Option<Self>;
}

macro_rules! payload {
    ($ty:ty => $variant:ident) => {
        impl Payload for $ty {
            fn extract(data: ResourceData) -> Option<Self> {
                match data {
                    ResourceData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

payload!(Aggregate => Balance);
payload!(TypedTransactions => Transactions);
payload!(Vec<Transaction> => Recent);
payload!(Vec<CancelledTransaction> => Cancelled);
payload!(Vec<Goal> => Goals);
payload!(Report => Report);
payload!(Profile => Profile);
