// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Invalidation graph: which cached resources each kind of write makes stale.
//!
//! `footprint` is an exhaustive match, so adding a `MutationKind` without
//! declaring what it touches does not compile.

use crate::models::TransactionType;
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    Exact(Resource),
    AnyTransactionList,
    AnyReport,
    All,
}

impl KeyPattern {
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            KeyPattern::Exact(r) => r == resource,
            KeyPattern::AnyTransactionList => matches!(resource, Resource::TransactionList(_)),
            KeyPattern::AnyReport => matches!(resource, Resource::Report(_)),
            KeyPattern::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateTransaction(TransactionType),
    CancelTransaction,
    CreateGoal,
    UseSaving,
    UpdateProfile,
    ChangeCredential,
    DeleteAccount,
}

pub fn footprint(kind: MutationKind) -> Vec<KeyPattern> {
    use KeyPattern::*;

    match kind {
        MutationKind::CreateTransaction(ty) => {
            let mut keys = vec![
                Exact(Resource::TransactionList(ty)),
                Exact(Resource::NetBalance),
                Exact(Resource::RecentTransactions),
                AnyReport,
            ];
            // Category limits track spending.
            if ty == TransactionType::Expense {
                keys.push(Exact(Resource::Goals));
            }
            keys
        }
        // The cancelled row may be of any type and may sit inside any report.
        MutationKind::CancelTransaction => vec![
            AnyTransactionList,
            Exact(Resource::NetBalance),
            Exact(Resource::RecentTransactions),
            Exact(Resource::CancelledTransactions),
            Exact(Resource::Goals),
            AnyReport,
        ],
        MutationKind::CreateGoal => vec![Exact(Resource::Goals)],
        MutationKind::UseSaving => vec![
            Exact(Resource::TransactionList(TransactionType::Saving)),
            Exact(Resource::NetBalance),
            Exact(Resource::RecentTransactions),
            AnyReport,
        ],
        MutationKind::UpdateProfile => vec![Exact(Resource::Profile)],
        MutationKind::ChangeCredential => Vec::new(),
        MutationKind::DeleteAccount => vec![All],
    }
}
