// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Write path: local checks, one remote call, then cache invalidation.
//!
//! Nothing is applied optimistically. A write that fails leaves the cache
//! exactly as it was; a write that succeeds marks its footprint stale.

use crate::api::FinanceApi;
use crate::cache::{footprint, MutationKind, QueryCache};
use crate::error::{ClientResult, ValidationError};
use crate::guard;
use crate::models::{
    Aggregate, Auth, Goal, NewGoal, NewTransaction, PasswordChange, Profile, ProfileUpdate,
    Transaction, TransactionType, TypedTransactions,
};
use crate::resource::Resource;
use crate::session::{LogoutReason, SessionStore};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Identity of a logical write. Two submissions with equal keys are the same
/// user intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey {
    CreateTransaction(NewTransaction),
    CancelTransaction(String),
    CreateGoal(NewGoal),
    UseSaving(String),
    UpdateProfile,
    ChangeCredential,
    DeleteAccount,
}

/// Outcome of a write that passed local validation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Submission<T> {
    /// The server accepted the write; callers reset their form state.
    Completed(T),
    /// An identical write was already in flight; nothing was sent.
    Duplicate,
}

impl<T> Submission<T> {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Submission::Duplicate)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Submission::Completed(v) => Some(v),
            Submission::Duplicate => None,
        }
    }
}

type InFlightSet = Arc<Mutex<HashSet<MutationKey>>>;

/// Held for the lifetime of one remote write; releases its key on drop,
/// including when the caller's future is cancelled.
struct InFlightSlot {
    set: InFlightSet,
    key: MutationKey,
}

impl InFlightSlot {
    fn acquire(set: &InFlightSet, key: MutationKey) -> Option<Self> {
        if !set.lock().insert(key.clone()) {
            return None;
        }
        Some(Self {
            set: set.clone(),
            key,
        })
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct MutationCoordinator {
    api: Arc<dyn FinanceApi>,
    session: Arc<SessionStore>,
    cache: QueryCache,
    enforce_balance_check: bool,
    inflight: InFlightSet,
    today: Clock,
}

impl std::fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("enforce_balance_check", &self.enforce_balance_check)
            .field("inflight", &self.inflight.lock().len())
            .finish()
    }
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn FinanceApi>,
        session: Arc<SessionStore>,
        cache: QueryCache,
        enforce_balance_check: bool,
    ) -> Self {
        Self {
            api,
            session,
            cache,
            enforce_balance_check,
            inflight: Arc::new(Mutex::new(HashSet::new())),
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replace the calendar used for date checks.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.inflight.lock().contains(key)
    }

    pub async fn create_transaction(
        &self,
        tx: NewTransaction,
    ) -> ClientResult<Submission<Transaction>> {
        guard::check_amount(tx.amount)?;
        if tx.description.trim().is_empty() {
            return Err(ValidationError::field("description", "required").into());
        }
        if tx.category.trim().is_empty() {
            return Err(ValidationError::field("category", "required").into());
        }
        if tx.r#type == TransactionType::Saving {
            guard::check_usage_date(tx.usage_date, (self.today)())?;
        }
        if self.enforce_balance_check {
            let aggregate = self.cache.peek_as::<Aggregate>(Resource::NetBalance);
            guard::validate(tx.r#type, tx.amount, aggregate.as_ref())?;
        }

        let kind = MutationKind::CreateTransaction(tx.r#type);
        let key = MutationKey::CreateTransaction(tx.clone());
        self.run(key, kind, |auth| async move {
            self.api.create_transaction(&auth, &tx).await
        })
        .await
    }

    pub async fn cancel_transaction(&self, transaction_id: &str) -> ClientResult<Submission<()>> {
        let id = transaction_id.trim();
        if id.is_empty() {
            return Err(ValidationError::field("transaction id", "required").into());
        }
        let key = MutationKey::CancelTransaction(id.to_string());
        self.run(key, MutationKind::CancelTransaction, |auth| async move {
            self.api.cancel_transaction(&auth, id).await
        })
        .await
    }

    pub async fn create_goal(&self, goal: NewGoal) -> ClientResult<Submission<Goal>> {
        guard::check_goal(&goal)?;
        let key = MutationKey::CreateGoal(goal.clone());
        self.run(key, MutationKind::CreateGoal, |auth| async move {
            self.api.create_goal(&auth, &goal).await
        })
        .await
    }

    /// Release a matured saving back into the balance.
    ///
    /// The saving is looked up in the cached saving list. With no list
    /// cached, or a usage date still ahead, the call is refused without
    /// touching the server.
    pub async fn use_saving(&self, saving_id: &str) -> ClientResult<Submission<()>> {
        let id = saving_id.trim();
        let resource = Resource::TransactionList(TransactionType::Saving);
        let savings = self
            .cache
            .peek_as::<TypedTransactions>(resource)
            .ok_or(ValidationError::SavingsNotLoaded)?;
        let saving = savings
            .transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownSaving { id: id.to_string() })?;
        guard::check_maturity(saving.usage_date, (self.today)())?;

        let key = MutationKey::UseSaving(id.to_string());
        self.run(key, MutationKind::UseSaving, |auth| async move {
            self.api.use_saving(&auth, id).await
        })
        .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> ClientResult<Submission<Profile>> {
        guard::check_profile_update(&update)?;
        let submission = self
            .run(MutationKey::UpdateProfile, MutationKind::UpdateProfile, |auth| async move {
                self.api.update_profile(&auth, &update).await
            })
            .await?;
        if let Submission::Completed(profile) = &submission {
            self.session.replace_profile(profile.clone()).await;
        }
        Ok(submission)
    }

    pub async fn change_credential(&self, change: PasswordChange) -> ClientResult<Submission<()>> {
        guard::check_password_change(&change)?;
        self.run(
            MutationKey::ChangeCredential,
            MutationKind::ChangeCredential,
            |auth| async move { self.api.change_password(&auth, &change).await },
        )
        .await
    }

    /// Delete the account server-side, then end the session and drop every
    /// cached read.
    pub async fn delete_account(&self) -> ClientResult<Submission<()>> {
        let submission = self
            .run(MutationKey::DeleteAccount, MutationKind::DeleteAccount, |auth| async move {
                self.api.delete_account(&auth).await
            })
            .await?;
        if let Submission::Completed(()) = submission {
            self.session.force_logout(LogoutReason::AccountDeleted).await;
            self.cache.clear();
        }
        Ok(submission)
    }

    async fn run<T, F, Fut>(
        &self,
        key: MutationKey,
        kind: MutationKind,
        call: F,
    ) -> ClientResult<Submission<T>>
    where
        F: FnOnce(Auth) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let (auth, generation) = self.session.authorized()?;
        let Some(_slot) = InFlightSlot::acquire(&self.inflight, key) else {
            debug!(?kind, "Identical write already in flight; ignoring");
            return Ok(Submission::Duplicate);
        };

        match call(auth).await {
            Ok(value) => {
                let marked = self.cache.invalidate(&footprint(kind));
                info!(?kind, marked, "Write accepted");
                Ok(Submission::Completed(value))
            }
            Err(e) => {
                info!(?kind, error = %e, "Write failed");
                if e.is_auth() {
                    self.session.expire(generation).await;
                }
                Err(e)
            }
        }
    }
}
