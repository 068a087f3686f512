// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chrono::Days;
use common::{money, signed_in, today, FakeServer};
use fintrack::error::{ClientError, ServerRejection, ValidationError};
use fintrack::models::{
    NewGoal, NewTransaction, PasswordChange, ProfileUpdate, ReportRange, Session,
    TransactionType,
};
use fintrack::mutation::{MutationCoordinator, Submission};
use fintrack::resource::Resource;
use fintrack::route::RouteState;
use fintrack::session::{LogoutReason, SessionStatus, SESSION_KEY};
use fintrack::storage::KeyValueStore;
use fintrack::AppContext;
use std::sync::Arc;

fn new_tx(ty: TransactionType, amount: i64) -> NewTransaction {
    NewTransaction {
        r#type: ty,
        description: format!("{ty} entry"),
        amount: money(amount),
        category: "Food".into(),
        usage_date: (ty == TransactionType::Saving).then(|| today() + Days::new(30)),
    }
}

const WATCHED: [Resource; 7] = [
    Resource::NetBalance,
    Resource::TransactionList(TransactionType::Income),
    Resource::TransactionList(TransactionType::Expense),
    Resource::RecentTransactions,
    Resource::Goals,
    Resource::Report(ReportRange::Week),
    Resource::Profile,
];

async fn load_all(ctx: &AppContext) {
    for resource in WATCHED {
        ctx.cache.get(resource).await.unwrap();
    }
}

fn stale_flags(ctx: &AppContext) -> Vec<Option<bool>> {
    WATCHED.iter().map(|r| ctx.cache.is_stale(*r)).collect()
}

#[tokio::test]
async fn expense_over_balance_is_rejected_without_a_request() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 300, None);
    let before = ctx.cache.balance().await.unwrap();

    let err = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Expense, 500))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Validation(ValidationError::InsufficientBalance {
            requested: money(500),
            available: money(300),
        })
    );
    assert_eq!(server.total_writes(), 0);
    assert_eq!(ctx.cache.is_stale(Resource::NetBalance), Some(false));
    assert_eq!(ctx.cache.balance().await.unwrap(), before);
}

#[tokio::test]
async fn saving_is_balance_checked_like_expense() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 100, None);
    ctx.cache.balance().await.unwrap();

    let err = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Saving, 101))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InsufficientBalance { .. })
    ));
    assert_eq!(server.total_writes(), 0);
}

#[tokio::test]
async fn drawing_needs_a_loaded_balance_but_income_does_not() {
    let (server, _store, ctx) = signed_in().await;

    let err = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Expense, 1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Validation(ValidationError::MissingAggregate)
    );

    let done = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Income, 1_000))
        .await
        .unwrap();
    assert!(!done.is_duplicate());
    assert_eq!(server.write_count("create_transaction"), 1);
}

#[tokio::test]
async fn success_marks_exactly_the_footprint_stale() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 300, None);
    load_all(&ctx).await;

    let created = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Expense, 100))
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(created.amount, money(100));

    assert_eq!(
        stale_flags(&ctx),
        vec![
            Some(true),  // net balance
            Some(false), // income list
            Some(true),  // expense list
            Some(true),  // recent
            Some(true),  // goals
            Some(true),  // report
            Some(false), // profile
        ]
    );

    let agg = ctx.cache.balance().await.unwrap();
    assert_eq!(agg.net_balance, money(200));
    assert_eq!(server.fetch_count(Resource::NetBalance), 2);
    assert_eq!(server.fetch_count(Resource::Profile), 1);
}

#[tokio::test]
async fn failed_write_leaves_cache_untouched() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 300, None);
    load_all(&ctx).await;
    let flags = stale_flags(&ctx);
    let fetches = server.total_fetches();

    server.fail_writes(true);
    let err = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Expense, 100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rejected(ServerRejection::Status { status: 400, .. })
    ));

    assert_eq!(stale_flags(&ctx), flags);
    assert_eq!(server.total_fetches(), fetches);
    assert_eq!(server.write_count("create_transaction"), 1);
}

#[tokio::test]
async fn cancelled_amount_drops_out_of_totals() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 500, None);
    let expense = server.seed(TransactionType::Expense, 200, None);
    assert_eq!(ctx.cache.balance().await.unwrap().net_balance, money(300));
    assert_eq!(
        ctx.cache.transactions(TransactionType::Expense).await.unwrap().total,
        money(200)
    );

    let done = ctx.mutations.cancel_transaction(&expense.id).await.unwrap();
    assert_eq!(done, Submission::Completed(()));

    assert_eq!(ctx.cache.balance().await.unwrap().net_balance, money(500));
    let expenses = ctx.cache.transactions(TransactionType::Expense).await.unwrap();
    assert_eq!(expenses.total, money(0));
    assert!(expenses.transactions.iter().all(|t| t.id != expense.id));
    let cancelled = ctx.cache.cancelled().await.unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].transaction.id, expense.id);
}

#[tokio::test]
async fn immature_saving_is_refused_locally() {
    let (server, _store, ctx) = signed_in().await;
    let later = today() + Days::new(3);
    let saving = server.seed(TransactionType::Saving, 50, Some(later));
    ctx.cache.transactions(TransactionType::Saving).await.unwrap();
    let fetches = server.total_fetches();

    let err = ctx.mutations.use_saving(&saving.id).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Validation(ValidationError::NotMatured { usage_date: later })
    );
    assert_eq!(server.total_fetches(), fetches);
    assert_eq!(server.total_writes(), 0);
}

#[tokio::test]
async fn use_saving_on_a_cold_cache_makes_no_request() {
    let (server, _store, ctx) = signed_in().await;
    let saving = server.seed(TransactionType::Saving, 50, Some(today() + Days::new(3)));

    let err = ctx.mutations.use_saving(&saving.id).await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::SavingsNotLoaded));
    assert!(err.is_local());
    assert_eq!(server.total_fetches(), 0);
    assert_eq!(server.total_writes(), 0);
}

#[tokio::test]
async fn unknown_saving_is_refused_locally() {
    let (server, _store, ctx) = signed_in().await;
    ctx.cache.transactions(TransactionType::Saving).await.unwrap();

    let err = ctx.mutations.use_saving("nope").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::UnknownSaving { .. })
    ));
    assert_eq!(server.write_count("use_saving"), 0);
}

#[tokio::test]
async fn double_tapped_use_saving_sends_one_request() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 100, None);
    let saving = server.seed(TransactionType::Saving, 40, Some(today()));
    ctx.cache.transactions(TransactionType::Saving).await.unwrap();

    let (a, b) = tokio::join!(
        ctx.mutations.use_saving(&saving.id),
        ctx.mutations.use_saving(&saving.id),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    assert_eq!(outcomes.iter().filter(|s| s.is_duplicate()).count(), 1);
    assert_eq!(server.write_count("use_saving"), 1);

    assert_eq!(ctx.cache.balance().await.unwrap().net_balance, money(100));
    let savings = ctx.cache.transactions(TransactionType::Saving).await.unwrap();
    assert!(savings.transactions.is_empty());
}

#[tokio::test]
async fn identical_creates_coalesce_but_distinct_ones_do_not() {
    let (server, _store, ctx) = signed_in().await;

    let (a, b) = tokio::join!(
        ctx.mutations.create_transaction(new_tx(TransactionType::Income, 10)),
        ctx.mutations.create_transaction(new_tx(TransactionType::Income, 10)),
    );
    assert!(a.unwrap().completed().is_some());
    assert!(b.unwrap().is_duplicate());
    assert_eq!(server.write_count("create_transaction"), 1);

    let (c, d) = tokio::join!(
        ctx.mutations.create_transaction(new_tx(TransactionType::Income, 10)),
        ctx.mutations.create_transaction(new_tx(TransactionType::Income, 20)),
    );
    assert!(c.unwrap().completed().is_some());
    assert!(d.unwrap().completed().is_some());
    assert_eq!(server.write_count("create_transaction"), 3);
}

#[tokio::test]
async fn saving_needs_a_usage_date_not_in_the_past() {
    let (server, _store, ctx) = signed_in().await;
    server.seed(TransactionType::Income, 100, None);
    ctx.cache.balance().await.unwrap();

    let mut tx = new_tx(TransactionType::Saving, 10);
    let yesterday = today() - Days::new(1);
    tx.usage_date = Some(yesterday);
    let err = ctx.mutations.create_transaction(tx).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Validation(ValidationError::UsageDateInPast(yesterday))
    );
    assert_eq!(server.total_writes(), 0);
}

#[tokio::test]
async fn unauthorized_write_signs_out() {
    let (server, store, ctx) = signed_in().await;
    server.reject_auth(true);

    let err = ctx
        .mutations
        .create_transaction(new_tx(TransactionType::Income, 10))
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert_eq!(
        ctx.session.status(),
        SessionStatus::SignedOut {
            reason: Some(LogoutReason::Expired)
        }
    );
    assert_eq!(ctx.route.state(), RouteState::Unauthenticated);
    assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn goal_creation_refreshes_goals_only() {
    let (server, _store, ctx) = signed_in().await;
    ctx.cache.goals().await.unwrap();
    ctx.cache.balance().await.unwrap();

    let goal = NewGoal {
        category_name: "Food".into(),
        limit_amount: money(150),
        starting_date: today(),
        ending_date: today() + Days::new(30),
    };
    let mut bad = goal.clone();
    bad.ending_date = today() - Days::new(1);
    assert!(ctx.mutations.create_goal(bad).await.is_err());
    assert_eq!(server.write_count("create_goal"), 0);

    ctx.mutations.create_goal(goal).await.unwrap();
    assert_eq!(ctx.cache.is_stale(Resource::Goals), Some(true));
    assert_eq!(ctx.cache.is_stale(Resource::NetBalance), Some(false));
    assert_eq!(ctx.cache.goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn profile_update_reaches_the_session() {
    let (_server, store, ctx) = signed_in().await;
    let update = ProfileUpdate {
        email: Some("alice@new.example".into()),
        ..Default::default()
    };

    let profile = ctx
        .mutations
        .update_profile(update)
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(profile.email.as_deref(), Some("alice@new.example"));
    assert_eq!(ctx.session.current().unwrap().profile, profile);

    let blob = store.get(SESSION_KEY).await.unwrap().unwrap();
    let stored: Session = serde_json::from_str(&blob).unwrap();
    assert_eq!(stored.profile, profile);
}

#[tokio::test]
async fn credential_change_is_checked_and_invalidates_nothing() {
    let (server, _store, ctx) = signed_in().await;
    ctx.cache.balance().await.unwrap();

    let same = PasswordChange {
        current_password: common::PASSWORD.into(),
        new_password: common::PASSWORD.into(),
    };
    assert!(ctx.mutations.change_credential(same).await.is_err());
    assert_eq!(server.write_count("change_password"), 0);

    let change = PasswordChange {
        current_password: common::PASSWORD.into(),
        new_password: "better-secret".into(),
    };
    ctx.mutations.change_credential(change).await.unwrap();
    assert_eq!(server.write_count("change_password"), 1);
    assert_eq!(ctx.cache.is_stale(Resource::NetBalance), Some(false));
}

#[tokio::test]
async fn deleting_the_account_ends_everything() {
    let (server, store, ctx) = signed_in().await;
    ctx.cache.balance().await.unwrap();

    let done = ctx.mutations.delete_account().await.unwrap();
    assert_eq!(done, Submission::Completed(()));
    assert_eq!(
        ctx.session.status(),
        SessionStatus::SignedOut {
            reason: Some(LogoutReason::AccountDeleted)
        }
    );
    assert!(ctx.cache.peek(Resource::NetBalance).is_none());
    assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    assert_eq!(server.write_count("delete_account"), 1);
}

#[tokio::test]
async fn maturity_follows_the_injected_clock() {
    let (server, _store, ctx) = signed_in().await;
    let usage = today() + Days::new(10);
    let saving = server.seed(TransactionType::Saving, 25, Some(usage));
    ctx.cache.transactions(TransactionType::Saving).await.unwrap();

    let api: Arc<FakeServer> = server.clone();
    let coordinator = MutationCoordinator::new(api, ctx.session.clone(), ctx.cache.clone(), true)
        .with_clock(move || usage);

    let done = coordinator.use_saving(&saving.id).await.unwrap();
    assert_eq!(done, Submission::Completed(()));
    assert_eq!(server.write_count("use_saving"), 1);
}
