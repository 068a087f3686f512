// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use fintrack::api::FinanceApi;
use fintrack::config::ClientConfig;
use fintrack::error::{ClientError, ClientResult, ServerRejection};
use fintrack::models::{
    Aggregate, Auth, AuthToken, CancelledTransaction, CategoryBreakdown, Credentials, Goal,
    LoginResponse, NewGoal, NewTransaction, PasswordChange, Profile, ProfileUpdate,
    Registration, Report, Transaction, TransactionType, TypedTransactions, UserId,
};
use fintrack::resource::{Resource, ResourceData};
use fintrack::storage::{KeyValueStore, MemoryStore};
use fintrack::AppContext;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret1";
pub const USER_ID: &str = "u-alice";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn money(v: i64) -> Decimal {
    Decimal::from(v)
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    token_seq: u64,
    token: Option<String>,
    transactions: Vec<Transaction>,
    cancelled: Vec<CancelledTransaction>,
    goals: Vec<Goal>,
    profile: Option<Profile>,
    password: String,
}

impl Ledger {
    fn active(&self, ty: TransactionType) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.r#type == ty && !t.cancelled)
    }

    fn total(&self, ty: TransactionType) -> Decimal {
        self.active(ty).map(|t| t.amount).sum()
    }

    fn aggregate(&self) -> Aggregate {
        let income = self.total(TransactionType::Income);
        let expenses = self.total(TransactionType::Expense);
        let savings = self.total(TransactionType::Saving);
        Aggregate {
            net_balance: income - expenses - savings,
            total_income: income,
            total_expenses: expenses,
            total_savings: savings,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// In-process stand-in for the finance API. Every call is counted and
/// yields once before answering, so concurrent callers overlap.
pub struct FakeServer {
    ledger: Mutex<Ledger>,
    fetches: Mutex<Vec<Resource>>,
    writes: Mutex<Vec<&'static str>>,
    logins: Mutex<usize>,
    fail_writes: AtomicBool,
    reject_auth: AtomicBool,
    read_gate: RwLock<()>,
    login_gate: RwLock<()>,
    login_held: AtomicBool,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ledger: Mutex::new(Ledger {
                profile: Some(Profile {
                    username: USERNAME.into(),
                    email: Some("alice@example.com".into()),
                    phone_number: None,
                }),
                password: PASSWORD.into(),
                ..Default::default()
            }),
            fetches: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            logins: Mutex::new(0),
            fail_writes: AtomicBool::new(false),
            reject_auth: AtomicBool::new(false),
            read_gate: RwLock::new(()),
            login_gate: RwLock::new(()),
            login_held: AtomicBool::new(false),
        })
    }

    /// Seed a transaction directly into the ledger.
    pub fn seed(
        &self,
        ty: TransactionType,
        amount: i64,
        usage_date: Option<NaiveDate>,
    ) -> Transaction {
        let mut ledger = self.ledger.lock();
        let tx = Transaction {
            id: ledger.next_id("t"),
            r#type: ty,
            description: format!("seeded {ty}"),
            amount: money(amount),
            category: "General".into(),
            created_at: Utc::now(),
            usage_date,
            cancelled: false,
        };
        ledger.transactions.push(tx.clone());
        tx
    }

    pub fn aggregate(&self) -> Aggregate {
        self.ledger.lock().aggregate()
    }

    pub fn fetch_count(&self, resource: Resource) -> usize {
        self.fetches.lock().iter().filter(|r| **r == resource).count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().len()
    }

    pub fn write_count(&self, op: &str) -> usize {
        self.writes.lock().iter().filter(|w| **w == op).count()
    }

    pub fn total_writes(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn login_count(&self) -> usize {
        *self.logins.lock()
    }

    /// Writes answer 400 until turned off.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Authenticated calls answer 401 until turned off.
    pub fn reject_auth(&self, on: bool) {
        self.reject_auth.store(on, Ordering::SeqCst);
    }

    /// Reads block until the guard is dropped.
    pub async fn hold_reads(&self) -> RwLockWriteGuard<'_, ()> {
        self.read_gate.write().await
    }

    /// The next login call blocks until the guard is dropped; later ones
    /// pass straight through.
    pub async fn hold_next_login(&self) -> RwLockWriteGuard<'_, ()> {
        let guard = self.login_gate.write().await;
        self.login_held.store(true, Ordering::SeqCst);
        guard
    }

    fn check(&self, auth: &Auth) -> ClientResult<()> {
        if self.reject_auth.load(Ordering::SeqCst) {
            return Err(ClientError::Auth("token expired".into()));
        }
        let ledger = self.ledger.lock();
        if auth.user_id.0 != USER_ID || ledger.token.as_deref() != Some(auth.token.as_str()) {
            return Err(ClientError::Auth("invalid token".into()));
        }
        Ok(())
    }

    async fn write(&self, op: &'static str, auth: &Auth) -> ClientResult<()> {
        self.writes.lock().push(op);
        tokio::task::yield_now().await;
        self.check(auth)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected(ServerRejection::Status {
                status: 400,
                message: format!("{op} rejected"),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl FinanceApi for FakeServer {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        *self.logins.lock() += 1;
        if self.login_held.swap(false, Ordering::SeqCst) {
            let _held = self.login_gate.read().await;
        }
        tokio::task::yield_now().await;
        let mut ledger = self.ledger.lock();
        if credentials.username != USERNAME || credentials.password != ledger.password {
            return Err(ClientError::Rejected(ServerRejection::Status {
                status: 400,
                message: "invalid username or password".into(),
            }));
        }
        ledger.token_seq += 1;
        let token = format!("token-{}", ledger.token_seq);
        ledger.token = Some(token.clone());
        let profile = ledger.profile.clone().unwrap_or_else(|| Profile {
            username: USERNAME.into(),
            email: None,
            phone_number: None,
        });
        Ok(LoginResponse {
            token: AuthToken(token),
            user_id: UserId::from(USER_ID),
            username: profile.username,
            email: profile.email,
            phone_number: profile.phone_number,
        })
    }

    async fn register(&self, _registration: &Registration) -> ClientResult<()> {
        self.writes.lock().push("register");
        Ok(())
    }

    async fn forgot_password(&self, _email: &str) -> ClientResult<()> {
        self.writes.lock().push("forgot_password");
        Ok(())
    }

    async fn fetch(&self, auth: &Auth, resource: &Resource) -> ClientResult<ResourceData> {
        self.fetches.lock().push(*resource);
        let _open = self.read_gate.read().await;
        tokio::task::yield_now().await;
        self.check(auth)?;

        let ledger = self.ledger.lock();
        let data = match resource {
            Resource::NetBalance => ResourceData::Balance(ledger.aggregate()),
            Resource::TransactionList(ty) => ResourceData::Transactions(TypedTransactions {
                total: ledger.total(*ty),
                transactions: ledger.active(*ty).cloned().collect(),
            }),
            Resource::RecentTransactions => ResourceData::Recent(
                ledger
                    .transactions
                    .iter()
                    .rev()
                    .filter(|t| !t.cancelled)
                    .take(5)
                    .cloned()
                    .collect(),
            ),
            Resource::CancelledTransactions => ResourceData::Cancelled(ledger.cancelled.clone()),
            Resource::Goals => ResourceData::Goals(ledger.goals.clone()),
            Resource::Report(_) => {
                let agg = ledger.aggregate();
                ResourceData::Report(Report {
                    total_income: agg.total_income,
                    total_expenses: agg.total_expenses,
                    total_savings: agg.total_savings,
                    net_balance: agg.net_balance,
                    category_breakdown: CategoryBreakdown::default(),
                    transactions: ledger
                        .transactions
                        .iter()
                        .filter(|t| !t.cancelled)
                        .cloned()
                        .collect(),
                })
            }
            Resource::Profile => match &ledger.profile {
                Some(p) => ResourceData::Profile(p.clone()),
                None => {
                    return Err(ClientError::Rejected(ServerRejection::Status {
                        status: 404,
                        message: "user not found".into(),
                    }))
                }
            },
        };
        Ok(data)
    }

    async fn create_transaction(
        &self,
        auth: &Auth,
        transaction: &NewTransaction,
    ) -> ClientResult<Transaction> {
        self.write("create_transaction", auth).await?;
        let mut ledger = self.ledger.lock();
        let tx = Transaction {
            id: ledger.next_id("t"),
            r#type: transaction.r#type,
            description: transaction.description.clone(),
            amount: transaction.amount,
            category: transaction.category.clone(),
            created_at: Utc::now(),
            usage_date: transaction.usage_date,
            cancelled: false,
        };
        ledger.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn cancel_transaction(&self, auth: &Auth, transaction_id: &str) -> ClientResult<()> {
        self.write("cancel_transaction", auth).await?;
        let mut ledger = self.ledger.lock();
        let cancel_id = ledger.next_id("c");
        let Some(tx) = ledger
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id && !t.cancelled)
        else {
            return Err(ClientError::Rejected(ServerRejection::Status {
                status: 404,
                message: "transaction not found".into(),
            }));
        };
        tx.cancelled = true;
        let cancelled = CancelledTransaction {
            id: cancel_id,
            transaction: tx.clone(),
            created_at: Utc::now(),
        };
        ledger.cancelled.push(cancelled);
        Ok(())
    }

    async fn create_goal(&self, auth: &Auth, goal: &NewGoal) -> ClientResult<Goal> {
        self.write("create_goal", auth).await?;
        let mut ledger = self.ledger.lock();
        let goal = Goal {
            id: ledger.next_id("g"),
            category_name: goal.category_name.clone(),
            limit_amount: goal.limit_amount,
            starting_date: goal.starting_date,
            ending_date: goal.ending_date,
            usage_amount: Decimal::ZERO,
            remained_amount: goal.limit_amount,
            usage_percentage: Decimal::ZERO,
            is_valid: true,
        };
        ledger.goals.push(goal.clone());
        Ok(goal)
    }

    async fn use_saving(&self, auth: &Auth, saving_id: &str) -> ClientResult<()> {
        self.write("use_saving", auth).await?;
        let mut ledger = self.ledger.lock();
        let before = ledger.transactions.len();
        ledger
            .transactions
            .retain(|t| !(t.id == saving_id && t.r#type == TransactionType::Saving));
        if ledger.transactions.len() == before {
            return Err(ClientError::Rejected(ServerRejection::Status {
                status: 404,
                message: "saving not found".into(),
            }));
        }
        Ok(())
    }

    async fn update_profile(&self, auth: &Auth, update: &ProfileUpdate) -> ClientResult<Profile> {
        self.write("update_profile", auth).await?;
        let mut ledger = self.ledger.lock();
        let profile = ledger.profile.get_or_insert_with(|| Profile {
            username: USERNAME.into(),
            email: None,
            phone_number: None,
        });
        if let Some(username) = &update.username {
            profile.username = username.clone();
        }
        if let Some(email) = &update.email {
            profile.email = Some(email.clone());
        }
        if let Some(phone) = &update.phone_number {
            profile.phone_number = Some(phone.clone());
        }
        Ok(profile.clone())
    }

    async fn change_password(&self, auth: &Auth, change: &PasswordChange) -> ClientResult<()> {
        self.write("change_password", auth).await?;
        let mut ledger = self.ledger.lock();
        if change.current_password != ledger.password {
            return Err(ClientError::Rejected(ServerRejection::Status {
                status: 400,
                message: "current password is incorrect".into(),
            }));
        }
        ledger.password = change.new_password.clone();
        Ok(())
    }

    async fn delete_account(&self, auth: &Auth) -> ClientResult<()> {
        self.write("delete_account", auth).await?;
        let mut ledger = self.ledger.lock();
        ledger.profile = None;
        ledger.token = None;
        ledger.transactions.clear();
        Ok(())
    }
}

/// A store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> ClientResult<Option<String>> {
        Err(ClientError::Storage("disk unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> ClientResult<()> {
        Err(ClientError::Storage("disk unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> ClientResult<()> {
        Err(ClientError::Storage("disk unavailable".into()))
    }
}

pub fn context(server: &Arc<FakeServer>, store: Arc<dyn KeyValueStore>) -> AppContext {
    AppContext::new(ClientConfig::default(), server.clone(), store)
}

/// A hydrated context with alice signed in.
pub async fn signed_in() -> (Arc<FakeServer>, Arc<MemoryStore>, AppContext) {
    let server = FakeServer::new();
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&server, store.clone());
    ctx.init().await;
    ctx.session
        .login(&Credentials::new(USERNAME, PASSWORD))
        .await
        .expect("login");
    (server, store, ctx)
}
