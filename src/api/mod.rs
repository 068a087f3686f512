// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Remote finance API contract.
//!
//! Every request and response shape is an explicit type from `models`; a body
//! that does not decode is a `ServerRejection::Decode`, never a half-filled
//! value.

mod http;

pub use http::HttpApi;

use crate::error::ClientResult;
use crate::models::{
    Auth, Credentials, Goal, LoginResponse, NewGoal, NewTransaction, PasswordChange, Profile,
    ProfileUpdate, Registration, Transaction,
};
use crate::resource::{Resource, ResourceData};
use async_trait::async_trait;

#[async_trait]
pub trait FinanceApi: Send + Sync {
    // ===================================================================================
    // ACCOUNT (unauthenticated)
    // ===================================================================================

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse>;

    async fn register(&self, registration: &Registration) -> ClientResult<()>;

    async fn forgot_password(&self, email: &str) -> ClientResult<()>;

    // ===================================================================================
    // READS
    // ===================================================================================

    async fn fetch(&self, auth: &Auth, resource: &Resource) -> ClientResult<ResourceData>;

    // ===================================================================================
    // WRITES
    // ===================================================================================

    async fn create_transaction(
        &self,
        auth: &Auth,
        transaction: &NewTransaction,
    ) -> ClientResult<Transaction>;

    async fn cancel_transaction(&self, auth: &Auth, transaction_id: &str) -> ClientResult<()>;

    async fn create_goal(&self, auth: &Auth, goal: &NewGoal) -> ClientResult<Goal>;

    async fn use_saving(&self, auth: &Auth, saving_id: &str) -> ClientResult<()>;

    async fn update_profile(&self, auth: &Auth, update: &ProfileUpdate) -> ClientResult<Profile>;

    async fn change_password(&self, auth: &Auth, change: &PasswordChange) -> ClientResult<()>;

    async fn delete_account(&self, auth: &Auth) -> ClientResult<()>;
}
