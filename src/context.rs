// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Wiring of the client core. One `AppContext` per process, built explicitly
//! and handed to whatever presents it.

use crate::api::{FinanceApi, HttpApi};
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::db::{self, SqliteStore};
use crate::error::{ClientError, ClientResult};
use crate::mutation::MutationCoordinator;
use crate::route::RouteGate;
use crate::session::{SessionStatus, SessionStore};
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info};

pub struct AppContext {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub cache: QueryCache,
    pub mutations: MutationCoordinator,
    pub route: RouteGate,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .field("route", &self.route)
            .finish()
    }
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        api: Arc<dyn FinanceApi>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(api.clone(), storage));
        let cache = QueryCache::new(api.clone(), session.clone(), config.cache.stale_after());
        let mutations = MutationCoordinator::new(
            api,
            session.clone(),
            cache.clone(),
            config.guard.enforce_balance_check,
        );
        let route = RouteGate::new(session.subscribe());
        Self {
            config,
            session,
            cache,
            mutations,
            route,
        }
    }

    /// HTTP transport and SQLite session storage, as configured.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let api = HttpApi::new(&config.api)?;
        let path = match &config.storage.db_path {
            Some(path) => path.clone(),
            None => db::db_path().map_err(|e| ClientError::Config(e.to_string()))?,
        };
        let storage = SqliteStore::open(&path).map_err(ClientError::storage)?;
        debug!(db = %path.display(), base_url = %config.api.base_url, "Client configured");
        Ok(Self::new(config, Arc::new(api), Arc::new(storage)))
    }

    /// Restore any stored session. Safe to call more than once.
    pub async fn init(&self) -> SessionStatus {
        self.session.hydrate().await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.cache.clear();
    }

    /// Drop in-memory state. The stored session is kept for the next start.
    pub fn teardown(&self) {
        self.cache.clear();
        info!("Client torn down");
    }
}
