// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Stale-aware cache of server reads, scoped to the signed-in user.
//!
//! - Concurrent reads of one key share a single in-flight request.
//! - Invalidation marks entries stale and re-fetches the keys a mounted
//!   `Observer` is watching; other keys re-fetch on their next read.
//! - A fetch result is written only if the session that issued it is still
//!   the current one and the fetch was not superseded by an invalidation.
//!
//! Locks are never held across an `.await`.

pub mod graph;

pub use graph::{footprint, KeyPattern, MutationKind};

use crate::api::FinanceApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Aggregate, Auth, CancelledTransaction, Goal, Profile, Report, ReportRange, Transaction,
    TransactionType, TypedTransactions, UserId,
};
use crate::resource::{Payload, Resource, ResourceData};
use crate::session::SessionStore;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

type SharedFetch = Shared<BoxFuture<'static, ClientResult<ResourceData>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: ResourceData,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

/// What a mounted observer sees for its key.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub data: Option<ResourceData>,
    pub stale: bool,
    pub fetching: bool,
    pub error: Option<ClientError>,
}

struct InFlight {
    id: u64,
    fut: SharedFetch,
}

struct ObserverSlot {
    mounted: usize,
    tx: watch::Sender<Snapshot>,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<CacheKey, CacheEntry>,
    inflight: HashMap<CacheKey, InFlight>,
    observers: HashMap<CacheKey, ObserverSlot>,
}

impl CacheState {
    fn notify(&self, key: &CacheKey, update: impl FnOnce(&mut Snapshot)) {
        if let Some(slot) = self.observers.get(key) {
            slot.tx.send_modify(update);
        }
    }

    fn is_observed(&self, key: &CacheKey) -> bool {
        self.observers.get(key).is_some_and(|s| s.mounted > 0)
    }
}

struct Inner {
    api: Arc<dyn FinanceApi>,
    session: Arc<SessionStore>,
    stale_after: Duration,
    state: Mutex<CacheState>,
    next_fetch: AtomicU64,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("QueryCache")
            .field("entries", &st.entries.len())
            .field("inflight", &st.inflight.len())
            .field("observed", &st.observers.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new(api: Arc<dyn FinanceApi>, session: Arc<SessionStore>, stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                stale_after,
                state: Mutex::new(CacheState::default()),
                next_fetch: AtomicU64::new(1),
            }),
        }
    }

    /// Cached value if fresh, otherwise the result of a (possibly shared)
    /// fetch. Fails with `NotSignedIn` when there is no session.
    pub async fn get(&self, resource: Resource) -> ClientResult<ResourceData> {
        let (auth, generation) = self.inner.session.authorized()?;
        let key = CacheKey {
            resource,
            user_id: auth.user_id.clone(),
        };

        let (id, fut) = {
            let mut st = self.inner.state.lock();
            self.sync_generation(&mut st, generation);
            if let Some(entry) = st.entries.get(&key) {
                if self.is_fresh(entry) {
                    debug!(%resource, "Cache hit");
                    return Ok(entry.data.clone());
                }
            }
            self.join_or_start(&mut st, &key, auth)
        };

        let result = fut.await;
        self.settle(&key, id, generation, &result, false);
        if matches!(&result, Err(e) if e.is_auth()) {
            self.inner.session.expire(generation).await;
        }
        result
    }

    /// Typed `get`.
    pub async fn fetch<T: Payload>(&self, resource: Resource) -> ClientResult<T> {
        let data = self.get(resource).await?;
        T::extract(data)
            .ok_or_else(|| ClientError::decode(resource.name(), "unexpected payload kind"))
    }

    pub async fn balance(&self) -> ClientResult<Aggregate> {
        self.fetch(Resource::NetBalance).await
    }

    pub async fn transactions(&self, ty: TransactionType) -> ClientResult<TypedTransactions> {
        self.fetch(Resource::TransactionList(ty)).await
    }

    pub async fn recent(&self) -> ClientResult<Vec<Transaction>> {
        self.fetch(Resource::RecentTransactions).await
    }

    pub async fn cancelled(&self) -> ClientResult<Vec<CancelledTransaction>> {
        self.fetch(Resource::CancelledTransactions).await
    }

    pub async fn goals(&self) -> ClientResult<Vec<Goal>> {
        self.fetch(Resource::Goals).await
    }

    pub async fn report(&self, range: ReportRange) -> ClientResult<Report> {
        self.fetch(Resource::Report(range)).await
    }

    pub async fn profile(&self) -> ClientResult<Profile> {
        self.fetch(Resource::Profile).await
    }

    /// Last-known value for the current user, stale or not. Never fetches.
    pub fn peek(&self, resource: Resource) -> Option<ResourceData> {
        self.entry(resource).map(|e| e.data)
    }

    pub fn peek_as<T: Payload>(&self, resource: Resource) -> Option<T> {
        self.peek(resource).and_then(T::extract)
    }

    pub fn entry(&self, resource: Resource) -> Option<CacheEntry> {
        let (auth, generation) = self.inner.session.authorized().ok()?;
        let mut st = self.inner.state.lock();
        self.sync_generation(&mut st, generation);
        st.entries
            .get(&CacheKey {
                resource,
                user_id: auth.user_id,
            })
            .cloned()
    }

    pub fn is_stale(&self, resource: Resource) -> Option<bool> {
        self.entry(resource).map(|e| !self.is_fresh(&e))
    }

    /// Mark every matching entry stale and re-fetch the observed ones.
    /// Returns how many entries were marked.
    pub fn invalidate(&self, patterns: &[KeyPattern]) -> usize {
        let generation = self.inner.session.generation();
        let mut refetch = Vec::new();
        let marked = {
            let mut st = self.inner.state.lock();
            self.sync_generation(&mut st, generation);
            let hit = |key: &CacheKey| patterns.iter().any(|p| p.matches(&key.resource));

            let mut marked = Vec::new();
            for (key, entry) in st.entries.iter_mut() {
                if hit(key) {
                    entry.stale = true;
                    marked.push(key.clone());
                }
            }
            for key in &marked {
                st.notify(key, |s| s.stale = true);
            }
            // In-flight reads may predate the write; let them finish unrecorded.
            st.inflight.retain(|key, _| !hit(key));
            for (key, slot) in &st.observers {
                if slot.mounted > 0 && hit(key) {
                    refetch.push(key.clone());
                }
            }
            marked.len()
        };

        debug!(marked, refetch = refetch.len(), "Invalidated cache keys");
        for key in refetch {
            self.spawn_revalidate(key);
        }
        marked
    }

    /// Drop everything. Observers keep their slots but lose their data.
    pub fn clear(&self) {
        let mut st = self.inner.state.lock();
        st.entries.clear();
        st.inflight.clear();
        for slot in st.observers.values() {
            slot.tx.send_replace(Snapshot::default());
        }
    }

    /// Mount an observer on `resource`. A missing or stale value is fetched
    /// in the background; the result reaches the observer through
    /// `Observer::changed`.
    pub fn observe(&self, resource: Resource) -> ClientResult<Observer> {
        let (auth, generation) = self.inner.session.authorized()?;
        let key = CacheKey {
            resource,
            user_id: auth.user_id,
        };
        let (rx, needs_fetch) = {
            let mut st = self.inner.state.lock();
            self.sync_generation(&mut st, generation);
            let entry = st.entries.get(&key).cloned();
            let needs_fetch = entry.as_ref().is_none_or(|e| !self.is_fresh(e));
            let slot = st.observers.entry(key.clone()).or_insert_with(|| ObserverSlot {
                mounted: 0,
                tx: watch::channel(Snapshot::default()).0,
            });
            slot.mounted += 1;
            if let Some(e) = entry {
                let stale = !self.is_fresh(&e);
                slot.tx.send_modify(|s| {
                    s.data = Some(e.data);
                    s.stale = stale;
                });
            }
            (slot.tx.subscribe(), needs_fetch)
        };
        if needs_fetch {
            self.spawn_revalidate(key.clone());
        }
        Ok(Observer {
            cache: self.clone(),
            key,
            rx,
        })
    }

    fn unmount(&self, key: &CacheKey) {
        let mut st = self.inner.state.lock();
        if let Some(slot) = st.observers.get_mut(key) {
            slot.mounted = slot.mounted.saturating_sub(1);
            if slot.mounted == 0 {
                st.observers.remove(key);
                debug!(resource = %key.resource, "Last observer unmounted");
            }
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        if entry.stale {
            return false;
        }
        match (Utc::now() - entry.fetched_at).to_std() {
            Ok(age) => age < self.inner.stale_after,
            Err(_) => true,
        }
    }

    /// Data cached under another session never leaks into this one.
    fn sync_generation(&self, st: &mut CacheState, generation: u64) {
        if st.generation == generation {
            return;
        }
        if !st.entries.is_empty() || !st.inflight.is_empty() {
            debug!(
                from = st.generation,
                to = generation,
                "Session changed; dropping cached data"
            );
        }
        st.generation = generation;
        st.entries.clear();
        st.inflight.clear();
        for slot in st.observers.values() {
            slot.tx.send_replace(Snapshot::default());
        }
    }

    fn join_or_start(&self, st: &mut CacheState, key: &CacheKey, auth: Auth) -> (u64, SharedFetch) {
        if let Some(f) = st.inflight.get(key) {
            debug!(resource = %key.resource, "Joining in-flight fetch");
            return (f.id, f.fut.clone());
        }
        let id = self.inner.next_fetch.fetch_add(1, Ordering::Relaxed);
        let api = self.inner.api.clone();
        let resource = key.resource;
        debug!(%resource, fetch = id, "Cache miss; fetching");
        let fut = async move { api.fetch(&auth, &resource).await }
            .boxed()
            .shared();
        st.inflight.insert(
            key.clone(),
            InFlight {
                id,
                fut: fut.clone(),
            },
        );
        st.notify(key, |s| s.fetching = true);
        (id, fut)
    }

    /// Record a finished fetch. Only the first waiter of a still-registered
    /// fetch writes; everything else is dropped.
    fn settle(
        &self,
        key: &CacheKey,
        id: u64,
        generation: u64,
        result: &ClientResult<ResourceData>,
        for_observer: bool,
    ) {
        let mut st = self.inner.state.lock();
        if st.generation != generation || self.inner.session.generation() != generation {
            debug!(resource = %key.resource, "Discarding fetch from a previous session");
            return;
        }
        if !st.inflight.get(key).is_some_and(|f| f.id == id) {
            return;
        }
        st.inflight.remove(key);
        if for_observer && !st.is_observed(key) {
            debug!(resource = %key.resource, "Observer unmounted; discarding fetch result");
            return;
        }
        match result {
            Ok(data) => {
                st.entries.insert(
                    key.clone(),
                    CacheEntry {
                        data: data.clone(),
                        fetched_at: Utc::now(),
                        stale: false,
                    },
                );
                st.notify(key, |s| {
                    s.data = Some(data.clone());
                    s.stale = false;
                    s.fetching = false;
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(resource = %key.resource, error = %e, "Fetch failed; keeping previous data");
                st.notify(key, |s| {
                    s.fetching = false;
                    s.error = Some(e.clone());
                });
            }
        }
    }

    fn spawn_revalidate(&self, key: CacheKey) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                handle.spawn(async move { cache.revalidate(key).await });
            }
            Err(_) => debug!(resource = %key.resource, "No runtime; deferring re-fetch to next read"),
        }
    }

    async fn revalidate(self, key: CacheKey) {
        let Ok((auth, generation)) = self.inner.session.authorized() else {
            return;
        };
        if auth.user_id != key.user_id {
            return;
        }
        let (id, fut) = {
            let mut st = self.inner.state.lock();
            self.sync_generation(&mut st, generation);
            if !st.is_observed(&key) {
                return;
            }
            self.join_or_start(&mut st, &key, auth)
        };
        let result = fut.await;
        self.settle(&key, id, generation, &result, true);
        if matches!(&result, Err(e) if e.is_auth()) {
            self.inner.session.expire(generation).await;
        }
    }
}

/// A mounted reader of one cache key. Dropping it unmounts; results of
/// fetches it triggered are then discarded.
pub struct Observer {
    cache: QueryCache,
    key: CacheKey,
    rx: watch::Receiver<Snapshot>,
}

impl Observer {
    pub fn resource(&self) -> Resource {
        self.key.resource
    }

    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot change. `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.cache.unmount(&self.key);
    }
}
