// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Authenticated session state and its durable mirror.
//!
//! The in-memory session is the source of truth for the running process; the
//! persisted blob only seeds it at start-up. Storage failures are logged and
//! never fatal: an unreadable store means "signed out", and a login that
//! cannot be stored leaves the client signed out.

use crate::api::FinanceApi;
use crate::error::{ClientError, ClientResult, ValidationError};
use crate::guard;
use crate::models::{Auth, Credentials, Profile, Registration, Session, UserId};
use crate::storage::KeyValueStore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Storage key of the serialized session.
pub const SESSION_KEY: &str = "userInfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The server answered 401 to a request made with this session.
    Expired,
    AccountDeleted,
    /// A fresh session could not be written to storage.
    StorageFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// `hydrate()` has not resolved yet.
    Pending,
    SignedIn { user_id: UserId },
    /// `reason` is `None` when start-up found no stored session.
    SignedOut { reason: Option<LogoutReason> },
}

impl SessionStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::SignedIn { .. })
    }
}

struct Current {
    session: Option<Session>,
    /// Bumped on every sign-in and sign-out.
    generation: u64,
}

pub struct SessionStore {
    api: Arc<dyn FinanceApi>,
    storage: Arc<dyn KeyValueStore>,
    current: RwLock<Current>,
    status: watch::Sender<SessionStatus>,
    // Serializes every change that touches storage so memory and disk agree.
    write_lock: Mutex<()>,
    hydrated: AtomicBool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &*self.status.borrow())
            .field("generation", &self.generation())
            .finish()
    }
}

impl SessionStore {
    pub fn new(api: Arc<dyn FinanceApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Pending);
        Self {
            api,
            storage,
            current: RwLock::new(Current {
                session: None,
                generation: 0,
            }),
            status,
            write_lock: Mutex::new(()),
            hydrated: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().session.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Credentials for an authenticated request, paired with the generation
    /// they belong to.
    pub fn authorized(&self) -> ClientResult<(Auth, u64)> {
        let cur = self.current.read();
        match &cur.session {
            Some(s) if s.authenticated => Ok((s.auth(), cur.generation)),
            _ => Err(ClientError::NotSignedIn),
        }
    }

    /// Restore the persisted session. The token is trusted as-is; the first
    /// request that comes back 401 ends it.
    pub async fn hydrate(&self) -> SessionStatus {
        let _w = self.write_lock.lock().await;
        if self.hydrated.swap(true, Ordering::SeqCst) {
            return self.status();
        }
        if !matches!(self.status(), SessionStatus::Pending) {
            // A login completed before start-up finished reading storage.
            return self.status();
        }

        match self.load().await {
            Some(mut session) => {
                session.authenticated = true;
                info!(user_id = %session.user_id, "Restored stored session");
                let user_id = session.user_id.clone();
                self.install(Some(session), SessionStatus::SignedIn { user_id });
            }
            None => {
                debug!("No stored session");
                self.install(None, SessionStatus::SignedOut { reason: None });
            }
        }
        self.status()
    }

    async fn load(&self) -> Option<Session> {
        let blob = match self.storage.get(SESSION_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Session storage unreadable; continuing signed out");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&blob) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Stored session is corrupt; discarding it");
                if let Err(e) = self.storage.remove(SESSION_KEY).await {
                    warn!(error = %e, "Failed to discard corrupt session");
                }
                None
            }
        }
    }

    /// Sign in and replace whatever session exists. Concurrent logins resolve
    /// last-write-wins in completion order.
    ///
    /// If the new session cannot be persisted, any previous session is ended
    /// as well and the storage error is returned.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        if credentials.username.trim().is_empty() {
            return Err(ValidationError::field("username", "required").into());
        }
        if credentials.password.is_empty() {
            return Err(ValidationError::field("password", "required").into());
        }

        let response = self.api.login(credentials).await?;
        let session = Session::from(response);

        let _w = self.write_lock.lock().await;
        self.hydrated.store(true, Ordering::SeqCst);
        if let Err(e) = self.persist(&session).await {
            warn!(error = %e, "Failed to persist session; continuing signed out");
            if let Err(e) = self.storage.remove(SESSION_KEY).await {
                warn!(error = %e, "Failed to remove stored session");
            }
            self.install(
                None,
                SessionStatus::SignedOut {
                    reason: Some(LogoutReason::StorageFailed),
                },
            );
            return Err(e);
        }
        self.install(
            Some(session.clone()),
            SessionStatus::SignedIn {
                user_id: session.user_id.clone(),
            },
        );
        info!(user_id = %session.user_id, "Signed in");
        Ok(session)
    }

    pub async fn logout(&self) {
        self.end(LogoutReason::UserRequested).await;
    }

    pub async fn force_logout(&self, reason: LogoutReason) {
        warn!(?reason, "Ending session");
        self.end(reason).await;
    }

    /// Force a logout for a 401 seen by a request issued under `generation`.
    /// A late 401 for a session that was already replaced is ignored.
    pub async fn expire(&self, generation: u64) {
        if self.generation() != generation {
            debug!(generation, "Ignoring 401 from a previous session");
            return;
        }
        self.force_logout(LogoutReason::Expired).await;
    }

    async fn end(&self, reason: LogoutReason) {
        let _w = self.write_lock.lock().await;
        self.hydrated.store(true, Ordering::SeqCst);
        let had_session = self.current.read().session.is_some();
        if had_session || !matches!(self.status(), SessionStatus::SignedOut { .. }) {
            self.install(
                None,
                SessionStatus::SignedOut {
                    reason: Some(reason),
                },
            );
            info!(?reason, "Signed out");
        }
        if let Err(e) = self.storage.remove(SESSION_KEY).await {
            warn!(error = %e, "Failed to remove stored session");
        }
    }

    /// Apply a server-confirmed profile to the live session.
    pub async fn replace_profile(&self, profile: Profile) {
        let _w = self.write_lock.lock().await;
        let updated = {
            let mut cur = self.current.write();
            match cur.session.as_mut() {
                Some(session) => {
                    session.profile = profile;
                    Some(session.clone())
                }
                None => None,
            }
        };
        if let Some(session) = updated {
            if let Err(e) = self.persist(&session).await {
                warn!(error = %e, "Failed to persist updated profile");
            }
        }
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<()> {
        guard::check_registration(registration)?;
        self.api.register(registration).await?;
        info!(username = %registration.username, "Registered account");
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        guard::check_email(email)?;
        self.api.forgot_password(email.trim()).await
    }

    async fn persist(&self, session: &Session) -> ClientResult<()> {
        let blob = serde_json::to_string(session).map_err(ClientError::storage)?;
        self.storage.set(SESSION_KEY, &blob).await
    }

    fn install(&self, session: Option<Session>, status: SessionStatus) {
        {
            let mut cur = self.current.write();
            cur.session = session;
            cur.generation += 1;
        }
        self.status.send_replace(status);
    }
}
