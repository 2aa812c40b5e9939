// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser sessions: current-user tracking and view routing.
//!
//! Each browser session owns an auth-change stream ([`AuthStateNotifier`]), a
//! [`SessionController`] subscribed to it, and the session's habit list.
//! Sessions are dropped once their cookie has expired or they sit idle;
//! a later request with a still-valid cookie restores them.

use crate::db::DocumentStore;
use crate::models::AuthUser;
use crate::services::habits::HabitRepository;
use crate::services::identity::AuthStateNotifier;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Sessions unused for this long are evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// Who is using the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No auth notification has arrived yet
    Unknown,
    SignedOut,
    SignedIn(AuthUser),
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Decide what to show for a requested view.
    pub fn route(&self, requested: Route) -> RouteDecision {
        match (self, requested) {
            (SessionState::Unknown, _) => RouteDecision::Loading,
            (SessionState::SignedOut, Route::SignIn) => RouteDecision::Render(Route::SignIn),
            (SessionState::SignedOut, Route::Home) => RouteDecision::Redirect(Route::SignIn),
            (SessionState::SignedIn(_), Route::Home) => RouteDecision::Render(Route::Home),
            (SessionState::SignedIn(_), Route::SignIn) => RouteDecision::Redirect(Route::Home),
        }
    }
}

impl From<Option<AuthUser>> for SessionState {
    fn from(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => SessionState::SignedIn(user),
            None => SessionState::SignedOut,
        }
    }
}

/// Top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    Home,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::SignIn => "/signin",
            Route::Home => "/",
        }
    }
}

/// Outcome of routing a request against the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session state not known yet; show a loading placeholder
    Loading,
    Render(Route),
    Redirect(Route),
}

/// Follows an auth-change stream for as long as it lives.
///
/// The subscription is released when the controller is dropped.
pub struct SessionController {
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionController {
    /// Subscribe to `changes`; every notification replaces the session state.
    pub fn start(mut changes: watch::Receiver<Option<AuthUser>>) -> Self {
        let (sender, state) = watch::channel(SessionState::Unknown);

        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let user = changes.borrow_and_update().clone();
                tracing::debug!(
                    uid = user.as_ref().map(|u| u.uid.as_str()).unwrap_or("-"),
                    "Auth state changed"
                );
                sender.send_replace(SessionState::from(user));
            }
            tracing::debug!("Auth change stream closed");
        });

        Self { state, task }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Wait until the first notification has been applied.
    pub async fn wait_until_known(&self) -> SessionState {
        let mut state = self.state.clone();
        let known = match state
            .wait_for(|s| !matches!(s, SessionState::Unknown))
            .await
        {
            Ok(known) => known.clone(),
            // Stream ended before any notification; still unknown.
            Err(_) => SessionState::Unknown,
        };
        known
    }

    pub fn route(&self, requested: Route) -> RouteDecision {
        self.state().route(requested)
    }

    /// Stop following the stream.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_subscribed(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Everything the service keeps for one browser session.
pub struct SessionHandle {
    pub id: String,
    pub auth: AuthStateNotifier,
    pub controller: SessionController,
    pub habits: Mutex<HabitRepository>,
    /// Unix seconds; the latest `exp` of a token seen for this session
    expires_at: AtomicU64,
    last_seen: AtomicU64,
}

impl SessionHandle {
    fn new(id: String, store: Arc<dyn DocumentStore>, expires_at: u64) -> Self {
        let auth = AuthStateNotifier::new();
        let controller = SessionController::start(auth.subscribe());
        Self {
            id,
            auth,
            controller,
            habits: Mutex::new(HabitRepository::new(store)),
            expires_at: AtomicU64::new(expires_at),
            last_seen: AtomicU64::new(unix_now()),
        }
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at.load(Ordering::Relaxed)
    }

    fn touch(&self, expires_at: u64) {
        self.last_seen.store(unix_now(), Ordering::Relaxed);
        self.expires_at.fetch_max(expires_at, Ordering::Relaxed);
    }

    fn is_stale(&self, now: u64, idle_timeout: Duration) -> bool {
        let idle = now.saturating_sub(self.last_seen.load(Ordering::Relaxed));
        now >= self.expires_at() || idle >= idle_timeout.as_secs()
    }

    /// Current state, once the controller has applied the latest notification.
    pub async fn state(&self) -> SessionState {
        let mut state = self.controller.state.clone();
        let synced = match state
            .wait_for(|s| *s == SessionState::from(self.auth.current()))
            .await
        {
            Ok(synced) => synced.clone(),
            Err(_) => self.controller.state(),
        };
        synced
    }
}

/// Live sessions keyed by session id.
pub struct SessionStore {
    sessions: DashMap<String, Arc<SessionHandle>>,
    store: Arc<dyn DocumentStore>,
    rng: SystemRandom,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            sessions: DashMap::new(),
            store,
            rng: SystemRandom::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Generate a fresh opaque session id.
    pub fn new_session_id(&self) -> anyhow::Result<String> {
        let mut bytes = [0u8; 24];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system RNG failure"))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Look up a session, or recreate it for `user` (e.g. after a restart or
    /// eviction). `expires_at` is the `exp` of the token that named it.
    ///
    /// A recreated session publishes `user` immediately; its habit list is
    /// empty until the next fetch.
    pub fn get_or_restore(
        &self,
        session_id: &str,
        user: AuthUser,
        expires_at: u64,
    ) -> Arc<SessionHandle> {
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(uid = %user.uid, "Restoring session");
                let handle =
                    SessionHandle::new(session_id.to_string(), self.store.clone(), expires_at);
                handle.auth.publish(Some(user));
                Arc::new(handle)
            })
            .clone();
        handle.touch(expires_at);
        handle
    }

    /// Start a session for a freshly signed-in user.
    ///
    /// Stale sessions are swept first.
    pub fn open(&self, session_id: &str, user: AuthUser, expires_at: u64) -> Arc<SessionHandle> {
        self.evict_stale();
        let handle = self.get_or_restore(session_id, user.clone(), expires_at);
        // Existing session switching users; the habit list resets on its next call.
        if handle.auth.current().as_ref() != Some(&user) {
            handle.auth.publish(Some(user));
        }
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Sign the session out and forget it.
    pub fn close(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let (_, handle) = self.sessions.remove(session_id)?;
        handle.auth.publish(None);
        Some(handle)
    }

    /// Close every session that has expired or been idle for the idle timeout.
    pub fn evict_stale(&self) -> usize {
        self.evict_stale_at(unix_now())
    }

    pub fn evict_stale_at(&self, now: u64) -> usize {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_stale(now, self.idle_timeout))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for session_id in stale {
            // Re-check under the shard lock; a request may have touched it.
            if let Some((_, handle)) = self
                .sessions
                .remove_if(&session_id, |_, h| h.is_stale(now, self.idle_timeout))
            {
                handle.auth.publish(None);
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted stale sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Spawn the periodic stale-session sweep.
pub fn spawn_eviction_task(sessions: Arc<SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sessions.evict_stale();
        }
    })
}
