//! Run-scoped shared state
//!
//! One [`RunState`] exists per load-test execution and is injected into
//! every session at creation. Sessions share nothing else: the counters are
//! increment-only atomics, the token cache tolerates concurrent access
//! keyed by username, and the heartbeat keeps at most one ticker alive.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::auth::TokenSet;

/// Increment-only observability counters (write-only side channel)
#[derive(Debug, Default)]
pub struct RunCounters {
    server_down: AtomicU64,
    request_timeout: AtomicU64,
    no_quiz_found: AtomicU64,
}

impl RunCounters {
    pub fn record_server_down(&self) {
        self.server_down.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_timeout(&self) {
        self.request_timeout.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_quiz_found(&self) {
        self.no_quiz_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn server_down(&self) -> u64 {
        self.server_down.load(Ordering::Relaxed)
    }

    pub fn request_timeout(&self) -> u64 {
        self.request_timeout.load(Ordering::Relaxed)
    }

    pub fn no_quiz_found(&self) -> u64 {
        self.no_quiz_found.load(Ordering::Relaxed)
    }
}

/// Token store memoizing credentials by username, so repeated sessions for
/// the same identity skip re-authentication. A missing key is not an error;
/// it triggers a fresh acquisition.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<String, TokenSet>>,
}

impl TokenCache {
    pub fn get(&self, username: &str) -> Option<TokenSet> {
        self.entries.read().get(username).cloned()
    }

    pub fn set(&self, username: impl Into<String>, token: TokenSet) {
        self.entries.write().insert(username.into(), token);
    }

    pub fn remove(&self, username: &str) -> Option<TokenSet> {
        self.entries.write().remove(username)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Liveness indicator active while retries are outstanding. At most one
/// ticker runs per [`RunState`]; the next successful request clears it.
#[derive(Debug, Default)]
pub struct RetryHeartbeat {
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RetryHeartbeat {
    /// Start the ticker unless one is already running
    pub fn start(&self, interval: Duration) {
        let mut guard = self.ticker.lock();
        if guard.is_some() {
            return;
        }
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                debug!(target: "stampede::heartbeat", "waiting on retries");
            }
        }));
    }

    /// Stop the ticker if one is running
    pub fn clear(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticker.lock().is_some()
    }
}

impl Drop for RetryHeartbeat {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

/// Shared state for one whole load-test run
#[derive(Debug, Default)]
pub struct RunState {
    pub counters: RunCounters,
    pub tokens: TokenCache,
    pub heartbeat: RetryHeartbeat,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}
