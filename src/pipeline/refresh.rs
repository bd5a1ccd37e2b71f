//! Single-flight coordination of token refreshes.
//!
//! At most one refresh runs at a time. The first caller to hit a 401 becomes
//! the [`RefreshLeader`] and performs the refresh; everyone arriving while it
//! runs gets a [`RefreshWaiter`] and is released, in arrival order, with the
//! leader's outcome.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::PagedashError;

/// Result of a refresh, broadcast once to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token.
    Refreshed(String),
    /// Refresh failed; the session is over.
    Failed(String),
}

#[derive(Debug, Default)]
struct RefreshState {
    in_progress: bool,
    next_ticket: u64,
    // Only non-empty while `in_progress` is true.
    waiters: VecDeque<(u64, oneshot::Sender<RefreshOutcome>)>,
}

/// Shared refresh state: an in-progress flag plus an ordered waiter queue.
///
/// The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// What a caller got when it asked to refresh.
#[derive(Debug)]
pub enum RefreshTicket<'a> {
    /// No refresh was running; this caller must perform it.
    Leader(RefreshLeader<'a>),
    /// A refresh is already running; wait for its outcome.
    Waiter(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Become the leader of a new refresh, or queue behind the running one.
    pub fn join(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back((ticket, tx));
            tracing::debug!(ticket, queued = state.waiters.len(), "waiting for in-flight refresh");
            RefreshTicket::Waiter(RefreshWaiter { ticket, rx })
        } else {
            state.in_progress = true;
            tracing::debug!(ticket, "starting token refresh");
            RefreshTicket::Leader(RefreshLeader {
                coordinator: self,
                ticket,
                resolved: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_progress
    }

    /// Waiters still queued (excluding ones that gave up).
    pub fn waiter_count(&self) -> usize {
        self.lock()
            .waiters
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }

    /// Reset and release every waiter with `outcome`. Returns released tickets in order.
    fn resolve(&self, outcome: RefreshOutcome) -> Vec<u64> {
        let waiters = {
            let mut state = self.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };
        waiters
            .into_iter()
            .filter_map(|(ticket, tx)| tx.send(outcome.clone()).ok().map(|()| ticket))
            .collect()
    }
}

/// The caller responsible for the running refresh.
///
/// Dropping it unresolved (e.g. the leader's future was cancelled) releases
/// all waiters with a failure so nobody waits forever.
#[derive(Debug)]
pub struct RefreshLeader<'a> {
    coordinator: &'a RefreshCoordinator,
    ticket: u64,
    resolved: bool,
}

impl RefreshLeader<'_> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Finish the refresh; returns the released waiter tickets in release order.
    pub fn resolve(mut self, outcome: RefreshOutcome) -> Vec<u64> {
        self.resolved = true;
        let released = self.coordinator.resolve(outcome);
        tracing::debug!(ticket = self.ticket, released = released.len(), "token refresh resolved");
        released
    }
}

impl Drop for RefreshLeader<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!(ticket = self.ticket, "token refresh abandoned");
            self.coordinator
                .resolve(RefreshOutcome::Failed("token refresh was abandoned".to_string()));
        }
    }
}

/// A caller parked behind a running refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
    ticket: u64,
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Wait for the refreshed token.
    ///
    /// Gives up after `timeout`, leaving the queue. A failed or abandoned
    /// refresh yields [`PagedashError::SessionExpired`].
    pub async fn wait(self, timeout: Duration) -> Result<String, PagedashError> {
        let outcome = tokio::time::timeout(timeout, self.rx)
            .await
            .map_err(|_| PagedashError::Timeout(timeout.as_millis() as u64))?;
        match outcome {
            Ok(RefreshOutcome::Refreshed(token)) => Ok(token),
            Ok(RefreshOutcome::Failed(reason)) => Err(PagedashError::SessionExpired(reason)),
            Err(_) => Err(PagedashError::SessionExpired(
                "token refresh was abandoned".to_string(),
            )),
        }
    }
}
