//! Context passed to store operations.
//!
//! Carries an optional caller deadline and a cancellation token. Every store
//! call narrows the caller's deadline further with the store's own query
//! timeout, so no call can block indefinitely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::StoreError;

// Stand-in for limits that overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-request call context.
///
/// ## Example
///
/// ```ignore
/// let token = CancelToken::new();
/// let ctx = Context::background()
///     .with_timeout(Duration::from_secs(1))
///     .with_cancel(token.clone());
/// let page = store.list(&ctx, &filter, &page_request)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Context {
    /// A context with no deadline of its own and a fresh token.
    pub fn background() -> Self {
        Self::default()
    }

    /// Bound the context to `timeout` from now (keeps an earlier deadline).
    ///
    /// A timeout too large to represent leaves the context unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Bound the context to `deadline` (keeps an earlier deadline).
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Replace the cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Effective deadline for one store call: the caller's deadline or
    /// `now + limit`, whichever comes first.
    pub fn call_deadline(&self, limit: Duration) -> Instant {
        let now = Instant::now();
        let store_deadline = now
            .checked_add(limit)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        match self.deadline {
            Some(deadline) => deadline.min(store_deadline),
            None => store_deadline,
        }
    }

    /// Fail fast if the call is already cancelled or past `deadline`.
    pub fn check(&self, deadline: Instant) -> Result<(), StoreError> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(StoreError::Timeout);
        }
        Ok(())
    }
}

/// Time left until `deadline`, zero if it has passed.
pub(crate) fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
