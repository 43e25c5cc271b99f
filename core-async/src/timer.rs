//! Cancellable deadline timers.
//!
//! A [`DeadlineTimer`] is a delayed action: a spawned task sleeps for the
//! requested delay and then runs a callback, unless the timer was cancelled
//! first. Cancellation is best-effort. A callback that is already running
//! cannot be stopped, so callbacks must re-check whatever state they guard.
//!
//! Dropping a `DeadlineTimer` does not cancel it; the spawned task owns the
//! callback and fires on its own. Call [`DeadlineTimer::cancel`] to disarm.
//!
//! An armed timer always resolves. If its runtime shuts down before the
//! delay elapses, or was already shut down when the timer was armed, the
//! callback runs at the moment the task is torn down, on whichever thread
//! drops it.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::runtime::{self, Handle};

/// Errors raised while arming a timer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// No Tokio runtime is reachable from the calling thread.
    #[error("no async runtime available to drive the deadline timer")]
    NoRuntime,
}

/// Handle to an armed delayed action.
#[derive(Debug, Clone)]
pub struct DeadlineTimer {
    token: CancellationToken,
    delay: Duration,
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    /// Arms a timer on the runtime driving the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NoRuntime`] when called outside a Tokio runtime.
    pub fn schedule<F>(delay: Duration, callback: F) -> Result<Self, TimerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime::current_handle().ok_or(TimerError::NoRuntime)?;
        Ok(Self::schedule_on(&handle, delay, callback))
    }

    /// Arms a timer on an explicit runtime.
    ///
    /// Useful from plain threads that hold a [`Handle`] but are not
    /// themselves inside the runtime.
    pub fn schedule_on<F>(handle: &Handle, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        // Built outside the task so an unpolled task still owns it
        let guard = FireOnDrop {
            token: token.clone(),
            callback: Some(callback),
        };

        handle.spawn(async move {
            let _guard = guard;
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    trace!(?delay, "deadline timer cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {}
            }
        });

        Self {
            token,
            delay,
            deadline: Instant::now().checked_add(delay),
        }
    }

    /// Disarms the timer. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The delay the timer was armed with.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The instant the timer fires, or `None` if it lies beyond the range of
    /// [`Instant`].
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Runs the callback when dropped, unless the timer was cancelled.
///
/// Owned by the spawned task, so the callback runs once the sleep elapses
/// and also when the runtime discards the task early.
struct FireOnDrop<F: FnOnce()> {
    token: CancellationToken,
    callback: Option<F>,
}

impl<F: FnOnce()> Drop for FireOnDrop<F> {
    fn drop(&mut self) {
        if self.token.is_cancelled() {
            return;
        }
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}
