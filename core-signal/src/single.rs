//! # One-shot feedback slots
//!
//! A [`SingleSlot`] carries a payload to whoever will answer it and hands the
//! answer back through a single-use [`Feedback`] channel. A deadline timer is
//! armed at construction. Exactly one message ever reaches the feedback
//! channel: the value passed to [`SingleSlot::complete`], or a
//! [`TimeoutError`] if the deadline wins.
//!
//! ## Settling
//!
//! The completion path and the timer path both take the slot's state lock
//! and settle it only if it is still pending. Whoever gets the lock first
//! writes to the channel; the other observes the settled state and returns
//! without touching the channel. A successful completion also cancels the
//! timer, but a timer callback that slipped past the cancel is still a no-op.
//!
//! ## Usage
//!
//! ```
//! use core_signal::single::SingleSlot;
//! use std::time::Duration;
//!
//! # core_async::runtime::block_on(async {
//! let slot = SingleSlot::<&str, usize>::new("ping", Duration::from_secs(1)).unwrap();
//! let feedback = slot.feedback().unwrap();
//!
//! let responder = slot.clone();
//! core_async::spawn(async move {
//!     let request = *responder.payload();
//!     responder.complete(request.len());
//! });
//!
//! assert_eq!(feedback.await, Ok(4));
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use core_async::runtime::{self, Handle};
use core_async::sync::oneshot;
use core_async::time;
use core_async::timer::DeadlineTimer;
use core_runtime::error::{Error, Result, TimeoutError};
use tracing::{debug, trace};

type Delivery<T> = std::result::Result<T, TimeoutError>;

/// How a slot was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A value was delivered through [`SingleSlot::complete`].
    Delivered,
    /// The deadline elapsed first.
    TimedOut,
}

/// Behaviour shared by one-shot feedback cells.
pub trait Single<P, T> {
    /// The payload the slot was created with.
    fn payload(&self) -> &P;

    /// Offers `value` as the answer. Returns `true` if this call settled the
    /// slot, `false` if it was already settled.
    fn complete(&self, value: T) -> bool;

    /// Hands out the receiving end of the feedback channel.
    fn feedback(&self) -> Result<Feedback<T>>;

    fn is_settled(&self) -> bool;
}

enum SlotState<T> {
    Pending {
        tx: oneshot::Sender<Delivery<T>>,
        timer: Option<DeadlineTimer>,
    },
    Settled(Outcome),
}

struct SlotInner<P, T> {
    payload: P,
    timeout: Duration,
    state: Mutex<SlotState<T>>,
    feedback: Mutex<Option<oneshot::Receiver<Delivery<T>>>>,
}

/// One-shot, deadline-bounded feedback cell.
///
/// `P` is the payload handed to the responder, `T` the answer type (the same
/// type unless stated otherwise). Cloning is cheap and every clone refers to
/// the same slot, so one clone can go to the responder while the caller
/// keeps another.
pub struct SingleSlot<P, T = P> {
    inner: Arc<SlotInner<P, T>>,
}

impl<P, T> Clone for SingleSlot<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: std::fmt::Debug, T> std::fmt::Debug for SingleSlot<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleSlot")
            .field("payload", &self.inner.payload)
            .field("timeout", &self.inner.timeout)
            .field("outcome", &self.outcome())
            .finish()
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    // The guarded sections never panic half-way through a transition, so a
    // poisoned lock still holds a consistent state.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<P, T> SingleSlot<P, T>
where
    P: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Creates a slot and arms its deadline on the current runtime.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` if `timeout` is zero
    /// - `Error::NoRuntime` if called outside a Tokio runtime
    pub fn new(payload: P, timeout: Duration) -> Result<Self> {
        check_timeout(timeout)?;
        let handle = runtime::current_handle().ok_or(Error::NoRuntime)?;
        Self::with_handle(&handle, payload, timeout)
    }

    /// Creates a slot whose deadline runs on `handle`.
    ///
    /// This is the constructor for plain threads that are not inside a
    /// runtime themselves.
    pub fn with_handle(handle: &Handle, payload: P, timeout: Duration) -> Result<Self> {
        check_timeout(timeout)?;

        let (tx, rx) = oneshot::channel();
        let inner = Arc::new(SlotInner {
            payload,
            timeout,
            state: Mutex::new(SlotState::Pending { tx, timer: None }),
            feedback: Mutex::new(Some(rx)),
        });

        let expiring = Arc::clone(&inner);
        let timer = DeadlineTimer::schedule_on(handle, timeout, move || expiring.expire());

        let mut state = lock(&inner.state);
        match &mut *state {
            SlotState::Pending { timer: slot, .. } => *slot = Some(timer),
            // Only possible when the deadline already fired on another worker
            SlotState::Settled(_) => timer.cancel(),
        }
        drop(state);

        Ok(Self { inner })
    }
}

impl<P, T> SingleSlot<P, T> {
    /// The payload the slot was created with. Never changes.
    pub fn payload(&self) -> &P {
        &self.inner.payload
    }

    /// The deadline the slot was armed with.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Offers `value` as the answer.
    ///
    /// Settles the slot and disarms the deadline if it is still pending.
    /// Late or repeated calls are silent no-ops. Returns whether this call
    /// was the one that settled the slot.
    pub fn complete(&self, value: T) -> bool {
        let mut state = lock(&self.inner.state);
        match std::mem::replace(&mut *state, SlotState::Settled(Outcome::Delivered)) {
            SlotState::Pending { tx, timer } => {
                if let Some(timer) = timer {
                    timer.cancel();
                }
                if tx.send(Ok(value)).is_err() {
                    trace!("feedback receiver dropped before delivery");
                }
                debug!(timeout = ?self.inner.timeout, "slot completed");
                true
            }
            settled => {
                *state = settled;
                trace!("completion after slot settled ignored");
                false
            }
        }
    }

    /// Hands out the receiving end of the feedback channel.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedbackTaken` on every call after the first.
    pub fn feedback(&self) -> Result<Feedback<T>> {
        lock(&self.inner.feedback)
            .take()
            .map(|rx| Feedback {
                rx,
                timeout: self.inner.timeout,
            })
            .ok_or(Error::FeedbackTaken)
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// How the slot was settled, or `None` while still pending.
    pub fn outcome(&self) -> Option<Outcome> {
        match &*lock(&self.inner.state) {
            SlotState::Pending { .. } => None,
            SlotState::Settled(outcome) => Some(*outcome),
        }
    }
}

impl<P, T> SlotInner<P, T> {
    fn expire(&self) {
        let mut state = lock(&self.state);
        match std::mem::replace(&mut *state, SlotState::Settled(Outcome::TimedOut)) {
            SlotState::Pending { tx, .. } => {
                if tx.send(Err(TimeoutError::new(self.timeout))).is_err() {
                    trace!("feedback receiver dropped before timeout");
                }
                debug!(timeout = ?self.timeout, "slot timed out");
            }
            settled => *state = settled,
        }
    }
}

impl<P, T> Single<P, T> for SingleSlot<P, T> {
    fn payload(&self) -> &P {
        SingleSlot::payload(self)
    }

    fn complete(&self, value: T) -> bool {
        SingleSlot::complete(self, value)
    }

    fn feedback(&self) -> Result<Feedback<T>> {
        SingleSlot::feedback(self)
    }

    fn is_settled(&self) -> bool {
        SingleSlot::is_settled(self)
    }
}

fn check_timeout(timeout: Duration) -> Result<()> {
    if time::is_positive(timeout) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "slot timeout must be greater than zero".to_string(),
        ))
    }
}

/// Receiving end of a slot's feedback channel.
///
/// Resolves to the delivered value or to a [`TimeoutError`]. Await it from
/// async code, or call [`Feedback::blocking_recv`] from a plain thread.
///
/// If the runtime driving the deadline shuts down before the slot settles,
/// the slot times out at that moment, even while other handles are alive.
#[derive(Debug)]
pub struct Feedback<T> {
    rx: oneshot::Receiver<Delivery<T>>,
    timeout: Duration,
}

impl<T> Feedback<T> {
    /// Blocks the current thread until the slot settles.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime; await the feedback
    /// there instead.
    pub fn blocking_recv(self) -> Delivery<T> {
        let timeout = self.timeout;
        self.rx
            .blocking_recv()
            .unwrap_or(Err(TimeoutError::new(timeout)))
    }

    /// Returns the outcome if the slot has already settled, without waiting.
    pub fn try_recv(&mut self) -> Option<Delivery<T>> {
        match self.rx.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(TimeoutError::new(self.timeout)))
            }
        }
    }
}

impl<T> Future for Feedback<T> {
    type Output = Delivery<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let timeout = self.timeout;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TimeoutError::new(timeout))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::time::{sleep, Instant};

    #[core_async::test]
    async fn test_zero_timeout_is_rejected() {
        let result = SingleSlot::<u32>::new(1, Duration::ZERO);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = SingleSlot::<u32>::new(1, Duration::from_secs(1));
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[core_async::test]
    async fn test_payload_is_stable() {
        let slot =
            SingleSlot::<String>::new("request".to_string(), Duration::from_secs(5)).unwrap();
        for _ in 0..3 {
            assert_eq!(slot.payload(), "request");
        }
        slot.complete("reply".to_string());
        assert_eq!(slot.payload(), "request");
    }

    #[core_async::test]
    async fn test_complete_before_deadline_delivers_value() {
        let slot = SingleSlot::<&str, u32>::new("q", Duration::from_secs(5)).unwrap();
        let feedback = slot.feedback().unwrap();

        assert!(slot.complete(7));
        assert_eq!(feedback.await, Ok(7));
        assert_eq!(slot.outcome(), Some(Outcome::Delivered));
    }

    #[core_async::test]
    async fn test_only_first_completion_is_observed() {
        let slot = SingleSlot::<(), u32>::new((), Duration::from_secs(5)).unwrap();
        let mut feedback = slot.feedback().unwrap();

        assert!(slot.complete(1));
        assert!(!slot.complete(2));
        assert!(!slot.complete(3));

        assert_eq!(feedback.try_recv(), Some(Ok(1)));
    }

    #[core_async::test]
    async fn test_deadline_delivers_timeout() {
        let slot = SingleSlot::<(), u32>::new((), Duration::from_millis(30)).unwrap();
        let feedback = slot.feedback().unwrap();
        let start = Instant::now();

        let outcome = feedback.await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, Err(TimeoutError::new(Duration::from_millis(30))));
        assert!(elapsed >= Duration::from_millis(30));
        assert!(elapsed < Duration::from_millis(500));
        assert_eq!(slot.outcome(), Some(Outcome::TimedOut));
    }

    #[core_async::test]
    async fn test_completion_after_timeout_is_ignored() {
        let slot = SingleSlot::<(), u32>::new((), Duration::from_millis(5)).unwrap();
        let feedback = slot.feedback().unwrap();

        assert!(feedback.await.is_err());
        assert!(!slot.complete(9));
        assert_eq!(slot.outcome(), Some(Outcome::TimedOut));
    }

    #[core_async::test]
    async fn test_completion_disarms_timer() {
        let slot = SingleSlot::<(), u32>::new((), Duration::from_millis(10)).unwrap();
        let mut feedback = slot.feedback().unwrap();
        slot.complete(5);

        sleep(Duration::from_millis(40)).await;
        assert_eq!(feedback.try_recv(), Some(Ok(5)));
        assert_eq!(slot.outcome(), Some(Outcome::Delivered));
    }

    #[core_async::test]
    async fn test_feedback_taken_once() {
        let slot = SingleSlot::<u8>::new(0, Duration::from_secs(1)).unwrap();
        assert!(slot.feedback().is_ok());
        assert_eq!(slot.feedback().unwrap_err(), Error::FeedbackTaken);
        assert_eq!(slot.clone().feedback().unwrap_err(), Error::FeedbackTaken);
    }

    #[core_async::test]
    async fn test_try_recv_pending() {
        let slot = SingleSlot::<u8>::new(0, Duration::from_secs(1)).unwrap();
        let mut feedback = slot.feedback().unwrap();
        assert_eq!(feedback.try_recv(), None);
        assert!(!slot.is_settled());
    }

    #[core_async::test]
    async fn test_timeout_fires_with_all_handles_dropped() {
        let slot = SingleSlot::<u8>::new(0, Duration::from_millis(5)).unwrap();
        let feedback = slot.feedback().unwrap();
        drop(slot);

        assert!(feedback.await.is_err());
    }

    #[core_async::test]
    async fn test_trait_object_usage() {
        fn answer(single: &dyn Single<u32, u32>) -> bool {
            single.complete(single.payload() * 2)
        }

        let slot = SingleSlot::<u32>::new(21, Duration::from_secs(1)).unwrap();
        let feedback = slot.feedback().unwrap();
        assert!(answer(&slot));
        assert_eq!(feedback.await, Ok(42));
    }
}
