//! # Core Signal Module
//!
//! In-process request/reply plumbing with hard deadlines:
//!
//! - [`single::SingleSlot`]: hand a payload to a responder and wait for
//!   exactly one answer or a timeout.
//! - [`registry::CorrelationRegistry`]: wait on string correlation
//!   identifiers; completions are matched by identifier and their values
//!   fetched once through a minted resolution token.
//!
//! ## Overview
//!
//! Both components settle exactly once. The completion path and the deadline
//! timer race for the instance's lock and the loser becomes a no-op, so a
//! waiter always observes one outcome: never zero, never two. There is no
//! shared global state; every slot and registry is an independent value.
//!
//! Deadlines are driven by the Tokio runtime (see [`core_async::timer`]).
//! Constructors either pick up the ambient runtime or take an explicit
//! [`core_async::runtime::Handle`], so waiters and responders may live on
//! plain threads as well as in async tasks.

pub mod registry;
pub mod single;

pub use registry::{is_timeout_token, CorrelationRegistry, EventIdSignal, Ticket, TIMEOUT_TOKEN};
pub use single::{Feedback, Outcome, Single, SingleSlot};
