//! Workspace facade crate.
//!
//! Re-exports the public surface of the member crates so hosts can depend on
//! `fbs` alone:
//!
//! - one-shot slots and the correlation registry from `core-signal`
//! - configuration, errors, logging and id generation from `core-runtime`
//!
//! ```
//! use fbs::{CorrelationRegistry, SingleSlot};
//! use std::time::Duration;
//!
//! # fbs::core_async::runtime::block_on(async {
//! let slot = SingleSlot::<u32>::new(1, Duration::from_secs(1)).unwrap();
//! let feedback = slot.feedback().unwrap();
//! slot.complete(2);
//! assert_eq!(feedback.await, Ok(2));
//!
//! let registry = CorrelationRegistry::<u32>::new();
//! let id = fbs::new_id();
//! let ticket = registry.register(id.clone(), Duration::from_secs(1)).unwrap();
//! registry.complete(&id, 3);
//! assert_eq!(registry.wait_value(ticket).await, Some(3));
//! # });
//! ```

pub use core_async;

pub use core_runtime::config::{DuplicatePolicy, SignalConfig};
pub use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use core_runtime::{new_id, Error, IdGenerator, Result, TimeoutError, UuidGenerator};
pub use core_signal::{
    is_timeout_token, CorrelationRegistry, EventIdSignal, Feedback, Outcome, Single, SingleSlot,
    Ticket, TIMEOUT_TOKEN,
};
