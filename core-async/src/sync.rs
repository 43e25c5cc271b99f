//! Synchronization primitives.
//!
//! Re-exports of the `tokio::sync` types used across the workspace. The
//! one-shot channel is the delivery vehicle for every slot and ticket: it has
//! capacity one, a single sender and a single receiver, and can be awaited
//! from async code or drained with `blocking_recv` from a plain thread.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::oneshot;
//!
//! let (tx, rx) = oneshot::channel();
//! tx.send(7).unwrap();
//! assert_eq!(rx.blocking_recv().unwrap(), 7);
//! ```

pub use tokio::sync::{oneshot, Mutex, MutexGuard, Notify};

pub use tokio_util::sync::CancellationToken;
