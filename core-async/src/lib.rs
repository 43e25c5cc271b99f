//! Async abstraction layer for the feedback signal crates.
//!
//! Every crate in the workspace reaches Tokio through this crate instead of
//! depending on it directly. On top of the plain re-exports it provides
//! [`timer::DeadlineTimer`], the cancellable delayed action that drives the
//! timeout path of slots and registry entries.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `time`: Time-related operations (sleep, duration, instant)
//! - `sync`: Synchronization primitives (oneshot channels, Mutex)
//! - `runtime`: Runtime construction and ambient runtime lookup
//! - `timer`: Cancellable deadline timers
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::Duration;
//! use core_async::timer::DeadlineTimer;
//!
//! # core_async::runtime::block_on(async {
//! let timer = DeadlineTimer::schedule(Duration::from_millis(10), || {
//!     println!("deadline reached");
//! })
//! .unwrap();
//! timer.cancel();
//! # });
//! ```

// Lets the attribute macros expand to `core_async::...` paths inside this crate too.
extern crate self as core_async;

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;
pub mod timer;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
pub use timer::{DeadlineTimer, TimerError};
