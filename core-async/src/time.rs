//! Time-related abstractions.
//!
//! Re-exports `tokio::time` for sleeping and bounded waits, plus the std
//! clock types.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     println!("Took {:?}", start.elapsed());
//! }
//! ```

pub use tokio::time::{sleep, sleep_until, timeout, Sleep, Timeout};

pub use std::time::{Duration, Instant};

/// Returns `true` for a duration that can arm a deadline.
///
/// A zero duration would fire before any producer gets a chance to run, so
/// slot construction treats it as invalid.
pub fn is_positive(duration: Duration) -> bool {
    !duration.is_zero()
}
