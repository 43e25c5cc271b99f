use std::time::Duration;

use core_async::timer::TimerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No async runtime available: slots and registries must be used inside a Tokio runtime")]
    NoRuntime,

    #[error("Feedback channel was already taken from this slot")]
    FeedbackTaken,

    #[error("Identifier is already pending: {0}")]
    DuplicateId(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TimerError> for Error {
    fn from(err: TimerError) -> Self {
        match err {
            TimerError::NoRuntime => Error::NoRuntime,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome delivered through a feedback channel when no value arrived in time.
///
/// This is a value, not a failure of the call that observes it: consumers
/// match on it next to the successful branch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out after {after:?}")]
pub struct TimeoutError {
    /// The deadline the slot was armed with.
    pub after: Duration,
}

impl TimeoutError {
    pub fn new(after: Duration) -> Self {
        Self { after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_error_maps_to_no_runtime() {
        assert_eq!(Error::from(TimerError::NoRuntime), Error::NoRuntime);
    }

    #[test]
    fn test_timeout_error_display() {
        let err = TimeoutError::new(Duration::from_millis(250));
        assert_eq!(err.to_string(), "timed out after 250ms");
    }
}
