//! Task spawning.
//!
//! Thin wrappers over `tokio::task`. Spawning from outside a runtime panics
//! in Tokio, so [`try_spawn`] is offered for callers that cannot guarantee an
//! ambient runtime and want an error instead.

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

use crate::runtime;
use crate::timer::TimerError;

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # core_async::runtime::block_on(async {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # });
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Spawns `future` if a runtime is available, otherwise reports
/// [`TimerError::NoRuntime`].
pub fn try_spawn<F>(future: F) -> Result<JoinHandle<F::Output>, TimerError>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = runtime::current_handle().ok_or(TimerError::NoRuntime)?;
    Ok(handle.spawn(future))
}
