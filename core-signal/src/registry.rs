//! # Correlation registry
//!
//! Matches asynchronous completions to their waiters by correlation
//! identifier. A waiter registers an identifier with a deadline and receives
//! a [`Ticket`]. When a completion for that identifier arrives, the value is
//! stored under a freshly minted resolution token and the token is sent on
//! the ticket. When the deadline passes first, the ticket receives the empty
//! [`TIMEOUT_TOKEN`] instead.
//!
//! ```text
//!  waiter                     registry                     responder
//!    │  register("req-1") ──────>│ pending["req-1"]            │
//!    │<── Ticket                 │                             │
//!    │                           │<──── complete("req-1", v) ──┤
//!    │<── token t ───────────────┤ results[t] = v              │
//!    │  take_value(t) ──────────>│ results.remove(t)           │
//!    │<── Some(v)                │                             │
//! ```
//!
//! Tokens are distinct from identifiers, so an identifier can be registered
//! again as soon as its previous registration settled, even while the old
//! value is still waiting to be taken.
//!
//! ## Collisions
//!
//! Registering an identifier that is already pending follows the registry's
//! [`DuplicatePolicy`]: `Reject` refuses the second registration,
//! `Replace` hands the identifier to the newcomer and signals the displaced
//! waiter with the timeout token.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use core_async::runtime::{self, Handle};
use core_async::sync::oneshot;
use core_async::timer::DeadlineTimer;
use core_runtime::config::{DuplicatePolicy, SignalConfig};
use core_runtime::error::{Error, Result};
use core_runtime::logging::redact_token;
use core_runtime::new_id;
use tracing::{debug, trace, warn};

/// Token delivered on a [`Ticket`] when its registration expired.
pub const TIMEOUT_TOKEN: &str = "";

/// Returns `true` for the token that signals an expired registration.
pub fn is_timeout_token(token: &str) -> bool {
    token == TIMEOUT_TOKEN
}

/// Behaviour shared by identifier-keyed feedback registries.
pub trait EventIdSignal<V> {
    /// Starts waiting for `id`; the ticket yields a resolution token, or
    /// [`TIMEOUT_TOKEN`] once `timeout` elapses.
    fn register(&self, id: String, timeout: Duration) -> Result<Ticket>;

    /// Resolves the waiter for `id`. Returns `false` when no waiter exists.
    fn complete(&self, id: &str, value: V) -> bool;

    /// Takes the value stored under `token`, at most once.
    fn take_value(&self, token: &str) -> Option<V>;
}

struct PendingEntry {
    tx: oneshot::Sender<String>,
    generation: u64,
    timer: Option<DeadlineTimer>,
}

impl PendingEntry {
    fn disarm(&self) {
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
    }

    fn signal_timeout(self) {
        self.disarm();
        let _ = self.tx.send(TIMEOUT_TOKEN.to_string());
    }
}

struct RegistryState<V> {
    pending: HashMap<String, PendingEntry>,
    results: HashMap<String, V>,
    next_generation: u64,
}

struct RegistryInner<V> {
    config: SignalConfig,
    state: Mutex<RegistryState<V>>,
}

/// Registry mapping correlation identifiers to pending waiters.
///
/// Cloning is cheap; all clones share the same maps. Each registry owns its
/// own lock and configuration.
pub struct CorrelationRegistry<V> {
    inner: Arc<RegistryInner<V>>,
}

impl<V> Clone for CorrelationRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> std::fmt::Debug for CorrelationRegistry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("CorrelationRegistry")
            .field("config", &self.inner.config)
            .field("pending", &state.pending.len())
            .field("results", &state.results.len())
            .finish()
    }
}

impl<V> Default for CorrelationRegistry<V>
where
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RegistryInner<V> {
    fn lock(&self) -> MutexGuard<'_, RegistryState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire(&self, id: &str, generation: u64) {
        let mut state = self.lock();
        if let Entry::Occupied(entry) = state.pending.entry(id.to_string()) {
            // A later registration of the same id has its own timer
            if entry.get().generation != generation {
                trace!(%id, "stale expiry ignored");
                return;
            }
            let entry = entry.remove();
            if entry.tx.send(TIMEOUT_TOKEN.to_string()).is_err() {
                trace!(%id, "waiter dropped before expiry");
            }
            debug!(%id, "correlation id expired");
        }
    }

    fn mint_token(&self, results: &HashMap<String, V>) -> String {
        let token = self.config.id_generator.new_id();
        if token.is_empty() || results.contains_key(&token) {
            warn!("id generator returned an unusable token, falling back to a random id");
            return new_id();
        }
        token
    }
}

impl<V> CorrelationRegistry<V>
where
    V: Send + 'static,
{
    /// Creates a registry with [`SignalConfig::default`].
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                state: Mutex::new(RegistryState {
                    pending: HashMap::new(),
                    results: HashMap::new(),
                    next_generation: 0,
                }),
            }),
        }
    }

    /// Starts waiting for `id` and arms its expiry on the current runtime.
    ///
    /// A zero `timeout` is accepted and expires the registration right away.
    ///
    /// # Errors
    ///
    /// - `Error::NoRuntime` if called outside a Tokio runtime
    /// - `Error::DuplicateId` if `id` is pending and the policy is `Reject`
    pub fn register(&self, id: impl Into<String>, timeout: Duration) -> Result<Ticket> {
        let handle = runtime::current_handle().ok_or(Error::NoRuntime)?;
        self.register_on(&handle, id, timeout)
    }

    /// Like [`register`](Self::register), with expiry driven by `handle`.
    pub fn register_on(
        &self,
        handle: &Handle,
        id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Ticket> {
        let id = id.into();
        let mut state = self.inner.lock();

        if state.pending.contains_key(&id) {
            match self.inner.config.duplicate_policy {
                DuplicatePolicy::Reject => {
                    debug!(%id, "duplicate registration rejected");
                    return Err(Error::DuplicateId(id));
                }
                DuplicatePolicy::Replace => {
                    if let Some(displaced) = state.pending.remove(&id) {
                        displaced.signal_timeout();
                        debug!(%id, "pending registration replaced");
                    }
                }
            }
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let (tx, rx) = oneshot::channel();
        state.pending.insert(
            id.clone(),
            PendingEntry {
                tx,
                generation,
                timer: None,
            },
        );
        // The timer callback takes this lock, and runs inline when the
        // runtime behind `handle` is already shut down.
        drop(state);

        let registry = Arc::downgrade(&self.inner);
        let expiring_id = id.clone();
        let timer = DeadlineTimer::schedule_on(handle, timeout, move || {
            expire_weak(&registry, &expiring_id, generation)
        });

        let mut state = self.inner.lock();
        match state.pending.get_mut(&id) {
            Some(entry) if entry.generation == generation => entry.timer = Some(timer),
            // Already completed, expired or displaced
            _ => timer.cancel(),
        }
        drop(state);

        debug!(%id, ?timeout, "correlation id registered");
        Ok(Ticket { rx })
    }

    /// Registers `id` with the configured default timeout.
    pub fn register_default(&self, id: impl Into<String>) -> Result<Ticket> {
        self.register(id, self.inner.config.default_timeout)
    }

    /// Registers a freshly generated identifier and returns it with its
    /// ticket.
    pub fn register_generated(&self, timeout: Duration) -> Result<(String, Ticket)> {
        let id = self.inner.config.id_generator.new_id();
        let ticket = self.register(id.clone(), timeout)?;
        Ok((id, ticket))
    }

    /// Resolves the waiter for `id` with `value`.
    ///
    /// Mints a resolution token, stores `value` under it and sends the token
    /// to the waiter. If `id` is unknown, already completed or expired, the
    /// value is dropped and `false` is returned.
    pub fn complete(&self, id: &str, value: V) -> bool {
        let mut state = self.inner.lock();
        let Some(entry) = state.pending.remove(id) else {
            trace!(%id, "completion for unknown or settled id dropped");
            return false;
        };
        entry.disarm();

        let token = self.inner.mint_token(&state.results);
        state.results.insert(token.clone(), value);

        if entry.tx.send(token.clone()).is_err() {
            // Nobody can ever ask for it
            state.results.remove(&token);
            debug!(%id, "waiter dropped before completion, value discarded");
        } else {
            debug!(%id, token = %redact_token(&token), "correlation id completed");
        }
        true
    }
}

impl<V> CorrelationRegistry<V> {
    /// Takes the value stored under `token`.
    ///
    /// Returns `None` for [`TIMEOUT_TOKEN`], for unknown tokens and for
    /// tokens whose value was already taken.
    pub fn take_value(&self, token: &str) -> Option<V> {
        if is_timeout_token(token) {
            return None;
        }
        self.inner.lock().results.remove(token)
    }

    /// Waits on `ticket` and takes the value it resolves to.
    ///
    /// Returns `None` if the registration expired.
    pub async fn wait_value(&self, ticket: Ticket) -> Option<V> {
        let token = ticket.await;
        self.take_value(&token)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.lock().pending.contains_key(id)
    }

    /// Number of identifiers currently awaiting completion.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Number of completed values not yet taken.
    pub fn results_len(&self) -> usize {
        self.inner.lock().results.len()
    }

    pub fn config(&self) -> &SignalConfig {
        &self.inner.config
    }
}

fn expire_weak<V>(registry: &Weak<RegistryInner<V>>, id: &str, generation: u64) {
    // A dropped registry already released its waiters
    if let Some(inner) = registry.upgrade() {
        inner.expire(id, generation);
    }
}

impl<V> EventIdSignal<V> for CorrelationRegistry<V>
where
    V: Send + 'static,
{
    fn register(&self, id: String, timeout: Duration) -> Result<Ticket> {
        CorrelationRegistry::register(self, id, timeout)
    }

    fn complete(&self, id: &str, value: V) -> bool {
        CorrelationRegistry::complete(self, id, value)
    }

    fn take_value(&self, token: &str) -> Option<V> {
        CorrelationRegistry::take_value(self, token)
    }
}

/// Receiving end for one registration.
///
/// Resolves to a resolution token, or to [`TIMEOUT_TOKEN`] if the
/// registration expired or was displaced. Expiry also happens when the
/// runtime driving it shuts down, and dropping the registry releases the
/// ticket the same way.
#[derive(Debug)]
pub struct Ticket {
    rx: oneshot::Receiver<String>,
}

impl Ticket {
    /// Blocks the current thread until the registration settles.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime.
    pub fn blocking_recv(self) -> String {
        self.rx.blocking_recv().unwrap_or_default()
    }

    /// Returns the token if the registration has already settled.
    pub fn try_recv(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(token) => Some(token),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(TIMEOUT_TOKEN.to_string()),
        }
    }
}

impl Future for Ticket {
    type Output = String;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_default())
    }
}
