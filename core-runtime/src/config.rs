//! # Signal Configuration Module
//!
//! Provides configuration for correlation registries.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `SignalConfig`. The builder validates eagerly, so a registry never starts
//! with a timeout it cannot arm.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::{DuplicatePolicy, SignalConfig};
//! use std::time::Duration;
//!
//! let config = SignalConfig::builder()
//!     .default_timeout(Duration::from_secs(5))
//!     .duplicate_policy(DuplicatePolicy::Replace)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.default_timeout, Duration::from_secs(5));
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::SignalConfig;
//! use std::time::Duration;
//!
//! // A zero timeout can never be satisfied
//! let config = SignalConfig::builder()
//!     .default_timeout(Duration::ZERO)
//!     .build()
//!     .expect("Should fail - zero timeout");
//! ```

use crate::error::{Error, Result};
use crate::id::{IdGenerator, UuidGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Timeout used by `register_default` when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound accepted for `default_timeout`.
pub const MAX_DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// What a registry does when an identifier is registered while a previous
/// registration of the same identifier is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Refuse the second registration with `Error::DuplicateId`.
    #[default]
    Reject,
    /// Last writer wins. The displaced waiter receives the timeout token.
    Replace,
}

/// Configuration for a correlation registry.
#[derive(Clone)]
pub struct SignalConfig {
    /// Timeout applied by `register_default`
    pub default_timeout: Duration,

    /// Behaviour on identifier collisions
    pub duplicate_policy: DuplicatePolicy,

    /// Source of generated correlation ids and resolution tokens
    pub id_generator: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for SignalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalConfig")
            .field("default_timeout", &self.default_timeout)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("id_generator", &"IdGenerator { ... }")
            .finish()
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            duplicate_policy: DuplicatePolicy::default(),
            id_generator: Arc::new(UuidGenerator),
        }
    }
}

impl SignalConfig {
    /// Creates a new builder for constructing a `SignalConfig`.
    pub fn builder() -> SignalConfigBuilder {
        SignalConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Default timeout is greater than zero
    /// - Default timeout does not exceed 24 hours
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout.is_zero() {
            return Err(Error::Config(
                "Default timeout must be greater than 0. \
                 Use .default_timeout() with a positive duration."
                    .to_string(),
            ));
        }

        if self.default_timeout > MAX_DEFAULT_TIMEOUT {
            return Err(Error::Config(format!(
                "Default timeout {:?} exceeds maximum of 24 hours",
                self.default_timeout
            )));
        }

        Ok(())
    }
}

/// Builder for constructing [`SignalConfig`] instances.
///
/// Every field is optional; unset fields fall back to the values of
/// [`SignalConfig::default`].
#[derive(Default)]
pub struct SignalConfigBuilder {
    default_timeout: Option<Duration>,
    duplicate_policy: Option<DuplicatePolicy>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl SignalConfigBuilder {
    /// Sets the timeout used by `register_default`.
    ///
    /// Default: 30 seconds
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the identifier collision policy.
    ///
    /// Default: [`DuplicatePolicy::Reject`]
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = Some(policy);
        self
    }

    /// Injects a custom identifier generator.
    ///
    /// Default: [`UuidGenerator`]
    pub fn id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Builds the final `SignalConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the resulting configuration fails
    /// [`SignalConfig::validate`].
    pub fn build(self) -> Result<SignalConfig> {
        let config = SignalConfig {
            default_timeout: self.default_timeout.unwrap_or(DEFAULT_TIMEOUT),
            duplicate_policy: self.duplicate_policy.unwrap_or_default(),
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(UuidGenerator)),
        };

        config.validate()?;

        Ok(config)
    }
}
