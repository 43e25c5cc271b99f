//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the feedback signal crates:
//! - Error types and the typed timeout value
//! - Configuration for slots and registries
//! - Logging and tracing setup
//! - Unique identifier generation
//!
//! ## Overview
//!
//! Nothing in this crate holds process-wide state except the tracing
//! subscriber installed by [`logging::init_logging`]. Every registry carries
//! its own [`config::SignalConfig`].

pub mod config;
pub mod error;
pub mod id;
pub mod logging;

pub use error::{Error, Result, TimeoutError};
pub use id::{new_id, IdGenerator, UuidGenerator};
