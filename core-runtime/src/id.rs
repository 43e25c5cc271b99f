//! Unique identifier generation.
//!
//! Correlation identifiers and resolution tokens are plain strings. The
//! registry only needs them to be unique with overwhelming probability, so
//! the default generator hands out random (v4) UUIDs. The trait exists so a
//! host can plug in its own scheme, and so tests can pin the values.

use uuid::Uuid;

/// Source of fresh, globally unique string identifiers.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier. Must never return the empty string, which
    /// is reserved for the timeout token.
    fn new_id(&self) -> String;
}

/// [`IdGenerator`] backed by random v4 UUIDs.
///
/// # Examples
///
/// ```
/// use core_runtime::id::{IdGenerator, UuidGenerator};
///
/// let id = UuidGenerator.new_id();
/// assert_eq!(id.len(), 36);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Returns a fresh random identifier.
///
/// Callers without a domain identifier of their own use this to obtain a
/// correlation id before registering it.
pub fn new_id() -> String {
    UuidGenerator.new_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_uuid_ids_parse_back() {
        let id = UuidGenerator.new_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_mock_generator() {
        let mut mock = MockIdGenerator::new();
        mock.expect_new_id().times(1).returning(|| "fixed".to_string());
        assert_eq!(mock.new_id(), "fixed");
    }
}
