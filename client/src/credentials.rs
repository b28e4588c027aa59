//! Bearer-credential storage.
//!
//! The transport adapter reads a credential before each request and
//! writes one back when the backend rotates it. Storage failures are
//! never allowed to fail a request: they are logged and treated as "no
//! credential".

use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use thiserror::Error;

/// Failure inside a credential store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("credential storage failed: {0}")]
pub struct CredentialError(
    /// Description of the storage failure.
    pub String,
);

/// Persistent storage for the bearer credential.
pub trait CredentialStore: Send + Sync {
    /// Current credential, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the backing storage is
    /// unavailable; callers treat that as "no credential".
    fn get(&self) -> Result<Option<String>, CredentialError>;

    /// Persist a credential.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the backing storage is
    /// unavailable.
    fn set(&self, value: &str) -> Result<(), CredentialError>;

    /// Drop the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the backing storage is
    /// unavailable.
    fn remove(&self) -> Result<(), CredentialError>;
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    value: RwLock<Option<String>>,
}

impl MemoryCredentials {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a credential.
    #[must_use]
    pub fn with_value(value: &str) -> Self {
        Self {
            value: RwLock::new(Some(value.to_owned())),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(self
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value.to_owned());
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialError> {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Process-wide default store, probed when the configuration asks for the
/// platform default.
///
/// The native analogue of the browser localStorage probe: the probe
/// itself can fail (returning `None`), and request code only ever sees an
/// explicitly injected store.
#[must_use]
pub fn platform_default() -> Option<Arc<dyn CredentialStore>> {
    static DEFAULT: OnceLock<Arc<MemoryCredentials>> = OnceLock::new();
    let store = Arc::clone(DEFAULT.get_or_init(|| Arc::new(MemoryCredentials::new())));
    Some(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryCredentials::new();
        assert_eq!(store.get(), Ok(None));
        assert_eq!(store.set("TOKEN"), Ok(()));
        assert_eq!(store.get(), Ok(Some("TOKEN".to_owned())));
        assert_eq!(store.remove(), Ok(()));
        assert_eq!(store.get(), Ok(None));
    }

    #[test]
    fn platform_default_is_shared() {
        let first = platform_default();
        let second = platform_default();
        assert!(first.is_some());
        assert!(second.is_some());
    }
}
