//! The process-wide session slot. One owning store holds the current bearer
//! token so every mutation goes through `set`/`clear` and nothing else; routes
//! and flows read through `get`. Only the token string lives here, never
//! claims or credentials.

use std::sync::{Mutex, PoisonError};

/// Owning holder of the current session token.
///
/// Absent at construction, set by a successful login, cleared by logout or by
/// the access guard when the token no longer decodes. Concurrent writers are
/// last-write-wins: a login completing after a newer one simply overwrites,
/// and stale in-flight results are tolerated without error.
#[derive(Debug, Default)]
pub struct SessionStore {
    token: Mutex<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current token wholesale.
    pub fn set(&self, token: String) {
        *self.lock() = Some(token);
    }

    /// Returns a copy of the current token, if any.
    pub fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Drops the current token, returning the store to the absent state.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_present(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds a coherent Option; recover it.
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_at_construction() {
        let store = SessionStore::new();
        assert_eq!(store.get(), None);
        assert!(!store.is_present());
    }

    #[test]
    fn set_get_clear_lifecycle() {
        let store = SessionStore::new();
        store.set("first.token.sig".to_string());
        assert_eq!(store.get(), Some("first.token.sig".to_string()));
        assert!(store.is_present());

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn last_write_wins() {
        let store = SessionStore::new();
        store.set("earlier.token.sig".to_string());
        store.set("later.token.sig".to_string());
        assert_eq!(store.get(), Some("later.token.sig".to_string()));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::new();
        store.clear();
        store.clear();
        assert_eq!(store.get(), None);
    }
}
