//! Token Storage
//!
//! Key-value persistence for cached tokens, scoped by a namespace (the
//! storage name). Values are keyed by client identifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{HttpClientResult, StorageError};

/// Token storage interface.
///
/// No locking is provided across calls: two callers may observe the same
/// expired token and both re-acquire it.
pub trait TokenStorage<V>: Send + Sync {
    /// Namespace this storage is scoped to.
    fn namespace(&self) -> &str;

    fn has(&self, key: &str) -> HttpClientResult<bool>;

    fn get(&self, key: &str) -> HttpClientResult<Option<V>>;

    fn set(&self, key: &str, value: V) -> HttpClientResult<()>;

    fn remove(&self, key: &str) -> HttpClientResult<()>;
}

type Namespaces<V> = HashMap<String, HashMap<String, V>>;

/// In-memory token storage.
///
/// Handles created with [`InMemoryTokenStorage::namespaced`] share the
/// underlying map but never see each other's entries.
pub struct InMemoryTokenStorage<V> {
    namespace: String,
    entries: Arc<Mutex<Namespaces<V>>>,
}

impl<V> InMemoryTokenStorage<V> {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Another namespace over the same backing map.
    pub fn namespaced(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Arc::clone(&self.entries),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Namespaces<V>>, String> {
        self.entries.lock().map_err(|e| e.to_string())
    }
}

impl<V: Clone + Send> TokenStorage<V> for InMemoryTokenStorage<V> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn has(&self, key: &str) -> HttpClientResult<bool> {
        let entries = self.lock().map_err(|message| StorageError::ReadFailed { message })?;
        Ok(entries
            .get(&self.namespace)
            .is_some_and(|scope| scope.contains_key(key)))
    }

    fn get(&self, key: &str) -> HttpClientResult<Option<V>> {
        let entries = self.lock().map_err(|message| StorageError::ReadFailed { message })?;
        Ok(entries
            .get(&self.namespace)
            .and_then(|scope| scope.get(key))
            .cloned())
    }

    fn set(&self, key: &str, value: V) -> HttpClientResult<()> {
        let mut entries = self.lock().map_err(|message| StorageError::WriteFailed { message })?;
        entries
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> HttpClientResult<()> {
        let mut entries = self.lock().map_err(|message| StorageError::DeleteFailed { message })?;
        if let Some(scope) = entries.get_mut(&self.namespace) {
            scope.remove(key);
        }
        Ok(())
    }
}

/// Mock token storage for testing.
pub struct MockTokenStorage<V> {
    namespace: String,
    entries: Mutex<HashMap<String, V>>,
    get_history: Mutex<Vec<String>>,
    set_history: Mutex<Vec<String>>,
    remove_history: Mutex<Vec<String>>,
    should_fail: Mutex<bool>,
}

impl<V> MockTokenStorage<V> {
    pub fn new() -> Self {
        Self {
            namespace: crate::types::DEFAULT_STORAGE_NAME.to_string(),
            entries: Mutex::new(HashMap::new()),
            get_history: Mutex::new(Vec::new()),
            set_history: Mutex::new(Vec::new()),
            remove_history: Mutex::new(Vec::new()),
            should_fail: Mutex::new(false),
        }
    }

    /// Make every subsequent call fail.
    pub fn set_should_fail(&self, fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = fail;
        self
    }

    /// Keys passed to `get`.
    pub fn get_history(&self) -> Vec<String> {
        self.get_history.lock().unwrap().clone()
    }

    /// Keys passed to `set`.
    pub fn set_history(&self) -> Vec<String> {
        self.set_history.lock().unwrap().clone()
    }

    /// Keys passed to `remove`.
    pub fn remove_history(&self) -> Vec<String> {
        self.remove_history.lock().unwrap().clone()
    }

    fn check(&self, error: impl FnOnce(String) -> StorageError) -> HttpClientResult<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(error("mock storage failure".to_string()).into());
        }
        Ok(())
    }
}

impl<V> Default for MockTokenStorage<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> TokenStorage<V> for MockTokenStorage<V> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn has(&self, key: &str) -> HttpClientResult<bool> {
        self.check(|message| StorageError::ReadFailed { message })?;
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    fn get(&self, key: &str) -> HttpClientResult<Option<V>> {
        self.get_history.lock().unwrap().push(key.to_string());
        self.check(|message| StorageError::ReadFailed { message })?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: V) -> HttpClientResult<()> {
        self.set_history.lock().unwrap().push(key.to_string());
        self.check(|message| StorageError::WriteFailed { message })?;
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> HttpClientResult<()> {
        self.remove_history.lock().unwrap().push(key.to_string());
        self.check(|message| StorageError::DeleteFailed { message })?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Create in-memory token storage for `namespace`.
pub fn create_in_memory_token_storage<V>(namespace: &str) -> InMemoryTokenStorage<V> {
    InMemoryTokenStorage::new(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_storage() {
        let storage = InMemoryTokenStorage::<String>::new("oauth_token");

        assert!(!storage.has("client").unwrap());
        storage.set("client", "token-1".to_string()).unwrap();
        assert!(storage.has("client").unwrap());
        assert_eq!(storage.get("client").unwrap(), Some("token-1".to_string()));

        storage.set("client", "token-2".to_string()).unwrap();
        assert_eq!(storage.get("client").unwrap(), Some("token-2".to_string()));

        storage.remove("client").unwrap();
        assert_eq!(storage.get("client").unwrap(), None);
        storage.remove("client").unwrap();
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let first = InMemoryTokenStorage::<u32>::new("provider_a");
        let second = first.namespaced("provider_b");

        first.set("client", 1u32).unwrap();
        second.set("client", 2u32).unwrap();

        assert_eq!(first.get("client").unwrap(), Some(1));
        assert_eq!(second.get("client").unwrap(), Some(2));
        assert_eq!(second.namespace(), "provider_b");

        second.remove("client").unwrap();
        assert_eq!(first.get("client").unwrap(), Some(1));
    }

    #[test]
    fn test_mock_storage_failure_and_history() {
        let storage = MockTokenStorage::<String>::new();
        storage.set("client", "t".to_string()).unwrap();
        storage.set_should_fail(true);

        assert!(storage.get("client").is_err());
        assert!(storage.remove("client").is_err());
        assert_eq!(storage.get_history(), vec!["client".to_string()]);
        assert_eq!(storage.set_history(), vec!["client".to_string()]);
    }
}
