use serde_json::Value;
use std::collections::HashMap;

use super::{validate_namespace, ContentStore, StoreError};

/// In-process store. Can be switched into a failing mode to simulate an
/// unavailable or full backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
    unavailable: bool,
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Successful `set` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    fn check(&self, namespace: &str) -> Result<(), StoreError> {
        validate_namespace(namespace)?;
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        self.check(namespace)?;
        Ok(self
            .entries
            .get(namespace)
            .filter(|v| !v.is_null())
            .cloned())
    }

    fn set(&mut self, namespace: &str, value: Value) -> Result<(), StoreError> {
        self.check(namespace)?;
        self.entries.insert(namespace.to_string(), value);
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, namespace: &str) -> Result<(), StoreError> {
        self.check(namespace)?;
        self.entries.remove(namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roundtrip_and_outage() {
        let mut store = MemoryStore::new();
        store.set("stories", json!([1, 2])).unwrap();
        assert_eq!(store.get("stories").unwrap(), Some(json!([1, 2])));

        store.set_unavailable(true);
        assert!(matches!(store.get("stories"), Err(StoreError::Unavailable(_))));
        assert!(store.set("stories", json!([])).is_err());
        assert_eq!(store.write_count(), 1);

        store.set_unavailable(false);
        assert_eq!(store.get("stories").unwrap(), Some(json!([1, 2])));
    }
}
