//! Append-only fragment registry shared across endpoints.
//!
//! Endpoints merge their fragments independently after discovery; keys carry
//! the endpoint prefix so concurrent merges never collide. Readers take a
//! snapshot; nothing rewrites existing entries per request.

use crate::schema::fragment::SchemaFragment;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<RwLock<BTreeMap<String, SchemaFragment>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, entries: impl IntoIterator<Item = (String, SchemaFragment)>) {
        let mut guard = self.inner.write().expect("schema registry poisoned");
        for (key, fragment) in entries {
            guard.insert(key, fragment);
        }
    }

    /// Point-in-time copy for the external document assembler.
    pub fn snapshot(&self) -> BTreeMap<String, SchemaFragment> {
        self.inner.read().expect("schema registry poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("schema registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fragment::advanced_fragment;

    #[test]
    fn merge_is_append_only_across_endpoints() {
        let registry = SchemaRegistry::new();
        registry.merge(vec![advanced_fragment("db1")]);
        registry.merge(vec![advanced_fragment("db2")]);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("db1_advanced"));
        assert!(snapshot.contains_key("db2_advanced"));
    }

    #[test]
    fn snapshot_is_detached_from_later_merges() {
        let registry = SchemaRegistry::new();
        registry.merge(vec![advanced_fragment("db1")]);
        let snapshot = registry.snapshot();
        registry.merge(vec![advanced_fragment("db2")]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
