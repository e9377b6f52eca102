//! Row cache consulted by generated mappers with caching enabled

use std::collections::HashMap;
use std::sync::Mutex;

use crate::traits::Row;

/// Key/row store used by `find_by_*` lookups.
///
/// Keys are `"{prefix}.{primary key values joined by '.'}"`; see
/// [`cache_key`].
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Row>;

    fn set(&self, key: &str, row: Row);

    fn delete(&self, key: &str);
}

/// Build the cache key for a row identified by `key_values`.
pub fn cache_key<I, S>(prefix: &str, key_values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = prefix.to_string();
    for value in key_values {
        key.push('.');
        key.push_str(value.as_ref());
    }
    key
}

/// Process-local cache backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Row>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Row> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, row: Row) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), row);
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
