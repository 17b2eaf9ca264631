//! In-memory credential store.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use jules_core::{CredentialError, CredentialStore};

/// In-memory credential store.
///
/// Useful for tests and embedding; values are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        self.values
            .write()
            .map_err(|e| CredentialError::Internal(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jules_core::keys;

    use super::*;

    #[test]
    fn empty_value_reads_as_unset() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(keys::API_KEY), None);

        store.set(keys::API_KEY, "").unwrap();
        assert_eq!(store.get(keys::API_KEY), None);

        store.set(keys::API_KEY, "secret").unwrap();
        assert_eq!(store.get(keys::API_KEY).as_deref(), Some("secret"));
    }

    #[test]
    fn seeded_entries_are_readable() {
        let store = MemoryCredentialStore::with_entries([(keys::SELECTED_SOURCE_NAME, "sources/a")]);
        assert_eq!(
            store.get(keys::SELECTED_SOURCE_NAME).as_deref(),
            Some("sources/a")
        );
    }
}
