//! Token mapping and its file-backed store
//!
//! The store is a single JSON object `token -> original text`, shared by every
//! de-identification run that points at it and read back by re-identification.

use crate::domain::{PhimaskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Token to original-text mapping, ordered by token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenMapping {
    entries: BTreeMap<String, String>,
}

impl TokenMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Original text for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Insert an entry, returning the previous original for the token
    pub fn insert(&mut self, token: impl Into<String>, original: impl Into<String>) -> Option<String> {
        self.entries.insert(token.into(), original.into())
    }

    /// Whether the token is mapped
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Merge `other` into this mapping, overwriting by key
    ///
    /// Returns the number of tokens whose original changed, counting new tokens.
    pub fn merge(&mut self, other: TokenMapping) -> usize {
        let mut changed = 0;
        for (token, original) in other.entries {
            match self.entries.entry(token) {
                btree_map::Entry::Occupied(mut entry) => {
                    if *entry.get() != original {
                        entry.insert(original);
                        changed += 1;
                    }
                }
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(original);
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(token, original)` in token order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a mapping from its JSON form
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Pretty JSON with sorted keys
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<(String, String)> for TokenMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// File-backed mapping store
///
/// Read-merge-write cycles through [`MappingStore::update`] are serialized by
/// an internal lock, so one store may be shared by concurrent workers.
#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MappingStore {
    /// Create a store backed by `path`
    ///
    /// Nothing is read or created until the store is used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored mapping
    ///
    /// # Errors
    ///
    /// Returns [`PhimaskError::MappingLoad`] if the file is missing or not a
    /// JSON object of strings.
    pub fn load(&self) -> Result<TokenMapping> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.load_error(e))?;
        serde_json::from_str(&content).map_err(|e| self.load_error(e))
    }

    /// Load the stored mapping, treating a missing file as empty
    ///
    /// A file that exists but cannot be parsed is still an error so that a
    /// damaged store is never overwritten.
    pub fn load_or_empty(&self) -> Result<TokenMapping> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Mapping store not found, starting empty");
            return Ok(TokenMapping::new());
        }
        self.load()
    }

    /// Run one read-merge-write cycle
    ///
    /// `produce` receives the current store content and returns the entries
    /// to add together with a value passed back to the caller. The merged
    /// mapping is written atomically. If `produce` fails nothing is written.
    pub fn update<T, F>(&self, produce: F) -> Result<T>
    where
        F: FnOnce(&TokenMapping) -> Result<(TokenMapping, T)>,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut current = self.load_or_empty()?;
        let (additions, value) = produce(&current)?;

        let changed = current.merge(additions);
        if changed > 0 {
            self.persist(&current)?;
        }
        tracing::debug!(
            path = %self.path.display(),
            changed,
            total = current.len(),
            "Mapping store updated"
        );

        Ok(value)
    }

    /// Write the mapping through a temp file in the same directory
    fn persist(&self, mapping: &TokenMapping) -> Result<()> {
        let json = mapping.to_json().map_err(|e| self.write_error(e))?;
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| self.write_error(e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| self.write_error(e))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.write_all(b"\n"))
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| self.write_error(e))?;
        temp.persist(&self.path).map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn load_error(&self, reason: impl std::fmt::Display) -> PhimaskError {
        PhimaskError::MappingLoad {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn write_error(&self, reason: impl std::fmt::Display) -> PhimaskError {
        PhimaskError::MappingWrite {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn mapping(entries: &[(&str, &str)]) -> TokenMapping {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_overwrites_by_key() {
        let mut base = mapping(&[("A", "1"), ("B", "2")]);
        let changed = base.merge(mapping(&[("B", "2"), ("C", "3"), ("A", "9")]));

        assert_eq!(changed, 2);
        assert_eq!(base.get("A"), Some("9"));
        assert_eq!(base.get("C"), Some("3"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_json_is_sorted_and_pretty() {
        let json = mapping(&[("Z", "last"), ("A", "first")]).to_json().unwrap();
        assert_eq!(json, "{\n  \"A\": \"first\",\n  \"Z\": \"last\"\n}");
        assert_eq!(TokenMapping::from_json(&json).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_store() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.json"));

        assert!(matches!(store.load(), Err(PhimaskError::MappingLoad { .. })));
        assert!(store.load_or_empty().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_store_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = MappingStore::new(&path);

        let result = store.update(|_| Ok((mapping(&[("A", "1")]), ())));
        assert!(matches!(result, Err(PhimaskError::MappingLoad { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_update_creates_and_merges() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("rules").join("mapping.json"));

        store.update(|_| Ok((mapping(&[("A", "1")]), ()))).unwrap();
        let seen = store
            .update(|current| Ok((mapping(&[("B", "2")]), current.len())))
            .unwrap();

        assert_eq!(seen, 1);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, mapping(&[("A", "1"), ("B", "2")]));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.json"));

        let result: Result<()> =
            store.update(|_| Err(PhimaskError::Other("masking failed".to_string())));
        assert!(result.is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MappingStore::new(dir.path().join("mapping.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .update(|_| Ok((mapping(&[(&format!("T{i}"), "v")]), ())))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load().unwrap().len(), 8);
    }
}
