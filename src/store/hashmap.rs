use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use bytes::Bytes;

use super::{
    list_prefix_from_all_keys, ListableStore, ReadableStore, Store, StoreError, StoreKey,
    WriteableStore,
};

/// In-memory store which lives as long as the process.
#[derive(Debug, Default)]
pub struct HashMapStore {
    // this locks whole map for read of single key
    map: RwLock<HashMap<StoreKey, Bytes>>,
}

impl HashMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<StoreKey, Bytes>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<StoreKey, Bytes>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Store for HashMapStore {}

impl ReadableStore for HashMapStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Bytes>, StoreError> {
        // Bytes clones are reference-counted
        Ok(self.read().get(key).cloned())
    }

    fn has_key(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.read().contains_key(key))
    }
}

impl ListableStore for HashMapStore {
    fn list_prefix(&self, prefix: &StoreKey) -> Result<Vec<StoreKey>, StoreError> {
        Ok(list_prefix_from_all_keys(self.read().keys(), prefix))
    }
}

impl WriteableStore for HashMapStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StoreError> {
        self.write().insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.write().remove(key).is_some())
    }

    fn erase_prefix(&self, key_prefix: &StoreKey) -> Result<bool, StoreError> {
        let mut map = self.write();
        let before = map.len();
        map.retain(|k, _v| !k.starts_with(key_prefix));
        Ok(map.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StoreKey {
        s.parse().unwrap()
    }

    #[test]
    fn get_set_erase() {
        let store = HashMapStore::new();
        assert_eq!(store.get(&key("a/b")).unwrap(), None);
        store.set(&key("a/b"), Bytes::from_static(b"xyz")).unwrap();
        assert_eq!(
            store.get(&key("a/b")).unwrap(),
            Some(Bytes::from_static(b"xyz"))
        );
        assert!(store.has_key(&key("a/b")).unwrap());
        assert!(store.erase(&key("a/b")).unwrap());
        assert!(!store.erase(&key("a/b")).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn prefixes() {
        let store = HashMapStore::new();
        for k in ["arr/zarr.json", "arr/c/0/0", "arr/c/0/1", "other/zarr.json"] {
            store.set(&key(k), Bytes::new()).unwrap();
        }
        let listed: Vec<String> = store
            .list_prefix(&key("arr/c"))
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(listed, vec!["arr/c/0/0", "arr/c/0/1"]);
        assert_eq!(store.list().unwrap().len(), 4);

        assert!(store.erase_prefix(&key("arr")).unwrap());
        assert!(!store.erase_prefix(&key("arr")).unwrap());
        assert_eq!(store.len(), 1);
    }
}
