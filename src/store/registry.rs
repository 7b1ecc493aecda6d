use std::{collections::HashMap, fmt::Debug, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HashMapStore, StoreBackend, StoreError};

/// Names a store implementation and its configuration, e.g.
/// `{"name": "file", "configuration": {"root": "/data", "mode": "w"}}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoreConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            name: "memory".to_owned(),
            configuration: None,
        }
    }

    #[cfg(feature = "filesystem")]
    pub fn file<P: AsRef<std::path::Path>>(root: P, mode: super::AccessMode) -> Self {
        Self {
            name: "file".to_owned(),
            configuration: Some(serde_json::json!({
                "root": root.as_ref(),
                "mode": mode,
            })),
        }
    }
}

pub type StoreFactory =
    Arc<dyn Fn(Option<&Value>) -> Result<Arc<dyn StoreBackend>, StoreError> + Send + Sync>;

#[cfg(feature = "filesystem")]
#[derive(Deserialize)]
struct FileStoreConfig {
    root: std::path::PathBuf,
    #[serde(default)]
    mode: super::AccessMode,
}

/// Maps store names to constructors.
#[derive(Clone)]
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
}

impl Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("StoreRegistry")
            .field("stores", &names)
            .finish()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register("memory", |_cfg| {
            Ok(Arc::new(HashMapStore::default()) as Arc<dyn StoreBackend>)
        });
        #[cfg(feature = "filesystem")]
        reg.register("file", |cfg| {
            let value = cfg.cloned().unwrap_or(Value::Null);
            let c: FileStoreConfig =
                serde_json::from_value(value).map_err(|source| StoreError::Configuration {
                    name: "file".to_owned(),
                    source,
                })?;
            let store = super::FileSystemStore::open(c.root, c.mode)?;
            Ok(Arc::new(store) as Arc<dyn StoreBackend>)
        });
        reg
    }
}

impl StoreRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::default(),
        }
    }

    /// Register a constructor under `name`, replacing any existing one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(Option<&Value>) -> Result<Arc<dyn StoreBackend>, StoreError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_owned(), Arc::new(factory));
        self
    }

    pub fn open(&self, config: &StoreConfig) -> Result<Arc<dyn StoreBackend>, StoreError> {
        let factory = self
            .factories
            .get(&config.name)
            .ok_or_else(|| StoreError::UnknownStore(config.name.clone()))?;
        log::debug!("Opening `{}` store", config.name);
        factory(config.configuration.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ReadableStore, StoreKey, WriteableStore};
    use bytes::Bytes;

    #[test]
    fn memory_store() {
        let reg = StoreRegistry::default();
        let store = reg.open(&StoreConfig::memory()).unwrap();
        let k: StoreKey = "a".parse().unwrap();
        store.set(&k, Bytes::from_static(b"1")).unwrap();
        assert!(store.has_key(&k).unwrap());
    }

    #[test]
    fn unknown_store() {
        let reg = StoreRegistry::default();
        let cfg: StoreConfig = serde_json::from_str(r#"{"name": "s3"}"#).unwrap();
        assert!(matches!(reg.open(&cfg), Err(StoreError::UnknownStore(n)) if n == "s3"));
    }

    #[cfg(feature = "filesystem")]
    #[test]
    fn file_store() {
        let tmp = tempdir::TempDir::new("registry").unwrap();
        let reg = StoreRegistry::default();
        let root = tmp.path().join("data");

        let cfg = StoreConfig::file(&root, crate::store::AccessMode::ReadOnly);
        assert!(matches!(reg.open(&cfg), Err(StoreError::NotFound(_))));

        let cfg: StoreConfig = serde_json::from_value(serde_json::json!({
            "name": "file",
            "configuration": {"root": root, "mode": "w"}
        }))
        .unwrap();
        reg.open(&cfg).unwrap();
        assert!(root.is_dir());

        let bad = StoreConfig {
            name: "file".to_owned(),
            configuration: None,
        };
        assert!(matches!(
            reg.open(&bad),
            Err(StoreError::Configuration { .. })
        ));
    }
}
