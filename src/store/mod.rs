//! Byte-addressable key-value backends for metadata documents and encoded chunks.
use bytes::Bytes;
use log::warn;
use smallvec::SmallVec;
use std::{fmt::Display, io, path::PathBuf, str::FromStr};
use thiserror::Error;

mod hashmap;
pub use hashmap::HashMapStore;

#[cfg(feature = "filesystem")]
pub mod filesystem;
#[cfg(feature = "filesystem")]
pub use filesystem::{AccessMode, FileSystemStore};

pub mod registry;
pub use registry::{StoreConfig, StoreRegistry};

const STORE_KEY_SIZE: usize = 10;
pub const METADATA_NAME: &str = "zarr.json";
pub(crate) const KEY_SEP: &str = "/";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Store is read-only")]
    ReadOnly,
    #[error("Store root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("Store root {0} does not exist")]
    NotFound(PathBuf),
    #[error("Store root {0} is not writeable")]
    RootReadOnly(PathBuf),
    #[error("Unknown access mode `{0}`; expected `r`, `w` or `r+`")]
    InvalidMode(String),
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] InvalidKeyComponent),
    #[error("Unknown store `{0}`")]
    UnknownStore(String),
    #[error("Invalid configuration for store `{name}`: {source}")]
    Configuration {
        name: String,
        source: serde_json::Error,
    },
}

/// One `/`-free component of a [StoreKey].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyComponent(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidKeyComponent {
    #[error("Key component is empty string")]
    Empty,
    #[error("Key component contains '/'")]
    HasSlash,
    #[error("Key component is comprised only of periods")]
    IsPeriods,
    #[error("Key component starts with reserved prefix '__'")]
    ReservedPrefix,
}

impl KeyComponent {
    pub fn new(s: String) -> Result<Self, InvalidKeyComponent> {
        Self::validate(&s)?;
        Ok(Self::new_unchecked(s))
    }

    pub(crate) fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    fn validate(s: &str) -> Result<(), InvalidKeyComponent> {
        if s.is_empty() {
            return Err(InvalidKeyComponent::Empty);
        }
        if s.starts_with("__") {
            return Err(InvalidKeyComponent::ReservedPrefix);
        }
        if s.chars().all(|c| c == '.') {
            return Err(InvalidKeyComponent::IsPeriods);
        }
        let mut warned = false;
        for c in s.chars() {
            if c == '/' {
                return Err(InvalidKeyComponent::HasSlash);
            }
            if !warned && !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                warned = true;
                warn!("Key component has non-recommended character `{}`; prefer `a-z`, `A-Z`, `0-9`, `-`, `_`, `.`", c);
            }
        }
        Ok(())
    }
}

impl Display for KeyComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyComponent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for KeyComponent {
    type Err = InvalidKeyComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

/// A key in a store: a sequence of [KeyComponent]s, written `a/b/c`.
///
/// The empty key is the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StoreKey(SmallVec<[KeyComponent; STORE_KEY_SIZE]>);

impl FromIterator<KeyComponent> for StoreKey {
    fn from_iter<T: IntoIterator<Item = KeyComponent>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl StoreKey {
    /// Adds a new key component in-place, returning the new number of components.
    pub fn push(&mut self, name: KeyComponent) -> usize {
        self.0.push(name);
        self.0.len()
    }

    pub(crate) fn push_unchecked(&mut self, name: &str) -> usize {
        self.push(KeyComponent::new_unchecked(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Pop the last key component.
    ///
    /// None if we are at the root.
    pub fn pop(&mut self) -> Option<KeyComponent> {
        self.0.pop()
    }

    pub fn starts_with(&self, other: &StoreKey) -> bool {
        self.len() >= other.len()
            && self
                .as_slice()
                .iter()
                .zip(other.as_slice().iter())
                .all(|(a, b)| a == b)
    }

    /// Create a new key relative to this one.
    ///
    /// `"."` refers to the current key (no-op),
    /// `".."` refers to the parent key.
    /// Traversing above the root returns None.
    pub fn relative(&self, items: &[&str]) -> Result<Option<Self>, InvalidKeyComponent> {
        let mut new = self.clone();
        for n in items.iter() {
            match *n {
                "." => continue,
                ".." => {
                    if new.pop().is_none() {
                        return Ok(None);
                    }
                }
                other => {
                    new.push(other.parse()?);
                }
            };
        }
        Ok(Some(new))
    }

    /// The key of the metadata document of the node at this key.
    pub fn with_metadata(&self) -> Self {
        let mut k = self.clone();
        k.push_unchecked(METADATA_NAME);
        k
    }

    pub fn as_slice(&self) -> &[KeyComponent] {
        self.0.as_slice()
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for c in self.0.iter() {
            if !first {
                f.write_str(KEY_SEP)?;
            }
            first = false;
            f.write_str(c.as_ref())?;
        }
        Ok(())
    }
}

impl FromStr for StoreKey {
    type Err = InvalidKeyComponent;

    /// Empty components (leading, trailing or repeated `/`) are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(KEY_SEP)
            .filter(|c| !c.is_empty())
            .map(KeyComponent::from_str)
            .collect()
    }
}

pub(crate) fn list_prefix_from_all_keys<'a, I: Iterator<Item = &'a StoreKey>>(
    keys: I,
    prefix: &StoreKey,
) -> Vec<StoreKey> {
    let mut out: Vec<_> = keys.filter(|k| k.starts_with(prefix)).cloned().collect();
    out.sort();
    out
}

/// Marker for all stores; stores are shared between threads.
pub trait Store: Send + Sync {}

pub trait ReadableStore: Store {
    /// `Ok(None)` if the key does not exist.
    fn get(&self, key: &StoreKey) -> Result<Option<Bytes>, StoreError>;

    fn has_key(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

pub trait ListableStore: Store {
    /// Retrieve all keys in the store.
    fn list(&self) -> Result<Vec<StoreKey>, StoreError> {
        self.list_prefix(&StoreKey::default())
    }

    /// Retrieve all keys with a given prefix, sorted.
    fn list_prefix(&self, prefix: &StoreKey) -> Result<Vec<StoreKey>, StoreError>;
}

pub trait WriteableStore: ReadableStore {
    /// Replace the value at the key.
    ///
    /// Readers never observe a partially written value.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StoreError>;

    /// Returns whether the key existed.
    fn erase(&self, key: &StoreKey) -> Result<bool, StoreError>;

    /// Erase every key with the given prefix, returning whether any existed.
    fn erase_prefix(&self, key_prefix: &StoreKey) -> Result<bool, StoreError>;
}

/// A store supporting every operation; what registries hand out.
pub trait StoreBackend: ReadableStore + WriteableStore + ListableStore {}

impl<T: ReadableStore + WriteableStore + ListableStore + ?Sized> StoreBackend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_components() {
        assert!("c".parse::<KeyComponent>().is_ok());
        assert!("zarr.json".parse::<KeyComponent>().is_ok());
        assert_eq!("".parse::<KeyComponent>(), Err(InvalidKeyComponent::Empty));
        assert_eq!(
            "..".parse::<KeyComponent>(),
            Err(InvalidKeyComponent::IsPeriods)
        );
        assert_eq!(
            "__partial".parse::<KeyComponent>(),
            Err(InvalidKeyComponent::ReservedPrefix)
        );
        assert_eq!(
            KeyComponent::new("a/b".to_owned()),
            Err(InvalidKeyComponent::HasSlash)
        );
    }

    #[test]
    fn key_roundtrip() {
        let k: StoreKey = "/group/array/".parse().unwrap();
        assert_eq!(k.len(), 2);
        assert_eq!(k.to_string(), "group/array");
        assert_eq!(k.with_metadata().to_string(), "group/array/zarr.json");
        assert!(k.with_metadata().starts_with(&k));
        assert!(!k.starts_with(&k.with_metadata()));
        assert!("".parse::<StoreKey>().unwrap().is_root());
    }

    #[test]
    fn relative() {
        let k: StoreKey = "a/b".parse().unwrap();
        assert_eq!(
            k.relative(&["..", "c"]).unwrap().unwrap().to_string(),
            "a/c"
        );
        assert_eq!(k.relative(&["..", "..", ".."]).unwrap(), None);
    }
}
