use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use bytes::Bytes;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{
    KeyComponent, ListableStore, ReadableStore, Store, StoreError, StoreKey, WriteableStore,
};

/// Temporary files are written next to their target with this prefix,
/// which is not a valid key component, so they are never listed.
const PARTIAL_PREFIX: &str = "__partial";

/// How a [FileSystemStore] may use its root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccessMode {
    /// The root must exist; writes fail.
    #[serde(rename = "r")]
    ReadOnly,
    /// The root is created (with parents) if missing.
    #[default]
    #[serde(rename = "w")]
    ReadWriteCreate,
    /// The root must exist and be writeable.
    #[serde(rename = "r+")]
    ReadWriteExisting,
}

impl FromStr for AccessMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::ReadOnly),
            "w" => Ok(Self::ReadWriteCreate),
            "r+" => Ok(Self::ReadWriteExisting),
            other => Err(StoreError::InvalidMode(other.to_owned())),
        }
    }
}

/// Store where each key is a file under a root directory.
#[derive(Debug)]
pub struct FileSystemStore {
    base_path: PathBuf,
    mode: AccessMode,
}

impl FileSystemStore {
    pub fn open<P: AsRef<Path>>(path: P, mode: AccessMode) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            match mode {
                AccessMode::ReadWriteCreate => fs::create_dir_all(path)?,
                _ => return Err(StoreError::NotFound(path.to_owned())),
            }
        }
        let base_path = path.canonicalize()?;
        let meta = fs::metadata(&base_path)?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory(base_path));
        }
        if mode == AccessMode::ReadWriteExisting && meta.permissions().readonly() {
            return Err(StoreError::RootReadOnly(base_path));
        }
        Ok(Self { base_path, mode })
    }

    pub fn root(&self) -> &Path {
        &self.base_path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    fn check_writeable(&self) -> Result<(), StoreError> {
        if self.mode == AccessMode::ReadOnly {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn get_path(&self, key: &StoreKey) -> PathBuf {
        let mut p = self.base_path.clone();
        for k in key.as_slice().iter() {
            p.push(k.as_ref());
        }
        p
    }

    fn path_to_key(&self, path: &Path) -> Option<StoreKey> {
        let rel = path.strip_prefix(&self.base_path).ok()?;
        let mut key = StoreKey::default();
        for component in rel.iter() {
            let Some(name) = component.to_str() else {
                warn!("Skipping file with non-UTF8 name {}", path.display());
                return None;
            };
            key.push(name.parse::<KeyComponent>().ok()?);
        }
        Some(key)
    }
}

impl Store for FileSystemStore {}

impl ReadableStore for FileSystemStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Bytes>, StoreError> {
        let path = self.get_path(key);
        if path.is_dir() {
            return Ok(None);
        }
        match fs::read(&path) {
            Ok(v) => Ok(Some(Bytes::from(v))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn has_key(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.get_path(key).is_file())
    }
}

impl ListableStore for FileSystemStore {
    fn list_prefix(&self, prefix: &StoreKey) -> Result<Vec<StoreKey>, StoreError> {
        let path = self.get_path(prefix);
        if !path.exists() {
            return Ok(Vec::default());
        }
        let mut out = Vec::default();
        for entry in WalkDir::new(&path).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(key) = self.path_to_key(entry.path()) {
                out.push(key);
            }
        }
        out.sort();
        Ok(out)
    }
}

impl WriteableStore for FileSystemStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StoreError> {
        self.check_writeable()?;
        let path = self.get_path(key);
        let parent = path.parent().unwrap_or(&self.base_path);
        fs::create_dir_all(parent)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(parent)?;
        tmp.write_all(&value)?;
        tmp.as_file().sync_data()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<bool, StoreError> {
        self.check_writeable()?;
        match fs::remove_file(self.get_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn erase_prefix(&self, key_prefix: &StoreKey) -> Result<bool, StoreError> {
        self.check_writeable()?;
        if key_prefix.is_root() {
            // keep the root itself
            let mut any = false;
            for entry in fs::read_dir(&self.base_path)? {
                let p = entry?.path();
                if p.is_dir() {
                    fs::remove_dir_all(&p)?;
                } else {
                    fs::remove_file(&p)?;
                }
                any = true;
            }
            return Ok(any);
        }

        let path = self.get_path(key_prefix);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
            Ok(true)
        } else if path.is_file() {
            fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
