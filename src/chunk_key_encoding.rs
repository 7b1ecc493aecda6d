//! Mapping from chunk grid coordinates to store keys below an array.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::store::{StoreKey, KEY_SEP};
use crate::CoordVec;

#[enum_delegate::register]
pub trait ChunkKeyEncoder {
    /// The key components the chunk adds below its array's key.
    fn components(&self, coord: &[u64]) -> CoordVec<String>;

    fn encode(&self, coord: &[u64]) -> String {
        self.components(coord).join(KEY_SEP)
    }

    fn chunk_key(&self, array: &StoreKey, coord: &[u64]) -> StoreKey {
        let mut key = array.clone();
        for c in self.components(coord) {
            key.push_unchecked(&c);
        }
        key
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    #[serde(rename = "/")]
    Slash,
    #[serde(rename = ".")]
    Dot,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slash => "/",
            Self::Dot => ".",
        }
    }

    /// `/` produces one key component per part; `.` joins them into one.
    fn split_parts<I: Iterator<Item = String>>(&self, parts: I) -> CoordVec<String> {
        match self {
            Self::Slash => parts.collect(),
            Self::Dot => smallvec![parts.collect::<Vec<_>>().join(self.as_str())],
        }
    }
}

impl Display for Separator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn slash() -> Separator {
    Separator::Slash
}

fn dot() -> Separator {
    Separator::Dot
}

/// `c/0/1` (or `c.0.1`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DefaultChunkKeyEncoding {
    #[serde(default = "slash")]
    separator: Separator,
}

impl DefaultChunkKeyEncoding {
    pub fn new(separator: Separator) -> Self {
        Self { separator }
    }
}

impl ChunkKeyEncoder for DefaultChunkKeyEncoding {
    fn components(&self, coord: &[u64]) -> CoordVec<String> {
        let parts = std::iter::once("c".to_owned()).chain(coord.iter().map(u64::to_string));
        self.separator.split_parts(parts)
    }
}

impl Default for DefaultChunkKeyEncoding {
    fn default() -> Self {
        Self::new(slash())
    }
}

/// Zarr v2-compatible: `0.1` (or `0/1`), with no prefix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct V2ChunkKeyEncoding {
    #[serde(default = "dot")]
    separator: Separator,
}

impl V2ChunkKeyEncoding {
    pub fn new(separator: Separator) -> Self {
        Self { separator }
    }
}

impl ChunkKeyEncoder for V2ChunkKeyEncoding {
    fn components(&self, coord: &[u64]) -> CoordVec<String> {
        if coord.is_empty() {
            return smallvec!["0".to_owned()];
        }
        self.separator
            .split_parts(coord.iter().map(u64::to_string))
    }
}

impl Default for V2ChunkKeyEncoding {
    fn default() -> Self {
        Self::new(dot())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "name", content = "configuration", rename_all = "lowercase")]
#[enum_delegate::implement(ChunkKeyEncoder)]
pub enum ChunkKeyEncoding {
    Default(DefaultChunkKeyEncoding),
    V2(V2ChunkKeyEncoding),
}

impl Default for ChunkKeyEncoding {
    fn default() -> Self {
        Self::Default(DefaultChunkKeyEncoding::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_forms() {
        for s in [
            r#"{"name":"default","configuration":{"separator":"/"}}"#,
            r#"{"name":"default","configuration":{"separator":"."}}"#,
            r#"{"name":"v2","configuration":{"separator":"/"}}"#,
            r#"{"name":"v2","configuration":{"separator":"."}}"#,
        ] {
            let c: ChunkKeyEncoding = serde_json::from_str(s).unwrap();
            assert_eq!(serde_json::to_string(&c).unwrap(), s);
        }

        let c: ChunkKeyEncoding =
            serde_json::from_str(r#"{"name":"default","configuration":{}}"#).unwrap();
        assert_eq!(c, ChunkKeyEncoding::default());
        let c: ChunkKeyEncoding =
            serde_json::from_str(r#"{"name":"v2","configuration":{}}"#).unwrap();
        assert_eq!(c, V2ChunkKeyEncoding::new(Separator::Dot).into());
    }

    #[test]
    fn default_encoding() {
        let cke = ChunkKeyEncoding::default();
        assert_eq!(&cke.encode(&[1, 2, 3]), "c/1/2/3");
        assert_eq!(cke.components(&[1, 2]).len(), 3);

        let dotted: ChunkKeyEncoding = DefaultChunkKeyEncoding::new(Separator::Dot).into();
        assert_eq!(&dotted.encode(&[1, 2, 3]), "c.1.2.3");
        assert_eq!(dotted.components(&[1, 2]).len(), 1);
    }

    #[test]
    fn v2_encoding() {
        let cke: ChunkKeyEncoding = V2ChunkKeyEncoding::default().into();
        assert_eq!(&cke.encode(&[1, 2, 3]), "1.2.3");
        assert_eq!(&cke.encode(&[]), "0");
        let slashed: ChunkKeyEncoding = V2ChunkKeyEncoding::new(Separator::Slash).into();
        assert_eq!(&slashed.encode(&[4, 5]), "4/5");
    }

    #[test]
    fn chunk_key_below_array() {
        let array: StoreKey = "group/arr".parse().unwrap();
        let key = ChunkKeyEncoding::default().chunk_key(&array, &[0, 1]);
        assert_eq!(key.to_string(), "group/arr/c/0/1");
        assert!(key.starts_with(&array));
    }
}
