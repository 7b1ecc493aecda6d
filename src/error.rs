//! Errors surfaced by array operations.
use thiserror::Error;

use crate::{
    codecs::{CodecConfigError, DecodeError, EncodeError},
    data_type::{DataType, FillValueError},
    selection::IndexError,
    store::{InvalidKeyComponent, StoreError, StoreKey},
    DimensionMismatch, GridCoord,
};

#[derive(Error, Debug)]
pub enum InvalidMetadata {
    #[error("Unsupported zarr_format {0}")]
    ZarrFormat(usize),
    #[error("Node type `{0}` is not an array")]
    NodeType(String),
    #[error("Array must have at least one dimension")]
    ZeroRank,
    #[error("Array shape {0:?} has a zero-length dimension")]
    EmptyDimension(GridCoord),
    #[error("Chunk grid does not match array rank: {0}")]
    ChunkRank(DimensionMismatch),
    #[error("Chunk shape has a zero-length dimension")]
    EmptyChunkDimension,
    #[error("Dimension names do not match array rank: {0}")]
    DimensionNames(DimensionMismatch),
    #[error(transparent)]
    FillValue(#[from] FillValueError),
    #[error("Could not parse array metadata: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("Invalid array metadata: {0}")]
    InvalidMetadata(#[from] InvalidMetadata),
    #[error(transparent)]
    OutOfBounds(#[from] IndexError),
    #[error(transparent)]
    CodecConfig(#[from] CodecConfigError),
    #[error("Could not decode chunk {chunk:?} of array `{array}`: {source}")]
    Decode {
        array: StoreKey,
        chunk: GridCoord,
        source: DecodeError,
    },
    #[error("Could not encode chunk {chunk:?} of array `{array}`: {source}")]
    Encode {
        array: StoreKey,
        chunk: GridCoord,
        source: EncodeError,
    },
    #[error("Store failed for array `{array}` (chunk {chunk:?}): {source}")]
    Store {
        array: StoreKey,
        chunk: Option<GridCoord>,
        source: StoreError,
    },
    #[error("Data has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Array has data type {actual}, accessed as {expected}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
    },
    #[error("A node already exists at `{0}`")]
    AlreadyExists(StoreKey),
    #[error("No array metadata at `{0}`")]
    NotFound(StoreKey),
    #[error("Invalid array key: {0}")]
    InvalidKey(#[from] InvalidKeyComponent),
}

impl ArrayError {
    pub(crate) fn store(array: &StoreKey, chunk: Option<&[u64]>, source: StoreError) -> Self {
        Self::Store {
            array: array.clone(),
            chunk: chunk.map(|c| c.iter().cloned().collect()),
            source,
        }
    }

    pub(crate) fn decode(array: &StoreKey, chunk: &[u64], source: DecodeError) -> Self {
        Self::Decode {
            array: array.clone(),
            chunk: chunk.iter().cloned().collect(),
            source,
        }
    }

    pub(crate) fn encode(array: &StoreKey, chunk: &[u64], source: EncodeError) -> Self {
        Self::Encode {
            array: array.clone(),
            chunk: chunk.iter().cloned().collect(),
            source,
        }
    }

    /// The chunk coordinate the failure occurred at, if it was chunk-specific.
    pub fn chunk(&self) -> Option<&[u64]> {
        match self {
            Self::Decode { chunk, .. } | Self::Encode { chunk, .. } => Some(chunk.as_slice()),
            Self::Store { chunk, .. } => chunk.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_in_message() {
        let array: StoreKey = "data/raw".parse().unwrap();
        let err = ArrayError::decode(
            &array,
            &[1, 0],
            DecodeError::LengthMismatch {
                expected: 4,
                actual: 3,
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("data/raw"), "{msg}");
        assert!(msg.contains("[1, 0]"), "{msg}");
        assert_eq!(err.chunk(), Some(&[1u64, 0][..]));

        let err = ArrayError::store(&array, None, StoreError::ReadOnly);
        assert_eq!(err.chunk(), None);
    }
}
