//! The codec pipeline applied to every chunk.
//!
//! Codecs come in three kinds, which must appear in this order:
//! any number of array->array ([aa]) codecs,
//! exactly one array->bytes ([ab]) codec,
//! and any number of bytes->bytes ([bb]) codecs.
//! Encoding applies them in declared order; decoding in exact reverse.
use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aa;
pub mod ab;
pub mod bb;
pub mod registry;

use aa::{AACodec, AACodecType};
use ab::{ABCodec, ABCodecType};
use bb::{BBCodec, BBCodecType};
pub use registry::CodecRegistry;

use crate::{
    data_type::{DataType, ReflectedType},
    util::to_usize,
    variant_from_data, ArcArrayD, DimensionMismatch, GridCoord, MaybeNdim,
};

/// Options which apply to every codec in a pipeline, as opposed to one codec's configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Check stored checksums on decode. If false, checksum codecs only strip them.
    pub validate_checksums: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            validate_checksums: true,
        }
    }
}

impl CodecOptions {
    pub fn with_validate_checksums(mut self, validate_checksums: bool) -> Self {
        self.validate_checksums = validate_checksums;
        self
    }
}

/// The decoded representation of a single chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRepr<T> {
    pub shape: GridCoord,
    pub fill_value: T,
}

impl<T: ReflectedType> ChunkRepr<T> {
    pub fn new(shape: &[u64], fill_value: T) -> Self {
        Self {
            shape: shape.iter().cloned().collect(),
            fill_value,
        }
    }

    pub fn data_type(&self) -> DataType {
        T::ZARR_TYPE
    }
}

#[derive(Error, Debug)]
pub enum CodecConfigError {
    #[error("More than one array->bytes codec found")]
    MultipleAB,
    #[error("Illegal codec order: {0} codec found after {1} codec")]
    IllegalOrder(&'static str, &'static str),
    #[error("Unknown codec `{0}`")]
    UnknownCodec(String),
    #[error("Invalid configuration for codec `{name}`: {source}")]
    Configuration {
        name: String,
        source: serde_json::Error,
    },
    #[error("Endianness must be given for multi-byte data type {0}")]
    UndefinedEndian(DataType),
    #[error("Transpose order {0:?} is not a permutation")]
    InvalidPermutation(Vec<usize>),
    #[error("Codec dimensionality is incompatible with the array: {0}")]
    DimensionMismatch(#[from] DimensionMismatch),
    #[error("Codec `{name}` cannot be used with data type {data_type}: {reason}")]
    IncompatibleDataType {
        name: String,
        data_type: DataType,
        reason: String,
    },
    #[error("Invalid gzip level {0} (must be 0-9)")]
    InvalidGzipLevel(u32),
    #[cfg(feature = "blosc")]
    #[error(transparent)]
    Blosc(#[from] bb::blosc_codec::BloscBuildError),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Decoded {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Decoded chunk has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },
    #[error("Could not shape decoded data: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Could not decompress: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("Encoded buffer of {0} bytes is too short to hold a checksum")]
    ChecksumTruncated(usize),
    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("Codec `{name}` failed to decode: {reason}")]
    Codec { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Could not compress: {0}")]
    Compress(#[from] std::io::Error),
    #[error("Codec `{name}` failed to encode: {reason}")]
    Codec { name: String, reason: String },
}

/// Codec entry as it appears in array metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CodecMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

impl CodecMetadata {
    pub fn new(name: &str, configuration: Option<serde_json::Value>) -> Self {
        Self {
            name: name.to_owned(),
            configuration,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CodecType {
    AA(AACodecType),
    AB(ABCodecType),
    BB(BBCodecType),
}

variant_from_data!(CodecType, AA, AACodecType);
variant_from_data!(CodecType, AB, ABCodecType);
variant_from_data!(CodecType, BB, BBCodecType);

impl CodecType {
    pub fn to_metadata(&self) -> CodecMetadata {
        match self {
            Self::AA(c) => c.to_metadata(),
            Self::AB(c) => c.to_metadata(),
            Self::BB(c) => CodecMetadata::new(c.name(), c.configuration()),
        }
    }
}

/// An immutable, validated sequence of codecs.
#[derive(Debug, Clone, Default)]
pub struct CodecChain {
    aa_codecs: Vec<AACodecType>,
    ab_codec: ABCodecType,
    bb_codecs: Vec<BBCodecType>,
}

impl CodecChain {
    pub fn new(
        aa_codecs: Vec<AACodecType>,
        ab_codec: Option<ABCodecType>,
        bb_codecs: Vec<BBCodecType>,
    ) -> Self {
        Self {
            aa_codecs,
            ab_codec: ab_codec.unwrap_or_default(),
            bb_codecs,
        }
    }

    /// Build a chain from codecs in declared order, checking that kinds are correctly ordered.
    ///
    /// A missing array->bytes codec is replaced by the default little-endian `bytes` codec.
    pub fn from_codecs<I: IntoIterator<Item = CodecType>>(iter: I) -> Result<Self, CodecConfigError> {
        let mut aa_codecs = Vec::default();
        let mut ab_codec = None;
        let mut bb_codecs = Vec::default();

        for ce in iter {
            match ce {
                CodecType::AA(c) => {
                    if ab_codec.is_some() {
                        return Err(CodecConfigError::IllegalOrder("AA", "AB"));
                    }
                    if !bb_codecs.is_empty() {
                        return Err(CodecConfigError::IllegalOrder("AA", "BB"));
                    }
                    aa_codecs.push(c);
                }
                CodecType::AB(c) => {
                    if ab_codec.is_some() {
                        return Err(CodecConfigError::MultipleAB);
                    }
                    if !bb_codecs.is_empty() {
                        return Err(CodecConfigError::IllegalOrder("AB", "BB"));
                    }
                    ab_codec = Some(c);
                }
                CodecType::BB(c) => bb_codecs.push(c),
            }
        }

        Ok(Self::new(aa_codecs, ab_codec, bb_codecs))
    }

    pub fn aa_codecs_mut(&mut self) -> &mut Vec<AACodecType> {
        &mut self.aa_codecs
    }

    pub fn bb_codecs_mut(&mut self) -> &mut Vec<BBCodecType> {
        &mut self.bb_codecs
    }

    /// Returns the replaced codec.
    pub fn replace_ab_codec(&mut self, ab_codec: Option<ABCodecType>) -> ABCodecType {
        std::mem::replace(&mut self.ab_codec, ab_codec.unwrap_or_default())
    }

    pub fn to_metadata(&self) -> Vec<CodecMetadata> {
        self.aa_codecs
            .iter()
            .map(|c| c.to_metadata())
            .chain(std::iter::once(self.ab_codec.to_metadata()))
            .chain(
                self.bb_codecs
                    .iter()
                    .map(|c| CodecMetadata::new(c.name(), c.configuration())),
            )
            .collect()
    }

    /// Fill in any configuration which depends on the array's data type.
    pub fn bind(&mut self, data_type: &DataType) {
        for c in self.bb_codecs.iter_mut() {
            c.bind(data_type);
        }
    }

    /// Check that every codec can operate on chunks of the given type and dimensionality.
    pub fn validate(&self, data_type: &DataType, ndim: usize) -> Result<(), CodecConfigError> {
        for c in self.aa_codecs.iter() {
            c.validate(ndim)?;
        }
        self.ab_codec.validate(data_type)?;
        for c in self.bb_codecs.iter() {
            c.validate(data_type)?;
        }
        Ok(())
    }

    fn encoded_shape(&self, decoded_shape: &[u64]) -> GridCoord {
        let mut shape: GridCoord = decoded_shape.iter().cloned().collect();
        for c in self.aa_codecs.iter() {
            shape = c.compute_encoded_shape(&shape);
        }
        shape
    }

    pub fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> Result<Vec<u8>, EncodeError> {
        let mut arr = decoded;
        for c in self.aa_codecs.iter() {
            arr = c.encode(arr);
        }
        let mut bytes = self.ab_codec.encode(arr)?;
        for c in self.bb_codecs.iter() {
            bytes = c.encode(&bytes)?;
        }
        Ok(bytes)
    }

    /// Decode a stored buffer, which must decode to exactly the chunk's representation.
    pub fn decode<T: ReflectedType>(
        &self,
        encoded: &[u8],
        repr: &ChunkRepr<T>,
        options: &CodecOptions,
    ) -> Result<ArcArrayD<T>, DecodeError> {
        let mut bytes = Cow::Borrowed(encoded);
        for c in self.bb_codecs.iter().rev() {
            bytes = Cow::Owned(c.decode(&bytes, options)?);
        }
        let encoded_shape = self.encoded_shape(&repr.shape);
        let mut arr: ArcArrayD<T> = self.ab_codec.decode(&bytes, &encoded_shape)?;
        for c in self.aa_codecs.iter().rev() {
            arr = c.decode(arr);
        }
        let expected = to_usize(&repr.shape);
        if arr.shape() != expected.as_slice() {
            return Err(DecodeError::ShapeMismatch {
                expected,
                actual: arr.shape().to_vec(),
            });
        }
        Ok(arr)
    }
}

impl MaybeNdim for CodecChain {
    fn maybe_ndim(&self) -> Option<usize> {
        self.aa_codecs.iter().find_map(|c| c.maybe_ndim())
    }
}
