use crate::{
    data_type::{DataType, ReflectedType},
    variant_from_data, ArcArrayD, MaybeNdim,
};

pub mod bytes_codec;
use bytes_codec::BytesCodec;

use super::{CodecConfigError, CodecMetadata, DecodeError, EncodeError};

/// Array->bytes codec: the single step where a chunk becomes a byte buffer.
pub trait ABCodec {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> Result<Vec<u8>, EncodeError>;

    /// `shape` is the shape of the array this codec produced when encoding.
    fn decode<T: ReflectedType>(
        &self,
        encoded: &[u8],
        shape: &[u64],
    ) -> Result<ArcArrayD<T>, DecodeError>;
}

#[derive(Clone, PartialEq, Debug)]
pub enum ABCodecType {
    Bytes(BytesCodec),
}

variant_from_data!(ABCodecType, Bytes, BytesCodec);

impl ABCodecType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
        }
    }

    pub fn to_metadata(&self) -> CodecMetadata {
        let configuration = match self {
            Self::Bytes(c) => serde_json::to_value(c).ok(),
        };
        CodecMetadata::new(self.name(), configuration)
    }

    pub fn validate(&self, data_type: &DataType) -> Result<(), CodecConfigError> {
        match self {
            Self::Bytes(c) => c.validate(data_type),
        }
    }
}

impl ABCodec for ABCodecType {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::Bytes(c) => c.encode(decoded),
        }
    }

    fn decode<T: ReflectedType>(
        &self,
        encoded: &[u8],
        shape: &[u64],
    ) -> Result<ArcArrayD<T>, DecodeError> {
        match self {
            Self::Bytes(c) => c.decode(encoded, shape),
        }
    }
}

impl MaybeNdim for ABCodecType {
    fn maybe_ndim(&self) -> Option<usize> {
        None
    }
}

impl Default for ABCodecType {
    fn default() -> Self {
        Self::Bytes(BytesCodec::default())
    }
}
