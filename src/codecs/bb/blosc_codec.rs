use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::{
    codecs::{bb::BBCodec, CodecConfigError, CodecOptions, DecodeError, EncodeError},
    data_type::{DataType, NBytes, ReflectedType},
};
use blosc::{decompress_bytes, Context};
pub use blosc::{Clevel, Compressor, ShuffleMode};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct BloscCodec {
    #[serde(with = "cname")]
    pub cname: Compressor,
    #[serde(with = "clevel")]
    pub clevel: Clevel,
    #[serde(with = "shuffle")]
    pub shuffle: ShuffleMode,
    /// 0 lets blosc choose.
    #[serde(default)]
    pub blocksize: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typesize: Option<usize>,
}

const CNAMES: [(&str, Compressor); 6] = [
    ("blosclz", Compressor::BloscLZ),
    ("lz4", Compressor::LZ4),
    ("lz4hc", Compressor::LZ4HC),
    ("snappy", Compressor::Snappy),
    ("zlib", Compressor::Zlib),
    ("zstd", Compressor::Zstd),
];

const SHUFFLES: [(&str, ShuffleMode); 3] = [
    ("noshuffle", ShuffleMode::None),
    ("shuffle", ShuffleMode::Byte),
    ("bitshuffle", ShuffleMode::Bit),
];

const CLEVELS: [Clevel; 10] = [
    Clevel::None,
    Clevel::L1,
    Clevel::L2,
    Clevel::L3,
    Clevel::L4,
    Clevel::L5,
    Clevel::L6,
    Clevel::L7,
    Clevel::L8,
    Clevel::L9,
];

/// Serde helpers for the blosc enums, which are named differently in metadata.
macro_rules! named_enum_serde {
    ($module:ident, $ty:ty, $table:ident, $what:literal) => {
        mod $module {
            use super::*;

            pub fn serialize<S: Serializer>(value: &$ty, serializer: S) -> Result<S::Ok, S::Error> {
                let name = $table
                    .iter()
                    .find(|(_, v)| v == value)
                    .map(|(n, _)| *n)
                    .ok_or_else(|| {
                        serde::ser::Error::custom(format!("No name for blosc {} {value:?}", $what))
                    })?;
                serializer.serialize_str(name)
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$ty, D::Error> {
                let s = String::deserialize(deserializer)?;
                $table
                    .iter()
                    .find(|(n, _)| *n == s)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("Unknown blosc {} `{s}`", $what))
                    })
            }
        }
    };
}

named_enum_serde!(cname, Compressor, CNAMES, "cname");
named_enum_serde!(shuffle, ShuffleMode, SHUFFLES, "shuffle");

mod clevel {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Clevel, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*value as i32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Clevel, D::Error> {
        let level = u8::deserialize(deserializer)?;
        CLEVELS.get(level as usize).copied().ok_or_else(|| {
            serde::de::Error::custom(format!("Blosc clevel {level} is not in 0-9"))
        })
    }
}

#[derive(Error, Debug)]
pub enum BloscBuildError {
    #[error("`typesize` must not be None if blosc codec shuffling is active (here `{0:?}`)")]
    TypesizeNeeded(ShuffleMode),
    #[error("Compressor not available in blosc: `{0:?}`")]
    UnavailableCompressor(Compressor),
}

impl BloscBuildError {
    fn check_compressor(cname: &Compressor) -> Result<(), Self> {
        if Context::new().compressor(*cname).is_err() {
            Err(Self::UnavailableCompressor(*cname))
        } else {
            Ok(())
        }
    }

    fn check_typesize(shuffle: &ShuffleMode, typesize: &Option<usize>) -> Result<(), Self> {
        if typesize.is_none() && *shuffle != ShuffleMode::None {
            Err(Self::TypesizeNeeded(*shuffle))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<&BloscCodec> for Context {
    type Error = BloscBuildError;

    fn try_from(codec: &BloscCodec) -> Result<Self, Self::Error> {
        BloscBuildError::check_typesize(&codec.shuffle, &codec.typesize)?;
        let ctx = Context::new()
            .compressor(codec.cname)
            .map_err(|_| BloscBuildError::UnavailableCompressor(codec.cname))?
            .clevel(codec.clevel)
            .shuffle(codec.shuffle)
            .blocksize(if codec.blocksize == 0 {
                None
            } else {
                Some(codec.blocksize)
            })
            .typesize(codec.typesize);
        Ok(ctx)
    }
}

impl BloscCodec {
    pub fn new(
        cname: Compressor,
        clevel: Clevel,
        shuffle: ShuffleMode,
        blocksize: usize,
        typesize: Option<usize>,
    ) -> Result<Self, BloscBuildError> {
        let codec = Self {
            cname,
            clevel,
            shuffle,
            blocksize,
            typesize,
        };
        codec.check()?;
        Ok(codec)
    }

    pub fn for_type<T: ReflectedType>(
        cname: Compressor,
        clevel: Clevel,
        shuffle: ShuffleMode,
        blocksize: usize,
    ) -> Result<Self, BloscBuildError> {
        Self::new(
            cname,
            clevel,
            shuffle,
            blocksize,
            Some(T::ZARR_TYPE.nbytes()),
        )
    }

    fn check(&self) -> Result<(), BloscBuildError> {
        BloscBuildError::check_compressor(&self.cname)?;
        BloscBuildError::check_typesize(&self.shuffle, &self.typesize)
    }

    pub(crate) fn bind(&mut self, data_type: &DataType) {
        if self.typesize.is_none() {
            self.typesize = Some(data_type.nbytes());
        }
    }
}

impl Default for BloscCodec {
    fn default() -> Self {
        Self {
            cname: Compressor::BloscLZ,
            clevel: Clevel::L5,
            shuffle: ShuffleMode::None,
            blocksize: 0,
            typesize: None,
        }
    }
}

impl BBCodec for BloscCodec {
    fn name(&self) -> &str {
        "blosc"
    }

    fn configuration(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let ctx = Context::try_from(self).map_err(|e| EncodeError::Codec {
            name: "blosc".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(ctx.compress(decoded).into())
    }

    fn decode(&self, encoded: &[u8], _options: &CodecOptions) -> Result<Vec<u8>, DecodeError> {
        // decoding bytes into bytes, so no element type can be violated
        unsafe { decompress_bytes(encoded) }.map_err(|_| DecodeError::Codec {
            name: "blosc".to_owned(),
            reason: "blosc decompression failed".to_owned(),
        })
    }

    fn validate(&self, _data_type: &DataType) -> Result<(), CodecConfigError> {
        Ok(self.check()?)
    }
}
