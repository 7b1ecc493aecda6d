use std::{fmt::Debug, sync::Arc};

use serde_json::Value;

use crate::{data_type::DataType, variant_from_data, MaybeNdim};

use super::{CodecConfigError, CodecOptions, DecodeError, EncodeError};

#[cfg(feature = "blosc")]
pub mod blosc_codec;
pub mod crc32c_codec;
#[cfg(feature = "gzip")]
pub mod gzip_codec;

/// Bytes->bytes codec, e.g. a compressor or checksum.
///
/// Object-safe so that callers can register their own codecs.
pub trait BBCodec: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// The `configuration` member written to array metadata.
    fn configuration(&self) -> Option<Value>;

    fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError>;

    fn decode(&self, encoded: &[u8], options: &CodecOptions) -> Result<Vec<u8>, DecodeError>;

    fn validate(&self, _data_type: &DataType) -> Result<(), CodecConfigError> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum BBCodecType {
    #[cfg(feature = "gzip")]
    Gzip(gzip_codec::GzipCodec),
    Crc32c(crc32c_codec::Crc32cCodec),
    #[cfg(feature = "blosc")]
    Blosc(blosc_codec::BloscCodec),
    Custom(Arc<dyn BBCodec>),
}

impl BBCodecType {
    pub fn custom<C: BBCodec + 'static>(codec: C) -> Self {
        Self::Custom(Arc::new(codec))
    }

    fn inner(&self) -> &dyn BBCodec {
        match self {
            #[cfg(feature = "gzip")]
            Self::Gzip(c) => c,
            Self::Crc32c(c) => c,
            #[cfg(feature = "blosc")]
            Self::Blosc(c) => c,
            Self::Custom(c) => c.as_ref(),
        }
    }

    /// Fill in configuration which depends on the array's data type.
    #[cfg_attr(not(feature = "blosc"), allow(unused_variables))]
    pub(crate) fn bind(&mut self, data_type: &DataType) {
        #[cfg(feature = "blosc")]
        if let Self::Blosc(c) = self {
            c.bind(data_type);
        }
    }
}

impl BBCodec for BBCodecType {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn configuration(&self) -> Option<Value> {
        self.inner().configuration()
    }

    fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError> {
        self.inner().encode(decoded)
    }

    fn decode(&self, encoded: &[u8], options: &CodecOptions) -> Result<Vec<u8>, DecodeError> {
        self.inner().decode(encoded, options)
    }

    fn validate(&self, data_type: &DataType) -> Result<(), CodecConfigError> {
        self.inner().validate(data_type)
    }
}

impl MaybeNdim for BBCodecType {
    fn maybe_ndim(&self) -> Option<usize> {
        None
    }
}

#[cfg(feature = "gzip")]
variant_from_data!(BBCodecType, Gzip, gzip_codec::GzipCodec);

variant_from_data!(BBCodecType, Crc32c, crc32c_codec::Crc32cCodec);

#[cfg(feature = "blosc")]
variant_from_data!(BBCodecType, Blosc, blosc_codec::BloscCodec);
