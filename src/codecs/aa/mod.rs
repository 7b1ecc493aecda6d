use crate::{data_type::ReflectedType, ArcArrayD, GridCoord, MaybeNdim};

use super::{CodecConfigError, CodecMetadata};

mod transpose;
pub use transpose::TransposeCodec;

/// Array->array codec: rearranges a chunk without changing its element type.
pub trait AACodec {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> ArcArrayD<T>;

    fn decode<T: ReflectedType>(&self, encoded: ArcArrayD<T>) -> ArcArrayD<T>;

    fn compute_encoded_shape(&self, decoded_shape: &[u64]) -> GridCoord;
}

#[derive(Clone, PartialEq, Debug)]
pub enum AACodecType {
    Transpose(TransposeCodec),
}

crate::variant_from_data!(AACodecType, Transpose, TransposeCodec);

impl AACodecType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transpose(_) => "transpose",
        }
    }

    pub fn to_metadata(&self) -> CodecMetadata {
        let configuration = match self {
            Self::Transpose(c) => serde_json::to_value(c).ok(),
        };
        CodecMetadata::new(self.name(), configuration)
    }

    pub fn validate(&self, ndim: usize) -> Result<(), CodecConfigError> {
        match self {
            Self::Transpose(c) => c.validate_ndim(ndim),
        }
    }
}

impl AACodec for AACodecType {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> ArcArrayD<T> {
        match self {
            Self::Transpose(c) => c.encode(decoded),
        }
    }

    fn decode<T: ReflectedType>(&self, encoded: ArcArrayD<T>) -> ArcArrayD<T> {
        match self {
            Self::Transpose(c) => c.decode(encoded),
        }
    }

    fn compute_encoded_shape(&self, decoded_shape: &[u64]) -> GridCoord {
        match self {
            Self::Transpose(c) => c.compute_encoded_shape(decoded_shape),
        }
    }
}

impl MaybeNdim for AACodecType {
    fn maybe_ndim(&self) -> Option<usize> {
        match self {
            Self::Transpose(t) => t.maybe_ndim(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn transpose_metadata() {
        let aa = AACodecType::from(TransposeCodec::new(smallvec![1, 2, 0]).unwrap());
        let meta = aa.to_metadata();
        assert_eq!(meta.name, "transpose");
        assert_eq!(
            meta.configuration,
            Some(serde_json::json!({"order": [1, 2, 0]}))
        );
    }
}
