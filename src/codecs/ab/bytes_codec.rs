use serde::{Deserialize, Serialize};

use super::ABCodec;
use crate::{
    codecs::{CodecConfigError, DecodeError, EncodeError},
    data_type::{DataType, NBytes, ReflectedType},
    util::to_usize,
    ArcArrayD,
};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Big,
    Little,
}

#[cfg(target_endian = "big")]
pub const NATIVE_ENDIAN: Endian = Endian::Big;
#[cfg(target_endian = "little")]
pub const NATIVE_ENDIAN: Endian = Endian::Little;

pub const ZARR_ENDIAN: Endian = Endian::Little;

impl Default for Endian {
    fn default() -> Self {
        ZARR_ENDIAN
    }
}

/// Serialises elements in C order with a fixed byte order.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BytesCodec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endian: Option<Endian>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self {
            endian: Some(ZARR_ENDIAN),
        }
    }
}

impl BytesCodec {
    pub fn new(endian: Option<Endian>) -> Self {
        Self { endian }
    }

    pub fn new_big() -> Self {
        Self::new(Some(Endian::Big))
    }

    pub fn new_little() -> Self {
        Self::new(Some(Endian::Little))
    }

    pub fn new_native() -> Self {
        Self::new(Some(NATIVE_ENDIAN))
    }

    /// Only valid for single-byte data types.
    pub fn new_single_byte() -> Self {
        Self::new(None)
    }

    pub fn endian(&self) -> Option<Endian> {
        self.endian
    }

    pub fn validate(&self, data_type: &DataType) -> Result<(), CodecConfigError> {
        data_type
            .valid_endian(self.endian)
            .map(|_| ())
            .ok_or(CodecConfigError::UndefinedEndian(*data_type))
    }
}

impl ABCodec for BytesCodec {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> Result<Vec<u8>, EncodeError> {
        let endian = T::ZARR_TYPE
            .valid_endian(self.endian)
            .ok_or_else(|| EncodeError::Codec {
                name: "bytes".to_owned(),
                reason: format!("no endianness given for {}", T::ZARR_TYPE),
            })?;
        Ok(T::write_array(&decoded, endian))
    }

    fn decode<T: ReflectedType>(
        &self,
        encoded: &[u8],
        shape: &[u64],
    ) -> Result<ArcArrayD<T>, DecodeError> {
        let endian = T::ZARR_TYPE
            .valid_endian(self.endian)
            .ok_or_else(|| DecodeError::Codec {
                name: "bytes".to_owned(),
                reason: format!("no endianness given for {}", T::ZARR_TYPE),
            })?;
        T::read_array(encoded, endian, &to_usize(shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::IntSize;

    #[test]
    fn deser_endian() {
        let s = r#"{"endian": "big"}"#;
        let codec: BytesCodec = serde_json::from_str(s).unwrap();
        assert_eq!(codec, BytesCodec::new_big());
    }

    #[test]
    fn deser_endian_noconfig() {
        let codec: BytesCodec = serde_json::from_str("{}").unwrap();
        assert_eq!(codec.endian(), None);
    }

    #[test]
    fn endian_required_for_multibyte() {
        let codec = BytesCodec::new_single_byte();
        assert!(codec.validate(&DataType::UInt(IntSize::b8)).is_ok());
        assert!(matches!(
            codec.validate(&DataType::UInt(IntSize::b32)),
            Err(CodecConfigError::UndefinedEndian(_))
        ));
    }

    #[test]
    fn single_byte_roundtrip() {
        let codec = BytesCodec::new_single_byte();
        let arr = ArcArrayD::from_shape_vec(vec![2, 2], vec![1u8, 2, 3, 4]).unwrap();
        let bytes = codec.encode(arr.clone()).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        let back: ArcArrayD<u8> = codec.decode(&bytes, &[2, 2]).unwrap();
        assert_eq!(back, arr);
    }
}
