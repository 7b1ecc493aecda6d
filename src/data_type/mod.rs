use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::{
    codecs::{ab::bytes_codec::Endian, DecodeError},
    ArcArrayD,
};

mod float;
mod int;
pub use float::FloatSize;
pub use int::IntSize;

pub trait NBytes {
    /// Number of bytes in the data type
    fn nbytes(&self) -> usize;

    /// Number of bits in the data type
    fn nbits(&self) -> usize {
        self.nbytes() * 8
    }

    /// Whether the data type should have an endianness.
    fn has_endianness(&self) -> bool {
        self.nbytes() > 1
    }

    /// A valid endianness for this data type.
    ///
    /// Uses the given endianness if [Some], or a meaningless default if the data type
    /// does not require one (i.e. single-byte) and [None] is given.
    /// [None] if an endianness is needed but not given.
    fn valid_endian(&self, endian: Option<Endian>) -> Option<Endian> {
        match endian {
            Some(e) => Some(e),
            None if self.has_endianness() => None,
            None => Some(Endian::default()),
        }
    }
}

#[derive(Error, Debug)]
#[error("Unknown data type `{0}`")]
pub struct UnknownDataType(String);

#[derive(Error, Debug)]
#[error("Fill value {value} is not valid for data type {data_type}")]
pub struct FillValueError {
    value: Value,
    data_type: DataType,
}

impl FillValueError {
    pub fn new(value: &Value, data_type: DataType) -> Self {
        Self {
            value: value.clone(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int(IntSize),
    UInt(IntSize),
    Float(FloatSize),
}

impl DataType {
    pub fn default_fill_value(&self) -> Value {
        match self {
            DataType::Bool => Value::from(false),
            DataType::Int(_) | DataType::UInt(_) => Value::from(0),
            DataType::Float(_) => Value::from(0.0),
        }
    }

    /// Check that a JSON fill value can be represented in this data type.
    pub fn validate_fill_value(&self, value: &Value) -> Result<(), FillValueError> {
        match self {
            DataType::Bool => bool::from_json_fill_value(value).map(|_| ()),
            DataType::Int(s) => match s {
                IntSize::b8 => i8::from_json_fill_value(value).map(|_| ()),
                IntSize::b16 => i16::from_json_fill_value(value).map(|_| ()),
                IntSize::b32 => i32::from_json_fill_value(value).map(|_| ()),
                IntSize::b64 => i64::from_json_fill_value(value).map(|_| ()),
            },
            DataType::UInt(s) => match s {
                IntSize::b8 => u8::from_json_fill_value(value).map(|_| ()),
                IntSize::b16 => u16::from_json_fill_value(value).map(|_| ()),
                IntSize::b32 => u32::from_json_fill_value(value).map(|_| ()),
                IntSize::b64 => u64::from_json_fill_value(value).map(|_| ()),
            },
            DataType::Float(s) => match s {
                FloatSize::b16 => half::f16::from_json_fill_value(value).map(|_| ()),
                FloatSize::b32 => f32::from_json_fill_value(value).map(|_| ()),
                FloatSize::b64 => f64::from_json_fill_value(value).map(|_| ()),
            },
        }
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

impl NBytes for DataType {
    fn nbytes(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int(s) | Self::UInt(s) => s.nbytes(),
            Self::Float(s) => s.nbytes(),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nbits = self.nbits();
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int(_) => write!(f, "int{nbits}"),
            Self::UInt(_) => write!(f, "uint{nbits}"),
            Self::Float(_) => write!(f, "float{nbits}"),
        }
    }
}

fn split_str_num(s: &str) -> (&str, Option<usize>) {
    match s.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => (&s[0..idx], s[idx..].parse().ok()),
        None => (s, None),
    }
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownDataType(s.to_owned());
        match split_str_num(s) {
            ("bool", None) => Ok(Self::Bool),
            ("int", Some(n)) => Ok(Self::Int(n.try_into().map_err(|_| unknown())?)),
            ("uint", Some(n)) => Ok(Self::UInt(n.try_into().map_err(|_| unknown())?)),
            ("float", Some(n)) => Ok(Self::Float(n.try_into().map_err(|_| unknown())?)),
            _ => Err(unknown()),
        }
    }
}

/// Trait implemented by primitive types that are reflected in Zarr.
///
/// The supertraits are not necessary for this trait, but are used to
/// remove redundant bounds elsewhere when operating generically over
/// data types.
pub trait ReflectedType:
    Send + Sync + Clone + Copy + Default + PartialEq + Debug + 'static + Sized
{
    const ZARR_TYPE: DataType;

    /// Write this value into the start of `buf`, which is at least as long as the type.
    fn write_element(self, buf: &mut [u8], endian: Endian);

    /// Read a value from the start of `buf`, which is at least as long as the type.
    fn read_element(buf: &[u8], endian: Endian) -> Self;

    fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError>;

    fn to_json_fill_value(&self) -> Value;

    /// Serialise every element in logical (C) order.
    fn write_array(array: &ArcArrayD<Self>, endian: Endian) -> Vec<u8> {
        let nbytes = Self::ZARR_TYPE.nbytes();
        let mut buf = vec![0u8; array.len() * nbytes];
        for (val, out) in array.iter().zip(buf.chunks_exact_mut(nbytes)) {
            val.write_element(out, endian);
        }
        buf
    }

    /// Deserialise a C-ordered array of the given shape.
    ///
    /// Fails if the buffer length does not match the shape exactly.
    fn read_array(bytes: &[u8], endian: Endian, shape: &[usize]) -> Result<ArcArrayD<Self>, DecodeError> {
        let nbytes = Self::ZARR_TYPE.nbytes();
        let numel: usize = shape.iter().product();
        if bytes.len() != numel * nbytes {
            return Err(DecodeError::LengthMismatch {
                expected: numel * nbytes,
                actual: bytes.len(),
            });
        }
        let data: Vec<Self> = bytes
            .chunks_exact(nbytes)
            .map(|b| Self::read_element(b, endian))
            .collect();
        ArcArrayD::from_shape_vec(shape.to_vec(), data).map_err(DecodeError::Shape)
    }
}

impl ReflectedType for bool {
    const ZARR_TYPE: DataType = DataType::Bool;

    fn write_element(self, buf: &mut [u8], _endian: Endian) {
        buf[0] = u8::from(self);
    }

    fn read_element(buf: &[u8], _endian: Endian) -> Self {
        buf[0] != 0
    }

    fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError> {
        value
            .as_bool()
            .ok_or_else(|| FillValueError::new(value, Self::ZARR_TYPE))
    }

    fn to_json_fill_value(&self) -> Value {
        Value::from(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_dtypes() {
        use DataType::*;
        let strs = vec![
            (r#""bool""#, Bool),
            (r#""int8""#, Int(IntSize::b8)),
            (r#""int16""#, Int(IntSize::b16)),
            (r#""int32""#, Int(IntSize::b32)),
            (r#""int64""#, Int(IntSize::b64)),
            (r#""uint8""#, UInt(IntSize::b8)),
            (r#""uint16""#, UInt(IntSize::b16)),
            (r#""uint32""#, UInt(IntSize::b32)),
            (r#""uint64""#, UInt(IntSize::b64)),
            (r#""float16""#, Float(FloatSize::b16)),
            (r#""float32""#, Float(FloatSize::b32)),
            (r#""float64""#, Float(FloatSize::b64)),
        ];
        for (s, expected) in strs {
            let dt: DataType =
                serde_json::from_str(s).unwrap_or_else(|_| panic!("Couldn't parse '{}'", s));
            assert_eq!(dt, expected, "Got {:?}, expected {:?}", dt, expected);

            let s2 = serde_json::to_string(&dt).unwrap();
            assert_eq!(s, s2);
        }
    }

    #[test]
    fn unknown_dtypes() {
        for s in ["int7", "complex64", "r8", "uint", "boolean"] {
            assert!(s.parse::<DataType>().is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn validate_fill_values() {
        let u8_type = DataType::UInt(IntSize::b8);
        assert!(u8_type.validate_fill_value(&Value::from(255)).is_ok());
        assert!(u8_type.validate_fill_value(&Value::from(256)).is_err());
        assert!(u8_type.validate_fill_value(&Value::from(-1)).is_err());
        assert!(DataType::Bool
            .validate_fill_value(&Value::from(true))
            .is_ok());
        assert!(DataType::Float(FloatSize::b64)
            .validate_fill_value(&Value::from("NaN"))
            .is_ok());
        assert!(DataType::Float(FloatSize::b64)
            .validate_fill_value(&Value::from("nope"))
            .is_err());
    }

    #[test]
    fn array_bytes_endian() {
        let arr = ArcArrayD::from_shape_vec(vec![2], vec![1u16, 0x0203]).unwrap();
        assert_eq!(u16::write_array(&arr, Endian::Little), vec![1, 0, 3, 2]);
        assert_eq!(u16::write_array(&arr, Endian::Big), vec![0, 1, 2, 3]);

        let back = u16::read_array(&[0, 1, 2, 3], Endian::Big, &[2]).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn read_array_wrong_length() {
        let res = u16::read_array(&[0, 1, 2], Endian::Little, &[2]);
        assert!(matches!(
            res,
            Err(DecodeError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
