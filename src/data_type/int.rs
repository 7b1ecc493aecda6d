use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codecs::ab::bytes_codec::Endian;

use super::{DataType, FillValueError, NBytes, ReflectedType};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum IntSize {
    b8,
    b16,
    b32,
    b64,
}

impl TryFrom<usize> for IntSize {
    type Error = &'static str;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(Self::b8),
            16 => Ok(Self::b16),
            32 => Ok(Self::b32),
            64 => Ok(Self::b64),
            _ => Err("not a valid integer size"),
        }
    }
}

impl Display for IntSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nbits())
    }
}

impl NBytes for IntSize {
    fn nbytes(&self) -> usize {
        match self {
            Self::b8 => 1,
            Self::b16 => 2,
            Self::b32 => 4,
            Self::b64 => 8,
        }
    }
}

fn int_fill_value<T>(value: &Value, data_type: DataType) -> Result<T, FillValueError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let parsed = match (value.as_i64(), value.as_u64()) {
        (_, Some(u)) => T::try_from(u).ok(),
        (Some(i), None) => T::try_from(i).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FillValueError::new(value, data_type))
}

impl ReflectedType for u8 {
    const ZARR_TYPE: DataType = DataType::UInt(IntSize::b8);

    fn write_element(self, buf: &mut [u8], _endian: Endian) {
        buf[0] = self;
    }

    fn read_element(buf: &[u8], _endian: Endian) -> Self {
        buf[0]
    }

    fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError> {
        int_fill_value(value, Self::ZARR_TYPE)
    }

    fn to_json_fill_value(&self) -> Value {
        Value::from(*self)
    }
}

impl ReflectedType for i8 {
    const ZARR_TYPE: DataType = DataType::Int(IntSize::b8);

    fn write_element(self, buf: &mut [u8], _endian: Endian) {
        buf[0] = self.to_le_bytes()[0];
    }

    fn read_element(buf: &[u8], _endian: Endian) -> Self {
        Self::from_le_bytes([buf[0]])
    }

    fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError> {
        int_fill_value(value, Self::ZARR_TYPE)
    }

    fn to_json_fill_value(&self) -> Value {
        Value::from(*self)
    }
}

macro_rules! reflected_int {
    ($d_name:expr, $d_type:ty, $bo_read_fn:ident, $bo_write_fn:ident) => {
        impl ReflectedType for $d_type {
            const ZARR_TYPE: DataType = $d_name;

            fn write_element(self, buf: &mut [u8], endian: Endian) {
                match endian {
                    Endian::Big => BigEndian::$bo_write_fn(buf, self),
                    Endian::Little => LittleEndian::$bo_write_fn(buf, self),
                }
            }

            fn read_element(buf: &[u8], endian: Endian) -> Self {
                match endian {
                    Endian::Big => BigEndian::$bo_read_fn(buf),
                    Endian::Little => LittleEndian::$bo_read_fn(buf),
                }
            }

            fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError> {
                int_fill_value(value, Self::ZARR_TYPE)
            }

            fn to_json_fill_value(&self) -> Value {
                Value::from(*self)
            }
        }
    };
}

reflected_int!(DataType::UInt(IntSize::b16), u16, read_u16, write_u16);
reflected_int!(DataType::UInt(IntSize::b32), u32, read_u32, write_u32);
reflected_int!(DataType::UInt(IntSize::b64), u64, read_u64, write_u64);
reflected_int!(DataType::Int(IntSize::b16), i16, read_i16, write_i16);
reflected_int!(DataType::Int(IntSize::b32), i32, read_i32, write_i32);
reflected_int!(DataType::Int(IntSize::b64), i64, read_i64, write_i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_fill_values() {
        assert_eq!(u8::from_json_fill_value(&Value::from(7)).unwrap(), 7);
        assert_eq!(i8::from_json_fill_value(&Value::from(-7)).unwrap(), -7);
        assert_eq!(
            u64::from_json_fill_value(&Value::from(u64::MAX)).unwrap(),
            u64::MAX
        );
        assert!(i16::from_json_fill_value(&Value::from(1.5)).is_err());
        assert!(u16::from_json_fill_value(&Value::from("0")).is_err());
        assert_eq!(i32::MIN.to_json_fill_value(), Value::from(i32::MIN));
    }

    #[test]
    fn int_elements() {
        let mut buf = [0u8; 4];
        (-2i32).write_element(&mut buf, Endian::Big);
        assert_eq!(buf, [0xff, 0xff, 0xff, 0xfe]);
        assert_eq!(i32::read_element(&buf, Endian::Big), -2);
        assert_eq!(i32::read_element(&buf, Endian::Little), -16_777_217);

        let mut one = [0u8; 1];
        (-1i8).write_element(&mut one, Endian::Little);
        assert_eq!(one, [0xff]);
    }
}
