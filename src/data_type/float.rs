use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codecs::ab::bytes_codec::Endian;

use super::{DataType, FillValueError, NBytes, ReflectedType};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum FloatSize {
    b16,
    b32,
    b64,
}

impl Display for FloatSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nbits())
    }
}

impl TryFrom<usize> for FloatSize {
    type Error = &'static str;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(Self::b16),
            32 => Ok(Self::b32),
            64 => Ok(Self::b64),
            _ => Err("not a valid float size"),
        }
    }
}

impl NBytes for FloatSize {
    fn nbytes(&self) -> usize {
        match self {
            Self::b16 => 2,
            Self::b32 => 4,
            Self::b64 => 8,
        }
    }
}

/// Zarr encodes non-finite float fill values as strings.
fn float_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        other => other.as_f64(),
    }
}

fn float_to_json(value: f64) -> Value {
    if value.is_nan() {
        Value::from("NaN")
    } else if value == f64::INFINITY {
        Value::from("Infinity")
    } else if value == f64::NEG_INFINITY {
        Value::from("-Infinity")
    } else {
        Value::from(value)
    }
}

impl ReflectedType for f16 {
    const ZARR_TYPE: DataType = DataType::Float(FloatSize::b16);

    fn write_element(self, buf: &mut [u8], endian: Endian) {
        match endian {
            Endian::Big => BigEndian::write_u16(buf, self.to_bits()),
            Endian::Little => LittleEndian::write_u16(buf, self.to_bits()),
        }
    }

    fn read_element(buf: &[u8], endian: Endian) -> Self {
        let bits = match endian {
            Endian::Big => BigEndian::read_u16(buf),
            Endian::Little => LittleEndian::read_u16(buf),
        };
        f16::from_bits(bits)
    }

    fn from_json_fill_value(value: &Value) -> Result<Self, FillValueError> {
        float_from_json(value)
            .map(f16::from_f64)
            .ok_or_else(|| FillValueError::new(value, Self::ZARR_TYPE))
    }

    fn to_json_fill_value(&self) -> Value {
        float_to_json(self.to_f64())
    }
}

macro_rules! reflected_float {
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
                float_from_json(value)
                    .map(|v| v as $d_type)
                    .ok_or_else(|| FillValueError::new(value, Self::ZARR_TYPE))
            }

            fn to_json_fill_value(&self) -> Value {
                float_to_json(f64::from(*self))
            }
        }
    };
}

reflected_float!(DataType::Float(FloatSize::b32), f32, read_f32, write_f32);
reflected_float!(DataType::Float(FloatSize::b64), f64, read_f64, write_f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_fill_values() {
        assert!(f32::from_json_fill_value(&Value::from("NaN"))
            .unwrap()
            .is_nan());
        assert_eq!(
            f64::from_json_fill_value(&Value::from("-Infinity")).unwrap(),
            f64::NEG_INFINITY
        );
        assert_eq!(f64::NAN.to_json_fill_value(), Value::from("NaN"));
        assert_eq!(f32::INFINITY.to_json_fill_value(), Value::from("Infinity"));
        assert_eq!(1.5f32.to_json_fill_value(), Value::from(1.5));
    }

    #[test]
    fn integral_json_is_a_float() {
        assert_eq!(f64::from_json_fill_value(&Value::from(3)).unwrap(), 3.0);
    }

    #[test]
    fn half_elements() {
        let v = f16::from_f32(1.5);
        let mut buf = [0u8; 2];
        v.write_element(&mut buf, Endian::Little);
        assert_eq!(f16::read_element(&buf, Endian::Little), v);
        assert_eq!(
            f16::from_json_fill_value(&Value::from(1.5)).unwrap(),
            f16::from_f32(1.5)
        );
    }
}
