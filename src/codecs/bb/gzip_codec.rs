use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codecs::{bb::BBCodec, CodecConfigError, CodecOptions, DecodeError, EncodeError};

/// Compression level 0-9, serialised as a bare integer.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug)]
#[serde(try_from = "u32", into = "u32")]
pub struct GzipLevel(u32);

impl TryFrom<u32> for GzipLevel {
    type Error = CodecConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value <= 9 {
            Ok(Self(value))
        } else {
            Err(CodecConfigError::InvalidGzipLevel(value))
        }
    }
}

impl From<GzipLevel> for u32 {
    fn from(value: GzipLevel) -> Self {
        value.0
    }
}

impl Default for GzipLevel {
    fn default() -> Self {
        Self(6)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug, Default)]
pub struct GzipCodec {
    #[serde(default)]
    pub level: GzipLevel,
}

impl GzipCodec {
    pub fn from_level(level: u32) -> Result<Self, CodecConfigError> {
        Ok(Self {
            level: level.try_into()?,
        })
    }

    pub fn best() -> Self {
        Self {
            level: GzipLevel(9),
        }
    }

    pub fn fastest() -> Self {
        Self {
            level: GzipLevel(1),
        }
    }
}

impl BBCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn configuration(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut enc = GzEncoder::new(Vec::default(), GzCompression::new(self.level.0));
        enc.write_all(decoded)?;
        Ok(enc.finish()?)
    }

    fn decode(&self, encoded: &[u8], _options: &CodecOptions) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::default();
        GzDecoder::new(encoded).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_serialises_as_number() {
        let c = GzipCodec::from_level(5).unwrap();
        assert_eq!(c.configuration(), Some(serde_json::json!({"level": 5})));
        let back: GzipCodec = serde_json::from_str(r#"{"level": 5}"#).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn invalid_level() {
        assert!(GzipCodec::from_level(10).is_err());
        assert!(serde_json::from_str::<GzipCodec>(r#"{"level": 12}"#).is_err());
    }

    #[test]
    fn compress_roundtrip() {
        let c = GzipCodec::best();
        let data = vec![7u8; 1000];
        let enc = c.encode(&data).unwrap();
        assert!(enc.len() < data.len());
        assert_eq!(c.decode(&enc, &CodecOptions::default()).unwrap(), data);
    }

    #[test]
    fn garbage_fails() {
        assert!(matches!(
            GzipCodec::default().decode(b"not gzip", &CodecOptions::default()),
            Err(DecodeError::Decompress(_))
        ));
    }
}
