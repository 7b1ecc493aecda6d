use byteorder::{ByteOrder, LittleEndian};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codecs::{bb::BBCodec, CodecOptions, DecodeError, EncodeError};

const CHECKSUM_SIZE: usize = 4;

/// Appends a little-endian CRC32C checksum of the payload.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Default)]
pub struct Crc32cCodec {}

impl BBCodec for Crc32cCodec {
    fn name(&self) -> &str {
        "crc32c"
    }

    fn configuration(&self) -> Option<Value> {
        None
    }

    fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(decoded.len() + CHECKSUM_SIZE);
        out.extend_from_slice(decoded);
        let mut suffix = [0u8; CHECKSUM_SIZE];
        LittleEndian::write_u32(&mut suffix, crc32c(decoded));
        out.extend_from_slice(&suffix);
        Ok(out)
    }

    fn decode(&self, encoded: &[u8], options: &CodecOptions) -> Result<Vec<u8>, DecodeError> {
        if encoded.len() < CHECKSUM_SIZE {
            return Err(DecodeError::ChecksumTruncated(encoded.len()));
        }
        let (payload, suffix) = encoded.split_at(encoded.len() - CHECKSUM_SIZE);
        if options.validate_checksums {
            let stored = LittleEndian::read_u32(suffix);
            let computed = crc32c(payload);
            if stored != computed {
                return Err(DecodeError::ChecksumMismatch { stored, computed });
            }
        }
        Ok(payload.to_vec())
    }
}
