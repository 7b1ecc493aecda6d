use std::sync::Arc;

pub use crate::chunk_grid::{ArrayRegion, ArraySlice, ChunkGrid, RegularChunkGrid};
pub use crate::chunk_key_encoding::{ChunkKeyEncoding, DefaultChunkKeyEncoding, Separator};
pub use crate::codecs::{
    aa::TransposeCodec,
    ab::{bytes_codec::BytesCodec, bytes_codec::Endian},
    bb::{crc32c_codec::Crc32cCodec, BBCodec},
    CodecOptions, CodecRegistry,
};
pub use crate::data_type::ReflectedType;
pub use crate::error::{ArrayError, InvalidMetadata};
pub use crate::node::{
    Array, ArrayMetadata, ArrayMetadataBuilder, ArrayOptions, ReadableMetadata,
    WriteableMetadata,
};
pub use crate::selection::{DimSelection, Selection};
pub use crate::store::{
    HashMapStore, ListableStore, ReadableStore, StoreBackend, StoreConfig, StoreKey,
    StoreRegistry, WriteableStore,
};
#[cfg(feature = "filesystem")]
pub use crate::store::{AccessMode, FileSystemStore};
#[cfg(feature = "gzip")]
pub use crate::codecs::bb::gzip_codec::GzipCodec;
#[cfg(feature = "blosc")]
pub use crate::codecs::bb::blosc_codec::BloscCodec;

pub use ndarray;
pub use serde_json;

/// Create an array at `key` (`/`-separated) using the built-in codecs.
pub fn create_array<T: ReflectedType, S: WriteableStore + ?Sized>(
    store: Arc<S>,
    key: &str,
    metadata: ArrayMetadata,
) -> Result<Array<S, T>, ArrayError> {
    Array::create(store, key.parse()?, metadata, &CodecRegistry::default())
}

/// Open the array at `key` (`/`-separated) using the built-in codecs.
pub fn open_array<T: ReflectedType, S: ReadableStore + ?Sized>(
    store: Arc<S>,
    key: &str,
) -> Result<Array<S, T>, ArrayError> {
    Array::open(store, key.parse()?, &CodecRegistry::default())
}
