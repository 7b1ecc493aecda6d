use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use bytes::Bytes;
use log::{debug, trace};
use ndarray::{ArrayViewD, ArrayViewMutD, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;
use serde::{Deserialize, Serialize};

use super::{locks::ChunkLocks, JsonObject, ReadableMetadata, WriteableMetadata};
use crate::{
    chunk_grid::{ArrayRegion, ChunkGrid, ChunkGridType, PartialChunk},
    chunk_key_encoding::{ChunkKeyEncoder, ChunkKeyEncoding},
    codecs::{
        aa::AACodecType, ab::ABCodecType, bb::BBCodecType, ChunkRepr, CodecChain,
        CodecConfigError, CodecMetadata, CodecOptions, CodecRegistry,
    },
    data_type::{DataType, ReflectedType},
    error::{ArrayError, InvalidMetadata},
    selection::Selection,
    store::{ListableStore, ReadableStore, StoreKey, WriteableStore},
    util::to_usize,
    ArcArrayD, CoordVec, DimensionMismatch, GridCoord, MaybeNdim, Ndim, ZARR_FORMAT,
};

const NODE_TYPE: &str = "array";

/// The `zarr.json` document of an array.
///
/// Use the [ArrayMetadataBuilder] to construct this in a convenient way.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArrayMetadata {
    zarr_format: usize,
    node_type: String,
    shape: GridCoord,
    data_type: DataType,
    chunk_grid: ChunkGridType,
    #[serde(default)]
    chunk_key_encoding: ChunkKeyEncoding,
    fill_value: serde_json::Value,
    #[serde(default)]
    codecs: Vec<CodecMetadata>,
    #[serde(default)]
    attributes: JsonObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dimension_names: Option<CoordVec<Option<String>>>,
}

impl Ndim for ArrayMetadata {
    fn ndim(&self) -> usize {
        self.shape.len()
    }
}

impl ReadableMetadata for ArrayMetadata {
    fn get_zarr_format(&self) -> usize {
        self.zarr_format
    }

    fn get_attributes(&self) -> &JsonObject {
        &self.attributes
    }
}

impl WriteableMetadata for ArrayMetadata {
    fn mutate_attributes<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut JsonObject) -> R,
    {
        f(&mut self.attributes)
    }
}

impl ArrayMetadata {
    /// Ensure that the document describes a usable array.
    pub fn validate(&self) -> Result<(), InvalidMetadata> {
        if self.zarr_format != ZARR_FORMAT {
            return Err(InvalidMetadata::ZarrFormat(self.zarr_format));
        }
        if self.node_type != NODE_TYPE {
            return Err(InvalidMetadata::NodeType(self.node_type.clone()));
        }
        if self.shape.is_empty() {
            return Err(InvalidMetadata::ZeroRank);
        }
        if self.shape.iter().any(|s| *s == 0) {
            return Err(InvalidMetadata::EmptyDimension(self.shape.clone()));
        }
        DimensionMismatch::check_coords(self.chunk_grid.ndim(), self.ndim())
            .map_err(InvalidMetadata::ChunkRank)?;
        if self.chunk_grid.has_empty_dim() {
            return Err(InvalidMetadata::EmptyChunkDimension);
        }
        if let Some(names) = &self.dimension_names {
            DimensionMismatch::check_coords(names.len(), self.ndim())
                .map_err(InvalidMetadata::DimensionNames)?;
        }
        self.data_type.validate_fill_value(&self.fill_value)?;
        Ok(())
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn chunk_grid(&self) -> &ChunkGridType {
        &self.chunk_grid
    }

    pub fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    pub fn fill_value(&self) -> &serde_json::Value {
        &self.fill_value
    }

    pub fn codecs(&self) -> &[CodecMetadata] {
        &self.codecs
    }

    pub fn dimension_names(&self) -> Option<&[Option<String>]> {
        self.dimension_names.as_deref()
    }
}

pub struct ArrayMetadataBuilder<T: ReflectedType> {
    shape: GridCoord,
    chunk_grid: Option<ChunkGridType>,
    chunk_key_encoding: Option<ChunkKeyEncoding>,
    fill_value: Option<T>,
    codecs: CodecChain,
    attributes: JsonObject,
    dimension_names: Option<CoordVec<Option<String>>>,
}

impl<T: ReflectedType> Ndim for ArrayMetadataBuilder<T> {
    fn ndim(&self) -> usize {
        self.shape.len()
    }
}

impl<T: ReflectedType> ArrayMetadataBuilder<T> {
    /// Prepare metadata for a basic array with a shape and data type.
    ///
    /// At a minimum, [ArrayMetadataBuilder::chunk_grid()] should be called,
    /// as the default behaviour is to have a single chunk for the entire array.
    pub fn new(shape: &[u64]) -> Self {
        Self {
            shape: shape.iter().cloned().collect(),
            chunk_grid: None,
            chunk_key_encoding: None,
            fill_value: None,
            codecs: CodecChain::default(),
            attributes: HashMap::default(),
            dimension_names: None,
        }
    }

    /// Set the chunk grid.
    ///
    /// Fails if the chunk grid is incompatible with the array's dimensionality.
    pub fn chunk_grid<G: Into<ChunkGridType>>(
        mut self,
        chunk_grid: G,
    ) -> Result<Self, DimensionMismatch> {
        let cg = chunk_grid.into();
        self.union_ndim(&cg)?;
        self.chunk_grid = Some(cg);
        Ok(self)
    }

    /// Set the chunk key encoding.
    ///
    /// By default, uses the default chunk key encoding
    /// (`c/`-prefixed, `/`-separated).
    pub fn chunk_key_encoding<E: Into<ChunkKeyEncoding>>(mut self, chunk_key_encoding: E) -> Self {
        self.chunk_key_encoding = Some(chunk_key_encoding.into());
        self
    }

    /// Set the fill value.
    ///
    /// By default, uses the data type's default value, which is `false` or `0`.
    pub fn fill_value(mut self, fill_value: T) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the array->bytes codec, replacing the default little-endian `bytes`.
    pub fn ab_codec<C: Into<ABCodecType>>(mut self, codec: C) -> Self {
        self.codecs.replace_ab_codec(Some(codec.into()));
        self
    }

    /// Append an array->array codec.
    ///
    /// This will be the last AA encoder, or first AA decoder.
    ///
    /// Fails if the dimensions are not compatible with the array's shape.
    pub fn push_aa_codec<C: Into<AACodecType>>(mut self, codec: C) -> Result<Self, CodecConfigError> {
        let c = codec.into();
        self.union_ndim(&c)?;
        c.validate(self.ndim())?;
        self.codecs.aa_codecs_mut().push(c);
        Ok(self)
    }

    /// Append a bytes->bytes codec.
    ///
    /// This will be the last BB encoder, or first BB decoder.
    pub fn push_bb_codec<C: Into<BBCodecType>>(mut self, codec: C) -> Self {
        self.codecs.bb_codecs_mut().push(codec.into());
        self
    }

    pub fn set_attribute<S: Serialize>(
        mut self,
        key: &str,
        value: S,
    ) -> Result<Self, serde_json::Error> {
        self.attributes
            .insert(key.to_owned(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Name each dimension; `None` leaves a dimension unnamed.
    pub fn dimension_names(
        mut self,
        names: &[Option<&str>],
    ) -> Result<Self, DimensionMismatch> {
        DimensionMismatch::check_coords(names.len(), self.ndim())?;
        self.dimension_names = Some(names.iter().map(|n| n.map(str::to_owned)).collect());
        Ok(self)
    }

    pub fn build(self) -> ArrayMetadata {
        let Self {
            shape,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            mut codecs,
            attributes,
            dimension_names,
        } = self;
        codecs.bind(&T::ZARR_TYPE);
        let chunk_grid = chunk_grid.unwrap_or_else(|| shape.as_slice().into());
        let fill_value = fill_value
            .map(|v| v.to_json_fill_value())
            .unwrap_or_else(|| T::ZARR_TYPE.default_fill_value());
        ArrayMetadata {
            zarr_format: ZARR_FORMAT,
            node_type: NODE_TYPE.to_owned(),
            shape,
            data_type: T::ZARR_TYPE,
            chunk_grid,
            chunk_key_encoding: chunk_key_encoding.unwrap_or_default(),
            fill_value,
            codecs: codecs.to_metadata(),
            attributes,
            dimension_names,
        }
    }
}

/// Run-time behaviour of an [Array] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayOptions {
    /// Process the chunks of one call on the rayon thread pool.
    pub parallel: bool,
    /// Upper bound on chunks in flight at once when `parallel` is set.
    ///
    /// Defaults to the number of rayon threads; 0 is treated as 1.
    pub chunk_concurrent_limit: usize,
    /// If false, a chunk written as entirely fill value is erased instead.
    pub store_empty_chunks: bool,
    /// Verify stored checksums (e.g. `crc32c`) when decoding chunks.
    pub validate_checksums: bool,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_concurrent_limit: rayon::current_num_threads(),
            store_empty_chunks: true,
            validate_checksums: true,
        }
    }
}

impl ArrayOptions {
    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions::default().with_validate_checksums(self.validate_checksums)
    }
}

/// Handle to an array in a store.
///
/// Reads and writes are split into per-chunk operations,
/// which run concurrently unless [ArrayOptions::parallel] is unset.
/// Read-modify-write cycles on one chunk are serialised between
/// all users of the same handle.
pub struct Array<S: ?Sized, T: ReflectedType> {
    store: Arc<S>,
    key: StoreKey,
    meta_key: StoreKey,
    metadata: ArrayMetadata,
    codecs: CodecChain,
    fill_value: T,
    options: ArrayOptions,
    locks: ChunkLocks,
}

impl<S: ?Sized, T: ReflectedType> Debug for Array<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("key", &self.key)
            .field("metadata", &self.metadata)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized, T: ReflectedType> Ndim for Array<S, T> {
    fn ndim(&self) -> usize {
        self.metadata.ndim()
    }
}

impl<S: ?Sized, T: ReflectedType> ReadableMetadata for Array<S, T> {
    fn get_zarr_format(&self) -> usize {
        self.metadata.get_zarr_format()
    }

    fn get_attributes(&self) -> &JsonObject {
        self.metadata.get_attributes()
    }
}

impl<S: ?Sized, T: ReflectedType> WriteableMetadata for Array<S, T> {
    fn mutate_attributes<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut JsonObject) -> R,
    {
        self.metadata.mutate_attributes(f)
    }
}

impl<S: ?Sized, T: ReflectedType> Array<S, T> {
    fn from_metadata(
        store: Arc<S>,
        key: StoreKey,
        metadata: ArrayMetadata,
        registry: &CodecRegistry,
    ) -> Result<Self, ArrayError> {
        metadata.validate()?;
        if T::ZARR_TYPE != metadata.data_type {
            return Err(ArrayError::TypeMismatch {
                expected: T::ZARR_TYPE,
                actual: metadata.data_type,
            });
        }
        let fill_value =
            T::from_json_fill_value(&metadata.fill_value).map_err(InvalidMetadata::from)?;
        let mut codecs = registry.resolve_chain(&metadata.codecs)?;
        codecs.bind(&metadata.data_type);
        codecs.validate(&metadata.data_type, metadata.ndim())?;
        Ok(Self {
            store,
            meta_key: key.with_metadata(),
            key,
            metadata,
            codecs,
            fill_value,
            options: ArrayOptions::default(),
            locks: ChunkLocks::default(),
        })
    }

    pub fn with_options(mut self, options: ArrayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: ArrayOptions) {
        self.options = options;
    }

    pub fn options(&self) -> ArrayOptions {
        self.options
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    pub fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    pub fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    pub fn chunk_grid(&self) -> &ChunkGridType {
        &self.metadata.chunk_grid
    }

    pub fn fill_value(&self) -> T {
        self.fill_value
    }

    /// Number of chunks along each axis.
    pub fn grid_shape(&self) -> GridCoord {
        self.metadata.chunk_grid.grid_shape(&self.metadata.shape)
    }

    pub fn chunk_key(&self, idx: &[u64]) -> StoreKey {
        self.metadata
            .chunk_key_encoding
            .chunk_key(&self.key, idx)
    }

    fn fill_chunk(&self, idx: &[u64]) -> ArcArrayD<T> {
        let shape = self.metadata.chunk_grid.chunk_shape(idx);
        ArcArrayD::from_elem(to_usize(&shape), self.fill_value)
    }

    fn for_each_chunk<F>(&self, chunks: Vec<PartialChunk>, op: F) -> Result<(), ArrayError>
    where
        F: Fn(PartialChunk) -> Result<(), ArrayError> + Send + Sync,
    {
        let limit = self.options.chunk_concurrent_limit.max(1);
        if self.options.parallel && limit > 1 && chunks.len() > 1 {
            iter_concurrent_limit!(limit, chunks, try_for_each, &op)
        } else {
            chunks.into_iter().try_for_each(op)
        }
    }
}

impl<S: ReadableStore + ?Sized, T: ReflectedType> Array<S, T> {
    /// Open an existing array, checking that its data type is `T`.
    pub fn open(store: Arc<S>, key: StoreKey, registry: &CodecRegistry) -> Result<Self, ArrayError> {
        let meta_key = key.with_metadata();
        let bytes = store
            .get(&meta_key)
            .map_err(|e| ArrayError::store(&key, None, e))?
            .ok_or_else(|| ArrayError::NotFound(key.clone()))?;
        let metadata: ArrayMetadata =
            serde_json::from_slice(&bytes).map_err(InvalidMetadata::from)?;
        let arr = Self::from_metadata(store, key, metadata, registry)?;
        debug!(
            "Opened array `{}` with shape {:?} and data type {}",
            arr.key, arr.metadata.shape, arr.metadata.data_type
        );
        Ok(arr)
    }

    /// `Ok(None)` if the chunk has never been written.
    fn retrieve_chunk(&self, idx: &[u64]) -> Result<Option<ArcArrayD<T>>, ArrayError> {
        let key = self.chunk_key(idx);
        let Some(bytes) = self
            .store
            .get(&key)
            .map_err(|e| ArrayError::store(&self.key, Some(idx), e))?
        else {
            trace!("Chunk `{}` is absent", key);
            return Ok(None);
        };
        trace!("Decoding {} bytes from `{}`", bytes.len(), key);
        let repr = ChunkRepr::new(&self.metadata.chunk_grid.chunk_shape(idx), self.fill_value);
        self.codecs
            .decode(&bytes, &repr, &self.options.codec_options())
            .map(Some)
            .map_err(|e| ArrayError::decode(&self.key, idx, e))
    }

    /// Read a whole chunk, including any padding past the array edge.
    ///
    /// Unwritten chunks are filled with the fill value.
    pub fn read_chunk(&self, idx: &[u64]) -> Result<ArcArrayD<T>, ArrayError> {
        self.metadata
            .chunk_grid
            .check_chunk_idx(idx, &self.metadata.shape)?;
        Ok(self
            .retrieve_chunk(idx)?
            .unwrap_or_else(|| self.fill_chunk(idx)))
    }

    /// Read a (possibly strided) region into a new array of the region's shape.
    pub fn read_region(&self, region: &ArrayRegion) -> Result<ArcArrayD<T>, ArrayError> {
        let chunks: Vec<PartialChunk> = self
            .metadata
            .chunk_grid
            .chunks_in_region(&self.metadata.shape, region)?
            .collect();
        debug!("Reading {} chunks from `{}`", chunks.len(), self.key);

        let out = Mutex::new(ArcArrayD::from_elem(region.shape_usize(), self.fill_value));
        self.for_each_chunk(chunks, |pc| {
            if let Some(chunk) = self.retrieve_chunk(&pc.chunk_idx)? {
                let src = pc.chunk_region.slice_of(&chunk);
                let mut guard = out.lock().unwrap_or_else(PoisonError::into_inner);
                pc.out_region.slice_mut_of(&mut *guard).assign(&src);
            }
            Ok(())
        })?;
        Ok(out.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    /// Read a selection; axes selected by a single index are removed from the output.
    pub fn read_selection(&self, selection: &Selection) -> Result<ArcArrayD<T>, ArrayError> {
        let resolved = selection.resolve(&self.metadata.shape)?;
        let mut arr = self.read_region(&resolved.region)?;
        for axis in resolved.dropped_axes.iter().rev() {
            arr = arr.index_axis_move(Axis(*axis), 0);
        }
        Ok(arr)
    }
}

impl<S: ListableStore + ?Sized, T: ReflectedType> Array<S, T> {
    /// Keys of every chunk currently held by the store, sorted.
    pub fn stored_chunk_keys(&self) -> Result<Vec<StoreKey>, ArrayError> {
        let mut keys = self
            .store
            .list_prefix(&self.key)
            .map_err(|e| ArrayError::store(&self.key, None, e))?;
        keys.retain(|k| k != &self.meta_key);
        Ok(keys)
    }
}

impl<S: WriteableStore + ?Sized, T: ReflectedType> Array<S, T> {
    /// Create a new array, writing its metadata.
    ///
    /// No chunks are written. Fails if a metadata document already exists at the key.
    pub fn create(
        store: Arc<S>,
        key: StoreKey,
        metadata: ArrayMetadata,
        registry: &CodecRegistry,
    ) -> Result<Self, ArrayError> {
        let meta_key = key.with_metadata();
        if store
            .has_key(&meta_key)
            .map_err(|e| ArrayError::store(&key, None, e))?
        {
            return Err(ArrayError::AlreadyExists(key));
        }
        let mut arr = Self::from_metadata(store, key, metadata, registry)?;
        // persist the codecs as resolved, including any default array->bytes codec
        arr.metadata.codecs = arr.codecs.to_metadata();
        arr.write_meta()?;
        debug!(
            "Created array `{}` with shape {:?} and chunk grid {:?}",
            arr.key, arr.metadata.shape, arr.metadata.chunk_grid
        );
        Ok(arr)
    }

    /// Persist the metadata document, e.g. after changing attributes.
    pub fn write_meta(&self) -> Result<(), ArrayError> {
        let bytes = serde_json::to_vec_pretty(&self.metadata).map_err(InvalidMetadata::from)?;
        self.store
            .set(&self.meta_key, Bytes::from(bytes))
            .map_err(|e| ArrayError::store(&self.key, None, e))
    }

    /// Encode and store a whole chunk; the caller holds the chunk's lock.
    fn store_chunk(&self, idx: &[u64], chunk: ArcArrayD<T>) -> Result<(), ArrayError> {
        let key = self.chunk_key(idx);
        if !self.options.store_empty_chunks && chunk.iter().all(|v| *v == self.fill_value) {
            trace!("Chunk `{}` is all fill value, erasing", key);
            self.store
                .erase(&key)
                .map_err(|e| ArrayError::store(&self.key, Some(idx), e))?;
            return Ok(());
        }
        let encoded = self
            .codecs
            .encode(chunk)
            .map_err(|e| ArrayError::encode(&self.key, idx, e))?;
        trace!("Storing {} bytes at `{}`", encoded.len(), key);
        self.store
            .set(&key, Bytes::from(encoded))
            .map_err(|e| ArrayError::store(&self.key, Some(idx), e))
    }

    /// Replace a whole chunk.
    ///
    /// The chunk must have the full chunk shape, including any padding past the array edge.
    pub fn write_chunk(&self, idx: &[u64], chunk: ArcArrayD<T>) -> Result<(), ArrayError> {
        self.metadata
            .chunk_grid
            .check_chunk_idx(idx, &self.metadata.shape)?;
        let expected = to_usize(&self.metadata.chunk_grid.chunk_shape(idx));
        if chunk.shape() != expected.as_slice() {
            return Err(ArrayError::ShapeMismatch {
                expected,
                actual: chunk.shape().to_vec(),
            });
        }
        self.locks.with_lock(idx, || self.store_chunk(idx, chunk))
    }

    /// Remove a chunk, so that it reads as fill value. Returns whether it existed.
    pub fn erase_chunk(&self, idx: &[u64]) -> Result<bool, ArrayError> {
        self.metadata
            .chunk_grid
            .check_chunk_idx(idx, &self.metadata.shape)?;
        let key = self.chunk_key(idx);
        self.locks.with_lock(idx, || {
            self.store
                .erase(&key)
                .map_err(|e| ArrayError::store(&self.key, Some(idx), e))
        })
    }

    /// Apply `merge` to the part of every chunk intersecting the region.
    ///
    /// Chunks which the region covers entirely start from fill value
    /// rather than being read.
    fn merge_into_chunks<F>(&self, region: &ArrayRegion, merge: F) -> Result<(), ArrayError>
    where
        F: Fn(&PartialChunk, ArrayViewMutD<'_, T>) + Send + Sync,
    {
        let shape = self.metadata.shape.as_slice();
        let grid = &self.metadata.chunk_grid;
        let chunks: Vec<PartialChunk> = grid.chunks_in_region(shape, region)?.collect();
        debug!("Writing {} chunks to `{}`", chunks.len(), self.key);

        self.for_each_chunk(chunks, |pc| {
            let idx = pc.chunk_idx.as_slice();
            self.locks.with_lock(idx, || {
                let mut chunk = if pc.chunk_region.is_whole(&grid.chunk_extent(idx, shape)) {
                    trace!("Overwriting whole chunk {:?} of `{}`", idx, self.key);
                    self.fill_chunk(idx)
                } else {
                    self.retrieve_chunk(idx)?
                        .unwrap_or_else(|| self.fill_chunk(idx))
                };
                merge(&pc, pc.chunk_region.slice_mut_of(&mut chunk));
                self.store_chunk(idx, chunk)
            })
        })
    }

    /// Write data with exactly the region's shape.
    pub fn write_region(&self, region: &ArrayRegion, data: ArrayViewD<T>) -> Result<(), ArrayError> {
        let expected = region.shape_usize();
        if data.shape() != expected.as_slice() {
            return Err(ArrayError::ShapeMismatch {
                expected,
                actual: data.shape().to_vec(),
            });
        }
        self.merge_into_chunks(region, |pc, mut dest| {
            dest.assign(&pc.out_region.slice_of(&data));
        })
    }

    /// Set every element of the region to one value.
    pub fn fill_region(&self, region: &ArrayRegion, value: T) -> Result<(), ArrayError> {
        self.merge_into_chunks(region, |_pc, mut dest| dest.fill(value))
    }

    /// Write a selection.
    ///
    /// The data may either omit the axes selected by a single index,
    /// or keep them with length 1.
    pub fn write_selection(
        &self,
        selection: &Selection,
        data: ArrayViewD<T>,
    ) -> Result<(), ArrayError> {
        let resolved = selection.resolve(&self.metadata.shape)?;
        let full_shape = resolved.region.shape_usize();
        let data = if data.shape() == full_shape.as_slice() {
            data
        } else {
            let expected = resolved.output_shape();
            if data.shape() != expected.as_slice() {
                return Err(ArrayError::ShapeMismatch {
                    expected,
                    actual: data.shape().to_vec(),
                });
            }
            let mut data = data;
            for axis in resolved.dropped_axes.iter() {
                data = data.insert_axis(Axis(*axis));
            }
            data
        };
        self.write_region(&resolved.region, data)
    }

    /// Broadcast a single value over a selection.
    pub fn fill_selection(&self, selection: &Selection, value: T) -> Result<(), ArrayError> {
        let resolved = selection.resolve(&self.metadata.shape)?;
        self.fill_region(&resolved.region, value)
    }

    /// Delete the array's metadata and every chunk.
    pub fn erase(self) -> Result<(), ArrayError> {
        self.store
            .erase_prefix(&self.key)
            .map_err(|e| ArrayError::store(&self.key, None, e))?;
        debug!("Erased array `{}`", self.key);
        Ok(())
    }
}
