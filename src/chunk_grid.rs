use itertools::{structs::MultiProduct, Itertools};
use ndarray::{ArrayBase, ArrayViewD, ArrayViewMutD, Data, DataMut, IxDyn, Slice};
use serde::{Deserialize, Serialize};

use crate::{
    selection::IndexError,
    util::div_ceil,
    CoordVec, DimensionMismatch, GridCoord, Ndim,
};

/// A strided run of `shape` indices along one axis, starting at `offset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArraySlice {
    pub offset: u64,
    pub shape: u64,
    pub step: u64,
}

impl ArraySlice {
    pub fn new(offset: u64, shape: u64) -> Self {
        Self::new_strided(offset, shape, 1)
    }

    pub fn new_strided(offset: u64, shape: u64, step: u64) -> Self {
        Self {
            offset,
            shape,
            step,
        }
    }

    /// The last index covered, if any.
    pub fn last(&self) -> Option<u64> {
        if self.shape == 0 {
            None
        } else {
            Some(self.offset + (self.shape - 1) * self.step)
        }
    }

    /// Exclusive upper bound of the covered indices.
    pub fn end(&self) -> u64 {
        self.last().map_or(self.offset, |l| l + 1)
    }

    fn is_contiguous(&self) -> bool {
        self.step == 1 || self.shape <= 1
    }

    fn to_ndarray(self) -> Slice {
        // a single index needs no stride, and large steps do not fit in isize
        let step = if self.shape <= 1 { 1 } else { self.step };
        Slice::new(self.offset as isize, Some(self.end() as isize), step as isize)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayRegion(CoordVec<ArraySlice>);

impl FromIterator<ArraySlice> for ArrayRegion {
    fn from_iter<T: IntoIterator<Item = ArraySlice>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Ndim for ArrayRegion {
    fn ndim(&self) -> usize {
        self.0.len()
    }
}

impl ArrayRegion {
    pub fn from_slices(slices: CoordVec<ArraySlice>) -> Self {
        Self(slices)
    }

    pub fn slices(&self) -> &[ArraySlice] {
        &self.0
    }

    pub fn from_offset_shape_unchecked(offset: &[u64], shape: &[u64]) -> Self {
        offset
            .iter()
            .zip(shape.iter())
            .map(|(o, s)| ArraySlice::new(*o, *s))
            .collect()
    }

    pub fn from_offset_shape(offset: &[u64], shape: &[u64]) -> Result<Self, DimensionMismatch> {
        DimensionMismatch::check_coords(offset.len(), shape.len())?;
        Ok(Self::from_offset_shape_unchecked(offset, shape))
    }

    /// The region covering an entire array of the given shape.
    pub fn whole(shape: &[u64]) -> Self {
        shape.iter().map(|s| ArraySlice::new(0, *s)).collect()
    }

    pub fn offset(&self) -> GridCoord {
        self.0.iter().map(|s| s.offset).collect()
    }

    pub fn shape(&self) -> GridCoord {
        self.0.iter().map(|s| s.shape).collect()
    }

    pub fn shape_usize(&self) -> Vec<usize> {
        self.0.iter().map(|s| s.shape as usize).collect()
    }

    pub fn numel(&self) -> u64 {
        self.0.iter().map(|s| s.shape).product()
    }

    /// Whether this region selects every element of an array with the given shape.
    pub fn is_whole(&self, shape: &[u64]) -> bool {
        self.ndim() == shape.len()
            && self
                .0
                .iter()
                .zip(shape.iter())
                .all(|(sl, sh)| sl.offset == 0 && sl.shape == *sh && sl.is_contiguous())
    }

    /// Check that every selected index lies within an array of the given shape.
    pub fn check_bounds(&self, shape: &[u64]) -> Result<(), IndexError> {
        DimensionMismatch::check_coords(self.ndim(), shape.len())?;
        for (axis, (sl, len)) in self.0.iter().zip(shape.iter()).enumerate() {
            if sl.step == 0 {
                return Err(IndexError::ZeroStep { axis });
            }
            // saturate, as anything that overflows is out of bounds anyway
            let last = sl.shape.checked_sub(1).map(|n| {
                n.checked_mul(sl.step)
                    .and_then(|d| d.checked_add(sl.offset))
                    .unwrap_or(u64::MAX)
            });
            match last {
                Some(last) if last >= *len => {
                    return Err(IndexError::OutOfBounds {
                        axis,
                        index: last,
                        len: *len,
                    })
                }
                None if sl.offset > *len => {
                    return Err(IndexError::OutOfBounds {
                        axis,
                        index: sl.offset,
                        len: *len,
                    })
                }
                _ => (),
            }
        }
        Ok(())
    }

    /// View of this region of the array.
    ///
    /// The region must be within the array's bounds.
    pub fn slice_of<'a, S, T>(&self, arr: &'a ArrayBase<S, IxDyn>) -> ArrayViewD<'a, T>
    where
        S: Data<Elem = T>,
    {
        arr.slice_each_axis(|ad| self.0[ad.axis.index()].to_ndarray())
    }

    /// Mutable view of this region of the array.
    ///
    /// The region must be within the array's bounds.
    pub fn slice_mut_of<'a, S, T>(&self, arr: &'a mut ArrayBase<S, IxDyn>) -> ArrayViewMutD<'a, T>
    where
        S: DataMut<Elem = T>,
    {
        arr.slice_each_axis_mut(|ad| self.0[ad.axis.index()].to_ndarray())
    }
}

/// The intersection of a single chunk with a requested region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialChunk {
    pub chunk_idx: GridCoord,
    /// Region within the chunk.
    pub chunk_region: ArrayRegion,
    /// Region within the caller's buffer.
    pub out_region: ArrayRegion,
}

#[derive(Clone, Debug)]
struct DimChunk {
    chunk_idx: u64,
    chunk_slice: ArraySlice,
    out_slice: ArraySlice,
}

fn dim_chunks(sl: &ArraySlice, chunk_len: u64) -> Vec<DimChunk> {
    let mut out = Vec::default();
    let mut k = 0;
    while k < sl.shape {
        let idx = sl.offset + k * sl.step;
        let c = idx / chunk_len;
        let chunk_end = (c + 1) * chunk_len;
        let k_end = sl.shape.min(div_ceil(chunk_end - sl.offset, sl.step));
        out.push(DimChunk {
            chunk_idx: c,
            chunk_slice: ArraySlice::new_strided(idx - c * chunk_len, k_end - k, sl.step),
            out_slice: ArraySlice::new(k, k_end - k),
        });
        k = k_end;
    }
    out
}

/// Lazily yields [PartialChunk]s in row-major chunk order.
pub struct PartialChunkIter {
    inner: MultiProduct<std::vec::IntoIter<DimChunk>>,
    remaining: usize,
}

impl PartialChunkIter {
    fn new(per_dim: Vec<Vec<DimChunk>>) -> Self {
        let remaining = per_dim.iter().map(|d| d.len()).product();
        let inner = per_dim.into_iter().map(|d| d.into_iter()).multi_cartesian_product();
        Self { inner, remaining }
    }
}

impl Iterator for PartialChunkIter {
    type Item = PartialChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let dims = self.inner.next()?;
        self.remaining -= 1;
        Some(PartialChunk {
            chunk_idx: dims.iter().map(|d| d.chunk_idx).collect(),
            chunk_region: dims.iter().map(|d| d.chunk_slice).collect(),
            out_region: dims.iter().map(|d| d.out_slice).collect(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PartialChunkIter {}

pub trait ChunkGrid: Ndim {
    /// Calculate the chunk index where the voxel exists, and its offset within that chunk.
    fn voxel_chunk(&self, idx: &[u64]) -> Result<(GridCoord, GridCoord), DimensionMismatch> {
        DimensionMismatch::check_coords(idx.len(), self.ndim())?;
        Ok(self.voxel_chunk_unchecked(idx))
    }

    fn voxel_chunk_unchecked(&self, idx: &[u64]) -> (GridCoord, GridCoord);

    /// Shape of the given chunk as stored, including any padding past the array edge.
    fn chunk_shape(&self, idx: &[u64]) -> GridCoord;

    /// Number of chunks along each axis for an array of the given shape.
    fn grid_shape(&self, array_shape: &[u64]) -> GridCoord;

    /// Check that a chunk index lies within the grid for an array of the given shape.
    fn check_chunk_idx(&self, idx: &[u64], array_shape: &[u64]) -> Result<(), IndexError> {
        DimensionMismatch::check_coords(idx.len(), self.ndim())?;
        for (axis, (i, n)) in idx
            .iter()
            .zip(self.grid_shape(array_shape).iter())
            .enumerate()
        {
            if i >= n {
                return Err(IndexError::OutOfBounds {
                    axis,
                    index: *i,
                    len: *n,
                });
            }
        }
        Ok(())
    }

    /// Shape of the part of the given chunk which lies within the array.
    fn chunk_extent(&self, idx: &[u64], array_shape: &[u64]) -> GridCoord {
        let shape = self.chunk_shape(idx);
        idx.iter()
            .zip(shape.iter())
            .zip(array_shape.iter())
            .map(|((i, cs), len)| (*cs).min(len.saturating_sub(i * cs)))
            .collect()
    }

    /// Calculate how regions of chunks map into a given array region.
    fn chunks_in_region(
        &self,
        array_shape: &[u64],
        region: &ArrayRegion,
    ) -> Result<PartialChunkIter, IndexError> {
        DimensionMismatch::check_coords(array_shape.len(), self.ndim())?;
        region.check_bounds(array_shape)?;
        Ok(self.chunks_in_region_unchecked(region))
    }

    fn chunks_in_region_unchecked(&self, region: &ArrayRegion) -> PartialChunkIter;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegularChunkGrid {
    chunk_shape: GridCoord,
}

impl RegularChunkGrid {
    pub fn new<T: Into<GridCoord>>(chunk_shape: T) -> Self {
        let chunk_shape = chunk_shape.into();
        Self { chunk_shape }
    }

    pub fn regular_chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }
}

impl Ndim for RegularChunkGrid {
    fn ndim(&self) -> usize {
        self.chunk_shape.len()
    }
}

impl ChunkGrid for RegularChunkGrid {
    fn chunk_shape(&self, _idx: &[u64]) -> GridCoord {
        self.chunk_shape.clone()
    }

    fn grid_shape(&self, array_shape: &[u64]) -> GridCoord {
        array_shape
            .iter()
            .zip(self.chunk_shape.iter())
            .map(|(s, cs)| div_ceil(*s, *cs))
            .collect()
    }

    fn voxel_chunk_unchecked(&self, idx: &[u64]) -> (GridCoord, GridCoord) {
        let mut chunk_idx = GridCoord::with_capacity(self.ndim());
        let mut offset = GridCoord::with_capacity(self.ndim());

        for (vx, cs) in idx.iter().zip(self.chunk_shape.iter()) {
            chunk_idx.push(vx / cs);
            offset.push(vx % cs);
        }
        (chunk_idx, offset)
    }

    fn chunks_in_region_unchecked(&self, region: &ArrayRegion) -> PartialChunkIter {
        let per_dim = region
            .slices()
            .iter()
            .zip(self.chunk_shape.iter())
            .map(|(sl, cs)| dim_chunks(sl, *cs))
            .collect();
        PartialChunkIter::new(per_dim)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "name", content = "configuration", rename_all = "lowercase")]
#[enum_delegate::implement(Ndim)]
pub enum ChunkGridType {
    Regular(RegularChunkGrid),
}

impl ChunkGrid for ChunkGridType {
    fn voxel_chunk_unchecked(&self, idx: &[u64]) -> (GridCoord, GridCoord) {
        match self {
            Self::Regular(g) => g.voxel_chunk_unchecked(idx),
        }
    }

    fn chunk_shape(&self, idx: &[u64]) -> GridCoord {
        match self {
            Self::Regular(g) => g.chunk_shape(idx),
        }
    }

    fn grid_shape(&self, array_shape: &[u64]) -> GridCoord {
        match self {
            Self::Regular(g) => g.grid_shape(array_shape),
        }
    }

    fn chunks_in_region_unchecked(&self, region: &ArrayRegion) -> PartialChunkIter {
        match self {
            Self::Regular(g) => g.chunks_in_region_unchecked(region),
        }
    }
}

impl From<&[u64]> for ChunkGridType {
    fn from(value: &[u64]) -> Self {
        let cs: GridCoord = value.iter().cloned().collect();
        Self::Regular(RegularChunkGrid::new(cs))
    }
}

impl ChunkGridType {
    /// Every chunk dimension must be at least 1.
    pub(crate) fn has_empty_dim(&self) -> bool {
        match self {
            Self::Regular(g) => g.chunk_shape.iter().any(|c| *c == 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArcArrayD;

    fn grid(cs: &[u64]) -> ChunkGridType {
        cs.into()
    }

    #[test]
    fn serde_regular() {
        let s = r#"{"name":"regular","configuration":{"chunk_shape":[2,3]}}"#;
        let g: ChunkGridType = serde_json::from_str(s).unwrap();
        assert_eq!(g, grid(&[2, 3]));
        assert_eq!(serde_json::to_string(&g).unwrap(), s);
    }

    #[test]
    fn voxel_chunk() {
        let g = grid(&[2, 3]);
        let (c, o) = g.voxel_chunk(&[5, 5]).unwrap();
        assert_eq!(c.as_slice(), &[2, 1]);
        assert_eq!(o.as_slice(), &[1, 2]);
        assert!(g.voxel_chunk(&[1]).is_err());
    }

    #[test]
    fn grid_and_extent() {
        let g = grid(&[2, 3]);
        assert_eq!(g.grid_shape(&[5, 6]).as_slice(), &[3, 2]);
        assert_eq!(g.chunk_extent(&[2, 1], &[5, 6]).as_slice(), &[1, 3]);
        assert!(g.check_chunk_idx(&[2, 1], &[5, 6]).is_ok());
        assert!(g.check_chunk_idx(&[3, 0], &[5, 6]).is_err());
    }

    #[test]
    fn four_chunks_row_major() {
        let g = grid(&[2, 2]);
        let region = ArrayRegion::whole(&[4, 4]);
        let chunks: Vec<_> = g.chunks_in_region(&[4, 4], &region).unwrap().collect();
        let idxs: Vec<Vec<u64>> = chunks.iter().map(|c| c.chunk_idx.to_vec()).collect();
        assert_eq!(idxs, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert!(chunks
            .iter()
            .all(|c| c.chunk_region.is_whole(&[2, 2])));
        assert_eq!(chunks[3].out_region.offset().as_slice(), &[2, 2]);
    }

    #[test]
    fn partial_row() {
        let g = grid(&[2, 2]);
        let region = ArrayRegion::from_offset_shape(&[0, 0], &[1, 4]).unwrap();
        let chunks: Vec<_> = g.chunks_in_region(&[4, 4], &region).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chunk_idx.as_slice(), &[0, 1]);
        assert_eq!(chunks[1].chunk_region.shape().as_slice(), &[1, 2]);
        assert_eq!(chunks[1].out_region.offset().as_slice(), &[0, 2]);
    }

    #[test]
    fn strided() {
        // indices 1, 4, 7 over chunks of 3: one index in each of chunks 0, 1, 2
        let sl = ArraySlice::new_strided(1, 3, 3);
        let dims = dim_chunks(&sl, 3);
        assert_eq!(dims.len(), 3);
        for (i, d) in dims.iter().enumerate() {
            assert_eq!(d.chunk_idx, i as u64);
            assert_eq!(d.chunk_slice, ArraySlice::new_strided(1, 1, 3));
            assert_eq!(d.out_slice, ArraySlice::new(i as u64, 1));
        }

        // indices 0, 2, 4, 6 over chunks of 4
        let dims = dim_chunks(&ArraySlice::new_strided(0, 4, 2), 4);
        assert_eq!(dims.len(), 2);
        assert_eq!(dims[0].chunk_slice, ArraySlice::new_strided(0, 2, 2));
        assert_eq!(dims[1].chunk_slice, ArraySlice::new_strided(0, 2, 2));
        assert_eq!(dims[1].out_slice, ArraySlice::new(2, 2));
    }

    #[test]
    fn out_of_bounds() {
        let g = grid(&[2, 2]);
        let region = ArrayRegion::from_offset_shape(&[3, 0], &[2, 1]).unwrap();
        assert!(matches!(
            g.chunks_in_region(&[4, 4], &region),
            Err(IndexError::OutOfBounds {
                axis: 0,
                index: 4,
                len: 4
            })
        ));
    }

    #[test]
    fn zero_step_rejected() {
        let g = grid(&[2, 2]);
        let region: ArrayRegion = vec![ArraySlice::new_strided(0, 2, 0), ArraySlice::new(0, 4)]
            .into_iter()
            .collect();
        assert_eq!(
            region.check_bounds(&[4, 4]),
            Err(IndexError::ZeroStep { axis: 0 })
        );
        assert!(g.chunks_in_region(&[4, 4], &region).is_err());
    }

    #[test]
    fn huge_steps() {
        let dims = dim_chunks(&ArraySlice::new_strided(0, 1, u64::MAX), 2);
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].chunk_slice.shape, 1);

        // the second index would lie far beyond any axis
        let region: ArrayRegion = vec![ArraySlice::new_strided(1, 2, u64::MAX)]
            .into_iter()
            .collect();
        assert!(matches!(
            region.check_bounds(&[4]),
            Err(IndexError::OutOfBounds { axis: 0, .. })
        ));

        let arr = ArcArrayD::from_shape_vec(vec![4], (0..4u8).collect()).unwrap();
        let single: ArrayRegion = vec![ArraySlice::new_strided(2, 1, u64::MAX)]
            .into_iter()
            .collect();
        assert_eq!(single.slice_of(&arr).iter().cloned().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn empty_region_yields_nothing() {
        let g = grid(&[2, 2]);
        let region = ArrayRegion::from_offset_shape(&[4, 0], &[0, 4]).unwrap();
        assert_eq!(g.chunks_in_region(&[4, 4], &region).unwrap().count(), 0);
    }

    #[test]
    fn slicing() {
        let arr = ArcArrayD::from_shape_vec(vec![4, 4], (0..16u8).collect()).unwrap();
        let region: ArrayRegion = vec![ArraySlice::new_strided(0, 2, 2), ArraySlice::new(1, 2)]
            .into_iter()
            .collect();
        let view = region.slice_of(&arr);
        assert_eq!(view.shape(), &[2, 2]);
        assert_eq!(view.iter().cloned().collect::<Vec<_>>(), vec![1, 2, 9, 10]);

        let mut arr = arr;
        region.slice_mut_of(&mut arr).fill(0);
        assert_eq!(arr[&[2usize, 1][..]], 0);
        assert_eq!(arr[&[1usize, 1][..]], 5);
    }
}
