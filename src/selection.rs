//! Per-dimension selections, resolved against an array's shape into an [ArrayRegion].
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use thiserror::Error;

use crate::{
    chunk_grid::{ArrayRegion, ArraySlice},
    CoordVec, DimensionMismatch, Ndim,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),
    #[error("Index {index} is out of bounds for axis {axis} with length {len}")]
    OutOfBounds { axis: usize, index: u64, len: u64 },
    #[error("Step must be at least 1 (axis {axis})")]
    ZeroStep { axis: usize },
    #[error("Slice start {start} is greater than stop {stop} (axis {axis})")]
    InvalidRange { axis: usize, start: u64, stop: u64 },
}

/// Selection along a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimSelection {
    /// Half-open `[start, stop)` with a positive step.
    /// A missing `stop` means the length of the axis.
    Slice {
        start: u64,
        stop: Option<u64>,
        step: u64,
    },
    /// A single index; the axis is dropped from the output.
    Index(u64),
    Full,
}

impl DimSelection {
    pub fn slice(start: u64, stop: u64) -> Self {
        Self::Slice {
            start,
            stop: Some(stop),
            step: 1,
        }
    }

    pub fn strided(start: u64, stop: u64, step: u64) -> Self {
        Self::Slice {
            start,
            stop: Some(stop),
            step,
        }
    }

    fn resolve(&self, axis: usize, len: u64) -> Result<ArraySlice, IndexError> {
        match *self {
            Self::Full => Ok(ArraySlice::new(0, len)),
            Self::Index(index) => {
                if index >= len {
                    Err(IndexError::OutOfBounds { axis, index, len })
                } else {
                    Ok(ArraySlice::new(index, 1))
                }
            }
            Self::Slice { start, stop, step } => {
                if step == 0 {
                    return Err(IndexError::ZeroStep { axis });
                }
                let stop = stop.unwrap_or(len);
                if start > stop {
                    return Err(IndexError::InvalidRange { axis, start, stop });
                }
                if stop > len {
                    return Err(IndexError::OutOfBounds {
                        axis,
                        index: stop - 1,
                        len,
                    });
                }
                let n = crate::util::div_ceil(stop - start, step);
                Ok(ArraySlice::new_strided(start, n, step))
            }
        }
    }
}

impl From<Range<u64>> for DimSelection {
    fn from(r: Range<u64>) -> Self {
        Self::slice(r.start, r.end)
    }
}

impl From<RangeFrom<u64>> for DimSelection {
    fn from(r: RangeFrom<u64>) -> Self {
        Self::Slice {
            start: r.start,
            stop: None,
            step: 1,
        }
    }
}

impl From<RangeTo<u64>> for DimSelection {
    fn from(r: RangeTo<u64>) -> Self {
        Self::slice(0, r.end)
    }
}

impl From<RangeFull> for DimSelection {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

impl From<u64> for DimSelection {
    fn from(i: u64) -> Self {
        Self::Index(i)
    }
}

/// One [DimSelection] per axis of the array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection(CoordVec<DimSelection>);

impl<D: Into<DimSelection>> FromIterator<D> for Selection {
    fn from_iter<T: IntoIterator<Item = D>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Ndim for Selection {
    fn ndim(&self) -> usize {
        self.0.len()
    }
}

/// A selection mapped onto a concrete array shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub region: ArrayRegion,
    /// Axes selected by a single index, in ascending order.
    pub dropped_axes: Vec<usize>,
}

impl ResolvedSelection {
    /// Shape of the data the caller reads or writes, with dropped axes removed.
    pub fn output_shape(&self) -> Vec<usize> {
        self.region
            .shape()
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.dropped_axes.contains(idx))
            .map(|(_, s)| *s as usize)
            .collect()
    }
}

impl Selection {
    pub fn full(ndim: usize) -> Self {
        Self(std::iter::repeat(DimSelection::Full).take(ndim).collect())
    }

    pub fn dims(&self) -> &[DimSelection] {
        &self.0
    }

    pub fn resolve(&self, shape: &[u64]) -> Result<ResolvedSelection, IndexError> {
        DimensionMismatch::check_coords(self.ndim(), shape.len())?;
        let mut slices = CoordVec::with_capacity(shape.len());
        let mut dropped_axes = Vec::default();
        for (axis, (sel, len)) in self.0.iter().zip(shape.iter()).enumerate() {
            slices.push(sel.resolve(axis, *len)?);
            if let DimSelection::Index(_) = sel {
                dropped_axes.push(axis);
            }
        }
        Ok(ResolvedSelection {
            region: ArrayRegion::from_slices(slices),
            dropped_axes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mixed() {
        let sel = Selection::from_iter([
            DimSelection::from(1u64),
            DimSelection::from(..),
            DimSelection::strided(1, 8, 3),
        ]);
        let res = sel.resolve(&[4, 5, 10]).unwrap();
        assert_eq!(res.dropped_axes, vec![0]);
        assert_eq!(res.region.offset().as_slice(), &[1, 0, 1]);
        assert_eq!(res.region.shape().as_slice(), &[1, 5, 3]);
        assert_eq!(res.output_shape(), vec![5, 3]);
    }

    #[test]
    fn empty_slice_allowed() {
        let sel = Selection::from_iter([2u64..2]);
        let res = sel.resolve(&[4]).unwrap();
        assert_eq!(res.region.shape().as_slice(), &[0]);
    }

    #[test]
    fn open_ended() {
        let sel = Selection::from_iter([DimSelection::from(1u64..), DimSelection::from(..3u64)]);
        let res = sel.resolve(&[4, 4]).unwrap();
        assert_eq!(res.region.offset().as_slice(), &[1, 0]);
        assert_eq!(res.region.shape().as_slice(), &[3, 3]);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Selection::from_iter([5u64]).resolve(&[4]),
            Err(IndexError::OutOfBounds {
                axis: 0,
                index: 5,
                len: 4
            })
        ));
        assert!(matches!(
            Selection::from_iter([0u64..5]).resolve(&[4]),
            Err(IndexError::OutOfBounds { .. })
        ));
        assert!(matches!(
            Selection::from_iter([DimSelection::strided(0, 2, 0)]).resolve(&[4]),
            Err(IndexError::ZeroStep { axis: 0 })
        ));
        assert!(matches!(
            Selection::from_iter([DimSelection::slice(3, 1)]).resolve(&[4]),
            Err(IndexError::InvalidRange { .. })
        ));
        assert!(matches!(
            Selection::full(2).resolve(&[4]),
            Err(IndexError::DimensionMismatch(_))
        ));
    }
}
