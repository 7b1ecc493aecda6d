//! Chunked N-dimensional array storage in the Zarr v3 layout.
//!
//! An [Array](node::Array) resolves slice reads and writes into per-chunk
//! operations, pushes each chunk through a [CodecChain](codecs::CodecChain)
//! and persists the encoded bytes in a key-value [store].
use ndarray::{ArcArray, IxDyn};
use smallvec::SmallVec;

pub mod chunk_grid;
pub mod chunk_key_encoding;
pub mod codecs;
pub mod data_type;
pub mod error;
pub mod node;
pub mod prelude;
pub mod selection;
pub mod store;
mod util;

pub use util::DimensionMismatch;

const COORD_SMALLVEC_SIZE: usize = 6;
pub const ZARR_FORMAT: usize = 3;

pub type CoordVec<T> = SmallVec<[T; COORD_SMALLVEC_SIZE]>;
pub type GridCoord = CoordVec<u64>;
pub type ArcArrayD<T> = ArcArray<T, IxDyn>;

#[enum_delegate::register]
pub trait Ndim {
    fn ndim(&self) -> usize;
}

pub trait MaybeNdim {
    fn maybe_ndim(&self) -> Option<usize>;

    fn union_ndim<T: MaybeNdim + ?Sized>(
        &self,
        other: &T,
    ) -> Result<Option<usize>, DimensionMismatch> {
        match (self.maybe_ndim(), other.maybe_ndim()) {
            (Some(n1), Some(n2)) => {
                DimensionMismatch::check_coords(n2, n1)?;
                Ok(Some(n1))
            }
            (Some(n1), None) => Ok(Some(n1)),
            (None, other) => Ok(other),
        }
    }
}

impl<T: Ndim> MaybeNdim for T {
    fn maybe_ndim(&self) -> Option<usize> {
        Some(self.ndim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Ndim for Fixed {
        fn ndim(&self) -> usize {
            self.0
        }
    }

    struct Free;

    impl MaybeNdim for Free {
        fn maybe_ndim(&self) -> Option<usize> {
            None
        }
    }

    #[test]
    fn union_ndim() {
        assert_eq!(Fixed(3).union_ndim(&Fixed(3)).unwrap(), Some(3));
        assert_eq!(Fixed(3).union_ndim(&Free).unwrap(), Some(3));
        assert_eq!(Free.union_ndim(&Fixed(2)).unwrap(), Some(2));
        assert_eq!(Free.union_ndim(&Free).unwrap(), None);
        assert!(Fixed(3).union_ndim(&Fixed(2)).is_err());
    }
}
