use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    codecs::CodecConfigError, data_type::ReflectedType, ArcArrayD, CoordVec, DimensionMismatch,
    GridCoord, Ndim,
};

use super::AACodec;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TransposeCodec {
    pub order: CoordVec<usize>,
}

fn validate_permutation(perm: &[usize]) -> bool {
    let max = perm.len();
    let mut elems = HashSet::with_capacity(max);
    perm.iter().all(|item| item < &max && elems.insert(item))
}

impl TransposeCodec {
    /// Reverse the order of all axes.
    pub fn new_transpose(ndim: usize) -> Self {
        let order = (0..ndim).rev().collect();
        Self { order }
    }

    pub fn new(perm: CoordVec<usize>) -> Result<Self, CodecConfigError> {
        let s = Self { order: perm };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<(), CodecConfigError> {
        if validate_permutation(&self.order) {
            Ok(())
        } else {
            Err(CodecConfigError::InvalidPermutation(self.order.to_vec()))
        }
    }

    pub(crate) fn validate_ndim(&self, ndim: usize) -> Result<(), CodecConfigError> {
        self.validate()?;
        DimensionMismatch::check_coords(self.ndim(), ndim)?;
        Ok(())
    }
}

impl AACodec for TransposeCodec {
    fn encode<T: ReflectedType>(&self, decoded: ArcArrayD<T>) -> ArcArrayD<T> {
        decoded.permuted_axes(self.order.as_slice())
    }

    fn decode<T: ReflectedType>(&self, encoded: ArcArrayD<T>) -> ArcArrayD<T> {
        encoded.permuted_axes(reverse_permutation(self.order.as_slice()).as_slice())
    }

    fn compute_encoded_shape(&self, decoded_shape: &[u64]) -> GridCoord {
        self.order.iter().map(|idx| decoded_shape[*idx]).collect()
    }
}

fn reverse_permutation(p: &[usize]) -> CoordVec<usize> {
    let mut out: CoordVec<usize> = smallvec::smallvec![0; p.len()];
    for (idx, pos) in p.iter().enumerate() {
        out[*pos] = idx;
    }
    out
}

impl Ndim for TransposeCodec {
    fn ndim(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

    const SHAPE: [usize; 3] = [3, 4, 5];

    fn make_arr() -> ArcArrayD<u8> {
        ArcArrayD::from_shape_vec(SHAPE.to_vec(), (0..60).collect()).unwrap()
    }

    #[test]
    fn deser_order() {
        let c: TransposeCodec = serde_json::from_str(r#"{"order": [0, 2, 1]}"#).unwrap();
        assert_eq!(c.order.as_slice(), &[0, 2, 1]);
    }

    #[test]
    fn transpose_permutation() {
        let orig = make_arr();
        let perm = smallvec![2, 0, 1];
        let t = TransposeCodec::new(perm.clone()).unwrap();

        let encoded = t.encode(orig.clone());
        let expected_shape: Vec<_> = perm.iter().map(|idx| SHAPE[*idx]).collect();
        assert_eq!(encoded.shape(), expected_shape.as_slice());
        assert_eq!(
            t.compute_encoded_shape(&[3, 4, 5]).as_slice(),
            &[5, 3, 4]
        );

        let decoded = t.decode(encoded);
        assert_eq!(decoded, orig);
    }

    #[test]
    fn transpose() {
        let t = TransposeCodec::new_transpose(3);
        assert_eq!(t.order.as_slice(), &[2, 1, 0])
    }

    #[test]
    fn invalid_permutations() {
        assert!(TransposeCodec::new(smallvec![0, 0]).is_err());
        assert!(TransposeCodec::new(smallvec![0, 2]).is_err());
        assert!(TransposeCodec::new(smallvec![1, 0]).is_ok());
    }

    #[test]
    fn reverse() {
        assert_eq!(reverse_permutation(&[2, 0, 1]).as_slice(), &[1, 2, 0]);
    }
}
