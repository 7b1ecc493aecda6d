use thiserror::Error;

/// adds `From<D>` for an enum with a variant containing D
#[macro_export]
macro_rules! variant_from_data {
    ($enum:ty, $variant:ident, $data_type:ty) => {
        impl std::convert::From<$data_type> for $enum {
            fn from(c: $data_type) -> Self {
                <$enum>::$variant(c)
            }
        }
    };
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Got {other_ndim} dimensions when expecting {ref_ndim}")]
pub struct DimensionMismatch {
    ref_ndim: usize,
    other_ndim: usize,
}

impl DimensionMismatch {
    pub fn check_coords(coord_ndim: usize, array_ndim: usize) -> Result<(), Self> {
        if coord_ndim == array_ndim {
            Ok(())
        } else {
            Err(Self {
                ref_ndim: array_ndim,
                other_ndim: coord_ndim,
            })
        }
    }

    pub fn check_many(reference: usize, others: &[usize]) -> Result<(), Self> {
        for o in others.iter() {
            if o != &reference {
                return Err(Self {
                    ref_ndim: reference,
                    other_ndim: *o,
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn to_usize(coords: &[u64]) -> Vec<usize> {
    coords.iter().map(|c| *c as usize).collect()
}

pub(crate) fn div_ceil(numerator: u64, denominator: u64) -> u64 {
    numerator / denominator + u64::from(numerator % denominator != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_coords() {
        assert!(DimensionMismatch::check_coords(2, 2).is_ok());
        let err = DimensionMismatch::check_coords(3, 2).unwrap_err();
        assert_eq!(err.to_string(), "Got 3 dimensions when expecting 2");
    }

    #[test]
    fn check_many() {
        assert!(DimensionMismatch::check_many(2, &[2, 2]).is_ok());
        assert!(DimensionMismatch::check_many(2, &[2, 1]).is_err());
    }

    #[test]
    fn ceil_division() {
        assert_eq!(div_ceil(4, 2), 2);
        assert_eq!(div_ceil(5, 2), 3);
        assert_eq!(div_ceil(1, 7), 1);
        assert_eq!(div_ceil(0, 3), 0);
        assert_eq!(div_ceil(4, u64::MAX), 1);
        assert_eq!(div_ceil(u64::MAX, 2), u64::MAX / 2 + 1);
    }
}
