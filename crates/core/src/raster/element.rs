//! Cell value trait for rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can be stored in a raster cell.
///
/// Archive frames arrive as unsigned DNs (`u16` for Landsat SR and QA
/// bands) and are reduced as `f64`, so the trait only needs the handful of
/// operations that conversion and no-data handling rely on.
pub trait RasterElement:
    Copy + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// No-data value used when none is declared
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.is_some_and(|nd| *self == nd)
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan() || nodata.is_some_and(|nd| (self - nd).abs() < <$t>::EPSILON * 100.0)
            }
        }
    )*};
}

impl_integer_element!(u8, u16, u32, i16, i32);
impl_float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(!0.0f64.is_nodata(None));
        assert!((-9999.0f32).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn integer_nodata_requires_declaration() {
        assert!(!0u16.is_nodata(None));
        assert!(0u16.is_nodata(Some(0)));
        assert_eq!(u16::default_nodata(), 0);
    }
}
