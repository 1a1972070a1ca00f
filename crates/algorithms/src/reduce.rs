//! Per-pixel reduction of a frame stack

use ndarray::Array2;
use rayon::prelude::*;
use strata_core::raster::{Band, Raster, RasterFrame};
use strata_core::{Error, Result};

/// Per-pixel median of `bands` across `frames`.
///
/// Every frame must share the first frame's grid. No-data cells (NaN or the
/// band's declared no-data) are skipped; a pixel with no valid sample in any
/// frame stays NaN. With an even number of samples the two middle values are
/// averaged. Output band order follows `bands`.
pub fn median_composite<S: AsRef<str>>(
    frames: &[RasterFrame],
    bands: &[S],
) -> Result<RasterFrame> {
    let first = frames.first().ok_or_else(|| Error::InvalidParameter {
        name: "frames",
        value: "0".into(),
        reason: "median needs at least one frame".into(),
    })?;
    let (rows, cols) = first.shape().ok_or_else(|| Error::MissingBand(
        bands.first().map(|b| b.as_ref().to_string()).unwrap_or_default(),
    ))?;

    for frame in &frames[1..] {
        if let Some((ar, ac)) = frame.shape() {
            if (ar, ac) != (rows, cols) {
                return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
            }
        }
    }

    let mut out = RasterFrame::new();
    for name in bands {
        let name = name.as_ref();
        let stack = frames
            .iter()
            .map(|f| f.band(name).ok_or_else(|| Error::MissingBand(name.to_string())))
            .collect::<Result<Vec<&Raster<f64>>>>()?;

        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut samples = Vec::with_capacity(stack.len());
                let mut row_data = vec![f64::NAN; cols];
                for (col, cell) in row_data.iter_mut().enumerate() {
                    samples.clear();
                    samples.extend(
                        stack
                            .iter()
                            .map(|r| (r.data()[(row, col)], r))
                            .filter(|(v, r)| !r.is_nodata(*v))
                            .map(|(v, _)| v),
                    );
                    if let Some(m) = median(&mut samples) {
                        *cell = m;
                    }
                }
                row_data
            })
            .collect();

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        let mut raster = Raster::from_array(array);
        if let Some(transform) = first.transform() {
            raster.set_transform(transform);
        }
        raster.set_nodata(Some(f64::NAN));
        out.push(Band::new(name, raster))?;
    }
    Ok(out)
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::GeoTransform;

    fn frame(values: &[(&str, f64)]) -> RasterFrame {
        let bands = values
            .iter()
            .map(|(name, v)| {
                let mut r = Raster::filled(3, 3, *v);
                r.set_transform(GeoTransform::new(10.0, 20.0, 1.0, -1.0));
                Band::new(*name, r)
            })
            .collect();
        RasterFrame::from_bands(bands).unwrap()
    }

    #[test]
    fn odd_stack_takes_middle_value() {
        let frames = vec![
            frame(&[("SR_B4", 5.0)]),
            frame(&[("SR_B4", 1.0)]),
            frame(&[("SR_B4", 3.0)]),
        ];
        let out = median_composite(&frames, &["SR_B4"]).unwrap();
        assert_eq!(out.band("SR_B4").unwrap().get(1, 1).unwrap(), 3.0);
        assert_eq!(out.transform().unwrap().origin_x, 10.0);
    }

    #[test]
    fn even_stack_averages_middle_pair() {
        let frames = vec![frame(&[("a", 2.0)]), frame(&[("a", 4.0)])];
        let out = median_composite(&frames, &["a"]).unwrap();
        assert_eq!(out.band("a").unwrap().get(0, 0).unwrap(), 3.0);
    }

    #[test]
    fn nan_samples_are_skipped() {
        let mut masked = frame(&[("a", 100.0)]);
        masked.band_mut("a").unwrap().set(0, 0, f64::NAN).unwrap();
        let frames = vec![masked, frame(&[("a", 1.0)]), frame(&[("a", 2.0)])];

        let out = median_composite(&frames, &["a"]).unwrap();
        let band = out.band("a").unwrap();
        assert_eq!(band.get(0, 0).unwrap(), 1.5);
        assert_eq!(band.get(2, 2).unwrap(), 2.0);
    }

    #[test]
    fn all_masked_pixel_stays_nan() {
        let mut f = frame(&[("a", 1.0)]);
        f.band_mut("a").unwrap().set(1, 1, f64::NAN).unwrap();
        let out = median_composite(&[f], &["a"]).unwrap();
        assert!(out.band("a").unwrap().get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn band_order_follows_request() {
        let frames = vec![frame(&[("x", 1.0), ("y", 2.0)])];
        let out = median_composite(&frames, &["y", "x"]).unwrap();
        assert_eq!(out.band_names(), vec!["y", "x"]);
    }

    #[test]
    fn empty_stack_and_missing_band_are_errors() {
        assert!(median_composite::<&str>(&[], &["a"]).is_err());
        let frames = vec![frame(&[("a", 1.0)])];
        assert!(matches!(
            median_composite(&frames, &["b"]),
            Err(Error::MissingBand(b)) if b == "b"
        ));
    }
}
