//! Native single-band GeoTIFF reading (no GDAL)
//!
//! Uses the `tiff` crate. Georeferencing is taken from ModelPixelScale +
//! ModelTiepoint, which is what Landsat Collection-2 band files carry.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GDAL_NODATA: u16 = 42113;

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read the first band of an in-memory GeoTIFF
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {e}")))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {e}")))?;
    let (rows, cols) = (height as usize, width as usize);

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {e}")))?;

    macro_rules! cast_all {
        ($buf:expr) => {
            $buf.iter()
                .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
                .collect::<Vec<T>>()
        };
    }

    let data = match result {
        DecodingResult::U8(buf) => cast_all!(buf),
        DecodingResult::U16(buf) => cast_all!(buf),
        DecodingResult::U32(buf) => cast_all!(buf),
        DecodingResult::I16(buf) => cast_all!(buf),
        DecodingResult::I32(buf) => cast_all!(buf),
        DecodingResult::F32(buf) => cast_all!(buf),
        DecodingResult::F64(buf) => cast_all!(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-sample files decode interleaved; keep the first sample only.
    let samples = data.len() / (rows * cols).max(1);
    let data = if samples > 1 {
        data.into_iter().step_by(samples).collect()
    } else {
        data
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_nodata(read_nodata(&mut decoder));
    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z]
    Some(GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    ))
}

/// GDAL writes no-data as an ASCII tag
fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(Tag::Unknown(GDAL_NODATA)).ok()?;
    let value: f64 = text.trim().trim_end_matches('\0').parse().ok()?;
    num_traits::cast(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{colortype::Gray16, TiffEncoder};

    fn encode_u16(cols: u32, rows: u32, data: &[u16], with_geo: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            let mut image = encoder.new_image::<Gray16>(cols, rows).unwrap();
            if with_geo {
                image
                    .encoder()
                    .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[30.0f64, 30.0, 0.0][..])
                    .unwrap();
                image
                    .encoder()
                    .write_tag(
                        Tag::Unknown(MODEL_TIEPOINT),
                        &[0.0f64, 0.0, 0.0, 300_000.0, 9_000_000.0, 0.0][..],
                    )
                    .unwrap();
            }
            image.write_data(data).unwrap();
        }
        buf
    }

    #[test]
    fn reads_u16_band_as_f64() {
        let buf = encode_u16(3, 2, &[1, 2, 3, 4, 5, 6], false);
        let raster: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(raster.shape(), (2, 3));
        assert_eq!(raster.get(1, 2).unwrap(), 6.0);
    }

    #[test]
    fn reads_geotransform_tags() {
        let buf = encode_u16(2, 2, &[0, 0, 0, 0], true);
        let raster: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();
        let t = raster.transform();
        assert_eq!(t.origin_x, 300_000.0);
        assert_eq!(t.origin_y, 9_000_000.0);
        assert_eq!(t.pixel_height, -30.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_geotiff::<f64, _>("/nonexistent/strata/band.tif").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
