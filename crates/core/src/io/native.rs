//! Native GeoTIFF reading/writing via the `tiff` crate.
//!
//! Georeferencing is limited to the pixel-scale and tiepoint tags (north-up
//! rasters). The validity mask travels through the GDAL no-data tag: masked
//! cells are written as NaN and NaN or the declared no-data value is masked
//! on read.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// EPSG code written into the GeoKey directory
    pub epsg: Option<u16>,
}

/// Read the first band of a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let nodata: Option<f64> = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok());

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let samples: Vec<f64> = match result {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-sample (chunky) files: keep the first sample of each pixel.
    let per_pixel = samples.len() / (rows * cols).max(1);
    if per_pixel == 0 || samples.len() != rows * cols * per_pixel {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let cells: Vec<Option<T>> = samples
        .into_iter()
        .step_by(per_pixel)
        .map(|v| {
            let masked = v.is_nan() || nodata.is_some_and(|nd| v == nd);
            if masked {
                None
            } else {
                num_traits::cast(v)
            }
        })
        .collect();

    let mut raster = Raster::from_options(cells, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    if let Some(epsg) = read_epsg(&mut decoder) {
        raster.set_crs(Some(CRS::from_epsg(epsg)));
    }

    Ok(raster)
}

/// ProjectedCSType (3072) or GeographicType (2048) from the GeoKey directory
fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u32_vec(Tag::GeoKeyDirectoryTag).ok()?;
    keys.get(4..)?
        .chunks_exact(4)
        .find(|k| (k[0] == 3072 || k[0] == 2048) && k[1] == 0 && k[3] != 32767)
        .map(|k| k[3])
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// Write a Raster to a GeoTIFF file as 32-bit float
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file, options)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>, options: &GeoTiffOptions) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options)?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let cells: Array2<f32> = ndarray::Zip::from(raster.data())
        .and(raster.mask())
        .map_collect(|&v, &ok| {
            if ok {
                num_traits::cast(v).unwrap_or(f32::NAN)
            } else {
                f32::NAN
            }
        });
    let data: Vec<f32> = cells.iter().copied().collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();
    let tag_err = |name: &str, e: tiff::TiffError| Error::Other(format!("Cannot write {} tag: {}", name, e));

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| tag_err("scale", e))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| tag_err("tiepoint", e))?;

    // GTModelTypeGeoKey = Projected, GTRasterTypeGeoKey = PixelIsArea,
    // plus ProjectedCSTypeGeoKey when the EPSG code is known.
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    if let Some(epsg) = options.epsg {
        geokeys[3] = 3;
        geokeys.extend_from_slice(&[3072, 0, 1, epsg]);
    }
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| tag_err("geokey", e))?;

    image
        .encoder()
        .write_tag(Tag::GdalNodata, "nan")
        .map_err(|e| tag_err("nodata", e))?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_buffer_roundtrip_keeps_mask_and_transform() {
        let mut raster =
            Raster::from_options(vec![Some(0.25), None, Some(-0.5), Some(0.0)], 2, 2).unwrap();
        raster.set_transform(GeoTransform::north_up(500_000.0, 4_001_000.0, 30.0));

        let bytes = write_geotiff_to_buffer(&raster, &GeoTiffOptions { epsg: Some(32633) }).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (2, 2));
        assert_eq!(back.get(0, 1).unwrap(), None);
        assert_eq!(back.get(1, 1).unwrap(), Some(0.0));
        assert_relative_eq!(back.get(0, 0).unwrap().unwrap(), 0.25);
        assert_relative_eq!(back.transform().origin_x, 500_000.0);
        assert_relative_eq!(back.transform().pixel_height, -30.0);
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(32633));
    }

    #[test]
    fn test_georeferencing_tags_are_read_back() {
        let mut raster = Raster::filled(2, 2, 7.0);
        raster.set_transform(GeoTransform::north_up(300.0, 600.0, 10.0));
        let bytes = write_geotiff_to_buffer(&raster, &GeoTiffOptions::default()).unwrap();

        let mut decoder = Decoder::new(Cursor::new(&bytes[..])).unwrap();
        assert_eq!(
            decoder.get_tag_ascii_string(Tag::GdalNodata).unwrap().trim_matches(char::from(0)),
            "nan"
        );
        assert_eq!(
            decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).unwrap(),
            vec![10.0, 10.0, 0.0]
        );

        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_relative_eq!(back.transform().origin_x, 300.0);
        assert_relative_eq!(back.transform().origin_y, 600.0);
        assert_relative_eq!(back.cell_size(), 10.0);
        assert!(back.crs().is_none());
    }
}
