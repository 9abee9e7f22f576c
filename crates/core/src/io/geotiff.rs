//! Single-band GeoTIFF reading/writing
//!
//! Uses the `tiff` crate directly; georeferencing is carried via the
//! ModelPixelScale and ModelTiepoint tags. Values are stored as 64-bit
//! floats so grids round-trip exactly.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Grid};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Read a single-band GeoTIFF into a Grid.
///
/// Samples equal to `nodata` (when given) become NaN. If the file lacks
/// geotags, the default transform is kept; a missing transform is
/// feed-through, not an error.
pub fn read_geotiff<P: AsRef<Path>>(path: P, nodata: Option<f64>) -> Result<Grid> {
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {e}")))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("cannot read TIFF dimensions: {e}")))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("cannot read TIFF data: {e}")))?;

    let raw: Vec<f64> = match result {
        DecodingResult::F64(buf) => buf,
        DecodingResult::F32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U16(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I16(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I32(buf) => buf.iter().map(|&v| v as f64).collect(),
        _ => {
            return Err(Error::Other("unsupported TIFF sample format".into()));
        }
    };

    if raw.len() != rows * cols {
        return Err(Error::InvalidDimensions { rows, cols });
    }

    let values = match nodata {
        Some(nd) => raw
            .into_iter()
            .map(|v| if v == nd { f64::NAN } else { v })
            .collect(),
        None => raw,
    };

    let mut grid = Grid::from_vec(values, rows, cols)?;
    if let Some(transform) = read_geotransform(&mut decoder) {
        grid.set_transform(transform);
    }
    Ok(grid)
}

/// Try to assemble a transform from ModelPixelScale + ModelTiepoint
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [pixel_col, pixel_row, _, world_x, world_y, _]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Write a Grid as a single-band 64-bit float GeoTIFF
pub fn write_geotiff<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<()> {
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyGrid);
    }

    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {e}")))?;

    let mut image = encoder
        .new_image::<Gray64Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("cannot create TIFF image: {e}")))?;

    let gt = grid.transform();

    let scale = [gt.cell_width, gt.cell_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| Error::Other(format!("cannot write pixel scale tag: {e}")))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| Error::Other(format!("cannot write tiepoint tag: {e}")))?;

    // Minimal geokey directory (projected model, pixel-is-area) so common
    // GIS tools accept the file.
    let geokeys: [u16; 12] = [
        1, 1, 0, 2, //
        1024, 0, 1, 1, //
        1025, 0, 1, 1, //
    ];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(|e| Error::Other(format!("cannot write geokey tag: {e}")))?;

    let data: Vec<f64> = grid.data().iter().copied().collect();
    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("cannot write TIFF data: {e}")))?;

    Ok(())
}
