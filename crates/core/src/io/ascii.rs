//! Plain-text (Arc/Info ASCII) grid reading and writing
//!
//! Header: `ncols`, `nrows`, `xllcorner`, `yllcorner`, `cellsize`,
//! `NODATA_value`, followed by row-major values from the top row down.
//! The NODATA marker maps to NaN on read and back on write.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Grid};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Default NODATA marker when writing
const DEFAULT_NODATA: f64 = -9999.0;

/// Read an ASCII grid file
pub fn read_ascii_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let file = File::open(path.as_ref())?;
    read_ascii_grid_from(BufReader::new(file))
}

/// Read an ASCII grid from any buffered reader
pub fn read_ascii_grid_from<R: BufRead>(reader: R) -> Result<Grid> {
    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut xllcorner: Option<f64> = None;
    let mut yllcorner: Option<f64> = None;
    let mut cellsize: Option<f64> = None;
    let mut nodata = DEFAULT_NODATA;

    let mut values: Vec<f64> = Vec::new();
    let mut in_header = true;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if in_header {
            let mut parts = trimmed.split_whitespace();
            let key = parts.next().unwrap_or_default().to_ascii_lowercase();
            let header_value = parts.next();

            let parse_f64 = |v: Option<&str>| -> Result<f64> {
                v.and_then(|s| s.parse().ok()).ok_or(Error::Parse {
                    line: line_no,
                    message: format!("cannot parse header value in {trimmed:?}"),
                })
            };

            match key.as_str() {
                "ncols" => {
                    ncols = Some(parse_f64(header_value)? as usize);
                    continue;
                }
                "nrows" => {
                    nrows = Some(parse_f64(header_value)? as usize);
                    continue;
                }
                "xllcorner" => {
                    xllcorner = Some(parse_f64(header_value)?);
                    continue;
                }
                "yllcorner" => {
                    yllcorner = Some(parse_f64(header_value)?);
                    continue;
                }
                "cellsize" => {
                    cellsize = Some(parse_f64(header_value)?);
                    continue;
                }
                "nodata_value" => {
                    nodata = parse_f64(header_value)?;
                    continue;
                }
                _ => in_header = false, // first data row
            }
        }

        for token in trimmed.split_whitespace() {
            let v: f64 = token.parse().map_err(|_| Error::Parse {
                line: line_no,
                message: format!("cannot parse value {token:?}"),
            })?;
            values.push(if v == nodata { f64::NAN } else { v });
        }
    }

    let (Some(cols), Some(rows), Some(xll), Some(yll), Some(cell)) =
        (ncols, nrows, xllcorner, yllcorner, cellsize)
    else {
        return Err(Error::Parse {
            line: 0,
            message: "incomplete header: need ncols, nrows, xllcorner, yllcorner, cellsize".into(),
        });
    };

    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    if values.len() != rows * cols {
        return Err(Error::Parse {
            line: 0,
            message: format!("expected {} values, found {}", rows * cols, values.len()),
        });
    }

    // Rows are stored top-down; the origin is the upper-left corner.
    let mut grid = Grid::from_vec(values, rows, cols)?;
    grid.set_transform(GeoTransform::new(
        xll,
        yll + rows as f64 * cell,
        cell,
        -cell,
    ));
    Ok(grid)
}

/// Write a grid as an ASCII grid file.
///
/// Requires square cells (|cell_width| == |cell_height|); NaN cells are
/// written as the NODATA marker. Rows come out top-down regardless of
/// the grid's row ordering.
pub fn write_ascii_grid<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<()> {
    let gt = *grid.transform();
    if (gt.cell_width.abs() - gt.cell_height.abs()).abs() > 1e-9 * gt.cell_width.abs() {
        return Err(Error::InvalidParameter {
            name: "cellsize",
            value: format!("{} x {}", gt.cell_width, gt.cell_height),
            reason: "ASCII grids require square cells".into(),
        });
    }

    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyGrid);
    }

    let cell = gt.cell_width.abs();
    let (min_x, min_y, _, _) = grid.bounds();

    let file = File::create(path.as_ref())?;
    let mut w = BufWriter::new(file);

    writeln!(w, "ncols         {cols}")?;
    writeln!(w, "nrows         {rows}")?;
    writeln!(w, "xllcorner     {min_x}")?;
    writeln!(w, "yllcorner     {min_y}")?;
    writeln!(w, "cellsize      {cell}")?;
    writeln!(w, "NODATA_value  {DEFAULT_NODATA}")?;

    // Emit north-to-south: if cell_height is positive, row 0 is the
    // southernmost and the order flips.
    let row_order: Box<dyn Iterator<Item = usize>> = if gt.is_north_up() {
        Box::new(0..rows)
    } else {
        Box::new((0..rows).rev())
    };

    for row in row_order {
        let mut first = true;
        for col in 0..cols {
            let v = unsafe { grid.get_unchecked(row, col) };
            if !first {
                write!(w, " ")?;
            }
            if v.is_nan() {
                write!(w, "{DEFAULT_NODATA}")?;
            } else {
                write!(w, "{v}")?;
            }
            first = false;
        }
        writeln!(w)?;
    }

    w.flush()?;
    Ok(())
}
