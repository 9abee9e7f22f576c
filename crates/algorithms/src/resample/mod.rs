//! Grid resampling
//!
//! Two strategies, both spanning the source extent exactly with the new
//! cell counts and preserving cell-size signs:
//! - bilinear point sampling of the new cell centers, for smooth fields
//! - block averaging of source cells, for downscaling with conservation
//!
//! Target cells whose bilinear support would cross the source's last
//! row/column come back NaN, as do average cells with no valid source
//! contributor.

use crate::maybe_rayon::*;
use demflow_core::{Algorithm, Error, GeoTransform, Grid, Result};
use ndarray::Array2;

/// Resampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleMethod {
    /// Bilinear interpolation at target cell centers
    #[default]
    Bilinear,
    /// Mean of valid source cells per target cell
    Average,
}

/// Parameters for resampling
#[derive(Debug, Clone)]
pub struct ResampleParams {
    pub rows: usize,
    pub cols: usize,
    pub method: ResampleMethod,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            method: ResampleMethod::Bilinear,
        }
    }
}

/// Resampling algorithm
#[derive(Debug, Clone, Default)]
pub struct Resample;

impl Algorithm for Resample {
    type Input = Grid;
    type Output = Grid;
    type Params = ResampleParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Resample"
    }

    fn description(&self) -> &'static str {
        "Resample a grid to new dimensions by bilinear sampling or block averaging"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        match params.method {
            ResampleMethod::Bilinear => resample_bilinear(&input, params.rows, params.cols),
            ResampleMethod::Average => resample_average(&input, params.rows, params.cols),
        }
    }
}

fn target_transform(grid: &Grid, new_rows: usize, new_cols: usize) -> Result<GeoTransform> {
    if new_rows == 0 || new_cols == 0 {
        return Err(Error::InvalidParameter {
            name: "dimensions",
            value: format!("{new_rows}x{new_cols}"),
            reason: "target grid size must be positive".into(),
        });
    }
    if grid.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let (rows, cols) = grid.shape();
    let gt = grid.transform();
    Ok(GeoTransform::new(
        gt.origin_x,
        gt.origin_y,
        gt.cell_width * cols as f64 / new_cols as f64,
        gt.cell_height * rows as f64 / new_rows as f64,
    ))
}

/// Resample by bilinear interpolation at the new cell centers.
///
/// Cells whose interpolation support leaves the source grid become NaN
/// rather than failing the whole operation.
pub fn resample_bilinear(grid: &Grid, new_rows: usize, new_cols: usize) -> Result<Grid> {
    let new_gt = target_transform(grid, new_rows, new_cols)?;

    let data: Vec<f64> = (0..new_rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; new_cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let (x, y) = new_gt.cell_center(row, col);
                if let Ok(v) = grid.value_at(x, y) {
                    *slot = v;
                }
            }
            row_data
        })
        .collect();

    let mut output = Grid::from_vec(data, new_rows, new_cols)?;
    output.set_transform(new_gt);
    output.set_projection(grid.projection().map(str::to_owned));
    Ok(output)
}

/// Resample by block-averaging valid source cells.
///
/// Every source cell contributes to exactly one target cell (the one
/// whose source index range contains it); a target with no valid
/// contributor stays NaN.
pub fn resample_average(grid: &Grid, new_rows: usize, new_cols: usize) -> Result<Grid> {
    let new_gt = target_transform(grid, new_rows, new_cols)?;
    let (rows, cols) = grid.shape();

    let mut sums = Array2::<f64>::zeros((new_rows, new_cols));
    let mut counts = Array2::<u32>::zeros((new_rows, new_cols));

    for row in 0..rows {
        let tr = row * new_rows / rows;
        for col in 0..cols {
            let v = unsafe { grid.get_unchecked(row, col) };
            if v.is_nan() {
                continue;
            }
            let tc = col * new_cols / cols;
            sums[(tr, tc)] += v;
            counts[(tr, tc)] += 1;
        }
    }

    let mut data = Array2::<f64>::from_elem((new_rows, new_cols), f64::NAN);
    for row in 0..new_rows {
        for col in 0..new_cols {
            let n = counts[(row, col)];
            if n > 0 {
                data[(row, col)] = sums[(row, col)] / n as f64;
            }
        }
    }

    let mut output = Grid::new(new_rows, new_cols);
    *output.data_mut() = data;
    output.set_transform(new_gt);
    output.set_projection(grid.projection().map(str::to_owned));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane(rows: usize, cols: usize) -> Grid {
        // z = x + y, exact under bilinear interpolation
        let mut grid = Grid::new(rows, cols);
        grid.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = grid.cell_center(row, col);
                grid.set(row, col, x + y).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_bilinear_preserves_plane() {
        let grid = plane(8, 8);
        let out = resample_bilinear(&grid, 4, 4).unwrap();

        assert_eq!(out.shape(), (4, 4));
        assert_relative_eq!(out.transform().cell_width, 2.0);
        assert_relative_eq!(out.transform().cell_height, -2.0);

        // Interior cells reproduce the plane exactly
        for row in 1..3 {
            for col in 1..3 {
                let (x, y) = out.cell_center(row, col);
                assert_relative_eq!(out.get(row, col).unwrap(), x + y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_bilinear_edge_cells_feed_through_nan() {
        // Upsampling pushes outer target centers within half a source
        // cell of the boundary, where bilinear support is incomplete
        let grid = plane(4, 4);
        let out = resample_bilinear(&grid, 8, 8).unwrap();

        assert!(out.get(0, 0).unwrap().is_nan());
        assert!(!out.get(4, 4).unwrap().is_nan());
    }

    #[test]
    fn test_bilinear_rejects_zero_size() {
        let grid = plane(4, 4);
        assert!(resample_bilinear(&grid, 0, 4).is_err());
    }

    #[test]
    fn test_average_blocks() {
        let mut grid = Grid::new(4, 4);
        grid.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        for row in 0..4 {
            for col in 0..4 {
                grid.set(row, col, (row / 2 * 2 + col / 2) as f64 * 10.0).unwrap();
            }
        }

        let out = resample_average(&grid, 2, 2).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.0);
        assert_relative_eq!(out.get(0, 1).unwrap(), 10.0);
        assert_relative_eq!(out.get(1, 0).unwrap(), 20.0);
        assert_relative_eq!(out.get(1, 1).unwrap(), 30.0);
    }

    #[test]
    fn test_average_skips_nan_and_marks_empty_blocks() {
        let mut grid = Grid::filled(4, 4, f64::NAN);
        grid.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        grid.set(0, 0, 6.0).unwrap();
        grid.set(1, 1, 2.0).unwrap();

        let out = resample_average(&grid, 2, 2).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 4.0);
        assert!(out.get(0, 1).unwrap().is_nan());
        assert!(out.get(1, 0).unwrap().is_nan());
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_average_roundtrip_conserves_sum() {
        let grid = plane(8, 8);
        let down = resample_average(&grid, 4, 4).unwrap();
        let up = resample_average(&down, 8, 8).unwrap();

        let sum = |g: &Grid| -> f64 {
            g.data().iter().filter(|v| !v.is_nan()).sum::<f64>()
        };

        // Each 4x4 cell replicates into one of the 8x8 cells; the other
        // three stay NaN, so compare area-weighted totals
        let total_down = sum(&down) * down.cell_area();
        let total_orig = sum(&grid) * grid.cell_area();
        assert_relative_eq!(total_down, total_orig, max_relative = 1e-12);

        let up_stats = up.statistics();
        assert!(up_stats.valid_count > 0);
        assert_relative_eq!(
            up_stats.mean.unwrap(),
            down.statistics().mean.unwrap(),
            max_relative = 1e-12
        );
    }
}
