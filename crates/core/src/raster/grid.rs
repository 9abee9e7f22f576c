//! Main Grid type

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A georeferenced elevation/value grid.
///
/// Values are stored as `f64` in row-major order (row, col). NaN is the
/// one and only no-data sentinel: every algorithm skips NaN cells and
/// never lets one participate in a comparison or a sum.
///
/// # Example
///
/// ```ignore
/// use demflow_core::Grid;
///
/// let mut grid = Grid::new(100, 100);
/// grid.set(10, 20, 42.0)?;
/// let value = grid.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    /// Cell values, row-major (row, col)
    data: Array2<f64>,
    /// Affine transformation
    transform: GeoTransform,
    /// Source projection, carried through opaquely
    projection: Option<String>,
}

impl Grid {
    /// Create a new grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            projection: None,
        }
    }

    /// Create a new grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            projection: None,
        }
    }

    /// Create a grid from row-major values
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions { rows, cols });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            projection: None,
        })
    }

    /// Create a grid with this grid's georeferencing and the given fill
    /// value. Algorithms use this to derive outputs without touching
    /// their input.
    pub fn like(&self, fill_value: f64) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            projection: self.projection.clone(),
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> f64 {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Set value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn set_unchecked(&mut self, row: usize, col: usize, value: f64) {
        unsafe {
            *self.data.uget_mut((row, col)) = value;
        }
    }

    /// Whether the cell at (row, col) holds a valid (non-NaN) value.
    /// Out-of-bounds counts as invalid.
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.data.get((row, col)).is_some_and(|v| !v.is_nan())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the source projection string, if any
    pub fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    /// Set the source projection string
    pub fn set_projection(&mut self, projection: Option<String>) {
        self.projection = projection;
    }

    /// Absolute area covered by one cell
    pub fn cell_area(&self) -> f64 {
        self.transform.cell_area()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.rows(), self.cols())
    }

    // Coordinate semantics

    /// World coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.cell_center(row, col)
    }

    /// Per-column world X coordinates of cell centers. Monotonic in the
    /// sign of `cell_width`.
    pub fn x_coords(&self) -> Vec<f64> {
        (0..self.cols()).map(|c| self.transform.x_center(c)).collect()
    }

    /// Per-row world Y coordinates of cell centers. Monotonic in the
    /// sign of `cell_height`.
    pub fn y_coords(&self) -> Vec<f64> {
        (0..self.rows()).map(|r| self.transform.y_center(r)).collect()
    }

    /// Bilinearly interpolated value at a world coordinate.
    ///
    /// Errors on an empty grid or when the coordinate falls outside the
    /// extent. Coordinates within half a cell of the boundary are also
    /// rejected, since the four supporting cell centers would leave the
    /// grid (last-row/last-column exclusion). A NaN among the four
    /// supports propagates to the result.
    pub fn value_at(&self, x: f64, y: f64) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::EmptyGrid);
        }

        let (rows, cols) = self.shape();
        let (fc, fr) = self.transform.fractional_index(x, y);
        if fc < 0.0 || fr < 0.0 || fc > cols as f64 || fr > rows as f64 {
            return Err(Error::OutOfExtent { x, y });
        }

        // Shift into cell-center space: integer k lands on the center of
        // column/row k.
        let u = fc - 0.5;
        let v = fr - 0.5;
        let c0 = u.floor();
        let r0 = v.floor();

        if c0 < 0.0 || r0 < 0.0 || c0 as usize + 1 > cols - 1 || r0 as usize + 1 > rows - 1 {
            return Err(Error::OutOfExtent { x, y });
        }

        let c0 = c0 as usize;
        let r0 = r0 as usize;
        let tx = u - c0 as f64;
        let ty = v - r0 as f64;

        let z00 = unsafe { self.get_unchecked(r0, c0) };
        let z01 = unsafe { self.get_unchecked(r0, c0 + 1) };
        let z10 = unsafe { self.get_unchecked(r0 + 1, c0) };
        let z11 = unsafe { self.get_unchecked(r0 + 1, c0 + 1) };

        let top = z00 * (1.0 - tx) + z01 * tx;
        let bottom = z10 * (1.0 - tx) + z11 * tx;
        Ok(top * (1.0 - ty) + bottom * ty)
    }

    /// Nearest cell indices (row, col) for a world coordinate.
    ///
    /// Errors when the coordinate is fully outside the extent; inside it,
    /// the result is clamped to the valid index range.
    pub fn indices_at(&self, x: f64, y: f64) -> Result<(usize, usize)> {
        if self.is_empty() {
            return Err(Error::EmptyGrid);
        }

        let (rows, cols) = self.shape();
        let (fc, fr) = self.transform.fractional_index(x, y);
        if fc < 0.0 || fr < 0.0 || fc > cols as f64 || fr > rows as f64 {
            return Err(Error::OutOfExtent { x, y });
        }

        let col = (fc.floor() as usize).min(cols - 1);
        let row = (fr.floor() as usize).min(rows - 1);
        Ok((row, col))
    }

    // Statistics

    /// Basic statistics over valid (non-NaN) cells
    pub fn statistics(&self) -> GridStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter() {
            if value.is_nan() {
                continue;
            }
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
            sum += value;
            count += 1;
        }

        GridStatistics {
            min: (count > 0).then_some(min),
            max: (count > 0).then_some(max),
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }

    /// Number of valid (non-NaN) cells
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Basic statistics for a grid
#[derive(Debug, Clone)]
pub struct GridStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(100, 200);
        assert_eq!(grid.rows(), 100);
        assert_eq!(grid.cols(), 200);
        assert_eq!(grid.shape(), (100, 200));
    }

    #[test]
    fn test_grid_access() {
        let mut grid = Grid::new(10, 10);
        grid.set(5, 5, 42.0).unwrap();
        assert_eq!(grid.get(5, 5).unwrap(), 42.0);
        assert!(grid.get(10, 0).is_err());
    }

    #[test]
    fn test_statistics_skip_nan() {
        let mut grid = Grid::new(10, 10);
        for row in 0..10 {
            for col in 0..10 {
                grid.set(row, col, (row * 10 + col) as f64).unwrap();
            }
        }
        grid.set(0, 0, f64::NAN).unwrap();

        let stats = grid.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
    }

    #[test]
    fn test_coord_arrays_monotonic() {
        let mut grid = Grid::new(4, 3);
        grid.set_transform(GeoTransform::new(10.0, 40.0, 2.0, -2.0));

        let xs = grid.x_coords();
        let ys = grid.y_coords();
        assert_eq!(xs, vec![11.0, 13.0, 15.0]);
        assert_eq!(ys, vec![39.0, 37.0, 35.0, 33.0]);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_value_at_bilinear_plane() {
        // z = x + y reproduces exactly under bilinear interpolation
        let mut grid = Grid::new(5, 5);
        grid.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        for row in 0..5 {
            for col in 0..5 {
                let (x, y) = grid.cell_center(row, col);
                grid.set(row, col, x + y).unwrap();
            }
        }

        let v = grid.value_at(2.3, 2.7).unwrap();
        assert_relative_eq!(v, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_value_at_out_of_extent() {
        let grid = Grid::new(5, 5);
        assert!(matches!(
            grid.value_at(-1.0, 2.0),
            Err(Error::OutOfExtent { .. })
        ));
        // Inside the extent but within half a cell of the boundary
        assert!(grid.value_at(0.2, -0.2).is_err());
    }

    #[test]
    fn test_value_at_empty_grid() {
        let grid = Grid::new(0, 0);
        assert!(matches!(grid.value_at(0.0, 0.0), Err(Error::EmptyGrid)));
    }

    #[test]
    fn test_indices_at_clamps() {
        let mut grid = Grid::new(4, 4);
        grid.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));

        assert_eq!(grid.indices_at(2.5, 1.5).unwrap(), (2, 2));
        // Exactly on the far boundary clamps into range
        assert_eq!(grid.indices_at(4.0, 0.0).unwrap(), (3, 3));
        assert!(grid.indices_at(5.0, 0.0).is_err());
    }
}
