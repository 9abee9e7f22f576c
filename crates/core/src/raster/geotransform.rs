//! Affine georeferencing for grids

use serde::{Deserialize, Serialize};

/// Affine mapping between cell indices (col, row) and world coordinates.
///
/// ```text
/// x = origin_x + (col + 0.5) * cell_width     (cell centers)
/// y = origin_y + (row + 0.5) * cell_height
/// ```
///
/// `(origin_x, origin_y)` is the outer corner of cell (0, 0). Rotation
/// terms are not supported. For north-up grids `cell_height` is negative,
/// so `y` decreases with increasing row index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the corner of cell (0, 0)
    pub origin_x: f64,
    /// Y coordinate of the corner of cell (0, 0)
    pub origin_y: f64,
    /// Cell size along X (signed)
    pub cell_width: f64,
    /// Cell size along Y (signed, usually negative)
    pub cell_height: f64,
}

impl GeoTransform {
    /// Create a new transform
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
        }
    }

    /// World X coordinate of the center of column `col`
    pub fn x_center(&self, col: usize) -> f64 {
        self.origin_x + (col as f64 + 0.5) * self.cell_width
    }

    /// World Y coordinate of the center of row `row`
    pub fn y_center(&self, row: usize) -> f64 {
        self.origin_y + (row as f64 + 0.5) * self.cell_height
    }

    /// World coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (self.x_center(col), self.y_center(row))
    }

    /// Fractional (col, row) position of a world coordinate, measured in
    /// cells from the grid origin. A point inside the extent of an
    /// `rows`×`cols` grid maps to `0.0..=cols` × `0.0..=rows`.
    pub fn fractional_index(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.cell_width,
            (y - self.origin_y) / self.cell_height,
        )
    }

    /// Absolute area covered by one cell
    pub fn cell_area(&self) -> f64 {
        (self.cell_width * self.cell_height).abs()
    }

    /// Whether rows run from north to south (negative cell height)
    pub fn is_north_up(&self) -> bool {
        self.cell_height < 0.0
    }

    /// Bounding box (min_x, min_y, max_x, max_y) of a grid with the
    /// given dimensions
    pub fn bounds(&self, rows: usize, cols: usize) -> (f64, f64, f64, f64) {
        let x0 = self.origin_x;
        let x1 = self.origin_x + cols as f64 * self.cell_width;
        let y0 = self.origin_y;
        let y1 = self.origin_y + rows as f64 * self.cell_height;
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
