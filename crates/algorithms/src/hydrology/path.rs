//! Downstream path tracing
//!
//! Follows steepest descent from a start cell, emitting the world
//! coordinates of each visited cell center, and stops at a pit, a flat
//! or the grid edge. Strict descent makes revisits impossible, so no
//! cycle guard is needed; a step bound equal to the cell count stands
//! in for one anyway.

use crate::hydrology::flow::{steepest_descent, FlowRouting};
use demflow_core::{Error, Grid, Path, Result};

/// Trace the downstream path from a start cell.
///
/// The start cell's center is the first point (when the cell holds
/// data); a start on no-data yields an empty path. Elevation is
/// non-increasing along the result.
pub fn downstream_path(
    grid: &Grid,
    start: (usize, usize),
    routing: FlowRouting,
) -> Result<Path> {
    let (rows, cols) = grid.shape();
    let (mut row, mut col) = start;
    if row >= rows || col >= cols {
        return Err(Error::IndexOutOfBounds {
            row,
            col,
            rows,
            cols,
        });
    }

    let mut path = Path::new();
    if !grid.is_valid(row, col) {
        return Ok(path);
    }

    let (x, y) = grid.cell_center(row, col);
    path.push(x, y);

    let max_steps = rows * cols;
    for _ in 0..max_steps {
        match steepest_descent(grid, row, col, routing) {
            Some((nr, nc)) => {
                let (x, y) = grid.cell_center(nr, nc);
                path.push(x, y);
                row = nr;
                col = nc;
            }
            None => break,
        }
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demflow_core::GeoTransform;

    #[test]
    fn test_path_follows_ramp_to_edge() {
        // Eastward ramp: the path walks along the row to the last column
        let mut grid = Grid::new(3, 5);
        grid.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        for row in 0..3 {
            for col in 0..5 {
                grid.set(row, col, (5 - col) as f64).unwrap();
            }
        }

        let path = downstream_path(&grid, (1, 0), FlowRouting::D4).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.points()[0].x, 0.5);
        assert_eq!(path.points()[4].x, 4.5);
        // Constant row: y stays on the row-1 center line
        assert!(path.iter().all(|p| p.y == 1.5));
    }

    #[test]
    fn test_path_elevation_non_increasing() {
        let mut grid = Grid::new(6, 6);
        grid.set_transform(GeoTransform::new(0.0, 6.0, 1.0, -1.0));
        for row in 0..6 {
            for col in 0..6 {
                let z = ((row as f64 - 2.5).powi(2) + (col as f64 - 2.5).powi(2)).sqrt();
                grid.set(row, col, z).unwrap();
            }
        }

        let path = downstream_path(&grid, (0, 0), FlowRouting::D8).unwrap();
        assert!(path.len() >= 2, "corner should descend into the bowl");

        let mut last = f64::INFINITY;
        for p in path.iter() {
            let (r, c) = grid.indices_at(p.x, p.y).unwrap();
            let z = grid.get(r, c).unwrap();
            assert!(z <= last, "elevation must not increase along the path");
            last = z;
        }
    }

    #[test]
    fn test_path_stops_at_pit() {
        let mut grid = Grid::filled(5, 5, 9.0);
        grid.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        grid.set(2, 2, 1.0).unwrap();

        let path = downstream_path(&grid, (2, 1), FlowRouting::D8).unwrap();
        assert_eq!(path.len(), 2);
        let end = path.points()[1];
        assert_eq!((end.x, end.y), grid.cell_center(2, 2));
    }

    #[test]
    fn test_path_single_point_on_flat() {
        let grid = Grid::filled(4, 4, 2.0);
        let path = downstream_path(&grid, (1, 1), FlowRouting::D8).unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_path_empty_on_nodata_start() {
        let mut grid = Grid::filled(3, 3, 2.0);
        grid.set(1, 1, f64::NAN).unwrap();
        let path = downstream_path(&grid, (1, 1), FlowRouting::D8).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_out_of_bounds_start() {
        let grid = Grid::filled(3, 3, 2.0);
        assert!(downstream_path(&grid, (3, 0), FlowRouting::D8).is_err());
    }
}
