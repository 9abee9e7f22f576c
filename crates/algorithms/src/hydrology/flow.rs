//! Flow routing models
//!
//! D4 considers the four orthogonal neighbors, D8 adds the diagonals.
//! Single-flow routing picks the steepest-descent neighbor by gradient
//! (drop over center distance, strict comparison; flats and pits have
//! no downslope neighbor). Multiple flow direction (MFD) instead weights
//! every downslope neighbor by `(drop / distance)^p`.
//!
//! Grid boundaries are hard edges: neighbors outside the grid are never
//! candidates, and NaN neighbors are skipped rather than treated as low.

use demflow_core::Grid;

/// D8 neighbor offsets (row, col): E, NE, N, NW, W, SW, S, SE
pub(crate) const D8_OFFSETS: [(isize, isize); 8] = [
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// D4 neighbor offsets (row, col): E, N, W, S
pub(crate) const D4_OFFSETS: [(isize, isize); 4] = [(0, 1), (-1, 0), (0, -1), (1, 0)];

/// Neighbor connectivity for flow routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowRouting {
    /// 4-connected (orthogonal neighbors only)
    D4,
    /// 8-connected (orthogonal + diagonal neighbors)
    #[default]
    D8,
}

impl FlowRouting {
    /// Neighbor offsets for this connectivity
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            FlowRouting::D4 => &D4_OFFSETS,
            FlowRouting::D8 => &D8_OFFSETS,
        }
    }
}

/// Center-to-center distance for a neighbor offset, in world units.
/// Handles non-square cells: diagonals are sqrt(cw² + ch²).
pub(crate) fn offset_distance(grid: &Grid, dr: isize, dc: isize) -> f64 {
    let gt = grid.transform();
    let dx = dc as f64 * gt.cell_width;
    let dy = dr as f64 * gt.cell_height;
    (dx * dx + dy * dy).sqrt()
}

/// The steepest-descent neighbor of (row, col), or None for pits, flats,
/// NaN cells and cells whose lower neighbors all lie outside the grid.
pub fn steepest_descent(
    grid: &Grid,
    row: usize,
    col: usize,
    routing: FlowRouting,
) -> Option<(usize, usize)> {
    let (rows, cols) = grid.shape();
    let center = grid.get(row, col).ok()?;
    if center.is_nan() {
        return None;
    }

    let mut best_gradient = 0.0_f64;
    let mut best: Option<(usize, usize)> = None;

    for &(dr, dc) in routing.offsets() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }

        let neighbor = unsafe { grid.get_unchecked(nr as usize, nc as usize) };
        if neighbor.is_nan() {
            continue;
        }

        let drop = center - neighbor;
        if drop <= 0.0 {
            continue;
        }

        let gradient = drop / offset_distance(grid, dr, dc);
        if gradient > best_gradient {
            best_gradient = gradient;
            best = Some((nr as usize, nc as usize));
        }
    }

    best
}

/// Whether (row, col) is a sink: a valid cell with no strictly lower
/// valid neighbor. NaN cells are never sinks.
pub fn is_sink(grid: &Grid, row: usize, col: usize, routing: FlowRouting) -> bool {
    let (rows, cols) = grid.shape();
    let center = match grid.get(row, col) {
        Ok(v) if !v.is_nan() => v,
        _ => return false,
    };

    for &(dr, dc) in routing.offsets() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }
        let neighbor = unsafe { grid.get_unchecked(nr as usize, nc as usize) };
        if neighbor.is_nan() {
            continue;
        }
        if neighbor < center {
            return false;
        }
    }
    true
}

/// MFD weights `(drop / distance)^exponent` for every downslope neighbor
/// of (row, col), written into `weights` (indexed like
/// `routing.offsets()`, unused slots zeroed). Returns the weight sum for
/// normalization; 0.0 means no downslope neighbor.
pub fn downslope_weights(
    grid: &Grid,
    row: usize,
    col: usize,
    routing: FlowRouting,
    exponent: f64,
    weights: &mut [f64; 8],
) -> f64 {
    let (rows, cols) = grid.shape();
    weights.fill(0.0);

    let center = match grid.get(row, col) {
        Ok(v) if !v.is_nan() => v,
        _ => return 0.0,
    };

    let mut sum = 0.0;
    for (idx, &(dr, dc)) in routing.offsets().iter().enumerate() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }

        let neighbor = unsafe { grid.get_unchecked(nr as usize, nc as usize) };
        if neighbor.is_nan() {
            continue;
        }

        let drop = center - neighbor;
        if drop <= 0.0 {
            continue;
        }

        let w = (drop / offset_distance(grid, dr, dc)).powf(exponent);
        weights[idx] = w;
        sum += w;
    }
    sum
}

/// All strictly-lower valid neighbors of (row, col)
pub(crate) fn downslope_neighbors(
    grid: &Grid,
    row: usize,
    col: usize,
    routing: FlowRouting,
) -> Vec<(usize, usize)> {
    let (rows, cols) = grid.shape();
    let mut result = Vec::new();

    let center = match grid.get(row, col) {
        Ok(v) if !v.is_nan() => v,
        _ => return result,
    };

    for &(dr, dc) in routing.offsets() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }
        let neighbor = unsafe { grid.get_unchecked(nr as usize, nc as usize) };
        if !neighbor.is_nan() && neighbor < center {
            result.push((nr as usize, nc as usize));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use demflow_core::GeoTransform;

    fn east_ramp() -> Grid {
        // Elevation decreases eastward
        let mut grid = Grid::new(5, 5);
        grid.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        for row in 0..5 {
            for col in 0..5 {
                grid.set(row, col, (5 - col) as f64 * 10.0).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_steepest_descent_east() {
        let grid = east_ramp();
        assert_eq!(steepest_descent(&grid, 2, 2, FlowRouting::D8), Some((2, 3)));
        assert_eq!(steepest_descent(&grid, 2, 2, FlowRouting::D4), Some((2, 3)));
    }

    #[test]
    fn test_steepest_descent_diagonal_needs_d8() {
        // Elevation decreases toward the south-east corner
        let mut grid = Grid::new(5, 5);
        grid.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        for row in 0..5 {
            for col in 0..5 {
                grid.set(row, col, (20 - 2 * (row + col)) as f64).unwrap();
            }
        }

        assert_eq!(steepest_descent(&grid, 2, 2, FlowRouting::D8), Some((3, 3)));
        // D4 cannot go diagonally; E and S tie and the first offset wins
        assert_eq!(steepest_descent(&grid, 2, 2, FlowRouting::D4), Some((2, 3)));
    }

    #[test]
    fn test_pit_and_flat_have_no_descent() {
        let mut flat = Grid::filled(3, 3, 7.0);
        flat.set_transform(GeoTransform::default());
        assert_eq!(steepest_descent(&flat, 1, 1, FlowRouting::D8), None);
        assert!(is_sink(&flat, 1, 1, FlowRouting::D8));

        let mut pit = Grid::filled(3, 3, 7.0);
        pit.set(1, 1, 1.0).unwrap();
        assert_eq!(steepest_descent(&pit, 1, 1, FlowRouting::D8), None);
        assert!(is_sink(&pit, 1, 1, FlowRouting::D8));
        assert!(!is_sink(&pit, 0, 0, FlowRouting::D8));
    }

    #[test]
    fn test_nan_neighbors_ignored() {
        let mut grid = Grid::filled(3, 3, 5.0);
        // Surround the center with NaN except one lower neighbor
        for &(dr, dc) in &D8_OFFSETS {
            let r = (1 + dr) as usize;
            let c = (1 + dc) as usize;
            grid.set(r, c, f64::NAN).unwrap();
        }
        assert!(is_sink(&grid, 1, 1, FlowRouting::D8));

        grid.set(0, 1, 2.0).unwrap();
        assert_eq!(steepest_descent(&grid, 1, 1, FlowRouting::D8), Some((0, 1)));
        assert!(!is_sink(&grid, 1, 1, FlowRouting::D8));
    }

    #[test]
    fn test_mfd_weights_normalize() {
        let mut grid = Grid::filled(3, 3, 5.0);
        grid.set_transform(GeoTransform::default());
        grid.set(1, 2, 3.0).unwrap();
        grid.set(2, 1, 1.0).unwrap();

        let mut weights = [0.0_f64; 8];
        let sum = downslope_weights(&grid, 1, 1, FlowRouting::D8, 1.0, &mut weights);

        assert!(sum > 0.0);
        // E (index 0) gets drop 2, S (index 6) gets drop 4
        assert!(weights[0] > 0.0);
        assert!(weights[6] > weights[0]);
        let total: f64 = weights.iter().sum();
        assert!((total - sum).abs() < 1e-12);
    }

    #[test]
    fn test_mfd_exponent_concentrates() {
        let mut grid = Grid::filled(3, 3, 5.0);
        grid.set_transform(GeoTransform::default());
        grid.set(1, 2, 3.0).unwrap();
        grid.set(2, 1, 1.0).unwrap();

        let mut w1 = [0.0_f64; 8];
        let mut w4 = [0.0_f64; 8];
        let s1 = downslope_weights(&grid, 1, 1, FlowRouting::D8, 1.0, &mut w1);
        let s4 = downslope_weights(&grid, 1, 1, FlowRouting::D8, 4.0, &mut w4);

        // Higher exponent shifts a larger share onto the steeper neighbor
        assert!(w4[6] / s4 > w1[6] / s1);
    }
}
