//! Sink detection and iterative sink filling
//!
//! A sink is a valid cell with no strictly lower valid neighbor under
//! the active routing. Filling repeatedly raises interior sinks toward
//! the mean of their valid neighbors; this is a best-effort relaxation
//! with a pass budget, and the result reports whether it converged.

use crate::hydrology::flow::{is_sink, FlowRouting};
use crate::maybe_rayon::*;
use demflow_core::{Algorithm, Error, Grid, Result};
use ndarray::Array2;

/// Parameters for iterative sink filling
#[derive(Debug, Clone)]
pub struct FillSinksParams {
    /// Neighbor connectivity
    pub routing: FlowRouting,
    /// Maximum number of full passes over the grid
    pub max_passes: usize,
}

impl Default for FillSinksParams {
    fn default() -> Self {
        Self {
            routing: FlowRouting::D8,
            max_passes: 100,
        }
    }
}

/// Outcome of `fill_sinks`
#[derive(Debug, Clone)]
pub struct FillResult {
    /// The (possibly still sink-bearing) corrected grid
    pub grid: Grid,
    /// True if a full pass completed without any change
    pub converged: bool,
    /// Number of passes actually run
    pub passes: usize,
}

/// Sink filling algorithm
#[derive(Debug, Clone, Default)]
pub struct FillSinks;

impl Algorithm for FillSinks {
    type Input = Grid;
    type Output = FillResult;
    type Params = FillSinksParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Fill Sinks"
    }

    fn description(&self) -> &'static str {
        "Raise interior sinks toward the mean of their neighbors until stable"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(fill_sinks(&input, params))
    }
}

/// Flag every interior sink cell.
///
/// The boundary ring is excluded by construction (edge cells can always
/// drain off-grid). Output: 1.0 = sink, 0.0 = not a sink, NaN where the
/// input holds no data.
pub fn detect_sinks(grid: &Grid, routing: FlowRouting) -> Grid {
    let (rows, cols) = grid.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0_f64; cols];
            for col in 0..cols {
                let z = unsafe { grid.get_unchecked(row, col) };
                if z.is_nan() {
                    row_data[col] = f64::NAN;
                    continue;
                }
                let interior = row > 0 && row < rows - 1 && col > 0 && col < cols - 1;
                if interior && is_sink(grid, row, col, routing) {
                    row_data[col] = 1.0;
                }
            }
            row_data
        })
        .collect();

    let mut output = grid.like(0.0);
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).expect("shape preserved by row map");
    output
}

/// Iteratively fill sinks by raising them toward the neighbor mean.
///
/// Each pass reads the previous surface and writes raised values into a
/// copy, so results do not depend on sweep order. An interior sink cell
/// with at least one valid neighbor is raised to the arithmetic mean of
/// its valid neighbors, but only when that mean exceeds the current
/// value. The relaxation stops when a full pass changes nothing or the
/// pass budget runs out; `converged` tells the caller which it was.
/// Exhausting the budget is not an error; the caller re-inspects with
/// `detect_sinks` if residual sinks matter.
pub fn fill_sinks(grid: &Grid, params: FillSinksParams) -> FillResult {
    let (rows, cols) = grid.shape();
    let routing = params.routing;
    let mut current = grid.clone();

    if rows < 3 || cols < 3 || params.max_passes == 0 {
        // No interior to raise, or no budget to do it with
        let converged = params.max_passes > 0;
        return FillResult {
            grid: current,
            converged,
            passes: 0,
        };
    }

    for pass in 1..=params.max_passes {
        let mut next = current.clone();
        let mut changed = false;

        for row in 1..rows - 1 {
            for col in 1..cols - 1 {
                let z = unsafe { current.get_unchecked(row, col) };
                if z.is_nan() || !is_sink(&current, row, col, routing) {
                    continue;
                }

                let mut sum = 0.0;
                let mut count = 0usize;
                for &(dr, dc) in routing.offsets() {
                    let nr = (row as isize + dr) as usize;
                    let nc = (col as isize + dc) as usize;
                    let neighbor = unsafe { current.get_unchecked(nr, nc) };
                    if neighbor.is_nan() {
                        continue;
                    }
                    sum += neighbor;
                    count += 1;
                }
                if count == 0 {
                    continue;
                }

                let mean = sum / count as f64;
                if mean > z {
                    unsafe { next.set_unchecked(row, col, mean) };
                    changed = true;
                }
            }
        }

        current = next;
        if !changed {
            return FillResult {
                grid: current,
                converged: true,
                passes: pass,
            };
        }
    }

    FillResult {
        grid: current,
        converged: false,
        passes: params.max_passes,
    }
}
