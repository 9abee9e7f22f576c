//! Watershed delineation by upstream traversal
//!
//! The single-flow variant links every cell to its unique steepest-
//! descent target, then walks the reverse edges from the pour point.
//! Each candidate is admitted only after its own downhill walk is
//! replayed all the way to the target; an inflow edge alone is not
//! proof of membership. The MFD variant admits a cell when any downhill
//! path reaches the target, explored with an explicit stack.

use crate::hydrology::flow::{downslope_neighbors, steepest_descent, FlowRouting};
use demflow_core::{Algorithm, Error, Grid, Result};
use std::collections::{HashSet, VecDeque};

/// Parameters for watershed delineation
#[derive(Debug, Clone, Default)]
pub struct WatershedParams {
    /// Pour point (row, col)
    pub target: (usize, usize),
    /// Neighbor connectivity
    pub routing: FlowRouting,
    /// When set, grow across the pour point's neighbors until the
    /// watershed holds at least this many valid cells
    pub min_size: Option<usize>,
}

/// Watershed delineation algorithm
#[derive(Debug, Clone, Default)]
pub struct WatershedDelineation;

impl Algorithm for WatershedDelineation {
    type Input = Grid;
    type Output = Grid;
    type Params = WatershedParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Watershed"
    }

    fn description(&self) -> &'static str {
        "Delineate the upstream area draining to a pour point"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        match params.min_size {
            Some(min_size) => watershed_threshold(&input, params.target, min_size, params.routing),
            None => watershed(&input, params.target, params.routing),
        }
    }
}

fn check_target(grid: &Grid, target: (usize, usize)) -> Result<()> {
    let (rows, cols) = grid.shape();
    if target.0 >= rows || target.1 >= cols {
        return Err(Error::IndexOutOfBounds {
            row: target.0,
            col: target.1,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Unique downslope target of every cell, as a flat index table.
/// `usize::MAX` marks cells with no downslope step.
fn downstream_table(grid: &Grid, routing: FlowRouting) -> Vec<usize> {
    let (rows, cols) = grid.shape();
    let mut table = vec![usize::MAX; rows * cols];
    for row in 0..rows {
        for col in 0..cols {
            if let Some((tr, tc)) = steepest_descent(grid, row, col, routing) {
                table[row * cols + col] = tr * cols + tc;
            }
        }
    }
    table
}

/// Replay a cell's unique downhill walk; true if it reaches `target`.
/// Bounded by the table length, so a malformed table cannot loop.
fn drains_to(table: &[usize], mut from: usize, target: usize) -> bool {
    let mut steps = 0usize;
    while from != usize::MAX {
        if from == target {
            return true;
        }
        steps += 1;
        if steps > table.len() {
            return false;
        }
        from = table[from];
    }
    false
}

/// Delineate the single-flow watershed of a pour point.
///
/// Returns a grid holding the original elevation on contributing cells
/// and NaN everywhere else. The pour point itself is always a member
/// (when it holds data). A NaN pour point yields an all-NaN grid, which
/// is a degenerate result rather than an error.
pub fn watershed(grid: &Grid, target: (usize, usize), routing: FlowRouting) -> Result<Grid> {
    check_target(grid, target)?;
    let (rows, cols) = grid.shape();
    let mut output = grid.like(f64::NAN);

    let (tr, tc) = target;
    if !grid.is_valid(tr, tc) {
        return Ok(output);
    }

    let table = downstream_table(grid, routing);
    let target_idx = tr * cols + tc;

    // Reverse adjacency: which cells step directly into each cell
    let mut inflow: Vec<Vec<usize>> = vec![Vec::new(); rows * cols];
    for (idx, &to) in table.iter().enumerate() {
        if to != usize::MAX {
            inflow[to].push(idx);
        }
    }

    let mut member = vec![false; rows * cols];
    member[target_idx] = true;
    let mut queue = VecDeque::new();
    queue.push_back(target_idx);

    while let Some(idx) = queue.pop_front() {
        for &up in &inflow[idx] {
            if member[up] {
                continue;
            }
            if drains_to(&table, up, target_idx) {
                member[up] = true;
                queue.push_back(up);
            }
        }
    }

    for idx in (0..rows * cols).filter(|&i| member[i]) {
        let (row, col) = (idx / cols, idx % cols);
        let z = unsafe { grid.get_unchecked(row, col) };
        unsafe { output.set_unchecked(row, col, z) };
    }
    Ok(output)
}

/// Whether any downhill path from `from` reaches `target`, exploring all
/// downslope neighbors with an explicit stack and a per-call visited set.
fn drains_to_mfd(
    grid: &Grid,
    routing: FlowRouting,
    from: (usize, usize),
    target: (usize, usize),
) -> bool {
    let cols = grid.cols();
    let target_idx = target.0 * cols + target.1;

    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack = vec![from.0 * cols + from.1];

    while let Some(idx) = stack.pop() {
        if idx == target_idx {
            return true;
        }
        if !visited.insert(idx) {
            continue;
        }
        let (row, col) = (idx / cols, idx % cols);
        for (nr, nc) in downslope_neighbors(grid, row, col, routing) {
            let nidx = nr * cols + nc;
            if !visited.contains(&nidx) {
                stack.push(nidx);
            }
        }
    }
    false
}

/// Delineate the multiple-flow watershed of a pour point.
///
/// Inflow enumeration and the reachability check both explore every
/// downslope neighbor, so a cell joins the watershed when any of its
/// downhill paths reaches the target. The result is a superset of the
/// single-flow watershed for the same routing.
pub fn watershed_mfd(grid: &Grid, target: (usize, usize), routing: FlowRouting) -> Result<Grid> {
    check_target(grid, target)?;
    let (rows, cols) = grid.shape();
    let mut output = grid.like(f64::NAN);

    let (tr, tc) = target;
    if !grid.is_valid(tr, tc) {
        return Ok(output);
    }

    let target_idx = tr * cols + tc;
    let mut member = vec![false; rows * cols];
    member[target_idx] = true;
    let mut queue = VecDeque::new();
    queue.push_back((tr, tc));

    while let Some((row, col)) = queue.pop_front() {
        let z = unsafe { grid.get_unchecked(row, col) };

        for &(dr, dc) in routing.offsets() {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            let nidx = nr * cols + nc;
            if member[nidx] {
                continue;
            }

            // Candidate upstream cells sit strictly above this one
            let nz = unsafe { grid.get_unchecked(nr, nc) };
            if nz.is_nan() || nz <= z {
                continue;
            }

            if drains_to_mfd(grid, routing, (nr, nc), target) {
                member[nidx] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    for idx in (0..rows * cols).filter(|&i| member[i]) {
        let (row, col) = (idx / cols, idx % cols);
        let z = unsafe { grid.get_unchecked(row, col) };
        unsafe { output.set_unchecked(row, col, z) };
    }
    Ok(output)
}

/// Delineate a watershed, compensating for pour points that sit a cell
/// off the channel.
///
/// Evaluates the watershed at the exact cell first; if it already holds
/// at least `min_size` valid cells it is returned unchanged. Otherwise
/// the watersheds of the eight neighboring pour points are evaluated
/// too and the largest of the nine wins.
pub fn watershed_threshold(
    grid: &Grid,
    target: (usize, usize),
    min_size: usize,
    routing: FlowRouting,
) -> Result<Grid> {
    check_target(grid, target)?;
    let (rows, cols) = grid.shape();

    let exact = watershed(grid, target, routing)?;
    let exact_size = exact.valid_count();
    if exact_size >= min_size {
        return Ok(exact);
    }

    let mut best = exact;
    let mut best_size = exact_size;

    for &(dr, dc) in crate::hydrology::flow::D8_OFFSETS.iter() {
        let nr = target.0 as isize + dr;
        let nc = target.1 as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }
        let candidate = watershed(grid, (nr as usize, nc as usize), routing)?;
        let size = candidate.valid_count();
        if size > best_size {
            best = candidate;
            best_size = size;
        }
    }
    Ok(best)
}

/// Trim a masked grid to the tight bounding box of cells that are
/// neither NaN nor equal to `nodata`. Errors when no such cell exists.
pub fn crop_masked(grid: &Grid, nodata: f64) -> Result<Grid> {
    let (rows, cols) = grid.shape();

    let mut r0 = rows;
    let mut r1 = 0usize;
    let mut c0 = cols;
    let mut c1 = 0usize;

    for row in 0..rows {
        for col in 0..cols {
            let v = unsafe { grid.get_unchecked(row, col) };
            if v.is_nan() || v == nodata {
                continue;
            }
            r0 = r0.min(row);
            r1 = r1.max(row);
            c0 = c0.min(col);
            c1 = c1.max(col);
        }
    }

    if r0 > r1 {
        return Err(Error::NoValidCells);
    }

    let (new_rows, new_cols) = (r1 - r0 + 1, c1 - c0 + 1);
    let mut output = Grid::new(new_rows, new_cols);

    let gt = *grid.transform();
    let mut cropped_gt = gt;
    cropped_gt.origin_x += c0 as f64 * gt.cell_width;
    cropped_gt.origin_y += r0 as f64 * gt.cell_height;
    output.set_transform(cropped_gt);
    output.set_projection(grid.projection().map(str::to_owned));

    for row in 0..new_rows {
        for col in 0..new_cols {
            let v = unsafe { grid.get_unchecked(r0 + row, c0 + col) };
            unsafe { output.set_unchecked(row, col, v) };
        }
    }
    Ok(output)
}
