//! Frontier tracing passes
//!
//! Two whole-grid primitives drive every network algorithm:
//!
//! - `backtrace` walks one step upstream: given a set of recipient cells,
//!   it finds the masked cells whose flow direction lands on a recipient.
//! - `forward_trace` walks one step downstream with values attached: each
//!   frontier value either arrives at its recipient, is deferred because
//!   the recipient still waits on another tributary, or retires where the
//!   flow leaves the mask.
//!
//! `accumulate` iterates `forward_trace` from the headwaters to a fixed
//! point, merging the tributaries of each confluence exactly once. Strahler
//! order and contributing area are both instances of it.

use crate::maybe_rayon::*;
use ndarray::Array2;
use thalweg_core::{Direction, Error, Raster, Result};

use super::grid::FlowGrid;

/// Find the cells that drain directly into `recipients`.
///
/// A masked cell contributes when its own flow direction points at a cell
/// marked non-zero in `recipients`. Recipients themselves are not carried
/// over, so repeated application walks strictly upstream.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
/// * `recipients` - Non-zero cells receive flow, same shape as the grid
///
/// # Returns
/// Raster<u8> with 1 at contributing cells, 0 elsewhere (nodata 0)
pub fn backtrace(grid: &FlowGrid, recipients: &Raster<u8>) -> Result<Raster<u8>> {
    let (rows, cols) = grid.shape();
    if recipients.shape() != (rows, cols) {
        let (ar, ac) = recipients.shape();
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar,
            ac,
        });
    }

    let members = recipients.data().mapv(|v| v != 0);
    let contributors = backtrace_mask(grid, &members)?;

    let mut output: Raster<u8> = recipients.with_same_shape();
    output.set_nodata(Some(0));
    *output.data_mut() = contributors.mapv(u8::from);
    Ok(output)
}

/// Dense one-step-upstream pass over a boolean recipient set.
pub(crate) fn backtrace_mask(grid: &FlowGrid, recipients: &Array2<bool>) -> Result<Array2<bool>> {
    let (rows, cols) = grid.shape();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for col in 0..cols {
                if !grid.is_inside(row, col) {
                    continue;
                }
                if let Some((nrow, ncol)) = grid.downstream(row, col) {
                    row_data[col] = recipients[(nrow, ncol)];
                }
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

/// Outcome of one forward round: values that arrived at their recipients,
/// split into one layer per tributary flow direction, and values withheld
/// for the next round.
#[derive(Debug, Clone)]
pub struct ForwardRound<V> {
    /// Arrived tributary values, indexed by the tributary's flow direction
    /// (`Direction::index`). A confluence fed from three sides keeps the
    /// three values in three separate layers.
    pub arrived: [Array2<Option<V>>; 4],
    /// Frontier values whose recipient still waits on a missing tributary;
    /// carried unchanged into the next round.
    pub deferred: Array2<Option<V>>,
}

impl<V: Copy> ForwardRound<V> {
    /// Tributary values that arrived at (row, col), in N, E, S, W slot order
    pub fn tributaries(&self, row: usize, col: usize) -> [Option<V>; 4] {
        [
            self.arrived[0][(row, col)],
            self.arrived[1][(row, col)],
            self.arrived[2][(row, col)],
            self.arrived[3][(row, col)],
        ]
    }
}

/// Advance a valued frontier one step downstream.
///
/// Each frontier value is routed by its cell's flow direction:
///
/// - The recipient is masked and every one of its contributors holds a
///   frontier value: the value arrives, filed under the tributary's flow
///   direction.
/// - The recipient is masked but some contributor is still missing from
///   the frontier: the value is deferred so the eventual merge sees the
///   complete set of tributaries at once.
/// - The recipient is off the grid or unmasked: the value retires.
///
/// Values sitting on unmasked cells have nowhere to flow and are dropped.
/// Pure function of its inputs; callers own the frontier bookkeeping.
pub fn forward_trace<V: Copy>(
    grid: &FlowGrid,
    frontier: &Array2<Option<V>>,
) -> Result<ForwardRound<V>> {
    let (rows, cols) = grid.shape();
    if frontier.dim() != (rows, cols) {
        let (ar, ac) = frontier.dim();
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar,
            ac,
        });
    }

    let mut arrived: [Array2<Option<V>>; 4] = [
        Array2::from_elem((rows, cols), None),
        Array2::from_elem((rows, cols), None),
        Array2::from_elem((rows, cols), None),
        Array2::from_elem((rows, cols), None),
    ];
    let mut deferred: Array2<Option<V>> = Array2::from_elem((rows, cols), None);

    for row in 0..rows {
        for col in 0..cols {
            // As a recipient: gather the full tributary set once it is ready.
            if grid.is_inside(row, col) && is_ready(grid, frontier, row, col) {
                for dir in Direction::CARDINAL {
                    if let Some((urow, ucol)) = grid.upstream_neighbor(row, col, dir) {
                        if let Some(value) = frontier[(urow, ucol)] {
                            arrived[dir.index()][(row, col)] = Some(value);
                        }
                    }
                }
            }

            // As a contributor: hold the value back while the recipient
            // still waits on another tributary.
            if let Some(value) = frontier[(row, col)] {
                if let Some((drow, dcol)) = grid.downstream(row, col) {
                    if grid.is_inside(drow, dcol) && !is_ready(grid, frontier, drow, dcol) {
                        deferred[(row, col)] = Some(value);
                    }
                }
            }
        }
    }

    Ok(ForwardRound { arrived, deferred })
}

/// A recipient is ready when every cell draining into it already holds a
/// frontier value. Deferred contributors stay in the frontier, so siblings
/// withheld in earlier rounds count as present.
fn is_ready<V: Copy>(
    grid: &FlowGrid,
    frontier: &Array2<Option<V>>,
    row: usize,
    col: usize,
) -> bool {
    Direction::CARDINAL.iter().all(|&dir| {
        match grid.upstream_neighbor(row, col, dir) {
            Some((urow, ucol)) => frontier[(urow, ucol)].is_some(),
            None => true,
        }
    })
}

/// Run the forward tracer to its fixed point.
///
/// Seeds every headwater with `seed`, advances the frontier with
/// `forward_trace`, and combines each confluence's complete tributary set
/// with `merge`. Merged values overwrite whatever the result map held for
/// that cell, and re-enter the frontier as new contributors. The loop ends
/// when the frontier empties; the returned count is the number of rounds.
///
/// # Errors
/// `Error::CycleDetected` when a round leaves the frontier unchanged
/// (every value deferred, none merged or retired) or when the round count
/// exceeds the masked-cell count; either means the directions loop.
pub(crate) fn accumulate<V, F>(
    grid: &FlowGrid,
    headwaters: &Array2<bool>,
    seed: V,
    merge: F,
) -> Result<(Array2<Option<V>>, usize)>
where
    V: Copy,
    F: Fn([Option<V>; 4]) -> V,
{
    let (rows, cols) = grid.shape();
    let mut resolved: Array2<Option<V>> = Array2::from_elem((rows, cols), None);
    let mut frontier: Array2<Option<V>> = Array2::from_elem((rows, cols), None);
    let mut active = 0usize;

    for ((row, col), &head) in headwaters.indexed_iter() {
        if head {
            frontier[(row, col)] = Some(seed);
            resolved[(row, col)] = Some(seed);
            active += 1;
        }
    }

    let max_rounds = grid.masked_cells() + 1; // absolute safety limit
    let mut rounds = 0usize;

    while active > 0 {
        rounds += 1;
        if rounds > max_rounds {
            return Err(Error::CycleDetected { iterations: rounds });
        }

        let round = forward_trace(grid, &frontier)?;

        let mut merges: Vec<((usize, usize), V)> = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let tributaries = round.tributaries(row, col);
                if tributaries.iter().any(|t| t.is_some()) {
                    merges.push(((row, col), merge(tributaries)));
                }
            }
        }

        // Deferred values carry over; fresh merges supersede them.
        let mut next = round.deferred;
        for &((row, col), value) in &merges {
            resolved[(row, col)] = Some(value);
            next[(row, col)] = Some(value);
        }

        let next_active = next.iter().filter(|v| v.is_some()).count();
        if merges.is_empty() && next_active == active {
            // Nothing advanced, nothing retired: the deferrals can never
            // resolve and the frontier would spin in place.
            return Err(Error::CycleDetected { iterations: rounds });
        }

        frontier = next;
        active = next_active;
    }

    Ok((resolved, rounds))
}
