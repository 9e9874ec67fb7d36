//! Feature-gated dispatch: sequential reference loop vs rayon row fan-out.
//!
//! Without `--features parallel` → plain `chunks_mut` loop.
//! With `--features parallel` → `par_chunks_mut` over disjoint output rows.
//!
//! Both paths produce identical results (verified by tests). A worker always
//! owns whole output rows, so no two workers write the same element. Any new
//! partitioning has to keep that property.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::layout::{Dims, Layout};

/// Row count below which fan-out overhead outweighs the work.
pub const PARALLEL_MIN_ROWS: usize = 32;

/// Execution path for a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Sequential,
    Rayon,
}

/// Pick the path for a kernel that fans out over `rows` independent rows.
pub fn select_backend(rows: usize) -> Backend {
    if cfg!(feature = "parallel") && rows >= PARALLEL_MIN_ROWS {
        Backend::Rayon
    } else {
        Backend::Sequential
    }
}

/// Call `f(row_index, row)` for every `width`-wide row of `target`.
pub(crate) fn for_each_row<F>(target: &mut [f64], width: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Sync + Send,
{
    if width == 0 || target.is_empty() {
        return;
    }
    match select_backend(target.len() / width) {
        #[cfg(feature = "parallel")]
        Backend::Rayon => target
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| f(r, row)),
        _ => target
            .chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| f(r, row)),
    }
}

/// Split `target` into the listed rows. `rows` must be ascending, distinct
/// and in bounds.
fn carve_rows<'t>(
    target: &'t mut [f64],
    width: usize,
    rows: &[(usize, usize)],
) -> Vec<(usize, usize, &'t mut [f64])> {
    let mut out = Vec::with_capacity(rows.len());
    let mut rest = target;
    let mut consumed = 0;
    for &(row, mult) in rows {
        let skip = row * width - consumed;
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
        let (slab, tail) = tail.split_at_mut(width);
        out.push((row, mult, slab));
        rest = tail;
        consumed = (row + 1) * width;
    }
    out
}

/// Call `f(row_index, multiplicity, row)` for each selected row.
pub(crate) fn for_each_selected_row<F>(
    target: &mut [f64],
    width: usize,
    rows: &[(usize, usize)],
    f: F,
) where
    F: Fn(usize, usize, &mut [f64]) + Sync + Send,
{
    if width == 0 || rows.is_empty() {
        return;
    }
    let slabs = carve_rows(target, width, rows);
    match select_backend(slabs.len()) {
        #[cfg(feature = "parallel")]
        Backend::Rayon => slabs
            .into_par_iter()
            .for_each(|(r, mult, row)| f(r, mult, row)),
        _ => slabs
            .into_iter()
            .for_each(|(r, mult, row)| f(r, mult, row)),
    }
}

/// Visit every coordinate `layout` selects in `target`, passing its flat
/// offset so `op` can read the matching element of other same-shape buffers.
///
/// The layout must already be checked against `dims`.
pub(crate) fn sweep<F>(layout: Layout<'_>, dims: Dims, target: &mut [f64], op: F)
where
    F: Fn(usize, &mut f64) + Sync + Send,
{
    match layout {
        Layout::Dense => for_each_row(target, dims.d, |r, row| {
            let base = r * dims.d;
            for (c, v) in row.iter_mut().enumerate() {
                op(base + c, v);
            }
        }),
        Layout::RowSparse(nz) => for_each_row(target, dims.d, |r, row| {
            let base = r * dims.d;
            for &id in nz.ids() {
                let c = id - 1;
                op(base + c, &mut row[c]);
            }
        }),
        Layout::ColumnSparse(nz) => {
            // Rows are features here, each `h` wide.
            let rows = nz.grouped();
            for_each_selected_row(target, dims.h, &rows, |r, mult, row| {
                let base = r * dims.h;
                for _ in 0..mult {
                    for (i, v) in row.iter_mut().enumerate() {
                        op(base + i, v);
                    }
                }
            });
        }
    }
}
