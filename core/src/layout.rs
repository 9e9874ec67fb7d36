//! Addressing conventions for parameter buffers and sparse index sets.
//!
//! Every buffer is a flat row-major `[f64]` with explicit dimensions. A
//! parameter tensor is `Dims { h, d }`:
//!
//!   - Dense / row-sparse: `h` rows (hidden units) of width `d` (input features).
//!     A nonzero set picks the same columns in every row.
//!   - Column-sparse: the same `h * d` elements viewed as `d` rows (features) of
//!     width `h` (embedding width), the layout of a lookup table. A nonzero set
//!     picks whole rows.
//!
//! Feature ids are 1-based everywhere on the public surface.

use crate::error::{zero_based, KernelError, Result};

/// Tensor dimensions, see module docs for the role of `h` and `d` per layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub h: usize,
    pub d: usize,
}

impl Dims {
    pub fn new(h: usize, d: usize) -> Self {
        Dims { h, d }
    }

    /// A single row of `n` elements (1-D tensors).
    pub fn vector(n: usize) -> Self {
        Dims { h: 1, d: n }
    }

    pub fn numel(&self) -> usize {
        self.h * self.d
    }
}

// ── Nonzero sets ─────────────────────────────────────────────────────

/// Ordered, capacity-bounded sequence of 1-based feature ids.
///
/// Duplicates are kept and accumulate twice. The set doubles as the reusable
/// scratch buffer for keyed updates: `refill` overwrites it in place and
/// keeps the allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonzeroSet {
    ids: Vec<usize>,
    capacity: usize,
}

impl NonzeroSet {
    pub fn with_capacity(capacity: usize) -> Self {
        NonzeroSet { ids: Vec::with_capacity(capacity.min(1024)), capacity }
    }

    pub fn from_one_based(ids: &[usize], capacity: usize) -> Result<Self> {
        let mut set = NonzeroSet::with_capacity(capacity);
        set.refill(ids.iter().copied())?;
        Ok(set)
    }

    /// Materialize ids from a single-pass source.
    ///
    /// All or nothing: if the source yields more than `capacity` ids the set
    /// is left empty and `CapacityExceeded` is returned.
    pub fn refill<I>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        self.ids.clear();
        for id in ids {
            if self.ids.len() == self.capacity {
                self.ids.clear();
                tracing::warn!(capacity = self.capacity, "nonzero set overflow, update skipped");
                return Err(KernelError::CapacityExceeded { capacity: self.capacity });
            }
            self.ids.push(id);
        }
        Ok(())
    }

    /// 1-based ids in insertion order.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Fail on the first id outside `1..=bound`.
    pub(crate) fn check_bound(&self, bound: usize) -> Result<()> {
        for &id in &self.ids {
            zero_based("feature id", id, bound)?;
        }
        Ok(())
    }

    /// Distinct 0-based positions in ascending order, each with its
    /// multiplicity. Assumes `check_bound` passed.
    pub(crate) fn grouped(&self) -> Vec<(usize, usize)> {
        let mut sorted: Vec<usize> = self.ids.iter().map(|&id| id - 1).collect();
        sorted.sort_unstable();
        let mut out: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
        for pos in sorted {
            if let Some((last, count)) = out.last_mut() {
                if *last == pos {
                    *count += 1;
                    continue;
                }
            }
            out.push((pos, 1));
        }
        out
    }
}

// ── Layouts ──────────────────────────────────────────────────────────

/// Which coordinates of an `h * d` buffer an update touches.
#[derive(Clone, Copy, Debug)]
pub enum Layout<'a> {
    /// Every element.
    Dense,
    /// The listed columns of each of the `h` rows.
    RowSparse(&'a NonzeroSet),
    /// The listed rows of the transposed `(d, h)` view, all `h` entries each.
    ColumnSparse(&'a NonzeroSet),
}

impl<'a> Layout<'a> {
    /// Number of coordinate visits, counting duplicates.
    pub fn visits(&self, dims: Dims) -> usize {
        match self {
            Layout::Dense => dims.numel(),
            Layout::RowSparse(nz) | Layout::ColumnSparse(nz) => nz.len() * dims.h,
        }
    }

    /// Both sparse layouts index features along `d`.
    pub(crate) fn check(&self, dims: Dims) -> Result<()> {
        match self {
            Layout::Dense => Ok(()),
            Layout::RowSparse(nz) | Layout::ColumnSparse(nz) => nz.check_bound(dims.d),
        }
    }
}

/// Orientation of a keyed update, see [`Layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SparseKind {
    Row,
    Column,
}

impl SparseKind {
    pub fn layout(self, nz: &NonzeroSet) -> Layout<'_> {
        match self {
            SparseKind::Row => Layout::RowSparse(nz),
            SparseKind::Column => Layout::ColumnSparse(nz),
        }
    }
}
