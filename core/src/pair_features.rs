//! First hidden layer of the mention-pair scorer from sparse feature lookups.
//!
//! For a document of `n` mentions (0-based `k` in document order) the layer
//! `Z1` is `[hidden, n(n+1)/2]`, row-major. Mention `k` owns a block of `k + 1`
//! columns starting at `k(k+1)/2`:
//!
//!   block(k) = [ self(k) | (k,0) | (k,1) | ... | (k,k-1) ]
//!
//! The self column is the "new entity" option. It has no pairwise features
//! and this module never touches it: whatever bias the caller wrote stays.
//!
//! Features arrive as ragged segments: a flat array of 1-based feature ids
//! plus CSR-style offsets. Pair `(k, j)` reads pairwise segment
//! `k(k-1)/2 + j`. Mention `k >= 1` reads anaphoricity segment `k - 1`.
//! Segment numbers are relative to the document's `doc_start` in the offsets
//! array. Offsets themselves are absolute positions in the id array.
//!
//! Embedding tables are `[num_features, width]`: feature `f` is row `f - 1`.
//! Hidden unit `i` of a pair sums column `i` over the pair's feature rows.
//! Each hidden unit is an independent output row, so the kernels fan out
//! across the hidden dimension.

use crate::dispatch::for_each_row;
use crate::error::{expect_len, zero_based, KernelError, Result};

// ── Pair indexing ────────────────────────────────────────────────────

/// Columns of `Z1` for `n` mentions: one self slot per mention plus every pair.
pub fn num_pairs(num_mentions: usize) -> usize {
    num_mentions * (num_mentions + 1) / 2
}

/// First column owned by mention `k`.
pub fn block_start(k: usize) -> usize {
    k * (k + 1) / 2
}

/// The "new entity" column of mention `k`, first in its block.
pub fn self_column(k: usize) -> usize {
    block_start(k)
}

/// Column of pair `(k, j)`, `j < k`.
pub fn pair_column(k: usize, j: usize) -> usize {
    debug_assert!(j < k);
    block_start(k) + 1 + j
}

/// Pairwise feature segment of pair `(k, j)`, relative to the document start.
pub fn pair_segment(k: usize, j: usize) -> usize {
    debug_assert!(j < k);
    k * (k - 1) / 2 + j
}

fn num_pair_segments(num_mentions: usize) -> usize {
    num_mentions * num_mentions.saturating_sub(1) / 2
}

// ── Inputs ───────────────────────────────────────────────────────────

/// Read-only `[rows, width]` embedding table.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddingTable<'a> {
    weights: &'a [f64],
    width: usize,
}

impl<'a> EmbeddingTable<'a> {
    pub fn new(weights: &'a [f64], width: usize) -> Result<Self> {
        if width == 0 {
            if !weights.is_empty() {
                return Err(KernelError::ShapeMismatch { what: "embedding table", expected: 0, actual: weights.len() });
            }
        } else if weights.len() % width != 0 {
            let rows = weights.len() / width;
            return Err(KernelError::ShapeMismatch {
                what: "embedding table",
                expected: (rows + 1) * width,
                actual: weights.len(),
            });
        }
        Ok(EmbeddingTable { weights, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        if self.width == 0 { 0 } else { self.weights.len() / self.width }
    }

    /// Entry `i` of 1-based feature `feature`. Assumes validated input.
    #[inline]
    fn at(&self, feature: usize, i: usize) -> f64 {
        self.weights[(feature - 1) * self.width + i]
    }
}

/// Ragged feature-id segments for one document.
#[derive(Clone, Copy, Debug)]
pub struct RaggedFeatures<'a> {
    ids: &'a [usize],
    starts: &'a [usize],
    doc_start: usize,
}

impl<'a> RaggedFeatures<'a> {
    /// `starts[doc_start + s]..starts[doc_start + s + 1]` is segment `s`.
    pub fn new(ids: &'a [usize], starts: &'a [usize], doc_start: usize) -> Self {
        RaggedFeatures { ids, starts, doc_start }
    }

    /// Check the first `segments` segments and every id in them against `table`.
    fn validate(&self, segments: usize, table: &EmbeddingTable<'_>) -> Result<()> {
        if segments == 0 {
            return Ok(());
        }
        let in_range = matches!(self.doc_start.checked_add(segments), Some(last) if last < self.starts.len());
        if !in_range {
            return Err(KernelError::IndexOutOfRange {
                what: "segment offset",
                index: self.doc_start.saturating_add(segments),
                bound: self.starts.len(),
            });
        }
        for s in 0..segments {
            let lo = self.starts[self.doc_start + s];
            let hi = self.starts[self.doc_start + s + 1];
            if lo > hi {
                return Err(KernelError::IndexOutOfRange { what: "segment start", index: lo, bound: hi });
            }
            if hi > self.ids.len() {
                return Err(KernelError::IndexOutOfRange { what: "segment end", index: hi, bound: self.ids.len() });
            }
            for &f in &self.ids[lo..hi] {
                zero_based("embedding feature", f, table.rows())?;
            }
        }
        Ok(())
    }

    #[inline]
    fn segment(&self, s: usize) -> &'a [usize] {
        let lo = self.starts[self.doc_start + s];
        let hi = self.starts[self.doc_start + s + 1];
        &self.ids[lo..hi]
    }
}

/// Sum of `table` column `i` over the rows named in `feats`.
#[inline]
fn embed_sum(table: &EmbeddingTable<'_>, feats: &[usize], i: usize) -> f64 {
    feats.iter().map(|&f| table.at(f, i)).sum()
}

/// Add pairwise embeddings into one hidden row; optionally squash the pair cells.
#[inline]
fn fill_pair_row(row: &mut [f64], i: usize, table: &EmbeddingTable<'_>, pairs: &RaggedFeatures<'_>, n: usize, squash: bool) {
    for k in 1..n {
        for j in 0..k {
            let col = pair_column(k, j);
            row[col] += embed_sum(table, pairs.segment(pair_segment(k, j)), i);
            if squash {
                row[col] = row[col].tanh();
            }
        }
    }
}

// ── Kernels ──────────────────────────────────────────────────────────

/// `Z1[i, pair(k, j)] += sum over f in segment(k, j) of table[f, i]`.
///
/// `z1` is `[table.width(), num_pairs(num_mentions)]`. Self columns are left
/// as they are. No nonlinearity is applied.
pub fn accumulate_pair_embeddings(
    z1: &mut [f64],
    table: &EmbeddingTable<'_>,
    pairs: &RaggedFeatures<'_>,
    num_mentions: usize,
) -> Result<()> {
    let np = num_pairs(num_mentions);
    expect_len("z1", table.width() * np, z1.len())?;
    pairs.validate(num_pair_segments(num_mentions), table)?;
    tracing::trace!(hidden = table.width(), num_mentions, num_pairs = np, "accumulate pair embeddings");

    for_each_row(z1, np, |i, row| fill_pair_row(row, i, table, pairs, num_mentions, false));
    Ok(())
}

/// Full first layer: pairwise rows on top of anaphoricity rows, both `tanh`.
///
/// `z1` is `[pair_table.width() + ana_table.width(), num_pairs(n)]` with biases
/// already added. Rows `0..hp` get pairwise embeddings per pair column. Rows
/// `hp..hp + ha` get one value per mention, computed once from that mention's
/// anaphoricity features (starting from the bias in its `(k, 0)` cell) and
/// copied to all of its pair columns, since it does not depend on which
/// antecedent is paired. Self columns are never written.
pub fn build_hidden_layer(
    z1: &mut [f64],
    pair_table: &EmbeddingTable<'_>,
    pairs: &RaggedFeatures<'_>,
    ana_table: &EmbeddingTable<'_>,
    anaphoricity: &RaggedFeatures<'_>,
    num_mentions: usize,
) -> Result<()> {
    let np = num_pairs(num_mentions);
    let hp = pair_table.width();
    let ha = ana_table.width();
    expect_len("z1", (hp + ha) * np, z1.len())?;
    pairs.validate(num_pair_segments(num_mentions), pair_table)?;
    anaphoricity.validate(num_mentions.saturating_sub(1), ana_table)?;
    tracing::debug!(pair_dim = hp, ana_dim = ha, num_mentions, num_pairs = np, "build hidden layer");

    let (z_pair, z_ana) = z1.split_at_mut(hp * np);

    for_each_row(z_pair, np, |i, row| fill_pair_row(row, i, pair_table, pairs, num_mentions, true));

    for_each_row(z_ana, np, |i, row| {
        for k in 1..num_mentions {
            let first = pair_column(k, 0);
            let value = (row[first] + embed_sum(ana_table, anaphoricity.segment(k - 1), i)).tanh();
            row[first..first + k].fill(value);
        }
    });
    Ok(())
}
