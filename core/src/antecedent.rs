//! Gold antecedent sets and latent antecedent selection.
//!
//! Mentions are 1-based in document order. Mention `m` may link to any
//! earlier mention or to itself, where the self link means "starts a new
//! entity". A mention's gold cluster is given as an ascending list of mention
//! ids. Entries below `m` are its correct antecedents; if the first entry is `m`
//! itself the mention is non-anaphoric.
//!
//! Scores for one mention live in a larger flat buffer: antecedent `a` of
//! mention `m` is at `scores[score_offset + a - 1]`, for `a` in `1..=m`.

use crate::error::{KernelError, Result};

/// Validated gold-antecedent set for one mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoldAntecedents {
    mention: usize,
    anaphoric: bool,
    /// Gold choices: the correct antecedents, or `[mention]` if non-anaphoric.
    candidates: Vec<usize>,
}

impl GoldAntecedents {
    /// Build from a gold cluster listing.
    ///
    /// `clust` must be non-empty, strictly ascending, free of `0`, and start
    /// at or below `mention`. Reading stops at the first entry `>= mention`
    /// or at the end of the slice.
    pub fn from_cluster(mention: usize, clust: &[usize]) -> Result<Self> {
        let invalid = |reason: &'static str| KernelError::InvalidClusterDescriptor { mention, reason };

        if mention == 0 {
            return Err(invalid("mention ids are 1-based"));
        }
        let first = *clust.first().ok_or_else(|| invalid("cluster is empty"))?;
        if first == 0 {
            return Err(invalid("cluster ids are 1-based"));
        }
        if first > mention {
            return Err(invalid("cluster has no antecedent or self entry"));
        }
        if clust.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("cluster is not strictly ascending"));
        }

        let anaphoric = first < mention;
        let candidates = if anaphoric {
            clust.iter().copied().take_while(|&a| a < mention).collect()
        } else {
            vec![mention]
        };
        Ok(GoldAntecedents { mention, anaphoric, candidates })
    }

    /// A mention that starts a new entity.
    pub fn non_anaphoric(mention: usize) -> Result<Self> {
        GoldAntecedents::from_cluster(mention, &[mention])
    }

    pub fn mention(&self) -> usize {
        self.mention
    }

    pub fn is_anaphoric(&self) -> bool {
        self.anaphoric
    }

    /// Gold antecedent ids in ascending order. Never empty.
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn contains(&self, antecedent: usize) -> bool {
        self.candidates.binary_search(&antecedent).is_ok()
    }
}

/// The `mention` scores of one mention, starting at `score_offset`.
pub(crate) fn mention_scores(scores: &[f64], score_offset: usize, mention: usize) -> Result<&[f64]> {
    let out_of_range = KernelError::IndexOutOfRange {
        what: "score",
        index: score_offset.saturating_add(mention).saturating_sub(1),
        bound: scores.len(),
    };
    match score_offset.checked_add(mention) {
        Some(end) if end <= scores.len() => Ok(&scores[score_offset..end]),
        _ => Err(out_of_range),
    }
}

/// Highest-scoring gold antecedent of a mention (the latent gold link).
///
/// Ties keep the earliest candidate. Returns a 1-based antecedent id, which
/// is the mention itself when it is non-anaphoric.
pub fn select_best_gold_antecedent(
    gold: &GoldAntecedents,
    score_offset: usize,
    scores: &[f64],
) -> Result<usize> {
    let s = mention_scores(scores, score_offset, gold.mention())?;
    let (&first, rest) = gold
        .candidates()
        .split_first()
        .ok_or(KernelError::InvalidClusterDescriptor { mention: gold.mention(), reason: "no candidates" })?;

    let mut best = first;
    let mut best_score = s[first - 1];
    for &a in rest {
        if s[a - 1] > best_score {
            best = a;
            best_score = s[a - 1];
        }
    }
    Ok(best)
}
