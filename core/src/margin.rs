//! Cost-augmented margin loss for mention ranking.
//!
//! For mention `m` with latent gold antecedent `g` the loss is
//!
//!   max_a  cost(m, a) * (1 + s(a) - s(g))
//!
//! over all `a` in `1..=m`. Finding that argmax is loss-augmented inference:
//! the maximizer is the antecedent whose cost-scaled margin is least
//! satisfied, and it is what a slack-rescaled hinge loss backpropagates.
//! Gold antecedents cost zero, so the loss is never negative.

use crate::antecedent::{mention_scores, select_best_gold_antecedent, GoldAntecedents};
use crate::config::MarginCosts;
use crate::error::{zero_based, Result};

/// Cost of predicting `antecedent` for the mention `gold` describes.
///
/// `m2c[i]` is the gold cluster id of mention `i + 1`.
pub fn pairwise_cost(
    gold: &GoldAntecedents,
    antecedent: usize,
    m2c: &[usize],
    costs: &MarginCosts,
) -> Result<f64> {
    let m = gold.mention();
    let a = zero_based("antecedent", antecedent, m)?;
    let mi = zero_based("mention cluster", m, m2c.len())?;
    Ok(cost_unchecked(gold, a, mi, m2c, costs))
}

/// `a` and `mi` are 0-based and already checked against `m` and `m2c`.
#[inline]
fn cost_unchecked(gold: &GoldAntecedents, a: usize, mi: usize, m2c: &[usize], costs: &MarginCosts) -> f64 {
    let self_link = a == mi;
    if !gold.is_anaphoric() && !self_link {
        costs.false_link
    } else if gold.is_anaphoric() && self_link {
        costs.false_new
    } else if m2c[mi] != m2c[a] {
        costs.wrong_link
    } else {
        0.0
    }
}

/// Most violating antecedent and its cost-scaled margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginViolation {
    pub antecedent: usize,
    pub loss: f64,
}

/// Loss-augmented inference against a `reference` antecedent's score.
///
/// Scans `1..=m`. Ties keep the earliest antecedent.
pub fn margin_violation(
    gold: &GoldAntecedents,
    reference: usize,
    score_offset: usize,
    scores: &[f64],
    m2c: &[usize],
    costs: &MarginCosts,
) -> Result<MarginViolation> {
    let m = gold.mention();
    let s = mention_scores(scores, score_offset, m)?;
    let r = zero_based("reference antecedent", reference, m)?;
    let mi = zero_based("mention cluster", m, m2c.len())?;

    let violation = |a: usize| cost_unchecked(gold, a, mi, m2c, costs) * (1.0 + s[a] - s[r]);

    let mut best = MarginViolation { antecedent: 1, loss: violation(0) };
    for a in 1..m {
        let loss = violation(a);
        if loss > best.loss {
            best = MarginViolation { antecedent: a + 1, loss };
        }
    }
    Ok(best)
}

/// Antecedent maximizing the cost-scaled margin violation (1-based).
pub fn find_margin_violation(
    gold: &GoldAntecedents,
    reference: usize,
    score_offset: usize,
    scores: &[f64],
    m2c: &[usize],
    costs: &MarginCosts,
) -> Result<usize> {
    margin_violation(gold, reference, score_offset, scores, m2c, costs).map(|v| v.antecedent)
}

/// Training signal for one mention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MentionLoss {
    /// Highest-scoring gold antecedent.
    pub gold_antecedent: usize,
    /// Most violating antecedent.
    pub violator: usize,
    /// `cost(violator) * (1 + s(violator) - s(gold_antecedent))`, >= 0.
    pub loss: f64,
}

impl MentionLoss {
    /// Zero loss means nothing to backpropagate for this mention.
    pub fn is_satisfied(&self) -> bool {
        self.loss <= 0.0
    }
}

/// Latent gold selection followed by loss-augmented inference.
pub fn mention_hinge_loss(
    gold: &GoldAntecedents,
    score_offset: usize,
    scores: &[f64],
    m2c: &[usize],
    costs: &MarginCosts,
) -> Result<MentionLoss> {
    let gold_antecedent = select_best_gold_antecedent(gold, score_offset, scores)?;
    let v = margin_violation(gold, gold_antecedent, score_offset, scores, m2c, costs)?;
    Ok(MentionLoss { gold_antecedent, violator: v.antecedent, loss: v.loss })
}
