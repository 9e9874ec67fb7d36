//! Mention-ranking loss tests: latent gold selection, cost taxonomy, loss-augmented inference.

use corefnn_core::antecedent::{select_best_gold_antecedent, GoldAntecedents};
use corefnn_core::config::MarginCosts;
use corefnn_core::error::KernelError;
use corefnn_core::margin::{find_margin_violation, margin_violation, mention_hinge_loss, pairwise_cost};
use proptest::prelude::*;

/// Gold cluster listing of mention `m` (1-based) from a mention→cluster map.
fn cluster_of(m: usize, m2c: &[usize]) -> Vec<usize> {
    (1..=m2c.len()).filter(|&j| m2c[j - 1] == m2c[m - 1]).collect()
}

/// Cost straight from the cluster map, without a gold set.
fn brute_cost(m: usize, a: usize, m2c: &[usize], c: &MarginCosts) -> f64 {
    let anaphoric = (1..m).any(|j| m2c[j - 1] == m2c[m - 1]);
    if a == m {
        if anaphoric { c.false_new } else { 0.0 }
    } else if !anaphoric {
        c.false_link
    } else if m2c[a - 1] != m2c[m - 1] {
        c.wrong_link
    } else {
        0.0
    }
}

#[test]
fn test_latent_gold_picks_highest_scoring_antecedent() {
    // Mention 7 in cluster {3, 5, 7}; its scores start at offset 20.
    let gold = GoldAntecedents::from_cluster(7, &[3, 5]).unwrap();
    let mut scores = vec![-1.0f64; 27];
    scores[20 + 2] = 0.1;
    scores[20 + 4] = 0.9;
    scores[20 + 6] = 5.0; // self, not a gold choice
    assert_eq!(select_best_gold_antecedent(&gold, 20, &scores).unwrap(), 5);
}

#[test]
fn test_non_anaphoric_gold_is_self() {
    let gold = GoldAntecedents::from_cluster(3, &[3, 8]).unwrap();
    assert_eq!(select_best_gold_antecedent(&gold, 0, &[9.0, 9.0, -9.0]).unwrap(), 3);
}

#[test]
fn test_cost_taxonomy_over_a_document() {
    // Clusters: {1, 2, 4}, {3}, {5}.
    let m2c = [0usize, 0, 1, 0, 2];
    let c = MarginCosts::default();
    for m in 1..=m2c.len() {
        let gold = GoldAntecedents::from_cluster(m, &cluster_of(m, &m2c)).unwrap();
        for a in 1..=m {
            assert_eq!(
                pairwise_cost(&gold, a, &m2c, &c).unwrap(),
                brute_cost(m, a, &m2c, &c),
                "m={m}, a={a}"
            );
        }
    }
    let m4 = GoldAntecedents::from_cluster(4, &[1, 2, 4]).unwrap();
    assert_eq!(pairwise_cost(&m4, 4, &m2c, &c).unwrap(), c.false_new);
    assert_eq!(pairwise_cost(&m4, 3, &m2c, &c).unwrap(), c.wrong_link);
    let m5 = GoldAntecedents::non_anaphoric(5).unwrap();
    assert_eq!(pairwise_cost(&m5, 1, &m2c, &c).unwrap(), c.false_link);
    assert_eq!(pairwise_cost(&m5, 5, &m2c, &c).unwrap(), 0.0);
}

#[test]
fn test_false_new_dominates_when_self_scores_high() {
    let m2c = [0usize, 1, 0];
    let gold = GoldAntecedents::from_cluster(3, &[1, 3]).unwrap();
    let scores = [0.0f64, -2.0, 2.0];
    let loss = mention_hinge_loss(&gold, 0, &scores, &m2c, &MarginCosts::default()).unwrap();
    assert_eq!(loss.gold_antecedent, 1);
    assert_eq!(loss.violator, 3);
    assert!((loss.loss - 1.2 * 3.0).abs() < 1e-12);
    assert!(!loss.is_satisfied());
}

#[test]
fn test_invalid_inputs() {
    let costs = MarginCosts::default();
    let gold = GoldAntecedents::from_cluster(3, &[1, 3]).unwrap();
    assert!(matches!(
        find_margin_violation(&gold, 1, 1, &[0.0; 3], &[0, 0, 0], &costs),
        Err(KernelError::IndexOutOfRange { what: "score", .. })
    ));
    assert!(matches!(
        find_margin_violation(&gold, 0, 0, &[0.0; 3], &[0, 0, 0], &costs),
        Err(KernelError::IndexOutOfRange { what: "reference antecedent", index: 0, .. })
    ));
    assert!(matches!(
        GoldAntecedents::from_cluster(2, &[3]),
        Err(KernelError::InvalidClusterDescriptor { mention: 2, .. })
    ));
}

proptest! {
    #[test]
    fn prop_violation_matches_brute_force(
        m2c in prop::collection::vec(0usize..3, 1..7),
        scores in prop::collection::vec(-5.0f64..5.0, 6),
        pick in any::<usize>(),
    ) {
        let costs = MarginCosts::default();
        let m = pick % m2c.len() + 1;
        let gold = GoldAntecedents::from_cluster(m, &cluster_of(m, &m2c)).unwrap();

        let reference = select_best_gold_antecedent(&gold, 0, &scores).unwrap();
        prop_assert!(gold.contains(reference));

        let mut best = (1usize, f64::NEG_INFINITY);
        for a in 1..=m {
            let v = brute_cost(m, a, &m2c, &costs) * (1.0 + scores[a - 1] - scores[reference - 1]);
            if v > best.1 {
                best = (a, v);
            }
        }

        let got = margin_violation(&gold, reference, 0, &scores, &m2c, &costs).unwrap();
        prop_assert_eq!(got.antecedent, best.0);
        prop_assert_eq!(got.loss, best.1);
        prop_assert!(got.loss >= 0.0);
    }
}
