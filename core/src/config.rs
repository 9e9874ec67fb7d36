//! Hyperparameters supplied by the training loop.
//!
//! Defaults follow the reference experiments: first-layer AdaGrad with
//! eta = 0.1 and a 1e-6 L1 penalty, margin costs 0.5 / 1.2 / 1.0.

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Upper bound on the size of a materialized nonzero index set.
pub const DEFAULT_MAX_NONZERO: usize = 4096;

// ── AdaGrad ──────────────────────────────────────────────────────────

/// Proximal AdaGrad hyperparameters for one parameter group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaGradConfig {
    /// Base learning rate.
    pub eta: f64,
    /// L1 regularization strength.
    pub lambda: f64,
    /// Capacity of the scratch set used for keyed (collection-sourced) updates.
    pub max_nonzero: usize,
}

impl Default for AdaGradConfig {
    fn default() -> Self {
        AdaGradConfig {
            eta: 0.1,
            lambda: 1e-6,
            max_nonzero: DEFAULT_MAX_NONZERO,
        }
    }
}

impl AdaGradConfig {
    /// Sparse input layer: large rate, L1 keeps the feature weights sparse.
    pub fn first_layer() -> Self {
        AdaGradConfig::default()
    }

    /// Dense output layer.
    pub fn second_layer() -> Self {
        AdaGradConfig { eta: 0.001, ..AdaGradConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(KernelError::InvalidConfig(format!("eta must be finite and > 0, got {}", self.eta)));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(KernelError::InvalidConfig(format!("lambda must be finite and >= 0, got {}", self.lambda)));
        }
        if self.max_nonzero == 0 {
            return Err(KernelError::InvalidConfig("max_nonzero must be >= 1".into()));
        }
        Ok(())
    }
}

// ── Margin costs ─────────────────────────────────────────────────────

/// Per-error-type costs for the mention-ranking margin loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginCosts {
    /// Non-anaphoric mention linked to some antecedent.
    pub false_link: f64,
    /// Anaphoric mention predicted as starting a new entity.
    pub false_new: f64,
    /// Link into the wrong gold cluster.
    pub wrong_link: f64,
}

impl Default for MarginCosts {
    fn default() -> Self {
        MarginCosts { false_link: 0.5, false_new: 1.2, wrong_link: 1.0 }
    }
}

impl MarginCosts {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("false_link", self.false_link),
            ("false_new", self.false_new),
            ("wrong_link", self.wrong_link),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(KernelError::InvalidConfig(format!("{name} must be finite and >= 0, got {v}")));
            }
        }
        Ok(())
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Everything the kernels read from training configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub adagrad: AdaGradConfig,
    pub costs: MarginCosts,
}

impl EngineConfig {
    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(json)
            .map_err(|e| KernelError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| KernelError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.adagrad.validate()?;
        self.costs.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(AdaGradConfig::default().max_nonzero, 4096);
        assert_eq!(AdaGradConfig::second_layer().eta, 0.001);
    }

    #[test]
    fn test_rejects_bad_hyperparameters() {
        let cfg = AdaGradConfig { eta: 0.0, ..AdaGradConfig::default() };
        assert!(matches!(cfg.validate(), Err(KernelError::InvalidConfig(_))));

        let cfg = AdaGradConfig { lambda: -1.0, ..AdaGradConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = AdaGradConfig { max_nonzero: 0, ..AdaGradConfig::default() };
        assert!(cfg.validate().is_err());

        let costs = MarginCosts { wrong_link: f64::NAN, ..MarginCosts::default() };
        assert!(costs.validate().is_err());
    }

    #[test]
    fn test_json_partial_fields_fall_back_to_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"adagrad": {"lambda": 0.0001}}"#).unwrap();
        assert_eq!(cfg.adagrad.lambda, 1e-4);
        assert_eq!(cfg.adagrad.eta, 0.1);
        assert_eq!(cfg.costs, MarginCosts::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = EngineConfig {
            adagrad: AdaGradConfig { eta: 0.2, lambda: 1e-5, max_nonzero: 128 },
            costs: MarginCosts { false_link: 0.4, false_new: 1.0, wrong_link: 0.8 },
        };
        let json = cfg.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let err = EngineConfig::from_json_str(r#"{"adagrad": {"eta": -1.0}}"#).unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
        assert!(EngineConfig::from_json_str("not json").is_err());
    }
}
