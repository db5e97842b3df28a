//! LDA hyperparameters
//!
//! [`LdaHyperparameters`] is the persistent, fully specified parameter set
//! the adapter hands to a trainer. [`HyperparameterOverrides`] is the partial
//! form callers pass per training call; overrides merge into the persistent
//! set and accumulate across calls.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating hyperparameters
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid hyperparameter `{name}`: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Unsupported option: {0}")]
    Unsupported(String),

    #[error("Failed to read hyperparameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse hyperparameters: {0}")]
    Json(#[from] serde_json::Error),
}

/// Named shapes for a Dirichlet prior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorShape {
    /// Same concentration for every component (`1 / num_topics`)
    Symmetric,
    /// Concentration `1 / (i + sqrt(K))`, normalized
    Asymmetric,
    /// Symmetric start, learned from the data during training
    Auto,
}

/// Dirichlet prior specification for `alpha` and `eta`
///
/// Serialized as a string (`"symmetric"`, `"asymmetric"`, `"auto"`), a
/// number, or an array of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prior {
    Named(PriorShape),
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Default for Prior {
    fn default() -> Self {
        Prior::Named(PriorShape::Symmetric)
    }
}

impl Prior {
    /// Whether the prior is learned during training
    pub fn is_auto(&self) -> bool {
        matches!(self, Prior::Named(PriorShape::Auto))
    }
}

/// Name-server settings used by distributed training
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub broadcast: bool,
    pub hmac_key: Option<String>,
}

/// Full LDA hyperparameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaHyperparameters {
    /// Number of latent topics
    pub num_topics: usize,
    /// Train across worker processes
    pub distributed: bool,
    /// Documents per training chunk
    pub chunksize: usize,
    /// Passes over the corpus
    pub passes: usize,
    /// Chunks between M-steps, 0 selects batch learning
    pub update_every: usize,
    /// Document-topic prior
    pub alpha: Prior,
    /// Topic-word prior, `None` is symmetric
    pub eta: Option<Prior>,
    /// Weight decay (kappa) for blending new chunks into the model
    pub decay: f64,
    /// Down-weights early iterations (tau_0)
    pub offset: f64,
    /// Estimate perplexity every N chunks, 0 disables
    pub eval_every: usize,
    /// Maximum inference iterations per document
    pub iterations: usize,
    /// Mean gamma change below which per-document inference stops
    pub gamma_threshold: f64,
    /// Topics with lower probability are dropped from document queries
    pub minimum_probability: f64,
    /// Seed for reproducible training, `None` draws from entropy
    pub random_state: Option<u64>,
    /// Name-server settings for distributed training
    pub ns_conf: Option<NameServerConfig>,
    /// Per-word topic relevance floor
    pub minimum_phi_value: f64,
    /// Compute per-word topic assignments for document queries
    pub per_word_topics: bool,
}

impl Default for LdaHyperparameters {
    fn default() -> Self {
        Self {
            num_topics: 100,
            distributed: false,
            chunksize: 2000,
            passes: 1,
            update_every: 1,
            alpha: Prior::default(),
            eta: None,
            decay: 0.5,
            offset: 1.0,
            eval_every: 10,
            iterations: 50,
            gamma_threshold: 0.001,
            minimum_probability: 0.01,
            random_state: None,
            ns_conf: None,
            minimum_phi_value: 0.01,
            per_word_topics: false,
        }
    }
}

impl LdaHyperparameters {
    /// Create a parameter set with the given topic count and defaults elsewhere
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            ..Default::default()
        }
    }

    /// Load a full parameter set from JSON; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Shallow-merge overrides: every field set in `overrides` replaces ours
    pub fn merge(&mut self, overrides: &HyperparameterOverrides) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &overrides.$field {
                        self.$field = value.clone();
                    }
                )*
            };
        }

        take!(
            num_topics,
            distributed,
            chunksize,
            passes,
            update_every,
            alpha,
            decay,
            offset,
            eval_every,
            iterations,
            gamma_threshold,
            minimum_probability,
            minimum_phi_value,
            per_word_topics,
        );

        if let Some(eta) = &overrides.eta {
            self.eta = Some(eta.clone());
        }
        if let Some(seed) = overrides.random_state {
            self.random_state = Some(seed);
        }
        if let Some(ns_conf) = &overrides.ns_conf {
            self.ns_conf = Some(ns_conf.clone());
        }
    }

    /// Replace a scalar `alpha` with a symmetric per-topic vector
    pub fn expand_symmetric_alpha(&mut self) {
        if let Prior::Scalar(value) = self.alpha {
            self.alpha = Prior::Vector(vec![value; self.num_topics]);
        }
    }

    /// Check every value a trainer relies on
    ///
    /// `eta` vectors are checked against the vocabulary size by the trainer,
    /// since the vocabulary is not known here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_topics == 0 {
            return Err(invalid("num_topics", "must be positive"));
        }
        if self.chunksize == 0 {
            return Err(invalid("chunksize", "must be positive"));
        }
        if self.passes == 0 {
            return Err(invalid("passes", "must be positive"));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations", "must be positive"));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(invalid("decay", "must lie in (0, 1]"));
        }
        if !(self.offset > 0.0 && self.offset.is_finite()) {
            return Err(invalid("offset", "must be positive"));
        }
        if !(self.gamma_threshold >= 0.0 && self.gamma_threshold.is_finite()) {
            return Err(invalid("gamma_threshold", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.minimum_probability) {
            return Err(invalid("minimum_probability", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.minimum_phi_value) {
            return Err(invalid("minimum_phi_value", "must lie in [0, 1]"));
        }
        if self.distributed {
            return Err(ConfigError::Unsupported(
                "distributed training is not available in-process".into(),
            ));
        }

        match &self.alpha {
            Prior::Named(_) => {}
            Prior::Scalar(value) => check_concentration("alpha", *value)?,
            Prior::Vector(values) => {
                if values.len() != self.num_topics {
                    return Err(invalid(
                        "alpha",
                        format!(
                            "expected {} values (one per topic), got {}",
                            self.num_topics,
                            values.len()
                        ),
                    ));
                }
                for &value in values {
                    check_concentration("alpha", value)?;
                }
            }
        }

        match &self.eta {
            None | Some(Prior::Named(PriorShape::Symmetric | PriorShape::Auto)) => {}
            Some(Prior::Named(PriorShape::Asymmetric)) => {
                return Err(invalid("eta", "an asymmetric eta prior is not defined"));
            }
            Some(Prior::Scalar(value)) => check_concentration("eta", *value)?,
            Some(Prior::Vector(values)) => {
                for &value in values {
                    check_concentration("eta", value)?;
                }
            }
        }

        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.into(),
    }
}

fn check_concentration(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("concentration {} is not positive", value)))
    }
}

/// Partial hyperparameter set; unset fields leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperparameterOverrides {
    pub num_topics: Option<usize>,
    pub distributed: Option<bool>,
    pub chunksize: Option<usize>,
    pub passes: Option<usize>,
    pub update_every: Option<usize>,
    pub alpha: Option<Prior>,
    pub eta: Option<Prior>,
    pub decay: Option<f64>,
    pub offset: Option<f64>,
    pub eval_every: Option<usize>,
    pub iterations: Option<usize>,
    pub gamma_threshold: Option<f64>,
    pub minimum_probability: Option<f64>,
    pub random_state: Option<u64>,
    pub ns_conf: Option<NameServerConfig>,
    pub minimum_phi_value: Option<f64>,
    pub per_word_topics: Option<bool>,
}

impl HyperparameterOverrides {
    /// Empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from JSON; unknown keys are rejected
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Set number of topics
    pub fn num_topics(mut self, n: usize) -> Self {
        self.num_topics = Some(n);
        self
    }

    /// Set document-topic prior
    pub fn alpha(mut self, alpha: Prior) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Set topic-word prior
    pub fn eta(mut self, eta: Prior) -> Self {
        self.eta = Some(eta);
        self
    }

    /// Set number of passes
    pub fn passes(mut self, n: usize) -> Self {
        self.passes = Some(n);
        self
    }

    /// Set chunk size
    pub fn chunksize(mut self, n: usize) -> Self {
        self.chunksize = Some(n);
        self
    }

    /// Set per-document inference iterations
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Set perplexity evaluation interval
    pub fn eval_every(mut self, n: usize) -> Self {
        self.eval_every = Some(n);
        self
    }

    /// Set minimum topic probability for document queries
    pub fn minimum_probability(mut self, p: f64) -> Self {
        self.minimum_probability = Some(p);
        self
    }

    /// Set random seed
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set minimum per-word relevance kept in per-word output
    pub fn minimum_phi_value(mut self, p: f64) -> Self {
        self.minimum_phi_value = Some(p);
        self
    }

    /// Request per-word topic detail for held-out documents
    pub fn per_word_topics(mut self, enable: bool) -> Self {
        self.per_word_topics = Some(enable);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = LdaHyperparameters::default();
        assert_eq!(params.num_topics, 100);
        assert_eq!(params.chunksize, 2000);
        assert_eq!(params.alpha, Prior::Named(PriorShape::Symmetric));
        assert_eq!(params.eta, None);
        assert_eq!(params.eval_every, 10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_merge_is_shallow_and_cumulative() {
        let mut params = LdaHyperparameters::default();
        params.merge(&HyperparameterOverrides::new().num_topics(7));
        params.merge(&HyperparameterOverrides::new().passes(3));

        assert_eq!(params.num_topics, 7);
        assert_eq!(params.passes, 3);
        assert_eq!(params.iterations, 50);
    }

    #[test]
    fn test_scalar_alpha_expansion() {
        let mut params = LdaHyperparameters::new(4);
        params.merge(&HyperparameterOverrides::new().alpha(Prior::Scalar(0.25)));
        params.expand_symmetric_alpha();

        assert_eq!(params.alpha, Prior::Vector(vec![0.25; 4]));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let params = LdaHyperparameters::new(0);
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidValue { name: "num_topics", .. })
        ));

        let mut params = LdaHyperparameters::new(3);
        params.alpha = Prior::Vector(vec![0.1, 0.1]);
        assert!(params.validate().is_err());

        let mut params = LdaHyperparameters::new(3);
        params.eta = Some(Prior::Named(PriorShape::Asymmetric));
        assert!(params.validate().is_err());

        let mut params = LdaHyperparameters::new(3);
        params.distributed = true;
        assert!(matches!(params.validate(), Err(ConfigError::Unsupported(_))));
    }

    #[test]
    fn test_prior_deserialization() {
        let overrides: HyperparameterOverrides =
            serde_json::from_str(r#"{"alpha": "auto", "eta": 0.05, "num_topics": 3}"#).unwrap();
        assert_eq!(overrides.alpha, Some(Prior::Named(PriorShape::Auto)));
        assert_eq!(overrides.eta, Some(Prior::Scalar(0.05)));
        assert_eq!(overrides.num_topics, Some(3));

        let overrides: HyperparameterOverrides =
            serde_json::from_str(r#"{"alpha": [0.1, 0.2]}"#).unwrap();
        assert_eq!(overrides.alpha, Some(Prior::Vector(vec![0.1, 0.2])));

        let unknown: Result<HyperparameterOverrides, _> =
            serde_json::from_str(r#"{"num_topic": 3}"#);
        assert!(unknown.is_err());
    }
}
