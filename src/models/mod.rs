//! Topic model back-ends
//!
//! This module defines the "trainable topic model" capability the adapter
//! depends on, and provides two implementations:
//! - [`lda::OnlineLdaTrainer`]: online variational Bayes
//! - [`gibbs::GibbsLdaTrainer`]: collapsed Gibbs sampling

pub mod gibbs;
pub mod lda;

use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

use crate::config::{LdaHyperparameters, Prior, PriorShape};
use crate::preprocessing::dictionary::Dictionary;

/// Sparse document encoding: `(token id, count)` pairs
pub type BagOfWords = Vec<(usize, u32)>;

/// Errors raised by the topic model back-ends
#[derive(Error, Debug)]
pub enum LdaError {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Cannot train over an empty vocabulary")]
    EmptyVocabulary,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported option: {0}")]
    Unsupported(String),

    #[error("Topic {topic} out of range for a model with {num_topics} topics")]
    TopicOutOfRange { topic: usize, num_topics: usize },

    #[error("Term id {term} out of range for a vocabulary of {num_terms} terms")]
    TermOutOfRange { term: usize, num_terms: usize },
}

/// Topic distribution of a document together with per-word topic detail
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTopics {
    /// `(topic, probability)` above the minimum-probability floor
    pub topics: Vec<(usize, f64)>,
    /// Per term id: relevant topics, most relevant first
    pub word_topics: Vec<(usize, Vec<usize>)>,
    /// Per term id: `(topic, phi)` where phi is the expected count of the
    /// term attributed to the topic
    pub word_phis: Vec<(usize, Vec<(usize, f64)>)>,
}

/// A trained topic model
pub trait TopicModel {
    fn num_topics(&self) -> usize;

    fn num_terms(&self) -> usize;

    /// Dense `num_topics x num_terms` matrix; each row is a distribution
    fn topics(&self) -> Array2<f64>;

    /// Top `top_n` `(term id, weight)` pairs of a topic, heaviest first
    fn topic_terms(&self, topic: usize, top_n: usize) -> Result<Vec<(usize, f64)>, LdaError>;

    /// Sparse `(topic, probability)` distribution of a document
    ///
    /// Topics under the model's minimum-probability floor are omitted.
    /// Takes `&mut self` because inference draws from the model's RNG.
    fn document_topics(&mut self, bow: &[(usize, u32)]) -> Vec<(usize, f64)>;

    /// [`TopicModel::document_topics`] plus per-word topic relevance
    ///
    /// Only words in the vocabulary are listed; relevance below the model's
    /// `minimum_phi_value` is omitted.
    fn document_topics_per_word(&mut self, bow: &[(usize, u32)]) -> DocumentTopics;

    /// Continue training on additional documents
    fn update(&mut self, corpus: &[BagOfWords]) -> Result<(), LdaError>;
}

/// Builds a [`TopicModel`] from an encoded corpus
pub trait TopicModelTrainer {
    type Model: TopicModel;

    fn train(
        &self,
        corpus: &[BagOfWords],
        dictionary: &Dictionary,
        params: &LdaHyperparameters,
    ) -> Result<Self::Model, LdaError>;
}

/// Resolve the document-topic prior into one concentration per topic
///
/// Returns the vector and whether it should be learned during training.
pub(crate) fn resolve_alpha(prior: &Prior, num_topics: usize) -> Result<(Array1<f64>, bool), LdaError> {
    let k = num_topics as f64;
    let resolved = match prior {
        Prior::Named(PriorShape::Symmetric) => (Array1::from_elem(num_topics, 1.0 / k), false),
        Prior::Named(PriorShape::Auto) => (Array1::from_elem(num_topics, 1.0 / k), true),
        Prior::Named(PriorShape::Asymmetric) => {
            let mut values: Array1<f64> =
                (0..num_topics).map(|i| 1.0 / (i as f64 + k.sqrt())).collect();
            let total = values.sum();
            values /= total;
            (values, false)
        }
        Prior::Scalar(value) => (Array1::from_elem(num_topics, *value), false),
        Prior::Vector(values) => {
            if values.len() != num_topics {
                return Err(LdaError::InvalidParameter(format!(
                    "alpha has {} values for {} topics",
                    values.len(),
                    num_topics
                )));
            }
            (Array1::from(values.clone()), false)
        }
    };
    Ok(resolved)
}

/// Resolve the topic-word prior into one concentration per term
pub(crate) fn resolve_eta(
    prior: Option<&Prior>,
    num_topics: usize,
    num_terms: usize,
) -> Result<(Array1<f64>, bool), LdaError> {
    let symmetric = 1.0 / num_topics as f64;
    let resolved = match prior {
        None | Some(Prior::Named(PriorShape::Symmetric)) => {
            (Array1::from_elem(num_terms, symmetric), false)
        }
        Some(Prior::Named(PriorShape::Auto)) => (Array1::from_elem(num_terms, symmetric), true),
        Some(Prior::Named(PriorShape::Asymmetric)) => {
            return Err(LdaError::InvalidParameter(
                "eta cannot be asymmetric".into(),
            ))
        }
        Some(Prior::Scalar(value)) => (Array1::from_elem(num_terms, *value), false),
        Some(Prior::Vector(values)) => {
            if values.len() != num_terms {
                return Err(LdaError::InvalidParameter(format!(
                    "eta has {} values for a vocabulary of {} terms",
                    values.len(),
                    num_terms
                )));
            }
            (Array1::from(values.clone()), false)
        }
    };
    Ok(resolved)
}

/// Indices of the `n` largest weights, heaviest first; ties keep lower ids first
pub(crate) fn top_n(weights: ArrayView1<f64>, n: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Topic ids of `(topic, weight)` pairs, heaviest first
pub(crate) fn rank_topics(weights: &[(usize, f64)]) -> Vec<usize> {
    let mut ranked = weights.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(topic, _)| topic).collect()
}
