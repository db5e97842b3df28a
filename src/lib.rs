//! # LDA Adapter
//!
//! Latent Dirichlet Allocation behind a uniform "train, then extract views"
//! interface.
//!
//! This library provides:
//! - Tokenization and a token <-> id dictionary for bag-of-words encoding
//! - Online variational Bayes and collapsed Gibbs LDA back-ends
//! - An adapter that caches vocabulary and corpus across training calls and
//!   returns topic-word, topic-document and held-out views
//! - Topic quality metrics (UMass coherence, diversity, overlap)
//!
//! ## Example
//!
//! ```rust,no_run
//! use lda_adapter::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let dataset = DocumentDataset::load("corpus.tsv")?;
//!
//!     let mut adapter = LdaAdapter::with_hyperparameters(LdaHyperparameters::new(10));
//!     let mut state = ModelState::new();
//!
//!     let overrides = HyperparameterOverrides::new().passes(5).random_state(42);
//!     let output = adapter.train_model(&mut state, &dataset, &overrides, &TrainOptions::default())?;
//!
//!     for (i, words) in output.topics.unwrap_or_default().iter().enumerate() {
//!         println!("Topic {}: {}", i, words.join(", "));
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod dataset;
pub mod models;
pub mod preprocessing;
pub mod utils;

pub use adapter::{
    AdapterError, HeldOutOutput, LdaAdapter, ModelInfo, ModelState, TopicModelOutput, TrainOptions,
    WordTopics,
};
pub use config::{ConfigError, HyperparameterOverrides, LdaHyperparameters, Prior, PriorShape};
pub use dataset::{Dataset, DatasetError, DocumentDataset};
pub use models::{BagOfWords, DocumentTopics, LdaError, TopicModel, TopicModelTrainer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapter::*;
    pub use crate::config::*;
    pub use crate::dataset::*;
    pub use crate::models::gibbs::{GibbsLdaModel, GibbsLdaTrainer};
    pub use crate::models::lda::{LdaModel, OnlineLdaTrainer};
    pub use crate::models::{BagOfWords, DocumentTopics, LdaError, TopicModel, TopicModelTrainer};
    pub use crate::preprocessing::dictionary::Dictionary;
    pub use crate::preprocessing::tokenizer::Tokenizer;
    pub use crate::utils::evaluation::{Evaluator, ModelSummary};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
