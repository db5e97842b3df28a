//! LDA adapter
//!
//! Wraps a [`TopicModelTrainer`] behind a single `train_model` call:
//! builds and caches the vocabulary and encoded corpus, merges and validates
//! hyperparameters, trains, and extracts normalized views of the result
//! (topic-word matrix, top words per topic, topic-document matrix and
//! held-out counterparts).

use log::{debug, info};
use ndarray::Array2;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, HyperparameterOverrides, LdaHyperparameters};
use crate::dataset::{Dataset, DatasetError};
use crate::models::lda::OnlineLdaTrainer;
use crate::models::{BagOfWords, LdaError, TopicModel, TopicModelTrainer};
use crate::preprocessing::dictionary::Dictionary;

const MODEL_NAME: &str = "LDA, Latent Dirichlet Allocation";

const CITATION: &str = r"@inproceedings{DBLP:conf/nips/BleiNJ01,
  author    = {David M. Blei and
               Andrew Y. Ng and
               Michael I. Jordan},
  editor    = {Thomas G. Dietterich and
               Suzanna Becker and
               Zoubin Ghahramani},
  title     = {Latent Dirichlet Allocation},
  booktitle = {Advances in Neural Information Processing Systems 14 [Neural Information
               Processing Systems: Natural and Synthetic, {NIPS} 2001, December 3-8,
               2001, Vancouver, British Columbia, Canada]},
  pages     = {601--608},
  publisher = {{MIT} Press},
  year      = {2001},
  url       = {http://papers.nips.cc/paper/2070-latent-dirichlet-allocation},
  timestamp = {Thu, 12 Mar 2020 11:31:34 +0100},
  biburl    = {https://dblp.org/rec/conf/nips/BleiNJ01.bib},
  bibsource = {dblp computer science bibliography, https://dblp.org}
}";

/// Errors surfaced by [`LdaAdapter::train_model`]
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] LdaError),

    #[error("Token id {0} is missing from the vocabulary")]
    UnknownTokenId(usize),
}

/// Model name and citation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub citation: &'static str,
}

/// Cached artifacts carried between training calls
///
/// The vocabulary and encoded corpus are built on the first call and kept
/// until [`ModelState::reset`]; the model is replaced on every successful call.
#[derive(Debug)]
pub struct ModelState<M> {
    dictionary: Option<Arc<Dictionary>>,
    corpus: Vec<BagOfWords>,
    model: Option<M>,
}

impl<M> ModelState<M> {
    pub fn new() -> Self {
        Self {
            dictionary: None,
            corpus: Vec::new(),
            model: None,
        }
    }

    pub fn dictionary(&self) -> Option<&Arc<Dictionary>> {
        self.dictionary.as_ref()
    }

    /// Encoded full corpus; empty until the first training call
    pub fn corpus(&self) -> &[BagOfWords] {
        &self.corpus
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut M> {
        self.model.as_mut()
    }

    /// Drop the cached vocabulary, corpus and model
    pub fn reset(&mut self) {
        self.dictionary = None;
        self.corpus.clear();
        self.model = None;
    }
}

impl<M> Default for ModelState<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Which views `train_model` extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainOptions {
    /// Words per topic list; 0 skips the lists
    pub top_words: usize,
    pub topic_word_matrix: bool,
    pub topic_document_matrix: bool,
    /// Evaluate on the dataset's test partition
    pub use_partitions: bool,
    /// Continue training on the test partition instead of only querying it
    pub update_with_test: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            top_words: 10,
            topic_word_matrix: true,
            topic_document_matrix: true,
            use_partitions: true,
            update_with_test: false,
        }
    }
}

impl TrainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_words(mut self, n: usize) -> Self {
        self.top_words = n;
        self
    }

    pub fn topic_word_matrix(mut self, enable: bool) -> Self {
        self.topic_word_matrix = enable;
        self
    }

    pub fn topic_document_matrix(mut self, enable: bool) -> Self {
        self.topic_document_matrix = enable;
        self
    }

    pub fn use_partitions(mut self, enable: bool) -> Self {
        self.use_partitions = enable;
        self
    }

    pub fn update_with_test(mut self, enable: bool) -> Self {
        self.update_with_test = enable;
        self
    }
}

/// Held-out results
#[derive(Debug, Clone, PartialEq)]
pub enum HeldOutOutput {
    /// The model was updated with the test documents; views recomputed
    Updated {
        topic_word_matrix: Option<Array2<f64>>,
        topics: Option<Vec<Vec<String>>>,
        topic_document_matrix: Option<Array2<f64>>,
    },
    /// Sparse `(topic, probability)` list per test document
    Inferred {
        document_topic_matrix: Vec<Vec<(usize, f64)>>,
        /// Per test document, present when `per_word_topics` is set
        word_topics: Option<Vec<WordTopics>>,
    },
}

/// Per-word topic detail of one held-out document
#[derive(Debug, Clone, PartialEq)]
pub struct WordTopics {
    /// Per term id: relevant topics, most relevant first
    pub word_topics: Vec<(usize, Vec<usize>)>,
    /// Per term id: `(topic, phi)` pairs above `minimum_phi_value`
    pub word_phis: Vec<(usize, Vec<(usize, f64)>)>,
}

/// Result bundle of one training call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopicModelOutput {
    /// `num_topics x vocabulary_size`
    pub topic_word_matrix: Option<Array2<f64>>,
    pub topics: Option<Vec<Vec<String>>>,
    /// `num_topics x documents`
    pub topic_document_matrix: Option<Array2<f64>>,
    pub test: Option<HeldOutOutput>,
}

impl TopicModelOutput {
    pub fn test_topic_word_matrix(&self) -> Option<&Array2<f64>> {
        match &self.test {
            Some(HeldOutOutput::Updated {
                topic_word_matrix, ..
            }) => topic_word_matrix.as_ref(),
            _ => None,
        }
    }

    pub fn test_topics(&self) -> Option<&[Vec<String>]> {
        match &self.test {
            Some(HeldOutOutput::Updated { topics, .. }) => topics.as_deref(),
            _ => None,
        }
    }

    pub fn test_topic_document_matrix(&self) -> Option<&Array2<f64>> {
        match &self.test {
            Some(HeldOutOutput::Updated {
                topic_document_matrix,
                ..
            }) => topic_document_matrix.as_ref(),
            _ => None,
        }
    }

    pub fn test_document_topic_matrix(&self) -> Option<&[Vec<(usize, f64)>]> {
        match &self.test {
            Some(HeldOutOutput::Inferred {
                document_topic_matrix,
                ..
            }) => Some(document_topic_matrix),
            _ => None,
        }
    }

    pub fn test_word_topics(&self) -> Option<&[WordTopics]> {
        match &self.test {
            Some(HeldOutOutput::Inferred { word_topics, .. }) => word_topics.as_deref(),
            _ => None,
        }
    }

    /// JSON object keyed by the view names; absent views are omitted
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        insert_views(
            &mut out,
            "",
            self.topic_word_matrix.as_ref(),
            self.topics.as_deref(),
            self.topic_document_matrix.as_ref(),
        );

        match &self.test {
            Some(HeldOutOutput::Updated {
                topic_word_matrix,
                topics,
                topic_document_matrix,
            }) => insert_views(
                &mut out,
                "test-",
                topic_word_matrix.as_ref(),
                topics.as_deref(),
                topic_document_matrix.as_ref(),
            ),
            Some(HeldOutOutput::Inferred {
                document_topic_matrix,
                word_topics,
            }) => {
                let entries = match word_topics {
                    Some(word_topics) => document_topic_matrix
                        .iter()
                        .zip(word_topics)
                        .map(|(topics, words)| json!([topics, words.word_topics, words.word_phis]))
                        .collect(),
                    None => document_topic_matrix.iter().map(|topics| json!(topics)).collect(),
                };
                out.insert("test-document-topic-matrix".into(), Value::Array(entries));
            }
            None => {}
        }

        Value::Object(out)
    }
}

fn insert_views(
    out: &mut Map<String, Value>,
    prefix: &str,
    topic_word: Option<&Array2<f64>>,
    topics: Option<&[Vec<String>]>,
    topic_document: Option<&Array2<f64>>,
) {
    if let Some(matrix) = topic_word {
        out.insert(format!("{}topic-word-matrix", prefix), matrix_to_json(matrix));
    }
    if let Some(topics) = topics {
        out.insert(format!("{}topics", prefix), json!(topics));
    }
    if let Some(matrix) = topic_document {
        out.insert(format!("{}topic-document-matrix", prefix), matrix_to_json(matrix));
    }
}

fn matrix_to_json(matrix: &Array2<f64>) -> Value {
    let rows: Vec<Vec<f64>> = matrix.rows().into_iter().map(|row| row.to_vec()).collect();
    json!(rows)
}

/// Topic model adapter over an injected training back-end
#[derive(Debug, Clone)]
pub struct LdaAdapter<T = OnlineLdaTrainer> {
    trainer: T,
    hyperparameters: LdaHyperparameters,
}

impl LdaAdapter<OnlineLdaTrainer> {
    /// Online variational Bayes back-end with default hyperparameters
    pub fn new() -> Self {
        Self::with_hyperparameters(LdaHyperparameters::default())
    }

    pub fn with_hyperparameters(hyperparameters: LdaHyperparameters) -> Self {
        Self {
            trainer: OnlineLdaTrainer,
            hyperparameters,
        }
    }
}

impl Default for LdaAdapter<OnlineLdaTrainer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TopicModelTrainer> LdaAdapter<T> {
    pub fn with_trainer(trainer: T, hyperparameters: LdaHyperparameters) -> Self {
        Self {
            trainer,
            hyperparameters,
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: MODEL_NAME,
            citation: CITATION,
        }
    }

    /// Persistent hyperparameters, including every override merged so far
    pub fn hyperparameters(&self) -> &LdaHyperparameters {
        &self.hyperparameters
    }

    /// Train on the dataset's full corpus and extract the requested views
    ///
    /// Overrides are merged into the persistent set only if the merged set
    /// validates. On failure the cached vocabulary and corpus are kept and
    /// the model slot still holds the previous model, if any.
    pub fn train_model(
        &mut self,
        state: &mut ModelState<T::Model>,
        dataset: &dyn Dataset,
        overrides: &HyperparameterOverrides,
        options: &TrainOptions,
    ) -> Result<TopicModelOutput, AdapterError> {
        let test_documents = if options.use_partitions {
            Some(dataset.partitioned_corpus()?.1)
        } else {
            None
        };

        let dictionary = match &state.dictionary {
            Some(dictionary) => Arc::clone(dictionary),
            None => {
                let documents = dataset.corpus()?;
                let dictionary = Arc::new(Dictionary::from_documents(documents));
                state.corpus = dictionary.encode_corpus(documents);
                state.dictionary = Some(Arc::clone(&dictionary));
                info!(
                    "Built dictionary of {} terms from {} documents",
                    dictionary.len(),
                    state.corpus.len()
                );
                dictionary
            }
        };

        let mut hyperparameters = self.hyperparameters.clone();
        hyperparameters.merge(overrides);
        hyperparameters.expand_symmetric_alpha();
        hyperparameters.validate()?;
        self.hyperparameters = hyperparameters;

        info!(
            "Training {} topics over {} documents",
            self.hyperparameters.num_topics,
            state.corpus.len()
        );
        let trained = self
            .trainer
            .train(&state.corpus, &dictionary, &self.hyperparameters)?;
        let model = state.model.insert(trained);

        let mut output = TopicModelOutput::default();
        if options.topic_word_matrix {
            output.topic_word_matrix = Some(model.topics());
        }
        if options.top_words > 0 {
            output.topics = Some(topic_words(model, &dictionary, options.top_words)?);
        }
        if options.topic_document_matrix {
            output.topic_document_matrix = Some(topic_document_matrix(model, &state.corpus));
        }

        if let Some(test_documents) = test_documents {
            let test_corpus = dictionary.encode_corpus(test_documents);
            debug!("Encoded {} held-out documents", test_corpus.len());

            output.test = Some(if options.update_with_test {
                model.update(&test_corpus)?;
                HeldOutOutput::Updated {
                    topic_word_matrix: options.topic_word_matrix.then(|| model.topics()),
                    topics: if options.top_words > 0 {
                        Some(topic_words(model, &dictionary, options.top_words)?)
                    } else {
                        None
                    },
                    topic_document_matrix: options
                        .topic_document_matrix
                        .then(|| topic_document_matrix(model, &state.corpus)),
                }
            } else if self.hyperparameters.per_word_topics {
                let (document_topic_matrix, word_topics): (Vec<_>, Vec<_>) = test_corpus
                    .iter()
                    .map(|bow| {
                        let detail = model.document_topics_per_word(bow);
                        let words = WordTopics {
                            word_topics: detail.word_topics,
                            word_phis: detail.word_phis,
                        };
                        (detail.topics, words)
                    })
                    .unzip();
                HeldOutOutput::Inferred {
                    document_topic_matrix,
                    word_topics: Some(word_topics),
                }
            } else {
                HeldOutOutput::Inferred {
                    document_topic_matrix: test_corpus
                        .iter()
                        .map(|bow| model.document_topics(bow))
                        .collect(),
                    word_topics: None,
                }
            });
        }

        Ok(output)
    }
}

/// Top `top_k` tokens of every topic, heaviest first
fn topic_words<M: TopicModel>(
    model: &M,
    dictionary: &Dictionary,
    top_k: usize,
) -> Result<Vec<Vec<String>>, AdapterError> {
    (0..model.num_topics())
        .map(|topic| {
            model
                .topic_terms(topic, top_k)?
                .into_iter()
                .map(|(id, _)| {
                    dictionary
                        .id_to_token(id)
                        .map(str::to_string)
                        .ok_or(AdapterError::UnknownTokenId(id))
                })
                .collect()
        })
        .collect()
}

/// Dense `num_topics x documents` matrix of document-topic probabilities
fn topic_document_matrix<M: TopicModel>(model: &mut M, corpus: &[BagOfWords]) -> Array2<f64> {
    let mut matrix = Array2::zeros((model.num_topics(), corpus.len()));
    for (doc, bow) in corpus.iter().enumerate() {
        for (topic, probability) in model.document_topics(bow) {
            matrix[[topic, doc]] = probability;
        }
    }
    matrix
}
