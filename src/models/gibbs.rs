//! Latent Dirichlet Allocation (LDA) with collapsed Gibbs sampling
//!
//! Every token carries a topic assignment; a sweep resamples each
//! assignment from its full conditional given all others. Topic-word and
//! document-topic estimates are read off the count tables.

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;

use super::{
    rank_topics, resolve_alpha, resolve_eta, top_n, BagOfWords, DocumentTopics, LdaError, TopicModel,
    TopicModelTrainer,
};
use crate::config::LdaHyperparameters;
use crate::preprocessing::dictionary::Dictionary;

const PROBABILITY_FLOOR: f64 = 1e-8;

/// LDA model estimated by collapsed Gibbs sampling
#[derive(Debug, Clone)]
pub struct GibbsLdaModel {
    num_topics: usize,
    num_terms: usize,
    alpha: Array1<f64>,
    alpha_sum: f64,
    eta: Array1<f64>,
    eta_sum: f64,
    /// Sweeps run by each training call
    sweeps: usize,
    /// Sweeps used to fold a query document in
    fold_in_sweeps: usize,
    minimum_probability: f64,
    minimum_phi_value: f64,
    eval_every: usize,
    /// Topic-word counts: num_topics x num_terms
    topic_word_counts: Array2<f64>,
    /// Tokens assigned to each topic
    topic_counts: Array1<f64>,
    /// Per document: tokens assigned to each topic
    doc_topic_counts: Vec<Array1<f64>>,
    /// Per document: term id of every token
    documents: Vec<Vec<usize>>,
    /// Per document: topic of every token
    assignments: Vec<Vec<usize>>,
    rng: StdRng,
    log_likelihood_history: Vec<f64>,
}

impl GibbsLdaModel {
    /// Create a model with empty count tables
    pub fn new(num_terms: usize, params: &LdaHyperparameters) -> Result<Self, LdaError> {
        let num_topics = params.num_topics;
        if num_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if num_terms == 0 {
            return Err(LdaError::EmptyVocabulary);
        }

        let (alpha, learn_alpha) = resolve_alpha(&params.alpha, num_topics)?;
        let (eta, learn_eta) = resolve_eta(params.eta.as_ref(), num_topics, num_terms)?;
        if learn_alpha || learn_eta {
            return Err(LdaError::Unsupported(
                "learned priors are not available for Gibbs sampling".into(),
            ));
        }

        let rng = match params.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            num_topics,
            num_terms,
            alpha_sum: alpha.sum(),
            alpha,
            eta_sum: eta.sum(),
            eta,
            sweeps: params.iterations.saturating_mul(params.passes),
            fold_in_sweeps: params.iterations,
            minimum_probability: params.minimum_probability.max(PROBABILITY_FLOOR),
            minimum_phi_value: params.minimum_phi_value.max(PROBABILITY_FLOOR),
            eval_every: params.eval_every,
            topic_word_counts: Array2::zeros((num_topics, num_terms)),
            topic_counts: Array1::zeros(num_topics),
            doc_topic_counts: Vec::new(),
            documents: Vec::new(),
            assignments: Vec::new(),
            rng,
            log_likelihood_history: Vec::new(),
        })
    }

    /// Expand documents into tokens and assign each a random topic
    fn add_documents(&mut self, corpus: &[BagOfWords]) {
        for bow in corpus {
            let words: Vec<usize> = bow
                .iter()
                .flat_map(|&(id, count)| std::iter::repeat(id).take(count as usize))
                .collect();

            let mut doc_counts = Array1::zeros(self.num_topics);
            let mut topics = Vec::with_capacity(words.len());
            for &word in &words {
                let topic = self.rng.gen_range(0..self.num_topics);
                self.topic_word_counts[[topic, word]] += 1.0;
                self.topic_counts[topic] += 1.0;
                doc_counts[topic] += 1.0;
                topics.push(topic);
            }

            self.documents.push(words);
            self.assignments.push(topics);
            self.doc_topic_counts.push(doc_counts);
        }
    }

    /// Resample every token assignment once
    fn sweep(&mut self, weights: &mut Vec<f64>) {
        for doc in 0..self.documents.len() {
            for pos in 0..self.documents[doc].len() {
                let word = self.documents[doc][pos];
                let old_topic = self.assignments[doc][pos];

                self.topic_word_counts[[old_topic, word]] -= 1.0;
                self.topic_counts[old_topic] -= 1.0;
                self.doc_topic_counts[doc][old_topic] -= 1.0;

                weights.clear();
                for topic in 0..self.num_topics {
                    let doc_topic = self.doc_topic_counts[doc][topic] + self.alpha[topic];
                    let topic_word = (self.topic_word_counts[[topic, word]] + self.eta[word])
                        / (self.topic_counts[topic] + self.eta_sum);
                    weights.push(doc_topic * topic_word);
                }
                let new_topic = sample_index(weights, &mut self.rng);

                self.topic_word_counts[[new_topic, word]] += 1.0;
                self.topic_counts[new_topic] += 1.0;
                self.doc_topic_counts[doc][new_topic] += 1.0;
                self.assignments[doc][pos] = new_topic;
            }
        }
    }

    fn run(&mut self, sweeps: usize) {
        let mut weights = Vec::with_capacity(self.num_topics);
        for iter in 0..sweeps {
            self.sweep(&mut weights);

            if self.eval_every > 0 && (iter + 1) % self.eval_every == 0 {
                let ll = self.log_likelihood();
                debug!("sweep {}/{}: log-likelihood {:.3}", iter + 1, sweeps, ll);
                self.log_likelihood_history.push(ll);
            }
        }
    }

    /// Fold a document in against the fixed topic-word estimates
    ///
    /// Returns the dense topic proportions and the topic-word matrix used.
    fn fold_in(&mut self, bow: &[(usize, u32)]) -> (Array1<f64>, Array2<f64>) {
        let phi = self.topics();
        let words: Vec<usize> = bow
            .iter()
            .filter(|(id, _)| *id < self.num_terms)
            .flat_map(|&(id, count)| std::iter::repeat(id).take(count as usize))
            .collect();

        let mut counts = Array1::<f64>::zeros(self.num_topics);
        let mut assignments: Vec<usize> = words
            .iter()
            .map(|_| self.rng.gen_range(0..self.num_topics))
            .collect();
        for &topic in &assignments {
            counts[topic] += 1.0;
        }

        let mut weights = Vec::with_capacity(self.num_topics);
        for _ in 0..self.fold_in_sweeps {
            for (pos, &word) in words.iter().enumerate() {
                counts[assignments[pos]] -= 1.0;

                weights.clear();
                weights.extend(
                    (0..self.num_topics).map(|t| (counts[t] + self.alpha[t]) * phi[[t, word]]),
                );
                let topic = sample_index(&weights, &mut self.rng);

                counts[topic] += 1.0;
                assignments[pos] = topic;
            }
        }

        let theta = (counts + &self.alpha) / (words.len() as f64 + self.alpha_sum);
        (theta, phi)
    }

    fn filter_topics(&self, theta: &Array1<f64>) -> Vec<(usize, f64)> {
        theta
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| *p >= self.minimum_probability)
            .collect()
    }

    /// Log-likelihood of the current assignments under the point estimates
    pub fn log_likelihood(&self) -> f64 {
        let mut ll = 0.0;

        for topic in 0..self.num_topics {
            let denom = self.topic_counts[topic] + self.eta_sum;
            for (word, &count) in self.topic_word_counts.row(topic).iter().enumerate() {
                if count > 0.0 {
                    ll += count * ((count + self.eta[word]) / denom).ln();
                }
            }
        }

        for doc_counts in &self.doc_topic_counts {
            let denom = doc_counts.sum() + self.alpha_sum;
            for (topic, &count) in doc_counts.iter().enumerate() {
                if count > 0.0 {
                    ll += count * ((count + self.alpha[topic]) / denom).ln();
                }
            }
        }

        ll
    }

    /// Log-likelihood values recorded every `eval_every` sweeps
    pub fn log_likelihood_history(&self) -> &[f64] {
        &self.log_likelihood_history
    }

    /// Number of documents the count tables were built from
    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }
}

impl TopicModel for GibbsLdaModel {
    fn num_topics(&self) -> usize {
        self.num_topics
    }

    fn num_terms(&self) -> usize {
        self.num_terms
    }

    fn topics(&self) -> Array2<f64> {
        let mut topics = &self.topic_word_counts + &self.eta.view().insert_axis(Axis(0));
        for (mut row, &count) in topics.axis_iter_mut(Axis(0)).zip(self.topic_counts.iter()) {
            row /= count + self.eta_sum;
        }
        topics
    }

    fn topic_terms(&self, topic: usize, top_n_terms: usize) -> Result<Vec<(usize, f64)>, LdaError> {
        if topic >= self.num_topics {
            return Err(LdaError::TopicOutOfRange {
                topic,
                num_topics: self.num_topics,
            });
        }
        let denom = self.topic_counts[topic] + self.eta_sum;
        let weights = (&self.topic_word_counts.row(topic) + &self.eta) / denom;
        Ok(top_n(weights.view(), top_n_terms))
    }

    fn document_topics(&mut self, bow: &[(usize, u32)]) -> Vec<(usize, f64)> {
        let (theta, _) = self.fold_in(bow);
        self.filter_topics(&theta)
    }

    /// Per-word relevance splits each word's count over the topics in
    /// proportion to `theta_k * phi_kw`
    fn document_topics_per_word(&mut self, bow: &[(usize, u32)]) -> DocumentTopics {
        let (theta, phi) = self.fold_in(bow);
        let topics = self.filter_topics(&theta);

        let mut word_topics = Vec::new();
        let mut word_phis = Vec::new();
        for &(id, count) in bow.iter().filter(|(id, _)| *id < self.num_terms) {
            let weights = &theta * &phi.column(id);
            let norm = weights.sum();
            let relevant: Vec<(usize, f64)> = weights
                .iter()
                .map(|&w| count as f64 * w / norm)
                .enumerate()
                .filter(|(_, value)| *value >= self.minimum_phi_value)
                .collect();

            word_topics.push((id, rank_topics(&relevant)));
            word_phis.push((id, relevant));
        }

        DocumentTopics {
            topics,
            word_topics,
            word_phis,
        }
    }

    /// Add the documents to the collection and resample everything
    fn update(&mut self, corpus: &[BagOfWords]) -> Result<(), LdaError> {
        if let Some(&(term, _)) = corpus
            .iter()
            .flat_map(|doc| doc.iter())
            .find(|(id, _)| *id >= self.num_terms)
        {
            return Err(LdaError::TermOutOfRange {
                term,
                num_terms: self.num_terms,
            });
        }

        self.add_documents(corpus);
        info!(
            "Gibbs sampling {} sweeps over {} documents, {} topics",
            self.sweeps,
            self.documents.len(),
            self.num_topics
        );
        self.run(self.sweeps);
        Ok(())
    }
}

/// Draw an index with probability proportional to its weight
fn sample_index(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let threshold = rng.gen::<f64>() * total;

    let mut cumsum = 0.0;
    for (idx, &weight) in weights.iter().enumerate() {
        cumsum += weight;
        if cumsum >= threshold {
            return idx;
        }
    }
    weights.len() - 1
}

/// Trains [`GibbsLdaModel`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct GibbsLdaTrainer;

impl TopicModelTrainer for GibbsLdaTrainer {
    type Model = GibbsLdaModel;

    fn train(
        &self,
        corpus: &[BagOfWords],
        dictionary: &Dictionary,
        params: &LdaHyperparameters,
    ) -> Result<GibbsLdaModel, LdaError> {
        let mut model = GibbsLdaModel::new(dictionary.len(), params)?;
        model.update(corpus)?;
        Ok(model)
    }
}
