//! Latent Dirichlet Allocation (LDA) with online variational Bayes
//!
//! Streams the corpus in chunks. Each chunk runs a variational E-step per
//! document (updating the document's topic proportions `gamma`) and
//! accumulates expected word-topic counts, which the M-step blends into the
//! global topic-word parameters `lambda` with a decaying step size
//! `rho = (offset + pass + updates / chunksize)^-decay`.
//!
//! Reference: Hoffman, Blei, Bach. "Online Learning for Latent Dirichlet
//! Allocation", NIPS 2010.

use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_distr::Gamma;
use statrs::function::gamma::{digamma, ln_gamma};

use super::{
    rank_topics, resolve_alpha, resolve_eta, top_n, BagOfWords, DocumentTopics, LdaError, TopicModel,
    TopicModelTrainer,
};
use crate::config::LdaHyperparameters;
use crate::preprocessing::dictionary::Dictionary;
use crate::utils::math::{
    dirichlet_expectation, dirichlet_expectation_rows, logsumexp, sum_ln_gamma, trigamma,
};

/// Added to phi normalizers so empty overlaps never divide by zero
const PHI_NORM_EPS: f64 = 1e-100;
/// Shape and scale of the Gamma draws that initialise lambda and gamma
const INIT_GAMMA_SHAPE: f64 = 100.0;
const INIT_GAMMA_SCALE: f64 = 0.01;
/// Lowest probability floor applied to document queries
const PROBABILITY_FLOOR: f64 = 1e-8;

/// Expected word-topic counts and the number of documents behind them
#[derive(Debug, Clone)]
struct SufficientStats {
    sstats: Array2<f64>,
    numdocs: usize,
}

impl SufficientStats {
    fn zeros(num_topics: usize, num_terms: usize) -> Self {
        Self {
            sstats: Array2::zeros((num_topics, num_terms)),
            numdocs: 0,
        }
    }

    /// Interpolate towards `other`, rescaled to this state's document count
    fn blend(&mut self, rho: f64, other: &SufficientStats) {
        let target = self.numdocs;
        self.sstats *= 1.0 - rho;

        let scale = if other.numdocs == 0 || other.numdocs == target {
            1.0
        } else {
            target as f64 / other.numdocs as f64
        };
        self.sstats.scaled_add(rho * scale, &other.sstats);
    }
}

/// LDA model trained with online variational Bayes
#[derive(Debug, Clone)]
pub struct LdaModel {
    params: LdaHyperparameters,
    num_topics: usize,
    num_terms: usize,
    /// Document-topic prior, one value per topic
    alpha: Array1<f64>,
    optimize_alpha: bool,
    /// Topic-word prior, one value per term
    eta: Array1<f64>,
    optimize_eta: bool,
    state: SufficientStats,
    /// `exp(E[log beta])`, cached between M-steps
    exp_elog_beta: Array2<f64>,
    /// Documents absorbed by M-steps outside repeat passes
    num_updates: usize,
    rng: StdRng,
    init_dist: Gamma<f64>,
    /// Per-word bounds from perplexity evaluations
    bound_history: Vec<f64>,
}

impl LdaModel {
    /// Create an untrained model over a vocabulary of `num_terms` terms
    pub fn new(num_terms: usize, params: &LdaHyperparameters) -> Result<Self, LdaError> {
        let num_topics = params.num_topics;
        if num_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if num_terms == 0 {
            return Err(LdaError::EmptyVocabulary);
        }
        if params.distributed {
            return Err(LdaError::Unsupported(
                "distributed training is not available in-process".into(),
            ));
        }

        let (alpha, optimize_alpha) = resolve_alpha(&params.alpha, num_topics)?;
        let (eta, optimize_eta) = resolve_eta(params.eta.as_ref(), num_topics, num_terms)?;

        let mut rng = match params.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let init_dist = Gamma::new(INIT_GAMMA_SHAPE, INIT_GAMMA_SCALE)
            .map_err(|e| LdaError::InvalidParameter(e.to_string()))?;

        let mut state = SufficientStats::zeros(num_topics, num_terms);
        state
            .sstats
            .mapv_inplace(|_| init_dist.sample(&mut rng));

        let mut model = Self {
            params: params.clone(),
            num_topics,
            num_terms,
            alpha,
            optimize_alpha,
            eta,
            optimize_eta,
            state,
            exp_elog_beta: Array2::zeros((num_topics, num_terms)),
            num_updates: 0,
            rng,
            init_dist,
            bound_history: Vec::new(),
        };
        model.sync_state();
        Ok(model)
    }

    /// Variational topic-word parameters: `eta + sstats`
    fn lambda(&self) -> Array2<f64> {
        let mut lambda = self.state.sstats.clone();
        for mut row in lambda.axis_iter_mut(Axis(0)) {
            row += &self.eta;
        }
        lambda
    }

    fn sync_state(&mut self) {
        self.exp_elog_beta = dirichlet_expectation_rows(&self.lambda()).mapv(f64::exp);
    }

    /// Variational E-step over a chunk of documents
    ///
    /// Returns the per-document `gamma` (documents x topics) and, when
    /// requested, the expected word-topic counts of the chunk.
    fn inference<B>(&mut self, chunk: &[B], collect_sstats: bool) -> (Array2<f64>, Option<Array2<f64>>)
    where
        B: AsRef<[(usize, u32)]>,
    {
        let num_topics = self.num_topics;
        let mut gamma = {
            let (rng, dist) = (&mut self.rng, &self.init_dist);
            Array2::from_shape_simple_fn((chunk.len(), num_topics), || dist.sample(&mut *rng))
        };
        let mut sstats = collect_sstats.then(|| Array2::<f64>::zeros((num_topics, self.num_terms)));

        let mut converged = 0;
        for (d, doc) in chunk.iter().enumerate() {
            let (ids, cts): (Vec<usize>, Vec<f64>) = doc
                .as_ref()
                .iter()
                .filter(|(id, _)| *id < self.num_terms)
                .map(|&(id, count)| (id, count as f64))
                .unzip();
            let cts = Array1::from(cts);
            let exp_elog_betad = self.exp_elog_beta.select(Axis(1), &ids);

            let mut gammad = gamma.row(d).to_owned();
            let mut exp_elog_thetad = dirichlet_expectation(gammad.view()).mapv(f64::exp);
            let mut phinorm = exp_elog_thetad.dot(&exp_elog_betad) + PHI_NORM_EPS;

            for _ in 0..self.params.iterations {
                let last_gamma = gammad.clone();
                let weighted = exp_elog_betad.dot(&(&cts / &phinorm));
                gammad = &self.alpha + &(&exp_elog_thetad * &weighted);
                exp_elog_thetad = dirichlet_expectation(gammad.view()).mapv(f64::exp);
                phinorm = exp_elog_thetad.dot(&exp_elog_betad) + PHI_NORM_EPS;

                let mean_change = (&gammad - &last_gamma)
                    .mapv(f64::abs)
                    .mean()
                    .unwrap_or(0.0);
                if mean_change < self.params.gamma_threshold {
                    converged += 1;
                    break;
                }
            }

            gamma.row_mut(d).assign(&gammad);

            if let Some(stats) = sstats.as_mut() {
                let ratio = &cts / &phinorm;
                for (j, &id) in ids.iter().enumerate() {
                    stats.column_mut(id).scaled_add(ratio[j], &exp_elog_thetad);
                }
            }
        }

        debug!(
            "{}/{} documents converged within {} iterations",
            converged,
            chunk.len(),
            self.params.iterations
        );

        if let Some(stats) = sstats.as_mut() {
            *stats *= &self.exp_elog_beta;
        }
        (gamma, sstats)
    }

    fn do_estep(&mut self, chunk: &[BagOfWords], other: &mut SufficientStats) -> Array2<f64> {
        let (gamma, sstats) = self.inference(chunk, true);
        if let Some(sstats) = sstats {
            other.sstats += &sstats;
        }
        other.numdocs += chunk.len();
        gamma
    }

    fn do_mstep(&mut self, rho: f64, other: &SufficientStats, extra_pass: bool) {
        let previous = self.exp_elog_beta.mapv(f64::ln);
        self.state.blend(rho, other);
        self.sync_state();

        let diff = (&previous - &self.exp_elog_beta.mapv(f64::ln))
            .mapv(f64::abs)
            .mean()
            .unwrap_or(0.0);
        debug!("topic diff={:.6}, rho={:.6}", diff, rho);

        if self.optimize_eta {
            self.update_eta(rho);
            self.sync_state();
        }
        if !extra_pass {
            self.num_updates += other.numdocs;
        }
    }

    fn rho(&self, pass: usize, chunksize: usize) -> f64 {
        let progress = self.params.offset + pass as f64 + self.num_updates as f64 / chunksize as f64;
        progress.powf(-self.params.decay)
    }

    fn update_alpha(&mut self, gammat: &Array2<f64>, rho: f64) {
        let n = gammat.nrows() as f64;
        let logphat = dirichlet_expectation_rows(gammat).sum_axis(Axis(0)) / n;
        self.alpha = update_dir_prior(&self.alpha, n, &logphat, rho);
        debug!("optimized alpha {:?}", self.alpha.as_slice());
    }

    fn update_eta(&mut self, rho: f64) {
        let n = self.num_topics as f64;
        let logphat = dirichlet_expectation_rows(&self.lambda()).sum_axis(Axis(0)) / n;
        self.eta = update_dir_prior(&self.eta, n, &logphat, rho);
    }

    /// Train on a corpus, continuing from the current state
    pub fn update(&mut self, corpus: &[BagOfWords]) -> Result<(), LdaError> {
        let lencorpus = corpus.len();
        if lencorpus == 0 {
            warn!("LDA update called with an empty corpus");
            return Ok(());
        }
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

        let chunksize = self.params.chunksize.min(lencorpus);
        let update_every = self.params.update_every;
        let eval_every = self.params.eval_every;
        self.state.numdocs += lencorpus;

        let update_after = if update_every > 0 {
            update_every.saturating_mul(chunksize).min(lencorpus)
        } else {
            lencorpus
        };
        let updates_per_pass = (lencorpus / update_after).max(1);

        info!(
            "running {} LDA training, {} topics, {} passes over {} documents, \
             updating every {} documents, evaluating every {} documents, \
             {} iterations with convergence threshold {}",
            if update_every > 0 { "online" } else { "batch" },
            self.num_topics,
            self.params.passes,
            lencorpus,
            update_after,
            eval_every.saturating_mul(chunksize).min(lencorpus),
            self.params.iterations,
            self.params.gamma_threshold
        );
        if updates_per_pass.saturating_mul(self.params.passes) < 10 {
            warn!(
                "too few updates, training might not converge; \
                 consider increasing the number of passes or iterations"
            );
        }

        for pass in 0..self.params.passes {
            let mut other = SufficientStats::zeros(self.num_topics, self.num_terms);
            let mut dirty = false;
            let mut reallen = 0;

            for (chunk_no, chunk) in corpus.chunks(chunksize).enumerate() {
                reallen += chunk.len();

                if eval_every > 0 && (reallen == lencorpus || (chunk_no + 1) % eval_every == 0) {
                    self.log_perplexity(chunk, lencorpus);
                }

                debug!("PROGRESS: pass {}, at document #{}/{}", pass, reallen, lencorpus);
                let gammat = self.do_estep(chunk, &mut other);

                if self.optimize_alpha {
                    let rho = self.rho(pass, chunksize);
                    self.update_alpha(&gammat, rho);
                }
                dirty = true;

                if update_every > 0 && (chunk_no + 1) % update_every == 0 {
                    let rho = self.rho(pass, chunksize);
                    self.do_mstep(rho, &other, pass > 0);
                    other = SufficientStats::zeros(self.num_topics, self.num_terms);
                    dirty = false;
                }
            }

            if dirty {
                let rho = self.rho(pass, chunksize);
                self.do_mstep(rho, &other, pass > 0);
            }
        }

        Ok(())
    }

    /// Variational lower bound on the log-likelihood of `corpus`
    ///
    /// The document-level terms are scaled by `subsample_ratio` to estimate
    /// the bound of a larger corpus the chunk was drawn from.
    pub fn bound(&mut self, corpus: &[BagOfWords], subsample_ratio: f64) -> f64 {
        let (gamma, _) = self.inference(corpus, false);
        let lambda = self.lambda();
        let elog_beta = dirichlet_expectation_rows(&lambda);

        let alpha_ln_gamma = sum_ln_gamma(self.alpha.iter());
        let alpha_sum_ln_gamma = ln_gamma(self.alpha.sum());

        let mut score = 0.0;
        for (doc, gammad) in corpus.iter().zip(gamma.axis_iter(Axis(0))) {
            let elog_thetad = dirichlet_expectation(gammad);

            for &(id, count) in doc.iter().filter(|(id, _)| *id < self.num_terms) {
                let column = elog_beta.column(id);
                score += count as f64
                    * logsumexp(elog_thetad.iter().zip(column.iter()).map(|(t, b)| t + b));
            }

            score += ((&self.alpha - &gammad) * &elog_thetad).sum();
            score += sum_ln_gamma(gammad.iter()) - alpha_ln_gamma;
            score += alpha_sum_ln_gamma - ln_gamma(gammad.sum());
        }
        score *= subsample_ratio;

        let eta_ln_gamma = sum_ln_gamma(self.eta.iter());
        let eta_sum_ln_gamma = ln_gamma(self.eta.sum());
        for (lambda_row, elog_row) in lambda.axis_iter(Axis(0)).zip(elog_beta.axis_iter(Axis(0))) {
            score += ((&self.eta - &lambda_row) * &elog_row).sum();
            score += sum_ln_gamma(lambda_row.iter()) - eta_ln_gamma;
            score += eta_sum_ln_gamma - ln_gamma(lambda_row.sum());
        }

        score
    }

    /// Per-word bound of a chunk drawn from a corpus of `total_docs` documents
    ///
    /// Logs the bound with its perplexity estimate `2^-bound` and records it
    /// in [`LdaModel::bound_history`]. `None` when the chunk has no words.
    pub fn log_perplexity(&mut self, chunk: &[BagOfWords], total_docs: usize) -> Option<f64> {
        let corpus_words: u64 = chunk
            .iter()
            .flat_map(|doc| doc.iter())
            .map(|&(_, count)| count as u64)
            .sum();
        if corpus_words == 0 {
            debug!("skipping perplexity estimate for a chunk without words");
            return None;
        }

        let subsample_ratio = total_docs as f64 / chunk.len() as f64;
        let per_word_bound =
            self.bound(chunk, subsample_ratio) / (subsample_ratio * corpus_words as f64);
        info!(
            "{:.3} per-word bound, {:.1} perplexity estimate based on a held-out corpus of {} documents with {} words",
            per_word_bound,
            2f64.powf(-per_word_bound),
            chunk.len(),
            corpus_words
        );
        self.bound_history.push(per_word_bound);
        Some(per_word_bound)
    }

    /// Perplexity estimate `2^-bound` over a whole corpus
    pub fn perplexity(&mut self, corpus: &[BagOfWords]) -> Option<f64> {
        self.log_perplexity(corpus, corpus.len())
            .map(|bound| 2f64.powf(-bound))
    }

    /// Topic distribution plus per-word topic relevance for one document
    pub fn document_topics_per_word(&mut self, bow: &[(usize, u32)]) -> DocumentTopics {
        let (gamma, phis) = self.inference(&[bow], true);
        let topics = self.normalize_document(gamma.row(0).to_owned());

        let phi_floor = self.params.minimum_phi_value.max(PROBABILITY_FLOOR);
        let mut word_topics = Vec::new();
        let mut word_phis = Vec::new();
        if let Some(phis) = phis {
            for &(id, _) in bow.iter().filter(|(id, _)| *id < self.num_terms) {
                let relevant: Vec<(usize, f64)> = phis
                    .column(id)
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, phi)| *phi >= phi_floor)
                    .collect();

                word_topics.push((id, rank_topics(&relevant)));
                word_phis.push((id, relevant));
            }
        }

        DocumentTopics {
            topics,
            word_topics,
            word_phis,
        }
    }

    fn normalize_document(&self, gammad: Array1<f64>) -> Vec<(usize, f64)> {
        let floor = self.params.minimum_probability.max(PROBABILITY_FLOOR);
        let total = gammad.sum();
        gammad
            .iter()
            .map(|&g| g / total)
            .enumerate()
            .filter(|(_, p)| *p >= floor)
            .collect()
    }

    /// Current document-topic prior
    pub fn alpha(&self) -> &Array1<f64> {
        &self.alpha
    }

    /// Current topic-word prior
    pub fn eta(&self) -> &Array1<f64> {
        &self.eta
    }

    /// Per-word bounds recorded during training, oldest first
    pub fn bound_history(&self) -> &[f64] {
        &self.bound_history
    }

    /// Hyperparameters the model was built with
    pub fn params(&self) -> &LdaHyperparameters {
        &self.params
    }
}

impl TopicModel for LdaModel {
    fn num_topics(&self) -> usize {
        self.num_topics
    }

    fn num_terms(&self) -> usize {
        self.num_terms
    }

    fn topics(&self) -> Array2<f64> {
        let mut topics = self.lambda();
        for mut row in topics.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            row /= total;
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
        let mut weights = &self.state.sstats.row(topic) + &self.eta;
        let total = weights.sum();
        weights /= total;
        Ok(top_n(weights.view(), top_n_terms))
    }

    fn document_topics(&mut self, bow: &[(usize, u32)]) -> Vec<(usize, f64)> {
        let (gamma, _) = self.inference(&[bow], false);
        self.normalize_document(gamma.row(0).to_owned())
    }

    fn document_topics_per_word(&mut self, bow: &[(usize, u32)]) -> DocumentTopics {
        LdaModel::document_topics_per_word(self, bow)
    }

    fn update(&mut self, corpus: &[BagOfWords]) -> Result<(), LdaError> {
        LdaModel::update(self, corpus)
    }
}

/// One Newton step of the Dirichlet maximum-likelihood estimate
///
/// The step is rejected when it would make any concentration non-positive.
fn update_dir_prior(prior: &Array1<f64>, n: f64, logphat: &Array1<f64>, rho: f64) -> Array1<f64> {
    let prior_sum = prior.sum();
    let psi_sum = digamma(prior_sum);

    let gradf = prior.mapv(|p| n * (psi_sum - digamma(p))) + &(logphat * n);
    let c = n * trigamma(prior_sum);
    let q = prior.mapv(|p| -n * trigamma(p));
    let b = (&gradf / &q).sum() / (1.0 / c + q.mapv(|v| 1.0 / v).sum());
    let dprior = -(gradf - b) / &q;

    let updated = dprior * rho + prior;
    if updated.iter().all(|&v| v > 0.0 && v.is_finite()) {
        updated
    } else {
        warn!("updated prior is not positive, keeping the previous value");
        prior.clone()
    }
}

/// Trains [`LdaModel`]s with online variational Bayes
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineLdaTrainer;

impl TopicModelTrainer for OnlineLdaTrainer {
    type Model = LdaModel;

    fn train(
        &self,
        corpus: &[BagOfWords],
        dictionary: &Dictionary,
        params: &LdaHyperparameters,
    ) -> Result<LdaModel, LdaError> {
        info!(
            "training online LDA: {} documents, {} terms, {} topics",
            corpus.len(),
            dictionary.len(),
            params.num_topics
        );
        let mut model = LdaModel::new(dictionary.len(), params)?;
        model.update(corpus)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Prior, PriorShape};
    use approx::assert_abs_diff_eq;

    /// Two disjoint word clusters: terms 0-2 and terms 3-5
    fn clustered_corpus() -> Vec<BagOfWords> {
        vec![
            vec![(0, 3), (1, 2), (2, 2)],
            vec![(0, 2), (1, 3), (2, 1)],
            vec![(0, 1), (1, 2), (2, 3)],
            vec![(3, 3), (4, 2), (5, 2)],
            vec![(3, 2), (4, 3), (5, 1)],
            vec![(3, 1), (4, 2), (5, 3)],
        ]
    }

    fn params(num_topics: usize) -> LdaHyperparameters {
        LdaHyperparameters {
            num_topics,
            passes: 50,
            iterations: 100,
            eval_every: 0,
            random_state: Some(42),
            minimum_probability: 0.0,
            ..Default::default()
        }
    }

    fn dominant(distribution: &[(usize, f64)]) -> usize {
        distribution
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|&(topic, _)| topic)
            .unwrap()
    }

    #[test]
    fn test_model_creation_errors() {
        assert!(matches!(
            LdaModel::new(5, &LdaHyperparameters::new(0)),
            Err(LdaError::InvalidTopicCount)
        ));
        assert!(matches!(
            LdaModel::new(0, &LdaHyperparameters::new(2)),
            Err(LdaError::EmptyVocabulary)
        ));

        let mut bad_eta = LdaHyperparameters::new(2);
        bad_eta.eta = Some(Prior::Vector(vec![0.1; 3]));
        assert!(LdaModel::new(5, &bad_eta).is_err());
    }

    #[test]
    fn test_topics_are_distributions() {
        let mut model = LdaModel::new(6, &params(2)).unwrap();
        model.update(&clustered_corpus()).unwrap();

        let topics = model.topics();
        assert_eq!(topics.dim(), (2, 6));
        for row in topics.axis_iter(Axis(0)) {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_separates_disjoint_clusters() {
        let corpus = clustered_corpus();
        let mut model = LdaModel::new(6, &params(2)).unwrap();
        model.update(&corpus).unwrap();

        let dominants: Vec<usize> = corpus
            .iter()
            .map(|doc| dominant(&model.document_topics(doc)))
            .collect();

        assert_eq!(dominants[0], dominants[1]);
        assert_eq!(dominants[1], dominants[2]);
        assert_eq!(dominants[3], dominants[4]);
        assert_eq!(dominants[4], dominants[5]);
        assert_ne!(dominants[0], dominants[3]);

        let top = model.topic_terms(dominants[0], 3).unwrap();
        let mut ids: Vec<usize> = top.iter().map(|&(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let corpus = clustered_corpus();
        let mut a = LdaModel::new(6, &params(3)).unwrap();
        let mut b = LdaModel::new(6, &params(3)).unwrap();
        a.update(&corpus).unwrap();
        b.update(&corpus).unwrap();

        assert_eq!(a.topics(), b.topics());
        assert_eq!(a.document_topics(&corpus[0]), b.document_topics(&corpus[0]));
    }

    #[test]
    fn test_minimum_probability_filters_topics() {
        let mut p = params(4);
        p.minimum_probability = 0.3;
        let mut model = LdaModel::new(6, &p).unwrap();
        model.update(&clustered_corpus()).unwrap();

        let topics = model.document_topics(&[(0, 3), (1, 2)]);
        assert!(topics.len() < 4);
        assert!(topics.iter().all(|&(_, p)| p >= 0.3));
    }

    #[test]
    fn test_update_moves_topics() {
        let corpus = clustered_corpus();
        let mut model = LdaModel::new(6, &params(2)).unwrap();
        model.update(&corpus[..3]).unwrap();
        let before = model.topics();

        model.update(&corpus[3..]).unwrap();
        assert_ne!(before, model.topics());
    }

    #[test]
    fn test_update_rejects_unknown_terms() {
        let mut model = LdaModel::new(3, &params(2)).unwrap();
        let result = model.update(&[vec![(7, 1)]]);
        assert!(matches!(result, Err(LdaError::TermOutOfRange { term: 7, .. })));
    }

    #[test]
    fn test_auto_alpha_is_learned() {
        let mut p = params(2);
        p.alpha = Prior::Named(PriorShape::Auto);
        p.chunksize = 2;
        let mut model = LdaModel::new(6, &p).unwrap();
        model.update(&clustered_corpus()).unwrap();

        assert_ne!(model.alpha(), &Array1::from_elem(2, 0.5));
        assert!(model.alpha().iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_auto_eta_stays_positive() {
        let mut p = params(2);
        p.eta = Some(Prior::Named(PriorShape::Auto));
        p.chunksize = 2;
        let mut model = LdaModel::new(6, &p).unwrap();
        model.update(&clustered_corpus()).unwrap();

        assert_eq!(model.params().eta, Some(Prior::Named(PriorShape::Auto)));
        assert_eq!(model.eta().len(), 6);
        assert!(model.eta().iter().all(|&e| e > 0.0 && e.is_finite()));
    }

    #[test]
    fn test_perplexity_history() {
        let mut p = params(2);
        p.eval_every = 1;
        p.chunksize = 3;
        p.passes = 2;
        let mut model = LdaModel::new(6, &p).unwrap();
        model.update(&clustered_corpus()).unwrap();

        // one evaluation per chunk: two chunks per pass
        assert_eq!(model.bound_history().len(), 4);
        assert!(model.bound_history().iter().all(|b| b.is_finite() && *b < 0.0));

        let perplexity = model.perplexity(&clustered_corpus()).unwrap();
        assert!(perplexity > 1.0);
        assert_eq!(model.perplexity(&[vec![]]), None);
    }

    #[test]
    fn test_per_word_topics() {
        let mut p = params(2);
        p.minimum_phi_value = 0.0;
        let mut model = LdaModel::new(6, &p).unwrap();
        model.update(&clustered_corpus()).unwrap();

        let detail = model.document_topics_per_word(&[(0, 2), (4, 1)]);
        assert_eq!(detail.word_topics.len(), 2);
        assert_eq!(detail.word_phis[0].0, 0);

        // phis of one term add up to its count
        let total: f64 = detail.word_phis[0].1.iter().map(|(_, phi)| phi).sum();
        assert_abs_diff_eq!(total, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_topic_out_of_range() {
        let model = LdaModel::new(6, &params(2)).unwrap();
        assert!(matches!(
            model.topic_terms(5, 3),
            Err(LdaError::TopicOutOfRange { topic: 5, num_topics: 2 })
        ));
    }
}
