//! Evaluation metrics for topic models

use ndarray::Array2;
use std::collections::HashSet;

use crate::models::BagOfWords;
use crate::preprocessing::dictionary::Dictionary;

/// Topic quality metrics over an encoded corpus
pub struct Evaluator<'a> {
    dictionary: &'a Dictionary,
    /// Term ids present in each document
    doc_terms: Vec<HashSet<usize>>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator for a corpus encoded with `dictionary`
    pub fn new(corpus: &[BagOfWords], dictionary: &'a Dictionary) -> Self {
        let doc_terms = corpus
            .iter()
            .map(|bow| bow.iter().filter(|(_, c)| *c > 0).map(|(id, _)| *id).collect())
            .collect();

        Self {
            dictionary,
            doc_terms,
        }
    }

    fn doc_count(&self, ids: &[usize]) -> usize {
        self.doc_terms
            .iter()
            .filter(|terms| ids.iter().all(|id| terms.contains(id)))
            .count()
    }

    /// UMass coherence of a topic's top words
    ///
    /// Averages `ln((D(w_i, w_j) + 1) / D(w_j))` over ordered word pairs.
    /// Higher (less negative) values indicate more coherent topics.
    /// Returns `None` when fewer than two words are in the vocabulary.
    pub fn umass_coherence(&self, top_words: &[String]) -> Option<f64> {
        let ids: Vec<usize> = top_words
            .iter()
            .filter_map(|w| self.dictionary.token_to_id(w))
            .collect();

        if ids.len() < 2 {
            return None;
        }

        let mut coherence = 0.0;
        let mut pairs = 0;

        for (i, &w1) in ids.iter().enumerate() {
            for &w2 in ids.iter().skip(i + 1) {
                let d_w2 = self.doc_count(&[w2]) as f64;
                if d_w2 == 0.0 {
                    continue;
                }
                let d_w1_w2 = self.doc_count(&[w1, w2]) as f64;

                coherence += ((d_w1_w2 + 1.0) / d_w2).ln();
                pairs += 1;
            }
        }

        (pairs > 0).then(|| coherence / pairs as f64)
    }

    /// Fraction of unique words across all topic lists
    pub fn topic_diversity(topics: &[Vec<String>]) -> f64 {
        let total: usize = topics.iter().map(Vec::len).sum();
        if total == 0 {
            return 0.0;
        }

        let unique: HashSet<&str> = topics.iter().flatten().map(String::as_str).collect();
        unique.len() as f64 / total as f64
    }

    /// Jaccard similarity between two topics' word sets
    pub fn topic_overlap(topic1: &[String], topic2: &[String]) -> f64 {
        let set1: HashSet<&str> = topic1.iter().map(String::as_str).collect();
        let set2: HashSet<&str> = topic2.iter().map(String::as_str).collect();

        let union = set1.union(&set2).count();
        if union == 0 {
            return 0.0;
        }

        set1.intersection(&set2).count() as f64 / union as f64
    }

    /// Pairwise topic overlap
    pub fn topic_overlap_matrix(topics: &[Vec<String>]) -> Array2<f64> {
        let n = topics.len();
        Array2::from_shape_fn((n, n), |(i, j)| Self::topic_overlap(&topics[i], &topics[j]))
    }
}

/// Summary statistics for a topic model
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub n_topics: usize,
    pub avg_coherence: Option<f64>,
    pub diversity: f64,
    /// Highest overlap between two distinct topics
    pub max_overlap: f64,
    pub topic_coherences: Vec<Option<f64>>,
    pub perplexity: Option<f64>,
}

impl ModelSummary {
    /// Summarize top-word lists
    pub fn from_topics(topics: &[Vec<String>], evaluator: &Evaluator, perplexity: Option<f64>) -> Self {
        let topic_coherences: Vec<Option<f64>> = topics
            .iter()
            .map(|words| evaluator.umass_coherence(words))
            .collect();

        let values: Vec<f64> = topic_coherences.iter().filter_map(|&c| c).collect();
        let avg_coherence =
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

        let overlaps = Evaluator::topic_overlap_matrix(topics);
        let max_overlap = overlaps
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, &v)| v)
            .fold(0.0, f64::max);

        Self {
            n_topics: topics.len(),
            avg_coherence,
            diversity: Evaluator::topic_diversity(topics),
            max_overlap,
            topic_coherences,
            perplexity,
        }
    }

    /// Print summary to console
    pub fn print(&self) {
        println!("=== Topic Model Summary ===");
        println!("Number of topics: {}", self.n_topics);

        if let Some(coh) = self.avg_coherence {
            println!("Average coherence: {:.4}", coh);
        }

        println!("Topic diversity: {:.4}", self.diversity);
        println!("Max topic overlap: {:.4}", self.max_overlap);

        if let Some(perp) = self.perplexity {
            println!("Perplexity: {:.2}", perp);
        }

        println!("\nPer-topic coherence:");
        for (i, coh) in self.topic_coherences.iter().enumerate() {
            match coh {
                Some(c) => println!("  Topic {}: {:.4}", i, c),
                None => println!("  Topic {}: N/A", i),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn fixture() -> (Vec<BagOfWords>, Dictionary) {
        let docs = vec![
            words(&["bond", "yield"]),
            words(&["bond", "yield", "rate"]),
            words(&["stock", "earnings"]),
            words(&["stock", "rate"]),
        ];
        let dictionary = Dictionary::from_documents(&docs);
        let corpus = dictionary.encode_corpus(&docs);
        (corpus, dictionary)
    }

    #[test]
    fn test_topic_diversity() {
        let distinct = vec![words(&["bond", "yield"]), words(&["stock", "earnings"])];
        assert_eq!(Evaluator::topic_diversity(&distinct), 1.0);

        let shared = vec![words(&["bond", "yield"]), words(&["bond", "rate"])];
        assert_eq!(Evaluator::topic_diversity(&shared), 0.75);
        assert_eq!(Evaluator::topic_diversity(&[]), 0.0);
    }

    #[test]
    fn test_topic_overlap() {
        let overlap = Evaluator::topic_overlap(&words(&["bond", "yield"]), &words(&["bond", "rate"]));
        assert_abs_diff_eq!(overlap, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_umass_coherence_prefers_cooccurring_words() {
        let (corpus, dictionary) = fixture();
        let evaluator = Evaluator::new(&corpus, &dictionary);

        let together = evaluator.umass_coherence(&words(&["bond", "yield"])).unwrap();
        let apart = evaluator.umass_coherence(&words(&["yield", "earnings"])).unwrap();
        assert!(together > apart);

        assert!(evaluator.umass_coherence(&words(&["bond", "unknown"])).is_none());
    }

    #[test]
    fn test_summary() {
        let (corpus, dictionary) = fixture();
        let evaluator = Evaluator::new(&corpus, &dictionary);
        let topics = vec![words(&["bond", "yield"]), words(&["stock", "yield"])];

        let summary = ModelSummary::from_topics(&topics, &evaluator, Some(12.5));
        assert_eq!(summary.n_topics, 2);
        assert_eq!(summary.topic_coherences.len(), 2);
        assert_abs_diff_eq!(summary.max_overlap, 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(summary.perplexity, Some(12.5));
    }
}
