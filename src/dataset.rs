//! Dataset contract and document collections
//!
//! The adapter only needs two things from a dataset: the full tokenized
//! corpus and, for held-out evaluation, a train/test partition of it.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::preprocessing::tokenizer::Tokenizer;

/// A tokenized document
pub type Document = Vec<String>;

/// Errors raised while loading or partitioning a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset has no train/test partition")]
    MissingPartition,

    #[error("Training partition of {train_size} documents exceeds corpus of {n_documents}")]
    InvalidPartition { train_size: usize, n_documents: usize },

    #[error("Malformed line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of tokenized documents for training and evaluation
pub trait Dataset {
    /// Every document, in corpus order
    fn corpus(&self) -> Result<&[Document], DatasetError>;

    /// `(train, test)` split of the corpus
    fn partitioned_corpus(&self) -> Result<(&[Document], &[Document]), DatasetError>;
}

/// In-memory corpus whose first `train_size` documents form the training partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDataset {
    corpus: Vec<Document>,
    #[serde(default)]
    train_size: Option<usize>,
}

impl DocumentDataset {
    /// Dataset without a partition
    pub fn new(corpus: Vec<Document>) -> Self {
        Self {
            corpus,
            train_size: None,
        }
    }

    /// Dataset whose first `train_size` documents are the training partition
    pub fn with_partition(corpus: Vec<Document>, train_size: usize) -> Result<Self, DatasetError> {
        if train_size > corpus.len() {
            return Err(DatasetError::InvalidPartition {
                train_size,
                n_documents: corpus.len(),
            });
        }
        Ok(Self {
            corpus,
            train_size: Some(train_size),
        })
    }

    /// Tokenize raw texts
    pub fn from_texts<S: AsRef<str>>(texts: &[S], tokenizer: &Tokenizer) -> Self {
        Self::new(tokenizer.tokenize_documents(texts))
    }

    /// Load `{"corpus": [[...], ...], "train_size": n}`
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path.as_ref())?;
        let dataset: Self = serde_json::from_str(&content)?;
        if let Some(train_size) = dataset.train_size {
            if train_size > dataset.corpus.len() {
                return Err(DatasetError::InvalidPartition {
                    train_size,
                    n_documents: dataset.corpus.len(),
                });
            }
        }
        info!(
            "Loaded {} documents from {}",
            dataset.corpus.len(),
            path.as_ref().display()
        );
        Ok(dataset)
    }

    /// Save as JSON in the format read by [`DocumentDataset::load_json`]
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a tab-separated corpus file: `tokens<TAB>partition[<TAB>label]`
    ///
    /// Tokens are separated by spaces. Partitions are `train`, `val` or
    /// `test`; training and validation documents keep their relative order
    /// and precede all test documents.
    pub fn load_tsv<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path.as_ref())?;

        let mut train = Vec::new();
        let mut test = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            let text = fields.next().unwrap_or_default();
            let partition = fields.next().map(str::trim).ok_or_else(|| DatasetError::Malformed {
                line: idx + 1,
                reason: "missing partition column".into(),
            })?;

            let tokens: Document = text.split_whitespace().map(str::to_string).collect();
            match partition {
                "train" | "val" => train.push(tokens),
                "test" => test.push(tokens),
                other => {
                    return Err(DatasetError::Malformed {
                        line: idx + 1,
                        reason: format!("unknown partition `{}`", other),
                    })
                }
            }
        }

        let train_size = train.len();
        train.extend(test);
        info!(
            "Loaded {} documents ({} train) from {}",
            train.len(),
            train_size,
            path.as_ref().display()
        );
        Self::with_partition(train, train_size)
    }

    /// Load by extension: `.tsv` or JSON otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("tsv") => Self::load_tsv(path),
            _ => Self::load_json(path),
        }
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Size of the training partition, if any
    pub fn train_size(&self) -> Option<usize> {
        self.train_size
    }
}

impl Dataset for DocumentDataset {
    fn corpus(&self) -> Result<&[Document], DatasetError> {
        Ok(&self.corpus)
    }

    fn partitioned_corpus(&self) -> Result<(&[Document], &[Document]), DatasetError> {
        let train_size = self.train_size.ok_or(DatasetError::MissingPartition)?;
        Ok(self.corpus.split_at(train_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc(tokens: &[&str]) -> Document {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_partitioned_corpus() {
        let dataset = DocumentDataset::with_partition(
            vec![doc(&["a", "b"]), doc(&["b", "c"]), doc(&["c"])],
            2,
        )
        .unwrap();

        let (train, test) = dataset.partitioned_corpus().unwrap();
        assert_eq!(train.len(), 2);
        assert_eq!(test, &[doc(&["c"])]);
        assert_eq!(dataset.corpus().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_and_invalid_partition() {
        let dataset = DocumentDataset::new(vec![doc(&["a"])]);
        assert!(matches!(
            dataset.partitioned_corpus(),
            Err(DatasetError::MissingPartition)
        ));

        let result = DocumentDataset::with_partition(vec![doc(&["a"])], 2);
        assert!(matches!(result, Err(DatasetError::InvalidPartition { .. })));
    }

    #[test]
    fn test_load_tsv_orders_test_documents_last() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "apple banana\ttest\tfruit").unwrap();
        writeln!(file, "car engine\ttrain\tvehicle").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "wheel road\tval").unwrap();

        let dataset = DocumentDataset::load(file.path()).unwrap();
        assert_eq!(dataset.train_size(), Some(2));

        let (train, test) = dataset.partitioned_corpus().unwrap();
        assert_eq!(train, &[doc(&["car", "engine"]), doc(&["wheel", "road"])]);
        assert_eq!(test, &[doc(&["apple", "banana"])]);
    }

    #[test]
    fn test_load_tsv_rejects_unknown_partition() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apple\tholdout").unwrap();

        let result = DocumentDataset::load_tsv(file.path());
        assert!(matches!(result, Err(DatasetError::Malformed { line: 1, .. })));
    }

    #[test]
    fn test_json_save_and_load() {
        let dataset =
            DocumentDataset::with_partition(vec![doc(&["x", "y"]), doc(&["z"])], 1).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        dataset.save_json(file.path()).unwrap();
        let loaded = DocumentDataset::load_json(file.path()).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_from_texts() {
        let dataset = DocumentDataset::from_texts(
            &["The market rallied today", "Rain is expected tomorrow"],
            &Tokenizer::new(),
        );
        let corpus = dataset.corpus().unwrap();
        assert_eq!(corpus[0], doc(&["market", "rallied", "today"]));
        assert_eq!(dataset.train_size(), None);
    }
}
