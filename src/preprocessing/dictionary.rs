//! Vocabulary and bag-of-words encoding
//!
//! A [`Dictionary`] maps tokens to dense integer ids and converts token
//! sequences into sparse `(id, count)` vectors for the topic models.

use hashbrown::HashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::models::BagOfWords;

/// Bidirectional token <-> id mapping with corpus statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    /// Token -> id
    token2id: HashMap<String, usize>,
    /// Id -> token
    id2token: Vec<String>,
    /// Number of documents containing each token
    document_frequencies: Vec<usize>,
    /// Documents processed
    num_docs: usize,
    /// Tokens processed, counting repeats
    num_pos: usize,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from tokenized documents
    pub fn from_documents(documents: &[Vec<String>]) -> Self {
        let mut dictionary = Self::new();
        dictionary.add_documents(documents);
        dictionary
    }

    /// Add documents, assigning ids to unseen tokens
    ///
    /// Ids follow document order; tokens first seen in the same document
    /// are numbered in lexicographic order.
    pub fn add_documents(&mut self, documents: &[Vec<String>]) {
        for document in documents {
            self.add_document(document);
        }
    }

    fn add_document(&mut self, document: &[String]) {
        let counts = count_tokens(document);

        for (token, _) in counts.iter() {
            if !self.token2id.contains_key(*token) {
                let id = self.id2token.len();
                self.token2id.insert((*token).to_string(), id);
                self.id2token.push((*token).to_string());
                self.document_frequencies.push(0);
            }
        }

        for (token, count) in counts {
            if let Some(&id) = self.token2id.get(token) {
                self.document_frequencies[id] += 1;
                self.num_pos += count as usize;
            }
        }
        self.num_docs += 1;
    }

    /// Encode a document as `(id, count)` pairs sorted by id
    ///
    /// Tokens missing from the dictionary are dropped.
    pub fn doc2bow(&self, document: &[String]) -> BagOfWords {
        let mut by_id: BTreeMap<usize, u32> = BTreeMap::new();
        for token in document {
            if let Some(&id) = self.token2id.get(token.as_str()) {
                *by_id.entry(id).or_insert(0) += 1;
            }
        }
        by_id.into_iter().collect()
    }

    /// Encode many documents
    pub fn encode_corpus(&self, documents: &[Vec<String>]) -> Vec<BagOfWords> {
        documents.iter().map(|doc| self.doc2bow(doc)).collect()
    }

    /// Look up a token's id
    pub fn token_to_id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    /// Look up the token for an id
    pub fn id_to_token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    /// Tokens in id order
    pub fn tokens(&self) -> &[String] {
        &self.id2token
    }

    /// Number of documents containing the token with this id
    pub fn document_frequency(&self, id: usize) -> Option<usize> {
        self.document_frequencies.get(id).copied()
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    /// Documents processed while building
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Tokens processed while building
    pub fn num_pos(&self) -> usize {
        self.num_pos
    }

    /// Hex SHA-256 over the id-ordered tokens
    ///
    /// Two dictionaries share a fingerprint exactly when they assign the
    /// same ids to the same tokens.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for token in &self.id2token {
            hasher.update(token.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

fn count_tokens(document: &[String]) -> BTreeMap<&str, u32> {
    let mut counts = BTreeMap::new();
    for token in document {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Vec<String>> {
        vec![
            vec!["world", "hello", "hello"],
            vec!["world", "test"],
            vec!["alpha", "test", "zulu"],
        ]
        .into_iter()
        .map(|doc| doc.into_iter().map(String::from).collect())
        .collect()
    }

    #[test]
    fn test_id_assignment_order() {
        let dictionary = Dictionary::from_documents(&docs());

        assert_eq!(dictionary.len(), 5);
        assert_eq!(dictionary.token_to_id("hello"), Some(0));
        assert_eq!(dictionary.token_to_id("world"), Some(1));
        assert_eq!(dictionary.token_to_id("test"), Some(2));
        assert_eq!(dictionary.token_to_id("alpha"), Some(3));
        assert_eq!(dictionary.token_to_id("zulu"), Some(4));
        assert_eq!(dictionary.id_to_token(2), Some("test"));
    }

    #[test]
    fn test_statistics() {
        let dictionary = Dictionary::from_documents(&docs());

        assert_eq!(dictionary.num_docs(), 3);
        assert_eq!(dictionary.num_pos(), 8);
        assert_eq!(dictionary.document_frequency(1), Some(2));
        assert_eq!(dictionary.document_frequency(0), Some(1));
    }

    #[test]
    fn test_doc2bow_drops_unknown_tokens() {
        let dictionary = Dictionary::from_documents(&docs());
        let doc: Vec<String> = vec!["test", "unknown", "hello", "test"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(dictionary.doc2bow(&doc), vec![(0, 1), (2, 2)]);
        assert!(dictionary.doc2bow(&[]).is_empty());
    }

    #[test]
    fn test_fingerprint() {
        let a = Dictionary::from_documents(&docs());
        let b = Dictionary::from_documents(&docs());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut reversed = docs();
        reversed.reverse();
        let c = Dictionary::from_documents(&reversed);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
