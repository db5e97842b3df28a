//! Raw text tokenization
//!
//! Used by the dataset loaders to turn untokenized text into the token
//! sequences the dictionary consumes.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Patterns applied by every tokenizer before word segmentation
struct CleanPatterns {
    url: Regex,
    email: Regex,
    html: Regex,
    special: Regex,
    number: Regex,
    whitespace: Regex,
}

fn clean_patterns() -> &'static CleanPatterns {
    static PATTERNS: OnceLock<CleanPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CleanPatterns {
        url: Regex::new(r"https?://\S+").expect("static pattern"),
        email: Regex::new(r"\S+@\S+\.\S+").expect("static pattern"),
        html: Regex::new(r"<[^>]+>").expect("static pattern"),
        special: Regex::new(r"[^\w\s]").expect("static pattern"),
        number: Regex::new(r"\b\d+\b").expect("static pattern"),
        whitespace: Regex::new(r"\s+").expect("static pattern"),
    })
}

/// Configurable text tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    min_length: usize,
    max_length: usize,
    lowercase: bool,
    remove_numbers: bool,
    remove_patterns: Vec<Regex>,
}

impl Tokenizer {
    /// Tokenizer with English stop words, lowercasing and number removal
    pub fn new() -> Self {
        Self {
            stop_words: default_stop_words(),
            min_length: 2,
            max_length: 50,
            lowercase: true,
            remove_numbers: true,
            remove_patterns: vec![],
        }
    }

    /// Add custom stop words
    pub fn add_stop_words(&mut self, words: &[&str]) {
        for word in words {
            self.stop_words.insert(word.to_lowercase());
        }
    }

    /// Set minimum token length (in bytes)
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Set maximum token length (in bytes)
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    pub fn lowercase(mut self, enable: bool) -> Self {
        self.lowercase = enable;
        self
    }

    pub fn remove_numbers(mut self, enable: bool) -> Self {
        self.remove_numbers = enable;
        self
    }

    /// Add a pattern whose matches are blanked out before tokenizing
    pub fn add_remove_pattern(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.remove_patterns.push(Regex::new(pattern)?);
        Ok(())
    }

    /// Strip URLs, e-mail addresses, markup and punctuation
    pub fn clean(&self, text: &str) -> String {
        let patterns = clean_patterns();
        let mut cleaned = text.to_string();

        for pattern in &self.remove_patterns {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }
        for pattern in [&patterns.url, &patterns.email, &patterns.html, &patterns.special] {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }
        if self.remove_numbers {
            cleaned = patterns.number.replace_all(&cleaned, " ").into_owned();
        }
        if self.lowercase {
            cleaned = cleaned.to_lowercase();
        }

        patterns
            .whitespace
            .replace_all(&cleaned, " ")
            .trim()
            .to_string()
    }

    /// Split text into filtered tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.clean(text)
            .unicode_words()
            .filter(|word| {
                let len = word.len();
                len >= self.min_length
                    && len <= self.max_length
                    && !self.stop_words.contains(&word.to_lowercase())
            })
            .map(str::to_string)
            .collect()
    }

    /// Tokenize every document
    pub fn tokenize_documents<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Vec<String>> {
        documents
            .iter()
            .map(|doc| self.tokenize(doc.as_ref()))
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn default_stop_words() -> HashSet<String> {
    let words = [
        "a", "an", "the", "i", "me", "my", "we", "our", "ours", "you", "your", "yours", "he",
        "him", "his", "she", "her", "hers", "it", "its", "they", "them", "their", "theirs",
        "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
        "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
        "did", "doing", "would", "should", "could", "might", "must", "shall", "will", "can",
        "may", "at", "by", "for", "from", "in", "into", "of", "on", "to", "with", "about",
        "against", "between", "during", "before", "after", "above", "below", "up", "down",
        "out", "off", "over", "under", "again", "further", "then", "once", "and", "but", "or",
        "nor", "so", "yet", "both", "either", "neither", "not", "only", "than", "when", "where",
        "while", "if", "because", "as", "until", "although", "here", "there", "all", "each",
        "few", "more", "most", "other", "some", "such", "no", "any", "own", "same", "too",
        "very", "just", "also", "now", "how", "why",
    ];

    words.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_filters_stop_words() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("Hello World! This is a test.");

        assert_eq!(tokens, vec!["hello", "world", "test"]);
    }

    #[test]
    fn test_clean_removes_urls_and_markup() {
        let tokenizer = Tokenizer::new();
        let cleaned = tokenizer.clean("See <b>docs</b> at https://example.com or mail me@example.org!");

        assert!(!cleaned.contains("https"));
        assert!(!cleaned.contains("<b>"));
        assert!(!cleaned.contains('@'));
        assert!(!cleaned.contains('!'));
    }

    #[test]
    fn test_numbers_and_length_limits() {
        let tokenizer = Tokenizer::new().min_length(4);
        let tokens = tokenizer.tokenize("Rates rose 25 basis points in 2024");
        assert_eq!(tokens, vec!["rates", "rose", "basis", "points"]);

        let keep_numbers = Tokenizer::new().remove_numbers(false);
        assert!(keep_numbers.tokenize("chapter 12").contains(&"12".to_string()));
    }

    #[test]
    fn test_custom_remove_pattern() {
        let mut tokenizer = Tokenizer::new();
        tokenizer.add_remove_pattern(r"#\w+").unwrap();
        tokenizer.add_stop_words(&["Filler"]);

        let tokens = tokenizer.tokenize("topic #hashtag filler model");
        assert_eq!(tokens, vec!["topic", "model"]);
    }
}
