//! Text preprocessing module
//!
//! Provides tokenization of raw text and the token <-> id dictionary
//! used to encode documents as bags of words.

pub mod dictionary;
pub mod tokenizer;
