//! LDA (Latent Dirichlet Allocation) Example
//!
//! This example demonstrates how to:
//! - Tokenize raw documents into a partitioned dataset
//! - Train LDA through the adapter
//! - Inspect topics and held-out document distributions
//! - Evaluate model quality with coherence metrics

use anyhow::Result;
use lda_adapter::prelude::*;

fn sample_documents() -> Vec<&'static str> {
    vec![
        "Central bank raises interest rates to fight inflation as bond yields climb",
        "Treasury bond yields fall after the central bank signals slower rate hikes",
        "Inflation data pushes bond prices lower and interest rates higher",
        "Mortgage rates follow treasury yields as the central bank tightens policy",
        "Tech company reports record quarterly earnings and raises revenue guidance",
        "Strong earnings from chip makers lift technology stock prices",
        "Software company revenue growth beats analyst earnings estimates",
        "Investors cheer earnings growth as technology shares rally",
        "Crude oil prices surge after supply cuts from producing countries",
        "Natural gas and crude oil futures climb on cold weather demand",
        "Oil producers announce output cuts sending energy prices higher",
        "Energy stocks track crude oil prices amid tight global supply",
        // Held-out documents
        "Bond markets price in another central bank rate increase",
        "Chip maker earnings lift technology revenue outlook",
        "Oil supply disruption sends crude prices to yearly highs",
    ]
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== LDA Topic Modeling Example ===\n");

    // Step 1: Tokenize documents
    println!("Step 1: Tokenizing documents...");
    let texts = sample_documents();
    let tokenizer = Tokenizer::new().min_length(3);
    let documents = DocumentDataset::from_texts(&texts, &tokenizer);
    let dataset = DocumentDataset::with_partition(documents.corpus()?.to_vec(), 12)?;

    if let Some(first_doc) = dataset.corpus()?.first() {
        println!("  Sample tokens: {:?}", &first_doc[..first_doc.len().min(10)]);
    }
    println!("  {} documents ({} train)", dataset.len(), 12);

    // Step 2: Train
    let n_topics = 3;
    println!("\nStep 2: Training LDA with {} topics...", n_topics);

    let mut adapter = LdaAdapter::with_hyperparameters(LdaHyperparameters::new(n_topics));
    let mut state = ModelState::new();
    let overrides = HyperparameterOverrides::new()
        .alpha(Prior::Scalar(0.1))
        .passes(30)
        .iterations(100)
        .eval_every(0)
        .random_state(42);

    let output = adapter.train_model(&mut state, &dataset, &overrides, &TrainOptions::new().top_words(6))?;
    println!("  Training complete!");

    if let Some(dictionary) = state.dictionary() {
        println!("  Vocabulary size: {}", dictionary.len());
        println!("  Vocabulary fingerprint: {}", &dictionary.fingerprint()[..16]);
    }

    // Step 3: Display topics
    println!("\n=== Discovered Topics ===\n");
    let topics = output.topics.clone().unwrap_or_default();
    for (i, words) in topics.iter().enumerate() {
        println!("Topic {}: {}", i, words.join(", "));
    }

    // Step 4: Document-topic analysis
    println!("\n=== Document-Topic Analysis ===\n");
    if let Some(matrix) = &output.topic_document_matrix {
        for (i, text) in texts.iter().enumerate().take(12) {
            let column = matrix.column(i);
            let (topic, prob) = column
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            let preview: String = text.chars().take(40).collect();
            println!("  Doc {:2}: Topic {} ({:.2}%) - {}...", i + 1, topic, prob * 100.0, preview);
        }
    }

    // Step 5: Held-out documents
    println!("\n=== Held-out Documents ===\n");
    if let Some(held_out) = output.test_document_topic_matrix() {
        for (text, distribution) in texts[12..].iter().zip(held_out) {
            println!("{}", text);
            for (topic, prob) in distribution {
                println!("    Topic {}: {:.2}%", topic, prob * 100.0);
            }
        }
    }

    // Step 6: Model evaluation
    println!("\n=== Model Evaluation ===\n");
    let perplexity = match state.dictionary().cloned() {
        Some(dictionary) => {
            let (_, test) = dataset.partitioned_corpus()?;
            let test_corpus = dictionary.encode_corpus(test);
            state.model_mut().and_then(|model| model.perplexity(&test_corpus))
        }
        None => None,
    };

    if let Some(dictionary) = state.dictionary() {
        let evaluator = Evaluator::new(state.corpus(), dictionary);
        let summary = ModelSummary::from_topics(&topics, &evaluator, perplexity);
        summary.print();
    }

    println!("\n=== LDA Example Complete ===");
    Ok(())
}
