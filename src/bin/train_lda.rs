//! Train an LDA model on a dataset file and write the result views as JSON
//!
//! Usage:
//!   train_lda --dataset corpus.tsv --hyperparameters params.json --top-words 10

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lda_adapter::prelude::*;
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Online variational Bayes
    Online,
    /// Collapsed Gibbs sampling
    Gibbs,
}

#[derive(Parser)]
#[command(name = "train_lda")]
#[command(about = "Train an LDA topic model and export its views", long_about = None)]
struct Cli {
    /// Dataset file (.json or .tsv)
    #[arg(short, long)]
    dataset: PathBuf,

    /// JSON file of hyperparameter overrides
    #[arg(long)]
    hyperparameters: Option<PathBuf>,

    /// Training back-end
    #[arg(long, value_enum, default_value = "online")]
    backend: Backend,

    /// Top words per topic (0 disables the topic lists)
    #[arg(short, long, default_value = "10")]
    top_words: usize,

    /// Skip the topic-word matrix
    #[arg(long)]
    no_topic_word_matrix: bool,

    /// Skip the topic-document matrix
    #[arg(long)]
    no_topic_document_matrix: bool,

    /// Train on the full corpus without evaluating the test partition
    #[arg(long)]
    no_partitions: bool,

    /// Continue training on the test partition
    #[arg(long)]
    update_with_test: bool,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn train<T: TopicModelTrainer>(
    mut adapter: LdaAdapter<T>,
    dataset: &DocumentDataset,
    overrides: &HyperparameterOverrides,
    options: &TrainOptions,
) -> Result<TopicModelOutput> {
    let mut state = ModelState::new();
    let output = adapter
        .train_model(&mut state, dataset, overrides, options)
        .context("training failed")?;
    Ok(output)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let dataset = DocumentDataset::load(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;

    let overrides = match &cli.hyperparameters {
        Some(path) => HyperparameterOverrides::from_json_file(path)
            .with_context(|| format!("failed to read hyperparameters {}", path.display()))?,
        None => HyperparameterOverrides::new(),
    };

    let options = TrainOptions::new()
        .top_words(cli.top_words)
        .topic_word_matrix(!cli.no_topic_word_matrix)
        .topic_document_matrix(!cli.no_topic_document_matrix)
        .use_partitions(!cli.no_partitions)
        .update_with_test(cli.update_with_test);

    info!("Training with {:?} back-end on {} documents", cli.backend, dataset.len());
    let output = match cli.backend {
        Backend::Online => train(LdaAdapter::new(), &dataset, &overrides, &options)?,
        Backend::Gibbs => train(
            LdaAdapter::with_trainer(GibbsLdaTrainer, LdaHyperparameters::default()),
            &dataset,
            &overrides,
            &options,
        )?,
    };

    let json = serde_json::to_string_pretty(&output.to_json())?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
