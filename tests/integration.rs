//! End-to-end tests for the LDA adapter

use approx::assert_abs_diff_eq;
use lda_adapter::prelude::*;
use ndarray::Axis;
use std::io::Write;
use std::sync::Arc;

const TRAIN_DOCS: usize = 8;

fn corpus() -> Vec<Vec<String>> {
    [
        "bond yield rate curve bond",
        "rate bond treasury yield",
        "yield curve treasury rate",
        "bond treasury rate yield curve",
        "earnings stock growth revenue",
        "stock revenue earnings dividend",
        "growth stock earnings",
        "dividend revenue stock growth earnings",
        "bond yield treasury",
        "stock earnings revenue",
    ]
    .iter()
    .map(|doc| doc.split_whitespace().map(str::to_string).collect())
    .collect()
}

fn dataset() -> DocumentDataset {
    DocumentDataset::with_partition(corpus(), TRAIN_DOCS).unwrap()
}

fn seeded_adapter(num_topics: usize) -> LdaAdapter {
    let mut params = LdaHyperparameters::new(num_topics);
    params.passes = 10;
    params.random_state = Some(2024);
    LdaAdapter::with_hyperparameters(params)
}

fn train(
    adapter: &mut LdaAdapter,
    state: &mut ModelState<LdaModel>,
    overrides: &HyperparameterOverrides,
    options: &TrainOptions,
) -> TopicModelOutput {
    adapter.train_model(state, &dataset(), overrides, options).unwrap()
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let options = TrainOptions::default();
    let overrides = HyperparameterOverrides::new();

    let first = train(&mut seeded_adapter(3), &mut ModelState::new(), &overrides, &options);
    let second = train(&mut seeded_adapter(3), &mut ModelState::new(), &overrides, &options);

    assert_eq!(first.topic_word_matrix, second.topic_word_matrix);
    assert_eq!(first.topic_document_matrix, second.topic_document_matrix);
    assert_eq!(first.topics, second.topics);
}

#[test]
fn test_view_shapes() {
    let mut adapter = seeded_adapter(3);
    let mut state = ModelState::new();
    let output = train(
        &mut adapter,
        &mut state,
        &HyperparameterOverrides::new(),
        &TrainOptions::new().top_words(4),
    );

    let vocabulary_size = state.dictionary().unwrap().len();
    let topic_word = output.topic_word_matrix.unwrap();
    assert_eq!(topic_word.dim(), (3, vocabulary_size));
    for row in topic_word.axis_iter(Axis(0)) {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }

    let topic_document = output.topic_document_matrix.unwrap();
    assert_eq!(topic_document.dim(), (3, corpus().len()));
    assert!(topic_document.iter().all(|&p| p >= 0.0));

    let topics = output.topics.unwrap();
    assert_eq!(topics.len(), 3);
    assert!(topics.iter().all(|words| words.len() <= 4));
}

#[test]
fn test_scalar_alpha_expands_to_topic_count() {
    let mut adapter = seeded_adapter(5);
    let overrides = HyperparameterOverrides::new().alpha(Prior::Scalar(0.2));
    train(&mut adapter, &mut ModelState::new(), &overrides, &TrainOptions::default());

    assert_eq!(adapter.hyperparameters().alpha, Prior::Vector(vec![0.2; 5]));
}

#[test]
fn test_held_out_inference() {
    let mut adapter = seeded_adapter(2);
    let output = train(
        &mut adapter,
        &mut ModelState::new(),
        &HyperparameterOverrides::new(),
        &TrainOptions::default(),
    );

    let held_out = output.test_document_topic_matrix().unwrap();
    assert_eq!(held_out.len(), corpus().len() - TRAIN_DOCS);
    for distribution in held_out {
        assert!(!distribution.is_empty());
        assert!(distribution.iter().all(|&(topic, p)| topic < 2 && p > 0.0));
    }

    assert!(output.test_topic_word_matrix().is_none());
    let json = output.to_json();
    assert!(json.get("test-topic-word-matrix").is_none());
    assert!(json.get("test-document-topic-matrix").is_some());
}

#[test]
fn test_held_out_update() {
    let mut adapter = seeded_adapter(2);
    let output = train(
        &mut adapter,
        &mut ModelState::new(),
        &HyperparameterOverrides::new(),
        &TrainOptions::default().update_with_test(true),
    );

    let before = output.topic_word_matrix.as_ref().unwrap();
    let after = output.test_topic_word_matrix().unwrap();
    assert_eq!(after.dim(), before.dim());
    assert_ne!(after, before);

    assert_eq!(output.test_topic_document_matrix().unwrap().dim(), (2, corpus().len()));
    assert_eq!(output.test_topics().unwrap().len(), 2);
    assert!(output.test_document_topic_matrix().is_none());

    let json = output.to_json();
    for key in ["test-topic-word-matrix", "test-topics", "test-topic-document-matrix"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
}

#[test]
fn test_vocabulary_is_reused_across_calls() {
    let mut adapter = seeded_adapter(2);
    let mut state = ModelState::new();
    let overrides = HyperparameterOverrides::new();
    let options = TrainOptions::default();

    train(&mut adapter, &mut state, &overrides, &options);
    let first = Arc::clone(state.dictionary().unwrap());

    train(&mut adapter, &mut state, &overrides, &options);
    let second = state.dictionary().unwrap();

    assert!(Arc::ptr_eq(&first, second));
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn test_overrides_persist_between_calls() {
    let mut adapter = seeded_adapter(2);
    let mut state = ModelState::new();
    let options = TrainOptions::default();

    train(&mut adapter, &mut state, &HyperparameterOverrides::new().passes(3), &options);
    train(&mut adapter, &mut state, &HyperparameterOverrides::new(), &options);

    assert_eq!(adapter.hyperparameters().passes, 3);
    assert_eq!(adapter.hyperparameters().num_topics, 2);
}

#[test]
fn test_gibbs_backend_through_adapter() {
    let mut params = LdaHyperparameters::new(2);
    params.alpha = Prior::Scalar(0.1);
    params.iterations = 100;
    params.random_state = Some(11);
    let mut adapter = LdaAdapter::with_trainer(GibbsLdaTrainer, params);
    let mut state = ModelState::new();

    let output = adapter
        .train_model(
            &mut state,
            &dataset(),
            &HyperparameterOverrides::new(),
            &TrainOptions::default().top_words(3),
        )
        .unwrap();

    let topic_word = output.topic_word_matrix.clone().unwrap();
    for row in topic_word.axis_iter(Axis(0)) {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }
    assert_eq!(output.topics.as_ref().unwrap().len(), 2);
    assert_eq!(
        output.test_document_topic_matrix().unwrap().len(),
        corpus().len() - TRAIN_DOCS
    );

    let auto = HyperparameterOverrides::new().alpha(Prior::Named(PriorShape::Auto));
    let result = adapter.train_model(&mut state, &dataset(), &auto, &TrainOptions::default());
    assert!(matches!(result, Err(AdapterError::Model(LdaError::Unsupported(_)))));

    // the failed call keeps the previously trained model
    let model = state.model().unwrap();
    assert_eq!(model.topics(), topic_word);
    assert_eq!(model.num_documents(), corpus().len());
}

#[test]
fn test_tsv_dataset_end_to_end() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    for (i, doc) in corpus().iter().enumerate() {
        let partition = if i < TRAIN_DOCS { "train" } else { "test" };
        writeln!(file, "{}\t{}", doc.join(" "), partition).unwrap();
    }

    let dataset = DocumentDataset::load(file.path()).unwrap();
    assert_eq!(dataset.train_size(), Some(TRAIN_DOCS));

    let mut adapter = seeded_adapter(2);
    let mut state = ModelState::new();
    let output = adapter
        .train_model(
            &mut state,
            &dataset,
            &HyperparameterOverrides::new(),
            &TrainOptions::default(),
        )
        .unwrap();

    assert_eq!(output.topic_document_matrix.unwrap().dim(), (2, 10));
}
