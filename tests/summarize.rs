use std::sync::Arc;

use anyhow::{anyhow, Result};
use review_insight::config::Settings;
use review_insight::nlp::{
    embed::HashedEmbedder,
    sentiment::LexiconClassifier,
    summarize::{Summarizer, SummaryError},
    Generator, ModelContext,
};
use review_insight::pipeline::{
    run_clustering_task, TaskResult, SUMMARY_GENERATION_FALLBACK, SUMMARY_PARSE_FALLBACK,
};

struct ChattyGenerator;

impl Generator for ChattyGenerator {
    fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        Ok("I could not produce the summary you asked for, sorry.".to_string())
    }
}

struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        Err(anyhow!("model backend unavailable"))
    }
}

fn keywords() -> Vec<String> {
    vec!["battery".to_string(), "charge".to_string()]
}

#[test]
fn non_json_output_is_a_parse_error() {
    let summarizer = Summarizer::new(&ChattyGenerator);
    let err = summarizer.summarize(&keywords(), &[]).unwrap_err();
    assert!(matches!(err, SummaryError::Parse(_)));
}

#[test]
fn backend_failure_is_a_generation_error() {
    let summarizer = Summarizer::new(&FailingGenerator);
    let err = summarizer.summarize(&keywords(), &[]).unwrap_err();
    assert!(matches!(err, SummaryError::Generation(_)));
}

fn models_with(generator: Arc<dyn Generator>) -> ModelContext {
    ModelContext {
        embedder: Arc::new(HashedEmbedder::new(256)),
        classifier: Arc::new(LexiconClassifier),
        generator,
    }
}

fn one_cluster_csv() -> String {
    let mut csv = String::from("text,src\n");
    for _ in 0..5 {
        csv.push_str("Battery drains far too quickly,electronics\n");
    }
    csv
}

#[test]
fn parse_failures_fall_back_to_the_fixed_digest() {
    let models = models_with(Arc::new(ChattyGenerator));
    let result =
        run_clustering_task(&models, &Settings::default(), &one_cluster_csv(), "t1").unwrap();
    let TaskResult::Success { clusters, .. } = result else {
        panic!("expected success");
    };
    assert_eq!(clusters[0].title, SUMMARY_PARSE_FALLBACK.0);
    assert_eq!(clusters[0].summary, SUMMARY_PARSE_FALLBACK.1);
}

#[test]
fn generation_failures_fall_back_without_failing_the_task() {
    let models = models_with(Arc::new(FailingGenerator));
    let result =
        run_clustering_task(&models, &Settings::default(), &one_cluster_csv(), "t2").unwrap();
    let TaskResult::Success { clusters, .. } = result else {
        panic!("expected success");
    };
    assert_eq!(clusters[0].title, SUMMARY_GENERATION_FALLBACK.0);
    assert_eq!(clusters[0].summary, SUMMARY_GENERATION_FALLBACK.1);
}
