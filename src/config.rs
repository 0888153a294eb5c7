//! Runtime configuration utilities for review-insight.

use std::{env, path::PathBuf, str::FromStr};

use serde::Deserialize;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Directory holding the saved sentiment classifier artifact.
    pub model_dir: PathBuf,
    /// GGUF file used by the local generative summariser.
    pub gen_model_path: PathBuf,
    /// Hard cap on rows considered by one clustering task.
    pub max_rows: usize,
    /// Categories below this row count are skipped outright.
    pub min_category_rows: usize,
    /// Retained topics per category.
    pub max_clusters: usize,
    /// Smallest member count a discovered topic may keep.
    pub min_topic_size: usize,
    /// Cosine similarity required to join an existing topic.
    pub topic_threshold: f32,
    /// Upper bound on member texts sampled into one summary prompt.
    pub sample_limit: usize,
    /// Keywords surfaced per cluster.
    pub keyword_limit: usize,
    /// Token budget for the classifier tokenizer.
    pub max_token_length: usize,
    /// Stop-word language hint for keyword extraction.
    pub language: String,
    /// Seed driving sampling and projection.
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./checkpoints"),
            gen_model_path: PathBuf::from("./models/generator.gguf"),
            max_rows: 500,
            min_category_rows: 5,
            max_clusters: 3,
            min_topic_size: 2,
            topic_threshold: 0.6,
            sample_limit: 15,
            keyword_limit: 10,
            max_token_length: 256,
            language: "english".to_string(),
            seed: 42,
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Ok(Self {
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            gen_model_path: env::var("GEN_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.gen_model_path),
            max_rows: env_or("MAX_ROWS", defaults.max_rows),
            min_category_rows: env_or("MIN_CATEGORY_ROWS", defaults.min_category_rows),
            max_clusters: env_or("MAX_CLUSTERS", defaults.max_clusters),
            min_topic_size: env_or("MIN_TOPIC_SIZE", defaults.min_topic_size),
            topic_threshold: env_or("TOPIC_THRESHOLD", defaults.topic_threshold),
            sample_limit: env_or("SAMPLE_LIMIT", defaults.sample_limit),
            keyword_limit: env_or("KEYWORD_LIMIT", defaults.keyword_limit),
            max_token_length: env_or("MAX_TOKEN_LENGTH", defaults.max_token_length),
            language: env::var("LANGUAGE").unwrap_or(defaults.language),
            seed: env_or("SEED", defaults.seed),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
