//! Model seams and the process-scoped inference context.

pub mod embed;
pub mod generate;
pub mod sentiment;
pub mod summarize;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;

pub use embed::Embedder;
pub use generate::Generator;
pub use sentiment::{Prediction, SentimentClassifier, SENTIMENT_LABELS};

/// Every heavy model handle one worker process needs. Constructed once at
/// startup and shared read-only by all tasks the process handles; eager
/// construction keeps model loads out of the task path and avoids the race
/// a lazily-populated cache would have.
pub struct ModelContext {
    pub embedder: Arc<dyn Embedder>,
    pub classifier: Arc<dyn SentimentClassifier>,
    pub generator: Arc<dyn Generator>,
}

impl ModelContext {
    pub fn initialise(settings: &Settings) -> Result<Self> {
        let embedder = embed::load(settings)?;
        let classifier = sentiment::load(settings)?;
        let generator = generate::load(settings)?;
        info!("model context initialised");
        Ok(Self {
            embedder,
            classifier,
            generator,
        })
    }
}
