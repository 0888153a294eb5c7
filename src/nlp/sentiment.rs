//! Sentiment classifier seam. ONNX checkpoint inference behind the `onnx`
//! feature; a lexicon-scored fallback otherwise.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;

/// Fixed three-class label table: class id -> label.
pub const SENTIMENT_LABELS: [&str; 3] = ["negative", "neutral", "positive"];

/// One classifier verdict: predicted class plus the full probability vector.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: usize,
    pub probs: Vec<f32>,
}

impl Prediction {
    /// Label text for the predicted class. Backends guarantee class ids fit
    /// the three-class table; an id outside it panics rather than being
    /// silently remapped.
    pub fn sentiment(&self) -> &'static str {
        SENTIMENT_LABELS[self.label]
    }

    /// Probability mass assigned to the predicted class.
    pub fn confidence(&self) -> f32 {
        self.probs.get(self.label).copied().unwrap_or(0.0)
    }
}

/// Trait for sentiment backends.
pub trait SentimentClassifier: Send + Sync {
    /// Classify cleaned texts in one batch; one prediction per input.
    fn classify(&self, texts: &[String]) -> Result<Vec<Prediction>>;
}

pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

const POSITIVE_TERMS: &[&str] = &[
    "great", "excellent", "love", "perfect", "amazing", "wonderful", "good", "best", "happy",
    "recommend", "fast", "fantastic", "pleased",
];

const NEGATIVE_TERMS: &[&str] = &[
    "bad", "terrible", "awful", "broken", "slow", "late", "worst", "refund", "rude", "poor",
    "disappointed", "horrible", "useless", "never",
];

/// Lexicon-scored fallback classifier. Counts opinion-term hits per class,
/// leaves a constant neutral prior, and softmaxes the counts so confidences
/// behave like real class probabilities.
pub struct LexiconClassifier;

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let positive = POSITIVE_TERMS.iter().filter(|t| lower.contains(**t)).count();
                let negative = NEGATIVE_TERMS.iter().filter(|t| lower.contains(**t)).count();
                let logits = [negative as f32 * 1.5, 0.5, positive as f32 * 1.5];
                let probs = softmax(&logits);
                let label = argmax(&probs);
                Prediction { label, probs }
            })
            .collect())
    }
}

#[cfg(feature = "onnx")]
mod checkpoint {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, ensure, Context, Result};
    use ndarray::{Array, CowArray, IxDyn};
    use ort::{Environment, Session, SessionBuilder, Value};
    use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

    use super::{argmax, softmax, Prediction, SentimentClassifier, SENTIMENT_LABELS};

    /// Fine-tuned sequence classifier loaded from a checkpoint directory
    /// containing `model.onnx` and `tokenizer.json`.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
    }

    impl OnnxClassifier {
        pub fn load(model_dir: &Path, max_token_length: usize) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            let environment = Environment::builder()
                .with_name("review-insight")
                .build()?
                .into_arc();
            let session = SessionBuilder::new(&environment)?
                .with_model_from_file(&model_path)
                .with_context(|| format!("loading classifier from {}", model_path.display()))?;

            let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|err| anyhow!("loading tokenizer: {err}"))?;
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: max_token_length,
                    ..Default::default()
                }))
                .map_err(|err| anyhow!("configuring truncation: {err}"))?;
            tokenizer.with_padding(Some(PaddingParams::default()));

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }
    }

    impl SentimentClassifier for OnnxClassifier {
        fn classify(&self, texts: &[String]) -> Result<Vec<Prediction>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|err| anyhow!("tokenizing batch: {err}"))?;

            let batch = encodings.len();
            let width = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
            let mut input_ids = Vec::with_capacity(batch * width);
            let mut attention_mask = Vec::with_capacity(batch * width);
            for encoding in &encodings {
                input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
                attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            }

            let shape = IxDyn(&[batch, width]);
            let ids: CowArray<i64, IxDyn> =
                CowArray::from(Array::from_shape_vec(shape.clone(), input_ids)?);
            let mask: CowArray<i64, IxDyn> =
                CowArray::from(Array::from_shape_vec(shape, attention_mask)?);

            let session = self
                .session
                .lock()
                .map_err(|_| anyhow!("classifier session poisoned"))?;
            let outputs = session.run(vec![
                Value::from_array(session.allocator(), &ids)?,
                Value::from_array(session.allocator(), &mask)?,
            ])?;
            let logits = outputs[0].try_extract::<f32>()?;
            let view = logits.view();

            let classes = view.shape()[1];
            ensure!(
                classes == SENTIMENT_LABELS.len(),
                "checkpoint emits {classes} classes, expected {}",
                SENTIMENT_LABELS.len()
            );
            let mut predictions = Vec::with_capacity(batch);
            for row in 0..batch {
                let row_logits: Vec<f32> = (0..classes).map(|c| view[[row, c]]).collect();
                let probs = softmax(&row_logits);
                let label = argmax(&probs);
                predictions.push(Prediction { label, probs });
            }
            Ok(predictions)
        }
    }

    pub fn load(model_dir: &Path, max_token_length: usize) -> Result<Arc<dyn SentimentClassifier>> {
        Ok(Arc::new(OnnxClassifier::load(model_dir, max_token_length)?))
    }
}

#[cfg(feature = "onnx")]
pub fn load(settings: &Settings) -> Result<Arc<dyn SentimentClassifier>> {
    checkpoint::load(&settings.model_dir, settings.max_token_length)
}

#[cfg(not(feature = "onnx"))]
pub fn load(_settings: &Settings) -> Result<Arc<dyn SentimentClassifier>> {
    Ok(Arc::new(LexiconClassifier))
}

#[cfg(test)]
mod tests {
    use super::{LexiconClassifier, Prediction, SentimentClassifier};

    #[test]
    #[should_panic]
    fn class_id_outside_the_label_table_panics() {
        let prediction = Prediction {
            label: 3,
            probs: vec![0.25, 0.25, 0.25, 0.25],
        };
        prediction.sentiment();
    }

    #[test]
    fn probabilities_sum_to_one() {
        let predictions = LexiconClassifier
            .classify(&["the battery is excellent".to_string()])
            .unwrap();
        let total: f32 = predictions[0].probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn plain_text_reads_neutral() {
        let predictions = LexiconClassifier
            .classify(&["the package arrived on tuesday".to_string()])
            .unwrap();
        assert_eq!(predictions[0].sentiment(), "neutral");
    }

    #[test]
    fn opinion_terms_move_the_label() {
        let predictions = LexiconClassifier
            .classify(&[
                "terrible, broken on arrival".to_string(),
                "great value, love it".to_string(),
            ])
            .unwrap();
        assert_eq!(predictions[0].sentiment(), "negative");
        assert_eq!(predictions[1].sentiment(), "positive");
    }
}
