//! Text embedding seam. MiniLM via fastembed when the `embeddings` feature
//! is enabled; a deterministic hashed bag-of-words fallback otherwise.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;

/// Trait for embedding backends.
pub trait Embedder: Send + Sync {
    /// Map texts to fixed-size dense vectors, one per input, in order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[cfg(feature = "embeddings")]
mod minilm {
    use anyhow::Result;
    use fastembed::TextEmbedding;

    use super::Embedder;

    /// Sentence embedder backed by fastembed's default MiniLM model. The
    /// model is loaded once and shared read-only for the process lifetime.
    pub struct MiniLmEmbedder {
        model: TextEmbedding,
    }

    impl MiniLmEmbedder {
        pub fn new() -> Result<Self> {
            Ok(Self {
                model: TextEmbedding::try_new(Default::default())?,
            })
        }
    }

    impl Embedder for MiniLmEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let documents: Vec<&str> = texts.iter().map(String::as_str).collect();
            Ok(self.model.embed(documents, None)?)
        }
    }
}

/// Bucket count for the fallback embedder; generous enough that short
/// reviews rarely collide.
const HASHED_DIMS: usize = 256;

/// Hashed bag-of-words embedder used when no neural backend is compiled in.
/// Token counts fold into fixed buckets and the vector is L2-normalised, so
/// near-duplicate texts stay near-identical in cosine space.
pub struct HashedEmbedder {
    dims: usize,
}

impl HashedEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn vectorise(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0f32; self.dims];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashedEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorise(t)).collect())
    }
}

#[cfg(feature = "embeddings")]
pub fn load(_settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(minilm::MiniLmEmbedder::new()?))
}

#[cfg(not(feature = "embeddings"))]
pub fn load(_settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(HashedEmbedder::new(HASHED_DIMS)))
}

#[cfg(test)]
mod tests {
    use super::{Embedder, HashedEmbedder};

    #[test]
    fn identical_texts_embed_identically() {
        let embedder = HashedEmbedder::new(64);
        let texts = vec!["fast delivery".to_string(), "fast delivery".to_string()];
        let vectors = embedder.embed(&texts).unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }

    #[test]
    fn vectors_are_unit_length() {
        let embedder = HashedEmbedder::new(64);
        let vectors = embedder.embed(&["battery died early".to_string()]).unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
