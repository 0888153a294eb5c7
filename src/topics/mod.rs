//! Topic discovery over embedded review texts.

pub mod keywords;

use std::collections::HashMap;

use anyhow::{ensure, Result};

use keywords::ClassTfidf;

/// Reserved label for rows no topic claimed.
pub const NOISE_TOPIC: i64 = -1;

/// Tunables for one discovery run.
#[derive(Debug, Clone, Copy)]
pub struct TopicParams {
    /// Cosine similarity required to join an existing topic.
    pub threshold: f32,
    /// Topics smaller than this are folded into noise.
    pub min_topic_size: usize,
}

impl Default for TopicParams {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            min_topic_size: 2,
        }
    }
}

/// Member count for one discovered topic.
#[derive(Debug, Clone, Copy)]
pub struct TopicInfo {
    pub id: i64,
    pub count: usize,
}

/// Result of one per-category discovery run.
pub struct Topics {
    labels: Vec<i64>,
    ranked: Vec<TopicInfo>,
    tfidf: ClassTfidf,
    index_of: HashMap<i64, usize>,
}

impl Topics {
    /// Local topic id per input row; `-1` marks noise.
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Real topics ranked by member count descending, noise excluded. Ties
    /// break toward the lower local id so the ranking is reproducible.
    pub fn top_topics(&self, k: usize) -> Vec<TopicInfo> {
        self.ranked.iter().take(k).copied().collect()
    }

    /// Top-N keywords for one topic, best first.
    pub fn keywords(&self, topic_id: i64, n: usize) -> Vec<String> {
        let Some(&idx) = self.index_of.get(&topic_id) else {
            return Vec::new();
        };
        self.tfidf
            .top_terms(idx, n)
            .into_iter()
            .map(|(term, _)| term)
            .collect()
    }

    /// Row indices assigned to one topic, in input order.
    pub fn members(&self, topic_id: i64) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == topic_id)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Cluster texts by cosine similarity of their embeddings and rank the
/// resulting topics. `language_hint` drives stop-word filtering during
/// keyword extraction.
pub fn discover(
    texts: &[String],
    embeddings: &[Vec<f32>],
    language_hint: &str,
    params: TopicParams,
) -> Result<Topics> {
    ensure!(
        texts.len() == embeddings.len(),
        "texts and embeddings must align"
    );
    let unit: Vec<Vec<f32>> = embeddings.iter().map(|v| l2_normalize(v)).collect();

    // Greedy centroid pass: join the first topic within the threshold,
    // otherwise open a new one. The anchor vector of each topic stays fixed.
    let mut anchors: Vec<Vec<f32>> = Vec::new();
    let mut raw: Vec<usize> = Vec::with_capacity(unit.len());
    for vector in &unit {
        match anchors
            .iter()
            .enumerate()
            .find(|(_, anchor)| cosine(vector, anchor) >= params.threshold)
        {
            Some((idx, _)) => raw.push(idx),
            None => {
                anchors.push(vector.clone());
                raw.push(anchors.len() - 1);
            }
        }
    }

    // Fold undersized topics into noise and re-number the survivors in
    // first-appearance order.
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &cluster in &raw {
        *counts.entry(cluster).or_insert(0) += 1;
    }
    let mut renumber: HashMap<usize, i64> = HashMap::new();
    let mut labels = Vec::with_capacity(raw.len());
    for &cluster in &raw {
        if counts[&cluster] < params.min_topic_size {
            labels.push(NOISE_TOPIC);
            continue;
        }
        let next = renumber.len() as i64;
        labels.push(*renumber.entry(cluster).or_insert(next));
    }

    // Rank real topics by size, lower id first on ties.
    let mut sizes: HashMap<i64, usize> = HashMap::new();
    for &topic in &labels {
        if topic != NOISE_TOPIC {
            *sizes.entry(topic).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<TopicInfo> = sizes
        .into_iter()
        .map(|(id, count)| TopicInfo { id, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));

    // One TF-IDF document per real topic, indexed in id order.
    let mut ids: Vec<i64> = ranked.iter().map(|t| t.id).collect();
    ids.sort_unstable();
    let mut index_of = HashMap::new();
    let mut topic_docs: Vec<Vec<&str>> = Vec::new();
    for id in ids {
        index_of.insert(id, topic_docs.len());
        let docs: Vec<&str> = labels
            .iter()
            .zip(texts)
            .filter(|(&t, _)| t == id)
            .map(|(_, text)| text.as_str())
            .collect();
        topic_docs.push(docs);
    }
    let tfidf = ClassTfidf::fit(&topic_docs, language_hint);

    Ok(Topics {
        labels,
        ranked,
        tfidf,
        index_of,
    })
}

fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter().map(|v| v / norm).collect()
    } else {
        vector.to_vec()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::{discover, TopicParams, NOISE_TOPIC};

    fn unit(x: f32, y: f32, z: f32) -> Vec<f32> {
        let norm = (x * x + y * y + z * z).sqrt();
        vec![x / norm, y / norm, z / norm]
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("review number {i}")).collect()
    }

    #[test]
    fn identical_vectors_share_a_topic() {
        let embeddings = vec![unit(1.0, 0.0, 0.0); 3];
        let topics = discover(&texts(3), &embeddings, "english", TopicParams::default()).unwrap();
        assert_eq!(topics.labels(), &[0, 0, 0]);
        assert_eq!(topics.top_topics(3).len(), 1);
        assert_eq!(topics.top_topics(3)[0].count, 3);
    }

    #[test]
    fn singletons_fold_into_noise() {
        let embeddings = vec![
            unit(1.0, 0.0, 0.0),
            unit(1.0, 0.0, 0.0),
            unit(0.0, 1.0, 0.0),
        ];
        let topics = discover(&texts(3), &embeddings, "english", TopicParams::default()).unwrap();
        assert_eq!(topics.labels(), &[0, 0, NOISE_TOPIC]);
        assert_eq!(topics.members(NOISE_TOPIC), vec![2]);
    }

    #[test]
    fn equal_sizes_rank_lower_id_first() {
        let embeddings = vec![
            unit(1.0, 0.0, 0.0),
            unit(1.0, 0.0, 0.0),
            unit(0.0, 1.0, 0.0),
            unit(0.0, 1.0, 0.0),
        ];
        let topics = discover(&texts(4), &embeddings, "english", TopicParams::default()).unwrap();
        let ranked = topics.top_topics(3);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 0);
        assert_eq!(ranked[1].id, 1);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let embeddings = vec![unit(1.0, 0.0, 0.0)];
        assert!(discover(&texts(2), &embeddings, "english", TopicParams::default()).is_err());
    }
}
