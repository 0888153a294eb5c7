//! Class-based TF-IDF keyword extraction over topic clusters.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use stop_words::{get, LANGUAGE};

/// Term statistics where each topic's concatenated member texts form one
/// document, so document frequency is really topic frequency. Terms that
/// dominate a single topic score highest for it.
pub struct ClassTfidf {
    topic_terms: Vec<HashMap<String, u32>>,
    doc_freq: HashMap<String, u32>,
}

impl ClassTfidf {
    pub fn fit(topic_docs: &[Vec<&str>], language: &str) -> Self {
        let stops = stopword_set(language);
        let mut topic_terms = Vec::with_capacity(topic_docs.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        for docs in topic_docs {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for doc in docs {
                for token in tokenize(doc) {
                    if token.chars().count() < 2 || stops.contains(&token) {
                        continue;
                    }
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
            for term in counts.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            topic_terms.push(counts);
        }
        Self {
            topic_terms,
            doc_freq,
        }
    }

    /// Top-N `(term, weight)` pairs for one topic, weight descending, with a
    /// lexicographic tie-break so ranking is stable across calls.
    pub fn top_terms(&self, topic_idx: usize, n: usize) -> Vec<(String, f64)> {
        let Some(counts) = self.topic_terms.get(topic_idx) else {
            return Vec::new();
        };
        let total: u32 = counts.values().sum();
        if total == 0 {
            return Vec::new();
        }
        let num_topics = self.topic_terms.len() as f64;
        let mut scored: Vec<(String, f64)> = counts
            .iter()
            .map(|(term, &count)| {
                let tf = count as f64 / total as f64;
                let df = *self.doc_freq.get(term).unwrap_or(&1) as f64;
                let idf = (1.0 + num_topics / df).ln();
                (term.clone(), tf * idf)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);
        scored
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn stopword_set(language: &str) -> HashSet<String> {
    let language = match language.to_ascii_lowercase().as_str() {
        "russian" | "ru" => LANGUAGE::Russian,
        "spanish" | "es" => LANGUAGE::Spanish,
        "german" | "de" => LANGUAGE::German,
        _ => LANGUAGE::English,
    };
    get(language).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::ClassTfidf;

    #[test]
    fn discriminating_terms_outrank_shared_ones() {
        let topics = vec![
            vec!["battery battery charge phone", "battery drains phone"],
            vec!["delivery courier phone", "delivery late phone"],
        ];
        let tfidf = ClassTfidf::fit(&topics, "english");
        let top: Vec<String> = tfidf
            .top_terms(0, 2)
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        assert_eq!(top[0], "battery");
    }

    #[test]
    fn stop_words_are_filtered() {
        let topics = vec![vec!["the the the battery is the best"]];
        let tfidf = ClassTfidf::fit(&topics, "english");
        let terms: Vec<String> = tfidf
            .top_terms(0, 5)
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        assert!(!terms.contains(&"the".to_string()));
        assert!(terms.contains(&"battery".to_string()));
    }
}
