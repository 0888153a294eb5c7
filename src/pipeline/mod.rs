//! The clustering orchestrator: per-category topic discovery, global ID
//! remapping, generative summaries, 2D projection, and the sentiment merge.

pub mod types;

use std::collections::HashMap;

use anyhow::{ensure, Result};
use indexmap::IndexMap;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::{
    config::Settings,
    nlp::{
        summarize::{ClusterDigest, Summarizer, SummaryError},
        ModelContext,
    },
    projection, text,
    topics::{self, TopicParams, NOISE_TOPIC},
};

pub use types::{ClusterRecord, ClusterSummary, Coords, ReviewResult, TaskMessage, TaskResult};

/// Title attached to rows that did not land in a retained topic.
pub const NOISE_TITLE: &str = "noise";

/// Fallback digest when the model answered but the answer held no JSON.
pub const SUMMARY_PARSE_FALLBACK: (&str, &str) =
    ("Malformed summary", "The model returned an invalid response.");
/// Fallback digest when the generation call itself failed.
pub const SUMMARY_GENERATION_FALLBACK: (&str, &str) =
    ("Generation error", "No response from the language model.");

/// One parsed input row.
#[derive(Debug, Clone)]
struct ReviewRow {
    source_id: String,
    text: String,
}

/// A category row annotated with everything the merge stage needs.
struct AnnotatedRow {
    source_id: String,
    text: String,
    cluster_id: i64,
    coords: Coords,
}

/// Run one clustering task over serialized CSV input.
///
/// Input validation failures come back as an error *result*; failures in the
/// embedding, discovery, classification, or projection stages propagate as
/// `Err` and fail the whole task. Summarization failures are recovered
/// locally with a fixed fallback digest.
pub fn run_clustering_task(
    ctx: &ModelContext,
    settings: &Settings,
    csv_data: &str,
    task_id: &str,
) -> Result<TaskResult> {
    let batch = match parse_batch(csv_data, settings.max_rows) {
        Ok(batch) => batch,
        Err(reason) => {
            warn!(task_id, %reason, "rejecting clustering task input");
            return Ok(TaskResult::error(reason));
        }
    };

    let summarizer = Summarizer::new(ctx.generator.as_ref());
    let topic_params = TopicParams {
        threshold: settings.topic_threshold,
        min_topic_size: settings.min_topic_size,
    };
    let mut rng = StdRng::seed_from_u64(settings.seed);

    let mut accumulated: Vec<AnnotatedRow> = Vec::new();
    let mut cluster_records: Vec<ClusterRecord> = Vec::new();
    let mut topic_offset: i64 = 0;
    let total_categories = batch.len().max(1);

    for (index, (category, rows)) in batch.iter().enumerate() {
        let progress = 10 + index * 80 / total_categories;
        info!(
            task_id,
            category = category.as_str(),
            progress,
            "processing category"
        );

        if rows.len() < settings.min_category_rows {
            info!(
                task_id,
                category = category.as_str(),
                rows = rows.len(),
                "skipping small category"
            );
            continue;
        }

        let texts: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        let embeddings = ctx.embedder.embed(&texts)?;
        let discovered = topics::discover(&texts, &embeddings, &settings.language, topic_params)?;

        let retained = discovered.top_topics(settings.max_clusters);
        let mut remap: HashMap<i64, i64> = HashMap::new();
        for (rank, topic) in retained.iter().enumerate() {
            remap.insert(topic.id, rank as i64);
        }

        let mut titles: HashMap<i64, String> = HashMap::new();
        for topic in &retained {
            let keywords = discovered.keywords(topic.id, settings.keyword_limit);
            let members = discovered.members(topic.id);
            let samples = sample_texts(&texts, &members, settings.sample_limit, &mut rng);
            let digest = match summarizer.summarize(&keywords, &samples) {
                Ok(digest) => digest,
                Err(err) => {
                    warn!(task_id, topic = topic.id, %err, "substituting fallback summary");
                    fallback_digest(&err)
                }
            };
            titles.insert(topic.id, digest.title.clone());
            cluster_records.push(ClusterRecord {
                global_id: remap[&topic.id] + topic_offset,
                category: category.clone(),
                title: digest.title,
                description: digest.description,
                review_count: topic.count,
                keywords: keywords.join(", "),
            });
        }

        let assignments = assign_clusters(discovered.labels(), &remap, &titles, topic_offset);
        let coords = projection::project(&embeddings, settings.seed);
        for ((row, (cluster_id, _title)), point) in rows.iter().zip(assignments).zip(&coords) {
            accumulated.push(AnnotatedRow {
                source_id: row.source_id.clone(),
                text: row.text.clone(),
                cluster_id,
                coords: Coords {
                    x: point[0],
                    y: point[1],
                },
            });
        }

        topic_offset += retained.len() as i64;
    }

    let mut reviews = Vec::with_capacity(accumulated.len());
    if !accumulated.is_empty() {
        let raw_texts: Vec<String> = accumulated.iter().map(|r| r.text.clone()).collect();
        let cleaned = text::clean_batch(&raw_texts);
        info!(task_id, rows = cleaned.len(), "estimating sentiment");
        let predictions = ctx.classifier.classify(&cleaned)?;
        ensure!(
            predictions.len() == accumulated.len(),
            "classifier returned {} predictions for {} rows",
            predictions.len(),
            accumulated.len()
        );
        for ((row, clean_text), prediction) in
            accumulated.into_iter().zip(cleaned).zip(predictions)
        {
            reviews.push(ReviewResult {
                source_id: row.source_id,
                text: clean_text,
                sentiment: prediction.sentiment().to_string(),
                confidence: prediction.confidence(),
                cluster_id: row.cluster_id,
                coords: row.coords,
            });
        }
    }

    let clusters: Vec<ClusterSummary> = cluster_records.iter().map(ClusterRecord::to_summary).collect();
    info!(
        task_id,
        reviews = reviews.len(),
        clusters = clusters.len(),
        "clustering task complete"
    );
    Ok(TaskResult::Success { reviews, clusters })
}

/// Parse the serialized batch, truncate to `max_rows`, and group rows by
/// category in first-appearance order.
fn parse_batch(csv_data: &str, max_rows: usize) -> Result<IndexMap<String, Vec<ReviewRow>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return Err("could not read the input data".to_string()),
    };
    let text_idx = headers.iter().position(|h| h == "text");
    let src_idx = headers.iter().position(|h| h == "src");
    let id_idx = headers.iter().position(|h| h == "ID");
    let (Some(text_idx), Some(src_idx)) = (text_idx, src_idx) else {
        return Err("the input is missing the required text or src columns".to_string());
    };

    let mut grouped: IndexMap<String, Vec<ReviewRow>> = IndexMap::new();
    for record in reader.records().take(max_rows) {
        let record = record.map_err(|_| "could not read the input data".to_string())?;
        let (Some(text), Some(src)) = (record.get(text_idx), record.get(src_idx)) else {
            return Err("could not read the input data".to_string());
        };
        let source_id = id_idx
            .and_then(|idx| record.get(idx))
            .filter(|value| !value.is_empty())
            .unwrap_or(src)
            .to_string();
        grouped.entry(src.to_string()).or_default().push(ReviewRow {
            source_id,
            text: text.to_string(),
        });
    }
    Ok(grouped)
}

/// Map local topic labels into the global ID space. Retained topics take
/// `rank + offset` and their generated title; everything else, noise
/// included, collapses to `-1` under the shared noise label.
fn assign_clusters(
    labels: &[i64],
    remap: &HashMap<i64, i64>,
    titles: &HashMap<i64, String>,
    offset: i64,
) -> Vec<(i64, String)> {
    labels
        .iter()
        .map(|label| match remap.get(label) {
            Some(rank) => (
                rank + offset,
                titles
                    .get(label)
                    .cloned()
                    .unwrap_or_else(|| NOISE_TITLE.to_string()),
            ),
            None => (NOISE_TOPIC, NOISE_TITLE.to_string()),
        })
        .collect()
}

/// Up to `limit` member texts, sampled uniformly without replacement; the
/// whole membership when it already fits.
fn sample_texts(
    texts: &[String],
    members: &[usize],
    limit: usize,
    rng: &mut StdRng,
) -> Vec<String> {
    if members.len() <= limit {
        return members.iter().map(|&idx| texts[idx].clone()).collect();
    }
    rand::seq::index::sample(rng, members.len(), limit)
        .into_iter()
        .map(|pick| texts[members[pick]].clone())
        .collect()
}

fn fallback_digest(err: &SummaryError) -> ClusterDigest {
    let (title, description) = match err {
        SummaryError::Parse(_) => SUMMARY_PARSE_FALLBACK,
        SummaryError::Generation(_) => SUMMARY_GENERATION_FALLBACK,
    };
    ClusterDigest {
        title: title.to_string(),
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{assign_clusters, parse_batch, NOISE_TITLE};
    use crate::topics::NOISE_TOPIC;

    #[test]
    fn retained_labels_take_rank_plus_offset() {
        let mut remap = HashMap::new();
        remap.insert(4, 0);
        remap.insert(1, 1);
        let mut titles = HashMap::new();
        titles.insert(4, "big topic".to_string());
        titles.insert(1, "small topic".to_string());

        let assignments = assign_clusters(&[4, 1, 4, 7, NOISE_TOPIC], &remap, &titles, 3);
        assert_eq!(assignments[0], (3, "big topic".to_string()));
        assert_eq!(assignments[1], (4, "small topic".to_string()));
        assert_eq!(assignments[2], (3, "big topic".to_string()));
        assert_eq!(assignments[3], (NOISE_TOPIC, NOISE_TITLE.to_string()));
        assert_eq!(assignments[4], (NOISE_TOPIC, NOISE_TITLE.to_string()));
    }

    #[test]
    fn batch_groups_in_first_appearance_order() {
        let csv = "text,src\na,beta\nb,alpha\nc,beta\n";
        let grouped = parse_batch(csv, 500).unwrap();
        let order: Vec<&String> = grouped.keys().collect();
        assert_eq!(order, ["beta", "alpha"]);
        assert_eq!(grouped["beta"].len(), 2);
    }

    #[test]
    fn batch_truncates_to_the_row_cap() {
        let mut csv = String::from("text,src\n");
        for idx in 0..10 {
            csv.push_str(&format!("row {idx},cat\n"));
        }
        let grouped = parse_batch(&csv, 7).unwrap();
        assert_eq!(grouped["cat"].len(), 7);
        assert_eq!(grouped["cat"][6].text, "row 6");
    }

    #[test]
    fn missing_columns_are_rejected() {
        assert!(parse_batch("foo,bar\n1,2\n", 500).is_err());
        assert!(parse_batch("text,other\nx,y\n", 500).is_err());
    }

    #[test]
    fn id_column_feeds_source_id() {
        let csv = "ID,text,src\n42,hello,cat\n,world,cat\n";
        let grouped = parse_batch(csv, 500).unwrap();
        assert_eq!(grouped["cat"][0].source_id, "42");
        // Empty ID falls back to the category label.
        assert_eq!(grouped["cat"][1].source_id, "cat");
    }

    #[test]
    fn short_records_are_a_read_error() {
        let csv = "text,src\nonly-text\n";
        assert!(parse_batch(csv, 500).is_err());
    }
}
