//! Cluster summarisation with a strict JSON output contract.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::Generator;

const SYSTEM_PROMPT: &str = "You are a data analyst. You will receive the keywords and sample \
reviews of one review cluster. Produce a JSON object with a 'title' field (a short heading of \
3-5 words) and a 'description' field (one sentence). Do not write any preamble; return ONLY \
valid JSON.";

/// Structured summary for one retained topic.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterDigest {
    pub title: String,
    pub description: String,
}

/// Why a summary could not be produced. The orchestrator branches on the
/// variant to pick the matching fallback digest.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("no decodable JSON object in model output: {0}")]
    Parse(String),
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Turns a topic's keywords and sample texts into a `{title, description}`
/// digest via the injected generation backend.
pub struct Summarizer<'a> {
    generator: &'a dyn Generator,
}

impl<'a> Summarizer<'a> {
    pub fn new(generator: &'a dyn Generator) -> Self {
        Self { generator }
    }

    /// One attempt, no retries. Malformed output and backend failures come
    /// back as tagged errors rather than panics.
    pub fn summarize(
        &self,
        keywords: &[String],
        samples: &[String],
    ) -> Result<ClusterDigest, SummaryError> {
        let user = build_user_prompt(keywords, samples);
        let response = self
            .generator
            .generate(SYSTEM_PROMPT, &user)
            .map_err(|err| SummaryError::Generation(err.to_string()))?;
        let span = extract_json_object(&response)
            .ok_or_else(|| SummaryError::Parse(truncate_for_log(&response)))?;
        serde_json::from_str(span).map_err(|err| {
            warn!(%err, "cluster summary JSON failed to decode");
            SummaryError::Parse(truncate_for_log(&response))
        })
    }
}

fn build_user_prompt(keywords: &[String], samples: &[String]) -> String {
    format!(
        "Keywords: {}\nSample reviews: {}\n\nReturn JSON shaped as: {{\"title\": \"...\", \"description\": \"...\"}}",
        keywords.join(", "),
        serde_json::to_string(samples).unwrap_or_else(|_| "[]".to_string()),
    )
}

/// Greedy `{...}` span: first opening brace to last closing brace. Tolerates
/// conversational filler around the object.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

fn truncate_for_log(raw: &str) -> String {
    raw.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::extract_json_object;

    #[test]
    fn finds_object_inside_filler() {
        let raw = "Sure! Here you go: {\"title\": \"t\", \"description\": \"d\"} Hope it helps.";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"title\": \"t\", \"description\": \"d\"}")
        );
    }

    #[test]
    fn rejects_text_without_braces() {
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn rejects_reversed_braces() {
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
