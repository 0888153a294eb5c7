//! Result schema returned by one clustering task invocation.

use serde::{Deserialize, Serialize};

/// 2D display position for one review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coords {
    pub x: f32,
    pub y: f32,
}

/// One row of the merged task output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub source_id: String,
    pub text: String,
    pub sentiment: String,
    pub confidence: f32,
    pub cluster_id: i64,
    pub coords: Coords,
}

/// Caller-facing summary of one retained cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: i64,
    pub title: String,
    pub summary: String,
}

/// Internal record kept per retained (category, topic) pair.
#[derive(Debug, Clone)]
pub struct ClusterRecord {
    pub global_id: i64,
    pub category: String,
    pub title: String,
    pub description: String,
    pub review_count: usize,
    pub keywords: String,
}

impl ClusterRecord {
    pub fn to_summary(&self) -> ClusterSummary {
        ClusterSummary {
            id: self.global_id,
            title: self.title.clone(),
            summary: self.description.clone(),
        }
    }
}

/// Serialises as `{"status": "success", ...}` or `{"status": "error", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskResult {
    Success {
        reviews: Vec<ReviewResult>,
        clusters: Vec<ClusterSummary>,
    },
    Error {
        message: String,
    },
}

impl TaskResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Queue message contract for one task invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMessage {
    pub csv_data: String,
    pub task_arg_id: String,
}
