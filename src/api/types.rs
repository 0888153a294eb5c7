//! Shared DTOs for JSON requests and responses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub texts: Vec<String>,
}

/// Raw class ids plus full probability vectors; callers map ids through the
/// fixed sentiment label table themselves.
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub labels: Vec<usize>,
    pub probs: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
