use serde::{Deserialize, Serialize};

/// Vector produced by one embedding model for one job posting.
///
/// `job_id` is a reference, not ownership: several embeddings (one per model)
/// may point at the same posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub id: i64,
    pub job_id: String,
    pub model_id: i64,
    pub vector: Vec<f32>,
}

/// Metadata for an embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: i64,
    pub name: String,
    pub dimension: usize,
}
