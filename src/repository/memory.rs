use std::collections::HashSet;

use super::{embedding_matches, EmbeddingFilter, EmbeddingStore, JobPostingStore, ModelStore};
use crate::core::error::Result;
use crate::core::{Embedding, JobPosting, ModelInfo};

#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    postings: Vec<JobPosting>,
}

impl InMemoryJobStore {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self { postings }
    }
}

impl JobPostingStore for InMemoryJobStore {
    fn all_postings(&self) -> Result<Vec<JobPosting>> {
        Ok(self.postings.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEmbeddingStore {
    embeddings: Vec<Embedding>,
}

impl InMemoryEmbeddingStore {
    pub fn new(embeddings: Vec<Embedding>) -> Self {
        Self { embeddings }
    }
}

impl EmbeddingStore for InMemoryEmbeddingStore {
    fn list_embeddings(
        &self,
        filter: Option<&EmbeddingFilter>,
        job_ids: Option<&HashSet<String>>,
    ) -> Result<Vec<Embedding>> {
        Ok(self
            .embeddings
            .iter()
            .filter(|e| embedding_matches(e, filter, job_ids))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryModelStore {
    models: Vec<ModelInfo>,
}

impl InMemoryModelStore {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }
}

impl ModelStore for InMemoryModelStore {
    fn model_name(&self, model_id: i64) -> Result<Option<String>> {
        Ok(self
            .models
            .iter()
            .find(|m| m.id == model_id)
            .map(|m| m.name.clone()))
    }
}
