//! Semantic ranking of job postings against a free-text query
//!
//! Candidates are the embeddings of the requested model for postings that
//! exist. Postings and embeddings are joined by `job_id`, never by position,
//! so the two stores are free to return rows in different orders.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::embedder::{cosine_similarity, Embedder};
use crate::config::ModelRegistry;
use crate::core::error::{Result, SearchError};
use crate::core::{Embedding, JobPosting, SemanticQuery};
use crate::repository::{EmbeddingFilter, EmbeddingStore, JobPostingStore};

/// Parallel sequences of selected postings and their embeddings.
///
/// `similarities` runs parallel to both when the result comes from ranking;
/// it is empty for an unfiltered listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemanticMatches {
    pub postings: Vec<JobPosting>,
    pub embeddings: Vec<Embedding>,
    pub similarities: Vec<f32>,
}

impl SemanticMatches {
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

pub struct SemanticRanker<'a> {
    jobs: &'a dyn JobPostingStore,
    embeddings: &'a dyn EmbeddingStore,
    embedder: &'a dyn Embedder,
    registry: &'a ModelRegistry,
}

impl<'a> SemanticRanker<'a> {
    pub fn new(
        jobs: &'a dyn JobPostingStore,
        embeddings: &'a dyn EmbeddingStore,
        embedder: &'a dyn Embedder,
        registry: &'a ModelRegistry,
    ) -> Self {
        Self {
            jobs,
            embeddings,
            embedder,
            registry,
        }
    }

    /// Select every posting whose embedding scores `>= threshold` against the query.
    pub fn rank(&self, query: &SemanticQuery) -> Result<SemanticMatches> {
        let postings = self.jobs.list_postings(None)?;
        let job_ids: HashSet<String> = postings.iter().map(|p| p.job_id.clone()).collect();

        let candidates = self.embeddings.list_embeddings(
            Some(&EmbeddingFilter {
                model_id: query.model_id,
            }),
            Some(&job_ids),
        )?;

        if candidates.is_empty() {
            tracing::debug!(model_id = query.model_id, "no candidate embeddings for model");
            return Ok(SemanticMatches::default());
        }

        let query_vector = self.embedder.embed_one(&query.text)?;
        if let Some(model) = self.registry.get(query.model_id) {
            if query_vector.len() != model.dimension {
                return Err(SearchError::DimensionMismatch {
                    expected: model.dimension,
                    actual: query_vector.len(),
                });
            }
        }

        let by_job = index_by_job(&candidates);

        let mut matches = SemanticMatches::default();
        for posting in postings {
            let Some(embedding) = by_job.get(posting.job_id.as_str()) else {
                continue;
            };
            let similarity = cosine_similarity(&query_vector, &embedding.vector)?;
            if similarity >= query.threshold {
                matches.embeddings.push((*embedding).clone());
                matches.similarities.push(similarity);
                matches.postings.push(posting);
            }
        }

        tracing::debug!(
            model_id = query.model_id,
            threshold = query.threshold,
            candidates = candidates.len(),
            selected = matches.len(),
            "semantic ranking finished"
        );

        Ok(matches)
    }
}

/// First embedding per job wins; later duplicates are reported and ignored.
fn index_by_job(candidates: &[Embedding]) -> HashMap<&str, &Embedding> {
    let mut by_job: HashMap<&str, &Embedding> = HashMap::with_capacity(candidates.len());
    for embedding in candidates {
        if by_job.contains_key(embedding.job_id.as_str()) {
            tracing::warn!(
                job_id = %embedding.job_id,
                embedding_id = embedding.id,
                model_id = embedding.model_id,
                "duplicate embedding for job and model; keeping the first"
            );
            continue;
        }
        by_job.insert(embedding.job_id.as_str(), embedding);
    }
    by_job
}
