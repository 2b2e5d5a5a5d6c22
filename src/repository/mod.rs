//! Read-only storage contracts consumed by the search engine
//!
//! Backends only need to hand out point-in-time snapshots; the engine never
//! writes through these traits and never keeps what it reads beyond one call.

pub mod memory;
pub mod sqlite;

use std::collections::HashSet;

use crate::core::error::Result;
use crate::core::{Embedding, JobPosting, KeywordCriteria};
use crate::search::keyword;

pub use memory::{InMemoryEmbeddingStore, InMemoryJobStore, InMemoryModelStore};
pub use sqlite::{SqliteStore, StoreStats};

pub trait JobPostingStore: Send + Sync {
    /// Every posting, in the store's natural order.
    fn all_postings(&self) -> Result<Vec<JobPosting>>;

    /// Postings matching `criteria`; `None` returns everything.
    ///
    /// The default runs the keyword filter over [`all_postings`](Self::all_postings).
    /// Backends able to push the filter down may override it, but must keep
    /// the same semantics.
    fn list_postings(&self, criteria: Option<&KeywordCriteria>) -> Result<Vec<JobPosting>> {
        let postings = self.all_postings()?;
        Ok(match criteria {
            Some(criteria) => keyword::filter_postings(postings, criteria),
            None => postings,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingFilter {
    pub model_id: i64,
}

pub trait EmbeddingStore: Send + Sync {
    /// Embeddings restricted by model and/or posting ids. Both `None` returns everything.
    fn list_embeddings(
        &self,
        filter: Option<&EmbeddingFilter>,
        job_ids: Option<&HashSet<String>>,
    ) -> Result<Vec<Embedding>>;
}

pub trait ModelStore: Send + Sync {
    /// Name of the model with `model_id`, if known.
    fn model_name(&self, model_id: i64) -> Result<Option<String>>;
}

/// Shared predicate for backends that filter embeddings in memory.
pub fn embedding_matches(
    embedding: &Embedding,
    filter: Option<&EmbeddingFilter>,
    job_ids: Option<&HashSet<String>>,
) -> bool {
    filter.map_or(true, |f| embedding.model_id == f.model_id)
        && job_ids.map_or(true, |ids| ids.contains(&embedding.job_id))
}
