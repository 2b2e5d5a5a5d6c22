//! Search Engine - validates requests and dispatches to keyword or semantic search
//!
//! Every call produces exactly one [`Response`]. Validation failures are
//! reported before any store is touched; runtime failures from stores or the
//! embedder are caught here, once, and never inside the filter or ranker.

use serde::Serialize;
use serde_json::Value;

use super::embedder::Embedder;
use super::keyword;
use super::semantic::{SemanticMatches, SemanticRanker};
use crate::config::ModelRegistry;
use crate::core::error::{Result, SearchError};
use crate::core::request::{build_search_posts_request, build_semantic_search_request};
use crate::core::response::{build_response_from_invalid_request, Response, ResponseType};
use crate::core::{JobPosting, SearchRequest, SemanticQuery, ValidRequest};
use crate::repository::{EmbeddingStore, JobPostingStore, ModelStore};

pub const INVALID_PARAMETERS_MESSAGE: &str =
    "Invalid request parameters. Please check the request and try again.";

/// Result of the nested search entry point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchHits {
    /// Unfiltered listing or keyword search
    Postings(Vec<JobPosting>),
    /// Semantic search
    Semantic(SemanticMatches),
}

impl SearchHits {
    pub fn postings(&self) -> &[JobPosting] {
        match self {
            Self::Postings(postings) => postings,
            Self::Semantic(matches) => &matches.postings,
        }
    }
}

/// Search engine over caller-supplied stores and embedder
pub struct SearchEngine<'a> {
    jobs: &'a dyn JobPostingStore,
    embeddings: &'a dyn EmbeddingStore,
    embedder: Option<&'a dyn Embedder>,
    models: Option<&'a dyn ModelStore>,
    registry: ModelRegistry,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        jobs: &'a dyn JobPostingStore,
        embeddings: &'a dyn EmbeddingStore,
        embedder: &'a dyn Embedder,
    ) -> Self {
        Self {
            jobs,
            embeddings,
            embedder: Some(embedder),
            models: None,
            registry: ModelRegistry::default(),
        }
    }

    /// Engine without an embedder. Semantic requests fail with `ResourceError`.
    pub fn keyword_only(jobs: &'a dyn JobPostingStore, embeddings: &'a dyn EmbeddingStore) -> Self {
        Self {
            jobs,
            embeddings,
            embedder: None,
            models: None,
            registry: ModelRegistry::default(),
        }
    }

    /// Check requested model ids against a model store
    pub fn with_models(mut self, models: &'a dyn ModelStore) -> Self {
        self.models = Some(models);
        self
    }

    /// Enforce registered model dimensions during ranking
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Nested entry point: `keyword_search` or `semantic_search`.
    pub fn search_posts(&self, filters: Option<&Value>) -> Response<SearchHits> {
        self.execute_posts(&build_search_posts_request(filters))
    }

    pub fn execute_posts(&self, request: &SearchRequest) -> Response<SearchHits> {
        let valid = match request {
            SearchRequest::Invalid(invalid) => return build_response_from_invalid_request(invalid),
            SearchRequest::Valid(valid) => valid,
        };

        if valid.is_unfiltered() {
            return self.guard(|| self.jobs.list_postings(None).map(SearchHits::Postings));
        }

        if let Some(criteria) = valid.keyword_criteria() {
            return match criteria {
                Ok(criteria) => self.guard(|| {
                    keyword::filter(self.jobs, &criteria).map(SearchHits::Postings)
                }),
                Err(e) => Response::failure(ResponseType::ParametersError, e.to_string()),
            };
        }

        if let Some(query) = valid.semantic_query() {
            return match query {
                Ok(query) => self.guard(|| self.rank(&query).map(SearchHits::Semantic)),
                Err(e) => Response::failure(ResponseType::ParametersError, e.to_string()),
            };
        }

        Response::failure(ResponseType::ParametersError, INVALID_PARAMETERS_MESSAGE)
    }

    /// Flat entry point: `text`, `model_id` and `threshold` at the top level.
    /// Empty filters list every posting and every embedding.
    pub fn semantic_search(&self, filters: Option<&Value>) -> Response<SemanticMatches> {
        self.execute_semantic(&build_semantic_search_request(filters))
    }

    pub fn execute_semantic(&self, request: &SearchRequest) -> Response<SemanticMatches> {
        let valid = match request {
            SearchRequest::Invalid(invalid) => return build_response_from_invalid_request(invalid),
            SearchRequest::Valid(valid) => valid,
        };

        if valid.is_unfiltered() {
            return self.guard(|| self.list_everything());
        }

        match valid.flat_semantic_query() {
            Ok(query) => self.guard(|| self.rank(&query)),
            Err(e) => Response::failure(ResponseType::ParametersError, e.to_string()),
        }
    }

    /// Run an already validated request through the nested entry point
    pub fn execute_valid(&self, valid: ValidRequest) -> Response<SearchHits> {
        self.execute_posts(&SearchRequest::Valid(valid))
    }

    fn list_everything(&self) -> Result<SemanticMatches> {
        Ok(SemanticMatches {
            postings: self.jobs.list_postings(None)?,
            embeddings: self.embeddings.list_embeddings(None, None)?,
            similarities: Vec::new(),
        })
    }

    fn rank(&self, query: &SemanticQuery) -> Result<SemanticMatches> {
        if let Some(models) = self.models {
            match models.model_name(query.model_id)? {
                Some(name) => tracing::debug!(model_id = query.model_id, model = %name, "ranking"),
                None => return Err(SearchError::UnknownModel(query.model_id)),
            }
        }

        let embedder = self.embedder.ok_or_else(|| {
            SearchError::Unavailable(format!("no embedder for model {}", query.model_id))
        })?;
        SemanticRanker::new(self.jobs, self.embeddings, embedder, &self.registry).rank(query)
    }

    fn guard<T>(&self, op: impl FnOnce() -> Result<T>) -> Response<T> {
        match op() {
            Ok(value) => Response::Success(value),
            Err(e) => {
                tracing::error!(kind = e.name(), error = %e, "search failed");
                Response::from_error(&e)
            }
        }
    }
}
