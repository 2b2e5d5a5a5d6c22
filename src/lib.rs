//! job-search library
//!
//! Search-and-filter engine for job postings: exact-match keyword filtering
//! plus embedding-based semantic ranking over pluggable stores.
//!
//! # Modules
//!
//! - `core`: Data model, request validation, response envelope
//! - `repository`: Store traits with in-memory and SQLite backends
//! - `search`: Keyword filter, semantic ranker, search engine
//! - `config`: Paths, YAML settings, model registry

pub mod config;
pub mod core;
pub mod logging;
pub mod repository;
pub mod search;

// Re-exports for convenience
pub use crate::config::{AppConfig, AppPaths, ModelRegistry};
pub use crate::core::{
    build_response_from_invalid_request, build_search_posts_request,
    build_semantic_search_request, Embedding, JobPosting, KeywordCriteria, ModelInfo, Response,
    ResponseFailure, ResponseType, SearchError, SearchRequest, SemanticQuery,
};
pub use crate::repository::{
    EmbeddingFilter, EmbeddingStore, InMemoryEmbeddingStore, InMemoryJobStore,
    InMemoryModelStore, JobPostingStore, ModelStore, SqliteStore, StoreStats,
};
pub use crate::search::{Embedder, HtpEmbedder, SearchEngine, SearchHits, SemanticMatches};
