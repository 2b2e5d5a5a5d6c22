//! Search over job postings
//!
//! Keyword filtering narrows postings by industries, skills and companies.
//! Semantic ranking embeds a query and keeps postings whose embedding is
//! similar enough. The engine validates requests and picks one of the two.

pub mod embedder;
pub mod engine;
pub mod keyword;
pub mod semantic;

pub use embedder::{cosine_similarity, Embedder, HtpEmbedder};
pub use engine::{SearchEngine, SearchHits};
pub use semantic::{SemanticMatches, SemanticRanker};
