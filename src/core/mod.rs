//! Data model, request validation and the response envelope.

pub mod embedding;
pub mod error;
pub mod posting;
pub mod request;
pub mod response;

pub use embedding::{Embedding, ModelInfo};
pub use error::SearchError;
pub use posting::JobPosting;
pub use request::{
    build_search_posts_request, build_semantic_search_request, InvalidRequest, KeywordCriteria,
    SearchRequest, SemanticQuery, ValidRequest, ValidationError,
};
pub use response::{build_response_from_invalid_request, Response, ResponseFailure, ResponseType};
