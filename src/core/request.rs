//! Search request validation
//!
//! Raw filters arrive as JSON values. The builders only check the top-level
//! shape and key set; nested payloads are decoded later by the engine via
//! [`ValidRequest::keyword_criteria`] and [`ValidRequest::semantic_query`].

use std::collections::HashSet;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEYWORD_SEARCH: &str = "keyword_search";
pub const SEMANTIC_SEARCH: &str = "semantic_search";

lazy_static! {
    pub static ref SEARCH_POSTS_KEYS: HashSet<&'static str> =
        HashSet::from([KEYWORD_SEARCH, SEMANTIC_SEARCH]);
    pub static ref SEMANTIC_SEARCH_KEYS: HashSet<&'static str> =
        HashSet::from(["text", "model_id", "threshold"]);
}

/// One accumulated validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub parameter: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.parameter, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidRequest {
    errors: Vec<ValidationError>,
}

impl InvalidRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, parameter: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            parameter: parameter.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

/// Filters that passed validation, kept exactly as received.
/// Empty filters mean "no filtering".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidRequest {
    filters: Map<String, Value>,
}

impl ValidRequest {
    pub fn filters(&self) -> &Map<String, Value> {
        &self.filters
    }

    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    /// Decode the nested `keyword_search` payload, if present.
    /// A `null` payload means no criteria.
    pub fn keyword_criteria(&self) -> Option<Result<KeywordCriteria, ValidationError>> {
        self.filters.get(KEYWORD_SEARCH).map(|payload| match payload {
            Value::Null => Ok(KeywordCriteria::default()),
            payload => decode(KEYWORD_SEARCH, payload),
        })
    }

    /// Decode the nested `semantic_search` payload, if present.
    pub fn semantic_query(&self) -> Option<Result<SemanticQuery, ValidationError>> {
        self.filters
            .get(SEMANTIC_SEARCH)
            .map(|payload| decode(SEMANTIC_SEARCH, payload).and_then(SemanticQuery::checked))
    }

    /// Decode the whole filter map as a flat semantic query
    /// (the shape accepted by [`build_semantic_search_request`]).
    pub fn flat_semantic_query(&self) -> Result<SemanticQuery, ValidationError> {
        decode("filters", &Value::Object(self.filters.clone())).and_then(SemanticQuery::checked)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Valid(ValidRequest),
    Invalid(InvalidRequest),
}

/// Criteria for the keyword filter. Absent or empty lists are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordCriteria {
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub include_companies: Option<Vec<String>>,
}

impl KeywordCriteria {
    pub fn industries(&self) -> &[String] {
        self.industries.as_deref().unwrap_or_default()
    }

    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or_default()
    }

    pub fn include_companies(&self) -> &[String] {
        self.include_companies.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.industries().is_empty() && self.skills().is_empty() && self.include_companies().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticQuery {
    pub text: String,
    pub model_id: i64,
    pub threshold: f32,
}

impl SemanticQuery {
    fn checked(self) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ValidationError {
                parameter: "threshold".to_string(),
                message: format!("Must be between 0 and 1, got {}", self.threshold),
            });
        }
        Ok(self)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    parameter: &str,
    payload: &Value,
) -> Result<T, ValidationError> {
    T::deserialize(payload).map_err(|e| ValidationError {
        parameter: parameter.to_string(),
        message: e.to_string(),
    })
}

/// Validate filters for the nested search entry point
/// (`keyword_search` / `semantic_search`).
pub fn build_search_posts_request(filters: Option<&Value>) -> SearchRequest {
    build_request(filters, &SEARCH_POSTS_KEYS)
}

/// Validate filters for the flat semantic entry point
/// (`text` / `model_id` / `threshold`).
pub fn build_semantic_search_request(filters: Option<&Value>) -> SearchRequest {
    build_request(filters, &SEMANTIC_SEARCH_KEYS)
}

fn build_request(filters: Option<&Value>, accepted: &HashSet<&'static str>) -> SearchRequest {
    let mut invalid = InvalidRequest::new();

    let map = match filters {
        None | Some(Value::Null) => return SearchRequest::Valid(ValidRequest::default()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            invalid.add_error("filters", "Is not iterable");
            return SearchRequest::Invalid(invalid);
        }
    };

    for key in map.keys() {
        if !accepted.contains(key.as_str()) {
            invalid.add_error("filters", format!("Key {} cannot be used", key));
        }
    }

    if invalid.has_errors() {
        return SearchRequest::Invalid(invalid);
    }

    SearchRequest::Valid(ValidRequest {
        filters: map.clone(),
    })
}
