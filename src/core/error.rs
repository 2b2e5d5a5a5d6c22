use thiserror::Error;

/// Runtime failures raised by stores, embedders and the ranker.
///
/// Validation problems never show up here; they are reported through
/// [`InvalidRequest`](super::request::InvalidRequest) before any store is touched.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Store(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Embedder(String),

    #[error("expected vectors of dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("model {0} is not registered")]
    UnknownModel(i64),

    #[error("{0}")]
    Unavailable(String),
}

impl SearchError {
    /// Stable type name used as the prefix of failure messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store(_) => "StoreError",
            Self::Sqlite(_) => "SqliteError",
            Self::Json(_) => "JsonError",
            Self::Embedder(_) => "EmbedderError",
            Self::DimensionMismatch { .. } => "DimensionMismatch",
            Self::UnknownModel(_) => "UnknownModel",
            Self::Unavailable(_) => "Unavailable",
        }
    }

    /// Whether the failure means a backing resource is missing rather than broken.
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::UnknownModel(_) | Self::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_stable() {
        assert_eq!(SearchError::Store("boom".into()).name(), "StoreError");
        assert_eq!(
            SearchError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
            .name(),
            "DimensionMismatch"
        );
    }

    #[test]
    fn test_resource_classification() {
        assert!(SearchError::UnknownModel(7).is_resource());
        assert!(SearchError::Unavailable("db offline".into()).is_resource());
        assert!(!SearchError::Embedder("oom".into()).is_resource());
    }
}
