//! Typed success/failure envelope returned by every search entry point.

use serde::Serialize;

use super::error::SearchError;
use super::request::InvalidRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    ParametersError,
    ResourceError,
    SystemError,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParametersError => "ParametersError",
            Self::ResourceError => "ResourceError",
            Self::SystemError => "SystemError",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseFailure {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub message: String,
}

impl ResponseFailure {
    pub fn new(kind: ResponseType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure from an unexpected error, rendered as `"{type}: {text}"`.
    pub fn from_error(kind: ResponseType, err: &SearchError) -> Self {
        Self::new(kind, format!("{}: {}", err.name(), err))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
    Success(T),
    Failure(ResponseFailure),
}

impl<T> Response<T> {
    pub fn failure(kind: ResponseType, message: impl Into<String>) -> Self {
        Self::Failure(ResponseFailure::new(kind, message))
    }

    /// Classify a runtime error: missing resources become `ResourceError`,
    /// everything else `SystemError`.
    pub fn from_error(err: &SearchError) -> Self {
        let kind = if err.is_resource() {
            ResponseType::ResourceError
        } else {
            ResponseType::SystemError
        };
        Self::Failure(ResponseFailure::from_error(kind, err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_ref(&self) -> Option<&ResponseFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, ResponseFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self {
            Self::Success(value) => Response::Success(f(value)),
            Self::Failure(failure) => Response::Failure(failure),
        }
    }
}

/// The single bridge from an invalid request to a `ParametersError` failure.
pub fn build_response_from_invalid_request<T>(invalid: &InvalidRequest) -> Response<T> {
    let message = invalid
        .errors()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Response::failure(ResponseType::ParametersError, message)
}

impl std::fmt::Display for ResponseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ResponseFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_message_joins_in_order() {
        let mut invalid = InvalidRequest::new();
        invalid.add_error("filters", "Key a cannot be used");
        invalid.add_error("filters", "Key b cannot be used");

        let response: Response<()> = build_response_from_invalid_request(&invalid);
        let failure = response.failure_ref().unwrap();
        assert_eq!(failure.kind, ResponseType::ParametersError);
        assert_eq!(
            failure.message,
            "filters: Key a cannot be used\nfilters: Key b cannot be used"
        );
    }

    #[test]
    fn test_error_message_format() {
        let err = SearchError::Store("connection reset".to_string());
        let response: Response<()> = Response::from_error(&err);
        let failure = response.into_result().unwrap_err();
        assert_eq!(failure.kind, ResponseType::SystemError);
        assert_eq!(failure.message, "StoreError: connection reset");
    }

    #[test]
    fn test_resource_errors() {
        let response: Response<()> = Response::from_error(&SearchError::UnknownModel(9));
        assert_eq!(
            response.failure_ref().map(|f| f.kind),
            Some(ResponseType::ResourceError)
        );
    }

    #[test]
    fn test_success_accessors() {
        let response = Response::Success(vec![1, 2]);
        assert!(response.is_success());
        assert_eq!(response.value(), Some(&vec![1, 2]));
        assert_eq!(response.map(|v| v.len()).into_result().unwrap(), 2);
    }

    #[test]
    fn test_failure_serializes_like_a_value() {
        let failure = ResponseFailure::new(ResponseType::ParametersError, "filters: Is not iterable");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["type"], "ParametersError");
        assert_eq!(json["message"], "filters: Is not iterable");
    }
}
