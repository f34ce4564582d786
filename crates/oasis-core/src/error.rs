//! Error values for the request pipeline.
//!
//! Every failure that can occur while serving a request is an [`OasError`]
//! value. The pipeline never raises; it classifies each error with
//! [`OasError::status_code`] and renders a client-visible body with
//! [`OasError::to_body`].
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `ParameterType` | 400 | `{"type":"ParameterTypeError", ...}` |
//! | `MalformedJson` | 400 | `{"type":"MalformedJSON", ...}` |
//! | `Validation` | 400 | `{"type":"JSONValidationError","errors":[...]}` |
//! | `PayloadTooLarge` | 413 | `{"type":"PayloadTooLarge", ...}` |
//! | `Panic`, `Internal`, `ResponseValidation` | 500 | `{"message":"Internal Server Error","details":"..."}` |

use std::fmt;

use http::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;

use crate::param::{ParamKind, ParamLocation};

/// Result type for request handling.
pub type OasResult<T> = Result<T, OasError>;

/// Display text of [`OasError::MalformedJson`].
pub const MALFORMED_JSON_MESSAGE: &str = "request contains malformed JSON";

/// Message of the generic internal error envelope.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// One violated schema constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer into the validated document, `(root)` for the document itself.
    pub location: String,
    /// Human readable description of the violation.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "At {}: {}", self.location, self.message)
    }
}

/// The violations found by one schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the issues in the order they were reported.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `true` if any issue mentions `needle` in its location or message.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.location.contains(needle) || i.message.contains(needle))
    }
}

impl From<Vec<ValidationIssue>> for ValidationErrors {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("JSONValidationError", 2)?;
        state.serialize_field("type", "JSONValidationError")?;
        state.serialize_field("errors", &self.issues)?;
        state.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JSONValidationError:")?;
        for issue in &self.issues {
            write!(f, "\n\t{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A failure while materializing, dispatching or encoding a request.
#[derive(Debug, Error)]
pub enum OasError {
    /// A parameter's raw text could not be converted to its declared kind.
    #[error("{location} parameter '{name}' must be of type {expected}, got '{raw}'")]
    ParameterType {
        /// Where the parameter was read from.
        location: ParamLocation,
        /// Declared parameter name.
        name: String,
        /// The offending raw text.
        raw: String,
        /// Declared kind.
        expected: ParamKind,
    },

    /// The request body (or the document built from it) is not valid JSON,
    /// or does not fit the declared body type.
    #[error("request contains malformed JSON")]
    MalformedJson {
        /// Parser diagnostic.
        details: String,
    },

    /// The request violates the endpoint's composite schema.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The request body exceeds the configured size limit.
    #[error("request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// The limit in bytes.
        limit: usize,
    },

    /// The handler chain panicked.
    #[error("endpoint handler panicked")]
    Panic {
        /// Panic payload rendered as text. Logged, never sent to clients.
        message: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Description sent as the envelope `details`.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A response body does not match the schema declared for its status.
    /// Observed only; never changes the response.
    #[error("response body for status {status} does not match its schema: {errors}")]
    ResponseValidation {
        /// The resolved response status.
        status: u16,
        /// The violations.
        errors: ValidationErrors,
    },
}

impl OasError {
    /// Creates a parameter type error.
    pub fn parameter_type(
        location: ParamLocation,
        name: impl Into<String>,
        raw: impl Into<String>,
        expected: ParamKind,
    ) -> Self {
        Self::ParameterType {
            location,
            name: name.into(),
            raw: raw.into(),
            expected,
        }
    }

    /// Creates a malformed JSON error.
    pub fn malformed_json(details: impl fmt::Display) -> Self {
        Self::MalformedJson {
            details: details.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with an underlying cause.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns `true` for errors caused by the client's request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ParameterType { .. }
                | Self::MalformedJson { .. }
                | Self::Validation(_)
                | Self::PayloadTooLarge { .. }
        )
    }

    /// Returns the HTTP status the pipeline answers with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if matches!(self, Self::PayloadTooLarge { .. }) {
            StatusCode::PAYLOAD_TOO_LARGE
        } else if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Short machine-readable name of the error class.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::ParameterType { .. } => "ParameterTypeError",
            Self::MalformedJson { .. } => "MalformedJSON",
            Self::Validation(_) => "JSONValidationError",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::Panic { .. } => "Panic",
            Self::Internal { .. } => "InternalError",
            Self::ResponseValidation { .. } => "ResponseValidationError",
        }
    }

    /// Renders the client-visible body for this error.
    ///
    /// Server-side errors always collapse into the generic envelope with a
    /// single `details` string.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::ParameterType {
                location,
                name,
                raw,
                expected,
            } => json!({
                "type": self.kind_name(),
                "message": self.to_string(),
                "location": location,
                "name": name,
                "value": raw,
                "expected": expected.to_string(),
            }),
            Self::MalformedJson { details } => json!({
                "type": self.kind_name(),
                "message": MALFORMED_JSON_MESSAGE,
                "details": details,
            }),
            Self::PayloadTooLarge { limit } => json!({
                "type": self.kind_name(),
                "message": self.to_string(),
                "limit": limit,
            }),
            Self::Validation(errors) => {
                serde_json::to_value(errors).unwrap_or_else(|_| json!({"type": self.kind_name()}))
            }
            _ => internal_envelope(&self.to_string()),
        }
    }
}

impl From<ValidationErrors> for OasError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<anyhow::Error> for OasError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Builds the generic `{"message":"Internal Server Error","details":...}` envelope.
#[must_use]
pub fn internal_envelope(details: &str) -> Value {
    json!({
        "message": INTERNAL_ERROR_MESSAGE,
        "details": details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_envelope_quotes_details() {
        let body = internal_envelope("this is an \"error\"");
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"message":"Internal Server Error","details":"this is an \"error\""}"#
        );
    }

    #[test]
    fn test_parameter_type_error() {
        let err = OasError::parameter_type(ParamLocation::Query, "limit", "abc", ParamKind::Integer);

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        let text = err.to_string();
        assert!(text.contains("limit"));
        assert!(text.contains("int"));
        assert!(text.contains("abc"));

        let body = err.to_body();
        assert_eq!(body["type"], "ParameterTypeError");
        assert_eq!(body["location"], "query");
        assert_eq!(body["name"], "limit");
        assert_eq!(body["value"], "abc");
        assert_eq!(body["expected"], "int");
    }

    #[test]
    fn test_malformed_json_error() {
        let err = OasError::malformed_json("expected value at line 1 column 1");
        assert_eq!(err.to_string(), MALFORMED_JSON_MESSAGE);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body()["message"], MALFORMED_JSON_MESSAGE);
    }

    #[test]
    fn test_validation_errors_body_and_display() {
        let errors = ValidationErrors::from(vec![
            ValidationIssue::new("/Query", "\"q\" is a required property"),
            ValidationIssue::new("/Body/title", "5 is not of type \"string\""),
        ]);
        assert!(errors.mentions("\"q\""));
        assert!(!errors.mentions("limit"));

        let err = OasError::from(errors);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "JSONValidationError:\n\tAt /Query: \"q\" is a required property\n\tAt /Body/title: 5 is not of type \"string\""
        );

        let body = err.to_body();
        assert_eq!(body["type"], "JSONValidationError");
        assert_eq!(body["errors"][0]["location"], "/Query");
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_payload_too_large() {
        let err = OasError::PayloadTooLarge { limit: 1024 };
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "request body exceeds the limit of 1024 bytes");

        let body = err.to_body();
        assert_eq!(body["type"], "PayloadTooLarge");
        assert_eq!(body["limit"], 1024);
    }

    #[test]
    fn test_server_errors_use_generic_envelope() {
        let panic = OasError::Panic {
            message: "index out of bounds".to_string(),
        };
        assert_eq!(panic.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = panic.to_body();
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(body["details"], "endpoint handler panicked");
        assert!(!body.to_string().contains("index out of bounds"));

        let internal = OasError::internal("database unavailable");
        assert_eq!(internal.to_body()["details"], "database unavailable");
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: OasError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, OasError::Internal { .. }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&err).is_some());
    }
}
