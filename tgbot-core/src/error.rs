use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort the call in progress. API-level failures are not here: they travel as
/// [`ApiResult`] values so callers can match on them.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON did not have the shape a decoder expected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field `{field}`: {reason}")]
pub struct SchemaError {
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: "missing required field".to_string(),
        }
    }

    pub fn mismatch(field: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Extra hints the server attaches to some failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
}

/// The server answered `"ok": false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct ApiError {
    pub description: String,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Description used when a poll found nothing to deliver.
pub const NO_UPDATES: &str = "no results available";

impl ApiError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            error_code: None,
            parameters: None,
        }
    }

    pub fn no_updates() -> Self {
        Self::new(NO_UPDATES)
    }

    pub fn is_no_updates(&self) -> bool {
        self.error_code.is_none() && self.description == NO_UPDATES
    }
}

/// Outcome of one API call as seen by continuations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_result_combinators() {
        let ok: ApiResult<i64> = Ok(2);
        let failed: ApiResult<i64> = Err(ApiError::new("Bad Request: chat not found"));

        assert_eq!(ok.clone().map(|v| v * 10), Ok(20));
        assert_eq!(failed.clone().unwrap_or(7), 7);
        assert_eq!(ok.and_then(|v| Ok::<_, ApiError>(v + 1)), Ok(3));
        assert_eq!(
            failed.and_then(|v| Ok::<_, ApiError>(v + 1)).unwrap_err().description,
            "Bad Request: chat not found"
        );
    }

    #[test]
    fn test_no_updates_sentinel() {
        assert!(ApiError::no_updates().is_no_updates());
        assert_eq!(ApiError::no_updates().to_string(), "no results available");
        assert!(!ApiError::new("Unauthorized").is_no_updates());
    }

    #[test]
    fn test_schema_error_display_names_field() {
        let err = SchemaError::missing("update_id");
        assert_eq!(err.to_string(), "field `update_id`: missing required field");
    }
}
