use crate::domain::model::ValidationFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: String, reason: String },

    #[error("invalid generated query: {reason}")]
    InvalidQuery { reason: ValidationFailure },

    #[error("Data fetch timed out after {attempts} attempt(s) of {timeout_ms}ms")]
    FetchTimeout { attempts: u32, timeout_ms: u64 },

    #[error("Data fetch failed: {message}")]
    FetchError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Query,
    DataSource,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AgentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgentError::InvalidRequest { .. } => ErrorCategory::Request,
            AgentError::InvalidQuery { .. } => ErrorCategory::Query,
            AgentError::FetchTimeout { .. } | AgentError::FetchError { .. } => {
                ErrorCategory::DataSource
            }
            AgentError::ConfigValidationError { .. }
            | AgentError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AgentError::IoError(_)
            | AgentError::SerializationError(_)
            | AgentError::Internal { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request | ErrorCategory::Query => ErrorSeverity::Low,
            ErrorCategory::DataSource => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// HTTP status the boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AgentError::InvalidRequest { .. } => 422,
            AgentError::InvalidQuery { .. } => 400,
            AgentError::FetchTimeout { .. } => 504,
            AgentError::FetchError { .. } => 502,
            _ => 500,
        }
    }

    /// Machine-readable error type used in response bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            AgentError::InvalidRequest { .. } => "invalid_request",
            AgentError::InvalidQuery { .. } => "invalid_query",
            AgentError::FetchTimeout { .. } => "fetch_timeout",
            AgentError::FetchError { .. } => "fetch_error",
            _ => "internal_error",
        }
    }

    /// Message safe to return to a caller. System errors never leak details.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AgentError::InvalidRequest { field, reason } => format!("{} {}", field, reason),
            AgentError::InvalidQuery { reason } => {
                format!("invalid generated query: {}", reason)
            }
            AgentError::FetchTimeout { .. } => {
                "The analytics backend did not answer in time".to_string()
            }
            AgentError::FetchError { .. } => "The analytics backend is unavailable".to_string(),
            AgentError::ConfigValidationError { .. }
            | AgentError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            AgentError::IoError(_)
            | AgentError::SerializationError(_)
            | AgentError::Internal { .. } => "Internal server error".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AgentError::InvalidRequest { .. } => "Send both store_id and question",
            AgentError::InvalidQuery { .. } => {
                "Rephrase the question, e.g. 'top 5 products last 7 days'"
            }
            AgentError::FetchTimeout { .. } => {
                "Retry later or raise fetcher.timeout_ms in the config file"
            }
            AgentError::FetchError { .. } => "Check the analytics backend and retry",
            AgentError::ConfigValidationError { .. }
            | AgentError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and restart"
            }
            AgentError::IoError(_) => "Check file paths and permissions",
            AgentError::SerializationError(_) | AgentError::Internal { .. } => {
                "Check the logs for details"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_maps_to_bad_request() {
        let err = AgentError::InvalidQuery {
            reason: ValidationFailure::MissingFrom,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.category(), ErrorCategory::Query);
        assert!(err.to_string().starts_with("invalid generated query"));
        assert!(err.user_friendly_message().contains("invalid generated query"));
    }

    #[test]
    fn test_system_errors_hide_details() {
        let err = AgentError::Internal {
            message: "entity map was corrupted at 0xdeadbeef".to_string(),
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.user_friendly_message(), "Internal server error");
    }

    #[test]
    fn test_request_errors_are_unprocessable() {
        let err = AgentError::InvalidRequest {
            field: "store_id".to_string(),
            reason: "is required and cannot be blank".to_string(),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_type(), "invalid_request");
        assert_eq!(
            err.user_friendly_message(),
            "store_id is required and cannot be blank"
        );
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = AgentError::FetchTimeout {
            attempts: 3,
            timeout_ms: 200,
        };
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.error_type(), "fetch_timeout");
        assert_eq!(err.category(), ErrorCategory::DataSource);
    }
}
