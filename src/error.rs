// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Each error variant tells the story of what went wrong and where,
//! enabling composable recovery strategies.

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system. Each variant
/// tells you exactly what the Notion API reported and enables
/// pattern-based recovery without stringly-typed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded — back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            other => Self::HttpStatus(other),
        }
    }

    /// Whether this error means the caller's credentials are the problem.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::RestrictedResource)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: u16,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse workspace spec at {}: {}", .path.display(), .source)]
    SpecParse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Workspace specification is incompatible with the Notion API ({} errors)", errors.len())]
    IncompatibleSpec {
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    #[error("Could not find a suitable parent page in the Notion workspace: {0}")]
    ParentPageDiscovery(String),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether this failure is rate-limit related and therefore worth
    /// retrying with backoff. Matches the 429 status, the typed
    /// `rate_limited` code, and rate-limit wording in the message —
    /// the Notion API is not consistent about which one it sends.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            AppError::NotionService {
                code,
                message,
                status,
            } => {
                *status == 429
                    || *code == NotionErrorCode::RateLimited
                    || message.to_ascii_lowercase().contains("rate limit")
            }
            AppError::NetworkFailure(e) => {
                e.status().map(|s| s.as_u16() == 429).unwrap_or(false)
            }
            _ => false,
        }
    }
}

// Allow converting from anyhow::Error, preserving error chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Domain vocabulary for why a deployment failed.
///
/// This is not an error type — it's a classification of the failure
/// reason, enabling an actionable user-facing message (an auth problem
/// needs different remediation than a rate-limit exhaustion or a spec
/// the Notion API rejects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployFailure {
    /// Credentials missing, expired, or lacking access to the target page.
    AuthOrConnection,
    /// Backoff retries were exhausted against the API rate limit.
    RateLimitExhausted,
    /// The workspace spec itself is something Notion won't accept.
    IncompatibleSpec,
    /// Anything else.
    Other,
}

impl DeployFailure {
    /// A remediation hint suitable for direct display to the user.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AuthOrConnection => {
                "Please check your Notion integration settings. Ensure NOTION_API_KEY is set \
                 and the integration has been granted access to the target page."
            }
            Self::RateLimitExhausted => {
                "Notion API rate limit exceeded. Please try again in a few minutes. For complex \
                 workspaces, consider that Notion has strict rate limits on database creation \
                 (~3 requests per second)."
            }
            Self::IncompatibleSpec => {
                "Please check the workspace specification for compatibility issues with the \
                 Notion API."
            }
            Self::Other => "Please check the log file for details and try again.",
        }
    }

    /// The Notion developer documentation page most relevant to this failure.
    pub fn docs_url(&self) -> &'static str {
        match self {
            Self::AuthOrConnection => "https://developers.notion.com/docs/authorization",
            Self::RateLimitExhausted => {
                "https://developers.notion.com/reference/status-codes#rate-limits"
            }
            Self::IncompatibleSpec | Self::Other => {
                "https://developers.notion.com/reference/property-value-object"
            }
        }
    }
}

/// Classifies a deployment error into a domain-specific failure reason.
///
/// This is a pure function that examines the error structure to determine
/// whether the failure is an auth/connection problem, a rate-limit
/// exhaustion, or a spec the API rejected.
pub fn classify_deploy_failure(error: &AppError) -> DeployFailure {
    if error.is_rate_limited() {
        return DeployFailure::RateLimitExhausted;
    }
    match error {
        AppError::MissingConfiguration(_) => DeployFailure::AuthOrConnection,
        AppError::NetworkFailure(_) => DeployFailure::AuthOrConnection,
        AppError::NotionService { code, .. } if code.is_auth_failure() => {
            DeployFailure::AuthOrConnection
        }
        AppError::NotionService { code, .. } if *code == NotionErrorCode::ValidationFailed => {
            DeployFailure::IncompatibleSpec
        }
        AppError::IncompatibleSpec { .. } => DeployFailure::IncompatibleSpec,
        _ => DeployFailure::Other,
    }
}

/// Result type alias for convenience
#[allow(dead_code)]
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn service_error(code: NotionErrorCode, status: u16, message: &str) -> AppError {
        AppError::NotionService {
            code,
            message: message.to_string(),
            status,
        }
    }

    #[test]
    fn rate_limit_classification() {
        assert!(service_error(NotionErrorCode::RateLimited, 429, "slow down").is_rate_limited());
        assert!(service_error(NotionErrorCode::Unknown("x".into()), 429, "x").is_rate_limited());
        assert!(service_error(
            NotionErrorCode::Unknown("x".into()),
            400,
            "Rate limit exceeded"
        )
        .is_rate_limited());
        assert!(
            !service_error(NotionErrorCode::ValidationFailed, 400, "bad body").is_rate_limited()
        );
    }

    #[test]
    fn deploy_failure_classification() {
        let rate = service_error(NotionErrorCode::RateLimited, 429, "slow down");
        assert_eq!(
            classify_deploy_failure(&rate),
            DeployFailure::RateLimitExhausted
        );

        let auth = service_error(NotionErrorCode::Unauthorized, 401, "bad token");
        assert_eq!(
            classify_deploy_failure(&auth),
            DeployFailure::AuthOrConnection
        );

        let spec = AppError::IncompatibleSpec {
            errors: vec!["bad property".to_string()],
            warnings: vec![],
        };
        assert_eq!(
            classify_deploy_failure(&spec),
            DeployFailure::IncompatibleSpec
        );
    }
}
