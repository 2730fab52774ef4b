//! Error types for the kbrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The store and resolver
//! raise these inward; the answer pipeline and the request façade turn them
//! into text before anything reaches a caller.

use thiserror::Error;

use crate::company::DocumentKind;

/// The top-level error type for all kbrelay operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A company identifier failed the sandboxing rule.
    #[error("Invalid company identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// A required document does not exist.
    #[error("{kind} document for company '{company}' was not found")]
    NotFound { company: String, kind: DocumentKind },

    /// The upstream model API failed, whatever the cause.
    #[error("Model call failed: {0}")]
    ModelCallFailure(#[from] ProviderError),

    /// A malformed request at the façade boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem failure other than a missing file.
    #[error("Storage error at {path}: {reason}")]
    Storage { path: String, reason: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Short machine-friendly tag, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::ModelCallFailure(_) => "model_call_failure",
            Self::Validation(_) => "validation",
            Self::Storage { .. } => "storage",
        }
    }
}

// --- Provider errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
