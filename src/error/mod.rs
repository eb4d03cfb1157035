//! Error types for opscan.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors fall into five categories:
//! - **Validation**: missing or invalid caller input, caught before any
//!   network activity
//! - **Authentication**: bad credentials, failed token refresh, or a 401
//!   that survived the refresh-and-retry policy
//! - **Network**: connection failures, DNS errors, transport timeouts
//! - **Protocol**: unexpected HTTP statuses or unparseable response bodies
//! - **Analysis**: outcomes of the analysis job itself (server-reported
//!   failure, polling timeout, poll budget exhausted)
//!
//! Errors that relate to a submitted job carry its UUID so callers can
//! resume with a later `status`/`issues` query.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid caller input (empty bytecode, bad URL, missing credentials).
    Validation,
    /// Credential or token lifecycle failures.
    Authentication,
    /// Connection, DNS, or transport-level failures.
    Network,
    /// Unexpected HTTP statuses or malformed response bodies.
    Protocol,
    /// Analysis job outcomes (failed job, poll timeout, poll budget spent).
    Analysis,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Protocol => "Protocol error",
            Self::Analysis => "Analysis error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for the `opscan` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid input or missing credentials
    UsageError = 2,
    /// Unparseable or unexpected server response
    ParseError = 3,
    /// Poll timeout or poll budget exhausted
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Main error type for opscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Validation errors (Category: Validation)
    // ==========================================================================
    /// Missing or invalid caller input, raised before any network activity.
    #[error("validation error: {0}")]
    Validation(String),

    // ==========================================================================
    // Authentication errors (Category: Authentication)
    // ==========================================================================
    /// Login was rejected or a token refresh failed. Never retried.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A resource call returned HTTP 401. Handled internally by the
    /// refresh-and-retry policy; surfaced only when the retry also fails.
    #[error("unauthorized (HTTP 401): {context}")]
    Unauthorized {
        context: String,
    },

    // ==========================================================================
    // Analysis errors (Category: Analysis)
    // ==========================================================================
    /// The timeout budget elapsed before the job reached a terminal state.
    #[error(
        "timeout reached after {elapsed}; the analysis job is {status} \
         and the result may become available later (UUID: {uuid})"
    )]
    Timeout {
        elapsed: String,
        status: String,
        uuid: String,
    },

    /// All poll attempts were spent without the job reaching a terminal
    /// state. Deliberately distinct from [`Error::Timeout`] so callers can
    /// tell which bound was hit.
    #[error(
        "no result after {attempts} status checks over {elapsed}; the analysis job is \
         {status} and the result may become available later (UUID: {uuid})"
    )]
    MaxPollsExceeded {
        attempts: u32,
        elapsed: String,
        status: String,
        uuid: String,
    },

    /// The server reported the analysis job itself as failed.
    #[error("analysis failed on the server (UUID: {uuid})")]
    AnalysisFailed {
        uuid: String,
    },

    // ==========================================================================
    // Protocol errors (Category: Protocol)
    // ==========================================================================
    /// The server returned a 5xx status.
    #[error("server error (HTTP {status}): {context}")]
    ServerError {
        status: u16,
        context: String,
    },

    /// A non-401/5xx error status (400, 413, 429, ...), surfaced as-is.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// Response body was not JSON or lacked an expected field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Connection failure, unresolved host, or transport timeout.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // I/O errors (Category: Validation, CLI file inputs)
    // ==========================================================================
    /// I/O operation failed (reading a bytecode file for the CLI).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map error to exit code for the CLI.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) | Self::Io(_) => ExitCode::UsageError,

            Self::MalformedResponse(_) => ExitCode::ParseError,

            Self::Timeout { .. } | Self::MaxPollsExceeded { .. } => ExitCode::Timeout,

            Self::AuthenticationFailed(_)
            | Self::Unauthorized { .. }
            | Self::AnalysisFailed { .. }
            | Self::ServerError { .. }
            | Self::Api { .. }
            | Self::Network(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Io(_) => ErrorCategory::Validation,

            Self::AuthenticationFailed(_) | Self::Unauthorized { .. } => {
                ErrorCategory::Authentication
            }

            Self::Timeout { .. } | Self::MaxPollsExceeded { .. } | Self::AnalysisFailed { .. } => {
                ErrorCategory::Analysis
            }

            Self::ServerError { .. } | Self::Api { .. } | Self::MalformedResponse(_) => {
                ErrorCategory::Protocol
            }

            Self::Network(_) => ErrorCategory::Network,
        }
    }

    /// Whether a single refresh-and-retry may recover this error.
    ///
    /// True only for [`Error::Unauthorized`]; everything else propagates.
    #[must_use]
    pub const fn is_refreshable(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_errors_map_to_timeout_exit_code() {
        let err = Error::Timeout {
            elapsed: "15 milliseconds".to_string(),
            status: "in progress".to_string(),
            uuid: "abc-123".to_string(),
        };
        assert_eq!(err.exit_code(), ExitCode::Timeout);
        assert_eq!(err.category(), ErrorCategory::Analysis);
    }

    #[test]
    fn timeout_message_carries_uuid_and_elapsed() {
        let err = Error::Timeout {
            elapsed: "2 minutes, 1 second".to_string(),
            status: "queued".to_string(),
            uuid: "abc-123".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc-123"), "missing uuid: {msg}");
        assert!(msg.contains("2 minutes, 1 second"), "missing elapsed: {msg}");
        assert!(msg.contains("queued"), "missing status: {msg}");
    }

    #[test]
    fn max_polls_message_is_distinct_from_timeout() {
        let timeout = Error::Timeout {
            elapsed: "30 seconds".to_string(),
            status: "queued".to_string(),
            uuid: "u".to_string(),
        };
        let exhausted = Error::MaxPollsExceeded {
            attempts: 10,
            elapsed: "30 seconds".to_string(),
            status: "queued".to_string(),
            uuid: "u".to_string(),
        };
        assert_ne!(timeout.to_string(), exhausted.to_string());
        assert_eq!(exhausted.exit_code(), ExitCode::Timeout);
    }

    #[test]
    fn only_unauthorized_is_refreshable() {
        assert!(
            Error::Unauthorized {
                context: "status query".to_string()
            }
            .is_refreshable()
        );
        assert!(!Error::AuthenticationFailed("bad password".to_string()).is_refreshable());
        assert!(
            !Error::ServerError {
                status: 503,
                context: "status query".to_string()
            }
            .is_refreshable()
        );
    }

    #[test]
    fn validation_maps_to_usage_exit_code() {
        let err = Error::Validation("bytecode must not be empty".to_string());
        assert_eq!(err.exit_code(), ExitCode::UsageError);
        assert_eq!(i32::from(err.exit_code()), 2);
    }
}
