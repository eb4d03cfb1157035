//! Wire types shared across the client.
//!
//! The analysis payload and the issues list are deliberately opaque
//! (`serde_json::Value`): the client only inspects `uuid` and `status` on
//! the way in and hands findings back to the caller untouched.

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::error::{Error, Result};

// =============================================================================
// Analysis Status
// =============================================================================

/// Lifecycle states reported by the analysis API.
///
/// Only `Finished` and `Error` are terminal. Unrecognized values are kept
/// verbatim in [`AnalysisStatus::Other`] and treated as non-terminal, so a
/// server rolling out new intermediate states never breaks polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    Queued,
    InProgress,
    Finished,
    Error,
    Other(String),
}

impl AnalysisStatus {
    /// Parse a status string from the API.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Queued" => Self::Queued,
            "In Progress" | "In progress" => Self::InProgress,
            "Finished" => Self::Finished,
            "Error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether polling should stop at this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }

    /// Canonical string form, as the API reports it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "Queued",
            Self::InProgress => "In Progress",
            Self::Finished => "Finished",
            Self::Error => "Error",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Analysis Request
// =============================================================================

/// A payload to submit for analysis.
///
/// Built from bytecode, source, or a raw JSON body. Validation happens here,
/// synchronously, before any network activity.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    payload: Value,
}

impl AnalysisRequest {
    /// Build a request from deployed EVM bytecode (hex string).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the bytecode is empty.
    pub fn from_bytecode(bytecode: impl Into<String>) -> Result<Self> {
        let bytecode = bytecode.into();
        if bytecode.trim().is_empty() {
            return Err(Error::Validation(
                "bytecode must not be empty".to_string(),
            ));
        }
        Ok(Self {
            payload: json!({ "type": "bytecode", "contract": bytecode }),
        })
    }

    /// Build a request from contract source code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the file name or source is empty.
    pub fn from_source(file_name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let source = source.into();
        if file_name.trim().is_empty() {
            return Err(Error::Validation("source file name must not be empty".to_string()));
        }
        if source.trim().is_empty() {
            return Err(Error::Validation("source must not be empty".to_string()));
        }
        Ok(Self {
            payload: json!({
                "type": "source",
                "sources": { file_name: { "source": source } },
            }),
        })
    }

    /// Build a request from a raw JSON body, for payload shapes this client
    /// does not model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body is not a non-empty object.
    pub fn from_json(payload: Value) -> Result<Self> {
        match payload.as_object() {
            Some(map) if !map.is_empty() => Ok(Self { payload }),
            _ => Err(Error::Validation(
                "analysis payload must be a non-empty JSON object".to_string(),
            )),
        }
    }

    /// The JSON body sent to the submission endpoint.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

// =============================================================================
// Submission Receipt
// =============================================================================

/// What the server returns for a submitted analysis: the job id, and
/// sometimes an immediate status (a cache hit comes back already `Finished`).
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// Server-assigned opaque job identifier.
    pub uuid: String,
    /// Status reported at submission time, if any.
    pub status: Option<AnalysisStatus>,
}

// =============================================================================
// List Filter
// =============================================================================

/// Filters for listing past analyses.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Only analyses submitted on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only analyses submitted on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Pagination offset.
    pub offset: Option<u32>,
}

impl ListFilter {
    /// Query-string pairs in the form the API expects.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(AnalysisStatus::parse("Queued"), AnalysisStatus::Queued);
        assert_eq!(AnalysisStatus::parse("In Progress"), AnalysisStatus::InProgress);
        assert_eq!(AnalysisStatus::parse("Finished"), AnalysisStatus::Finished);
        assert_eq!(AnalysisStatus::parse("Error"), AnalysisStatus::Error);
    }

    #[test]
    fn unknown_status_is_kept_and_non_terminal() {
        let status = AnalysisStatus::parse("Preprocessing");
        assert_eq!(status, AnalysisStatus::Other("Preprocessing".to_string()));
        assert!(!status.is_terminal());
    }

    #[test]
    fn only_finished_and_error_are_terminal() {
        assert!(AnalysisStatus::Finished.is_terminal());
        assert!(AnalysisStatus::Error.is_terminal());
        assert!(!AnalysisStatus::Queued.is_terminal());
        assert!(!AnalysisStatus::InProgress.is_terminal());
    }

    #[test]
    fn bytecode_request_rejects_empty_input() {
        assert!(matches!(
            AnalysisRequest::from_bytecode(""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_bytecode("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bytecode_request_builds_expected_body() {
        let request = AnalysisRequest::from_bytecode("0x60606040").unwrap();
        assert_eq!(request.payload()["type"], "bytecode");
        assert_eq!(request.payload()["contract"], "0x60606040");
    }

    #[test]
    fn source_request_builds_expected_body() {
        let request = AnalysisRequest::from_source("Token.sol", "contract Token {}").unwrap();
        assert_eq!(request.payload()["type"], "source");
        assert_eq!(
            request.payload()["sources"]["Token.sol"]["source"],
            "contract Token {}"
        );
    }

    #[test]
    fn raw_request_rejects_non_objects() {
        assert!(AnalysisRequest::from_json(json!([])).is_err());
        assert!(AnalysisRequest::from_json(json!({})).is_err());
        assert!(AnalysisRequest::from_json(json!({"type": "bytecode"})).is_ok());
    }

    #[test]
    fn list_filter_emits_api_parameter_names() {
        let filter = ListFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 31),
            offset: Some(20),
        };
        let query = filter.to_query();
        assert_eq!(
            query,
            vec![
                ("dateFrom", "2026-01-01".to_string()),
                ("dateTo", "2026-01-31".to_string()),
                ("offset", "20".to_string()),
            ]
        );
    }

    #[test]
    fn empty_list_filter_emits_nothing() {
        assert!(ListFilter::default().to_query().is_empty());
    }
}
