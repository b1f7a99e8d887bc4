//! The validate-mode JSON report.
//!
//! Validate requests get the deduplicated error set as structured JSON
//! instead of the repaired HTML. Each entry carries the taxonomy code, the
//! rendered message, the template parameters flattened alongside it, and
//! whether the correction is already resolved.

use std::collections::BTreeMap;

use amphora_sanitize::{ErrorStatus, ValidationError, ValidationReporter};
use amphora_spec::{ErrorCode, Severity};
use serde::Serialize;

/// One reported error in the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateError {
    /// Taxonomy code, `SCREAMING_SNAKE_CASE` on the wire.
    pub code: ErrorCode,
    /// Catalog severity.
    pub severity: Severity,
    /// Rendered human-readable message.
    pub message: String,
    /// Element path of the corrected node.
    pub node_path: String,
    /// Template parameters, flattened into the error object.
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

/// One result row: the error plus its resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateResult {
    /// The reported error.
    pub error: ValidateError,
    /// Whether this correction no longer blocks: warnings always, errors
    /// once their status resolves to accepted.
    pub sanitized: bool,
}

/// The whole validate-mode response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateReport {
    /// One row per unique error, in first-emission order.
    pub results: Vec<ValidateResult>,
    /// The document URL the request named, empty when none was given.
    pub url: String,
    /// What was validated: `document` or `fragment`.
    pub queried_object: String,
}

impl ValidateReport {
    /// Build the report from a finished reporter, resolving each
    /// error-severity entry through `resolver`.
    pub fn from_reporter<F>(
        reporter: &ValidationReporter,
        mut resolver: F,
        url: &str,
        queried_object: &str,
    ) -> Self
    where
        F: FnMut(ErrorCode, &[(String, String)]) -> ErrorStatus,
    {
        let results = reporter
            .errors()
            .iter()
            .map(|error| {
                let sanitized = error.severity == Severity::Warning
                    || resolver(error.code, &error.params) == ErrorStatus::Accepted;
                ValidateResult {
                    error: wire_error(error),
                    sanitized,
                }
            })
            .collect();
        ValidateReport {
            results,
            url: url.to_string(),
            queried_object: queried_object.to_string(),
        }
    }

    /// Number of rows still blocking: unsanitized error-severity entries.
    #[must_use]
    pub fn blocking(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.error.severity == Severity::Error && !r.sanitized)
            .count()
    }
}

fn wire_error(error: &ValidationError) -> ValidateError {
    ValidateError {
        code: error.code,
        severity: error.severity,
        message: error.message(),
        node_path: error.node_path.clone(),
        params: error
            .params
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> ValidationReporter {
        ValidationReporter::from_errors(vec![
            ValidationError::new(
                ErrorCode::DisallowedTag,
                &[("node_name", "marquee")],
                "/html/body/marquee",
            ),
            ValidationError::new(
                ErrorCode::MissingLayoutDimensions,
                &[("node_name", "amp-img")],
                "/html/body/amp-img",
            ),
        ])
    }

    #[test]
    fn test_warnings_are_always_sanitized() {
        let report = ValidateReport::from_reporter(
            &reporter(),
            |_, _| ErrorStatus::New,
            "https://example.com/",
            "document",
        );
        assert_eq!(report.results.len(), 2);
        assert!(!report.results[0].sanitized);
        assert!(report.results[1].sanitized);
        assert_eq!(report.blocking(), 1);
    }

    #[test]
    fn test_accepted_errors_are_sanitized() {
        let report =
            ValidateReport::from_reporter(&reporter(), |_, _| ErrorStatus::Accepted, "", "document");
        assert!(report.results.iter().all(|r| r.sanitized));
        assert_eq!(report.blocking(), 0);
    }

    #[test]
    fn test_wire_shape() {
        let report = ValidateReport::from_reporter(
            &reporter(),
            |_, _| ErrorStatus::New,
            "https://example.com/",
            "document",
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["url"], "https://example.com/");
        assert_eq!(value["queried_object"], "document");
        let first = &value["results"][0];
        assert_eq!(first["error"]["code"], "DISALLOWED_TAG");
        assert_eq!(first["error"]["severity"], "error");
        assert_eq!(first["error"]["node_name"], "marquee");
        assert_eq!(first["error"]["message"], "The tag 'marquee' is disallowed.");
        assert_eq!(first["sanitized"], false);
    }
}
