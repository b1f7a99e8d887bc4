//! The validation error record produced by sanitization passes.
//!
//! Every correction a pass applies to the document is mirrored by exactly one
//! [`ValidationError`] written into the pipeline context. The record is
//! immutable after creation; whether it blocks the response is decided later
//! by the reporter's externally-resolved statuses, never by the pass that
//! created it.

use amphora_spec::{ErrorCode, Severity, SpecTable};

/// One correction applied by a sanitization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The taxonomy code.
    pub code: ErrorCode,
    /// Template parameters as ordered name/value pairs. Order matches the
    /// `%1..%9` placeholders in the catalog message.
    pub params: Vec<(String, String)>,
    /// Severity from the catalog. `Warning` entries never block.
    pub severity: Severity,
    /// Tie-break specificity from the catalog; lower is more specific.
    pub specificity: u32,
    /// Element path of the corrected node, `/html/body/div[2]` form.
    pub node_path: String,
}

impl ValidationError {
    /// Build an error record, resolving severity and specificity from the
    /// embedded catalog. A code missing from the catalog (a build-data
    /// defect) degrades to `Error` severity with the weakest specificity.
    #[must_use]
    pub fn new(code: ErrorCode, params: &[(&str, &str)], node_path: &str) -> Self {
        let (severity, specificity) = SpecTable::shared()
            .error_template(code)
            .map_or((Severity::Error, u32::MAX), |t| (t.severity, t.specificity));
        ValidationError {
            code,
            params: params
                .iter()
                .map(|&(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            severity,
            specificity,
            node_path: node_path.to_string(),
        }
    }

    /// Render the human-readable message from the catalog template, filling
    /// `%1..%9` with the parameter values in order.
    #[must_use]
    pub fn message(&self) -> String {
        let values: Vec<&str> = self.params.iter().map(|(_, v)| v.as_str()).collect();
        SpecTable::shared()
            .error_template(self.code)
            .map_or_else(|| self.code.to_string(), |t| t.render(&values))
    }
}
