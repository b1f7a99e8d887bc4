//! Deduplication and blocking-count resolution over collected errors.

use std::collections::HashSet;

use amphora_spec::{ErrorCode, Severity};

use crate::error::ValidationError;

/// Externally-resolved status of one unique error.
///
/// Persistence of these decisions (who accepted what, and when) lives outside
/// the pipeline; the reporter only consumes the verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Never seen before; blocks until someone accepts it.
    New,
    /// Reviewed and accepted; does not block.
    Accepted,
    /// Reviewed and rejected; blocks.
    Rejected,
}

/// The deduplicated error set for one response.
///
/// Built from the raw context errors at the end of a pipeline run. The dedup
/// key is `(code, params, node_path)`, so the same correction applied twice
/// (or reported once per candidate spec) surfaces once.
#[derive(Debug)]
pub struct ValidationReporter {
    errors: Vec<ValidationError>,
}

impl ValidationReporter {
    /// Deduplicate raw errors, keeping first-emission order.
    #[must_use]
    pub fn from_errors(raw: Vec<ValidationError>) -> Self {
        let mut seen: HashSet<(ErrorCode, Vec<(String, String)>, String)> = HashSet::new();
        let mut errors = Vec::new();
        for error in raw {
            let key = (error.code, error.params.clone(), error.node_path.clone());
            if seen.insert(key) {
                errors.push(error);
            }
        }
        ValidationReporter { errors }
    }

    /// The unique errors, in first-emission order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of unique errors (warnings included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Count the errors that block the response.
    ///
    /// The resolver is called once per unique error; an error blocks unless
    /// it resolves to [`ErrorStatus::Accepted`]. Warning-severity entries
    /// never block and are never passed to the resolver.
    pub fn blocking_count<F>(&self, mut resolver: F) -> usize
    where
        F: FnMut(ErrorCode, &[(String, String)]) -> ErrorStatus,
    {
        self.errors
            .iter()
            .filter(|error| error.severity == Severity::Error)
            .filter(|error| resolver(error.code, &error.params) != ErrorStatus::Accepted)
            .count()
    }
}
