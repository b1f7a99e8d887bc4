//! Per-invocation pipeline state.

use crate::collect::AssetCollector;
use crate::error::ValidationError;
use crate::report::ValidationReporter;

/// State owned by one pipeline invocation and discarded after the response
/// is serialized. No sanitization result outlives the context; the only
/// cross-request state in the system is the advisory stylesheet cache.
#[derive(Debug, Default)]
pub struct PipelineContext {
    errors: Vec<ValidationError>,
    collector: AssetCollector,
    dev_mode: bool,
}

impl PipelineContext {
    /// Create a fresh context.
    #[must_use]
    pub fn new() -> Self {
        PipelineContext::default()
    }

    /// Append one error record. Passes call this for every correction they
    /// apply; duplicates are collapsed later by the reporter.
    pub fn record(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Errors recorded so far, in emission order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The asset collector.
    #[must_use]
    pub fn collector(&self) -> &AssetCollector {
        &self.collector
    }

    /// The asset collector, mutably.
    pub fn collector_mut(&mut self) -> &mut AssetCollector {
        &mut self.collector
    }

    /// Whether dev mode is active for this document.
    #[must_use]
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Mark dev mode active.
    pub fn set_dev_mode(&mut self, on: bool) {
        self.dev_mode = on;
    }

    /// Consume the context into the deduplicating reporter and the collected
    /// assets, for response assembly.
    #[must_use]
    pub fn finish(self) -> (ValidationReporter, AssetCollector) {
        (ValidationReporter::from_errors(self.errors), self.collector)
    }
}
