//! Ordered sanitizer chains with a validating builder.
//!
//! Ordering is a first-class contract: embed conversion must precede
//! validation, style collection must precede head repair, and the
//! conformance validator must come last so it judges the final tree. The
//! builder enforces all of that structurally instead of trusting callers to
//! register passes in the right sequence.

use amphora_dom::Document;
use thiserror::Error;

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Why a pipeline configuration was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineBuildError {
    /// A pass is registered after a pass of a later stage.
    #[error("sanitizer '{later}' (stage {later_stage}) cannot run after '{earlier}' (stage {earlier_stage})")]
    StageOrder {
        /// The earlier pass.
        earlier: &'static str,
        /// Its stage.
        earlier_stage: Stage,
        /// The misplaced later pass.
        later: &'static str,
        /// Its stage.
        later_stage: Stage,
    },
    /// The final pass is not the conformance validator.
    #[error("pipeline must end with a conformance-stage sanitizer, found '{last}' (stage {last_stage})")]
    MissingConformanceTail {
        /// The final pass found.
        last: &'static str,
        /// Its stage.
        last_stage: Stage,
    },
    /// No passes were registered.
    #[error("pipeline has no sanitizers")]
    Empty,
}

/// Accumulates passes, then validates the ordering contract.
#[derive(Default)]
pub struct PipelineBuilder {
    sanitizers: Vec<Box<dyn Sanitizer>>,
}

impl PipelineBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        PipelineBuilder::default()
    }

    /// Append a pass.
    pub fn push(&mut self, sanitizer: impl Sanitizer + 'static) {
        self.sanitizers.push(Box::new(sanitizer));
    }

    /// Append an already-boxed pass, as produced by the registry.
    pub fn push_boxed(&mut self, sanitizer: Box<dyn Sanitizer>) {
        self.sanitizers.push(sanitizer);
    }

    /// Validate the ordering contract and produce the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineBuildError`] when the builder is empty, when stages
    /// are not in non-decreasing order, or when the final pass is not at
    /// [`Stage::Conformance`].
    pub fn build(self) -> Result<SanitizerPipeline, PipelineBuildError> {
        let Some(last) = self.sanitizers.last() else {
            return Err(PipelineBuildError::Empty);
        };
        if last.stage() != Stage::Conformance {
            return Err(PipelineBuildError::MissingConformanceTail {
                last: last.name(),
                last_stage: last.stage(),
            });
        }
        for pair in self.sanitizers.windows(2) {
            if pair[0].stage() > pair[1].stage() {
                return Err(PipelineBuildError::StageOrder {
                    earlier: pair[0].name(),
                    earlier_stage: pair[0].stage(),
                    later: pair[1].name(),
                    later_stage: pair[1].stage(),
                });
            }
        }
        Ok(SanitizerPipeline {
            sanitizers: self.sanitizers,
        })
    }
}

/// A validated, ordered chain of sanitization passes.
pub struct SanitizerPipeline {
    sanitizers: Vec<Box<dyn Sanitizer>>,
}

impl SanitizerPipeline {
    /// Construct without validation. Reserved for chains whose ordering is
    /// correct by construction (the built-in default chain).
    pub(crate) fn from_vec(sanitizers: Vec<Box<dyn Sanitizer>>) -> Self {
        SanitizerPipeline { sanitizers }
    }

    /// Run every pass in order, strictly sequentially.
    pub fn run(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        for sanitizer in &self.sanitizers {
            sanitizer.sanitize(doc, ctx);
        }
    }

    /// Number of passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sanitizers.len()
    }

    /// Whether the pipeline has no passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sanitizers.is_empty()
    }

    /// Pass names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.sanitizers.iter().map(|s| s.name()).collect()
    }
}
