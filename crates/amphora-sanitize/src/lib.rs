//! Sanitization passes and the conformance validator for the amphora
//! pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **Sanitizer contract** — the [`Sanitizer`] trait and the [`Stage`]
//!   ordering enum every pass declares itself under
//! - **Pipeline** — the validated, strictly sequential sanitizer chain;
//!   the builder refuses misordered configurations instead of re-sorting
//!   them quietly
//! - **Context** — [`PipelineContext`], the per-invocation accumulator for
//!   errors, scripts, and styles; nothing in it outlives one response
//! - **Collector / reporter** — script merge by handle, style dedup by
//!   content hash, the advisory stylesheet cache, and blocking-count
//!   resolution over deduplicated errors
//! - **Passes** — media conversion, noscript/form/comment normalization,
//!   stylesheet extraction and tree-shaking, head metadata, accessibility,
//!   dev-mode marking, and the tag/attribute conformance validator that
//!   always runs last
//!
//! Every pass mutates the shared [`amphora_dom::Document`] in place and
//! reports each correction as a [`ValidationError`]. Content-level problems
//! never become Rust errors; the only fallible operation here is building a
//! pipeline from a misordered registration list.

/// Script and style collection, plus the advisory stylesheet cache.
pub mod collect;
/// The per-invocation pipeline context.
pub mod context;
/// The validation error record.
pub mod error;
/// The ordered pipeline and its validating builder.
pub mod pipeline;
/// Registry mapping sanitizer ids and opaque args to pass instances.
pub mod registry;
/// Error deduplication and blocking-count resolution.
pub mod report;
/// The sanitizer trait and stage enum.
pub mod sanitizer;
/// The sanitizer implementations.
pub mod sanitizers;

pub use collect::{
    AssetCollector, CDN_BASE, ProcessedCss, RENDER_DELAYING_EXTENSIONS, RUNTIME_HANDLE,
    ScriptAsset, ScriptKind, StyleRule, StylesheetCache, content_hash,
};
pub use context::PipelineContext;
pub use error::ValidationError;
pub use pipeline::{PipelineBuildError, PipelineBuilder, SanitizerPipeline};
pub use registry::{build_pipeline, build_sanitizer, default_pipeline, default_registrations};
pub use report::{ErrorStatus, ValidationReporter};
pub use sanitizer::{Sanitizer, Stage};

/// The attribute marking a dev-mode subtree the validator passes through
/// unvalidated. `data-*` attributes are globally valid, so the marker itself
/// never trips the validator.
pub const DEV_MODE_ATTR: &str = "data-ampdevmode";
