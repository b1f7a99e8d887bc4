//! Response assembly for the amphora pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **ResponseAssembler** — the per-response state machine: parse the raw
//!   input, run the sanitizer pipeline, repair the required markup, and
//!   decide the failure-mode output
//! - **Markup repair** — the head ordering contract: charset and viewport
//!   metas, preconnect and preload hints, the runtime and extension script
//!   block in its mandated order, the aggregated `<style amp-custom>`, and
//!   the boilerplate
//! - **Runtime version config** — optional fetch of the AMP runtime version
//!   metadata to pin CDN URLs, with a bounded timeout and a bundled
//!   unversioned fallback so a remote failure never fails a request
//! - **Validate-mode report** — the structured JSON error report returned
//!   instead of HTML for validate requests
//!
//! The head ordering and script-loading order are a hard external contract
//! of the AMP runtime; any deviation there is a correctness bug, not a
//! style choice.

/// The response state machine.
pub mod assembler;
/// Required-markup repair and the script ordering contract.
pub mod repair;
/// Runtime version metadata with bundled fallback.
pub mod rtv;
/// The validate-mode JSON report.
pub mod validate;

pub use assembler::{
    AssembleError, AssemblyState, AssemblySummary, Response, ResponseAssembler, StatusResolver,
    TransformOptions,
};
pub use repair::{BOILERPLATE_CSS, BOILERPLATE_NOSCRIPT_CSS, RepairOptions, repair_markup};
pub use validate::{ValidateError, ValidateReport, ValidateResult};
