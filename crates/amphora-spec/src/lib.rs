//! Embedded conformance rules for the amphora pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **Tag-spec table** — per-tag attribute, ancestry, child, and layout
//!   rules deserialized from an embedded JSON table, modeled on the
//!   [AMP validator rules](https://github.com/ampproject/amphtml/blob/main/validator/validator-main.protoascii)
//!   but trimmed to the tags this pipeline emits
//! - **Layout model** — the
//!   [AMP layout system](https://amp.dev/documentation/guides-and-tutorials/learn/amp-html-layout/):
//!   layout names, the implied-layout computation, and which layouts
//!   need definite dimensions
//! - **Error catalog** — stable validation error codes with message
//!   templates, specificity ranks, and severities
//!
//! The table is data, not policy: deciding what to do about a violation
//! (reject the document, strip the node, downgrade to a warning) happens in
//! the sanitization pipeline. This crate only answers "what does the rule
//! set say about this tag".
//!
//! The embedded table parses at first use; [`SpecTable::load`] exposes the
//! fallible path for callers that bring their own rule file.

/// Validation error codes, severities, and message templates.
pub mod error;
/// Layout names and the implied-layout computation.
pub mod layout;
/// The tag-spec table and its loader.
pub mod table;

pub use error::{ErrorCode, ErrorTemplate, Severity};
pub use layout::Layout;
pub use table::{AttrSpec, ChildConstraints, ChildCount, SpecLoadError, SpecTable, TagSpec};
