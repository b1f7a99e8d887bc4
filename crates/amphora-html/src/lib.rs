//! Tolerant HTML tokenizer, tree builder, and serializer for the Amphora
//! pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RAWTEXT, tag, attribute, comment, and DOCTYPE states
//!   - Raw-text element handling for `script`, `style`, `title`, `textarea`
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Insertion modes: Initial, BeforeHtml, BeforeHead, InHead, AfterHead,
//!     InBody, AfterBody
//!   - Implied html/head/body synthesis and stray end tag recovery
//! - **Serializer** ([WHATWG § 13.3](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments))
//!   - Full-document and body-fragment modes, void and raw-text elements
//!
//! # Not Yet Implemented
//!
//! - Character reference decoding: entities pass through untouched in both
//!   directions, so serializing a parsed document is a fixed point
//! - Table foster parenting and the adoption agency algorithm
//! - CDATA sections (lexed as bogus comments)

/// Tree construction from the token stream.
pub mod parser;
/// Document and fragment serialization.
pub mod serializer;
/// Void and raw-text element classification.
pub mod tags;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

use amphora_dom::Document;
use thiserror::Error;

pub use parser::{InsertionMode, ParseIssue, TreeBuilder};
pub use serializer::{SerializeMode, serialize};
pub use tokenizer::{Attribute, Token, Tokenizer};

/// Failure to construct any document tree from the input.
///
/// Recoverable markup errors never produce this; the tree builder synthesizes
/// missing structure and skips stray tokens. Only input from which no tree
/// can be built at all fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    /// The input contained nothing to parse.
    #[error("input is empty, no document could be constructed")]
    EmptyInput,
}

/// Parse a full HTML document into a tree, discarding recoverable parse
/// issues.
///
/// # Errors
/// Returns [`ParseFailure::EmptyInput`] if the input is empty or whitespace
/// only.
pub fn parse_document(html: &str) -> Result<Document, ParseFailure> {
    parse_document_with_issues(html).map(|(document, _)| document)
}

/// Parse a full HTML document, also returning the recoverable parse issues
/// encountered along the way. Issue collection exists for diagnostics; the
/// pipeline itself never surfaces these.
///
/// # Errors
/// Returns [`ParseFailure::EmptyInput`] if the input is empty or whitespace
/// only.
pub fn parse_document_with_issues(
    html: &str,
) -> Result<(Document, Vec<ParseIssue>), ParseFailure> {
    if html.trim().is_empty() {
        return Err(ParseFailure::EmptyInput);
    }
    let mut tokenizer = Tokenizer::new(html.to_string());
    tokenizer.run();
    let builder = TreeBuilder::new(tokenizer.into_tokens());
    Ok(builder.run_with_issues())
}

/// Parse an HTML fragment by wrapping it in a minimal document skeleton
/// (doctype, html, head with charset meta, body) so fragment-mode callers get
/// a valid subtree rooted under body.
///
/// # Errors
/// Never fails for non-empty wrappers; kept fallible for parity with
/// [`parse_document`] callers that treat both modes uniformly.
pub fn parse_fragment(html: &str) -> Result<Document, ParseFailure> {
    let wrapped = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{html}</body></html>"
    );
    parse_document(&wrapped)
}
