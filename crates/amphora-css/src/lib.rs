//! CSS tokenizer, rule parser, and compact serializer for the amphora pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - All token types: ident, function, at-keyword, hash, string, url, number, dimension, etc.
//!   - Comment handling
//!   - Escape sequences (decoded on input, re-escaped on output)
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Stylesheet parsing (style rules and at-rules)
//!   - Typed at-rule blocks: nested rule lists for `@media`/`@supports`/
//!     `@keyframes`, declaration lists for `@font-face`/`@page`
//!   - Declaration-list parsing for `style` attribute content
//!   - `!important` detection and stripping
//!
//! - **Selector references** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - The class/id/type names a selector requires before it can match,
//!     for document-driven rule pruning
//!
//! - **Serialization** ([§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization))
//!   - Compact re-emission of parsed rules as CSS text
//!
//! Everything here is pure syntax. Which at-rules, properties, or selectors a
//! target format allows — and what to do about violations — is the caller's
//! policy, decided elsewhere in the pipeline.
//!
//! Tokenizer and parser never fail: malformed input degrades to
//! `BadString`/`BadUrl` tokens or dropped constructs per the spec's error
//! recovery rules, so a hostile stylesheet can cost work but not an error
//! path.

/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Selector reference extraction per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Compact serialization per [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization).
pub mod serialize;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;

// Re-exports for convenience
pub use parser::{
    AtRule, AtRuleBlock, ComponentValue, CssParser, Declaration, Rule, Selector, StyleRule,
    Stylesheet,
};
pub use selector::{SelectorRefs, selector_refs};
pub use serialize::{
    at_rule_to_css, declarations_to_css, rule_to_css, style_rule_to_css, stylesheet_to_css,
};
pub use tokenizer::{CssToken, CssTokenizer, HashType, NumericType};

/// Tokenize and parse a stylesheet.
///
/// The combined [§ 5.3.2 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
/// entry point for `<style>` element content.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut tokenizer = CssTokenizer::new(css);
    tokenizer.run();
    let mut parser = CssParser::new(tokenizer.into_tokens());
    parser.parse_stylesheet()
}

/// Tokenize and parse a declaration list.
///
/// The [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
/// entry point for `style` attribute content.
#[must_use]
pub fn parse_declarations(css: &str) -> Vec<Declaration> {
    let mut tokenizer = CssTokenizer::new(css);
    tokenizer.run();
    let mut parser = CssParser::new(tokenizer.into_tokens());
    parser.parse_declaration_list()
}
