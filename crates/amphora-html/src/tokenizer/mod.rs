//! HTML tokenizer module.
//!
//! Implements a pragmatic subset of
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! of the WHATWG HTML Living Standard, sufficient for server-rendered
//! documents: tag, attribute, comment, DOCTYPE, and raw-text states.
//! Character references are not decoded.

/// HTML tokenizer state machine implementation.
pub mod core;
/// Token types produced by the tokenizer.
pub mod token;

pub use core::Tokenizer;
pub use token::{Attribute, Token};
