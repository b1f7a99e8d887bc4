//! CSS tokenizer module.

/// CSS tokenizer implementation per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod core;
/// CSS token types per [CSS Syntax Level 3 § 4](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod token;

pub use core::CssTokenizer;
pub use token::{CssToken, HashType, NumericType};
