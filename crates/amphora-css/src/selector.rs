//! Selector reference extraction per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
//!
//! A document-pruning pass needs to know which class names, ids, and element
//! types a selector requires before it can possibly match. This module walks a
//! selector's token form and collects those references.
//!
//! The extraction is deliberately one-sided: everything inside functional
//! pseudo-classes (`:not(...)`, `:nth-child(...)`) and attribute selectors
//! (`[href^="..."]`) is excluded, because references there are not required
//! for a match — `:not(.foo)` matches precisely when `.foo` is absent. A
//! selector whose references all exist may still never match; a selector
//! missing one of them can never match.

use crate::parser::Selector;
use crate::tokenizer::CssToken;

/// The class names, ids, and element types a selector requires.
///
/// Types are lowercased (type selectors match HTML element names
/// case-insensitively); class and id names keep their case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorRefs {
    /// Class names from `.name` compounds.
    pub classes: Vec<String>,
    /// Id names from `#name` compounds.
    pub ids: Vec<String>,
    /// Element type names, lowercased.
    pub types: Vec<String>,
}

impl SelectorRefs {
    /// True when the selector requires nothing checkable (`*`, `:root`,
    /// `[hidden]`); such a selector must be assumed to match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty() && self.types.is_empty()
    }
}

impl Selector {
    /// Extract the references this selector requires to match.
    #[must_use]
    pub fn refs(&self) -> SelectorRefs {
        selector_refs(&self.tokens)
    }
}

/// Walk a selector token sequence and collect required references.
#[must_use]
pub fn selector_refs(tokens: &[CssToken]) -> SelectorRefs {
    let mut refs = SelectorRefs::default();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            // ".name" - a class selector.
            // [§ 6.6 Class selectors](https://www.w3.org/TR/selectors-4/#class-html)
            CssToken::Delim('.') => {
                if let Some(CssToken::Ident(name)) = tokens.get(i + 1) {
                    refs.classes.push(name.clone());
                    i += 2;
                    continue;
                }
            }

            // "#name" - an id selector.
            // [§ 6.7 ID selectors](https://www.w3.org/TR/selectors-4/#id-selectors)
            CssToken::Hash { value, .. } => {
                refs.ids.push(value.clone());
            }

            // ":pseudo", "::pseudo", ":func(...)" - pseudo-classes and
            // pseudo-elements constrain state, not referenced names.
            // [§ 15 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
            CssToken::Colon => {
                i += 1;
                if matches!(tokens.get(i), Some(CssToken::Colon)) {
                    i += 1;
                }
                match tokens.get(i) {
                    Some(CssToken::Ident(_)) => i += 1,
                    Some(CssToken::Function(_)) => i = skip_function(tokens, i),
                    _ => {}
                }
                continue;
            }

            // "[attr...]" - attribute selectors are skipped whole.
            // [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
            CssToken::LeftBracket => {
                while i < tokens.len() && !matches!(tokens[i], CssToken::RightBracket) {
                    i += 1;
                }
            }

            // A bare ident is a type selector.
            // [§ 6.1 Type selectors](https://www.w3.org/TR/selectors-4/#type-selectors)
            CssToken::Ident(name) => {
                refs.types.push(name.to_ascii_lowercase());
            }

            // A stray function outside a pseudo-class; skip its arguments.
            CssToken::Function(_) => {
                i = skip_function(tokens, i);
                continue;
            }

            // Combinators, the universal selector, whitespace: no references.
            _ => {}
        }
        i += 1;
    }

    refs
}

/// Advance past a function token's arguments to the index after its matching
/// closing paren. `start` indexes the `Function` token itself.
fn skip_function(tokens: &[CssToken], start: usize) -> usize {
    let mut depth = 1_usize;
    let mut i = start + 1;
    while i < tokens.len() && depth > 0 {
        match tokens[i] {
            CssToken::Function(_) | CssToken::LeftParen => depth += 1,
            CssToken::RightParen => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    i
}
