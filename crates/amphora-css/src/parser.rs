//! CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! "The input to the parsing stage is a stream of tokens from the tokenization
//! stage." Parses style rules, at-rules, and declaration lists. Like the
//! tokenizer it never fails: malformed constructs are dropped or consumed as
//! garbage per the spec's error recovery rules.

use crate::serialize;
use crate::tokenizer::CssToken;

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-a-declaration)
///
/// A CSS declaration (e.g., `color: red`). Property names are normalized to
/// ASCII lowercase; they are defined case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name, lowercased.
    pub name: String,
    /// The property value as component values.
    pub value: Vec<ComponentValue>,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

/// [§ 5.4.7 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-a-component-value)
///
/// A component value in a declaration or at-rule prelude.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CssToken),
    /// A function with its contents.
    Function {
        /// The function name.
        name: String,
        /// The function arguments.
        value: Vec<ComponentValue>,
    },
    /// A simple block.
    Block {
        /// The opening token character.
        token: char,
        /// The block contents.
        value: Vec<ComponentValue>,
    },
}

/// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// One selector out of a rule's comma-separated selector list. The token form
/// is kept alongside the text so selector analysis does not have to re-lex
/// the serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Serialized selector text, single-space separated.
    pub text: String,
    /// The prelude tokens this selector was built from.
    pub tokens: Vec<CssToken>,
}

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-a-qualified-rule)
///
/// A CSS style rule (selector list + declaration block).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The list of selectors for this rule.
    pub selectors: Vec<Selector>,
    /// The declarations in this rule block.
    pub declarations: Vec<Declaration>,
}

/// The body of an at-rule, shaped by the at-rule's grammar.
///
/// CSS Syntax leaves block interpretation to each at-rule's own specification:
/// conditional group rules ([CSS Conditional § 3](https://www.w3.org/TR/css-conditional-3/#contents-of))
/// and `@keyframes` contain rules, while `@font-face` and `@page` contain
/// declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBlock {
    /// No block; the at-rule ended with a semicolon (`@import`, `@charset`).
    None,
    /// A nested rule list (`@media`, `@supports`, `@keyframes`).
    Rules(Vec<Rule>),
    /// A declaration list (`@font-face`, `@page`, unrecognized at-rules).
    Declarations(Vec<Declaration>),
}

/// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-an-at-rule)
///
/// A CSS at-rule. The name is normalized to ASCII lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// The at-keyword name (without the `@`), lowercased.
    pub name: String,
    /// The prelude component values.
    pub prelude: Vec<ComponentValue>,
    /// The block contents, shaped by the at-rule's grammar.
    pub block: AtRuleBlock,
}

/// [§ 5.3.3 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
///
/// A CSS rule (either a style rule or an at-rule).
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A style rule (qualified rule).
    Style(StyleRule),
    /// An at-rule.
    At(AtRule),
}

/// [§ 5.3.2 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
///
/// A parsed CSS stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    /// The list of rules in the stylesheet.
    pub rules: Vec<Rule>,
}

/// CSS parser over a token stream.
pub struct CssParser {
    tokens: Vec<CssToken>,
    position: usize,
}

impl CssParser {
    /// Create a new parser from a list of tokens.
    #[must_use]
    pub const fn new(tokens: Vec<CssToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// [§ 5.3.2 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    ///
    /// "To parse a stylesheet from input..."
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        // "Consume a list of rules from input, with the top-level flag set."
        let rules = self.consume_list_of_rules(true);
        Stylesheet { rules }
    }

    /// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Parse declarations from a style attribute or similar.
    pub fn parse_declaration_list(&mut self) -> Vec<Declaration> {
        self.consume_list_of_declarations()
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        // "Create an initially empty list of rules."
        let mut rules = Vec::new();

        loop {
            match self.peek() {
                // "<whitespace-token>"
                // "Do nothing."
                Some(CssToken::Whitespace) => {
                    let _ = self.consume();
                }

                // "<EOF-token>"
                // "Return the list of rules."
                None | Some(CssToken::EOF) => {
                    return rules;
                }

                // A nested rule list ends at the block's closing brace; the
                // caller consumes it. At the top level a stray `}` is garbage
                // and is skipped.
                Some(CssToken::RightBrace) => {
                    if top_level {
                        let _ = self.consume();
                    } else {
                        return rules;
                    }
                }

                // "<CDO-token>" or "<CDC-token>"
                // "If the top-level flag is set, do nothing."
                Some(CssToken::CDO | CssToken::CDC) => {
                    if top_level {
                        let _ = self.consume();
                    } else if let Some(rule) = self.consume_qualified_rule() {
                        // "Otherwise... Consume a qualified rule. If anything is
                        // returned, append it to the list of rules."
                        rules.push(Rule::Style(rule));
                    }
                }

                // "<at-keyword-token>"
                // "Reconsume the current input token. Consume an at-rule, and
                // append the returned value to the list of rules."
                Some(CssToken::AtKeyword(_)) => {
                    if let Some(at_rule) = self.consume_at_rule() {
                        rules.push(Rule::At(at_rule));
                    }
                }

                // "anything else"
                // "Reconsume the current input token. Consume a qualified rule.
                // If anything is returned, append it to the list of rules."
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<AtRule> {
        // "Consume the next input token."
        let name = match self.consume() {
            Some(CssToken::AtKeyword(name)) => name.to_ascii_lowercase(),
            _ => return None,
        };

        // "Create a new at-rule with its name set to the value of the current
        // input token, its prelude initially set to an empty list, and its value
        // initially set to nothing."
        let mut prelude = Vec::new();

        loop {
            match self.peek() {
                // "<semicolon-token>"
                // "Return the at-rule."
                Some(CssToken::Semicolon) => {
                    let _ = self.consume();
                    return Some(AtRule {
                        name,
                        prelude,
                        block: AtRuleBlock::None,
                    });
                }

                // "<EOF-token>"
                // "This is a parse error. Return the at-rule."
                None | Some(CssToken::EOF) => {
                    return Some(AtRule {
                        name,
                        prelude,
                        block: AtRuleBlock::None,
                    });
                }

                // "<{-token>"
                // "Consume a simple block and assign it to the at-rule's block.
                // Return the at-rule."
                Some(CssToken::LeftBrace) => {
                    let _ = self.consume(); // {
                    let block = if has_rule_list_block(&name) {
                        AtRuleBlock::Rules(self.consume_list_of_rules(false))
                    } else {
                        AtRuleBlock::Declarations(self.consume_list_of_declarations())
                    };
                    if self.peek() == Some(&CssToken::RightBrace) {
                        let _ = self.consume();
                    }
                    return Some(AtRule {
                        name,
                        prelude,
                        block,
                    });
                }

                // "anything else"
                // "Reconsume the current input token. Consume a component value.
                // Append the returned value to the at-rule's prelude."
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push(value);
                    }
                }
            }
        }
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        // "Create a new qualified rule with its prelude initially set to an
        // empty list, and its value initially set to nothing."
        let mut prelude_tokens = Vec::new();

        loop {
            match self.peek() {
                // "<EOF-token>"
                // "This is a parse error. Return nothing."
                None | Some(CssToken::EOF) => {
                    return None;
                }

                // "<{-token>"
                // "Consume a simple block and assign it to the qualified rule's
                // block. Return the qualified rule."
                Some(CssToken::LeftBrace) => {
                    let _ = self.consume(); // {

                    // Parse selectors from prelude tokens, splitting on commas.
                    // [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
                    // "A selector list is a comma-separated list of selectors"
                    let selectors = split_selector_list(&prelude_tokens);

                    // Parse declarations from the block contents.
                    let declarations = self.consume_list_of_declarations();

                    // Consume the closing brace.
                    if self.peek() == Some(&CssToken::RightBrace) {
                        let _ = self.consume();
                    }

                    return Some(StyleRule {
                        selectors,
                        declarations,
                    });
                }

                // "anything else"
                // "Reconsume the current input token. Consume a component value.
                // Append the returned value to the qualified rule's prelude."
                Some(_) => {
                    if let Some(token) = self.consume() {
                        prelude_tokens.push(token.clone());
                    }
                }
            }
        }
    }

    /// [§ 5.4.4 Consume a style block's contents](https://www.w3.org/TR/css-syntax-3/#consume-style-block)
    /// and [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();

        loop {
            match self.peek() {
                // "<whitespace-token>" or "<semicolon-token>"
                // "Do nothing."
                Some(CssToken::Whitespace | CssToken::Semicolon) => {
                    let _ = self.consume();
                }

                // "<EOF-token>" or "<}-token>"
                // "Return the list of declarations."
                None | Some(CssToken::EOF | CssToken::RightBrace) => {
                    return declarations;
                }

                // "<at-keyword-token>"
                // At-rules nested inside declaration lists are consumed and
                // dropped; nothing in the pipeline produces them.
                Some(CssToken::AtKeyword(_)) => {
                    let _ = self.consume_at_rule();
                }

                // "<ident-token>"
                // "Consume a declaration. If anything was returned, append it
                // to the list of declarations."
                Some(CssToken::Ident(_)) => {
                    if let Some(decl) = self.consume_declaration() {
                        declarations.push(decl);
                    }
                }

                // "anything else"
                // "This is a parse error. Reconsume the current input token. As
                // long as the next input token is anything other than a
                // <semicolon-token> or <EOF-token>, consume a component value
                // and throw away the returned value."
                Some(_) => {
                    let _ = self.consume();
                    while !matches!(
                        self.peek(),
                        None | Some(
                            CssToken::Semicolon | CssToken::RightBrace | CssToken::EOF
                        )
                    ) {
                        let _ = self.consume_component_value();
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        // "Consume the next input token."
        let name = match self.consume() {
            Some(CssToken::Ident(name)) => name.to_ascii_lowercase(),
            _ => return None,
        };

        // "While the next input token is a <whitespace-token>, consume the next
        // input token."
        while self.peek() == Some(&CssToken::Whitespace) {
            let _ = self.consume();
        }

        // "If the next input token is anything other than a <colon-token>, this
        // is a parse error. Return nothing."
        if self.peek() != Some(&CssToken::Colon) {
            return None;
        }
        let _ = self.consume(); // :

        // "While the next input token is a <whitespace-token>, consume the next
        // input token."
        while self.peek() == Some(&CssToken::Whitespace) {
            let _ = self.consume();
        }

        // "As long as the next input token is anything other than an
        // <EOF-token>, consume a component value and append it to the
        // declaration's value."
        let mut value = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(CssToken::EOF | CssToken::Semicolon | CssToken::RightBrace)
        ) {
            if let Some(v) = self.consume_component_value() {
                value.push(v);
            }
        }

        // Check for and strip the !important annotation.
        let important = check_important(&value);
        let value = trim_important(value);

        Some(Declaration {
            name,
            value,
            important,
        })
    }

    /// [§ 5.4.7 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        match self.peek() {
            // "<{-token>", "<[-token>", "<(-token>"
            // "Consume a simple block and return it."
            Some(CssToken::LeftBrace | CssToken::LeftBracket | CssToken::LeftParen) => {
                let token = match self.peek() {
                    Some(CssToken::LeftBrace) => '{',
                    Some(CssToken::LeftBracket) => '[',
                    _ => '(',
                };
                let value = self.consume_simple_block();
                Some(ComponentValue::Block { token, value })
            }

            // "<function-token>"
            // "Consume a function and return it."
            Some(CssToken::Function(_)) => {
                let name = match self.consume() {
                    Some(CssToken::Function(name)) => name.clone(),
                    _ => return None,
                };
                let mut value = Vec::new();
                loop {
                    match self.peek() {
                        Some(CssToken::RightParen) => {
                            let _ = self.consume();
                            break;
                        }
                        None | Some(CssToken::EOF) => break,
                        Some(_) => {
                            if let Some(v) = self.consume_component_value() {
                                value.push(v);
                            }
                        }
                    }
                }
                Some(ComponentValue::Function { name, value })
            }

            // "anything else"
            // "Return the current input token."
            Some(_) => {
                let token = self.consume()?.clone();
                Some(ComponentValue::Token(token))
            }

            None => None,
        }
    }

    /// [§ 5.4.8 Consume a simple block](https://www.w3.org/TR/css-syntax-3/#consume-simple-block)
    fn consume_simple_block(&mut self) -> Vec<ComponentValue> {
        let ending_token = match self.consume() {
            Some(CssToken::LeftBrace) => CssToken::RightBrace,
            Some(CssToken::LeftBracket) => CssToken::RightBracket,
            Some(CssToken::LeftParen) => CssToken::RightParen,
            _ => return Vec::new(),
        };

        let mut value = Vec::new();

        loop {
            match self.peek() {
                Some(token) if *token == ending_token => {
                    let _ = self.consume();
                    return value;
                }
                None | Some(CssToken::EOF) => {
                    return value;
                }
                Some(_) => {
                    if let Some(v) = self.consume_component_value() {
                        value.push(v);
                    }
                }
            }
        }
    }

    fn consume(&mut self) -> Option<&CssToken> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn peek(&self) -> Option<&CssToken> {
        self.tokens.get(self.position)
    }
}

/// Whether an at-rule's block contains rules rather than declarations.
///
/// [CSS Conditional § 3](https://www.w3.org/TR/css-conditional-3/#contents-of):
/// "the contents of conditional group rules... must be a list of rules";
/// [CSS Animations § 3](https://www.w3.org/TR/css-animations-1/#keyframes):
/// keyframes blocks hold keyframe rules.
fn has_rule_list_block(name: &str) -> bool {
    matches!(
        name,
        "media"
            | "supports"
            | "document"
            | "keyframes"
            | "-webkit-keyframes"
            | "-moz-keyframes"
            | "-o-keyframes"
    )
}

/// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// Split prelude tokens into a list of selectors, separated by top-level
/// commas. "A selector list is a comma-separated list of selectors."
/// Commas nested inside functions or brackets (`:not(a, b)`, `[attr=","]`)
/// do not split.
fn split_selector_list(tokens: &[CssToken]) -> Vec<Selector> {
    let mut selectors = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0_usize;

    for token in tokens {
        match token {
            CssToken::Function(_) | CssToken::LeftParen | CssToken::LeftBracket => {
                depth += 1;
                current.push(token.clone());
            }
            CssToken::RightParen | CssToken::RightBracket => {
                depth = depth.saturating_sub(1);
                current.push(token.clone());
            }
            CssToken::Comma if depth == 0 => {
                push_selector(&mut selectors, &mut current);
            }
            _ => current.push(token.clone()),
        }
    }

    // The last selector has no trailing comma.
    push_selector(&mut selectors, &mut current);
    selectors
}

/// Build a `Selector` from accumulated prelude tokens, dropping empty entries.
fn push_selector(selectors: &mut Vec<Selector>, current: &mut Vec<CssToken>) {
    let text = serialize::tokens_to_css(current).trim().to_string();
    if !text.is_empty() {
        selectors.push(Selector {
            text,
            tokens: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}

/// Check if the value ends with !important.
///
/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
///
/// STEP 1: Skip trailing whitespace in the value.
/// STEP 2: Check for <ident-token> "important".
/// STEP 3: Skip any whitespace between "!" and "important".
/// STEP 4: Check for <delim-token> "!".
fn check_important(value: &[ComponentValue]) -> bool {
    let mut iter = value.iter().rev().peekable();

    // STEP 1: Skip trailing whitespace
    while let Some(ComponentValue::Token(CssToken::Whitespace)) = iter.peek() {
        let _ = iter.next();
    }

    // STEP 2: Check for ident "important"
    match iter.next() {
        Some(ComponentValue::Token(CssToken::Ident(s))) if s.eq_ignore_ascii_case("important") => {}
        _ => return false,
    }

    // STEP 3: Skip whitespace between ! and important
    while let Some(ComponentValue::Token(CssToken::Whitespace)) = iter.peek() {
        let _ = iter.next();
    }

    // STEP 4: Check for !
    matches!(
        iter.next(),
        Some(ComponentValue::Token(CssToken::Delim('!')))
    )
}

/// Remove trailing whitespace and !important from a declaration value.
///
/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// After detecting the !important annotation, remove it so the remaining
/// component values represent the actual property value.
///
/// STEP 1: Remove trailing whitespace.
/// STEP 2: Remove the "important" ident token.
/// STEP 3: Remove whitespace between ! and important.
/// STEP 4: Remove the "!" delim token.
/// STEP 5: Remove any remaining trailing whitespace.
///
/// A trailing `important` ident with no `!` before it is a plain value, not
/// an annotation, and is left alone.
fn trim_important(mut value: Vec<ComponentValue>) -> Vec<ComponentValue> {
    // STEP 1: Remove trailing whitespace
    while matches!(
        value.last(),
        Some(ComponentValue::Token(CssToken::Whitespace))
    ) {
        let _ = value.pop();
    }

    if check_important(&value) {
        // STEP 2: Remove "important"
        let _ = value.pop();

        // STEP 3: Remove whitespace between ! and important
        while matches!(
            value.last(),
            Some(ComponentValue::Token(CssToken::Whitespace))
        ) {
            let _ = value.pop();
        }

        // STEP 4: Remove !
        let _ = value.pop();

        // STEP 5: Remove trailing whitespace again
        while matches!(
            value.last(),
            Some(ComponentValue::Token(CssToken::Whitespace))
        ) {
            let _ = value.pop();
        }
    }

    value
}
