//! Compact CSS serialization per [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization).
//!
//! "This specification does not define how to serialize CSS in general,
//! leaving that task to the CSSOM and individual feature specifications."
//! The forms here follow CSSOM's component serialization rules with a compact
//! layout: no indentation, single spaces only where a `<whitespace-token>`
//! separates values, no trailing semicolons.
//!
//! The guarantee is equivalence, not byte fidelity: serializing a parsed rule
//! yields CSS that parses back to the same rule. Escapes decoded during
//! tokenization are re-escaped on output, comments stay dropped, and
//! `bad-string`/`bad-url` tokens serialize to nothing.

use crate::parser::{AtRule, AtRuleBlock, ComponentValue, Declaration, Rule, StyleRule, Stylesheet};
use crate::tokenizer::core::is_ident_code_point;
use crate::tokenizer::{CssToken, HashType};

/// Serialize a whole stylesheet, rules concatenated.
#[must_use]
pub fn stylesheet_to_css(sheet: &Stylesheet) -> String {
    let mut out = String::new();
    for rule in &sheet.rules {
        push_rule(&mut out, rule);
    }
    out
}

/// Serialize a single rule.
#[must_use]
pub fn rule_to_css(rule: &Rule) -> String {
    let mut out = String::new();
    push_rule(&mut out, rule);
    out
}

/// Serialize a style rule as `selector,selector{decl;decl}`.
#[must_use]
pub fn style_rule_to_css(rule: &StyleRule) -> String {
    let mut out = String::new();
    push_style_rule(&mut out, rule);
    out
}

/// Serialize an at-rule as `@name prelude;` or `@name prelude{...}`.
#[must_use]
pub fn at_rule_to_css(rule: &AtRule) -> String {
    let mut out = String::new();
    push_at_rule(&mut out, rule);
    out
}

/// Serialize a declaration list as `name:value;name:value`, no trailing
/// semicolon. This is the form that goes back into a style block or that a
/// style attribute's declarations take inside a synthesized class rule.
#[must_use]
pub fn declarations_to_css(declarations: &[Declaration]) -> String {
    let mut out = String::new();
    push_declarations(&mut out, declarations);
    out
}

/// Serialize a raw token slice. Selector text uses this: whitespace tokens
/// come out as single spaces, so `a    >   b` and `a > b` serialize alike.
pub(crate) fn tokens_to_css(tokens: &[CssToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        push_token(&mut out, token);
    }
    out
}

fn push_rule(out: &mut String, rule: &Rule) {
    match rule {
        Rule::Style(style) => push_style_rule(out, style),
        Rule::At(at) => push_at_rule(out, at),
    }
}

fn push_style_rule(out: &mut String, rule: &StyleRule) {
    for (i, selector) in rule.selectors.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&selector.text);
    }
    out.push('{');
    push_declarations(out, &rule.declarations);
    out.push('}');
}

fn push_at_rule(out: &mut String, rule: &AtRule) {
    out.push('@');
    push_ident(out, &rule.name);

    let prelude = component_values_to_css(&rule.prelude);
    let prelude = prelude.trim();
    if !prelude.is_empty() {
        out.push(' ');
        out.push_str(prelude);
    }

    match &rule.block {
        AtRuleBlock::None => out.push(';'),
        AtRuleBlock::Rules(rules) => {
            out.push('{');
            for inner in rules {
                push_rule(out, inner);
            }
            out.push('}');
        }
        AtRuleBlock::Declarations(declarations) => {
            out.push('{');
            push_declarations(out, declarations);
            out.push('}');
        }
    }
}

fn push_declarations(out: &mut String, declarations: &[Declaration]) {
    for (i, declaration) in declarations.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        push_declaration(out, declaration);
    }
}

fn push_declaration(out: &mut String, declaration: &Declaration) {
    push_ident(out, &declaration.name);
    out.push(':');
    out.push_str(component_values_to_css(&declaration.value).trim());
    if declaration.important {
        out.push_str("!important");
    }
}

fn component_values_to_css(values: &[ComponentValue]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        // Whitespace earns its byte only between two value words (`0 auto`);
        // next to an explicit separator it is dropped.
        if matches!(value, ComponentValue::Token(CssToken::Whitespace)) {
            if out.is_empty() || out.ends_with([':', ';', ',', '(', '[', '{']) {
                continue;
            }
            if matches!(
                values.get(i + 1),
                Some(ComponentValue::Token(
                    CssToken::RightParen
                        | CssToken::RightBrace
                        | CssToken::RightBracket
                        | CssToken::Comma
                        | CssToken::Semicolon
                        | CssToken::Colon
                ))
            ) {
                continue;
            }
        }
        push_component_value(&mut out, value);
    }
    out
}

fn push_component_value(out: &mut String, value: &ComponentValue) {
    match value {
        ComponentValue::Token(token) => push_token(out, token),
        ComponentValue::Function { name, value } => {
            push_ident(out, name);
            out.push('(');
            out.push_str(component_values_to_css(value).trim());
            out.push(')');
        }
        ComponentValue::Block { token, value } => {
            out.push(*token);
            out.push_str(component_values_to_css(value).trim());
            out.push(match token {
                '[' => ']',
                '(' => ')',
                _ => '}',
            });
        }
    }
}

fn push_token(out: &mut String, token: &CssToken) {
    match token {
        CssToken::Ident(v) => push_ident(out, v),
        CssToken::Function(v) => {
            push_ident(out, v);
            out.push('(');
        }
        CssToken::AtKeyword(v) => {
            out.push('@');
            push_ident(out, v);
        }
        // An 'id' hash re-escapes as an identifier; an 'unrestricted' hash
        // (hex colors like #123abc) must keep its raw digits.
        CssToken::Hash { value, hash_type } => {
            out.push('#');
            match hash_type {
                HashType::Id => push_ident(out, value),
                HashType::Unrestricted => out.push_str(value),
            }
        }
        CssToken::String(v) => push_string(out, v),
        // url("...") is always valid where url(...) was; the quoted form
        // avoids re-checking the unquoted form's forbidden code points.
        CssToken::Url(v) => {
            out.push_str("url(");
            push_string(out, v);
            out.push(')');
        }
        CssToken::Delim(c) => {
            // A lone backslash token is a parse error artifact; dropping it
            // keeps the output parseable.
            if *c != '\\' {
                out.push(*c);
            }
        }
        CssToken::Number {
            value, int_value, ..
        } => push_number(out, *value, *int_value),
        CssToken::Percentage {
            value, int_value, ..
        } => {
            push_number(out, *value, *int_value);
            out.push('%');
        }
        CssToken::Dimension {
            value,
            int_value,
            unit,
            ..
        } => {
            push_number(out, *value, *int_value);
            push_ident(out, unit);
        }
        CssToken::Whitespace => out.push(' '),
        CssToken::Colon => out.push(':'),
        CssToken::Semicolon => out.push(';'),
        CssToken::Comma => out.push(','),
        CssToken::LeftBracket => out.push('['),
        CssToken::RightBracket => out.push(']'),
        CssToken::LeftParen => out.push('('),
        CssToken::RightParen => out.push(')'),
        CssToken::LeftBrace => out.push('{'),
        CssToken::RightBrace => out.push('}'),
        // Markup guards and error tokens have no serialized form.
        CssToken::CDO
        | CssToken::CDC
        | CssToken::BadString
        | CssToken::BadUrl
        | CssToken::EOF => {}
    }
}

/// [CSSOM § Serializing Identifiers](https://drafts.csswg.org/cssom/#serialize-an-identifier)
///
/// Re-escape an identifier so it tokenizes back to the same decoded value:
/// code points outside the ident set get a backslash escape, and a leading
/// digit (or a digit after a leading hyphen) gets the hex form.
fn push_ident(out: &mut String, value: &str) {
    let chars: Vec<char> = value.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if c.is_control() {
            push_hex_escape(out, c);
        } else if c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-')) {
            push_hex_escape(out, c);
        } else if c == '-' && i == 0 && chars.len() == 1 {
            out.push_str("\\-");
        } else if is_ident_code_point(c) {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
}

/// [CSSOM § Serializing Strings](https://drafts.csswg.org/cssom/#serialize-a-string)
///
/// "Create a string represented by '"', followed by the escaped value,
/// followed by '"'."
fn push_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => push_hex_escape(out, c),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// A hex escape with the trailing space that keeps a following hex digit from
/// being absorbed into the escape.
fn push_hex_escape(out: &mut String, c: char) {
    out.push('\\');
    out.push_str(&format!("{:x} ", c as u32));
}

/// Integers print from the exact `i64`; other numbers use the shortest `f64`
/// form that round-trips.
fn push_number(out: &mut String, value: f64, int_value: Option<i64>) {
    match int_value {
        Some(i) => out.push_str(&i.to_string()),
        None => out.push_str(&value.to_string()),
    }
}
