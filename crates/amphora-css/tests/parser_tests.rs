//! Integration tests for the CSS rule and declaration parser.

use amphora_css::parser::{AtRuleBlock, ComponentValue, Rule};
use amphora_css::tokenizer::CssToken;
use amphora_css::{parse_declarations, parse_stylesheet};

/// Helper to get the nth rule as a style rule, panicking otherwise.
fn style_rule(css: &str, n: usize) -> amphora_css::StyleRule {
    let sheet = parse_stylesheet(css);
    match sheet.rules.get(n) {
        Some(Rule::Style(rule)) => rule.clone(),
        other => panic!("Expected style rule at index {n}, got {other:?}"),
    }
}

#[test]
fn test_single_rule() {
    let rule = style_rule("a { color: red }", 0);
    assert_eq!(rule.selectors.len(), 1);
    assert_eq!(rule.selectors[0].text, "a");
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations[0].name, "color");
    assert!(!rule.declarations[0].important);
}

#[test]
fn test_selector_list_splits_on_comma() {
    let rule = style_rule("h1, h2 ,h3 { margin: 0 }", 0);
    let texts: Vec<&str> = rule.selectors.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["h1", "h2", "h3"]);
}

#[test]
fn test_comma_inside_pseudo_class_does_not_split() {
    let rule = style_rule(".a:not(.b, .c) { color: red }", 0);
    assert_eq!(rule.selectors.len(), 1);
    assert_eq!(rule.selectors[0].text, ".a:not(.b, .c)");
}

#[test]
fn test_descendant_selector_text() {
    let rule = style_rule("nav   ul >  li { color: red }", 0);
    // Whitespace runs collapse to single spaces in the serialized text
    assert_eq!(rule.selectors[0].text, "nav ul > li");
}

#[test]
fn test_multiple_declarations() {
    let rule = style_rule("p { color: red; margin: 0 auto; line-height: 1.5 }", 0);
    let names: Vec<&str> = rule
        .declarations
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["color", "margin", "line-height"]);
}

#[test]
fn test_property_name_lowercased() {
    let rule = style_rule("p { COLOR: red }", 0);
    assert_eq!(rule.declarations[0].name, "color");
}

#[test]
fn test_important_detected_and_stripped() {
    let rule = style_rule("p { color: red !important }", 0);
    let decl = &rule.declarations[0];
    assert!(decl.important);
    // The value keeps only the actual property value
    assert_eq!(
        decl.value,
        vec![ComponentValue::Token(CssToken::ident("red"))]
    );
}

#[test]
fn test_important_case_insensitive() {
    let rule = style_rule("p { color: red ! IMPORTANT }", 0);
    assert!(rule.declarations[0].important);
}

#[test]
fn test_bare_important_ident_is_a_value() {
    // No "!" before it, so this is an ordinary value keyword
    let rule = style_rule("p { animation-name: important }", 0);
    let decl = &rule.declarations[0];
    assert!(!decl.important);
    assert_eq!(
        decl.value,
        vec![ComponentValue::Token(CssToken::ident("important"))]
    );
}

#[test]
fn test_at_rule_without_block() {
    let sheet = parse_stylesheet("@import url(\"extra.css\");");
    match &sheet.rules[0] {
        Rule::At(at) => {
            assert_eq!(at.name, "import");
            assert_eq!(at.block, AtRuleBlock::None);
            assert!(!at.prelude.is_empty());
        }
        other => panic!("Expected at-rule, got {other:?}"),
    }
}

#[test]
fn test_at_rule_name_lowercased() {
    let sheet = parse_stylesheet("@MEDIA print { }");
    match &sheet.rules[0] {
        Rule::At(at) => assert_eq!(at.name, "media"),
        other => panic!("Expected at-rule, got {other:?}"),
    }
}

#[test]
fn test_media_block_parses_nested_rules() {
    let sheet = parse_stylesheet("@media (min-width: 600px) { p { color: blue } a { color: red } }");
    match &sheet.rules[0] {
        Rule::At(at) => {
            assert_eq!(at.name, "media");
            match &at.block {
                AtRuleBlock::Rules(rules) => {
                    assert_eq!(rules.len(), 2);
                    match &rules[0] {
                        Rule::Style(inner) => assert_eq!(inner.selectors[0].text, "p"),
                        other => panic!("Expected nested style rule, got {other:?}"),
                    }
                }
                other => panic!("Expected rule-list block, got {other:?}"),
            }
        }
        other => panic!("Expected at-rule, got {other:?}"),
    }
}

#[test]
fn test_font_face_block_parses_declarations() {
    let sheet = parse_stylesheet("@font-face { font-family: \"Open Sans\"; font-weight: 400 }");
    match &sheet.rules[0] {
        Rule::At(at) => {
            assert_eq!(at.name, "font-face");
            match &at.block {
                AtRuleBlock::Declarations(decls) => {
                    assert_eq!(decls.len(), 2);
                    assert_eq!(decls[0].name, "font-family");
                }
                other => panic!("Expected declaration block, got {other:?}"),
            }
        }
        other => panic!("Expected at-rule, got {other:?}"),
    }
}

#[test]
fn test_keyframes_block_parses_keyframe_rules() {
    let sheet =
        parse_stylesheet("@keyframes spin { from { transform: rotate(0deg) } 100% { transform: rotate(360deg) } }");
    match &sheet.rules[0] {
        Rule::At(at) => match &at.block {
            AtRuleBlock::Rules(rules) => {
                assert_eq!(rules.len(), 2);
                match (&rules[0], &rules[1]) {
                    (Rule::Style(from), Rule::Style(to)) => {
                        assert_eq!(from.selectors[0].text, "from");
                        assert_eq!(to.selectors[0].text, "100%");
                    }
                    other => panic!("Expected keyframe style rules, got {other:?}"),
                }
            }
            other => panic!("Expected rule-list block, got {other:?}"),
        },
        other => panic!("Expected at-rule, got {other:?}"),
    }
}

#[test]
fn test_rules_after_media_block_continue() {
    let sheet = parse_stylesheet("@media print { p { display: none } } a { color: red }");
    assert_eq!(sheet.rules.len(), 2);
    assert!(matches!(&sheet.rules[0], Rule::At(_)));
    match &sheet.rules[1] {
        Rule::Style(rule) => assert_eq!(rule.selectors[0].text, "a"),
        other => panic!("Expected style rule, got {other:?}"),
    }
}

#[test]
fn test_cdo_cdc_skipped_at_top_level() {
    let sheet = parse_stylesheet("<!-- a { color: red } -->");
    assert_eq!(sheet.rules.len(), 1);
    match &sheet.rules[0] {
        Rule::Style(rule) => assert_eq!(rule.selectors[0].text, "a"),
        other => panic!("Expected style rule, got {other:?}"),
    }
}

#[test]
fn test_invalid_declaration_recovered() {
    // "123: x" is not a valid declaration; parsing resynchronizes at the
    // semicolon and keeps the following declaration
    let rule = style_rule("p { 123: x; color: red }", 0);
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations[0].name, "color");
}

#[test]
fn test_missing_colon_drops_declaration() {
    let rule = style_rule("p { color red; margin: 0 }", 0);
    // "color red" has no colon, so it is dropped; recovery consumes through
    // the semicolon and the margin declaration survives
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations[0].name, "margin");
}

#[test]
fn test_unclosed_rule_at_eof() {
    let sheet = parse_stylesheet("a { color: red");
    assert_eq!(sheet.rules.len(), 1);
    match &sheet.rules[0] {
        Rule::Style(rule) => {
            assert_eq!(rule.selectors[0].text, "a");
            assert_eq!(rule.declarations.len(), 1);
        }
        other => panic!("Expected style rule, got {other:?}"),
    }
}

#[test]
fn test_stray_close_brace_skipped() {
    let sheet = parse_stylesheet("} a { color: red }");
    assert_eq!(sheet.rules.len(), 1);
}

#[test]
fn test_empty_input() {
    let sheet = parse_stylesheet("");
    assert!(sheet.rules.is_empty());
}

#[test]
fn test_declaration_list_parsing() {
    let decls = parse_declarations("color: red; margin: 0 auto");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].name, "color");
    assert_eq!(decls[1].name, "margin");
    assert_eq!(decls[1].value.len(), 3); // number, whitespace, ident
}

#[test]
fn test_declaration_list_trailing_semicolon() {
    let decls = parse_declarations("color: red;");
    assert_eq!(decls.len(), 1);
}

#[test]
fn test_declaration_list_important() {
    let decls = parse_declarations("position: fixed !important");
    assert!(decls[0].important);
}

#[test]
fn test_function_value() {
    let decls = parse_declarations("transform: translate(10px, 20%)");
    match &decls[0].value[0] {
        ComponentValue::Function { name, value } => {
            assert_eq!(name, "translate");
            assert!(!value.is_empty());
        }
        other => panic!("Expected function component value, got {other:?}"),
    }
}

#[test]
fn test_nested_at_rule_in_declarations_dropped() {
    let rule = style_rule("p { @media print; color: red }", 0);
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations[0].name, "color");
}
