//! Integration tests for compact CSS serialization.
//!
//! The serializer guarantees equivalence, not byte fidelity: output parses
//! back to the same rules, with comments gone and whitespace minimized.

use amphora_css::{declarations_to_css, parse_declarations, parse_stylesheet, stylesheet_to_css};

/// Parse then serialize.
fn roundtrip(css: &str) -> String {
    stylesheet_to_css(&parse_stylesheet(css))
}

#[test]
fn test_simple_rule_compacts() {
    assert_eq!(roundtrip("a { color: red }"), "a{color:red}");
}

#[test]
fn test_selector_list_joined_with_commas() {
    assert_eq!(roundtrip("h1 , h2 { margin: 0 }"), "h1,h2{margin:0}");
}

#[test]
fn test_multiple_declarations_joined_with_semicolons() {
    assert_eq!(
        roundtrip("p { color: red; margin: 0; }"),
        "p{color:red;margin:0}"
    );
}

#[test]
fn test_important_reserialized() {
    assert_eq!(
        roundtrip("p { color: red ! important }"),
        "p{color:red!important}"
    );
}

#[test]
fn test_descendant_combinator_space_kept() {
    assert_eq!(
        roundtrip("nav  ul   li { color: red }"),
        "nav ul li{color:red}"
    );
}

#[test]
fn test_value_space_between_words_kept() {
    assert_eq!(roundtrip("p { margin: 0 auto }"), "p{margin:0 auto}");
}

#[test]
fn test_media_rule_compacts() {
    assert_eq!(
        roundtrip("@media (min-width: 600px) { p { color: blue } }"),
        "@media (min-width:600px){p{color:blue}}"
    );
}

#[test]
fn test_media_followed_by_rule() {
    assert_eq!(
        roundtrip("@media print { p { display: none } } a { color: red }"),
        "@media print{p{display:none}}a{color:red}"
    );
}

#[test]
fn test_import_keeps_semicolon() {
    assert_eq!(
        roundtrip("@import url(\"extra.css\");"),
        "@import url(\"extra.css\");"
    );
}

#[test]
fn test_unquoted_url_serializes_quoted() {
    assert_eq!(
        roundtrip("@font-face { src: url(font.woff2) }"),
        "@font-face{src:url(\"font.woff2\")}"
    );
}

#[test]
fn test_keyframes_roundtrip() {
    assert_eq!(
        roundtrip("@keyframes spin { from { transform: rotate(0deg) } to { transform: rotate(360deg) } }"),
        "@keyframes spin{from{transform:rotate(0deg)}to{transform:rotate(360deg)}}"
    );
}

#[test]
fn test_function_arguments_compact() {
    assert_eq!(
        roundtrip("p { transform: translate(10px, 20%) }"),
        "p{transform:translate(10px,20%)}"
    );
}

#[test]
fn test_comments_dropped() {
    assert_eq!(
        roundtrip("/* note */ a { /* inner */ color: red }"),
        "a{color:red}"
    );
}

#[test]
fn test_ident_hash_preserved() {
    assert_eq!(roundtrip("p { color: #ff0000 }"), "p{color:#ff0000}");
}

#[test]
fn test_unrestricted_hash_preserved() {
    // Starts with a digit, so it is not an ident; raw digits must survive
    assert_eq!(roundtrip("p { color: #123abc }"), "p{color:#123abc}");
}

#[test]
fn test_escaped_class_reescaped() {
    // The tokenizer decodes \. into the class name; serialization escapes
    // it again so the selector tokenizes back to the same value
    assert_eq!(roundtrip(".a\\.b { color: red }"), ".a\\.b{color:red}");
}

#[test]
fn test_escaped_at_keyword_normalized() {
    // \6d  is "m"; the decoded name serializes in canonical form
    assert_eq!(
        roundtrip("@\\6d edia print { p { display: none } }"),
        "@media print{p{display:none}}"
    );
}

#[test]
fn test_string_quotes_escaped() {
    assert_eq!(
        roundtrip("q { quotes: \"\\\"\" \"\\\"\" }"),
        "q{quotes:\"\\\"\" \"\\\"\"}"
    );
}

#[test]
fn test_integer_value() {
    assert_eq!(roundtrip("p { z-index: 10 }"), "p{z-index:10}");
}

#[test]
fn test_negative_integer_value() {
    assert_eq!(roundtrip("p { margin-top: -4px }"), "p{margin-top:-4px}");
}

#[test]
fn test_fractional_value() {
    assert_eq!(roundtrip("p { line-height: 1.5 }"), "p{line-height:1.5}");
}

#[test]
fn test_leading_dot_number_normalized() {
    assert_eq!(roundtrip("p { opacity: .5 }"), "p{opacity:0.5}");
}

#[test]
fn test_scientific_notation_normalized() {
    assert_eq!(roundtrip("p { width: 1e3px }"), "p{width:1000px}");
}

#[test]
fn test_percentage_value() {
    assert_eq!(roundtrip("p { width: 50% }"), "p{width:50%}");
}

#[test]
fn test_attribute_selector_roundtrip() {
    assert_eq!(
        roundtrip("a[href^=\"https\"] { color: green }"),
        "a[href^=\"https\"]{color:green}"
    );
}

#[test]
fn test_declarations_to_css() {
    let decls = parse_declarations("color: red; background: blue");
    assert_eq!(declarations_to_css(&decls), "color:red;background:blue");
}

#[test]
fn test_declarations_to_css_empty() {
    assert_eq!(declarations_to_css(&[]), "");
}

#[test]
fn test_serialization_is_idempotent() {
    let css = "/* c */ h1, h2 { margin: 0 auto !important } \
               @media (min-width: 600px) { .a\\.b { color: #123abc } } \
               @import url(x.css);";
    let once = roundtrip(css);
    let twice = roundtrip(&once);
    assert_eq!(once, twice);
}
