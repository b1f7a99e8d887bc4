//! Integration tests for the HTML tokenizer.

use amphora_html::{Token, Tokenizer};

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(input.to_string());
    tokenizer.run();
    tokenizer.into_tokens()
}

#[test]
fn test_plain_text() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens.len(), 2); // text run + EOF
    assert!(matches!(&tokens[0], Token::Text { data } if data == "Hello"));
    assert!(matches!(tokens[1], Token::EndOfFile));
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE html>");
    assert_eq!(tokens.len(), 2); // DOCTYPE + EOF
    assert!(matches!(tokens[0], Token::Doctype));
}

#[test]
fn test_doctype_case_insensitive() {
    let tokens = tokenize("<!doctype HTML>");
    assert!(matches!(tokens[0], Token::Doctype));
}

#[test]
fn test_start_tag() {
    let tokens = tokenize("<div>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::StartTag {
            name,
            self_closing,
            attributes,
        } => {
            assert_eq!(name, "div");
            assert!(!self_closing);
            assert!(attributes.is_empty());
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_end_tag() {
    let tokens = tokenize("</div>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::EndTag { name } => {
            assert_eq!(name, "div");
        }
        _ => panic!("Expected EndTag token"),
    }
}

#[test]
fn test_self_closing_tag() {
    let tokens = tokenize("<br/>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::StartTag {
            name, self_closing, ..
        } => {
            assert_eq!(name, "br");
            assert!(self_closing);
        }
        _ => panic!("Expected self-closing StartTag token"),
    }
}

#[test]
fn test_uppercase_tag_name_lowered() {
    let tokens = tokenize("<DIV CLASS=\"foo\">");
    match &tokens[0] {
        Token::StartTag {
            name, attributes, ..
        } => {
            assert_eq!(name, "div");
            assert_eq!(attributes[0].name, "class");
            assert_eq!(attributes[0].value, "foo");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- hello -->");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::Comment { data } => {
            assert_eq!(data, " hello ");
        }
        _ => panic!("Expected Comment token"),
    }
}

#[test]
fn test_comment_with_inner_dashes() {
    let tokens = tokenize("<!-- a - b -- c -->");
    match &tokens[0] {
        Token::Comment { data } => {
            assert_eq!(data, " a - b -- c ");
        }
        _ => panic!("Expected Comment token"),
    }
}

#[test]
fn test_attribute_double_quoted() {
    let tokens = tokenize(r#"<div class="foo">"#);
    match &tokens[0] {
        Token::StartTag {
            name, attributes, ..
        } => {
            assert_eq!(name, "div");
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].name, "class");
            assert_eq!(attributes[0].value, "foo");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_attribute_single_quoted() {
    let tokens = tokenize("<div class='bar'>");
    match &tokens[0] {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes[0].name, "class");
            assert_eq!(attributes[0].value, "bar");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_attribute_unquoted() {
    let tokens = tokenize("<div id=main>");
    match &tokens[0] {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes[0].name, "id");
            assert_eq!(attributes[0].value, "main");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_bare_attribute_has_empty_value() {
    let tokens = tokenize("<html amp>");
    match &tokens[0] {
        Token::StartTag {
            name, attributes, ..
        } => {
            assert_eq!(name, "html");
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].name, "amp");
            assert_eq!(attributes[0].value, "");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_multiple_attributes() {
    let tokens = tokenize(r#"<amp-img src="a.png" width="600" height="400" layout=responsive>"#);
    match &tokens[0] {
        Token::StartTag {
            name, attributes, ..
        } => {
            assert_eq!(name, "amp-img");
            assert_eq!(attributes.len(), 4);
            assert_eq!(attributes[3].name, "layout");
            assert_eq!(attributes[3].value, "responsive");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_duplicate_attributes_kept_in_token() {
    // Deduplication is the tree builder's job; the token keeps both.
    let tokens = tokenize(r#"<div data-x="1" data-x="2">"#);
    match &tokens[0] {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes.len(), 2);
            assert_eq!(attributes[0].value, "1");
            assert_eq!(attributes[1].value, "2");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_end_tag_attributes_dropped() {
    let tokens = tokenize("</div class='x'>");
    match &tokens[0] {
        Token::EndTag { name } => assert_eq!(name, "div"),
        _ => panic!("Expected EndTag token"),
    }
}

#[test]
fn test_text_between_tags() {
    let tokens = tokenize("<p>Hello</p>");
    assert_eq!(tokens.len(), 4);
    assert!(matches!(&tokens[0], Token::StartTag { name, .. } if name == "p"));
    assert!(matches!(&tokens[1], Token::Text { data } if data == "Hello"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "p"));
    assert!(matches!(tokens[3], Token::EndOfFile));
}

#[test]
fn test_character_reference_not_decoded() {
    let tokens = tokenize("a &amp; b");
    assert!(matches!(&tokens[0], Token::Text { data } if data == "a &amp; b"));
}

#[test]
fn test_lone_less_than_stays_text() {
    let tokens = tokenize("a < b");
    assert!(matches!(&tokens[0], Token::Text { data } if data == "a < b"));
}

#[test]
fn test_script_content_is_raw_text() {
    let tokens = tokenize("<script>if (a < b) { run(); }</script>");
    assert_eq!(tokens.len(), 4);
    assert!(matches!(&tokens[0], Token::StartTag { name, .. } if name == "script"));
    assert!(matches!(&tokens[1], Token::Text { data } if data == "if (a < b) { run(); }"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "script"));
}

#[test]
fn test_style_content_lookalike_end_tag() {
    // "</st" is not an appropriate end tag, so it stays in the text.
    let tokens = tokenize("<style>a</st</style>");
    assert!(matches!(&tokens[1], Token::Text { data } if data == "a</st"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "style"));
}

#[test]
fn test_title_entity_kept_verbatim() {
    let tokens = tokenize("<title>News &amp; Views</title>");
    assert!(matches!(&tokens[1], Token::Text { data } if data == "News &amp; Views"));
}

#[test]
fn test_iframe_content_is_raw_text() {
    let tokens = tokenize("<iframe><p>ignored</p></iframe>");
    assert!(matches!(&tokens[0], Token::StartTag { name, .. } if name == "iframe"));
    assert!(matches!(&tokens[1], Token::Text { data } if data == "<p>ignored</p>"));
}

#[test]
fn test_noscript_content_is_parsed() {
    // noscript is NOT a raw-text element here: its children must become
    // real tokens so later passes can unwrap them.
    let tokens = tokenize("<noscript><img src=\"a.png\"></noscript>");
    assert!(matches!(&tokens[0], Token::StartTag { name, .. } if name == "noscript"));
    assert!(matches!(&tokens[1], Token::StartTag { name, .. } if name == "img"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "noscript"));
}

#[test]
fn test_raw_text_end_tag_with_whitespace() {
    let tokens = tokenize("<script>x</script >");
    assert!(matches!(&tokens[1], Token::Text { data } if data == "x"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "script"));
}

#[test]
fn test_bogus_comment_from_processing_instruction() {
    let tokens = tokenize("<?xml version=\"1.0\"?>");
    match &tokens[0] {
        Token::Comment { data } => {
            assert_eq!(data, "?xml version=\"1.0\"?");
        }
        _ => panic!("Expected Comment token"),
    }
}

#[test]
fn test_unclosed_tag_at_eof_discarded() {
    let mut tokenizer = Tokenizer::new("<div".to_string());
    tokenizer.run();
    assert!(!tokenizer.errors().is_empty());
    let tokens = tokenizer.into_tokens();
    assert_eq!(tokens.len(), 1);
    assert!(matches!(tokens[0], Token::EndOfFile));
}

#[test]
fn test_eof_in_comment_emits_comment() {
    let mut tokenizer = Tokenizer::new("<!-- unterminated".to_string());
    tokenizer.run();
    assert!(!tokenizer.errors().is_empty());
    let tokens = tokenizer.into_tokens();
    assert!(matches!(&tokens[0], Token::Comment { data } if data == " unterminated"));
    assert!(matches!(tokens[1], Token::EndOfFile));
}

#[test]
fn test_missing_end_tag_name_skipped() {
    let tokens = tokenize("a</>b");
    assert_eq!(tokens.len(), 2);
    assert!(matches!(&tokens[0], Token::Text { data } if data == "ab"));
}
