use strum_macros::Display;

use super::token::Token;
use crate::tags;

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer state machine. Each state corresponds to a section in
/// § 13.2.5. Character reference states are omitted: entities pass through
/// as text, and the comment/doctype families are collapsed to the states a
/// tolerant server-side pass actually needs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    EndTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    AfterAttributeValueQuoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    CommentStart,
    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    CommentStartDash,
    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    Comment,
    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    CommentEndDash,
    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    CommentEnd,
    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    CommentEndBang,
    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    ///
    /// Collapsed: the whole declaration is consumed up to `>` and discarded.
    Doctype,
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    ///
    /// Also covers RCDATA and script data; see [`tags::is_raw_text`].
    RawText,
    /// [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    RawTextLessThanSign,
    /// [§ 13.2.5.13 RAWTEXT end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state)
    RawTextEndTagOpen,
    /// [§ 13.2.5.14 RAWTEXT end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state)
    RawTextEndTagName,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to
/// tokenize HTML."
///
/// This struct maintains the state machine for tokenizing HTML input into
/// tokens. Recoverable parse errors are recorded internally and never abort
/// tokenization.
pub struct Tokenizer {
    state: TokenizerState,
    input: String,
    current_pos: usize,
    current_input_character: Option<char>,
    current_token: Option<Token>,
    text_buffer: String,
    token_stream: Vec<Token>,
    at_eof: bool,
    // When true, the next iteration of the main loop will not consume a new
    // character. "Reconsume in the X state" sets this flag.
    reconsume: bool,
    errors: Vec<String>,

    /// [§ 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    /// "The last start tag token emitted is used... in the RCDATA, RAWTEXT,
    /// and script data states."
    last_start_tag_name: Option<String>,

    /// [§ 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#temporary-buffer)
    /// Used for end tag detection in the raw-text states.
    temporary_buffer: String,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input.
    ///
    /// "The tokenizer state machine consists of the states defined in the
    /// following subsections. The initial state is the data state."
    #[must_use]
    pub const fn new(input: String) -> Self {
        Tokenizer {
            state: TokenizerState::Data,
            input,
            current_pos: 0,
            current_input_character: None,
            current_token: None,
            text_buffer: String::new(),
            token_stream: Vec::new(),
            at_eof: false,
            reconsume: false,
            errors: Vec::new(),
            last_start_tag_name: None,
            temporary_buffer: String::new(),
        }
    }

    /// Consume the tokenizer and return the token stream.
    /// Call this after run() to get the tokens for the tree builder.
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.token_stream
    }

    /// Recoverable parse errors recorded during tokenization, in input order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Run the state machine to completion, filling the token stream.
    pub fn run(&mut self) {
        loop {
            // Each state begins by consuming the next input character,
            // unless we're reconsuming from a previous state transition.
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.current_input_character = self.consume();
            }

            if self.current_input_character.is_none() && self.at_eof {
                break;
            }
            match self.state {
                TokenizerState::Data => self.handle_data_state(),
                TokenizerState::TagOpen => self.handle_tag_open_state(),
                TokenizerState::EndTagOpen => self.handle_end_tag_open_state(),
                TokenizerState::TagName => self.handle_tag_name_state(),
                TokenizerState::BeforeAttributeName => self.handle_before_attribute_name_state(),
                TokenizerState::AttributeName => self.handle_attribute_name_state(),
                TokenizerState::AfterAttributeName => self.handle_after_attribute_name_state(),
                TokenizerState::BeforeAttributeValue => self.handle_before_attribute_value_state(),
                TokenizerState::AttributeValueDoubleQuoted => {
                    self.handle_attribute_value_quoted_state('"');
                }
                TokenizerState::AttributeValueSingleQuoted => {
                    self.handle_attribute_value_quoted_state('\'');
                }
                TokenizerState::AttributeValueUnquoted => {
                    self.handle_attribute_value_unquoted_state();
                }
                TokenizerState::AfterAttributeValueQuoted => {
                    self.handle_after_attribute_value_quoted_state();
                }
                TokenizerState::SelfClosingStartTag => self.handle_self_closing_start_tag_state(),
                TokenizerState::BogusComment => self.handle_bogus_comment_state(),
                TokenizerState::MarkupDeclarationOpen => {
                    self.handle_markup_declaration_open_state();
                }
                TokenizerState::CommentStart => self.handle_comment_start_state(),
                TokenizerState::CommentStartDash => self.handle_comment_start_dash_state(),
                TokenizerState::Comment => self.handle_comment_state(),
                TokenizerState::CommentEndDash => self.handle_comment_end_dash_state(),
                TokenizerState::CommentEnd => self.handle_comment_end_state(),
                TokenizerState::CommentEndBang => self.handle_comment_end_bang_state(),
                TokenizerState::Doctype => self.handle_doctype_state(),
                TokenizerState::RawText => self.handle_raw_text_state(),
                TokenizerState::RawTextLessThanSign => self.handle_raw_text_less_than_sign_state(),
                TokenizerState::RawTextEndTagOpen => self.handle_raw_text_end_tag_open_state(),
                TokenizerState::RawTextEndTagName => self.handle_raw_text_end_tag_name_state(),
            }
        }
    }

    // ========================================================================
    // State transition and input helpers
    // ========================================================================

    /// "Switch to the X state" - the next character will be consumed on the
    /// next iteration of the main loop.
    const fn switch_to(&mut self, new_state: TokenizerState) {
        self.state = new_state;
    }

    /// "Reconsume in the X state" - the same character will be processed
    /// again in the new state.
    const fn reconsume_in(&mut self, new_state: TokenizerState) {
        self.reconsume = true;
        self.state = new_state;
    }

    /// "Consume the next input character" - returns the character at the
    /// current position and advances. Returns None at end of input.
    fn consume(&mut self) -> Option<char> {
        if let Some(c) = self.input[self.current_pos..].chars().next() {
            self.current_pos += c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    /// Peek at a codepoint at the given offset from the current position
    /// without consuming it.
    fn peek_codepoint(&self, offset: usize) -> Option<char> {
        self.input[self.current_pos..].chars().nth(offset)
    }

    /// "If the next few characters are..." with an ASCII case-insensitive
    /// comparison, as used for the DOCTYPE keyword.
    fn next_few_characters_are_case_insensitive(&self, target: &str) -> bool {
        for (i, target_char) in target.chars().enumerate() {
            match self.peek_codepoint(i) {
                Some(input_char) if input_char.eq_ignore_ascii_case(&target_char) => {}
                _ => return false,
            }
        }
        true
    }

    /// Consume the given ASCII string from the input. Caller must have
    /// already verified the characters are present.
    const fn consume_string(&mut self, target: &str) {
        self.current_pos += target.len();
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    const fn is_whitespace_char(input_char: char) -> bool {
        matches!(input_char, ' ' | '\t' | '\n' | '\x0C' | '\r')
    }

    /// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
    ///
    /// Parse errors are not fatal - the tokenizer recovers and continues.
    fn parse_error(&mut self, message: &str) {
        self.errors
            .push(format!("{message} (byte {})", self.current_pos));
    }

    // ========================================================================
    // Token emission helpers
    // ========================================================================

    /// Flush the accumulated character run as a single Text token.
    fn flush_text(&mut self) {
        if !self.text_buffer.is_empty() {
            let data = std::mem::take(&mut self.text_buffer);
            self.token_stream.push(Token::Text { data });
        }
    }

    /// Append one character to the pending text run.
    fn push_text_char(&mut self, c: char) {
        self.text_buffer.push(c);
    }

    /// "Emit the current token" - adds the token to the output stream,
    /// flushing pending text first so stream order matches input order.
    ///
    /// NOTE: Per spec, the parser switches the tokenizer into RAWTEXT for
    /// raw-text elements. Since tokenization runs ahead of tree construction
    /// here, the switch happens at emission time instead.
    fn emit_token(&mut self) {
        if let Some(token) = self.current_token.take() {
            self.flush_text();
            if let Token::StartTag { ref name, .. } = token {
                self.last_start_tag_name = Some(name.clone());
                if tags::is_raw_text(name) {
                    self.token_stream.push(token);
                    self.switch_to(TokenizerState::RawText);
                    return;
                }
            }
            self.token_stream.push(token);
        }
    }

    /// "Emit an end-of-file token."
    fn emit_eof_token(&mut self) {
        self.flush_text();
        self.token_stream.push(Token::EndOfFile);
        self.at_eof = true;
    }

    /// "An appropriate end tag token is an end tag token whose tag name
    /// matches the tag name of the last start tag to have been emitted from
    /// this tokenizer, if any."
    fn is_appropriate_end_tag_token(&self) -> bool {
        if let (Some(last_start_tag), Some(Token::EndTag { name })) =
            (&self.last_start_tag_name, &self.current_token)
        {
            return name == last_start_tag;
        }
        false
    }

    // ========================================================================
    // States
    // ========================================================================

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn handle_data_state(&mut self) {
        match self.current_input_character {
            // "U+003C LESS-THAN SIGN (<) - Switch to the tag open state."
            Some('<') => self.switch_to(TokenizerState::TagOpen),
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Emit the current input character as a character token."
            Some('\0') => {
                self.parse_error("unexpected null character");
                self.push_text_char('\0');
            }
            // "EOF - Emit an end-of-file token."
            None => self.emit_eof_token(),
            // "Anything else - Emit the current input character as a
            // character token." A bare ampersand stays literal because
            // character references are never decoded.
            Some(c) => self.push_text_char(c),
        }
    }

    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    fn handle_tag_open_state(&mut self) {
        match self.current_input_character {
            // "U+0021 EXCLAMATION MARK (!) - Switch to the markup declaration
            // open state."
            Some('!') => self.switch_to(TokenizerState::MarkupDeclarationOpen),
            // "U+002F SOLIDUS (/) - Switch to the end tag open state."
            Some('/') => self.switch_to(TokenizerState::EndTagOpen),
            // "ASCII alpha - Create a new start tag token, set its tag name
            // to the empty string. Reconsume in the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_token = Some(Token::new_start_tag());
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003F QUESTION MARK (?) - This is an
            // unexpected-question-mark-instead-of-tag-name parse error.
            // Create a comment token whose data is the empty string.
            // Reconsume in the bogus comment state."
            Some('?') => {
                self.parse_error("unexpected question mark instead of tag name");
                self.current_token = Some(Token::new_comment());
                self.reconsume_in(TokenizerState::BogusComment);
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a
            // U+003C LESS-THAN SIGN character token and an end-of-file
            // token."
            None => {
                self.parse_error("eof before tag name");
                self.push_text_char('<');
                self.emit_eof_token();
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Emit a U+003C LESS-THAN SIGN character token.
            // Reconsume in the data state."
            Some(_) => {
                self.parse_error("invalid first character of tag name");
                self.push_text_char('<');
                self.reconsume_in(TokenizerState::Data);
            }
        }
    }

    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    fn handle_end_tag_open_state(&mut self) {
        match self.current_input_character {
            // "ASCII alpha - Create a new end tag token, set its tag name to
            // the empty string. Reconsume in the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_token = Some(Token::new_end_tag());
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003E GREATER-THAN SIGN (>) - This is a missing-end-tag-name
            // parse error. Switch to the data state."
            Some('>') => {
                self.parse_error("missing end tag name");
                self.switch_to(TokenizerState::Data);
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a
            // U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS
            // character token and an end-of-file token."
            None => {
                self.parse_error("eof before tag name");
                self.push_text_char('<');
                self.push_text_char('/');
                self.emit_eof_token();
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Create a comment token whose data is the empty
            // string. Reconsume in the bogus comment state."
            Some(_) => {
                self.parse_error("invalid first character of tag name");
                self.current_token = Some(Token::new_comment());
                self.reconsume_in(TokenizerState::BogusComment);
            }
        }
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    fn handle_tag_name_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Switch to the before attribute name state."
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            // "U+002F SOLIDUS (/) - Switch to the self-closing start tag
            // state."
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current tag token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "ASCII upper alpha - Append the lowercase version of the
            // current input character... to the current tag token's tag
            // name."
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_tag_name(c.to_ascii_lowercase());
                }
            }
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Append a U+FFFD REPLACEMENT CHARACTER."
            Some('\0') => {
                self.parse_error("unexpected null character");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_tag_name('\u{FFFD}');
                }
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - Append the current input character to the
            // current tag token's tag name."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_tag_name(c);
                }
            }
        }
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    fn handle_before_attribute_name_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Ignore the character."
            Some(c) if Self::is_whitespace_char(c) => {}
            // "U+002F SOLIDUS (/), U+003E GREATER-THAN SIGN (>), EOF -
            // Reconsume in the after attribute name state."
            Some('/' | '>') | None => self.reconsume_in(TokenizerState::AfterAttributeName),
            // "U+003D EQUALS SIGN (=) - This is an
            // unexpected-equals-sign-before-attribute-name parse error.
            // Start a new attribute... Set that attribute's name to the
            // current input character... Switch to the attribute name state."
            Some('=') => {
                self.parse_error("unexpected equals sign before attribute name");
                if let Some(ref mut token) = self.current_token {
                    token.start_new_attribute();
                    token.append_to_current_attribute_name('=');
                }
                self.switch_to(TokenizerState::AttributeName);
            }
            // "Anything else - Start a new attribute in the current tag
            // token. Reconsume in the attribute name state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.start_new_attribute();
                }
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    fn handle_attribute_name_state(&mut self) {
        match self.current_input_character {
            // Whitespace, solidus, greater-than, EOF - "Reconsume in the
            // after attribute name state."
            Some(c) if Self::is_whitespace_char(c) => {
                self.reconsume_in(TokenizerState::AfterAttributeName);
            }
            Some('/' | '>') | None => self.reconsume_in(TokenizerState::AfterAttributeName),
            // "U+003D EQUALS SIGN (=) - Switch to the before attribute value
            // state."
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            // "ASCII upper alpha - Append the lowercase version of the
            // current input character... to the current attribute's name."
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_name(c.to_ascii_lowercase());
                }
            }
            // "U+0022 ("), U+0027 ('), U+003C (<) - This is an
            // unexpected-character-in-attribute-name parse error. Treat it as
            // per the "anything else" entry below."
            Some(c @ ('"' | '\'' | '<')) => {
                self.parse_error("unexpected character in attribute name");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_name(c);
                }
            }
            // "Anything else - Append the current input character to the
            // current attribute's name."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_name(c);
                }
            }
        }
    }

    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    fn handle_after_attribute_name_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Ignore the character."
            Some(c) if Self::is_whitespace_char(c) => {}
            // "U+002F SOLIDUS (/) - Switch to the self-closing start tag
            // state."
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            // "U+003D EQUALS SIGN (=) - Switch to the before attribute value
            // state."
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current tag token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - Start a new attribute in the current tag
            // token. Reconsume in the attribute name state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.start_new_attribute();
                }
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
    }

    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    fn handle_before_attribute_value_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Ignore the character."
            Some(c) if Self::is_whitespace_char(c) => {}
            // "U+0022 (") - Switch to the attribute value (double-quoted)
            // state."
            Some('"') => self.switch_to(TokenizerState::AttributeValueDoubleQuoted),
            // "U+0027 (') - Switch to the attribute value (single-quoted)
            // state."
            Some('\'') => self.switch_to(TokenizerState::AttributeValueSingleQuoted),
            // "U+003E GREATER-THAN SIGN (>) - This is a
            // missing-attribute-value parse error. Switch to the data state.
            // Emit the current tag token."
            Some('>') => {
                self.parse_error("missing attribute value");
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "Anything else - Reconsume in the attribute value (unquoted)
            // state."
            _ => self.reconsume_in(TokenizerState::AttributeValueUnquoted),
        }
    }

    /// [§ 13.2.5.36 / § 13.2.5.37 Attribute value (quoted) states](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    ///
    /// Both quoted states differ only in the closing quote character.
    /// Ampersands stay literal (no character reference state).
    fn handle_attribute_value_quoted_state(&mut self, quote: char) {
        match self.current_input_character {
            // Closing quote - "Switch to the after attribute value (quoted)
            // state."
            Some(c) if c == quote => self.switch_to(TokenizerState::AfterAttributeValueQuoted),
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Append a U+FFFD REPLACEMENT CHARACTER."
            Some('\0') => {
                self.parse_error("unexpected null character");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_value('\u{FFFD}');
                }
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - Append the current input character to the
            // current attribute's value."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_value(c);
                }
            }
        }
    }

    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    fn handle_attribute_value_unquoted_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Switch to the before attribute name state."
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current tag token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Append a U+FFFD REPLACEMENT CHARACTER."
            Some('\0') => {
                self.parse_error("unexpected null character");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_value('\u{FFFD}');
                }
            }
            // Quotes, less-than, equals, grave - "This is an
            // unexpected-character-in-unquoted-attribute-value parse error.
            // Treat it as per the "anything else" entry below."
            Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                self.parse_error("unexpected character in unquoted attribute value");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_value(c);
                }
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - Append the current input character to the
            // current attribute's value."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_current_attribute_value(c);
                }
            }
        }
    }

    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    fn handle_after_attribute_value_quoted_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "Switch to the before attribute name state."
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            // "U+002F SOLIDUS (/) - Switch to the self-closing start tag
            // state."
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current tag token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - This is a missing-whitespace-between-attributes
            // parse error. Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error("missing whitespace between attributes");
                self.reconsume_in(TokenizerState::BeforeAttributeName);
            }
        }
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    fn handle_self_closing_start_tag_state(&mut self) {
        match self.current_input_character {
            // "U+003E GREATER-THAN SIGN (>) - Set the self-closing flag of
            // the current tag token. Switch to the data state. Emit the
            // current tag token."
            Some('>') => {
                if let Some(ref mut token) = self.current_token {
                    token.set_self_closing();
                }
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file
            // token."
            None => {
                self.parse_error("eof in tag");
                self.emit_eof_token();
            }
            // "Anything else - This is an unexpected-solidus-in-tag parse
            // error. Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error("unexpected solidus in tag");
                self.reconsume_in(TokenizerState::BeforeAttributeName);
            }
        }
    }

    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    fn handle_bogus_comment_state(&mut self) {
        match self.current_input_character {
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current comment token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - Emit the comment. Emit an end-of-file token."
            None => {
                self.emit_token();
                self.emit_eof_token();
            }
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Append a U+FFFD REPLACEMENT CHARACTER."
            Some('\0') => {
                self.parse_error("unexpected null character");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('\u{FFFD}');
                }
            }
            // "Anything else - Append the current input character to the
            // comment token's data."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment(c);
                }
            }
        }
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// The current input character is the first character after `<!`.
    fn handle_markup_declaration_open_state(&mut self) {
        match self.current_input_character {
            // "Two U+002D HYPHEN-MINUS characters (-) - Create a comment
            // token whose data is the empty string. Switch to the comment
            // start state."
            Some('-') if self.peek_codepoint(0) == Some('-') => {
                self.consume_string("-");
                self.current_token = Some(Token::new_comment());
                self.switch_to(TokenizerState::CommentStart);
            }
            // "ASCII case-insensitive match for the word "DOCTYPE" - Switch
            // to the DOCTYPE state."
            Some(c)
                if c.eq_ignore_ascii_case(&'d')
                    && self.next_few_characters_are_case_insensitive("OCTYPE") =>
            {
                self.consume_string("OCTYPE");
                self.switch_to(TokenizerState::Doctype);
            }
            // "Anything else - This is an incorrectly-opened-comment parse
            // error. Create a comment token whose data is the empty string.
            // Reconsume in the bogus comment state." CDATA sections land
            // here too.
            _ => {
                self.parse_error("incorrectly opened comment");
                self.current_token = Some(Token::new_comment());
                self.reconsume_in(TokenizerState::BogusComment);
            }
        }
    }

    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    fn handle_comment_start_state(&mut self) {
        match self.current_input_character {
            // "U+002D HYPHEN-MINUS (-) - Switch to the comment start dash
            // state."
            Some('-') => self.switch_to(TokenizerState::CommentStartDash),
            // "U+003E GREATER-THAN SIGN (>) - This is an
            // abrupt-closing-of-empty-comment parse error. Switch to the data
            // state. Emit the current comment token."
            Some('>') => {
                self.parse_error("abrupt closing of empty comment");
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "Anything else - Reconsume in the comment state."
            _ => self.reconsume_in(TokenizerState::Comment),
        }
    }

    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    fn handle_comment_start_dash_state(&mut self) {
        match self.current_input_character {
            // "U+002D HYPHEN-MINUS (-) - Switch to the comment end state."
            Some('-') => self.switch_to(TokenizerState::CommentEnd),
            // "U+003E GREATER-THAN SIGN (>) - This is an
            // abrupt-closing-of-empty-comment parse error. Switch to the data
            // state. Emit the current comment token."
            Some('>') => {
                self.parse_error("abrupt closing of empty comment");
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - This is an eof-in-comment parse error. Emit the current
            // comment token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in comment");
                self.emit_token();
                self.emit_eof_token();
            }
            // "Anything else - Append a U+002D HYPHEN-MINUS character (-) to
            // the comment token's data. Reconsume in the comment state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                }
                self.reconsume_in(TokenizerState::Comment);
            }
        }
    }

    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    fn handle_comment_state(&mut self) {
        match self.current_input_character {
            // "U+002D HYPHEN-MINUS (-) - Switch to the comment end dash
            // state."
            Some('-') => self.switch_to(TokenizerState::CommentEndDash),
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Append a U+FFFD REPLACEMENT CHARACTER."
            Some('\0') => {
                self.parse_error("unexpected null character");
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('\u{FFFD}');
                }
            }
            // "EOF - This is an eof-in-comment parse error. Emit the current
            // comment token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in comment");
                self.emit_token();
                self.emit_eof_token();
            }
            // "Anything else - Append the current input character to the
            // comment token's data."
            Some(c) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment(c);
                }
            }
        }
    }

    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    fn handle_comment_end_dash_state(&mut self) {
        match self.current_input_character {
            // "U+002D HYPHEN-MINUS (-) - Switch to the comment end state."
            Some('-') => self.switch_to(TokenizerState::CommentEnd),
            // "EOF - This is an eof-in-comment parse error. Emit the current
            // comment token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in comment");
                self.emit_token();
                self.emit_eof_token();
            }
            // "Anything else - Append a U+002D HYPHEN-MINUS character (-) to
            // the comment token's data. Reconsume in the comment state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                }
                self.reconsume_in(TokenizerState::Comment);
            }
        }
    }

    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    fn handle_comment_end_state(&mut self) {
        match self.current_input_character {
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current comment token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "U+0021 EXCLAMATION MARK (!) - Switch to the comment end bang
            // state."
            Some('!') => self.switch_to(TokenizerState::CommentEndBang),
            // "U+002D HYPHEN-MINUS (-) - Append a U+002D HYPHEN-MINUS
            // character (-) to the comment token's data."
            Some('-') => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                }
            }
            // "EOF - This is an eof-in-comment parse error. Emit the current
            // comment token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in comment");
                self.emit_token();
                self.emit_eof_token();
            }
            // "Anything else - Append two U+002D HYPHEN-MINUS characters (-)
            // to the comment token's data. Reconsume in the comment state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                    token.append_to_comment('-');
                }
                self.reconsume_in(TokenizerState::Comment);
            }
        }
    }

    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    fn handle_comment_end_bang_state(&mut self) {
        match self.current_input_character {
            // "U+002D HYPHEN-MINUS (-) - Append two U+002D HYPHEN-MINUS
            // characters (-) and a U+0021 EXCLAMATION MARK character (!) to
            // the comment token's data. Switch to the comment end dash
            // state."
            Some('-') => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                    token.append_to_comment('-');
                    token.append_to_comment('!');
                }
                self.switch_to(TokenizerState::CommentEndDash);
            }
            // "U+003E GREATER-THAN SIGN (>) - This is an
            // incorrectly-closed-comment parse error. Switch to the data
            // state. Emit the current comment token."
            Some('>') => {
                self.parse_error("incorrectly closed comment");
                self.switch_to(TokenizerState::Data);
                self.emit_token();
            }
            // "EOF - This is an eof-in-comment parse error. Emit the current
            // comment token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in comment");
                self.emit_token();
                self.emit_eof_token();
            }
            // "Anything else - Append two U+002D HYPHEN-MINUS characters (-)
            // and a U+0021 EXCLAMATION MARK character (!) to the comment
            // token's data. Reconsume in the comment state."
            Some(_) => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_comment('-');
                    token.append_to_comment('-');
                    token.append_to_comment('!');
                }
                self.reconsume_in(TokenizerState::Comment);
            }
        }
    }

    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    ///
    /// Collapsed: name, public and system identifiers are consumed and
    /// discarded, since the serializer always re-emits `<!DOCTYPE html>`.
    fn handle_doctype_state(&mut self) {
        match self.current_input_character {
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit
            // the current DOCTYPE token."
            Some('>') => {
                self.flush_text();
                self.token_stream.push(Token::Doctype);
                self.switch_to(TokenizerState::Data);
            }
            // "EOF - This is an eof-in-doctype parse error. Emit the current
            // DOCTYPE token. Emit an end-of-file token."
            None => {
                self.parse_error("eof in doctype");
                self.flush_text();
                self.token_stream.push(Token::Doctype);
                self.emit_eof_token();
            }
            // Anything else - part of the declaration, discarded.
            Some(_) => {}
        }
    }

    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    fn handle_raw_text_state(&mut self) {
        match self.current_input_character {
            // "U+003C LESS-THAN SIGN (<) - Switch to the RAWTEXT less-than
            // sign state."
            Some('<') => self.switch_to(TokenizerState::RawTextLessThanSign),
            // "U+0000 NULL - This is an unexpected-null-character parse
            // error. Emit a U+FFFD REPLACEMENT CHARACTER character token."
            Some('\0') => {
                self.parse_error("unexpected null character");
                self.push_text_char('\u{FFFD}');
            }
            // "EOF - Emit an end-of-file token."
            None => self.emit_eof_token(),
            // "Anything else - Emit the current input character as a
            // character token."
            Some(c) => self.push_text_char(c),
        }
    }

    /// [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    fn handle_raw_text_less_than_sign_state(&mut self) {
        match self.current_input_character {
            // "U+002F SOLIDUS (/) - Set the temporary buffer to the empty
            // string. Switch to the RAWTEXT end tag open state."
            Some('/') => {
                self.temporary_buffer.clear();
                self.switch_to(TokenizerState::RawTextEndTagOpen);
            }
            // "Anything else - Emit a U+003C LESS-THAN SIGN character token.
            // Reconsume in the RAWTEXT state."
            _ => {
                self.push_text_char('<');
                self.reconsume_in(TokenizerState::RawText);
            }
        }
    }

    /// [§ 13.2.5.13 RAWTEXT end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state)
    fn handle_raw_text_end_tag_open_state(&mut self) {
        match self.current_input_character {
            // "ASCII alpha - Create a new end tag token, set its tag name to
            // the empty string. Reconsume in the RAWTEXT end tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_token = Some(Token::new_end_tag());
                self.reconsume_in(TokenizerState::RawTextEndTagName);
            }
            // "Anything else - Emit a U+003C LESS-THAN SIGN character token
            // and a U+002F SOLIDUS character token. Reconsume in the RAWTEXT
            // state."
            _ => {
                self.push_text_char('<');
                self.push_text_char('/');
                self.reconsume_in(TokenizerState::RawText);
            }
        }
    }

    /// [§ 13.2.5.14 RAWTEXT end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state)
    fn handle_raw_text_end_tag_name_state(&mut self) {
        match self.current_input_character {
            // Whitespace - "If the current end tag token is an appropriate
            // end tag token, then switch to the before attribute name state.
            // Otherwise, treat it as per the "anything else" entry below."
            Some(c) if Self::is_whitespace_char(c) => {
                if self.is_appropriate_end_tag_token() {
                    self.switch_to(TokenizerState::BeforeAttributeName);
                } else {
                    self.raw_text_end_tag_name_anything_else();
                }
            }
            // "U+002F SOLIDUS (/) - If appropriate, switch to the
            // self-closing start tag state."
            Some('/') => {
                if self.is_appropriate_end_tag_token() {
                    self.switch_to(TokenizerState::SelfClosingStartTag);
                } else {
                    self.raw_text_end_tag_name_anything_else();
                }
            }
            // "U+003E GREATER-THAN SIGN (>) - If appropriate, switch to the
            // data state and emit the current tag token."
            Some('>') => {
                if self.is_appropriate_end_tag_token() {
                    self.switch_to(TokenizerState::Data);
                    self.emit_token();
                } else {
                    self.raw_text_end_tag_name_anything_else();
                }
            }
            // "ASCII upper alpha - Append the lowercase version... to the
            // current tag token's tag name. Append the current input
            // character to the temporary buffer."
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_tag_name(c.to_ascii_lowercase());
                }
                self.temporary_buffer.push(c);
            }
            // "ASCII lower alpha - Append the current input character to the
            // current tag token's tag name. Append the current input
            // character to the temporary buffer."
            Some(c) if c.is_ascii_lowercase() => {
                if let Some(ref mut token) = self.current_token {
                    token.append_to_tag_name(c);
                }
                self.temporary_buffer.push(c);
            }
            // "Anything else" - see below.
            _ => self.raw_text_end_tag_name_anything_else(),
        }
    }

    /// "Anything else" for the RAWTEXT end tag name state:
    /// "Emit a U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS
    /// character token, and a character token for each of the characters in
    /// the temporary buffer... Reconsume in the RAWTEXT state."
    fn raw_text_end_tag_name_anything_else(&mut self) {
        self.push_text_char('<');
        self.push_text_char('/');
        let buffer = std::mem::take(&mut self.temporary_buffer);
        for c in buffer.chars() {
            self.push_text_char(c);
        }
        self.current_token = None;
        self.reconsume_in(TokenizerState::RawText);
    }
}
