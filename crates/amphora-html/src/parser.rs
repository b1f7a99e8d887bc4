//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! The tree builder consumes the token stream and produces a [`Document`]
//! arena. It implements the insertion modes a server-side sanitizer needs:
//! the head/body skeleton modes and a tolerant "in body" mode. Table modes,
//! foster parenting, the adoption agency algorithm, and template contents
//! are not implemented; misnested markup degrades to parse issues instead.

use strum_macros::Display;

use amphora_dom::{AttrList, Document, ElementData, NodeId, NodeType};

use crate::tags;
use crate::tokenizer::{Attribute, Token};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    ///
    /// Also absorbs the "after after body" mode: trailing comments attach to
    /// the html element rather than the Document node.
    AfterBody,
}

/// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
///
/// "The error handling for parse errors is well-defined... this specification
/// defines how to handle all of them." Issues never abort parsing; callers
/// decide whether to surface them.
#[derive(Debug, Clone)]
pub struct ParseIssue {
    /// Description of the parse error per the spec's error definitions.
    pub message: String,
    /// Index into the token stream where this issue was encountered.
    pub token_index: usize,
    /// True for spec-defined parse errors, false for tolerated oddities.
    pub is_error: bool,
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// Builds a [`Document`] from a token stream. Whatever the input, the
/// resulting tree always carries the html/head/body skeleton: missing
/// elements are synthesized, which the end-of-file token guarantees by
/// cascading through the skeleton modes.
pub struct TreeBuilder {
    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    insertion_mode: InsertionMode,

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    ///
    /// Stores `NodeId`s into the arena.
    stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    head_element_pointer: Option<NodeId>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    ///
    /// Points at the body element once created, for attribute merging when a
    /// stray second `<body>` tag shows up.
    body_element_pointer: Option<NodeId>,

    /// The arena under construction. `NodeId::ROOT` is the Document node.
    tree: Document,

    /// Input tokens from the tokenizer.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    token_index: usize,

    /// Whether parsing has stopped (end-of-file token processed).
    stopped: bool,

    /// Parse issues encountered during tree construction.
    issues: Vec<ParseIssue>,
}

impl TreeBuilder {
    /// Create a new tree builder from a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        // Document::new() creates the Document node at NodeId::ROOT.
        Self {
            insertion_mode: InsertionMode::Initial,
            stack_of_open_elements: Vec::new(),
            head_element_pointer: None,
            body_element_pointer: None,
            tree: Document::new(),
            tokens,
            token_index: 0,
            stopped: false,
            issues: Vec::new(),
        }
    }

    /// Run the builder and return the document tree.
    #[must_use]
    pub fn run(mut self) -> Document {
        while !self.stopped && self.token_index < self.tokens.len() {
            let token = self.tokens[self.token_index].clone();
            self.process_token(&token);
            self.token_index += 1;
        }
        self.tree
    }

    /// Run the builder and return both the tree and the parse issues.
    #[must_use]
    pub fn run_with_issues(mut self) -> (Document, Vec<ParseIssue>) {
        while !self.stopped && self.token_index < self.tokens.len() {
            let token = self.tokens[self.token_index].clone();
            self.process_token(&token);
            self.token_index += 1;
        }
        let issues = std::mem::take(&mut self.issues);
        (self.tree, issues)
    }

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn process_token(&mut self, token: &Token) {
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
        }
    }

    /// "Reprocess the token" - process the same token again in a new
    /// insertion mode.
    fn reprocess_token(&mut self, token: &Token) {
        self.process_token(token);
    }

    /// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
    fn parse_issue(&mut self, message: &str, is_error: bool) {
        self.issues.push(ParseIssue {
            message: message.to_string(),
            token_index: self.token_index,
            is_error,
        });
    }

    // ========================================================================
    // Stack and insertion helpers
    // ========================================================================

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    const fn is_whitespace(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
    }

    /// Byte length of the leading ASCII whitespace run in `data`.
    fn leading_whitespace_len(data: &str) -> usize {
        data.len() - data.trim_start_matches(Self::is_whitespace).len()
    }

    /// [§ 13.2.4.3 Current node](https://html.spec.whatwg.org/multipage/parsing.html#current-node)
    ///
    /// "The current node is the bottommost node in this stack of open
    /// elements."
    fn current_node(&self) -> NodeId {
        self.stack_of_open_elements
            .last()
            .copied()
            .unwrap_or(NodeId::ROOT)
    }

    fn get_tag_name(&self, id: NodeId) -> Option<&str> {
        self.tree.as_element(id).map(|data| data.tag_name.as_str())
    }

    fn current_tag_name(&self) -> Option<&str> {
        self.get_tag_name(self.current_node())
    }

    /// [§ 13.2.6.1 Create an element for the token](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    ///
    /// Duplicate attributes are dropped, first occurrence wins:
    /// "there is already an attribute on the token with the exact same name,
    /// then this is a duplicate-attribute parse error and the new attribute
    /// must be removed from the token."
    fn create_element_for_token(&mut self, name: &str, attributes: &[Attribute]) -> NodeId {
        let mut attrs = AttrList::new();
        for attr in attributes {
            if !attrs.add(&attr.name, &attr.value) {
                self.parse_issue(&format!("duplicate attribute '{}'", attr.name), true);
            }
        }
        self.tree.alloc(NodeType::Element(ElementData {
            tag_name: name.to_string(),
            attrs,
        }))
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// STEP 1: Create an element for the token.
    /// STEP 2: Append it at the appropriate place (the current node).
    /// STEP 3: Push it onto the stack of open elements.
    fn insert_element_for_token(&mut self, name: &str, attributes: &[Attribute]) -> NodeId {
        let element_id = self.create_element_for_token(name, attributes);
        let parent = self.current_node();
        self.tree.append_child(parent, element_id);
        self.stack_of_open_elements.push(element_id);
        element_id
    }

    /// Insert an element and immediately pop it. Used for void elements:
    /// "Insert an HTML element for the token. Immediately pop the current
    /// node off the stack of open elements."
    fn insert_void_element_for_token(&mut self, name: &str, attributes: &[Attribute]) -> NodeId {
        let element_id = self.insert_element_for_token(name, attributes);
        let _ = self.stack_of_open_elements.pop();
        element_id
    }

    /// Synthesize an element that was missing from the input (html, head or
    /// body), without a source token.
    fn insert_phantom_element(&mut self, name: &str) -> NodeId {
        let element_id = self.tree.create_element(name);
        let parent = self.current_node();
        self.tree.append_child(parent, element_id);
        self.stack_of_open_elements.push(element_id);
        element_id
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data. Otherwise,
    /// create a new Text node".
    fn insert_text(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        let parent = self.current_node();
        if let Some(&last) = self.tree.children(parent).last()
            && let Some(node) = self.tree.get_mut(last)
            && let NodeType::Text(ref mut existing) = node.node_type
        {
            existing.push_str(data);
            return;
        }
        let text_id = self.tree.create_text(data);
        self.tree.append_child(parent, text_id);
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    fn insert_comment(&mut self, data: &str) {
        let parent = self.current_node();
        let comment_id = self.tree.alloc(NodeType::Comment(data.to_string()));
        self.tree.append_child(parent, comment_id);
    }

    /// Insert a comment as the last child of the Document node. Used for
    /// comments that appear before `<html>`.
    fn insert_comment_to_document(&mut self, data: &str) {
        let comment_id = self.tree.alloc(NodeType::Comment(data.to_string()));
        self.tree.append_child(NodeId::ROOT, comment_id);
    }

    /// Pop elements from the stack of open elements until one with the given
    /// tag name has been popped (inclusive).
    fn pop_until_tag(&mut self, tag_name: &str) {
        while let Some(id) = self.stack_of_open_elements.pop() {
            if self.get_tag_name(id) == Some(tag_name) {
                break;
            }
        }
    }

    /// [§ 13.2.4.2 Has an element in the specific scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    ///
    /// STEP 1: "Initialize node to be the current node."
    /// STEP 2: "If node is the target node, terminate in a match state."
    /// STEP 3: "Otherwise, if node is one of the element types in list,
    ///          terminate in a failure state."
    /// STEP 4: "Otherwise, set node to the previous entry in the stack of
    ///          open elements and return to step 2."
    fn has_element_in_specific_scope(&self, tag_name: &str, scope_markers: &[&str]) -> bool {
        for &node_id in self.stack_of_open_elements.iter().rev() {
            if let Some(node_tag) = self.get_tag_name(node_id) {
                if node_tag == tag_name {
                    return true;
                }
                if scope_markers.contains(&node_tag) {
                    return false;
                }
            }
        }
        false
    }

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-button-scope)
    ///
    /// "has an element in button scope" - default scope markers plus button.
    fn has_element_in_button_scope(&self, tag_name: &str) -> bool {
        const BUTTON_SCOPE: &[&str] = &[
            "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
            "button",
        ];
        self.has_element_in_specific_scope(tag_name, BUTTON_SCOPE)
    }

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-list-item-scope)
    ///
    /// "has an element in list item scope" - default scope markers plus
    /// ol, ul.
    fn has_element_in_list_item_scope(&self, tag_name: &str) -> bool {
        const LIST_ITEM_SCOPE: &[&str] = &[
            "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
            "ol", "ul",
        ];
        self.has_element_in_specific_scope(tag_name, LIST_ITEM_SCOPE)
    }

    /// [§ 13.2.6.4.7 Close a p element](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    ///
    /// Closes an open paragraph if one is in button scope. Flow content
    /// start tags call this before inserting themselves.
    fn close_p_element_if_open(&mut self) {
        if self.has_element_in_button_scope("p") {
            if self.current_tag_name() != Some("p") {
                self.parse_issue("unclosed elements inside paragraph", true);
            }
            self.pop_until_tag("p");
        }
    }

    /// [§ 13.1.1 Special elements](https://html.spec.whatwg.org/multipage/parsing.html#special)
    ///
    /// "The following elements have varying levels of special parsing
    /// rules... they are collectively known as special elements."
    fn is_special_element(tag_name: &str) -> bool {
        matches!(
            tag_name,
            "address"
                | "applet"
                | "area"
                | "article"
                | "aside"
                | "base"
                | "basefont"
                | "bgsound"
                | "blockquote"
                | "body"
                | "br"
                | "button"
                | "caption"
                | "center"
                | "col"
                | "colgroup"
                | "dd"
                | "details"
                | "dir"
                | "div"
                | "dl"
                | "dt"
                | "embed"
                | "fieldset"
                | "figcaption"
                | "figure"
                | "footer"
                | "form"
                | "frame"
                | "frameset"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "head"
                | "header"
                | "hgroup"
                | "hr"
                | "html"
                | "iframe"
                | "img"
                | "input"
                | "keygen"
                | "li"
                | "link"
                | "listing"
                | "main"
                | "marquee"
                | "menu"
                | "meta"
                | "nav"
                | "noembed"
                | "noframes"
                | "noscript"
                | "object"
                | "ol"
                | "p"
                | "param"
                | "plaintext"
                | "pre"
                | "script"
                | "search"
                | "section"
                | "select"
                | "source"
                | "style"
                | "summary"
                | "table"
                | "tbody"
                | "td"
                | "template"
                | "textarea"
                | "tfoot"
                | "th"
                | "thead"
                | "title"
                | "tr"
                | "track"
                | "ul"
                | "wbr"
                | "xmp"
        )
    }

    /// [§ 13.2.6.4.7 "in body" - Any other end tag](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// STEP 1: "Initialize node to be the current node."
    /// STEP 2: "Loop: If node is an HTML element with the same tag name as
    ///          the token... pop all the nodes from the current node up to
    ///          node, including node, then stop these steps."
    /// STEP 3: "Otherwise, if node is in the special category, then this is
    ///          a parse error; ignore the token, and return."
    /// STEP 4: "Set node to the previous entry... and return to the step
    ///          labeled loop."
    fn any_other_end_tag(&mut self, tag_name: &str) {
        let mut i = self.stack_of_open_elements.len();
        while i > 0 {
            i -= 1;
            let node_id = self.stack_of_open_elements[i];
            if let Some(node_tag) = self.get_tag_name(node_id) {
                // STEP 2: If node matches the tag name, pop through it.
                if node_tag == tag_name {
                    if i + 1 != self.stack_of_open_elements.len() {
                        self.parse_issue(
                            &format!("end tag '{tag_name}' closed unclosed children"),
                            true,
                        );
                    }
                    self.stack_of_open_elements.truncate(i);
                    return;
                }
                // STEP 3: A special element blocks the search.
                if Self::is_special_element(node_tag) {
                    self.parse_issue(&format!("unexpected end tag '{tag_name}'"), true);
                    return;
                }
            }
        }
        self.parse_issue(&format!("unexpected end tag '{tag_name}'"), true);
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// A stray `<html>` or `<body>` start tag merges its attributes into the
    /// existing element: "for each attribute on the token, check to see if
    /// the attribute is already present on the element. If it is not, add
    /// the attribute".
    fn merge_attributes_into(&mut self, target: NodeId, attributes: &[Attribute]) {
        if let Some(data) = self.tree.as_element_mut(target) {
            for attr in attributes {
                let _ = data.attrs.add(&attr.name, &attr.value);
            }
        }
    }

    fn html_element(&self) -> Option<NodeId> {
        self.stack_of_open_elements.first().copied()
    }

    // ========================================================================
    // Insertion modes
    // ========================================================================

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    fn handle_initial_mode(&mut self, token: &Token) {
        match token {
            // "A DOCTYPE token - ... then switch the insertion mode to
            // "before html"." The declaration itself is discarded; the
            // serializer always re-emits the standard doctype.
            Token::Doctype => self.insertion_mode = InsertionMode::BeforeHtml,
            // "A comment token - Insert a comment as the last child of the
            // Document object."
            Token::Comment { data } => self.insert_comment_to_document(data),
            // Whitespace - "Ignore the token."
            Token::Text { data } => {
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    return;
                }
                self.parse_issue("expected doctype before content", true);
                self.insertion_mode = InsertionMode::BeforeHtml;
                let rest = Token::Text {
                    data: data[ws_len..].to_string(),
                };
                self.reprocess_token(&rest);
            }
            // "Anything else - ... In any case, switch the insertion mode to
            // "before html", then reprocess the token."
            _ => {
                self.parse_issue("expected doctype before content", true);
                self.insertion_mode = InsertionMode::BeforeHtml;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn handle_before_html_mode(&mut self, token: &Token) {
        match token {
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            // "A comment token - Insert a comment as the last child of the
            // Document object."
            Token::Comment { data } => self.insert_comment_to_document(data),
            // Whitespace - "Ignore the token."
            Token::Text { data } => {
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    return;
                }
                self.synthesize_html_and_reprocess(&Token::Text {
                    data: data[ws_len..].to_string(),
                });
            }
            // "A start tag whose tag name is "html" - Create an element for
            // the token... Append it to the Document object. Put this
            // element in the stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                let element_id = self.create_element_for_token(name, attributes);
                self.tree.append_child(NodeId::ROOT, element_id);
                self.stack_of_open_elements.push(element_id);
                self.insertion_mode = InsertionMode::BeforeHead;
            }
            // "An end tag whose tag name is one of: "head", "body", "html",
            // "br" - Act as described in the "anything else" entry below."
            Token::EndTag { name } if matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.synthesize_html_and_reprocess(token);
            }
            // "Any other end tag - Parse error. Ignore the token."
            Token::EndTag { name } => {
                self.parse_issue(&format!("unexpected end tag '{name}'"), true);
            }
            // "Anything else - Create an html element... Append it to the
            // Document object... Switch the insertion mode to "before head",
            // then reprocess the token."
            _ => self.synthesize_html_and_reprocess(token),
        }
    }

    fn synthesize_html_and_reprocess(&mut self, token: &Token) {
        let element_id = self.tree.create_element("html");
        self.tree.append_child(NodeId::ROOT, element_id);
        self.stack_of_open_elements.push(element_id);
        self.insertion_mode = InsertionMode::BeforeHead;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn handle_before_head_mode(&mut self, token: &Token) {
        match token {
            // Whitespace - "Ignore the token."
            Token::Text { data } => {
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    return;
                }
                self.synthesize_head_and_reprocess(&Token::Text {
                    data: data[ws_len..].to_string(),
                });
            }
            // "A comment token - Insert a comment."
            Token::Comment { data } => self.insert_comment(data),
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            // "A start tag whose tag name is "html" - Process the token
            // using the rules for the "in body" insertion mode."
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                self.parse_issue("duplicate html start tag", true);
                if let Some(html) = self.html_element() {
                    self.merge_attributes_into(html, attributes);
                }
            }
            // "A start tag whose tag name is "head" - Insert an HTML element
            // for the token. Set the head element pointer to the newly
            // created head element. Switch the insertion mode to "in head"."
            Token::StartTag {
                name, attributes, ..
            } if name == "head" => {
                let head_id = self.insert_element_for_token(name, attributes);
                self.head_element_pointer = Some(head_id);
                self.insertion_mode = InsertionMode::InHead;
            }
            // "An end tag whose tag name is one of: "head", "body", "html",
            // "br" - Act as described in the "anything else" entry below."
            Token::EndTag { name } if matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.synthesize_head_and_reprocess(token);
            }
            // "Any other end tag - Parse error. Ignore the token."
            Token::EndTag { name } => {
                self.parse_issue(&format!("unexpected end tag '{name}'"), true);
            }
            // "Anything else - Insert an HTML element for a "head" start tag
            // token with no attributes... Switch the insertion mode to
            // "in head". Reprocess the current token."
            _ => self.synthesize_head_and_reprocess(token),
        }
    }

    fn synthesize_head_and_reprocess(&mut self, token: &Token) {
        let head_id = self.insert_phantom_element("head");
        self.head_element_pointer = Some(head_id);
        self.insertion_mode = InsertionMode::InHead;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    ///
    /// Raw-text elements opened in head (title, style, script, noscript,
    /// noframes, template) stay on the stack while this mode is active, so
    /// their text content and nested elements insert into them directly.
    /// The dedicated "text" and "in head noscript" modes are not needed.
    fn handle_in_head_mode(&mut self, token: &Token) {
        match token {
            Token::Text { data } => {
                // Text inside an open title/style/script/noscript child
                // belongs to that element verbatim.
                if self.current_tag_name() != Some("head") {
                    self.insert_text(data);
                    return;
                }
                // Whitespace - "Insert the character." Anything beyond the
                // leading whitespace run belongs after the head.
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    self.insert_text(data);
                    return;
                }
                if ws_len > 0 {
                    self.insert_text(&data[..ws_len]);
                }
                self.close_head_and_reprocess(&Token::Text {
                    data: data[ws_len..].to_string(),
                });
            }
            // "A comment token - Insert a comment."
            Token::Comment { data } => self.insert_comment(data),
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            Token::StartTag {
                name, attributes, ..
            } => match name.as_str() {
                "html" => {
                    self.parse_issue("duplicate html start tag", true);
                    if let Some(html) = self.html_element() {
                        self.merge_attributes_into(html, attributes);
                    }
                }
                // "A start tag whose tag name is one of: "base", "basefont",
                // "bgsound", "link", "meta" - Insert an HTML element for the
                // token. Immediately pop the current node off the stack of
                // open elements."
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    let _ = self.insert_void_element_for_token(name, attributes);
                }
                // Title, style, script and friends keep their element on the
                // stack so following text lands inside it.
                "title" | "style" | "script" | "noscript" | "noframes" | "template" => {
                    let _ = self.insert_element_for_token(name, attributes);
                }
                // "A start tag whose tag name is "head" - Parse error.
                // Ignore the token."
                "head" => self.parse_issue("duplicate head start tag", true),
                // "Anything else - Pop the current node (which will be the
                // head element)... Switch the insertion mode to "after
                // head". Reprocess the token."
                _ => self.close_head_and_reprocess(token),
            },
            Token::EndTag { name } => match name.as_str() {
                // "An end tag whose tag name is "head" - Pop the current
                // node... Switch the insertion mode to "after head"."
                "head" => {
                    self.pop_until_tag("head");
                    self.insertion_mode = InsertionMode::AfterHead;
                }
                // "An end tag whose tag name is one of: "body", "html",
                // "br" - Act as described in the "anything else" entry."
                "body" | "html" | "br" => self.close_head_and_reprocess(token),
                // End tags for the open title/style/script/noscript children.
                _ => {
                    let on_stack = self
                        .stack_of_open_elements
                        .iter()
                        .any(|&id| self.get_tag_name(id) == Some(name.as_str()));
                    if on_stack {
                        self.pop_until_tag(name);
                    } else {
                        self.parse_issue(&format!("unexpected end tag '{name}'"), true);
                    }
                }
            },
            // "Anything else" - see close_head_and_reprocess.
            Token::EndOfFile => self.close_head_and_reprocess(token),
        }
    }

    fn close_head_and_reprocess(&mut self, token: &Token) {
        self.pop_until_tag("head");
        self.insertion_mode = InsertionMode::AfterHead;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn handle_after_head_mode(&mut self, token: &Token) {
        match token {
            Token::Text { data } => {
                // Whitespace - "Insert the character."
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    self.insert_text(data);
                    return;
                }
                if ws_len > 0 {
                    self.insert_text(&data[..ws_len]);
                }
                self.synthesize_body_and_reprocess(&Token::Text {
                    data: data[ws_len..].to_string(),
                });
            }
            // "A comment token - Insert a comment."
            Token::Comment { data } => self.insert_comment(data),
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            Token::StartTag {
                name, attributes, ..
            } => match name.as_str() {
                "html" => {
                    self.parse_issue("duplicate html start tag", true);
                    if let Some(html) = self.html_element() {
                        self.merge_attributes_into(html, attributes);
                    }
                }
                // "A start tag whose tag name is "body" - Insert an HTML
                // element for the token... Switch the insertion mode to
                // "in body"."
                "body" => {
                    let body_id = self.insert_element_for_token(name, attributes);
                    self.body_element_pointer = Some(body_id);
                    self.insertion_mode = InsertionMode::InBody;
                }
                // Late metadata void tags still belong to the head:
                // "Parse error. Push the node pointed to by the head element
                // pointer onto the stack of open elements. Process the token
                // using the rules for the "in head" insertion mode..."
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    self.parse_issue(&format!("'{name}' start tag after head"), true);
                    if let Some(head_id) = self.head_element_pointer {
                        let element_id = self.create_element_for_token(name, attributes);
                        self.tree.append_child(head_id, element_id);
                    }
                }
                // "A start tag whose tag name is "head" - Parse error.
                // Ignore the token."
                "head" => self.parse_issue("duplicate head start tag", true),
                // "Anything else - Insert an HTML element for a "body" start
                // tag token with no attributes... Reprocess the current
                // token." Late title/style/script tags take this path and
                // end up in the body, where the style and script passes
                // still find them.
                _ => self.synthesize_body_and_reprocess(token),
            },
            // "An end tag whose tag name is one of: "body", "html", "br" -
            // Act as described in the "anything else" entry below."
            Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
                self.synthesize_body_and_reprocess(token);
            }
            // "Any other end tag - Parse error. Ignore the token."
            Token::EndTag { name } => {
                self.parse_issue(&format!("unexpected end tag '{name}'"), true);
            }
            _ => self.synthesize_body_and_reprocess(token),
        }
    }

    fn synthesize_body_and_reprocess(&mut self, token: &Token) {
        let body_id = self.insert_phantom_element("body");
        self.body_element_pointer = Some(body_id);
        self.insertion_mode = InsertionMode::InBody;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn handle_in_body_mode(&mut self, token: &Token) {
        match token {
            Token::Text { data } => {
                // "U+0000 NULL - Parse error. Ignore the token."
                if data.contains('\0') {
                    self.parse_issue("unexpected null character", true);
                    let cleaned: String = data.chars().filter(|&c| c != '\0').collect();
                    self.insert_text(&cleaned);
                } else {
                    self.insert_text(data);
                }
            }
            // "A comment token - Insert a comment."
            Token::Comment { data } => self.insert_comment(data),
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.handle_in_body_start_tag(name, attributes, *self_closing),
            Token::EndTag { name } => self.handle_in_body_end_tag(name),
            // "An end-of-file token - If the stack of open elements contains
            // a node that is not [on the allowed list], then this is a parse
            // error. ... Stop parsing."
            Token::EndOfFile => {
                let unclosed: Vec<String> = self
                    .stack_of_open_elements
                    .iter()
                    .filter_map(|&id| self.get_tag_name(id))
                    .filter(|tag| !matches!(*tag, "html" | "body" | "p" | "li" | "dd" | "dt"))
                    .map(str::to_string)
                    .collect();
                for tag in unclosed {
                    self.parse_issue(&format!("unclosed element '{tag}' at end of file"), true);
                }
                self.stopped = true;
            }
        }
    }

    fn handle_in_body_start_tag(&mut self, name: &str, attributes: &[Attribute], self_closing: bool) {
        match name {
            // "A start tag whose tag name is "html" - Parse error. ...
            // Otherwise, for each attribute on the token, check to see if
            // the attribute is already present on the top element of the
            // stack of open elements. If it is not, add the attribute."
            "html" => {
                self.parse_issue("html start tag inside body", true);
                if let Some(html) = self.html_element() {
                    self.merge_attributes_into(html, attributes);
                }
            }
            // "A start tag whose tag name is "head" - Parse error. Ignore."
            "head" => self.parse_issue("head start tag inside body", true),
            // "A start tag whose tag name is "body" - Parse error. ...
            // for each attribute on the token... add the attribute and its
            // corresponding value to that element."
            "body" => {
                self.parse_issue("body start tag inside body", true);
                if let Some(body) = self.body_element_pointer {
                    self.merge_attributes_into(body, attributes);
                }
            }
            // "A start tag whose tag name is one of: "h1"..."h6" - If the
            // stack of open elements has a p element in button scope, then
            // close a p element. If the current node is an HTML element
            // whose tag name is one of "h1"..."h6", then this is a parse
            // error; pop the current node off the stack of open elements."
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.close_p_element_if_open();
                if let Some(current) = self.current_tag_name()
                    && matches!(current, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                {
                    self.parse_issue("nested heading element", true);
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_element_for_token(name, attributes);
            }
            // "A start tag whose tag name is "li" - ... if node is an li
            // element, then... pop elements from the stack of open elements
            // until an li element has been popped... If the stack of open
            // elements has a p element in button scope, then close a
            // p element. Finally, insert an HTML element for the token."
            "li" => {
                if self.has_element_in_list_item_scope("li") {
                    self.pop_until_tag("li");
                }
                self.close_p_element_if_open();
                let _ = self.insert_element_for_token(name, attributes);
            }
            // "A start tag whose tag name is one of: "dd", "dt" - same
            // shape as li with the dd/dt pair."
            "dd" | "dt" => {
                if self.has_element_in_list_item_scope("dd") {
                    self.pop_until_tag("dd");
                } else if self.has_element_in_list_item_scope("dt") {
                    self.pop_until_tag("dt");
                }
                self.close_p_element_if_open();
                let _ = self.insert_element_for_token(name, attributes);
            }
            _ => {
                // Flow content start tags close an open paragraph first.
                if tags::closes_paragraph(name) {
                    self.close_p_element_if_open();
                }
                if tags::is_void(name) {
                    let _ = self.insert_void_element_for_token(name, attributes);
                } else {
                    // "Non-void-html-element-start-tag-with-trailing-solidus
                    // parse error" - the flag is ignored and the element
                    // stays open.
                    if self_closing {
                        self.parse_issue(
                            &format!("self-closing syntax on non-void element '{name}'"),
                            true,
                        );
                    }
                    let _ = self.insert_element_for_token(name, attributes);
                }
            }
        }
    }

    fn handle_in_body_end_tag(&mut self, name: &str) {
        match name {
            // "An end tag whose tag name is "body" - If the stack of open
            // elements does not have a body element in scope, this is a
            // parse error; ignore the token. Otherwise... switch the
            // insertion mode to "after body"."
            //
            // The body element stays on the stack so trailing whitespace
            // still inserts into it.
            "body" => {
                if self.body_element_pointer.is_some() {
                    self.insertion_mode = InsertionMode::AfterBody;
                } else {
                    self.parse_issue("unexpected end tag 'body'", true);
                }
            }
            // "An end tag whose tag name is "html" - Act as described for
            // "body", then reprocess;" collapsed here to the same switch.
            "html" => {
                if self.body_element_pointer.is_some() {
                    self.insertion_mode = InsertionMode::AfterBody;
                } else {
                    self.parse_issue("unexpected end tag 'html'", true);
                }
            }
            // "An end tag whose tag name is "p" - If the stack of open
            // elements does not have a p element in button scope, then this
            // is a parse error... Close a p element."
            "p" => {
                if self.has_element_in_button_scope("p") {
                    self.pop_until_tag("p");
                } else {
                    self.parse_issue("unexpected end tag 'p'", true);
                }
            }
            // "An end tag whose tag name is "br" - Parse error. Drop the
            // attributes from the token, and act as described in the next
            // entry; i.e. act as if this was a "br" start tag token".
            "br" => {
                self.parse_issue("end tag 'br' treated as start tag", true);
                let _ = self.insert_void_element_for_token("br", &[]);
            }
            _ => self.any_other_end_tag(name),
        }
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    fn handle_after_body_mode(&mut self, token: &Token) {
        match token {
            // "A comment token - Insert a comment as the last child of the
            // first element in the stack of open elements (the html
            // element)."
            Token::Comment { data } => {
                if let Some(html) = self.html_element() {
                    let comment_id = self.tree.alloc(NodeType::Comment(data.to_string()));
                    self.tree.append_child(html, comment_id);
                } else {
                    self.insert_comment_to_document(data);
                }
            }
            // "A DOCTYPE token - Parse error. Ignore the token."
            Token::Doctype => self.parse_issue("unexpected doctype", true),
            // Whitespace - "Process the token using the rules for the
            // "in body" insertion mode."
            Token::Text { data } => {
                let ws_len = Self::leading_whitespace_len(data);
                if ws_len == data.len() {
                    self.insert_text(data);
                    return;
                }
                // "Anything else - Parse error. Switch the insertion mode to
                // "in body" and reprocess the token."
                self.parse_issue("content after end of body", true);
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
            // "A start tag whose tag name is "html" - Process the token
            // using the rules for the "in body" insertion mode."
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                if let Some(html) = self.html_element() {
                    self.merge_attributes_into(html, attributes);
                }
            }
            // "An end tag whose tag name is "html" - Switch the insertion
            // mode to "after after body"." Collapsed: nothing left to do.
            Token::EndTag { name } if name == "html" => {}
            // "An end-of-file token - Stop parsing."
            Token::EndOfFile => self.stopped = true,
            // "Anything else - Parse error. Switch the insertion mode to
            // "in body" and reprocess the token."
            _ => {
                self.parse_issue("content after end of body", true);
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
        }
    }
}
