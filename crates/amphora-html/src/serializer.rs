//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! Re-emits a [`Document`] as HTML source. The serializer is deliberately
//! conservative so that serialize-then-parse reaches a fixed point:
//!
//! - text and comment data are emitted verbatim, character references that
//!   survived parsing stay exactly as written
//! - attribute values are double-quoted and only `"` is escaped
//! - attributes with an empty value are emitted as bare names (`<html amp>`)
//! - void elements get no end tag, everything else always gets one
//! - the document form always starts with `<!DOCTYPE html>` regardless of
//!   what the input declared

use amphora_dom::{Document, ElementData, NodeId, NodeType};

use crate::tags;

/// Output form of [`serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeMode {
    /// The whole document: doctype, html element and any root-level
    /// comments.
    FullDocument,
    /// Only the children of the body element, concatenated. Used when the
    /// input was a fragment wrapped in a skeleton for parsing.
    Fragment,
}

/// Serialize a document tree to HTML source text.
#[must_use]
pub fn serialize(document: &Document, mode: SerializeMode) -> String {
    let mut output = String::new();
    match mode {
        SerializeMode::FullDocument => {
            // "If the node is a Document node, append the literal string
            // "<!DOCTYPE html>"" - the original declaration was discarded
            // during tokenization.
            output.push_str("<!DOCTYPE html>");
            for &child in document.children(NodeId::ROOT) {
                serialize_node(document, child, &mut output);
            }
        }
        SerializeMode::Fragment => {
            if let Some(body) = document.body() {
                for &child in document.children(body) {
                    serialize_node(document, child, &mut output);
                }
            }
        }
    }
    output
}

fn serialize_node(document: &Document, id: NodeId, output: &mut String) {
    let Some(node) = document.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Document => {
            for &child in document.children(id) {
                serialize_node(document, child, output);
            }
        }
        NodeType::Element(data) => serialize_element(document, id, data, output),
        // "If current node is a Text node, append the value of current
        // node's data." Verbatim: escaping here would double-encode
        // references the parser never decoded.
        NodeType::Text(text) => output.push_str(text),
        NodeType::Comment(data) => {
            output.push_str("<!--");
            output.push_str(data);
            output.push_str("-->");
        }
    }
}

/// [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
///
/// "Append a U+003C LESS-THAN SIGN character (<), followed by the element's
/// tag name... For each attribute... append a U+0020 SPACE character, the
/// attribute's serialized name... a U+003D EQUALS SIGN character (=), a
/// U+0022 QUOTATION MARK character ("), the attribute's value, escaped as
/// described below in attribute mode, and a second U+0022 QUOTATION MARK
/// character (")."
fn serialize_element(document: &Document, id: NodeId, data: &ElementData, output: &mut String) {
    output.push('<');
    output.push_str(&data.tag_name);
    for attr in &data.attrs {
        output.push(' ');
        output.push_str(&attr.name);
        // Boolean attributes like `amp` or `async` serialize as bare names.
        if !attr.value.is_empty() {
            output.push_str("=\"");
            output.push_str(&escape_attribute_value(&attr.value));
            output.push('"');
        }
    }
    output.push('>');

    // "If current node's local name is area, base, basefont, bgsound, br,
    // col, embed, frame, hr, img, input, link, meta, param, source, track
    // or wbr, then continue on to the next child node at this point."
    if tags::is_void(&data.tag_name) {
        return;
    }

    for &child in document.children(id) {
        serialize_node(document, child, output);
    }

    output.push_str("</");
    output.push_str(&data.tag_name);
    output.push('>');
}

/// Escape an attribute value for double-quoted serialization.
///
/// Only the quote character itself breaks the syntax; ampersands stay
/// literal to keep already-encoded values stable across round trips.
fn escape_attribute_value(value: &str) -> String {
    value.replace('"', "&quot;")
}
