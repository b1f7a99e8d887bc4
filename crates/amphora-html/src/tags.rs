//! Element classification shared by the tokenizer, tree builder, and
//! serializer.

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified for
/// void elements."
#[must_use]
pub fn is_void(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// [§ 13.2.6.2 / § 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generic-raw-text-element-parsing-algorithm)
///
/// Elements whose content is lexed as raw text rather than markup. The RCDATA
/// elements (`title`, `textarea`) are folded in here: their only difference
/// is character reference decoding, which this tokenizer never performs.
///
/// `noscript` is deliberately absent - its children are parsed as markup so
/// the no-JS fallback content stays available to sanitizers.
#[must_use]
pub fn is_raw_text(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "script" | "style" | "title" | "textarea" | "iframe" | "xmp" | "noembed" | "noframes"
    )
}

/// Block-ish elements that implicitly close an open `p` element.
///
/// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
/// "A start tag whose tag name is one of: "address", ... "p", ... If the
/// stack of open elements has a p element in button scope, then close a p
/// element."
#[must_use]
pub fn closes_paragraph(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "figcaption"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}
