//! `<noscript>` normalization.
//!
//! AMP pages run without author JavaScript, so no-JS fallback content is the
//! content. Body `<noscript>` wrappers are unwrapped in place; the
//! boilerplate noscript in head is the runtime's own contract and stays.

use amphora_dom::Document;

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Unwraps `<noscript>` elements in the body, promoting their children.
#[derive(Debug, Default)]
pub struct ScriptSanitizer;

impl Sanitizer for ScriptSanitizer {
    fn name(&self) -> &'static str {
        "script"
    }

    fn stage(&self) -> Stage {
        Stage::Content
    }

    fn sanitize(&self, doc: &mut Document, _ctx: &mut PipelineContext) {
        let Some(body) = doc.body() else {
            return;
        };
        for id in doc.elements_by_tag("noscript") {
            if doc.is_descendant_of(id, body) {
                doc.unwrap_node(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::{SerializeMode, parse_fragment, serialize};

    use super::*;

    #[test]
    fn test_body_noscript_is_unwrapped() {
        let mut doc =
            parse_fragment("<p>a</p><noscript><img src=\"x.jpg\"></noscript><p>b</p>").unwrap();
        ScriptSanitizer.sanitize(&mut doc, &mut PipelineContext::new());
        assert!(doc.elements_by_tag("noscript").is_empty());
        assert_eq!(
            serialize(&doc, SerializeMode::Fragment),
            "<p>a</p><img src=\"x.jpg\"><p>b</p>"
        );
    }

    #[test]
    fn test_head_noscript_stays() {
        let mut doc = amphora_html::parse_document(
            "<html><head><noscript><style amp-boilerplate>body{}</style></noscript></head>\
             <body></body></html>",
        )
        .unwrap();
        ScriptSanitizer.sanitize(&mut doc, &mut PipelineContext::new());
        assert_eq!(doc.elements_by_tag("noscript").len(), 1);
    }
}
