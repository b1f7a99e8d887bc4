//! Head metadata normalization.

use amphora_dom::{Document, NodeId};

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Required viewport settings, guaranteed present after normalization.
const VIEWPORT_REQUIRED: &str = "width=device-width";

/// Ensures exactly one `<meta charset>` and one viewport meta, converting
/// legacy `http-equiv` declarations and merging duplicate viewports.
#[derive(Debug, Default)]
pub struct MetaSanitizer;

impl Sanitizer for MetaSanitizer {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn stage(&self) -> Stage {
        Stage::Meta
    }

    fn sanitize(&self, doc: &mut Document, _ctx: &mut PipelineContext) {
        let Some(head) = doc.head() else {
            return;
        };

        let mut charset: Option<NodeId> = None;
        let mut viewport: Option<NodeId> = None;
        for id in doc.elements_by_tag("meta") {
            let Some(element) = doc.as_element(id) else {
                continue;
            };
            if element.has_attr("charset") {
                if charset.is_some() {
                    doc.detach(id);
                } else {
                    charset = Some(id);
                }
            } else if element
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
            {
                // Legacy declaration: keep the element, restate it as a
                // charset meta.
                if charset.is_some() {
                    doc.detach(id);
                } else {
                    let element = doc.as_element_mut(id).expect("checked above");
                    let _ = element.remove_attr("http-equiv");
                    let _ = element.remove_attr("content");
                    element.set_attr("charset", "utf-8");
                    charset = Some(id);
                }
            } else if element
                .attr("name")
                .is_some_and(|v| v.eq_ignore_ascii_case("viewport"))
            {
                if viewport.is_some() {
                    doc.detach(id);
                } else {
                    viewport = Some(id);
                }
            }
        }

        match charset {
            Some(id) => {
                if let Some(element) = doc.as_element_mut(id) {
                    element.set_attr("charset", "utf-8");
                }
            }
            None => {
                let meta = doc.create_element("meta");
                if let Some(element) = doc.as_element_mut(meta) {
                    element.set_attr("charset", "utf-8");
                }
                doc.prepend_child(head, meta);
            }
        }

        match viewport {
            Some(id) => {
                let Some(element) = doc.as_element_mut(id) else {
                    return;
                };
                let content = element.attr("content").unwrap_or_default();
                let merged = merge_viewport(content);
                element.set_attr("content", &merged);
            }
            None => {
                let meta = doc.create_element("meta");
                if let Some(element) = doc.as_element_mut(meta) {
                    element.set_attr("name", "viewport");
                    element.set_attr("content", VIEWPORT_REQUIRED);
                }
                doc.append_child(head, meta);
            }
        }
    }
}

/// Merge a viewport content value with the required settings: `width` is
/// forced to `device-width`, everything else the author declared is kept.
fn merge_viewport(content: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(VIEWPORT_REQUIRED.to_string());
    for part in content.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let name = part.split('=').next().unwrap_or(part).trim();
        if !name.eq_ignore_ascii_case("width") {
            parts.push(part.to_string());
        }
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_document;

    use super::*;

    fn run(html: &str) -> Document {
        let mut doc = parse_document(html).unwrap();
        MetaSanitizer.sanitize(&mut doc, &mut PipelineContext::new());
        doc
    }

    fn metas(doc: &Document) -> Vec<NodeId> {
        doc.elements_by_tag("meta")
    }

    #[test]
    fn test_missing_charset_and_viewport_are_synthesized() {
        let doc = run("<html><head><title>t</title></head><body></body></html>");
        let metas = metas(&doc);
        assert_eq!(metas.len(), 2);
        assert_eq!(doc.as_element(metas[0]).unwrap().attr("charset"), Some("utf-8"));
        assert_eq!(
            doc.as_element(metas[1]).unwrap().attr("content"),
            Some("width=device-width")
        );
    }

    #[test]
    fn test_http_equiv_is_converted() {
        let doc = run(
            "<html><head><meta http-equiv=\"Content-Type\" \
             content=\"text/html; charset=iso-8859-1\"></head><body></body></html>",
        );
        let metas = metas(&doc);
        let charset: Vec<_> = metas
            .iter()
            .filter(|&&id| doc.as_element(id).unwrap().has_attr("charset"))
            .collect();
        assert_eq!(charset.len(), 1);
        assert_eq!(
            doc.as_element(*charset[0]).unwrap().attr("charset"),
            Some("utf-8")
        );
    }

    #[test]
    fn test_duplicate_viewports_are_merged_away() {
        let doc = run(
            "<html><head><meta name=\"viewport\" content=\"width=1024,user-scalable=no\">\
             <meta name=\"viewport\" content=\"width=320\"></head><body></body></html>",
        );
        let viewports: Vec<_> = metas(&doc)
            .into_iter()
            .filter(|&id| doc.as_element(id).unwrap().attr("name") == Some("viewport"))
            .collect();
        assert_eq!(viewports.len(), 1);
        assert_eq!(
            doc.as_element(viewports[0]).unwrap().attr("content"),
            Some("width=device-width,user-scalable=no")
        );
    }

    #[test]
    fn test_viewport_merge_preserves_other_settings() {
        assert_eq!(
            merge_viewport("width=1024, initial-scale=1"),
            "width=device-width,initial-scale=1"
        );
        assert_eq!(merge_viewport(""), "width=device-width");
    }
}
