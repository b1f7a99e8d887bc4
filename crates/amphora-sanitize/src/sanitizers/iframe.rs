//! Generic `<iframe>` conversion.

use amphora_common::url::scheme_of;
use amphora_dom::Document;
use amphora_spec::ErrorCode;
use serde::Deserialize;

use crate::collect::ScriptAsset;
use crate::context::PipelineContext;
use crate::error::ValidationError;
use crate::sanitizer::{Sanitizer, Stage};
use crate::sanitizers::ensure_dimensions;

/// Configuration for [`IframeSanitizer`], deserialized from opaque
/// registration args.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IframeArgs {
    /// Append an empty placeholder child so the frame area reserves space
    /// before the frame loads.
    pub add_placeholder: bool,
}

/// Converts remaining `<iframe>` elements to `<amp-iframe>`, defaulting the
/// sandbox and registering the amp-iframe extension. Frames whose source is
/// not HTTPS are removed: amp-iframe only accepts secure origins.
#[derive(Debug, Default)]
pub struct IframeSanitizer {
    args: IframeArgs,
}

impl IframeSanitizer {
    /// Create the pass with explicit args.
    #[must_use]
    pub const fn new(args: IframeArgs) -> Self {
        IframeSanitizer { args }
    }
}

impl Sanitizer for IframeSanitizer {
    fn name(&self) -> &'static str {
        "iframe"
    }

    fn stage(&self) -> Stage {
        Stage::Embed
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let mut converted = false;
        for id in doc.elements_by_tag("iframe") {
            let path = doc.node_path(id);
            let src = doc
                .as_element(id)
                .and_then(|e| e.attr("src"))
                .unwrap_or_default()
                .to_string();
            let secure = scheme_of(&src).is_some_and(|s| s == "https");
            if !secure {
                doc.detach(id);
                ctx.record(ValidationError::new(
                    ErrorCode::InvalidUrlProtocol,
                    &[("attr_name", "src"), ("node_name", "amp-iframe")],
                    &path,
                ));
                continue;
            }

            if let Some(element) = doc.as_element_mut(id) {
                element.tag_name = "amp-iframe".to_string();
                if !element.has_attr("sandbox") {
                    element.set_attr("sandbox", "allow-scripts allow-same-origin");
                }
            }
            ensure_dimensions(doc, ctx, id, "fixed-height");
            if self.args.add_placeholder {
                let has_placeholder = doc
                    .children(id)
                    .iter()
                    .any(|&c| doc.as_element(c).is_some_and(|e| e.has_attr("placeholder")));
                if !has_placeholder {
                    let placeholder = doc.create_element("div");
                    if let Some(element) = doc.as_element_mut(placeholder) {
                        element.set_attr("placeholder", "");
                    }
                    doc.append_child(id, placeholder);
                }
            }
            converted = true;
        }
        if converted {
            ctx.collector_mut()
                .merge_script(ScriptAsset::extension("amp-iframe"));
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;

    use super::*;

    fn run(html: &str, args: IframeArgs) -> (Document, PipelineContext) {
        let mut doc = parse_fragment(html).unwrap();
        let mut ctx = PipelineContext::new();
        IframeSanitizer::new(args).sanitize(&mut doc, &mut ctx);
        (doc, ctx)
    }

    #[test]
    fn test_https_iframe_converts_with_sandbox_default() {
        let (doc, ctx) = run(
            "<iframe src=\"https://example.com/w\" width=\"300\" height=\"200\"></iframe>",
            IframeArgs::default(),
        );
        let frames = doc.elements_by_tag("amp-iframe");
        assert_eq!(frames.len(), 1);
        assert_eq!(
            doc.as_element(frames[0]).unwrap().attr("sandbox"),
            Some("allow-scripts allow-same-origin")
        );
        assert!(ctx.collector().script("amp-iframe").is_some());
    }

    #[test]
    fn test_insecure_iframe_is_removed() {
        let (doc, ctx) = run(
            "<iframe src=\"http://example.com/w\"></iframe>",
            IframeArgs::default(),
        );
        assert!(doc.elements_by_tag("iframe").is_empty());
        assert!(doc.elements_by_tag("amp-iframe").is_empty());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::InvalidUrlProtocol);
    }

    #[test]
    fn test_placeholder_child_is_added_once() {
        let (doc, _) = run(
            "<iframe src=\"https://example.com/w\" height=\"200\"></iframe>",
            IframeArgs {
                add_placeholder: true,
            },
        );
        let frames = doc.elements_by_tag("amp-iframe");
        let children = doc.children(frames[0]);
        assert_eq!(children.len(), 1);
        assert!(
            doc.as_element(children[0])
                .unwrap()
                .has_attr("placeholder")
        );
    }
}
