//! `<img>` conversion.
//!
//! Every body image becomes an `<amp-img>` carrying the source attributes
//! over verbatim; the validator later strips whatever the amp-img spec does
//! not admit. Images without sizing attributes get a best-effort fallback
//! box so layout resolution cannot fail on them.

use amphora_dom::Document;

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};
use crate::sanitizers::ensure_dimensions;

/// Converts `<img>` elements to `<amp-img>`.
#[derive(Debug, Default)]
pub struct ImgSanitizer;

impl Sanitizer for ImgSanitizer {
    fn name(&self) -> &'static str {
        "img"
    }

    fn stage(&self) -> Stage {
        Stage::Embed
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        for id in doc.elements_by_tag("img") {
            // Images inside noscript stay as-is: they are the no-JS fallback
            // content for the amp-img the runtime renders.
            let in_noscript = doc
                .ancestors(id)
                .any(|a| doc.as_element(a).is_some_and(|e| e.is("noscript")));
            if in_noscript {
                continue;
            }
            if let Some(element) = doc.as_element_mut(id) {
                element.tag_name = "amp-img".to_string();
            }
            ensure_dimensions(doc, ctx, id, "intrinsic");
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;
    use amphora_spec::ErrorCode;

    use super::*;

    fn run(html: &str) -> (Document, PipelineContext) {
        let mut doc = parse_fragment(html).unwrap();
        let mut ctx = PipelineContext::new();
        ImgSanitizer.sanitize(&mut doc, &mut ctx);
        (doc, ctx)
    }

    #[test]
    fn test_img_becomes_amp_img() {
        let (doc, ctx) = run("<img src=\"a.jpg\" width=\"100\" height=\"50\" alt=\"a\">");
        let imgs = doc.elements_by_tag("amp-img");
        assert_eq!(imgs.len(), 1);
        let element = doc.as_element(imgs[0]).unwrap();
        assert_eq!(element.attr("src"), Some("a.jpg"));
        assert_eq!(element.attr("alt"), Some("a"));
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_missing_dimensions_get_fallback_and_warning() {
        let (doc, ctx) = run("<img src=\"a.jpg\">");
        let imgs = doc.elements_by_tag("amp-img");
        let element = doc.as_element(imgs[0]).unwrap();
        assert_eq!(element.attr("width"), Some("600"));
        assert_eq!(element.attr("height"), Some("400"));
        assert_eq!(element.attr("layout"), Some("intrinsic"));
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::MissingLayoutDimensions);
    }

    #[test]
    fn test_noscript_img_is_left_alone() {
        let (doc, _) = run("<noscript><img src=\"a.jpg\"></noscript>");
        assert_eq!(doc.elements_by_tag("img").len(), 1);
        assert!(doc.elements_by_tag("amp-img").is_empty());
    }
}
