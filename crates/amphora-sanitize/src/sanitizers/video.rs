//! `<video>` conversion.

use amphora_dom::Document;

use crate::collect::ScriptAsset;
use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};
use crate::sanitizers::ensure_dimensions;

/// Converts `<video>` elements to `<amp-video>`, keeping `<source>` children
/// and inner fallback text, and registers the amp-video extension.
#[derive(Debug, Default)]
pub struct VideoSanitizer;

impl Sanitizer for VideoSanitizer {
    fn name(&self) -> &'static str {
        "video"
    }

    fn stage(&self) -> Stage {
        Stage::Embed
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let videos = doc.elements_by_tag("video");
        for id in &videos {
            if let Some(element) = doc.as_element_mut(*id) {
                element.tag_name = "amp-video".to_string();
            }
            ensure_dimensions(doc, ctx, *id, "responsive");
        }
        if !videos.is_empty() {
            ctx.collector_mut()
                .merge_script(ScriptAsset::extension("amp-video"));
        }
    }
}
