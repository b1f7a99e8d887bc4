//! `<audio>` conversion.

use amphora_dom::Document;

use crate::collect::ScriptAsset;
use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Converts `<audio>` elements to `<amp-audio>` and registers the amp-audio
/// extension. Audio takes a fixed-height layout; a bare element gets the
/// standard control-bar height so it still renders.
#[derive(Debug, Default)]
pub struct AudioSanitizer;

impl Sanitizer for AudioSanitizer {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn stage(&self) -> Stage {
        Stage::Embed
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let audios = doc.elements_by_tag("audio");
        for &id in &audios {
            if let Some(element) = doc.as_element_mut(id) {
                element.tag_name = "amp-audio".to_string();
                if !element.has_attr("height") && !element.has_attr("layout") {
                    element.set_attr("height", "54");
                }
            }
        }
        if !audios.is_empty() {
            ctx.collector_mut()
                .merge_script(ScriptAsset::extension("amp-audio"));
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;

    use super::*;

    #[test]
    fn test_audio_converts_with_default_height() {
        let mut doc = parse_fragment("<audio src=\"https://a/t.mp3\" controls></audio>").unwrap();
        let mut ctx = PipelineContext::new();
        AudioSanitizer.sanitize(&mut doc, &mut ctx);

        let audios = doc.elements_by_tag("amp-audio");
        assert_eq!(audios.len(), 1);
        assert_eq!(doc.as_element(audios[0]).unwrap().attr("height"), Some("54"));
        assert!(ctx.collector().script("amp-audio").is_some());
    }

    #[test]
    fn test_existing_height_is_kept() {
        let mut doc = parse_fragment("<audio src=\"https://a/t.mp3\" height=\"40\"></audio>")
            .unwrap();
        let mut ctx = PipelineContext::new();
        AudioSanitizer.sanitize(&mut doc, &mut ctx);
        let audios = doc.elements_by_tag("amp-audio");
        assert_eq!(doc.as_element(audios[0]).unwrap().attr("height"), Some("40"));
    }
}
