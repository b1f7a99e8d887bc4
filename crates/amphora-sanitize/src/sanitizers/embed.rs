//! Third-party embed recognition.
//!
//! Runs before the generic iframe pass so known providers get their
//! dedicated AMP component instead of a sandboxed `<amp-iframe>`.

use amphora_dom::Document;

use crate::collect::ScriptAsset;
use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Converts recognized embed iframes to their AMP components. Currently
/// recognizes YouTube (`youtube.com/embed/`, `youtube-nocookie.com/embed/`,
/// `youtu.be/`).
#[derive(Debug, Default)]
pub struct EmbedSanitizer;

impl Sanitizer for EmbedSanitizer {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn stage(&self) -> Stage {
        Stage::Embed
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let mut converted = false;
        for id in doc.elements_by_tag("iframe") {
            let Some(video_id) = doc
                .as_element(id)
                .and_then(|e| e.attr("src"))
                .and_then(youtube_video_id)
            else {
                continue;
            };
            let (width, height) = doc
                .as_element(id)
                .map(|e| {
                    (
                        e.attr("width").unwrap_or("480").to_string(),
                        e.attr("height").unwrap_or("270").to_string(),
                    )
                })
                .unwrap_or_default();
            let Some(parent) = doc.parent(id) else {
                continue;
            };

            let player = doc.create_element("amp-youtube");
            if let Some(element) = doc.as_element_mut(player) {
                element.set_attr("data-videoid", &video_id);
                element.set_attr("layout", "responsive");
                element.set_attr("width", &width);
                element.set_attr("height", &height);
            }
            doc.insert_before(parent, player, id);
            doc.detach(id);
            converted = true;
        }
        if converted {
            ctx.collector_mut()
                .merge_script(ScriptAsset::extension("amp-youtube"));
        }
    }
}

/// Extract the video id from a YouTube embed URL, if the URL is one.
fn youtube_video_id(src: &str) -> Option<String> {
    let rest = src
        .strip_prefix("https://")
        .or_else(|| src.strip_prefix("http://"))
        .or_else(|| src.strip_prefix("//"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let path = rest
        .strip_prefix("youtube.com/embed/")
        .or_else(|| rest.strip_prefix("youtube-nocookie.com/embed/"))
        .or_else(|| rest.strip_prefix("youtu.be/"))?;
    let id: String = path
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    if id.is_empty() { None } else { Some(id) }
}
