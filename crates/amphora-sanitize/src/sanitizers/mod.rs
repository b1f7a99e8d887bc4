//! The sanitizer implementations, one concern per pass.
//!
//! Execution order is the stage order declared on each pass: embed and media
//! conversion first (they only add or convert markup), then content
//! normalization, then stylesheet extraction (so it sees all final markup),
//! then head metadata and accessibility, and the conformance validator last.

/// `on=tap` affordances: `role` and `tabindex` for activatable elements.
pub mod accessibility;
/// `<audio>` to `<amp-audio>`.
pub mod audio;
/// Comment node removal.
pub mod comment;
/// Dev-mode subtree marking.
pub mod devmode;
/// Third-party embed conversion (YouTube iframes).
pub mod embed;
/// `<form>` normalization for amp-form.
pub mod form;
/// Generic `<iframe>` to `<amp-iframe>`.
pub mod iframe;
/// `<img>` to `<amp-img>`.
pub mod img;
/// Charset and viewport meta normalization.
pub mod meta;
/// `<noscript>` unwrapping in body.
pub mod script;
/// Stylesheet extraction, filtering, and tree-shaking.
pub mod style;
/// The tag/attribute conformance validator.
pub mod validator;
/// `<video>` to `<amp-video>`.
pub mod video;

pub use accessibility::AccessibilitySanitizer;
pub use audio::AudioSanitizer;
pub use comment::CommentSanitizer;
pub use devmode::DevModeSanitizer;
pub use embed::EmbedSanitizer;
pub use form::FormSanitizer;
pub use iframe::IframeSanitizer;
pub use img::ImgSanitizer;
pub use meta::MetaSanitizer;
pub use script::ScriptSanitizer;
pub use style::StyleSanitizer;
pub use validator::TagAttributeValidator;
pub use video::VideoSanitizer;

use amphora_dom::Document;
use amphora_spec::ErrorCode;

use crate::context::PipelineContext;
use crate::error::ValidationError;

/// Fallback width applied when a converted media element has no dimensions.
pub(crate) const FALLBACK_WIDTH: &str = "600";
/// Fallback height applied when a converted media element has no dimensions.
pub(crate) const FALLBACK_HEIGHT: &str = "400";

/// Ensure a converted media element can resolve a layout: when both
/// dimensions are missing, apply the fallback box and the given layout, and
/// report one best-effort warning. Elements with at least a height resolve
/// on their own.
pub(crate) fn ensure_dimensions(
    doc: &mut Document,
    ctx: &mut PipelineContext,
    id: amphora_dom::NodeId,
    layout: &str,
) {
    let path = doc.node_path(id);
    let Some(element) = doc.as_element_mut(id) else {
        return;
    };
    if element.has_attr("height") || element.has_attr("layout") {
        return;
    }
    let tag = element.tag_name.clone();
    if !element.has_attr("width") {
        element.set_attr("width", FALLBACK_WIDTH);
    }
    element.set_attr("height", FALLBACK_HEIGHT);
    element.set_attr("layout", layout);
    ctx.record(ValidationError::new(
        ErrorCode::MissingLayoutDimensions,
        &[("node_name", &tag)],
        &path,
    ));
}
