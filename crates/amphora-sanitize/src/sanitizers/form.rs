//! `<form>` normalization for amp-form.
//!
//! amp-form submits POST forms over XHR, declared with `action-xhr` instead
//! of `action`, and requires an explicit `_blank`/`_top` target.

use amphora_dom::Document;

use crate::collect::ScriptAsset;
use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Normalizes forms and registers the amp-form extension.
#[derive(Debug, Default)]
pub struct FormSanitizer;

impl Sanitizer for FormSanitizer {
    fn name(&self) -> &'static str {
        "form"
    }

    fn stage(&self) -> Stage {
        Stage::Content
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let forms = doc.elements_by_tag("form");
        for &id in &forms {
            let Some(element) = doc.as_element_mut(id) else {
                continue;
            };
            let method = element
                .attr("method")
                .unwrap_or("get")
                .to_ascii_lowercase();
            element.set_attr("method", &method);
            if method == "post" {
                if let Some(action) = element.remove_attr("action")
                    && !element.has_attr("action-xhr")
                {
                    element.set_attr("action-xhr", &action);
                }
            }
            let target_ok = matches!(element.attr("target"), Some("_blank" | "_top"));
            if !target_ok {
                element.set_attr("target", "_top");
            }
        }
        if !forms.is_empty() {
            ctx.collector_mut()
                .merge_script(ScriptAsset::extension("amp-form"));
        }
    }
}
