//! Dev-mode subtree marking.
//!
//! Host toolbars and similar injected UI cannot be made conformant; marking
//! them exempts their subtrees from validation instead of mangling them.
//! The exemption only applies when the document root carries the marker too,
//! so a stray marker attribute in content cannot smuggle markup past the
//! validator.

use amphora_dom::Document;
use serde::Deserialize;

use crate::DEV_MODE_ATTR;
use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Configuration for [`DevModeSanitizer`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevModeArgs {
    /// Element ids whose subtrees are exempt from validation.
    pub element_ids: Vec<String>,
}

/// Marks the document root and the configured elements with the dev-mode
/// attribute and flips the context's dev-mode flag.
#[derive(Debug, Default)]
pub struct DevModeSanitizer {
    args: DevModeArgs,
}

impl DevModeSanitizer {
    /// Create the pass with explicit args.
    #[must_use]
    pub const fn new(args: DevModeArgs) -> Self {
        DevModeSanitizer { args }
    }
}

impl Sanitizer for DevModeSanitizer {
    fn name(&self) -> &'static str {
        "dev-mode"
    }

    fn stage(&self) -> Stage {
        Stage::Meta
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        if self.args.element_ids.is_empty() {
            return;
        }
        let Some(html) = doc.document_element() else {
            return;
        };
        if let Some(element) = doc.as_element_mut(html) {
            element.set_attr(DEV_MODE_ATTR, "");
        }
        let elements: Vec<_> = doc.descendants(doc.root()).collect();
        for id in elements {
            let Some(element) = doc.as_element_mut(id) else {
                continue;
            };
            if element
                .id()
                .is_some_and(|v| self.args.element_ids.iter().any(|want| want == v))
            {
                element.set_attr(DEV_MODE_ATTR, "");
            }
        }
        ctx.set_dev_mode(true);
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;

    use super::*;

    #[test]
    fn test_marks_root_and_listed_elements() {
        let mut doc =
            parse_fragment("<div id=\"toolbar\">t</div><div id=\"content\">c</div>").unwrap();
        let mut ctx = PipelineContext::new();
        DevModeSanitizer::new(DevModeArgs {
            element_ids: vec!["toolbar".to_string()],
        })
        .sanitize(&mut doc, &mut ctx);

        assert!(ctx.dev_mode());
        let html = doc.document_element().unwrap();
        assert!(doc.as_element(html).unwrap().has_attr(DEV_MODE_ATTR));
        let divs = doc.elements_by_tag("div");
        assert!(doc.as_element(divs[0]).unwrap().has_attr(DEV_MODE_ATTR));
        assert!(!doc.as_element(divs[1]).unwrap().has_attr(DEV_MODE_ATTR));
    }

    #[test]
    fn test_no_ids_means_no_dev_mode() {
        let mut doc = parse_fragment("<div id=\"toolbar\">t</div>").unwrap();
        let mut ctx = PipelineContext::new();
        DevModeSanitizer::default().sanitize(&mut doc, &mut ctx);
        assert!(!ctx.dev_mode());
        let html = doc.document_element().unwrap();
        assert!(!doc.as_element(html).unwrap().has_attr(DEV_MODE_ATTR));
    }
}
