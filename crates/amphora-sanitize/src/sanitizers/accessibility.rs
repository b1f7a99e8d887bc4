//! Keyboard and assistive-technology affordances.

use amphora_dom::Document;

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Tags that are activatable without extra affordances.
const NATIVELY_INTERACTIVE: &[&str] = &["a", "button", "input", "select", "textarea", "option"];

/// Elements wired to a tap action through the `on` attribute must be
/// reachable and announced: non-interactive tags get `role=button` and
/// `tabindex=0` when the author declared neither.
#[derive(Debug, Default)]
pub struct AccessibilitySanitizer;

impl Sanitizer for AccessibilitySanitizer {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn stage(&self) -> Stage {
        Stage::Meta
    }

    fn sanitize(&self, doc: &mut Document, _ctx: &mut PipelineContext) {
        let elements: Vec<_> = doc.descendants(doc.root()).collect();
        for id in elements {
            let Some(element) = doc.as_element_mut(id) else {
                continue;
            };
            let has_tap = element
                .attr("on")
                .is_some_and(|v| v.split(';').any(|h| h.trim().starts_with("tap:")));
            if !has_tap || NATIVELY_INTERACTIVE.contains(&element.tag_name.as_str()) {
                continue;
            }
            if !element.has_attr("role") {
                element.set_attr("role", "button");
            }
            if !element.has_attr("tabindex") {
                element.set_attr("tabindex", "0");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;

    use super::*;

    fn run(html: &str) -> Document {
        let mut doc = parse_fragment(html).unwrap();
        AccessibilitySanitizer.sanitize(&mut doc, &mut PipelineContext::new());
        doc
    }

    #[test]
    fn test_tap_target_gets_affordances() {
        let doc = run("<div on=\"tap:lightbox.open\">view</div>");
        let divs = doc.elements_by_tag("div");
        let element = doc.as_element(divs[0]).unwrap();
        assert_eq!(element.attr("role"), Some("button"));
        assert_eq!(element.attr("tabindex"), Some("0"));
    }

    #[test]
    fn test_native_controls_are_untouched() {
        let doc = run("<button on=\"tap:form.submit\">go</button>");
        let buttons = doc.elements_by_tag("button");
        let element = doc.as_element(buttons[0]).unwrap();
        assert!(!element.has_attr("role"));
        assert!(!element.has_attr("tabindex"));
    }

    #[test]
    fn test_author_role_is_preserved() {
        let doc = run("<span on=\"tap:x.toggle\" role=\"switch\">s</span>");
        let spans = doc.elements_by_tag("span");
        let element = doc.as_element(spans[0]).unwrap();
        assert_eq!(element.attr("role"), Some("switch"));
        assert_eq!(element.attr("tabindex"), Some("0"));
    }

    #[test]
    fn test_non_tap_actions_do_not_trigger() {
        let doc = run("<div on=\"submit-success:msg.show\">x</div>");
        let divs = doc.elements_by_tag("div");
        assert!(!doc.as_element(divs[0]).unwrap().has_attr("role"));
    }
}
