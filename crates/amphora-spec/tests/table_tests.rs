//! Integration tests for the embedded tag-spec table.

use amphora_spec::{ErrorCode, Layout, Severity, SpecLoadError, SpecTable, TagSpec};
use strum::IntoEnumIterator;

/// Helper to get the single spec of a tag, panicking when the tag has
/// none or several.
fn only_spec(tag: &str) -> &'static TagSpec {
    match SpecTable::shared().specs_for(tag) {
        [spec] => spec,
        other => panic!("Expected exactly one spec for '{tag}', got {}", other.len()),
    }
}

#[test]
fn test_embedded_table_loads() {
    let table = SpecTable::load();
    assert!(table.is_ok(), "embedded table failed: {:?}", table.err());
}

#[test]
fn test_every_error_code_has_a_template() {
    let table = SpecTable::shared();
    for code in ErrorCode::iter() {
        let template = table
            .error_template(code)
            .unwrap_or_else(|| panic!("no catalog entry for {code}"));
        assert_eq!(template.code, code);
        assert!(!template.message.is_empty(), "empty message for {code}");
    }
}

#[test]
fn test_unknown_tag_has_no_specs() {
    let table = SpecTable::shared();
    assert!(table.specs_for("blink").is_empty());
    assert!(table.specs_for("font").is_empty());
    assert!(table.specs_for("iframe").is_empty());
}

#[test]
fn test_script_has_three_candidate_specs() {
    let specs = SpecTable::shared().specs_for("script");
    assert_eq!(specs.len(), 3);
    let names: Vec<&str> = specs.iter().map(|s| s.spec_name_or("script")).collect();
    assert!(names.contains(&"amphtml engine script"));
    assert!(names.contains(&"amphtml extension script"));
    assert!(names.contains(&"script type=application/json"));
}

#[test]
fn test_engine_script_is_unique_and_more_specific() {
    let specs = SpecTable::shared().specs_for("script");
    let engine = specs
        .iter()
        .find(|s| s.spec_name_or("script") == "amphtml engine script")
        .unwrap();
    let json = specs
        .iter()
        .find(|s| s.spec_name_or("script") == "script type=application/json")
        .unwrap();
    assert!(engine.unique);
    assert!(!json.unique);
    assert!(engine.specificity < json.specificity);
}

#[test]
fn test_meta_charset_spec() {
    let specs = SpecTable::shared().specs_for("meta");
    assert_eq!(specs.len(), 3);
    let charset = specs
        .iter()
        .find(|s| s.spec_name_or("meta") == "meta charset")
        .unwrap();
    assert!(charset.unique);
    assert_eq!(charset.mandatory_parent.as_deref(), Some("head"));
    let attr = charset.attr("charset").unwrap();
    assert!(attr.mandatory);
    assert_eq!(attr.value_casei.as_deref(), Some("utf-8"));
}

#[test]
fn test_spec_name_falls_back_to_tag_name() {
    let div = only_spec("div");
    assert_eq!(div.spec_name_or("div"), "div");
}

#[test]
fn test_li_requires_a_list_parent() {
    let specs = SpecTable::shared().specs_for("li");
    let parents: Vec<&str> = specs
        .iter()
        .filter_map(|s| s.mandatory_parent.as_deref())
        .collect();
    assert_eq!(parents, vec!["ul", "ol"]);
}

#[test]
fn test_source_matches_both_media_parents() {
    let specs = SpecTable::shared().specs_for("source");
    let parents: Vec<&str> = specs
        .iter()
        .filter_map(|s| s.mandatory_parent.as_deref())
        .collect();
    assert_eq!(parents, vec!["amp-video", "amp-audio"]);
}

#[test]
fn test_table_child_constraints() {
    let table = only_spec("table");
    let constraints = table.child_constraints.as_ref().unwrap();
    let allowed = constraints.allowed.as_ref().unwrap();
    assert!(allowed.contains(&"tr".to_string()));
    assert!(!allowed.contains(&"div".to_string()));
    let caption = constraints.counts.iter().find(|c| c.tag == "caption").unwrap();
    assert_eq!(caption.min, 0);
    assert_eq!(caption.max, Some(1));
}

#[test]
fn test_form_requires_the_form_extension() {
    let form = only_spec("form");
    assert_eq!(form.requires_extension.as_deref(), Some("amp-form"));
    assert!(form.attr("target").unwrap().mandatory);
}

#[test]
fn test_is_amp_tag() {
    let table = SpecTable::shared();
    assert!(table.is_amp_tag("amp-img"));
    assert!(table.is_amp_tag("amp-youtube"));
    assert!(!table.is_amp_tag("amp-nonexistent-widget"));
    assert!(!table.is_amp_tag("div"));
}

#[test]
fn test_global_attrs() {
    assert!(SpecTable::is_global_attr("class"));
    assert!(SpecTable::is_global_attr("id"));
    assert!(SpecTable::is_global_attr("width"));
    assert!(SpecTable::is_global_attr("layout"));
    assert!(SpecTable::is_global_attr("data-foo"));
    assert!(SpecTable::is_global_attr("aria-label"));
    assert!(!SpecTable::is_global_attr("style"));
    assert!(!SpecTable::is_global_attr("onclick"));
    assert!(!SpecTable::is_global_attr("src"));
}

#[test]
fn test_value_regex_is_anchored() {
    let input = only_spec("input");
    let pattern = input.attr("type").unwrap().value_regex.as_ref().unwrap();
    assert!(pattern.is_match("text"));
    assert!(pattern.is_match("color"));
    assert!(!pattern.is_match("texts"));
    assert!(!pattern.is_match("xtext"));
    assert!(!pattern.is_match("javascript"));
}

#[test]
fn test_engine_script_src_pattern() {
    let specs = SpecTable::shared().specs_for("script");
    let engine = specs
        .iter()
        .find(|s| s.spec_name_or("script") == "amphtml engine script")
        .unwrap();
    let pattern = engine.attr("src").unwrap().value_regex.as_ref().unwrap();
    assert!(pattern.is_match("https://cdn.ampproject.org/v0.js"));
    assert!(pattern.is_match("https://cdn.ampproject.org/rtv/012345678/v0.js"));
    assert!(!pattern.is_match("https://cdn.ampproject.org/v1.js"));
    assert!(!pattern.is_match("https://evil.example.com/v0.js"));
    assert!(!pattern.is_match("https://cdn.ampproject.org/v0.js?x=1"));
}

#[test]
fn test_extension_script_src_pattern() {
    let specs = SpecTable::shared().specs_for("script");
    let ext = specs
        .iter()
        .find(|s| s.spec_name_or("script") == "amphtml extension script")
        .unwrap();
    let pattern = ext.attr("src").unwrap().value_regex.as_ref().unwrap();
    assert!(pattern.is_match("https://cdn.ampproject.org/v0/amp-video-0.1.js"));
    assert!(pattern.is_match("https://cdn.ampproject.org/v0/amp-carousel-latest.js"));
    assert!(pattern.is_match("https://cdn.ampproject.org/rtv/012345678/v0/amp-form-0.1.js"));
    assert!(!pattern.is_match("https://cdn.ampproject.org/v0/jquery-3.js"));
    assert!(!pattern.is_match("https://cdn.ampproject.org/v0/amp-video.js"));
}

#[test]
fn test_amp_img_layout_support() {
    let img = only_spec("amp-img");
    assert!(img.requires_layout);
    assert!(img.supports_layout(Layout::Responsive));
    assert!(img.supports_layout(Layout::Fixed));
    assert!(img.supports_layout(Layout::Nodisplay));
    assert!(!img.supports_layout(Layout::Container));
    assert!(!img.supports_layout(Layout::Fluid));
}

#[test]
fn test_plain_tags_take_no_layout() {
    let div = only_spec("div");
    assert!(div.layout_support.is_empty());
    assert!(!div.requires_layout);
    assert!(!div.supports_layout(Layout::Fixed));
}

#[test]
fn test_mandatory_attrs_in_name_order() {
    let img = only_spec("amp-img");
    let names: Vec<&str> = img.mandatory_attrs().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["src"]);

    let specs = SpecTable::shared().specs_for("script");
    let engine = specs
        .iter()
        .find(|s| s.spec_name_or("script") == "amphtml engine script")
        .unwrap();
    let names: Vec<&str> = engine.mandatory_attrs().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["async", "src"]);
}

#[test]
fn test_template_render_through_table() {
    let table = SpecTable::shared();
    let template = table.error_template(ErrorCode::DisallowedTag).unwrap();
    assert_eq!(template.render(&["amp-bogus"]), "The tag 'amp-bogus' is disallowed.");

    let template = table.error_template(ErrorCode::MandatoryAttrMissing).unwrap();
    assert_eq!(
        template.render(&["src", "amp-img"]),
        "The mandatory attribute 'src' is missing in tag 'amp-img'."
    );
}

#[test]
fn test_severity_assignment() {
    let table = SpecTable::shared();
    let missing_dims = table
        .error_template(ErrorCode::MissingLayoutDimensions)
        .unwrap();
    assert_eq!(missing_dims.severity, Severity::Warning);
    let disallowed = table.error_template(ErrorCode::DisallowedTag).unwrap();
    assert_eq!(disallowed.severity, Severity::Error);
}

#[test]
fn test_value_errors_are_more_specific_than_tag_errors() {
    let table = SpecTable::shared();
    let value = table.error_template(ErrorCode::InvalidAttrValue).unwrap();
    let protocol = table.error_template(ErrorCode::InvalidUrlProtocol).unwrap();
    let tag = table.error_template(ErrorCode::DisallowedTag).unwrap();
    assert!(protocol.specificity < value.specificity);
    assert!(value.specificity < tag.specificity);
}

#[test]
fn test_from_json_rejects_malformed_input() {
    match SpecTable::from_json("{") {
        Err(SpecLoadError::Json(_)) => {}
        other => panic!("Expected a JSON error, got {other:?}"),
    }
}

#[test]
fn test_from_json_rejects_bad_value_regex() {
    let json = r#"{
        "tags": { "div": [ { "attrs": { "role": { "value_regex": "(" } } } ] },
        "errors": []
    }"#;
    match SpecTable::from_json(json) {
        Err(SpecLoadError::Json(_)) => {}
        other => panic!("Expected a JSON error, got {other:?}"),
    }
}

#[test]
fn test_from_json_rejects_duplicate_template() {
    let json = r#"{
        "tags": {},
        "errors": [
            { "code": "DISALLOWED_TAG", "message": "a", "specificity": 1, "severity": "error" },
            { "code": "DISALLOWED_TAG", "message": "b", "specificity": 2, "severity": "error" }
        ]
    }"#;
    match SpecTable::from_json(json) {
        Err(SpecLoadError::DuplicateTemplate(ErrorCode::DisallowedTag)) => {}
        other => panic!("Expected a duplicate-template error, got {other:?}"),
    }
}
