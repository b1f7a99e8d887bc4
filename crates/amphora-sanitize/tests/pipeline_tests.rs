//! End-to-end pipeline runs over realistic documents.

use amphora_html::{SerializeMode, parse_document, serialize};
use amphora_sanitize::{ErrorStatus, PipelineContext, default_pipeline};
use amphora_spec::{ErrorCode, Severity};

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>t</title></head>\
         <body>{body}</body></html>"
    )
}

fn run(html: &str) -> (amphora_dom::Document, PipelineContext) {
    let mut doc = parse_document(html).unwrap();
    let mut ctx = PipelineContext::new();
    default_pipeline().run(&mut doc, &mut ctx);
    (doc, ctx)
}

#[test]
fn test_script_in_body_is_removed_and_blocks() {
    let (doc, ctx) = run(&page("<p>x</p><script>alert(1)</script>"));
    assert!(doc.elements_by_tag("script").is_empty());
    let (reporter, _) = ctx.finish();
    let codes: Vec<ErrorCode> = reporter.errors().iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![ErrorCode::DisallowedScriptTag]);
    assert_eq!(reporter.blocking_count(|_, _| ErrorStatus::New), 1);
    // Accepting it clears the block.
    assert_eq!(reporter.blocking_count(|_, _| ErrorStatus::Accepted), 0);
}

#[test]
fn test_inline_style_migrates_without_node_removal() {
    let (doc, ctx) = run(&page("<div style=\"color:red\">x</div>"));
    let divs = doc.elements_by_tag("div");
    assert_eq!(divs.len(), 1);
    let element = doc.as_element(divs[0]).unwrap();
    assert!(!element.has_attr("style"));
    assert!(element.attr("class").unwrap().starts_with("amphora-inline-"));
    let (reporter, collector) = ctx.finish();
    assert!(reporter.is_empty());
    assert_eq!(collector.styles().len(), 1);
    assert!(collector.styles()[0].css.contains("color:red"));
}

#[test]
fn test_undimensioned_img_is_kept_with_warning() {
    let (doc, ctx) = run(&page("<img src=\"a.jpg\">"));
    let imgs = doc.elements_by_tag("amp-img");
    assert_eq!(imgs.len(), 1);
    let (reporter, _) = ctx.finish();
    assert_eq!(reporter.len(), 1);
    assert_eq!(reporter.errors()[0].code, ErrorCode::MissingLayoutDimensions);
    assert_eq!(reporter.errors()[0].severity, Severity::Warning);
    assert_eq!(reporter.blocking_count(|_, _| ErrorStatus::New), 0);
}

#[test]
fn test_media_conversion_registers_extensions() {
    let (doc, ctx) = run(&page(
        "<video src=\"https://a/v.mp4\" width=\"640\" height=\"360\"></video>\
         <iframe src=\"https://www.youtube.com/embed/abc123\" width=\"560\" height=\"315\">\
         </iframe>",
    ));
    assert_eq!(doc.elements_by_tag("amp-video").len(), 1);
    assert_eq!(doc.elements_by_tag("amp-youtube").len(), 1);
    let (_, collector) = ctx.finish();
    let handles: Vec<&str> = collector.scripts().map(|s| s.handle.as_str()).collect();
    assert_eq!(handles, vec!["amp-video", "amp-youtube"]);
}

#[test]
fn test_pipeline_is_idempotent() {
    let input = page(
        "<img src=\"a.jpg\"><div style=\"color:red\" onclick=\"x()\">t</div>\
         <form method=\"post\" action=\"https://a/s\"><input type=\"text\" name=\"q\"></form>\
         <style>p{margin:0}.unused{color:blue}</style><p on=\"tap:x\">p</p>",
    );
    let (mut doc, ctx) = run(&input);
    let first = serialize(&doc, SerializeMode::FullDocument);
    let (first_reporter, first_collector) = ctx.finish();

    let mut second_ctx = PipelineContext::new();
    default_pipeline().run(&mut doc, &mut second_ctx);
    let second = serialize(&doc, SerializeMode::FullDocument);
    let (second_reporter, second_collector) = second_ctx.finish();

    assert_eq!(first, second);
    // Second run sees already-corrected markup: no new corrections.
    assert_eq!(
        second_reporter
            .errors()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count(),
        0
    );
    // Asset collection is stable across runs.
    let first_handles: Vec<String> =
        first_collector.scripts().map(|s| s.handle.clone()).collect();
    let second_handles: Vec<String> =
        second_collector.scripts().map(|s| s.handle.clone()).collect();
    assert_eq!(first_handles, second_handles);
    let first_errors: Vec<ErrorCode> = first_reporter.errors().iter().map(|e| e.code).collect();
    assert!(first_errors.contains(&ErrorCode::DisallowedAttr));
}

#[test]
fn test_pipeline_is_deterministic() {
    let input = page(
        "<audio src=\"https://a/t.mp3\"></audio><video src=\"https://a/v.mp4\" width=\"1\" \
         height=\"1\"></video><style>div{color:red}</style><div>x</div>",
    );
    let (doc_a, ctx_a) = run(&input);
    let (doc_b, ctx_b) = run(&input);
    assert_eq!(
        serialize(&doc_a, SerializeMode::FullDocument),
        serialize(&doc_b, SerializeMode::FullDocument)
    );
    let (reporter_a, collector_a) = ctx_a.finish();
    let (reporter_b, collector_b) = ctx_b.finish();
    assert_eq!(reporter_a.errors(), reporter_b.errors());
    let handles_a: Vec<String> = collector_a.scripts().map(|s| s.handle.clone()).collect();
    let handles_b: Vec<String> = collector_b.scripts().map(|s| s.handle.clone()).collect();
    assert_eq!(handles_a, handles_b);
}

#[test]
fn test_conformant_fragment_round_trips() {
    let body = "<p class=\"lead\">hello <strong>world</strong></p>\
                <amp-img src=\"https://a/i.jpg\" width=\"100\" height=\"50\"></amp-img>";
    let (doc, ctx) = run(&page(body));
    assert_eq!(
        serialize(&doc, SerializeMode::Fragment),
        body,
        "already-conformant markup must pass through byte-identical"
    );
    let (reporter, _) = ctx.finish();
    assert!(reporter.is_empty());
}

#[test]
fn test_same_handle_src_override_keeps_flags() {
    use amphora_sanitize::{AssetCollector, CDN_BASE, ScriptAsset, ScriptKind};
    let mut collector = AssetCollector::new();
    collector.merge_script(ScriptAsset::extension("amp-youtube"));
    collector.merge_script(ScriptAsset::with_src(
        "amp-youtube",
        "https://cdn.ampproject.org/v0/amp-youtube-0.2.js",
        ScriptKind::CustomTemplate,
    ));
    let script = collector.script("amp-youtube").unwrap();
    assert_eq!(script.src, format!("{CDN_BASE}/v0/amp-youtube-0.2.js"));
    assert_eq!(script.kind, ScriptKind::CustomElement);
}
