//! End-to-end assembly runs: failure modes, head ordering, idempotence.

use amphora_response::{Response, ResponseAssembler, TransformOptions, AssemblyState};
use amphora_sanitize::ErrorStatus;
use serde_json::Value;

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>t</title></head>\
         <body>{body}</body></html>"
    )
}

fn process(input: &str, options: &TransformOptions) -> Response {
    ResponseAssembler::new().process(input, options).unwrap()
}

fn html_of(response: Response) -> String {
    match response {
        Response::Html(html) => html,
        other => panic!("Expected Html, got {other:?}"),
    }
}

#[test]
fn test_clean_document_stays_served_and_marked() {
    let html = html_of(process(&page("<p>hello</p>"), &TransformOptions::default()));
    assert!(html.starts_with("<!DOCTYPE html><html amp>"));
    assert!(html.contains("<p>hello</p>"));
    assert!(html.contains("https://cdn.ampproject.org/v0.js"));
    assert!(!html.contains("document.write"));
}

#[test]
fn test_head_follows_the_ordering_contract() {
    let html = html_of(process(
        &page(
            "<video src=\"https://a/v.mp4\" width=\"640\" height=\"360\"></video>\
             <iframe src=\"https://www.youtube.com/embed/abc123\" width=\"560\" \
             height=\"315\"></iframe>",
        ),
        &TransformOptions::default(),
    ));
    let order = [
        "<meta charset=\"utf-8\">",
        "name=\"viewport\"",
        "rel=\"preconnect\"",
        "rel=\"dns-prefetch\"",
        "rel=\"preload\"",
        "src=\"https://cdn.ampproject.org/v0.js\"",
        "custom-element=\"amp-video\"",
        "custom-element=\"amp-youtube\"",
        "<title>t</title>",
        "rel=\"canonical\"",
        "amp-boilerplate",
        "<noscript>",
    ];
    let mut last = 0;
    for needle in order {
        let position = html[last..]
            .find(needle)
            .unwrap_or_else(|| panic!("missing or misordered: {needle}"));
        last += position;
    }
}

#[test]
fn test_warnings_never_block() {
    // Undimensioned img: corrected best-effort, warning severity only.
    let html = html_of(process(&page("<img src=\"a.jpg\">"), &TransformOptions::default()));
    assert!(html.contains("<html amp>"));
    assert!(html.contains("<amp-img"));
    assert!(!html.contains("document.write"));
}

#[test]
fn test_paired_mode_redirects_on_blocking_errors() {
    let options = TransformOptions {
        paired_url: Some("https://example.com/article".to_string()),
        ..TransformOptions::default()
    };
    let response = process(&page("<p>x</p><script>alert(1)</script>"), &options);
    match response {
        Response::Redirect {
            location,
            blocking_errors,
        } => {
            assert_eq!(location, "https://example.com/article");
            assert_eq!(blocking_errors, 1);
        }
        other => panic!("Expected Redirect, got {other:?}"),
    }
}

#[test]
fn test_canonical_mode_serves_guarded_fallback() {
    let html = html_of(process(
        &page("<p>x</p><script>alert(1)</script>"),
        &TransformOptions::default(),
    ));
    assert!(html.starts_with("<!DOCTYPE html><html>"));
    assert!(!html.contains("<html amp>"));
    assert!(html.contains("document.write"));
    // The offending script itself is still gone.
    assert!(!html.contains("alert(1)"));
}

#[test]
fn test_accepted_status_clears_the_block() {
    let options = TransformOptions {
        paired_url: Some("https://example.com/article".to_string()),
        status_resolver: Some(Box::new(|_, _| ErrorStatus::Accepted)),
        ..TransformOptions::default()
    };
    let html = html_of(process(&page("<p>x</p><script>alert(1)</script>"), &options));
    assert!(html.contains("<html amp>"));
}

#[test]
fn test_non_document_input_passes_through() {
    let input = "<p>just a fragment</p>";
    let response = process(input, &TransformOptions::default());
    assert_eq!(response, Response::PassThrough(input.to_string()));
}

#[test]
fn test_fragment_mode_builds_a_full_document() {
    let options = TransformOptions {
        fragment: true,
        ..TransformOptions::default()
    };
    let html = html_of(process("<p>standalone</p>", &options));
    assert!(html.starts_with("<!DOCTYPE html><html amp>"));
    assert!(html.contains("<p>standalone</p>"));
    assert!(html.contains("amp-boilerplate"));
}

#[test]
fn test_validate_mode_returns_the_report() {
    let options = TransformOptions {
        validate: true,
        canonical_url: Some("https://example.com/a".to_string()),
        ..TransformOptions::default()
    };
    let response = process(&page("<p>x</p><script>alert(1)</script>"), &options);
    let Response::Report(report) = response else {
        panic!("Expected Report");
    };
    assert_eq!(report.url, "https://example.com/a");
    assert_eq!(report.queried_object, "document");
    assert_eq!(report.blocking(), 1);
    let value: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["results"][0]["error"]["code"], "DISALLOWED_SCRIPT_TAG");
    assert_eq!(value["results"][0]["sanitized"], false);
}

#[test]
fn test_existing_versioned_extension_src_survives() {
    let input = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>t</title>\
                 <script async custom-element=\"amp-video\" \
                 src=\"https://cdn.ampproject.org/v0/amp-video-0.2.js\"></script></head>\
                 <body><video src=\"https://a/v.mp4\" width=\"1\" height=\"1\"></video>\
                 </body></html>";
    let html = html_of(process(input, &TransformOptions::default()));
    assert!(html.contains("https://cdn.ampproject.org/v0/amp-video-0.2.js"));
    assert!(!html.contains("amp-video-0.1.js"));
    assert_eq!(html.matches("custom-element=\"amp-video\"").count(), 1);
}

#[test]
fn test_assembly_is_idempotent() {
    let input = page(
        "<img src=\"a.jpg\"><div style=\"color:red\">t</div>\
         <style>div{margin:0}.unused{color:blue}</style>",
    );
    let first = html_of(process(&input, &TransformOptions::default()));
    let second = html_of(process(&first, &TransformOptions::default()));
    assert_eq!(first, second);
}

#[test]
fn test_state_machine_reaches_finalized() {
    let mut assembler = ResponseAssembler::new();
    assert_eq!(assembler.state(), AssemblyState::ReceivedRaw);
    let _ = assembler.process(&page("<p>x</p>"), &TransformOptions::default()).unwrap();
    assert_eq!(assembler.state(), AssemblyState::Finalized);
    // Pass-through finalizes too.
    let _ = assembler.process("plain", &TransformOptions::default()).unwrap();
    assert_eq!(assembler.state(), AssemblyState::Finalized);
}

#[test]
fn test_empty_fragment_becomes_a_minimal_page() {
    let options = TransformOptions {
        fragment: true,
        ..TransformOptions::default()
    };
    let html = html_of(process(" ", &options));
    assert!(html.starts_with("<!DOCTYPE html><html amp>"));
    assert!(html.contains("https://cdn.ampproject.org/v0.js"));
    assert!(html.contains("amp-boilerplate"));
}

#[test]
fn test_dev_mode_subtree_passes_through() {
    let input = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>t</title></head>\
                 <body><div id=\"toolbar\"><blink>raw</blink></div><p>x</p></body></html>";
    let options = TransformOptions {
        dev_mode_ids: vec!["toolbar".to_string()],
        ..TransformOptions::default()
    };
    let html = html_of(process(input, &options));
    assert!(html.contains("<blink>raw</blink>"));
}
