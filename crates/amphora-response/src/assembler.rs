//! The per-response assembly state machine.
//!
//! One [`ResponseAssembler::process`] call takes the raw input through
//! parsing, the sanitizer pipeline, markup repair, and the final failure-mode
//! decision. Content problems never abort assembly; the only hard failures
//! are unparseable input and a misconfigured pipeline.

use amphora_dom::Document;
use amphora_html::{ParseFailure, SerializeMode, parse_document, parse_fragment, serialize};
use amphora_sanitize::{
    CDN_BASE, ErrorStatus, PipelineBuildError, PipelineContext, SanitizerPipeline, build_pipeline,
    default_registrations,
};
use amphora_spec::{ErrorCode, Severity};
use serde_json::{Value, json};
use strum_macros::Display;
use thiserror::Error;

use crate::repair::{RepairOptions, repair_markup};
use crate::validate::ValidateReport;

/// Neutralizes `document.write` in non-conformant fallback output, where
/// author scripts were removed but the page is served anyway. A late write
/// would clobber the rendered document.
const WRITE_GUARD_JS: &str =
    "(function(){var n=function(){};try{document.write=n;document.writeln=n}catch(e){}})();";

/// Where one response is in its assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AssemblyState {
    /// Input accepted, nothing parsed yet.
    ReceivedRaw,
    /// A document tree exists.
    Parsed,
    /// The pipeline has run over the tree.
    Sanitized,
    /// Required markup is in place.
    MarkupRepaired,
    /// The response value has been decided.
    Finalized,
}

/// External resolution of error statuses, keyed by code and params.
pub type StatusResolver = Box<dyn Fn(ErrorCode, &[(String, String)]) -> ErrorStatus>;

/// Per-request assembly options.
pub struct TransformOptions {
    /// Treat the input as a body fragment and wrap it in a skeleton.
    pub fragment: bool,
    /// Return the structured report instead of HTML.
    pub validate: bool,
    /// Href for the canonical link.
    pub canonical_url: Option<String>,
    /// Paired-mode fallback URL; blocking errors redirect here.
    pub paired_url: Option<String>,
    /// Element ids exempted from validation (dev mode).
    pub dev_mode_ids: Vec<String>,
    /// Consult the shared processed-stylesheet cache.
    pub use_cache: bool,
    /// Pin runtime and extension URLs to the fetched runtime version.
    pub pin_runtime: bool,
    /// Sanitizer registrations overriding the default chain.
    pub registrations: Option<Vec<(String, Value)>>,
    /// Resolver for previously-reviewed errors. Absent means every error is
    /// new and blocks.
    pub status_resolver: Option<StatusResolver>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            fragment: false,
            validate: false,
            canonical_url: None,
            paired_url: None,
            dev_mode_ids: Vec::new(),
            use_cache: true,
            pin_runtime: false,
            registrations: None,
            status_resolver: None,
        }
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("fragment", &self.fragment)
            .field("validate", &self.validate)
            .field("canonical_url", &self.canonical_url)
            .field("paired_url", &self.paired_url)
            .field("dev_mode_ids", &self.dev_mode_ids)
            .field("use_cache", &self.use_cache)
            .field("pin_runtime", &self.pin_runtime)
            .field("registrations", &self.registrations)
            .field("status_resolver", &self.status_resolver.is_some())
            .finish()
    }
}

/// What one assembly run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The repaired document.
    Html(String),
    /// Input that was never a full document; returned untouched.
    PassThrough(String),
    /// Paired-mode fallback: blocking errors remain, serve the original URL.
    Redirect {
        /// The fallback URL to serve instead.
        location: String,
        /// How many unresolved blocking errors forced the redirect.
        blocking_errors: usize,
    },
    /// Validate-mode structured report.
    Report(ValidateReport),
}

/// Counters from the last run, for operator-facing summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblySummary {
    /// Unique error-severity corrections.
    pub errors: usize,
    /// Unique warning-severity adjustments.
    pub warnings: usize,
    /// Errors still blocking after status resolution.
    pub blocking: usize,
    /// Bytes of collected custom CSS.
    pub style_bytes: usize,
    /// Collected script handles, runtime included, in emission order.
    pub script_handles: Vec<String>,
}

/// Why assembly failed outright.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// No document tree could be built from the input.
    #[error("failed to parse input: {0}")]
    Parse(#[from] ParseFailure),
    /// The registration list violates the pipeline ordering contract.
    #[error("failed to build sanitizer pipeline: {0}")]
    Pipeline(#[from] PipelineBuildError),
}

/// Drives one input through the assembly states.
#[derive(Debug)]
pub struct ResponseAssembler {
    state: AssemblyState,
    summary: Option<AssemblySummary>,
}

impl ResponseAssembler {
    /// Create an assembler in the initial state.
    #[must_use]
    pub fn new() -> Self {
        ResponseAssembler {
            state: AssemblyState::ReceivedRaw,
            summary: None,
        }
    }

    /// The state the last (or current) run reached.
    #[must_use]
    pub fn state(&self) -> AssemblyState {
        self.state
    }

    /// Counters from the last run. `None` before the first run and after a
    /// pass-through, which never builds a tree.
    #[must_use]
    pub fn summary(&self) -> Option<&AssemblySummary> {
        self.summary.as_ref()
    }

    /// Assemble one response.
    ///
    /// Non-document input passes through unchanged unless fragment mode is
    /// declared. Content-level violations are corrected and reported, never
    /// returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError`] for unparseable input or a registration
    /// list the pipeline builder refuses.
    pub fn process(
        &mut self,
        input: &str,
        options: &TransformOptions,
    ) -> Result<Response, AssembleError> {
        self.state = AssemblyState::ReceivedRaw;
        self.summary = None;
        if !options.fragment && !looks_like_document(input) {
            self.state = AssemblyState::Finalized;
            return Ok(Response::PassThrough(input.to_string()));
        }

        let mut doc = if options.fragment {
            parse_fragment(input)?
        } else {
            parse_document(input)?
        };
        self.state = AssemblyState::Parsed;

        let pipeline = build_pipeline_for(options)?;
        relocate_cdn_scripts(&mut doc);
        let mut ctx = PipelineContext::new();
        pipeline.run(&mut doc, &mut ctx);
        self.state = AssemblyState::Sanitized;

        let (reporter, mut collector) = ctx.finish();
        let repair_options = RepairOptions {
            canonical_url: options.canonical_url.clone(),
            pin_runtime: options.pin_runtime,
        };
        repair_markup(&mut doc, &mut collector, &repair_options);
        self.state = AssemblyState::MarkupRepaired;

        let resolve = |code: ErrorCode, params: &[(String, String)]| {
            match &options.status_resolver {
                Some(resolver) => resolver(code, params),
                None => ErrorStatus::New,
            }
        };

        let blocking = reporter.blocking_count(&resolve);
        let errors = reporter
            .errors()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count();
        self.summary = Some(AssemblySummary {
            errors,
            warnings: reporter.len() - errors,
            blocking,
            style_bytes: collector.style_bytes(),
            script_handles: collector.scripts().map(|s| s.handle.clone()).collect(),
        });

        self.state = AssemblyState::Finalized;
        if options.validate {
            let url = options.canonical_url.as_deref().unwrap_or("");
            let queried = if options.fragment { "fragment" } else { "document" };
            return Ok(Response::Report(ValidateReport::from_reporter(
                &reporter, &resolve, url, queried,
            )));
        }

        if blocking == 0 {
            return Ok(Response::Html(serialize(&doc, SerializeMode::FullDocument)));
        }
        if let Some(location) = &options.paired_url {
            return Ok(Response::Redirect {
                location: location.clone(),
                blocking_errors: blocking,
            });
        }

        // Canonical mode with unresolved blocking errors: serve the page
        // anyway, stripped of the conformance marker and guarded against
        // late writes.
        strip_amp_marker(&mut doc);
        inject_write_guard(&mut doc);
        Ok(Response::Html(serialize(&doc, SerializeMode::FullDocument)))
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        ResponseAssembler::new()
    }
}

/// Whether the input is a full HTML document: an `<html` tag followed
/// somewhere by a head section.
fn looks_like_document(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    match lower.find("<html") {
        Some(position) => lower[position..].contains("<head"),
        None => false,
    }
}

/// Materialize the registration list for this request and build the
/// pipeline. Default style args follow the request's cache flag; dev-mode
/// marking slots in right before the validator.
fn build_pipeline_for(options: &TransformOptions) -> Result<SanitizerPipeline, PipelineBuildError> {
    let mut registrations: Vec<(String, Value)> = match &options.registrations {
        Some(list) => list.clone(),
        None => default_registrations()
            .into_iter()
            .map(|(id, args)| (id.to_string(), args))
            .collect(),
    };
    for (id, args) in &mut registrations {
        if id == "style" && args.is_null() {
            *args = json!({ "use_cache": options.use_cache });
        }
    }
    if !options.dev_mode_ids.is_empty() {
        let position = registrations
            .iter()
            .position(|(id, _)| id == "validator")
            .unwrap_or(registrations.len());
        registrations.insert(
            position,
            (
                "dev-mode".to_string(),
                json!({ "element_ids": options.dev_mode_ids }),
            ),
        );
    }
    let borrowed: Vec<(&str, Value)> = registrations
        .iter()
        .map(|(id, args)| (id.as_str(), args.clone()))
        .collect();
    build_pipeline(&borrowed)
}

/// Move runtime and extension scripts found in body up into head, ahead of
/// validation. The validator requires them under head; without relocation it
/// would strip scripts that are merely misplaced.
fn relocate_cdn_scripts(doc: &mut Document) {
    let (Some(head), Some(body)) = (doc.head(), doc.body()) else {
        return;
    };
    for id in doc.elements_by_tag("script") {
        if !doc.is_descendant_of(id, body) {
            continue;
        }
        let is_cdn = doc
            .as_element(id)
            .and_then(|e| e.attr("src"))
            .is_some_and(|src| src.starts_with(CDN_BASE));
        if is_cdn {
            doc.detach(id);
            doc.append_child(head, id);
        }
    }
}

fn strip_amp_marker(doc: &mut Document) {
    if let Some(html) = doc.document_element()
        && let Some(element) = doc.as_element_mut(html)
    {
        let _ = element.remove_attr("amp");
        let _ = element.remove_attr("\u{26a1}");
    }
}

fn inject_write_guard(doc: &mut Document) {
    let Some(head) = doc.head() else {
        return;
    };
    let script = doc.create_element("script");
    let text = doc.create_text(WRITE_GUARD_JS);
    doc.append_child(script, text);
    doc.prepend_child(head, script);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_document() {
        assert!(looks_like_document(
            "<!DOCTYPE html><html><head></head><body></body></html>"
        ));
        assert!(looks_like_document("<HTML lang=\"en\"><HEAD></HEAD></HTML>"));
        assert!(!looks_like_document("<p>just a fragment</p>"));
        assert!(!looks_like_document("plain text"));
        assert!(!looks_like_document("<html>no head here</html>"));
    }

    #[test]
    fn test_default_pipeline_build_succeeds() {
        let options = TransformOptions::default();
        assert!(build_pipeline_for(&options).is_ok());
    }

    #[test]
    fn test_dev_mode_slots_before_validator() {
        let options = TransformOptions {
            dev_mode_ids: vec!["toolbar".to_string()],
            ..TransformOptions::default()
        };
        let pipeline = build_pipeline_for(&options).unwrap();
        let names = pipeline.names();
        let dev = names.iter().position(|&n| n == "dev-mode").unwrap();
        assert_eq!(names[dev + 1], "validator");
    }

    #[test]
    fn test_custom_registrations_are_honored() {
        let options = TransformOptions {
            registrations: Some(vec![
                ("img".to_string(), Value::Null),
                ("validator".to_string(), Value::Null),
            ]),
            ..TransformOptions::default()
        };
        let pipeline = build_pipeline_for(&options).unwrap();
        assert_eq!(pipeline.names(), vec!["img", "validator"]);
    }

    #[test]
    fn test_misordered_registrations_fail_the_build() {
        let options = TransformOptions {
            registrations: Some(vec![("img".to_string(), Value::Null)]),
            ..TransformOptions::default()
        };
        assert!(build_pipeline_for(&options).is_err());
    }

    #[test]
    fn test_relocation_moves_only_cdn_scripts() {
        let mut doc = parse_document(
            "<html><head></head><body>\
             <script async src=\"https://cdn.ampproject.org/v0.js\"></script>\
             <script src=\"https://example.com/app.js\"></script>\
             </body></html>",
        )
        .unwrap();
        relocate_cdn_scripts(&mut doc);
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();
        let in_head: Vec<_> = doc
            .elements_by_tag("script")
            .into_iter()
            .filter(|&id| doc.is_descendant_of(id, head))
            .collect();
        assert_eq!(in_head.len(), 1);
        let in_body: Vec<_> = doc
            .elements_by_tag("script")
            .into_iter()
            .filter(|&id| doc.is_descendant_of(id, body))
            .collect();
        assert_eq!(in_body.len(), 1);
    }
}
