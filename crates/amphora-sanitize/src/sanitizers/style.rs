//! Stylesheet extraction, filtering, and tree-shaking.
//!
//! Collects every author `<style>` element and inline `style` attribute,
//! filters the CSS down to what the target format admits, prunes rules the
//! document cannot match, and hands the surviving rules to the asset
//! collector for the single `<style amp-custom>` element the assembler
//! emits. Runs after the content passes so it sees the final markup, and
//! before the validator so leftover style markup is gone by conformance
//! time.

use std::collections::HashSet;

use amphora_css::{
    AtRule, AtRuleBlock, Declaration, Rule, Stylesheet, declarations_to_css, parse_declarations,
    parse_stylesheet, rule_to_css, stylesheet_to_css,
};
use amphora_dom::Document;
use amphora_spec::ErrorCode;
use serde::Deserialize;

use crate::collect::{self, ProcessedCss, StyleRule, cache_key, content_hash};
use crate::context::PipelineContext;
use crate::error::ValidationError;
use crate::sanitizer::{Sanitizer, Stage};

/// Byte budget for the author stylesheet, per the AMP format.
pub const STYLESHEET_BYTE_BUDGET: usize = 75_000;

/// Class prefix for rules synthesized from inline `style` attributes.
pub const INLINE_CLASS_PREFIX: &str = "amphora-inline-";

/// Fingerprint of the filtering rules, part of the cache key so a policy
/// change invalidates cached results.
const FILTER_FINGERPRINT: &str = "amp-custom/v1";

/// At-rules the author stylesheet may contain.
const ALLOWED_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "keyframes",
    "-webkit-keyframes",
    "-moz-keyframes",
    "-o-keyframes",
    "-ms-keyframes",
    "font-face",
    "page",
];

/// Properties the author stylesheet may not contain.
const DISALLOWED_PROPERTIES: &[&str] = &["behavior", "-moz-binding"];

/// Configuration for [`StyleSanitizer`].
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleArgs {
    /// Consult the shared processed-stylesheet cache. The cache is advisory;
    /// disabling it only costs redundant parsing.
    pub use_cache: bool,
}

impl Default for StyleArgs {
    fn default() -> Self {
        StyleArgs { use_cache: true }
    }
}

/// Extracts, filters, and tree-shakes author CSS.
#[derive(Debug, Default)]
pub struct StyleSanitizer {
    args: StyleArgs,
}

impl StyleSanitizer {
    /// Create the pass with explicit args.
    #[must_use]
    pub const fn new(args: StyleArgs) -> Self {
        StyleSanitizer { args }
    }
}

impl Sanitizer for StyleSanitizer {
    fn name(&self) -> &'static str {
        "style"
    }

    fn stage(&self) -> Stage {
        Stage::Style
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        // Author <style> elements, in document order. The boilerplate is the
        // runtime's contract, not author CSS, and stays where it is.
        let mut sources: Vec<(String, String)> = Vec::new();
        for id in doc.elements_by_tag("style") {
            let is_boilerplate = doc
                .as_element(id)
                .is_some_and(|e| e.has_attr("amp-boilerplate"));
            if is_boilerplate {
                continue;
            }
            sources.push((doc.text_content(id), doc.node_path(id)));
            doc.detach(id);
        }

        // Inline style attributes become class rules; the class keeps the
        // rule alive through tree-shaking by construction.
        let mut inline_rules: Vec<String> = Vec::new();
        let elements: Vec<_> = doc.descendants(doc.root()).collect();
        for id in elements {
            let Some(css) = doc.as_element_mut(id).and_then(|e| e.remove_attr("style")) else {
                continue;
            };
            let path = doc.node_path(id);
            let declarations = filter_declarations(parse_declarations(&css), ctx, &path);
            if declarations.is_empty() {
                continue;
            }
            let body = declarations_to_css(&declarations);
            let class = format!("{INLINE_CLASS_PREFIX}{:08x}", content_hash(&body) as u32);
            if let Some(element) = doc.as_element_mut(id)
                && !element.has_class(&class)
            {
                let classes = match element.attr("class") {
                    Some(existing) => format!("{existing} {class}"),
                    None => class.clone(),
                };
                element.set_attr("class", &classes);
            }
            inline_rules.push(format!(".{class}{{{body}}}"));
        }

        // Filter each source sheet, consulting the advisory cache, then
        // shake the result against the document.
        let usage = Usage::of(doc);
        let mut pending: Vec<StyleRule> = Vec::new();
        for (css, path) in &sources {
            let processed = self.process(css, ctx, path);
            let filtered = parse_stylesheet(&processed.css);
            for rule in filtered.rules {
                if let Some((kept, uses)) = shake_rule(rule, &usage) {
                    let mut style_rule = StyleRule::new(rule_to_css(&kept));
                    style_rule.uses = uses;
                    pending.push(style_rule);
                }
            }
        }
        for rule in inline_rules {
            let mut style_rule = StyleRule::new(rule);
            style_rule.uses = 1;
            pending.push(style_rule);
        }

        // Byte budget over the surviving rules; everything past the limit is
        // dropped with a single error.
        let mut total = 0usize;
        let mut overflowed = false;
        let all_bytes: usize = pending.iter().map(|r| r.css.len()).sum();
        for rule in pending {
            if total + rule.css.len() > STYLESHEET_BYTE_BUDGET {
                overflowed = true;
                continue;
            }
            total += rule.css.len();
            ctx.collector_mut().merge_style(rule);
        }
        if overflowed {
            ctx.record(ValidationError::new(
                ErrorCode::StylesheetTooLong,
                &[
                    ("bytes", &all_bytes.to_string()),
                    ("limit", &STYLESHEET_BYTE_BUDGET.to_string()),
                ],
                "/html/head/style",
            ));
        }
    }
}

impl StyleSanitizer {
    /// Filter one stylesheet, replaying cached violations when the cache has
    /// seen this exact text before.
    fn process(&self, css: &str, ctx: &mut PipelineContext, path: &str) -> ProcessedCss {
        let key = cache_key(css, FILTER_FINGERPRINT);
        let processed = if self.args.use_cache {
            collect::shared_cache().get(key)
        } else {
            None
        }
        .unwrap_or_else(|| {
            let processed = filter_stylesheet(css);
            if self.args.use_cache {
                collect::shared_cache().put(key, processed.clone());
            }
            processed
        });
        for (code, params) in &processed.errors {
            let borrowed: Vec<(&str, &str)> = params
                .iter()
                .map(|(n, v)| (n.as_str(), v.as_str()))
                .collect();
            ctx.record(ValidationError::new(*code, &borrowed, path));
        }
        processed
    }
}

/// Parse and filter a stylesheet to the admissible subset, collecting the
/// violations without node paths so one cache entry serves any document.
fn filter_stylesheet(css: &str) -> ProcessedCss {
    let mut errors: Vec<(ErrorCode, Vec<(String, String)>)> = Vec::new();
    let sheet = parse_stylesheet(css);
    let rules = filter_rules(sheet.rules, &mut errors);
    ProcessedCss {
        css: stylesheet_to_css(&Stylesheet { rules }),
        errors,
    }
}

fn filter_rules(
    rules: Vec<Rule>,
    errors: &mut Vec<(ErrorCode, Vec<(String, String)>)>,
) -> Vec<Rule> {
    let mut kept = Vec::with_capacity(rules.len());
    for rule in rules {
        match rule {
            Rule::Style(mut style) => {
                style.declarations = filter_declaration_list(style.declarations, errors);
                if !style.declarations.is_empty() {
                    kept.push(Rule::Style(style));
                }
            }
            Rule::At(at) => {
                if !ALLOWED_AT_RULES.contains(&at.name.as_str()) {
                    errors.push((
                        ErrorCode::CssSyntaxInvalidAtRule,
                        vec![("at_rule".to_string(), at.name.clone())],
                    ));
                    continue;
                }
                let block = match at.block {
                    AtRuleBlock::Rules(inner) => AtRuleBlock::Rules(filter_rules(inner, errors)),
                    AtRuleBlock::Declarations(decls) => {
                        AtRuleBlock::Declarations(filter_declaration_list(decls, errors))
                    }
                    AtRuleBlock::None => AtRuleBlock::None,
                };
                kept.push(Rule::At(AtRule { block, ..at }));
            }
        }
    }
    kept
}

fn filter_declaration_list(
    declarations: Vec<Declaration>,
    errors: &mut Vec<(ErrorCode, Vec<(String, String)>)>,
) -> Vec<Declaration> {
    let mut kept = Vec::with_capacity(declarations.len());
    for mut declaration in declarations {
        if DISALLOWED_PROPERTIES.contains(&declaration.name.as_str()) {
            errors.push((
                ErrorCode::CssSyntaxInvalidProperty,
                vec![("property".to_string(), declaration.name.clone())],
            ));
            continue;
        }
        if declaration.important {
            declaration.important = false;
            errors.push((ErrorCode::CssSyntaxInvalidImportant, Vec::new()));
        }
        kept.push(declaration);
    }
    kept
}

/// Filter a declaration list for an inline style attribute, recording the
/// violations directly (inline declarations never pass through the cache:
/// their synthesized class depends on the filtered text anyway).
fn filter_declarations(
    declarations: Vec<Declaration>,
    ctx: &mut PipelineContext,
    path: &str,
) -> Vec<Declaration> {
    let mut errors = Vec::new();
    let kept = filter_declaration_list(declarations, &mut errors);
    for (code, params) in &errors {
        let borrowed: Vec<(&str, &str)> =
            params.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
        ctx.record(ValidationError::new(*code, &borrowed, path));
    }
    kept
}

/// The class names, ids, and element types present in a document.
struct Usage {
    classes: HashSet<String>,
    ids: HashSet<String>,
    types: HashSet<String>,
}

impl Usage {
    fn of(doc: &Document) -> Self {
        let mut classes = HashSet::new();
        let mut ids = HashSet::new();
        let mut types = HashSet::new();
        for id in doc.descendants(doc.root()) {
            let Some(element) = doc.as_element(id) else {
                continue;
            };
            let _ = types.insert(element.tag_name.to_ascii_lowercase());
            for class in element.classes() {
                let _ = classes.insert(class.to_string());
            }
            if let Some(element_id) = element.id() {
                let _ = ids.insert(element_id.to_string());
            }
        }
        Usage {
            classes,
            ids,
            types,
        }
    }

    fn can_match(&self, selector: &amphora_css::Selector) -> bool {
        let refs = selector.refs();
        refs.classes.iter().all(|c| self.classes.contains(c))
            && refs.ids.iter().all(|i| self.ids.contains(i))
            && refs.types.iter().all(|t| self.types.contains(t))
    }
}

/// Prune a rule against document usage. Returns the kept rule and how many
/// selectors survived, or `None` when nothing in the document can match it.
/// Shaking is one-sided: a kept selector may still never match, a dropped
/// one never could.
fn shake_rule(rule: Rule, usage: &Usage) -> Option<(Rule, usize)> {
    match rule {
        Rule::Style(mut style) => {
            style.selectors.retain(|s| usage.can_match(s));
            let uses = style.selectors.len();
            (uses > 0).then_some((Rule::Style(style), uses))
        }
        Rule::At(at) => match at.block {
            AtRuleBlock::Rules(inner) => {
                let mut uses = 0;
                let kept: Vec<Rule> = inner
                    .into_iter()
                    .filter_map(|r| shake_rule(r, usage))
                    .map(|(r, n)| {
                        uses += n;
                        r
                    })
                    .collect();
                // Keyframes bodies have no selectors to shake; an emptied
                // conditional group is dead weight.
                if kept.is_empty() && !at.name.ends_with("keyframes") {
                    return None;
                }
                Some((
                    Rule::At(AtRule {
                        block: AtRuleBlock::Rules(kept),
                        ..at
                    }),
                    uses,
                ))
            }
            _ => Some((Rule::At(at), 0)),
        },
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::parse_fragment;

    use super::*;

    fn run(html: &str) -> (Document, PipelineContext) {
        let mut doc = parse_fragment(html).unwrap();
        let mut ctx = PipelineContext::new();
        StyleSanitizer::new(StyleArgs { use_cache: false }).sanitize(&mut doc, &mut ctx);
        (doc, ctx)
    }

    #[test]
    fn test_inline_style_migrates_to_class_rule() {
        let (doc, ctx) = run("<div style=\"color:red\">x</div>");
        let divs = doc.elements_by_tag("div");
        let element = doc.as_element(divs[0]).unwrap();
        assert!(!element.has_attr("style"));
        let class = element.attr("class").unwrap();
        assert!(class.starts_with(INLINE_CLASS_PREFIX));
        let styles = ctx.collector().styles();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].css, format!(".{class}{{color:red}}"));
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_identical_inline_styles_share_one_rule() {
        let (doc, ctx) = run("<p style=\"margin:0\">a</p><p style=\"margin:0\">b</p>");
        assert_eq!(ctx.collector().styles().len(), 1);
        let paragraphs = doc.elements_by_tag("p");
        let first = doc.as_element(paragraphs[0]).unwrap().attr("class");
        let second = doc.as_element(paragraphs[1]).unwrap().attr("class");
        assert_eq!(first, second);
    }

    #[test]
    fn test_style_element_is_collected_and_removed() {
        let (doc, ctx) = run("<style>p{color:blue}</style><p>x</p>");
        assert!(doc.elements_by_tag("style").is_empty());
        let styles = ctx.collector().styles();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].css, "p{color:blue}");
    }

    #[test]
    fn test_import_is_stripped_with_error() {
        let (_, ctx) = run("<style>@import url(a.css);p{color:blue}</style><p>x</p>");
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::CssSyntaxInvalidAtRule);
        assert_eq!(
            ctx.errors()[0].params,
            vec![("at_rule".to_string(), "import".to_string())]
        );
        assert_eq!(ctx.collector().styles().len(), 1);
    }

    #[test]
    fn test_disallowed_property_is_dropped_with_its_name() {
        let (_, ctx) = run("<style>p{behavior:url(x.htc);color:blue}</style><p>x</p>");
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::CssSyntaxInvalidProperty);
        assert_eq!(
            ctx.errors()[0].params,
            vec![("property".to_string(), "behavior".to_string())]
        );
        assert_eq!(ctx.collector().styles()[0].css, "p{color:blue}");
    }

    #[test]
    fn test_important_is_stripped() {
        let (_, ctx) = run("<style>p{color:blue !important}</style><p>x</p>");
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::CssSyntaxInvalidImportant);
        assert_eq!(ctx.collector().styles()[0].css, "p{color:blue}");
    }

    #[test]
    fn test_unused_rules_are_shaken_out() {
        let (_, ctx) = run("<style>p{margin:0}.missing{margin:0}</style><p>x</p>");
        let styles = ctx.collector().styles();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].css, "p{margin:0}");
        assert_eq!(styles[0].uses, 1);
    }

    #[test]
    fn test_media_query_survives_with_used_rules() {
        let (_, ctx) = run("<style>@media (max-width:600px){p{margin:0}}</style><p>x</p>");
        let styles = ctx.collector().styles();
        assert_eq!(styles.len(), 1);
        assert!(styles[0].css.starts_with("@media"));
    }

    #[test]
    fn test_boilerplate_style_is_left_alone() {
        let mut doc = amphora_html::parse_document(
            "<html><head><style amp-boilerplate>body{visibility:hidden}</style></head>\
             <body></body></html>",
        )
        .unwrap();
        let mut ctx = PipelineContext::new();
        StyleSanitizer::new(StyleArgs { use_cache: false }).sanitize(&mut doc, &mut ctx);
        assert_eq!(doc.elements_by_tag("style").len(), 1);
        assert!(ctx.collector().styles().is_empty());
    }

    #[test]
    fn test_budget_overflow_drops_rules_with_one_error() {
        let big = format!("<style>p{{content:\"{}\"}}</style><p>x</p>", "x".repeat(80_000));
        let (_, ctx) = run(&big);
        assert!(ctx.collector().styles().is_empty());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].code, ErrorCode::StylesheetTooLong);
    }
}
