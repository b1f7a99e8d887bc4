//! The tag/attribute conformance validator.
//!
//! The last pass in every pipeline. Earlier passes may legally leave markup
//! that is not yet conformant; this one guarantees the tree it leaves behind
//! validates against the spec table. It walks the document depth-first in
//! pre-order, matches every element against its candidate tag-specs, and
//! applies the corrections the chosen spec's violation set calls for:
//! node-fatal violations remove the element, attribute-fatal ones remove the
//! attribute. Each correction is mirrored by one error record.

use std::collections::HashSet;
use std::str::FromStr;

use amphora_common::url::{is_protocol_allowed, scheme_of};
use amphora_dom::{Document, ElementData, NodeId};
use amphora_spec::{ErrorCode, Layout, SpecTable, TagSpec};

use crate::DEV_MODE_ATTR;
use crate::collect::{RUNTIME_HANDLE, ScriptAsset, ScriptKind};
use crate::context::PipelineContext;
use crate::error::ValidationError;
use crate::sanitizer::{Sanitizer, Stage};

/// Scheme accepted for a URL attribute with no explicit protocol list.
const DEFAULT_PROTOCOLS: &[&str] = &["https"];

/// The conformance validator. Stateless between runs; all per-document
/// bookkeeping lives in a [`Run`].
#[derive(Debug, Default)]
pub struct TagAttributeValidator;

impl Sanitizer for TagAttributeValidator {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn stage(&self) -> Stage {
        Stage::Conformance
    }

    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        let mut run = Run {
            table: SpecTable::shared(),
            seen_unique: HashSet::new(),
            chosen: Vec::new(),
        };
        if let Some(html) = doc.document_element() {
            run.visit(doc, ctx, html);
        }
        run.check_children(doc, ctx);
    }
}

/// One violation of a candidate spec against one element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Violation {
    MandatoryAttrMissing { attr: String },
    DisallowedAttr { attr: String },
    InvalidAttrValue { attr: String, value: String, mandatory: bool },
    InvalidAttrValueCasei { attr: String, value: String, want: String, mandatory: bool },
    MissingUrl { attr: String, mandatory: bool },
    InvalidUrl { attr: String, value: String, mandatory: bool },
    InvalidUrlProtocol { attr: String, scheme: String, mandatory: bool },
    WrongParent { parent: String, required: String },
    MandatoryAncestorMissing { required: String, hint: Option<String> },
    DisallowedAncestor { ancestor: String },
    DuplicateUnique,
    SpecifiedLayoutInvalid { layout: String, node_fatal: bool },
}

impl Violation {
    /// Whether applying this violation's correction removes the whole node.
    /// Value violations on a mandatory attribute are node-fatal: removing
    /// the attribute instead would just re-fail as missing-mandatory on the
    /// next pass.
    fn is_node_fatal(&self) -> bool {
        match self {
            Violation::MandatoryAttrMissing { .. }
            | Violation::WrongParent { .. }
            | Violation::MandatoryAncestorMissing { .. }
            | Violation::DisallowedAncestor { .. }
            | Violation::DuplicateUnique => true,
            Violation::DisallowedAttr { .. } => false,
            Violation::InvalidAttrValue { mandatory, .. }
            | Violation::InvalidAttrValueCasei { mandatory, .. }
            | Violation::MissingUrl { mandatory, .. }
            | Violation::InvalidUrl { mandatory, .. }
            | Violation::InvalidUrlProtocol { mandatory, .. } => *mandatory,
            Violation::SpecifiedLayoutInvalid { node_fatal, .. } => *node_fatal,
        }
    }

    /// The attribute this violation removes, for attribute-fatal ones.
    fn removed_attr(&self) -> Option<&str> {
        match self {
            Violation::DisallowedAttr { attr }
            | Violation::InvalidAttrValue { attr, .. }
            | Violation::InvalidAttrValueCasei { attr, .. }
            | Violation::MissingUrl { attr, .. }
            | Violation::InvalidUrl { attr, .. }
            | Violation::InvalidUrlProtocol { attr, .. } => Some(attr),
            Violation::SpecifiedLayoutInvalid { .. } => Some("layout"),
            _ => None,
        }
    }

    /// Build the error record for this violation. Parameter order follows
    /// the catalog message templates.
    fn to_error(&self, tag: &str, path: &str) -> ValidationError {
        match self {
            Violation::MandatoryAttrMissing { attr } => ValidationError::new(
                ErrorCode::MandatoryAttrMissing,
                &[("attr_name", attr), ("node_name", tag)],
                path,
            ),
            Violation::DisallowedAttr { attr } => ValidationError::new(
                ErrorCode::DisallowedAttr,
                &[("attr_name", attr), ("node_name", tag)],
                path,
            ),
            Violation::InvalidAttrValue { attr, value, .. } => ValidationError::new(
                ErrorCode::InvalidAttrValue,
                &[("attr_name", attr), ("node_name", tag), ("attr_value", value)],
                path,
            ),
            Violation::InvalidAttrValueCasei { attr, value, want, .. } => ValidationError::new(
                ErrorCode::InvalidAttrValueCasei,
                &[
                    ("attr_name", attr),
                    ("node_name", tag),
                    ("attr_value", value),
                    ("required_value", want),
                ],
                path,
            ),
            Violation::MissingUrl { attr, .. } => ValidationError::new(
                ErrorCode::MissingUrl,
                &[("attr_name", attr), ("node_name", tag)],
                path,
            ),
            Violation::InvalidUrl { attr, value, .. } => ValidationError::new(
                ErrorCode::InvalidUrl,
                &[("url", value), ("attr_name", attr), ("node_name", tag)],
                path,
            ),
            Violation::InvalidUrlProtocol { attr, scheme, .. } => ValidationError::new(
                ErrorCode::InvalidUrlProtocol,
                &[("protocol", scheme), ("attr_name", attr), ("node_name", tag)],
                path,
            ),
            Violation::WrongParent { parent, required } => ValidationError::new(
                ErrorCode::WrongParentTag,
                &[
                    ("node_name", tag),
                    ("parent_name", parent),
                    ("required_parent", required),
                ],
                path,
            ),
            Violation::MandatoryAncestorMissing {
                required,
                hint: Some(hint),
            } => ValidationError::new(
                ErrorCode::MandatoryTagAncestorWithHint,
                &[
                    ("node_name", tag),
                    ("ancestor", required),
                    ("alternative", hint),
                ],
                path,
            ),
            Violation::MandatoryAncestorMissing { required, hint: None } => ValidationError::new(
                ErrorCode::MandatoryTagAncestor,
                &[("node_name", tag), ("ancestor", required)],
                path,
            ),
            Violation::DisallowedAncestor { ancestor } => ValidationError::new(
                ErrorCode::DisallowedTagAncestor,
                &[("node_name", tag), ("ancestor", ancestor)],
                path,
            ),
            Violation::DuplicateUnique => {
                ValidationError::new(ErrorCode::DuplicateUniqueTag, &[("node_name", tag)], path)
            }
            Violation::SpecifiedLayoutInvalid { layout, .. } => ValidationError::new(
                ErrorCode::SpecifiedLayoutInvalid,
                &[("layout", layout), ("node_name", tag)],
                path,
            ),
        }
    }
}

/// Per-document validator state.
struct Run {
    table: &'static SpecTable,
    seen_unique: HashSet<(String, usize)>,
    /// `(node, tag, spec index)` for every element kept, for the
    /// post-traversal child-cardinality check.
    chosen: Vec<(NodeId, String, usize)>,
}

impl Run {
    fn visit(&mut self, doc: &mut Document, ctx: &mut PipelineContext, id: NodeId) {
        let Some(element) = doc.as_element(id) else {
            return;
        };
        let tag = element.tag_name.to_ascii_lowercase();

        // A dev-mode subtree passes through unvalidated; the root carries
        // the marker only to activate the mode and is still validated.
        if ctx.dev_mode() && tag != "html" && element.has_attr(DEV_MODE_ATTR) {
            return;
        }

        let specs = self.table.specs_for(&tag);
        if specs.is_empty() {
            let path = doc.node_path(id);
            doc.detach(id);
            ctx.record(ValidationError::new(
                ErrorCode::DisallowedTag,
                &[("node_name", &tag)],
                &path,
            ));
            return;
        }

        // Match against every candidate: fewest violations wins, ties go to
        // the lowest specificity value.
        let mut best: Option<(usize, Vec<Violation>)> = None;
        for (idx, spec) in specs.iter().enumerate() {
            let violations = self.evaluate(doc, id, element, &tag, spec, idx);
            let better = match &best {
                None => true,
                Some((best_idx, best_violations)) => {
                    (violations.len(), spec.specificity)
                        < (best_violations.len(), specs[*best_idx].specificity)
                }
            };
            if better {
                best = Some((idx, violations));
            }
        }
        let (idx, violations) = best.expect("specs is non-empty");
        let spec = &specs[idx];
        let path = doc.node_path(id);

        if violations.iter().any(Violation::is_node_fatal) {
            doc.detach(id);
            if tag == "script" {
                // All script shapes that fail node-fatally are custom
                // JavaScript as far as the format is concerned.
                ctx.record(ValidationError::new(ErrorCode::DisallowedScriptTag, &[], &path));
            } else {
                for violation in violations.iter().filter(|v| v.is_node_fatal()) {
                    ctx.record(violation.to_error(&tag, &path));
                }
            }
            return;
        }

        if spec.unique {
            let _ = self.seen_unique.insert((tag.clone(), idx));
        }
        for violation in &violations {
            if let Some(attr) = violation.removed_attr()
                && let Some(element) = doc.as_element_mut(id)
            {
                let _ = element.remove_attr(attr);
            }
            ctx.record(violation.to_error(&tag, &path));
        }
        self.resolve_layout(doc, ctx, id, &tag, spec, &path);

        if let Some(handle) = &spec.requires_extension {
            ctx.collector_mut().merge_script(ScriptAsset::extension(handle));
        }
        if tag == "script"
            && let Some(element) = doc.as_element(id)
        {
            register_script(ctx, element, spec);
        }

        self.chosen.push((id, tag, idx));
        let children: Vec<NodeId> = doc.children(id).to_vec();
        for child in children {
            self.visit(doc, ctx, child);
        }
    }

    /// Compute the violation set of one candidate spec, without mutating
    /// anything.
    fn evaluate(
        &self,
        doc: &Document,
        id: NodeId,
        element: &ElementData,
        tag: &str,
        spec: &TagSpec,
        idx: usize,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        if spec.unique && self.seen_unique.contains(&(tag.to_string(), idx)) {
            violations.push(Violation::DuplicateUnique);
        }

        for (name, _) in spec.mandatory_attrs() {
            if !element.has_attr(name) {
                violations.push(Violation::MandatoryAttrMissing {
                    attr: name.to_string(),
                });
            }
        }

        for attr in &element.attrs {
            let name = attr.name.to_ascii_lowercase();
            match spec.attr(&name) {
                Some(attr_spec) => {
                    if let Some(want) = &attr_spec.value_casei
                        && !attr.value.eq_ignore_ascii_case(want)
                    {
                        violations.push(Violation::InvalidAttrValueCasei {
                            attr: name.clone(),
                            value: attr.value.clone(),
                            want: want.clone(),
                            mandatory: attr_spec.mandatory,
                        });
                        continue;
                    }
                    if let Some(regex) = &attr_spec.value_regex
                        && !regex.is_match(&attr.value)
                    {
                        violations.push(Violation::InvalidAttrValue {
                            attr: name.clone(),
                            value: attr.value.clone(),
                            mandatory: attr_spec.mandatory,
                        });
                        continue;
                    }
                    if attr_spec.is_url {
                        if let Some(violation) = check_url(&name, &attr.value, attr_spec.mandatory, &attr_spec.allowed_protocols) {
                            violations.push(violation);
                        }
                    }
                }
                None => {
                    if !SpecTable::is_global_attr(&name) {
                        violations.push(Violation::DisallowedAttr { attr: name });
                    }
                }
            }
        }

        if let Some(required) = &spec.mandatory_parent {
            let parent_tag = doc
                .parent(id)
                .and_then(|p| doc.as_element(p))
                .map(|e| e.tag_name.to_ascii_lowercase());
            if parent_tag.as_deref() != Some(required.as_str()) {
                violations.push(Violation::WrongParent {
                    parent: parent_tag.unwrap_or_else(|| "$root".to_string()),
                    required: required.clone(),
                });
            }
        }
        if let Some(required) = &spec.mandatory_ancestor
            && !self.has_ancestor(doc, id, required)
        {
            violations.push(Violation::MandatoryAncestorMissing {
                required: required.clone(),
                hint: spec.mandatory_ancestor_alternative.clone(),
            });
        }
        for ancestor in &spec.disallowed_ancestors {
            if self.has_ancestor(doc, id, ancestor) {
                violations.push(Violation::DisallowedAncestor {
                    ancestor: ancestor.clone(),
                });
            }
        }

        if let Some(layout) = element.attr("layout")
            && !spec.layout_support.is_empty()
        {
            let supported = Layout::from_str(layout).is_ok_and(|l| spec.supports_layout(l));
            if !supported {
                violations.push(Violation::SpecifiedLayoutInvalid {
                    layout: layout.to_string(),
                    node_fatal: spec.requires_layout,
                });
            }
        }

        violations
    }

    fn has_ancestor(&self, doc: &Document, id: NodeId, tag: &str) -> bool {
        doc.ancestors(id)
            .any(|a| doc.as_element(a).is_some_and(|e| e.is(tag)))
    }

    /// Implicit layout resolution for tags that take a layout and have no
    /// explicit `layout` attribute (an invalid explicit one was removed as a
    /// correction before this runs). An unsupported implied layout is
    /// corrected best-effort to the tag's first supported layout.
    fn resolve_layout(
        &self,
        doc: &mut Document,
        ctx: &mut PipelineContext,
        id: NodeId,
        tag: &str,
        spec: &TagSpec,
        path: &str,
    ) {
        if spec.layout_support.is_empty() {
            return;
        }
        let Some(element) = doc.as_element_mut(id) else {
            return;
        };
        if element.has_attr("layout") {
            return;
        }
        let implied = Layout::implied(
            element.attr("width"),
            element.attr("height"),
            element.has_attr("sizes") || element.has_attr("heights"),
        );
        if spec.supports_layout(implied) {
            return;
        }
        let Some(&fallback) = spec.layout_support.first() else {
            return;
        };
        element.set_attr("layout", &fallback.to_string());
        ctx.record(ValidationError::new(
            ErrorCode::ImpliedLayoutInvalid,
            &[("layout", &implied.to_string()), ("node_name", tag)],
            path,
        ));
    }

    /// Post-traversal child-cardinality checks over every kept element.
    /// Violations are node-fatal on the parent.
    fn check_children(&self, doc: &mut Document, ctx: &mut PipelineContext) {
        for (id, tag, idx) in &self.chosen {
            // Skip nodes a later correction already removed.
            if doc.parent(*id).is_none() {
                continue;
            }
            let Some(constraints) = self.table.specs_for(tag)[*idx].child_constraints.as_ref()
            else {
                continue;
            };
            let child_tags: Vec<String> = doc
                .children(*id)
                .iter()
                .filter_map(|&c| doc.as_element(c))
                .map(|e| e.tag_name.to_ascii_lowercase())
                .collect();
            let path = doc.node_path(*id);
            let mut fatal = false;

            if let Some(allowed) = &constraints.allowed {
                for child in &child_tags {
                    if !allowed.iter().any(|a| a == child) {
                        ctx.record(ValidationError::new(
                            ErrorCode::DisallowedChildTag,
                            &[
                                ("child_tag", child),
                                ("node_name", tag),
                                ("allowed", &allowed.join(", ")),
                            ],
                            &path,
                        ));
                        fatal = true;
                    }
                }
            }
            for count in &constraints.counts {
                let found = child_tags.iter().filter(|t| *t == &count.tag).count();
                if found < count.min {
                    ctx.record(ValidationError::new(
                        ErrorCode::IncorrectMinNumChildTags,
                        &[
                            ("node_name", tag),
                            ("expected", &count.min.to_string()),
                            ("child_tag", &count.tag),
                            ("found", &found.to_string()),
                        ],
                        &path,
                    ));
                    fatal = true;
                }
                if let Some(max) = count.max
                    && found > max
                {
                    ctx.record(ValidationError::new(
                        ErrorCode::IncorrectNumChildTags,
                        &[
                            ("node_name", tag),
                            ("expected", &max.to_string()),
                            ("child_tag", &count.tag),
                            ("found", &found.to_string()),
                        ],
                        &path,
                    ));
                    fatal = true;
                }
            }
            if fatal {
                doc.detach(*id);
            }
        }
    }
}

/// Register a kept runtime or extension script element into the collector so
/// the assembler re-emits it in the contracted order.
fn register_script(ctx: &mut PipelineContext, element: &ElementData, spec: &TagSpec) {
    let Some(src) = element.attr("src") else {
        return;
    };
    let asset = if let Some(handle) = element.attr("custom-element") {
        ScriptAsset::with_src(handle, src, ScriptKind::CustomElement)
    } else if let Some(handle) = element.attr("custom-template") {
        ScriptAsset::with_src(handle, src, ScriptKind::CustomTemplate)
    } else if spec.spec_name_or("script").contains("engine") {
        ScriptAsset::with_src(RUNTIME_HANDLE, src, ScriptKind::Runtime)
    } else {
        return;
    };
    ctx.collector_mut().merge_script(asset);
}

/// URL attribute checks: emptiness, well-formedness, protocol allow-list.
fn check_url(
    attr: &str,
    value: &str,
    mandatory: bool,
    allowed_protocols: &[String],
) -> Option<Violation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(Violation::MissingUrl {
            attr: attr.to_string(),
            mandatory,
        });
    }
    if trimmed.chars().any(char::is_whitespace) || trimmed.contains('<') || trimmed.contains('>') {
        return Some(Violation::InvalidUrl {
            attr: attr.to_string(),
            value: value.to_string(),
            mandatory,
        });
    }
    let default_protocols: Vec<String>;
    let allowed = if allowed_protocols.is_empty() {
        default_protocols = DEFAULT_PROTOCOLS.iter().map(|&s| s.to_string()).collect();
        &default_protocols
    } else {
        allowed_protocols
    };
    if !is_protocol_allowed(trimmed, allowed, true) {
        return Some(Violation::InvalidUrlProtocol {
            attr: attr.to_string(),
            scheme: scheme_of(trimmed).unwrap_or_default(),
            mandatory,
        });
    }
    None
}
