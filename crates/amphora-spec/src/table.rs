//! The tag-spec table: which tags are admissible, in which shape.
//!
//! [AMP HTML specification](https://amp.dev/documentation/guides-and-tutorials/learn/spec/amphtml)
//!
//! "AMP HTML is a subset of HTML for authoring content pages... The rules are
//! defined per tag: which attributes a tag may carry, where it may appear,
//! and which layouts it supports." The table is embedded as JSON, loaded once
//! per process, and immutable afterwards; concurrent reads need no locking.
//!
//! A tag name can map to several specs (a disjunction): `<script>` has one
//! spec for the runtime, one for extensions, and one for JSON data blocks.
//! The validator matches a node against all candidates and keeps the one with
//! the fewest violations.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::error::{ErrorCode, ErrorTemplate};
use crate::layout::Layout;

/// The embedded table data. Shipping the table inside the binary keeps
/// validation deterministic across deployments.
const EMBEDDED_TABLE: &str = include_str!("../data/amp-tags.json");

static SHARED: LazyLock<SpecTable> = LazyLock::new(|| {
    SpecTable::load().unwrap_or_else(|error| panic!("embedded spec table is invalid: {error}"))
});

/// Attributes valid on every tag without being listed in any spec.
const GLOBAL_ATTRS: &[&str] = &[
    "accesskey",
    "class",
    "dir",
    "draggable",
    "fallback",
    "height",
    "heights",
    "hidden",
    "id",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "layout",
    "media",
    "noloading",
    "on",
    "placeholder",
    "role",
    "sizes",
    "slot",
    "tabindex",
    "title",
    "translate",
    "width",
];

/// Why loading the spec table failed. These are build-data defects, not
/// runtime conditions; content validation never produces them.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    /// The table JSON (including any embedded regex pattern) is malformed.
    #[error("spec table JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// Two catalog entries share one error code.
    #[error("duplicate error template for {0}")]
    DuplicateTemplate(ErrorCode),
}

/// Constraints on a single attribute within a [`TagSpec`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttrSpec {
    /// The attribute must be present for the spec to match cleanly.
    #[serde(default)]
    pub mandatory: bool,
    /// Anchored pattern the value must match in full.
    #[serde(default, deserialize_with = "anchored_regex")]
    pub value_regex: Option<Regex>,
    /// Exact value, compared ASCII-case-insensitively.
    #[serde(default)]
    pub value_casei: Option<String>,
    /// The value is a URL: protocol and well-formedness rules apply.
    #[serde(default)]
    pub is_url: bool,
    /// Protocols allowed when `is_url`; empty means the default set (https).
    #[serde(default)]
    pub allowed_protocols: Vec<String>,
}

/// Per-tag limits on element children.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildConstraints {
    /// When set, every element child must be one of these tags.
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    /// Cardinality bounds for specific child tags.
    #[serde(default)]
    pub counts: Vec<ChildCount>,
}

/// Cardinality bounds for one child tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildCount {
    /// The child tag name.
    pub tag: String,
    /// Minimum number required.
    #[serde(default)]
    pub min: usize,
    /// Maximum number allowed; `None` means unbounded.
    #[serde(default)]
    pub max: Option<usize>,
}

/// One admissible shape for a tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagSpec {
    /// Name distinguishing this spec in diagnostics when a tag has several.
    #[serde(default)]
    pub spec_name: Option<String>,
    /// Attribute constraints; attributes not listed here and not global are
    /// disallowed.
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrSpec>,
    /// Required immediate parent tag.
    #[serde(default)]
    pub mandatory_parent: Option<String>,
    /// Required ancestor tag.
    #[serde(default)]
    pub mandatory_ancestor: Option<String>,
    /// When the mandatory ancestor is missing, the AMP tag to suggest instead.
    #[serde(default)]
    pub mandatory_ancestor_alternative: Option<String>,
    /// Ancestor tags under which this tag may not appear.
    #[serde(default)]
    pub disallowed_ancestors: Vec<String>,
    /// Limits on element children.
    #[serde(default)]
    pub child_constraints: Option<ChildConstraints>,
    /// Layouts this tag supports; empty means the tag takes no layout.
    #[serde(default)]
    pub layout_support: Vec<Layout>,
    /// The tag must resolve to a supported layout to be kept.
    #[serde(default)]
    pub requires_layout: bool,
    /// Companion extension script handle this tag needs.
    #[serde(default)]
    pub requires_extension: Option<String>,
    /// Tie-break weight between candidate specs; lower is more specific.
    #[serde(default)]
    pub specificity: u32,
    /// At most one element may match this spec per document.
    #[serde(default)]
    pub unique: bool,
}

impl TagSpec {
    /// The diagnostic name: `spec_name` when set, else the tag name.
    #[must_use]
    pub fn spec_name_or<'a>(&'a self, tag: &'a str) -> &'a str {
        self.spec_name.as_deref().unwrap_or(tag)
    }

    /// Look up the spec for one attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.get(name)
    }

    /// Attributes that must be present, in name order.
    pub fn mandatory_attrs(&self) -> impl Iterator<Item = (&str, &AttrSpec)> {
        self.attrs
            .iter()
            .filter(|(_, spec)| spec.mandatory)
            .map(|(name, spec)| (name.as_str(), spec))
    }

    /// Whether `layout` is acceptable for this tag. Tags with an empty
    /// support list take no layout at all and accept only the implied one.
    #[must_use]
    pub fn supports_layout(&self, layout: Layout) -> bool {
        self.layout_support.contains(&layout)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    tags: HashMap<String, Vec<TagSpec>>,
    errors: Vec<ErrorTemplate>,
}

/// The loaded, indexed table.
#[derive(Debug)]
pub struct SpecTable {
    tags: HashMap<String, Vec<TagSpec>>,
    templates: HashMap<ErrorCode, ErrorTemplate>,
}

impl SpecTable {
    /// Load the embedded table.
    ///
    /// # Errors
    ///
    /// Returns [`SpecLoadError`] if the embedded JSON does not deserialize or
    /// the error catalog has a duplicate code.
    pub fn load() -> Result<Self, SpecLoadError> {
        Self::from_json(EMBEDDED_TABLE)
    }

    /// Build a table from JSON, for tests and alternative tables.
    ///
    /// # Errors
    ///
    /// Returns [`SpecLoadError`] if the JSON does not deserialize or the
    /// error catalog has a duplicate code.
    pub fn from_json(json: &str) -> Result<Self, SpecLoadError> {
        let raw: RawTable = serde_json::from_str(json)?;
        let mut templates = HashMap::with_capacity(raw.errors.len());
        for template in raw.errors {
            let code = template.code;
            if templates.insert(code, template).is_some() {
                return Err(SpecLoadError::DuplicateTemplate(code));
            }
        }
        Ok(Self {
            tags: raw.tags,
            templates,
        })
    }

    /// The process-wide shared table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded table fails to load. That is a defect in the
    /// shipped data, surfaced at first access; it cannot be triggered by
    /// content.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// All candidate specs for a tag name; empty when the tag is disallowed.
    #[must_use]
    pub fn specs_for(&self, tag: &str) -> &[TagSpec] {
        self.tags.get(tag).map_or(&[], Vec::as_slice)
    }

    /// The catalog entry for an error code.
    #[must_use]
    pub fn error_template(&self, code: ErrorCode) -> Option<&ErrorTemplate> {
        self.templates.get(&code)
    }

    /// Whether `tag` is a known AMP custom element.
    #[must_use]
    pub fn is_amp_tag(&self, tag: &str) -> bool {
        tag.starts_with("amp-") && self.tags.contains_key(tag)
    }

    /// Whether an attribute is valid on every tag without being listed in a
    /// spec (`class`, `id`, the layout attributes, `data-*`, `aria-*`).
    #[must_use]
    pub fn is_global_attr(name: &str) -> bool {
        GLOBAL_ATTRS.contains(&name) || name.starts_with("data-") || name.starts_with("aria-")
    }
}

/// Compile a spec pattern anchored on both ends, so `\d+` means the whole
/// value, not a substring.
fn anchored_regex<'de, D>(deserializer: D) -> Result<Option<Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern: Option<String> = Option::deserialize(deserializer)?;
    pattern
        .map(|p| Regex::new(&format!("^(?:{p})$")).map_err(serde::de::Error::custom))
        .transpose()
}
