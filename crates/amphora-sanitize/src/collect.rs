//! Script and style asset collection.
//!
//! Sanitizers register the companion scripts and stylesheet rules the
//! repaired document will need; the response assembler drains the collector
//! when it rebuilds the head. Scripts are keyed by handle in a `BTreeMap` so
//! emission order is deterministic; style rules are deduplicated by content
//! hash so the same rule registered twice costs its bytes once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};

use amphora_spec::ErrorCode;

/// Origin every runtime and extension script must be served from.
pub const CDN_BASE: &str = "https://cdn.ampproject.org";

/// Handle the runtime script is registered under.
pub const RUNTIME_HANDLE: &str = "v0";

/// Extensions whose presence postpones first render. These are preloaded and
/// emitted ahead of all other extension scripts, in exactly this order.
pub const RENDER_DELAYING_EXTENSIONS: &[&str] =
    &["amp-experiment", "amp-dynamic-css-classes", "amp-story"];

/// How a collected script participates in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// The runtime engine script (`v0.js`).
    Runtime,
    /// An extension declared with `custom-element`.
    CustomElement,
    /// An extension declared with `custom-template`.
    CustomTemplate,
}

/// A script the repaired document must carry, unique by handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAsset {
    /// Registration key: the extension name, or [`RUNTIME_HANDLE`].
    pub handle: String,
    /// Absolute CDN URL of the script.
    pub src: String,
    /// Runtime or extension kind; immutable once registered.
    pub kind: ScriptKind,
    /// Whether this script delays first render; immutable once registered.
    pub render_delaying: bool,
}

impl ScriptAsset {
    /// The runtime engine script at its unversioned CDN path.
    #[must_use]
    pub fn runtime() -> Self {
        ScriptAsset {
            handle: RUNTIME_HANDLE.to_string(),
            src: format!("{CDN_BASE}/v0.js"),
            kind: ScriptKind::Runtime,
            render_delaying: false,
        }
    }

    /// A `custom-element` extension at its default unversioned CDN path.
    #[must_use]
    pub fn extension(handle: &str) -> Self {
        ScriptAsset {
            handle: handle.to_string(),
            src: format!("{CDN_BASE}/v0/{handle}-0.1.js"),
            kind: ScriptKind::CustomElement,
            render_delaying: RENDER_DELAYING_EXTENSIONS.contains(&handle),
        }
    }

    /// An extension with an explicit source URL and kind, as found in an
    /// already-present `<script>` element.
    #[must_use]
    pub fn with_src(handle: &str, src: &str, kind: ScriptKind) -> Self {
        ScriptAsset {
            handle: handle.to_string(),
            src: src.to_string(),
            kind,
            render_delaying: RENDER_DELAYING_EXTENSIONS.contains(&handle),
        }
    }
}

/// A collected stylesheet rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Serialized CSS text of the rule.
    pub css: String,
    /// Content hash; the dedup and cache key.
    pub hash: u64,
    /// How many selectors survived tree-shaking into this rule. Zero for
    /// rules collected without shaking (at-rules).
    pub uses: usize,
}

impl StyleRule {
    /// Wrap serialized rule text, computing its content hash.
    #[must_use]
    pub fn new(css: String) -> Self {
        let hash = content_hash(&css);
        StyleRule { css, hash, uses: 0 }
    }
}

/// Hash arbitrary text for dedup keys.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Cache key over CSS text plus a fingerprint of the processing options, so
/// a rule-set change never serves stale transforms.
#[must_use]
pub fn cache_key(css: &str, options_fingerprint: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    css.hash(&mut hasher);
    options_fingerprint.hash(&mut hasher);
    hasher.finish()
}

/// Per-response asset accumulator.
///
/// Writes are idempotent and content-addressed: registering the same script
/// handle or the same rule text again changes nothing observable, which is
/// what makes the advisory cache and repeated pipeline runs safe.
#[derive(Debug, Default)]
pub struct AssetCollector {
    scripts: BTreeMap<String, ScriptAsset>,
    styles: Vec<StyleRule>,
    style_hashes: HashSet<u64>,
}

impl AssetCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        AssetCollector::default()
    }

    /// Register a script by handle. A later registration for an existing
    /// handle replaces only `src`; `kind` and `render_delaying` are fixed by
    /// the first registration.
    pub fn merge_script(&mut self, asset: ScriptAsset) {
        match self.scripts.get_mut(&asset.handle) {
            Some(existing) => existing.src = asset.src,
            None => {
                let _ = self.scripts.insert(asset.handle.clone(), asset);
            }
        }
    }

    /// Registered scripts in handle order.
    pub fn scripts(&self) -> impl Iterator<Item = &ScriptAsset> {
        self.scripts.values()
    }

    /// Look up a registered script.
    #[must_use]
    pub fn script(&self, handle: &str) -> Option<&ScriptAsset> {
        self.scripts.get(handle)
    }

    /// Drop a registered script, returning it. Used when an extension turns
    /// out to be unused by the final document.
    pub fn remove_script(&mut self, handle: &str) -> Option<ScriptAsset> {
        self.scripts.remove(handle)
    }

    /// Register a style rule, deduplicated by content hash.
    pub fn merge_style(&mut self, rule: StyleRule) {
        if self.style_hashes.insert(rule.hash) {
            self.styles.push(rule);
        }
    }

    /// Collected style rules in registration order.
    #[must_use]
    pub fn styles(&self) -> &[StyleRule] {
        &self.styles
    }

    /// Total bytes of collected rule text.
    #[must_use]
    pub fn style_bytes(&self) -> usize {
        self.styles.iter().map(|rule| rule.css.len()).sum()
    }
}

/// A processed stylesheet: filtered CSS plus the violations found while
/// filtering, without node paths so one cache entry serves any document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedCss {
    /// The filtered, serialized CSS.
    pub css: String,
    /// Violations to replay against the consuming node's path.
    pub errors: Vec<(ErrorCode, Vec<(String, String)>)>,
}

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Advisory TTL cache for processed stylesheets, keyed by
/// [`cache_key`]`(css, options)`.
///
/// The cache is the only state shared across responses. A miss or an expired
/// entry costs redundant parsing, never incorrect output, because entries are
/// content-addressed and processing is deterministic.
#[derive(Debug)]
pub struct StylesheetCache {
    ttl: Duration,
    entries: Mutex<HashMap<u64, (Instant, ProcessedCss)>>,
}

impl StylesheetCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        StylesheetCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it if expired.
    ///
    /// # Panics
    /// Panics if the cache mutex is poisoned.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<ProcessedCss> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some((stored_at, value)) if stored_at.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                let _ = entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store an entry. Last writer wins; identical keys hold identical
    /// values by construction.
    ///
    /// # Panics
    /// Panics if the cache mutex is poisoned.
    pub fn put(&self, key: u64, value: ProcessedCss) {
        let _ = self
            .entries
            .lock()
            .unwrap()
            .insert(key, (Instant::now(), value));
    }
}

static SHARED_CACHE: LazyLock<StylesheetCache> =
    LazyLock::new(|| StylesheetCache::new(DEFAULT_CACHE_TTL));

/// The process-wide stylesheet cache.
#[must_use]
pub fn shared_cache() -> &'static StylesheetCache {
    &SHARED_CACHE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_script_is_keyed_by_handle() {
        let mut collector = AssetCollector::new();
        collector.merge_script(ScriptAsset::extension("amp-video"));
        collector.merge_script(ScriptAsset::extension("amp-form"));
        collector.merge_script(ScriptAsset::extension("amp-video"));
        assert_eq!(collector.scripts().count(), 2);
    }

    #[test]
    fn test_later_registration_overrides_src_only() {
        let mut collector = AssetCollector::new();
        collector.merge_script(ScriptAsset::extension("amp-video"));
        collector.merge_script(ScriptAsset {
            handle: "amp-video".to_string(),
            src: format!("{CDN_BASE}/v0/amp-video-0.2.js"),
            kind: ScriptKind::CustomTemplate,
            render_delaying: true,
        });
        let script = collector.script("amp-video").unwrap();
        assert_eq!(script.src, format!("{CDN_BASE}/v0/amp-video-0.2.js"));
        assert_eq!(script.kind, ScriptKind::CustomElement);
        assert!(!script.render_delaying);
    }

    #[test]
    fn test_scripts_iterate_in_handle_order() {
        let mut collector = AssetCollector::new();
        collector.merge_script(ScriptAsset::extension("amp-youtube"));
        collector.merge_script(ScriptAsset::extension("amp-form"));
        collector.merge_script(ScriptAsset::runtime());
        let handles: Vec<&str> = collector.scripts().map(|s| s.handle.as_str()).collect();
        assert_eq!(handles, vec!["amp-form", "amp-youtube", "v0"]);
    }

    #[test]
    fn test_render_delaying_flag() {
        assert!(ScriptAsset::extension("amp-story").render_delaying);
        assert!(!ScriptAsset::extension("amp-video").render_delaying);
    }

    #[test]
    fn test_merge_style_dedups_by_content() {
        let mut collector = AssetCollector::new();
        collector.merge_style(StyleRule::new("p{color:red}".to_string()));
        collector.merge_style(StyleRule::new("p{color:red}".to_string()));
        collector.merge_style(StyleRule::new("p{color:blue}".to_string()));
        assert_eq!(collector.styles().len(), 2);
        assert_eq!(
            collector.style_bytes(),
            "p{color:red}".len() + "p{color:blue}".len()
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = StylesheetCache::new(Duration::from_secs(60));
        let key = cache_key("p{color:red}", "sheet-v1");
        assert!(cache.get(key).is_none());
        cache.put(
            key,
            ProcessedCss {
                css: "p{color:red}".to_string(),
                errors: Vec::new(),
            },
        );
        let hit = cache.get(key).unwrap();
        assert_eq!(hit.css, "p{color:red}");
    }

    #[test]
    fn test_cache_expiry() {
        let cache = StylesheetCache::new(Duration::ZERO);
        let key = cache_key("p{}", "sheet-v1");
        cache.put(
            key,
            ProcessedCss {
                css: String::new(),
                errors: Vec::new(),
            },
        );
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(key).is_none());
    }

    #[test]
    fn test_cache_key_varies_with_options() {
        assert_ne!(
            cache_key("p{color:red}", "sheet-v1"),
            cache_key("p{color:red}", "inline-v1")
        );
    }
}
