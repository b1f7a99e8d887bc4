//! Required-markup repair.
//!
//! Rebuilds the document head into the runtime's mandated shape: charset and
//! viewport metas first, resource hints and the script block next, then
//! title, canonical link, any remaining author head content, the aggregated
//! custom stylesheet, and finally the boilerplate pair. The runtime resolves
//! scripts relative to this order, so it is a hard external contract.
//!
//! Repair is idempotent: everything it emits is recognized and reclaimed on
//! the next run, so repairing an already-repaired document reproduces it
//! byte for byte.

use amphora_dom::{Document, NodeId};
use amphora_sanitize::{
    AssetCollector, CDN_BASE, RENDER_DELAYING_EXTENSIONS, RUNTIME_HANDLE, ScriptAsset, ScriptKind,
    StyleRule,
};

use crate::rtv;

/// The required boilerplate stylesheet, byte for byte. The runtime removes
/// the animation when it boots; altering this text breaks the hide-until-
/// ready behavior.
pub const BOILERPLATE_CSS: &str = "body{-webkit-animation:-amp-start 8s steps(1,end) 0s 1 \
     normal both;-moz-animation:-amp-start 8s steps(1,end) 0s 1 normal both;-ms-animation:\
     -amp-start 8s steps(1,end) 0s 1 normal both;animation:-amp-start 8s steps(1,end) 0s 1 \
     normal both}@-webkit-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}\
     @-moz-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}@-ms-keyframes \
     -amp-start{from{visibility:hidden}to{visibility:visible}}@-o-keyframes -amp-start{from\
     {visibility:hidden}to{visibility:visible}}@keyframes -amp-start{from{visibility:hidden}\
     to{visibility:visible}}";

/// The no-JS counterpart of [`BOILERPLATE_CSS`], emitted inside `<noscript>`.
pub const BOILERPLATE_NOSCRIPT_CSS: &str =
    "body{-webkit-animation:none;-moz-animation:none;-ms-animation:none;animation:none}";

/// Configuration for [`repair_markup`].
#[derive(Debug, Clone, Default)]
pub struct RepairOptions {
    /// Href for the canonical link. Falls back to an existing canonical link
    /// in the document, then to `./` (self-canonical).
    pub canonical_url: Option<String>,
    /// Pin runtime and extension URLs to the fetched runtime version.
    pub pin_runtime: bool,
}

/// Head nodes repair keeps rather than re-creates.
#[derive(Default)]
struct Salvage {
    charset: Option<NodeId>,
    viewport: Option<NodeId>,
    title: Option<NodeId>,
    canonical_href: Option<String>,
    rest: Vec<NodeId>,
}

/// Rebuild the required markup in place.
///
/// Scripts, hints, and styles repair manages are first reclaimed from the
/// head into the collector, then everything is re-emitted in the contracted
/// order. The runtime script is synthesized when the document carried none.
pub fn repair_markup(doc: &mut Document, collector: &mut AssetCollector, options: &RepairOptions) {
    let Some(html) = doc.document_element() else {
        return;
    };
    let Some(head) = doc.head() else {
        return;
    };

    if let Some(element) = doc.as_element_mut(html)
        && !element.has_attr("amp")
        && !element.has_attr("\u{26a1}")
    {
        element.set_attr("amp", "");
    }

    let salvage = reclaim_head(doc, head, collector);
    if collector.script(RUNTIME_HANDLE).is_none() {
        collector.merge_script(ScriptAsset::runtime());
    }
    rebuild_head(doc, head, collector, options, salvage);
}

/// Empty the head, sorting its children into salvage and the collector.
/// Managed nodes (hints, scripts, boilerplate, custom style) are dropped
/// after their information is merged; rebuild re-emits them canonically.
fn reclaim_head(doc: &mut Document, head: NodeId, collector: &mut AssetCollector) -> Salvage {
    let mut salvage = Salvage::default();
    let children: Vec<NodeId> = doc.children(head).to_vec();
    for id in children {
        doc.remove_child(head, id);
        let Some(element) = doc.as_element(id) else {
            // Stray text or comments between head elements: keep, stable
            // position after the managed block.
            salvage.rest.push(id);
            continue;
        };
        match element.tag_name.as_str() {
            "meta" if element.has_attr("charset") => {
                if salvage.charset.is_none() {
                    salvage.charset = Some(id);
                }
            }
            "meta"
                if element
                    .attr("name")
                    .is_some_and(|v| v.eq_ignore_ascii_case("viewport")) =>
            {
                if salvage.viewport.is_none() {
                    salvage.viewport = Some(id);
                }
            }
            "title" => {
                if salvage.title.is_none() {
                    salvage.title = Some(id);
                }
            }
            "link" => match element.attr("rel").map(str::to_ascii_lowercase).as_deref() {
                Some("canonical") => {
                    if salvage.canonical_href.is_none() {
                        salvage.canonical_href = element.attr("href").map(str::to_string);
                    }
                }
                Some("preconnect" | "dns-prefetch" | "preload")
                    if element.attr("href").is_some_and(|h| h.starts_with(CDN_BASE)) => {}
                _ => salvage.rest.push(id),
            },
            "script" => {
                if let Some(asset) = script_asset_of(element) {
                    collector.merge_script(asset);
                } else if !element
                    .attr("src")
                    .is_some_and(|src| src.starts_with(CDN_BASE))
                {
                    // Non-CDN scripts that survived sanitization (JSON data
                    // blocks) keep their place.
                    salvage.rest.push(id);
                }
            }
            "style" if element.has_attr("amp-boilerplate") => {}
            "style" if element.has_attr("amp-custom") => {
                collector.merge_style(StyleRule::new(doc.text_content(id)));
            }
            "noscript" if contains_boilerplate(doc, id) => {}
            _ => salvage.rest.push(id),
        }
    }
    salvage
}

/// Identify a head script element as a collectable runtime or extension
/// script.
fn script_asset_of(element: &amphora_dom::ElementData) -> Option<ScriptAsset> {
    let src = element.attr("src")?;
    if let Some(handle) = element.attr("custom-element") {
        Some(ScriptAsset::with_src(handle, src, ScriptKind::CustomElement))
    } else if let Some(handle) = element.attr("custom-template") {
        Some(ScriptAsset::with_src(handle, src, ScriptKind::CustomTemplate))
    } else if src.starts_with(CDN_BASE) && src.ends_with("/v0.js") {
        Some(ScriptAsset::with_src(RUNTIME_HANDLE, src, ScriptKind::Runtime))
    } else {
        None
    }
}

fn contains_boilerplate(doc: &Document, id: NodeId) -> bool {
    doc.descendants(id).any(|child| {
        doc.as_element(child)
            .is_some_and(|e| e.is("style") && e.has_attr("amp-boilerplate"))
    })
}

/// Re-emit the head in contract order.
fn rebuild_head(
    doc: &mut Document,
    head: NodeId,
    collector: &AssetCollector,
    options: &RepairOptions,
    salvage: Salvage,
) {
    let charset = salvage
        .charset
        .unwrap_or_else(|| make_element(doc, "meta", &[("charset", "utf-8")]));
    doc.append_child(head, charset);

    let viewport = salvage.viewport.unwrap_or_else(|| {
        make_element(
            doc,
            "meta",
            &[("name", "viewport"), ("content", "width=device-width")],
        )
    });
    doc.append_child(head, viewport);

    let preconnect = make_element(
        doc,
        "link",
        &[("rel", "preconnect"), ("href", CDN_BASE), ("crossorigin", "")],
    );
    doc.append_child(head, preconnect);
    let dns_prefetch = make_element(doc, "link", &[("rel", "dns-prefetch"), ("href", CDN_BASE)]);
    doc.append_child(head, dns_prefetch);

    for asset in preload_order(collector) {
        let href = script_src(&asset, options);
        let preload = make_element(
            doc,
            "link",
            &[("rel", "preload"), ("as", "script"), ("href", &href)],
        );
        doc.append_child(head, preload);
    }

    for asset in script_order(collector) {
        let src = script_src(asset, options);
        let script = match asset.kind {
            ScriptKind::Runtime => make_element(doc, "script", &[("async", ""), ("src", &src)]),
            ScriptKind::CustomElement => make_element(
                doc,
                "script",
                &[("async", ""), ("custom-element", &asset.handle), ("src", &src)],
            ),
            ScriptKind::CustomTemplate => make_element(
                doc,
                "script",
                &[("async", ""), ("custom-template", &asset.handle), ("src", &src)],
            ),
        };
        doc.append_child(head, script);
    }

    let title = salvage
        .title
        .unwrap_or_else(|| doc.create_element("title"));
    doc.append_child(head, title);

    let canonical_href = options
        .canonical_url
        .clone()
        .or(salvage.canonical_href)
        .unwrap_or_else(|| "./".to_string());
    let canonical = make_element(
        doc,
        "link",
        &[("rel", "canonical"), ("href", &canonical_href)],
    );
    doc.append_child(head, canonical);

    for id in salvage.rest {
        doc.append_child(head, id);
    }

    if !collector.styles().is_empty() {
        let css: String = collector
            .styles()
            .iter()
            .map(|rule| rule.css.as_str())
            .collect();
        let style = make_element(doc, "style", &[("amp-custom", "")]);
        let text = doc.create_text(&css);
        doc.append_child(style, text);
        doc.append_child(head, style);
    }

    let boilerplate = make_element(doc, "style", &[("amp-boilerplate", "")]);
    let text = doc.create_text(BOILERPLATE_CSS);
    doc.append_child(boilerplate, text);
    doc.append_child(head, boilerplate);

    let noscript = doc.create_element("noscript");
    let inner = make_element(doc, "style", &[("amp-boilerplate", "")]);
    let text = doc.create_text(BOILERPLATE_NOSCRIPT_CSS);
    doc.append_child(inner, text);
    doc.append_child(noscript, inner);
    doc.append_child(head, noscript);
}

/// Preload hints: the runtime first, then render-delaying extensions in the
/// fixed priority order.
fn preload_order(collector: &AssetCollector) -> Vec<ScriptAsset> {
    let mut order = Vec::new();
    if let Some(runtime) = collector.script(RUNTIME_HANDLE) {
        order.push(runtime.clone());
    }
    for handle in RENDER_DELAYING_EXTENSIONS {
        if let Some(asset) = collector.script(handle) {
            order.push(asset.clone());
        }
    }
    order
}

/// Script emission order: runtime, render-delaying extensions in the fixed
/// priority order, then the remaining extensions sorted by handle.
fn script_order(collector: &AssetCollector) -> Vec<&ScriptAsset> {
    let mut order = Vec::new();
    if let Some(runtime) = collector.script(RUNTIME_HANDLE) {
        order.push(runtime);
    }
    for handle in RENDER_DELAYING_EXTENSIONS {
        if let Some(asset) = collector.script(handle) {
            order.push(asset);
        }
    }
    for asset in collector.scripts() {
        if asset.handle != RUNTIME_HANDLE && !asset.render_delaying {
            order.push(asset);
        }
    }
    order
}

fn script_src(asset: &ScriptAsset, options: &RepairOptions) -> String {
    if options.pin_runtime {
        rtv::pinned_src(&asset.src)
    } else {
        asset.src.clone()
    }
}

fn make_element(doc: &mut Document, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let id = doc.create_element(tag);
    if let Some(element) = doc.as_element_mut(id) {
        for &(name, value) in attrs {
            element.set_attr(name, value);
        }
    }
    id
}
