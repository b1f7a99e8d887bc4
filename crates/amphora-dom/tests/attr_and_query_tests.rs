//! Tests for the ordered attribute list and document query helpers.

use amphora_dom::{AttrList, Document, ElementData, NodeId, NodeType};

fn alloc_element(tree: &mut Document, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData::new(tag)))
}

// ========== AttrList ==========

#[test]
fn test_attr_list_preserves_insertion_order() {
    let mut attrs = AttrList::new();
    attrs.set("src", "a.jpg");
    attrs.set("width", "100");
    attrs.set("alt", "photo");

    let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["src", "width", "alt"]);
}

#[test]
fn test_attr_list_set_replaces_in_place() {
    let mut attrs = AttrList::new();
    attrs.set("src", "a.jpg");
    attrs.set("width", "100");
    attrs.set("src", "b.jpg");

    assert_eq!(attrs.get("src"), Some("b.jpg"));
    // Replacing a value must not move the attribute to the end.
    let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["src", "width"]);
}

#[test]
fn test_attr_list_add_keeps_first_duplicate() {
    let mut attrs = AttrList::new();
    assert!(attrs.add("class", "a"));
    assert!(!attrs.add("class", "b"));
    assert_eq!(attrs.get("class"), Some("a"));
    assert_eq!(attrs.len(), 1);
}

#[test]
fn test_attr_list_case_insensitive_lookup() {
    let mut attrs = AttrList::new();
    attrs.set("data-videoid", "xyz");
    assert_eq!(attrs.get("DATA-VIDEOID"), Some("xyz"));
    assert!(attrs.has("Data-VideoId"));
    assert_eq!(attrs.remove("DATA-videoid"), Some("xyz".to_string()));
    assert!(attrs.is_empty());
}

// ========== element helpers ==========

#[test]
fn test_element_classes_split_on_whitespace() {
    let mut data = ElementData::new("div");
    data.set_attr("class", "  hero   wide\tdark ");
    let classes = data.classes();
    assert!(classes.contains("hero"));
    assert!(classes.contains("wide"));
    assert!(classes.contains("dark"));
    assert_eq!(classes.len(), 3);
    assert!(data.has_class("wide"));
    assert!(!data.has_class("narrow"));
}

// ========== document queries ==========

/// Builds `<html><head></head><body>...</body></html>` and returns
/// (tree, html, head, body).
fn skeleton() -> (Document, NodeId, NodeId, NodeId) {
    let mut tree = Document::new();
    let html = alloc_element(&mut tree, "html");
    tree.append_child(NodeId::ROOT, html);
    let head = alloc_element(&mut tree, "head");
    tree.append_child(html, head);
    let body = alloc_element(&mut tree, "body");
    tree.append_child(html, body);
    (tree, html, head, body)
}

#[test]
fn test_document_element_head_body() {
    let (tree, html, head, body) = skeleton();
    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.head(), Some(head));
    assert_eq!(tree.body(), Some(body));
}

#[test]
fn test_elements_by_tag_in_tree_order() {
    let (mut tree, _html, head, body) = skeleton();
    let style = alloc_element(&mut tree, "style");
    tree.append_child(head, style);
    let div = alloc_element(&mut tree, "div");
    tree.append_child(body, div);
    let img_a = alloc_element(&mut tree, "img");
    tree.append_child(div, img_a);
    let img_b = alloc_element(&mut tree, "IMG");
    tree.append_child(body, img_b);

    assert_eq!(tree.elements_by_tag("img"), vec![img_a, img_b]);
    assert_eq!(tree.elements_by_tag("style"), vec![style]);
    assert!(tree.elements_by_tag("video").is_empty());
}

#[test]
fn test_text_content_concatenates_descendants() {
    let (mut tree, _html, _head, body) = skeleton();
    let p = alloc_element(&mut tree, "p");
    tree.append_child(body, p);
    let hello = tree.create_text("Hello ");
    tree.append_child(p, hello);
    let em = alloc_element(&mut tree, "em");
    tree.append_child(p, em);
    let world = tree.create_text("world");
    tree.append_child(em, world);

    assert_eq!(tree.text_content(p), "Hello world");
    assert_eq!(tree.text_content(world), "world");
}

#[test]
fn test_node_path_with_sibling_index() {
    let (mut tree, _html, _head, body) = skeleton();
    let first = alloc_element(&mut tree, "div");
    let second = alloc_element(&mut tree, "div");
    tree.append_child(body, first);
    tree.append_child(body, second);
    let img = alloc_element(&mut tree, "img");
    tree.append_child(second, img);

    assert_eq!(tree.node_path(first), "/html/body/div");
    assert_eq!(tree.node_path(second), "/html/body/div[2]");
    assert_eq!(tree.node_path(img), "/html/body/div[2]/img");
}

#[test]
fn test_descendants_preorder() {
    let (mut tree, html, head, body) = skeleton();
    let div = alloc_element(&mut tree, "div");
    tree.append_child(body, div);
    let span = alloc_element(&mut tree, "span");
    tree.append_child(div, span);

    let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
    assert_eq!(order, vec![html, head, body, div, span]);
}
