//! Arena document tree for the Amphora pipeline.
//!
//! This crate provides an arena-based document tree following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), shaped for
//! tree-mutating sanitization passes: ordered attributes, cheap node
//! removal/insertion, and stable paths for error reporting.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow checker
//! issues. Removing a node splices it out of the tree but leaves its slot
//! allocated until the whole tree is dropped; trees are request-scoped, so
//! the garbage never accumulates across documents.

use std::collections::HashSet;

/// A single element attribute.
///
/// [§ 4.9.1 Interface Attr](https://dom.spec.whatwg.org/#interface-attr)
/// "Attr nodes are simply known as attributes."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The attribute's name, lowercased by the parser.
    pub name: String,
    /// The attribute's value, verbatim from the source.
    pub value: String,
}

/// An insertion-ordered, unique-by-name attribute list.
///
/// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#concept-element-attribute)
/// "An element has an associated attribute list, which is a list of
/// attributes, initially empty."
///
/// Attribute order is preserved through serialization so that a conformant
/// document round-trips without spurious diffs. Name comparison is ASCII
/// case-insensitive everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrList {
    attrs: Vec<Attr>,
}

impl AttrList {
    /// Create an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        AttrList { attrs: Vec::new() }
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the list has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Get an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Whether an attribute with this name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set an attribute, replacing the value in place if the name exists.
    ///
    /// [§ 4.9 set an attribute value](https://dom.spec.whatwg.org/#concept-element-attributes-set-value)
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(attr) = self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            attr.value = value.to_string();
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Add an attribute only if the name is not already present.
    ///
    /// [§ 13.2.5.33](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    /// "If there is already an attribute on the token with the exact same
    /// name, then this is a duplicate-attribute parse error and the new
    /// attribute must be removed from the token."
    ///
    /// Returns `true` if the attribute was added.
    pub fn add(&mut self, name: &str, value: &str) -> bool {
        if self.has(name) {
            return false;
        }
        self.attrs.push(Attr {
            name: name.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Remove an attribute by name, returning its old value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// Iterate over the attributes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.attrs.iter()
    }
}

impl<'a> IntoIterator for &'a AttrList {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

/// A type-safe index into the document tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// NodeId provides O(1) access to any node in the tree without borrowing
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// This node stores indices for parent/child/sibling relationships, enabling
/// O(1) traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    /// "An object A's next sibling is the object immediately following A
    /// in the children of A's parent."
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    /// "An object A's previous sibling is the object immediately preceding A
    /// in the children of A's parent."
    pub prev_sibling: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
///
/// Doctype is not represented: the serializer always emits the HTML doctype
/// in full-document mode, which is the only doctype the target format allows.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    /// "A document whose type is "html" is known as an HTML document."
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    /// "Element nodes are simply known as elements."
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    /// "Text nodes are known as text."
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    /// "Comment nodes are known as comments."
    Comment(String),
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "When an element is created, its local name is always given."
///
/// NOTE: Only the local name and attribute list are stored; namespaces and
/// custom-element state are out of scope for a sanitization tree.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name", lowercased by the parser.
    pub tag_name: String,
    /// "An element has an associated attribute list"
    pub attrs: AttrList,
}

impl ElementData {
    /// Create element data with an empty attribute list.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        ElementData {
            tag_name: tag_name.to_string(),
            attrs: AttrList::new(),
        }
    }

    /// Whether this element's tag name matches, ASCII case-insensitively.
    #[must_use]
    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    /// Returns the element's id attribute value if present.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The id attribute specifies its element's unique identifier (ID)."
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id")
    }

    /// Returns the set of class names from the class attribute.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The class attribute, if specified, must have a value that is a set of
    /// space-separated tokens."
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        match self.attrs.get("class") {
            Some(classlist) => classlist.split_whitespace().collect(),
            None => HashSet::new(),
        }
    }

    /// Whether the class attribute contains the given token.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(class)
    }

    /// Get an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Set an attribute value (replace-or-append).
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.set(name, value);
    }

    /// Remove an attribute by name, returning its old value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Whether an attribute with this name exists.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.has(name)
    }
}

/// Arena-based document tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree. A tree is a finite hierarchical
/// tree structure."
///
/// All nodes live in a contiguous vector, using indices for relationships:
/// - O(1) access to any node by NodeId
/// - O(1) parent/sibling traversal
/// - no borrowing issues (indices instead of references)
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes in the tree, indexed by NodeId.
    /// The Document node is always at index 0 (NodeId::ROOT).
    nodes: Vec<Node>,
}

impl Document {
    /// Create a new document tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        Document {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of allocated nodes (including detached ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Allocate a detached element with the given tag name.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeType::Text(text.to_string()))
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before
    /// null."
    ///
    /// Appends `child` as the last child of `parent`, updating all
    /// relationships. `child` must be detached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Insert `child` as the first child of `parent`. `child` must be
    /// detached.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        match self.first_child(parent) {
            Some(first) => self.insert_before(parent, child, first),
            None => self.append_child(parent, child),
        }
    }

    /// [§ 4.2.3 Insert](https://dom.spec.whatwg.org/#concept-node-insert)
    ///
    /// Inserts `new_child` into `parent` immediately before `before`.
    /// `new_child` must be detached. Falls back to an append when `before` is
    /// not currently a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, new_child: NodeId, before: NodeId) {
        if self.nodes[before.0].parent != Some(parent) {
            self.append_child(parent, new_child);
            return;
        }
        let Some(pos) = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == before)
        else {
            self.append_child(parent, new_child);
            return;
        };

        let prev = self.nodes[before.0].prev_sibling;
        self.nodes[parent.0].children.insert(pos, new_child);
        self.nodes[new_child.0].parent = Some(parent);
        self.nodes[new_child.0].prev_sibling = prev;
        self.nodes[new_child.0].next_sibling = Some(before);
        if let Some(prev_id) = prev {
            self.nodes[prev_id.0].next_sibling = Some(new_child);
        }
        self.nodes[before.0].prev_sibling = Some(new_child);
    }

    /// [§ 4.2.4 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Detaches `child` from `parent`, splicing its siblings together. The
    /// removed node keeps its own children and stays allocated in the arena.
    /// Does nothing if `child` is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes[child.0].parent != Some(parent) {
            return;
        }
        let prev = self.nodes[child.0].prev_sibling;
        let next = self.nodes[child.0].next_sibling;
        if let Some(prev_id) = prev {
            self.nodes[prev_id.0].next_sibling = next;
        }
        if let Some(next_id) = next {
            self.nodes[next_id.0].prev_sibling = prev;
        }
        self.nodes[parent.0].children.retain(|&c| c != child);

        let node = &mut self.nodes[child.0];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Detach a node from its parent, wherever it is. No-op for the root and
    /// for already-detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
    }

    /// Move all children of `from` to the end of `to`'s children, preserving
    /// their order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children: Vec<NodeId> = self.children(from).to_vec();
        for child in children {
            self.remove_child(from, child);
            self.append_child(to, child);
        }
    }

    /// Replace a node with its own children, in order, at the same position.
    /// No-op for detached nodes. The unwrapped node itself is detached.
    pub fn unwrap_node(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove_child(id, child);
            self.insert_before(parent, child, id);
        }
        self.remove_child(parent, id);
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// "An object A is called a descendant of an object B, if either A is a
    /// child of B or A is a child of an object C that is a descendant of B."
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Iterate over all ancestors of a node, from parent to root.
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first
    /// child).
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Iterate over all descendants of a node in pre-order, excluding the
    /// node itself. Collect into a `Vec` before mutating the tree.
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        DescendantIterator { tree: self, stack }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    ///
    /// In practice for HTML documents, this is the `<html>` element.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| matches!(self.get(id).map(|n| &n.node_type), Some(NodeType::Element(_))))
            .copied()
    }

    /// [§ 3.1.2 The head element](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    ///
    /// "The head element of a document is the first head element that is a
    /// child of the html element, if there is one, or null otherwise."
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .find(|&&id| self.as_element(id).is_some_and(|e| e.is("head")))
            .copied()
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's
    /// children that is either a body element or a frameset element, or null
    /// if there is no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| e.is("body") || e.is("frameset"))
            })
            .copied()
    }

    /// Collect every element in the document with the given tag name, in
    /// tree order. Returns an owned snapshot so callers can mutate while
    /// iterating.
    #[must_use]
    pub fn elements_by_tag(&self, tag_name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&id| self.as_element(id).is_some_and(|e| e.is(tag_name)))
            .collect()
    }

    /// Concatenated text of a node and all its descendants, in tree order.
    ///
    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.as_text(id) {
            out.push_str(text);
        }
        for descendant in self.descendants(id) {
            if let Some(text) = self.as_text(descendant) {
                out.push_str(text);
            }
        }
        out
    }

    /// Slash-separated element path from the root to this node, for error
    /// reporting: `/html/body/div[2]`. The index suffix appears only when an
    /// earlier same-tag sibling exists, so the first occurrence stays terse.
    #[must_use]
    pub fn node_path(&self, id: NodeId) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if let Some(element) = self.as_element(node_id) {
                let mut index = 1;
                for sibling in self.preceding_siblings(node_id) {
                    if self
                        .as_element(sibling)
                        .is_some_and(|e| e.tag_name == element.tag_name)
                    {
                        index += 1;
                    }
                }
                if index > 1 {
                    segments.push(format!("{}[{index}]", element.tag_name));
                } else {
                    segments.push(element.tag_name.clone());
                }
            }
            current = self.parent(node_id);
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a Document,
    current: Option<NodeId>,
}

impl<'a> Iterator for AncestorIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a Document,
    current: Option<NodeId>,
}

impl<'a> Iterator for PrecedingSiblingIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct DescendantIterator<'a> {
    tree: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        for &child in self.tree.children(id).iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}
