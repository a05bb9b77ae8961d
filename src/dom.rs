//! Arena-based node tree standing in for the host-owned DOM
//!
//! The engine never owns the real document of the host application; it
//! operates on whatever tree the embedder hands it. This module is that
//! tree: elements with attributes, text nodes, and the narrow set of
//! write operations the overlay is allowed to perform (clone, insert a
//! sibling, toggle visibility, add a marker class).
//!
//! Nodes are never freed while the tree is alive, so a [`NodeId`] stays
//! valid for the lifetime of the [`Dom`] even after `detach` — exactly
//! the identity guarantee the reconciler's bookkeeping relies on.

use std::fmt;

/// Stable handle to a node in a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: tag name plus ordered attributes.
///
/// Attribute order is preserved on clone so that a copied marker node is
/// indistinguishable from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Visibility toggle, the stand-in for `display: none`.
    pub hidden: bool,
}

/// What a node holds. Text nodes are uninterpreted character data; the
/// reconciler also uses them to carry pre-rendered markup inside its
/// wrapper elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The node arena. Index 0 is always the root element.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    /// Create a tree with a root element of the given tag.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(ElementData {
                    tag: root_tag.to_string(),
                    attrs: Vec::new(),
                    hidden: false,
                }),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attrs: Vec::new(),
            hidden: false,
        }))
    }

    /// Create a detached element with initial attributes.
    pub fn create_element_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (k, v) in attrs {
            self.set_attr(id, k, v);
        }
        id
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(&el.tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    // ------------------------------------------------------------------
    // Attributes and classes
    // ------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => el
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// All attributes of an element, in document order. Empty for text nodes.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).data {
            NodeData::Element(el) => &el.attrs,
            NodeData::Text(_) => &[],
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            if let Some(slot) = el.attrs.iter_mut().find(|(k, _)| k == name) {
                slot.1 = value.to_string();
            } else {
                el.attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Whether the `class` attribute contains the given class token.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Append a class token to the `class` attribute (no-op if present).
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let joined = match self.attr(id, "class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &joined);
    }

    pub fn hidden(&self, id: NodeId) -> bool {
        match &self.node(id).data {
            NodeData::Element(el) => el.hidden,
            NodeData::Text(_) => false,
        }
    }

    /// Toggle the visibility flag. Stands in for `style.display = "none"`.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            el.hidden = hidden;
        }
    }

    // ------------------------------------------------------------------
    // Structure edits
    // ------------------------------------------------------------------

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child already attached");
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert a detached node as the immediate next sibling of `anchor`.
    ///
    /// Returns false when the anchor has no parent (detached or root), in
    /// which case nothing happens.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.node(anchor).parent else {
            return false;
        };
        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == anchor)
            .map(|p| p + 1)
            .unwrap_or_else(|| self.node(parent).children.len());
        self.node_mut(node).parent = Some(parent);
        self.node_mut(parent).children.insert(pos, node);
        true
    }

    /// Remove a node from its parent. The node and its subtree stay alive
    /// in the arena; only the link is cut.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        self.node_mut(parent).children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
    }

    /// True when the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Copy an element's tag and attributes but none of its children.
    /// The visibility flag is reset on the copy.
    pub fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let data = match &self.node(id).data {
            NodeData::Element(el) => NodeData::Element(ElementData {
                tag: el.tag.clone(),
                attrs: el.attrs.clone(),
                hidden: false,
            }),
            NodeData::Text(t) => NodeData::Text(t.clone()),
        };
        self.push(data)
    }

    /// Copy a node and its entire subtree. Attribute order and text are
    /// preserved verbatim.
    pub fn clone_deep(&mut self, id: NodeId) -> NodeId {
        let copy = self.clone_shallow(id);
        let children: Vec<NodeId> = self.node(id).children.clone();
        for child in children {
            let child_copy = self.clone_deep(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Concatenated text of a node's entire subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// All nodes under `id` (excluding `id` itself) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            for &child in self.node(cur).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// First descendant (document order) matching the predicate.
    pub fn find(&self, from: NodeId, pred: impl Fn(&Dom, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(from).into_iter().find(|&n| pred(self, n))
    }

    /// All descendants (document order) matching the predicate.
    pub fn find_all(&self, from: NodeId, pred: impl Fn(&Dom, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&n| pred(self, n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_text_content() {
        let mut dom = Dom::new("body");
        let div = dom.create_element("div");
        let hello = dom.create_text("hello ");
        let span = dom.create_element("span");
        let world = dom.create_text("world");
        dom.append_child(dom.root(), div);
        dom.append_child(div, hello);
        dom.append_child(div, span);
        dom.append_child(span, world);

        assert_eq!(dom.text_content(div), "hello world");
        assert_eq!(dom.children(div).len(), 2);
        assert_eq!(dom.parent(span), Some(div));
    }

    #[test]
    fn test_insert_after_orders_siblings() {
        let mut dom = Dom::new("body");
        let a = dom.create_element("a");
        let c = dom.create_element("c");
        dom.append_child(dom.root(), a);
        dom.append_child(dom.root(), c);

        let b = dom.create_element("b");
        assert!(dom.insert_after(a, b));
        assert_eq!(dom.children(dom.root()), &[a, b, c]);
    }

    #[test]
    fn test_insert_after_detached_anchor_is_noop() {
        let mut dom = Dom::new("body");
        let floating = dom.create_element("div");
        let node = dom.create_element("span");
        assert!(!dom.insert_after(floating, node));
        assert_eq!(dom.parent(node), None);
    }

    #[test]
    fn test_clone_shallow_copies_attrs_not_children() {
        let mut dom = Dom::new("body");
        let div = dom.create_element_with("div", &[("class", "line"), ("data-line", "3")]);
        let text = dom.create_text("content");
        dom.append_child(div, text);
        dom.set_hidden(div, true);

        let copy = dom.clone_shallow(div);
        assert_eq!(dom.tag(copy), Some("div"));
        assert_eq!(dom.attr(copy, "class"), Some("line"));
        assert_eq!(dom.attr(copy, "data-line"), Some("3"));
        assert!(dom.children(copy).is_empty());
        assert!(!dom.hidden(copy), "visibility flag resets on the copy");
    }

    #[test]
    fn test_clone_deep_preserves_subtree_and_attr_order() {
        let mut dom = Dom::new("body");
        let span = dom.create_element_with("span", &[("aria-hidden", "true"), ("class", "marker")]);
        let text = dom.create_text("+");
        dom.append_child(span, text);

        let copy = dom.clone_deep(span);
        assert_eq!(dom.attrs(copy), dom.attrs(span));
        assert_eq!(dom.text_content(copy), "+");
        assert_ne!(copy, span);
    }

    #[test]
    fn test_class_helpers() {
        let mut dom = Dom::new("body");
        let el = dom.create_element_with("div", &[("class", "one two")]);
        assert!(dom.has_class(el, "one"));
        assert!(dom.has_class(el, "two"));
        assert!(!dom.has_class(el, "three"));

        dom.add_class(el, "three");
        assert_eq!(dom.attr(el, "class"), Some("one two three"));
        dom.add_class(el, "three");
        assert_eq!(dom.attr(el, "class"), Some("one two three"));
    }

    #[test]
    fn test_detach_and_is_attached() {
        let mut dom = Dom::new("body");
        let panel = dom.create_element("section");
        let line = dom.create_element("div");
        dom.append_child(dom.root(), panel);
        dom.append_child(panel, line);

        assert!(dom.is_attached(line));
        dom.detach(panel);
        assert!(!dom.is_attached(line), "subtree detaches with its root");
        assert!(!dom.is_attached(panel));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut dom = Dom::new("body");
        let a = dom.create_element("a");
        let b = dom.create_element("b");
        let c = dom.create_element("c");
        let d = dom.create_element("d");
        dom.append_child(dom.root(), a);
        dom.append_child(a, b);
        dom.append_child(a, c);
        dom.append_child(dom.root(), d);

        assert_eq!(dom.descendants(dom.root()), vec![a, b, c, d]);
    }
}
