//! Structural predicates identifying host-owned nodes
//!
//! The host application's markup is located through class and attribute
//! names, never through positional assumptions. The exact strings belong
//! to the embedder, so they are configuration data with neutral defaults
//! rather than constants baked into the engine.

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, NodeId};

fn default_panel_class() -> String {
    "file-diff".to_string()
}

fn default_header_class() -> String {
    "file-header".to_string()
}

fn default_filename_class() -> String {
    "file-name".to_string()
}

fn default_row_class() -> String {
    "diff-row".to_string()
}

fn default_line_class() -> String {
    "line-content".to_string()
}

fn default_preserved_classes() -> Vec<String> {
    vec!["screen-reader-only".to_string()]
}

fn default_hidden_attr() -> String {
    "aria-hidden".to_string()
}

/// Class/attribute names that identify the host's diff structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostSchema {
    /// Class on a per-file panel element.
    pub panel_class: String,
    /// Class on a panel's header element.
    pub header_class: String,
    /// Class on the element inside the header carrying the filename.
    pub filename_class: String,
    /// Class on a diff row (line wrapper).
    pub row_class: String,
    /// Class on the line-content element holding code text and markers.
    pub line_class: String,
    /// Classes marking accessibility/diff-marker children to carry over.
    pub preserved_classes: Vec<String>,
    /// Attribute that, when "true", also marks a child as preserved.
    pub hidden_attr: String,
}

impl Default for HostSchema {
    fn default() -> Self {
        Self {
            panel_class: default_panel_class(),
            header_class: default_header_class(),
            filename_class: default_filename_class(),
            row_class: default_row_class(),
            line_class: default_line_class(),
            preserved_classes: default_preserved_classes(),
            hidden_attr: default_hidden_attr(),
        }
    }
}

impl HostSchema {
    /// Whether a node is a per-file diff panel.
    pub fn is_panel(&self, dom: &Dom, id: NodeId) -> bool {
        dom.has_class(id, &self.panel_class)
    }

    /// Whether a node is a line-content element.
    pub fn is_line(&self, dom: &Dom, id: NodeId) -> bool {
        dom.has_class(id, &self.line_class)
    }

    /// Whether a line child is a preserved marker node rather than code
    /// text. Text nodes are never preserved; they are the code itself.
    pub fn is_preserved(&self, dom: &Dom, id: NodeId) -> bool {
        if !dom.is_element(id) {
            return false;
        }
        if self
            .preserved_classes
            .iter()
            .any(|c| dom.has_class(id, c))
        {
            return true;
        }
        dom.attr(id, &self.hidden_attr) == Some("true")
    }

    /// Whether a mutated node is relevant to the overlay: the node itself
    /// or any descendant matches the panel, header, or row predicate.
    pub fn qualifies_mutation(&self, dom: &Dom, id: NodeId) -> bool {
        let matches = |dom: &Dom, n: NodeId| {
            dom.has_class(n, &self.panel_class)
                || dom.has_class(n, &self.header_class)
                || dom.has_class(n, &self.row_class)
        };
        if matches(dom, id) {
            return true;
        }
        dom.find(id, matches).is_some()
    }

    /// Filename shown in a panel's header, trimmed. None when the header
    /// or filename element is missing or empty.
    pub fn filename_of(&self, dom: &Dom, panel: NodeId) -> Option<String> {
        let name_el = dom.find(panel, |d, n| d.has_class(n, &self.filename_class))?;
        let name = dom.text_content(name_el).trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// All line-content elements under a panel, in document order.
    pub fn lines_of(&self, dom: &Dom, panel: NodeId) -> Vec<NodeId> {
        dom.find_all(panel, |d, n| self.is_line(d, n))
    }
}
