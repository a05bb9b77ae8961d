//! Line extraction: split a line element into markers and code text
//!
//! Walks a line-content element's immediate children once. Children the
//! schema marks as preserved (screen-reader text, +/- diff markers) are
//! remembered by identity so the reconciler can carry them over; every
//! other child contributes its subtree text to the code string. This is
//! a pure read, nothing is modified.

use crate::dom::{Dom, NodeId};
use crate::schema::HostSchema;

/// Result of classifying one line element's children.
#[derive(Debug, Clone, Default)]
pub struct ExtractedLine {
    /// Preserved marker children, in original document order.
    pub preserved: Vec<NodeId>,
    /// Concatenated code text of the remaining children, exactly as the
    /// host rendered it.
    pub code: String,
}

impl ExtractedLine {
    /// A line with no code text to highlight. Marker-only lines fall here.
    pub fn is_empty_code(&self) -> bool {
        self.code.is_empty()
    }
}

/// Classify the immediate children of a line element.
pub fn extract_line(dom: &Dom, schema: &HostSchema, line: NodeId) -> ExtractedLine {
    let mut out = ExtractedLine::default();
    for &child in dom.children(line) {
        if schema.is_preserved(dom, child) {
            out.preserved.push(child);
        } else {
            out.code.push_str(&dom.text_content(child));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_and_code_split() {
        let mut dom = Dom::new("body");
        let line = dom.create_element_with("div", &[("class", "line-content")]);
        let sr = dom.create_element_with("span", &[("class", "screen-reader-only")]);
        let sr_text = dom.create_text("added line");
        dom.append_child(sr, sr_text);
        let plus = dom.create_element_with("span", &[("aria-hidden", "true")]);
        let plus_text = dom.create_text("+");
        dom.append_child(plus, plus_text);
        let code = dom.create_text("let x = 1;");
        dom.append_child(line, sr);
        dom.append_child(line, plus);
        dom.append_child(line, code);

        let extracted = extract_line(&dom, &HostSchema::default(), line);
        assert_eq!(extracted.preserved, vec![sr, plus]);
        assert_eq!(extracted.code, "let x = 1;");
    }

    #[test]
    fn test_code_concatenates_nested_text() {
        let mut dom = Dom::new("body");
        let line = dom.create_element_with("div", &[("class", "line-content")]);
        let a = dom.create_text("fn ");
        let wrapped = dom.create_element("span");
        let b = dom.create_text("main");
        dom.append_child(wrapped, b);
        let c = dom.create_text("() {}");
        dom.append_child(line, a);
        dom.append_child(line, wrapped);
        dom.append_child(line, c);

        let extracted = extract_line(&dom, &HostSchema::default(), line);
        assert!(extracted.preserved.is_empty());
        assert_eq!(extracted.code, "fn main() {}");
    }

    #[test]
    fn test_marker_only_line_is_empty_code() {
        let mut dom = Dom::new("body");
        let line = dom.create_element_with("div", &[("class", "line-content")]);
        let marker = dom.create_element_with("span", &[("aria-hidden", "true")]);
        dom.append_child(line, marker);

        let extracted = extract_line(&dom, &HostSchema::default(), line);
        assert_eq!(extracted.preserved, vec![marker]);
        assert!(extracted.is_empty_code());
    }

    #[test]
    fn test_empty_line() {
        let mut dom = Dom::new("body");
        let line = dom.create_element_with("div", &[("class", "line-content")]);
        let extracted = extract_line(&dom, &HostSchema::default(), line);
        assert!(extracted.preserved.is_empty());
        assert!(extracted.is_empty_code());
    }
}
