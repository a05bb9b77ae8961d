//! Shared fixtures: host-style diff trees and a scripted tokenizer.

use adorn::dom::{Dom, NodeId};
use adorn::languages::LanguageId;
use adorn::tokenizer::Tokenizer;

/// One line of a fixture panel.
pub enum Line {
    /// Plain code text.
    Code(&'static str),
    /// Preserved markers (screen-reader text and a diff sign) plus code.
    Marked(&'static str),
    /// A marker with no code text.
    MarkerOnly,
    /// Nothing at all.
    Blank,
}

/// Build a diff panel the way the host renders one: header with
/// filename, then one row per line.
pub fn add_panel(dom: &mut Dom, filename: &str, lines: &[Line]) -> NodeId {
    let panel = dom.create_element_with("div", &[("class", "file-diff")]);
    dom.append_child(dom.root(), panel);

    let header = dom.create_element_with("div", &[("class", "file-header")]);
    dom.append_child(panel, header);
    let name = dom.create_element_with("span", &[("class", "file-name")]);
    let name_text = dom.create_text(filename);
    dom.append_child(name, name_text);
    dom.append_child(header, name);

    for line in lines {
        let row = dom.create_element_with("div", &[("class", "diff-row")]);
        dom.append_child(panel, row);
        let content = dom.create_element_with("div", &[("class", "line-content")]);
        dom.append_child(row, content);
        match line {
            Line::Code(code) => {
                let text = dom.create_text(code);
                dom.append_child(content, text);
            }
            Line::Marked(code) => {
                let sr = dom.create_element_with("span", &[("class", "screen-reader-only")]);
                let sr_text = dom.create_text("added line");
                dom.append_child(sr, sr_text);
                dom.append_child(content, sr);
                let sign = dom.create_element_with("span", &[("aria-hidden", "true")]);
                let sign_text = dom.create_text("+");
                dom.append_child(sign, sign_text);
                dom.append_child(content, sign);
                let text = dom.create_text(code);
                dom.append_child(content, text);
            }
            Line::MarkerOnly => {
                let sign = dom.create_element_with("span", &[("aria-hidden", "true")]);
                let sign_text = dom.create_text("+");
                dom.append_child(sign, sign_text);
                dom.append_child(content, sign);
            }
            Line::Blank => {}
        }
    }
    panel
}

/// All line-content elements under a panel, in order.
pub fn lines_of(dom: &Dom, panel: NodeId) -> Vec<NodeId> {
    dom.find_all(panel, |d, n| d.has_class(n, "line-content"))
}

/// Deterministic tokenizer: uppercases each line and tags it, so tests
/// can tell exactly which input line produced which fragment.
pub struct UpperTokenizer {
    pub languages: Vec<&'static str>,
}

impl UpperTokenizer {
    pub fn common() -> Self {
        Self {
            languages: vec!["rust", "markup", "gherkin", "python"],
        }
    }
}

impl Tokenizer for UpperTokenizer {
    fn languages(&self) -> Vec<LanguageId> {
        self.languages.iter().map(|s| LanguageId::new(s)).collect()
    }

    fn highlight(&mut self, language: &LanguageId, source: &str) -> Vec<String> {
        source
            .split('\n')
            .map(|l| {
                if l.is_empty() {
                    String::new()
                } else {
                    format!("[{}]{}", language, l.to_uppercase())
                }
            })
            .collect()
    }
}
