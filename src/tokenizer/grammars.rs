//! Tree-sitter backed tokenizer
//!
//! One parser and compiled highlight query per registered language, all
//! using the grammar crates' built-in queries. Captures are flattened
//! into per-line byte spans, multi-line captures are split at row
//! boundaries, and each line renders to an HTML fragment of
//! `<span class="tok-...">` runs with everything else escaped verbatim.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tracing::warn;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use super::Tokenizer;
use crate::languages::LanguageId;

/// Capture names that get a CSS class of their own. Query captures not
/// listed here fall back to their nearest listed ancestor name
/// ("keyword.control.import" -> "keyword") or render as plain text.
pub const TOKEN_CLASSES: &[&str] = &[
    "attribute",
    "boolean",
    "comment",
    "constant",
    "constant.builtin",
    "constructor",
    "escape",
    "function",
    "function.builtin",
    "function.method",
    "keyword",
    "keyword.return",
    "keyword.function",
    "keyword.operator",
    "label",
    "number",
    "operator",
    "property",
    "punctuation",
    "punctuation.bracket",
    "punctuation.delimiter",
    "punctuation.special",
    "string",
    "string.special",
    "tag",
    "tag.attribute",
    "type",
    "type.builtin",
    "variable",
    "variable.builtin",
    "variable.parameter",
];

/// CSS class token for a capture name, with hierarchical fallback.
/// Dots become hyphens so the result is a single class token.
pub fn class_for_capture(name: &str) -> Option<String> {
    let mut current = name;
    loop {
        if TOKEN_CLASSES.contains(&current) {
            return Some(format!("tok-{}", current.replace('.', "-")));
        }
        match current.rfind('.') {
            Some(pos) => current = &current[..pos],
            None => return None,
        }
    }
}

/// Escape text for inclusion in an HTML fragment.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A classified byte range within a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    class: String,
}

struct Grammar {
    parser: Parser,
    query: Query,
}

/// Tokenizer over the registered tree-sitter grammars.
pub struct TreeSitterTokenizer {
    grammars: HashMap<LanguageId, Grammar>,
}

impl Default for TreeSitterTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSitterTokenizer {
    pub fn new() -> Self {
        let mut this = Self {
            grammars: HashMap::new(),
        };
        let table: Vec<(&str, Language, &str)> = vec![
            (
                "rust",
                tree_sitter_rust::LANGUAGE.into(),
                tree_sitter_rust::HIGHLIGHTS_QUERY,
            ),
            (
                "javascript",
                tree_sitter_javascript::LANGUAGE.into(),
                tree_sitter_javascript::HIGHLIGHT_QUERY,
            ),
            (
                "jsx",
                tree_sitter_javascript::LANGUAGE.into(),
                tree_sitter_javascript::HIGHLIGHT_QUERY,
            ),
            (
                "typescript",
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                tree_sitter_typescript::HIGHLIGHTS_QUERY,
            ),
            (
                "tsx",
                tree_sitter_typescript::LANGUAGE_TSX.into(),
                tree_sitter_typescript::HIGHLIGHTS_QUERY,
            ),
            (
                "python",
                tree_sitter_python::LANGUAGE.into(),
                tree_sitter_python::HIGHLIGHTS_QUERY,
            ),
            (
                "go",
                tree_sitter_go::LANGUAGE.into(),
                tree_sitter_go::HIGHLIGHTS_QUERY,
            ),
            (
                "java",
                tree_sitter_java::LANGUAGE.into(),
                tree_sitter_java::HIGHLIGHTS_QUERY,
            ),
            (
                "c",
                tree_sitter_c::LANGUAGE.into(),
                tree_sitter_c::HIGHLIGHT_QUERY,
            ),
            (
                "cpp",
                tree_sitter_cpp::LANGUAGE.into(),
                tree_sitter_cpp::HIGHLIGHT_QUERY,
            ),
            (
                "css",
                tree_sitter_css::LANGUAGE.into(),
                tree_sitter_css::HIGHLIGHTS_QUERY,
            ),
            (
                "json",
                tree_sitter_json::LANGUAGE.into(),
                tree_sitter_json::HIGHLIGHTS_QUERY,
            ),
            (
                "yaml",
                tree_sitter_yaml::language(),
                tree_sitter_yaml::HIGHLIGHTS_QUERY,
            ),
            (
                "toml",
                tree_sitter_toml_ng::LANGUAGE.into(),
                tree_sitter_toml_ng::HIGHLIGHTS_QUERY,
            ),
            (
                "bash",
                tree_sitter_bash::LANGUAGE.into(),
                tree_sitter_bash::HIGHLIGHT_QUERY,
            ),
            (
                "php",
                tree_sitter_php::LANGUAGE_PHP.into(),
                tree_sitter_php::HIGHLIGHTS_QUERY,
            ),
            // The "markup" id covers html/xml/svg/csproj diffs; the XML
            // grammar handles all of them well enough for span coloring.
            (
                "markup",
                tree_sitter_xml::LANGUAGE_XML.into(),
                tree_sitter_xml::XML_HIGHLIGHT_QUERY,
            ),
        ];
        for (id, language, query_src) in table {
            this.register(LanguageId::new(id), language, query_src);
        }
        this
    }

    fn register(&mut self, id: LanguageId, language: Language, query_src: &str) {
        let query = match Query::new(&language, query_src) {
            Ok(q) => q,
            Err(e) => {
                warn!(language = %id, error = %e, "highlight query failed to compile");
                return;
            }
        };
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&language) {
            warn!(language = %id, error = %e, "grammar rejected by parser");
            return;
        }
        self.grammars.insert(id, Grammar { parser, query });
    }

    /// Per-line spans for a parsed source. Multi-line captures split at
    /// row boundaries; overlapping captures are resolved at render time.
    fn collect_spans(grammar: &mut Grammar, source: &str, lines: &[&str]) -> Vec<Vec<Span>> {
        let mut per_line: Vec<Vec<Span>> = vec![Vec::new(); lines.len()];
        let Some(tree) = grammar.parser.parse(source, None) else {
            return per_line;
        };

        let names = grammar.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&grammar.query, tree.root_node(), source.as_bytes());
        while let Some((m, idx)) = captures.next() {
            let capture = m.captures[*idx];
            let Some(class) = class_for_capture(names[capture.index as usize]) else {
                continue;
            };
            let start = capture.node.start_position();
            let end = capture.node.end_position();
            for row in start.row..=end.row {
                if row >= lines.len() {
                    break;
                }
                let line_len = lines[row].len();
                let s = if row == start.row { start.column } else { 0 };
                let e = if row == end.row { end.column } else { line_len };
                let (s, e) = (s.min(line_len), e.min(line_len));
                if s < e {
                    per_line[row].push(Span {
                        start: s,
                        end: e,
                        class: class.clone(),
                    });
                }
            }
        }
        per_line
    }

    /// Render one line's spans into an HTML fragment. Spans that overlap
    /// an already-rendered region are dropped, keeping the earliest and
    /// widest capture.
    fn render_line(line: &str, mut spans: Vec<Span>) -> String {
        if line.is_empty() {
            return String::new();
        }
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut out = String::new();
        let mut cursor = 0usize;
        for span in spans {
            let start = floor_char_boundary(line, span.start);
            let end = floor_char_boundary(line, span.end);
            if start < cursor || start >= end {
                continue;
            }
            out.push_str(&escape_html(&line[cursor..start]));
            out.push_str("<span class=\"");
            out.push_str(&span.class);
            out.push_str("\">");
            out.push_str(&escape_html(&line[start..end]));
            out.push_str("</span>");
            cursor = end;
        }
        out.push_str(&escape_html(&line[cursor..]));
        out
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

impl Tokenizer for TreeSitterTokenizer {
    fn languages(&self) -> Vec<LanguageId> {
        let mut ids: Vec<LanguageId> = self.grammars.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn highlight(&mut self, language: &LanguageId, source: &str) -> Vec<String> {
        let lines: Vec<&str> = source.split('\n').collect();
        let Some(grammar) = self.grammars.get_mut(language) else {
            // Unsupported ids are filtered before submission; render
            // plain escaped text if one slips through.
            return lines.iter().map(|l| escape_html(l)).collect();
        };

        let per_line = Self::collect_spans(grammar, source, &lines);
        lines
            .into_iter()
            .zip(per_line)
            .map(|(line, spans)| Self::render_line(line, spans))
            .collect()
    }
}
