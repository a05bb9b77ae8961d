//! Line reconciliation: overlay highlighted clones onto host lines
//!
//! The host's nodes are never edited in place and never deleted. For
//! each line the reconciler builds a fresh sibling that clones the
//! original's tag and attributes, carries deep copies of the preserved
//! marker children in their original order, and holds the highlighted
//! markup inside a single wrapper span. The original is then hidden and
//! the clone inserted directly after it, so the host can always get its
//! own node back untouched.
//!
//! Idempotence is tracked two ways: an identity-keyed set of processed
//! line and panel nodes, and a marker class on every overlay clone so
//! re-scans recognize overlay output structurally.

use std::collections::HashSet;

use tracing::debug;

use crate::dom::{Dom, NodeId};
use crate::extract::{extract_line, ExtractedLine};
use crate::schema::HostSchema;
use crate::theme::Palette;

/// Class on every overlay clone.
pub const PROCESSED_CLASS: &str = "adorn-processed";
/// Class on every hidden original line.
pub const SUPERSEDED_CLASS: &str = "adorn-superseded";
/// Class on the wrapper span holding the highlighted markup.
pub const WRAPPER_CLASS: &str = "adorn-code";

/// Identity-keyed record of already-reconciled nodes. Node ids are
/// stable for the tree's lifetime, so membership survives any amount of
/// host mutation around the node.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    lines: HashSet<NodeId>,
    panels: HashSet<NodeId>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_done(&self, line: NodeId) -> bool {
        self.lines.contains(&line)
    }

    pub fn panel_done(&self, panel: NodeId) -> bool {
        self.panels.contains(&panel)
    }

    pub fn mark_line(&mut self, line: NodeId) {
        self.lines.insert(line);
    }

    pub fn mark_panel(&mut self, panel: NodeId) {
        self.panels.insert(panel);
    }
}

/// One line awaiting its highlight fragment.
#[derive(Debug, Clone)]
pub struct LineEntry {
    pub line: NodeId,
    pub extracted: ExtractedLine,
}

/// Everything collected from one panel scan, index-aligned with the
/// fragments that come back from the tokenizer.
#[derive(Debug, Clone)]
pub struct PanelBatch {
    pub panel: NodeId,
    pub lines: Vec<LineEntry>,
    /// All code lines joined with `\n`, in line order.
    pub source: String,
}

impl PanelBatch {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Scan a panel and gather its lines.
///
/// Returns None when the panel is already done, has no lines, or
/// contains any line that was already reconciled (in the processed set
/// or carrying the overlay marker class). A panel is handled whole or
/// not at all, so the collected list is always index-aligned with the
/// tokenizer's response.
pub fn collect_batch(
    dom: &Dom,
    schema: &HostSchema,
    processed: &ProcessedSet,
    panel: NodeId,
) -> Option<PanelBatch> {
    if processed.panel_done(panel) {
        return None;
    }

    let mut lines = Vec::new();
    for line in schema.lines_of(dom, panel) {
        if processed.line_done(line) || dom.has_class(line, PROCESSED_CLASS) {
            return None;
        }
        let extracted = extract_line(dom, schema, line);
        lines.push(LineEntry { line, extracted });
    }
    if lines.is_empty() {
        return None;
    }

    let source = lines
        .iter()
        .map(|e| e.extracted.code.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Some(PanelBatch {
        panel,
        lines,
        source,
    })
}

/// Outcome counts for one applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub overlaid: usize,
    pub skipped: usize,
}

/// Apply a completed batch: one overlay clone per line with code text,
/// in the order collected. Fragments align by index with the batch's
/// lines. Lines that became processed or detached since collection, and
/// lines with no code text, are skipped without touching the panel's
/// other lines.
pub fn apply_batch(
    dom: &mut Dom,
    processed: &mut ProcessedSet,
    palette: Palette,
    batch: &PanelBatch,
    fragments: &[String],
) -> ApplyStats {
    let mut stats = ApplyStats::default();

    for (entry, fragment) in batch.lines.iter().zip(fragments) {
        let line = entry.line;
        if processed.line_done(line)
            || dom.has_class(line, PROCESSED_CLASS)
            || entry.extracted.is_empty_code()
            || !dom.is_attached(line)
        {
            stats.skipped += 1;
            continue;
        }

        let overlay = dom.clone_shallow(line);
        for &marker in &entry.extracted.preserved {
            let copy = dom.clone_deep(marker);
            dom.append_child(overlay, copy);
        }

        let wrapper = dom.create_element_with("span", &[("class", WRAPPER_CLASS)]);
        let markup = dom.create_text(fragment);
        dom.append_child(wrapper, markup);
        dom.append_child(overlay, wrapper);

        dom.add_class(overlay, PROCESSED_CLASS);
        dom.add_class(overlay, palette.class());

        dom.set_hidden(line, true);
        dom.add_class(line, SUPERSEDED_CLASS);
        dom.insert_after(line, overlay);

        processed.mark_line(line);
        stats.overlaid += 1;
    }

    debug!(
        panel = %batch.panel,
        overlaid = stats.overlaid,
        skipped = stats.skipped,
        "batch applied"
    );
    stats
}
