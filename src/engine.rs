//! Composition root tying the overlay pipeline together
//!
//! Owns the resolver, theme selector, processed bookkeeping, tokenizer
//! pool, and mutation scheduler. The embedder feeds it mutation batches
//! and navigation events, polls it with the current time, and the
//! engine does the rest: scan panels, submit highlight batches, and
//! reconcile completions back into the tree.
//!
//! Every per-panel failure is a logged skip. One panel with a missing
//! filename, an unknown language, or a mid-flight detach never stops
//! its siblings from being highlighted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dom::{Dom, NodeId};
use crate::languages::{LanguageId, LanguageResolver};
use crate::reconcile::{apply_batch, collect_batch, PanelBatch, ProcessedSet};
use crate::scheduler::MutationScheduler;
use crate::schema::HostSchema;
use crate::theme::{self, ThemeSelector};
use crate::tokenizer::{HighlightBatch, HighlightRequest, Tokenizer, TokenizerPool};

/// Running counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub panels_scanned: usize,
    pub panels_skipped: usize,
    pub panels_reconciled: usize,
    pub lines_overlaid: usize,
    pub lines_skipped: usize,
}

/// The overlay engine.
pub struct OverlayEngine {
    schema: HostSchema,
    resolver: LanguageResolver,
    theme: ThemeSelector,
    processed: ProcessedSet,
    pool: TokenizerPool,
    scheduler: MutationScheduler,
    /// Batches submitted to the pool, awaiting completion.
    pending: HashMap<NodeId, PanelBatch>,
    stats: EngineStats,
}

impl OverlayEngine {
    pub fn new<T: Tokenizer>(config: &EngineConfig, tokenizer: T) -> Self {
        let mut resolver = LanguageResolver::new();
        // Reverse so the first configured rule ends up checked first
        for (glob, id) in config.extra_rules.iter().rev() {
            resolver.prepend_rule(glob, LanguageId::new(id));
        }

        Self {
            schema: config.schema.clone(),
            resolver,
            theme: ThemeSelector::new(),
            processed: ProcessedSet::new(),
            pool: TokenizerPool::spawn(tokenizer),
            scheduler: MutationScheduler::new(Duration::from_millis(config.debounce_ms)),
            pending: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Feed one host mutation batch (the added nodes).
    pub fn note_mutations(&mut self, dom: &Dom, added: &[NodeId], now: Instant) {
        self.scheduler.note_batch(dom, &self.schema, added, now);
    }

    /// Feed a navigation/route-change event.
    pub fn note_navigation(&mut self, now: Instant) {
        self.scheduler.note_navigation(now);
    }

    /// Drive the engine: scan if the quiet period elapsed, then fold any
    /// ready completions back into the tree. Call this regularly.
    pub fn poll(&mut self, dom: &mut Dom, now: Instant) {
        if self.scheduler.poll(now) {
            self.scan(dom);
        }
        while let Some(batch) = self.pool.try_recv() {
            self.apply_completion(dom, batch);
        }
    }

    /// Scan every panel under the root and submit highlight batches for
    /// the ones that need work.
    pub fn scan(&mut self, dom: &Dom) {
        let panels = dom.find_all(dom.root(), |d, n| self.schema.is_panel(d, n));
        info!(panels = panels.len(), "scanning");
        for panel in panels {
            self.scan_panel(dom, panel);
        }
    }

    fn scan_panel(&mut self, dom: &Dom, panel: NodeId) {
        if self.processed.panel_done(panel) || self.pending.contains_key(&panel) {
            return;
        }
        self.stats.panels_scanned += 1;

        let Some(filename) = self.schema.filename_of(dom, panel) else {
            debug!(panel = %panel, "no filename in header, skipping panel");
            self.stats.panels_skipped += 1;
            return;
        };
        let Some(language) = self.resolver.resolve(Some(&filename)) else {
            debug!(panel = %panel, filename, "no language for filename, skipping panel");
            self.stats.panels_skipped += 1;
            return;
        };
        if !self.pool.supports(&language) {
            debug!(panel = %panel, %language, "language unsupported, skipping panel");
            self.stats.panels_skipped += 1;
            return;
        }
        let Some(batch) = collect_batch(dom, &self.schema, &self.processed, panel) else {
            debug!(panel = %panel, "nothing to reconcile, skipping panel");
            self.stats.panels_skipped += 1;
            return;
        };

        let request = HighlightRequest {
            panel,
            language,
            source: batch.source.clone(),
            line_count: batch.line_count(),
        };
        match self.pool.submit(request) {
            Ok(()) => {
                self.pending.insert(panel, batch);
            }
            Err(e) => {
                warn!(panel = %panel, error = %e, "submit failed, skipping panel");
                self.stats.panels_skipped += 1;
            }
        }
    }

    fn apply_completion(&mut self, dom: &mut Dom, completion: HighlightBatch) {
        let Some(batch) = self.pending.remove(&completion.panel) else {
            warn!(panel = %completion.panel, "completion for unknown panel, dropping");
            return;
        };
        if !dom.is_attached(batch.panel) {
            debug!(panel = %batch.panel, "panel detached mid-flight, abandoning batch");
            self.stats.panels_skipped += 1;
            return;
        }

        let sample = theme::sample_foreground(dom, dom.root());
        let palette = self.theme.resolve_with(sample);

        let applied = apply_batch(
            dom,
            &mut self.processed,
            palette,
            &batch,
            &completion.fragments,
        );
        self.processed.mark_panel(batch.panel);
        self.stats.panels_reconciled += 1;
        self.stats.lines_overlaid += applied.overlaid;
        self.stats.lines_skipped += applied.skipped;
    }

    /// Block until every in-flight batch has been applied. Completions
    /// arrive in whatever order the worker finishes them.
    pub fn pump(&mut self, dom: &mut Dom) {
        while self.pool.pending() > 0 {
            let Some(batch) = self.pool.recv() else {
                break;
            };
            self.apply_completion(dom, batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::PROCESSED_CLASS;

    /// Wraps each line in a fixed marker, enough to observe the pipeline.
    struct StubTokenizer;

    impl Tokenizer for StubTokenizer {
        fn languages(&self) -> Vec<LanguageId> {
            vec![LanguageId::new("rust"), LanguageId::new("markup")]
        }

        fn highlight(&mut self, _language: &LanguageId, source: &str) -> Vec<String> {
            source
                .split('\n')
                .map(|l| {
                    if l.is_empty() {
                        String::new()
                    } else {
                        format!("<span class=\"tok-keyword\">{}</span>", l)
                    }
                })
                .collect()
        }
    }

    fn add_panel(dom: &mut Dom, filename: &str, lines: &[&str]) -> NodeId {
        let panel = dom.create_element_with("div", &[("class", "file-diff")]);
        dom.append_child(dom.root(), panel);
        let header = dom.create_element_with("div", &[("class", "file-header")]);
        dom.append_child(panel, header);
        let name = dom.create_element_with("span", &[("class", "file-name")]);
        let name_text = dom.create_text(filename);
        dom.append_child(name, name_text);
        dom.append_child(header, name);
        for code in lines {
            let row = dom.create_element_with("div", &[("class", "diff-row")]);
            dom.append_child(panel, row);
            let line = dom.create_element_with("div", &[("class", "line-content")]);
            dom.append_child(row, line);
            if !code.is_empty() {
                let text = dom.create_text(code);
                dom.append_child(line, text);
            }
        }
        panel
    }

    fn engine() -> OverlayEngine {
        OverlayEngine::new(&EngineConfig::default(), StubTokenizer)
    }

    #[test]
    fn test_scan_and_pump_overlays_lines() {
        let mut dom = Dom::new("body");
        let panel = add_panel(&mut dom, "main.rs", &["fn main() {", "}"]);

        let mut eng = engine();
        eng.scan(&dom);
        eng.pump(&mut dom);

        let stats = eng.stats();
        assert_eq!(stats.panels_reconciled, 1);
        assert_eq!(stats.lines_overlaid, 2);

        let overlays = dom.find_all(panel, |d, n| d.has_class(n, PROCESSED_CLASS));
        assert_eq!(overlays.len(), 2);
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let mut dom = Dom::new("body");
        let panel = add_panel(&mut dom, "main.rs", &["let x = 1;"]);

        let mut eng = engine();
        eng.scan(&dom);
        eng.pump(&mut dom);
        eng.scan(&dom);
        eng.pump(&mut dom);

        let overlays = dom.find_all(panel, |d, n| d.has_class(n, PROCESSED_CLASS));
        assert_eq!(overlays.len(), 1);
        assert_eq!(eng.stats().lines_overlaid, 1);
    }

    #[test]
    fn test_unsupported_panel_left_untouched() {
        let mut dom = Dom::new("body");
        let supported = add_panel(&mut dom, "main.rs", &["code"]);
        let unsupported = add_panel(&mut dom, "data.xyz123", &["???"]);

        let mut eng = engine();
        eng.scan(&dom);
        eng.pump(&mut dom);

        assert_eq!(
            dom.find_all(supported, |d, n| d.has_class(n, PROCESSED_CLASS)).len(),
            1
        );
        assert!(dom
            .find_all(unsupported, |d, n| d.has_class(n, PROCESSED_CLASS))
            .is_empty());
        assert_eq!(eng.stats().panels_skipped, 1);
    }

    #[test]
    fn test_poll_debounces_mutations() {
        let mut dom = Dom::new("body");
        let panel = add_panel(&mut dom, "main.rs", &["code"]);

        let mut eng = engine();
        let t0 = Instant::now();
        eng.note_mutations(&dom, &[panel], t0);
        eng.poll(&mut dom, t0 + Duration::from_millis(100));
        assert_eq!(eng.stats().panels_scanned, 0);

        eng.poll(&mut dom, t0 + Duration::from_millis(500));
        assert_eq!(eng.stats().panels_scanned, 1);
        eng.pump(&mut dom);
        assert_eq!(eng.stats().lines_overlaid, 1);
    }

    #[test]
    fn test_detached_panel_abandoned() {
        let mut dom = Dom::new("body");
        let panel = add_panel(&mut dom, "main.rs", &["code"]);

        let mut eng = engine();
        eng.scan(&dom);
        dom.detach(panel);
        eng.pump(&mut dom);

        assert_eq!(eng.stats().panels_reconciled, 0);
        assert_eq!(eng.stats().lines_overlaid, 0);
    }

    #[test]
    fn test_extra_rules_take_precedence() {
        let mut dom = Dom::new("body");
        let panel = add_panel(&mut dom, "widget.vue", &["<template>"]);

        let mut config = EngineConfig::default();
        config
            .extra_rules
            .push(("*.vue".to_string(), "markup".to_string()));
        let mut eng = OverlayEngine::new(&config, StubTokenizer);
        eng.scan(&dom);
        eng.pump(&mut dom);

        assert_eq!(
            dom.find_all(panel, |d, n| d.has_class(n, PROCESSED_CLASS)).len(),
            1
        );
    }
}
