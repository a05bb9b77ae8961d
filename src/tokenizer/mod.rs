//! Tokenizer adapter: batched, asynchronous highlighting
//!
//! Highlighting is handed to a worker thread so a slow grammar never
//! stalls the scheduling side. One request covers one panel: the full
//! joined code text goes in, and one markup fragment per input line
//! comes back, index-aligned (blank lines yield empty fragments).
//! Completions carry no ordering guarantee across panels and each
//! request is answered exactly once.

pub mod grammars;

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::dom::NodeId;
use crate::languages::LanguageId;

pub use grammars::TreeSitterTokenizer;

/// A highlighting backend. Implementations run on the pool's worker
/// thread, so they may keep mutable parser state.
pub trait Tokenizer: Send + 'static {
    /// Language ids this backend can highlight.
    fn languages(&self) -> Vec<LanguageId>;

    /// Highlight a whole source text, returning one HTML fragment per
    /// line of the input (`source.split('\n')` alignment). A line with
    /// nothing to highlight yields its escaped text; an empty line
    /// yields an empty fragment.
    fn highlight(&mut self, language: &LanguageId, source: &str) -> Vec<String>;
}

/// One panel's worth of work.
#[derive(Debug, Clone)]
pub struct HighlightRequest {
    pub panel: NodeId,
    pub language: LanguageId,
    /// All code lines of the panel joined with `\n`.
    pub source: String,
    /// Number of lines the caller extracted. The response is padded or
    /// truncated to exactly this length.
    pub line_count: usize,
}

/// Completed work for one panel.
#[derive(Debug, Clone)]
pub struct HighlightBatch {
    pub panel: NodeId,
    pub language: LanguageId,
    /// Index-aligned per-line fragments, length == request line_count.
    pub fragments: Vec<String>,
}

/// Worker-thread pool (currently a single worker) fronting a
/// [`Tokenizer`].
pub struct TokenizerPool {
    supported: HashSet<LanguageId>,
    tx: Option<Sender<HighlightRequest>>,
    rx: Receiver<HighlightBatch>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl TokenizerPool {
    /// Move a tokenizer onto a worker thread and start serving requests.
    pub fn spawn<T: Tokenizer>(mut tokenizer: T) -> Self {
        let supported: HashSet<LanguageId> = tokenizer.languages().into_iter().collect();
        let (req_tx, req_rx) = mpsc::channel::<HighlightRequest>();
        let (batch_tx, batch_rx) = mpsc::channel::<HighlightBatch>();

        let worker = thread::spawn(move || {
            while let Ok(req) = req_rx.recv() {
                let mut fragments = tokenizer.highlight(&req.language, &req.source);
                fragments.resize(req.line_count, String::new());
                debug!(
                    panel = %req.panel,
                    language = %req.language,
                    lines = req.line_count,
                    "highlight batch complete"
                );
                let batch = HighlightBatch {
                    panel: req.panel,
                    language: req.language,
                    fragments,
                };
                if batch_tx.send(batch).is_err() {
                    break;
                }
            }
        });

        Self {
            supported,
            tx: Some(req_tx),
            rx: batch_rx,
            worker: Some(worker),
            pending: 0,
        }
    }

    /// Whether the backend can highlight the given language.
    pub fn supports(&self, language: &LanguageId) -> bool {
        self.supported.contains(language)
    }

    /// Queue one panel's batch. Callers check [`supports`] first;
    /// submitting an unsupported language is an error.
    ///
    /// [`supports`]: Self::supports
    pub fn submit(&mut self, request: HighlightRequest) -> Result<()> {
        if !self.supports(&request.language) {
            return Err(anyhow!("unsupported language: {}", request.language));
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow!("tokenizer pool is shut down"))?;
        tx.send(request)
            .map_err(|_| anyhow!("tokenizer worker is gone"))?;
        self.pending += 1;
        Ok(())
    }

    /// Number of submitted requests not yet collected.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Collect a completion if one is ready.
    pub fn try_recv(&mut self) -> Option<HighlightBatch> {
        match self.rx.try_recv() {
            Ok(batch) => {
                self.pending = self.pending.saturating_sub(1);
                Some(batch)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("tokenizer worker disconnected");
                None
            }
        }
    }

    /// Block until the next completion arrives. Returns None when
    /// nothing is pending or the worker is gone.
    pub fn recv(&mut self) -> Option<HighlightBatch> {
        if self.pending == 0 {
            return None;
        }
        match self.rx.recv() {
            Ok(batch) => {
                self.pending -= 1;
                Some(batch)
            }
            Err(_) => {
                warn!("tokenizer worker disconnected");
                None
            }
        }
    }
}

impl Drop for TokenizerPool {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes each line uppercased, for exercising the pool plumbing.
    struct UpperTokenizer;

    impl Tokenizer for UpperTokenizer {
        fn languages(&self) -> Vec<LanguageId> {
            vec![LanguageId::new("upper")]
        }

        fn highlight(&mut self, _language: &LanguageId, source: &str) -> Vec<String> {
            source.split('\n').map(|l| l.to_uppercase()).collect()
        }
    }

    fn panel_id() -> NodeId {
        let mut dom = crate::dom::Dom::new("body");
        dom.create_element("div")
    }

    #[test]
    fn test_round_trip_alignment() {
        let mut pool = TokenizerPool::spawn(UpperTokenizer);
        let panel = panel_id();
        pool.submit(HighlightRequest {
            panel,
            language: LanguageId::new("upper"),
            source: "one\n\nthree".to_string(),
            line_count: 3,
        })
        .unwrap();

        let batch = pool.recv().unwrap();
        assert_eq!(batch.panel, panel);
        assert_eq!(batch.fragments, vec!["ONE", "", "THREE"]);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_fragments_padded_to_line_count() {
        let mut pool = TokenizerPool::spawn(UpperTokenizer);
        pool.submit(HighlightRequest {
            panel: panel_id(),
            language: LanguageId::new("upper"),
            source: "only".to_string(),
            line_count: 4,
        })
        .unwrap();

        let batch = pool.recv().unwrap();
        assert_eq!(batch.fragments.len(), 4);
        assert_eq!(batch.fragments[0], "ONLY");
        assert_eq!(batch.fragments[3], "");
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let mut pool = TokenizerPool::spawn(UpperTokenizer);
        assert!(!pool.supports(&LanguageId::new("xyz123")));
        let err = pool.submit(HighlightRequest {
            panel: panel_id(),
            language: LanguageId::new("xyz123"),
            source: String::new(),
            line_count: 0,
        });
        assert!(err.is_err());
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_recv_without_pending_is_none() {
        let mut pool = TokenizerPool::spawn(UpperTokenizer);
        assert!(pool.recv().is_none());
    }
}
