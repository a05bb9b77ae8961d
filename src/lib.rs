//! adorn - syntax-highlight overlay engine for pre-rendered diff views
//!
//! This crate takes a host application's already-rendered, line-oriented
//! diff markup and overlays syntax highlighting onto it without ever
//! editing the host's nodes in place: each line gets a highlighted
//! sibling clone and the original is hidden, never deleted.

pub mod config;
pub mod config_paths;
pub mod dom;
pub mod engine;
pub mod extract;
pub mod languages;
pub mod reconcile;
pub mod scheduler;
pub mod schema;
pub mod theme;
pub mod tokenizer;
pub mod trace;

// Re-export commonly used types
pub use config::EngineConfig;
pub use dom::{Dom, NodeId};
pub use engine::{EngineStats, OverlayEngine};
pub use languages::{LanguageId, LanguageResolver};
pub use schema::HostSchema;
pub use theme::{Palette, ThemeSelector};
pub use tokenizer::{Tokenizer, TokenizerPool, TreeSitterTokenizer};
