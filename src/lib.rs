/*!
 * promptree - Select files from a directory tree and snapshot them for LLM prompts
 *
 * Lists directories lazily and page by page, honours ignore rules, keeps a
 * persistent tri-state selection, and assembles the selected files into one
 * bounded Markdown document.
 */

pub mod api;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod matcher;
pub mod render;
pub mod report;
pub mod scanner;
pub mod selection;
pub mod types;
pub mod utils;
pub mod writer;


// Re-export main components for easier access
pub use api::{Api, ApiResponse, CopyRequest, TreeQuery, TreeResponse};
pub use config::Config;
pub use error::{PromptreeError, Result};
pub use matcher::IgnoreMatcher;
pub use render::ContentRenderer;
pub use report::{ReportFormat, Reporter, SnapshotReport};
pub use scanner::Scanner;
pub use selection::{SelectionModel, SelectionStore, TreeSource};
pub use types::{ChildPage, Node, NoteKind, ParentInfo, RenderedText};
pub use writer::MarkdownWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
