//! code-chat-viewer: Claude Code transcripts as self-contained HTML pages.
//!
//! Every JSONL transcript under the Claude Code projects directory becomes
//! one HTML page with inline styles and scripts, and a dashboard lists all
//! chats with sorting, filtering and category toggles. Runs are incremental:
//! only new or changed transcripts are rendered, and inactive chats are
//! moved into short and archive folders.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use code_chat_viewer::{config::Config, sync::SyncRunner};
//!
//! fn main() -> code_chat_viewer::Result<()> {
//!     let summary = SyncRunner::new(Config::load()?).run(chrono::Utc::now())?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`parser`]: lenient JSONL parsing and event filtering
//! - [`model`]: events, content blocks, documents and dashboard rows
//! - [`export`]: page and dashboard HTML
//! - [`discovery`]: transcript scanning
//! - [`layout`]: the output tree
//! - [`organize`]: activity classification and page moves
//! - [`dashboard`]: dashboard aggregation and enrichment
//! - [`sync`]: change detection and the batch run
//! - [`api`]: narrow entry points for library use
//! - [`cli`]: command-line interface
//! - [`config`]: configuration
//! - [`error`]: error types

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod discovery;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod organize;
pub mod parser;
pub mod sync;
pub mod util;

pub use error::{Result, ViewerError};
