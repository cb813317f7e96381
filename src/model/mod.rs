//! Data model for transcripts, parsed chats, and rendered outputs.
//!
//! [`RawEvent`], [`ContentBlock`], [`ConversationTurn`] and [`ChatDocument`]
//! live for a single run. [`ChatRecord`] describes a page on disk and is
//! reconstructed from the output tree on every run.

pub mod content;
pub mod document;
pub mod event;
pub mod record;

pub use content::*;
pub use document::*;
pub use event::*;
pub use record::*;
