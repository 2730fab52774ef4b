//! Document storage for kbrelay.
//!
//! Each company is a folder under the knowledge-base root holding up to two
//! plain UTF-8 files: `companyinfo` (knowledge) and `policy`. Everything is
//! read from disk on every call; nothing is cached or indexed.
//!
//! Provides:
//! - **Sandboxing**: the only path composition is root + validated id + file name
//! - **Documents**: required knowledge reads, tagged optional policy reads,
//!   atomic overwrites
//! - **Discovery**: sorted listing of company folders

pub mod document;
pub mod sandbox;

pub use document::{CompanySummary, DocumentStore, PolicyRead};
pub use sandbox::sandboxed_join;
