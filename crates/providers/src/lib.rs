//! LLM Provider implementations for kbrelay.
//!
//! All providers implement the `kbrelay_core::Provider` trait.
//! `build_from_config` turns an `AppConfig` into a ready provider handle.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{UnconfiguredProvider, build_from_config, build_or_unconfigured};
