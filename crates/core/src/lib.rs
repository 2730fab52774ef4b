//! # kbrelay Core
//!
//! Domain types, traits, and error definitions for the kbrelay company
//! knowledge relay. This crate does no I/O; it defines the model that the
//! store, provider, relay, and gateway crates implement against.
//!
//! ## Design Philosophy
//!
//! The LLM backend is a trait (`Provider`) so the answer pipeline can be
//! exercised with scripted providers in tests, and the company identifier is
//! a validated newtype (`CompanyId`) so no unchecked string ever reaches a
//! filesystem path.

pub mod company;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use company::{CompanyId, DocumentKind, MatchResult};
pub use error::{ProviderError, RelayError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
