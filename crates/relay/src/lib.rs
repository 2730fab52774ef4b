//! Company resolution and the answer pipeline — the decision-making core of
//! kbrelay.
//!
//! # Flow
//!
//! 1. List company folders and pick the one the question is about
//!    (`resolver`, built on the `fuzzy` similarity scores)
//! 2. Load that company's knowledge document
//! 3. Ask the model for an answer grounded only in that text (`prompts`)
//! 4. Load the company's policy document, if any
//! 5. Ask the model to redact the answer according to the policy
//!
//! Every failure along the way ends the run with a textual diagnostic
//! (`pipeline::PipelineOutcome`); `facade::RequestFacade` is the surface the
//! transports call.

pub mod context;
pub mod facade;
pub mod fuzzy;
pub mod pipeline;
pub mod prompts;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::RelayContext;
pub use facade::{EMPTY_QUESTION_REPLY, FailureKind, Reply, RequestFacade, Resolution};
pub use pipeline::{AnswerPipeline, LOW_CONFIDENCE_THRESHOLD, PipelineOutcome, Stage};
pub use prompts::{SanitizePrompts, build_answer_prompt, build_sanitize_prompts};
pub use resolver::{CompanyResolver, ScoreBreakdown};
