//! The answer pipeline: resolve → load knowledge → answer → load policy →
//! sanitize.
//!
//! Each stage either hands its output to the next one or ends the run with
//! a `PipelineOutcome`. Nothing is retried, and no error escapes `run`:
//! callers always get an outcome they can render as text.
//!
//! At most two model calls are made, strictly one after the other, since
//! the sanitization input is the generated answer.

use kbrelay_core::{CompanyId, MatchResult, ProviderRequest, RelayError};
use kbrelay_store::PolicyRead;
use tracing::{debug, info, warn};

use crate::context::RelayContext;
use crate::prompts::{build_answer_prompt, build_sanitize_prompts};
use crate::resolver::CompanyResolver;

/// Matches below this confidence get a visible annotation on the answer.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 70.0;

/// Both model calls sample deterministically.
pub const PIPELINE_TEMPERATURE: f32 = 0.0;

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingCompany,
    LoadingKnowledge,
    GeneratingAnswer,
    LoadingPolicy,
    Sanitizing,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::ResolvingCompany => "resolving_company",
            Stage::LoadingKnowledge => "loading_knowledge",
            Stage::GeneratingAnswer => "generating_answer",
            Stage::LoadingPolicy => "loading_policy",
            Stage::Sanitizing => "sanitizing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a pipeline run ended. Carries either an answer or a diagnostic,
/// never both (the sanitization failure carries the unsanitized answer as
/// part of its diagnostic).
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The knowledge base holds no companies.
    NoCompanies,
    /// The knowledge root exists but could not be listed.
    KnowledgeBaseUnavailable { error: RelayError },
    /// The resolver picked nothing.
    NoMatch { known: Vec<String> },
    /// The knowledge document is missing or unreadable.
    KnowledgeUnavailable { company: String, error: RelayError },
    /// The answer model call failed.
    GenerationFailed { company: String, error: RelayError },
    /// No policy to apply; `warning` is set when the policy exists but
    /// could not be read.
    Unsanitized {
        company: String,
        answer: String,
        warning: Option<String>,
    },
    /// The sanitization model call failed.
    SanitizationFailed {
        company: String,
        answer: String,
        error: RelayError,
    },
    /// Answer generated and sanitized.
    Sanitized { company: String, answer: String },
}

impl PipelineOutcome {
    /// The company the run was about, once one was resolved.
    pub fn company(&self) -> Option<&str> {
        match self {
            Self::NoCompanies | Self::KnowledgeBaseUnavailable { .. } | Self::NoMatch { .. } => {
                None
            }
            Self::KnowledgeUnavailable { company, .. }
            | Self::GenerationFailed { company, .. }
            | Self::Unsanitized { company, .. }
            | Self::SanitizationFailed { company, .. }
            | Self::Sanitized { company, .. } => Some(company),
        }
    }

    /// True when the caller receives an answer rather than a diagnostic.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Unsanitized { .. } | Self::Sanitized { .. })
    }

    /// Short tag for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoCompanies => "no_companies",
            Self::KnowledgeBaseUnavailable { .. } => "knowledge_base_unavailable",
            Self::NoMatch { .. } => "no_match",
            Self::KnowledgeUnavailable { .. } => "knowledge_unavailable",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::Unsanitized { .. } => "unsanitized",
            Self::SanitizationFailed { .. } => "sanitization_failed",
            Self::Sanitized { .. } => "sanitized",
        }
    }

    /// The text handed to the caller.
    pub fn render(&self) -> String {
        match self {
            Self::NoCompanies => {
                "No companies are available in the knowledge base (0 companies found).".into()
            }
            Self::KnowledgeBaseUnavailable { error } => {
                format!("Error: the knowledge base could not be read ({error}).")
            }
            Self::NoMatch { known } => format!(
                "Could not determine which company the question is about. Available companies: {}.",
                known.join(", ")
            ),
            Self::KnowledgeUnavailable { company, error } => match error {
                RelayError::NotFound { .. } => {
                    format!("Error: company information for '{company}' was not found.")
                }
                other => format!(
                    "Error: company information for '{company}' was not found ({other})."
                ),
            },
            Self::GenerationFailed { error, .. } => format!("Model API error: {}", model_detail(error)),
            Self::Unsanitized {
                answer, warning, ..
            } => match warning {
                None => answer.clone(),
                Some(w) => format!("{answer}\n\n[Warning: {w}]"),
            },
            Self::SanitizationFailed { answer, error, .. } => format!(
                "Sanitization error: {}\n\nOriginal (unsanitized) answer:\n{answer}",
                model_detail(error)
            ),
            Self::Sanitized { answer, .. } => answer.clone(),
        }
    }
}

impl std::fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn model_detail(error: &RelayError) -> String {
    match error {
        RelayError::ModelCallFailure(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// Prefix a low-confidence answer with the match it was based on.
fn annotate(matched: &MatchResult, answer: String) -> String {
    if matched.confidence < LOW_CONFIDENCE_THRESHOLD {
        format!(
            "[Matched company '{}' with {:.0}% confidence]\n\n{answer}",
            matched.company, matched.confidence
        )
    } else {
        answer
    }
}

/// Runs the two-stage answer/sanitize flow for one question.
#[derive(Debug, Clone)]
pub struct AnswerPipeline {
    context: RelayContext,
    resolver: CompanyResolver,
}

impl AnswerPipeline {
    pub fn new(context: RelayContext) -> Self {
        Self {
            context,
            resolver: CompanyResolver::new(),
        }
    }

    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    pub fn resolver(&self) -> &CompanyResolver {
        &self.resolver
    }

    /// Answer `question`. Never fails; see `PipelineOutcome`.
    pub async fn run(&self, question: &str) -> PipelineOutcome {
        let outcome = self.run_stages(question).await;
        if outcome.is_answer() {
            info!(
                outcome = outcome.label(),
                company = outcome.company().unwrap_or("-"),
                "Question answered"
            );
        } else {
            warn!(
                outcome = outcome.label(),
                company = outcome.company().unwrap_or("-"),
                "Question not answered"
            );
        }
        outcome
    }

    async fn run_stages(&self, question: &str) -> PipelineOutcome {
        let store = &self.context.store;

        // ── Resolving ──
        debug!(stage = %Stage::ResolvingCompany, question_len = question.len());
        let companies = match store.list_companies().await {
            Ok(c) => c,
            Err(error) => return PipelineOutcome::KnowledgeBaseUnavailable { error },
        };
        if companies.is_empty() {
            return PipelineOutcome::NoCompanies;
        }
        let Some(matched) = self.resolver.resolve(question, &companies) else {
            return PipelineOutcome::NoMatch {
                known: companies.into_iter().collect(),
            };
        };
        let company = matched.company.clone();

        // ── Loading knowledge ──
        debug!(stage = %Stage::LoadingKnowledge, company = %company, confidence = matched.confidence);
        let id = match CompanyId::parse(&company) {
            Ok(id) => id,
            Err(error) => return PipelineOutcome::KnowledgeUnavailable { company, error },
        };
        let knowledge = match store.read_knowledge(&id).await {
            Ok(text) => text,
            Err(error) => return PipelineOutcome::KnowledgeUnavailable { company, error },
        };

        // ── Generating ──
        debug!(stage = %Stage::GeneratingAnswer, company = %company, knowledge_len = knowledge.len());
        let answer = match self.complete(build_answer_prompt(&knowledge), question).await {
            Ok(text) => annotate(&matched, text),
            Err(error) => return PipelineOutcome::GenerationFailed { company, error },
        };

        // ── Loading policy ──
        debug!(stage = %Stage::LoadingPolicy, company = %company);
        let policy = match store.read_policy(&id).await {
            PolicyRead::Present(text) => text,
            PolicyRead::Absent => {
                return PipelineOutcome::Unsanitized {
                    company,
                    answer,
                    warning: None,
                };
            }
            PolicyRead::ReadError(reason) => {
                return PipelineOutcome::Unsanitized {
                    warning: Some(format!(
                        "the policy for '{company}' could not be read ({reason}); this answer was not sanitized"
                    )),
                    company,
                    answer,
                };
            }
        };

        // ── Sanitizing ──
        debug!(stage = %Stage::Sanitizing, company = %company, policy_len = policy.len());
        let prompts = build_sanitize_prompts(&policy, &answer);
        match self.complete(prompts.system, &prompts.user).await {
            Ok(sanitized) => PipelineOutcome::Sanitized {
                company,
                answer: sanitized,
            },
            Err(error) => PipelineOutcome::SanitizationFailed {
                company,
                answer,
                error,
            },
        }
    }

    async fn complete(&self, system: String, user: &str) -> Result<String, RelayError> {
        let request = ProviderRequest::system_user(
            self.context.model.clone(),
            system,
            user,
            PIPELINE_TEMPERATURE,
        )
        .with_max_tokens(self.context.max_tokens);

        let response = self.context.provider.complete(request).await?;
        Ok(response.message.content)
    }
}
