//! The request façade — the only surface transports talk to.
//!
//! `ask` always yields text. The policy operations yield a `Reply` so the
//! gateway can pick a status code, but their failures are still plain
//! messages: no `RelayError` crosses this boundary.

use kbrelay_core::{CompanyId, DocumentKind, MatchResult, RelayError};
use kbrelay_store::{CompanySummary, PolicyRead};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RelayContext;
use crate::pipeline::AnswerPipeline;
use crate::resolver::ScoreBreakdown;

/// Reply to an empty question. No model call is made for it.
pub const EMPTY_QUESTION_REPLY: &str = "Please provide a question to answer.";

/// Why a policy operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The caller sent something unusable (bad company id, no company).
    Validation,
    /// The filesystem refused.
    Storage,
}

impl From<&RelayError> for FailureKind {
    fn from(e: &RelayError) -> Self {
        match e {
            RelayError::InvalidIdentifier { .. } | RelayError::Validation(_) => Self::Validation,
            _ => Self::Storage,
        }
    }
}

/// Outcome of a policy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok { company: String, text: String },
    Failed { kind: FailureKind, error: String },
}

impl Reply {
    fn failed(e: &RelayError) -> Self {
        Self::Failed {
            kind: e.into(),
            error: e.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The content or message on success, the error otherwise.
    pub fn text(&self) -> &str {
        match self {
            Self::Ok { text, .. } => text,
            Self::Failed { error, .. } => error,
        }
    }
}

/// Resolver output with the per-candidate scores behind it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub matched: Option<MatchResult>,
    pub scores: Vec<ScoreBreakdown>,
}

/// Wraps the pipeline and the store for the transports.
#[derive(Debug, Clone)]
pub struct RequestFacade {
    pipeline: AnswerPipeline,
}

impl RequestFacade {
    pub fn new(context: RelayContext) -> Self {
        Self {
            pipeline: AnswerPipeline::new(context),
        }
    }

    pub fn context(&self) -> &RelayContext {
        self.pipeline.context()
    }

    /// Answer a question. Always returns text.
    pub async fn ask(&self, question: &str) -> String {
        if question.trim().is_empty() {
            return EMPTY_QUESTION_REPLY.to_string();
        }
        self.pipeline.run(question).await.render()
    }

    /// Current policy text; empty when the company has none yet.
    pub async fn load_policy(&self, company: Option<&str>) -> Reply {
        let id = match self.target_company(company).await {
            Ok(id) => id,
            Err(e) => return Reply::failed(&e),
        };

        match self.context().store.read_policy(&id).await {
            PolicyRead::Present(text) => Reply::Ok {
                company: id.to_string(),
                text,
            },
            PolicyRead::Absent => Reply::Ok {
                company: id.to_string(),
                text: String::new(),
            },
            PolicyRead::ReadError(reason) => Reply::Failed {
                kind: FailureKind::Storage,
                error: format!("Could not read policy for '{id}': {reason}"),
            },
        }
    }

    /// Overwrite the policy text of a company, creating its folder if needed.
    pub async fn save_policy(&self, company: Option<&str>, content: &str) -> Reply {
        let id = match self.target_company(company).await {
            Ok(id) => id,
            Err(e) => return Reply::failed(&e),
        };

        match self
            .context()
            .store
            .write(&id, DocumentKind::Policy, content)
            .await
        {
            Ok(()) => {
                info!(company = %id, bytes = content.len(), "Policy saved");
                Reply::Ok {
                    company: id.to_string(),
                    text: format!("Policy for '{id}' saved successfully."),
                }
            }
            Err(e) => {
                warn!(company = %id, error = %e, "Policy save failed");
                Reply::failed(&e)
            }
        }
    }

    /// Every company with the documents it holds.
    pub async fn companies(&self) -> Result<Vec<CompanySummary>, RelayError> {
        let store = &self.context().store;
        let mut summaries = Vec::new();
        for name in store.list_companies().await? {
            let id = CompanyId::parse(&name)?;
            summaries.push(store.company_summary(&id).await?);
        }
        Ok(summaries)
    }

    /// Run only the resolver, without touching the model.
    pub async fn resolve(&self, question: &str) -> Result<Resolution, RelayError> {
        let companies = self.context().store.list_companies().await?;
        let resolver = self.pipeline.resolver();
        let scores = resolver.score_all(question, &companies);
        Ok(Resolution {
            matched: resolver.select(&scores),
            scores,
        })
    }

    /// The named company, or the first one on disk when none is named.
    async fn target_company(&self, company: Option<&str>) -> Result<CompanyId, RelayError> {
        match company {
            Some(raw) if !raw.trim().is_empty() => CompanyId::parse(raw),
            _ => {
                let companies = self.context().store.list_companies().await?;
                match companies.iter().next() {
                    Some(first) => CompanyId::parse(first),
                    None => Err(RelayError::Validation(
                        "no company given and the knowledge base is empty".into(),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, fixture, put};
    use std::sync::Arc;

    fn facade() -> (tempfile::TempDir, RequestFacade, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let (dir, ctx) = fixture(provider.clone());
        (dir, RequestFacade::new(ctx), provider)
    }

    #[tokio::test]
    async fn empty_question_skips_the_model() {
        let (_dir, facade, provider) = facade();
        assert_eq!(facade.ask("   ").await, EMPTY_QUESTION_REPLY);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn ask_with_no_companies_is_a_diagnostic() {
        let (_dir, facade, provider) = facade();
        let text = facade.ask("What is Acme's refund policy?").await;
        assert!(text.contains("0 companies"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_dir, facade, _) = facade();
        let content = "Line one\n\nNo salaries. Ünïcødé ✓\n";
        let saved = facade.save_policy(Some("Acme"), content).await;
        assert!(saved.is_success(), "{saved:?}");
        assert!(saved.text().contains("saved successfully"));

        let loaded = facade.load_policy(Some("Acme")).await;
        assert_eq!(
            loaded,
            Reply::Ok {
                company: "Acme".into(),
                text: content.into(),
            }
        );
    }

    #[tokio::test]
    async fn load_missing_policy_is_empty_not_error() {
        let (dir, facade, _) = facade();
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        let reply = facade.load_policy(Some("Acme")).await;
        assert!(reply.is_success());
        assert_eq!(reply.text(), "");
    }

    #[tokio::test]
    async fn traversal_ids_are_validation_failures() {
        let (dir, facade, _) = facade();
        for bad in ["../etc", "a/b", "a\\b", ".."] {
            let reply = facade.save_policy(Some(bad), "x").await;
            assert!(
                matches!(
                    reply,
                    Reply::Failed {
                        kind: FailureKind::Validation,
                        ..
                    }
                ),
                "{bad}: {reply:?}"
            );
            assert!(matches!(
                facade.load_policy(Some(bad)).await,
                Reply::Failed {
                    kind: FailureKind::Validation,
                    ..
                }
            ));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn omitted_company_defaults_to_first() {
        let (_dir, facade, _) = facade();
        put(&facade.context().store, "Nexus", DocumentKind::Policy, "n").await;
        put(&facade.context().store, "Acme", DocumentKind::Policy, "a").await;

        let reply = facade.load_policy(None).await;
        assert_eq!(
            reply,
            Reply::Ok {
                company: "Acme".into(),
                text: "a".into(),
            }
        );
    }

    #[tokio::test]
    async fn omitted_company_with_empty_base_fails_validation() {
        let (_dir, facade, _) = facade();
        let reply = facade.save_policy(None, "x").await;
        assert!(matches!(
            reply,
            Reply::Failed {
                kind: FailureKind::Validation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreadable_policy_is_storage_failure() {
        let (dir, facade, _) = facade();
        std::fs::create_dir_all(dir.path().join("Acme").join("policy")).unwrap();
        let reply = facade.load_policy(Some("Acme")).await;
        assert!(matches!(
            reply,
            Reply::Failed {
                kind: FailureKind::Storage,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn companies_report_documents() {
        let (_dir, facade, _) = facade();
        put(&facade.context().store, "Acme", DocumentKind::Knowledge, "k").await;
        put(&facade.context().store, "Nexus", DocumentKind::Policy, "p").await;

        let companies = facade.companies().await.unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "Acme");
        assert!(companies[0].has_knowledge && !companies[0].has_policy);
        assert!(!companies[1].has_knowledge && companies[1].has_policy);
    }

    #[tokio::test]
    async fn resolve_reports_scores_without_model_calls() {
        let (_dir, facade, provider) = facade();
        put(&facade.context().store, "Acme", DocumentKind::Knowledge, "k").await;
        put(&facade.context().store, "Nexus", DocumentKind::Knowledge, "k").await;

        let resolution = facade.resolve("What is Acme's refund policy?").await.unwrap();
        assert_eq!(resolution.matched.unwrap().company, "Acme");
        assert_eq!(resolution.scores.len(), 2);
        assert_eq!(provider.calls(), 0);
    }
}
