//! The document store: per-company knowledge and policy files.
//!
//! Reads never create anything on disk. Directory creation is the explicit
//! `ensure_company_dir` operation, which `write` calls before writing.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kbrelay_core::{CompanyId, DocumentKind, RelayError, Result};
use tracing::{debug, warn};

use crate::sandbox::{company_dir, sandboxed_join};

/// Result of reading an optional policy document.
///
/// `Absent` and `ReadError` are deliberately distinct: the answer pipeline
/// treats a missing policy silently but warns on any other failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRead {
    Present(String),
    Absent,
    ReadError(String),
}

/// Which documents a company folder currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySummary {
    pub name: String,
    pub has_knowledge: bool,
    pub has_policy: bool,
}

/// Sandboxed access to `root/<company>/<document>`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a company document. Pure; see `ensure_company_dir`.
    pub fn resolve_path(&self, company: &CompanyId, kind: DocumentKind) -> Result<PathBuf> {
        sandboxed_join(&self.root, company, kind)
    }

    /// Create the company folder if it does not exist. Idempotent.
    pub async fn ensure_company_dir(&self, company: &CompanyId) -> Result<PathBuf> {
        let dir = company_dir(&self.root, company)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error(&dir, &e))?;
        Ok(dir)
    }

    /// Read a document, failing with `NotFound` if it is absent.
    pub async fn read(&self, company: &CompanyId, kind: DocumentKind) -> Result<String> {
        let path = self.resolve_path(company, kind)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!(company = %company, kind = %kind, bytes = text.len(), "Document read");
                Ok(text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RelayError::NotFound {
                company: company.to_string(),
                kind,
            }),
            Err(e) => Err(storage_error(&path, &e)),
        }
    }

    /// Read the knowledge document (required for answering).
    pub async fn read_knowledge(&self, company: &CompanyId) -> Result<String> {
        self.read(company, DocumentKind::Knowledge).await
    }

    /// Read the policy document, tagging absence separately from failure.
    pub async fn read_policy(&self, company: &CompanyId) -> PolicyRead {
        match self.read(company, DocumentKind::Policy).await {
            Ok(text) => PolicyRead::Present(text),
            Err(RelayError::NotFound { .. }) => PolicyRead::Absent,
            Err(e) => {
                warn!(company = %company, error = %e, "Policy document unreadable");
                PolicyRead::ReadError(e.to_string())
            }
        }
    }

    /// Overwrite a document atomically.
    ///
    /// The text goes to a temporary sibling first and is renamed over the
    /// target, so readers observe either the previous or the new content.
    pub async fn write(&self, company: &CompanyId, kind: DocumentKind, text: &str) -> Result<()> {
        let path = self.resolve_path(company, kind)?;
        self.ensure_company_dir(company).await?;

        let tmp = path.with_file_name(format!(
            ".{}.{}.tmp",
            kind.file_name(),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = tokio::fs::write(&tmp, text).await {
            return Err(storage_error(&tmp, &e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage_error(&path, &e));
        }

        debug!(company = %company, kind = %kind, bytes = text.len(), "Document written");
        Ok(())
    }

    /// Company folders under the root, sorted lexicographically.
    ///
    /// Missing root yields an empty set. Entries that are not directories or
    /// whose names fail identifier validation are skipped.
    pub async fn list_companies(&self) -> Result<BTreeSet<String>> {
        let mut companies = BTreeSet::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Knowledge root absent");
                return Ok(companies);
            }
            Err(e) => return Err(storage_error(&self.root, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(&self.root, &e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(entry = ?entry.file_name(), "Skipping non-UTF-8 company folder");
                continue;
            };

            match CompanyId::parse(&name) {
                Ok(id) if id.as_str() == name => {
                    companies.insert(name);
                }
                _ => debug!(folder = %name, "Skipping folder with invalid company name"),
            }
        }

        Ok(companies)
    }

    /// Report which documents a company holds.
    pub async fn company_summary(&self, company: &CompanyId) -> Result<CompanySummary> {
        let knowledge = self.resolve_path(company, DocumentKind::Knowledge)?;
        let policy = self.resolve_path(company, DocumentKind::Policy)?;
        Ok(CompanySummary {
            name: company.to_string(),
            has_knowledge: is_file(&knowledge).await,
            has_policy: is_file(&policy).await,
        })
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn storage_error(path: &Path, e: &std::io::Error) -> RelayError {
    RelayError::Storage {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(raw: &str) -> CompanyId {
        CompanyId::parse(raw).unwrap()
    }

    fn store() -> (TempDir, DocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn policy_round_trip_is_byte_identical() {
        let (_dir, store) = store();
        let content = "No emails.\r\nNo salaries — ever.\n\tÜnïcødé ✓\n";
        store
            .write(&id("Acme"), DocumentKind::Policy, content)
            .await
            .unwrap();
        let back = store.read(&id("Acme"), DocumentKind::Policy).await.unwrap();
        assert_eq!(back.as_bytes(), content.as_bytes());
    }

    #[tokio::test]
    async fn write_creates_company_dir_and_overwrites() {
        let (dir, store) = store();
        store
            .write(&id("Nexus"), DocumentKind::Policy, "v1")
            .await
            .unwrap();
        store
            .write(&id("Nexus"), DocumentKind::Policy, "v2")
            .await
            .unwrap();

        assert!(dir.path().join("Nexus").is_dir());
        assert_eq!(
            store.read(&id("Nexus"), DocumentKind::Policy).await.unwrap(),
            "v2"
        );

        // No temporary files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("Nexus"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn missing_knowledge_is_not_found() {
        let (_dir, store) = store();
        let err = store.read_knowledge(&id("Acme")).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::NotFound {
                kind: DocumentKind::Knowledge,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn reads_do_not_create_directories() {
        let (dir, store) = store();
        let _ = store.read_knowledge(&id("Ghost")).await;
        let _ = store.read_policy(&id("Ghost")).await;
        let _ = store.resolve_path(&id("Ghost"), DocumentKind::Policy).unwrap();
        assert!(!dir.path().join("Ghost").exists());
    }

    #[tokio::test]
    async fn ensure_company_dir_is_idempotent() {
        let (dir, store) = store();
        let first = store.ensure_company_dir(&id("Acme")).await.unwrap();
        let second = store.ensure_company_dir(&id("Acme")).await.unwrap();
        assert_eq!(first, second);
        assert!(dir.path().join("Acme").is_dir());
    }

    #[tokio::test]
    async fn policy_absent_vs_unreadable() {
        let (dir, store) = store();
        assert_eq!(store.read_policy(&id("Acme")).await, PolicyRead::Absent);

        // A directory where the policy file should be cannot be read as text.
        std::fs::create_dir_all(dir.path().join("Acme").join("policy")).unwrap();
        assert!(matches!(
            store.read_policy(&id("Acme")).await,
            PolicyRead::ReadError(_)
        ));
    }

    #[tokio::test]
    async fn policy_present() {
        let (_dir, store) = store();
        store
            .write(&id("Acme"), DocumentKind::Policy, "Redact names")
            .await
            .unwrap();
        assert_eq!(
            store.read_policy(&id("Acme")).await,
            PolicyRead::Present("Redact names".into())
        );
    }

    #[tokio::test]
    async fn list_companies_sorted_dirs_only() {
        let (dir, store) = store();
        for name in ["nexus", "Acme", "beta"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("README"), "not a company").unwrap();

        let companies: Vec<String> = store.list_companies().await.unwrap().into_iter().collect();
        assert_eq!(companies, vec!["Acme", "beta", "nexus"]);
    }

    #[tokio::test]
    async fn list_companies_missing_root_is_empty() {
        let store = DocumentStore::new("/nonexistent/kbrelay/root");
        assert!(store.list_companies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_companies_skips_invalid_names() {
        let (dir, store) = store();
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        std::fs::create_dir_all(dir.path().join("weird..name")).unwrap();
        std::fs::create_dir_all(dir.path().join(" padded ")).unwrap();
        let companies: Vec<String> = store.list_companies().await.unwrap().into_iter().collect();
        assert_eq!(companies, vec!["Acme"]);
    }

    #[tokio::test]
    async fn summary_reports_document_presence() {
        let (_dir, store) = store();
        store
            .write(&id("Acme"), DocumentKind::Knowledge, "facts")
            .await
            .unwrap();
        let summary = store.company_summary(&id("Acme")).await.unwrap();
        assert_eq!(
            summary,
            CompanySummary {
                name: "Acme".into(),
                has_knowledge: true,
                has_policy: false,
            }
        );
    }
}
