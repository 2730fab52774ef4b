//! Path sandboxing for company documents.
//!
//! `sandboxed_join` is the single place a document path is composed. It only
//! accepts a `CompanyId`, which has already rejected empty names, separators
//! and `..`, and it re-checks that the joined path has exactly two normal
//! components below the root.

use std::path::{Component, Path, PathBuf};

use kbrelay_core::{CompanyId, DocumentKind, RelayError, Result};

/// Join `root / company / kind.file_name()`.
///
/// Pure: touches no filesystem state.
pub fn sandboxed_join(root: &Path, company: &CompanyId, kind: DocumentKind) -> Result<PathBuf> {
    let relative = Path::new(company.as_str()).join(kind.file_name());

    let mut normal = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => normal += 1,
            _ => {
                return Err(RelayError::InvalidIdentifier {
                    id: company.to_string(),
                    reason: "identifier escapes the knowledge root".into(),
                });
            }
        }
    }

    // `CompanyId::parse` should make this unreachable; platform quirks
    // (drive prefixes, `.`) are caught here instead of at the filesystem.
    if normal != 2 {
        return Err(RelayError::InvalidIdentifier {
            id: company.to_string(),
            reason: "identifier must be a single path segment".into(),
        });
    }

    Ok(root.join(relative))
}

/// Directory of a company inside `root`.
pub fn company_dir(root: &Path, company: &CompanyId) -> Result<PathBuf> {
    let file = sandboxed_join(root, company, DocumentKind::Knowledge)?;
    Ok(file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(company.as_str())))
}
