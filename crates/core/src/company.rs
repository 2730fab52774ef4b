//! Company, document and match-result value types.
//!
//! A company is nothing more than a folder name under the knowledge-base
//! root. `CompanyId` is the only way to hold one, so every path the store
//! derives has already passed the sandboxing rule.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// A validated company identifier.
///
/// Non-empty, and free of `/`, `\` and `..`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompanyId(String);

impl CompanyId {
    /// Validate a raw identifier. Surrounding whitespace is trimmed first.
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();

        let reason = if id.is_empty() {
            Some("identifier is empty")
        } else if id.contains('/') {
            Some("contains '/'")
        } else if id.contains('\\') {
            Some("contains '\\'")
        } else if id.contains("..") {
            Some("contains '..'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RelayError::InvalidIdentifier {
                id: raw.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(Self(id.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CompanyId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        CompanyId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The two documents a company folder can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Source text answers must be grounded in. Required for `ask`.
    Knowledge,
    /// Redaction rules applied to the answer. Optional.
    Policy,
}

impl DocumentKind {
    /// File name of this document inside the company folder.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Knowledge => "companyinfo",
            Self::Policy => "policy",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Knowledge => f.write_str("knowledge"),
            Self::Policy => f.write_str("policy"),
        }
    }
}

/// Outcome of matching a question against the known companies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The chosen company (raw folder name).
    pub company: String,
    /// Match strength in `[0, 100]`. Zero marks a forced default.
    pub confidence: f64,
}

impl MatchResult {
    pub fn new(company: impl Into<String>, confidence: f64) -> Self {
        Self {
            company: company.into(),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// True when the resolver fell back to the first company.
    pub fn is_forced_default(&self) -> bool {
        self.confidence == 0.0
    }
}
