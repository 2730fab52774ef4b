//! Company resolution: which company folder is this question about?
//!
//! Every candidate gets four sub-scores and keeps the best one:
//!
//! - partial similarity of the whole question against the company name
//! - token-sorted similarity of the same pair
//! - the best partial similarity of any question keyword against the name
//! - a flat bonus when a word of the name (split on `_`) appears verbatim
//!
//! The highest-scoring candidate wins if it reaches `MATCH_THRESHOLD`.
//! Otherwise the first company in sorted order is returned with zero
//! confidence, so a non-empty knowledge base always yields a company.

use std::collections::BTreeSet;

use kbrelay_core::MatchResult;
use serde::Serialize;
use tracing::debug;

use crate::fuzzy::{partial_ratio, token_sort_ratio};

/// Minimum score for a genuine match.
pub const MATCH_THRESHOLD: f64 = 50.0;

/// Score granted when a name word appears verbatim in the question.
pub const NAME_MENTION_BONUS: f64 = 90.0;

/// Keywords shorter than this are ignored.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Name words shorter than this never earn the mention bonus.
pub const MIN_BONUS_WORD_LEN: usize = 4;

/// Words that carry no information about which company is meant.
pub const STOP_WORDS: &[&str] = &[
    // articles, conjunctions, prepositions
    "the", "and", "but", "for", "with", "from", "into", "about", "over", "under", "than",
    "then", "this", "that", "these", "those", "there", "here", "any", "some", "all",
    // auxiliaries and question words
    "are", "was", "were", "been", "being", "does", "did", "have", "has", "had", "can",
    "could", "will", "would", "should", "shall", "may", "might", "must", "what", "which",
    "who", "whom", "whose", "when", "where", "why", "how",
    // pronouns and request filler
    "you", "your", "our", "ours", "its", "their", "they", "them", "tell", "please",
    "give", "know", "show", "explain", "describe",
    // domain filler
    "company", "companies", "information", "info", "details", "detail", "regarding",
    "business", "organization", "firm",
];

/// Sub-scores for one candidate; `total` is their maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub company: String,
    pub partial: f64,
    pub token_sort: f64,
    pub keyword: f64,
    pub bonus: f64,
    pub total: f64,
}

/// Picks the company a question refers to.
#[derive(Debug, Clone)]
pub struct CompanyResolver {
    stop_words: BTreeSet<&'static str>,
}

impl Default for CompanyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanyResolver {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Resolve `question` against `companies`.
    ///
    /// `None` only when `companies` is empty.
    pub fn resolve(&self, question: &str, companies: &BTreeSet<String>) -> Option<MatchResult> {
        self.select(&self.score_all(question, companies))
    }

    /// Pick the match from scores already computed by `score_all`, in the
    /// same order.
    pub fn select(&self, scores: &[ScoreBreakdown]) -> Option<MatchResult> {
        let first = &scores.first()?.company;

        let mut best: Option<&ScoreBreakdown> = None;
        for candidate in scores {
            // Strict comparison: the first of equal scores wins.
            if candidate.total > best.map_or(0.0, |b| b.total) {
                best = Some(candidate);
            }
        }

        match best {
            Some(b) if b.total >= MATCH_THRESHOLD => {
                debug!(company = %b.company, score = b.total, "Company matched");
                Some(MatchResult::new(b.company.clone(), b.total))
            }
            _ => {
                debug!(
                    company = %first,
                    best = best.map_or(0.0, |b| b.total),
                    "No confident match, defaulting to first company"
                );
                Some(MatchResult::new(first.clone(), 0.0))
            }
        }
    }

    /// Score every candidate, in the set's order.
    pub fn score_all(&self, question: &str, companies: &BTreeSet<String>) -> Vec<ScoreBreakdown> {
        let question = question.to_lowercase();
        let keywords = self.keywords(&question);
        companies
            .iter()
            .map(|company| Self::score(&question, &keywords, company))
            .collect()
    }

    /// Informative lowercased words of `question`, followed by the whole
    /// lowercased question itself.
    pub fn keywords(&self, question: &str) -> Vec<String> {
        let lowered = question.to_lowercase();
        let mut keywords: Vec<String> = Vec::new();

        for token in lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
            .filter(|t| !self.stop_words.contains(*t))
        {
            if !keywords.iter().any(|k| k == token) {
                keywords.push(token.to_string());
            }
        }

        keywords.push(lowered);
        keywords
    }

    fn score(question: &str, keywords: &[String], company: &str) -> ScoreBreakdown {
        let name = company.to_lowercase();

        let partial = partial_ratio(question, &name);
        let token_sort = token_sort_ratio(question, &name);
        let keyword = keywords
            .iter()
            .map(|k| partial_ratio(k, &name))
            .fold(0.0, f64::max);
        let bonus = if name
            .split('_')
            .filter(|w| w.chars().count() >= MIN_BONUS_WORD_LEN)
            .any(|w| question.contains(w))
        {
            NAME_MENTION_BONUS
        } else {
            0.0
        };

        let total = partial.max(token_sort).max(keyword).max(bonus);

        ScoreBreakdown {
            company: company.to_string(),
            partial,
            token_sort,
            keyword,
            bonus,
            total,
        }
    }
}
