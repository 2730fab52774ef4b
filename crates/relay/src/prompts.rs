//! Prompt construction for the two model calls.
//!
//! Pure functions of their inputs: no I/O, no model calls, so prompt content
//! can be tested directly.

/// The exact sentence the model must use when the knowledge text has no
/// answer.
pub const NOT_AVAILABLE_REPLY: &str =
    "I'm sorry, that information is not available in our current document.";

/// Redaction categories applied even when the policy text names none.
pub const BASELINE_REDACTION_CATEGORIES: &[&str] = &[
    "personal names of private individuals",
    "contact information (email addresses, phone numbers, street addresses)",
    "credentials (passwords, API keys, access tokens, account numbers used for login)",
    "financial data (salaries, bank or card numbers, non-public revenue figures)",
    "health and medical data",
];

/// System and user messages for the sanitization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePrompts {
    pub system: String,
    pub user: String,
}

/// System prompt for grounded answering.
///
/// Embeds `knowledge` verbatim between fixed delimiters.
pub fn build_answer_prompt(knowledge: &str) -> String {
    format!(
        "You are an authorized company information assistant.\n\
         Below is the internal documentation for the company in question.\n\
         \n\
         ### INTERNAL DOCUMENTATION:\n\
         {knowledge}\n\
         ### END OF DOCUMENTATION\n\
         \n\
         INSTRUCTIONS:\n\
         1. Answer the user's question using ONLY the documentation provided above.\n\
         2. If the documentation does not contain the answer, reply exactly: \"{NOT_AVAILABLE_REPLY}\"\n\
         3. Do not mention that you are an AI or that you are reading from a document or text excerpt.\n\
         4. Be professional and concise.\n"
    )
}

/// System and user prompts for the policy-constrained redaction pass.
pub fn build_sanitize_prompts(policy: &str, candidate_answer: &str) -> SanitizePrompts {
    let categories = BASELINE_REDACTION_CATEGORIES
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    let system = format!(
        "You are a compliance reviewer. You receive a draft answer that is about to be \
         shown to an external user, and you must remove anything the company policy \
         does not allow to be disclosed.\n\
         \n\
         ### COMPANY POLICY:\n\
         {policy}\n\
         ### END OF POLICY\n\
         \n\
         Always redact the following, in addition to every category the policy lists:\n\
         {categories}\n\
         \n\
         REDACTION RULES:\n\
         1. Replace each distinct person with a stable placeholder: Person_A, Person_B, and so on.\n\
         2. Mask contact details while keeping their shape, e.g. j***@***.com or +1-***-***-1234.\n\
         3. Replace credentials, financial figures and health details with [REDACTED].\n\
         4. Keep everything else unchanged: wording, order, lists, line breaks and formatting.\n\
         5. If nothing needs redacting, return the draft exactly as given.\n"
    );

    let user = format!(
        "Sanitize the following draft answer according to the policy.\n\
         Return ONLY the sanitized text, with no commentary, preamble or explanation.\n\
         \n\
         ### DRAFT ANSWER:\n\
         {candidate_answer}\n\
         ### END OF DRAFT ANSWER"
    );

    SanitizePrompts { system, user }
}
