//! Keyword-based question classifier.
//!
//! Recognizes English and French phrasings. Rules are checked in a fixed
//! order and the first hit wins, so "how many columns" is a row count.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::QueryIntent;

// =============================================================================
// Compiled rules
// =============================================================================

static INTENT_RULES: LazyLock<Vec<(QueryIntent, Vec<Regex>)>> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    vec![
        (
            QueryIntent::RowCount,
            mk(&[
                r"(?i)\bhow\s+many\b",
                r"(?i)\brow\s+count\b",
                r"(?i)\bnumber\s+of\s+(?:rows|records|lines|entries)\b",
                r"(?i)\bcount\s+(?:the\s+)?(?:rows|records|lines|entries)\b",
                r"(?i)\bcombien\b",
                r"(?i)\bnombre\s+de\s+lignes\b",
            ]),
        ),
        (
            QueryIntent::Columns,
            mk(&[
                r"(?i)\bcolumns?\b",
                r"(?i)\bfields?\b",
                r"(?i)\bheaders?\b",
                r"(?i)\bcolonnes?\b",
                r"(?i)\bchamps\b",
            ]),
        ),
        (
            QueryIntent::Average,
            mk(&[
                r"(?i)\baverage\b",
                r"(?i)\bmean\b",
                r"(?i)\bmoyenne\b",
            ]),
        ),
        (
            QueryIntent::Sum,
            mk(&[
                r"(?i)\bsum\b",
                r"(?i)\btotal\b",
                r"(?i)\bsomme\b",
            ]),
        ),
        (
            QueryIntent::Max,
            mk(&[
                r"(?i)\bmax(?:imum)?\b",
                r"(?i)\bhighest\b",
                r"(?i)\blargest\b",
                r"(?i)\bbiggest\b",
                r"(?i)\bmaximale?\b",
                r"(?i)\bplus\s+grande?\b",
            ]),
        ),
        (
            QueryIntent::Min,
            mk(&[
                r"(?i)\bmin(?:imum)?\b",
                r"(?i)\blowest\b",
                r"(?i)\bsmallest\b",
                r"(?i)\bminimale?\b",
                r"(?i)\bplus\s+petite?\b",
            ]),
        ),
    ]
});

// =============================================================================
// QueryParser
// =============================================================================

/// Rule-based question classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    /// Classify a question. Falls back to [`QueryIntent::Help`].
    pub fn classify(&self, question: &str) -> QueryIntent {
        INTENT_RULES
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(question)))
            .map(|(intent, _)| *intent)
            .unwrap_or(QueryIntent::Help)
    }
}
