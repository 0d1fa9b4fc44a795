use std::fmt;

use serde::{Deserialize, Serialize};

/// What a question asks about the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    RowCount,
    Columns,
    Sum,
    Average,
    Max,
    Min,
    /// Nothing recognized; answer with usage help.
    Help,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::RowCount => "row_count",
            QueryIntent::Columns => "columns",
            QueryIntent::Sum => "sum",
            QueryIntent::Average => "average",
            QueryIntent::Max => "max",
            QueryIntent::Min => "min",
            QueryIntent::Help => "help",
        }
    }

    /// Whether answering needs a numeric column.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            QueryIntent::Sum | QueryIntent::Average | QueryIntent::Max | QueryIntent::Min
        )
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub intent: QueryIntent,
    pub answer: String,
    /// Accessor of the column an aggregate was computed over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// The aggregate itself, unrounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_string(&QueryIntent::RowCount).unwrap();
        assert_eq!(json, "\"row_count\"");
        assert_eq!(QueryIntent::Average.to_string(), "average");
    }

    #[test]
    fn test_aggregate_intents() {
        assert!(QueryIntent::Max.is_aggregate());
        assert!(!QueryIntent::Columns.is_aggregate());
        assert!(!QueryIntent::Help.is_aggregate());
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let response = ChatResponse {
            intent: QueryIntent::RowCount,
            answer: "There are 2 rows in this table.".to_string(),
            column: None,
            value: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["intent"], "row_count");
        assert!(json.get("column").is_none());
    }
}
