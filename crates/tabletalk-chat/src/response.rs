//! Answer rendering.
//!
//! Aggregates always run over the table's first `number` column. Null and
//! text cells in that column are skipped.

use tracing::debug;

use tabletalk_core::config::ChatConfig;
use tabletalk_core::types::Table;

use crate::error::ChatError;
use crate::parser::QueryParser;
use crate::types::{ChatResponse, QueryIntent};

const HELP_TEXT: &str = "I am your data assistant. Ask me how many rows this table has, \
which columns it contains, or for the sum, average, maximum or minimum of its first \
numeric column.";

/// Validates questions and answers them against one table.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    config: ChatConfig,
    parser: QueryParser,
}

impl ResponseGenerator {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            parser: QueryParser::new(),
        }
    }

    /// Answer a question about `table`.
    pub fn answer(&self, question: &str, table: &Table) -> Result<ChatResponse, ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if question.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let intent = self.parser.classify(question);
        let response = match intent {
            QueryIntent::RowCount => plain(intent, row_count_answer(table.row_count())),
            QueryIntent::Columns => plain(intent, columns_answer(&table.headers())),
            QueryIntent::Help => plain(intent, HELP_TEXT.to_string()),
            _ => self.aggregate(intent, table),
        };

        debug!(
            table = %table.id,
            intent = %intent,
            "Answered question"
        );
        Ok(response)
    }

    fn aggregate(&self, intent: QueryIntent, table: &Table) -> ChatResponse {
        let label = aggregate_label(intent);
        let Some(column) = table.first_numeric_column() else {
            return plain(
                intent,
                format!("I could not find a numeric column to compute the {}.", label),
            );
        };
        let Some(stats) = table.column_stats(&column.accessor) else {
            return ChatResponse {
                intent,
                answer: format!("Column {} has no numeric values.", column.header),
                column: Some(column.accessor.clone()),
                value: None,
            };
        };

        let (value, rendered) = match intent {
            QueryIntent::Average => (
                stats.mean,
                format!("{:.*}", self.config.decimals, stats.mean),
            ),
            QueryIntent::Sum => (stats.sum, format_number(stats.sum, self.config.decimals)),
            QueryIntent::Min => (stats.min, format_number(stats.min, self.config.decimals)),
            _ => (stats.max, format_number(stats.max, self.config.decimals)),
        };

        ChatResponse {
            intent,
            answer: format!("The {} of {} is {}.", label, column.header, rendered),
            column: Some(column.accessor.clone()),
            value: Some(value),
        }
    }
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(ChatConfig::default())
    }
}

fn plain(intent: QueryIntent, answer: String) -> ChatResponse {
    ChatResponse {
        intent,
        answer,
        column: None,
        value: None,
    }
}

fn row_count_answer(count: usize) -> String {
    if count == 1 {
        "There is 1 row in this table.".to_string()
    } else {
        format!("There are {} rows in this table.", count)
    }
}

fn columns_answer(headers: &[&str]) -> String {
    if headers.is_empty() {
        "The table has no columns.".to_string()
    } else {
        format!("The table has the following columns: {}.", headers.join(", "))
    }
}

fn aggregate_label(intent: QueryIntent) -> &'static str {
    match intent {
        QueryIntent::Sum => "sum",
        QueryIntent::Average => "average",
        QueryIntent::Min => "minimum",
        _ => "maximum",
    }
}

/// Whole numbers print without decimals; others are rounded.
fn format_number(value: f64, decimals: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rounded = format!("{:.*}", decimals, value);
        if rounded.contains('.') {
            rounded.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            rounded
        }
    }
}
