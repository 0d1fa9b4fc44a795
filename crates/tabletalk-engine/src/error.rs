//! Error types for parsing, cleaning, and merging.

use tabletalk_core::error::TableTalkError;

/// Errors from turning delimited text into a table.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("input is empty or has no header line")]
    EmptyInput,
    #[error("duplicate header name: {name}")]
    DuplicateHeader { name: String },
    #[error("delimiter {delimiter:?} is not supported by quoted field splitting")]
    UnsupportedDelimiter { delimiter: char },
    /// A record the quoted reader could not decode. The reader is flexible
    /// and fed valid UTF-8, so unbalanced quotes and ragged rows are read
    /// leniently; this is kept for reader failures it may still report.
    #[error("malformed record at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// Errors from joining tables. A failed merge never yields a partial table.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("at least two tables are required to merge, got {count}")]
    NotEnoughTables { count: usize },
    #[error("no column mappings were given")]
    EmptyColumnMappings,
    #[error("table '{table}' has no column '{accessor}'")]
    UnknownAccessor { table: String, accessor: String },
}

/// Errors inside a cleaning pass. `clean` swallows these.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("row {row} holds '{accessor}', which is not a column")]
    UnknownAccessor { row: usize, accessor: String },
}

impl From<ParseError> for TableTalkError {
    fn from(err: ParseError) -> Self {
        TableTalkError::Parse(err.to_string())
    }
}

impl From<MergeError> for TableTalkError {
    fn from(err: MergeError) -> Self {
        TableTalkError::Merge(err.to_string())
    }
}

impl From<CleanError> for TableTalkError {
    fn from(err: CleanError) -> Self {
        TableTalkError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        assert_eq!(
            ParseError::EmptyInput.to_string(),
            "input is empty or has no header line"
        );
        assert_eq!(
            ParseError::DuplicateHeader {
                name: "id".to_string()
            }
            .to_string(),
            "duplicate header name: id"
        );
        assert_eq!(
            ParseError::Malformed {
                line: 7,
                reason: "bad quote".to_string()
            }
            .to_string(),
            "malformed record at line 7: bad quote"
        );
    }

    #[test]
    fn test_merge_error_display_names_table_and_column() {
        let err = MergeError::UnknownAccessor {
            table: "Payroll".to_string(),
            accessor: "emp_id".to_string(),
        };
        assert_eq!(err.to_string(), "table 'Payroll' has no column 'emp_id'");
        assert_eq!(
            MergeError::NotEnoughTables { count: 1 }.to_string(),
            "at least two tables are required to merge, got 1"
        );
    }

    #[test]
    fn test_conversion_into_top_level_error() {
        let err: TableTalkError = ParseError::EmptyInput.into();
        assert!(matches!(err, TableTalkError::Parse(_)));

        let err: TableTalkError = MergeError::EmptyColumnMappings.into();
        assert!(matches!(err, TableTalkError::Merge(_)));
        assert_eq!(err.to_string(), "Merge error: no column mappings were given");
    }
}
