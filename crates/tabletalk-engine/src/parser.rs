//! Delimited-text parser with column type inference.
//!
//! Turns raw text into a column schema plus rows. The first non-blank line is
//! the header; every later non-blank line is a record aligned to the header by
//! position. Cells are normalized to `Null`, `Number`, or `String`.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, trace};

use tabletalk_core::config::ParserConfig;
use tabletalk_core::types::{
    CellValue, Column, ColumnType, FieldSplitting, MissingValuePolicy, Row, Table, TypeInference,
};

use crate::error::ParseError;

/// Plain decimal numerals: optional leading minus, at most one dot, no exponent.
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap());

// =============================================================================
// Output
// =============================================================================

/// Schema and rows produced by a parse, before they become a stored table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Wrap the parse result in an `uploaded` table with a fresh id.
    pub fn into_table(self, name: impl Into<String>) -> Table {
        Table::uploaded(name, self.columns, self.rows)
    }
}

// =============================================================================
// Internals
// =============================================================================

/// One non-blank input record.
struct Record {
    line: u64,
    fields: Vec<String>,
}

/// A field after missing-value and numeral detection.
#[derive(Debug, Clone, Copy)]
enum RawCell<'a> {
    Missing,
    Numeric(f64, &'a str),
    Text(&'a str),
}

// =============================================================================
// Parser
// =============================================================================

/// Configurable delimited-text parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse raw delimited text.
    ///
    /// Fails with [`ParseError::EmptyInput`] when there is no non-blank line.
    /// Rows whose every field is missing are dropped.
    pub fn parse(&self, raw_text: &str) -> Result<ParsedTable, ParseError> {
        let mut records = self.split_records(raw_text)?.into_iter();
        let header = records.next().ok_or(ParseError::EmptyInput)?;
        let mut columns = build_columns(&header.fields)?;

        let records: Vec<Record> = records.collect();
        let width = columns.len();
        let mut grid: Vec<Vec<RawCell<'_>>> = Vec::with_capacity(records.len());
        for record in &records {
            if record.fields.len() > width {
                trace!(
                    line = record.line,
                    extra = record.fields.len() - width,
                    "Ignoring fields beyond the header"
                );
            }
            // Short records read as empty strings, which are missing.
            let cells = (0..width)
                .map(|i| self.classify(record.fields.get(i).map(String::as_str).unwrap_or("")))
                .collect::<Vec<_>>();
            if cells.iter().all(|c| matches!(c, RawCell::Missing)) {
                trace!(line = record.line, "Dropping fully-missing row");
                continue;
            }
            grid.push(cells);
        }

        let rows = match self.config.type_inference {
            TypeInference::Promote => self.build_promoting(&mut columns, &grid),
            TypeInference::Strict => self.build_strict(&mut columns, &grid),
        };

        if self.config.detect_booleans_and_dates {
            detect_booleans_and_dates(&mut columns, &grid);
        }

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            dropped = records.len() - rows.len(),
            "Parsed delimited text"
        );

        Ok(ParsedTable { columns, rows })
    }

    // -----------------------------------------------------------------
    // Splitting
    // -----------------------------------------------------------------

    fn split_records(&self, raw_text: &str) -> Result<Vec<Record>, ParseError> {
        match self.config.field_splitting {
            FieldSplitting::Naive => Ok(self.split_naive(raw_text)),
            FieldSplitting::Quoted => self.split_quoted(raw_text),
        }
    }

    /// Plain split on the delimiter. A delimiter inside quotes still splits.
    fn split_naive(&self, raw_text: &str) -> Vec<Record> {
        raw_text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| Record {
                line: idx as u64 + 1,
                fields: line
                    .split(self.config.delimiter)
                    .map(|f| f.trim().to_string())
                    .collect(),
            })
            .collect()
    }

    fn split_quoted(&self, raw_text: &str) -> Result<Vec<Record>, ParseError> {
        let delimiter = self.config.delimiter;
        if !delimiter.is_ascii() || delimiter == '"' {
            return Err(ParseError::UnsupportedDelimiter { delimiter });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter as u8)
            .from_reader(raw_text.as_bytes());

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ParseError::Malformed {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            records.push(Record {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                fields: record.iter().map(str::to_string).collect(),
            });
        }
        Ok(records)
    }

    // -----------------------------------------------------------------
    // Cell detection
    // -----------------------------------------------------------------

    fn is_missing(&self, value: &str) -> bool {
        value.is_empty()
            || self
                .config
                .missing_tokens
                .iter()
                .any(|t| t.eq_ignore_ascii_case(value))
    }

    fn classify<'a>(&self, value: &'a str) -> RawCell<'a> {
        if self.is_missing(value) {
            return RawCell::Missing;
        }
        if NUMERIC_RE.is_match(value) {
            if let Ok(n) = value.parse::<f64>() {
                if n.is_finite() {
                    return RawCell::Numeric(n, value);
                }
            }
        }
        RawCell::Text(value)
    }

    fn missing_cell(&self, numeric_column: bool) -> CellValue {
        match self.config.missing_values {
            MissingValuePolicy::Null => CellValue::Null,
            MissingValuePolicy::Fill if numeric_column => CellValue::Number(0.0),
            MissingValuePolicy::Fill => CellValue::String(String::new()),
        }
    }

    // -----------------------------------------------------------------
    // Row construction
    // -----------------------------------------------------------------

    /// Single pass. A numeric cell promotes its column for good; cells read
    /// before the promotion are left as they were.
    fn build_promoting(&self, columns: &mut [Column], grid: &[Vec<RawCell<'_>>]) -> Vec<Row> {
        let mut rows = Vec::with_capacity(grid.len());
        for cells in grid {
            let mut row = Row::new();
            for (column, raw) in columns.iter_mut().zip(cells) {
                let value = match *raw {
                    RawCell::Missing => {
                        self.missing_cell(column.column_type == ColumnType::Number)
                    }
                    RawCell::Numeric(n, _) => {
                        column.column_type = ColumnType::Number;
                        CellValue::Number(n)
                    }
                    RawCell::Text(s) => CellValue::String(s.to_string()),
                };
                row.insert(column.accessor.clone(), value);
            }
            rows.push(row);
        }
        rows
    }

    /// Two passes. A column is `number` only when all of its present cells
    /// are numerals; otherwise numerals keep their text as written.
    fn build_strict(&self, columns: &mut [Column], grid: &[Vec<RawCell<'_>>]) -> Vec<Row> {
        for (i, column) in columns.iter_mut().enumerate() {
            let mut saw_number = false;
            let mut saw_text = false;
            for cells in grid {
                match cells[i] {
                    RawCell::Numeric(..) => saw_number = true,
                    RawCell::Text(_) => saw_text = true,
                    RawCell::Missing => {}
                }
            }
            if saw_number && !saw_text {
                column.column_type = ColumnType::Number;
            }
        }

        grid.iter()
            .map(|cells| {
                columns
                    .iter()
                    .zip(cells)
                    .map(|(column, raw)| {
                        let numeric = column.column_type == ColumnType::Number;
                        let value = match *raw {
                            RawCell::Missing => self.missing_cell(numeric),
                            RawCell::Numeric(n, _) if numeric => CellValue::Number(n),
                            RawCell::Numeric(_, text) | RawCell::Text(text) => {
                                CellValue::String(text.to_string())
                            }
                        };
                        (column.accessor.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Parse with the default configuration.
pub fn parse(raw_text: &str) -> Result<ParsedTable, ParseError> {
    Parser::default().parse(raw_text)
}

fn build_columns(header: &[String]) -> Result<Vec<Column>, ParseError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(ParseError::DuplicateHeader { name: name.clone() });
        }
        columns.push(Column::new(name.as_str()));
    }
    Ok(columns)
}

/// Re-declare all-boolean and all-date string columns. Cells are untouched.
fn detect_booleans_and_dates(columns: &mut [Column], grid: &[Vec<RawCell<'_>>]) {
    for (i, column) in columns.iter_mut().enumerate() {
        if column.column_type != ColumnType::String {
            continue;
        }
        let mut texts = Vec::new();
        let mut saw_number = false;
        for cells in grid {
            match cells[i] {
                RawCell::Text(s) => texts.push(s),
                RawCell::Numeric(..) => saw_number = true,
                RawCell::Missing => {}
            }
        }
        if saw_number || texts.is_empty() {
            continue;
        }
        if texts
            .iter()
            .all(|s| s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false"))
        {
            column.column_type = ColumnType::Boolean;
        } else if texts
            .iter()
            .all(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
        {
            column.column_type = ColumnType::Date;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_core::types::cell;

    fn parser_with(f: impl FnOnce(&mut ParserConfig)) -> Parser {
        let mut config = ParserConfig::default();
        f(&mut config);
        Parser::new(config)
    }

    fn types(parsed: &ParsedTable) -> Vec<ColumnType> {
        parsed.columns.iter().map(|c| c.column_type).collect()
    }

    #[test]
    fn test_parse_basic_table() {
        let parsed = parse("id,name\n1,Ann\n2,Bo\n").unwrap();
        assert_eq!(parsed.columns.len(), 2);
        assert_eq!(parsed.columns[0].accessor, "id");
        assert_eq!(parsed.columns[0].header, "id");
        assert_eq!(types(&parsed), vec![ColumnType::Number, ColumnType::String]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(cell(&parsed.rows[0], "id"), &CellValue::Number(1.0));
        assert_eq!(cell(&parsed.rows[1], "name"), &CellValue::from("Bo"));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse(""), Err(ParseError::EmptyInput)));
        assert!(matches!(parse("\n  \n\t\n"), Err(ParseError::EmptyInput)));
    }

    #[test]
    fn test_header_only_yields_string_columns_and_no_rows() {
        let parsed = parse("a, b ,c\n").unwrap();
        assert_eq!(parsed.row_count(), 0);
        assert_eq!(
            parsed.columns.iter().map(|c| c.accessor.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert!(types(&parsed).iter().all(|t| *t == ColumnType::String));
    }

    #[test]
    fn test_duplicate_headers_are_rejected() {
        match parse("id,name,id\n1,x,2") {
            Err(ParseError::DuplicateHeader { name }) => assert_eq!(name, "id"),
            other => panic!("expected duplicate header error, got {:?}", other),
        }
        match parse("a,,b,\n1,2,3,4") {
            Err(ParseError::DuplicateHeader { name }) => assert_eq!(name, ""),
            other => panic!("expected duplicate header error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_delimiter_gives_empty_accessor() {
        let parsed = parse("id,name,\n1,Ann,\n2,Bo,x\n").unwrap();
        assert_eq!(
            parsed.columns.iter().map(|c| c.accessor.as_str()).collect::<Vec<_>>(),
            vec!["id", "name", ""]
        );
        assert_eq!(parsed.row_count(), 2);
        assert!(cell(&parsed.rows[0], "").is_null());
        assert_eq!(cell(&parsed.rows[1], ""), &CellValue::from("x"));
    }

    #[test]
    fn test_blank_lines_and_crlf_are_ignored() {
        let parsed = parse("\r\nid,name\r\n\r\n1,Ann\r\n   \r\n2,Bo\r\n").unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.columns[1].accessor, "name");
        assert_eq!(cell(&parsed.rows[1], "name"), &CellValue::from("Bo"));
    }

    #[test]
    fn test_missing_tokens_become_null() {
        let parsed = parse("a,b,c,d,e,f\nx,NA,n/a,Null,NONE,\n").unwrap();
        let row = &parsed.rows[0];
        assert_eq!(cell(row, "a"), &CellValue::from("x"));
        for key in ["b", "c", "d", "e", "f"] {
            assert!(cell(row, key).is_null(), "{} should be null", key);
        }
    }

    #[test]
    fn test_short_rows_pad_with_null_and_long_rows_truncate() {
        let parsed = parse("a,b,c\n1\n4,5,6,7,8\n").unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert!(cell(&parsed.rows[0], "b").is_null());
        assert!(cell(&parsed.rows[0], "c").is_null());
        assert_eq!(parsed.rows[1].len(), 3);
        assert_eq!(cell(&parsed.rows[1], "c"), &CellValue::Number(6.0));
    }

    #[test]
    fn test_fully_missing_rows_are_dropped() {
        let parsed = parse("a,b\n1,2\n,\nNA,null\n\n3,4\n").unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(cell(&parsed.rows[1], "a"), &CellValue::Number(3.0));
    }

    #[test]
    fn test_numeral_grammar() {
        let parsed = parse("v\n12\n-3.5\n.5\n7.\n1e5\n+4\n1.2.3\n-\n0x1F\n").unwrap();
        let values: Vec<CellValue> = parsed.rows.iter().map(|r| cell(r, "v").clone()).collect();
        assert_eq!(
            values,
            vec![
                CellValue::Number(12.0),
                CellValue::Number(-3.5),
                CellValue::Number(0.5),
                CellValue::Number(7.0),
                CellValue::from("1e5"),
                CellValue::from("+4"),
                CellValue::from("1.2.3"),
                CellValue::from("-"),
                CellValue::from("0x1F"),
            ]
        );
    }

    #[test]
    fn test_promote_keeps_earlier_strings_and_never_demotes() {
        let parsed = parse("code\nabc\n42\nxyz\n").unwrap();
        assert_eq!(parsed.columns[0].column_type, ColumnType::Number);
        assert_eq!(cell(&parsed.rows[0], "code"), &CellValue::from("abc"));
        assert_eq!(cell(&parsed.rows[1], "code"), &CellValue::Number(42.0));
        assert_eq!(cell(&parsed.rows[2], "code"), &CellValue::from("xyz"));
    }

    #[test]
    fn test_strict_inference_requires_all_numeric() {
        let parser = parser_with(|c| c.type_inference = TypeInference::Strict);
        let parsed = parser.parse("code,qty\nabc,1\n42,\nxyz,3\n").unwrap();
        assert_eq!(types(&parsed), vec![ColumnType::String, ColumnType::Number]);
        assert_eq!(cell(&parsed.rows[1], "code"), &CellValue::from("42"));
        assert!(cell(&parsed.rows[1], "qty").is_null());
        assert_eq!(cell(&parsed.rows[2], "qty"), &CellValue::Number(3.0));
    }

    #[test]
    fn test_fill_policy_uses_type_at_that_point() {
        let parser = parser_with(|c| c.missing_values = MissingValuePolicy::Fill);
        let parsed = parser.parse("n,s\n,a\n5,\nNA,b\n").unwrap();
        // "n" is not numeric yet on the first row.
        assert_eq!(cell(&parsed.rows[0], "n"), &CellValue::from(""));
        assert_eq!(cell(&parsed.rows[1], "n"), &CellValue::Number(5.0));
        assert_eq!(cell(&parsed.rows[2], "n"), &CellValue::Number(0.0));
        assert_eq!(cell(&parsed.rows[1], "s"), &CellValue::from(""));
    }

    #[test]
    fn test_fill_policy_still_drops_fully_missing_rows() {
        let parser = parser_with(|c| c.missing_values = MissingValuePolicy::Fill);
        let parsed = parser.parse("n,s\n1,a\n,\n").unwrap();
        assert_eq!(parsed.row_count(), 1);
    }

    #[test]
    fn test_custom_delimiter_and_tokens() {
        let parser = parser_with(|c| {
            c.delimiter = ';';
            c.missing_tokens = vec!["-".to_string()];
        });
        let parsed = parser.parse("a;b\n1,5;-\nNA;x\n").unwrap();
        assert_eq!(cell(&parsed.rows[0], "a"), &CellValue::from("1,5"));
        assert!(cell(&parsed.rows[0], "b").is_null());
        // "NA" is no longer a missing token.
        assert_eq!(cell(&parsed.rows[1], "a"), &CellValue::from("NA"));
    }

    #[test]
    fn test_naive_splitting_does_not_honour_quotes() {
        let parsed = parse("name,city\n\"Smith, J\",Paris\n").unwrap();
        assert_eq!(cell(&parsed.rows[0], "name"), &CellValue::from("\"Smith"));
        assert_eq!(cell(&parsed.rows[0], "city"), &CellValue::from("J\""));
    }

    #[test]
    fn test_quoted_splitting() {
        let parser = parser_with(|c| c.field_splitting = FieldSplitting::Quoted);
        let parsed = parser
            .parse("name,city,n\n\"Smith, J\",\"Paris\nNord\", 3\n\n,,\nAnn,Rome,4\n")
            .unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(cell(&parsed.rows[0], "name"), &CellValue::from("Smith, J"));
        assert_eq!(cell(&parsed.rows[0], "city"), &CellValue::from("Paris\nNord"));
        assert_eq!(cell(&parsed.rows[0], "n"), &CellValue::Number(3.0));
        assert_eq!(parsed.columns[2].column_type, ColumnType::Number);
    }

    #[test]
    fn test_quoted_splitting_rejects_unusable_delimiter() {
        let parser = parser_with(|c| {
            c.field_splitting = FieldSplitting::Quoted;
            c.delimiter = '§';
        });
        assert!(matches!(
            parser.parse("a§b\n1§2"),
            Err(ParseError::UnsupportedDelimiter { .. })
        ));
    }

    #[test]
    fn test_quoted_splitting_reads_unclosed_quote_leniently() {
        let parser = parser_with(|c| c.field_splitting = FieldSplitting::Quoted);
        let parsed = parser.parse("a,b\n\"unclosed,1\n").unwrap();
        assert_eq!(parsed.row_count(), 1);
        assert_eq!(cell(&parsed.rows[0], "a"), &CellValue::from("unclosed,1"));
        assert!(cell(&parsed.rows[0], "b").is_null());
    }

    #[test]
    fn test_numerals_beyond_f64_stay_text() {
        let huge = "9".repeat(400);
        let parsed = parse(&format!("n\n{}\n2\n", huge)).unwrap();
        assert_eq!(cell(&parsed.rows[0], "n"), &CellValue::from(huge.as_str()));
        assert_eq!(cell(&parsed.rows[1], "n"), &CellValue::Number(2.0));
        let table = parsed.into_table("Big");
        assert_eq!(table.column_stats("n").unwrap().sum, 2.0);
    }

    #[test]
    fn test_boolean_and_date_detection() {
        let text = "flag,day,mixed,num\ntrue,2024-01-31,true,1\nFALSE,2023-12-01,2024-01-01,2\n,NA,,\n";
        let parsed = parser_with(|c| c.detect_booleans_and_dates = true)
            .parse(text)
            .unwrap();
        assert_eq!(
            types(&parsed),
            vec![
                ColumnType::Boolean,
                ColumnType::Date,
                ColumnType::String,
                ColumnType::Number
            ]
        );
        assert_eq!(cell(&parsed.rows[0], "flag"), &CellValue::from("true"));

        let plain = parse(text).unwrap();
        assert_eq!(plain.columns[0].column_type, ColumnType::String);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "id,name,score\n1,Ann,3.5\n2,,NA\nx,Bo,7\n";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn test_into_table() {
        let table = parse("a\n1\n2\n").unwrap().into_table("Numbers");
        assert_eq!(table.name, "Numbers");
        assert_eq!(table.row_count(), 2);
        assert!(table.id.as_str().starts_with("table-"));
    }
}
