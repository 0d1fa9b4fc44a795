use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Declared type of a column.
///
/// The declared type is a best-effort summary of the cells, not a constraint
/// on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a table came into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Parsed from uploaded delimited text.
    Uploaded,
    /// Produced by joining two or more stored tables.
    Merged,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Uploaded => "uploaded",
            TableKind::Merged => "merged",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which unmatched rows survive a merge.
///
/// Parsing from text never fails: anything unrecognized becomes `Inner`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JoinMode {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinMode {
    /// Parse a join mode name, falling back to `Inner` for unknown input.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "inner" => JoinMode::Inner,
            "left" => JoinMode::Left,
            "right" => JoinMode::Right,
            "outer" | "full" => JoinMode::Outer,
            other => {
                tracing::warn!(mode = %other, "Unrecognized join mode, using inner");
                JoinMode::Inner
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
        }
    }

    /// Whether base rows without a partner are kept.
    pub fn keeps_unmatched_base(&self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    /// Whether second-table rows without a partner are kept.
    pub fn keeps_unmatched_second(&self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }
}

impl From<&str> for JoinMode {
    fn from(value: &str) -> Self {
        Self::parse_lenient(value)
    }
}

impl From<String> for JoinMode {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the parser stores for an empty or missing-token cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Store `Null`.
    #[default]
    Null,
    /// Store `0` in columns already inferred numeric, `""` elsewhere.
    Fill,
}

/// Column type inference strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeInference {
    /// One pass. Any numeric cell promotes the column to `number`; other
    /// cells keep their text, so a numeric column may still hold strings.
    #[default]
    Promote,
    /// Two passes. A column is `number` only if every present cell is numeric.
    Strict,
}

/// How a line is split into fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSplitting {
    /// Plain split on the delimiter. Quotes are ordinary characters.
    #[default]
    Naive,
    /// RFC 4180 quoting: quoted fields may contain delimiters and newlines.
    Quoted,
}

// =============================================================================
// Cell values and rows
// =============================================================================

/// A single cell.
///
/// Serialized untagged so rows look like plain JSON objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Number(f64),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

/// One row, keyed by column accessor. An absent accessor reads as `Null`.
pub type Row = BTreeMap<String, CellValue>;

/// Read a cell, treating an absent accessor as `Null`.
pub fn cell<'a>(row: &'a Row, accessor: &str) -> &'a CellValue {
    static NULL: CellValue = CellValue::Null;
    row.get(accessor).unwrap_or(&NULL)
}

// =============================================================================
// Schema
// =============================================================================

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Stable key into each row. Unique within a table.
    pub accessor: String,
    /// Display label.
    pub header: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// A `string` column whose accessor and header are both `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            header: name.clone(),
            accessor: name,
            column_type: ColumnType::String,
        }
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Opaque table identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub String);

impl TableId {
    pub fn new_uploaded() -> Self {
        Self(format!("table-{}", Uuid::new_v4()))
    }

    pub fn new_merged() -> Self {
        Self(format!("merged-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Table
// =============================================================================

/// Aggregate over the numeric cells of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// A typed, in-memory table.
///
/// `row_count` always equals the number of rows; the rows are only replaced
/// through [`Table::apply_cleaned_rows`]. Deserialization recomputes the
/// count from `data` and rejects rows holding keys outside the columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TableRepr")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    pub columns: Vec<Column>,
    #[serde(rename = "data")]
    rows: Vec<Row>,
    /// Lineage. Only set on merged tables.
    #[serde(
        rename = "parentTables",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_table_ids: Option<Vec<TableId>>,
    row_count: usize,
}

/// Wire form of [`Table`]. Any incoming `rowCount` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRepr {
    id: TableId,
    name: String,
    #[serde(rename = "type")]
    kind: TableKind,
    created_at: DateTime<Utc>,
    #[serde(default)]
    last_accessed: Option<DateTime<Utc>>,
    columns: Vec<Column>,
    #[serde(rename = "data")]
    rows: Vec<Row>,
    #[serde(rename = "parentTables", default)]
    parent_table_ids: Option<Vec<TableId>>,
}

impl TryFrom<TableRepr> for Table {
    type Error = String;

    fn try_from(repr: TableRepr) -> std::result::Result<Self, Self::Error> {
        for (index, row) in repr.rows.iter().enumerate() {
            if let Some(key) = row
                .keys()
                .find(|key| !repr.columns.iter().any(|c| &c.accessor == *key))
            {
                return Err(format!(
                    "row {} holds '{}', which is not a column of table '{}'",
                    index, key, repr.name
                ));
            }
        }
        Ok(Self {
            id: repr.id,
            name: repr.name,
            kind: repr.kind,
            created_at: repr.created_at,
            last_accessed: repr.last_accessed,
            columns: repr.columns,
            row_count: repr.rows.len(),
            rows: repr.rows,
            parent_table_ids: repr.parent_table_ids,
        })
    }
}

impl Table {
    /// Build an uploaded table with a fresh id.
    pub fn uploaded(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            id: TableId::new_uploaded(),
            name: name.into(),
            kind: TableKind::Uploaded,
            created_at: Utc::now(),
            last_accessed: None,
            columns,
            row_count: rows.len(),
            rows,
            parent_table_ids: None,
        }
    }

    /// Build a merged table with a fresh id and the given lineage.
    pub fn merged(
        name: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Row>,
        parent_table_ids: Vec<TableId>,
    ) -> Self {
        Self {
            id: TableId::new_merged(),
            name: name.into(),
            kind: TableKind::Merged,
            created_at: Utc::now(),
            last_accessed: None,
            columns,
            row_count: rows.len(),
            rows,
            parent_table_ids: Some(parent_table_ids),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Replace the row set with the output of a cleaning pass.
    pub fn apply_cleaned_rows(&mut self, rows: Vec<Row>) {
        self.row_count = rows.len();
        self.rows = rows;
    }

    /// Record an access.
    pub fn touch(&mut self) {
        self.last_accessed = Some(Utc::now());
    }

    pub fn column(&self, accessor: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.accessor == accessor)
    }

    pub fn has_column(&self, accessor: &str) -> bool {
        self.column(accessor).is_some()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// First column declared `number`, in schema order.
    pub fn first_numeric_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.column_type == ColumnType::Number)
    }

    /// Aggregate the numeric cells of a column.
    ///
    /// Null and string cells are skipped. Returns `None` when the column is
    /// unknown or holds no numbers.
    pub fn column_stats(&self, accessor: &str) -> Option<ColumnStats> {
        if !self.has_column(accessor) {
            return None;
        }
        let mut values = self
            .rows
            .iter()
            .filter_map(|row| cell(row, accessor).as_number());

        let first = values.next()?;
        let mut stats = ColumnStats {
            count: 1,
            sum: first,
            min: first,
            max: first,
            mean: 0.0,
        };
        for v in values {
            stats.count += 1;
            stats.sum += v;
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
        }
        stats.mean = stats.sum / stats.count as f64;
        Some(stats)
    }
}

// =============================================================================
// Tests
// =============================================================================
