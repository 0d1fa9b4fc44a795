//! Join engine.
//!
//! Joins the first two of the supplied tables on one or more column pairs.
//! Tables past the second are accepted for lineage only: their ids land in
//! `parent_table_ids` but their rows are not folded in.
//!
//! Key equality follows SQL null semantics: a row with a null or missing key
//! cell never matches anything. Numbers and strings never compare equal.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tabletalk_core::config::MergeConfig;
use tabletalk_core::types::{cell, CellValue, JoinMode, Row, Table};

use crate::error::MergeError;
use crate::schema::{resolve_columns, MergedSchema};

// =============================================================================
// Request
// =============================================================================

/// What to merge and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Name of the resulting table.
    pub name: String,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub join_mode: Option<JoinMode>,
    /// Base-table accessor → second-table accessor.
    pub column_mappings: BTreeMap<String, String>,
}

impl MergeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            join_mode: None,
            column_mappings: BTreeMap::new(),
        }
    }

    pub fn join(mut self, mode: JoinMode) -> Self {
        self.join_mode = Some(mode);
        self
    }

    /// Add a key pair: `base_accessor` in the base table equals
    /// `second_accessor` in the second table.
    pub fn on(mut self, base_accessor: impl Into<String>, second_accessor: impl Into<String>) -> Self {
        self.column_mappings
            .insert(base_accessor.into(), second_accessor.into());
        self
    }
}

// =============================================================================
// Join keys
// =============================================================================

/// Hashable form of a non-null key cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Text(String),
    Number(u64),
}

fn key_part(value: &CellValue) -> Option<KeyPart> {
    match value {
        CellValue::Null => None,
        CellValue::Number(n) if n.is_nan() => None,
        // -0.0 and 0.0 compare equal, so they must hash alike.
        CellValue::Number(n) if *n == 0.0 => Some(KeyPart::Number(0.0f64.to_bits())),
        CellValue::Number(n) => Some(KeyPart::Number(n.to_bits())),
        CellValue::String(s) => Some(KeyPart::Text(s.clone())),
    }
}

/// Composite key of a row, or `None` if any part is null or missing.
fn row_key<'a>(row: &Row, accessors: impl Iterator<Item = &'a str>) -> Option<Vec<KeyPart>> {
    accessors.map(|a| key_part(cell(row, a))).collect()
}

// =============================================================================
// Merger
// =============================================================================

/// Join engine with its configuration.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge tables into a new `merged` table.
    ///
    /// Validation runs before any row is read; on error nothing is produced.
    pub fn merge(&self, tables: &[&Table], request: &MergeRequest) -> Result<Table, MergeError> {
        if tables.len() < 2 {
            return Err(MergeError::NotEnoughTables {
                count: tables.len(),
            });
        }
        if request.column_mappings.is_empty() {
            return Err(MergeError::EmptyColumnMappings);
        }

        let base = tables[0];
        let second = tables[1];
        for (base_accessor, second_accessor) in &request.column_mappings {
            if !base.has_column(base_accessor) {
                return Err(MergeError::UnknownAccessor {
                    table: base.name.clone(),
                    accessor: base_accessor.clone(),
                });
            }
            if !second.has_column(second_accessor) {
                return Err(MergeError::UnknownAccessor {
                    table: second.name.clone(),
                    accessor: second_accessor.clone(),
                });
            }
        }

        if tables.len() > 2 {
            warn!(
                ignored = tables.len() - 2,
                "Only the first two tables are joined; the rest are kept as lineage"
            );
        }

        let mode = request.join_mode.unwrap_or(self.config.default_join);
        let pairs: Vec<(&str, &str)> = request
            .column_mappings
            .iter()
            .map(|(b, s)| (b.as_str(), s.as_str()))
            .collect();
        let second_keys: HashSet<&str> = pairs.iter().map(|(_, s)| *s).collect();
        let schema = resolve_columns(base, second, &second_keys, &self.config.collision_separator);

        let join = Join {
            base,
            second,
            pairs: &pairs,
            schema: &schema,
        };
        let rows = join.run(mode);

        debug!(
            base = %base.name,
            second = %second.name,
            mode = %mode,
            rows = rows.len(),
            "Tables merged"
        );

        Ok(Table::merged(
            request.name.clone(),
            schema.columns,
            rows,
            tables.iter().map(|t| t.id.clone()).collect(),
        ))
    }
}

/// Merge with the default configuration.
pub fn merge(tables: &[&Table], request: &MergeRequest) -> Result<Table, MergeError> {
    Merger::default().merge(tables, request)
}

// =============================================================================
// Row assembly
// =============================================================================

struct Join<'a> {
    base: &'a Table,
    second: &'a Table,
    pairs: &'a [(&'a str, &'a str)],
    schema: &'a MergedSchema,
}

impl Join<'_> {
    fn run(&self, mode: JoinMode) -> Vec<Row> {
        // For every base row, the matching second rows in second-table order.
        let base_matches = self.match_base_rows();

        if mode == JoinMode::Right {
            return self.right_join(&base_matches);
        }

        let mut rows = Vec::new();
        let mut second_matched = vec![false; self.second.rows().len()];
        for (base_row, matches) in self.base.rows().iter().zip(&base_matches) {
            if matches.is_empty() {
                if mode.keeps_unmatched_base() {
                    rows.push(self.combine(base_row, None));
                }
                continue;
            }
            for &j in matches {
                second_matched[j] = true;
                rows.push(self.combine(base_row, Some(&self.second.rows()[j])));
            }
        }

        if mode.keeps_unmatched_second() {
            for (second_row, matched) in self.second.rows().iter().zip(&second_matched) {
                if !matched {
                    rows.push(self.second_only(second_row));
                }
            }
        }
        rows
    }

    /// Second rows drive the order; matched base rows follow base order.
    fn right_join(&self, base_matches: &[Vec<usize>]) -> Vec<Row> {
        let mut second_matches: Vec<Vec<usize>> = vec![Vec::new(); self.second.rows().len()];
        for (i, matches) in base_matches.iter().enumerate() {
            for &j in matches {
                second_matches[j].push(i);
            }
        }

        let mut rows = Vec::new();
        for (second_row, matches) in self.second.rows().iter().zip(&second_matches) {
            if matches.is_empty() {
                rows.push(self.second_only(second_row));
            }
            for &i in matches {
                rows.push(self.combine(&self.base.rows()[i], Some(second_row)));
            }
        }
        rows
    }

    fn match_base_rows(&self) -> Vec<Vec<usize>> {
        let mut index: HashMap<Vec<KeyPart>, Vec<usize>> = HashMap::new();
        for (j, row) in self.second.rows().iter().enumerate() {
            if let Some(key) = row_key(row, self.pairs.iter().map(|(_, s)| *s)) {
                index.entry(key).or_default().push(j);
            }
        }

        self.base
            .rows()
            .iter()
            .map(|row| {
                row_key(row, self.pairs.iter().map(|(b, _)| *b))
                    .and_then(|key| index.get(&key).cloned())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// A base row with its partner, or with nulls when there is none.
    fn combine(&self, base_row: &Row, second_row: Option<&Row>) -> Row {
        let mut row = Row::new();
        for column in &self.base.columns {
            row.insert(column.accessor.clone(), cell(base_row, &column.accessor).clone());
        }
        for (source, output) in &self.schema.carried {
            let value = second_row
                .map(|r| cell(r, source).clone())
                .unwrap_or(CellValue::Null);
            row.insert(output.clone(), value);
        }
        row
    }

    /// An unmatched second row. Base columns are null except the join keys,
    /// which take the second row's key values.
    fn second_only(&self, second_row: &Row) -> Row {
        let mut row = self.combine(&Row::new(), Some(second_row));
        for (base_accessor, second_accessor) in self.pairs {
            row.insert(
                base_accessor.to_string(),
                cell(second_row, second_accessor).clone(),
            );
        }
        row
    }
}

// =============================================================================
// Tests
// =============================================================================
