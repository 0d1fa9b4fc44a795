//! Best-effort cleaning of stored rows.
//!
//! Drops rows with no present value and fills the remaining gaps: `0` in
//! numeric columns, `""` elsewhere. Numeric-ness is read from the stored
//! cells, not from the declared column type.

use tracing::{debug, warn};

use tabletalk_core::types::{cell, CellValue, Column, Row};

use crate::error::CleanError;

/// Clean rows, returning the input unchanged if anything goes wrong.
///
/// Idempotent: cleaning already-cleaned rows is a no-op.
pub fn clean(columns: &[Column], rows: &[Row]) -> Vec<Row> {
    match try_clean(columns, rows) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!(error = %e, "Cleaning failed, keeping rows unchanged");
            rows.to_vec()
        }
    }
}

/// Clean rows, reporting rows that do not fit the column set.
pub fn try_clean(columns: &[Column], rows: &[Row]) -> Result<Vec<Row>, CleanError> {
    for (index, row) in rows.iter().enumerate() {
        if let Some(key) = row
            .keys()
            .find(|key| !columns.iter().any(|c| &c.accessor == *key))
        {
            return Err(CleanError::UnknownAccessor {
                row: index,
                accessor: key.clone(),
            });
        }
    }

    let numeric: Vec<bool> = columns
        .iter()
        .map(|c| holds_only_numbers(&c.accessor, rows))
        .collect();

    let cleaned: Vec<Row> = rows
        .iter()
        .filter(|row| {
            columns
                .iter()
                .any(|c| !cell(row, &c.accessor).is_null())
        })
        .map(|row| {
            columns
                .iter()
                .zip(&numeric)
                .map(|(column, &is_numeric)| {
                    let value = match cell(row, &column.accessor) {
                        CellValue::Null if is_numeric => CellValue::Number(0.0),
                        CellValue::Null => CellValue::String(String::new()),
                        present => present.clone(),
                    };
                    (column.accessor.clone(), value)
                })
                .collect()
        })
        .collect();

    debug!(
        before = rows.len(),
        after = cleaned.len(),
        "Cleaned rows"
    );
    Ok(cleaned)
}

/// At least one number and no strings among the stored cells.
fn holds_only_numbers(accessor: &str, rows: &[Row]) -> bool {
    let mut saw_number = false;
    for row in rows {
        match cell(row, accessor) {
            CellValue::Number(_) => saw_number = true,
            CellValue::String(_) => return false,
            CellValue::Null => {}
        }
    }
    saw_number
}
