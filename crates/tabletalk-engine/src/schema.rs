//! Output schema of a merge and column-name collision resolution.

use std::collections::HashSet;

use tracing::debug;

use tabletalk_core::types::{Column, Table};

/// Column layout of a merged table.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSchema {
    /// Base columns in order, then the carried second-table columns.
    pub columns: Vec<Column>,
    /// `(second-table accessor, output accessor)` for each carried column.
    pub carried: Vec<(String, String)>,
}

/// Lay out the merged schema.
///
/// Second-table join keys are skipped. A second-table accessor that is
/// already taken becomes `{second}{sep}{accessor}` with header
/// `{second} {header}`; if that is taken too, `{sep}2`, `{sep}3`, … is
/// appended until it is free. Output accessors are always distinct.
pub fn resolve_columns(
    base: &Table,
    second: &Table,
    second_keys: &HashSet<&str>,
    separator: &str,
) -> MergedSchema {
    let mut columns = base.columns.clone();
    let mut taken: HashSet<String> = columns.iter().map(|c| c.accessor.clone()).collect();
    let mut carried = Vec::new();

    for column in &second.columns {
        if second_keys.contains(column.accessor.as_str()) {
            continue;
        }

        let output = if taken.contains(&column.accessor) {
            let renamed = rename(column, &second.name, separator, &taken);
            debug!(
                from = %column.accessor,
                to = %renamed.accessor,
                "Renamed colliding column"
            );
            renamed
        } else {
            column.clone()
        };

        taken.insert(output.accessor.clone());
        carried.push((column.accessor.clone(), output.accessor.clone()));
        columns.push(output);
    }

    MergedSchema { columns, carried }
}

fn rename(column: &Column, table_name: &str, separator: &str, taken: &HashSet<String>) -> Column {
    let accessor = format!("{}{}{}", table_name, separator, column.accessor);
    let header = format!("{} {}", table_name, column.header);
    if !taken.contains(&accessor) {
        return Column {
            accessor,
            header,
            column_type: column.column_type,
        };
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}{}{}", accessor, separator, n);
        if !taken.contains(&candidate) {
            return Column {
                accessor: candidate,
                header: format!("{} {}", header, n),
                column_type: column.column_type,
            };
        }
        n += 1;
    }
}
