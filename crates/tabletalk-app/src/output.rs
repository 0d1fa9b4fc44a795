//! Text and JSON rendering for command results.

use std::fmt::Write as _;

use serde::Serialize;
use tabletalk_core::error::Result;
use tabletalk_core::types::{cell, Table};

use crate::cli::OutputFormat;

/// Render a table: a summary, the schema, then up to `limit` rows.
pub fn render_table(table: &Table, format: OutputFormat, limit: usize) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(table),
        OutputFormat::Text => Ok(table_text(table, limit)),
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn table_text(table: &Table, limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}, {}, {} rows)",
        table.name,
        table.id,
        table.kind,
        table.row_count()
    );
    if let Some(parents) = &table.parent_table_ids {
        let ids: Vec<&str> = parents.iter().map(|p| p.as_str()).collect();
        let _ = writeln!(out, "parents: {}", ids.join(", "));
    }
    let schema: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} ({})", c.header, c.column_type))
        .collect();
    let _ = writeln!(out, "columns: {}", schema.join(", "));

    if table.columns.is_empty() {
        return out;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", table.headers().join("\t"));
    for row in table.rows().iter().take(limit) {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| cell(row, &c.accessor).to_string())
            .collect();
        let _ = writeln!(out, "{}", cells.join("\t"));
    }
    if table.row_count() > limit {
        let _ = writeln!(out, "... {} more rows", table.row_count() - limit);
    }
    out
}
