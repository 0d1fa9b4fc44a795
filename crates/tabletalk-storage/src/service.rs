//! Table service: the engine operations addressed by table id.
//!
//! Owns a store plus a configured parser and merger. Uploads and merges
//! register their result; cleaning replaces the stored rows in place.

use tracing::{debug, info};

use tabletalk_core::config::TableTalkConfig;
use tabletalk_core::error::Result;
use tabletalk_core::types::{Table, TableId};
use tabletalk_engine::{clean, MergeRequest, Merger, Parser};

use crate::repository::TableStore;

/// Name given to uploads that arrive without one.
pub const DEFAULT_TABLE_NAME: &str = "Table";

pub struct TableService<S: TableStore> {
    store: S,
    parser: Parser,
    merger: Merger,
}

impl<S: TableStore> TableService<S> {
    pub fn new(store: S, config: &TableTalkConfig) -> Self {
        Self {
            store,
            parser: Parser::new(config.parser.clone()),
            merger: Merger::new(config.merge.clone()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse raw text and register the result as an `uploaded` table.
    ///
    /// A missing or blank name becomes [`DEFAULT_TABLE_NAME`].
    pub fn upload(&self, raw_text: &str, name: Option<&str>) -> Result<Table> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_TABLE_NAME);
        let table = self.parser.parse(raw_text)?.into_table(name);
        self.store.put(table.clone())?;
        info!(
            table = %table.id,
            name = %table.name,
            rows = table.row_count(),
            columns = table.columns.len(),
            "Uploaded table"
        );
        Ok(table)
    }

    /// Merge stored tables by id and register the result.
    ///
    /// Every id is resolved before the engine runs; the first miss is
    /// reported and nothing is stored.
    pub fn merge(&self, ids: &[TableId], request: &MergeRequest) -> Result<Table> {
        let tables = ids
            .iter()
            .map(|id| self.store.get(id))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&Table> = tables.iter().collect();

        let merged = self.merger.merge(&refs, request)?;
        self.store.put(merged.clone())?;
        info!(
            table = %merged.id,
            parents = ids.len(),
            rows = merged.row_count(),
            "Merged tables"
        );
        Ok(merged)
    }

    /// Clean a stored table in place and return the updated table.
    pub fn clean_table(&self, id: &TableId) -> Result<Table> {
        let mut table = self.store.get(id)?;
        let before = table.row_count();
        let rows = clean(&table.columns, table.rows());
        table.apply_cleaned_rows(rows);
        self.store.put(table.clone())?;
        debug!(
            table = %id,
            before,
            after = table.row_count(),
            "Cleaned stored table"
        );
        Ok(table)
    }

    pub fn get(&self, id: &TableId) -> Result<Table> {
        self.store.get(id)
    }

    pub fn list(&self) -> Result<Vec<Table>> {
        self.store.list()
    }

    pub fn delete(&self, id: &TableId) -> Result<Table> {
        self.store.delete(id)
    }
}
