//! Table store abstraction and its in-memory implementation.
//!
//! Tables live for the lifetime of the process. Lookups hand out clones so
//! callers never hold a lock across engine work.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use tabletalk_core::error::{Result, TableTalkError};
use tabletalk_core::types::{Table, TableId};

/// Keyed registry of tables.
pub trait TableStore: Send + Sync {
    /// Fetch a table by id and record the access.
    fn get(&self, id: &TableId) -> Result<Table>;

    /// Insert a table, replacing any table with the same id in place.
    fn put(&self, table: Table) -> Result<TableId>;

    /// Remove a table and return it.
    fn delete(&self, id: &TableId) -> Result<Table>;

    /// All tables in insertion order.
    fn list(&self) -> Result<Vec<Table>>;
}

impl<S: TableStore + ?Sized> TableStore for Arc<S> {
    fn get(&self, id: &TableId) -> Result<Table> {
        (**self).get(id)
    }

    fn put(&self, table: Table) -> Result<TableId> {
        (**self).put(table)
    }

    fn delete(&self, id: &TableId) -> Result<Table> {
        (**self).delete(id)
    }

    fn list(&self) -> Result<Vec<Table>> {
        (**self).list()
    }
}

#[derive(Debug, Default)]
struct Tables {
    order: Vec<TableId>,
    by_id: HashMap<TableId, Table>,
}

/// Process-lifetime store guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    inner: RwLock<Tables>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        self.with_read(|tables| Ok(tables.order.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn with_read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let guard: RwLockReadGuard<'_, Tables> = self
            .inner
            .read()
            .map_err(|e| TableTalkError::Storage(format!("Table store lock poisoned: {}", e)))?;
        f(&guard)
    }

    fn with_write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut guard: RwLockWriteGuard<'_, Tables> = self
            .inner
            .write()
            .map_err(|e| TableTalkError::Storage(format!("Table store lock poisoned: {}", e)))?;
        f(&mut guard)
    }
}

impl TableStore for MemoryTableStore {
    fn get(&self, id: &TableId) -> Result<Table> {
        self.with_write(|tables| {
            let table = tables
                .by_id
                .get_mut(id)
                .ok_or_else(|| TableTalkError::not_found(id.clone()))?;
            table.touch();
            Ok(table.clone())
        })
    }

    fn put(&self, table: Table) -> Result<TableId> {
        let id = table.id.clone();
        self.with_write(|tables| {
            if tables.by_id.insert(id.clone(), table).is_none() {
                tables.order.push(id.clone());
                info!(table = %id, "Table registered");
            } else {
                debug!(table = %id, "Table replaced");
            }
            Ok(id)
        })
    }

    fn delete(&self, id: &TableId) -> Result<Table> {
        self.with_write(|tables| {
            let table = tables
                .by_id
                .remove(id)
                .ok_or_else(|| TableTalkError::not_found(id.clone()))?;
            tables.order.retain(|t| t != id);
            info!(table = %id, "Table deleted");
            Ok(table)
        })
    }

    fn list(&self) -> Result<Vec<Table>> {
        self.with_read(|tables| {
            Ok(tables
                .order
                .iter()
                .filter_map(|id| tables.by_id.get(id).cloned())
                .collect())
        })
    }
}
