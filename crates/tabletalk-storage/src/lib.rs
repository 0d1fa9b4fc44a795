//! TableTalk Storage crate - in-process table registry and table service.
//!
//! Provides the `TableStore` abstraction with an in-memory implementation,
//! and a `TableService` that uploads, merges, and cleans stored tables by id
//! using the engine.

pub mod repository;
pub mod service;

pub use repository::{MemoryTableStore, TableStore};
pub use service::TableService;
