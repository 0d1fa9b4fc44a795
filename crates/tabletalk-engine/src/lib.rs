//! TableTalk engine - delimited-text ingestion and relational merges.
//!
//! Provides:
//! - Parsing with per-cell type detection and missing-value normalization
//! - Best-effort cleaning of stored rows
//! - Two-table joins (inner, left, right, outer) with collision-safe schemas
//!
//! Every operation here is a pure function of its arguments. Looking tables
//! up and registering results is the caller's job.

pub mod clean;
pub mod error;
pub mod merge;
pub mod parser;
pub mod schema;

pub use clean::{clean, try_clean};
pub use error::{CleanError, MergeError, ParseError};
pub use merge::{merge, MergeRequest, Merger};
pub use parser::{parse, ParsedTable, Parser};
