//! Question answering over a single table.
//!
//! Provides keyword-based intent classification and answer rendering for
//! row counts, column listings, and aggregates over the first numeric column.

pub mod error;
pub mod parser;
pub mod response;
pub mod types;

pub use error::ChatError;
pub use parser::QueryParser;
pub use response::ResponseGenerator;
pub use types::{ChatResponse, QueryIntent};
