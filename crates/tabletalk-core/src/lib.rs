pub mod config;
pub mod error;
pub mod types;

pub use config::TableTalkConfig;
pub use error::{Result, TableTalkError};
pub use types::*;
