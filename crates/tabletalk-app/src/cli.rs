//! CLI argument definitions for the TableTalk binary.
//!
//! Uses `clap` with derive macros.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

/// TableTalk: inspect, clean, merge, and question CSV tables.
#[derive(Parser, Debug)]
#[command(name = "tabletalk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a CSV file and show its inferred schema and rows.
    Inspect {
        path: PathBuf,
        /// Table name; defaults to the file stem.
        #[arg(short = 'n', long = "name")]
        name: Option<String>,
        /// Rows to print in text output.
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Parse a CSV file, clean it, and show the result.
    Clean {
        path: PathBuf,
        #[arg(short = 'n', long = "name")]
        name: Option<String>,
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Join two or more CSV files. Only the first two are joined; the rest
    /// are recorded as lineage.
    Merge {
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
        /// Key pair `base=second`; repeat for composite keys.
        #[arg(long = "on", required = true, value_parser = parse_mapping)]
        on: Vec<(String, String)>,
        /// inner, left, right, or outer. Defaults to the configured mode.
        #[arg(short = 'j', long = "join")]
        join: Option<String>,
        /// Name of the merged table.
        #[arg(short = 'n', long = "name", default_value = "Merged Table")]
        name: String,
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Ask a question about a CSV file.
    Ask { path: PathBuf, question: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TABLETALK_CONFIG env var > ~/.tabletalk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TABLETALK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Parse a `base=second` key pair.
pub fn parse_mapping(value: &str) -> Result<(String, String), String> {
    let (base, second) = value
        .split_once('=')
        .ok_or_else(|| format!("expected BASE=SECOND, got '{}'", value))?;
    let (base, second) = (base.trim(), second.trim());
    if base.is_empty() || second.is_empty() {
        return Err(format!("both sides of '{}' must name a column", value));
    }
    Ok((base.to_string(), second.to_string()))
}

/// Collect `--on` pairs, rejecting a base column named twice.
pub fn column_mappings(pairs: Vec<(String, String)>) -> Result<BTreeMap<String, String>, String> {
    let mut mappings = BTreeMap::new();
    for (base, second) in pairs {
        if let Some(previous) = mappings.get(&base) {
            return Err(format!(
                "--on maps base column '{}' twice ('{}' and '{}')",
                base, previous, second
            ));
        }
        mappings.insert(base, second);
    }
    Ok(mappings)
}

/// Table name for an uploaded file: explicit name, else the file stem.
pub fn table_name(path: &Path, name: Option<&str>) -> Option<String> {
    name.map(str::to_string).or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
    })
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    PathBuf::from("config.toml")
}
