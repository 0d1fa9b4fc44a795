//! TableTalk binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Upload the named CSV files into an in-memory table service
//! 4. Run the subcommand and print its result as text or JSON

mod cli;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser as _;

use tabletalk_chat::ResponseGenerator;
use tabletalk_core::config::TableTalkConfig;
use tabletalk_core::error::{Result, TableTalkError};
use tabletalk_core::types::{JoinMode, Table};
use tabletalk_engine::MergeRequest;
use tabletalk_storage::{MemoryTableStore, TableService};

use crate::cli::{column_mappings, table_name, CliArgs, Command, OutputFormat};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        match TableTalkConfig::load(&config_file) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        TableTalkConfig::default()
    };

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    match run(args, &config) {
        Ok(rendered) => {
            println!("{}", rendered.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs, config: &TableTalkConfig) -> Result<String> {
    let service = TableService::new(MemoryTableStore::new(), config);
    let format = args.format;

    match args.command {
        Command::Inspect { path, name, limit } => {
            let table = upload(&service, &path, name.as_deref())?;
            output::render_table(&table, format, limit)
        }
        Command::Clean { path, name, limit } => {
            let table = upload(&service, &path, name.as_deref())?;
            let cleaned = service.clean_table(&table.id)?;
            tracing::info!(
                before = table.row_count(),
                after = cleaned.row_count(),
                "Cleaned table"
            );
            output::render_table(&cleaned, format, limit)
        }
        Command::Merge {
            paths,
            on,
            join,
            name,
            limit,
        } => {
            let column_mappings = column_mappings(on).map_err(TableTalkError::Merge)?;
            let mut ids = Vec::with_capacity(paths.len());
            for path in &paths {
                ids.push(upload(&service, path, None)?.id);
            }
            let request = MergeRequest {
                name,
                join_mode: join.as_deref().map(JoinMode::parse_lenient),
                column_mappings,
            };
            let merged = service.merge(&ids, &request)?;
            output::render_table(&merged, format, limit)
        }
        Command::Ask { path, question } => {
            let table = upload(&service, &path, None)?;
            let response = ResponseGenerator::new(config.chat.clone()).answer(&question, &table)?;
            match format {
                OutputFormat::Json => output::to_json(&response),
                OutputFormat::Text => Ok(response.answer),
            }
        }
    }
}

fn upload(
    service: &TableService<MemoryTableStore>,
    path: &Path,
    name: Option<&str>,
) -> Result<Table> {
    let raw_text = std::fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
    let name = table_name(path, name);
    service.upload(&raw_text, name.as_deref())
}
