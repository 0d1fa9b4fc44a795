use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TableTalkError};
use crate::types::{FieldSplitting, JoinMode, MissingValuePolicy, TypeInference};

/// Top-level configuration.
///
/// Loaded from `~/.tabletalk/config.toml` by default. Each section maps to
/// one crate of the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableTalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl TableTalkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TableTalkConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        let d = self.parser.delimiter;
        if d == '\n' || d == '\r' {
            return Err(TableTalkError::Config(
                "parser.delimiter cannot be a line break".to_string(),
            ));
        }
        if self.parser.field_splitting == FieldSplitting::Quoted && (d == '"' || !d.is_ascii()) {
            return Err(TableTalkError::Config(format!(
                "parser.delimiter {:?} is not usable with quoted field splitting",
                d
            )));
        }
        if self.merge.collision_separator.is_empty() {
            return Err(TableTalkError::Config(
                "merge.collision_separator cannot be empty".to_string(),
            ));
        }
        if self.chat.max_message_length == 0 {
            return Err(TableTalkError::Config(
                "chat.max_message_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Delimited-text parsing and type inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Case-insensitive tokens treated as a missing value. The empty string
    /// is always missing.
    pub missing_tokens: Vec<String>,
    /// What to store for a missing value.
    pub missing_values: MissingValuePolicy,
    pub type_inference: TypeInference,
    pub field_splitting: FieldSplitting,
    /// Declare all-`true`/`false` columns `boolean` and all-ISO-date columns
    /// `date`. Cells keep their text.
    pub detect_booleans_and_dates: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            missing_tokens: ["na", "n/a", "null", "none"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            missing_values: MissingValuePolicy::Null,
            type_inference: TypeInference::Promote,
            field_splitting: FieldSplitting::Naive,
            detect_booleans_and_dates: false,
        }
    }
}

/// Join engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Join mode used when a caller does not name one.
    pub default_join: JoinMode,
    /// Placed between the second table's name and a colliding accessor.
    pub collision_separator: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_join: JoinMode::Inner,
            collision_separator: "_".to_string(),
        }
    }
}

/// Question-answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    /// Maximum question length in characters.
    pub max_message_length: usize,
    /// Decimal places used when printing averages.
    pub decimals: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_length: 2000,
            decimals: 2,
        }
    }
}
