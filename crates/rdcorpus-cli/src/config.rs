//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rdcorpus_core::DEFAULT_MAX_BATCH_BYTES;
use rdcorpus_riksdag::{CorpusInfo, CorpusTable};
use serde::Deserialize;

/// File-level configuration for rdcorpus
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub batch: BatchConfig,
    /// Extra or overriding prefix entries
    #[serde(rename = "corpus")]
    pub corpora: Vec<CorpusEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ledger: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("rawdata"),
            output_dir: PathBuf::from("material"),
            ledger: PathBuf::from("processed.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_bytes: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

/// One `[[corpus]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusEntry {
    pub prefix: String,
    #[serde(flatten)]
    pub info: CorpusInfo,
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./rdcorpus.toml (current directory)
    /// 2. ~/.config/rdcorpus/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("rdcorpus.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "rdcorpus") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Built-in prefix table with the `[[corpus]]` entries applied.
    pub fn corpus_table(&self) -> CorpusTable {
        let mut table = CorpusTable::riksdagen();
        for entry in &self.corpora {
            table.insert(entry.prefix.clone(), entry.info.clone());
        }
        table
    }

    /// Runtime configuration for the preprocessing library
    pub fn runtime(&self) -> rdcorpus_riksdag::Config {
        rdcorpus_riksdag::Config {
            input_dir: self.paths.input_dir.clone(),
            output_dir: self.paths.output_dir.clone(),
            ledger_path: self.paths.ledger.clone(),
            max_batch_bytes: self.batch.max_bytes,
            corpus_table: self.corpus_table(),
            ..Default::default()
        }
    }
}
