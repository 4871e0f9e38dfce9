use crate::scoring::DEFAULT_HISTORY_LENGTH;
use crate::session::DEFAULT_SCORE_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "score-ledger.yaml";

/// Configuration for scoring sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Where the score sheet is persisted
    #[serde(default = "default_score_file")]
    pub score_file: PathBuf,

    /// Number of past values kept for new scores
    #[serde(default = "default_history_length")]
    pub history_length: usize,

    /// Disallow scores without a cutoff
    #[serde(default)]
    pub strict: bool,

    /// Directory for the HTML report
    #[serde(default = "default_html_dir")]
    pub html_dir: PathBuf,

    /// Write the HTML report at the end of every run
    #[serde(default)]
    pub write_html: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            score_file: default_score_file(),
            history_length: default_history_length(),
            strict: false,
            html_dir: default_html_dir(),
            write_html: false,
        }
    }
}

fn default_score_file() -> PathBuf {
    PathBuf::from(DEFAULT_SCORE_FILE)
}

fn default_history_length() -> usize {
    DEFAULT_HISTORY_LENGTH
}

fn default_html_dir() -> PathBuf {
    PathBuf::from("htmlscore")
}

impl ScoreConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ScoreConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load `path` if given, else the default config file if it exists, else
    /// defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Self {
            write_html: true,
            ..Default::default()
        }
    }
}
