use crate::classifier::HeuristicConfig;
use crate::sink::DEFAULT_OUTPUT_FILE_NAME;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration settings for smartcart
///
/// Stores user preferences that persist between runs, including:
/// - Location of the order history dump
/// - Where the smart cart document is written
/// - Default output format (enhanced/classic/json)
/// - Export directory for CSV files
/// - Heuristic tuning knobs
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Order history dump (default: ./orders_dump.json)
    pub orders_path: Option<PathBuf>,
    /// Smart cart document (default: ~/smart_cart_calculation.json)
    pub output_path: Option<PathBuf>,
    /// Default output format for results
    pub default_output_format: OutputFormat,
    /// Directory for CSV exports (default: current directory)
    pub export_directory: Option<PathBuf>,
    pub heuristics: HeuristicConfig,
}

/// Output format options for results
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Summary plus item lists (default)
    Enhanced,
    /// Classic table format
    Table,
    /// JSON format for scripting and automation
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orders_path: None,
            output_path: None,
            default_output_format: OutputFormat::Enhanced,
            export_directory: None,
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.heuristics.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(home_dir()?
            .join(".config")
            .join("smartcart")
            .join("config.yaml"))
    }

    pub fn get_orders_path(&self) -> PathBuf {
        self.orders_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("orders_dump.json"))
    }

    pub fn get_output_path(&self) -> Result<PathBuf> {
        match &self.output_path {
            Some(path) => Ok(path.clone()),
            None => Ok(home_dir()?.join(DEFAULT_OUTPUT_FILE_NAME)),
        }
    }

    pub fn get_export_directory(&self) -> PathBuf {
        self.export_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}
