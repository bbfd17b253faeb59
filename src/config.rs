use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::wireless::ieee80211::{BEACON_FIXED_LEN, MGMT_HEADER_LEN};
use crate::wireless::registry::DEFAULT_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load config from default locations or create default
    pub fn load_or_default() -> Result<Self> {
        let paths = [
            PathBuf::from("/etc/airquality/config.toml"),
            dirs_next::config_dir()
                .map(|p| p.join("airquality/config.toml"))
                .unwrap_or_default(),
            PathBuf::from("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }
}

/// Frame decoding and entity tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Maximum number of tracked entities
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Byte offset of the signal field inside the radiotap header.
    /// 0 in the file means: locate it by walking the present flags.
    #[serde(default = "default_rssi_offset", with = "offset_or_walk")]
    pub rssi_offset: Option<usize>,

    /// Offset of the first tagged parameter in a beacon, from the start of
    /// the 802.11 header
    #[serde(default = "default_beacon_tags_offset")]
    pub beacon_tags_offset: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            rssi_offset: default_rssi_offset(),
            beacon_tags_offset: default_beacon_tags_offset(),
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Report rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format (table, json)
    #[serde(default)]
    pub format: ReportFormat,

    /// Widest channel histogram bar, in characters
    #[serde(default = "default_histogram_width")]
    pub histogram_width: usize,

    /// List the users under each access point
    #[serde(default = "default_true")]
    pub show_users: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            histogram_width: default_histogram_width(),
            show_users: true,
        }
    }
}

mod offset_or_walk {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(offset: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(offset.unwrap_or(0) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let offset = usize::deserialize(deserializer)?;
        Ok((offset != 0).then_some(offset))
    }
}

// Default value functions
fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_rssi_offset() -> Option<usize> {
    Some(22)
}

fn default_beacon_tags_offset() -> usize {
    MGMT_HEADER_LEN + BEACON_FIXED_LEN
}

fn default_histogram_width() -> usize {
    48
}

fn default_true() -> bool {
    true
}
