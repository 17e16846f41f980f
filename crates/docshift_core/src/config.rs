use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::block::Rgb;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub links: LinksConfig,
    pub code: CodeConfig,
    pub quote: QuoteConfig,
    pub rule: RuleConfig,
    pub table: TableConfig,
    pub spacing: SpacingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinksConfig {
    pub color: Rgb,
    pub underline: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: Rgb(0x00, 0x00, 0xFF),
            underline: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodeConfig {
    pub font: String,
    /// Font size in half-points.
    pub size: u32,
    pub shading: Rgb,
    /// Left indent of code lines, in twips.
    pub indent: u32,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            font: "Courier New".to_string(),
            size: 20,
            shading: Rgb(0xF3, 0xF4, 0xF6),
            indent: 720,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuoteConfig {
    pub border_color: Rgb,
    /// Left indent in twips.
    pub indent: u32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            border_color: Rgb(0xCC, 0xCC, 0xCC),
            indent: 720,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleConfig {
    /// Number of characters in the horizontal separator.
    pub width: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self { width: 50 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    pub placeholder: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            placeholder: "[Table content - convert manually]".to_string(),
        }
    }
}

/// Paragraph spacing, in twips.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpacingConfig {
    pub heading_before: u32,
    pub heading_after: u32,
    pub paragraph_after: u32,
    pub list_after: u32,
    pub block_after: u32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            heading_before: 200,
            heading_after: 200,
            paragraph_after: 120,
            list_after: 80,
            block_after: 200,
        }
    }
}

impl Config {
    /// The configuration bundled with the crate (`default_config.toml`).
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The separator text used for horizontal rules.
    pub fn rule_separator(&self) -> String {
        "_".repeat(self.rule.width)
    }
}
