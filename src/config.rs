//! Configuration management
//!
//! Handles loading and validating pool configuration from TOML files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Memory pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Size of each pooled block in bytes
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Maximum number of free blocks retained for reuse
    #[serde(default = "default_max_free_blocks")]
    pub max_free_blocks: usize,
    /// Blocks allocated up front when the manager is built
    #[serde(default)]
    pub preallocate_blocks: usize,
    /// Maximum length of a single stream in bytes (0 = unlimited)
    #[serde(default)]
    pub max_stream_len: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            max_free_blocks: default_max_free_blocks(),
            preallocate_blocks: 0,
            max_stream_len: 0,
        }
    }
}

impl PoolConfig {
    /// Check the values a manager cannot be built without
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            anyhow::bail!("block_size must be > 0");
        }
        if self.max_free_blocks == 0 {
            anyhow::bail!("max_free_blocks must be > 0");
        }
        if self.preallocate_blocks > self.max_free_blocks {
            anyhow::bail!("preallocate_blocks must not exceed max_free_blocks");
        }
        Ok(())
    }

    /// Effective maximum stream length, if one is configured
    pub fn stream_limit(&self) -> Option<u64> {
        (self.max_stream_len > 0).then_some(self.max_stream_len)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_block_size() -> usize { 128 * 1024 }
fn default_max_free_blocks() -> usize { 1024 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        self.pool.validate().context("invalid [pool] section")?;
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            anyhow::bail!("logging.format must be \"json\" or \"pretty\"");
        }
        Ok(())
    }
}
