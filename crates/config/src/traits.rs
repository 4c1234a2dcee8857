//! Load and store configuration files.

use eyre::Context as _;
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};
use tracing::debug;

/// Supported file formats for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFmt {
    /// YAML, the default for files written by the node.
    YAML,
    /// JSON.
    JSON,
}

/// Read and write configuration values.
pub trait ConfigTrait {
    /// Load a configuration value from a file.
    fn load_from_path<T>(path: impl AsRef<Path>, fmt: ConfigFmt) -> eyre::Result<T>
    where
        T: DeserializeOwned,
    {
        let path = path.as_ref();
        debug!(target: "config", ?path, ?fmt, "loading config");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let value = match fmt {
            ConfigFmt::YAML => serde_yaml::from_str(&contents)
                .with_context(|| format!("invalid yaml in {}", path.display()))?,
            ConfigFmt::JSON => serde_json::from_str(&contents)
                .with_context(|| format!("invalid json in {}", path.display()))?,
        };

        Ok(value)
    }

    /// Write a configuration value to a file, creating parent directories as needed.
    fn write_to_path<T>(path: impl AsRef<Path>, value: &T, fmt: ConfigFmt) -> eyre::Result<()>
    where
        T: Serialize,
    {
        let path = path.as_ref();
        debug!(target: "config", ?path, ?fmt, "storing config");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = match fmt {
            ConfigFmt::YAML => serde_yaml::to_string(value)?,
            ConfigFmt::JSON => serde_json::to_string_pretty(value)?,
        };

        fs::write(path, contents)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }
}

/// Entry point for loading and storing configuration files.
#[derive(Debug, Clone, Copy)]
pub struct Config;

impl ConfigTrait for Config {}
