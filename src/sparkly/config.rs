//! # Configuration
//!
//! Sparkly configuration is loaded with [`confique`] from a TOML file and the
//! environment.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `SPARK_TOKEN`, `SPARK_API_BASE`.
//! 2. **Config file**: `sparkly.toml`, by default in the OS config directory
//!    (via the `directories` crate), or any path passed with `--config`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `token` | none | Bearer token for the API |
//! | `api_base` | `https://api.ciscospark.com/v1/` | Base URL relative paths resolve against |
//! | `region` | `us` | Region written into identifiers built from bare uuids |
//! | `per_page` | `50` | Page size, sent as the `max` query parameter |
//! | `timeout_secs` | `30` | Per-request timeout |
//! | `max_rate_limit_retries` | `5` | Retries after a 429 before giving up |
//! | `default_retry_after_secs` | `15` | Back-off when a 429 has no `Retry-After` |

use crate::error::{Result, SparkError};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "sparkly.toml";

/// Configuration for sparkly, stored in `sparkly.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SparkConfig {
    /// API access token
    #[config(env = "SPARK_TOKEN")]
    pub token: Option<String>,

    #[config(env = "SPARK_API_BASE", default = "https://api.ciscospark.com/v1/")]
    pub api_base: String,

    #[config(default = "us")]
    pub region: String,

    #[config(default = 50)]
    pub per_page: u32,

    #[config(default = 30)]
    pub timeout_secs: u64,

    #[config(default = 5)]
    pub max_rate_limit_retries: u32,

    #[config(default = 15)]
    pub default_retry_after_secs: u64,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.ciscospark.com/v1/".to_string(),
            region: "us".to_string(),
            per_page: 50,
            timeout_secs: 30,
            max_rate_limit_retries: 5,
            default_retry_after_secs: 15,
        }
    }
}

impl SparkConfig {
    /// Load configuration, layering the environment over `path` (if it
    /// exists) over the compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = SparkConfig::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        builder.load().map_err(|e| SparkError::Config(e.to_string()))
    }

    /// `sparkly.toml` in the OS config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "sparkly", "sparkly")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
