//! Credentials and defaults.
//!
//! Values come from `~/.notion-task/config.json` (or an explicit path) first
//! and fall back to `NOTION_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use notion_task_core::models::{Priority, PropertyNames, TaskType};
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.notion.com";
/// First API version with data sources and database templates.
pub const DEFAULT_NOTION_VERSION: &str = "2025-09-03";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub database_id: String,
    /// Skips the database lookup when known up front.
    pub data_source_id: Option<String>,
    pub api_url: String,
    pub notion_version: String,
    pub timeout_secs: u64,
    pub properties: PropertyNames,
    pub user: UserConfig,
    pub defaults: Defaults,
}

/// On-disk layout of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub notion: NotionSection,
    pub user: UserConfig,
    pub defaults: Defaults,
    pub properties: PropertyNames,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotionSection {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub data_source_id: Option<String>,
    pub api_url: Option<String>,
    pub version: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// The current user's Notion user ID.
    pub notion_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Assign new tasks to `user.notion_id` when no assignee is given.
    pub auto_assign: bool,
    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
    pub page_size: Option<u32>,
}

impl Config {
    /// Loads from `path`, or the default file location when `None`.
    ///
    /// A missing default file is fine; a missing explicit file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => ConfigFile::read(&path)?,
                _ => ConfigFile::default(),
            },
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merges file values with `env`, file first.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let notion = file.notion;
        let api_key = notion
            .api_key
            .or_else(|| env("NOTION_API_KEY"))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Notion API key is required (config.json or NOTION_API_KEY)".into(),
                )
            })?;
        let database_id = notion
            .database_id
            .or_else(|| env("NOTION_DATABASE_ID"))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Notion database ID is required (config.json or NOTION_DATABASE_ID)".into(),
                )
            })?;

        Ok(Self {
            api_key,
            database_id,
            data_source_id: notion
                .data_source_id
                .or_else(|| env("NOTION_DATA_SOURCE_ID"))
                .filter(|v| !v.trim().is_empty()),
            api_url: notion
                .api_url
                .or_else(|| env("NOTION_API_URL"))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            notion_version: notion
                .version
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            timeout_secs: notion.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            properties: file.properties,
            user: file.user,
            defaults: file.defaults,
        })
    }

    /// Minimal config for a known key and database, with all defaults.
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_id: database_id.into(),
            data_source_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            properties: PropertyNames::default(),
            user: UserConfig::default(),
            defaults: Defaults::default(),
        }
    }
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config file {}: {e}", path.display())))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".notion-task").join("config.json"))
}
