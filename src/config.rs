use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::codec::{CodecRanges, EditableRange};

const CONFIG_FILE: &str = "config.json";
const DEFAULT_DB_FILE: &str = "editor.sqlite";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    pub read_only_databases: Vec<String>,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub datetime_min: NaiveDateTime,
    pub datetime_max: NaiveDateTime,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let ranges = CodecRanges::default();
        Self {
            database_path: None,
            read_only_databases: ["information_schema", "mysql", "sys", "performance_schema"]
                .into_iter()
                .map(String::from)
                .collect(),
            date_min: ranges.date.min,
            date_max: ranges.date.max,
            datetime_min: ranges.datetime.min,
            datetime_max: ranges.datetime.max,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write config: {}", path.display()))
    }

    pub fn codec_ranges(&self) -> CodecRanges {
        CodecRanges {
            date: EditableRange::new(
                self.date_min.min(self.date_max),
                self.date_min.max(self.date_max),
            ),
            datetime: EditableRange::new(
                self.datetime_min.min(self.datetime_max),
                self.datetime_min.max(self.datetime_max),
            ),
        }
    }

    pub fn is_read_only(&self, database: &str) -> bool {
        self.read_only_databases
            .iter()
            .any(|name| name.eq_ignore_ascii_case(database))
    }

    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "hellhbbd", "table-editor")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

pub fn load_default_config() -> Result<AppConfig> {
    AppConfig::load(&default_config_path()?)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join(DEFAULT_DB_FILE))
}

pub fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}
