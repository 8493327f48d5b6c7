//! JSON configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use directories::ProjectDirs;
use fxhist_calendar::{CalendarZone, gmt_to_fxt};
use fxhist_format::FormatVersion;
use fxhist_types::{CalendarError, Period};
use serde::{Deserialize, Serialize};

use crate::{Result, SyncError, paths};

/// Environment variable overriding [`Config::data_root`].
pub const DATA_ROOT_ENV: &str = "FXHIST_DATA_ROOT";

/// Clock in which history files store bar times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBase {
    /// Forex Time, the clock of the raw day files.
    #[default]
    Fxt,
    /// Greenwich Mean Time.
    Gmt,
}

impl TimeBase {
    /// Returns the calendar zone matching this clock.
    #[must_use]
    pub const fn zone(self) -> CalendarZone {
        match self {
            Self::Fxt => CalendarZone::Fxt,
            Self::Gmt => CalendarZone::Gmt,
        }
    }

    /// Returns the FXT trading day of a bar time stored in this clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the time cannot be converted or mapped onto a date.
    pub fn fxt_date(self, time: i64) -> std::result::Result<NaiveDate, CalendarError> {
        let fxt = match self {
            Self::Fxt => time,
            Self::Gmt => gmt_to_fxt(time)?,
        };
        DateTime::from_timestamp(fxt, 0)
            .map(|dt| dt.date_naive())
            .ok_or(CalendarError::OutOfRange(fxt))
    }
}

/// Settings shared by the CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the `history/` tree.
    pub data_root: PathBuf,
    /// Raw data source directory name.
    pub source: String,
    /// Directory name for merged history files.
    pub provider: String,
    /// Symbol catalog location; `{data_root}/symbols.json` when unset.
    pub catalog: Option<PathBuf>,
    /// Record layout for new history files.
    pub format_version: FormatVersion,
    /// Clock of the stored bar times.
    pub time_base: TimeBase,
    /// Periods maintained per symbol.
    pub periods: Vec<Period>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            source: "dukascopy".to_string(),
            provider: "fxhist".to_string(),
            catalog: None,
            format_version: FormatVersion::V400,
            time_base: TimeBase::Fxt,
            periods: Period::all().to_vec(),
        }
    }
}

impl Config {
    /// Returns the default config file location.
    ///
    /// Uses the `directories` crate to find the appropriate location:
    /// - Linux: `~/.config/fxhist/config.json`
    /// - macOS: `~/Library/Application Support/fxhist/config.json`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\fxhist\config\config.json`
    ///
    /// Falls back to `~/.fxhist/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "fxhist")
            .map_or_else(dirs_fallback, |dirs| dirs.config_dir().to_path_buf())
            .join("config.json")
    }

    /// Loads the config, then applies the environment override.
    ///
    /// Without an explicit path a missing default file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if an explicit file is missing, or any
    /// file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(root) = std::env::var_os(DATA_ROOT_ENV) {
            config.data_root = PathBuf::from(root);
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SyncError::config(path, e))?;
        serde_json::from_str(&content).map_err(|e| SyncError::config(path, e))
    }

    /// Writes the config as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::config(path, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| SyncError::config(path, e))?;
        fs::write(path, json).map_err(|e| SyncError::config(path, e))
    }

    /// Returns the symbol catalog location.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| self.data_root.join("symbols.json"))
    }

    /// Returns the directory holding the merged history files.
    #[must_use]
    pub fn history_dir(&self) -> PathBuf {
        paths::history_dir(&self.data_root, &self.provider)
    }
}

fn default_data_root() -> PathBuf {
    ProjectDirs::from("", "", "fxhist")
        .map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".fxhist")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "data_root": "/srv/fx", "time_base": "gmt", "format_version": 401 }"#)
            .unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/fx"));
        assert_eq!(config.time_base, TimeBase::Gmt);
        assert_eq!(config.format_version, FormatVersion::V401);
        assert_eq!(config.provider, "fxhist");
        assert_eq!(config.periods.len(), 9);
        assert_eq!(config.catalog_path(), PathBuf::from("/srv/fx/symbols.json"));
        assert_eq!(config.history_dir(), PathBuf::from("/srv/fx/history/fxhist"));
    }

    #[test]
    fn test_rejects_unknown_format_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "format_version": 402 }"#).unwrap();
        assert!(matches!(Config::read(&path), Err(SyncError::Config { .. })));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(SyncError::Config { .. })));
    }

    #[test]
    fn test_save_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            periods: vec![Period::M1, Period::D1],
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn test_fxt_date_of_gmt_time() {
        // 2024-01-02 23:00 GMT is 2024-01-03 01:00 FXT
        assert_eq!(
            TimeBase::Gmt.fxt_date(1_704_236_400).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert_eq!(
            TimeBase::Fxt.fxt_date(1_704_236_400).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }
}
