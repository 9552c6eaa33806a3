//! Global scicloud configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date_range::{CalendarView, Clock};
use crate::error::{SciCloudError, SciCloudResult};

static DEFAULT_DATA_DIR: &str = "~/scicloud";
static DEFAULT_REFRESH_INTERVAL: &str = "5m";
const DEFAULT_UPCOMING_LIMIT: usize = 5;

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

fn default_refresh_interval() -> String {
    DEFAULT_REFRESH_INTERVAL.to_string()
}

fn default_upcoming_limit() -> usize {
    DEFAULT_UPCOMING_LIMIT
}

/// Time-grid sizing, in rem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of one hour in the grid
    pub hour_height: f32,
    /// Floor for very short events
    pub min_height: f32,
    /// Height of the all-day band
    pub all_day_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            hour_height: 4.0,
            min_height: 0.5,
            all_day_height: 1.5,
        }
    }
}

/// Configuration at ~/.config/scicloud/config.toml
///
/// Every key may also be set from the environment as `SCICLOUD_<KEY>`
/// (nested keys joined with `__`, e.g. `SCICLOUD_LAYOUT__HOUR_HEIGHT`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SciCloudConfig {
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    /// Identity used by the CLI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// IANA zone used to decide what "today" is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default)]
    pub default_view: CalendarView,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: usize,

    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Default for SciCloudConfig {
    fn default() -> Self {
        SciCloudConfig {
            data_dir: default_data_dir(),
            owner: None,
            timezone: None,
            default_view: CalendarView::default(),
            refresh_interval: default_refresh_interval(),
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
            layout: LayoutConfig::default(),
        }
    }
}

impl SciCloudConfig {
    pub fn config_path() -> SciCloudResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SciCloudError::Config("Could not determine config directory".into()))?
            .join("scicloud");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, creating a commented template on first run.
    pub fn load() -> SciCloudResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SciCloudResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SCICLOUD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| SciCloudError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SciCloudError::Config(e.to_string()))
    }

    /// Save the current config to ~/.config/scicloud/config.toml
    pub fn save(&self) -> SciCloudResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> SciCloudResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SciCloudError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| SciCloudError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SciCloudResult<()> {
        let contents = format!(
            "\
# scicloud configuration

# Where event data lives:
# data_dir = \"{}\"

# Identity used when running the CLI:
# owner = \"ada\"

# Time zone for deciding what \"today\" is (defaults to the system zone):
# timezone = \"Europe/Berlin\"

# Initial calendar view (\"day\" or \"week\"):
# default_view = \"week\"

# How often open views reload in the background:
# refresh_interval = \"{}\"

# Number of events in the upcoming list:
# upcoming_limit = {}

# [layout]
# hour_height = 4.0
# min_height = 0.5
# all_day_height = 1.5
",
            DEFAULT_DATA_DIR, DEFAULT_REFRESH_INTERVAL, DEFAULT_UPCOMING_LIMIT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SciCloudError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SciCloudError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn refresh_interval(&self) -> SciCloudResult<Duration> {
        humantime::parse_duration(&self.refresh_interval).map_err(|e| {
            SciCloudError::Config(format!(
                "Invalid refresh_interval '{}': {}",
                self.refresh_interval, e
            ))
        })
    }

    pub fn time_zone(&self) -> SciCloudResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| SciCloudError::Config(format!("Unknown timezone '{}'", name)))
            })
            .transpose()
    }

    pub fn clock(&self) -> SciCloudResult<Clock> {
        Ok(Clock::system(self.time_zone()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scicloud/config.toml");
        SciCloudConfig::create_default_config(&path).unwrap();

        let config = SciCloudConfig::load_from(&path).unwrap();
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.default_view, CalendarView::Week);
        assert_eq!(config.upcoming_limit, 5);
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.refresh_interval().unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/scicloud\"\n\
             owner = \"ada\"\n\
             timezone = \"Europe/Berlin\"\n\
             default_view = \"day\"\n\
             refresh_interval = \"90s\"\n\
             [layout]\n\
             hour_height = 3.0\n\
             min_height = 0.25\n\
             all_day_height = 2.0\n",
        )
        .unwrap();

        let config = SciCloudConfig::load_from(&path).unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/srv/scicloud"));
        assert_eq!(config.owner.as_deref(), Some("ada"));
        assert_eq!(config.default_view, CalendarView::Day);
        assert_eq!(config.refresh_interval().unwrap(), Duration::from_secs(90));
        assert_eq!(config.time_zone().unwrap(), Some(chrono_tz::Europe::Berlin));
        assert_eq!(config.layout.hour_height, 3.0);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let config = SciCloudConfig {
            timezone: Some("Mars/Olympus".into()),
            refresh_interval: "soon".into(),
            ..SciCloudConfig::default()
        };
        assert!(matches!(config.time_zone(), Err(SciCloudError::Config(_))));
        assert!(matches!(config.refresh_interval(), Err(SciCloudError::Config(_))));
    }

    #[test]
    fn test_save_round_trips_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = SciCloudConfig {
            owner: Some("ada".into()),
            ..SciCloudConfig::default()
        };
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("owner = \"ada\""));
        assert!(!content.contains("data_dir"));
        assert_eq!(SciCloudConfig::load_from(&path).unwrap().owner.as_deref(), Some("ada"));
    }
}
