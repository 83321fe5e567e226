use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::indicator::IndicatorSpec;
use crate::errors::AppError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "CHARTNAV_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Environment variable overriding the log file location.
pub const LOG_ENV_VAR: &str = "CHARTNAV_LOG";
pub const DEFAULT_LOG_PATH: &str = "chartnav.log";
/// Upper bound for `display.window_days`, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Root configuration, loaded once at startup and passed to each component.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub indicators: Vec<IndicatorSpec>,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the data lives.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub version: String,
    pub data_path: PathBuf,
    /// Index table file name, e.g. `default.feather`.
    pub data_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Single,
    Dual,
}

/// Data resolution loaded into the right pane of a dual layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneSource {
    Daily,
    #[default]
    Minute,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub layout: Layout,
    pub right_pane: PaneSource,
    /// Days shown on either side of a window's date when the index table
    /// carries no explicit range.
    pub window_days: i64,
    pub screenshot_dir: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Single,
            right_pane: PaneSource::Minute,
            window_days: 30,
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let config: AppConfig = serde_json::from_str(content)
            .map_err(|e| AppError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let general = &self.general;
        if general.version.trim().is_empty() {
            return Err(AppError::InvalidConfig("general.version is empty".into()));
        }
        if general.data_path.as_os_str().is_empty() {
            return Err(AppError::InvalidConfig("general.data_path is empty".into()));
        }
        if !general.data_filename.ends_with(".feather")
            || general.data_filename.len() == ".feather".len()
        {
            return Err(AppError::InvalidConfig(format!(
                "general.data_filename must name a .feather file, got '{}'",
                general.data_filename
            )));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.display.window_days) {
            return Err(AppError::InvalidConfig(format!(
                "display.window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS,
                self.display.window_days
            )));
        }
        for spec in &self.indicators {
            spec.validate()?;
        }
        Ok(())
    }
}

/// Configuration path from `CHARTNAV_CONFIG`, falling back to `config.json`.
pub fn resolve_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Display timeframes selectable on minute-resolution charts.
///
/// Only the label shown on the chart changes; the loaded bars do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayTimeframe {
    D1,
    H4,
    H1,
    M15,
    M5,
    M1,
}

impl DisplayTimeframe {
    pub const ALL: [DisplayTimeframe; 6] = [
        DisplayTimeframe::D1,
        DisplayTimeframe::H4,
        DisplayTimeframe::H1,
        DisplayTimeframe::M15,
        DisplayTimeframe::M5,
        DisplayTimeframe::M1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayTimeframe::D1 => "1D",
            DisplayTimeframe::H4 => "4H",
            DisplayTimeframe::H1 => "1H",
            DisplayTimeframe::M15 => "15M",
            DisplayTimeframe::M5 => "5M",
            DisplayTimeframe::M1 => "1M",
        }
    }
}

impl std::fmt::Display for DisplayTimeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisplayTimeframe {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(DisplayTimeframe::D1),
            "4H" => Ok(DisplayTimeframe::H4),
            "1H" => Ok(DisplayTimeframe::H1),
            "15M" => Ok(DisplayTimeframe::M15),
            "5M" => Ok(DisplayTimeframe::M5),
            "1M" => Ok(DisplayTimeframe::M1),
            _ => Err(AppError::InvalidTimeframe(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::indicator::IndicatorKind;

    const SAMPLE: &str = r#"{
        "general": {
            "version": "1.0.0",
            "data_path": "./data",
            "data_filename": "test_data.feather"
        },
        "indicators": [
            {"name": "SMA", "parameters": {"period": 20, "source": "close"}},
            {"name": "SMA", "parameters": {"period": 50, "source": "close"}}
        ]
    }"#;

    #[test]
    fn test_parse_sample_config() {
        let config = AppConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.general.version, "1.0.0");
        assert_eq!(config.general.data_path, PathBuf::from("./data"));
        assert_eq!(config.indicators.len(), 2);
        assert_eq!(config.indicators[1].name, IndicatorKind::SMA);
        assert_eq!(config.indicators[1].parameters.period, 50);
        assert_eq!(config.display.layout, Layout::Single);
        assert_eq!(config.display.window_days, 30);
    }

    #[test]
    fn test_indicators_and_display_are_optional() {
        let config = AppConfig::from_json(
            r#"{"general": {"version": "1", "data_path": "d", "data_filename": "x.feather"}}"#,
        )
        .unwrap();
        assert!(config.indicators.is_empty());
        assert_eq!(config.display.right_pane, PaneSource::Minute);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let err =
            AppConfig::from_json(r#"{"general": {"version": "1", "data_filename": "x.feather"}}"#)
                .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_indicator_fails() {
        let err = AppConfig::from_json(
            r#"{"general": {"version": "1", "data_path": "d", "data_filename": "x.feather"},
                "indicators": [{"name": "MAGIC", "parameters": {"period": 3}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_feather_filename_fails() {
        let err = AppConfig::from_json(
            r#"{"general": {"version": "1", "data_path": "d", "data_filename": "x.csv"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_positive_window_days_fails() {
        let err = AppConfig::from_json(
            r#"{"general": {"version": "1", "data_path": "d", "data_filename": "x.feather"},
                "display": {"window_days": 0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_huge_window_days_fails() {
        let err = AppConfig::from_json(
            r#"{"general": {"version": "1", "data_path": "d", "data_filename": "x.feather"},
                "display": {"window_days": 100000000}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(ref m) if m.contains("window_days")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/definitely/not/here/config.json").unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }

    #[test]
    fn test_timeframe_labels_round_trip() {
        for tf in DisplayTimeframe::ALL {
            assert_eq!(tf.as_str().parse::<DisplayTimeframe>().unwrap(), tf);
        }
        assert_eq!("4h".parse::<DisplayTimeframe>().unwrap(), DisplayTimeframe::H4);
    }

    #[test]
    fn test_unknown_timeframe_label() {
        let err = "garbage".parse::<DisplayTimeframe>().unwrap_err();
        assert!(matches!(err, AppError::InvalidTimeframe(ref s) if s == "garbage"));
    }
}
