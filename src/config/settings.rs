//! Application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not resolve the platform config directory
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Reading or writing the file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Inclusive integer bounds for a UI-bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lowest accepted value
    pub min: i32,
    /// Highest accepted value
    pub max: i32,
}

impl ValueRange {
    /// Create a range
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the bounds
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp `value` into the bounds
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max.max(self.min))
    }
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device to open (e.g. /dev/ttyACM0, COM3)
    pub device: String,
    /// Line speed
    pub baud_rate: u32,
    /// Maximum wait for one read, in milliseconds
    pub read_timeout_ms: u64,
    /// Delay before retrying after an open or transport failure, in milliseconds
    pub reconnect_backoff_ms: u64,
    /// Bounds for hue values sent to the board
    pub hue_range: ValueRange,
    /// Bounds for potentiometer readings accepted from the board
    pub pot_range: ValueRange,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device: default_device().to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 50,
            reconnect_backoff_ms: 5_000,
            hue_range: ValueRange::new(0, 255),
            pot_range: ValueRange::new(0, 1023),
        }
    }
}

#[cfg(windows)]
fn default_device() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_device() -> &'static str {
    "/dev/ttyACM0"
}

impl LinkConfig {
    /// Create a link config for `device` with reference timings
    pub fn new(device: &str, baud_rate: u32) -> Self {
        Self {
            device: device.to_string(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Set read timeout
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set reconnect backoff
    #[must_use]
    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff_ms = duration_ms(backoff);
        self
    }

    /// Per-read timeout
    pub fn read_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reconnect delay
    pub fn reconnect_backoff_duration(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::Invalid("device must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be positive".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be positive".into()));
        }
        if self.hue_range.min > self.hue_range.max {
            return Err(ConfigError::Invalid("hue_range min exceeds max".into()));
        }
        if self.hue_range.min < 0 || self.hue_range.max > 255 {
            return Err(ConfigError::Invalid(format!(
                "hue_range {}..={} does not fit in a byte",
                self.hue_range.min, self.hue_range.max
            )));
        }
        if self.pot_range.min > self.pot_range.max {
            return Err(ConfigError::Invalid("pot_range min exceeds max".into()));
        }
        Ok(())
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Dashboard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Wait before spawning the serial thread, in milliseconds
    pub startup_delay_ms: u64,
    /// Quiet period after the last slider move before the hue is sent
    pub hue_debounce_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 250,
            hue_debounce_ms: 50,
        }
    }
}

impl UiConfig {
    /// Startup delay as a duration
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Debounce window as a duration
    pub fn hue_debounce(&self) -> Duration {
        Duration::from_millis(self.hue_debounce_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by RUST_LOG)
    pub level: String,
    /// Also write logs to a daily rolling file
    pub file: bool,
    /// Log directory (platform data dir when unset)
    pub directory: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: false,
            directory: None,
            json: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial link
    pub link: LinkConfig,
    /// Dashboard
    pub ui: UiConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        super::config_dir()
            .map(|dir| dir.join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.link.validate()?;
        Ok(config)
    }

    /// Save config to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let link = LinkConfig::default();
        assert_eq!(link.baud_rate, 115_200);
        assert_eq!(link.read_timeout_duration(), Duration::from_millis(50));
        assert_eq!(link.reconnect_backoff_duration(), Duration::from_secs(5));
        assert_eq!(link.hue_range, ValueRange::new(0, 255));
        assert_eq!(link.pot_range, ValueRange::new(0, 1023));
        assert!(link.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(LinkConfig::new("", 9600).validate().is_err());
        assert!(LinkConfig::new("/dev/ttyUSB0", 0).validate().is_err());

        let mut link = LinkConfig::new("/dev/ttyUSB0", 9600);
        link.hue_range = ValueRange::new(0, 300);
        assert!(matches!(link.validate(), Err(ConfigError::Invalid(_))));

        link.hue_range = ValueRange::new(0, 255);
        link.pot_range = ValueRange::new(10, 0);
        assert!(link.validate().is_err());

        let link = LinkConfig::new("/dev/ttyUSB0", 9600).read_timeout(Duration::ZERO);
        assert!(link.validate().is_err());
    }

    #[test]
    fn test_value_range() {
        let range = ValueRange::new(0, 1023);
        assert!(range.contains(0));
        assert!(range.contains(1023));
        assert!(!range.contains(1024));
        assert_eq!(range.clamp(-5), 0);
        assert_eq!(range.clamp(2000), 1023);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.link.device = "/dev/ttyUSB1".to_string();
        config.link.reconnect_backoff_ms = 1_000;
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[link]\ndevice = \"COM7\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.link.device, "COM7");
        assert_eq!(loaded.link.baud_rate, 115_200);
        assert_eq!(loaded.ui, UiConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[link]\nbaud_rate = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "link = 5").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
