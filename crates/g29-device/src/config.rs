//! Device wrapper configuration.
//!
//! Every field has a default, so an empty document is a valid config. Files
//! ending in `.json` are read as JSON; anything else is read as YAML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use racing_wheel_hid_g29_protocol::{G29_PRODUCT_ID, LOGITECH_VENDOR_ID, RESET_SETTLE_DELAY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct G29Config {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Budget for one regular poll.
    pub poll_timeout_ms: u64,
    /// Budget for the first report during `connect`.
    pub connect_timeout_ms: u64,
    /// How long effect commands are held off after a reset.
    pub settle_delay_ms: u64,
    /// Reject effect commands inside the settle window instead of sending them.
    pub enforce_settle: bool,
    pub reset_on_connect: bool,
}

impl Default for G29Config {
    fn default() -> Self {
        Self {
            vendor_id: LOGITECH_VENDOR_ID,
            product_id: G29_PRODUCT_ID,
            poll_timeout_ms: 1_000,
            connect_timeout_ms: 10_000,
            settle_delay_ms: u64::try_from(RESET_SETTLE_DELAY.as_millis()).unwrap_or(10_000),
            enforce_settle: true,
            reset_on_connect: false,
        }
    }
}

impl G29Config {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults_match_g29() -> TestResult {
        let config = G29Config::default();
        assert_eq!(config.vendor_id, 0x046D);
        assert_eq!(config.product_id, 0xC24F);
        assert_eq!(config.poll_timeout(), Duration::from_secs(1));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.settle_delay(), Duration::from_secs(10));
        assert!(config.enforce_settle);
        assert!(!config.reset_on_connect);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_empty_yaml_is_default() -> TestResult {
        let config = G29Config::from_yaml_str("{}")?;
        assert_eq!(config, G29Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_yaml_overrides() -> TestResult {
        let config = G29Config::from_yaml_str(
            "poll_timeout_ms: 250\nsettle_delay_ms: 0\nreset_on_connect: true\n",
        )?;
        assert_eq!(config.poll_timeout(), Duration::from_millis(250));
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert!(config.reset_on_connect);
        assert_eq!(config.product_id, 0xC24F);
        Ok(())
    }

    #[test]
    fn test_json_config() -> TestResult {
        let config = G29Config::from_json_str(r#"{"connect_timeout_ms": 500, "enforce_settle": false}"#)?;
        assert_eq!(config.connect_timeout(), Duration::from_millis(500));
        assert!(!config.enforce_settle);
        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = G29Config::from_yaml_str("poll_timeout: 10\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let result = G29Config::from_yaml_str("poll_timeout_ms: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "poll_timeout_ms",
                ..
            })
        ));

        let result = G29Config::from_json_str(r#"{"connect_timeout_ms": 0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "connect_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_load_picks_format_by_extension() -> TestResult {
        let dir = std::env::temp_dir().join(format!("g29-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;

        let yaml = dir.join("wheel.yaml");
        std::fs::write(&yaml, "poll_timeout_ms: 40\n")?;
        assert_eq!(G29Config::load(&yaml)?.poll_timeout_ms, 40);

        let json = dir.join("wheel.JSON");
        std::fs::write(&json, r#"{"poll_timeout_ms": 41}"#)?;
        assert_eq!(G29Config::load(&json)?.poll_timeout_ms, 41);

        let missing = dir.join("absent.yaml");
        assert!(matches!(G29Config::load(&missing), Err(ConfigError::Io { .. })));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
