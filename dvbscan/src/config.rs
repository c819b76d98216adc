//! Optional TOML configuration file.
//!
//! ```toml
//! [tuner]
//! adapter = 0
//! frontend = 0
//!
//! [scan]
//! timeout_secs = 11
//! tick_ms = 250
//! max_programs = 128
//!
//! [output]
//! channels_file = "channels.conf"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::aggregator::ScanLimits;
use crate::scan::ScanConfig;

const FILE_NAME: &str = "dvbscan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, serde::Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub tuner: TunerSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, serde::Deserialize, Default, PartialEq)]
pub struct TunerSection {
    pub adapter: Option<u32>,
    pub frontend: Option<u32>,
}

#[derive(Debug, serde::Deserialize, Default, PartialEq)]
pub struct ScanSection {
    pub timeout_secs: Option<u64>,
    pub tick_ms: Option<u64>,
    pub max_programs: Option<usize>,
}

#[derive(Debug, serde::Deserialize, Default, PartialEq)]
pub struct OutputSection {
    pub channels_file: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize, Default, PartialEq)]
pub struct LoggingSection {
    pub level: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scan settings with defaults filled in.
    pub fn scan_config(&self) -> Result<ScanConfig, ConfigError> {
        let mut config = ScanConfig::default();

        if let Some(secs) = self.scan.timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "scan.timeout_secs",
                    reason: "must be positive".into(),
                });
            }
            config.limits.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.scan.tick_ms {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    key: "scan.tick_ms",
                    reason: "must be positive".into(),
                });
            }
            config.tick = Duration::from_millis(ms);
        }
        if let Some(max) = self.scan.max_programs {
            if max == 0 {
                return Err(ConfigError::Invalid {
                    key: "scan.max_programs",
                    reason: "must be positive".into(),
                });
            }
            config.limits = ScanLimits {
                max_programs: max,
                ..config.limits
            };
        }

        Ok(config)
    }
}

pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ConfigFile::parse(&contents, path)
}

/// Default config location: `$XDG_CONFIG_HOME/dvbscan/dvbscan.toml`, falling
/// back to `~/.config/dvbscan/dvbscan.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_path_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = xdg.filter(|d| d.is_absolute()) {
        return Some(dir.join("dvbscan").join(FILE_NAME));
    }
    home.map(|h| h.join(".config").join("dvbscan").join(FILE_NAME))
}

/// Load the explicit file, or the default one if it exists.
///
/// A missing default file is not an error; a missing explicit one is.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }
    match default_config_path() {
        Some(path) if path.exists() => Ok((load_config(&path)?, Some(path))),
        _ => Ok((ConfigFile::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let text = r#"
[tuner]
adapter = 1
frontend = 0

[scan]
timeout_secs = 20
tick_ms = 100
max_programs = 64

[output]
channels_file = "/tmp/channels.conf"

[logging]
level = "debug"
"#;
        let config = ConfigFile::parse(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.tuner.adapter, Some(1));
        assert_eq!(config.tuner.frontend, Some(0));
        assert_eq!(
            config.output.channels_file.as_deref(),
            Some(Path::new("/tmp/channels.conf"))
        );
        assert_eq!(config.logging.level.as_deref(), Some("debug"));

        let scan = config.scan_config().unwrap();
        assert_eq!(scan.limits.timeout, Duration::from_secs(20));
        assert_eq!(scan.tick, Duration::from_millis(100));
        assert_eq!(scan.limits.max_programs, 64);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = ConfigFile::parse("[tuner]\nadapter = 2\n", Path::new("x")).unwrap();
        assert_eq!(config.scan, ScanSection::default());
        assert_eq!(config.scan_config().unwrap(), ScanConfig::default());
        assert_eq!(ConfigFile::parse("", Path::new("x")).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_rejects_zero_values() {
        let config = ConfigFile::parse("[scan]\ntick_ms = 0\n", Path::new("x")).unwrap();
        assert!(matches!(
            config.scan_config(),
            Err(ConfigError::Invalid { key: "scan.tick_ms", .. })
        ));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigFile::parse("[scan]\ntimeout_secs = \"soon\"\n", Path::new("bad.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_default_path_lookup() {
        assert_eq!(
            config_path_from(Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg/dvbscan/dvbscan.toml"))
        );
        assert_eq!(
            config_path_from(Some("relative".into()), Some("/home/u".into())),
            Some(PathBuf::from("/home/u/.config/dvbscan/dvbscan.toml"))
        );
        assert_eq!(config_path_from(None, None), None);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let path = std::env::temp_dir().join("dvbscan-no-such-config.toml");
        assert!(matches!(
            resolve_config(Some(path.as_path())),
            Err(ConfigError::Read { .. })
        ));
    }
}
