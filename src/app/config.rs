// varwatch - app/config.rs
//
// config.toml loading with startup validation. Invalid values produce
// actionable warnings and fall back to defaults; unknown keys are ignored
// for forward compatibility.

use crate::util::constants;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw deserialisable shape of config.toml.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[monitor]` section.
    pub monitor: MonitorSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[monitor]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Override of the analyser temp root (defaults to the OS temp dir).
    pub temp_root: Option<String>,
    /// Overall discovery budget in seconds.
    pub discovery_timeout_secs: Option<u64>,
    /// Interval between discovery attempts in ms.
    pub discovery_retry_ms: Option<u64>,
    /// Poll interval while the dictionary section has not begun, in ms.
    pub coarse_poll_ms: Option<u64>,
    /// Poll interval while the dictionary section is being written, in ms.
    pub fine_poll_ms: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory scanned for analyser workspaces.
    pub temp_root: PathBuf,
    /// Overall wall-clock budget for workspace discovery.
    pub discovery_timeout: Duration,
    /// Interval between discovery attempts.
    pub discovery_retry: Duration,
    /// Poll interval before the dictionary section begins.
    pub coarse_poll: Duration,
    /// Poll interval once the dictionary section is streaming.
    pub fine_poll: Duration,
    /// Logging level string (applied before tracing is initialised).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            discovery_timeout: Duration::from_secs(constants::DEFAULT_DISCOVERY_TIMEOUT_SECS),
            discovery_retry: Duration::from_millis(constants::DEFAULT_DISCOVERY_RETRY_MS),
            coarse_poll: Duration::from_millis(constants::DEFAULT_COARSE_POLL_MS),
            fine_poll: Duration::from_millis(constants::DEFAULT_FINE_POLL_MS),
            log_level: None,
        }
    }
}

/// Load and validate configuration.
///
/// `path` is an explicit config file (CLI `--config`); when `None`, the
/// default `config.toml` in the working directory is used if present.
/// A missing file yields defaults with no warnings (first run); an
/// unparseable file yields defaults with a warning -- the tool still starts
/// but the user is informed.
pub fn load_config(path: Option<&Path>) -> (AppConfig, Vec<String>) {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(constants::CONFIG_FILE_NAME));

    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig::default();

    // -- Monitor: temp_root --
    if let Some(ref root) = raw.monitor.temp_root {
        let root_path = PathBuf::from(root);
        if root_path.is_dir() {
            config.temp_root = root_path;
        } else {
            warnings.push(format!(
                "[monitor] temp_root = \"{root}\" is not a directory. Using the OS temp dir.",
            ));
        }
    }

    // -- Monitor: discovery_timeout_secs --
    if let Some(secs) = raw.monitor.discovery_timeout_secs {
        if (1..=constants::MAX_DISCOVERY_TIMEOUT_SECS).contains(&secs) {
            config.discovery_timeout = Duration::from_secs(secs);
        } else {
            warnings.push(format!(
                "[monitor] discovery_timeout_secs = {secs} is out of range (1-{}). Using default ({}).",
                constants::MAX_DISCOVERY_TIMEOUT_SECS,
                constants::DEFAULT_DISCOVERY_TIMEOUT_SECS,
            ));
        }
    }

    // -- Monitor: discovery_retry_ms --
    if let Some(ms) = raw.monitor.discovery_retry_ms {
        if (constants::MIN_DISCOVERY_RETRY_MS..=constants::MAX_DISCOVERY_RETRY_MS).contains(&ms) {
            config.discovery_retry = Duration::from_millis(ms);
        } else {
            warnings.push(format!(
                "[monitor] discovery_retry_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_DISCOVERY_RETRY_MS,
                constants::MAX_DISCOVERY_RETRY_MS,
                constants::DEFAULT_DISCOVERY_RETRY_MS,
            ));
        }
    }

    // -- Monitor: coarse_poll_ms --
    if let Some(ms) = raw.monitor.coarse_poll_ms {
        if (constants::MIN_POLL_MS..=constants::MAX_POLL_MS).contains(&ms) {
            config.coarse_poll = Duration::from_millis(ms);
        } else {
            warnings.push(format!(
                "[monitor] coarse_poll_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_POLL_MS,
                constants::MAX_POLL_MS,
                constants::DEFAULT_COARSE_POLL_MS,
            ));
        }
    }

    // -- Monitor: fine_poll_ms --
    if let Some(ms) = raw.monitor.fine_poll_ms {
        if (constants::MIN_POLL_MS..=constants::MAX_POLL_MS).contains(&ms) {
            config.fine_poll = Duration::from_millis(ms);
        } else {
            warnings.push(format!(
                "[monitor] fine_poll_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_POLL_MS,
                constants::MAX_POLL_MS,
                constants::DEFAULT_FINE_POLL_MS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_yields_defaults_silently() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(Some(&dir.path().join("absent.toml")));
        assert!(warnings.is_empty());
        assert_eq!(
            config.discovery_timeout,
            Duration::from_secs(constants::DEFAULT_DISCOVERY_TIMEOUT_SECS)
        );
        assert_eq!(config.temp_root, std::env::temp_dir());
    }

    #[test]
    fn test_valid_values_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            format!(
                "[monitor]\n\
                 temp_root = \"{}\"\n\
                 discovery_timeout_secs = 120\n\
                 coarse_poll_ms = 1000\n\
                 fine_poll_ms = 100\n\
                 [logging]\n\
                 level = \"debug\"\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let (config, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.temp_root, dir.path());
        assert_eq!(config.discovery_timeout, Duration::from_secs(120));
        assert_eq!(config.coarse_poll, Duration::from_millis(1000));
        assert_eq!(config.fine_poll, Duration::from_millis(100));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[monitor]\ndiscovery_timeout_secs = 0\nfine_poll_ms = 999999\n",
        )
        .unwrap();

        let (config, warnings) = load_config(Some(&path));
        assert_eq!(warnings.len(), 2, "warnings: {warnings:?}");
        assert_eq!(
            config.discovery_timeout,
            Duration::from_secs(constants::DEFAULT_DISCOVERY_TIMEOUT_SECS)
        );
        assert_eq!(
            config.fine_poll,
            Duration::from_millis(constants::DEFAULT_FINE_POLL_MS)
        );
    }

    #[test]
    fn test_unparseable_file_warns_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").unwrap();

        let (config, warnings) = load_config(Some(&path));
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            config.coarse_poll,
            Duration::from_millis(constants::DEFAULT_COARSE_POLL_MS)
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[monitor]\nfuture_knob = 7\n[future_section]\nx = 1\n").unwrap();

        let (_, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty());
    }
}
