// nextboot - platform/config.rs
//
// Config directory resolution and config.toml loading with startup
// validation. Every value is checked against named constants; a bad value
// produces an actionable warning and falls back to its default. A broken
// config never stops a reboot switch from running.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows), and
// Library (macOS) compliance.

use crate::core::model::RewriteMode;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for nextboot configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/nextboot/ or %APPDATA%\nextboot\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[locator]` section.
    pub locator: LocatorSection,
    /// `[rewrite]` section.
    pub rewrite: RewriteSection,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// `[locator]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LocatorSection {
    /// Maximum directory depth searched for refind.conf.
    pub max_depth: Option<usize>,
}

/// `[rewrite]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RewriteSection {
    /// "line" or "prefix".
    pub mode: Option<String>,
}

/// Validated configuration derived from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Maximum directory depth searched for refind.conf.
    pub max_depth: usize,

    /// How the default-selection directive is replaced.
    pub rewrite_mode: RewriteMode,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,

    /// Log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            rewrite_mode: RewriteMode::default(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate config.toml from `config_dir`.
///
/// Returns the validated config and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning.
///
/// Called before logging is initialised (the log level comes from here), so
/// warnings are returned for the caller to report.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path,
                source,
            };
            return (AppConfig::default(), vec![format!("{err}. Using defaults.")]);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path,
                source,
            };
            return (AppConfig::default(), vec![format!("{err}. Using defaults.")]);
        }
    };

    validate(&raw)
}

/// Turn a parsed config into validated values, accumulating every problem.
pub fn validate(raw: &RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    let mut out_of_range = |field: &str, value: String, expected: String, default: String| {
        let err = ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value,
            expected,
        };
        warnings.push(format!("{err}. Using default ({default})."));
    };

    // -- Locator: max_depth --
    if let Some(depth) = raw.locator.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            out_of_range(
                "[locator] max_depth",
                depth.to_string(),
                format!("1-{}", constants::ABSOLUTE_MAX_DEPTH),
                constants::DEFAULT_MAX_DEPTH.to_string(),
            );
        }
    }

    // -- Rewrite: mode --
    if let Some(ref mode) = raw.rewrite.mode {
        match RewriteMode::from_config_str(mode) {
            Some(m) => config.rewrite_mode = m,
            None => out_of_range(
                "[rewrite] mode",
                mode.clone(),
                "\"line\" or \"prefix\"".to_string(),
                RewriteMode::default().label().to_string(),
            ),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            out_of_range(
                "[logging] level",
                level.clone(),
                valid.join(", "),
                constants::DEFAULT_LOG_LEVEL.to_string(),
            );
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(PathBuf::from(file));
        }
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load_from(toml_text: &str) -> (AppConfig, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::CONFIG_FILE_NAME), toml_text).unwrap();
        load_config(dir.path())
    }

    #[test]
    fn test_missing_file_gives_defaults_silently() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = load_from(
            r#"
            [logging]
            level = "DEBUG"
            file = "/var/log/nextboot.log"

            [locator]
            max_depth = 4

            [rewrite]
            mode = "prefix"
            "#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.rewrite_mode, RewriteMode::Prefix);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/nextboot.log")));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let (config, warnings) = load_from(
            r#"
            [logging]
            level = "loud"

            [locator]
            max_depth = 500

            [rewrite]
            mode = "regex"
            "#,
        );
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 3, "got {warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("max_depth")));
        assert!(warnings.iter().any(|w| w.contains("mode")));
        assert!(warnings.iter().any(|w| w.contains("level")));
    }

    #[test]
    fn test_unparseable_file_warns_and_uses_defaults() {
        let (config, warnings) = load_from("[locator\nmax_depth = ");
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"), "got {warnings:?}");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (config, warnings) = load_from("[ui]\ntheme = \"dark\"\n[locator]\nmax_depth = 2\n");
        assert!(warnings.is_empty());
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_empty_log_file_means_stderr_only() {
        let (config, _) = load_from("[logging]\nfile = \"\"\n");
        assert_eq!(config.log_file, None);
    }
}
