//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults. Every
//! struct implements `Default` so a missing or partial config file still
//! produces a working widget.
//!
//! ## Config file search order
//!
//! 1. `WEBWIDGET_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\webwidget\config.toml` on Windows)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub window: WindowConfig,
    pub widget: WidgetConfig,
    pub engine: EngineSettings,
    pub compat: CompatConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub start_url: String,
    pub window_title: String,
}

/// Host window dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

/// Where keyboard input goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardMode {
    /// Keys are forwarded to the engine whenever the widget is alive.
    #[default]
    Global,
    /// Keys are forwarded only while an editable control (text input,
    /// password, textarea) has DOM focus.
    Local,
}

/// Per-widget behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub keyboard_mode: KeyboardMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Verbose,
    #[default]
    Info,
    Warning,
    Error,
    Disable,
}

/// Settings handed to `Engine::initialize`.
///
/// Paths left unset use the engine's own defaults (usually its module
/// directory).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub debug: bool,
    pub log_severity: LogSeverity,
    pub log_file: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
    pub resources_dir: Option<PathBuf>,
    pub browser_subprocess_path: Option<PathBuf>,
    pub windowless_rendering: bool,
}

/// Compatibility scripts injected at load start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Directory holding `select-box.js` / `select-box.css`.
    /// Unset → `<exe_dir>/select-boxes`.
    pub select_box_dir: Option<PathBuf>,
    pub select_box_fix: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default impls
// ─────────────────────────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_url: "https://example.com".to_string(),
            window_title: "webwidget".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debug: false,
            log_severity: LogSeverity::Info,
            log_file: Some(PathBuf::from("debug.log")),
            locales_dir: None,
            resources_dir: None,
            browser_subprocess_path: None,
            windowless_rendering: true,
        }
    }
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            select_box_dir: None,
            select_box_fix: true,
        }
    }
}

impl GeneralConfig {
    /// Parses `start_url`, adding `https://` when no scheme is given.
    pub fn start_url(&self) -> Result<Url, url::ParseError> {
        parse_url(&self.start_url)
    }
}

/// Parses user input as a URL. Without a scheme, `https://` is assumed.
pub fn parse_url(input: &str) -> Result<Url, url::ParseError> {
    match Url::parse(input) {
        Ok(url) => Ok(url),
        Err(_) => Url::parse(&format!("https://{input}")),
    }
}

impl CompatConfig {
    /// Resolved select-box resource directory, or `None` when the fix is off.
    pub fn select_box_dir(&self) -> Option<PathBuf> {
        if !self.select_box_fix {
            return None;
        }
        if let Some(ref dir) = self.select_box_dir {
            return Some(dir.clone());
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("select-boxes")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading and saving
// ─────────────────────────────────────────────────────────────────────────────

const CONFIG_ENV_VAR: &str = "WEBWIDGET_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

impl Config {
    /// Loads the first config file of the search order. Never fails: an
    /// unreadable or invalid file is logged and defaults are used.
    pub fn load() -> Self {
        let Some(path) = config_candidates().into_iter().find(|p| p.is_file()) else {
            info!("No config file found, using defaults");
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|error| {
            warn!(%error, "Using default configuration");
            Self::default()
        })
    }

    /// Loads and parses one specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Saves to the platform config directory and returns the path written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = save_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(write_error)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}

/// Candidate files, highest priority first.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(4);
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(path));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = platform_config_dir() {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    candidates
}

/// Returns the platform-specific save path for the config file.
fn save_path() -> PathBuf {
    platform_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("webwidget"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("webwidget"))
    }
}
