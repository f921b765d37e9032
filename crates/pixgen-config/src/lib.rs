//! Persistent configuration for the pixgen wrapper generator
//!
//! The configuration lives in a TOML file (`pixgen.toml`). Its location is
//! resolved in this order:
//! - the `PIXGEN_CONFIG` environment variable, if set and non-empty
//! - a pointer file `.pixgen_config_path` next to the default location
//! - `~/.config/pixgen/pixgen.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod compiler;

pub use compiler::resolve_compiler;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "PIXGEN_CONFIG";

/// Pointer file name stored next to the default config
pub const POINTER_FILE_NAME: &str = ".pixgen_config_path";

/// Extension package prefix used when none is configured
pub const DEFAULT_PACKAGE: &str = "pixgen.plugins";

const DEFAULT_INCLUDE_DIRS: &[&str] = &["include", "include/plugins"];
const DEFAULT_LIBRARIES: &[&str] = &["stdc++"];

/// Keys accepted by `get`/`set`
pub const KNOWN_KEYS: &[&str] = &[
    "output-dir",
    "package",
    "compiler",
    "include-dirs",
    "libraries",
    "link-args",
];

/// Error type for config file operations
#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    Io(PathBuf, std::io::Error),
    /// The config file is not valid TOML for this schema
    Parse(PathBuf, toml::de::Error),
    /// Serializing the config failed
    Serialize(toml::ser::Error),
    /// A key passed to `set` is not known
    UnknownKey(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            ConfigError::Parse(path, err) => {
                write!(f, "Failed to parse {}: {}", path.display(), err)
            }
            ConfigError::Serialize(err) => write!(f, "Failed to serialize config: {}", err),
            ConfigError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {}. Supported keys: {}",
                key,
                KNOWN_KEYS.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
    /// Extra linker arguments for every generated extension
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_args: Vec<String>,
    /// Concrete dispatch variants per abstract pixel type, overriding the
    /// built-in table (e.g. `OneBit = ["OneBitImageView", "Cc"]`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, Vec<String>>,
}

impl Config {
    pub fn path() -> PathBuf {
        // Honor explicit override via PIXGEN_CONFIG for tests / isolated runs.
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        let default = Self::default_path();

        if let Some(parent) = default.parent() {
            let pointer = parent.join(POINTER_FILE_NAME);
            if pointer.exists() {
                if let Ok(contents) = fs::read_to_string(&pointer) {
                    let trimmed = contents.trim();
                    if !trimmed.is_empty() {
                        return PathBuf::from(trimmed);
                    }
                }
            }
        }

        default
    }

    /// Platform default location, ignoring overrides
    pub fn default_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));

        base.join("pixgen").join("pixgen.toml")
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(parent.to_path_buf(), e))?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "output-dir" => self.output_dir.clone(),
            "package" => self.package.clone(),
            "compiler" => self.compiler.clone(),
            "include-dirs" => (!self.include_dirs.is_empty()).then(|| self.include_dirs.join(",")),
            "libraries" => (!self.libraries.is_empty()).then(|| self.libraries.join(",")),
            "link-args" => (!self.link_args.is_empty()).then(|| self.link_args.join(",")),
            _ => None,
        }
    }

    /// Set a key; list-valued keys take a comma separated value
    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "output-dir" => self.output_dir = Some(value),
            "package" => self.package = Some(value),
            "compiler" => self.compiler = Some(value),
            "include-dirs" => self.include_dirs = split_list(&value),
            "libraries" => self.libraries = split_list(&value),
            "link-args" => self.link_args = split_list(&value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.output_dir.is_none()
            && self.package.is_none()
            && self.compiler.is_none()
            && self.include_dirs.is_empty()
            && self.libraries.is_empty()
            && self.link_args.is_empty()
            && self.variants.is_empty()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        KNOWN_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Extension package prefix (`pixgen.plugins` unless configured)
    pub fn package_name(&self) -> String {
        self.package
            .clone()
            .unwrap_or_else(|| DEFAULT_PACKAGE.to_string())
    }

    /// Include directories searched for plugin headers
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        if self.include_dirs.is_empty() {
            DEFAULT_INCLUDE_DIRS.iter().map(PathBuf::from).collect()
        } else {
            self.include_dirs.iter().map(PathBuf::from).collect()
        }
    }

    /// Libraries every generated extension links against
    pub fn libraries(&self) -> Vec<String> {
        if self.libraries.is_empty() {
            DEFAULT_LIBRARIES.iter().map(|s| (*s).to_string()).collect()
        } else {
            self.libraries.clone()
        }
    }

    /// Output directory for generated sources, falling back to `fallback`
    pub fn output_dir_or(&self, fallback: &Path) -> PathBuf {
        self.output_dir
            .as_ref()
            .map_or_else(|| fallback.to_path_buf(), PathBuf::from)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
