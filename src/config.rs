// Persistent settings for flowdeps
// Stored as JSON in the user's config directory; every key is optional.

use crate::discovery::DEFAULT_WORKFLOWS_SUBDIR;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Unpacked solution used when `--dir` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_dir: Option<PathBuf>,
    /// Folder under the solution that holds the flow definitions.
    pub workflows_subdir: String,
    /// Analyze files on the rayon thread pool.
    pub parallel: bool,
    /// Default output format: table, plain or json.
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solution_dir: None,
            workflows_subdir: DEFAULT_WORKFLOWS_SUBDIR.to_string(),
            parallel: true,
            format: "table".to_string(),
        }
    }
}

pub const SETTING_KEYS: &[&str] = &["solution_dir", "workflows_subdir", "parallel", "format"];

impl Settings {
    /// Settings for commands that only read them. A file that cannot be
    /// parsed falls back to defaults, with a warning for the user.
    pub fn load_or_default() -> (Self, Option<String>) {
        match Self::config_file_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => (Self::default(), Some(format!("Using default settings: {:#}", e))),
        }
    }

    pub fn load_or_default_from(path: &Path) -> (Self, Option<String>) {
        match Self::load_from(path) {
            Ok(settings) => (settings, None),
            Err(e) => (
                Self::default(),
                Some(format!("Ignoring settings, using defaults: {:#}", e)),
            ),
        }
    }

    /// Change one key in the settings file. A file that does not parse is
    /// left untouched and reported as an error.
    pub fn update(key: &str, value: &str) -> Result<Self> {
        Self::update_at(&Self::config_file_path()?, key, value)
    }

    pub fn update_at(path: &Path, key: &str, value: &str) -> Result<Self> {
        let mut settings = Self::load_from(path)?;
        settings.set(key, value)?;
        settings.save_to(path)?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when no file exists yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid settings file {}: {}", path.display(), e))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|dir| dir.join("flowdeps").join("config.json"))
            .ok_or_else(|| anyhow!("Could not determine config directory or home directory"))
    }

    /// Update one key from its command-line string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "solution_dir" => {
                self.solution_dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "workflows_subdir" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("workflows_subdir cannot be empty"));
                }
                self.workflows_subdir = value.trim().to_string();
            }
            "parallel" => {
                self.parallel = value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("parallel must be 'true' or 'false', got '{}'", value))?;
            }
            "format" => {
                let format = value.trim().to_lowercase();
                if !["table", "plain", "json"].contains(&format.as_str()) {
                    return Err(anyhow!("Unknown format: {}. Supported: table, plain, json", value));
                }
                self.format = format;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown setting: {}. Supported: {}",
                    key,
                    SETTING_KEYS.join(", ")
                ))
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "solution_dir",
                self.solution_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            ("workflows_subdir", self.workflows_subdir.clone()),
            ("parallel", self.parallel.to_string()),
            ("format", self.format.clone()),
        ]
    }
}
