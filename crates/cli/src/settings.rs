use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use backdrop_core::compositing::domain::compositor_config::CompositorConfig;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Optional persisted defaults. Every field may be omitted; command-line
/// flags take precedence over anything set here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Segmentation model path or URL.
    pub model: Option<String>,
    pub threshold: Option<f32>,
    pub min_strength: Option<u32>,
    pub default_strength: Option<u32>,
    pub max_strength: Option<u32>,
    pub segment_every: Option<usize>,
}

impl Settings {
    /// `<config dir>/Backdrop/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("Backdrop").join("settings.json"))
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` (which must exist) or, without one, the default
    /// location when a file is present there.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Overlays the values present here onto `base`.
    pub fn apply(&self, base: CompositorConfig) -> CompositorConfig {
        CompositorConfig {
            threshold: self.threshold.unwrap_or(base.threshold),
            min_strength: self.min_strength.unwrap_or(base.min_strength),
            default_strength: self.default_strength.unwrap_or(base.default_strength),
            max_strength: self.max_strength.unwrap_or(base.max_strength),
        }
    }
}
