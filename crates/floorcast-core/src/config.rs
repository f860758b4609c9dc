//! Configuration loading and accessors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level Floorcast configuration.
///
/// Loaded from JSON5 with `${ENV_VAR}` substitution. Every section is
/// optional; accessors supply defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classify: Option<ClassifyConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Ordered candidate base directories; first existing match wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dirs: Option<Vec<String>>,

    /// Directory scanned for bitmap resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Room names recognized by the free-text heuristic layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_vocabulary: Option<Vec<String>>,

    /// Master switch for the heuristic fallback layer (room-name
    /// matching). Marker grammars are always on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristics: Option<bool>,

    /// Image file extensions accepted as image evidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_height: Option<u32>,

    /// Grid spacing (pixels) for the degraded placeholder surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_spacing: Option<u32>,
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment
/// variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}`
    /// references. A missing file yields the default config.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::FloorcastError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Ordered candidate base directories for asset resolution.
    pub fn asset_dirs(&self) -> Vec<PathBuf> {
        self.assets
            .as_ref()
            .and_then(|a| a.base_dirs.as_ref())
            .map(|dirs| dirs.iter().map(PathBuf::from).collect())
            .unwrap_or_else(|| {
                ["./", "./data", "./output", "./plots"]
                    .iter()
                    .map(PathBuf::from)
                    .collect()
            })
    }

    pub fn bitmap_dir(&self) -> PathBuf {
        self.assets
            .as_ref()
            .and_then(|a| a.bitmap_dir.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./bitmaps"))
    }

    pub fn room_vocabulary(&self) -> Vec<String> {
        self.classify
            .as_ref()
            .and_then(|c| c.room_vocabulary.clone())
            .unwrap_or_else(|| {
                ["Room1", "Room2", "Bathroom", "Kitchen", "Toilet", "Level1", "Level2"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    pub fn heuristics_enabled(&self) -> bool {
        self.classify
            .as_ref()
            .and_then(|c| c.heuristics)
            .unwrap_or(true)
    }

    pub fn image_extensions(&self) -> Vec<String> {
        self.classify
            .as_ref()
            .and_then(|c| c.image_extensions.clone())
            .unwrap_or_else(|| {
                ["png", "jpg", "jpeg", "gif", "bmp", "svg"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let width = self
            .render
            .as_ref()
            .and_then(|r| r.surface_width)
            .unwrap_or(1280);
        let height = self
            .render
            .as_ref()
            .and_then(|r| r.surface_height)
            .unwrap_or(720);
        (width, height)
    }

    pub fn grid_spacing(&self) -> u32 {
        self.render
            .as_ref()
            .and_then(|r| r.grid_spacing)
            .unwrap_or(40)
    }
}
