//! Asset resolution and asynchronous image loading.
//!
//! Loads are the only suspension points in the system. Each request
//! carries a monotonically increasing token; the engine compares the
//! token at completion time and discards results from superseded
//! requests — no cancellation primitives involved. A failed load is
//! terminal for that resource and never retried.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tokio::sync::mpsc;
use tracing::debug;

use floorcast_core::config::Config;
use floorcast_core::{FloorcastError, Result};

/// What an image load is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    Floor { floor_id: String },
    Bitmap { bitmap_id: String },
}

/// One pending image load, emitted by the engine for the driver to
/// fulfil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: u64,
    pub target: LoadTarget,
    pub file: String,
}

/// Completion events delivered back into the engine's event loop.
#[derive(Debug)]
pub enum RenderEvent {
    ImageLoaded {
        token: u64,
        target: LoadTarget,
        result: std::result::Result<RgbaImage, String>,
    },
}

/// Resolves file references against the ordered candidate base
/// directories and decodes them off the event thread.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    base_dirs: Vec<PathBuf>,
}

impl AssetLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            base_dirs: config.asset_dirs(),
        }
    }

    pub fn with_base_dirs(base_dirs: Vec<PathBuf>) -> Self {
        Self { base_dirs }
    }

    /// First existing candidate wins; absolute refs are taken as-is.
    pub fn resolve(&self, file: &str) -> Option<PathBuf> {
        let path = Path::new(file);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        self.base_dirs
            .iter()
            .map(|base| base.join(path))
            .find(|joined| joined.is_file())
    }

    /// Resolve and decode synchronously.
    pub fn load_blocking(&self, file: &str) -> Result<RgbaImage> {
        let path = self
            .resolve(file)
            .ok_or_else(|| FloorcastError::Asset(format!("asset '{file}' not found")))?;
        let img = image::open(&path)?;
        Ok(img.to_rgba8())
    }

    /// Run the load on the blocking pool and post the completion back
    /// as a [`RenderEvent`].
    pub fn spawn_load(&self, request: LoadRequest, tx: mpsc::UnboundedSender<RenderEvent>) {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || {
            debug!(file = %request.file, token = request.token, "loading asset");
            let result = loader
                .load_blocking(&request.file)
                .map_err(|e| e.to_string());
            let _ = tx.send(RenderEvent::ImageLoaded {
                token: request.token,
                target: request.target,
                result,
            });
        });
    }
}
