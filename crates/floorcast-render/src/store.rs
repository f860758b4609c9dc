//! Per-session floor/bitmap catalog with image load states.

use std::collections::HashMap;
use std::path::Path;

use image::RgbaImage;
use serde::Deserialize;
use tracing::info;

use floorcast_core::map::{
    Bitmap, CoordinateSystem, Floor, MapDefinition, Rectangle,
};
use floorcast_core::{FloorcastError, Result};

use crate::assets::LoadTarget;

/// Lifecycle of one decoded image resource. `Failed` is terminal —
/// failed loads are never retried.
#[derive(Debug)]
pub enum ImageState {
    Loading,
    Ready(RgbaImage),
    Failed,
}

/// Immutable-per-session catalog of floors and bitmaps plus the
/// decoded images backing them.
#[derive(Debug, Default)]
pub struct FloorDefinitionStore {
    definition: Option<MapDefinition>,
    floor_images: HashMap<String, ImageState>,
    bitmap_images: HashMap<String, ImageState>,
}

impl FloorDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the catalog. Returns the preload set: the
    /// first (active) floor's background plus every cataloged bitmap.
    pub fn load(&mut self, definition: MapDefinition) -> Result<Vec<(LoadTarget, String)>> {
        definition.validate()?;

        let mut preload = Vec::new();
        self.floor_images.clear();
        self.bitmap_images.clear();

        if let Some(first) = definition.floors.first() {
            self.floor_images
                .insert(first.floor_id.clone(), ImageState::Loading);
            preload.push((
                LoadTarget::Floor {
                    floor_id: first.floor_id.clone(),
                },
                first.floor_image.clone(),
            ));
        }
        for bitmap in &definition.bitmaps {
            self.bitmap_images
                .insert(bitmap.bitmap_id.clone(), ImageState::Loading);
            preload.push((
                LoadTarget::Bitmap {
                    bitmap_id: bitmap.bitmap_id.clone(),
                },
                bitmap.bitmap_file.clone(),
            ));
        }

        info!(
            floors = definition.floors.len(),
            bitmaps = definition.bitmaps.len(),
            "map definition loaded"
        );
        self.definition = Some(definition);
        Ok(preload)
    }

    pub fn definition(&self) -> Option<&MapDefinition> {
        self.definition.as_ref()
    }

    pub fn floor(&self, floor_id: &str) -> Option<&Floor> {
        self.definition.as_ref()?.floor(floor_id)
    }

    pub fn first_floor_id(&self) -> Option<String> {
        self.definition
            .as_ref()?
            .floors
            .first()
            .map(|f| f.floor_id.clone())
    }

    pub fn floor_image_state(&self, floor_id: &str) -> Option<&ImageState> {
        self.floor_images.get(floor_id)
    }

    pub fn set_floor_image(&mut self, floor_id: &str, state: ImageState) {
        self.floor_images.insert(floor_id.to_string(), state);
    }

    pub fn set_bitmap_image(&mut self, bitmap_id: &str, state: ImageState) {
        self.bitmap_images.insert(bitmap_id.to_string(), state);
    }

    /// The decoded background for a floor, when ready.
    pub fn floor_image(&self, floor_id: &str) -> Option<&RgbaImage> {
        match self.floor_images.get(floor_id) {
            Some(ImageState::Ready(img)) => Some(img),
            _ => None,
        }
    }

    /// The decoded bitmap, when ready. Anything still loading or
    /// failed is skipped silently at render time.
    pub fn bitmap_image(&self, bitmap_id: &str) -> Option<&RgbaImage> {
        match self.bitmap_images.get(bitmap_id) {
            Some(ImageState::Ready(img)) => Some(img),
            _ => None,
        }
    }
}

/// On-disk shape of the per-floor coordinate/rectangle description
/// document used by legacy single-floor deployments.
#[derive(Debug, Deserialize)]
struct LegacyFloorDoc {
    #[serde(rename = "coordinateSystem")]
    coordinate_system: CoordinateSystem,
    rectangles: Vec<Rectangle>,
}

/// The four directional arrow resources legacy deployments ship.
const LEGACY_ARROW_BITMAPS: [(&str, &str, &str); 4] = [
    ("arrow_up.bmp", "arrow_up", "Up arrow"),
    ("arrow_down.bmp", "arrow_down", "Down arrow"),
    ("arrow_left.bmp", "arrow_left", "Left arrow"),
    ("arrow_right.bmp", "arrow_right", "Right arrow"),
];

/// Convert legacy single-floor data (floor image + rectangle document)
/// into a one-floor [`MapDefinition`], picking up whichever arrow
/// bitmaps exist in `bitmap_dir`.
pub fn build_legacy_definition(
    doc_json: &str,
    floor_image: &str,
    floor_id: &str,
    floor_name: &str,
    bitmap_dir: &Path,
) -> Result<MapDefinition> {
    let doc: LegacyFloorDoc = serde_json::from_str(doc_json)
        .map_err(|e| FloorcastError::Config(format!("legacy floor document: {e}")))?;

    let floor = Floor {
        floor_id: floor_id.to_string(),
        floor_name: floor_name.to_string(),
        floor_image: floor_image.to_string(),
        coordinate_system: doc.coordinate_system,
        rectangles: doc.rectangles,
    };

    let bitmaps = LEGACY_ARROW_BITMAPS
        .iter()
        .filter(|(file, _, _)| bitmap_dir.join(file).is_file())
        .map(|(file, id, name)| Bitmap {
            bitmap_id: (*id).to_string(),
            bitmap_name: (*name).to_string(),
            bitmap_file: bitmap_dir.join(file).to_string_lossy().into_owned(),
        })
        .collect();

    let definition = MapDefinition {
        floors: vec![floor],
        bitmaps,
    };
    definition.validate()?;
    Ok(definition)
}
