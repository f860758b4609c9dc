//! Floorplan data model.
//!
//! Field names follow the session wire format (camelCase), so every
//! type here serializes directly into `map_definition` / `map`
//! messages without an adapter layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FloorcastError, Result};

/// A point in a floor's virtual coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// One calibration anchor carrying both image-pixel and virtual
/// coordinates for the same physical point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    /// Image-pixel X.
    pub px: f64,
    /// Image-pixel Y.
    pub py: f64,
    /// Virtual X.
    pub x: f64,
    /// Virtual Y.
    pub y: f64,
}

/// Mapping between virtual and image-pixel coordinates, defined by two
/// anchors. X and Y scale independently — no uniform-scale assumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    #[serde(rename = "topLeft")]
    pub top_left: AnchorPoint,
    #[serde(rename = "bottomRight")]
    pub bottom_right: AnchorPoint,
}

impl CoordinateSystem {
    /// A coordinate system is degenerate when its anchors coincide on
    /// either axis (in virtual space); transforms are undefined then.
    pub fn is_degenerate(&self) -> bool {
        (self.bottom_right.x - self.top_left.x).abs() < f64::EPSILON
            || (self.bottom_right.y - self.top_left.y).abs() < f64::EPSILON
    }
}

/// A named axis-aligned region on a floor, in virtual coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub name: String,
    #[serde(rename = "topLeft")]
    pub top_left: Coordinate,
    #[serde(rename = "bottomRight")]
    pub bottom_right: Coordinate,
}

impl Rectangle {
    /// Geometric midpoint of the two corners.
    pub fn midpoint(&self) -> Coordinate {
        Coordinate {
            x: (self.top_left.x + self.bottom_right.x) / 2.0,
            y: (self.top_left.y + self.bottom_right.y) / 2.0,
        }
    }

    /// Corners must differ in both axes.
    pub fn validate(&self) -> Result<()> {
        if (self.top_left.x - self.bottom_right.x).abs() < f64::EPSILON
            || (self.top_left.y - self.bottom_right.y).abs() < f64::EPSILON
        {
            return Err(FloorcastError::Config(format!(
                "rectangle '{}' is degenerate",
                self.name
            )));
        }
        Ok(())
    }
}

/// One level of a building: background image, coordinate calibration,
/// and named rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    #[serde(rename = "floorId")]
    pub floor_id: String,
    #[serde(rename = "floorName")]
    pub floor_name: String,
    #[serde(rename = "floorImage")]
    pub floor_image: String,
    #[serde(rename = "coordinateSystem")]
    pub coordinate_system: CoordinateSystem,
    pub rectangles: Vec<Rectangle>,
}

impl Floor {
    /// Look up a rectangle by name.
    pub fn rectangle(&self, name: &str) -> Option<&Rectangle> {
        self.rectangles.iter().find(|r| r.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.coordinate_system.is_degenerate() {
            return Err(FloorcastError::Config(format!(
                "floor '{}' has a degenerate coordinate system",
                self.floor_id
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for rect in &self.rectangles {
            rect.validate()?;
            if !seen.insert(rect.name.as_str()) {
                return Err(FloorcastError::Config(format!(
                    "floor '{}' has duplicate rectangle '{}'",
                    self.floor_id, rect.name
                )));
            }
        }
        Ok(())
    }
}

/// A bitmap resource available for overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitmap {
    #[serde(rename = "bitmapId")]
    pub bitmap_id: String,
    #[serde(rename = "bitmapName")]
    pub bitmap_name: String,
    #[serde(rename = "bitmapFile")]
    pub bitmap_file: String,
}

/// The complete per-session catalog: all floors plus all bitmaps.
/// Pushed once per session; replaces any prior catalog atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub floors: Vec<Floor>,
    pub bitmaps: Vec<Bitmap>,
}

impl MapDefinition {
    pub fn floor(&self, floor_id: &str) -> Option<&Floor> {
        self.floors.iter().find(|f| f.floor_id == floor_id)
    }

    pub fn bitmap(&self, bitmap_id: &str) -> Option<&Bitmap> {
        self.bitmaps.iter().find(|b| b.bitmap_id == bitmap_id)
    }

    pub fn validate(&self) -> Result<()> {
        for floor in &self.floors {
            floor.validate()?;
        }
        Ok(())
    }
}

fn default_stroke_opacity() -> f64 {
    1.0
}

fn default_fill_opacity() -> f64 {
    0.25
}

/// Ephemeral display config for one named rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRectangle {
    pub name: String,
    #[serde(default = "default_display_color")]
    pub color: String,
    #[serde(rename = "strokeOpacity", default = "default_stroke_opacity")]
    pub stroke_opacity: f64,
    #[serde(rename = "fillOpacity", default = "default_fill_opacity")]
    pub fill_opacity: f64,
    #[serde(rename = "showName", default)]
    pub show_name: bool,
}

fn default_display_color() -> String {
    "#ff0000".to_string()
}

/// Where an overlay is placed, before the virtual-space offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayPosition {
    /// Midpoint of a named rectangle. When `highlight_color` is set,
    /// placement also highlights the rectangle itself (explicit opt-in;
    /// there is no implicit color-driven highlight).
    Rectangle {
        name: String,
        #[serde(
            rename = "highlightColor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        highlight_color: Option<String>,
    },
    /// Direct virtual coordinates.
    Coordinate { x: f64, y: f64 },
}

/// A bitmap or text annotation placed atop a floor rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    Bitmap {
        #[serde(rename = "bitmapId")]
        bitmap_id: String,
        position: OverlayPosition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<Coordinate>,
    },
    Text {
        text: String,
        position: OverlayPosition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<Coordinate>,
        #[serde(rename = "fontSize", default = "default_font_size")]
        font_size: f64,
        #[serde(default = "default_text_color")]
        color: String,
        #[serde(
            rename = "backgroundColor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        background_color: Option<String>,
    },
}

fn default_font_size() -> f64 {
    14.0
}

fn default_text_color() -> String {
    "#000000".to_string()
}

impl Overlay {
    pub fn position(&self) -> &OverlayPosition {
        match self {
            Overlay::Bitmap { position, .. } | Overlay::Text { position, .. } => position,
        }
    }

    pub fn offset(&self) -> Option<Coordinate> {
        match self {
            Overlay::Bitmap { offset, .. } | Overlay::Text { offset, .. } => *offset,
        }
    }
}

/// A full rectangle/overlay snapshot for one floor — not a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDirective {
    #[serde(rename = "floorId")]
    pub floor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rectangles: Vec<DisplayRectangle>,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}
