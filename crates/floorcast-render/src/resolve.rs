//! Map directive resolution against the active floor.

use tracing::warn;

use floorcast_core::map::{
    Coordinate, Floor, MapDirective, Overlay, OverlayPosition, Rectangle,
};

/// A display rectangle bound to its floor geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRectangle {
    pub rect: Rectangle,
    pub color: String,
    pub stroke_opacity: f64,
    pub fill_opacity: f64,
    /// Label to draw, when the directive asked for the name.
    pub label: Option<String>,
}

/// An overlay with its placement resolved to virtual coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOverlay {
    Bitmap {
        bitmap_id: String,
        at: Coordinate,
    },
    Text {
        text: String,
        at: Coordinate,
        font_size: f64,
        color: String,
        background_color: Option<String>,
    },
}

/// Everything a directive contributes to the scene, in virtual
/// coordinates; the surface transform is applied at draw time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedScene {
    pub rectangles: Vec<ResolvedRectangle>,
    pub overlays: Vec<ResolvedOverlay>,
}

/// Resolve one directive against its floor. Unknown rectangle or
/// position names are skipped with a warning; the rest of the batch
/// survives.
pub fn resolve_directive(floor: &Floor, directive: &MapDirective) -> ResolvedScene {
    let mut scene = ResolvedScene::default();

    for display_rect in &directive.rectangles {
        let Some(rect) = floor.rectangle(&display_rect.name) else {
            warn!(
                floor = %floor.floor_id,
                name = %display_rect.name,
                "directive references unknown rectangle, skipping"
            );
            continue;
        };
        scene.rectangles.push(ResolvedRectangle {
            rect: rect.clone(),
            color: display_rect.color.clone(),
            stroke_opacity: display_rect.stroke_opacity,
            fill_opacity: display_rect.fill_opacity,
            label: display_rect.show_name.then(|| rect.name.clone()),
        });
    }

    for overlay in &directive.overlays {
        let Some(mut at) = resolve_position(floor, overlay.position()) else {
            continue;
        };
        if let Some(offset) = overlay.offset() {
            // Offsets are virtual-space, applied before the transform.
            at.x += offset.x;
            at.y += offset.y;
        }

        // A rectangle-positioned overlay may also ask for the
        // rectangle itself to light up (explicit opt-in field).
        if let OverlayPosition::Rectangle {
            name,
            highlight_color: Some(color),
        } = overlay.position()
        {
            if let Some(rect) = floor.rectangle(name) {
                scene.rectangles.push(ResolvedRectangle {
                    rect: rect.clone(),
                    color: color.clone(),
                    stroke_opacity: 0.0,
                    fill_opacity: 0.35,
                    label: None,
                });
            }
        }

        match overlay {
            Overlay::Bitmap { bitmap_id, .. } => scene.overlays.push(ResolvedOverlay::Bitmap {
                bitmap_id: bitmap_id.clone(),
                at,
            }),
            Overlay::Text {
                text,
                font_size,
                color,
                background_color,
                ..
            } => scene.overlays.push(ResolvedOverlay::Text {
                text: text.clone(),
                at,
                font_size: *font_size,
                color: color.clone(),
                background_color: background_color.clone(),
            }),
        }
    }

    scene
}

fn resolve_position(floor: &Floor, position: &OverlayPosition) -> Option<Coordinate> {
    match position {
        OverlayPosition::Rectangle { name, .. } => match floor.rectangle(name) {
            Some(rect) => Some(rect.midpoint()),
            None => {
                warn!(
                    floor = %floor.floor_id,
                    name = %name,
                    "overlay position references unknown rectangle, skipping"
                );
                None
            }
        },
        OverlayPosition::Coordinate { x, y } => Some(Coordinate { x: *x, y: *y }),
    }
}

/// Directives waiting for their floor to become ready. Later
/// directives for the same floor supersede earlier queued ones.
#[derive(Debug, Default)]
pub struct DirectiveQueue {
    pending: Vec<MapDirective>,
}

impl DirectiveQueue {
    pub fn push(&mut self, directive: MapDirective) {
        self.pending.retain(|d| d.floor_id != directive.floor_id);
        self.pending.push(directive);
    }

    pub fn take(&mut self, floor_id: &str) -> Option<MapDirective> {
        let idx = self.pending.iter().position(|d| d.floor_id == floor_id)?;
        Some(self.pending.remove(idx))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorcast_core::map::{AnchorPoint, CoordinateSystem, DisplayRectangle};

    fn floor() -> Floor {
        Floor {
            floor_id: "1F".into(),
            floor_name: "Floor 1".into(),
            floor_image: "floor1.png".into(),
            coordinate_system: CoordinateSystem {
                top_left: AnchorPoint {
                    px: 0.0,
                    py: 0.0,
                    x: 0.0,
                    y: 0.0,
                },
                bottom_right: AnchorPoint {
                    px: 1000.0,
                    py: 500.0,
                    x: 100.0,
                    y: 50.0,
                },
            },
            rectangles: vec![Rectangle {
                name: "Kitchen".into(),
                top_left: Coordinate { x: 10.0, y: 10.0 },
                bottom_right: Coordinate { x: 30.0, y: 20.0 },
            }],
        }
    }

    fn display(name: &str) -> DisplayRectangle {
        DisplayRectangle {
            name: name.into(),
            color: "#00ff00".into(),
            stroke_opacity: 1.0,
            fill_opacity: 0.25,
            show_name: true,
        }
    }

    #[test]
    fn test_unknown_rectangle_skipped_batch_survives() {
        let directive = MapDirective {
            floor_id: "1F".into(),
            rectangles: vec![display("Kitchen"), display("Ballroom")],
            ..Default::default()
        };
        let scene = resolve_directive(&floor(), &directive);
        assert_eq!(scene.rectangles.len(), 1);
        assert_eq!(scene.rectangles[0].rect.name, "Kitchen");
        assert_eq!(scene.rectangles[0].label.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn test_overlay_rectangle_position_is_midpoint_plus_offset() {
        let directive = MapDirective {
            floor_id: "1F".into(),
            overlays: vec![Overlay::Bitmap {
                bitmap_id: "arrow_up".into(),
                position: OverlayPosition::Rectangle {
                    name: "Kitchen".into(),
                    highlight_color: None,
                },
                offset: Some(Coordinate { x: 2.0, y: -3.0 }),
            }],
            ..Default::default()
        };
        let scene = resolve_directive(&floor(), &directive);
        assert_eq!(
            scene.overlays,
            vec![ResolvedOverlay::Bitmap {
                bitmap_id: "arrow_up".into(),
                at: Coordinate { x: 22.0, y: 12.0 },
            }]
        );
        assert!(scene.rectangles.is_empty());
    }

    #[test]
    fn test_highlight_color_adds_borderless_rectangle() {
        let directive = MapDirective {
            floor_id: "1F".into(),
            overlays: vec![Overlay::Text {
                text: "22.5C".into(),
                position: OverlayPosition::Rectangle {
                    name: "Kitchen".into(),
                    highlight_color: Some("#ffcc00".into()),
                },
                offset: None,
                font_size: 14.0,
                color: "#000000".into(),
                background_color: None,
            }],
            ..Default::default()
        };
        let scene = resolve_directive(&floor(), &directive);
        assert_eq!(scene.rectangles.len(), 1);
        assert_eq!(scene.rectangles[0].color, "#ffcc00");
        assert_eq!(scene.rectangles[0].stroke_opacity, 0.0);
        assert!(scene.rectangles[0].label.is_none());
    }

    #[test]
    fn test_queue_keeps_latest_per_floor() {
        let mut queue = DirectiveQueue::default();
        queue.push(MapDirective {
            floor_id: "2F".into(),
            rectangles: vec![display("Old")],
            ..Default::default()
        });
        queue.push(MapDirective {
            floor_id: "1F".into(),
            ..Default::default()
        });
        queue.push(MapDirective {
            floor_id: "2F".into(),
            rectangles: vec![display("New")],
            ..Default::default()
        });

        let taken = queue.take("2F").unwrap();
        assert_eq!(taken.rectangles[0].name, "New");
        assert!(queue.take("2F").is_none());
        assert!(queue.take("1F").is_some());
        assert!(queue.is_empty());
    }
}
