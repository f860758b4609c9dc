//! Stateful render engine: floor lifecycle, directive application,
//! legacy compatibility, and the z-ordered redraw pass.

use std::collections::HashMap;

use image::{Rgba, RgbaImage, imageops};
use tracing::{debug, warn};

use floorcast_core::config::Config;
use floorcast_core::map::{MapDefinition, MapDirective};
use floorcast_core::output::{ArrowContent, Direction, OutputItem};
use floorcast_core::Result;

use crate::assets::{LoadRequest, LoadTarget, RenderEvent};
use crate::draw;
use crate::resolve::{self, DirectiveQueue, ResolvedOverlay, ResolvedScene};
use crate::store::{FloorDefinitionStore, ImageState, build_legacy_definition};
use crate::transform::{self, RenderContext};

/// Which data model this session runs on, chosen once at definition
/// load. Legacy sessions have a single floor, binary highlights, and
/// no color/opacity customization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorPlanModel {
    Legacy,
    Multi,
}

/// Per-floor lifecycle: image in flight → context valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorState {
    Empty,
    Loading,
    Ready,
}

const LEGACY_HIGHLIGHT_COLOR: Rgba<u8> = Rgba([255, 204, 0, 90]);
const ARROW_COLOR: Rgba<u8> = Rgba([220, 40, 40, 255]);
const ARROW_LENGTH: f64 = 48.0;

/// The render surface and everything drawn onto it. All state is owned
/// here — one engine per session, no ambient globals. Mutations happen
/// on one logical thread; image-load completions arrive as
/// [`RenderEvent`]s.
pub struct RenderEngine {
    store: FloorDefinitionStore,
    model: Option<FloorPlanModel>,
    active_floor: Option<String>,
    floor_state: FloorState,
    context: Option<RenderContext>,
    scene: ResolvedScene,
    legacy_highlights: Vec<String>,
    arrows: Vec<ArrowContent>,
    queue: DirectiveQueue,
    /// Latest directive that arrived before any definition (protocol
    /// order violation: kept, not dropped).
    pre_definition: Option<MapDirective>,
    next_token: u64,
    floor_loads: HashMap<String, u64>,
    bitmap_loads: HashMap<String, u64>,
    outbox: Vec<LoadRequest>,
    surface: RgbaImage,
    grid_spacing: u32,
}

impl RenderEngine {
    pub fn new(config: &Config) -> Self {
        let (width, height) = config.surface_size();
        let mut engine = Self {
            store: FloorDefinitionStore::new(),
            model: None,
            active_floor: None,
            floor_state: FloorState::Empty,
            context: None,
            scene: ResolvedScene::default(),
            legacy_highlights: Vec::new(),
            arrows: Vec::new(),
            queue: DirectiveQueue::default(),
            pre_definition: None,
            next_token: 1,
            floor_loads: HashMap::new(),
            bitmap_loads: HashMap::new(),
            outbox: Vec::new(),
            surface: RgbaImage::new(width, height),
            grid_spacing: config.grid_spacing(),
        };
        engine.redraw();
        engine
    }

    pub fn model(&self) -> Option<FloorPlanModel> {
        self.model
    }

    pub fn active_floor(&self) -> Option<&str> {
        self.active_floor.as_deref()
    }

    pub fn floor_state(&self) -> FloorState {
        self.floor_state
    }

    pub fn store(&self) -> &FloorDefinitionStore {
        &self.store
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn arrows(&self) -> &[ArrowContent] {
        &self.arrows
    }

    pub fn scene(&self) -> &ResolvedScene {
        &self.scene
    }

    pub fn highlighted_rooms(&self) -> &[String] {
        &self.legacy_highlights
    }

    /// Drain pending image load requests for the driver to fulfil.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Install a multi-floor catalog.
    pub fn load_definition(&mut self, definition: MapDefinition) -> Result<()> {
        self.install(definition, FloorPlanModel::Multi)
    }

    /// Install a legacy single-floor catalog from its description
    /// document.
    pub fn load_legacy_definition(
        &mut self,
        doc_json: &str,
        floor_image: &str,
        bitmap_dir: &std::path::Path,
    ) -> Result<()> {
        let definition =
            build_legacy_definition(doc_json, floor_image, "1F", "Floor 1", bitmap_dir)?;
        self.install(definition, FloorPlanModel::Legacy)
    }

    fn install(&mut self, definition: MapDefinition, model: FloorPlanModel) -> Result<()> {
        let preload = self.store.load(definition)?;

        // Everything from the previous catalog is superseded.
        self.model = Some(model);
        self.floor_loads.clear();
        self.bitmap_loads.clear();
        self.queue.clear();
        self.scene = ResolvedScene::default();
        self.legacy_highlights.clear();
        self.arrows.clear();
        self.context = None;

        self.active_floor = self.store.first_floor_id();
        self.floor_state = if self.active_floor.is_some() {
            FloorState::Loading
        } else {
            FloorState::Empty
        };

        for (target, file) in preload {
            self.request_load(target, file);
        }

        if let Some(directive) = self.pre_definition.take() {
            debug!(floor = %directive.floor_id, "replaying directive queued before definition");
            self.apply_directive(directive);
        }

        self.redraw();
        Ok(())
    }

    fn request_load(&mut self, target: LoadTarget, file: String) {
        let token = self.next_token;
        self.next_token += 1;
        match &target {
            LoadTarget::Floor { floor_id } => {
                self.floor_loads.insert(floor_id.clone(), token);
            }
            LoadTarget::Bitmap { bitmap_id } => {
                self.bitmap_loads.insert(bitmap_id.clone(), token);
            }
        }
        self.outbox.push(LoadRequest { token, target, file });
    }

    /// Apply one map directive, queueing it when its floor is not
    /// ready yet.
    pub fn apply_directive(&mut self, directive: MapDirective) {
        if self.store.definition().is_none() {
            warn!(
                floor = %directive.floor_id,
                "map directive received before any map definition, queueing"
            );
            self.pre_definition = Some(directive);
            return;
        }

        if self.store.floor(&directive.floor_id).is_none() {
            warn!(floor = %directive.floor_id, "map directive for unknown floor, dropping");
            return;
        }

        if self.active_floor.as_deref() != Some(directive.floor_id.as_str()) {
            let floor_id = directive.floor_id.clone();
            self.queue.push(directive);
            self.switch_floor(&floor_id);
            return;
        }

        if self.floor_state != FloorState::Ready {
            self.queue.push(directive);
            return;
        }

        if let Some(floor) = self.store.floor(&directive.floor_id) {
            self.scene = resolve::resolve_directive(floor, &directive);
        }
        self.redraw();
    }

    fn switch_floor(&mut self, floor_id: &str) {
        self.active_floor = Some(floor_id.to_string());
        self.context = None;

        match self.store.floor_image_state(floor_id) {
            Some(ImageState::Ready(_)) => {
                self.floor_state = FloorState::Ready;
                self.recompute_context();
                if let Some(directive) = self.queue.take(floor_id) {
                    if let Some(floor) = self.store.floor(floor_id) {
                        self.scene = resolve::resolve_directive(floor, &directive);
                    }
                }
            }
            Some(ImageState::Failed) => {
                // Terminal for this resource; stay degraded, no retry.
                warn!(floor = %floor_id, "switching to floor whose image previously failed");
                self.floor_state = FloorState::Loading;
            }
            Some(ImageState::Loading) => {
                self.floor_state = FloorState::Loading;
            }
            None => {
                self.floor_state = FloorState::Loading;
                if let Some(file) = self.store.floor(floor_id).map(|f| f.floor_image.clone()) {
                    self.store.set_floor_image(floor_id, ImageState::Loading);
                    self.request_load(
                        LoadTarget::Floor {
                            floor_id: floor_id.to_string(),
                        },
                        file,
                    );
                }
            }
        }

        self.redraw();
    }

    /// Feed one image-load completion back into the engine. Stale
    /// tokens (superseded requests, replaced catalogs) are discarded
    /// without touching shared state.
    pub fn handle_event(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::ImageLoaded {
                token,
                target: LoadTarget::Floor { floor_id },
                result,
            } => {
                if self.floor_loads.get(&floor_id) != Some(&token) {
                    debug!(floor = %floor_id, token, "discarding stale floor image load");
                    return;
                }
                self.floor_loads.remove(&floor_id);

                match result {
                    Ok(img) => {
                        self.store.set_floor_image(&floor_id, ImageState::Ready(img));
                        if self.active_floor.as_deref() == Some(floor_id.as_str()) {
                            self.floor_state = FloorState::Ready;
                            self.recompute_context();
                            if let Some(directive) = self.queue.take(&floor_id) {
                                if let Some(floor) = self.store.floor(&floor_id) {
                                    self.scene = resolve::resolve_directive(floor, &directive);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        // The floor never leaves Loading; draws degrade
                        // to the placeholder grid.
                        warn!(floor = %floor_id, %e, "floor image load failed");
                        self.store.set_floor_image(&floor_id, ImageState::Failed);
                    }
                }
                self.redraw();
            }
            RenderEvent::ImageLoaded {
                token,
                target: LoadTarget::Bitmap { bitmap_id },
                result,
            } => {
                if self.bitmap_loads.get(&bitmap_id) != Some(&token) {
                    debug!(bitmap = %bitmap_id, token, "discarding stale bitmap load");
                    return;
                }
                self.bitmap_loads.remove(&bitmap_id);

                match result {
                    Ok(img) => self
                        .store
                        .set_bitmap_image(&bitmap_id, ImageState::Ready(img)),
                    Err(e) => {
                        warn!(bitmap = %bitmap_id, %e, "bitmap load failed, overlays will skip it");
                        self.store.set_bitmap_image(&bitmap_id, ImageState::Failed);
                    }
                }
                self.redraw();
            }
        }
    }

    /// Replace the legacy highlighted-room set.
    pub fn highlight_rooms(&mut self, rooms: Vec<String>) {
        self.legacy_highlights = rooms;
        self.redraw();
    }

    /// Append one legacy arrow, deduped by (room, direction).
    pub fn add_arrow(&mut self, room: String, direction: Direction) {
        let exists = self
            .arrows
            .iter()
            .any(|a| a.room == room && a.direction == direction);
        if !exists {
            self.arrows.push(ArrowContent { room, direction });
            self.redraw();
        }
    }

    /// Clear only the modern display rectangles and overlays.
    pub fn clear_map(&mut self) {
        self.scene = ResolvedScene::default();
        self.redraw();
    }

    /// Clear only the legacy arrow set.
    pub fn clear_arrows(&mut self) {
        self.arrows.clear();
        self.redraw();
    }

    /// Clear only the legacy highlight set.
    pub fn clear_highlights(&mut self) {
        self.legacy_highlights.clear();
        self.redraw();
    }

    /// Resize the surface; the context is recomputed for the active
    /// floor image.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface = RgbaImage::new(width.max(1), height.max(1));
        self.recompute_context();
        self.redraw();
    }

    /// Route one classified map-tier item onto the engine. Items for
    /// other panes are ignored.
    pub fn apply_item(&mut self, item: &OutputItem) {
        match item {
            OutputItem::Map { content } => self.apply_directive(content.clone()),
            OutputItem::HighlightRoom { content } => self.highlight_rooms(content.rooms.clone()),
            OutputItem::Arrow { content } => {
                self.add_arrow(content.room.clone(), content.direction)
            }
            OutputItem::ClearArrows => self.clear_arrows(),
            OutputItem::ClearMap => self.clear_map(),
            _ => {}
        }
    }

    fn recompute_context(&mut self) {
        self.context = self
            .active_floor
            .as_deref()
            .and_then(|id| self.store.floor_image(id))
            .and_then(|img| {
                RenderContext::fit(
                    img.width(),
                    img.height(),
                    self.surface.width(),
                    self.surface.height(),
                )
            });
    }

    /// Force a repaint. Safe to call repeatedly; with unchanged state
    /// the output is identical.
    pub fn render(&mut self) -> &RgbaImage {
        self.redraw();
        &self.surface
    }

    /// Full compose pass: background, legacy highlights, display
    /// rectangles, overlays, arrows — in that z-order.
    fn redraw(&mut self) {
        let surface = &mut self.surface;

        let background = self
            .active_floor
            .as_deref()
            .and_then(|id| self.store.floor_image(id));
        match (background, self.context) {
            (Some(img), Some(ctx)) => {
                draw::fill_rect(
                    surface,
                    0,
                    0,
                    surface.width() as i32 - 1,
                    surface.height() as i32 - 1,
                    Rgba([24, 26, 32, 255]),
                );
                let resized = imageops::resize(
                    img,
                    ctx.draw_width.round().max(1.0) as u32,
                    ctx.draw_height.round().max(1.0) as u32,
                    imageops::FilterType::Triangle,
                );
                imageops::overlay(
                    surface,
                    &resized,
                    ctx.offset_x.round() as i64,
                    ctx.offset_y.round() as i64,
                );
            }
            _ => {
                // No valid context: nothing but the degraded grid.
                draw::draw_placeholder_grid(surface, self.grid_spacing);
                return;
            }
        }

        let Some(ctx) = self.context else {
            return;
        };
        let Some(floor) = self.active_floor.as_deref().and_then(|id| self.store.floor(id))
        else {
            return;
        };
        let cs = &floor.coordinate_system;

        // Legacy highlights only exist in the legacy model.
        if self.model == Some(FloorPlanModel::Legacy) {
            for name in &self.legacy_highlights {
                let Some(rect) = floor.rectangle(name) else {
                    continue;
                };
                let Some((x0, y0)) = transform::virtual_to_surface(cs, rect.top_left, &ctx)
                else {
                    continue;
                };
                let Some((x1, y1)) = transform::virtual_to_surface(cs, rect.bottom_right, &ctx)
                else {
                    continue;
                };
                draw::fill_rect(
                    surface,
                    x0.round() as i32,
                    y0.round() as i32,
                    x1.round() as i32,
                    y1.round() as i32,
                    LEGACY_HIGHLIGHT_COLOR,
                );
            }
        }

        for resolved in &self.scene.rectangles {
            let Some((x0, y0)) = transform::virtual_to_surface(cs, resolved.rect.top_left, &ctx)
            else {
                continue;
            };
            let Some((x1, y1)) =
                transform::virtual_to_surface(cs, resolved.rect.bottom_right, &ctx)
            else {
                continue;
            };
            let (x0, y0, x1, y1) = (
                x0.round() as i32,
                y0.round() as i32,
                x1.round() as i32,
                y1.round() as i32,
            );
            let color = draw::parse_color(&resolved.color).unwrap_or(Rgba([255, 0, 0, 255]));
            draw::fill_rect(
                surface,
                x0,
                y0,
                x1,
                y1,
                draw::with_opacity(color, resolved.fill_opacity),
            );
            draw::outline_rect(
                surface,
                x0,
                y0,
                x1,
                y1,
                draw::with_opacity(color, resolved.stroke_opacity),
                2,
            );
            if let Some(label) = &resolved.label {
                draw::draw_text(
                    surface,
                    x0.min(x1) + 4,
                    y0.min(y1) + 4,
                    label,
                    Rgba([0, 0, 0, 255]),
                    1,
                );
            }
        }

        for overlay in &self.scene.overlays {
            match overlay {
                ResolvedOverlay::Bitmap { bitmap_id, at } => {
                    let Some((sx, sy)) = transform::virtual_to_surface(cs, *at, &ctx) else {
                        continue;
                    };
                    // Not yet loaded or failed: silently skipped.
                    let Some(bitmap) = self.store.bitmap_image(bitmap_id) else {
                        debug!(bitmap = %bitmap_id, "overlay bitmap not ready, skipping");
                        continue;
                    };
                    draw::blit_centered(surface, bitmap, sx.round() as i32, sy.round() as i32);
                }
                ResolvedOverlay::Text {
                    text,
                    at,
                    font_size,
                    color,
                    background_color,
                } => {
                    let Some((sx, sy)) = transform::virtual_to_surface(cs, *at, &ctx) else {
                        continue;
                    };
                    let scale = (font_size / 8.0).round().max(1.0) as u32;
                    let w = draw::text_width(text, scale);
                    let h = draw::text_height(scale);
                    let x = sx.round() as i32 - w / 2;
                    let y = sy.round() as i32 - h / 2;
                    if let Some(bg) = background_color.as_deref().and_then(draw::parse_color) {
                        draw::fill_rect(surface, x - 3, y - 3, x + w + 2, y + h + 2, bg);
                    }
                    let color = draw::parse_color(color).unwrap_or(Rgba([0, 0, 0, 255]));
                    draw::draw_text(surface, x, y, text, color, scale);
                }
            }
        }

        for arrow in &self.arrows {
            let Some(rect) = floor.rectangle(&arrow.room) else {
                debug!(room = %arrow.room, "arrow references unknown room, skipping");
                continue;
            };
            let Some((cx, cy)) = transform::virtual_to_surface(cs, rect.midpoint(), &ctx) else {
                continue;
            };

            let bitmap_id = format!("arrow_{}", arrow.direction);
            if let Some(bitmap) = self.store.bitmap_image(&bitmap_id) {
                draw::blit_centered(surface, bitmap, cx.round() as i32, cy.round() as i32);
                continue;
            }

            let half = ARROW_LENGTH / 2.0;
            let (from, to) = match arrow.direction {
                Direction::Up => ((cx, cy + half), (cx, cy - half)),
                Direction::Down => ((cx, cy - half), (cx, cy + half)),
                Direction::Left => ((cx + half, cy), (cx - half, cy)),
                Direction::Right => ((cx - half, cy), (cx + half, cy)),
            };
            draw::draw_arrow(surface, from, to, ARROW_COLOR, 5.0, 14.0, 12.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorcast_core::map::{
        AnchorPoint, Bitmap, Coordinate, CoordinateSystem, DisplayRectangle, Floor, Rectangle,
    };

    fn definition() -> MapDefinition {
        let cs = CoordinateSystem {
            top_left: AnchorPoint {
                px: 0.0,
                py: 0.0,
                x: 0.0,
                y: 0.0,
            },
            bottom_right: AnchorPoint {
                px: 100.0,
                py: 50.0,
                x: 100.0,
                y: 50.0,
            },
        };
        let rect = |name: &str| Rectangle {
            name: name.into(),
            top_left: Coordinate { x: 10.0, y: 10.0 },
            bottom_right: Coordinate { x: 40.0, y: 30.0 },
        };
        MapDefinition {
            floors: vec![
                Floor {
                    floor_id: "1F".into(),
                    floor_name: "Floor 1".into(),
                    floor_image: "floor1.png".into(),
                    coordinate_system: cs,
                    rectangles: vec![rect("Kitchen")],
                },
                Floor {
                    floor_id: "2F".into(),
                    floor_name: "Floor 2".into(),
                    floor_image: "floor2.png".into(),
                    coordinate_system: cs,
                    rectangles: vec![rect("Room3")],
                },
            ],
            bitmaps: vec![Bitmap {
                bitmap_id: "arrow_up".into(),
                bitmap_name: "Up arrow".into(),
                bitmap_file: "arrow_up.bmp".into(),
            }],
        }
    }

    fn engine_with_definition() -> RenderEngine {
        let mut engine = RenderEngine::new(&Config::default());
        engine.load_definition(definition()).unwrap();
        engine
    }

    fn complete_floor_load(engine: &mut RenderEngine, floor_id: &str) {
        let requests = engine.take_load_requests();
        let request = requests
            .iter()
            .find(|r| {
                r.target
                    == LoadTarget::Floor {
                        floor_id: floor_id.into(),
                    }
            })
            .unwrap_or_else(|| panic!("no pending load for {floor_id}"))
            .clone();
        engine.handle_event(RenderEvent::ImageLoaded {
            token: request.token,
            target: request.target,
            result: Ok(RgbaImage::from_pixel(100, 50, Rgba([255, 255, 255, 255]))),
        });
    }

    fn directive(floor_id: &str, rect: &str) -> MapDirective {
        MapDirective {
            floor_id: floor_id.into(),
            rectangles: vec![DisplayRectangle {
                name: rect.into(),
                color: "#00ff00".into(),
                stroke_opacity: 1.0,
                fill_opacity: 0.25,
                show_name: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_first_floor_active_and_loading() {
        let mut engine = engine_with_definition();
        assert_eq!(engine.active_floor(), Some("1F"));
        assert_eq!(engine.floor_state(), FloorState::Loading);
        assert_eq!(engine.model(), Some(FloorPlanModel::Multi));

        complete_floor_load(&mut engine, "1F");
        assert_eq!(engine.floor_state(), FloorState::Ready);
    }

    #[test]
    fn test_directive_waits_for_floor_switch() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");

        engine.apply_directive(directive("2F", "Room3"));
        // Not visible until 2F's image finishes loading.
        assert_eq!(engine.active_floor(), Some("2F"));
        assert_eq!(engine.floor_state(), FloorState::Loading);
        assert!(engine.scene().rectangles.is_empty());

        complete_floor_load(&mut engine, "2F");
        assert_eq!(engine.floor_state(), FloorState::Ready);
        assert_eq!(engine.scene().rectangles.len(), 1);
        assert_eq!(engine.scene().rectangles[0].rect.name, "Room3");
    }

    #[test]
    fn test_later_directive_supersedes_queued_one() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");

        engine.apply_directive(directive("2F", "Unknown"));
        engine.apply_directive(directive("2F", "Room3"));
        complete_floor_load(&mut engine, "2F");

        assert_eq!(engine.scene().rectangles.len(), 1);
        assert_eq!(engine.scene().rectangles[0].rect.name, "Room3");
    }

    #[test]
    fn test_clear_scopes_are_independent() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");

        engine.apply_directive(directive("1F", "Kitchen"));
        engine.add_arrow("Kitchen".into(), Direction::Left);
        assert_eq!(engine.scene().rectangles.len(), 1);
        assert_eq!(engine.arrows().len(), 1);

        engine.clear_map();
        assert!(engine.scene().rectangles.is_empty());
        assert_eq!(engine.arrows().len(), 1, "clear_map must not touch arrows");

        engine.apply_directive(directive("1F", "Kitchen"));
        engine.clear_arrows();
        assert!(engine.arrows().is_empty());
        assert_eq!(
            engine.scene().rectangles.len(),
            1,
            "clear_arrows must not touch the directive scene"
        );
    }

    #[test]
    fn test_arrow_dedup() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");

        engine.add_arrow("Kitchen".into(), Direction::Left);
        engine.add_arrow("Kitchen".into(), Direction::Left);
        engine.add_arrow("Kitchen".into(), Direction::Up);
        assert_eq!(engine.arrows().len(), 2);
    }

    #[test]
    fn test_stale_floor_load_discarded() {
        let mut engine = engine_with_definition();
        let stale = engine
            .take_load_requests()
            .into_iter()
            .find(|r| matches!(r.target, LoadTarget::Floor { .. }))
            .unwrap();

        // A new definition supersedes the in-flight load.
        engine.load_definition(definition()).unwrap();
        engine.handle_event(RenderEvent::ImageLoaded {
            token: stale.token,
            target: stale.target,
            result: Ok(RgbaImage::new(100, 50)),
        });

        assert_eq!(engine.floor_state(), FloorState::Loading);
        assert!(engine.store().floor_image("1F").is_none());
    }

    #[test]
    fn test_failed_load_stays_degraded() {
        let mut engine = engine_with_definition();
        let request = engine
            .take_load_requests()
            .into_iter()
            .find(|r| matches!(r.target, LoadTarget::Floor { .. }))
            .unwrap();
        engine.handle_event(RenderEvent::ImageLoaded {
            token: request.token,
            target: request.target,
            result: Err("decode failed".into()),
        });

        assert_eq!(engine.floor_state(), FloorState::Loading);
        // No retry is issued.
        assert!(engine.take_load_requests().is_empty());
    }

    #[test]
    fn test_directive_before_definition_queued() {
        let mut engine = RenderEngine::new(&Config::default());
        engine.apply_directive(directive("1F", "Kitchen"));
        assert!(engine.scene().rectangles.is_empty());

        engine.load_definition(definition()).unwrap();
        complete_floor_load(&mut engine, "1F");

        assert_eq!(engine.scene().rectangles.len(), 1);
        assert_eq!(engine.scene().rectangles[0].rect.name, "Kitchen");
    }

    #[test]
    fn test_apply_item_routes_map_tier() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");

        engine.apply_item(&OutputItem::Arrow {
            content: ArrowContent {
                room: "Kitchen".into(),
                direction: Direction::Up,
            },
        });
        engine.apply_item(&OutputItem::Text {
            content: "ignored".into(),
        });
        assert_eq!(engine.arrows().len(), 1);

        engine.apply_item(&OutputItem::ClearArrows);
        assert!(engine.arrows().is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut engine = engine_with_definition();
        complete_floor_load(&mut engine, "1F");
        engine.apply_directive(directive("1F", "Kitchen"));

        let first = engine.render().clone();
        let second = engine.render().clone();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_legacy_definition_model() {
        let dir = tempfile::tempdir().unwrap();
        let doc = r#"{
            "coordinateSystem": {
                "topLeft": {"px": 0, "py": 0, "x": 0, "y": 0},
                "bottomRight": {"px": 100, "py": 50, "x": 100, "y": 50}
            },
            "rectangles": [
                {"name": "Kitchen",
                 "topLeft": {"x": 10, "y": 10},
                 "bottomRight": {"x": 40, "y": 30}}
            ]
        }"#;

        let mut engine = RenderEngine::new(&Config::default());
        engine
            .load_legacy_definition(doc, "floor1.png", dir.path())
            .unwrap();
        assert_eq!(engine.model(), Some(FloorPlanModel::Legacy));

        complete_floor_load(&mut engine, "1F");
        engine.highlight_rooms(vec!["Kitchen".into()]);
        assert_eq!(engine.highlighted_rooms(), ["Kitchen".to_string()]);

        engine.clear_highlights();
        assert!(engine.highlighted_rooms().is_empty());
    }
}
