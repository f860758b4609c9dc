//! Floorplan rendering engine.
//!
//! Map directives resolved against a per-floor virtual coordinate
//! system and drawn onto a pixel surface, with asynchronous image
//! loads, floor switches, and legacy/multi-floor model coexistence.
//!
//! All mutation happens on one logical thread: the [`RenderEngine`]
//! is synchronous, and the async [`assets::AssetLoader`] posts image
//! load completions back as [`assets::RenderEvent`]s for the engine
//! to consume.

pub mod assets;
pub mod draw;
pub mod engine;
pub mod resolve;
pub mod store;
pub mod transform;

pub use assets::{AssetLoader, LoadRequest, LoadTarget, RenderEvent};
pub use engine::{FloorPlanModel, RenderEngine};
pub use store::FloorDefinitionStore;
pub use transform::RenderContext;
