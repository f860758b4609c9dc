//! Shared types, config, errors, and wire protocol for Floorcast.
//!
//! Floorcast relays free-form output from an autonomous agent into a
//! structured multi-pane UI: classified output items address chat,
//! image, map, and debug panes; map directives drive a floorplan
//! render engine with per-floor virtual coordinates.

pub mod config;
pub mod error;
pub mod map;
pub mod output;
pub mod protocol;

pub use error::{FloorcastError, Result};
