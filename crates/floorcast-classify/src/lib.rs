//! Output classification pipeline.
//!
//! Agent output is loosely structured: natural-language text, executed
//! code, tool-call logs. Tools signal structured intent through fixed
//! marker grammars embedded in otherwise free-form strings
//! (`MAP_COMMAND: {...}`, `ARROW_COMMAND: room=X, direction=Y`, ...).
//! [`extract`] finds raw candidates; [`classify`] orders and dedups
//! them into the typed item sequence the UI panes consume.

pub mod classify;
pub mod extract;

pub use classify::Classifier;
pub use extract::CommandExtractor;
