//! Session wire protocol.
//!
//! All session traffic is JSON messages tagged with `type`. Classified
//! output items serialize directly as messages; the two control
//! messages below frame a session: exactly one `map_definition` push
//! must precede any `map` directive (enforced in the resolver).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::map::MapDefinition;
use crate::output::OutputItem;
use crate::Result;

/// Control messages that are not classified output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Echo of an inbound user message.
    UserMessage { content: String },
    /// The per-session floor/bitmap catalog.
    MapDefinition { content: MapDefinition },
}

/// Any message that can appear on the session wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionMessage {
    Control(ControlMessage),
    Output(OutputItem),
}

/// Downstream consumer of classified output items (chat transcript,
/// image panel, map surface, debug viewer).
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn deliver(&self, item: &OutputItem) -> Result<()>;
}
