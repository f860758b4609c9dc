//! Agent response bundle and classified output items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FloorcastError;
use crate::map::MapDirective;

/// One executed code step captured from the agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeStep {
    pub code: String,
    #[serde(rename = "step")]
    pub step_label: String,
}

/// Per-step tool-call log entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub step_number: u32,
    #[serde(default)]
    pub tool_calls: Vec<String>,
}

/// Everything the agent execution service hands over for one user
/// turn. The classifier only consumes this; it never drives the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponseBundle {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub raw_output: String,
    #[serde(default)]
    pub code_steps: Vec<CodeStep>,
    #[serde(default)]
    pub logs: Vec<StepLog>,
    #[serde(default)]
    pub error: bool,
}

/// Arrow direction. Parsing is case-insensitive; anything outside the
/// four values is rejected and the whole arrow candidate is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = FloorcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(FloorcastError::Classify(format!(
                "invalid arrow direction '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowContent {
    pub room: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightContent {
    pub rooms: Vec<String>,
}

/// The classifier's own trace: the bundle it saw and the exact item
/// sequence it emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub agent_response: AgentResponseBundle,
    pub parsed_outputs: Vec<OutputItem>,
    pub output_count: usize,
}

/// UI pane a classified item is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Chat,
    ImagePanel,
    Map,
    DebugPanel,
}

/// One classified unit of agent output, tagged with its wire `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Code {
        content: String,
        step: String,
        language: String,
    },
    Text {
        content: String,
    },
    Image {
        /// Base64-encoded image bytes.
        content: String,
        format: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Map {
        content: MapDirective,
    },
    HighlightRoom {
        content: HighlightContent,
    },
    Arrow {
        content: ArrowContent,
    },
    ClearArrows,
    ClearMap,
    Error {
        content: String,
    },
    Debug {
        content: Box<DebugTrace>,
    },
}

impl OutputItem {
    /// Which pane this item is routed to.
    pub fn destination(&self) -> Sink {
        match self {
            OutputItem::Code { .. } | OutputItem::Text { .. } | OutputItem::Error { .. } => {
                Sink::Chat
            }
            OutputItem::Image { .. } => Sink::ImagePanel,
            OutputItem::Map { .. }
            | OutputItem::HighlightRoom { .. }
            | OutputItem::Arrow { .. }
            | OutputItem::ClearArrows
            | OutputItem::ClearMap => Sink::Map,
            OutputItem::Debug { .. } => Sink::DebugPanel,
        }
    }
}
