//! Output classification — ordering, dedup, and the debug trace.

use std::collections::HashSet;

use tracing::debug;

use floorcast_core::config::Config;
use floorcast_core::output::{
    AgentResponseBundle, ArrowContent, DebugTrace, Direction, HighlightContent, OutputItem,
};

use crate::extract::{CommandExtractor, MapTierCandidate};

/// Orchestrates extraction and produces the ordered item sequence.
///
/// The result is deterministic for identical input (including
/// identical filesystem state for image checks): code items in step
/// order, then arrows recovered from executed code, the single text
/// item, image items, map-tier items in source order, error items, and
/// finally the synthetic debug trace.
pub struct Classifier {
    extractor: CommandExtractor,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: CommandExtractor::new(config),
        }
    }

    pub fn with_extractor(extractor: CommandExtractor) -> Self {
        Self { extractor }
    }

    pub fn classify(&self, bundle: &AgentResponseBundle) -> Vec<OutputItem> {
        let extraction = self.extractor.extract(bundle);
        let mut items = Vec::new();
        // Same room+direction emitted twice in one turn collapses to
        // one arrow, across both detection paths.
        let mut active_arrows: HashSet<(String, Direction)> = HashSet::new();

        // 1. Code items, one per step, in step order.
        for (i, step) in bundle.code_steps.iter().enumerate() {
            let step_label = if step.step_label.is_empty() {
                format!("Step {}", i + 1)
            } else {
                step.step_label.clone()
            };
            items.push(OutputItem::Code {
                content: step.code.clone(),
                step: step_label,
                language: "python".into(),
            });
        }

        // 2. Arrows recovered from executed code.
        for arrow in extraction.code_arrows {
            push_arrow(&mut items, &mut active_arrows, arrow);
        }

        // 3. The single text item; an error bundle reroutes its text
        //    to the error tier instead.
        if !bundle.text.is_empty() && !bundle.error {
            items.push(OutputItem::Text {
                content: bundle.text.clone(),
            });
        }

        // 4. Image items.
        for image in extraction.images {
            items.push(OutputItem::Image {
                content: image.content,
                format: image.format,
                path: image.path,
            });
        }

        // 5. Map tier: the heuristic highlight, then marker candidates
        //    in source order.
        if !extraction.highlight_rooms.is_empty() {
            items.push(OutputItem::HighlightRoom {
                content: HighlightContent {
                    rooms: extraction.highlight_rooms,
                },
            });
        }
        for candidate in extraction.map_tier {
            match candidate {
                MapTierCandidate::Map(directive) => {
                    items.push(OutputItem::Map { content: directive })
                }
                MapTierCandidate::Arrow(arrow) => {
                    push_arrow(&mut items, &mut active_arrows, arrow)
                }
                MapTierCandidate::ClearArrows => items.push(OutputItem::ClearArrows),
                MapTierCandidate::ClearMap => items.push(OutputItem::ClearMap),
            }
        }

        // 6. Error items.
        if bundle.error {
            items.push(OutputItem::Error {
                content: bundle.text.clone(),
            });
        }

        debug!(count = items.len(), "classified agent response");

        // 7. The classifier's own trace, byte-faithful to the list
        //    above.
        let trace = DebugTrace {
            agent_response: bundle.clone(),
            parsed_outputs: items.clone(),
            output_count: items.len(),
        };
        items.push(OutputItem::Debug {
            content: Box::new(trace),
        });

        items
    }
}

fn push_arrow(
    items: &mut Vec<OutputItem>,
    active: &mut HashSet<(String, Direction)>,
    arrow: ArrowContent,
) {
    if active.insert((arrow.room.clone(), arrow.direction)) {
        items.push(OutputItem::Arrow { content: arrow });
    }
}
