//! Command extraction — marker grammars, code-invocation patterns,
//! image evidence, and the free-text heuristic layer.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;
use tracing::{debug, warn};

use floorcast_core::config::Config;
use floorcast_core::map::MapDirective;
use floorcast_core::output::{AgentResponseBundle, ArrowContent, Direction};

static MAP_COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MAP_COMMAND:\s*(\{[^\r\n]*\})").unwrap());

static ARROW_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ARROW_COMMAND:\s*room=([^,\r\n]+),\s*direction=([A-Za-z]+)").unwrap()
});

static CLEAR_ARROWS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCLEAR_ARROWS_COMMAND\b").unwrap());

static CLEAR_MAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCLEAR_MAP_COMMAND\b").unwrap());

static DRAW_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"draw_arrow\(\s*room_name\s*=\s*["']([^"']+)["']\s*,\s*direction\s*=\s*["']([^"']+)["']\s*\)"#,
    )
    .unwrap()
});

static SAVE_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.\s*(?:savefig|save|to_file)\(\s*["']([^"']+)["']"#).unwrap()
});

static DATA_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/([A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=]+)").unwrap()
});

/// One piece of image evidence: base64 payload plus its source format.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvidence {
    pub content: String,
    pub format: String,
    pub path: Option<String>,
}

/// A map-tier candidate, positioned in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapTierCandidate {
    Map(MapDirective),
    Arrow(ArrowContent),
    ClearArrows,
    ClearMap,
}

/// Raw candidates found in one response bundle, before ordering/dedup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Arrows recovered from `draw_arrow(...)` invocations in executed
    /// code, in source order.
    pub code_arrows: Vec<ArrowContent>,
    /// Image evidence (saved files, bare paths, embedded data URIs).
    pub images: Vec<ImageEvidence>,
    /// Marker-grammar candidates in source order.
    pub map_tier: Vec<MapTierCandidate>,
    /// Room-vocabulary matches in the free text (heuristic layer).
    pub highlight_rooms: Vec<String>,
}

/// Scans an agent response bundle for embedded protocol markers and
/// heuristic patterns. Detection paths are independent; each one
/// failing drops only its own candidates.
pub struct CommandExtractor {
    base_dirs: Vec<PathBuf>,
    image_extensions: Vec<String>,
    room_vocabulary: Vec<String>,
    heuristics: bool,
    path_re: Regex,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl CommandExtractor {
    pub fn new(config: &Config) -> Self {
        let image_extensions = config.image_extensions();
        let alternation = image_extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|");
        let path_re = Regex::new(&format!(r#"(?i)([^\s"']+\.(?:{alternation}))"#)).unwrap();

        Self {
            base_dirs: config.asset_dirs(),
            image_extensions,
            room_vocabulary: config.room_vocabulary(),
            heuristics: config.heuristics_enabled(),
            path_re,
        }
    }

    /// Run every detector over the bundle.
    pub fn extract(&self, bundle: &AgentResponseBundle) -> Extraction {
        let code: String = bundle
            .code_steps
            .iter()
            .map(|s| s.code.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let combined = format!("{}\n{}", bundle.raw_output, bundle.text);

        Extraction {
            code_arrows: self.scan_code_arrows(&code),
            images: self.scan_images(&code, &bundle.raw_output),
            map_tier: self.scan_markers(&combined),
            highlight_rooms: self.scan_room_mentions(&bundle.text),
        }
    }

    /// Secondary arrow path: direct `draw_arrow(...)` invocations in
    /// executed code, used when the tool's return marker is not itself
    /// inspected.
    fn scan_code_arrows(&self, code: &str) -> Vec<ArrowContent> {
        let mut arrows = Vec::new();
        for caps in DRAW_ARROW_RE.captures_iter(code) {
            match parse_arrow(&caps[1], &caps[2]) {
                Some(arrow) => arrows.push(arrow),
                None => continue,
            }
        }
        arrows
    }

    /// Fixed marker grammars, in source order over the combined output.
    fn scan_markers(&self, combined: &str) -> Vec<MapTierCandidate> {
        let mut found: Vec<(usize, MapTierCandidate)> = Vec::new();

        for caps in MAP_COMMAND_RE.captures_iter(combined) {
            let offset = caps.get(0).map(|m| m.start()).unwrap_or_default();
            match serde_json::from_str::<MapDirective>(&caps[1]) {
                Ok(directive) => found.push((offset, MapTierCandidate::Map(directive))),
                Err(e) => {
                    // Malformed payload drops the whole directive.
                    warn!(%e, "MAP_COMMAND payload is not a valid map directive, dropping");
                }
            }
        }

        for caps in ARROW_COMMAND_RE.captures_iter(combined) {
            let offset = caps.get(0).map(|m| m.start()).unwrap_or_default();
            if let Some(arrow) = parse_arrow(&caps[1], &caps[2]) {
                found.push((offset, MapTierCandidate::Arrow(arrow)));
            }
        }

        for m in CLEAR_ARROWS_RE.find_iter(combined) {
            found.push((m.start(), MapTierCandidate::ClearArrows));
        }

        for m in CLEAR_MAP_RE.find_iter(combined) {
            found.push((m.start(), MapTierCandidate::ClearMap));
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, c)| c).collect()
    }

    /// Image evidence: save-to-file calls in code, bare paths in raw
    /// output, and embedded base64 data URIs.
    fn scan_images(&self, code: &str, raw_output: &str) -> Vec<ImageEvidence> {
        let mut images = Vec::new();
        let mut seen_paths: Vec<PathBuf> = Vec::new();

        for caps in SAVE_CALL_RE.captures_iter(code) {
            self.collect_image_file(&caps[1], &mut images, &mut seen_paths);
        }

        for caps in self.path_re.captures_iter(raw_output) {
            self.collect_image_file(&caps[1], &mut images, &mut seen_paths);
        }

        for caps in DATA_URI_RE.captures_iter(raw_output) {
            images.push(ImageEvidence {
                content: caps[2].to_string(),
                format: caps[1].to_string(),
                path: None,
            });
        }

        images
    }

    fn collect_image_file(
        &self,
        candidate: &str,
        images: &mut Vec<ImageEvidence>,
        seen_paths: &mut Vec<PathBuf>,
    ) {
        let Some(format) = self.image_extension(candidate) else {
            return;
        };
        let Some(resolved) = resolve_in_dirs(&self.base_dirs, candidate) else {
            debug!(candidate, "image path does not resolve to an existing file");
            return;
        };
        if seen_paths.contains(&resolved) {
            return;
        }

        match std::fs::read(&resolved) {
            Ok(bytes) => {
                seen_paths.push(resolved.clone());
                images.push(ImageEvidence {
                    content: base64::engine::general_purpose::STANDARD.encode(bytes),
                    format,
                    path: Some(resolved.to_string_lossy().into_owned()),
                });
            }
            Err(e) => {
                warn!(path = %resolved.display(), %e, "failed to read image evidence");
            }
        }
    }

    fn image_extension(&self, path: &str) -> Option<String> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        self.image_extensions.contains(&ext).then_some(ext)
    }

    /// Heuristic layer: whole-word, case-insensitive matches of the
    /// room vocabulary in the agent's free text. Disableable as a unit.
    fn scan_room_mentions(&self, text: &str) -> Vec<String> {
        if !self.heuristics || text.is_empty() {
            return Vec::new();
        }

        self.room_vocabulary
            .iter()
            .filter(|room| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(room));
                Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

/// Validate and build one arrow candidate. An invalid direction drops
/// the whole candidate (logged, non-fatal).
fn parse_arrow(room: &str, direction: &str) -> Option<ArrowContent> {
    match direction.parse::<Direction>() {
        Ok(direction) => Some(ArrowContent {
            room: room.trim().to_string(),
            direction,
        }),
        Err(_) => {
            warn!(room = room.trim(), direction, "dropping arrow with invalid direction");
            None
        }
    }
}

/// Probe the ordered candidate base directories; first existing match
/// wins. Absolute paths are checked as-is.
fn resolve_in_dirs(base_dirs: &[PathBuf], candidate: &str) -> Option<PathBuf> {
    let path = Path::new(candidate);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }
    base_dirs
        .iter()
        .map(|base| base.join(path))
        .find(|joined| joined.is_file())
}
