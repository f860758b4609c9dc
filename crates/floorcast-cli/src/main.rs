//! `floorcast` — classify agent response bundles and render map
//! directives onto a floorplan surface.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use async_trait::async_trait;
use floorcast_classify::Classifier;
use floorcast_core::config::Config;
use floorcast_core::map::{MapDefinition, MapDirective};
use floorcast_core::output::{AgentResponseBundle, OutputItem, Sink};
use floorcast_core::protocol::OutputSink;
use floorcast_render::{AssetLoader, RenderEngine, RenderEvent};

#[derive(Parser)]
#[command(
    name = "floorcast",
    about = "Relay agent output into a structured multi-pane floorplan UI",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an agent response bundle into output items
    Classify {
        /// Bundle JSON file ("-" for stdin)
        #[arg(short, long)]
        bundle: String,

        /// Pretty-print items instead of one JSON per line
        #[arg(long)]
        pretty: bool,
    },

    /// Render map directives onto a floorplan surface and save a PNG
    Render {
        /// Map definition JSON file
        #[arg(short, long)]
        definition: Option<PathBuf>,

        /// Legacy floor image reference (with --legacy-rects)
        #[arg(long)]
        legacy_image: Option<String>,

        /// Legacy rectangle description document (with --legacy-image)
        #[arg(long)]
        legacy_rects: Option<PathBuf>,

        /// Map directive JSON file(s), applied in order
        #[arg(long)]
        directive: Vec<PathBuf>,

        /// Classified output item JSON file(s); map-tier items are
        /// applied in order
        #[arg(long)]
        items: Vec<PathBuf>,

        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,

        /// Surface size as WIDTHxHEIGHT (default from config)
        #[arg(long)]
        size: Option<String>,
    },

    /// Validate a map definition and summarize its contents
    Inspect {
        /// Map definition JSON file
        #[arg(short, long)]
        definition: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("floorcast.json"));
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Classify { bundle, pretty } => classify(&config, &bundle, pretty).await,
        Commands::Render {
            definition,
            legacy_image,
            legacy_rects,
            directive,
            items,
            out,
            size,
        } => {
            render(
                &config,
                definition,
                legacy_image.zip(legacy_rects),
                directive,
                items,
                out,
                size,
            )
            .await
        }
        Commands::Inspect { definition } => inspect(&definition),
    }
}

/// Writes every delivered item as JSON on stdout.
struct JsonLineSink {
    pretty: bool,
}

#[async_trait]
impl OutputSink for JsonLineSink {
    async fn deliver(&self, item: &OutputItem) -> floorcast_core::Result<()> {
        let line = if self.pretty {
            serde_json::to_string_pretty(item)?
        } else {
            serde_json::to_string(item)?
        };
        println!("{line}");
        Ok(())
    }
}

async fn classify(config: &Config, bundle_path: &str, pretty: bool) -> anyhow::Result<()> {
    let raw = if bundle_path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(bundle_path)
            .with_context(|| format!("read bundle {bundle_path}"))?
    };
    let bundle: AgentResponseBundle =
        serde_json::from_str(&raw).context("parse agent response bundle")?;

    let items = Classifier::new(config).classify(&bundle);
    let sink = JsonLineSink { pretty };
    for item in &items {
        sink.deliver(item).await?;
    }

    let map_items = items.iter().filter(|i| i.destination() == Sink::Map).count();
    tracing::info!(total = items.len(), map_items, "classification complete");
    Ok(())
}

async fn render(
    config: &Config,
    definition: Option<PathBuf>,
    legacy: Option<(String, PathBuf)>,
    directives: Vec<PathBuf>,
    item_files: Vec<PathBuf>,
    out: PathBuf,
    size: Option<String>,
) -> anyhow::Result<()> {
    let mut engine = RenderEngine::new(config);
    if let Some(size) = size {
        let (w, h) = parse_size(&size)?;
        engine.set_surface_size(w, h);
    }

    match (definition, legacy) {
        (Some(path), _) => {
            let def: MapDefinition = serde_json::from_str(
                &std::fs::read_to_string(&path)
                    .with_context(|| format!("read definition {}", path.display()))?,
            )
            .context("parse map definition")?;
            engine.load_definition(def)?;
        }
        (None, Some((image, rects))) => {
            let doc = std::fs::read_to_string(&rects)
                .with_context(|| format!("read legacy rectangles {}", rects.display()))?;
            engine.load_legacy_definition(&doc, &image, &config.bitmap_dir())?;
        }
        (None, None) => {
            anyhow::bail!("either --definition or --legacy-image/--legacy-rects is required")
        }
    }

    let loader = AssetLoader::new(config);
    let (tx, mut rx) = mpsc::unbounded_channel::<RenderEvent>();
    pump(&mut engine, &loader, &tx, &mut rx).await;

    for path in directives {
        let directive: MapDirective = serde_json::from_str(
            &std::fs::read_to_string(&path)
                .with_context(|| format!("read directive {}", path.display()))?,
        )
        .context("parse map directive")?;
        engine.apply_directive(directive);
        pump(&mut engine, &loader, &tx, &mut rx).await;
    }

    for path in item_files {
        let items: Vec<OutputItem> = serde_json::from_str(
            &std::fs::read_to_string(&path)
                .with_context(|| format!("read items {}", path.display()))?,
        )
        .context("parse output items")?;
        for item in &items {
            engine.apply_item(item);
            pump(&mut engine, &loader, &tx, &mut rx).await;
        }
    }

    engine.render().save(&out).context("save rendered surface")?;
    tracing::info!(out = %out.display(), "surface rendered");
    Ok(())
}

/// Fulfil pending load requests until the engine settles.
async fn pump(
    engine: &mut RenderEngine,
    loader: &AssetLoader,
    tx: &mpsc::UnboundedSender<RenderEvent>,
    rx: &mut mpsc::UnboundedReceiver<RenderEvent>,
) {
    let mut in_flight = 0usize;
    loop {
        for request in engine.take_load_requests() {
            loader.spawn_load(request, tx.clone());
            in_flight += 1;
        }
        if in_flight == 0 {
            break;
        }
        let Some(event) = rx.recv().await else {
            break;
        };
        in_flight -= 1;
        engine.handle_event(event);
    }
}

fn inspect(definition: &PathBuf) -> anyhow::Result<()> {
    let def: MapDefinition = serde_json::from_str(
        &std::fs::read_to_string(definition)
            .with_context(|| format!("read definition {}", definition.display()))?,
    )
    .context("parse map definition")?;
    def.validate()?;

    println!("Floors: {}", def.floors.len());
    for floor in &def.floors {
        println!(
            "  {} ({}) — image {}, {} rectangles",
            floor.floor_id,
            floor.floor_name,
            floor.floor_image,
            floor.rectangles.len()
        );
        for rect in &floor.rectangles {
            println!(
                "    {} [{:.1},{:.1}]..[{:.1},{:.1}]",
                rect.name,
                rect.top_left.x,
                rect.top_left.y,
                rect.bottom_right.x,
                rect.bottom_right.y
            );
        }
    }
    println!("Bitmaps: {}", def.bitmaps.len());
    for bitmap in &def.bitmaps {
        println!("  {} — {}", bitmap.bitmap_id, bitmap.bitmap_file);
    }
    Ok(())
}

fn parse_size(size: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = size
        .split_once('x')
        .context("size must be WIDTHxHEIGHT, e.g. 1280x720")?;
    Ok((w.parse()?, h.parse()?))
}
