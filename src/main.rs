use std::path::PathBuf;

use clap::Parser;
use sketch_canvas::camera::Point;
use sketch_canvas::config::CanvasConfig;
use sketch_canvas::engine::{Action, CanvasController, Engine, NoticeLevel, composite_file};
use sketch_canvas::error::{ExportError, LoadError};
use sketch_canvas::export::CompositeFile;
use sketch_canvas::input::{Button, Modifiers};
use sketch_canvas::payload::DragPayload;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("engine setup failed: {0}")]
    Setup(#[from] LoadError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("nothing to export: {0}")]
    NothingToExport(&'static str),
    #[error("write to {path} failed: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "sketch-canvas", about = "Compose a background, dropped images, and a path into a PNG")]
struct Cli {
    /// Background image URL or file path.
    #[arg(long, env = "CANVAS_BACKGROUND")]
    background: Option<String>,

    /// Image to drop, as `URL@X,Y` in screen pixels. Repeatable.
    #[arg(long = "drop", value_parser = parse_drop)]
    drops: Vec<DropArg>,

    /// Stroke point `X,Y` in screen pixels. Repeat to trace a path.
    #[arg(long = "point", value_parser = parse_point)]
    stroke: Vec<Point>,

    #[arg(long, env = "CANVAS_WIDTH", default_value_t = 1000.0)]
    width: f64,

    #[arg(long, env = "CANVAS_HEIGHT", default_value_t = 1032.0)]
    height: f64,

    #[arg(long, env = "CANVAS_DPR", default_value_t = 1.0)]
    dpr: f64,

    /// Export the whole viewport instead of cropping to the background.
    #[arg(long)]
    full: bool,

    /// Output PNG path.
    #[arg(long, short, default_value = "composite-image.png")]
    out: PathBuf,
}

#[derive(Debug, Clone)]
struct DropArg {
    url: String,
    at: Point,
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw.split_once(',').ok_or_else(|| format!("expected X,Y, got `{raw}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{raw}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{raw}`: {e}"))?;
    let p = Point::new(x, y);
    if p.is_finite() { Ok(p) } else { Err(format!("non-finite point `{raw}`")) }
}

fn parse_drop(raw: &str) -> Result<DropArg, String> {
    let (url, at) = raw.rsplit_once('@').ok_or_else(|| format!("expected URL@X,Y, got `{raw}`"))?;
    Ok(DropArg { url: url.to_string(), at: parse_point(at)? })
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "no .env loaded");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "sketch-canvas failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut engine = Engine::with_http(CanvasConfig::from_env())?;
    report(engine.set_viewport(cli.width, cli.height, cli.dpr));

    if let Some(url) = cli.background.as_deref() {
        report(engine.set_background_url(Some(url)));
        report(engine.settle().await);
    }

    for (i, drop) in cli.drops.iter().enumerate() {
        let payload = DragPayload {
            id: format!("cli-{i}"),
            url: drop.url.clone(),
            thumbnail_url: None,
            file: None,
            timestamp: 0,
        };
        report(engine.handle_drop(payload, drop.at));
    }
    report(engine.settle().await);

    if let Some((first, rest)) = cli.stroke.split_first() {
        report(engine.set_drawing_intent(true));
        report(engine.on_pointer_down(*first, Button::Primary, Modifiers::default()));
        for p in rest {
            report(engine.on_pointer_move(*p));
        }
        let last = rest.last().unwrap_or(first);
        report(engine.on_pointer_up(*last));
    }

    let file = if cli.full {
        let raster = engine.export_full().ok_or(CliError::NothingToExport("viewport has no area"))?;
        CompositeFile::from_raster(&raster)?
    } else {
        composite_file(&engine)?.ok_or(CliError::NothingToExport("no background to crop to"))?
    };
    tokio::fs::write(&cli.out, &file.bytes)
        .await
        .map_err(|source| CliError::Write { path: cli.out.clone(), source })?;
    info!(path = %cli.out.display(), bytes = file.bytes.len(), mime = %file.mime, "composite written");
    Ok(())
}

/// Log the actions a headless run cares about.
fn report(actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Notify(notice) => match notice.level {
                NoticeLevel::Info => info!(message = %notice.message, "notice"),
                NoticeLevel::Warning => warn!(message = %notice.message, "notice"),
                NoticeLevel::Error => error!(message = %notice.message, "notice"),
            },
            Action::PathCompleted(svg) => info!(path = %svg, "path completed"),
            Action::BackgroundChanged { native } => info!(?native, "background changed"),
            Action::ObjectAdded { id } => info!(%id, "image placed"),
            other => debug!(action = ?other, "action"),
        }
    }
}
