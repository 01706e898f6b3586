use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinescreen::config::Config;
use cinescreen::network::PacketWriter;
use cinescreen::{HeadlessRenderer, MemoryWorld, ScreenEntity, Video, VideoInfo};

/// Replay a screen state message against an in-memory world and a headless
/// renderer, and print what the renderer was asked to do.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base64 screen state payload (defaults to a sample screen at 16,64,16)
    #[arg(short, long)]
    payload: Option<String>,

    /// Config file (defaults to the platform config dir, then built-ins)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video service id
    #[arg(short, long, default_value = "youtube")]
    service: String,

    /// Content id passed to the service
    video_id: String,

    /// Video length in seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Treat the video as a livestream
    #[arg(short, long)]
    livestream: bool,

    /// Seconds since the video started on the server
    #[arg(short, long, default_value = "0")]
    elapsed: i64,

    /// Volume fraction (defaults to the configured volume)
    #[arg(short, long)]
    volume: Option<f32>,

    /// Register before the screen's chunk is loaded
    #[arg(long)]
    chunk_unloaded: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
        )
        .init();

    tracing::info!("cinescreen v{}", env!("CARGO_PKG_VERSION"));

    let payload = match &args.payload {
        Some(encoded) => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("payload is not valid base64")?,
        None => sample_payload(),
    };

    let catalog = config.catalog()?;
    let service = catalog.require(&args.service)?;

    let renderer = Arc::new(HeadlessRenderer::new());
    let mut screen = ScreenEntity::from_bytes(&mut payload.as_slice(), renderer.clone())
        .context("failed to decode screen state")?;

    let mut world = MemoryWorld::new();
    if !args.chunk_unloaded {
        world.load_chunk(screen.chunk_pos());
    }
    screen.register(&mut world);
    if args.chunk_unloaded {
        world.load_chunk(screen.chunk_pos());
    }

    let mut info = VideoInfo::new(service, args.video_id.as_str());
    if args.livestream {
        info = info.livestream();
    } else if let Some(duration) = args.duration {
        info = info.with_duration(duration);
    }
    let start = started_at(Utc::now(), args.elapsed)?;

    screen.load_video(Video::new(info, start));
    screen.start_video();
    screen.set_video_volume(args.volume.unwrap_or(config.screen.default_volume));

    let report = serde_json::json!({
        "screen": screen.state(),
        "chunk": screen.chunk_pos(),
        "binding": screen.binding_state().to_string(),
        "marker_placed": world.has_marker(screen.pos()),
        "phase": screen.phase().to_string(),
        "url": screen.current_url(),
        "commands": renderer.commands(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    screen.unregister(&mut world);

    Ok(())
}

fn started_at(now: DateTime<Utc>, elapsed: i64) -> anyhow::Result<DateTime<Utc>> {
    Duration::try_seconds(elapsed)
        .and_then(|elapsed| now.checked_sub_signed(elapsed))
        .with_context(|| format!("--elapsed {elapsed} is out of range"))
}

fn sample_payload() -> Vec<u8> {
    PacketWriter::new()
        .write_i32(16)
        .write_i32(64)
        .write_i32(16)
        .write_string("north")
        .write_f32(4.0)
        .write_f32(2.0)
        .write_bool(true)
        .write_bool(false)
        .finish()
        .to_vec()
}
