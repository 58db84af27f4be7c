//! paint_hands - interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use paint_gesture::{EraserPolicy, PaintConfig};
use paint_hands::app::{run, AppConfig};
use paint_hands::passthrough::ViewMode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paint_hands", version, about = "Paint in the air with your hands")]
struct Cli {
    /// TOML file with thresholds, palette and voice phrases
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Eraser gesture: openness-hold or dual-pinch
    #[arg(long)]
    eraser: Option<EraserPolicy>,

    /// Start in passthrough (scene objects hidden)
    #[arg(long)]
    passthrough: bool,

    /// Use the LeapMotion controller (needs the `leap` feature)
    #[arg(long)]
    hardware: bool,

    /// Don't read voice transcripts from stdin
    #[arg(long)]
    no_voice: bool,

    /// Skip the startup banner prompt
    #[arg(long)]
    quick: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paint_hands=info,paint_gesture=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut paint = match &cli.config {
        Some(path) => PaintConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PaintConfig::default(),
    };
    if let Some(policy) = cli.eraser {
        paint.erase.policy = policy;
    }

    let cfg = AppConfig {
        paint,
        start_mode: if cli.passthrough { ViewMode::Passthrough } else { ViewMode::Scene },
        stdin_voice: !cli.no_voice,
        hardware: cli.hardware,
        ..AppConfig::default()
    };

    if !cli.quick {
        banner(&cfg);
    }

    info!(eraser = %cfg.paint.erase.policy, mode = %cfg.start_mode, "opening visualizer");
    run(cfg)
}

fn banner(cfg: &AppConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Paint Hands - spatial painting with gestures        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    if cfg.hardware {
        println!("  Mode: LeapMotion hardware");
    } else {
        println!("  Mode: Keyboard/mouse simulation  (--hardware with --features leap for a controller)");
    }
    println!("  Eraser: {}", cfg.paint.erase.policy);
    if cfg.stdin_voice {
        println!("  Voice: type a phrase and press Enter (\"reset scene\", \"toggle mode\")");
    }
    println!();
}
