//! magic_tree: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use magic_tree::app::run;
use magic_tree::config::EngineConfig;
use magic_tree::error::EngineError;

/// Magic Tree CLI
#[derive(Debug, Parser)]
#[command(name = "magic_tree")]
#[command(about = "Gesture-driven particle tree scene", long_about = None)]
#[command(version)]
struct Cli {
    /// Run with the built-in scene defaults
    #[arg(long, conflicts_with = "config")]
    quick: bool,

    /// JSON scene configuration file
    #[arg(short, long, env = "MAGIC_TREE_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed RNG seed for the scene layout
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Magic Tree: gesture-driven particle tree scene        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Mode: Mouse/keyboard simulation");
    println!("  Mouse = point   LMB = pinch   O = open left   L/R = hands   Q = quit");
    println!();

    let cfg = match configure(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("  Opening preview window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: could not start: {}", e);
        std::process::exit(1);
    }
}

/// Defaults unless a config file is given; `--seed` overrides either.
fn configure(cli: &Cli) -> Result<EngineConfig, EngineError> {
    let mut cfg = match &cli.config {
        Some(path) => {
            println!("  Config: {}", path.display());
            EngineConfig::load(path)?
        }
        None => {
            println!("  Quick-start: default scene, 20 photo cards");
            EngineConfig::default()
        }
    };
    if let Some(seed) = cli.seed {
        cfg.seed = Some(seed);
    }
    println!();
    Ok(cfg)
}
