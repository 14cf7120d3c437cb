//! Top-level run loop.
//!
//! Wires the simulated landmark source, the engine, and the preview window
//! together and drives them at the window's frame rate.

use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::{EngineConfig, ResourceConfig};
use crate::engine::{Engine, FrameInput};
use crate::error::EngineError;
use crate::source::{spawn_landmark_source, SimInput, SimLandmarkSource};
use crate::visualizer::Visualizer;

/// Longest step fed to the engine; a stalled frame must not jump the scene.
pub const MAX_FRAME_DT: f32 = 0.1;

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

/// Seconds between two frame instants, clamped to `[0, MAX_FRAME_DT]`.
pub fn frame_dt(last: Instant, now: Instant) -> f32 {
    now.saturating_duration_since(last).as_secs_f32().min(MAX_FRAME_DT)
}

/// Mark every catalog entry whose file is absent under `resources.root`.
/// Without a root nothing is checked.  Returns how many were marked.
pub fn check_resources(engine: &mut Engine, resources: &ResourceConfig) -> usize {
    let ids: Vec<String> = engine.registry().ids().map(str::to_owned).collect();
    let mut missing = 0;
    for id in ids {
        let Some(path) = resources.resolve(&id) else { continue };
        if !exists(&path) && engine.mark_resource_missing(&id) {
            missing += 1;
        }
    }
    missing
}

fn exists(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Startup failures (no landmark source, no window, invalid scene) are
/// returned before the first frame.  Per-frame inference errors are logged
/// by the engine and never end the loop.
pub fn run(cfg: EngineConfig) -> Result<(), EngineError> {
    // ── Landmark source ───────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let source = spawn_landmark_source(SimLandmarkSource::new(sim_rx, cfg.inference_hz))?;

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── Engine ────────────────────────────────────────────────────────────
    let mut engine = Engine::new(&cfg)?;
    let missing = check_resources(&mut engine, &cfg.resources);
    if missing > 0 {
        warn!(missing, "some resources will render as placeholders");
    }

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut last = Instant::now();
    while vis.is_open() {
        if !vis.poll_input() { break; }

        let now = Instant::now();
        let dt = frame_dt(last, now);
        last = now;

        let payload = engine.step(FrameInput::from(source.take_latest()), dt);

        vis.render(&payload, engine.camera(), &engine.status(), &engine.stats())?;

        if source.is_finished() {
            info!("landmark source ended");
            break;
        }
    }

    engine.shutdown();
    let stats = engine.stats();
    info!(
        frames           = stats.frames,
        inference_frames = stats.inference_frames,
        inference_errors = stats.inference_errors,
        "shutting down"
    );
    source.stop()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
