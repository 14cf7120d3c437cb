//! The per-frame interaction and animation engine.
//!
//! ```text
//!  latest inference frame ─► classify ─► interpolate(dt) ─► field + ornaments
//!                                                            │
//!                                            selection ◄─────┘
//!                                                │
//!                                         RenderPayload
//! ```
//!
//! [`Engine::step`] takes `&mut self` and returns the payload only after
//! every piece of state has been advanced, so a consumer never observes a
//! half-updated frame.

use glam::Vec3;
use hand_gesture::{Detection, HandClassifier, HandFrame};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tree_field::{
    AnimationState, Backdrop, BackdropPoint, Field, Garland, InstanceTransform, Star,
};

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::error::{EngineError, InferenceError};
use crate::interpolator::StateInterpolator;
use crate::selection::{SelectableObject, SelectableRegistry, SelectionEngine, SelectionEvent, SelectionState};
use crate::source::InferenceFrame;

// ════════════════════════════════════════════════════════════════════════════
// Inputs / outputs
// ════════════════════════════════════════════════════════════════════════════

/// What arrived from the landmark source since the previous frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameInput {
    /// Nothing new; reuse the previous hands.
    Stale,
    Fresh(Vec<Detection>),
    /// The source produced an error instead of detections.
    Failed(InferenceError),
}

impl From<Option<InferenceFrame>> for FrameInput {
    fn from(frame: Option<InferenceFrame>) -> Self {
        match frame {
            None              => FrameInput::Stale,
            Some(Ok(dets))    => FrameInput::Fresh(dets),
            Some(Err(err))    => FrameInput::Failed(err),
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct RenderPayload {
    pub animation: AnimationState,
    /// Seconds since the engine started.
    pub time:      f64,
    pub hands:     HandFrame,
    pub entities:  Vec<InstanceTransform>,
    pub ornaments: Vec<SelectableObject>,
    pub garland:   Vec<Vec3>,
    pub star:      Star,
    pub backdrop:  Vec<BackdropPoint>,
    pub selection: SelectionState,
    /// Grab/release edges that fired this frame.
    pub events:    Vec<SelectionEvent>,
}

/// What a UI layer shows: whether the engine runs and what is held.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    pub held:    Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frames:           u64,
    pub inference_frames: u64,
    pub inference_errors: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    classifier:   HandClassifier,
    interpolator: StateInterpolator,
    selection:    SelectionEngine,
    camera:       Camera,

    field:        Field,
    registry:     SelectableRegistry,
    garland:      Garland,
    backdrop:     Backdrop,

    rng:          StdRng,
    hands:        HandFrame,
    time:         f64,
    stats:        FrameStats,
    running:      bool,
}

impl Engine {
    /// Generate the scene.  All randomness (layout now, fallback picks
    /// later) comes from one RNG seeded from `config.seed` when set.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        let field = Field::generate(&config.field, &mut rng)?;
        let registry = SelectableRegistry::from_catalog(
            &config.resources.catalog,
            config.field.ornaments,
            &config.field.tree,
            &mut rng,
        );
        let garland = Garland::new(config.field.garland);
        let backdrop = Backdrop::generate(config.field.backdrop, &mut rng);

        info!(
            entities  = field.len(),
            ornaments = registry.len(),
            seed      = ?config.seed,
            "scene generated"
        );

        Ok(Engine {
            classifier:   HandClassifier::new(config.gestures),
            interpolator: StateInterpolator::new(config.interpolator),
            selection:    SelectionEngine::new(config.selection),
            camera:       config.camera,
            field,
            registry,
            garland,
            backdrop,
            rng,
            hands:        HandFrame::default(),
            time:         0.0,
            stats:        FrameStats::default(),
            running:      true,
        })
    }

    /// Advance one rendered frame by `dt` seconds.
    pub fn step(&mut self, input: FrameInput, dt: f32) -> RenderPayload {
        match input {
            FrameInput::Stale => {}
            FrameInput::Fresh(detections) => {
                self.hands = self.classifier.classify_frame(&detections);
                self.stats.inference_frames += 1;
            }
            FrameInput::Failed(err) => {
                self.stats.inference_errors += 1;
                warn!(%err, errors = self.stats.inference_errors, "inference frame failed, keeping previous hands");
            }
        }

        if dt.is_finite() && dt > 0.0 {
            self.time += dt as f64;
        }

        let target = StateInterpolator::target_for(self.hands.left.is_open);
        let animation = self.interpolator.advance(target, dt);

        self.registry.update(&animation, self.time);
        let events = self.selection.update(
            &self.hands.right,
            animation.expansion,
            &self.camera,
            &mut self.registry,
            &mut self.rng,
        );

        self.stats.frames += 1;
        self.payload(animation, events)
    }

    fn payload(&self, animation: AnimationState, events: Vec<SelectionEvent>) -> RenderPayload {
        let mut entities = Vec::with_capacity(self.field.len());
        self.field.transforms_into(&animation, self.time, &mut entities);
        let mut garland = Vec::with_capacity(self.garland.len());
        self.garland.positions_into(&animation, self.time, &mut garland);
        let mut backdrop = Vec::with_capacity(self.backdrop.points().len());
        self.backdrop.points_into(self.time, &mut backdrop);

        RenderPayload {
            animation,
            time:      self.time,
            hands:     self.hands,
            entities,
            ornaments: self.registry.objects().to_vec(),
            garland,
            star:      Star::at(animation.rotation, self.time),
            backdrop,
            selection: self.selection.state().clone(),
            events,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.running,
            held:    self.selection.held().map(str::to_owned),
        }
    }

    /// Mark the engine as no longer running.
    pub fn shutdown(&mut self) {
        self.running = false;
    }

    pub fn stats(&self) -> FrameStats         { self.stats }
    pub fn hands(&self) -> &HandFrame          { &self.hands }
    pub fn camera(&self) -> &Camera            { &self.camera }
    pub fn animation(&self) -> AnimationState  { self.interpolator.state() }
    pub fn registry(&self) -> &SelectableRegistry { &self.registry }

    pub fn registry_mut(&mut self) -> &mut SelectableRegistry {
        &mut self.registry
    }

    /// Flag a resource for placeholder rendering; logged once per id.
    pub fn mark_resource_missing(&mut self, id: &str) -> bool {
        self.registry.mark_resource_missing(id)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimHands;
    use crate::selection::ResourceStatus;
    use tree_field::FieldConfig;

    fn small_config() -> EngineConfig {
        let mut field = FieldConfig::default();
        field.layers[0].count = 100;
        field.layers[1].count = 20;
        EngineConfig { field, seed: Some(42), ..EngineConfig::default() }
    }

    fn engine() -> Engine {
        Engine::new(&small_config()).unwrap()
    }

    #[test]
    fn payload_has_every_layer() {
        let mut e = engine();
        let p = e.step(FrameInput::Stale, 1.0 / 60.0);
        assert_eq!(p.entities.len(), 120);
        assert_eq!(p.ornaments.len(), 20);
        assert_eq!(p.garland.len(), 400);
        assert_eq!(p.backdrop.len(), 800);
        assert!(p.events.is_empty());
        assert!((p.time - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn same_seed_same_scene() {
        let a = engine().step(FrameInput::Stale, 0.1);
        let b = engine().step(FrameInput::Stale, 0.1);
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.ornaments, b.ornaments);
    }

    #[test]
    fn stale_frames_keep_previous_hands() {
        let mut e = engine();
        let mut hands = SimHands::default();
        hands.left_open = true;
        e.step(FrameInput::Fresh(hands.detections()), 0.1);
        assert!(e.hands().left.is_open);
        e.step(FrameInput::Stale, 0.1);
        assert!(e.hands().left.is_open);
        assert!(e.animation().expansion > 0.5);
    }

    #[test]
    fn failed_frames_are_counted_not_fatal() {
        let mut e = engine();
        let mut hands = SimHands::default();
        hands.left_open = true;
        e.step(FrameInput::Fresh(hands.detections()), 0.1);
        e.step(FrameInput::Failed(InferenceError::Inference("timeout".into())), 0.1);
        assert_eq!(e.stats().inference_errors, 1);
        assert_eq!(e.stats().inference_frames, 1);
        assert_eq!(e.stats().frames, 2);
        assert!(e.hands().left.is_open);
    }

    #[test]
    fn empty_frame_means_no_hands() {
        let mut e = engine();
        let mut hands = SimHands::default();
        hands.left_open = true;
        e.step(FrameInput::Fresh(hands.detections()), 0.1);
        e.step(FrameInput::Fresh(Vec::new()), 0.1);
        assert!(!e.hands().left.detected);
        assert!(!e.hands().right.detected);
    }

    #[test]
    fn from_option_frame() {
        assert_eq!(FrameInput::from(None), FrameInput::Stale);
        assert_eq!(FrameInput::from(Some(Ok(vec![]))), FrameInput::Fresh(vec![]));
        let err = InferenceError::Capture("x".into());
        assert_eq!(FrameInput::from(Some(Err(err.clone()))), FrameInput::Failed(err));
    }

    #[test]
    fn clock_keeps_resolution_over_long_runs() {
        let mut e = engine();
        let dt = 1.0 / 60.0;
        // A week of frames, without building payloads.
        for _ in 0..(7 * 86_400 * 60) {
            e.time += dt as f64;
        }
        let week = 7.0 * 86_400.0;
        assert!((e.time - week).abs() / week < 1e-6);

        let before = e.step(FrameInput::Stale, dt);
        let after = e.step(FrameInput::Stale, dt);
        assert!(after.time > before.time);
        assert_ne!(before.garland, after.garland);
    }

    #[test]
    fn status_reports_running_and_held() {
        let mut e = engine();
        assert_eq!(e.status(), EngineStatus { running: true, held: None });
        e.shutdown();
        assert!(!e.status().running);
    }

    #[test]
    fn missing_resource_reaches_payload() {
        let mut e = engine();
        assert!(e.mark_resource_missing("/images/4.jpg"));
        let p = e.step(FrameInput::Stale, 0.1);
        let o = p.ornaments.iter().find(|o| o.id == "/images/4.jpg").unwrap();
        assert_eq!(o.resource, ResourceStatus::Missing);
    }
}
