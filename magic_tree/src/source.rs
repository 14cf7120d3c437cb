//! Landmark sources: anything that produces per-frame hand detections on
//! its own thread.
//!
//! The public interface is an [`InferenceFrame`] left in a latest-value
//! slot.  The engine does not care whether frames came from a real
//! inference pipeline or from the keyboard/mouse simulator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec2;
use hand_gesture::{parse_flat, Detection, Handedness, Landmark, FINGERTIPS, LANDMARK_COUNT, WRIST};
use tracing::{debug, info};

use crate::error::{EngineError, InferenceError};
use crate::handoff::{self, Publisher, Subscriber};

/// One inference result: zero to two detections, or a recoverable error.
pub type InferenceFrame = Result<Vec<Detection>, InferenceError>;

// ════════════════════════════════════════════════════════════════════════════
// PackedLandmarks: raw model output
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks as a hand-tracking model emits them: one flat
/// `[x, y, z] × 21` block per hand plus a handedness label per hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedLandmarks {
    pub flat:   Vec<f32>,
    pub labels: Vec<String>,
}

impl PackedLandmarks {
    pub fn push(&mut self, points: &[Landmark], handedness: Handedness) {
        self.flat.extend(points.iter().flat_map(|p| [p.x, p.y, p.z]));
        self.labels.push(handedness.label().to_owned());
    }

    /// Split into per-hand detections.  The label count decides how many
    /// hands the buffer must hold.
    pub fn decode(&self) -> InferenceFrame {
        let hands = parse_flat(&self.flat, self.labels.len())?;
        Ok(hands
            .into_iter()
            .zip(&self.labels)
            .map(|(points, label)| Detection::new(points, Handedness::from_label(label)))
            .collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`InferenceFrame`]s into a hand-off slot.
pub trait LandmarkSource: Send + 'static {
    /// Open the camera and load the model.  Called on the caller's thread
    /// before the source is spawned; failure here is fatal.
    fn acquire(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Publish frames until `stop` is raised or the slot is closed, then
    /// release the capture resource by returning.
    fn run(self: Box<Self>, out: Publisher<InferenceFrame>, stop: Arc<AtomicBool>);
}

// ════════════════════════════════════════════════════════════════════════════
// Spawn helper / handle
// ════════════════════════════════════════════════════════════════════════════

/// A running source.  Dropping it stops the thread without waiting.
pub struct SourceHandle {
    frames: Subscriber<InferenceFrame>,
    stop:   Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SourceHandle {
    /// Newest unseen frame, never blocking.
    pub fn take_latest(&self) -> Option<InferenceFrame> {
        self.frames.take_latest()
    }

    /// Whether the source thread has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Close the slot, signal the thread and join it.  Frames still in
    /// flight are discarded.
    pub fn stop(mut self) -> Result<(), EngineError> {
        self.signal();
        match self.thread.take() {
            Some(t) => t.join().map_err(|_| EngineError::SourcePanicked),
            None => Ok(()),
        }
    }

    fn signal(&self) {
        self.frames.close();
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Acquire `source`, then run it on its own thread.
pub fn spawn_landmark_source<S: LandmarkSource>(mut source: S) -> Result<SourceHandle, EngineError> {
    source.acquire()?;
    let (tx, rx) = handoff::latest();
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::spawn(move || Box::new(source).run(tx, flag));
    Ok(SourceHandle { frames: rx, stop, thread: Some(thread) })
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: keyboard/mouse simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the preview window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse position in NDC (`y` up).
    Pointer(Vec2),
    /// Left mouse button.
    Pinch(bool),
    /// `O` held.
    LeftOpen(bool),
    /// `L` / `R` pressed.
    ToggleHand(Handedness),
    /// `Q` pressed or window closed.
    Quit,
}

/// What the simulated hands are doing right now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHands {
    pub left_present:  bool,
    pub right_present: bool,
    pub left_open:     bool,
    pub pinch:         bool,
    pub pointer:       Vec2,
}

impl Default for SimHands {
    fn default() -> Self {
        SimHands {
            left_present:  true,
            right_present: true,
            left_open:     false,
            pinch:         false,
            pointer:       Vec2::ZERO,
        }
    }
}

impl SimHands {
    /// Fold one input into the state.  Returns `false` on quit.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Pointer(p)                      => self.pointer = p,
            SimInput::Pinch(down)                     => self.pinch = down,
            SimInput::LeftOpen(open)                  => self.left_open = open,
            SimInput::ToggleHand(Handedness::Left)    => self.left_present = !self.left_present,
            SimInput::ToggleHand(Handedness::Right)   => self.right_present = !self.right_present,
            SimInput::Quit                            => return false,
        }
        true
    }

    /// The packed buffer a real model would emit for these hands.
    pub fn packed(&self) -> PackedLandmarks {
        let mut out = PackedLandmarks::default();
        if self.left_present {
            let tip = Vec2::new(0.75, 0.45);
            out.push(&synth_hand(tip, self.left_open, false), Handedness::Left);
        }
        if self.right_present {
            let tip = ndc_to_image(self.pointer);
            out.push(&synth_hand(tip, false, self.pinch), Handedness::Right);
        }
        out
    }

    /// The detections a real model would report for these hands.
    pub fn detections(&self) -> Vec<Detection> {
        let mut out = Vec::with_capacity(2);
        if self.left_present {
            let tip = Vec2::new(0.75, 0.45);
            out.push(Detection::new(synth_hand(tip, self.left_open, false), Handedness::Left));
        }
        if self.right_present {
            let tip = ndc_to_image(self.pointer);
            out.push(Detection::new(synth_hand(tip, false, self.pinch), Handedness::Right));
        }
        out
    }
}

/// Inverse of the classifier's pointer mapping.
pub fn ndc_to_image(ndc: Vec2) -> Vec2 {
    Vec2::new(0.5 - ndc.x * 0.5, 0.5 - ndc.y * 0.5)
}

// Wrist → fingertip reach for an open and a curled hand.
const OPEN_REACH:   f32 = 0.30;
const CLOSED_REACH: f32 = 0.10;
const PINCH_GAP:    f32 = 0.01;

/// Build a 21-point hand whose index tip sits at `index_tip` (image space).
pub fn synth_hand(index_tip: Vec2, open: bool, pinching: bool) -> Vec<Landmark> {
    let reach = if open { OPEN_REACH } else { CLOSED_REACH };
    // Fingers fan upward in image space (y grows downward).
    let dirs = [-1.2_f32, -0.35, 0.0, 0.35, 0.7].map(|a| Vec2::new(a.sin(), -a.cos()));
    let wrist = index_tip - dirs[1] * reach;

    let mut tips = dirs.map(|d| wrist + d * reach);
    tips[1] = index_tip;
    if pinching {
        tips[0] = index_tip + Vec2::new(PINCH_GAP, 0.0);
    }

    let mut points = vec![Landmark::default(); LANDMARK_COUNT];
    points[WRIST] = Landmark::new(wrist.x, wrist.y, 0.0);
    for (finger, &tip_index) in FINGERTIPS.iter().enumerate() {
        let tip = tips[finger];
        for joint in 0..3 {
            let p = wrist.lerp(tip, (joint + 1) as f32 / 4.0);
            points[tip_index - 3 + joint] = Landmark::new(p.x, p.y, 0.0);
        }
        points[tip_index] = Landmark::new(tip.x, tip.y, 0.0);
    }
    points
}

/// Slowest rate the simulated model accepts.
pub const MIN_INFERENCE_HZ: f32 = 0.1;

/// Landmark source driven by [`SimInput`] events from the preview window.
pub struct SimLandmarkSource {
    pub rx:           Receiver<SimInput>,
    pub inference_hz: f32,
    pub hands:        SimHands,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>, inference_hz: f32) -> Self {
        SimLandmarkSource { rx, inference_hz, hands: SimHands::default() }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn acquire(&mut self) -> Result<(), EngineError> {
        if !(self.inference_hz.is_finite() && self.inference_hz >= MIN_INFERENCE_HZ) {
            return Err(EngineError::ModelLoad(format!(
                "simulated model needs an inference rate of at least {} Hz, got {}",
                MIN_INFERENCE_HZ,
                self.inference_hz
            )));
        }
        Ok(())
    }

    fn run(mut self: Box<Self>, out: Publisher<InferenceFrame>, stop: Arc<AtomicBool>) {
        let period = Duration::from_secs_f32(1.0 / self.inference_hz);
        info!(hz = self.inference_hz, "simulated landmark source started");
        loop {
            if stop.load(Ordering::Relaxed) { break; }

            loop {
                match self.rx.try_recv() {
                    Ok(input) => {
                        if !self.hands.apply(input) {
                            debug!("quit requested");
                            out.publish(self.hands.packed().decode());
                            return;
                        }
                    }
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            if !out.publish(self.hands.packed().decode()) { break; }
            thread::sleep(period);
        }
        debug!("simulated landmark source stopped");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
