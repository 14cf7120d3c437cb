//! # hand_gesture
//!
//! Turns one frame of 21-point hand landmarks into the semantic signals the
//! tree scene reacts to.
//!
//! ## Signal → landmark mapping
//!
//! | Signal | Landmarks | Rule |
//! |---|---|---|
//! | `position` | index tip (8) | `c' = -(c - 0.5) * 2` per axis (mirrors the video) |
//! | `is_open` | wrist (0) → tips 4, 8, 12, 16, 20 | mean planar distance `> 0.25` |
//! | `is_pinching` | thumb tip (4) ↔ index tip (8) | planar distance `< 0.05` |
//!
//! Roles are assigned from the inference engine's handedness label for the
//! current frame only; nothing is remembered between frames.
//!
//! ```rust
//! use hand_gesture::{HandClassifier, Landmark, LANDMARK_COUNT};
//!
//! let hand = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
//! let obs = HandClassifier::default().classify(&hand);
//! assert!(obs.detected);
//! assert!(obs.is_pinching);   // every point collapsed onto one spot
//! assert!(!obs.is_open);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Points per detected hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP:   usize = 16;
pub const PINKY_TIP:  usize = 20;

/// Fingertips used for the openness measure, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

// ════════════════════════════════════════════════════════════════════════════
// Landmark / Handedness / Detection
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point, in normalized (0–1) image coordinates.
/// `z` is relative depth and does not take part in classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    fn planar(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The inference engine's left/right tag for a detected hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Map a raw classifier label onto a role.
    ///
    /// Only `"Left"` (any case) selects the left role; every other label,
    /// including unknown ones, lands on the right role.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("left") {
            Handedness::Left
        } else {
            Handedness::Right
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// One `(landmarks, handedness)` tuple delivered by the inference engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub landmarks:  Vec<Landmark>,
    pub handedness: Handedness,
}

impl Detection {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness) -> Self {
        Detection { landmarks, handedness }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Problems decoding a packed landmark buffer.
///
/// Classification itself never fails; these only surface from
/// [`parse_flat`], before data reaches the classifier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("landmark buffer too short: need {expected} floats for {hands} hand(s), got {found}")]
    ShortBuffer { hands: usize, expected: usize, found: usize },

    #[error("at most 2 hands per frame are supported, got {0}")]
    TooManyHands(usize),
}

/// Decode the packed `[x, y, z] × 21 × num_hands` layout used by landmark
/// producers into one vector of points per hand.
pub fn parse_flat(flat: &[f32], num_hands: usize) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
    if num_hands > 2 {
        return Err(LandmarkError::TooManyHands(num_hands));
    }
    let expected = num_hands * LANDMARK_COUNT * 3;
    if flat.len() < expected {
        return Err(LandmarkError::ShortBuffer { hands: num_hands, expected, found: flat.len() });
    }

    Ok(flat[..expected]
        .chunks_exact(LANDMARK_COUNT * 3)
        .map(|hand| {
            hand.chunks_exact(3)
                .map(|p| Landmark::new(p[0], p[1], p[2]))
                .collect()
        })
        .collect())
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation / HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// Semantic signals for one role in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub detected:    bool,
    pub is_open:     bool,
    pub is_pinching: bool,
    /// Pointer position in `[-1, 1]²`, mirrored to match the preview.
    pub position:    Vec2,
}

impl HandObservation {
    /// The neutral value reported for a role absent from the frame.
    pub const ABSENT: HandObservation = HandObservation {
        detected:    false,
        is_open:     false,
        is_pinching: false,
        position:    Vec2::ZERO,
    };
}

/// Both roles for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    /// Expansion-control hand.
    pub left:  HandObservation,
    /// Pointer hand.
    pub right: HandObservation,
}

impl HandFrame {
    pub fn role(&self, handedness: Handedness) -> &HandObservation {
        match handedness {
            Handedness::Left  => &self.left,
            Handedness::Right => &self.right,
        }
    }

    fn role_mut(&mut self, handedness: Handedness) -> &mut HandObservation {
        match handedness {
            Handedness::Left  => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Calibration constants, in normalized landmark units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Mean wrist→fingertip distance above which a hand counts as open.
    pub open_distance:  f32,
    /// Thumb↔index distance below which a hand counts as pinching.
    pub pinch_distance: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            open_distance:  0.25,
            pinch_distance: 0.05,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Measures
// ════════════════════════════════════════════════════════════════════════════

/// One full hand's worth of points.  The measures below take this instead of
/// a slice so a short set cannot reach them.
pub type HandLandmarks = [Landmark; LANDMARK_COUNT];

/// Mean planar distance from the wrist to the five fingertips.
pub fn openness(landmarks: &HandLandmarks) -> f32 {
    let wrist = landmarks[WRIST].planar();
    let total: f32 = FINGERTIPS
        .iter()
        .map(|&tip| landmarks[tip].planar().distance(wrist))
        .sum();
    total / FINGERTIPS.len() as f32
}

/// Planar distance between thumb tip and index tip.
pub fn pinch_distance(landmarks: &HandLandmarks) -> f32 {
    landmarks[THUMB_TIP].planar().distance(landmarks[INDEX_TIP].planar())
}

/// Index-tip pointer mapped from image space into mirrored `[-1, 1]²`.
pub fn pointer_position(landmarks: &HandLandmarks) -> Vec2 {
    let tip = landmarks[INDEX_TIP];
    Vec2::new(-(tip.x - 0.5) * 2.0, -(tip.y - 0.5) * 2.0)
}

// ════════════════════════════════════════════════════════════════════════════
// HandClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Stateless classifier; every call is a pure function of its inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandClassifier {
    pub thresholds: GestureThresholds,
}

impl HandClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        HandClassifier { thresholds }
    }

    /// Classify one hand.
    ///
    /// Only the first [`LANDMARK_COUNT`] points are read.  Malformed input
    /// (too few points, non-finite coordinates) is reported as an absent
    /// hand rather than an error.
    pub fn classify(&self, landmarks: &[Landmark]) -> HandObservation {
        let Some(points) = landmarks
            .get(..LANDMARK_COUNT)
            .and_then(|head| <&HandLandmarks>::try_from(head).ok())
        else {
            debug!(points = landmarks.len(), "short landmark set, treating hand as absent");
            return HandObservation::ABSENT;
        };
        if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
            debug!(index = bad, "non-finite landmark, treating hand as absent");
            return HandObservation::ABSENT;
        }

        HandObservation {
            detected:    true,
            is_open:     openness(points) > self.thresholds.open_distance,
            is_pinching: pinch_distance(points) < self.thresholds.pinch_distance,
            position:    pointer_position(points),
        }
    }

    /// Classify every detection of a frame and assign roles by label.
    ///
    /// Roles without a detection stay [`HandObservation::ABSENT`]. If two
    /// detections share a label, the later one wins.
    pub fn classify_frame(&self, detections: &[Detection]) -> HandFrame {
        let mut frame = HandFrame::default();
        for det in detections {
            let obs = self.classify(&det.landmarks);
            if obs.detected {
                *frame.role_mut(det.handedness) = obs;
            }
        }
        frame
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
