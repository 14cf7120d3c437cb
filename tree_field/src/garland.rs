//! Gold spiral garland wound around the tree.
//!
//! Closed-form: point `i` of `n` sits at `t = i / n` on a tapering helix.
//! Expanded, the helix swells outward and the points drift; formed, it
//! breathes gently.  The field rotation is applied last.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::motion::{phase, spin, EXPANSION_ACTIVE_THRESHOLD};
use crate::AnimationState;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarlandShape {
    pub count:        usize,
    /// Height gained from the first point to the last.
    pub rise:         f32,
    /// `y` of the first point.
    pub base_y:       f32,
    pub base_radius:  f32,
    pub tip_radius:   f32,
    pub turns:        f32,
    /// Radial swell factor at full expansion.
    pub swell:        f32,
    pub breath:       f32,
}

impl Default for GarlandShape {
    fn default() -> Self {
        GarlandShape {
            count:       400,
            rise:        8.5,
            base_y:      -4.2,
            base_radius: 4.2,
            tip_radius:  0.2,
            turns:       8.0,
            swell:       2.5,
            breath:      0.02,
        }
    }
}

impl GarlandShape {
    /// Rest position of the point at parameter `t ∈ [0, 1)`.
    pub fn rest_at(&self, t: f32) -> Vec3 {
        let y = t * self.rise + self.base_y;
        let r = (self.base_radius - self.tip_radius) * (1.0 - t) + self.tip_radius;
        let theta = t * self.turns * 2.0 * PI;
        Vec3::new(r * theta.cos(), y, r * theta.sin())
    }
}

/// Precomputed rest positions plus the animation constants.
#[derive(Clone, Debug)]
pub struct Garland {
    shape: GarlandShape,
    rest:  Vec<Vec3>,
}

impl Garland {
    pub fn new(shape: GarlandShape) -> Self {
        let n = shape.count.max(1) as f32;
        let rest = (0..shape.count).map(|i| shape.rest_at(i as f32 / n)).collect();
        Garland { shape, rest }
    }

    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Animated position of point `i`.
    pub fn position(&self, i: usize, rest: Vec3, state: &AnimationState, time: f64) -> Vec3 {
        let e = state.expansion;
        let Vec3 { mut x, mut y, mut z } = rest;
        if e > EXPANSION_ACTIVE_THRESHOLD {
            let swell = 1.0 + e * self.shape.swell;
            let t = phase(time, 1.0);
            x *= swell;
            z *= swell;
            y += (t + i as f32).sin() * e;
            x += (t + y).cos() * e * 2.0;
            z += (t + x).sin() * e * 2.0;
        } else {
            let breath = 1.0 + (phase(time, 2.0) + y).sin() * self.shape.breath;
            x *= breath;
            z *= breath;
        }
        spin(Vec3::new(x, y, z), state.rotation)
    }

    /// Refill `out` with this frame's point positions.
    pub fn positions_into(&self, state: &AnimationState, time: f64, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend(self.rest.iter().enumerate().map(|(i, &p)| self.position(i, p, state, time)));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
