//! Per-frame motion pipeline shared by every dual-state layer.
//!
//! ```text
//! formed ─┐
//!         ├─ blend(expansion) ─ perturb(time, speed) ─ spin(rotation) ─► world
//! exploded┘
//! ```

use std::f64::consts::TAU;

use glam::{Quat, Vec3};

use crate::AnimationState;

/// Expansion above which the field drifts instead of bobbing.
pub const EXPANSION_ACTIVE_THRESHOLD: f32 = 0.05;

// Drift amplitudes per axis at full expansion.
const DRIFT_X: f32 = 1.5;
const DRIFT_Y: f32 = 1.0;
const DRIFT_Z: f32 = 1.5;
const DRIFT_Y_RATE: f32 = 0.7;
const DRIFT_Z_PHASE: f32 = 2.0;

/// `rate * time` reduced to `[0, 2π)`.  The clock stays `f64` so the
/// product keeps full resolution however long the scene has been running;
/// only the reduced angle is narrowed to `f32`.
pub fn phase(time: f64, rate: f32) -> f32 {
    (time * rate as f64).rem_euclid(TAU) as f32
}

/// An unbounded angle reduced to `[0, 2π)`.
pub fn wrap_angle(radians: f64) -> f32 {
    radians.rem_euclid(TAU) as f32
}

/// Linear mix of the two resting positions.  `expansion` is clamped to
/// `[0, 1]`, so the endpoints reproduce `formed` and `exploded` exactly.
pub fn blend(formed: Vec3, exploded: Vec3, expansion: f32) -> Vec3 {
    let t = expansion.clamp(0.0, 1.0);
    if t == 0.0 { return formed; }
    if t == 1.0 { return exploded; }
    formed.lerp(exploded, t)
}

/// State-dependent offset: outward drift while expanded, a small vertical
/// bob while formed.
pub fn perturb(pos: Vec3, expansion: f32, time: f64, speed: f32, bob_amplitude: f32) -> Vec3 {
    let mut p = pos;
    let base = phase(time, speed);
    if expansion > EXPANSION_ACTIVE_THRESHOLD {
        p.x += base.cos() * expansion * DRIFT_X;
        p.y += phase(time, speed * DRIFT_Y_RATE).sin() * expansion * DRIFT_Y;
        p.z += (base + DRIFT_Z_PHASE).sin() * expansion * DRIFT_Z;
    } else {
        p.y += (base + pos.y).sin() * bob_amplitude;
    }
    p
}

/// Yaw about the vertical axis, applied last so the whole field turns
/// together.
pub fn spin(pos: Vec3, rotation: f64) -> Vec3 {
    let (s, c) = wrap_angle(rotation).sin_cos();
    Vec3::new(pos.x * c - pos.z * s, pos.y, pos.x * s + pos.z * c)
}

/// Full pipeline for one entity.
pub fn world_position(
    formed:        Vec3,
    exploded:      Vec3,
    state:         &AnimationState,
    time:          f64,
    speed:         f32,
    bob_amplitude: f32,
) -> Vec3 {
    let blended = blend(formed, exploded, state.expansion);
    let moved = perturb(blended, state.expansion, time, speed, bob_amplitude);
    spin(moved, state.rotation)
}

/// Per-instance tumble about a random axis; still while formed.
pub fn tumble(axis: Vec3, speed: f32, expansion: f32, time: f64, rate: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, phase(time, speed * expansion * rate))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
