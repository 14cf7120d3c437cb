//! Non-interactive decoration: the star on top and the dim particle backdrop.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::motion::{phase, wrap_angle};

// ════════════════════════════════════════════════════════════════════════════
// Star
// ════════════════════════════════════════════════════════════════════════════

/// Star pose for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub yaw:      f32,
}

impl Star {
    pub const HEIGHT:       f32 = 4.2;
    pub const BOB:          f32 = 0.1;
    pub const SPIN_RATE:    f32 = 0.5;
    pub const OUTER_RADIUS: f32 = 0.8;
    pub const INNER_RADIUS: f32 = 0.38;
    pub const POINTS:       usize = 5;

    /// Bobs at the tip and turns against the field rotation.
    pub fn at(rotation: f64, time: f64) -> Self {
        Star {
            position: Vec3::new(0.0, Self::HEIGHT + phase(time, 2.0).sin() * Self::BOB, 0.0),
            yaw:      wrap_angle(rotation - time * Self::SPIN_RATE as f64),
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Planar outline, alternating outer and inner vertices, first point up.
    pub fn outline() -> Vec<Vec2> {
        (0..Self::POINTS * 2)
            .map(|i| {
                let angle = i as f32 * PI / Self::POINTS as f32 + FRAC_PI_2;
                let r = if i % 2 == 0 { Self::OUTER_RADIUS } else { Self::INNER_RADIUS };
                Vec2::new(angle.cos() * r, angle.sin() * r)
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Backdrop
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropShape {
    pub count:      usize,
    /// Full box extent along x, y, z.
    pub extent:     Vec3,
    /// Box centre offset along z (negative = behind the tree).
    pub z_offset:   f32,
    pub brightness: (f32, f32),
    pub yaw_rate:   f32,
    pub roll_rate:  f32,
    pub roll_amp:   f32,
}

impl Default for BackdropShape {
    fn default() -> Self {
        BackdropShape {
            count:      800,
            extent:     Vec3::new(60.0, 60.0, 40.0),
            z_offset:   -15.0,
            brightness: (0.3, 1.0),
            yaw_rate:   0.02,
            roll_rate:  0.05,
            roll_amp:   0.05,
        }
    }
}

/// One dim backdrop point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackdropPoint {
    pub position: Vec3,
    pub color:    Vec3,
}

/// Static points in a box; the whole container turns slowly.
#[derive(Clone, Debug)]
pub struct Backdrop {
    shape:  BackdropShape,
    points: Vec<BackdropPoint>,
}

impl Backdrop {
    pub fn generate<R: Rng + ?Sized>(shape: BackdropShape, rng: &mut R) -> Self {
        let points = (0..shape.count)
            .map(|_| {
                let position = Vec3::new(
                    (rng.gen::<f32>() - 0.5) * shape.extent.x,
                    (rng.gen::<f32>() - 0.5) * shape.extent.y,
                    (rng.gen::<f32>() - 0.5) * shape.extent.z + shape.z_offset,
                );
                let (lo, hi) = shape.brightness;
                let b = lo + rng.gen::<f32>() * (hi - lo);
                BackdropPoint { position, color: Vec3::new(0.8 * b, 0.9 * b, b) }
            })
            .collect();
        Backdrop { shape, points }
    }

    pub fn points(&self) -> &[BackdropPoint] {
        &self.points
    }

    /// Container orientation: slow yaw plus a small periodic roll.
    pub fn orientation(&self, time: f64) -> Quat {
        let roll = phase(time, self.shape.roll_rate).sin() * self.shape.roll_amp;
        Quat::from_rotation_y(phase(time, self.shape.yaw_rate)) * Quat::from_rotation_z(roll)
    }

    /// Refill `out` with world-space points for this frame.
    pub fn points_into(&self, time: f64, out: &mut Vec<BackdropPoint>) {
        let q = self.orientation(time);
        out.clear();
        out.extend(self.points.iter().map(|p| BackdropPoint { position: q * p.position, color: p.color }));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
