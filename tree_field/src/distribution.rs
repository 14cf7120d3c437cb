//! Closed-form resting-position distributions.
//!
//! Each shape has a deterministic `*_at` form taking unit-interval inputs and
//! a `sample_*` wrapper that feeds it from an RNG, so the geometry can be
//! tested without randomness.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{check_range, sample_range, FieldError};

// ════════════════════════════════════════════════════════════════════════════
// TreeShape: formed state
// ════════════════════════════════════════════════════════════════════════════

/// Spiral cone the formed field sits in, centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeShape {
    pub height:      f32,
    pub base_radius: f32,
    /// Extra azimuth (radians) gained from base to tip.
    pub twist:       f32,
    /// Exponent applied to the uniform height draw.
    pub height_bias: f32,
}

impl Default for TreeShape {
    fn default() -> Self {
        TreeShape {
            height:      7.5,
            base_radius: 3.2,
            twist:       15.0,
            height_bias: 0.9,
        }
    }
}

impl TreeShape {
    /// World `y` for a normalized height `h ∈ [0, 1]`.
    pub fn y_at(&self, h: f32) -> f32 {
        h * self.height - self.height / 2.0
    }

    /// Outer cone radius at normalized height `h`.
    pub fn radius_at(&self, h: f32) -> f32 {
        self.base_radius * (1.0 - h)
    }

    /// Formed position from three unit draws: height, radial fill, azimuth.
    pub fn formed_at(&self, u_height: f32, u_radial: f32, u_azimuth: f32) -> Vec3 {
        let h = u_height.powf(self.height_bias);
        let r = self.radius_at(h) * u_radial.sqrt();
        let theta = u_azimuth * TAU + h * self.twist;
        Vec3::new(r * theta.cos(), self.y_at(h), r * theta.sin())
    }

    pub fn sample_formed<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.formed_at(rng.gen(), rng.gen(), rng.gen())
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        check_range("tree height", (0.0, self.height))?;
        check_range("tree base radius", (0.0, self.base_radius))?;
        check_range("tree height bias", (f32::MIN_POSITIVE, self.height_bias))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShellShape: exploded state
// ════════════════════════════════════════════════════════════════════════════

/// Thick spherical shell the exploded field scatters onto.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellShape {
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for ShellShape {
    fn default() -> Self {
        ShellShape { min_radius: 6.0, max_radius: 14.0 }
    }
}

impl ShellShape {
    pub fn new(min_radius: f32, max_radius: f32) -> Self {
        ShellShape { min_radius, max_radius }
    }

    /// Point at `radius` with azimuth from `u_azimuth` and polar angle from
    /// `u_polar` by inverse-cosine sampling (uniform over solid angle).
    pub fn point_at(radius: f32, u_azimuth: f32, u_polar: f32) -> Vec3 {
        let theta = u_azimuth * TAU;
        let phi = (2.0 * u_polar - 1.0).clamp(-1.0, 1.0).acos();
        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }

    pub fn sample_exploded<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let radius = sample_range(rng, (self.min_radius, self.max_radius));
        Self::point_at(radius, rng.gen(), rng.gen())
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        check_range("shell radius", (self.min_radius, self.max_radius))?;
        check_range("shell min radius", (0.0, self.min_radius))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
