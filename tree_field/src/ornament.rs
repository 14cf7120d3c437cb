//! Photo ornaments: square cards hung on the tree surface that fly out to a
//! wider shell when the tree explodes.
//!
//! Ornaments share the field's motion pipeline (with a stronger bob) but
//! also carry an orientation and a shape mask, both of which the selection
//! hit test needs:
//!
//! | expansion | facing | silhouette |
//! |---|---|---|
//! | `<= 0.1` | normal points radially away from the trunk | disc |
//! | `> 0.1`  | slow tumble, Euler XYZ `(0.5 t, 0, 0.3 t)` | rounded square |

use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distribution::{ShellShape, TreeShape};
use crate::motion::{phase, world_position};
use crate::{check_range, sample_range, AnimationState, FieldError};

/// Expansion above which ornaments stop facing outward and tumble.
pub const FACING_SWITCH: f32 = 0.1;

const TUMBLE_X_RATE: f32 = 0.5;
const TUMBLE_Z_RATE: f32 = 0.3;

/// Corner radius (in card units) when formed and when fully exploded.
const CORNER_FORMED:   f32 = 0.5;
const CORNER_EXPLODED: f32 = 0.05;

/// Half extent of the card in card units.
const HALF_EXTENT: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// OrnamentShape
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrnamentShape {
    /// Normalized height band the ornaments are hung in.
    pub band:          (f32, f32),
    /// Fraction of the padded cone radius; keeps cards near the surface.
    pub inset:         (f32, f32),
    /// Added to the cone radius so cards sit just outside the foliage.
    pub radius_pad:    f32,
    pub shell:         ShellShape,
    pub speed:         (f32, f32),
    pub bob_amplitude: f32,
    /// Card edge length in world units.
    pub size:          f32,
    pub hover_scale:   f32,
}

impl Default for OrnamentShape {
    fn default() -> Self {
        OrnamentShape {
            band:          (0.2, 0.8),
            inset:         (0.8, 1.0),
            radius_pad:    0.5,
            shell:         ShellShape::new(8.0, 13.0),
            speed:         (0.5, 1.5),
            bob_amplitude: 0.1,
            size:          0.7,
            hover_scale:   1.1,
        }
    }
}

impl OrnamentShape {
    pub fn validate(&self) -> Result<(), FieldError> {
        check_range("ornament band", self.band)?;
        check_range("ornament inset", self.inset)?;
        check_range("ornament speed", self.speed)?;
        check_range("ornament size", (0.0, self.size))?;
        self.shell.validate()
    }

    /// Formed position from unit draws: height within the band, inset, azimuth.
    pub fn formed_at(&self, tree: &TreeShape, u_height: f32, u_inset: f32, u_azimuth: f32) -> Vec3 {
        let (lo, hi) = self.band;
        let h = lo + u_height * (hi - lo);
        let (ilo, ihi) = self.inset;
        let r = (tree.radius_at(h) + self.radius_pad) * (ilo + u_inset * (ihi - ilo));
        let theta = u_azimuth * std::f32::consts::TAU;
        Vec3::new(r * theta.cos(), tree.y_at(h), r * theta.sin())
    }

    /// One placement per ornament, in order.
    pub fn layout<R: Rng + ?Sized>(&self, count: usize, tree: &TreeShape, rng: &mut R) -> Vec<OrnamentPlacement> {
        (0..count)
            .map(|_| {
                let formed = self.formed_at(tree, rng.gen(), rng.gen(), rng.gen());
                let exploded = self.shell.sample_exploded(rng);
                let speed = sample_range(rng, self.speed);
                OrnamentPlacement { formed, exploded, speed }
            })
            .collect()
    }

    /// World pose for one placement this frame.
    pub fn pose(&self, p: &OrnamentPlacement, state: &AnimationState, time: f64, hovered: bool) -> OrnamentPose {
        let position = world_position(p.formed, p.exploded, state, time, p.speed, self.bob_amplitude);
        OrnamentPose {
            position,
            rotation:      facing(position, state.expansion, time),
            size:          if hovered { self.size * self.hover_scale } else { self.size },
            corner_radius: corner_radius(state.expansion),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Placement / pose
// ════════════════════════════════════════════════════════════════════════════

/// Fixed per-ornament data, drawn once.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrnamentPlacement {
    pub formed:   Vec3,
    pub exploded: Vec3,
    pub speed:    f32,
}

/// Where a card is, how it is turned, how big it is and how round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrnamentPose {
    pub position:      Vec3,
    pub rotation:      Quat,
    /// Edge length in world units, hover scale included.
    pub size:          f32,
    pub corner_radius: f32,
}

impl OrnamentPose {
    /// Card-space `(u, v)` in `[-0.5, 0.5]²` → world point on the card.
    pub fn card_to_world(&self, uv: Vec2) -> Vec3 {
        self.position + self.rotation * (uv.extend(0.0) * self.size)
    }

    /// World normal of the card's front face.
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Facing and mask
// ════════════════════════════════════════════════════════════════════════════

/// Card orientation.  The card's local +Z is its front normal.
pub fn facing(world_pos: Vec3, expansion: f32, time: f64) -> Quat {
    if expansion > FACING_SWITCH {
        Quat::from_euler(EulerRot::XYZ, phase(time, TUMBLE_X_RATE), 0.0, phase(time, TUMBLE_Z_RATE))
    } else {
        Quat::from_rotation_y(world_pos.x.atan2(world_pos.z))
    }
}

/// Corner radius of the card silhouette at this expansion.
pub fn corner_radius(expansion: f32) -> f32 {
    let e = expansion.clamp(0.0, 1.0);
    CORNER_FORMED + (CORNER_EXPLODED - CORNER_FORMED) * e
}

/// Signed distance from card-space `uv` to a rounded square of half extent
/// 0.5 with corner radius `radius`.  Negative inside.
pub fn rounded_box_sdf(uv: Vec2, radius: f32) -> f32 {
    let q = uv.abs() - Vec2::splat(HALF_EXTENT) + Vec2::splat(radius);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - radius
}

/// Whether card-space `uv` is on the opaque part of the card.
pub fn mask_contains(uv: Vec2, radius: f32) -> bool {
    rounded_box_sdf(uv, radius) <= 0.0
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
