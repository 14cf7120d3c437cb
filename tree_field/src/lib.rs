//! # tree_field
//!
//! Procedural particle field for the gesture tree scene.  Every entity owns
//! two fixed resting positions:
//!
//! * **formed**: on a spiral cone, biased toward the base, so the cloud
//!   reads as a tree;
//! * **exploded**: on a thick spherical shell, evenly spread in solid angle.
//!
//! Each frame the current [`AnimationState`] blends the two, layers a
//! time-based perturbation on top and spins the whole field about the
//! vertical axis.
//!
//! ## Layers
//!
//! | Layer | Module | Generated | Per frame |
//! |---|---|---|---|
//! | Spheres / cubes | [`field`] | once, random | blend → perturb → spin → tumble |
//! | Photo ornaments | [`ornament`] | once, random | same pipeline, larger bob |
//! | Garland | [`garland`] | closed form | swell / breathe → spin |
//! | Star, backdrop | [`scenery`] | closed form / random | bob + yaw / slow drift |
//!
//! All randomness flows through a caller-supplied [`rand::Rng`], so tests
//! can seed it and assert distribution shapes.

pub mod distribution;
pub mod field;
pub mod garland;
pub mod motion;
pub mod ornament;
pub mod palette;
pub mod scenery;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use distribution::{ShellShape, TreeShape};
pub use field::{EntityKind, Field, FieldConfig, FieldEntity, FieldLayer};
pub use garland::{Garland, GarlandShape};
pub use motion::{blend, perturb, phase, spin, tumble, world_position, wrap_angle, EXPANSION_ACTIVE_THRESHOLD};
pub use ornament::{corner_radius, facing, mask_contains, OrnamentPlacement, OrnamentPose, OrnamentShape, FACING_SWITCH};
pub use palette::{rgb, Category, Palette, Swatch};
pub use scenery::{Backdrop, BackdropPoint, BackdropShape, Star};

// ════════════════════════════════════════════════════════════════════════════
// AnimationState
// ════════════════════════════════════════════════════════════════════════════

/// The two continuous scene parameters every layer reads each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    /// 0 = fully formed tree, 1 = fully exploded cloud.
    pub expansion: f32,
    /// Field yaw in radians; grows without bound, so it is kept in `f64`
    /// and reduced with [`wrap_angle`] where it is applied.
    pub rotation:  f64,
}

impl AnimationState {
    pub fn new(expansion: f32, rotation: f64) -> Self {
        AnimationState { expansion, rotation }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// InstanceTransform: render-ready output for one entity
// ════════════════════════════════════════════════════════════════════════════

/// World transform plus the visual attributes the renderer needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale:    f32,
    pub color:    Vec3,
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Invalid field configuration, caught before anything is generated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("palette has no swatches")]
    EmptyPalette,

    #[error("swatch {index} has no colors")]
    EmptySwatch { index: usize },

    #[error("swatch {index} has invalid weight {weight}")]
    BadWeight { index: usize, weight: f32 },

    #[error("invalid range {name}: {min} .. {max}")]
    BadRange { name: &'static str, min: f32, max: f32 },
}

/// Validate a `[min, max)` range used for uniform sampling.
pub(crate) fn check_range(name: &'static str, (min, max): (f32, f32)) -> Result<(), FieldError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(FieldError::BadRange { name, min, max })
    }
}

/// Uniform sample in `[min, max)`; collapses to `min` for an empty range.
pub(crate) fn sample_range<R: rand::Rng + ?Sized>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}
