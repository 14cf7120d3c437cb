//! The instanced particle field: spheres (foliage + accents) and cubes
//! (box ornaments).

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distribution::{ShellShape, TreeShape};
use crate::garland::GarlandShape;
use crate::motion::{tumble, world_position};
use crate::ornament::OrnamentShape;
use crate::palette::{Category, Palette};
use crate::scenery::BackdropShape;
use crate::{check_range, sample_range, AnimationState, FieldError, InstanceTransform};

// ════════════════════════════════════════════════════════════════════════════
// FieldEntity
// ════════════════════════════════════════════════════════════════════════════

/// Instance geometry, so the renderer can batch by mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Sphere,
    Cube,
}

/// One particle.  Everything here is fixed at generation time; only the
/// blend of `formed` and `exploded` changes per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldEntity {
    pub kind:        EntityKind,
    pub category:    Category,
    pub formed:      Vec3,
    pub exploded:    Vec3,
    pub color:       Vec3,
    pub scale:       f32,
    pub random_axis: Vec3,
    pub speed:       f32,
}

// ════════════════════════════════════════════════════════════════════════════
// FieldConfig
// ════════════════════════════════════════════════════════════════════════════

/// One instanced layer: how many of which mesh, colored from which palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldLayer {
    pub kind:    EntityKind,
    pub count:   usize,
    pub palette: Palette,
}

/// Everything needed to generate the scene's procedural layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub tree:          TreeShape,
    pub shell:         ShellShape,
    pub layers:        Vec<FieldLayer>,
    /// Uniform `[min, max)` range for per-entity drift speed.
    pub speed:         (f32, f32),
    /// Vertical bob amplitude while formed.
    pub bob_amplitude: f32,
    /// Tumble radians per (second × speed × expansion).
    pub tumble_rate:   f32,
    pub ornaments:     OrnamentShape,
    pub garland:       GarlandShape,
    pub backdrop:      BackdropShape,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            tree:          TreeShape::default(),
            shell:         ShellShape::default(),
            layers: vec![
                FieldLayer { kind: EntityKind::Sphere, count: 2500, palette: Palette::spheres() },
                FieldLayer { kind: EntityKind::Cube,   count: 400,  palette: Palette::cubes()   },
            ],
            speed:         (0.5, 1.5),
            bob_amplitude: 0.02,
            tumble_rate:   5.0,
            ornaments:     OrnamentShape::default(),
            garland:       GarlandShape::default(),
            backdrop:      BackdropShape::default(),
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), FieldError> {
        self.tree.validate()?;
        self.shell.validate()?;
        for layer in &self.layers {
            layer.palette.validate()?;
        }
        check_range("entity speed", self.speed)?;
        self.ornaments.validate()?;
        Ok(())
    }

    /// Total entity count across layers.
    pub fn entity_count(&self) -> usize {
        self.layers.iter().map(|l| l.count).sum()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Field
// ════════════════════════════════════════════════════════════════════════════

/// The generated, immutable entity set plus the motion constants it needs.
#[derive(Clone, Debug)]
pub struct Field {
    entities:      Vec<FieldEntity>,
    bob_amplitude: f32,
    tumble_rate:   f32,
}

impl Field {
    /// Generate every layer once.  The RNG is only used here.
    pub fn generate<R: Rng + ?Sized>(config: &FieldConfig, rng: &mut R) -> Result<Self, FieldError> {
        config.validate()?;

        let mut entities = Vec::with_capacity(config.entity_count());
        for layer in &config.layers {
            for _ in 0..layer.count {
                entities.push(generate_entity(config, layer, rng));
            }
        }
        debug!(entities = entities.len(), layers = config.layers.len(), "field generated");

        Ok(Field {
            entities,
            bob_amplitude: config.bob_amplitude,
            tumble_rate:   config.tumble_rate,
        })
    }

    pub fn entities(&self) -> &[FieldEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Render transform for one entity at the given state and time.
    pub fn instance(&self, e: &FieldEntity, state: &AnimationState, time: f64) -> InstanceTransform {
        InstanceTransform {
            position: world_position(e.formed, e.exploded, state, time, e.speed, self.bob_amplitude),
            rotation: tumble(e.random_axis, e.speed, state.expansion, time, self.tumble_rate),
            scale:    e.scale,
            color:    e.color,
        }
    }

    /// Refill `out` with this frame's transforms, in entity order.
    pub fn transforms_into(&self, state: &AnimationState, time: f64, out: &mut Vec<InstanceTransform>) {
        out.clear();
        out.extend(self.entities.iter().map(|e| self.instance(e, state, time)));
    }
}

fn generate_entity<R: Rng + ?Sized>(config: &FieldConfig, layer: &FieldLayer, rng: &mut R) -> FieldEntity {
    let formed = config.tree.sample_formed(rng);
    let exploded = config.shell.sample_exploded(rng);
    let random_axis = Vec3::new(
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
    );
    let pick = layer.palette.sample(rng);
    let speed = sample_range(rng, config.speed);

    FieldEntity {
        kind: layer.kind,
        category: pick.category,
        formed,
        exploded,
        color: pick.color,
        scale: pick.scale,
        random_axis,
        speed,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
