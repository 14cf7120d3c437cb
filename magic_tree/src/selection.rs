//! Pointer selection over the photo ornaments.
//!
//! The pointer hand's position is used directly as NDC, cast through the
//! camera, and hit-tested against every ornament card.  Grabbing is
//! edge-triggered on the pinch:
//!
//! ```text
//!          press edge & (hit | fallback)
//!   Idle ────────────────────────────────► Holding
//!    ▲  ╰─ hover update (self-loop)           │
//!    ╰────────────── release edge ────────────╯
//! ```
//!
//! A press with no hit grabs a random catalog entry only when the tree is
//! mostly exploded (`expansion > 0.5`).

use glam::{Quat, Vec2, Vec3};
use hand_gesture::HandObservation;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tree_field::{mask_contains, AnimationState, OrnamentPlacement, OrnamentPose, OrnamentShape, TreeShape};

use crate::camera::{Camera, Ray};

/// Card thickness used for the slab test; thin enough to read as a plane.
const CARD_THICKNESS: f32 = 1e-3;

// ════════════════════════════════════════════════════════════════════════════
// Ray tests
// ════════════════════════════════════════════════════════════════════════════

/// Slab-method ray vs axis-aligned box.  Returns the entry `t`, or the exit
/// `t` when the origin is inside.
pub fn ray_aabb_hit_t(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if dir.x != 0.0 { 1.0 / dir.x } else { f32::INFINITY },
        if dir.y != 0.0 { 1.0 / dir.y } else { f32::INFINITY },
        if dir.z != 0.0 { 1.0 / dir.z } else { f32::INFINITY },
    );

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        let (o, lo, hi, i) = (origin[axis], min[axis], max[axis], inv[axis]);
        if i.is_infinite() {
            // Parallel to this slab: either always inside it or never.
            if o < lo || o > hi { return None; }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) * i, (hi - o) * i);
        if t0 > t1 { std::mem::swap(&mut t0, &mut t1); }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax { return None; }
    }

    if tmax < 0.0 { return None; }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Ray vs oriented box, via the box's inverse rotation.
pub fn ray_hits_obb(ray: &Ray, center: Vec3, rotation: Quat, half_extents: Vec3) -> Option<f32> {
    let inv = rotation.inverse();
    let o_local = inv * (ray.origin - center);
    let d_local = inv * ray.dir;
    ray_aabb_hit_t(o_local, d_local, -half_extents, half_extents)
}

/// Ray vs one ornament card, rejecting hits on its transparent corners.
pub fn ray_hits_card(ray: &Ray, pose: &OrnamentPose) -> Option<f32> {
    let half = Vec3::new(pose.size * 0.5, pose.size * 0.5, CARD_THICKNESS * 0.5);
    let t = ray_hits_obb(ray, pose.position, pose.rotation, half)?;
    if t <= 0.0 {
        return None;
    }
    let local = pose.rotation.inverse() * (ray.at(t) - pose.position);
    let uv = Vec2::new(local.x, local.y) / pose.size;
    mask_contains(uv, pose.corner_radius).then_some(t)
}

// ════════════════════════════════════════════════════════════════════════════
// SelectableObject / SelectableRegistry
// ════════════════════════════════════════════════════════════════════════════

/// Whether the resource behind an ornament could be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    Ready,
    /// Rendered as a placeholder; still selectable.
    Missing,
}

/// One grabbable ornament.  `formed`/`exploded` are fixed; `pose` is
/// recomputed every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectableObject {
    pub id:         String,
    pub placement:  OrnamentPlacement,
    pub pose:       OrnamentPose,
    pub is_hovered: bool,
    pub resource:   ResourceStatus,
}

impl SelectableObject {
    pub fn new(id: impl Into<String>, placement: OrnamentPlacement) -> Self {
        SelectableObject {
            id: id.into(),
            placement,
            pose: OrnamentPose {
                position:      placement.formed,
                rotation:      Quat::IDENTITY,
                size:          0.0,
                corner_radius: 0.0,
            },
            is_hovered: false,
            resource:   ResourceStatus::Ready,
        }
    }
}

/// The explicit set of selectable objects, kept in step with the field.
#[derive(Clone, Debug)]
pub struct SelectableRegistry {
    shape:   OrnamentShape,
    objects: Vec<SelectableObject>,
}

impl SelectableRegistry {
    pub fn new(shape: OrnamentShape) -> Self {
        SelectableRegistry { shape, objects: Vec::new() }
    }

    /// One ornament per unique id, in catalog order.
    pub fn from_catalog<R: Rng + ?Sized>(
        catalog: &[String],
        shape:   OrnamentShape,
        tree:    &TreeShape,
        rng:     &mut R,
    ) -> Self {
        let mut unique: Vec<&String> = Vec::with_capacity(catalog.len());
        for id in catalog {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        let placements = shape.layout(unique.len(), tree, rng);
        let mut registry = SelectableRegistry::new(shape);
        for (id, placement) in unique.into_iter().zip(placements) {
            registry.insert(SelectableObject::new(id.clone(), placement));
        }
        debug!(ornaments = registry.len(), "selectable registry built");
        registry
    }

    /// Add an object, replacing any existing one with the same id.
    pub fn insert(&mut self, object: SelectableObject) {
        match self.objects.iter_mut().find(|o| o.id == object.id) {
            Some(slot) => *slot = object,
            None => self.objects.push(object),
        }
    }

    pub fn objects(&self) -> &[SelectableObject] {
        &self.objects
    }

    pub fn get(&self, id: &str) -> Option<&SelectableObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Recompute every pose for this frame.
    pub fn update(&mut self, state: &AnimationState, time: f64) {
        for o in &mut self.objects {
            o.pose = self.shape.pose(&o.placement, state, time, o.is_hovered);
        }
    }

    /// Move the hover flag (and hover scale) to `id`, clearing all others.
    pub fn set_hovered(&mut self, id: Option<&str>) {
        for o in &mut self.objects {
            o.is_hovered = Some(o.id.as_str()) == id;
            o.pose.size = if o.is_hovered { self.shape.size * self.shape.hover_scale } else { self.shape.size };
        }
    }

    /// Flag `id` for placeholder rendering.  Returns `true` the first time.
    pub fn mark_resource_missing(&mut self, id: &str) -> bool {
        let Some(o) = self.objects.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        if o.resource == ResourceStatus::Missing {
            return false;
        }
        o.resource = ResourceStatus::Missing;
        warn!(id, "resource missing, showing placeholder");
        true
    }

    /// Nearest card along `ray`, with its distance.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<(&SelectableObject, f32)> {
        let mut best: Option<(&SelectableObject, f32)> = None;
        for o in &self.objects {
            if let Some(t) = ray_hits_card(ray, &o.pose) {
                if best.map_or(true, |(_, bt)| t < bt) {
                    best = Some((o, t));
                }
            }
        }
        best
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SelectionState / SelectionEngine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub held:         Option<String>,
    pub hovered:      Option<String>,
    pub was_pinching: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// A resource was grabbed on a press edge.  `fallback` is set when no
    /// card was hit and a random catalog entry was chosen instead.
    Grabbed { id: String, fallback: bool },
    Released { id: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Expansion above which an empty press grabs a random resource.
    pub fallback_expansion: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig { fallback_expansion: 0.5 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectionEngine {
    config: SelectionConfig,
    state:  SelectionState,
}

impl SelectionEngine {
    pub fn new(config: SelectionConfig) -> Self {
        SelectionEngine { config, state: SelectionState::default() }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn held(&self) -> Option<&str> {
        self.state.held.as_deref()
    }

    /// Process one frame of the pointer hand.  `registry` must already hold
    /// this frame's poses; its hover flags are updated here.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        pointer:   &HandObservation,
        expansion: f32,
        camera:    &Camera,
        registry:  &mut SelectableRegistry,
        rng:       &mut R,
    ) -> Vec<SelectionEvent> {
        let mut events = Vec::new();
        let pinching = pointer.detected && pointer.is_pinching;
        let ray = camera.ray_through(pointer.position);

        // ── press edge ───────────────────────────────────────────────────
        if pinching && !self.state.was_pinching && self.state.held.is_none() {
            let hit = registry.nearest_hit(&ray).map(|(o, _)| o.id.clone());
            let grabbed = match hit {
                Some(id) => Some((id, false)),
                None if expansion > self.config.fallback_expansion && !registry.is_empty() => {
                    let idx = rng.gen_range(0..registry.len());
                    Some((registry.objects()[idx].id.clone(), true))
                }
                None => None,
            };
            if let Some((id, fallback)) = grabbed {
                info!(%id, fallback, "grabbed");
                self.state.held = Some(id.clone());
                events.push(SelectionEvent::Grabbed { id, fallback });
            }
        }

        // ── release edge ─────────────────────────────────────────────────
        if !pinching {
            if let Some(id) = self.state.held.take() {
                info!(%id, "released");
                events.push(SelectionEvent::Released { id });
            }
        }

        // ── hover ────────────────────────────────────────────────────────
        self.state.hovered = if self.state.held.is_none() && pointer.detected && !pinching {
            registry.nearest_hit(&ray).map(|(o, _)| o.id.clone())
        } else {
            None
        };
        registry.set_hovered(self.state.hovered.as_deref());

        self.state.was_pinching = pinching;
        events
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card_at(id: &str, at: Vec3) -> SelectableObject {
        SelectableObject::new(id, OrnamentPlacement { formed: at, exploded: at, speed: 1.0 })
    }

    /// Registry with cards on the camera axis at z = 0 and z = 2.
    fn registry() -> SelectableRegistry {
        let mut r = SelectableRegistry::new(OrnamentShape::default());
        r.insert(card_at("far", Vec3::new(0.0, 0.0, 0.0)));
        r.insert(card_at("near", Vec3::new(0.0, 0.0, 2.0)));
        r.update(&AnimationState::default(), 0.0);
        r
    }

    fn pointer(pinching: bool) -> HandObservation {
        HandObservation { detected: true, is_open: false, is_pinching: pinching, position: Vec2::ZERO }
    }

    fn off_target(pinching: bool) -> HandObservation {
        HandObservation { position: Vec2::new(0.9, 0.9), ..pointer(pinching) }
    }

    #[test]
    fn slab_hits_box_in_front() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(t, Some(4.0));
        let miss = ray_aabb_hit_t(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(miss, None);
        let behind = ray_aabb_hit_t(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(behind, None);
    }

    #[test]
    fn obb_respects_rotation() {
        let ray = Ray { origin: Vec3::new(1.5, 0.0, 10.0), dir: Vec3::NEG_Z };
        let half = Vec3::new(2.0, 0.5, 0.5);
        assert!(ray_hits_obb(&ray, Vec3::ZERO, Quat::IDENTITY, half).is_some());
        let turned = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert!(ray_hits_obb(&ray, Vec3::ZERO, turned, half).is_none());
    }

    #[test]
    fn nearest_card_wins() {
        let r = registry();
        let ray = Camera::default().ray_through(Vec2::ZERO);
        let (o, t) = r.nearest_hit(&ray).unwrap();
        assert_eq!(o.id, "near");
        assert!((t - 22.0).abs() < 0.01);
    }

    #[test]
    fn transparent_corner_is_not_hit() {
        let mut r = SelectableRegistry::new(OrnamentShape::default());
        r.insert(card_at("disc", Vec3::ZERO));
        r.update(&AnimationState::default(), 0.0);
        let pose = r.objects()[0].pose;
        let corner = pose.card_to_world(Vec2::new(0.45, 0.45));
        let cam = Camera::default();
        let ray = Ray { origin: cam.position, dir: (corner - cam.position).normalize() };
        assert!(r.nearest_hit(&ray).is_none());
        let centre = Ray { origin: cam.position, dir: (pose.position - cam.position).normalize() };
        assert!(r.nearest_hit(&centre).is_some());
    }

    #[test]
    fn press_and_release_fire_once() {
        let mut r = registry();
        let mut sel = SelectionEngine::default();
        let cam = Camera::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut log = Vec::new();
        for pinch in [false, true, true, false] {
            log.extend(sel.update(&pointer(pinch), 0.0, &cam, &mut r, &mut rng));
        }
        assert_eq!(log, vec![
            SelectionEvent::Grabbed { id: "near".into(), fallback: false },
            SelectionEvent::Released { id: "near".into() },
        ]);
        assert_eq!(sel.held(), None);
    }

    #[test]
    fn losing_the_hit_does_not_release() {
        let mut r = registry();
        let mut sel = SelectionEngine::default();
        let cam = Camera::default();
        let mut rng = StdRng::seed_from_u64(0);
        sel.update(&pointer(true), 0.0, &cam, &mut r, &mut rng);
        let events = sel.update(&off_target(true), 0.0, &cam, &mut r, &mut rng);
        assert!(events.is_empty());
        assert_eq!(sel.held(), Some("near"));
    }

    #[test]
    fn empty_press_falls_back_only_when_exploded() {
        let cam = Camera::default();
        let mut rng = StdRng::seed_from_u64(1);

        let mut r = registry();
        let mut sel = SelectionEngine::default();
        for e in [0.0, 0.3, 0.5] {
            sel.update(&off_target(false), e, &cam, &mut r, &mut rng);
            assert!(sel.update(&off_target(true), e, &cam, &mut r, &mut rng).is_empty());
            assert_eq!(sel.held(), None);
        }

        sel.update(&off_target(false), 0.8, &cam, &mut r, &mut rng);
        let events = sel.update(&off_target(true), 0.8, &cam, &mut r, &mut rng);
        assert!(matches!(events.as_slice(), [SelectionEvent::Grabbed { fallback: true, .. }]));
        assert!(sel.held().is_some());
    }

    #[test]
    fn fallback_with_empty_catalog_is_a_no_op() {
        let mut r = SelectableRegistry::new(OrnamentShape::default());
        let mut sel = SelectionEngine::default();
        let mut rng = StdRng::seed_from_u64(2);
        let events = sel.update(&pointer(true), 1.0, &Camera::default(), &mut r, &mut rng);
        assert!(events.is_empty());
    }

    #[test]
    fn hover_tracks_pointer_while_idle() {
        let mut r = registry();
        let mut sel = SelectionEngine::default();
        let cam = Camera::default();
        let mut rng = StdRng::seed_from_u64(3);

        sel.update(&pointer(false), 0.0, &cam, &mut r, &mut rng);
        assert_eq!(sel.state().hovered.as_deref(), Some("near"));
        assert!(r.get("near").unwrap().is_hovered);
        assert!((r.get("near").unwrap().pose.size - 0.77).abs() < 1e-6);

        sel.update(&off_target(false), 0.0, &cam, &mut r, &mut rng);
        assert_eq!(sel.state().hovered, None);
        assert!(r.objects().iter().all(|o| !o.is_hovered));

        // Pinching or holding suppresses hover.
        sel.update(&pointer(true), 0.0, &cam, &mut r, &mut rng);
        assert_eq!(sel.state().hovered, None);
    }

    #[test]
    fn absent_pointer_releases_and_clears_hover() {
        let mut r = registry();
        let mut sel = SelectionEngine::default();
        let cam = Camera::default();
        let mut rng = StdRng::seed_from_u64(4);
        sel.update(&pointer(true), 0.0, &cam, &mut r, &mut rng);
        let events = sel.update(&HandObservation::ABSENT, 0.0, &cam, &mut r, &mut rng);
        assert_eq!(events, vec![SelectionEvent::Released { id: "near".into() }]);
        assert_eq!(sel.state().hovered, None);
    }

    #[test]
    fn catalog_dedupes_ids() {
        let catalog: Vec<String> = ["a", "b", "a", "c"].iter().map(|s| s.to_string()).collect();
        let r = SelectableRegistry::from_catalog(
            &catalog,
            OrnamentShape::default(),
            &TreeShape::default(),
            &mut StdRng::seed_from_u64(5),
        );
        assert_eq!(r.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_resource_stays_selectable() {
        let mut r = registry();
        assert!(r.mark_resource_missing("near"));
        assert!(!r.mark_resource_missing("near"));
        assert!(!r.mark_resource_missing("nope"));
        assert_eq!(r.get("near").unwrap().resource, ResourceStatus::Missing);
        let ray = Camera::default().ray_through(Vec2::ZERO);
        assert_eq!(r.nearest_hit(&ray).unwrap().0.id, "near");
    }
}
