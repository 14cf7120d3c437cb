//! Fixed perspective camera on the +Z axis looking toward the origin.
//!
//! The pointer arrives already in normalized device coordinates, so picking
//! only needs [`Camera::ray_through`]; the preview window uses
//! [`Camera::project`] for the opposite direction.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position:   Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg:  f32,
    /// Width / height.
    pub aspect:     f32,
    pub near:       f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position:  Vec3::new(0.0, 0.0, 24.0),
            fov_y_deg: 40.0,
            aspect:    16.0 / 9.0,
            near:      0.1,
        }
    }
}

/// Half-line from `origin` along unit `dir`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir:    Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// A world point as seen by the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub ndc:   Vec2,
    /// Distance in front of the camera along its view axis.
    pub depth: f32,
}

impl Camera {
    fn half_extent(&self) -> Vec2 {
        let ty = (self.fov_y_deg.to_radians() * 0.5).tan();
        Vec2::new(ty * self.aspect, ty)
    }

    /// Ray through an NDC point; `(0, 0)` is the view centre, `y` up.
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let h = self.half_extent();
        let dir = Vec3::new(ndc.x * h.x, ndc.y * h.y, -1.0).normalize();
        Ray { origin: self.position, dir }
    }

    /// NDC position and depth of `world`, or `None` when it is behind the
    /// near plane.
    pub fn project(&self, world: Vec3) -> Option<Projected> {
        let v = world - self.position;
        let depth = -v.z;
        if depth < self.near {
            return None;
        }
        let h = self.half_extent();
        Some(Projected {
            ndc: Vec2::new(v.x / (depth * h.x), v.y / (depth * h.y)),
            depth,
        })
    }

    /// World-space length that spans one NDC unit vertically at `depth`.
    pub fn world_per_ndc(&self, depth: f32) -> f32 {
        depth * self.half_extent().y
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_ray_looks_down_negative_z() {
        let cam = Camera::default();
        let ray = cam.ray_through(Vec2::ZERO);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 24.0));
        assert_eq!(ray.dir, Vec3::NEG_Z);
        assert_eq!(ray.at(24.0), Vec3::ZERO);
    }

    #[test]
    fn top_edge_ray_matches_fov() {
        let cam = Camera::default();
        let ray = cam.ray_through(Vec2::new(0.0, 1.0));
        let angle = ray.dir.angle_between(Vec3::NEG_Z).to_degrees();
        assert!((angle - 20.0).abs() < 1e-3);
    }

    #[test]
    fn project_inverts_ray() {
        let cam = Camera::default();
        for ndc in [Vec2::new(0.3, -0.4), Vec2::new(-0.9, 0.9), Vec2::ZERO] {
            let world = cam.ray_through(ndc).at(20.0);
            let p = cam.project(world).unwrap();
            assert!(p.ndc.distance(ndc) < 1e-4);
        }
    }

    #[test]
    fn behind_camera_is_not_projected() {
        let cam = Camera::default();
        assert!(cam.project(Vec3::new(0.0, 0.0, 30.0)).is_none());
        assert!(cam.project(Vec3::new(0.0, 0.0, 23.95)).is_none());
    }
}
