//! The scene: a flat list of objects bounded by a top-level BVH, a camera,
//! and an emitter index for next-event estimation.

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::bvh::Bvh;
use crate::geometry::{Direction, Ray};
use crate::intersection::Intersection;
use crate::primitive::{Hittable, Primitive};

/// Pinhole camera: position, orientation, and a view plane one unit in
/// front of the eye. `view_width` is derived from `view_height` and the
/// image aspect ratio so non-square renders don't squash the frustum -
/// see the deviation recorded for the source's aspect-ratio handling.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Direction,
    pub up: Direction,
    pub right: Direction,
    pub view_height: f32,
    pub view_width: f32,
}

impl Camera {
    pub fn new(position: Vec3, look_at: Vec3, world_up: Vec3, vfov_degrees: f32, aspect_ratio: f32) -> Self {
        let forward = Direction::new(look_at - position);
        assert!(
            forward.get().y.abs() < 0.9,
            "camera look direction is too close to vertical ({}); forward x world_up would degenerate",
            forward.get().y
        );
        let right = Direction::new(forward.get().cross(world_up));
        let up = Direction::new(right.get().cross(forward.get()));
        let view_height = 2.0 * (vfov_degrees.to_radians() * 0.5).tan();
        let view_width = view_height * aspect_ratio;
        Camera { position, forward, up, right, view_height, view_width }
    }

    /// Builds the world-space camera-to-world transform used by asset and
    /// test code that needs the full basis rather than individual rays.
    pub fn to_world(&self) -> Mat4 {
        Mat4::from_cols(
            self.right.get().extend(0.0),
            self.up.get().extend(0.0),
            self.forward.get().extend(0.0),
            self.position.extend(1.0),
        )
    }

    /// Generates the camera ray through normalized screen coordinates
    /// `u, v` in `[0, 1) x [0, 1)`, with `(0, 0)` at the top-left.
    pub fn ray_through(&self, u: f32, v: f32) -> Ray {
        let screen_x = (u - 0.5) * self.view_width;
        let screen_y = (0.5 - v) * self.view_height;
        let dir = self.forward.get() + screen_x * self.right.get() + screen_y * self.up.get();
        Ray::new(self.position, Direction::new(dir))
    }
}

/// The index of a single emitter (a primitive whose material is
/// `Material::Emissive`), kept alongside the object list so light sampling
/// doesn't have to rescan every primitive's material on every NEE draw.
struct Emitter {
    primitive: Primitive,
}

/// A fully built scene: objects, their top-level BVH, and a cumulative-area
/// emitter table searched by binary search.
pub struct Scene {
    objects: Vec<Primitive>,
    bvh: Option<Bvh<Primitive>>,
    emitters: Vec<Emitter>,
    cumulative_emitter_area: Vec<f32>,
    total_emitter_area: f32,
    pub camera: Camera,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Scene {
            objects: Vec::new(),
            bvh: None,
            emitters: Vec::new(),
            cumulative_emitter_area: Vec::new(),
            total_emitter_area: 0.0,
            camera,
        }
    }

    /// Adds an object to the scene. Must be followed by `build` before
    /// `intersect`/`sample_light` are used.
    pub fn add_obj(&mut self, object: Primitive) {
        self.objects.push(object);
    }

    /// Builds the top-level BVH and the emitter index. Idempotent; call
    /// again after adding more objects to rebuild from scratch.
    pub fn build(&mut self) {
        self.emitters.clear();
        self.cumulative_emitter_area.clear();
        self.total_emitter_area = 0.0;
        for obj in &self.objects {
            if obj.material().is_emissive() {
                self.total_emitter_area += obj.area();
                self.cumulative_emitter_area.push(self.total_emitter_area);
                self.emitters.push(Emitter { primitive: obj.clone() });
            }
        }
        self.bvh = Some(Bvh::build(std::mem::take(&mut self.objects)));
        // The BVH now owns every primitive; `objects` stays empty until the
        // caller rebuilds from a fresh set via `add_obj`. Emitters keep
        // their own clone so light sampling doesn't need to index back in.
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.bvh.as_ref().and_then(|bvh| bvh.intersect(ray))
    }

    pub fn has_emitters(&self) -> bool {
        !self.emitters.is_empty()
    }

    /// Draws a point on a uniformly-area-weighted emitter, returning its
    /// own per-surface pdf (`1 / emitter.area`, not `1 / total_emitter_area`
    /// - each emitter is sampled with its own area measure, so the caller
    /// must divide by that emitter's pdf, not the scene-wide one) alongside
    /// the sampled point's intersection record. Returns `None` if the scene
    /// has no emissive objects.
    pub fn sample_light(&self, rng: &mut impl Rng) -> Option<(f32, Intersection)> {
        if self.emitters.is_empty() {
            return None;
        }
        let target = rng.gen_range(0.0..self.total_emitter_area);
        let slot = self.cumulative_emitter_area.partition_point(|&a| a < target);
        let slot = slot.min(self.emitters.len() - 1);
        let emitter = &self.emitters[slot];
        let (pos, normal) = emitter.primitive.sample(rng);
        let area = emitter.primitive.area();
        let pdf = if area > 0.0 { 1.0 / area } else { 0.0 };
        Some((pdf, Intersection::new(0.0, pos, normal, emitter.primitive.material())))
    }

    pub fn total_emitter_area(&self) -> f32 {
        self.total_emitter_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_ray_through_center_points_forward() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 90.0, 1.0);
        let ray = cam.ray_through(0.5, 0.5);
        let dot = ray.direction().get().dot(cam.forward.get());
        assert!(dot > 0.99);
    }

    #[test]
    fn camera_ray_directions_diverge_across_a_2x2_grid() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 60.0, 1.0);
        let top_left = cam.ray_through(0.0, 0.0).direction().get();
        let bottom_right = cam.ray_through(1.0, 1.0).direction().get();
        assert!(top_left.distance(bottom_right) > 0.1);
    }

    #[test]
    fn wide_aspect_ratio_widens_the_view_plane() {
        let square = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 1.0);
        let wide = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 16.0 / 9.0);
        assert!(wide.view_width > square.view_width);
        assert!((wide.view_height - square.view_height).abs() < 1e-6);
    }
}
