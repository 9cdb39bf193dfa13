//! Triangle primitive: the only leaf geometry the renderer hit-tests
//! directly. Meshes are triangle soups wrapped in their own sub-BVH.

use glam::Vec3;
use rand::Rng;

use crate::epsilon::EPS_MACHINE;
use crate::geometry::{Aabb, Direction, Ray};
use crate::material::Material;
use crate::intersection::Intersection;

/// A single triangle, material attached directly (as in the source this is
/// grounded on, where every triangle in a mesh shares its parent's material).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub material: Material,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Material) -> Self {
        Triangle { v0, v1, v2, material }
    }

    /// Geometric (unnormalized-edge-cross) normal. Winding is assumed
    /// counter-clockwise when viewed from the side the normal points to.
    pub fn normal(&self) -> Direction {
        Direction::new((self.v1 - self.v0).cross(self.v2 - self.v0))
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v1 - self.v0).cross(self.v2 - self.v0).length()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_point(self.v0).union_point(self.v1).union_point(self.v2)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Moller-Trumbore ray/triangle intersection. Returns `None` on a miss,
    /// a parallel ray, a hit behind the origin, or a hit outside the
    /// triangle's barycentric bounds.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let d = ray.direction().get();
        let h = d.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < EPS_MACHINE {
            return None;
        }
        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = f * d.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * edge2.dot(q);
        if t <= EPS_MACHINE {
            return None;
        }
        Some(Intersection::new(t, ray.at(t), self.normal(), self.material))
    }

    /// Uniform-area sample: `p = v0 + sqrt(u1)*(1 - u2)*e1 + sqrt(u1)*u2*e2`,
    /// which maps a unit square to a triangle without distorting density.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        let u1: f32 = rng.gen_range(0.0..1.0);
        let u2: f32 = rng.gen_range(0.0..1.0);
        let su1 = u1.sqrt();
        let b0 = 1.0 - su1;
        let b1 = su1 * (1.0 - u2);
        let b2 = su1 * u2;
        self.v0 * b0 + self.v1 * b1 + self.v2 * b2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Material::Diffuse { albedo: Vec3::splat(0.5) },
        )
    }

    #[test]
    fn intersect_hits_center_and_reports_barycentric_position() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Direction::new(Vec3::new(0.0, 0.0, -1.0)));
        let hit = tri.intersect(&ray).expect("ray through triangle interior must hit");
        assert!((hit.position.x - 0.2).abs() < 1e-5);
        assert!((hit.position.y - 0.2).abs() < 1e-5);
        assert!(hit.position.z.abs() < 1e-5);
    }

    #[test]
    fn intersect_misses_outside_triangle() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(2.0, 2.0, 1.0), Direction::new(Vec3::new(0.0, 0.0, -1.0)));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn intersect_misses_behind_origin() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.2, 0.2, -1.0), Direction::new(Vec3::new(0.0, 0.0, -1.0)));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn area_matches_half_cross_product() {
        let tri = unit_triangle();
        assert!((tri.area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sample_lands_inside_aabb() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;
        let tri = unit_triangle();
        let mut rng = SmallRng::seed_from_u64(7);
        let bounds = tri.aabb();
        for _ in 0..64 {
            let p = tri.sample(&mut rng);
            assert!(bounds.contains(p));
        }
    }
}
