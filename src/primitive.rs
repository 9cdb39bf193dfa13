//! The `Hittable` trait and the `Primitive` sum type it is implemented for.
//!
//! The source this crate is grounded on dispatches through a virtual base
//! class (`Object`) with a string tag for run-time type identification. A
//! closed, two-variant enum gives the same dispatch with exhaustive
//! matching and no downcasting.

use glam::Vec3;
use rand::Rng;

use crate::bvh::Bvh;
use crate::geometry::{Aabb, Direction, Ray};
use crate::intersection::Intersection;
use crate::material::Material;
use crate::triangle::Triangle;

/// Anything the top-level scene BVH can hold: a single free-standing
/// triangle, or a mesh (many triangles sharing one material and bounded by
/// their own sub-BVH).
pub trait Hittable {
    fn intersect(&self, ray: &Ray) -> Option<Intersection>;
    fn aabb(&self) -> Aabb;
    fn area(&self) -> f32;
    /// Material exposed for emitter bookkeeping; meshes are single-material,
    /// so one value describes the whole primitive.
    fn material(&self) -> Material;
    /// Draws a uniformly-area-weighted point on the primitive's surface,
    /// along with the geometric normal at that point (needed for the
    /// cosine term in next-event estimation).
    fn sample(&self, rng: &mut impl Rng) -> (Vec3, Direction);
}

/// A mesh: many triangles, one material, bounded by its own BVH so a ray
/// that misses the mesh's bounding box never walks its triangle list.
#[derive(Debug, Clone)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bvh: Bvh<Triangle>,
    material: Material,
    aabb: Aabb,
    area: f32,
    /// Cumulative per-triangle area, used for binary-search area-weighted
    /// sampling (see `sample`).
    cumulative_area: Vec<f32>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>, material: Material) -> Self {
        assert!(!triangles.is_empty(), "a mesh must contain at least one triangle");
        let bvh = Bvh::build(triangles.clone());
        let aabb = triangles
            .iter()
            .fold(Aabb::empty(), |acc, t| acc.union_box(&t.aabb()));
        let mut cumulative_area = Vec::with_capacity(triangles.len());
        let mut running = 0.0;
        for t in &triangles {
            running += t.area();
            cumulative_area.push(running);
        }
        let area = running;
        Mesh { triangles, bvh, material, aabb, area, cumulative_area }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
}

impl Hittable for Mesh {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.bvh.intersect(ray)
    }

    fn aabb(&self) -> Aabb {
        self.aabb
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn material(&self) -> Material {
        self.material
    }

    fn sample(&self, rng: &mut impl Rng) -> (Vec3, Direction) {
        let target = rng.gen_range(0.0..self.area);
        let idx = match self.cumulative_area.partition_point(|&a| a < target) {
            i if i < self.triangles.len() => i,
            _ => self.triangles.len() - 1,
        };
        let tri = &self.triangles[idx];
        (tri.sample(rng), tri.normal())
    }
}

impl Hittable for Triangle {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        Triangle::intersect(self, ray)
    }

    fn aabb(&self) -> Aabb {
        Triangle::aabb(self)
    }

    fn area(&self) -> f32 {
        Triangle::area(self)
    }

    fn material(&self) -> Material {
        self.material
    }

    fn sample(&self, rng: &mut impl Rng) -> (Vec3, Direction) {
        (Triangle::sample(self, rng), self.normal())
    }
}

/// A scene object: either a lone triangle or a mesh. Boxing keeps the enum
/// small and lets the scene's top-level BVH hold a `Vec<Primitive>` without
/// the size of `Mesh` (which owns a triangle list) dominating every variant.
#[derive(Debug, Clone)]
pub enum Primitive {
    Triangle(Triangle),
    Mesh(Box<Mesh>),
}

impl Hittable for Primitive {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        match self {
            Primitive::Triangle(t) => t.intersect(ray),
            Primitive::Mesh(m) => m.intersect(ray),
        }
    }

    fn aabb(&self) -> Aabb {
        match self {
            Primitive::Triangle(t) => t.aabb(),
            Primitive::Mesh(m) => m.aabb(),
        }
    }

    fn area(&self) -> f32 {
        match self {
            Primitive::Triangle(t) => t.area(),
            Primitive::Mesh(m) => m.area(),
        }
    }

    fn material(&self) -> Material {
        match self {
            Primitive::Triangle(t) => t.material(),
            Primitive::Mesh(m) => m.material(),
        }
    }

    fn sample(&self, rng: &mut impl Rng) -> (Vec3, Direction) {
        match self {
            Primitive::Triangle(t) => t.sample(rng),
            Primitive::Mesh(m) => m.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3 as V;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn tri(v0: V, v1: V, v2: V) -> Triangle {
        Triangle::new(v0, v1, v2, Material::Diffuse { albedo: V::splat(0.5) })
    }

    #[test]
    fn mesh_aabb_covers_all_triangles() {
        let triangles = vec![
            tri(V::new(0.0, 0.0, 0.0), V::new(1.0, 0.0, 0.0), V::new(0.0, 1.0, 0.0)),
            tri(V::new(5.0, 5.0, 5.0), V::new(6.0, 5.0, 5.0), V::new(5.0, 6.0, 5.0)),
        ];
        let mesh = Mesh::new(triangles, Material::Diffuse { albedo: V::splat(0.5) });
        let bounds = mesh.aabb();
        assert!(bounds.contains(V::new(0.0, 0.0, 0.0)));
        assert!(bounds.contains(V::new(6.0, 5.0, 5.0)));
    }

    #[test]
    fn mesh_sample_always_lands_within_bounds() {
        let triangles = vec![
            tri(V::new(0.0, 0.0, 0.0), V::new(1.0, 0.0, 0.0), V::new(0.0, 1.0, 0.0)),
            tri(V::new(5.0, 5.0, 5.0), V::new(6.0, 5.0, 5.0), V::new(5.0, 6.0, 5.0)),
        ];
        let mesh = Mesh::new(triangles, Material::Diffuse { albedo: V::splat(0.5) });
        let mut rng = SmallRng::seed_from_u64(3);
        let bounds = mesh.aabb();
        for _ in 0..64 {
            let (p, _normal) = mesh.sample(&mut rng);
            assert!(bounds.contains(p));
        }
    }
}
