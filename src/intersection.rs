//! The hit record produced by ray/primitive tests.

use glam::Vec3;

use crate::geometry::Direction;
use crate::material::Material;

/// Result of a successful ray/primitive intersection. Carries everything the
/// shading and next-event-estimation code needs without having to re-query
/// the primitive: position, shading normal, distance along the ray, and the
/// hit material.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    pub t: f32,
    pub position: Vec3,
    pub normal: Direction,
    pub material: Material,
}

impl Intersection {
    pub fn new(t: f32, position: Vec3, normal: Direction, material: Material) -> Self {
        Intersection { t, position, normal, material }
    }
}

/// The nearer of two optional intersections, by ray parameter `t`.
pub fn closer(a: Option<Intersection>, b: Option<Intersection>) -> Option<Intersection> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.t <= b.t { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
