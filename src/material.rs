//! Surface materials: a diffuse-or-emissive sum type, the Lambertian BRDF,
//! and uniform hemisphere sampling in the shading frame.

use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;

use crate::geometry::Direction;

/// RGB value in linear space.
pub type Spectrum = Vec3;

/// A surface is either a Lambertian reflector or a one-sided light emitter.
/// Both this rewrite and the source it is grounded on model materials as a
/// two-variant sum type rather than a polymorphic base class, since there
/// are exactly two behaviors and no plans to add a third.
#[derive(Debug, Clone, Copy)]
pub enum Material {
    Diffuse { albedo: Spectrum },
    Emissive { radiance: Spectrum },
}

impl Material {
    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::Emissive { .. })
    }

    pub fn emission(&self) -> Spectrum {
        match self {
            Material::Emissive { radiance } => *radiance,
            Material::Diffuse { .. } => Spectrum::ZERO,
        }
    }

    /// Lambertian BRDF: `albedo / pi` when both directions are above the
    /// shading hemisphere, zero otherwise. Emissive surfaces never scatter.
    pub fn brdf(&self, wi: Direction, wo: Direction, normal: Direction) -> Spectrum {
        match self {
            Material::Emissive { .. } => Spectrum::ZERO,
            Material::Diffuse { albedo } => {
                let above_i = normal.get().dot(wi.get()) > 0.0;
                let above_o = normal.get().dot(wo.get()) > 0.0;
                if above_i && above_o {
                    *albedo / PI
                } else {
                    Spectrum::ZERO
                }
            }
        }
    }

    /// Draws a direction uniformly over the hemisphere above `normal`.
    /// Returns `(pdf, direction)`; `pdf` is the constant `1 / (2*pi)`.
    pub fn sample_hemisphere(normal: Direction, rng: &mut impl Rng) -> (f32, Direction) {
        let z: f32 = rng.gen_range(0.0..1.0);
        let phi: f32 = rng.gen_range(0.0..1.0) * 2.0 * PI;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let local = Vec3::new(r * phi.cos(), r * phi.sin(), z);
        (1.0 / (2.0 * PI), local_to_world(normal, local))
    }
}

/// Builds an orthonormal frame around `normal` and transforms `local`
/// (expressed with `z` along `normal`) into world space.
pub fn local_to_world(normal: Direction, local: Vec3) -> Direction {
    let n = normal.get();
    let c = if n.x.abs() > n.y.abs() {
        Vec3::new(n.z, 0.0, -n.x).normalize()
    } else {
        Vec3::new(0.0, n.z, -n.y).normalize()
    };
    let b = c.cross(n);
    Direction::new(local.x * b + local.y * c + local.z * n)
}
