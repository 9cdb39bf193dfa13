//! The recursive radiance estimator: next-event estimation for direct
//! light plus Russian-roulette-terminated indirect bounces. Grounded on the
//! `cast_ray` / `cast_ray_recursive` pair of the renderer this crate is
//! derived from.

use glam::Vec3;
use rand::Rng;

use crate::epsilon::{EPS_VISIBILITY, RAY_OFFSET};
use crate::geometry::{Direction, Ray};
use crate::intersection::Intersection;
use crate::material::Material;
use crate::path::{FromLight, FromObj, Path, PathNode};
use crate::scene::Scene;

/// Traces one camera ray to completion, returning the estimated radiance
/// along with the full path record for persistence.
///
/// Three-way dispatch on the first hit:
/// - no hit: background radiance is zero, path is empty.
/// - hit an emitter directly: return its emission with no NEE weighting,
///   since the camera ray itself already found the light.
/// - hit a surface: hand off to the recursive estimator.
pub fn cast_ray(scene: &Scene, ray: &Ray, rng: &mut impl Rng, rr_probability: f32) -> (Vec3, Path) {
    let mut path = Path::new();
    let radiance = match scene.intersect(ray) {
        None => Vec3::ZERO,
        Some(hit) if hit.material.is_emissive() => {
            let mut node = PathNode::new(hit.position, -ray.direction());
            node.lo = hit.material.emission();
            node.hit = Some(hit);
            path.push_front(node);
            node.lo
        }
        Some(hit) => cast_ray_recursive(scene, &hit, -ray.direction(), rng, rr_probability, &mut path),
    };
    (radiance, path)
}

/// Estimates outgoing radiance at `hit` toward `wo`: a next-event
/// estimation term sampled directly against the scene's emitters, plus a
/// Russian-roulette-weighted indirect term from one more bounce. Both
/// branches' records are filled in on `node` regardless of which one ends
/// up contributing, so a persisted node always reflects what was drawn.
fn cast_ray_recursive(
    scene: &Scene,
    hit: &Intersection,
    wo: Direction,
    rng: &mut impl Rng,
    rr_probability: f32,
    path: &mut Path,
) -> Vec3 {
    let mut node = PathNode::new(hit.position, wo);
    node.hit = Some(*hit);

    let (direct, from_light) = direct_lighting(scene, hit, wo, rng);
    node.from_light = from_light;

    let rr = rng.gen_range(0.0..1.0);
    let mut from_obj = FromObj { rr, ..FromObj::none() };
    let mut indirect = Vec3::ZERO;

    if rr < rr_probability {
        let (pdf, wi) = Material::sample_hemisphere(hit.normal, rng);
        let brdf = hit.material.brdf(wi, wo, hit.normal);
        from_obj.wi_obj = wi;
        if pdf > 0.0 && brdf != Vec3::ZERO {
            let origin = hit.position + hit.normal.get() * RAY_OFFSET;
            let bounce_ray = Ray::new(origin, wi);
            if let Some(next_hit) = scene.intersect(&bounce_ray) {
                from_obj.hit_obj = Some(next_hit);
                from_obj.is_emission = next_hit.material.is_emissive();
                // A hit on an emitter terminates this arm with no
                // contribution: emitters are already accounted for by
                // direct lighting above, and adding their emission again
                // here would double-count them.
                if !from_obj.is_emission {
                    let incoming = cast_ray_recursive(scene, &next_hit, -wi, rng, rr_probability, path);
                    from_obj.li_obj = incoming;
                    let cos_theta = wi.get().dot(hit.normal.get()).max(0.0);
                    indirect = brdf * incoming * cos_theta / (pdf * rr_probability);
                }
            }
        }
    }
    node.from_obj = from_obj;

    node.lo = direct + indirect;
    path.push_front(node);
    node.lo
}

/// Next-event estimation: samples a point on a uniformly-area-weighted
/// emitter, casts a shadow ray, and returns the area-form direct-lighting
/// estimate (alongside the record of what was drawn) if the light is
/// unoccluded. Returns zero and an empty record if the scene has no
/// emitters or the sampled point is behind either surface's normal.
fn direct_lighting(scene: &Scene, hit: &Intersection, wo: Direction, rng: &mut impl Rng) -> (Vec3, FromLight) {
    let Some((pdf_light, hit_light)) = scene.sample_light(rng) else {
        return (Vec3::ZERO, FromLight::none());
    };
    let light_pos = hit_light.position;
    let light_normal = hit_light.normal;
    let light_material = hit_light.material;

    let to_light = light_pos - hit.position;
    let dist = to_light.length();
    if dist < EPS_VISIBILITY || pdf_light <= 0.0 {
        return (Vec3::ZERO, FromLight::none_pub());
    }
    let wi = Direction::new(to_light);

    let mut record = FromLight { li_light: Vec3::ZERO, wi_light: wi, hit_light: Some(hit_light) };

    let cos_surface = wi.get().dot(hit.normal.get());
    let cos_light = (-wi.get()).dot(light_normal.get());
    if cos_surface <= 0.0 || cos_light <= 0.0 {
        return (Vec3::ZERO, record);
    }

    let shadow_origin = hit.position + hit.normal.get() * RAY_OFFSET;
    let shadow_ray = Ray::new(shadow_origin, wi);
    let visible = match scene.intersect(&shadow_ray) {
        None => true,
        Some(blocker) => blocker.t >= dist - EPS_VISIBILITY,
    };
    if !visible {
        return (Vec3::ZERO, record);
    }

    let brdf = hit.material.brdf(wi, wo, hit.normal);
    let emission = light_material.emission();
    record.li_light = emission;

    // Area-sampling NEE estimator: Le * brdf * cos_surface * cos_light /
    // dist^2, divided by the chosen emitter's own per-surface pdf
    // (1 / emitter.area), not the scene-wide emitter area.
    let direct = brdf * emission * cos_surface * cos_light / (dist * dist * pdf_light);
    (direct, record)
}
