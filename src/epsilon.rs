//! Named, magnitude-scaled tolerances used throughout the renderer.
//!
//! The source this crate is derived from used seven scaled epsilons
//! (machine-eps up to 1e6*eps) rather than one universal constant. We keep
//! that intent as a small set of named values instead of sprinkling magic
//! numbers through the geometry and sampling code.

/// Raw `f32` machine epsilon. Used by the slab test and the Moller-Trumbore
/// denominator check, where a value strictly smaller indicates a
/// ray parallel to a plane.
pub const EPS_MACHINE: f32 = f32::EPSILON;

/// ~1e3 * machine epsilon. Used by `Aabb::contains` so points sitting right
/// on a box face (introduced by float round-trip) still count as contained.
pub const EPS_CONTAIN: f32 = 1e3 * f32::EPSILON;

/// ~1e4 * machine epsilon. Used for the shadow-ray visibility comparison in
/// next-event estimation, where the ray origin offset introduces a small
/// positional slop at the light.
pub const EPS_VISIBILITY: f32 = 1e4 * f32::EPSILON;

/// ~1e5 * machine epsilon. Used by `Bvh::sample` area-threshold bookkeeping,
/// where repeated float addition of per-primitive areas accumulates drift.
pub const EPS_AREA: f32 = 1e5 * f32::EPSILON;

/// ~1e6 * machine epsilon. Loosest tolerance, used only by tests that check
/// a sampled/intersected position against an expected point.
pub const EPS_POSITION: f32 = 1e6 * f32::EPSILON;

/// Offset applied along the shading normal when spawning secondary rays, to
/// avoid immediate self-intersection ("shadow acne"). Scene-scale dependent;
/// tuned for scenes on the order of a few hundred units across (e.g. the
/// Cornell box). Scenes at a very different scale should scale this value
/// with scene extent.
pub const RAY_OFFSET: f32 = 0.01;
