//! Per-bounce path record, kept for the persistence layer. Every recursive
//! step of `cast_ray_recursive` pushes one node, so a path read back to
//! front is the light-transport chain from the camera to its final bounce.

use glam::Vec3;

use crate::geometry::Direction;
use crate::intersection::Intersection;

/// The next-event-estimation half of a node: the point sampled on an
/// emitter, the direction toward it, and that sampled point's own
/// intersection record (not the occluder the shadow ray was tested
/// against). `hit_light` is `None` when the branch never ran, e.g. a scene
/// with no emitters.
#[derive(Debug, Clone, Copy)]
pub struct FromLight {
    pub li_light: Vec3,
    pub wi_light: Direction,
    pub hit_light: Option<Intersection>,
}

impl FromLight {
    pub fn none() -> Self {
        FromLight { li_light: Vec3::ZERO, wi_light: Direction::zero(), hit_light: None }
    }
}

/// The indirect-bounce half of a node: the Russian-roulette draw that
/// gated this arm, the next bounce's incoming radiance and direction, its
/// intersection (if any), and whether that intersection was itself an
/// emitter (tracked separately since double-counting it is avoided by
/// terminating the arm rather than by anything `Intersection` records).
#[derive(Debug, Clone, Copy)]
pub struct FromObj {
    pub rr: f32,
    pub li_obj: Vec3,
    pub wi_obj: Direction,
    pub hit_obj: Option<Intersection>,
    pub is_emission: bool,
}

impl FromObj {
    pub fn none() -> Self {
        FromObj { rr: 0.0, li_obj: Vec3::ZERO, wi_obj: Direction::zero(), hit_obj: None, is_emission: false }
    }
}

/// One vertex of a traced path. `from_light` / `from_obj` record which
/// technique contributed the outgoing radiance at this node (next-event
/// estimation off an emitter, or indirect recursion off a surface), kept
/// side by side rather than folded into a single enum so a node can be
/// built incrementally as `cast_ray_recursive` fills in NEE first and then
/// the indirect term. `hit` is the intersection this node was built from
/// (only the degenerate "ray missed everything" case has no node at all,
/// so every pushed node carries `Some`).
#[derive(Debug, Clone, Copy)]
pub struct PathNode {
    pub lo: Vec3,
    pub wo: Direction,
    pub pos_out: Vec3,
    pub hit: Option<Intersection>,
    pub from_light: FromLight,
    pub from_obj: FromObj,
}

impl PathNode {
    pub fn new(pos_out: Vec3, wo: Direction) -> Self {
        PathNode {
            lo: Vec3::ZERO,
            wo,
            pos_out,
            hit: None,
            from_light: FromLight::none(),
            from_obj: FromObj::none(),
        }
    }
}

/// A traced path, recorded front (camera end) to back (final bounce) in
/// insertion order. New nodes are pushed to the front as recursion unwinds,
/// matching the source's `std::deque` usage and its `push_front` calls.
pub type Path = std::collections::VecDeque<PathNode>;
