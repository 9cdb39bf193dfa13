//! A median-split bounding volume hierarchy built by recursively
//! partitioning primitives around the median centroid along the box's
//! longest axis (the `find_kth_obj` approach this module is grounded on).
//! Traversal always tests both children once their shared box is hit, and
//! sampling walks the tree proportionally to subtree surface area.

use glam::Vec3;
use rand::Rng;

use crate::epsilon::EPS_AREA;
use crate::geometry::{Aabb, Axis, Ray};
use crate::intersection::Intersection;
use crate::material::Material;
use crate::primitive::Hittable;

/// Anything a `Bvh` can store: a box and a centroid to partition by.
pub trait Bounded {
    fn aabb(&self) -> Aabb;
    fn centroid(&self) -> Vec3;
}

enum Node<T> {
    Leaf {
        aabb: Aabb,
        area: f32,
        object: T,
    },
    Internal {
        aabb: Aabb,
        area: f32,
        left: Box<Node<T>>,
        right: Box<Node<T>>,
    },
}

impl<T> Node<T> {
    fn aabb(&self) -> Aabb {
        match self {
            Node::Leaf { aabb, .. } => *aabb,
            Node::Internal { aabb, .. } => *aabb,
        }
    }

    fn area(&self) -> f32 {
        match self {
            Node::Leaf { area, .. } => *area,
            Node::Internal { area, .. } => *area,
        }
    }
}

fn clone_node<T: Clone>(node: &Node<T>) -> Node<T> {
    match node {
        Node::Leaf { aabb, area, object } => Node::Leaf { aabb: *aabb, area: *area, object: object.clone() },
        Node::Internal { aabb, area, left, right } => Node::Internal {
            aabb: *aabb,
            area: *area,
            left: Box::new(clone_node(left)),
            right: Box::new(clone_node(right)),
        },
    }
}

/// A BVH over owned primitives of type `T`. Construction consumes the
/// primitive list; the tree then owns every leaf.
pub struct Bvh<T> {
    root: Option<Node<T>>,
    node_count: usize,
}

impl<T: Clone> Clone for Bvh<T> {
    fn clone(&self) -> Self {
        Bvh {
            root: self.root.as_ref().map(clone_node),
            node_count: self.node_count,
        }
    }
}

impl<T> std::fmt::Debug for Bvh<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bvh").field("node_count", &self.node_count).finish()
    }
}

impl<T: Bounded + Hittable> Bvh<T> {
    pub fn build(objects: Vec<T>) -> Self {
        if objects.is_empty() {
            return Bvh { root: None, node_count: 0 };
        }
        let mut node_count = 0usize;
        let root = build_recursive(objects, &mut node_count);
        Bvh { root: Some(root), node_count }
    }

    /// Total node count, leaves and internal nodes combined. A tree over `n`
    /// primitives always has exactly `2n - 1` nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn aabb(&self) -> Aabb {
        self.root.as_ref().map(Node::aabb).unwrap_or_else(Aabb::empty)
    }

    pub fn total_area(&self) -> f32 {
        self.root.as_ref().map(Node::area).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Tests both children unconditionally once the node's own box is hit,
    /// returning whichever branch reports the nearer intersection.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.root.as_ref().and_then(|node| intersect_node(node, ray))
    }

    /// Draws a uniformly-area-weighted point on the tree's surface, along
    /// with the normal and material of the primitive it landed on.
    pub fn sample(&self, rng: &mut impl Rng) -> Option<(Vec3, crate::geometry::Direction, Material)> {
        self.root.as_ref().map(|node| sample_node(node, rng))
    }
}

fn intersect_node<T: Bounded + Hittable>(node: &Node<T>, ray: &Ray) -> Option<Intersection> {
    if !node.aabb().is_intersect(ray) {
        return None;
    }
    match node {
        Node::Leaf { object, .. } => object.intersect(ray),
        Node::Internal { left, right, .. } => {
            let hit_left = intersect_node(left, ray);
            let hit_right = intersect_node(right, ray);
            crate::intersection::closer(hit_left, hit_right)
        }
    }
}

fn sample_node<T: Bounded + Hittable>(
    node: &Node<T>,
    rng: &mut impl Rng,
) -> (Vec3, crate::geometry::Direction, Material) {
    match node {
        Node::Leaf { object, .. } => {
            let (pos, normal) = object.sample(rng);
            (pos, normal, object.material())
        }
        Node::Internal { left, right, area, .. } => {
            let threshold = rng.gen_range(0.0..*area);
            if threshold < left.area() + EPS_AREA {
                sample_node(left, rng)
            } else {
                sample_node(right, rng)
            }
        }
    }
}

impl Bounded for crate::triangle::Triangle {
    fn aabb(&self) -> Aabb {
        crate::triangle::Triangle::aabb(self)
    }

    fn centroid(&self) -> Vec3 {
        crate::triangle::Triangle::centroid(self)
    }
}

impl Bounded for crate::primitive::Primitive {
    fn aabb(&self) -> Aabb {
        Hittable::aabb(self)
    }

    /// Exact for a lone triangle; approximated by the bounding-box centroid
    /// for a mesh, since a mesh's true area-weighted centroid isn't needed
    /// for median-split partitioning to produce a reasonable tree.
    fn centroid(&self) -> Vec3 {
        match self {
            crate::primitive::Primitive::Triangle(t) => t.centroid(),
            crate::primitive::Primitive::Mesh(m) => m.aabb().centroid(),
        }
    }
}

fn build_recursive<T: Bounded + Hittable>(mut objects: Vec<T>, node_count: &mut usize) -> Node<T> {
    *node_count += 1;
    if objects.len() == 1 {
        let object = objects.pop().expect("checked len == 1 above");
        let aabb = object.aabb();
        let area = object.area();
        return Node::Leaf { aabb, area, object };
    }

    let bounds = objects.iter().fold(Aabb::empty(), |acc, o| acc.union_box(&o.aabb()));
    let axis = bounds.longest_axis();
    let mid = objects.len() / 2;

    match axis {
        Axis::X => objects.select_nth_unstable_by(mid, |a, b| {
            a.centroid().x.partial_cmp(&b.centroid().x).expect("non-NaN centroid")
        }),
        Axis::Y => objects.select_nth_unstable_by(mid, |a, b| {
            a.centroid().y.partial_cmp(&b.centroid().y).expect("non-NaN centroid")
        }),
        Axis::Z => objects.select_nth_unstable_by(mid, |a, b| {
            a.centroid().z.partial_cmp(&b.centroid().z).expect("non-NaN centroid")
        }),
    };

    let right_objects = objects.split_off(mid);
    let left_objects = objects;

    let left = build_recursive(left_objects, node_count);
    let right = build_recursive(right_objects, node_count);
    let aabb = left.aabb().union_box(&right.aabb());
    let area = left.area() + right.area();
    Node::Internal { aabb, area, left: Box::new(left), right: Box::new(right) }
}
