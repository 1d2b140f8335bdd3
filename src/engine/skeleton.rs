// Branching skeleton: an arena of points grown by recursive stochastic splitting.
//
// Points are stored in segment pairs:
//   even index → segment start (Child; the root has no parent)
//   odd index  → segment end   (Leaf, or Parent when the branch splits)
// A Parent's two children are the starts of the next two segments grown
// from its position.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::{Quat, Vec3};
use rand::Rng;

use super::config::TreeConfig;
use super::geometry::near_average;

/// Mean share of the split angle given to each child.
const SPLIT_WEIGHT: f32 = 0.5;
/// Mean angle (radians) between the two children of a split.
const SPLIT_ANGLE: f32 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Leaf,
    Parent,
    Child,
}

#[derive(Debug, Clone)]
pub struct SkeletonPoint {
    pub position: Vec3,
    pub kind:     PointKind,
    /// The Parent this Child hangs from. `None` on the root and on segment ends.
    pub parent:   Option<usize>,
    /// First point of each child segment. Set on Parents only.
    pub children: Option<[usize; 2]>,

    /// Span of this point's cross-section in the ring table. Empty until ringed.
    pub ring:        Range<usize>,
    /// Circumradius when the ring was built around a known centre, else 0.
    pub ring_radius: f32,
    /// Ring index lined up with the first ring point of the next point up
    /// the segment. Child points only; keeps stick strips from twisting.
    pub ring_seam:   usize,
}

impl SkeletonPoint {
    fn new(position: Vec3, kind: PointKind, parent: Option<usize>) -> Self {
        Self {
            position,
            kind,
            parent,
            children: None,
            ring: 0..0,
            ring_radius: 0.0,
            ring_seam: 0,
        }
    }

    pub fn has_ring(&self) -> bool {
        !self.ring.is_empty()
    }

    /// Both child indices. Panics on anything but a Parent.
    pub fn expect_children(&self) -> [usize; 2] {
        match (self.kind, self.children) {
            (PointKind::Parent, Some(children)) => children,
            _ => panic!("expected a Parent with two children, found {:?}", self.kind),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub points: Vec<SkeletonPoint>,
    /// Leaf indices in generation order.
    pub leaves: Vec<usize>,
}

impl Skeleton {
    /// Grow a skeleton from `config.origin` along `config.direction`.
    /// The config is expected to have passed `TreeConfig::validate`.
    pub fn generate<R: Rng>(rng: &mut R, config: &TreeConfig) -> Self {
        let mut skeleton = Self::default();
        let mut grower = Grower {
            rng,
            skeleton: &mut skeleton,
            min_length: config.min_length,
            branch_size_factor: config.branch_size_factor,
        };
        grower.grow(
            config.origin,
            config.direction,
            config.average_length,
            config.max_depth,
            None,
        );
        skeleton
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() / 2
    }

    /// `(start, end)` index pairs of every segment.
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.points.len()).step_by(2).map(|i| (i, i + 1))
    }

    pub fn position(&self, index: usize) -> Vec3 {
        self.points[index].position
    }

    /// Length of the segment that `index` belongs to.
    pub fn stick_length(&self, index: usize) -> f32 {
        let start = index & !1;
        self.position(start).distance(self.position(start + 1))
    }

    /// Unnormalized segment vector through `index`, pointing away from the root.
    pub fn upward(&self, index: usize) -> Vec3 {
        if self.points[index].kind == PointKind::Child {
            self.position(index + 1) - self.position(index)
        } else {
            self.position(index) - self.position(index - 1)
        }
    }

    /// Centre of the ring at `index`: segment starts bulge up into the stick,
    /// segment ends sink slightly below the joint.
    pub fn ring_centre(&self, index: usize) -> Vec3 {
        let up = self.upward(index);
        if self.points[index].kind == PointKind::Child {
            self.position(index) + 0.4 * up
        } else {
            self.position(index) - 0.05 * up
        }
    }

    /// The other child of this Child's parent. Panics on the root.
    pub fn sibling(&self, index: usize) -> usize {
        let parent = self.points[index]
            .parent
            .expect("the root has no sibling");
        let [c1, c2] = self.points[parent].expect_children();
        if c1 == index { c2 } else { c1 }
    }
}

struct Grower<'a, R: Rng> {
    rng:                &'a mut R,
    skeleton:           &'a mut Skeleton,
    min_length:         f32,
    branch_size_factor: f32,
}

impl<R: Rng> Grower<'_, R> {
    /// Append one segment and, unless it terminates, split into two children.
    /// Returns the index of the segment's first point.
    fn grow(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        average_length: f32,
        depth_left: u32,
        parent: Option<usize>,
    ) -> usize {
        let direction = direction.normalize();
        let length = near_average(&mut *self.rng, average_length);
        let end = origin + length * direction;

        let start_index = self.skeleton.points.len();
        let end_index = start_index + 1;
        self.skeleton.points.push(SkeletonPoint::new(origin, PointKind::Child, parent));
        self.skeleton.points.push(SkeletonPoint::new(end, PointKind::Leaf, None));

        if length < self.min_length || depth_left == 0 {
            self.skeleton.leaves.push(end_index);
            return start_index;
        }

        let average_length = average_length * self.branch_size_factor;

        let w1 = near_average(&mut *self.rng, SPLIT_WEIGHT);
        let w2 = 1.0 - w1;
        let split_angle = near_average(&mut *self.rng, SPLIT_ANGLE);
        let twist_angle = self.rng.gen_range(0.0..TAU);

        let axis = direction.any_orthonormal_vector();
        let twist = Quat::from_axis_angle(direction, twist_angle);

        // Child 1 bends by w2 and child 2 by w1: the heavier branch stays straighter.
        let dir1 = twist * Quat::from_axis_angle(axis, split_angle * w2) * direction;
        let dir2 = twist * Quat::from_axis_angle(axis, -split_angle * w1) * direction;

        self.skeleton.points[end_index].kind = PointKind::Parent;
        let child1 = self.grow(end, dir1, average_length, depth_left - 1, Some(end_index));
        let child2 = self.grow(end, dir2, average_length, depth_left - 1, Some(end_index));
        self.skeleton.points[end_index].children = Some([child1, child2]);

        start_index
    }
}
