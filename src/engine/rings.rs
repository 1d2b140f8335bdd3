// Ring constructor: a closed polygon of points around every skeleton point.
//
// Rings are built bottom-up. Each leaf starts a walk toward the root:
//
//   Leaf    → one-point ring (the tip), then the stick below it with 3 corners
//   Child   → root:            regular polygon around the trunk base
//             sibling ringed:  reuse the sibling's first two points, reversed
//             sibling pending: seed two points between the sibling centres, stop
//   Parent  → corners = child1 + child2 − 2 (capped), then the stick below it
//
// The walk stops at the first Child whose sibling has no ring yet; the walk
// from that sibling's leaves finishes the joint later. Siblings share their
// seed edge, so the joint surface has no gap between them.

use glam::Vec3;

use super::geometry::{
    complete_ring, complete_ring_from_two, joint_corners, orthogonal_to, ring_radius,
};
use super::skeleton::{PointKind, Skeleton};

/// Corners of the ring at the base of a stick that ends in a leaf.
pub const LEAF_STICK_CORNERS: usize = 3;

/// Ring edge length of a stick start, as a fraction of stick length per corner.
const STICK_EDGE_FRACTION: f32 = 0.7;
/// Weight of the children's edge length in a joint ring's edge length.
/// The remainder comes from the joint's own stick, which tapers the trunk.
const JOINT_TOP_WEIGHT: f32 = 0.9;

/// Flat table of ring corners, partitioned into per-point spans.
#[derive(Debug, Clone, Default)]
pub struct RingTable {
    pub points: Vec<Vec3>,
}

impl RingTable {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Distance between the first two corners of the ring starting at `start`.
    fn edge_at(&self, start: usize) -> f32 {
        self.points[start].distance(self.points[start + 1])
    }
}

/// Build every ring of `skeleton`, filling in each point's `ring`,
/// `ring_radius` and `ring_seam`.
pub fn build_rings(skeleton: &mut Skeleton, max_corners: usize) -> RingTable {
    let mut table = RingTable::default();
    let leaves = skeleton.leaves.clone();
    let mut builder = RingBuilder { skeleton, table: &mut table, max_corners };
    for leaf in leaves {
        builder.add_leaf_ring(leaf);
    }
    debug_assert!(
        builder.skeleton.points.iter().all(|p| p.has_ring()),
        "every skeleton point should own a ring once all leaves are walked"
    );
    table
}

struct RingBuilder<'a> {
    skeleton:    &'a mut Skeleton,
    table:       &'a mut RingTable,
    max_corners: usize,
}

impl RingBuilder<'_> {
    fn add_leaf_ring(&mut self, leaf: usize) {
        assert_eq!(self.skeleton.points[leaf].kind, PointKind::Leaf);

        let start = self.table.len();
        self.table.points.push(self.skeleton.position(leaf));
        let point = &mut self.skeleton.points[leaf];
        point.ring = start..start + 1;
        point.ring_radius = 0.0;

        let stick_len = self.skeleton.stick_length(leaf);
        self.add_child_ring(leaf - 1, LEAF_STICK_CORNERS, stick_len);
    }

    /// Ring for the start of a segment. `scale` is the stick length the
    /// ring's edge length is derived from.
    fn add_child_ring(&mut self, index: usize, corners: usize, scale: f32) {
        debug_assert_eq!(self.skeleton.points[index].kind, PointKind::Child);

        let upward = self.skeleton.upward(index);
        let edge = STICK_EDGE_FRACTION * scale / corners as f32;

        let Some(parent) = self.skeleton.points[index].parent else {
            self.add_root_ring(index, upward, edge, corners);
            return;
        };

        let sibling = self.skeleton.sibling(index);
        let start = self.table.len();

        if self.skeleton.points[sibling].has_ring() {
            let sib_start = self.skeleton.points[sibling].ring.start;
            let (a, b) = (self.table.points[sib_start + 1], self.table.points[sib_start]);
            self.table.points.push(a);
            self.table.points.push(b);
            complete_ring_from_two(&mut self.table.points, upward, corners);

            self.finish_ring(index, start, 0.0);
            self.add_parent_ring(parent);
            return;
        }

        // No sibling ring yet: pick the shared seed edge ourselves, centred
        // between the two ring centres and across the plane they span with
        // the parent stick.
        let my_centre = self.skeleton.ring_centre(index);
        let sibling_centre = self.skeleton.ring_centre(sibling);
        let joint_centre = 0.5 * my_centre + 0.5 * sibling_centre;
        let parent_up = self.skeleton.upward(parent);
        let to_first = parent_up.cross(my_centre - sibling_centre).normalize();

        self.table.points.push(joint_centre + 0.5 * edge * to_first);
        self.table.points.push(joint_centre - 0.5 * edge * to_first);
        complete_ring_from_two(&mut self.table.points, upward, corners);

        self.finish_ring(index, start, ring_radius(edge, corners));
    }

    fn add_root_ring(&mut self, index: usize, upward: Vec3, edge: f32, corners: usize) {
        let trunk = self.skeleton.position(index);
        let radius = ring_radius(edge, corners);
        let to_first = radius * orthogonal_to(upward);

        let start = self.table.len();
        self.table.points.push(trunk + to_first);
        complete_ring(&mut self.table.points, upward, trunk, to_first, corners, 1);

        self.finish_ring(index, start, radius);
    }

    fn add_parent_ring(&mut self, index: usize) {
        let [c1, c2] = self.skeleton.points[index].expect_children();
        let ring1 = self.skeleton.points[c1].ring.clone();
        let ring2 = self.skeleton.points[c2].ring.clone();
        assert!(
            ring1.len() >= 2 && ring2.len() >= 2,
            "joint {index} reached before both child rings were built"
        );

        let corners = joint_corners(ring1.len(), ring2.len(), self.max_corners);

        let stick_len = self.skeleton.stick_length(index);
        let bottom_edge = stick_len / corners as f32;
        let top_edge = 0.5 * self.table.edge_at(ring1.start) + 0.5 * self.table.edge_at(ring2.start);
        let edge = JOINT_TOP_WEIGHT * top_edge + (1.0 - JOINT_TOP_WEIGHT) * bottom_edge;

        let centre = self.skeleton.ring_centre(index);
        let up = self.skeleton.upward(index).normalize();

        // Start the ring under child 1's second corner so the joint bridge
        // begins without a twist.
        let to_child = self.table.points[ring1.start + 1] - centre;
        let first_dir = (to_child - up * to_child.dot(up)).normalize();
        let radius = ring_radius(edge, corners);
        let to_first = radius * first_dir;

        let start = self.table.len();
        self.table.points.push(centre + to_first);
        complete_ring(&mut self.table.points, up, centre, to_first, corners, 1);

        let point = &mut self.skeleton.points[index];
        point.ring = start..self.table.len();
        point.ring_radius = radius;

        self.add_child_ring(index - 1, corners, stick_len);
    }

    /// Close the span `start..` for a Child and line up its seam.
    fn finish_ring(&mut self, index: usize, start: usize, radius: f32) {
        let end = self.table.len();
        let point = &mut self.skeleton.points[index];
        point.ring = start..end;
        point.ring_radius = radius;
        let seam = self.nearest_to_top0(index);
        self.skeleton.points[index].ring_seam = seam;
    }

    /// Ring index of `index` nearest to the first ring point of `index + 1`
    /// slid down the stick onto this end.
    fn nearest_to_top0(&self, index: usize) -> usize {
        let top = &self.skeleton.points[index + 1];
        assert!(top.has_ring(), "the top of stick {index} must be ringed first");
        let top0 = self.table.points[top.ring.start];
        let shadow = top0 + self.skeleton.position(index) - self.skeleton.position(index + 1);

        let ring = self.skeleton.points[index].ring.clone();
        let mut best = ring.start;
        let mut best_dist = shadow.distance(self.table.points[best]);
        for r in ring.start + 1..ring.end {
            let d = shadow.distance(self.table.points[r]);
            if d < best_dist {
                best_dist = d;
                best = r;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::TreeConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f32 = 1e-4;

    fn ringed(seed: u64, max_depth: u32) -> (Skeleton, RingTable) {
        let config = TreeConfig { max_depth, ..Default::default() };
        let mut skeleton = Skeleton::generate(&mut StdRng::seed_from_u64(seed), &config);
        let rings = build_rings(&mut skeleton, config.max_ring_corners);
        (skeleton, rings)
    }

    #[test]
    fn depth_zero_rings() {
        let (s, rings) = ringed(1, 0);
        assert_eq!(s.points[1].ring.len(), 1, "leaf ring is its tip");
        assert_eq!(rings.points[s.points[1].ring.start], s.position(1));
        assert_eq!(s.points[0].ring.len(), LEAF_STICK_CORNERS);
        assert_eq!(rings.len(), 1 + LEAF_STICK_CORNERS);

        // The trunk ring is regular around the root with its first corner on +X.
        let root = &s.points[0];
        assert!(root.ring_radius > 0.0);
        for r in root.ring.clone() {
            let d = rings.points[r].distance(s.position(0));
            assert!((d - root.ring_radius).abs() < EPS);
        }
        let first = rings.points[root.ring.start] - s.position(0);
        assert!(first.normalize().dot(Vec3::X) > 1.0 - EPS);
    }

    #[test]
    fn depth_one_rings() {
        let (s, _rings) = ringed(2, 1);
        // Leaves: 1 point; leaf sticks: 3 corners; joint: 3 + 3 − 2 = 4.
        assert_eq!(s.points[3].ring.len(), 1);
        assert_eq!(s.points[5].ring.len(), 1);
        assert_eq!(s.points[2].ring.len(), 3);
        assert_eq!(s.points[4].ring.len(), 3);
        assert_eq!(s.points[1].ring.len(), 4);
        assert_eq!(s.points[0].ring.len(), 4, "the trunk start matches its joint");
        assert!(s.points[2].ring_radius > 0.0, "first sibling ring has a radius");
        assert_eq!(s.points[4].ring_radius, 0.0, "second sibling ring is matched, not centred");
    }

    #[test]
    fn every_point_has_a_ring_and_leaves_have_one_point() {
        for seed in 0..6 {
            let (s, rings) = ringed(seed, 6);
            for p in &s.points {
                assert!(p.has_ring());
                assert!(p.ring.end <= rings.len());
                if p.kind == PointKind::Leaf {
                    assert_eq!(p.ring.len(), 1);
                }
            }
        }
    }

    #[test]
    fn spans_partition_the_table() {
        let (s, rings) = ringed(7, 5);
        let mut spans: Vec<_> = s.points.iter().map(|p| p.ring.clone()).collect();
        spans.sort_by_key(|r| r.start);
        let mut next = 0;
        for span in spans {
            assert_eq!(span.start, next, "spans are contiguous and disjoint");
            next = span.end;
        }
        assert_eq!(next, rings.len());
    }

    #[test]
    fn siblings_share_reversed_seed_edge() {
        for seed in 0..6 {
            let (s, rings) = ringed(seed, 5);
            for p in s.points.iter().filter(|p| p.kind == PointKind::Parent) {
                let [c1, c2] = p.expect_children();
                let a = s.points[c1].ring.start;
                let b = s.points[c2].ring.start;
                let (a0, a1) = (rings.points[a], rings.points[a + 1]);
                let (b0, b1) = (rings.points[b], rings.points[b + 1]);
                // Whichever sibling was ringed second copied the other's seeds.
                assert!(
                    ((a0 - b1).length() < EPS && (a1 - b0).length() < EPS),
                    "siblings {c1}/{c2} do not share a reversed edge"
                );
            }
        }
    }

    #[test]
    fn joint_corner_counts_follow_children() {
        let (s, _) = ringed(3, 7);
        for p in s.points.iter().filter(|p| p.kind == PointKind::Parent) {
            let [c1, c2] = p.expect_children();
            let expected = joint_corners(s.points[c1].ring.len(), s.points[c2].ring.len(), 8);
            assert_eq!(p.ring.len(), expected);
            assert!(p.ring.len() <= 8);
        }
    }

    #[test]
    fn corner_cap_applies() {
        let config = TreeConfig { max_depth: 6, max_ring_corners: 5, ..Default::default() };
        let mut s = Skeleton::generate(&mut StdRng::seed_from_u64(8), &config);
        build_rings(&mut s, config.max_ring_corners);
        assert!(s.points.iter().all(|p| p.ring.len() <= 5));
        assert_eq!(s.points[0].ring.len(), s.points[1].ring.len());
    }

    #[test]
    fn stick_rings_match_their_top_corner_count() {
        let (s, _) = ringed(4, 6);
        for (bottom, top) in s.segments() {
            let top_len = s.points[top].ring.len();
            let expected = if top_len == 1 { LEAF_STICK_CORNERS } else { top_len };
            assert_eq!(s.points[bottom].ring.len(), expected);
        }
    }

    #[test]
    fn seams_lie_within_their_rings() {
        let (s, rings) = ringed(5, 6);
        for (bottom, top) in s.segments() {
            let p = &s.points[bottom];
            assert!(p.ring.contains(&p.ring_seam));

            // No other corner is closer to the slid-down top corner.
            let shadow = rings.points[s.points[top].ring.start] + s.position(bottom) - s.position(top);
            let seam_dist = shadow.distance(rings.points[p.ring_seam]);
            for r in p.ring.clone() {
                assert!(shadow.distance(rings.points[r]) >= seam_dist - EPS);
            }
        }
    }

    #[test]
    fn rings_are_finite() {
        let (_, rings) = ringed(6, 8);
        assert!(rings.points.iter().all(|p| p.is_finite()));
    }
}
