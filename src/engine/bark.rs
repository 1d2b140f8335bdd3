// Bark meshers: stick strips and joint bridges over the ring table.
//
//   stick bark → one triangle strip per segment, segments joined by STRIP_RESTART
//   joint bark → discrete triangles bridging a joint ring to its children's rings
//
// Both meshes index the ring table directly. Each keeps its own normal table,
// one entry per ring point, overwritten by every triangle that ends on that
// point. There is no averaging: the last triangle written wins.

use glam::Vec3;

use super::geometry::triangle_normal;
use super::rings::RingTable;
use super::skeleton::{PointKind, Skeleton};

/// Strip restart sentinel. wgpu restarts `Uint32` strips on all-ones.
pub const STRIP_RESTART: u32 = u32::MAX;

/// Index buffer plus a per-ring-point normal table.
#[derive(Debug, Clone, Default)]
pub struct BarkMesh {
    pub indices: Vec<u32>,
    pub normals: Vec<Vec3>,
}

impl BarkMesh {
    fn with_ring_count(ring_count: usize) -> Self {
        Self {
            indices: Vec::new(),
            normals: vec![Vec3::ZERO; ring_count],
        }
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Normal of the last three emitted indices, optionally flipped.
    fn last_triangle_normal(&self, rings: &RingTable, flip: bool) -> Vec3 {
        let n = self.indices.len();
        let p = |i: usize| rings.points[self.indices[i] as usize];
        let normal = triangle_normal(p(n - 3), p(n - 2), p(n - 1));
        if flip { -normal } else { normal }
    }
}

// ============================================================================
// STICK BARK
// ============================================================================

/// Triangle strip around every stick, alternating top and bottom ring corners.
///
/// For a segment whose bottom ring has `b` corners the strip has `2·b + 2`
/// indices: it starts on the top ring, starts the bottom ring at its seam, and
/// wraps both rings independently until it closes. A one-point top ring (leaf)
/// turns the strip into a cone.
pub fn build_stick_bark(skeleton: &Skeleton, rings: &RingTable) -> BarkMesh {
    let mut mesh = BarkMesh::with_ring_count(rings.len());

    for (bottom, top) in skeleton.segments() {
        if bottom > 0 {
            mesh.indices.push(STRIP_RESTART);
        }

        let a = &skeleton.points[bottom];
        let b = &skeleton.points[top];
        assert!(a.has_ring() && b.has_ring(), "stick {bottom} has no rings");

        let start = [a.ring.start, b.ring.start];
        let end = [a.ring.end, b.ring.end];
        let mut cursor = [a.ring_seam, b.ring.start];
        let count = 2 * a.ring.len() + 2;

        // 0 = bottom ring, 1 = top ring.
        let mut k = 1;
        for j in 0..count {
            let index = cursor[k];
            mesh.indices.push(to_index(index));

            if j >= 2 {
                // Strip triangles alternate winding; the ones ending on the
                // bottom ring are clockwise.
                let normal = mesh.last_triangle_normal(rings, k == 0);
                mesh.normals[index] = normal;
            }

            cursor[k] += 1;
            if cursor[k] == end[k] {
                cursor[k] = start[k];
            }
            k = 1 - k;
        }
    }

    mesh
}

// ============================================================================
// JOINT BARK
// ============================================================================

/// Triangles closing every joint, walked from the trunk's joint outward.
pub fn build_joint_bark(skeleton: &Skeleton, rings: &RingTable) -> BarkMesh {
    let mut mesh = BarkMesh::with_ring_count(rings.len());

    if skeleton.len() > 1 && skeleton.points[1].kind == PointKind::Parent {
        let mut pending = vec![1];
        while let Some(joint) = pending.pop() {
            let kids = add_joint(skeleton, rings, joint, &mut mesh);
            // Reverse so child 1's subtree is emitted first.
            for kid in kids.into_iter().rev() {
                if skeleton.points[kid + 1].kind != PointKind::Leaf {
                    pending.push(kid + 1);
                }
            }
        }
    }

    mesh
}

/// Bridge one joint ring to both child rings. The children's first corners
/// are skipped: each child's first two corners are the shared seed edge and
/// the second child's copy duplicates the first child's.
fn add_joint(skeleton: &Skeleton, rings: &RingTable, joint: usize, mesh: &mut BarkMesh) -> [usize; 2] {
    let point = &skeleton.points[joint];
    let kids = point.expect_children();

    let bottom: Vec<u32> = point.ring.clone().map(to_index).collect();
    let top: Vec<u32> = kids
        .iter()
        .flat_map(|&kid| {
            let ring = &skeleton.points[kid].ring;
            ring.start + 1..ring.end
        })
        .map(to_index)
        .collect();

    bridge_rings(&top, &bottom, rings, mesh);
    kids
}

/// Stitch two closed index loops of possibly different lengths into a band
/// of triangles. Both loops advance in proportion to their length, so an
/// `m`-loop and an `n`-loop always produce exactly `m + n` triangles.
pub fn bridge_rings(m_list: &[u32], n_list: &[u32], rings: &RingTable, mesh: &mut BarkMesh) {
    assert!(!m_list.is_empty() && !n_list.is_empty(), "cannot bridge an empty ring");
    let m = m_list.len();
    let n = n_list.len();
    let (mut m_idx, mut n_idx) = (0, 0);

    loop {
        mesh.indices.push(m_list[m_idx % m]);
        mesh.indices.push(n_list[n_idx % n]);

        let m_next = (m_idx as f32 + 1.0) / m as f32;
        let n_next = (n_idx as f32 + 1.0) / n as f32;
        let last = if m_next < n_next {
            m_idx += 1;
            m_list[m_idx % m]
        } else {
            n_idx += 1;
            n_list[n_idx % n]
        };
        mesh.indices.push(last);

        let normal = mesh.last_triangle_normal(rings, false);
        mesh.normals[last as usize] = normal;

        if m_idx >= m && n_idx >= n {
            break;
        }
    }
}

fn to_index(i: usize) -> u32 {
    u32::try_from(i).expect("ring table exceeds u32 index range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::TreeConfig;
    use crate::engine::rings::build_rings;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn meshed(seed: u64, max_depth: u32) -> (Skeleton, RingTable, BarkMesh, BarkMesh) {
        let config = TreeConfig { max_depth, ..Default::default() };
        let mut skeleton = Skeleton::generate(&mut StdRng::seed_from_u64(seed), &config);
        let rings = build_rings(&mut skeleton, config.max_ring_corners);
        let stick = build_stick_bark(&skeleton, &rings);
        let joint = build_joint_bark(&skeleton, &rings);
        (skeleton, rings, stick, joint)
    }

    /// Split the strip buffer at restart markers.
    fn strips(mesh: &BarkMesh) -> Vec<&[u32]> {
        mesh.indices.split(|&i| i == STRIP_RESTART).collect()
    }

    #[test]
    fn stick_strip_lengths_are_two_b_plus_two() {
        let (s, _, stick, _) = meshed(1, 5);
        let strips = strips(&stick);
        assert_eq!(strips.len(), s.segment_count());
        for ((bottom, _), strip) in s.segments().zip(&strips) {
            assert_eq!(strip.len(), 2 * s.points[bottom].ring.len() + 2);
        }
    }

    #[test]
    fn stick_strip_alternates_top_and_bottom() {
        let (s, _, stick, _) = meshed(2, 4);
        for ((bottom, top), strip) in s.segments().zip(strips(&stick)) {
            let (b, t) = (&s.points[bottom].ring, &s.points[top].ring);
            assert_eq!(strip[0] as usize, t.start, "strip starts on the top ring");
            assert_eq!(strip[1] as usize, s.points[bottom].ring_seam, "bottom starts at the seam");
            for (j, &i) in strip.iter().enumerate() {
                let span = if j % 2 == 0 { t } else { b };
                assert!(span.contains(&(i as usize)), "index {j} of stick {bottom} left its ring");
            }
            // The strip closes: last pair repeats the first pair.
            let n = strip.len();
            assert_eq!(strip[n - 2], strip[0]);
            assert_eq!(strip[n - 1], strip[1]);
        }
    }

    #[test]
    fn depth_zero_has_one_strip_and_no_joints() {
        let (_, rings, stick, joint) = meshed(3, 0);
        assert_eq!(stick.index_count(), 2 * 3 + 2);
        assert!(!stick.indices.contains(&STRIP_RESTART));
        assert!(joint.indices.is_empty());
        assert_eq!(stick.normals.len(), rings.len());
        assert_eq!(joint.normals.len(), rings.len());
    }

    #[test]
    fn joint_triangle_count_is_m_plus_n() {
        let (s, _, _, joint) = meshed(4, 5);
        assert_eq!(joint.index_count() % 3, 0);
        let expected: usize = s
            .points
            .iter()
            .filter(|p| p.kind == PointKind::Parent)
            .map(|p| {
                let [c1, c2] = p.expect_children();
                let top = s.points[c1].ring.len() - 1 + s.points[c2].ring.len() - 1;
                top + p.ring.len()
            })
            .sum();
        assert_eq!(joint.index_count() / 3, expected);
    }

    #[test]
    fn bridge_emits_m_plus_n_triangles_for_uneven_loops() {
        let rings = RingTable {
            points: (0..20).map(|i| Vec3::new(i as f32, (i * i) as f32, 1.0)).collect(),
        };
        for (m, n) in [(1, 1), (1, 5), (4, 4), (6, 8), (8, 3), (7, 2)] {
            let m_list: Vec<u32> = (0..m).collect();
            let n_list: Vec<u32> = (10..10 + n).collect();
            let mut mesh = BarkMesh::with_ring_count(rings.len());
            bridge_rings(&m_list, &n_list, &rings, &mut mesh);
            assert_eq!(mesh.index_count(), 3 * (m + n) as usize, "m={m} n={n}");

            // Every corner of both loops is used.
            for i in m_list.iter().chain(&n_list) {
                assert!(mesh.indices.contains(i), "m={m} n={n} skipped {i}");
            }
            // Each triangle spans both loops.
            for tri in mesh.indices.chunks(3) {
                let from_m = tri.iter().filter(|&&i| i < 10).count();
                assert!(from_m == 1 || from_m == 2, "m={m} n={n} triangle {tri:?}");
            }
        }
    }

    #[test]
    fn trunk_normals_point_outward() {
        // The trunk's bottom ring is regular around the trunk axis, so every
        // corner's radial direction is well defined.
        for (seed, depth) in [(5, 0), (6, 1), (7, 4)] {
            let (s, rings, stick, _) = meshed(seed, depth);
            let base = s.position(0);
            let axis = (s.position(1) - base).normalize();
            for r in s.points[0].ring.clone() {
                let n = stick.normals[r];
                assert!((n.length() - 1.0).abs() < 1e-4, "trunk corner {r} has no normal");
                let rel = rings.points[r] - base;
                let radial = rel - axis * rel.dot(axis);
                assert!(n.dot(radial) > 0.0, "seed {seed}: trunk corner {r} faces inward");
            }
        }
    }

    #[test]
    fn leaf_tips_get_zero_normals() {
        let (s, _, stick, _) = meshed(6, 3);
        for &leaf in &s.leaves {
            assert_eq!(stick.normals[s.points[leaf].ring.start], Vec3::ZERO);
        }
        assert!(stick.normals.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn joint_normals_mostly_point_away_from_the_axis() {
        // Joint triangles lean across uneven rings, so a few corners near the
        // fork crease may tilt inward; reversed winding would flip nearly all.
        for seed in 0..5 {
            let (s, rings, _, joint) = meshed(seed, 6);
            let (mut outward, mut inward) = (0, 0);
            for (i, p) in s.points.iter().enumerate() {
                if p.ring.len() < 2 {
                    continue;
                }
                let axis = s.upward(i).normalize();
                for r in p.ring.clone() {
                    let n = joint.normals[r];
                    if n == Vec3::ZERO {
                        continue;
                    }
                    let rel = rings.points[r] - s.position(i);
                    let radial = rel - axis * rel.dot(axis);
                    if n.dot(radial) > 0.0 { outward += 1 } else { inward += 1 }
                }
            }
            assert!(outward > 0, "seed {seed}: no joint normals written");
            assert!(
                outward >= 9 * (outward + inward) / 10,
                "seed {seed}: {outward} outward vs {inward} inward"
            );
        }
    }

    #[test]
    fn joint_normals_are_unit_where_written() {
        let (_, _, _, joint) = meshed(7, 5);
        for &i in &joint.indices {
            let n = joint.normals[i as usize];
            assert!(n == Vec3::ZERO || (n.length() - 1.0).abs() < 1e-4);
        }
    }
}
