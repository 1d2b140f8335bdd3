// Debug line overlays, built once per tree as line-list index buffers.
//
//   skeleton    → indices into the skeleton positions (one line per segment)
//   ring loops  → indices into the ring table (closed loop per ring)
//   stick lines → indices into the ring table (seam corner → top corner)

use super::skeleton::{PointKind, Skeleton};

/// One line per segment. Skeleton points are already stored pairwise.
pub fn skeleton_lines(skeleton: &Skeleton) -> Vec<u32> {
    (0..skeleton.len() as u32).collect()
}

/// Closed loops around every ring, visited from the trunk outward so that
/// each segment's two rings are emitted together.
pub fn ring_loops(skeleton: &Skeleton) -> Vec<u32> {
    let mut lines = Vec::new();
    if skeleton.is_empty() {
        return lines;
    }

    let mut pending = vec![0];
    while let Some(start) = pending.pop() {
        push_loop(skeleton, start, &mut lines);
        push_loop(skeleton, start + 1, &mut lines);

        let end = &skeleton.points[start + 1];
        if end.kind == PointKind::Parent {
            let [c1, c2] = end.expect_children();
            pending.push(c2);
            pending.push(c1);
        }
    }
    lines
}

fn push_loop(skeleton: &Skeleton, index: usize, lines: &mut Vec<u32>) {
    let ring = &skeleton.points[index].ring;
    // A single-point ring is a leaf tip; there is nothing to outline.
    if ring.len() < 2 {
        return;
    }
    for r in ring.clone() {
        let next = if r + 1 == ring.end { ring.start } else { r + 1 };
        lines.push(r as u32);
        lines.push(next as u32);
    }
}

/// One line per stick from the bottom ring's seam corner to the top ring's
/// first corner. Twisted strips show up as slanted lines.
pub fn stick_lines(skeleton: &Skeleton) -> Vec<u32> {
    skeleton
        .segments()
        .flat_map(|(bottom, top)| {
            [
                skeleton.points[bottom].ring_seam as u32,
                skeleton.points[top].ring.start as u32,
            ]
        })
        .collect()
}
