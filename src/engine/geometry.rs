// Small geometric helpers shared by the skeleton, ring and bark builders.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use rand::Rng;

/// Relative spread of every jittered scalar: values land in [0.85, 1.15] × average.
pub const NEAR_AVERAGE_SPREAD: f32 = 0.15;

/// Uniform sample within ±15% of `average`.
pub fn near_average<R: Rng>(rng: &mut R, average: f32) -> f32 {
    let lo = average * (1.0 - NEAR_AVERAGE_SPREAD);
    let hi = average * (1.0 + NEAR_AVERAGE_SPREAD);
    rng.gen_range(lo..=hi)
}

/// Distance from the centre of a regular polygon to any corner, given its edge length.
///
///   radius = edge / (2·cos(π·(0.5 − 1/corners)))
pub fn ring_radius(edge: f32, corners: usize) -> f32 {
    let alpha = PI * (0.5 - 1.0 / corners as f32);
    edge / (2.0 * alpha.cos())
}

/// Corner count of a joint ring: both child rings share one edge with each
/// other, so two corners drop out. Capped at `max_corners`.
pub fn joint_corners(child1: usize, child2: usize, max_corners: usize) -> usize {
    (child1 + child2).saturating_sub(2).min(max_corners)
}

/// A unit vector orthogonal to `v`. Prefers +X projected off `v` so a vertical
/// trunk always starts its ring on the +X side.
pub fn orthogonal_to(v: Vec3) -> Vec3 {
    let n = v.normalize();
    let candidate = Vec3::X - n * n.dot(Vec3::X);
    if candidate.length_squared() > 1e-6 {
        candidate.normalize()
    } else {
        n.any_orthonormal_vector()
    }
}

/// Walk a regular polygon by rotating `to_first` about `up`, appending
/// `centre + offset` for every corner at position `skip` or later.
/// The first `skip` corners are assumed to be appended already.
pub fn complete_ring(
    out: &mut Vec<Vec3>,
    up: Vec3,
    centre: Vec3,
    to_first: Vec3,
    corners: usize,
    skip: usize,
) {
    let rot = Quat::from_axis_angle(up.normalize(), 2.0 * PI / corners as f32);
    let mut offset = to_first;
    for i in 0..corners {
        if i >= skip {
            out.push(centre + offset);
        }
        offset = rot * offset;
    }
}

/// Finish a ring whose first two corners are the last two entries of `out`.
/// The edge length is taken from the two seeds; the centre sits on the side of
/// the seed edge given by `up × (p1 − p0)`.
pub fn complete_ring_from_two(out: &mut Vec<Vec3>, up: Vec3, corners: usize) {
    let n = out.len();
    assert!(n >= 2, "two seed points are required to complete a ring");
    let p0 = out[n - 2];
    let p1 = out[n - 1];

    let edge = p0.distance(p1);
    let radius = ring_radius(edge, corners);
    let half = edge / 2.0;
    let apothem = (radius * radius - half * half).sqrt();

    let to_centre = apothem * up.cross(p1 - p0).normalize();
    let centre = 0.5 * p0 + 0.5 * p1 + to_centre;

    complete_ring(out, up, centre, p0 - centre, corners, 2);
}

/// Normal of triangle (p0, p1, p2), counter-clockwise front. Degenerate
/// triangles give zero.
pub fn triangle_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p1 - p0).cross(p2 - p0).normalize_or_zero()
}
