//! Mesh decimation by iterative shortest-edge collapse.
//!
//! No quadric error metric; collapsing the globally shortest admissible
//! edge to its midpoint is crude but predictable, honors a target point
//! count exactly, and never inverts more than the collapse itself. The
//! input is fan-triangulated first, so the result is always a triangle
//! mesh.

use std::collections::HashSet;

use glam::Vec3;

use crate::attribute::ElementClass;
use crate::geometry::GeometryContainer;
use crate::processing::{adjacency, sampling};

/// Collapse edges until at most `target_points` points remain. Boundary
/// edges are left untouched when `preserve_boundaries` is set. Returns a
/// fresh triangle-mesh container.
pub fn decimate_to_point_count(
    geo: &GeometryContainer,
    target_points: usize,
    preserve_boundaries: bool,
) -> GeometryContainer {
    let positions: Vec<Vec3> = match geo.positions() {
        Some(p) => p.as_slice().to_vec(),
        None => return geo.clone(),
    };
    let mut points = positions;
    let mut triangles: Vec<[u32; 3]> = sampling::triangulate(geo)
        .into_iter()
        .map(|t| t.points)
        .collect();
    let boundary = if preserve_boundaries {
        adjacency::boundary_points(geo)
    } else {
        vec![false; points.len()]
    };

    let mut alive: Vec<bool> = vec![false; points.len()];
    for tri in &triangles {
        for &p in tri {
            alive[p as usize] = true;
        }
    }
    let mut alive_count = alive.iter().filter(|&&a| a).count();
    // Collapse targets: every deleted point forwards to its survivor.
    let mut forward: Vec<u32> = (0..points.len() as u32).collect();
    let resolve = |forward: &[u32], mut p: u32| {
        while forward[p as usize] != p {
            p = forward[p as usize];
        }
        p
    };

    while alive_count > target_points.max(3) {
        // Shortest admissible edge over the current triangle set.
        let mut best: Option<(f32, u32, u32)> = None;
        let mut seen = HashSet::new();
        for tri in &triangles {
            for i in 0..3 {
                let a = resolve(&forward, tri[i]);
                let b = resolve(&forward, tri[(i + 1) % 3]);
                if a == b {
                    continue;
                }
                let key = adjacency::EdgeKey::new(a, b);
                if !seen.insert(key) {
                    continue;
                }
                if boundary[a as usize] || boundary[b as usize] {
                    continue;
                }
                let len = points[a as usize].distance_squared(points[b as usize]);
                if best.is_none_or(|(l, _, _)| len < l) {
                    best = Some((len, a, b));
                }
            }
        }
        let Some((_, keep, drop)) = best else {
            break;
        };

        points[keep as usize] = (points[keep as usize] + points[drop as usize]) * 0.5;
        forward[drop as usize] = keep;
        alive[drop as usize] = false;
        alive_count -= 1;

        // Drop triangles that degenerated.
        triangles.retain(|tri| {
            let a = resolve(&forward, tri[0]);
            let b = resolve(&forward, tri[1]);
            let c = resolve(&forward, tri[2]);
            a != b && b != c && a != c
        });
    }

    // Rebuild a compact container, carrying point attributes of the
    // surviving representatives.
    let mut out = GeometryContainer::new();
    out.adopt_attribute_layout(geo);
    let mut remap: Vec<Option<u32>> = vec![None; points.len()];
    let mut kept = 0usize;
    for (point, &is_alive) in alive.iter().enumerate() {
        if is_alive {
            remap[point] = Some(kept as u32);
            kept += 1;
        }
    }
    out.set_point_count(kept);
    for (point, slot) in remap.iter().enumerate() {
        if let Some(new) = slot {
            out.copy_element_attributes(ElementClass::Point, *new as usize, geo, point);
        }
    }
    if let Some(storage) = out.positions_mut() {
        for (point, slot) in remap.iter().enumerate() {
            if let Some(new) = slot {
                storage.set(*new as usize, points[point]);
            }
        }
    }
    for tri in &triangles {
        let a = remap[resolve(&forward, tri[0]) as usize].expect("alive");
        let b = remap[resolve(&forward, tri[1]) as usize].expect("alive");
        let c = remap[resolve(&forward, tri[2]) as usize].expect("alive");
        out.add_polygon(&[a, b, c]);
    }
    out
}
