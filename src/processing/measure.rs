//! Surface measurements: discrete curvature and geodesic distance.

use std::collections::BinaryHeap;

use glam::Vec3;
use ordered_float::OrderedFloat;

use crate::geometry::GeometryContainer;
use crate::processing::{adjacency, sampling};

/// Discrete Gaussian curvature per point: the angle deficit
/// `2π − Σ incident corner angles`, normalized by a third of the
/// incident triangle area.
pub fn gaussian_curvature(geo: &GeometryContainer) -> Vec<f32> {
    let point_count = geo.point_count();
    let Some(positions) = geo.positions() else {
        return vec![0.0; point_count];
    };
    let mut angle_sum = vec![0.0f32; point_count];
    let mut area_sum = vec![0.0f32; point_count];

    for tri in sampling::triangulate(geo) {
        let [a, b, c] = tri.points;
        let pa = *positions.get(a as usize);
        let pb = *positions.get(b as usize);
        let pc = *positions.get(c as usize);
        let area = sampling::triangle_area(pa, pb, pc);
        let mut corner = |p: u32, e1: Vec3, e2: Vec3| {
            angle_sum[p as usize] += e1.angle_between(e2);
            area_sum[p as usize] += area / 3.0;
        };
        corner(a, pb - pa, pc - pa);
        corner(b, pa - pb, pc - pb);
        corner(c, pa - pc, pb - pc);
    }

    (0..point_count)
        .map(|p| {
            let deficit = 2.0 * std::f32::consts::PI - angle_sum[p];
            if area_sum[p] > 1e-12 {
                deficit / area_sum[p]
            } else {
                0.0
            }
        })
        .collect()
}

/// Mean-curvature magnitude per point: half the norm of the uniform
/// Laplacian, normalized by average edge length.
pub fn mean_curvature(geo: &GeometryContainer) -> Vec<f32> {
    let point_count = geo.point_count();
    let Some(positions) = geo.positions() else {
        return vec![0.0; point_count];
    };
    let neighbors = adjacency::point_neighbors(geo);
    (0..point_count)
        .map(|p| {
            if neighbors[p].is_empty() {
                return 0.0;
            }
            let center = *positions.get(p);
            let mut sum = Vec3::ZERO;
            let mut edge_total = 0.0;
            for &n in &neighbors[p] {
                let q = *positions.get(n as usize);
                sum += q - center;
                edge_total += q.distance(center);
            }
            let avg_edge = edge_total / neighbors[p].len() as f32;
            if avg_edge > 1e-12 {
                0.5 * (sum / neighbors[p].len() as f32).length() / avg_edge
            } else {
                0.0
            }
        })
        .collect()
}

/// Dijkstra geodesic distance over the edge graph from a set of seed
/// points. Unreachable points get `f32::INFINITY`; `max_distance > 0`
/// stops the expansion beyond that radius.
pub fn geodesic_distance(
    geo: &GeometryContainer,
    seeds: &[usize],
    max_distance: f32,
) -> Vec<f32> {
    let point_count = geo.point_count();
    let mut distance = vec![f32::INFINITY; point_count];
    let Some(positions) = geo.positions() else {
        return distance;
    };
    let neighbors = adjacency::point_neighbors(geo);

    // Min-heap of (distance, point).
    let mut heap: BinaryHeap<std::cmp::Reverse<(OrderedFloat<f32>, u32)>> = BinaryHeap::new();
    for &seed in seeds {
        if seed < point_count {
            distance[seed] = 0.0;
            heap.push(std::cmp::Reverse((OrderedFloat(0.0), seed as u32)));
        }
    }

    while let Some(std::cmp::Reverse((OrderedFloat(d), point))) = heap.pop() {
        if d > distance[point as usize] {
            continue;
        }
        if max_distance > 0.0 && d > max_distance {
            continue;
        }
        for &n in &neighbors[point as usize] {
            let step = positions
                .get(point as usize)
                .distance(*positions.get(n as usize));
            let candidate = d + step;
            if candidate < distance[n as usize] {
                distance[n as usize] = candidate;
                heap.push(std::cmp::Reverse((OrderedFloat(candidate), n)));
            }
        }
    }
    distance
}
