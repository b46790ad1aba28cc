//! Laplacian mesh smoothing (explicit integration).

use glam::Vec3;

use crate::geometry::GeometryContainer;
use crate::math::Aabb;
use crate::processing::{adjacency, sampling};

/// Which discrete Laplacian to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaplacianWeights {
    /// Combinatorial: every neighbor weighs the same.
    Uniform,
    /// Cotangent weights from the triangulated surface.
    Cotangent,
}

/// Explicit Laplacian smoothing: `iterations` steps of
/// `p += lambda * L(p)` over the selected points (all points when
/// `selected` is `None`).
pub fn laplacian_smooth(
    geo: &mut GeometryContainer,
    weights: LaplacianWeights,
    iterations: usize,
    lambda: f32,
    selected: Option<&[bool]>,
) {
    let point_count = geo.point_count();
    if point_count == 0 || geo.positions().is_none() {
        return;
    }
    let neighbors = adjacency::point_neighbors(geo);

    for _ in 0..iterations {
        let positions: Vec<Vec3> = geo.positions().expect("checked above").as_slice().to_vec();
        let edge_weights = match weights {
            LaplacianWeights::Uniform => None,
            LaplacianWeights::Cotangent => Some(cotangent_weights(geo, &positions)),
        };

        let storage = geo.positions_mut().expect("checked above");
        for point in 0..point_count {
            if selected.is_some_and(|mask| !mask[point]) {
                continue;
            }
            if neighbors[point].is_empty() {
                continue;
            }
            let laplacian = match &edge_weights {
                None => {
                    let sum: Vec3 = neighbors[point]
                        .iter()
                        .map(|&n| positions[n as usize])
                        .sum();
                    sum / neighbors[point].len() as f32 - positions[point]
                }
                Some(weights) => {
                    let mut sum = Vec3::ZERO;
                    let mut total = 0.0;
                    for &n in &neighbors[point] {
                        let w = weights
                            .get(&adjacency::EdgeKey::new(point as u32, n))
                            .copied()
                            .unwrap_or(0.0)
                            .max(0.0);
                        sum += (positions[n as usize] - positions[point]) * w;
                        total += w;
                    }
                    if total <= f32::EPSILON {
                        Vec3::ZERO
                    } else {
                        sum / total
                    }
                }
            };
            storage.set(point, positions[point] + laplacian * lambda);
        }
    }
}

/// Rescale and recenter positions so the bounding box matches `target`.
/// Used by smoothing's `rescale` option to undo shrinkage.
pub fn rescale_to_bounds(geo: &mut GeometryContainer, target: Aabb) {
    if target.is_empty() {
        return;
    }
    let current = geo.bounding_box();
    if current.is_empty() {
        return;
    }
    let current_extent = current.extent().max(Vec3::splat(1e-12));
    let scale = target.extent() / current_extent;
    let current_center = current.center();
    let target_center = target.center();
    if let Some(storage) = geo.positions_mut() {
        for p in storage.as_mut_slice() {
            *p = (*p - current_center) * scale + target_center;
        }
    }
}

/// Per-undirected-edge cotangent weights accumulated over the
/// triangulated surface.
fn cotangent_weights(
    geo: &GeometryContainer,
    positions: &[Vec3],
) -> std::collections::HashMap<adjacency::EdgeKey, f32> {
    let mut weights = std::collections::HashMap::new();
    for tri in sampling::triangulate(geo) {
        let [a, b, c] = tri.points;
        let pa = positions[a as usize];
        let pb = positions[b as usize];
        let pc = positions[c as usize];
        // The angle at each corner weights the opposite edge.
        let mut add = |opposite_a: u32, opposite_b: u32, ea: Vec3, eb: Vec3| {
            let cross = ea.cross(eb).length();
            if cross > 1e-12 {
                let cot = ea.dot(eb) / cross;
                *weights
                    .entry(adjacency::EdgeKey::new(opposite_a, opposite_b))
                    .or_insert(0.0) += 0.5 * cot;
            }
        };
        add(b, c, pb - pa, pc - pa);
        add(a, c, pa - pb, pc - pb);
        add(a, b, pa - pc, pb - pc);
    }
    weights
}
