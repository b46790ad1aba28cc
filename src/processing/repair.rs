//! Hole filling: detect boundary loops and cap them.

use glam::Vec3;

use crate::geometry::GeometryContainer;
use crate::processing::adjacency;

/// Fill boundary loops whose length lies within `[min_size, max_size]`
/// corners (0 disables a bound). With `refine_fill` each hole gets a
/// centroid point and a triangle fan; otherwise a single n-gon caps it.
/// Returns the number of holes filled.
pub fn fill_holes(
    geo: &mut GeometryContainer,
    min_size: usize,
    max_size: usize,
    refine_fill: bool,
) -> usize {
    let loops = adjacency::boundary_loops(geo);
    let mut filled = 0;
    for cycle in loops {
        if min_size > 0 && cycle.len() < min_size {
            continue;
        }
        if max_size > 0 && cycle.len() > max_size {
            continue;
        }
        if refine_fill {
            fill_with_fan(geo, &cycle);
        } else {
            geo.add_polygon(&cycle);
        }
        filled += 1;
    }
    filled
}

/// Cap a loop with a centroid point and one triangle per boundary edge.
/// The centroid's attributes blend equally from the rim points.
fn fill_with_fan(geo: &mut GeometryContainer, cycle: &[u32]) {
    let centroid = {
        let positions = geo.positions().expect("mesh with boundary has positions");
        cycle
            .iter()
            .map(|&p| *positions.get(p as usize))
            .sum::<Vec3>()
            / cycle.len() as f32
    };

    let sources: Vec<usize> = cycle.iter().map(|&p| p as usize).collect();
    let weights = vec![1.0 / sources.len() as f32; sources.len()];
    let rim_attrs = geo.point_attributes().clone();

    let center = geo.point_count();
    geo.set_point_count(center + 1);
    geo.point_attributes_mut()
        .blend_element_from(center, &rim_attrs, &sources, &weights);
    geo.positions_mut()
        .expect("mesh with boundary has positions")
        .set(center, centroid);

    for i in 0..cycle.len() {
        let a = cycle[i];
        let b = cycle[(i + 1) % cycle.len()];
        geo.add_polygon(&[a, b, center as u32]);
    }
}
