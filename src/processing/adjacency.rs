//! Topological adjacency queries shared by the processing kernels.

use std::collections::HashMap;

use crate::geometry::GeometryContainer;

/// Undirected edge key with canonical ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Visit every (directed) edge of every primitive: consecutive point
/// pairs in winding order, closing back to the first corner.
pub fn for_each_primitive_edge(geo: &GeometryContainer, mut visit: impl FnMut(usize, u32, u32)) {
    let topology = geo.topology();
    for prim in 0..topology.primitive_count() {
        let points: Vec<u32> = topology.primitive_points(prim).collect();
        if points.len() < 2 {
            continue;
        }
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            visit(prim, a, b);
        }
    }
}

/// Per-point neighbor lists along primitive edges, deduplicated.
pub fn point_neighbors(geo: &GeometryContainer) -> Vec<Vec<u32>> {
    let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); geo.point_count()];
    for_each_primitive_edge(geo, |_, a, b| {
        if !neighbors[a as usize].contains(&b) {
            neighbors[a as usize].push(b);
        }
        if !neighbors[b as usize].contains(&a) {
            neighbors[b as usize].push(a);
        }
    });
    neighbors
}

/// Primitives incident to each point.
pub fn point_primitives(geo: &GeometryContainer) -> Vec<Vec<u32>> {
    let topology = geo.topology();
    let mut incident: Vec<Vec<u32>> = vec![Vec::new(); geo.point_count()];
    for prim in 0..topology.primitive_count() {
        for point in topology.primitive_points(prim) {
            let list = &mut incident[point as usize];
            if !list.contains(&(prim as u32)) {
                list.push(prim as u32);
            }
        }
    }
    incident
}

/// Undirected edge → number of primitives using it.
pub fn edge_use_counts(geo: &GeometryContainer) -> HashMap<EdgeKey, u32> {
    let mut counts = HashMap::new();
    for_each_primitive_edge(geo, |_, a, b| {
        *counts.entry(EdgeKey::new(a, b)).or_insert(0) += 1;
    });
    counts
}

/// Undirected edge → the primitives using it (at most recorded twice).
pub fn edge_primitives(geo: &GeometryContainer) -> HashMap<EdgeKey, Vec<u32>> {
    let mut map: HashMap<EdgeKey, Vec<u32>> = HashMap::new();
    for_each_primitive_edge(geo, |prim, a, b| {
        map.entry(EdgeKey::new(a, b)).or_default().push(prim as u32);
    });
    map
}

/// Directed boundary edges (used by exactly one primitive), in the
/// winding direction of the primitive that owns them.
pub fn boundary_edges(geo: &GeometryContainer) -> Vec<(u32, u32)> {
    let counts = edge_use_counts(geo);
    let mut boundary = Vec::new();
    for_each_primitive_edge(geo, |_, a, b| {
        if counts[&EdgeKey::new(a, b)] == 1 {
            boundary.push((a, b));
        }
    });
    boundary
}

/// Chain directed boundary edges into closed loops of point indices.
/// Open chains (non-manifold borders) are dropped.
pub fn boundary_loops(geo: &GeometryContainer) -> Vec<Vec<u32>> {
    let edges = boundary_edges(geo);
    // Boundary is traversed against the owning faces' winding so the fill
    // faces end up oriented like their neighbors.
    let mut successor: HashMap<u32, u32> = HashMap::new();
    for &(a, b) in &edges {
        successor.insert(b, a);
    }

    let mut visited: std::collections::HashSet<u32> = std::collections::HashSet::new();
    let mut loops = Vec::new();
    for &(_, start) in &edges {
        if visited.contains(&start) {
            continue;
        }
        let mut cycle = vec![start];
        visited.insert(start);
        let mut current = start;
        loop {
            let Some(&next) = successor.get(&current) else {
                cycle.clear();
                break;
            };
            if next == start {
                break;
            }
            if !visited.insert(next) {
                cycle.clear();
                break;
            }
            cycle.push(next);
            current = next;
        }
        if cycle.len() >= 3 {
            loops.push(cycle);
        }
    }
    loops
}

/// True when a point touches a boundary edge.
pub fn boundary_points(geo: &GeometryContainer) -> Vec<bool> {
    let mut flags = vec![false; geo.point_count()];
    for (a, b) in boundary_edges(geo) {
        flags[a as usize] = true;
        flags[b as usize] = true;
    }
    flags
}
