//! Connected-component labeling over shared points.

use crate::geometry::GeometryContainer;

/// Union-find over point indices.
struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            // Path halving keeps trees flat.
            self.parent[x as usize] = self.parent[self.parent[x as usize] as usize];
            x = self.parent[x as usize];
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb as usize] = ra;
        }
    }
}

/// Per-primitive component labels (0-based, dense) plus the component
/// count. Two primitives share a component when they share a point,
/// transitively.
pub fn primitive_components(geo: &GeometryContainer) -> (Vec<usize>, usize) {
    let topology = geo.topology();
    let mut points = DisjointSet::new(geo.point_count());
    for prim in 0..topology.primitive_count() {
        let mut corners = topology.primitive_points(prim);
        if let Some(first) = corners.next() {
            for point in corners {
                points.union(first, point);
            }
        }
    }

    // Densely relabel component roots in first-seen order.
    let mut labels = Vec::with_capacity(topology.primitive_count());
    let mut dense: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
    for prim in 0..topology.primitive_count() {
        let root = match topology.primitive_points(prim).next() {
            Some(point) => points.find(point),
            None => u32::MAX,
        };
        let next = dense.len();
        let label = *dense.entry(root).or_insert(next);
        labels.push(label);
    }
    (labels, dense.len())
}
