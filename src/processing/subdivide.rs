//! Catmull-Clark subdivision.
//!
//! One pass turns every n-gon into n quads around a face point, with the
//! classic smoothing rules: face points average their corners, interior
//! edge points average the edge endpoints and the two adjacent face
//! points, and original points move to `(Q + 2R + (n-3)P) / n`. Boundary
//! edges and points use the cubic B-spline boundary rules, so open
//! surfaces stay open.
//!
//! Point attributes interpolate with the same structural weights the
//! positions use; vertex attributes blend within each parent face, so
//! UV seams survive; primitive attributes copy from the parent face.

use std::collections::HashMap;

use glam::Vec3;

use crate::attribute::ElementClass;
use crate::geometry::GeometryContainer;
use crate::processing::adjacency::{self, EdgeKey};

/// Apply `levels` rounds of Catmull-Clark.
pub fn catmull_clark(geo: &GeometryContainer, levels: usize) -> GeometryContainer {
    let mut current = geo.clone();
    for _ in 0..levels.max(1) {
        current = subdivide_once(&current);
    }
    current
}

fn subdivide_once(geo: &GeometryContainer) -> GeometryContainer {
    let topology = geo.topology();
    let point_count = geo.point_count();
    let prim_count = topology.primitive_count();
    let positions: Vec<Vec3> = match geo.positions() {
        Some(p) => p.as_slice().to_vec(),
        None => return geo.clone(),
    };

    let edge_faces = adjacency::edge_primitives(geo);
    let face_corners: Vec<Vec<u32>> = (0..prim_count)
        .map(|prim| topology.primitive_points(prim).collect())
        .collect();

    // Face points: centroid of the face's corners.
    let face_point_pos: Vec<Vec3> = face_corners
        .iter()
        .map(|corners| {
            corners.iter().map(|&p| positions[p as usize]).sum::<Vec3>()
                / corners.len().max(1) as f32
        })
        .collect();

    // Edge points: midpoint on boundaries, edge+face average inside.
    let mut edge_point_pos: HashMap<EdgeKey, Vec3> = HashMap::new();
    for (&edge, faces) in &edge_faces {
        let mid = (positions[edge.0 as usize] + positions[edge.1 as usize]) * 0.5;
        let value = if faces.len() == 2 {
            let f = (face_point_pos[faces[0] as usize] + face_point_pos[faces[1] as usize]) * 0.5;
            (mid + f) * 0.5
        } else {
            mid
        };
        edge_point_pos.insert(edge, value);
    }

    // Moved original points.
    let mut point_edges: Vec<Vec<EdgeKey>> = vec![Vec::new(); point_count];
    for &edge in edge_faces.keys() {
        point_edges[edge.0 as usize].push(edge);
        point_edges[edge.1 as usize].push(edge);
    }
    let incident_faces = adjacency::point_primitives(geo);
    let moved: Vec<Vec3> = (0..point_count)
        .map(|point| {
            let edges = &point_edges[point];
            let faces = &incident_faces[point];
            if edges.is_empty() || faces.is_empty() {
                return positions[point];
            }
            let boundary: Vec<EdgeKey> = edges
                .iter()
                .copied()
                .filter(|e| edge_faces[e].len() == 1)
                .collect();
            if !boundary.is_empty() {
                // Boundary rule: 3/4 the point, 1/8 each boundary neighbor.
                if boundary.len() == 2 {
                    let other = |e: EdgeKey| {
                        if e.0 as usize == point { e.1 } else { e.0 }
                    };
                    let a = positions[other(boundary[0]) as usize];
                    let b = positions[other(boundary[1]) as usize];
                    return positions[point] * 0.75 + (a + b) * 0.125;
                }
                return positions[point];
            }
            let n = edges.len() as f32;
            let q: Vec3 = faces
                .iter()
                .map(|&f| face_point_pos[f as usize])
                .sum::<Vec3>()
                / faces.len() as f32;
            let r: Vec3 = edges
                .iter()
                .map(|e| (positions[e.0 as usize] + positions[e.1 as usize]) * 0.5)
                .sum::<Vec3>()
                / n;
            (q + r * 2.0 + positions[point] * (n - 3.0)) / n
        })
        .collect();

    // Assemble the refined mesh: original points first, then face
    // points, then edge points.
    let mut out = GeometryContainer::new();
    out.adopt_attribute_layout(geo);

    let face_base = point_count;
    let edge_base = face_base + prim_count;
    let edge_order: Vec<EdgeKey> = {
        let mut keys: Vec<EdgeKey> = edge_point_pos.keys().copied().collect();
        keys.sort();
        keys
    };
    let edge_index: HashMap<EdgeKey, usize> = edge_order
        .iter()
        .enumerate()
        .map(|(i, &e)| (e, edge_base + i))
        .collect();

    out.set_point_count(edge_base + edge_order.len());
    out.ensure_position_attribute();

    // Point attribute transfer mirrors the position rules.
    for point in 0..point_count {
        out.copy_element_attributes(ElementClass::Point, point, geo, point);
    }
    for (prim, corners) in face_corners.iter().enumerate() {
        let sources: Vec<usize> = corners.iter().map(|&p| p as usize).collect();
        let weights = vec![1.0 / sources.len() as f32; sources.len()];
        out.blend_element_attributes(ElementClass::Point, face_base + prim, geo, &sources, &weights);
    }
    for (i, edge) in edge_order.iter().enumerate() {
        out.blend_element_attributes(
            ElementClass::Point,
            edge_base + i,
            geo,
            &[edge.0 as usize, edge.1 as usize],
            &[0.5, 0.5],
        );
    }

    {
        let storage = out.positions_mut().expect("ensured above");
        for (point, &p) in moved.iter().enumerate() {
            storage.set(point, p);
        }
        for (prim, &p) in face_point_pos.iter().enumerate() {
            storage.set(face_base + prim, p);
        }
        for (i, edge) in edge_order.iter().enumerate() {
            storage.set(edge_base + i, edge_point_pos[edge]);
        }
    }

    // One quad per original corner: corner, next edge, face, previous
    // edge. Vertex attributes blend from the parent face's vertices.
    for prim in 0..prim_count {
        let corners = &face_corners[prim];
        let n = corners.len();
        if n < 3 {
            continue;
        }
        let parent_vertices: Vec<u32> = topology.primitive_vertices(prim).to_vec();
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let corner_point = corners[i];
            let edge_next = edge_index[&EdgeKey::new(corners[i], corners[next])] as u32;
            let edge_prev = edge_index[&EdgeKey::new(corners[prev], corners[i])] as u32;
            let face_point = (face_base + prim) as u32;

            let quad_points = [corner_point, edge_next, face_point, edge_prev];
            // Per-corner blend weights within the parent face.
            let corner_sources = [
                (vec![parent_vertices[i] as usize], vec![1.0]),
                (
                    vec![parent_vertices[i] as usize, parent_vertices[next] as usize],
                    vec![0.5, 0.5],
                ),
                (
                    parent_vertices.iter().map(|&v| v as usize).collect(),
                    vec![1.0 / n as f32; n],
                ),
                (
                    vec![parent_vertices[prev] as usize, parent_vertices[i] as usize],
                    vec![0.5, 0.5],
                ),
            ];

            let mut quad_vertices = Vec::with_capacity(4);
            for (point, (sources, weights)) in quad_points.iter().zip(corner_sources) {
                let vertex = out.add_vertex(*point);
                out.blend_element_attributes(ElementClass::Vertex, vertex, geo, &sources, &weights);
                quad_vertices.push(vertex as u32);
            }
            let new_prim = out.add_primitive(quad_vertices);
            out.copy_element_attributes(ElementClass::Primitive, new_prim, geo, prim);
        }
    }

    out
}
