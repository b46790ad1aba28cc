//! Wavefront OBJ import and export.
//!
//! Import recovers positions, optional vertex normals and faces
//! (triangles or n-gons; `v`, `v/vt`, `v//vn` and `v/vt/vn` index
//! forms). Export emits `v`, optional `vn` and `f` lines, using the
//! `v//vn` face syntax when normals are present so hard edges survive a
//! round trip through external tools.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Vec3;

use crate::geometry::GeometryContainer;

/// Read an OBJ file into a fresh container.
pub fn import_obj(path: &Path) -> Result<GeometryContainer> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    parse_obj(&text)
}

/// Parse OBJ text into a container.
pub fn parse_obj(text: &str) -> Result<GeometryContainer> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    // Faces as (point index, optional normal index) per corner.
    let mut faces: Vec<Vec<(usize, Option<usize>)>> = Vec::new();

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut component = |label| {
                    fields
                        .next()
                        .and_then(|f| f.parse::<f32>().ok())
                        .with_context(|| {
                            format!("line {}: bad {label} coordinate", line_number + 1)
                        })
                };
                positions.push(Vec3::new(component("x")?, component("y")?, component("z")?));
            }
            Some("vn") => {
                let mut component = |label| {
                    fields
                        .next()
                        .and_then(|f| f.parse::<f32>().ok())
                        .with_context(|| {
                            format!("line {}: bad normal {label}", line_number + 1)
                        })
                };
                normals.push(Vec3::new(component("x")?, component("y")?, component("z")?));
            }
            Some("f") => {
                let mut corners = Vec::new();
                for field in fields {
                    let mut parts = field.split('/');
                    let point: i64 = parts
                        .next()
                        .and_then(|p| p.parse().ok())
                        .with_context(|| {
                            format!("line {}: bad face index '{field}'", line_number + 1)
                        })?;
                    let _texture = parts.next(); // v/vt — texture indices unused
                    let normal: Option<usize> = parts
                        .next()
                        .filter(|p| !p.is_empty())
                        .and_then(|p| p.parse::<i64>().ok())
                        .map(|n| resolve_index(n, normals.len()))
                        .transpose()
                        .with_context(|| {
                            format!("line {}: bad normal index '{field}'", line_number + 1)
                        })?;
                    let point = resolve_index(point, positions.len()).with_context(|| {
                        format!("line {}: face index out of range", line_number + 1)
                    })?;
                    corners.push((point, normal));
                }
                if corners.len() < 3 {
                    bail!("line {}: face with fewer than 3 corners", line_number + 1);
                }
                faces.push(corners);
            }
            // Groups, materials, smoothing and the rest are ignored.
            _ => {}
        }
    }

    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(positions.len());
    {
        let storage = geo.positions_mut().expect("ensured above");
        for (point, p) in positions.iter().enumerate() {
            storage.set(point, *p);
        }
    }
    let has_normals = faces
        .iter()
        .any(|face| face.iter().any(|(_, n)| n.is_some()));
    if has_normals {
        geo.ensure_vertex_normals();
    }
    for face in &faces {
        let points: Vec<u32> = face.iter().map(|(p, _)| *p as u32).collect();
        let prim = geo.add_polygon(&points);
        if has_normals {
            let vertices: Vec<u32> = geo.topology().primitive_vertices(prim).to_vec();
            let storage = geo.vertex_normals_mut().expect("ensured above");
            for (&vertex, (_, normal)) in vertices.iter().zip(face) {
                if let Some(n) = normal {
                    storage.set(vertex as usize, normals[*n]);
                }
            }
        }
    }
    Ok(geo)
}

/// OBJ indices are 1-based; negative values count from the end.
fn resolve_index(index: i64, count: usize) -> Result<usize> {
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        count as i64 + index
    } else {
        bail!("OBJ indices are 1-based; found 0");
    };
    if resolved < 0 || resolved as usize >= count {
        bail!("index {index} out of range (count {count})");
    }
    Ok(resolved as usize)
}

/// Serialize a container to OBJ text.
pub fn geometry_to_obj_string(geo: &GeometryContainer) -> Result<String> {
    let Some(positions) = geo.positions() else {
        bail!("geometry has no position attribute");
    };
    let mut out = String::new();
    let _ = writeln!(out, "# meshforge OBJ export");
    let _ = writeln!(
        out,
        "# {} points, {} primitives",
        geo.point_count(),
        geo.primitive_count()
    );

    for p in positions.iter() {
        let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
    }

    // Prefer split vertex normals; fall back to shared point normals.
    let vertex_normals = geo.vertex_normals();
    let point_normals = geo.point_normals();
    if let Some(normals) = vertex_normals {
        for n in normals.iter() {
            let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
        }
    } else if let Some(normals) = point_normals {
        for n in normals.iter() {
            let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
        }
    }

    let topology = geo.topology();
    for prim in 0..topology.primitive_count() {
        let mut line = String::from("f");
        for &vertex in topology.primitive_vertices(prim) {
            let point = topology.vertex_point(vertex as usize);
            if vertex_normals.is_some() {
                let _ = write!(line, " {}//{}", point + 1, vertex + 1);
            } else if point_normals.is_some() {
                let _ = write!(line, " {}//{}", point + 1, point + 1);
            } else {
                let _ = write!(line, " {}", point + 1);
            }
        }
        let _ = writeln!(out, "{line}");
    }
    Ok(out)
}

/// Write a container to an OBJ file.
pub fn export_obj(geo: &GeometryContainer, path: &Path) -> Result<()> {
    let text = geometry_to_obj_string(geo)?;
    fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display()))
}
