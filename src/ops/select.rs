//! Selection and reduction operators: Blast, Delete, Sort, Split.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use glam::Vec3;

use crate::attribute::{AttributeType, ElementClass};
use crate::error::{CookError, CookResult};
use crate::geometry::{group, GeometryContainer, GeometryHandle};
use crate::param::{bool_parameter, int_parameter, string_parameter, ParameterDefinition};
use crate::processing::components;
use crate::sop::{CookContext, Operator};

fn blast_class(index: i32) -> ElementClass {
    if index == 0 {
        ElementClass::Point
    } else {
        ElementClass::Primitive
    }
}

/// Delete the elements of a group (or everything else, with negate).
///
/// Degenerate inputs follow the permissive matrix: an empty group name
/// deletes the whole class (or nothing when negated); a missing group
/// deletes nothing (or everything when negated).
pub struct BlastSop;

impl Operator for BlastSop {
    fn type_name(&self) -> &'static str {
        "Blast"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("class", 0)
                .label("Class")
                .options(&["Points", "Primitives"])
                .category("Blast")
                .build(),
            bool_parameter("negate", false)
                .label("Delete Non-Selected")
                .category("Blast")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let class = blast_class(ctx.get("class", 0));
        let negate: bool = ctx.get("negate", false);
        let group_name = ctx.group_name().unwrap_or_default();

        let input = ctx.input_geometry(0)?;

        if group_name.is_empty() {
            if negate {
                // Nothing selected, delete the complement: keep all.
                return Ok(input.clone().into());
            }
            // Delete every element of the class.
            return Ok(match class {
                ElementClass::Point => GeometryContainer::new().into(),
                _ => {
                    let mut out = input.clone();
                    out.set_vertex_count(0);
                    out.set_primitive_count(0);
                    out.into()
                }
            });
        }

        if !group::has_group(input, &group_name, class) {
            if negate {
                return Ok(match class {
                    ElementClass::Point => GeometryContainer::new().into(),
                    _ => {
                        let mut out = input.clone();
                        out.set_vertex_count(0);
                        out.set_primitive_count(0);
                        out.into()
                    }
                });
            }
            return Ok(input.clone().into());
        }

        if !negate {
            return Ok(input.delete_elements(&group_name, class, true)?.into());
        }

        // Negate: delete everything NOT in the group.
        let mut scratch = input.clone();
        let inverted = format!("__blast_inverted_{group_name}");
        group::create_inverted_group(&mut scratch, &group_name, &inverted, class);
        if group::group_size(&scratch, &inverted, class) == 0 {
            return Ok(scratch.into());
        }
        Ok(scratch.delete_elements(&inverted, class, true)?.into())
    }
}

/// Delete elements selected by group, index range or every-Nth stride.
pub struct DeleteSop;

impl Operator for DeleteSop {
    fn type_name(&self) -> &'static str {
        "Delete"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("method", 0)
                .label("Method")
                .options(&["Group", "Range", "Every Nth"])
                .category("Delete")
                .build(),
            int_parameter("class", 0)
                .label("Class")
                .options(&["Points", "Primitives"])
                .category("Delete")
                .build(),
            string_parameter("range", "0-10")
                .label("Range")
                .category("Selection")
                .visible_when("method", 1)
                .build(),
            int_parameter("step", 2)
                .label("N")
                .int_range(2, 1000)
                .category("Selection")
                .visible_when("method", 2)
                .build(),
            bool_parameter("delete_orphaned_points", true)
                .label("Delete Orphaned Points")
                .category("Delete")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let method = ctx.get("method", 0);
        let class = blast_class(ctx.get("class", 0));
        let delete_orphans: bool = ctx.get("delete_orphaned_points", true);

        let input = ctx.input_geometry(0)?;
        let count = input.element_count(class);
        let doomed: Vec<usize> = match method {
            0 => {
                let Some(name) = ctx.group_name() else {
                    return Err(CookError::parameter_invalid(
                        "Delete in group mode needs the group parameter set",
                    ));
                };
                if !group::has_group(input, &name, class) {
                    return Err(CookError::parameter_invalid(format!(
                        "group '{name}' does not exist"
                    )));
                }
                group::group_elements(input, &name, class)
            }
            1 => {
                let ranges: String = ctx.get("range", String::new());
                super::groups::parse_index_ranges(&ranges, count)?
            }
            _ => {
                let step = ctx.get("step", 2).max(2) as usize;
                (0..count).step_by(step).collect()
            }
        };

        if doomed.is_empty() {
            return Ok(input.clone().into());
        }

        let mut scratch = input.clone();
        let selection = "__delete_selection";
        group::create_group(&mut scratch, selection, class);
        for element in doomed {
            group::add_to_group(&mut scratch, selection, class, element);
        }
        let mut result = scratch.delete_elements(selection, class, delete_orphans)?;
        result
            .attributes_mut(class)
            .remove(&group::group_attribute_name(selection));
        Ok(result.into())
    }
}

/// Reorder points or primitives.
pub struct SortSop;

impl Operator for SortSop {
    fn type_name(&self) -> &'static str {
        "Sort"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("class", 0)
                .label("Class")
                .options(&["Points", "Primitives"])
                .category("Sort")
                .build(),
            int_parameter("key", 0)
                .label("Key")
                .options(&[
                    "X Position",
                    "Y Position",
                    "Z Position",
                    "Reverse",
                    "Random",
                    "Attribute",
                ])
                .category("Sort")
                .build(),
            string_parameter("attribute", "")
                .label("Attribute")
                .category("Sort")
                .visible_when("key", 5)
                .build(),
            int_parameter("order", 0)
                .label("Order")
                .options(&["Ascending", "Descending"])
                .category("Sort")
                .build(),
            int_parameter("seed", 0)
                .label("Seed")
                .int_range(0, 1_000_000)
                .category("Sort")
                .visible_when("key", 4)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let class = blast_class(ctx.get("class", 0));
        let key = ctx.get("key", 0);
        let descending = ctx.get("order", 0) == 1;

        let input = ctx.input_geometry(0)?;
        let count = input.element_count(class);
        let mut permutation: Vec<usize> = (0..count).collect();

        // Element anchor position for the positional keys.
        let anchor = |element: usize| -> Vec3 {
            let Some(positions) = input.positions() else {
                return Vec3::ZERO;
            };
            match class {
                ElementClass::Point => *positions.get(element),
                _ => {
                    let corners: Vec<Vec3> = input
                        .topology()
                        .primitive_points(element)
                        .map(|p| *positions.get(p as usize))
                        .collect();
                    if corners.is_empty() {
                        Vec3::ZERO
                    } else {
                        corners.iter().sum::<Vec3>() / corners.len() as f32
                    }
                }
            }
        };

        match key {
            0 => permutation.sort_by_key(|&e| OrderedFloat(anchor(e).x)),
            1 => permutation.sort_by_key(|&e| OrderedFloat(anchor(e).y)),
            2 => permutation.sort_by_key(|&e| OrderedFloat(anchor(e).z)),
            3 => permutation.reverse(),
            4 => {
                let seed = ctx.get("seed", 0) as u64;
                let mut rng = StdRng::seed_from_u64(seed);
                permutation.shuffle(&mut rng);
            }
            _ => {
                let name: String = ctx.get("attribute", String::new());
                let set = input.attributes(class);
                if let Some(storage) = set.get_typed::<f32>(&name) {
                    permutation.sort_by_key(|&e| OrderedFloat(*storage.get(e)));
                } else if let Some(storage) = set.get_typed::<i32>(&name) {
                    permutation.sort_by_key(|&e| *storage.get(e));
                } else {
                    return Err(CookError::parameter_invalid(format!(
                        "sort attribute '{name}' is missing or not sortable"
                    )));
                }
            }
        }
        if descending && key != 3 && key != 4 {
            permutation.reverse();
        }

        let result = match class {
            ElementClass::Point => reorder_points(input, &permutation),
            _ => reorder_primitives(input, &permutation),
        };
        Ok(result.into())
    }
}

/// Rebuild with points in `permutation` order (new index -> old index).
fn reorder_points(geo: &GeometryContainer, permutation: &[usize]) -> GeometryContainer {
    let mut out = geo.clone();
    let mut inverse = vec![0u32; permutation.len()];
    for (new_index, &old_index) in permutation.iter().enumerate() {
        inverse[old_index] = new_index as u32;
        out.copy_element_attributes(ElementClass::Point, new_index, geo, old_index);
    }
    let topology = out.topology_mut();
    for vertex in 0..topology.vertex_count() {
        let old_point = geo.topology().vertex_point(vertex);
        topology.set_vertex_point(vertex, inverse[old_point as usize]);
    }
    out
}

/// Rebuild with primitives in `permutation` order.
fn reorder_primitives(geo: &GeometryContainer, permutation: &[usize]) -> GeometryContainer {
    let mut out = GeometryContainer::new();
    out.adopt_attribute_layout(geo);
    out.set_point_count(geo.point_count());
    for point in 0..geo.point_count() {
        out.copy_element_attributes(ElementClass::Point, point, geo, point);
    }
    for &old_prim in permutation {
        let mut vertices = Vec::new();
        for &old_vertex in geo.topology().primitive_vertices(old_prim) {
            let vertex = out.add_vertex(geo.topology().vertex_point(old_vertex as usize));
            out.copy_element_attributes(ElementClass::Vertex, vertex, geo, old_vertex as usize);
            vertices.push(vertex as u32);
        }
        let prim = out.add_primitive(vertices);
        out.copy_element_attributes(ElementClass::Primitive, prim, geo, old_prim);
    }
    out
}

/// Label disconnected pieces: a `piece` primitive attribute and one
/// primitive group per piece.
pub struct SplitSop;

impl Operator for SplitSop {
    fn type_name(&self) -> &'static str {
        "Split"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("method", 0)
                .label("Method")
                .options(&["Connectivity", "Attribute"])
                .category("Split")
                .build(),
            string_parameter("attribute", "")
                .label("Attribute")
                .category("Split")
                .visible_when("method", 1)
                .build(),
            int_parameter("create_groups", 1)
                .label("Create Groups")
                .options(&["Off", "On"])
                .category("Split")
                .build(),
            int_parameter("add_piece_attribute", 1)
                .label("Piece Attribute")
                .options(&["Off", "On"])
                .category("Split")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let method = ctx.get("method", 0);
        let create_groups = ctx.get("create_groups", 1) != 0;
        let add_piece = ctx.get("add_piece_attribute", 1) != 0;

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");

        let labels: Vec<usize> = match method {
            0 => components::primitive_components(geo).0,
            _ => {
                let name: String = ctx.get("attribute", String::new());
                let Some(storage) = geo.primitive_attributes().get_typed::<i32>(&name) else {
                    return Err(CookError::parameter_invalid(format!(
                        "split attribute '{name}' is missing or not an int attribute"
                    )));
                };
                // Dense labels in first-seen value order.
                let mut dense: std::collections::HashMap<i32, usize> =
                    std::collections::HashMap::new();
                storage
                    .iter()
                    .map(|&value| {
                        let next = dense.len();
                        *dense.entry(value).or_insert(next)
                    })
                    .collect()
            }
        };

        if add_piece {
            geo.add_primitive_attribute("piece", AttributeType::Int);
            let storage = geo
                .get_primitive_attribute_typed_mut::<i32>("piece")
                .ok_or_else(|| {
                    CookError::parameter_invalid("'piece' exists with a non-int type")
                })?;
            for (prim, &label) in labels.iter().enumerate() {
                storage.set(prim, label as i32);
            }
        }
        if create_groups {
            let piece_count = labels.iter().copied().max().map_or(0, |m| m + 1);
            for piece in 0..piece_count {
                group::create_group(geo, &format!("piece_{piece}"), ElementClass::Primitive);
            }
            for (prim, &label) in labels.iter().enumerate() {
                group::add_to_group(
                    geo,
                    &format!("piece_{label}"),
                    ElementClass::Primitive,
                    prim,
                );
            }
        }
        Ok(output)
    }
}
