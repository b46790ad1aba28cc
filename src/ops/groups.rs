//! Group operators: create, delete, combine, promote, expand, transfer.

use glam::Vec3;

use crate::attribute::ElementClass;
use crate::error::{CookError, CookResult};
use crate::geometry::{group, GeometryHandle};
use crate::param::{
    code_parameter, float_parameter, int_parameter, string_parameter, vector3_parameter,
    ParameterDefinition,
};
use crate::sop::{CookContext, InputConfig, Operator};
use crate::wrangle;

fn group_class(index: i32) -> ElementClass {
    if index == 0 {
        ElementClass::Point
    } else {
        ElementClass::Primitive
    }
}

/// Create a group by index range, bounding box or expression.
pub struct GroupSop;

impl Operator for GroupSop {
    fn type_name(&self) -> &'static str {
        "Group"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("group_name", "group1")
                .label("Group Name")
                .category("Group")
                .build(),
            int_parameter("element_class", 0)
                .label("Group Type")
                .options(&["Points", "Primitives"])
                .category("Group")
                .description("Type of geometry elements to group")
                .build(),
            int_parameter("method", 0)
                .label("Method")
                .options(&["All", "Range", "Bounding Box", "Expression"])
                .category("Group")
                .build(),
            string_parameter("range", "0-10")
                .label("Range")
                .category("Selection")
                .description("Index ranges like 0-10, 4, 12-40:2, comma separated")
                .visible_when("method", 1)
                .build(),
            vector3_parameter("bounds_min", Vec3::splat(-0.5))
                .label("Bounds Min")
                .category("Selection")
                .visible_when("method", 2)
                .build(),
            vector3_parameter("bounds_max", Vec3::splat(0.5))
                .label("Bounds Max")
                .category("Selection")
                .visible_when("method", 2)
                .build(),
            code_parameter("expression", "@P.y > 0.0")
                .label("Expression")
                .category("Selection")
                .description("Element joins the group when the expression is non-zero")
                .visible_when("method", 3)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let name: String = ctx.get("group_name", String::new());
        if name.is_empty() {
            return Err(CookError::parameter_invalid("group name is empty"));
        }
        let class = group_class(ctx.get("element_class", 0));
        let method = ctx.get("method", 0);

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        let count = geo.element_count(class);
        group::create_group(geo, &name, class);

        let members: Vec<usize> = match method {
            0 => (0..count).collect(),
            1 => {
                let ranges: String = ctx.get("range", String::new());
                parse_index_ranges(&ranges, count)?
            }
            2 => {
                let min: Vec3 = ctx.get("bounds_min", Vec3::splat(-0.5));
                let max: Vec3 = ctx.get("bounds_max", Vec3::splat(0.5));
                elements_in_bounds(geo, class, min, max)
            }
            _ => {
                let source: String = ctx.get("expression", String::new());
                let program = wrangle::parse_expression(&source).map_err(|e| {
                    CookError::parameter_invalid(format!("group expression error: {e}"))
                })?;
                let channels = std::collections::HashMap::new();
                let mut members = Vec::new();
                for element in 0..count {
                    let value =
                        wrangle::eval_predicate(geo, class, element, &program, &channels)
                            .map_err(|e| {
                                CookError::algorithm_failure(format!(
                                    "group expression failed: {e}"
                                ))
                            })?;
                    if value != 0.0 {
                        members.push(element);
                    }
                }
                members
            }
        };

        for element in members {
            group::add_to_group(geo, &name, class, element);
        }
        Ok(output)
    }
}

/// Parse "0-10, 14, 20-40:2" style index range expressions.
pub(crate) fn parse_index_ranges(ranges: &str, count: usize) -> CookResult<Vec<usize>> {
    let pattern = regex::Regex::new(r"^\s*(\d+)(?:\s*-\s*(\d+))?(?::(\d+))?\s*$")
        .expect("static pattern compiles");
    let mut members = Vec::new();
    for part in ranges.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let captures = pattern.captures(part).ok_or_else(|| {
            CookError::parameter_invalid(format!("malformed index range '{part}'"))
        })?;
        let start: usize = captures[1].parse().unwrap_or(0);
        let end: usize = captures
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(start))
            .unwrap_or(start);
        let step: usize = captures
            .get(3)
            .map(|m| m.as_str().parse().unwrap_or(1))
            .unwrap_or(1)
            .max(1);
        let mut index = start;
        while index <= end && index < count {
            members.push(index);
            index += step;
        }
    }
    Ok(members)
}

fn elements_in_bounds(
    geo: &crate::geometry::GeometryContainer,
    class: ElementClass,
    min: Vec3,
    max: Vec3,
) -> Vec<usize> {
    let inside = |p: Vec3| {
        p.x >= min.x && p.y >= min.y && p.z >= min.z && p.x <= max.x && p.y <= max.y && p.z <= max.z
    };
    let Some(positions) = geo.positions() else {
        return Vec::new();
    };
    match class {
        ElementClass::Point => (0..geo.point_count())
            .filter(|&p| inside(*positions.get(p)))
            .collect(),
        ElementClass::Primitive => (0..geo.primitive_count())
            .filter(|&prim| {
                // A primitive is inside when all of its points are.
                geo.topology()
                    .primitive_points(prim)
                    .all(|p| inside(*positions.get(p as usize)))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Delete groups matching a wildcard pattern.
pub struct GroupDeleteSop;

impl Operator for GroupDeleteSop {
    fn type_name(&self) -> &'static str {
        "GroupDelete"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("pattern", "*")
                .label("Pattern")
                .category("Group")
                .build(),
            int_parameter("element_class", 0)
                .label("Group Type")
                .options(&["Points", "Primitives"])
                .category("Group")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let pattern_text: String = ctx.get("pattern", String::from("*"));
        let pattern = glob::Pattern::new(&pattern_text).map_err(|e| {
            CookError::parameter_invalid(format!("invalid pattern '{pattern_text}': {e}"))
        })?;
        let class = group_class(ctx.get("element_class", 0));

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        for name in group::list_groups(geo, class) {
            if pattern.matches(&name) {
                geo.attributes_mut(class)
                    .remove(&group::group_attribute_name(&name));
            }
        }
        Ok(output)
    }
}

/// Combine two groups with set algebra into an output group.
pub struct GroupCombineSop;

impl Operator for GroupCombineSop {
    fn type_name(&self) -> &'static str {
        "GroupCombine"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("group_a", "group1")
                .label("Group A")
                .category("Group")
                .build(),
            string_parameter("group_b", "group2")
                .label("Group B")
                .category("Group")
                .build(),
            int_parameter("operation", 0)
                .label("Operation")
                .options(&["Union", "Intersect", "Subtract", "Xor"])
                .category("Group")
                .build(),
            string_parameter("output_group", "combined")
                .label("Output Group")
                .category("Group")
                .build(),
            int_parameter("element_class", 0)
                .label("Group Type")
                .options(&["Points", "Primitives"])
                .category("Group")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let group_a: String = ctx.get("group_a", String::new());
        let group_b: String = ctx.get("group_b", String::new());
        let output_group: String = ctx.get("output_group", String::new());
        if output_group.is_empty() {
            return Err(CookError::parameter_invalid("output group name is empty"));
        }
        let op = group::GroupOp::from_index(ctx.get("operation", 0));
        let class = group_class(ctx.get("element_class", 0));

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        group::combine_groups(geo, &group_a, &group_b, &output_group, class, op);
        Ok(output)
    }
}

/// Promote a group between element classes.
pub struct GroupPromoteSop;

impl Operator for GroupPromoteSop {
    fn type_name(&self) -> &'static str {
        "GroupPromote"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("group_name", "group1")
                .label("Group Name")
                .category("Group")
                .build(),
            int_parameter("from_class", 0)
                .label("From")
                .options(&["Points", "Primitives"])
                .category("Group")
                .build(),
            int_parameter("to_class", 1)
                .label("To")
                .options(&["Points", "Primitives"])
                .category("Group")
                .build(),
            int_parameter("mode", 0)
                .label("Mode")
                .options(&["Any", "All"])
                .category("Group")
                .description("Whether one member corner suffices or every corner must be a member")
                .build(),
            int_parameter("delete_original", 0)
                .label("Delete Original")
                .options(&["No", "Yes"])
                .category("Group")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let name: String = ctx.get("group_name", String::new());
        let from = group_class(ctx.get("from_class", 0));
        let to = group_class(ctx.get("to_class", 1));
        let require_all = ctx.get("mode", 0) == 1;
        let delete_original = ctx.get("delete_original", 0) != 0;

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        if !group::has_group(geo, &name, from) {
            return Err(CookError::parameter_invalid(format!(
                "group '{name}' does not exist on the {from} class"
            )));
        }
        if from == to {
            return Ok(output);
        }

        let members: Vec<usize> = match to {
            ElementClass::Primitive => (0..geo.primitive_count())
                .filter(|&prim| {
                    let mut corners = geo.topology().primitive_points(prim).peekable();
                    if corners.peek().is_none() {
                        return false;
                    }
                    let test =
                        |p: u32| group::is_in_group(geo, &name, ElementClass::Point, p as usize);
                    if require_all {
                        corners.all(test)
                    } else {
                        corners.any(test)
                    }
                })
                .collect(),
            _ => {
                let incident = crate::processing::adjacency::point_primitives(geo);
                (0..geo.point_count())
                    .filter(|&point| {
                        let prims = &incident[point];
                        if prims.is_empty() {
                            return false;
                        }
                        let test = |&prim: &u32| {
                            group::is_in_group(geo, &name, ElementClass::Primitive, prim as usize)
                        };
                        if require_all {
                            prims.iter().all(test)
                        } else {
                            prims.iter().any(test)
                        }
                    })
                    .collect()
            }
        };

        group::create_group(geo, &name, to);
        for element in members {
            group::add_to_group(geo, &name, to, element);
        }
        if delete_original {
            geo.attributes_mut(from)
                .remove(&group::group_attribute_name(&name));
        }
        Ok(output)
    }
}

/// Grow or shrink a group along topology.
pub struct GroupExpandSop;

impl Operator for GroupExpandSop {
    fn type_name(&self) -> &'static str {
        "GroupExpand"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("group_name", "group1")
                .label("Group Name")
                .category("Group")
                .build(),
            int_parameter("operation", 0)
                .label("Operation")
                .options(&["Expand", "Shrink"])
                .category("Group")
                .build(),
            int_parameter("iterations", 1)
                .label("Iterations")
                .int_range(1, 100)
                .category("Group")
                .build(),
            int_parameter("element_class", 0)
                .label("Group Type")
                .options(&["Points", "Primitives"])
                .category("Group")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let name: String = ctx.get("group_name", String::new());
        let shrink = ctx.get("operation", 0) == 1;
        let iterations = ctx.get("iterations", 1).max(1) as usize;
        let class = group_class(ctx.get("element_class", 0));

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        if !group::has_group(geo, &name, class) {
            return Err(CookError::parameter_invalid(format!(
                "group '{name}' does not exist on the {class} class"
            )));
        }

        // Neighborhood relation: points via shared edges, primitives via
        // shared points.
        let neighbors: Vec<Vec<u32>> = match class {
            ElementClass::Point => crate::processing::adjacency::point_neighbors(geo),
            _ => {
                let incident = crate::processing::adjacency::point_primitives(geo);
                let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); geo.primitive_count()];
                for prims in incident {
                    for &a in &prims {
                        for &b in &prims {
                            if a != b && !neighbors[a as usize].contains(&b) {
                                neighbors[a as usize].push(b);
                            }
                        }
                    }
                }
                neighbors
            }
        };

        let count = geo.element_count(class);
        let mut members: Vec<bool> = (0..count)
            .map(|e| group::is_in_group(geo, &name, class, e))
            .collect();
        for _ in 0..iterations {
            let snapshot = members.clone();
            for element in 0..count {
                let frontier = neighbors[element]
                    .iter()
                    .any(|&n| snapshot[n as usize] != shrink);
                if shrink {
                    // Members touching a non-member leave the group.
                    if snapshot[element] && frontier {
                        members[element] = false;
                    }
                } else if !snapshot[element] && frontier {
                    members[element] = true;
                }
            }
        }

        for (element, &member) in members.iter().enumerate() {
            if member {
                group::add_to_group(geo, &name, class, element);
            } else {
                group::remove_from_group(geo, &name, class, element);
            }
        }
        Ok(output)
    }
}

/// Copy groups from a second input by index or nearest position.
pub struct GroupTransferSop;

impl Operator for GroupTransferSop {
    fn type_name(&self) -> &'static str {
        "GroupTransfer"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::dual()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("pattern", "*")
                .label("Pattern")
                .category("Transfer")
                .description("Wildcard pattern of group names to transfer")
                .build(),
            int_parameter("element_class", 0)
                .label("Group Type")
                .options(&["Points", "Primitives"])
                .category("Transfer")
                .build(),
            int_parameter("method", 0)
                .label("Method")
                .options(&["By Index", "By Position"])
                .category("Transfer")
                .build(),
            float_parameter("threshold", 0.001)
                .label("Threshold")
                .range(0.000_001, 10.0)
                .category("Transfer")
                .description("Maximum distance for positional matching")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let pattern_text: String = ctx.get("pattern", String::from("*"));
        let pattern = glob::Pattern::new(&pattern_text).map_err(|e| {
            CookError::parameter_invalid(format!("invalid pattern '{pattern_text}': {e}"))
        })?;
        let class = group_class(ctx.get("element_class", 0));
        let by_position = ctx.get("method", 0) == 1;
        let threshold: f32 = ctx.get("threshold", 0.001);

        let source = ctx.input_geometry(1)?.clone();
        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");

        // destination element -> source element
        let mapping: Vec<Option<usize>> = if by_position {
            if class != ElementClass::Point {
                return Err(CookError::parameter_invalid(
                    "positional transfer works on point groups",
                ));
            }
            let (Some(dst_positions), Some(src_positions)) =
                (geo.positions(), source.positions())
            else {
                return Err(CookError::input_invalid(
                    "positional transfer requires positions on both inputs",
                ));
            };
            dst_positions
                .iter()
                .map(|p| {
                    let mut best: Option<(f32, usize)> = None;
                    for (i, q) in src_positions.iter().enumerate() {
                        let d = p.distance_squared(*q);
                        if best.is_none_or(|(bd, _)| d < bd) {
                            best = Some((d, i));
                        }
                    }
                    best.filter(|(d, _)| *d <= threshold * threshold)
                        .map(|(_, i)| i)
                })
                .collect()
        } else {
            let source_count = source.element_count(class);
            (0..geo.element_count(class))
                .map(|e| if e < source_count { Some(e) } else { None })
                .collect()
        };

        for name in group::list_groups(&source, class) {
            if !pattern.matches(&name) {
                continue;
            }
            group::create_group(geo, &name, class);
            for (dst, src) in mapping.iter().enumerate() {
                let member = src
                    .map(|s| group::is_in_group(&source, &name, class, s))
                    .unwrap_or(false);
                if member {
                    group::add_to_group(geo, &name, class, dst);
                }
            }
        }
        Ok(output)
    }
}
