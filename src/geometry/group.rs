//! Groups: named element subsets stored as integer attributes.
//!
//! A group named `X` on element class `EC` is nothing but the `Int`
//! attribute `group_X` on `EC`; element `i` is in the group iff its value
//! is non-zero. Everything here — membership, enumeration, inversion,
//! set algebra — is expressed on that representation, which is why groups
//! survive every attribute-preserving operation for free.

use crate::attribute::{standard, AttributeType, ElementClass, InterpolationMode};
use crate::geometry::GeometryContainer;

/// Attribute name backing a group.
pub fn group_attribute_name(group: &str) -> String {
    format!("{}{}", standard::GROUP_PREFIX, group)
}

/// Group name recovered from a backing attribute name, if it is one.
pub fn group_name_from_attribute(attribute: &str) -> Option<&str> {
    attribute.strip_prefix(standard::GROUP_PREFIX)
}

/// Create the group attribute if absent. No-op when it already exists.
pub fn create_group(geo: &mut GeometryContainer, group: &str, class: ElementClass) {
    let name = group_attribute_name(group);
    let set = geo.attributes_mut(class);
    if !set.has(&name) {
        set.add(&name, AttributeType::Int, InterpolationMode::Constant);
    }
}

pub fn has_group(geo: &GeometryContainer, group: &str, class: ElementClass) -> bool {
    geo.attributes(class).has(&group_attribute_name(group))
}

/// Membership test: false when the group does not exist.
pub fn is_in_group(geo: &GeometryContainer, group: &str, class: ElementClass, index: usize) -> bool {
    geo.attributes(class)
        .get_typed::<i32>(&group_attribute_name(group))
        .is_some_and(|storage| index < storage.len() && *storage.get(index) != 0)
}

pub fn add_to_group(geo: &mut GeometryContainer, group: &str, class: ElementClass, index: usize) {
    set_membership(geo, group, class, index, true);
}

pub fn remove_from_group(
    geo: &mut GeometryContainer,
    group: &str,
    class: ElementClass,
    index: usize,
) {
    set_membership(geo, group, class, index, false);
}

fn set_membership(
    geo: &mut GeometryContainer,
    group: &str,
    class: ElementClass,
    index: usize,
    member: bool,
) {
    if let Some(storage) = geo
        .attributes_mut(class)
        .get_typed_mut::<i32>(&group_attribute_name(group))
    {
        if index < storage.len() {
            storage.set(index, member as i32);
        }
    }
}

/// Indices of elements in the group, ascending. Empty when the group does
/// not exist.
pub fn group_elements(geo: &GeometryContainer, group: &str, class: ElementClass) -> Vec<usize> {
    match geo
        .attributes(class)
        .get_typed::<i32>(&group_attribute_name(group))
    {
        Some(storage) => storage
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0)
            .map(|(i, _)| i)
            .collect(),
        None => Vec::new(),
    }
}

/// Number of members; 0 when the group does not exist.
pub fn group_size(geo: &GeometryContainer, group: &str, class: ElementClass) -> usize {
    geo.attributes(class)
        .get_typed::<i32>(&group_attribute_name(group))
        .map_or(0, |s| s.iter().filter(|&&v| v != 0).count())
}

/// Names of all groups on a class, in attribute order.
pub fn list_groups(geo: &GeometryContainer, class: ElementClass) -> Vec<String> {
    geo.attributes(class)
        .names()
        .iter()
        .filter_map(|n| group_name_from_attribute(n))
        .map(str::to_string)
        .collect()
}

/// Create `output` holding every element of `class` that is NOT in
/// `group`.
pub fn create_inverted_group(
    geo: &mut GeometryContainer,
    group: &str,
    output: &str,
    class: ElementClass,
) {
    create_group(geo, output, class);
    let count = geo.element_count(class);
    for i in 0..count {
        let member = !is_in_group(geo, group, class, i);
        set_membership(geo, output, class, i, member);
    }
}

/// Set-algebra operation for combining two groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupOp {
    Union,
    Intersect,
    Subtract,
    Xor,
}

impl GroupOp {
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => GroupOp::Union,
            1 => GroupOp::Intersect,
            2 => GroupOp::Subtract,
            _ => GroupOp::Xor,
        }
    }

    fn apply(self, a: bool, b: bool) -> bool {
        match self {
            GroupOp::Union => a || b,
            GroupOp::Intersect => a && b,
            GroupOp::Subtract => a && !b,
            GroupOp::Xor => a != b,
        }
    }
}

/// Combine groups `a` and `b` into `output` (created if missing).
/// Missing inputs read as empty groups.
pub fn combine_groups(
    geo: &mut GeometryContainer,
    a: &str,
    b: &str,
    output: &str,
    class: ElementClass,
    op: GroupOp,
) {
    create_group(geo, output, class);
    let count = geo.element_count(class);
    for i in 0..count {
        let in_a = is_in_group(geo, a, class, i);
        let in_b = is_in_group(geo, b, class, i);
        set_membership(geo, output, class, i, op.apply(in_a, in_b));
    }
}
