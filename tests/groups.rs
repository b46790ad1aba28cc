//! Group representation and set algebra.

use meshforge::attribute::ElementClass;
use meshforge::geometry::group::{self, GroupOp};
use meshforge::geometry::GeometryContainer;
use meshforge::testing;

fn points(count: usize) -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(count);
    geo
}

fn members(geo: &GeometryContainer, name: &str) -> Vec<usize> {
    group::group_elements(geo, name, ElementClass::Point)
}

#[test]
fn groups_are_integer_attributes() {
    let mut geo = points(4);
    group::create_group(&mut geo, "hot", ElementClass::Point);
    assert!(geo.has_point_attribute("group_hot"));
    assert!(group::has_group(&geo, "hot", ElementClass::Point));

    group::add_to_group(&mut geo, "hot", ElementClass::Point, 2);
    assert!(group::is_in_group(&geo, "hot", ElementClass::Point, 2));
    assert!(!group::is_in_group(&geo, "hot", ElementClass::Point, 1));
    assert_eq!(members(&geo, "hot"), vec![2]);

    group::remove_from_group(&mut geo, "hot", ElementClass::Point, 2);
    assert_eq!(group::group_size(&geo, "hot", ElementClass::Point), 0);
}

#[test]
fn creating_twice_is_a_no_op() {
    let mut geo = points(3);
    group::create_group(&mut geo, "g", ElementClass::Point);
    group::add_to_group(&mut geo, "g", ElementClass::Point, 1);
    group::create_group(&mut geo, "g", ElementClass::Point);
    assert_eq!(members(&geo, "g"), vec![1]);
}

#[test]
fn missing_group_tests_false_and_enumerates_empty() {
    let geo = points(3);
    assert!(!group::is_in_group(&geo, "ghost", ElementClass::Point, 0));
    assert!(members(&geo, "ghost").is_empty());
}

#[test]
fn list_groups_strips_the_prefix() {
    let mut geo = points(2);
    group::create_group(&mut geo, "a", ElementClass::Point);
    group::create_group(&mut geo, "b", ElementClass::Point);
    assert_eq!(
        group::list_groups(&geo, ElementClass::Point),
        vec!["a".to_string(), "b".to_string()]
    );
}

fn ab_fixture() -> GeometryContainer {
    let mut geo = points(6);
    group::create_group(&mut geo, "a", ElementClass::Point);
    group::create_group(&mut geo, "b", ElementClass::Point);
    for i in 0..4 {
        group::add_to_group(&mut geo, "a", ElementClass::Point, i);
    }
    for i in 2..6 {
        group::add_to_group(&mut geo, "b", ElementClass::Point, i);
    }
    geo
}

#[test]
fn combine_set_algebra() {
    let mut geo = ab_fixture();
    group::combine_groups(&mut geo, "a", "b", "u", ElementClass::Point, GroupOp::Union);
    group::combine_groups(&mut geo, "a", "b", "i", ElementClass::Point, GroupOp::Intersect);
    group::combine_groups(&mut geo, "a", "b", "s", ElementClass::Point, GroupOp::Subtract);
    group::combine_groups(&mut geo, "a", "b", "x", ElementClass::Point, GroupOp::Xor);

    assert_eq!(members(&geo, "u"), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(members(&geo, "i"), vec![2, 3]);
    assert_eq!(members(&geo, "s"), vec![0, 1]);
    assert_eq!(members(&geo, "x"), vec![0, 1, 4, 5]);
}

#[test]
fn union_is_idempotent() {
    let mut geo = ab_fixture();
    group::combine_groups(&mut geo, "a", "a", "aa", ElementClass::Point, GroupOp::Union);
    assert_eq!(members(&geo, "aa"), members(&geo, "a"));
}

#[test]
fn intersect_with_empty_absorbs() {
    let mut geo = ab_fixture();
    group::create_group(&mut geo, "none", ElementClass::Point);
    group::combine_groups(&mut geo, "a", "none", "out", ElementClass::Point, GroupOp::Intersect);
    assert!(members(&geo, "out").is_empty());
}

#[test]
fn de_morgan_under_inversion() {
    let mut geo = ab_fixture();
    // not(a union b) == not(a) intersect not(b)
    group::combine_groups(&mut geo, "a", "b", "u", ElementClass::Point, GroupOp::Union);
    group::create_inverted_group(&mut geo, "u", "not_u", ElementClass::Point);
    group::create_inverted_group(&mut geo, "a", "not_a", ElementClass::Point);
    group::create_inverted_group(&mut geo, "b", "not_b", ElementClass::Point);
    group::combine_groups(
        &mut geo,
        "not_a",
        "not_b",
        "meet",
        ElementClass::Point,
        GroupOp::Intersect,
    );
    assert_eq!(members(&geo, "not_u"), members(&geo, "meet"));
}

#[test]
fn groups_survive_deletion_of_other_elements() {
    let mut geo = testing::two_triangles();
    group::create_group(&mut geo, "keep", ElementClass::Point);
    for i in 0..3 {
        group::add_to_group(&mut geo, "keep", ElementClass::Point, i);
    }
    group::create_inverted_group(&mut geo, "keep", "doomed", ElementClass::Point);

    let result = geo
        .delete_elements("doomed", ElementClass::Point, false)
        .unwrap();
    assert_eq!(result.point_count(), 3);
    // The surviving points are still members of "keep".
    assert_eq!(
        group::group_size(&result, "keep", ElementClass::Point),
        3
    );
}
