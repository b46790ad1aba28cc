//! The geometry container: topology plus attribute data.
//!
//! [`GeometryContainer`] owns one [`ElementTopology`] and four
//! [`AttributeSet`]s, one per element class. It is the artifact every
//! operator consumes and produces.
//!
//! Standard workflow for a generator:
//! 1. build topology (`set_point_count`, `add_vertex`, `add_primitive`),
//! 2. add attributes (`ensure_position_attribute`, `add_point_attribute`),
//! 3. populate data through the typed accessors.
//!
//! A container is mutated only by the operator that uniquely owns it;
//! sharing across the graph goes through [`GeometryHandle`], which clones
//! on write.

pub mod group;
mod handle;

use glam::{Vec2, Vec3};
use paste::paste;

use crate::attribute::{
    standard, AnyAttributeStorage, AttributeElement, AttributeSet, AttributeStorage,
    AttributeType, ElementClass, InterpolationMode,
};
use crate::error::{CookError, CookResult};
use crate::math::Aabb;
use crate::topology::ElementTopology;

pub use handle::GeometryHandle;

/// Complete geometry: structure plus typed attribute channels.
#[derive(Clone, Debug)]
pub struct GeometryContainer {
    topology: ElementTopology,
    point_attrs: AttributeSet,
    vertex_attrs: AttributeSet,
    primitive_attrs: AttributeSet,
    detail_attrs: AttributeSet,
}

impl Default for GeometryContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates the add/remove/has/get/typed accessor family for one element
/// class, mirroring the identical shape of all four.
macro_rules! attribute_accessors {
    ($class:ident, $field:ident) => {
        paste! {
            pub fn [<add_ $class _attribute>](
                &mut self,
                name: &str,
                attribute_type: AttributeType,
            ) -> bool {
                self.$field.add(name, attribute_type, InterpolationMode::Linear)
            }

            pub fn [<add_ $class _attribute_interpolated>](
                &mut self,
                name: &str,
                attribute_type: AttributeType,
                interpolation: InterpolationMode,
            ) -> bool {
                self.$field.add(name, attribute_type, interpolation)
            }

            pub fn [<remove_ $class _attribute>](&mut self, name: &str) -> bool {
                self.$field.remove(name)
            }

            pub fn [<has_ $class _attribute>](&self, name: &str) -> bool {
                self.$field.has(name)
            }

            pub fn [<get_ $class _attribute>](&self, name: &str) -> Option<&dyn AnyAttributeStorage> {
                self.$field.get(name)
            }

            pub fn [<get_ $class _attribute_typed>]<T: AttributeElement>(
                &self,
                name: &str,
            ) -> Option<&AttributeStorage<T>> {
                self.$field.get_typed::<T>(name)
            }

            pub fn [<get_ $class _attribute_typed_mut>]<T: AttributeElement>(
                &mut self,
                name: &str,
            ) -> Option<&mut AttributeStorage<T>> {
                self.$field.get_typed_mut::<T>(name)
            }

            pub fn [<$class _attributes>](&self) -> &AttributeSet {
                &self.$field
            }

            pub fn [<$class _attributes_mut>](&mut self) -> &mut AttributeSet {
                &mut self.$field
            }
        }
    };
}

impl GeometryContainer {
    pub fn new() -> Self {
        Self {
            topology: ElementTopology::new(),
            point_attrs: AttributeSet::new(ElementClass::Point),
            vertex_attrs: AttributeSet::new(ElementClass::Vertex),
            primitive_attrs: AttributeSet::new(ElementClass::Primitive),
            detail_attrs: AttributeSet::new(ElementClass::Detail),
        }
    }

    // ---------------------------------------------------------------
    // Topology access
    // ---------------------------------------------------------------

    pub fn topology(&self) -> &ElementTopology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut ElementTopology {
        &mut self.topology
    }

    pub fn point_count(&self) -> usize {
        self.topology.point_count()
    }

    pub fn vertex_count(&self) -> usize {
        self.topology.vertex_count()
    }

    pub fn primitive_count(&self) -> usize {
        self.topology.primitive_count()
    }

    pub fn element_count(&self, class: ElementClass) -> usize {
        match class {
            ElementClass::Point => self.point_count(),
            ElementClass::Vertex => self.vertex_count(),
            ElementClass::Primitive => self.primitive_count(),
            ElementClass::Detail => 1,
        }
    }

    /// Set the point count, resizing point attributes in lockstep.
    pub fn set_point_count(&mut self, count: usize) {
        self.topology.set_point_count(count);
        self.point_attrs.resize(count);
    }

    pub fn set_vertex_count(&mut self, count: usize) {
        self.topology.set_vertex_count(count);
        self.vertex_attrs.resize(count);
    }

    pub fn set_primitive_count(&mut self, count: usize) {
        self.topology.set_primitive_count(count);
        self.primitive_attrs.resize(count);
    }

    /// Append a vertex referencing `point`, resizing vertex attributes.
    pub fn add_vertex(&mut self, point: u32) -> usize {
        let index = self.topology.add_vertex(point);
        self.vertex_attrs.resize(self.topology.vertex_count());
        index
    }

    /// Append a primitive over existing vertices, resizing primitive
    /// attributes.
    pub fn add_primitive(&mut self, vertices: Vec<u32>) -> usize {
        let index = self.topology.add_primitive(vertices);
        self.primitive_attrs.resize(self.topology.primitive_count());
        index
    }

    /// Append a polygon directly from point indices: one fresh vertex per
    /// corner. Returns the primitive index.
    pub fn add_polygon(&mut self, points: &[u32]) -> usize {
        let vertices: Vec<u32> = points
            .iter()
            .map(|&p| self.add_vertex(p) as u32)
            .collect();
        self.add_primitive(vertices)
    }

    // ---------------------------------------------------------------
    // Attribute management, one family per element class
    // ---------------------------------------------------------------

    attribute_accessors!(point, point_attrs);
    attribute_accessors!(vertex, vertex_attrs);
    attribute_accessors!(primitive, primitive_attrs);
    attribute_accessors!(detail, detail_attrs);

    /// Attribute set for a class, by value.
    pub fn attributes(&self, class: ElementClass) -> &AttributeSet {
        match class {
            ElementClass::Point => &self.point_attrs,
            ElementClass::Vertex => &self.vertex_attrs,
            ElementClass::Primitive => &self.primitive_attrs,
            ElementClass::Detail => &self.detail_attrs,
        }
    }

    pub fn attributes_mut(&mut self, class: ElementClass) -> &mut AttributeSet {
        match class {
            ElementClass::Point => &mut self.point_attrs,
            ElementClass::Vertex => &mut self.vertex_attrs,
            ElementClass::Primitive => &mut self.primitive_attrs,
            ElementClass::Detail => &mut self.detail_attrs,
        }
    }

    // ---------------------------------------------------------------
    // Standard attribute conveniences
    // ---------------------------------------------------------------

    /// Point positions (standard `P`), or `None` when absent.
    pub fn positions(&self) -> Option<&AttributeStorage<Vec3>> {
        self.point_attrs.get_typed::<Vec3>(standard::P)
    }

    pub fn positions_mut(&mut self) -> Option<&mut AttributeStorage<Vec3>> {
        self.point_attrs.get_typed_mut::<Vec3>(standard::P)
    }

    /// Shared per-point normals (point `N`).
    pub fn point_normals(&self) -> Option<&AttributeStorage<Vec3>> {
        self.point_attrs.get_typed::<Vec3>(standard::N)
    }

    pub fn point_normals_mut(&mut self) -> Option<&mut AttributeStorage<Vec3>> {
        self.point_attrs.get_typed_mut::<Vec3>(standard::N)
    }

    /// Split per-corner normals (vertex `N`).
    pub fn vertex_normals(&self) -> Option<&AttributeStorage<Vec3>> {
        self.vertex_attrs.get_typed::<Vec3>(standard::N)
    }

    pub fn vertex_normals_mut(&mut self) -> Option<&mut AttributeStorage<Vec3>> {
        self.vertex_attrs.get_typed_mut::<Vec3>(standard::N)
    }

    pub fn uvs(&self) -> Option<&AttributeStorage<Vec2>> {
        self.vertex_attrs.get_typed::<Vec2>(standard::UV)
    }

    pub fn colors(&self) -> Option<&AttributeStorage<Vec3>> {
        self.point_attrs.get_typed::<Vec3>(standard::CD)
    }

    /// Add the standard position attribute if missing.
    pub fn ensure_position_attribute(&mut self) {
        if !self.point_attrs.has(standard::P) {
            self.point_attrs
                .add(standard::P, AttributeType::Vec3f, InterpolationMode::Linear);
        }
    }

    /// Add the point normal attribute if missing.
    pub fn ensure_point_normals(&mut self) {
        if !self.point_attrs.has(standard::N) {
            self.point_attrs
                .add(standard::N, AttributeType::Vec3f, InterpolationMode::Linear);
        }
    }

    /// Add the vertex normal attribute if missing.
    pub fn ensure_vertex_normals(&mut self) {
        if !self.vertex_attrs.has(standard::N) {
            self.vertex_attrs
                .add(standard::N, AttributeType::Vec3f, InterpolationMode::Linear);
        }
    }

    /// Bounding box over all point positions.
    pub fn bounding_box(&self) -> Aabb {
        match self.positions() {
            Some(p) => Aabb::from_points(p.iter()),
            None => Aabb::empty(),
        }
    }

    // ---------------------------------------------------------------
    // Whole-container operations
    // ---------------------------------------------------------------

    /// Reset topology and all attribute sets.
    pub fn clear(&mut self) {
        self.topology.clear();
        self.point_attrs.clear();
        self.vertex_attrs.clear();
        self.primitive_attrs.clear();
        self.detail_attrs.clear();
    }

    /// Re-check topology invariants and attribute/topology size agreement.
    pub fn validate(&self) -> bool {
        self.topology.validate()
            && self.point_attrs.size() == self.point_count()
            && self.vertex_attrs.size() == self.vertex_count()
            && self.primitive_attrs.size() == self.primitive_count()
            && self.point_attrs.validate()
            && self.vertex_attrs.validate()
            && self.primitive_attrs.validate()
            && self.detail_attrs.validate()
    }

    pub fn memory_usage(&self) -> usize {
        size_of::<ElementTopology>()
            + self.point_attrs.memory_usage()
            + self.vertex_attrs.memory_usage()
            + self.primitive_attrs.memory_usage()
            + self.detail_attrs.memory_usage()
    }

    pub fn stats(&self) -> GeometryStats {
        GeometryStats {
            points: self.point_count(),
            vertices: self.vertex_count(),
            primitives: self.primitive_count(),
            point_attributes: self.point_attrs.attribute_count(),
            vertex_attributes: self.vertex_attrs.attribute_count(),
            primitive_attributes: self.primitive_attrs.attribute_count(),
            detail_attributes: self.detail_attrs.attribute_count(),
            total_memory_bytes: self.memory_usage(),
        }
    }

    // ---------------------------------------------------------------
    // Cross-container attribute transfer
    // ---------------------------------------------------------------

    /// Adopt `src`'s attribute layout: same descriptors, no elements yet
    /// (detail values are copied outright). Used by operators that build
    /// a fresh topology and re-emit elements from a source container.
    pub fn adopt_attribute_layout(&mut self, src: &GeometryContainer) {
        self.point_attrs = clone_empty(&src.point_attrs);
        self.vertex_attrs = clone_empty(&src.vertex_attrs);
        self.primitive_attrs = clone_empty(&src.primitive_attrs);
        self.detail_attrs = src.detail_attrs.clone();
    }

    /// Copy one element's attribute values for `class` from `src`.
    pub fn copy_element_attributes(
        &mut self,
        class: ElementClass,
        dst: usize,
        src: &GeometryContainer,
        src_index: usize,
    ) {
        self.attributes_mut(class)
            .copy_element_from(dst, src.attributes(class), src_index);
    }

    /// Blend several source elements' attribute values for `class` from
    /// `src` into element `dst`, honoring interpolation modes.
    pub fn blend_element_attributes(
        &mut self,
        class: ElementClass,
        dst: usize,
        src: &GeometryContainer,
        src_indices: &[usize],
        weights: &[f32],
    ) {
        self.attributes_mut(class)
            .blend_element_from(dst, src.attributes(class), src_indices, weights);
    }

    // ---------------------------------------------------------------
    // Deletion
    // ---------------------------------------------------------------

    /// Build a new container with the elements of `group_name` removed.
    ///
    /// Deleting primitives keeps all points (unless
    /// `delete_orphaned_points` asks for unreferenced points to be dropped
    /// afterwards) and re-emits the surviving primitives' vertices.
    /// Deleting points drops every primitive touching a deleted point and
    /// remaps the survivors. Attribute values of retained elements are
    /// preserved exactly.
    pub fn delete_elements(
        &self,
        group_name: &str,
        class: ElementClass,
        delete_orphaned_points: bool,
    ) -> CookResult<GeometryContainer> {
        if !matches!(class, ElementClass::Point | ElementClass::Primitive) {
            return Err(CookError::parameter_invalid(format!(
                "invalid element class '{class}' for deletion"
            )));
        }
        if !group::has_group(self, group_name, class) {
            return Err(CookError::parameter_invalid(format!(
                "group '{group_name}' does not exist"
            )));
        }
        let doomed = group::group_elements(self, group_name, class);
        if doomed.is_empty() {
            return Err(CookError::parameter_invalid(format!(
                "group '{group_name}' is empty"
            )));
        }
        let doomed: Vec<bool> = {
            let mut flags = vec![false; self.element_count(class)];
            for &i in &doomed {
                flags[i] = true;
            }
            flags
        };

        match class {
            ElementClass::Primitive => Ok(self.delete_primitives(&doomed, delete_orphaned_points)),
            ElementClass::Point => Ok(self.delete_points(&doomed)),
            _ => unreachable!(),
        }
    }

    fn delete_primitives(&self, doomed: &[bool], delete_orphaned_points: bool) -> GeometryContainer {
        let mut out = GeometryContainer::new();

        // Points and their attributes carry over unchanged.
        out.topology.set_point_count(self.point_count());
        out.point_attrs = self.point_attrs.clone();
        out.detail_attrs = self.detail_attrs.clone();

        // Empty clones keep descriptors but no elements yet.
        out.vertex_attrs = clone_empty(&self.vertex_attrs);
        out.primitive_attrs = clone_empty(&self.primitive_attrs);

        for prim in 0..self.primitive_count() {
            if doomed[prim] {
                continue;
            }
            let mut vertices = Vec::with_capacity(self.topology.primitive_vertices(prim).len());
            for &v in self.topology.primitive_vertices(prim) {
                let new_vertex = out.add_vertex(self.topology.vertex_point(v as usize));
                out.vertex_attrs
                    .copy_element_from(new_vertex, &self.vertex_attrs, v as usize);
                vertices.push(new_vertex as u32);
            }
            let new_prim = out.add_primitive(vertices);
            out.primitive_attrs
                .copy_element_from(new_prim, &self.primitive_attrs, prim);
        }

        if delete_orphaned_points {
            out.remove_unreferenced_points();
        }
        out
    }

    fn delete_points(&self, doomed: &[bool]) -> GeometryContainer {
        let mut out = GeometryContainer::new();
        out.detail_attrs = self.detail_attrs.clone();
        out.point_attrs = clone_empty(&self.point_attrs);
        out.vertex_attrs = clone_empty(&self.vertex_attrs);
        out.primitive_attrs = clone_empty(&self.primitive_attrs);

        // Remap surviving points; None marks a deleted point.
        let mut remap: Vec<Option<u32>> = vec![None; self.point_count()];
        let mut kept = 0usize;
        for point in 0..self.point_count() {
            if !doomed[point] {
                remap[point] = Some(kept as u32);
                kept += 1;
            }
        }
        out.set_point_count(kept);
        for (old, slot) in remap.iter().enumerate() {
            if let Some(new) = slot {
                out.point_attrs
                    .copy_element_from(*new as usize, &self.point_attrs, old);
            }
        }

        // A primitive survives only if none of its vertices reference a
        // deleted point.
        for prim in 0..self.primitive_count() {
            let old_vertices = self.topology.primitive_vertices(prim);
            let survives = old_vertices
                .iter()
                .all(|&v| remap[self.topology.vertex_point(v as usize) as usize].is_some());
            if !survives {
                continue;
            }
            let mut vertices = Vec::with_capacity(old_vertices.len());
            for &v in old_vertices {
                let new_point = remap[self.topology.vertex_point(v as usize) as usize]
                    .expect("surviving primitive references surviving points");
                let new_vertex = out.add_vertex(new_point);
                out.vertex_attrs
                    .copy_element_from(new_vertex, &self.vertex_attrs, v as usize);
                vertices.push(new_vertex as u32);
            }
            let new_prim = out.add_primitive(vertices);
            out.primitive_attrs
                .copy_element_from(new_prim, &self.primitive_attrs, prim);
        }
        out
    }

    /// Drop points no vertex references, compacting point attributes and
    /// remapping the vertex table.
    pub fn remove_unreferenced_points(&mut self) {
        let mut used = vec![false; self.point_count()];
        for v in 0..self.vertex_count() {
            used[self.topology.vertex_point(v) as usize] = true;
        }
        if used.iter().all(|&u| u) {
            return;
        }

        let mut remap: Vec<u32> = vec![0; self.point_count()];
        let mut kept = 0usize;
        let old_attrs = std::mem::replace(&mut self.point_attrs, AttributeSet::new(ElementClass::Point));
        self.point_attrs = clone_empty(&old_attrs);
        for (old, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old] = kept as u32;
                kept += 1;
            }
        }
        self.point_attrs.resize(kept);
        for (old, &is_used) in used.iter().enumerate() {
            if is_used {
                self.point_attrs
                    .copy_element_from(remap[old] as usize, &old_attrs, old);
            }
        }
        self.topology.set_point_count(kept);
        for v in 0..self.vertex_count() {
            let old_point = self.topology.vertex_point(v);
            self.topology.set_vertex_point(v, remap[old_point as usize]);
        }
    }
}

/// Clone a set's descriptors without any elements.
fn clone_empty(set: &AttributeSet) -> AttributeSet {
    let mut out = set.clone();
    out.resize(if set.class() == ElementClass::Detail { 1 } else { 0 });
    out
}

/// Per-container element/attribute/memory summary for debugging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryStats {
    pub points: usize,
    pub vertices: usize,
    pub primitives: usize,
    pub point_attributes: usize,
    pub vertex_attributes: usize,
    pub primitive_attributes: usize,
    pub detail_attributes: usize,
    pub total_memory_bytes: usize,
}
