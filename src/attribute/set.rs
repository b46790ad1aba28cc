//! Ordered attribute collection for one element class.

use std::collections::HashMap;

use super::storage::{new_storage, AnyAttributeStorage, AttributeElement, AttributeStorage};
use super::{AttributeDescriptor, AttributeType, ElementClass, InterpolationMode};

/// Insertion-ordered mapping from attribute name to owned storage, scoped
/// to a single element class. All storages in a set share one length (the
/// element count of the class); [`AttributeSet::resize`] keeps them in
/// lockstep when the topology changes.
#[derive(Clone, Debug)]
pub struct AttributeSet {
    class: ElementClass,
    size: usize,
    storages: Vec<Box<dyn AnyAttributeStorage>>,
    index: HashMap<String, usize>,
}

impl AttributeSet {
    pub fn new(class: ElementClass) -> Self {
        Self {
            class,
            // Detail is the global scope; it always has exactly one slot.
            size: if class == ElementClass::Detail { 1 } else { 0 },
            storages: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn class(&self) -> ElementClass {
        self.class
    }

    /// Element count all storages are sized to.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add an attribute. Fails (returns false) if the name is taken.
    pub fn add(
        &mut self,
        name: &str,
        attribute_type: AttributeType,
        interpolation: InterpolationMode,
    ) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        let descriptor =
            AttributeDescriptor::new(name, attribute_type, self.class, interpolation);
        self.index.insert(name.to_string(), self.storages.len());
        self.storages.push(new_storage(descriptor, self.size));
        true
    }

    /// Remove an attribute by name; returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(pos) = self.index.remove(name) else {
            return false;
        };
        self.storages.remove(pos);
        // Positions after the removed storage shift down by one.
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        true
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Untyped storage lookup.
    pub fn get(&self, name: &str) -> Option<&dyn AnyAttributeStorage> {
        self.index.get(name).map(|&i| self.storages[i].as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn AnyAttributeStorage + 'static)> {
        let i = *self.index.get(name)?;
        Some(self.storages[i].as_mut())
    }

    /// Typed storage lookup. Returns `None` when the name is absent or the
    /// stored type tag does not match `T`.
    pub fn get_typed<T: AttributeElement>(&self, name: &str) -> Option<&AttributeStorage<T>> {
        let storage = self.get(name)?;
        if storage.attribute_type() != T::TYPE {
            return None;
        }
        storage.as_any().downcast_ref::<AttributeStorage<T>>()
    }

    pub fn get_typed_mut<T: AttributeElement>(
        &mut self,
        name: &str,
    ) -> Option<&mut AttributeStorage<T>> {
        let storage = self.get_mut(name)?;
        if storage.attribute_type() != T::TYPE {
            return None;
        }
        storage.as_any_mut().downcast_mut::<AttributeStorage<T>>()
    }

    /// Resize every contained storage to `size`.
    pub fn resize(&mut self, size: usize) {
        self.size = size;
        for storage in &mut self.storages {
            storage.resize(size);
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.storages.len()
    }

    /// Attribute names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.storages
            .iter()
            .map(|s| s.descriptor().name())
            .collect()
    }

    /// Storages in insertion order, paired with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn AnyAttributeStorage)> {
        self.storages
            .iter()
            .map(|s| (s.descriptor().name(), s.as_ref()))
    }

    /// Copy element `src_index` of every same-named attribute in `src`
    /// into slot `dst` here. This is the generic clone-by-index path that
    /// covers all attribute types, strings and matrices included.
    pub fn copy_element_from(&mut self, dst: usize, src: &AttributeSet, src_index: usize) {
        for (name, src_storage) in src.iter() {
            if let Some(&pos) = self.index.get(name) {
                self.storages[pos].copy_element(dst, src_storage, src_index);
            }
        }
    }

    /// Blend the `src_indices` elements of every same-named attribute in
    /// `src` into slot `dst` here, honoring each attribute's
    /// interpolation mode.
    pub fn blend_element_from(
        &mut self,
        dst: usize,
        src: &AttributeSet,
        src_indices: &[usize],
        weights: &[f32],
    ) {
        for (name, src_storage) in src.iter() {
            if let Some(&pos) = self.index.get(name) {
                self.storages[pos].blend_element(dst, src_storage, src_indices, weights);
            }
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.storages.iter().map(|s| s.memory_usage()).sum()
    }

    /// True iff every storage length equals the set size.
    pub fn validate(&self) -> bool {
        self.storages.iter().all(|s| s.len() == self.size)
    }

    pub fn clear(&mut self) {
        self.size = if self.class == ElementClass::Detail { 1 } else { 0 };
        self.storages.clear();
        self.index.clear();
    }
}
