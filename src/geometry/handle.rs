//! Copy-on-write handle for [`GeometryContainer`].

use std::sync::Arc;

use super::GeometryContainer;

/// Shared reference to a geometry with copy-on-write semantics.
///
/// Cloning a handle shares the underlying container; reads never copy.
/// The first write through a shared handle deep-clones the container so
/// other handles keep observing the pre-write state. Empty is a valid
/// state (pass-through nodes with no input produce it).
///
/// ```
/// use meshforge::geometry::{GeometryContainer, GeometryHandle};
///
/// let mut a = GeometryHandle::from_container(GeometryContainer::new());
/// let b = a.clone(); // shares, use_count == 2
///
/// a.write().unwrap().set_point_count(4); // copies; b still sees 0 points
/// assert!(a.is_unique());
/// assert_eq!(b.read().unwrap().point_count(), 0);
/// ```
#[derive(Clone, Default, Debug)]
pub struct GeometryHandle {
    data: Option<Arc<GeometryContainer>>,
}

impl GeometryHandle {
    /// Empty handle.
    pub fn empty() -> Self {
        Self { data: None }
    }

    /// Wrap a container, taking ownership.
    pub fn from_container(container: GeometryContainer) -> Self {
        Self {
            data: Some(Arc::new(container)),
        }
    }

    /// Share an already-counted container.
    pub fn from_shared(container: Arc<GeometryContainer>) -> Self {
        Self {
            data: Some(container),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Immutable view. Never copies.
    pub fn read(&self) -> Option<&GeometryContainer> {
        self.data.as_deref()
    }

    /// Mutable view; deep-clones first iff the container is shared.
    pub fn write(&mut self) -> Option<&mut GeometryContainer> {
        self.data.as_mut().map(Arc::make_mut)
    }

    /// True iff this handle is the sole owner (a write will not copy).
    pub fn is_unique(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|d| Arc::strong_count(d) == 1)
    }

    /// Number of handles sharing the container, 0 when empty.
    pub fn use_count(&self) -> usize {
        self.data.as_ref().map_or(0, Arc::strong_count)
    }

    /// Force sole ownership now, copying if shared. A later `write` is
    /// then guaranteed copy-free.
    pub fn make_unique(&mut self) {
        if let Some(data) = self.data.as_mut() {
            Arc::make_mut(data);
        }
    }

    /// Always-independent deep copy.
    pub fn deep_clone(&self) -> Self {
        Self {
            data: self
                .data
                .as_ref()
                .map(|d| Arc::new(GeometryContainer::clone(d))),
        }
    }

    /// Underlying shared pointer, for callers that cache geometry.
    pub fn shared(&self) -> Option<Arc<GeometryContainer>> {
        self.data.clone()
    }

    /// Reset to the empty state.
    pub fn reset(&mut self) {
        self.data = None;
    }

    pub fn swap(&mut self, other: &mut GeometryHandle) {
        std::mem::swap(&mut self.data, &mut other.data);
    }
}

impl From<GeometryContainer> for GeometryHandle {
    fn from(container: GeometryContainer) -> Self {
        Self::from_container(container)
    }
}
