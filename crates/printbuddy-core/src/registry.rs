//! Id-indexed backend registry.
//!
//! Backends are addressed by a small integer id. Ids may be sparse: registering
//! id 5 into a registry holding ids 0..=2 grows the table to six slots and
//! leaves slots 3 and 4 empty. The table never shrinks, and growing it keeps
//! every existing handle in place.

use std::cell::RefCell;
use std::rc::Rc;

/// Sparse, growable table of shared backend handles.
pub struct Registry<T: ?Sized> {
    slots: Vec<Option<Rc<RefCell<T>>>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `backend` at `id`, growing the table to `id + 1` slots if needed.
    ///
    /// Registering an id twice replaces the previous handle.
    pub fn register(&mut self, id: usize, backend: Rc<RefCell<T>>) {
        if self.slots.len() < id + 1 {
            self.slots.resize_with(id + 1, || None);
        }
        self.slots[id] = Some(backend);
    }

    pub fn get(&self, id: usize) -> Option<&Rc<RefCell<T>>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.get(id).is_some()
    }

    /// Table capacity: highest registered id plus one.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered backends with their ids, skipping empty slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Rc<RefCell<T>>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|backend| (id, backend)))
    }

    /// Raw slots including empty ones.
    pub fn slots(&self) -> &[Option<Rc<RefCell<T>>>] {
        &self.slots
    }
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<usize> = self.iter().map(|(id, _)| id).collect();
        f.debug_struct("Registry")
            .field("len", &self.slots.len())
            .field("registered", &ids)
            .finish()
    }
}
