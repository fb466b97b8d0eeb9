//! Per-kind storage of entities, addressed by stable ids.
//!
//! Slots are never reused. A destroyed entity keeps its slot and its name so
//! that undo can bring it back; only [`Arena::purge`] (rollback of a created
//! entity, or garbage collection) frees the slot and releases the name.

use crate::topology::id::EntityId;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// The swappable state of an entity: destroyed flag plus property block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityState<P> {
    pub destroyed: bool,
    pub props: P,
}

impl<P> EntityState<P> {
    pub fn alive(props: P) -> Self {
        EntityState { destroyed: false, props }
    }
}

#[derive(Clone, Debug)]
pub struct Slot<P> {
    pub name: String,
    pub state: EntityState<P>,
}

/// Outcome of a name lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameLookup<I> {
    Live(I),
    Destroyed(I),
    Missing,
}

#[derive(Clone, Debug)]
pub struct Arena<I, P> {
    slots: Vec<Option<Slot<P>>>,
    names: HashMap<String, I>,
    prefix: String,
    counter: u64,
}

impl<I: EntityId, P> Arena<I, P> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Arena { slots: Vec::new(), names: HashMap::new(), prefix: prefix.into(), counter: 0 }
    }

    /// Stores a new live entity under a fresh unique name.
    pub fn insert(&mut self, props: P) -> I {
        let name = format!("{}{:04}", self.prefix, self.counter);
        self.counter += 1;
        let id = I::from_index(self.slots.len());
        self.slots.push(Some(Slot { name: name.clone(), state: EntityState::alive(props) }));
        self.names.insert(name, id);
        id
    }

    pub fn get(&self, id: I) -> Option<&Slot<P>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Slot of `id`. A purged or foreign id is a consistency defect.
    pub fn slot(&self, id: I) -> &Slot<P> {
        match self.get(id) {
            Some(slot) => slot,
            None => panic!("[defect] {} {:?} is not stored", I::KIND, id),
        }
    }

    fn slot_mut(&mut self, id: I) -> &mut Slot<P> {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(slot) => slot,
            None => panic!("[defect] {} {:?} is not stored", I::KIND, id),
        }
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn is_live(&self, id: I) -> bool {
        self.get(id).is_some_and(|s| !s.state.destroyed)
    }

    /// Replaces the whole state of `id` and returns the previous one.
    pub fn replace_state(&mut self, id: I, state: EntityState<P>) -> EntityState<P> {
        std::mem::replace(&mut self.slot_mut(id).state, state)
    }

    /// Frees the slot of `id` and releases its name.
    pub fn purge(&mut self, id: I) -> Option<Slot<P>> {
        let slot = self.slots.get_mut(id.index()).and_then(Option::take)?;
        if self.names.get(&slot.name) == Some(&id) {
            self.names.remove(&slot.name);
        }
        Some(slot)
    }

    pub fn lookup(&self, name: &str) -> NameLookup<I> {
        match self.names.get(name) {
            Some(&id) => match self.get(id) {
                Some(slot) if slot.state.destroyed => NameLookup::Destroyed(id),
                Some(_) => NameLookup::Live(id),
                None => NameLookup::Missing,
            },
            None => NameLookup::Missing,
        }
    }

    /// Ids of all stored entities (live or destroyed), ascending.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| I::from_index(i))
    }

    /// Ids of live entities, ascending.
    pub fn live_ids(&self) -> Vec<I> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| !s.state.destroyed))
            .map(|(i, _)| I::from_index(i))
            .collect()
    }

    pub fn nb_live(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.as_ref().is_some_and(|s| !s.state.destroyed))
            .count()
    }

    /// Number of stored slots, destroyed ones included.
    pub fn nb_stored(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
