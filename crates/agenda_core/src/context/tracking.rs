//! Snapshot-based change tracking for one entity type.
//!
//! # Invariants
//! - An `Added` entry has never been committed; it has no snapshot.
//! - A `Persisted` entry holds the last committed state as its snapshot; it
//!   is modified iff the live value differs from the snapshot.
//! - Entries are never removed, only marked `Detached`, so handles stay valid.
//! - A handle only resolves in the change set that issued it.

use crate::model::{Entity, RowId};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to an entity tracked by a `DataContext`.
pub struct Tracked<T> {
    set_id: u64,
    index: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Tracked<T> {
    fn new(set_id: u64, index: usize) -> Self {
        Self {
            set_id,
            index,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Tracked<T> {}

impl<T> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.set_id == other.set_id && self.index == other.index
    }
}

impl<T> Eq for Tracked<T> {}

impl<T: Entity> Debug for Tracked<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tracked<{}>({}:{})", T::NAME, self.set_id, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Added,
    Persisted,
    Detached,
}

#[derive(Debug)]
struct Entry<T> {
    entity: T,
    snapshot: Option<T>,
    state: EntryState,
}

/// All tracked instances of one entity type.
#[derive(Debug)]
pub(crate) struct ChangeSet<T> {
    id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
        }
    }
}

impl<T: Entity> ChangeSet<T> {
    /// Stages a new entity for insertion.
    pub(crate) fn add(&mut self, entity: T) -> Tracked<T> {
        self.push(Entry {
            entity,
            snapshot: None,
            state: EntryState::Added,
        })
    }

    /// Tracks an entity loaded from the store, reusing an existing handle
    /// when the same id is already tracked.
    pub(crate) fn attach(&mut self, entity: T) -> Tracked<T> {
        if let Some(index) = entity.id().and_then(|id| self.position_of(id)) {
            return Tracked::new(self.id, index);
        }
        self.push(Entry {
            snapshot: Some(entity.clone()),
            entity,
            state: EntryState::Persisted,
        })
    }

    pub(crate) fn get(&self, handle: &Tracked<T>) -> Option<&T> {
        self.live_entry(handle).map(|entry| &entry.entity)
    }

    pub(crate) fn get_mut(&mut self, handle: &Tracked<T>) -> Option<&mut T> {
        self.live_entry_mut(handle).map(|entry| &mut entry.entity)
    }

    /// Stops tracking `handle`; returns `false` when it was not tracked.
    pub(crate) fn detach(&mut self, handle: &Tracked<T>) -> bool {
        match self.live_entry_mut(handle) {
            Some(entry) => {
                entry.state = EntryState::Detached;
                true
            }
            None => false,
        }
    }

    /// Entities staged for insertion, with their entry index.
    pub(crate) fn added(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.state == EntryState::Added)
            .map(|(index, entry)| (index, &entry.entity))
    }

    /// Persisted entities whose live value differs from the snapshot, with
    /// their entry index and committed id.
    pub(crate) fn modified(&self) -> impl Iterator<Item = (usize, RowId, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match (&entry.state, &entry.snapshot) {
                (EntryState::Persisted, Some(snapshot)) if *snapshot != entry.entity => {
                    snapshot.id().map(|id| (index, id, &entry.entity))
                }
                _ => None,
            })
    }

    pub(crate) fn pending_inserts(&self) -> usize {
        self.added().count()
    }

    pub(crate) fn pending_updates(&self) -> usize {
        self.modified().count()
    }

    /// Records `committed` as the new persisted state of entry `index`.
    pub(crate) fn accept(&mut self, index: usize, committed: T) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.snapshot = Some(committed.clone());
            entry.entity = committed;
            entry.state = EntryState::Persisted;
        }
    }

    /// Drops staged inserts and reverts edits to the last committed state.
    pub(crate) fn discard(&mut self) {
        for entry in &mut self.entries {
            match entry.state {
                EntryState::Added => entry.state = EntryState::Detached,
                EntryState::Persisted => {
                    if let Some(snapshot) = &entry.snapshot {
                        entry.entity = snapshot.clone();
                    }
                }
                EntryState::Detached => {}
            }
        }
    }

    fn position_of(&self, id: RowId) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.state == EntryState::Persisted
                && entry.snapshot.as_ref().and_then(|snapshot| snapshot.id()) == Some(id)
        })
    }

    fn live_entry(&self, handle: &Tracked<T>) -> Option<&Entry<T>> {
        if handle.set_id != self.id {
            return None;
        }
        self.entries
            .get(handle.index)
            .filter(|entry| entry.state != EntryState::Detached)
    }

    fn live_entry_mut(&mut self, handle: &Tracked<T>) -> Option<&mut Entry<T>> {
        if handle.set_id != self.id {
            return None;
        }
        self.entries
            .get_mut(handle.index)
            .filter(|entry| entry.state != EntryState::Detached)
    }

    fn push(&mut self, entry: Entry<T>) -> Tracked<T> {
        self.entries.push(entry);
        Tracked::new(self.id, self.entries.len() - 1)
    }
}
