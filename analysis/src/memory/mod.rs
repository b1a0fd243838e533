//! Entity tables rebuilt from a trace.
//!
//! Engines and values are keyed by the address the traced program printed
//! for them. An address can be reused once its previous occupant is dead, so
//! entries are never removed: destruction marks them [`Entry::Dead`] and a
//! later construction overwrites the dead record in place.

mod engines;
mod functions;
mod values;

use std::mem;

use ahash::AHashMap;
pub use engines::{EngineConfig, EngineInstance, EngineTable};
pub use functions::{FunctionAggregate, FunctionTable};
pub use values::{Constant, ValueInstance, ValueTable};

/// Opaque 64-bit key printed by the traced program.
pub type Address = u64;

/// A table record together with its liveness.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Live(T),
    Dead(T),
}

impl<T> Entry<T> {
    pub const fn is_live(&self) -> bool {
        matches!(self, Entry::Live(_))
    }

    pub const fn get(&self) -> &T {
        match self {
            Entry::Live(inner) | Entry::Dead(inner) => inner,
        }
    }
}

/// Address-keyed records with a live/dead lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleTable<T> {
    entries: AHashMap<Address, Entry<T>>,
}

impl<T> Default for LifecycleTable<T> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<T> LifecycleTable<T> {
    pub fn get(&self, addr: Address) -> Option<&Entry<T>> {
        self.entries.get(&addr)
    }

    /// The record at `addr`, if it exists and is live.
    pub fn live(&self, addr: Address) -> Option<&T> {
        match self.entries.get(&addr)? {
            Entry::Live(record) => Some(record),
            Entry::Dead(_) => None,
        }
    }

    pub fn live_mut(&mut self, addr: Address) -> Option<&mut T> {
        match self.entries.get_mut(&addr)? {
            Entry::Live(record) => Some(record),
            Entry::Dead(_) => None,
        }
    }

    pub fn is_live(&self, addr: Address) -> bool {
        self.live(addr).is_some()
    }

    /// Stores a live record at `addr`, replacing whatever was there.
    pub(crate) fn insert_live(&mut self, addr: Address, record: T) {
        self.entries.insert(addr, Entry::Live(record));
    }

    /// Marks the record at `addr` dead. Returns `false` if there was no live
    /// record to kill.
    pub(crate) fn kill(&mut self, addr: Address) -> bool
    where
        T: Default,
    {
        let Some(entry) = self.entries.get_mut(&addr) else {
            return false;
        };
        let Entry::Live(record) = entry else {
            return false;
        };
        let record = mem::take(record);
        *entry = Entry::Dead(record);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_live()).count()
    }
}

/// All entity tables owned by a replay.
#[derive(Debug, Default, Clone)]
pub struct EntityTables {
    pub engines: EngineTable,
    pub values: ValueTable,
    pub functions: FunctionTable,
}
