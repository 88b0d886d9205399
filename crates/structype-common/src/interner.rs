//! String interning for property names, parameter names and literal values.
//!
//! Every name that appears in a type descriptor is stored once and referred
//! to by a 4-byte [`Atom`]. Comparing atoms is an integer comparison, which
//! keeps structural type identity cheap.
//!
//! The interner is sharded over `DashMap` so that several threads can build
//! descriptors against the same interner at once.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Interned string handle.
///
/// Atoms are only meaningful for the interner that produced them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string. Pre-registered by every interner.
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Concurrent string interner.
pub struct ShardedInterner {
    map: DashMap<Arc<str>, Atom>,
    strings: DashMap<u32, Arc<str>>,
    next: AtomicU32,
}

impl ShardedInterner {
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::new(),
            strings: DashMap::new(),
            next: AtomicU32::new(0),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Atom::EMPTY);
        interner
    }

    /// Intern `value`, returning the existing atom if it was seen before.
    pub fn intern(&self, value: &str) -> Atom {
        if let Some(atom) = self.map.get(value) {
            return *atom;
        }
        let key: Arc<str> = Arc::from(value);
        match self.map.entry(key.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let atom = Atom(self.next.fetch_add(1, Ordering::Relaxed));
                // Publish the reverse mapping before the forward one becomes visible.
                self.strings.insert(atom.0, key);
                entry.insert(atom);
                atom
            }
        }
    }

    /// Look up an already-interned string without inserting it.
    pub fn get(&self, value: &str) -> Option<Atom> {
        self.map.get(value).map(|atom| *atom)
    }

    /// Resolve an atom back to its string.
    ///
    /// Unknown atoms resolve to the empty string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.strings
            .get(&atom.0)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_preregistered() {
        let interner = ShardedInterner::new();
        assert_eq!(interner.get(""), Some(Atom::EMPTY));
        assert_eq!(&*interner.resolve(Atom::EMPTY), "");
    }

    #[test]
    fn interning_deduplicates() {
        let interner = ShardedInterner::new();
        let foo = interner.intern("foo");
        let bar = interner.intern("bar");
        assert_eq!(foo, interner.intern("foo"));
        assert_ne!(foo, bar);
        assert_eq!(&*interner.resolve(bar), "bar");
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn unknown_atom_resolves_to_empty() {
        let interner = ShardedInterner::new();
        assert_eq!(&*interner.resolve(Atom(9_999)), "");
    }

    #[test]
    fn concurrent_interning_agrees() {
        let interner = ShardedInterner::new();
        let atoms: Vec<Vec<Atom>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        (0..64)
                            .map(|i| interner.intern(&format!("name{i}")))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_default())
                .collect()
        });
        for run in &atoms[1..] {
            assert_eq!(run, &atoms[0]);
        }
        assert_eq!(interner.len(), 65);
    }
}
