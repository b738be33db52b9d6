//! # Entity: Ids for Game Objects
//!
//! An [`Entity`] carries no data of its own. It is a key the
//! [`World`](super::world::World) uses to find the entity's name, tag and
//! components.
//!
//! ## Design: Never-Reused Ids
//!
//! Collision handlers and scene code hold on to entity handles across frames,
//! and a handle must never start pointing at something else:
//!
//! ```text
//! 1. bullet = Entity(5), stored by the ship's on_enter handler
//! 2. bullet hits a rock, destroy(bullet), flush
//! 3. next spawn takes slot 5 again
//! 4. handler calls destroy(bullet): the new entity dies instead
//! ```
//!
//! Generational indices solve this with a second counter. We take the simpler
//! route: ids come from one monotonically increasing `u64` counter shared by
//! every world in the process, so an id is never handed out twice during a
//! run. Scenes each own a world, and a handle that leaks from one scene into
//! another can never alias an entity there.
//!
//! A `u64` at one allocation per nanosecond lasts for centuries, so overflow
//! is not a concern.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A lightweight handle to an entity in a [`World`](super::world::World).
///
/// Created via [`World::spawn`](super::world::World::spawn) and destroyed via
/// [`World::destroy`](super::world::World::destroy).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    pub(crate) id: u64,
}

impl Entity {
    /// Returns the raw id. Useful for diagnostics and stable ordering.
    pub fn id(self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Hands out entity ids.
///
/// Tracks how many entities this allocator's world currently holds; the id
/// sequence itself is process-wide.
pub(crate) struct EntityAllocator {
    alive: usize,
    #[cfg(any(feature = "diagnostics", test))]
    total: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            alive: 0,
            #[cfg(any(feature = "diagnostics", test))]
            total: 0,
        }
    }

    /// Allocate a fresh [`Entity`]. Ids strictly increase across calls.
    pub fn allocate(&mut self) -> Entity {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        self.alive += 1;
        #[cfg(any(feature = "diagnostics", test))]
        {
            self.total += 1;
        }
        Entity { id }
    }

    /// Record that an entity held by this allocator's world was removed.
    pub fn release(&mut self) {
        self.alive = self.alive.saturating_sub(1);
    }

    /// Number of entities allocated and not yet released.
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Total number of entities this allocator ever handed out.
    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn total_allocated(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        assert!(e0 < e1);
        assert!(e1 < e2);
    }

    #[test]
    fn ids_unique_across_allocators() {
        let mut a = EntityAllocator::new();
        let mut b = EntityAllocator::new();
        let ea = a.allocate();
        let eb = b.allocate();
        assert_ne!(ea, eb);
    }

    #[test]
    fn alive_count_tracks_release() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.alive_count(), 0);
        alloc.allocate();
        alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.release();
        assert_eq!(alloc.alive_count(), 1);
        assert_eq!(alloc.total_allocated(), 2);
    }

    #[test]
    fn debug_format() {
        let e = Entity { id: 7 };
        assert_eq!(format!("{e:?}"), "Entity(7)");
        assert_eq!(format!("{e}"), "#7");
    }
}
