// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hook cache with wholesale invalidation.
//!
//! Resolved hooks are memoized per (direction, type key). The whole map is
//! swapped out atomically whenever the registry is mutated, so readers that
//! captured the previous map complete against pre-registration state and
//! never observe a half-invalidated cache. Entries are fill-once slots;
//! an unfilled slot reachable from the resolution stack backs the
//! forward-reference proxies that make recursive type graphs safe.

use crate::key::TypeKey;
use crate::registry::{Direction, Hook};
use crate::union::UnionTable;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// A fill-once cell holding a resolved hook.
///
/// Slots are created empty when resolution for a key starts; hooks invoke
/// recursive references through the slot rather than a direct function
/// value.
pub(crate) struct HookSlot {
    cell: OnceLock<Hook>,
}

impl HookSlot {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Fill the slot. The first fill wins; later fills are discarded.
    pub(crate) fn fill(&self, hook: Hook) {
        let _ = self.cell.set(hook);
    }

    pub(crate) fn get(&self) -> Option<&Hook> {
        self.cell.get()
    }
}

/// One atomically-swapped cache state.
pub(crate) struct CacheSnapshot {
    /// Resolved (direction, key) slots.
    pub(crate) hooks: DashMap<(Direction, TypeKey), Arc<HookSlot>>,
    /// Union disambiguation fingerprint tables, cached per union key under
    /// the same invalidation regime as hooks.
    pub(crate) unions: DashMap<TypeKey, Arc<UnionTable>>,
}

impl CacheSnapshot {
    fn new() -> Self {
        Self {
            hooks: DashMap::new(),
            unions: DashMap::new(),
        }
    }
}

/// Memoization cache owned by one converter.
pub(crate) struct HookCache {
    snapshot: ArcSwap<CacheSnapshot>,
    generation: AtomicU64,
}

impl HookCache {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(CacheSnapshot::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current cache state. Readers keep the returned snapshot alive for
    /// the whole resolution, so a concurrent invalidation never corrupts
    /// an in-flight lookup.
    pub(crate) fn load(&self) -> Arc<CacheSnapshot> {
        self.snapshot.load_full()
    }

    /// Drop every entry. Called after every registry mutation.
    pub(crate) fn invalidate_all(&self) {
        self.snapshot.store(Arc::new(CacheSnapshot::new()));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("hook cache invalidated (generation {})", generation);
    }

    /// Number of completed invalidations.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;
    use crate::structured::Structured;

    #[test]
    fn test_slot_first_fill_wins() {
        let slot = HookSlot::new();
        assert!(slot.get().is_none());

        slot.fill(Hook::structure(|_| Ok(Structured::I64(1))));
        slot.fill(Hook::structure(|_| Ok(Structured::I64(2))));

        let hook = slot.get().expect("filled");
        assert_eq!(
            hook.apply_structure(&crate::value::Value::Null),
            Ok(Structured::I64(1))
        );
    }

    #[test]
    fn test_invalidation_swaps_map_and_bumps_generation() {
        let cache = HookCache::new();
        let key = (
            Direction::Structure,
            TypeKey::Primitive(PrimitiveKind::Bool),
        );

        let before = cache.load();
        before.hooks.insert(key.clone(), Arc::new(HookSlot::new()));
        assert_eq!(cache.generation(), 0);

        cache.invalidate_all();
        assert_eq!(cache.generation(), 1);

        let after = cache.load();
        assert!(after.hooks.get(&key).is_none());
        // The captured snapshot is still intact for in-flight readers.
        assert!(before.hooks.get(&key).is_some());
    }
}
