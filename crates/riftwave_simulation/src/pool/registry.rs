//! Pooled Object Registry: reusable instances keyed by prototype.
//!
//! Инварианты:
//! - handle выдаётся одному потребителю; повторно слот выдаётся только после release
//! - release идемпотентен (второй release того же handle: no-op)
//! - construct/destroy только на prewarm, acquire-miss, overflow и teardown

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable prototype identity (prefab name in config).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
#[serde(transparent)]
pub struct PrototypeId(pub String);

impl PrototypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrototypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Hard cap on slots per prototype (slot index is `u32`).
pub const MAX_POOL_SLOTS: usize = u32::MAX as usize;

/// Interned prototype index inside one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrototypeKey(u32);

/// Opaque handle: valid only between acquire and the matching release.
///
/// Generation bumps on every release, so a stale handle never aliases
/// the next occupant of the same slot. Epoch bumps on teardown, which
/// covers slots rebuilt from index 0 after `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    prototype: PrototypeKey,
    epoch: u32,
    slot: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn prototype(&self) -> PrototypeKey {
        self.prototype
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool '{prototype}' exhausted (capacity {capacity})")]
    CapacityExceeded { prototype: PrototypeId, capacity: usize },

    #[error("no pool registered for prototype '{0}'")]
    UnknownPrototype(PrototypeId),
}

/// Hooks a pool invokes around an instance's life.
///
/// Mirrors the classic create / get / release / destroy callback quartet.
pub trait PoolLifecycle<T> {
    fn construct(&mut self, prototype: &PrototypeId) -> T;

    fn on_acquire(&mut self, _object: &mut T) {}

    fn on_release(&mut self, _object: &mut T) {}

    fn on_destroy(&mut self, _object: T) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Active,
    /// Constructed beyond capacity; destroyed instead of pooled on release.
    Overflow,
    /// Overflow slot whose object was destroyed; reusable for the next overflow.
    Vacant,
}

#[derive(Debug)]
struct Slot<T> {
    object: Option<T>,
    generation: u32,
    state: SlotState,
}

#[derive(Debug)]
struct PrototypePool<T> {
    id: PrototypeId,
    capacity: usize,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    vacant: Vec<u32>,
    /// Live instances counted against capacity (overflow excluded).
    pooled: usize,
    /// Teardown counter
    epoch: u32,
}

impl<T> PrototypePool<T> {
    fn new(id: PrototypeId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            vacant: Vec::new(),
            pooled: 0,
            epoch: 0,
        }
    }

    /// Index the next pushed slot will get; fails once `u32` runs out.
    fn next_slot_index(&self) -> Result<u32, PoolError> {
        u32::try_from(self.slots.len()).map_err(|_| PoolError::CapacityExceeded {
            prototype: self.id.clone(),
            capacity: self.capacity,
        })
    }

    fn push_slot(&mut self, index: u32, object: T, state: SlotState) -> u32 {
        debug_assert_eq!(index as usize, self.slots.len());
        self.slots.push(Slot {
            object: Some(object),
            generation: 0,
            state,
        });
        index
    }

    fn handle(&self, key: PrototypeKey, slot: u32) -> PoolHandle {
        PoolHandle {
            prototype: key,
            epoch: self.epoch,
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    /// Slot the handle points to, if the handle belongs to this pool's epoch
    /// and the slot generation still matches.
    fn slot_of(&self, handle: &PoolHandle) -> Option<&Slot<T>> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    fn slot_of_mut(&mut self, handle: &PoolHandle) -> Option<&mut Slot<T>> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
    }
}

fn clamp_capacity(prototype: &PrototypeId, capacity: usize) -> usize {
    if capacity > MAX_POOL_SLOTS {
        crate::logger::log_warning(&format!(
            "Pool '{}': capacity {} clamped to {}",
            prototype, capacity, MAX_POOL_SLOTS
        ));
    }
    capacity.min(MAX_POOL_SLOTS)
}

#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    handle: PoolHandle,
    remaining: f32,
}

/// Snapshot of one prototype's pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub capacity: usize,
    pub pooled: usize,
    pub active: usize,
    pub free: usize,
    pub overflow: usize,
}

/// Registry of per-prototype pools.
#[derive(Resource)]
pub struct PoolRegistry<T: Send + Sync + 'static> {
    pools: Vec<PrototypePool<T>>,
    index: HashMap<PrototypeId, PrototypeKey>,
    pending: Vec<PendingRelease>,
    default_capacity: usize,
    auto_register: bool,
}

impl<T: Send + Sync + 'static> Default for PoolRegistry<T> {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<T: Send + Sync + 'static> PoolRegistry<T> {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            pools: Vec::new(),
            index: HashMap::new(),
            pending: Vec::new(),
            default_capacity,
            auto_register: true,
        }
    }

    /// Unknown prototypes fail with `UnknownPrototype` instead of getting a default pool.
    pub fn with_strict_registration(mut self) -> Self {
        self.auto_register = false;
        self
    }

    /// Register a prototype. Re-registering keeps the pool and updates capacity.
    pub fn register(&mut self, prototype: PrototypeId, capacity: usize) -> PrototypeKey {
        let capacity = clamp_capacity(&prototype, capacity);
        if let Some(&key) = self.index.get(&prototype) {
            let pool = &mut self.pools[key.0 as usize];
            if pool.capacity != capacity {
                crate::logger::log(&format!(
                    "Pool '{}': capacity {} → {}",
                    prototype, pool.capacity, capacity
                ));
                pool.capacity = capacity;
            }
            return key;
        }

        let key = PrototypeKey(self.pools.len() as u32);
        self.pools.push(PrototypePool::new(prototype.clone(), capacity));
        self.index.insert(prototype, key);
        key
    }

    pub fn key_of(&self, prototype: &PrototypeId) -> Option<PrototypeKey> {
        self.index.get(prototype).copied()
    }

    pub fn prototype_of(&self, handle: &PoolHandle) -> Option<&PrototypeId> {
        self.pools.get(handle.prototype.0 as usize).map(|pool| &pool.id)
    }

    fn resolve(&mut self, prototype: &PrototypeId) -> Result<PrototypeKey, PoolError> {
        if let Some(key) = self.key_of(prototype) {
            return Ok(key);
        }
        if !self.auto_register {
            return Err(PoolError::UnknownPrototype(prototype.clone()));
        }

        crate::logger::log_warning(&format!(
            "No pool for '{}' - creating one on the fly (capacity {})",
            prototype, self.default_capacity
        ));
        Ok(self.register(prototype.clone(), self.default_capacity))
    }

    /// Eagerly construct up to `count` inactive instances (bounded by capacity).
    ///
    /// Returns how many were actually constructed.
    pub fn prewarm(
        &mut self,
        prototype: &PrototypeId,
        count: usize,
        lifecycle: &mut impl PoolLifecycle<T>,
    ) -> Result<usize, PoolError> {
        let key = self.resolve(prototype)?;
        let pool = &mut self.pools[key.0 as usize];

        let room = pool.capacity.saturating_sub(pool.pooled);
        let to_build = count.min(room);
        for _ in 0..to_build {
            let index = pool.next_slot_index()?;
            let object = lifecycle.construct(&pool.id);
            let slot = pool.push_slot(index, object, SlotState::Free);
            pool.free.push(slot);
            pool.pooled += 1;
        }

        if to_build < count {
            crate::logger::log_warning(&format!(
                "Pool '{}': prewarm {} requested, capacity allows {}",
                pool.id, count, to_build
            ));
        }
        Ok(to_build)
    }

    /// Take an inactive instance, constructing one on a free-list miss.
    pub fn acquire(
        &mut self,
        prototype: &PrototypeId,
        lifecycle: &mut impl PoolLifecycle<T>,
    ) -> Result<PoolHandle, PoolError> {
        let key = self.resolve(prototype)?;
        let pool = &mut self.pools[key.0 as usize];

        let slot_index = if let Some(slot_index) = pool.free.pop() {
            slot_index
        } else if pool.pooled < pool.capacity {
            let index = pool.next_slot_index()?;
            let object = lifecycle.construct(&pool.id);
            pool.pooled += 1;
            pool.push_slot(index, object, SlotState::Free)
        } else {
            return Err(PoolError::CapacityExceeded {
                prototype: pool.id.clone(),
                capacity: pool.capacity,
            });
        };

        let slot = &mut pool.slots[slot_index as usize];
        slot.state = SlotState::Active;
        if let Some(object) = slot.object.as_mut() {
            lifecycle.on_acquire(object);
        }

        Ok(pool.handle(key, slot_index))
    }

    /// Like `acquire`, but on exhaustion force-constructs a throwaway
    /// instance that is destroyed (not pooled) when released.
    pub fn acquire_or_overflow(
        &mut self,
        prototype: &PrototypeId,
        lifecycle: &mut impl PoolLifecycle<T>,
    ) -> Result<PoolHandle, PoolError> {
        match self.acquire(prototype, lifecycle) {
            Err(PoolError::CapacityExceeded { .. }) => {}
            other => return other,
        }

        let key = self.resolve(prototype)?;
        let pool = &mut self.pools[key.0 as usize];
        let reuse = pool.vacant.pop();
        let index = match reuse {
            Some(slot_index) => slot_index,
            None => pool.next_slot_index()?,
        };
        let mut object = lifecycle.construct(&pool.id);
        lifecycle.on_acquire(&mut object);

        let slot_index = match reuse {
            Some(slot_index) => {
                let slot = &mut pool.slots[slot_index as usize];
                slot.object = Some(object);
                slot.state = SlotState::Overflow;
                slot_index
            }
            None => pool.push_slot(index, object, SlotState::Overflow),
        };

        crate::logger::log(&format!(
            "Pool '{}': overflow instance in slot {}",
            pool.id, slot_index
        ));

        Ok(pool.handle(key, slot_index))
    }

    /// Release a handle. `delay <= 0` deactivates immediately, otherwise a
    /// cancellable countdown is scheduled and advanced by [`Self::tick`].
    ///
    /// Returns false for stale/already-released handles (no-op).
    pub fn release(
        &mut self,
        handle: PoolHandle,
        delay: f32,
        lifecycle: &mut impl PoolLifecycle<T>,
    ) -> bool {
        if !self.is_active(&handle) {
            return false;
        }

        if delay <= 0.0 {
            self.cancel_release(&handle);
            return self.release_now(handle, lifecycle);
        }

        match self.pending.iter_mut().find(|pending| pending.handle == handle) {
            Some(pending) => pending.remaining = pending.remaining.min(delay),
            None => self.pending.push(PendingRelease {
                handle,
                remaining: delay,
            }),
        }
        true
    }

    /// Drop a scheduled delayed release. Returns true if one was pending.
    pub fn cancel_release(&mut self, handle: &PoolHandle) -> bool {
        match self.pending.iter().position(|pending| pending.handle == *handle) {
            Some(index) => {
                self.pending.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_release_pending(&self, handle: &PoolHandle) -> bool {
        self.pending.iter().any(|pending| pending.handle == *handle)
    }

    /// Advance delayed releases by `delta` seconds.
    pub fn tick(&mut self, delta: f32, lifecycle: &mut impl PoolLifecycle<T>) {
        let mut index = 0;
        while index < self.pending.len() {
            self.pending[index].remaining -= delta;
            if self.pending[index].remaining <= 0.0 {
                let handle = self.pending.swap_remove(index).handle;
                self.release_now(handle, lifecycle);
            } else {
                index += 1;
            }
        }
    }

    fn release_now(&mut self, handle: PoolHandle, lifecycle: &mut impl PoolLifecycle<T>) -> bool {
        let Some(pool) = self.pools.get_mut(handle.prototype.0 as usize) else {
            return false;
        };
        let Some(slot) = pool.slot_of_mut(&handle) else {
            return false;
        };

        match slot.state {
            SlotState::Active => {
                slot.generation = slot.generation.wrapping_add(1);
                slot.state = SlotState::Free;
                if let Some(object) = slot.object.as_mut() {
                    lifecycle.on_release(object);
                }
                pool.free.push(handle.slot);
                true
            }
            SlotState::Overflow => {
                slot.generation = slot.generation.wrapping_add(1);
                slot.state = SlotState::Vacant;
                if let Some(mut object) = slot.object.take() {
                    lifecycle.on_release(&mut object);
                    lifecycle.on_destroy(object);
                }
                pool.vacant.push(handle.slot);
                true
            }
            SlotState::Free | SlotState::Vacant => false,
        }
    }

    /// True while the handle refers to an issued (active or overflow) instance.
    pub fn is_active(&self, handle: &PoolHandle) -> bool {
        self.slot(handle)
            .map(|slot| matches!(slot.state, SlotState::Active | SlotState::Overflow))
            .unwrap_or(false)
    }

    fn slot(&self, handle: &PoolHandle) -> Option<&Slot<T>> {
        self.pools.get(handle.prototype.0 as usize)?.slot_of(handle)
    }

    pub fn get(&self, handle: &PoolHandle) -> Option<&T> {
        self.slot(handle)
            .filter(|slot| matches!(slot.state, SlotState::Active | SlotState::Overflow))
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, handle: &PoolHandle) -> Option<&mut T> {
        let slot = self
            .pools
            .get_mut(handle.prototype.0 as usize)?
            .slot_of_mut(handle)?;
        if !matches!(slot.state, SlotState::Active | SlotState::Overflow) {
            return None;
        }
        slot.object.as_mut()
    }

    pub fn free_len(&self, prototype: &PrototypeId) -> usize {
        self.stats(prototype).map(|stats| stats.free).unwrap_or(0)
    }

    pub fn stats(&self, prototype: &PrototypeId) -> Option<PoolStats> {
        let pool = &self.pools[self.key_of(prototype)?.0 as usize];
        let mut stats = PoolStats {
            capacity: pool.capacity,
            pooled: pool.pooled,
            free: pool.free.len(),
            ..Default::default()
        };
        for slot in &pool.slots {
            match slot.state {
                SlotState::Active => stats.active += 1,
                SlotState::Overflow => stats.overflow += 1,
                SlotState::Free | SlotState::Vacant => {}
            }
        }
        Some(stats)
    }

    /// Teardown: destroy every instance of every prototype.
    ///
    /// Pools stay registered (capacity kept) but hold nothing afterwards.
    /// Handles issued before teardown stay stale forever (epoch bump).
    pub fn clear(&mut self, lifecycle: &mut impl PoolLifecycle<T>) {
        self.pending.clear();
        for pool in &mut self.pools {
            for slot in pool.slots.drain(..) {
                if let Some(object) = slot.object {
                    lifecycle.on_destroy(object);
                }
            }
            pool.free.clear();
            pool.vacant.clear();
            pool.pooled = 0;
            pool.epoch = pool.epoch.wrapping_add(1);
        }
    }
}
