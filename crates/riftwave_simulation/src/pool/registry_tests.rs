//! Tests for the pooled object registry.

#[cfg(test)]
mod tests {
    use super::super::registry::*;

    /// Counts hook invocations; objects are plain serial numbers.
    #[derive(Default)]
    struct CountingLifecycle {
        constructed: u32,
        acquired: u32,
        released: u32,
        destroyed: Vec<u32>,
    }

    impl PoolLifecycle<u32> for CountingLifecycle {
        fn construct(&mut self, _prototype: &PrototypeId) -> u32 {
            self.constructed += 1;
            self.constructed
        }

        fn on_acquire(&mut self, _object: &mut u32) {
            self.acquired += 1;
        }

        fn on_release(&mut self, _object: &mut u32) {
            self.released += 1;
        }

        fn on_destroy(&mut self, object: u32) {
            self.destroyed.push(object);
        }
    }

    fn bullet() -> PrototypeId {
        PrototypeId::new("bullet")
    }

    #[test]
    fn test_acquire_reuses_released_instance() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        let first = registry.acquire(&bullet(), &mut hooks).unwrap();
        let object = *registry.get(&first).unwrap();
        assert!(registry.release(first, 0.0, &mut hooks));

        let second = registry.acquire(&bullet(), &mut hooks).unwrap();
        assert_eq!(*registry.get(&second).unwrap(), object);
        assert_eq!(hooks.constructed, 1, "second acquire must hit the free list");
        assert_eq!(hooks.acquired, 2);
    }

    #[test]
    fn test_capacity_one_second_acquire_fails() {
        let mut registry = PoolRegistry::<u32>::new(50);
        let mut hooks = CountingLifecycle::default();
        registry.register(bullet(), 1);

        let _held = registry.acquire(&bullet(), &mut hooks).unwrap();
        let result = registry.acquire(&bullet(), &mut hooks);

        assert_eq!(
            result,
            Err(PoolError::CapacityExceeded {
                prototype: bullet(),
                capacity: 1
            })
        );
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        assert!(registry.release(handle, 0.0, &mut hooks));
        let free_after_first = registry.free_len(&bullet());

        assert!(!registry.release(handle, 0.0, &mut hooks));
        assert_eq!(registry.free_len(&bullet()), free_after_first);
        assert_eq!(hooks.released, 1);
    }

    #[test]
    fn test_stale_handle_does_not_touch_new_occupant() {
        let mut registry = PoolRegistry::<u32>::new(1);
        let mut hooks = CountingLifecycle::default();

        let stale = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.release(stale, 0.0, &mut hooks);
        let fresh = registry.acquire(&bullet(), &mut hooks).unwrap();

        assert_ne!(stale, fresh);
        assert!(registry.get(&stale).is_none());
        assert!(!registry.release(stale, 0.0, &mut hooks));
        assert!(registry.is_active(&fresh));
    }

    #[test]
    fn test_acquire_never_returns_held_handle() {
        let mut registry = PoolRegistry::<u32>::new(8);
        let mut hooks = CountingLifecycle::default();
        let mut held: Vec<PoolHandle> = Vec::new();

        // Interleave acquires and releases; every live handle must be unique.
        for step in 0..40u32 {
            if step % 3 == 2 && !held.is_empty() {
                let handle = held.remove((step as usize) % held.len());
                registry.release(handle, 0.0, &mut hooks);
                continue;
            }
            match registry.acquire(&bullet(), &mut hooks) {
                Ok(handle) => {
                    let object = *registry.get(&handle).unwrap();
                    for other in &held {
                        assert_ne!(*registry.get(other).unwrap(), object);
                    }
                    held.push(handle);
                }
                Err(PoolError::CapacityExceeded { .. }) => assert_eq!(held.len(), 8),
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_prewarm_respects_capacity() {
        let mut registry = PoolRegistry::<u32>::new(50);
        let mut hooks = CountingLifecycle::default();
        registry.register(bullet(), 3);

        let built = registry.prewarm(&bullet(), 10, &mut hooks).unwrap();
        assert_eq!(built, 3);

        let stats = registry.stats(&bullet()).unwrap();
        assert_eq!(stats.pooled, 3);
        assert_eq!(stats.free, 3);
        assert_eq!(stats.active, 0);

        // Prewarmed instances are handed out without construction.
        registry.acquire(&bullet(), &mut hooks).unwrap();
        assert_eq!(hooks.constructed, 3);
    }

    #[test]
    fn test_delayed_release_fires_after_countdown() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        assert!(registry.release(handle, 1.0, &mut hooks));
        assert!(registry.is_active(&handle));
        assert!(registry.is_release_pending(&handle));

        registry.tick(0.5, &mut hooks);
        assert!(registry.is_active(&handle));

        registry.tick(0.5, &mut hooks);
        assert!(!registry.is_active(&handle));
        assert_eq!(registry.free_len(&bullet()), 1);
    }

    #[test]
    fn test_cancel_delayed_release() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.release(handle, 0.25, &mut hooks);
        assert!(registry.cancel_release(&handle));

        registry.tick(1.0, &mut hooks);
        assert!(registry.is_active(&handle));
        assert_eq!(hooks.released, 0);
    }

    #[test]
    fn test_immediate_release_supersedes_pending_timer() {
        let mut registry = PoolRegistry::<u32>::new(1);
        let mut hooks = CountingLifecycle::default();

        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.release(handle, 1.0, &mut hooks);
        registry.release(handle, 0.0, &mut hooks);

        let next = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.tick(2.0, &mut hooks);
        assert!(registry.is_active(&next), "old timer must not release the new occupant");
    }

    #[test]
    fn test_overflow_instance_destroyed_on_release() {
        let mut registry = PoolRegistry::<u32>::new(50);
        let mut hooks = CountingLifecycle::default();
        registry.register(bullet(), 1);

        let pooled = registry.acquire(&bullet(), &mut hooks).unwrap();
        let overflow = registry.acquire_or_overflow(&bullet(), &mut hooks).unwrap();
        assert_eq!(registry.stats(&bullet()).unwrap().overflow, 1);

        let overflow_object = *registry.get(&overflow).unwrap();
        registry.release(overflow, 0.0, &mut hooks);
        assert_eq!(hooks.destroyed, vec![overflow_object]);
        assert_eq!(registry.free_len(&bullet()), 0);

        registry.release(pooled, 0.0, &mut hooks);
        assert_eq!(registry.free_len(&bullet()), 1);
    }

    #[test]
    fn test_strict_registry_rejects_unknown_prototype() {
        let mut registry = PoolRegistry::<u32>::new(4).with_strict_registration();
        let mut hooks = CountingLifecycle::default();

        assert_eq!(
            registry.acquire(&bullet(), &mut hooks),
            Err(PoolError::UnknownPrototype(bullet()))
        );
    }

    #[test]
    fn test_clear_destroys_everything() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        registry.prewarm(&bullet(), 2, &mut hooks).unwrap();
        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.clear(&mut hooks);

        assert_eq!(hooks.destroyed.len(), 2);
        assert!(!registry.is_active(&handle));
        assert_eq!(registry.stats(&bullet()).unwrap().pooled, 0);
    }

    #[test]
    fn test_handle_from_before_clear_stays_stale() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();

        let stale = registry.acquire(&bullet(), &mut hooks).unwrap();
        registry.clear(&mut hooks);
        let fresh = registry.acquire(&bullet(), &mut hooks).unwrap();

        // Слот 0 пересоздан, но старый handle его не видит
        assert_ne!(stale, fresh);
        assert!(!registry.is_active(&stale));
        assert!(registry.get(&stale).is_none());
        assert!(!registry.release(stale, 0.0, &mut hooks));
        assert!(!registry.release(stale, 0.5, &mut hooks));
        assert!(registry.is_active(&fresh));

        registry.tick(1.0, &mut hooks);
        assert!(registry.is_active(&fresh));
        assert_eq!(*registry.get(&fresh).unwrap(), hooks.constructed);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let mut registry = PoolRegistry::<u32>::new(4);
        let mut hooks = CountingLifecycle::default();
        registry.register(bullet(), usize::MAX);

        assert_eq!(registry.stats(&bullet()).unwrap().capacity, MAX_POOL_SLOTS);
        let handle = registry.acquire(&bullet(), &mut hooks).unwrap();
        assert!(registry.is_active(&handle));
    }
}
