//! Entity pooling: the registry over ECS entities.
//!
//! Неактивная entity не удаляется, а помечается `Dormant`: все
//! gameplay системы фильтруют `Without<Dormant>`.

use bevy::prelude::*;

use super::registry::{PoolHandle, PoolLifecycle, PoolRegistry, PrototypeId};

/// Registry of pooled entities (enemies, projectiles, effects).
pub type EntityPool = PoolRegistry<Entity>;

/// Marker: entity sits in a free list (deactivated, never despawned).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dormant;

/// Prototype the entity was constructed from.
#[derive(Component, Debug, Clone)]
pub struct PrototypeTag(pub PrototypeId);

/// Handle issued for the entity's current life.
///
/// Re-inserted on every acquire; stale after release.
#[derive(Component, Debug, Clone, Copy)]
pub struct Pooled {
    pub handle: PoolHandle,
}

/// Pool hooks backed by deferred `Commands`.
pub struct EntityLifecycle<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
}

impl<'a, 'w, 's> EntityLifecycle<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self { commands }
    }
}

impl PoolLifecycle<Entity> for EntityLifecycle<'_, '_, '_> {
    fn construct(&mut self, prototype: &PrototypeId) -> Entity {
        let entity = self
            .commands
            .spawn((Dormant, PrototypeTag(prototype.clone()), Transform::default()))
            .id();
        crate::logger::log(&format!("Created pooled entity {:?} ({})", entity, prototype));
        entity
    }

    fn on_acquire(&mut self, object: &mut Entity) {
        self.commands.entity(*object).remove::<Dormant>();
    }

    fn on_release(&mut self, object: &mut Entity) {
        self.commands.entity(*object).insert(Dormant).remove::<Pooled>();
    }

    fn on_destroy(&mut self, object: Entity) {
        self.commands.entity(object).despawn();
    }
}

/// System: advance delayed pool releases.
pub fn tick_pools(
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    pool.tick(delta, &mut EntityLifecycle::new(&mut commands));
}

/// Acquire a pooled entity and stamp it with its handle.
///
/// Caller inserts the per-life components afterwards (insert overwrites
/// whatever the previous life left behind).
pub fn acquire_entity(
    pool: &mut EntityPool,
    commands: &mut Commands,
    prototype: &PrototypeId,
) -> Result<(Entity, PoolHandle), super::PoolError> {
    let handle = pool.acquire(prototype, &mut EntityLifecycle::new(commands))?;
    stamp_handle(pool, commands, prototype, handle)
}

/// Like `acquire_entity`, but past capacity builds a throwaway instance
/// that is despawned on release.
pub fn acquire_entity_or_overflow(
    pool: &mut EntityPool,
    commands: &mut Commands,
    prototype: &PrototypeId,
) -> Result<(Entity, PoolHandle), super::PoolError> {
    let handle = pool.acquire_or_overflow(prototype, &mut EntityLifecycle::new(commands))?;
    stamp_handle(pool, commands, prototype, handle)
}

fn stamp_handle(
    pool: &EntityPool,
    commands: &mut Commands,
    prototype: &PrototypeId,
    handle: PoolHandle,
) -> Result<(Entity, PoolHandle), super::PoolError> {
    let Some(&entity) = pool.get(&handle) else {
        return Err(super::PoolError::UnknownPrototype(prototype.clone()));
    };
    commands.entity(entity).insert(Pooled { handle });
    Ok((entity, handle))
}

/// Acquire a short-lived pooled entity at `position` and schedule its
/// return after `lifetime` seconds (impact sparks, explosions, bursts).
pub fn spawn_pooled_effect(
    pool: &mut EntityPool,
    commands: &mut Commands,
    prototype: &PrototypeId,
    position: Vec3,
    lifetime: f32,
) -> Result<Entity, super::PoolError> {
    let (entity, handle) = acquire_entity(pool, commands, prototype)?;
    commands
        .entity(entity)
        .insert(Transform::from_translation(position));
    pool.release(handle, lifetime, &mut EntityLifecycle::new(commands));
    Ok(entity)
}

/// Release a pooled entity (optionally delayed). No-op for stale handles.
pub fn release_entity(
    pool: &mut EntityPool,
    commands: &mut Commands,
    pooled: &Pooled,
    delay: f32,
) -> bool {
    pool.release(pooled.handle, delay, &mut EntityLifecycle::new(commands))
}
