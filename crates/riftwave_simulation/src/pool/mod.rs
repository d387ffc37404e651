//! Object pooling (projectiles, effects, enemies)
//!
//! - registry: generic `PoolRegistry<T>` (acquire/release/prewarm, delayed release)
//! - entity: ECS binding (`EntityPool`, `Dormant` marker, lifecycle hooks)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod entity;
pub mod registry;

#[cfg(test)]
mod registry_tests;

pub use entity::{
    acquire_entity, acquire_entity_or_overflow, release_entity, spawn_pooled_effect, tick_pools,
    Dormant, EntityLifecycle, EntityPool, Pooled, PrototypeTag,
};
pub use registry::{
    PoolError, PoolHandle, PoolLifecycle, PoolRegistry, PoolStats, PrototypeId, PrototypeKey,
    MAX_POOL_SLOTS,
};

/// Per-prototype pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct PrototypePoolConfig {
    pub prototype: PrototypeId,
    pub capacity: usize,
    #[serde(default)]
    pub prewarm: usize,
}

/// Pool sizing (defaults: 50 max, 10 prewarmed per prototype).
#[derive(Resource, Debug, Clone, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity for prototypes that are not listed explicitly
    pub default_capacity: usize,
    /// Prewarm count for listed prototypes without their own value
    pub default_prewarm: usize,
    pub prototypes: Vec<PrototypePoolConfig>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_capacity: 50,
            default_prewarm: 10,
            prototypes: Vec::new(),
        }
    }
}

/// Startup system: register configured prototypes and prewarm them.
pub fn setup_pools(
    config: Res<PoolConfig>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
) {
    let mut lifecycle = EntityLifecycle::new(&mut commands);

    for entry in &config.prototypes {
        pool.register(entry.prototype.clone(), entry.capacity);

        let prewarm = if entry.prewarm > 0 {
            entry.prewarm
        } else {
            config.default_prewarm
        };

        match pool.prewarm(&entry.prototype, prewarm, &mut lifecycle) {
            Ok(built) => crate::logger::log_info(&format!(
                "Pool '{}': capacity {}, prewarmed {}",
                entry.prototype, entry.capacity, built
            )),
            Err(err) => crate::logger::log_error(&format!("Pool setup failed: {}", err)),
        }
    }
}

/// Pool Plugin
///
/// `EntityPool` resource + Startup prewarm. Delayed releases tick in
/// `SimulationPlugin`'s chained FixedUpdate set.
pub struct PoolPlugin;

impl Plugin for PoolPlugin {
    fn build(&self, app: &mut App) {
        let default_capacity = app
            .world()
            .get_resource::<PoolConfig>()
            .map(|config| config.default_capacity)
            .unwrap_or_else(|| PoolConfig::default().default_capacity);

        app.init_resource::<PoolConfig>()
            .insert_resource(EntityPool::new(default_capacity))
            .add_systems(Startup, setup_pools);
    }
}
