//! Combat module
//!
//! ECS ответственность:
//! - Damage rules: HitLanded → Health → DamageDealt / EntityDied
//! - Projectiles: полёт, max range, реакция на столкновения, гранаты (fuse)
//! - Melee strikes врагов (reach validation)
//!
//! Вне симуляции (внешний physics слой):
//! - collision detection → `CollisionOccurred`

use bevy::prelude::*;

pub mod damage;
pub mod melee;
pub mod projectile;

#[cfg(test)]
mod combat_tests;

pub use damage::{apply_damage, DamageDealt, DamageSource, EntityDied, HitLanded};
pub use melee::{resolve_enemy_attacks, MeleeStrike, MELEE_REACH_TOLERANCE};
pub use projectile::{
    detonate_explosives, launch_projectile, move_projectiles, process_collisions, CombatConfig,
    ExplosiveCharge, Projectile, ProjectileLaunch, IMPACT_EFFECT_LIFETIME,
};

/// Событие от physics слоя: две entity столкнулись
#[derive(Event, Debug, Clone, Copy)]
pub struct CollisionOccurred {
    pub a: Entity,
    pub b: Entity,
    pub contact_point: Vec3,
}

/// Combat Plugin
///
/// Регистрирует события и `CombatConfig`. Порядок выполнения (FixedUpdate):
/// 1. move_projectiles (Movement)
/// 2. resolve_enemy_attacks → process_collisions → detonate_explosives → apply_damage (Combat)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .add_event::<CollisionOccurred>()
            .add_event::<MeleeStrike>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            FixedUpdate,
            move_projectiles.in_set(crate::SimulationSet::Movement),
        )
        .add_systems(
            FixedUpdate,
            (
                resolve_enemy_attacks,
                process_collisions,
                detonate_explosives,
                apply_damage,
            )
                .chain()
                .in_set(crate::SimulationSet::Combat),
        );
    }
}
