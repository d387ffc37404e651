//! Enemy AI
//!
//! - archetype: per-prototype параметры (speed, attack range, cooldowns, специализация)
//! - graph: Idle/Move/Chase/Attack/Recovery/Ability/Dead поверх `BehaviorStateMachine`
//! - systems: ECS glue (brains → intents → MovementInput/MeleeStrike/axes)

use bevy::prelude::*;

pub mod archetype;
pub mod graph;
pub mod systems;


pub use archetype::{
    default_archetypes, ArchetypeBehavior, AxeThrowParams, DodgeParams, EnemyArchetype,
    EnemyArchetypes, ENEMY_FACTION,
};
pub use graph::{EnemyContext, EnemyGraph, EnemyIntents, EnemyState};
pub use systems::{
    force_dead_state_on_death, release_finished_enemies, update_enemy_brains, AnimationDurations,
    EnemyBrain, EnemyStateChanged,
};

/// Enemy Plugin
///
/// Порядок выполнения:
/// 1. update_enemy_brains (Behavior)
/// 2. force_dead_state_on_death → release_finished_enemies (Death)
pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<EnemyArchetypes>() {
            app.insert_resource(EnemyArchetypes::new(default_archetypes()));
        }

        app.init_resource::<AnimationDurations>()
            .add_event::<EnemyStateChanged>();

        app.add_systems(
            FixedUpdate,
            update_enemy_brains.in_set(crate::SimulationSet::Behavior),
        )
        .add_systems(
            FixedUpdate,
            (force_dead_state_on_death, release_finished_enemies)
                .chain()
                .in_set(crate::SimulationSet::Death),
        );
    }
}
