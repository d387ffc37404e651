//! Abilities: timed state machine per ability + per-actor scheduler
//!
//! - definition: immutable `AbilityDefinition` (shared через `Arc`)
//! - instance: `AbilityInstance` (Ready → Activating → Active → Cooldown)
//! - scheduler: `AbilityScheduler` component (conflict rules, one request per tick)
//! - systems: input events → scheduler → ECS events/effects

use bevy::prelude::*;

pub mod definition;
pub mod instance;
pub mod scheduler;
pub mod systems;


pub use definition::{AbilityCost, AbilityDefinition, AbilityEffect, AbilityKind};
pub use instance::{AbilityActor, AbilityInstance, AbilitySignal, AbilityState};
pub use scheduler::{AbilityError, AbilityScheduler};
pub use systems::{
    cancel_abilities_on_death, collect_activation_requests, tick_ability_schedulers,
    AbilityActivationRequested, AbilityExecuted, AbilityOutputs, AbilityStateChanged, ActorVitals,
    SignalTarget, ACTIVATION_EFFECT_LIFETIME,
};

/// Ability Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. collect_activation_requests: input → pending request
/// 2. tick_ability_schedulers: tick + resolve + signals → events (Abilities)
/// 3. cancel_abilities_on_death: после apply_damage, сигналы отмены в том же tick (Death)
pub struct AbilityPlugin;

impl Plugin for AbilityPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AbilityActivationRequested>()
            .add_event::<AbilityStateChanged>()
            .add_event::<AbilityExecuted>();

        app.add_systems(
            FixedUpdate,
            (collect_activation_requests, tick_ability_schedulers)
                .chain()
                .in_set(crate::SimulationSet::Abilities),
        )
        .add_systems(
            FixedUpdate,
            cancel_abilities_on_death.in_set(crate::SimulationSet::Death),
        );
    }
}
