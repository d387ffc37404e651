//! Enemy ECS systems
//!
//! Порядок (FixedUpdate):
//! 1. update_enemy_brains: tick cooldowns + state machine → intents (Behavior)
//! 2. force_dead_state_on_death: EntityDied → Dead (Death)
//! 3. release_finished_enemies: Dead linger закончился → pool (Death)

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use super::archetype::{ArchetypeBehavior, EnemyArchetype};
use super::graph::{EnemyContext, EnemyGraph, EnemyState};
use crate::behavior::BehaviorStateMachine;
use crate::combat::{launch_projectile, EntityDied, MeleeStrike, ProjectileLaunch};
use crate::components::{Actor, Health, MovementInput, Player};
use crate::pool::{release_entity, Dormant, EntityPool, Pooled};

/// AI brain of one enemy life. Inserted fresh on every spawn, so pooled
/// reuse never carries cooldowns or state over.
#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    pub machine: BehaviorStateMachine<EnemyState>,
    pub graph: EnemyGraph,
    /// Set by the Dead state once the corpse linger is over
    pub release_requested: bool,
}

impl EnemyBrain {
    pub fn new(archetype: Arc<EnemyArchetype>, speed_scale: f32) -> Self {
        Self {
            machine: BehaviorStateMachine::new(),
            graph: EnemyGraph::new(archetype, speed_scale),
            release_requested: false,
        }
    }

    pub fn state(&self) -> Option<EnemyState> {
        self.machine.current()
    }
}

/// Animation-confirmed clip lengths, reported by the render layer.
#[derive(Resource, Debug, Clone, Default)]
pub struct AnimationDurations {
    clips: HashMap<String, f32>,
}

impl AnimationDurations {
    pub fn insert(&mut self, clip: impl Into<String>, duration: f32) {
        self.clips.insert(clip.into(), duration);
    }

    pub fn duration(&self, clip: &str) -> Option<f32> {
        self.clips.get(clip).copied()
    }
}

/// Событие: враг сменил состояние (анимация, отладка)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EnemyStateChanged {
    pub entity: Entity,
    pub from: Option<EnemyState>,
    pub to: EnemyState,
}

/// Система: tick enemy state machines → MovementInput / MeleeStrike / axe
pub fn update_enemy_brains(
    mut enemies: Query<
        (Entity, &mut EnemyBrain, &Transform, &mut MovementInput, Option<&Actor>),
        (Without<Dormant>, Without<Player>),
    >,
    players: Query<(Entity, &Transform, &Health), (With<Player>, Without<Dormant>)>,
    animations: Res<AnimationDurations>,
    mut strikes: EventWriter<MeleeStrike>,
    mut state_events: EventWriter<EnemyStateChanged>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    let target = players
        .iter()
        .find(|(_, _, health)| health.is_alive())
        .map(|(entity, transform, _)| (entity, transform.translation));

    for (entity, mut brain, transform, mut movement, actor) in enemies.iter_mut() {
        let EnemyBrain {
            machine,
            graph,
            release_requested,
        } = &mut *brain;

        let mut ctx = EnemyContext::new(transform.translation, target.map(|(_, position)| position));
        ctx.dodge_clip_duration = graph.dodge_clip().and_then(|clip| animations.duration(clip));

        if !machine.is_initialized() {
            machine.initialize(EnemyState::Idle, graph, &mut ctx);
            state_events.write(EnemyStateChanged {
                entity,
                from: None,
                to: EnemyState::Idle,
            });
        }

        graph.tick_cooldowns(delta);
        let before = machine.current();
        if let Some(next) = machine.update(delta, graph, &mut ctx) {
            crate::logger::log(&format!("Enemy {:?}: {:?} → {:?}", entity, before, next));
            state_events.write(EnemyStateChanged {
                entity,
                from: before,
                to: next,
            });
        }

        let intents = ctx.intents;
        movement.direction = intents.move_direction;
        movement.speed = intents.move_speed;

        if intents.strike {
            if let Some((player, _)) = target {
                strikes.write(MeleeStrike {
                    attacker: entity,
                    target: player,
                    damage: graph.archetype().attack_damage,
                    reach: graph.archetype().attack_range,
                });
            }
        }

        if let Some(direction) = intents.throw_axe {
            throw_axe(
                &mut pool,
                &mut commands,
                graph,
                entity,
                transform.translation,
                direction,
                actor.map(|actor| actor.faction_id),
            );
        }

        if intents.release {
            *release_requested = true;
        }
    }
}

fn throw_axe(
    pool: &mut EntityPool,
    commands: &mut Commands,
    graph: &EnemyGraph,
    owner: Entity,
    origin: Vec3,
    direction: Vec3,
    faction_id: Option<u64>,
) {
    let ArchetypeBehavior::AxeThrow(params) = &graph.archetype().behavior else {
        return;
    };

    let launch = ProjectileLaunch {
        prototype: params.projectile.clone(),
        origin: origin + Vec3::Y,
        direction,
        speed: params.fly_speed,
        damage: params.damage,
        max_range: params.flight_range,
        owner: Some(owner),
        faction_id,
        explosive: None,
        impact_effect: params.impact_effect.clone(),
    };
    if let Err(err) = launch_projectile(pool, commands, &launch) {
        crate::logger::log_warning(&format!("Axe throw by {:?} skipped: {}", owner, err));
    }
}

/// Система: death notification → forced transition в Dead
pub fn force_dead_state_on_death(
    mut deaths: EventReader<EntityDied>,
    mut enemies: Query<(&mut EnemyBrain, &Transform, &mut MovementInput)>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    for death in deaths.read() {
        let Ok((mut brain, transform, mut movement)) = enemies.get_mut(death.entity) else {
            continue;
        };
        let EnemyBrain { machine, graph, .. } = &mut *brain;

        let mut ctx = EnemyContext::new(transform.translation, None);
        let before = machine.current();
        let entered = if machine.is_initialized() {
            machine.change_state(EnemyState::Dead, graph, &mut ctx)
        } else {
            machine.initialize(EnemyState::Dead, graph, &mut ctx)
        };

        if entered {
            movement.stop();
            state_events.write(EnemyStateChanged {
                entity: death.entity,
                from: before,
                to: EnemyState::Dead,
            });
            crate::logger::log(&format!("Enemy {:?}: {:?} → Dead", death.entity, before));
        }
    }
}

/// Система: вернуть отлежавшие трупы в pool
pub fn release_finished_enemies(
    mut enemies: Query<(Entity, &mut EnemyBrain, &Pooled), Without<Dormant>>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
) {
    for (entity, mut brain, pooled) in enemies.iter_mut() {
        if !brain.release_requested {
            continue;
        }
        brain.release_requested = false;

        if release_entity(&mut pool, &mut commands, pooled, 0.0) {
            crate::logger::log(&format!("♻️ Enemy {:?} returned to pool", entity));
        }
    }
}
