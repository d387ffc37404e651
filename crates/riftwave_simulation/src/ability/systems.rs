//! Ability ECS systems
//!
//! Input layer → `AbilityActivationRequested` → scheduler.request (latest wins)
//! → `tick_ability_schedulers` (tick + resolve) → signals → events/effects.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::definition::{AbilityCost, AbilityEffect, AbilityKind};
use super::instance::{AbilityActor, AbilitySignal, AbilityState};
use super::scheduler::AbilityScheduler;
use crate::combat::{launch_projectile, EntityDied, ExplosiveCharge, ProjectileLaunch};
use crate::components::{Actor, Health, MovementInput, Stamina};
use crate::pool::{spawn_pooled_effect, Dormant, EntityPool};

/// Activation effects return to the pool after this long
pub const ACTIVATION_EFFECT_LIFETIME: f32 = 1.0;

/// Событие от input слоя: игрок нажал кнопку способности
#[derive(Event, Debug, Clone, Copy)]
pub struct AbilityActivationRequested {
    pub actor: Entity,
    pub kind: AbilityKind,
}

/// Событие: ability перешла в другое состояние (UI, анимация)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityStateChanged {
    pub actor: Entity,
    pub kind: AbilityKind,
    pub from: AbilityState,
    pub to: AbilityState,
}

/// Событие: основной эффект способности сработал
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityExecuted {
    pub actor: Entity,
    pub kind: AbilityKind,
}

/// Actor-side view for one frame: stamina is borrowed, the rest is a snapshot.
pub struct ActorVitals<'a> {
    pub stamina: Option<&'a mut Stamina>,
    pub alive: bool,
    pub moving: bool,
    pub attacking: bool,
}

impl AbilityActor for ActorVitals<'_> {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn is_attacking(&self) -> bool {
        self.attacking
    }

    fn can_afford(&self, cost: &AbilityCost) -> bool {
        match self.stamina.as_deref() {
            Some(stamina) => stamina.can_afford(cost.stamina),
            None => cost.stamina <= 0.0,
        }
    }

    fn consume(&mut self, cost: &AbilityCost) {
        if let Some(stamina) = self.stamina.as_deref_mut() {
            stamina.consume(cost.stamina);
        }
    }
}

/// Система: AbilityActivationRequested → AbilityScheduler::request
pub fn collect_activation_requests(
    mut requests: EventReader<AbilityActivationRequested>,
    mut schedulers: Query<&mut AbilityScheduler>,
) {
    for request in requests.read() {
        match schedulers.get_mut(request.actor) {
            Ok(mut scheduler) => scheduler.request(request.kind),
            Err(_) => crate::logger::log_warning(&format!(
                "Ability request {:?} for {:?}: entity has no AbilityScheduler",
                request.kind, request.actor
            )),
        }
    }
}

/// Куда уходят сигналы schedulers: ECS события + pool для эффектов
#[derive(SystemParam)]
pub struct AbilityOutputs<'w, 's> {
    pool: ResMut<'w, EntityPool>,
    commands: Commands<'w, 's>,
    state_events: EventWriter<'w, AbilityStateChanged>,
    executed_events: EventWriter<'w, AbilityExecuted>,
    signals: Local<'s, Vec<AbilitySignal>>,
}

/// Actor-side components a signal may touch.
pub struct SignalTarget<'a> {
    pub entity: Entity,
    pub transform: &'a Transform,
    pub faction_id: Option<u64>,
    pub health: Option<&'a mut Health>,
    pub movement: Option<&'a mut MovementInput>,
}

impl AbilityOutputs<'_, '_> {
    /// Drain the scheduler outbox and apply every signal in this tick.
    pub fn apply(&mut self, scheduler: &mut AbilityScheduler, target: &mut SignalTarget) {
        let mut signals = std::mem::take(&mut *self.signals);
        signals.clear();
        scheduler.drain_signals_into(&mut signals);

        for signal in signals.iter() {
            match *signal {
                AbilitySignal::StateChanged { kind, from, to } => {
                    self.state_events.write(AbilityStateChanged {
                        actor: target.entity,
                        kind,
                        from,
                        to,
                    });
                }
                AbilitySignal::Activated { kind } => {
                    let Some(ability) = scheduler.get(kind) else {
                        continue;
                    };
                    if let Some(prototype) = ability.definition().activation_effect.as_ref() {
                        if let Err(err) = spawn_pooled_effect(
                            &mut self.pool,
                            &mut self.commands,
                            prototype,
                            target.transform.translation,
                            ACTIVATION_EFFECT_LIFETIME,
                        ) {
                            crate::logger::log_warning(&format!(
                                "Activation effect for {:?} skipped: {}",
                                kind, err
                            ));
                        }
                    }
                }
                AbilitySignal::Executed { kind } => {
                    self.executed_events.write(AbilityExecuted {
                        actor: target.entity,
                        kind,
                    });
                    if let Some(ability) = scheduler.get(kind) {
                        self.execute_effect(kind, &ability.definition().effect, target);
                    }
                }
                AbilitySignal::Completed { kind } | AbilitySignal::Cancelled { kind } => {
                    let is_dash = scheduler
                        .get(kind)
                        .is_some_and(|ability| matches!(ability.definition().effect, AbilityEffect::Dash { .. }));
                    if is_dash {
                        if let Some(health) = target.health.as_deref_mut() {
                            health.invulnerable = false;
                        }
                        if let Some(movement) = target.movement.as_deref_mut() {
                            movement.stop();
                        }
                    }
                }
            }
        }

        *self.signals = signals;
    }

    fn execute_effect(&mut self, kind: AbilityKind, effect: &AbilityEffect, target: &mut SignalTarget) {
        let direction = target.transform.forward().as_vec3();
        let launch = match effect {
            AbilityEffect::None => return,
            AbilityEffect::Dash { speed, .. } => {
                if let Some(health) = target.health.as_deref_mut() {
                    health.invulnerable = true;
                }
                if let Some(movement) = target.movement.as_deref_mut() {
                    movement.direction = direction;
                    movement.speed = *speed;
                }
                crate::logger::log(&format!("💨 Dash {:?}", target.entity));
                return;
            }
            AbilityEffect::Projectile {
                prototype,
                damage,
                speed,
                max_range,
                impact_effect,
            } => ProjectileLaunch {
                prototype: prototype.clone(),
                origin: target.transform.translation + direction * 0.5,
                direction,
                speed: *speed,
                damage: *damage,
                max_range: *max_range,
                owner: Some(target.entity),
                faction_id: target.faction_id,
                explosive: None,
                impact_effect: impact_effect.clone(),
            },
            AbilityEffect::Grenade {
                prototype,
                speed,
                max_range,
                fuse,
                radius,
                damage,
                explosion_effect,
            } => ProjectileLaunch {
                prototype: prototype.clone(),
                origin: target.transform.translation + direction * 0.5,
                direction,
                speed: *speed,
                damage: 0,
                max_range: *max_range,
                owner: Some(target.entity),
                faction_id: target.faction_id,
                explosive: Some(ExplosiveCharge {
                    fuse: *fuse,
                    radius: *radius,
                    damage: *damage,
                }),
                impact_effect: explosion_effect.clone(),
            },
        };

        if let Err(err) = launch_projectile(&mut self.pool, &mut self.commands, &launch) {
            crate::logger::log_warning(&format!("{:?} projectile skipped: {}", kind, err));
        }
    }
}

/// Система: tick всех schedulers + применение сигналов
///
/// Dash: invulnerable + burst движение вдоль facing пока `Active`.
/// Projectile / Grenade: снаряд из pool в момент `Executed`.
/// Activation effect: pooled entity, возвращается через 1 секунду.
pub fn tick_ability_schedulers(
    mut actors: Query<
        (
            Entity,
            &mut AbilityScheduler,
            &Transform,
            Option<&Actor>,
            Option<&mut Stamina>,
            Option<&mut Health>,
            Option<&mut MovementInput>,
        ),
        Without<Dormant>,
    >,
    mut outputs: AbilityOutputs,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut scheduler, transform, actor, stamina, health, movement) in actors.iter_mut() {
        let mut health = health.map(Mut::into_inner);
        let movement = movement.map(Mut::into_inner);

        let alive = health.as_deref().map_or(true, Health::is_alive);
        if !alive {
            scheduler.cancel_all();
        }

        let mut vitals = ActorVitals {
            stamina: stamina.map(Mut::into_inner),
            alive,
            moving: movement.as_deref().is_some_and(|input| input.speed > 0.0),
            attacking: false,
        };
        scheduler.tick(delta, &mut vitals);

        let mut target = SignalTarget {
            entity,
            transform,
            faction_id: actor.map(|actor| actor.faction_id),
            health: health.take(),
            movement,
        };
        outputs.apply(&mut scheduler, &mut target);
    }
}

/// Система: смерть прерывает все способности актора (без cooldown)
///
/// Сигналы отмены применяются сразу: `AbilityStateChanged` и снятие dash
/// i-frames видны в том же tick.
pub fn cancel_abilities_on_death(
    mut deaths: EventReader<EntityDied>,
    mut schedulers: Query<(
        &mut AbilityScheduler,
        &Transform,
        Option<&Actor>,
        Option<&mut Health>,
        Option<&mut MovementInput>,
    )>,
    mut outputs: AbilityOutputs,
) {
    for death in deaths.read() {
        let Ok((mut scheduler, transform, actor, health, movement)) = schedulers.get_mut(death.entity)
        else {
            continue;
        };

        let cancelled = scheduler.cancel_all();
        if cancelled > 0 {
            crate::logger::log(&format!(
                "Cancelled {} abilities of dead {:?}",
                cancelled, death.entity
            ));
        }

        let mut target = SignalTarget {
            entity: death.entity,
            transform,
            faction_id: actor.map(|actor| actor.faction_id),
            health: health.map(Mut::into_inner),
            movement: movement.map(Mut::into_inner),
        };
        outputs.apply(&mut scheduler, &mut target);
    }
}
