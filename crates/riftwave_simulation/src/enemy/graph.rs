//! Enemy behavior graph over `BehaviorStateMachine`
//!
//! ```text
//! Idle → Move → Chase → Attack → Recovery → Idle | Chase
//!                 ↓   ↖                ↑
//!              Ability ────────────────┘ (axe)
//! any ──(death notification)──→ Dead (absorbing)
//! ```
//!
//! Handler не трогает ECS: читает snapshot из `EnemyContext` и пишет
//! intents (движение, удар, бросок, release), система применяет их.

use std::sync::Arc;

use bevy::prelude::*;

use super::archetype::{ArchetypeBehavior, EnemyArchetype};
use crate::behavior::StateHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EnemyState {
    Idle,
    Move,
    Chase,
    Attack,
    Recovery,
    Ability,
    Dead,
}

/// What the graph wants done this frame. Reset every frame (stop by default).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemyIntents {
    pub move_direction: Vec3,
    pub move_speed: f32,
    /// Melee strike lands now
    pub strike: bool,
    /// Throw an axe in this direction
    pub throw_axe: Option<Vec3>,
    /// Death sequence finished, return to the pool
    pub release: bool,
}

/// Per-frame snapshot + intents buffer
#[derive(Debug, Clone, Default)]
pub struct EnemyContext {
    pub position: Vec3,
    /// Target position (alive player), if any
    pub target: Option<Vec3>,
    /// Animation-confirmed dodge clip length
    pub dodge_clip_duration: Option<f32>,
    pub intents: EnemyIntents,
}

impl EnemyContext {
    pub fn new(position: Vec3, target: Option<Vec3>) -> Self {
        Self {
            position,
            target,
            ..default()
        }
    }

    pub fn distance_to_target(&self) -> Option<f32> {
        self.target.map(|target| self.position.distance(target))
    }

    /// Horizontal direction to the target (zero without a target)
    pub fn direction_to_target(&self) -> Vec3 {
        self.target
            .map(|target| (target - self.position).with_y(0.0).normalize_or_zero())
            .unwrap_or(Vec3::ZERO)
    }

    fn move_towards_target(&mut self, speed: f32) {
        self.intents.move_direction = self.direction_to_target();
        self.intents.move_speed = speed;
    }
}

/// Per-entity graph data: archetype + cooldowns of the current life.
#[derive(Debug, Clone)]
pub struct EnemyGraph {
    archetype: Arc<EnemyArchetype>,
    /// Wave difficulty multiplier for movement speeds
    speed_scale: f32,
    attack_cooldown: f32,
    dodge_cooldown: f32,
    axe_cooldown: f32,
    /// Alternates left/right rolls
    dodge_side: f32,
    dodge_direction: Vec3,
    ability_duration: f32,
    ability_fired: bool,
    struck: bool,
    released: bool,
}

impl EnemyGraph {
    pub fn new(archetype: Arc<EnemyArchetype>, speed_scale: f32) -> Self {
        Self {
            archetype,
            speed_scale,
            attack_cooldown: 0.0,
            dodge_cooldown: 0.0,
            axe_cooldown: 0.0,
            dodge_side: 1.0,
            dodge_direction: Vec3::ZERO,
            ability_duration: 0.0,
            ability_fired: false,
            struck: false,
            released: false,
        }
    }

    pub fn archetype(&self) -> &Arc<EnemyArchetype> {
        &self.archetype
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn dodge_cooldown(&self) -> f32 {
        self.dodge_cooldown
    }

    pub fn axe_cooldown(&self) -> f32 {
        self.axe_cooldown
    }

    /// Clip the render layer must confirm for the dodge interval
    pub fn dodge_clip(&self) -> Option<&str> {
        match &self.archetype.behavior {
            ArchetypeBehavior::Dodge(params) => Some(params.clip.as_str()),
            _ => None,
        }
    }

    /// Cooldowns run in every state (including Dead).
    pub fn tick_cooldowns(&mut self, delta: f32) {
        self.attack_cooldown = (self.attack_cooldown - delta).max(0.0);
        self.dodge_cooldown = (self.dodge_cooldown - delta).max(0.0);
        self.axe_cooldown = (self.axe_cooldown - delta).max(0.0);
    }

    fn ability_ready(&self, distance: f32) -> bool {
        match &self.archetype.behavior {
            ArchetypeBehavior::Regular => false,
            ArchetypeBehavior::Dodge(params) => {
                self.dodge_cooldown <= 0.0
                    && distance >= params.min_distance
                    && distance <= params.trigger_range
                    && distance > self.archetype.attack_range
            }
            ArchetypeBehavior::AxeThrow(params) => {
                self.axe_cooldown <= 0.0 && distance >= params.min_range && distance <= params.max_range
            }
        }
    }

    fn within_detection(&self, ctx: &EnemyContext) -> bool {
        ctx.distance_to_target()
            .is_some_and(|distance| distance <= self.archetype.detection_range)
    }

    fn enter_ability(&mut self, ctx: &mut EnemyContext) {
        self.ability_fired = false;
        match &self.archetype.behavior {
            ArchetypeBehavior::Regular => {
                self.ability_duration = 0.0;
            }
            ArchetypeBehavior::Dodge(params) => {
                let clip = ctx
                    .dodge_clip_duration
                    .unwrap_or(params.fallback_clip_duration);
                self.ability_duration = clip;
                // Interval = cooldown + confirmed animation length
                self.dodge_cooldown = params.cooldown + clip;

                let forward = ctx.direction_to_target();
                let side = forward.cross(Vec3::Y).normalize_or_zero() * self.dodge_side;
                self.dodge_side = -self.dodge_side;
                self.dodge_direction = (side + forward * 0.5).normalize_or_zero();

                ctx.intents.move_direction = self.dodge_direction;
                ctx.intents.move_speed = params.speed;
            }
            ArchetypeBehavior::AxeThrow(params) => {
                self.ability_duration = params.aim_time + params.follow_through;
                self.axe_cooldown = params.cooldown;
            }
        }
    }

    fn update_ability(&mut self, elapsed: f32, ctx: &mut EnemyContext) -> Option<EnemyState> {
        match &self.archetype.behavior {
            ArchetypeBehavior::Regular => Some(EnemyState::Chase),
            ArchetypeBehavior::Dodge(params) => {
                if elapsed >= self.ability_duration {
                    return Some(EnemyState::Chase);
                }
                ctx.intents.move_direction = self.dodge_direction;
                ctx.intents.move_speed = params.speed;
                None
            }
            ArchetypeBehavior::AxeThrow(params) => {
                if !self.ability_fired && elapsed >= params.aim_time {
                    self.ability_fired = true;
                    ctx.intents.throw_axe = Some(ctx.direction_to_target());
                }
                (elapsed >= self.ability_duration).then_some(EnemyState::Recovery)
            }
        }
    }
}

impl StateHandler<EnemyContext> for EnemyGraph {
    type Key = EnemyState;

    fn enter(&mut self, state: EnemyState, ctx: &mut EnemyContext) {
        match state {
            EnemyState::Attack => self.struck = false,
            EnemyState::Ability => self.enter_ability(ctx),
            EnemyState::Dead => {
                self.released = false;
                ctx.intents = EnemyIntents::default();
            }
            EnemyState::Idle | EnemyState::Move | EnemyState::Chase | EnemyState::Recovery => {}
        }
    }

    fn update(
        &mut self,
        state: EnemyState,
        elapsed: f32,
        _delta: f32,
        ctx: &mut EnemyContext,
    ) -> Option<EnemyState> {
        let archetype = Arc::clone(&self.archetype);

        match state {
            EnemyState::Idle => {
                ctx.target?;
                if self.within_detection(ctx) {
                    Some(EnemyState::Chase)
                } else {
                    (elapsed >= archetype.idle_time).then_some(EnemyState::Move)
                }
            }
            EnemyState::Move => {
                if ctx.target.is_none() {
                    return Some(EnemyState::Idle);
                }
                if self.within_detection(ctx) {
                    return Some(EnemyState::Chase);
                }
                ctx.move_towards_target(archetype.walk_speed * self.speed_scale);
                None
            }
            EnemyState::Chase => {
                let Some(distance) = ctx.distance_to_target() else {
                    return Some(EnemyState::Idle);
                };
                if distance > archetype.detection_range * 1.5 {
                    return Some(EnemyState::Move);
                }
                if distance > archetype.attack_range && self.ability_ready(distance) {
                    return Some(EnemyState::Ability);
                }
                if distance <= archetype.attack_range {
                    // В радиусе атаки: ждём cooldown стоя на месте
                    return (self.attack_cooldown <= 0.0).then_some(EnemyState::Attack);
                }
                ctx.move_towards_target(archetype.chase_speed * self.speed_scale);
                None
            }
            EnemyState::Attack => {
                if !self.struck && elapsed >= archetype.attack_windup {
                    self.struck = true;
                    self.attack_cooldown = archetype.attack_cooldown;
                    ctx.intents.strike = true;
                    return Some(EnemyState::Recovery);
                }
                None
            }
            EnemyState::Recovery => {
                if elapsed < archetype.recovery_time {
                    return None;
                }
                if self.within_detection(ctx) {
                    Some(EnemyState::Chase)
                } else {
                    Some(EnemyState::Idle)
                }
            }
            EnemyState::Ability => self.update_ability(elapsed, ctx),
            EnemyState::Dead => {
                if !self.released && elapsed >= archetype.dead_linger {
                    self.released = true;
                    ctx.intents.release = true;
                }
                None
            }
        }
    }

    fn exit(&mut self, state: EnemyState, _ctx: &mut EnemyContext) {
        if state == EnemyState::Ability {
            self.dodge_direction = Vec3::ZERO;
        }
    }
}
