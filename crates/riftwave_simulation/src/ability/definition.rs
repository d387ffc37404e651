//! Ability definitions: immutable config shared by every instance of a kind.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pool::PrototypeId;

/// Ability kinds (one instance per kind per actor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum AbilityKind {
    Dash,
    HeavyAttack,
    Grenade,
    Stealth,
    Ultimate,
    Trap,
}

/// Resource cost paid once per successful activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct AbilityCost {
    pub stamina: f32,
}

/// Main effect, fired once on entering `Active`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(tag = "type")]
pub enum AbilityEffect {
    #[default]
    None,
    /// Burst movement along facing; invulnerable while `Active`.
    Dash { distance: f32, speed: f32 },
    /// Launch a pooled projectile along facing.
    Projectile {
        prototype: PrototypeId,
        damage: u32,
        speed: f32,
        max_range: f32,
        #[serde(default)]
        impact_effect: Option<PrototypeId>,
    },
    /// Throw a pooled fused charge along facing; explodes after `fuse`
    /// with linear damage falloff over `radius`.
    Grenade {
        prototype: PrototypeId,
        speed: f32,
        max_range: f32,
        fuse: f32,
        radius: f32,
        damage: u32,
        #[serde(default)]
        explosion_effect: Option<PrototypeId>,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct AbilityDefinition {
    pub kind: AbilityKind,
    pub name: String,
    #[serde(default)]
    pub description: String,

    // Timing (seconds)
    pub cooldown: f32,
    #[serde(default)]
    pub cast_time: f32,
    #[serde(default)]
    pub duration: f32,

    #[serde(default)]
    pub cost: AbilityCost,
    /// Limited uses (grenades); `None` = unlimited
    #[serde(default)]
    pub max_charges: Option<u32>,

    // Restrictions
    #[serde(default)]
    pub interrupts_other_abilities: bool,
    /// Exclusive abilities never overlap each other on one actor
    #[serde(default = "default_true")]
    pub exclusive: bool,
    #[serde(default = "default_true")]
    pub can_use_while_moving: bool,
    #[serde(default = "default_true")]
    pub can_use_while_attacking: bool,

    /// Input action name, consumed by the input layer only
    #[serde(default)]
    pub input_binding: Option<String>,
    /// Short-lived pooled effect spawned on activation
    #[serde(default)]
    pub activation_effect: Option<PrototypeId>,
    #[serde(default)]
    pub effect: AbilityEffect,
}

impl AbilityDefinition {
    pub fn new(kind: AbilityKind, cooldown: f32) -> Self {
        Self {
            kind,
            name: format!("{:?}", kind),
            description: String::new(),
            cooldown,
            cast_time: 0.0,
            duration: 0.0,
            cost: AbilityCost::default(),
            max_charges: None,
            interrupts_other_abilities: false,
            exclusive: true,
            can_use_while_moving: true,
            can_use_while_attacking: true,
            input_binding: None,
            activation_effect: None,
            effect: AbilityEffect::None,
        }
    }

    pub fn with_cast_time(mut self, cast_time: f32) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_cost(mut self, stamina: f32) -> Self {
        self.cost.stamina = stamina;
        self
    }

    pub fn with_charges(mut self, charges: u32) -> Self {
        self.max_charges = Some(charges);
        self
    }

    pub fn with_effect(mut self, effect: AbilityEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_activation_effect(mut self, prototype: impl Into<String>) -> Self {
        self.activation_effect = Some(PrototypeId::new(prototype));
        self
    }

    pub fn interrupting(mut self) -> Self {
        self.interrupts_other_abilities = true;
        self
    }

    pub fn non_exclusive(mut self) -> Self {
        self.exclusive = false;
        self
    }

    /// Dash: 2.5m @ 15 m/s, 1.5s cooldown, 25 stamina
    pub fn dash() -> Self {
        let distance = 2.5;
        let speed = 15.0;
        Self::new(AbilityKind::Dash, 1.5)
            .with_duration(distance / speed)
            .with_cost(25.0)
            .with_effect(AbilityEffect::Dash { distance, speed })
            .with_activation_effect("dash_burst")
            .interrupting()
    }

    /// Grenade: 3 charges, 1s cooldown, 3s fuse, 50 damage in 5m
    pub fn grenade() -> Self {
        Self::new(AbilityKind::Grenade, 1.0)
            .with_cast_time(0.5)
            .with_charges(3)
            .with_effect(AbilityEffect::Grenade {
                prototype: PrototypeId::new("grenade"),
                speed: 12.0,
                max_range: 15.0,
                fuse: 3.0,
                radius: 5.0,
                damage: 50,
                explosion_effect: Some(PrototypeId::new("grenade_explosion")),
            })
    }
}
