//! Enemy archetypes: per-prototype AI parameters
//!
//! Один archetype на prototype (prefab). Специализация (dodge roll,
//! метание топора): tagged enum `ArchetypeBehavior`, а не наследование.

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pool::PrototypeId;

/// Dodge roll (Chase state side branch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct DodgeParams {
    /// Cooldown on top of the roll animation length
    pub cooldown: f32,
    pub speed: f32,
    /// No roll closer than this to the target (meters)
    pub min_distance: f32,
    /// No roll further than this from the target (meters)
    pub trigger_range: f32,
    /// Animation clip whose confirmed duration gates the roll
    pub clip: String,
    /// Used when the render layer has not reported the clip length
    pub fallback_clip_duration: f32,
}

impl Default for DodgeParams {
    fn default() -> Self {
        Self {
            cooldown: 2.0,
            speed: 7.0,
            min_distance: 2.0,
            trigger_range: 8.0,
            clip: "Dodge roll".to_string(),
            fallback_clip_duration: 0.8,
        }
    }
}

/// Axe throw (Ability state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct AxeThrowParams {
    pub cooldown: f32,
    pub min_range: f32,
    pub max_range: f32,
    /// Aim time before the axe leaves the hand
    pub aim_time: f32,
    /// Time after the throw before Recovery
    pub follow_through: f32,
    pub projectile: PrototypeId,
    pub damage: u32,
    pub fly_speed: f32,
    pub flight_range: f32,
    /// Pooled effect left where the axe hits
    pub impact_effect: Option<PrototypeId>,
}

impl Default for AxeThrowParams {
    fn default() -> Self {
        Self {
            cooldown: 6.0,
            min_range: 4.0,
            max_range: 12.0,
            aim_time: 0.6,
            follow_through: 0.4,
            projectile: PrototypeId::new("axe"),
            damage: 15,
            fly_speed: 14.0,
            flight_range: 20.0,
            impact_effect: Some(PrototypeId::new("axe_impact")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(tag = "type")]
pub enum ArchetypeBehavior {
    #[default]
    Regular,
    Dodge(DodgeParams),
    AxeThrow(AxeThrowParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct EnemyArchetype {
    pub prototype: PrototypeId,
    #[serde(default = "default_faction")]
    pub faction_id: u64,
    pub max_health: u32,

    // Movement (m/s), scaled per wave
    pub walk_speed: f32,
    pub chase_speed: f32,
    /// Chase starts inside this radius
    pub detection_range: f32,

    // Melee
    pub attack_range: f32,
    pub attack_damage: u32,
    /// Time in Attack before the strike lands
    pub attack_windup: f32,
    pub attack_cooldown: f32,
    pub recovery_time: f32,

    /// Idle pause before walking towards a distant target
    #[serde(default)]
    pub idle_time: f32,
    /// Corpse stays this long before returning to the pool
    #[serde(default = "default_dead_linger")]
    pub dead_linger: f32,

    #[serde(default)]
    pub behavior: ArchetypeBehavior,
}

/// Враги: фракция 2 (игрок, 1)
pub const ENEMY_FACTION: u64 = 2;

fn default_faction() -> u64 {
    ENEMY_FACTION
}

fn default_dead_linger() -> f32 {
    1.5
}

impl EnemyArchetype {
    /// Plain melee grunt
    pub fn regular(prototype: impl Into<String>) -> Self {
        Self {
            prototype: PrototypeId::new(prototype),
            faction_id: ENEMY_FACTION,
            max_health: 100,
            walk_speed: 2.0,
            chase_speed: 5.0,
            detection_range: 15.0,
            attack_range: 2.0,
            attack_damage: 10,
            attack_windup: 0.5,
            attack_cooldown: 1.5,
            recovery_time: 0.8,
            idle_time: 0.5,
            dead_linger: default_dead_linger(),
            behavior: ArchetypeBehavior::Regular,
        }
    }

    pub fn dodger(prototype: impl Into<String>) -> Self {
        Self {
            max_health: 80,
            chase_speed: 5.5,
            behavior: ArchetypeBehavior::Dodge(DodgeParams::default()),
            ..Self::regular(prototype)
        }
    }

    pub fn axe_thrower(prototype: impl Into<String>) -> Self {
        Self {
            max_health: 90,
            behavior: ArchetypeBehavior::AxeThrow(AxeThrowParams::default()),
            ..Self::regular(prototype)
        }
    }

    /// Boss base stats (wave scaling and boss factors apply on top)
    pub fn brute(prototype: impl Into<String>) -> Self {
        Self {
            max_health: 300,
            chase_speed: 4.0,
            attack_range: 2.5,
            attack_damage: 25,
            attack_windup: 0.8,
            attack_cooldown: 2.0,
            ..Self::regular(prototype)
        }
    }
}

/// Archetype table (lookup by prototype id).
#[derive(Resource, Debug, Clone, Default)]
pub struct EnemyArchetypes {
    archetypes: Vec<Arc<EnemyArchetype>>,
}

impl EnemyArchetypes {
    pub fn new(archetypes: impl IntoIterator<Item = EnemyArchetype>) -> Self {
        let mut table = Self::default();
        for archetype in archetypes {
            table.insert(archetype);
        }
        table
    }

    /// Insert or replace the archetype for its prototype.
    pub fn insert(&mut self, archetype: EnemyArchetype) {
        let archetype = Arc::new(archetype);
        match self
            .archetypes
            .iter_mut()
            .find(|existing| existing.prototype == archetype.prototype)
        {
            Some(existing) => *existing = archetype,
            None => self.archetypes.push(archetype),
        }
    }

    pub fn get(&self, prototype: &PrototypeId) -> Option<&Arc<EnemyArchetype>> {
        self.archetypes
            .iter()
            .find(|archetype| archetype.prototype == *prototype)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Default roster: grunt, dodger, axeman + brute (boss)
pub fn default_archetypes() -> Vec<EnemyArchetype> {
    vec![
        EnemyArchetype::regular("grunt"),
        EnemyArchetype::dodger("dodger"),
        EnemyArchetype::axe_thrower("axeman"),
        EnemyArchetype::brute("brute"),
    ]
}
