//! Melee strikes
//!
//! ```text
//! Enemy brain (Attack state, windup elapsed) → MeleeStrike
//!   ↓
//! resolve_enemy_attacks: target still alive + in reach? → HitLanded
//!   ↓
//! apply_damage → DamageDealt / EntityDied
//! ```
//!
//! Reach проверяется на момент удара: игрок успевший отойти (или dash)
//! не получает урон.

use bevy::prelude::*;

use super::damage::{DamageSource, HitLanded};
use crate::components::Health;
use crate::pool::Dormant;

/// Reach tolerance on top of the attacker's nominal range
pub const MELEE_REACH_TOLERANCE: f32 = 0.5;

/// Событие: melee удар в момент контакта (конец windup)
#[derive(Event, Debug, Clone)]
pub struct MeleeStrike {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    /// Attack range of the attacker (meters)
    pub reach: f32,
}

/// Система: MeleeStrike → HitLanded (reach validation)
pub fn resolve_enemy_attacks(
    mut strikes: EventReader<MeleeStrike>,
    mut hits: EventWriter<HitLanded>,
    positions: Query<(&Transform, Option<&Health>), Without<Dormant>>,
) {
    for strike in strikes.read() {
        let Ok((attacker_transform, attacker_health)) = positions.get(strike.attacker) else {
            continue;
        };
        if attacker_health.is_some_and(|health| health.is_dead()) {
            continue;
        }

        let Ok((target_transform, target_health)) = positions.get(strike.target) else {
            continue;
        };
        if target_health.is_some_and(|health| health.is_dead()) {
            continue;
        }

        let distance = attacker_transform
            .translation
            .distance(target_transform.translation);
        if distance > strike.reach + MELEE_REACH_TOLERANCE {
            crate::logger::log(&format!(
                "Melee strike {:?} → {:?} missed (distance {:.2}m)",
                strike.attacker, strike.target, distance
            ));
            continue;
        }

        hits.write(HitLanded {
            attacker: Some(strike.attacker),
            target: strike.target,
            damage: strike.damage,
            source: DamageSource::Melee,
        });
    }
}
