//! Damage application
//!
//! Все попадания (melee враги, снаряды) приходят как `HitLanded`,
//! `apply_damage`: единственное место где уменьшается Health.
//! Смерть сообщается ровно один раз (см. `Health::reduce_health`).

use bevy::prelude::*;

use crate::components::{Health, HealthChange};

/// Источник урона
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DamageSource {
    Melee,
    Projectile,
    /// Area damage with distance falloff (grenades)
    Explosion,
}

/// Событие: попадание, урон ещё не применён
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
}

/// Событие: урон нанесен
///
/// Генерируется после применения damage к Health.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Событие: entity умер (death notification)
///
/// Слушатели: enemy brain (force Dead), ability scheduler (cancel all),
/// wave director (remaining counter).
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Система: HitLanded → Health → DamageDealt / EntityDied
pub fn apply_damage(
    mut hits: EventReader<HitLanded>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut entity_died_events: EventWriter<EntityDied>,
    mut targets: Query<&mut Health, Without<crate::pool::Dormant>>,
) {
    for hit in hits.read() {
        let Ok(mut health) = targets.get_mut(hit.target) else {
            crate::logger::log(&format!("HitLanded: target {:?} has no active Health", hit.target));
            continue;
        };

        let change = health.reduce_health(hit.damage);
        if change == HealthChange::Ignored {
            continue;
        }

        let target_died = change == HealthChange::Died;
        damage_dealt_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: hit.damage,
            source: hit.source,
            target_died,
        });

        if target_died {
            entity_died_events.write(EntityDied {
                entity: hit.target,
                killer: hit.attacker,
            });
            crate::logger::log_info(&format!(
                "💀 Entity {:?} killed by {:?} ({:?})",
                hit.target, hit.attacker, hit.source
            ));
        }
    }
}
