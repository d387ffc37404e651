//! Pooled projectiles (grenades, thrown axes)
//!
//! Полёт: простая кинематика в FixedUpdate. Столкновения детектит внешний
//! physics слой и присылает `CollisionOccurred`; здесь только реакция:
//! damage + impact effect + возврат снаряда в pool.
//!
//! Гранаты (`ExplosiveCharge`) от столкновений не взрываются: падают на
//! месте и ждут fuse, потом урон по площади с falloff по дистанции.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::damage::{DamageSource, HitLanded};
use super::CollisionOccurred;
use crate::components::{Actor, Health};
use crate::pool::{
    acquire_entity, release_entity, spawn_pooled_effect, Dormant, EntityPool, PoolError, Pooled,
    PrototypeId,
};

/// Impact/explosion effects return to the pool after this long
pub const IMPACT_EFFECT_LIFETIME: f32 = 1.0;

/// Collision response tuning.
#[derive(Resource, Debug, Clone, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct CombatConfig {
    /// Allied projectiles damage allies
    pub friendly_fire: bool,
    /// Delay before an allied hit (friendly fire off) returns to the pool
    pub allied_hit_release_delay: f32,
    /// Delay before a projectile that hit something returns to the pool
    pub impact_release_delay: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            friendly_fire: false,
            allied_hit_release_delay: 0.1,
            impact_release_delay: 0.0,
        }
    }
}

/// Fused area-damage payload (grenade).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct ExplosiveCharge {
    /// Seconds from launch to detonation
    pub fuse: f32,
    pub radius: f32,
    /// Damage at the center; falls off linearly to 0 at `radius`
    pub damage: u32,
}

impl ExplosiveCharge {
    /// `round(damage × (1 − d/r))`, 0 outside the radius.
    pub fn damage_at(&self, distance: f32) -> u32 {
        if self.radius <= 0.0 || distance > self.radius {
            return 0;
        }
        let falloff = 1.0 - distance / self.radius;
        (self.damage as f32 * falloff).round().max(0.0) as u32
    }
}

/// Projectile state for the current life (re-inserted on every launch).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub owner: Option<Entity>,
    /// Faction of the shooter (friendly fire check)
    pub faction_id: Option<u64>,
    pub damage: u32,
    /// Normalized flight direction
    pub direction: Vec3,
    pub speed: f32,
    pub max_range: f32,
    pub traveled: f32,
    /// Hit something or flew out of range; release already requested
    pub spent: bool,
    pub explosive: Option<ExplosiveCharge>,
    /// Fuse countdown (explosives only)
    pub fuse_remaining: f32,
    /// Pooled effect spawned at the hit point / explosion center
    pub impact_effect: Option<PrototypeId>,
}

impl Projectile {
    /// Explosive that stopped flying (range reached or touched something).
    pub fn is_resting(&self) -> bool {
        self.explosive.is_some() && self.speed == 0.0
    }
}

/// Everything needed to put a projectile in flight.
#[derive(Debug, Clone)]
pub struct ProjectileLaunch {
    pub prototype: PrototypeId,
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub max_range: f32,
    pub owner: Option<Entity>,
    pub faction_id: Option<u64>,
    pub explosive: Option<ExplosiveCharge>,
    pub impact_effect: Option<PrototypeId>,
}

/// Acquire a projectile from the pool and launch it.
pub fn launch_projectile(
    pool: &mut EntityPool,
    commands: &mut Commands,
    launch: &ProjectileLaunch,
) -> Result<Entity, PoolError> {
    let (entity, _handle) = acquire_entity(pool, commands, &launch.prototype)?;

    commands.entity(entity).insert((
        Transform::from_translation(launch.origin),
        Projectile {
            owner: launch.owner,
            faction_id: launch.faction_id,
            damage: launch.damage,
            direction: launch.direction.normalize_or_zero(),
            speed: launch.speed,
            max_range: launch.max_range,
            traveled: 0.0,
            spent: false,
            explosive: launch.explosive,
            fuse_remaining: launch.explosive.map_or(0.0, |charge| charge.fuse),
            impact_effect: launch.impact_effect.clone(),
        },
    ));

    crate::logger::log(&format!(
        "🚀 Projectile '{}' {:?} launched by {:?}",
        launch.prototype, entity, launch.owner
    ));
    Ok(entity)
}

/// Система: полёт снарядов + release после max_range
///
/// Граната на max_range не возвращается в pool, а останавливается.
pub fn move_projectiles(
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile, &Pooled), Without<Dormant>>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut projectile, pooled) in projectiles.iter_mut() {
        if projectile.spent || projectile.is_resting() {
            continue;
        }

        let step = projectile.speed * delta;
        transform.translation += projectile.direction * step;
        projectile.traveled += step;

        if projectile.traveled < projectile.max_range {
            continue;
        }
        if projectile.explosive.is_some() {
            projectile.speed = 0.0;
            crate::logger::log(&format!("Grenade {:?} landed at {:?}", entity, transform.translation));
        } else {
            projectile.spent = true;
            release_entity(&mut pool, &mut commands, pooled, 0.0);
            crate::logger::log(&format!("Projectile {:?} out of range, released", entity));
        }
    }
}

/// Система: CollisionOccurred → HitLanded + release снаряда
///
/// Одно попадание на снаряд: дальнейшие коллизии того же кадра игнорируются
/// (`spent`). Владелец снаряда не задевает сам себя.
pub fn process_collisions(
    mut collisions: EventReader<CollisionOccurred>,
    mut hits: EventWriter<HitLanded>,
    mut projectiles: Query<(&mut Projectile, &Pooled), Without<Dormant>>,
    actors: Query<&Actor, Without<Dormant>>,
    config: Res<CombatConfig>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
) {
    for collision in collisions.read() {
        let (projectile_entity, other) = if projectiles.contains(collision.a) {
            (collision.a, collision.b)
        } else if projectiles.contains(collision.b) {
            (collision.b, collision.a)
        } else {
            continue;
        };

        let Ok((mut projectile, pooled)) = projectiles.get_mut(projectile_entity) else {
            continue;
        };
        if projectile.spent || projectile.owner == Some(other) {
            continue;
        }
        if projectile.explosive.is_some() {
            // Граната не бьёт контактом: останавливается и ждёт fuse
            projectile.speed = 0.0;
            continue;
        }
        projectile.spent = true;
        let pooled = *pooled;

        let target_actor = actors.get(other).ok();
        let allied = match (projectile.faction_id, target_actor) {
            (Some(faction_id), Some(actor)) => actor.faction_id == faction_id,
            _ => false,
        };

        if allied && !config.friendly_fire {
            release_entity(&mut pool, &mut commands, &pooled, config.allied_hit_release_delay);
            continue;
        }

        if target_actor.is_some() {
            hits.write(HitLanded {
                attacker: projectile.owner,
                target: other,
                damage: projectile.damage,
                source: DamageSource::Projectile,
            });
        }

        if let Some(effect) = projectile.impact_effect.as_ref() {
            if let Err(err) = spawn_pooled_effect(
                &mut pool,
                &mut commands,
                effect,
                collision.contact_point,
                IMPACT_EFFECT_LIFETIME,
            ) {
                crate::logger::log_warning(&format!("Impact effect skipped: {}", err));
            }
        }

        release_entity(&mut pool, &mut commands, &pooled, config.impact_release_delay);
    }
}

/// Система: fuse гранат → урон по площади + explosion effect + release
///
/// Урон: `round(damage × (1 − d/r))` каждому живому актору в радиусе.
/// Союзники (фракция бросившего) задеваются только при friendly fire.
pub fn detonate_explosives(
    mut projectiles: Query<(Entity, &Transform, &mut Projectile, &Pooled), Without<Dormant>>,
    actors: Query<(Entity, &Transform, &Health, Option<&Actor>), (Without<Dormant>, Without<Projectile>)>,
    mut hits: EventWriter<HitLanded>,
    config: Res<CombatConfig>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, transform, mut projectile, pooled) in projectiles.iter_mut() {
        if projectile.spent {
            continue;
        }
        let Some(charge) = projectile.explosive else {
            continue;
        };

        projectile.fuse_remaining -= delta;
        if projectile.fuse_remaining > 0.0 {
            continue;
        }
        projectile.spent = true;

        let center = transform.translation;
        let mut victims = 0;
        for (target, target_transform, health, actor) in actors.iter() {
            if health.is_dead() {
                continue;
            }
            let allied = match (projectile.faction_id, actor) {
                (Some(faction_id), Some(actor)) => actor.faction_id == faction_id,
                _ => false,
            };
            if allied && !config.friendly_fire {
                continue;
            }

            let damage = charge.damage_at(center.distance(target_transform.translation));
            if damage == 0 {
                continue;
            }
            hits.write(HitLanded {
                attacker: projectile.owner,
                target,
                damage,
                source: DamageSource::Explosion,
            });
            victims += 1;
        }

        if let Some(effect) = projectile.impact_effect.as_ref() {
            if let Err(err) =
                spawn_pooled_effect(&mut pool, &mut commands, effect, center, IMPACT_EFFECT_LIFETIME)
            {
                crate::logger::log_warning(&format!("Explosion effect skipped: {}", err));
            }
        }

        release_entity(&mut pool, &mut commands, pooled, 0.0);
        crate::logger::log(&format!(
            "💥 Grenade {:?} exploded at {:?}, {} hit",
            entity, center, victims
        ));
    }
}
