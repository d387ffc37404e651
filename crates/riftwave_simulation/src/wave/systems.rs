//! Wave ECS systems
//!
//! drive_wave_director: timers → announce / spawn / complete.
//! track_wave_deaths: EntityDied → remaining-- (event-driven, без сканирования врагов).

use bevy::prelude::*;

use super::config::WaveConfig;
use super::director::{plan_wave, SpawnOrder, WaveDirector, WavePlan, WaveStep};
use crate::combat::EntityDied;
use crate::components::{Actor, Health, MovementInput};
use crate::enemy::{EnemyArchetypes, EnemyBrain};
use crate::pool::{acquire_entity, EntityPool};
use crate::DeterministicRng;

/// Registration of a spawned enemy to its wave; removed once its death is counted.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct WaveMember {
    pub wave: u32,
}

/// Событие: волна объявлена (UI "Wave N")
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WaveAnnounced {
    pub wave: u32,
    pub is_boss: bool,
}

/// Событие: boss появится через `lead_time` секунд
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BossWarning {
    pub wave: u32,
    pub lead_time: f32,
}

/// Событие: враги волны заспавнены
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WaveStarted {
    pub wave: u32,
    pub is_boss: bool,
    pub enemy_count: u32,
}

/// Событие: все враги волны мертвы
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WaveCompleted {
    pub wave: u32,
}

/// Startup: arm the first wave
pub fn start_waves(config: Res<WaveConfig>, mut director: ResMut<WaveDirector>) {
    if config.auto_start && director.start(&config) {
        crate::logger::log_info(&format!(
            "🌊 WaveDirector armed: first wave in {:.1}s",
            config.start_delay
        ));
    }
}

/// Система: wave lifecycle
pub fn drive_wave_director(
    mut director: ResMut<WaveDirector>,
    config: Res<WaveConfig>,
    archetypes: Res<EnemyArchetypes>,
    mut rng: ResMut<DeterministicRng>,
    mut pool: ResMut<EntityPool>,
    mut commands: Commands,
    mut announced_events: EventWriter<WaveAnnounced>,
    mut boss_events: EventWriter<BossWarning>,
    mut started_events: EventWriter<WaveStarted>,
    mut completed_events: EventWriter<WaveCompleted>,
    time: Res<Time<Fixed>>,
) {
    let Some(step) = director.advance(time.delta_secs(), &config) else {
        return;
    };

    match step {
        WaveStep::Announced { wave, is_boss } => {
            crate::logger::log_info(&format!("🌊 Wave {} announced (boss: {})", wave, is_boss));
            announced_events.write(WaveAnnounced { wave, is_boss });
            if is_boss {
                boss_events.write(BossWarning {
                    wave,
                    lead_time: config.boss_warning,
                });
            }
        }
        WaveStep::Spawn { wave, is_boss } => {
            let plan = match plan_wave(&config, wave, is_boss, &mut rng.rng) {
                Ok(plan) => plan,
                Err(err) => {
                    crate::logger::log_error(&format!("WaveDirector halted: {}", err));
                    director.halt();
                    return;
                }
            };

            let spawned = spawn_wave(&plan, &archetypes, &mut pool, &mut commands);
            if (spawned as usize) < plan.spawns.len() {
                crate::logger::log_warning(&format!(
                    "Wave {}: spawned {} of {} planned enemies",
                    wave,
                    spawned,
                    plan.spawns.len()
                ));
            }

            director.begin_waiting(spawned);
            started_events.write(WaveStarted {
                wave,
                is_boss,
                enemy_count: spawned,
            });
            crate::logger::log_info(&format!("⚔️ Wave {} started: {} enemies", wave, spawned));
        }
        WaveStep::Completed { wave } => {
            completed_events.write(WaveCompleted { wave });
            crate::logger::log_info(&format!(
                "✅ Wave {} cleared, next in {:.1}s",
                wave, config.wave_interval
            ));
        }
    }
}

/// Spawn every order of the plan; failed spawns are skipped (and not counted).
pub fn spawn_wave(
    plan: &WavePlan,
    archetypes: &EnemyArchetypes,
    pool: &mut EntityPool,
    commands: &mut Commands,
) -> u32 {
    let mut spawned = 0;
    for order in &plan.spawns {
        if spawn_enemy(order, plan.wave, archetypes, pool, commands).is_some() {
            spawned += 1;
        }
    }
    spawned
}

/// Acquire a pooled enemy and stamp this life's components onto it.
pub fn spawn_enemy(
    order: &SpawnOrder,
    wave: u32,
    archetypes: &EnemyArchetypes,
    pool: &mut EntityPool,
    commands: &mut Commands,
) -> Option<Entity> {
    let Some(archetype) = archetypes.get(&order.prototype) else {
        crate::logger::log_error(&format!(
            "No enemy archetype for prototype '{}', spawn skipped",
            order.prototype
        ));
        return None;
    };

    let (entity, _handle) = match acquire_entity(pool, commands, &order.prototype) {
        Ok(acquired) => acquired,
        Err(err) => {
            crate::logger::log_warning(&format!("Enemy spawn skipped: {}", err));
            return None;
        }
    };

    let max_health = ((archetype.max_health as f32 * order.health_scale) as u32).max(1);
    commands.entity(entity).insert((
        Transform::from_translation(order.position),
        Actor {
            faction_id: archetype.faction_id,
        },
        Health::new(max_health),
        MovementInput::default(),
        EnemyBrain::new(archetype.clone(), order.speed_scale),
        WaveMember { wave },
    ));

    crate::logger::log(&format!(
        "Spawned '{}' {:?} at {:?} (hp {}, speed ×{:.2})",
        order.prototype, entity, order.position, max_health, order.speed_scale
    ));
    Some(entity)
}

/// Система: death notification → WaveDirector counter
pub fn track_wave_deaths(
    mut deaths: EventReader<EntityDied>,
    members: Query<&WaveMember>,
    mut director: ResMut<WaveDirector>,
    mut commands: Commands,
) {
    for death in deaths.read() {
        let Ok(member) = members.get(death.entity) else {
            continue;
        };

        if director.register_death(member.wave) {
            crate::logger::log(&format!(
                "Wave {}: enemy {:?} down, {} remaining",
                member.wave,
                death.entity,
                director.remaining()
            ));
        }

        if let Ok(mut entity) = commands.get_entity(death.entity) {
            entity.remove::<WaveMember>();
        }
    }
}
