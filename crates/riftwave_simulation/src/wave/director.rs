//! Wave Director: wave lifecycle state machine + spawn planning
//!
//! ```text
//! Idle ─(start_delay)→ Announcing ─(warning)→ Spawning → Waiting ─(remaining == 0)→ Intermission
//!                          ↑                                                          │
//!                          └──────────────────────(wave_interval)─────────────────────┘
//! empty spawn table → Halted
//! ```
//!
//! Чистая логика без ECS: `advance` возвращает шаг, система его исполняет
//! (events, pool) и сообщает результат обратно (`begin_waiting`, `halt`).

use bevy::prelude::*;
use rand::Rng;
use thiserror::Error;

use super::config::WaveConfig;
use crate::pool::PrototypeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaveError {
    #[error("wave {wave}: enemy spawn table is empty")]
    EmptySpawnTable { wave: u32 },

    #[error("wave {wave}: boss spawn table is empty")]
    EmptyBossTable { wave: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum WavePhase {
    Idle,
    Announcing,
    Spawning,
    Waiting,
    Intermission,
    Halted,
}

/// What the director wants executed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveStep {
    Announced { wave: u32, is_boss: bool },
    Spawn { wave: u32, is_boss: bool },
    Completed { wave: u32 },
}

/// One enemy to spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnOrder {
    pub prototype: PrototypeId,
    pub position: Vec3,
    pub health_scale: f32,
    pub speed_scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WavePlan {
    pub wave: u32,
    pub is_boss: bool,
    pub spawns: Vec<SpawnOrder>,
}

/// floor(base × multiplier^(wave-1)): truncation, not rounding.
pub fn enemy_count(config: &WaveConfig, wave: u32) -> u32 {
    let scaled = config.base_enemy_count as f32 * wave_scale(config.enemy_count_multiplier, wave);
    scaled.floor().max(0.0) as u32
}

/// multiplier^(wave-1); wave 1 (and 0) → 1.0
pub fn wave_scale(multiplier: f32, wave: u32) -> f32 {
    multiplier.powi(wave.saturating_sub(1) as i32)
}

/// Build the spawn list for a wave. Prototype and spawn point picks come
/// from `rng`, so the same seed gives the same plan.
pub fn plan_wave(
    config: &WaveConfig,
    wave: u32,
    is_boss: bool,
    rng: &mut impl Rng,
) -> Result<WavePlan, WaveError> {
    let health_scale = wave_scale(config.enemy_health_multiplier, wave);
    let speed_scale = wave_scale(config.enemy_speed_multiplier, wave);

    let (table, count, health_scale, speed_scale) = if is_boss {
        if config.boss_prototypes.is_empty() {
            return Err(WaveError::EmptyBossTable { wave });
        }
        let boss = &config.boss_scaling;
        let (health, speed) = if boss.compound_with_wave {
            (health_scale * boss.health_factor, speed_scale * boss.speed_factor)
        } else {
            (boss.health_factor, boss.speed_factor)
        };
        (&config.boss_prototypes, 1, health, speed)
    } else {
        if config.enemy_prototypes.is_empty() {
            return Err(WaveError::EmptySpawnTable { wave });
        }
        (&config.enemy_prototypes, enemy_count(config, wave), health_scale, speed_scale)
    };

    let spawns = (0..count)
        .map(|_| {
            let prototype = table[rng.gen_range(0..table.len())].clone();
            let position = if config.spawn_points.is_empty() {
                Vec3::ZERO
            } else {
                Vec3::from_array(config.spawn_points[rng.gen_range(0..config.spawn_points.len())])
            };
            SpawnOrder {
                prototype,
                position,
                health_scale,
                speed_scale,
            }
        })
        .collect();

    Ok(WavePlan {
        wave,
        is_boss,
        spawns,
    })
}

/// Wave lifecycle. Mutated only by the wave systems.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct WaveDirector {
    phase: WavePhase,
    /// Current wave index (0 before the first wave)
    wave: u32,
    is_boss: bool,
    /// Countdown of the current timed phase
    timer: f32,
    /// Enemies of the current wave still alive
    remaining: u32,
    started: bool,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self {
            phase: WavePhase::Idle,
            wave: 0,
            is_boss: false,
            timer: 0.0,
            remaining: 0,
            started: false,
        }
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn is_boss_wave(&self) -> bool {
        self.is_boss
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Arm the first wave after `start_delay`. No-op once started.
    pub fn start(&mut self, config: &WaveConfig) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.timer = config.start_delay;
        true
    }

    /// Advance timers by `delta` seconds.
    pub fn advance(&mut self, delta: f32, config: &WaveConfig) -> Option<WaveStep> {
        match self.phase {
            WavePhase::Idle => {
                if !self.started {
                    return None;
                }
                self.timer -= delta;
                (self.timer <= 0.0).then(|| self.announce_next(config))
            }
            WavePhase::Announcing => {
                self.timer -= delta;
                if self.timer > 0.0 {
                    return None;
                }
                self.phase = WavePhase::Spawning;
                Some(WaveStep::Spawn {
                    wave: self.wave,
                    is_boss: self.is_boss,
                })
            }
            WavePhase::Waiting => {
                if self.remaining > 0 {
                    return None;
                }
                self.phase = WavePhase::Intermission;
                self.timer = config.wave_interval;
                Some(WaveStep::Completed { wave: self.wave })
            }
            WavePhase::Intermission => {
                self.timer -= delta;
                (self.timer <= 0.0).then(|| self.announce_next(config))
            }
            // Spawning ждёт begin_waiting от системы
            WavePhase::Spawning | WavePhase::Halted => None,
        }
    }

    fn announce_next(&mut self, config: &WaveConfig) -> WaveStep {
        self.wave += 1;
        self.is_boss = config.is_boss_wave(self.wave);
        self.phase = WavePhase::Announcing;
        self.timer = if self.is_boss {
            config.boss_warning
        } else {
            config.announce_duration
        };
        WaveStep::Announced {
            wave: self.wave,
            is_boss: self.is_boss,
        }
    }

    /// Spawning done: `spawned` enemies must die before the wave completes.
    pub fn begin_waiting(&mut self, spawned: u32) {
        if self.phase != WavePhase::Spawning {
            return;
        }
        self.remaining = spawned;
        self.phase = WavePhase::Waiting;
    }

    /// Death notification for an enemy registered to `wave`.
    ///
    /// Returns false (no-op) for stale waves or an already-zero counter.
    pub fn register_death(&mut self, wave: u32) -> bool {
        if wave != self.wave
            || !matches!(self.phase, WavePhase::Spawning | WavePhase::Waiting)
            || self.remaining == 0
        {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Stop wave progression (configuration error).
    pub fn halt(&mut self) {
        self.phase = WavePhase::Halted;
        self.remaining = 0;
    }
}
