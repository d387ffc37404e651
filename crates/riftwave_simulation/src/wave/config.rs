//! Wave configuration (data asset)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pool::PrototypeId;

/// Extra scaling for boss spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct BossScaling {
    pub health_factor: f32,
    pub speed_factor: f32,
    /// true: factors multiply the wave scale; false: factors replace it
    pub compound_with_wave: bool,
}

impl Default for BossScaling {
    fn default() -> Self {
        Self {
            health_factor: 2.0,
            speed_factor: 1.0,
            compound_with_wave: true,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct WaveConfig {
    /// Enemies in wave 1
    pub base_enemy_count: u32,
    /// count(n) = floor(base × multiplier^(n-1))
    pub enemy_count_multiplier: f32,
    pub enemy_health_multiplier: f32,
    pub enemy_speed_multiplier: f32,

    // Timing (seconds)
    /// Pause after a wave is cleared
    pub wave_interval: f32,
    /// Delay before the first wave
    pub start_delay: f32,
    /// Warning lead time before a boss spawns
    pub boss_warning: f32,
    /// Announce lead time for regular waves
    pub announce_duration: f32,

    /// Every N-th wave is a boss wave (0 = never)
    pub boss_every: u32,
    pub boss_scaling: BossScaling,

    pub enemy_prototypes: Vec<PrototypeId>,
    pub boss_prototypes: Vec<PrototypeId>,
    /// Spawn positions; empty → world origin
    pub spawn_points: Vec<[f32; 3]>,

    /// Start the first wave automatically at startup
    pub auto_start: bool,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_enemy_count: 2,
            enemy_count_multiplier: 1.2,
            enemy_health_multiplier: 1.1,
            enemy_speed_multiplier: 1.05,
            wave_interval: 30.0,
            start_delay: 1.0,
            boss_warning: 5.0,
            announce_duration: 0.0,
            boss_every: 5,
            boss_scaling: BossScaling::default(),
            enemy_prototypes: vec![
                PrototypeId::new("grunt"),
                PrototypeId::new("dodger"),
                PrototypeId::new("axeman"),
            ],
            boss_prototypes: vec![PrototypeId::new("brute")],
            spawn_points: vec![
                [12.0, 0.0, 0.0],
                [-12.0, 0.0, 0.0],
                [0.0, 0.0, 12.0],
                [0.0, 0.0, -12.0],
            ],
            auto_start: true,
        }
    }
}

impl WaveConfig {
    pub fn is_boss_wave(&self, wave: u32) -> bool {
        self.boss_every > 0 && wave > 0 && wave % self.boss_every == 0
    }
}
