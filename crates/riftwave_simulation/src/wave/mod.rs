//! Wave-based enemy spawning
//!
//! - config: `WaveConfig` (count/health/speed multipliers, timings, spawn tables)
//! - director: `WaveDirector` lifecycle + `plan_wave` (deterministic via seeded RNG)
//! - systems: spawn from pool, death tracking, wave events

use bevy::prelude::*;

pub mod config;
pub mod director;
pub mod systems;


pub use config::{BossScaling, WaveConfig};
pub use director::{
    enemy_count, plan_wave, wave_scale, SpawnOrder, WaveDirector, WaveError, WavePhase, WavePlan,
    WaveStep,
};
pub use systems::{
    drive_wave_director, spawn_enemy, spawn_wave, start_waves, track_wave_deaths, BossWarning,
    WaveAnnounced, WaveCompleted, WaveMember, WaveStarted,
};

/// Wave Plugin
///
/// Startup: start_waves (если `auto_start`).
/// FixedUpdate (Waves): track_wave_deaths → drive_wave_director.
pub struct WavePlugin;

impl Plugin for WavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WaveConfig>()
            .init_resource::<WaveDirector>()
            .add_event::<WaveAnnounced>()
            .add_event::<BossWarning>()
            .add_event::<WaveStarted>()
            .add_event::<WaveCompleted>();

        app.add_systems(Startup, start_waves).add_systems(
            FixedUpdate,
            (track_wave_deaths, drive_wave_director)
                .chain()
                .in_set(crate::SimulationSet::Waves),
        );
    }
}
