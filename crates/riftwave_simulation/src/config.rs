//! Simulation configuration (JSON data asset)
//!
//! Один файл собирает все tunables: player abilities, enemy archetypes,
//! pool sizing, wave progression, combat rules. Отсутствующие поля берутся
//! из `Default` (serde default), так что частичный JSON валиден.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ability::AbilityDefinition;
use crate::combat::CombatConfig;
use crate::enemy::{default_archetypes, EnemyArchetype};
use crate::pool::{PoolConfig, PrototypeId, PrototypePoolConfig};
use crate::wave::WaveConfig;

/// Fallback fixed timestep rate
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Player stats + ability loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    pub max_stamina: f32,
    /// Stamina units per second
    pub stamina_regen: f32,
    pub spawn_point: [f32; 3],
    pub abilities: Vec<AbilityDefinition>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            max_stamina: 100.0,
            stamina_regen: 10.0,
            spawn_point: [0.0, 0.0, 0.0],
            abilities: vec![AbilityDefinition::dash(), AbilityDefinition::grenade()],
        }
    }
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for `DeterministicRng` (wave spawn selection)
    pub seed: u64,
    /// Fixed timestep rate
    pub tick_rate_hz: f64,
    pub player: PlayerConfig,
    pub archetypes: Vec<EnemyArchetype>,
    pub pools: PoolConfig,
    pub waves: WaveConfig,
    pub combat: CombatConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            player: PlayerConfig::default(),
            archetypes: default_archetypes(),
            pools: default_pool_config(),
            waves: WaveConfig::default(),
            combat: CombatConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        config.log_warnings();
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json_str(&json)?;
        crate::logger::log_info(&format!("📄 Loaded simulation config from {}", path.display()));
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Wave prototypes that have no archetype (these spawns will be skipped).
    pub fn missing_archetypes(&self) -> Vec<PrototypeId> {
        let mut missing: Vec<PrototypeId> = self
            .waves
            .enemy_prototypes
            .iter()
            .chain(self.waves.boss_prototypes.iter())
            .filter(|prototype| {
                !self
                    .archetypes
                    .iter()
                    .any(|archetype| archetype.prototype == **prototype)
            })
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Replace values the engine cannot run with (they would panic inside
    /// bevy_time) by defaults. Returns true if something was replaced.
    pub fn sanitize(&mut self) -> bool {
        if self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0 {
            return false;
        }

        crate::logger::log_warning(&format!(
            "Config: tick_rate_hz {} is not a positive rate, using {} Hz",
            self.tick_rate_hz, DEFAULT_TICK_RATE_HZ
        ));
        self.tick_rate_hz = DEFAULT_TICK_RATE_HZ;
        true
    }

    fn log_warnings(&self) {
        for prototype in self.missing_archetypes() {
            crate::logger::log_warning(&format!(
                "Config: wave prototype '{}' has no enemy archetype",
                prototype
            ));
        }
        if self.waves.enemy_prototypes.is_empty() {
            crate::logger::log_warning("Config: wave enemy table is empty");
        }
    }
}

/// Default pools: enemies (50 each, boss smaller), projectiles, effects.
pub fn default_pool_config() -> PoolConfig {
    let entry = |prototype: &str, capacity: usize, prewarm: usize| PrototypePoolConfig {
        prototype: PrototypeId::new(prototype),
        capacity,
        prewarm,
    };

    PoolConfig {
        prototypes: vec![
            entry("grunt", 50, 10),
            entry("dodger", 50, 10),
            entry("axeman", 50, 10),
            entry("brute", 5, 1),
            entry("grenade", 20, 5),
            entry("grenade_explosion", 20, 5),
            entry("axe", 50, 10),
            entry("axe_impact", 20, 5),
            entry("dash_burst", 10, 2),
        ],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityKind;
    use crate::enemy::ArchetypeBehavior;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = SimulationConfig::from_json_str("{}").unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.waves, WaveConfig::default());
        assert_eq!(config.archetypes.len(), 4);
        assert_eq!(config.player.abilities.len(), 2);
        assert!(config.missing_archetypes().is_empty());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "seed": 7,
            "waves": { "base_enemy_count": 4, "boss_every": 3 },
            "combat": { "friendly_fire": true }
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.waves.base_enemy_count, 4);
        assert_eq!(config.waves.boss_every, 3);
        // Не указанные поля: defaults
        assert_eq!(config.waves.enemy_count_multiplier, 1.2);
        assert!(config.combat.friendly_fire);
        assert_eq!(config.combat.allied_hit_release_delay, 0.1);
    }

    #[test]
    fn test_archetypes_and_abilities_from_json() {
        let json = r#"{
            "player": {
                "abilities": [
                    { "kind": "Dash", "name": "Dash", "cooldown": 2.0, "duration": 0.2,
                      "effect": { "type": "Dash", "distance": 3.0, "speed": 15.0 } }
                ]
            },
            "archetypes": [
                { "prototype": "runner", "max_health": 50, "walk_speed": 3.0, "chase_speed": 7.0,
                  "detection_range": 20.0, "attack_range": 1.5, "attack_damage": 5,
                  "attack_windup": 0.3, "attack_cooldown": 1.0, "recovery_time": 0.5,
                  "behavior": { "type": "Dodge", "cooldown": 1.0 } }
            ],
            "waves": { "enemy_prototypes": ["runner"], "boss_prototypes": ["runner"] }
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();

        assert_eq!(config.player.abilities.len(), 1);
        assert_eq!(config.player.abilities[0].kind, AbilityKind::Dash);
        assert_eq!(config.player.abilities[0].cast_time, 0.0);

        let runner = &config.archetypes[0];
        assert_eq!(runner.faction_id, crate::enemy::ENEMY_FACTION);
        assert_eq!(runner.dead_linger, 1.5);
        match &runner.behavior {
            ArchetypeBehavior::Dodge(params) => {
                assert_eq!(params.cooldown, 1.0);
                assert_eq!(params.min_distance, 2.0); // default
            }
            other => panic!("unexpected behavior {:?}", other),
        }
        assert!(config.missing_archetypes().is_empty());
    }

    #[test]
    fn test_missing_archetypes_reported() {
        let json = r#"{ "waves": { "enemy_prototypes": ["grunt", "ghost"], "boss_prototypes": ["ghost"] } }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();

        assert_eq!(config.missing_archetypes(), vec![PrototypeId::new("ghost")]);
    }

    #[test]
    fn test_bad_tick_rate_falls_back() {
        for json in [r#"{ "tick_rate_hz": 0.0 }"#, r#"{ "tick_rate_hz": -30.0 }"#] {
            let config = SimulationConfig::from_json_str(json).unwrap();
            assert_eq!(config.tick_rate_hz, DEFAULT_TICK_RATE_HZ);
        }

        let mut config = SimulationConfig {
            tick_rate_hz: f64::NAN,
            ..Default::default()
        };
        assert!(config.sanitize());
        assert_eq!(config.tick_rate_hz, DEFAULT_TICK_RATE_HZ);
        assert!(!config.sanitize());
    }

    #[test]
    fn test_app_builds_with_zero_tick_rate() {
        // Конфиг собран в коде, мимо from_json_str
        let config = SimulationConfig {
            tick_rate_hz: 0.0,
            ..Default::default()
        };
        let mut app = crate::create_simulation_app(config);
        app.update();

        let timestep = app.world().resource::<Time<Fixed>>().timestep();
        assert_eq!(timestep, std::time::Duration::from_secs_f64(1.0 / DEFAULT_TICK_RATE_HZ));
        assert_eq!(
            app.world().resource::<SimulationConfig>().tick_rate_hz,
            DEFAULT_TICK_RATE_HZ
        );
    }

    #[test]
    fn test_parse_error() {
        let result = SimulationConfig::from_json_str("{ \"seed\": \"not a number\" }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SimulationConfig::load("/nonexistent/riftwave/config.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let config = SimulationConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed = SimulationConfig::from_json_str(&json).unwrap();

        assert_eq!(parsed.waves, config.waves);
        assert_eq!(parsed.player, config.player);
        assert_eq!(parsed.archetypes, config.archetypes);
    }
}
