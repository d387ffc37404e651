//! Riftwave Simulation Core
//!
//! Headless wave-survival симуляция на Bevy 0.16 ECS.
//!
//! - pool: переиспользуемые entity (враги, снаряды, эффекты)
//! - ability: timed ability state machine + per-actor scheduler
//! - behavior / enemy: generic state machine + enemy behavior graph
//! - wave: wave director (progression, boss waves, deterministic spawns)
//! - combat: damage, death notification, projectile collisions
//!
//! Рендер, input, physics и navigation живут вне симуляции: они шлют
//! события (`AbilityActivationRequested`, `CollisionOccurred`) и читают
//! результат из ECS.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ability;
pub mod behavior;
pub mod combat;
pub mod components;
pub mod config;
pub mod enemy;
pub mod logger;
pub mod pool;
pub mod wave;

pub use ability::{
    AbilityActivationRequested, AbilityDefinition, AbilityExecuted, AbilityKind, AbilityPlugin,
    AbilityScheduler, AbilityState, AbilityStateChanged,
};
pub use behavior::{BehaviorStateMachine, StateHandler};
pub use combat::{
    CollisionOccurred, CombatConfig, CombatPlugin, DamageDealt, DamageSource, EntityDied,
    ExplosiveCharge, HitLanded, Projectile,
};
pub use components::*;
pub use config::{ConfigError, PlayerConfig, SimulationConfig, DEFAULT_TICK_RATE_HZ};
pub use enemy::{EnemyArchetype, EnemyArchetypes, EnemyBrain, EnemyPlugin, EnemyState};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use pool::{Dormant, EntityPool, PoolConfig, PoolPlugin, PrototypeId};
pub use wave::{
    BossWarning, WaveAnnounced, WaveCompleted, WaveConfig, WaveDirector, WavePhase, WavePlugin,
    WaveStarted,
};

/// Фракция игрока (враги: `enemy::ENEMY_FACTION`)
pub const PLAYER_FACTION: u64 = 1;

/// Порядок одного simulation tick (FixedUpdate, цепочкой)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Отложенные pool releases
    Pools,
    /// Ability requests → schedulers → effects
    Abilities,
    /// Enemy behavior graphs
    Behavior,
    Movement,
    /// Strikes/collisions → damage → death notification
    Combat,
    /// Реакция на смерть (Dead state, cancel abilities, release)
    Death,
    Waves,
    /// Stamina regen
    Recovery,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Берёт `SimulationConfig` из мира (или default) и раскладывает его по
/// ресурсам подсистем до того как те инициализируются.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let mut config = app
            .world()
            .get_resource::<SimulationConfig>()
            .cloned()
            .unwrap_or_default();
        config.sanitize();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(config.seed));
        }

        app
            // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
            .insert_resource(Time::<Fixed>::from_hz(config.tick_rate_hz))
            .insert_resource(config.pools.clone())
            .insert_resource(config.waves.clone())
            .insert_resource(config.combat.clone())
            .insert_resource(EnemyArchetypes::new(config.archetypes.clone()))
            .insert_resource(config);

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Pools,
                SimulationSet::Abilities,
                SimulationSet::Behavior,
                SimulationSet::Movement,
                SimulationSet::Combat,
                SimulationSet::Death,
                SimulationSet::Waves,
                SimulationSet::Recovery,
            )
                .chain(),
        );

        // Подсистемы
        app.add_plugins((PoolPlugin, AbilityPlugin, EnemyPlugin, CombatPlugin, WavePlugin));

        app.add_systems(FixedUpdate, pool::tick_pools.in_set(SimulationSet::Pools))
            .add_systems(FixedUpdate, apply_movement.in_set(SimulationSet::Movement))
            .add_systems(
                FixedUpdate,
                regenerate_stamina.in_set(SimulationSet::Recovery),
            );

        logger::log_info("🎮 SimulationPlugin ready");
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Headless App с полной симуляцией по конфигу
pub fn create_simulation_app(config: SimulationConfig) -> App {
    let mut app = create_headless_app(config.seed);
    app.insert_resource(config).add_plugins(SimulationPlugin);
    app
}

/// Spawn игрока: stats + ability loadout из конфига
pub fn spawn_player(commands: &mut Commands, config: &PlayerConfig) -> Entity {
    let scheduler = AbilityScheduler::from_definitions(
        config.abilities.iter().cloned().map(std::sync::Arc::new),
    );
    let mut stamina = Stamina::new(config.max_stamina);
    stamina.regen_rate = config.stamina_regen;

    let entity = commands
        .spawn((
            Transform::from_translation(Vec3::from_array(config.spawn_point)),
            Player,
            Actor {
                faction_id: PLAYER_FACTION,
            },
            Health::new(config.max_health),
            stamina,
            MovementInput::default(),
            scheduler,
        ))
        .id();

    logger::log_info(&format!(
        "🧍 Player {:?} spawned with {} abilities",
        entity,
        config.abilities.len()
    ));
    entity
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
