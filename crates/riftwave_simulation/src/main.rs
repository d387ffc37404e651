//! Headless симуляция Riftwave
//!
//! Usage: `riftwave_simulation [config.json] [ticks]`
//!
//! Вместо input/physics слоя: простые demo системы: игрок бросает гранаты
//! в ближайшего врага (dash если враг вплотную), коллизии снарядов
//! считаются по дистанции.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use riftwave_simulation::combat::{move_projectiles, Projectile};
use riftwave_simulation::*;

const DEFAULT_TICKS: u32 = 60 * 180;
/// Радиус "попадания" demo коллизий (метры)
const DEMO_HIT_RADIUS: f32 = 1.0;
const DEMO_GRENADE_INTERVAL: f32 = 1.5;

fn main() {
    init_logger();
    set_log_level(LogLevel::Info);

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log_error(&format!("{}", err));
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    config.sanitize();
    let ticks = args
        .next()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(DEFAULT_TICKS);

    log_info(&format!(
        "Starting Riftwave headless simulation (seed: {}, ticks: {})",
        config.seed, ticks
    ));

    // Один app.update() = ровно один fixed tick
    let tick = Duration::from_secs_f64(1.0 / config.tick_rate_hz);
    let player_config = config.player.clone();

    let mut app = create_simulation_app(config);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(tick))
        .add_systems(
            FixedUpdate,
            demo_player_input.before(SimulationSet::Abilities),
        )
        .add_systems(
            FixedUpdate,
            detect_proximity_collisions
                .after(move_projectiles)
                .in_set(SimulationSet::Movement),
        );

    let player = spawn_player(&mut app.world_mut().commands(), &player_config);
    app.world_mut().flush();

    for tick in 0..ticks {
        app.update();

        if tick % 600 == 0 {
            let director = app.world().resource::<WaveDirector>();
            log_info(&format!(
                "Tick {}: wave {} ({:?}), {} enemies remaining",
                tick,
                director.wave(),
                director.phase(),
                director.remaining()
            ));
        }

        let player_dead = app
            .world()
            .get::<Health>(player)
            .map_or(true, Health::is_dead);
        if player_dead {
            log_info(&format!("☠️ Player died at tick {}", tick));
            break;
        }
    }

    let director = app.world().resource::<WaveDirector>();
    log_info(&format!(
        "Simulation complete! Reached wave {} ({:?})",
        director.wave(),
        director.phase()
    ));
}

/// Demo input: граната в ближайшего врага, dash если враг ближе 3m
fn demo_player_input(
    time: Res<Time<Fixed>>,
    mut cooldown: Local<f32>,
    mut players: Query<(Entity, &mut Transform, &Health), With<Player>>,
    enemies: Query<&Transform, (With<EnemyBrain>, Without<Dormant>, Without<Player>)>,
    mut requests: EventWriter<AbilityActivationRequested>,
) {
    *cooldown -= time.delta_secs();
    if *cooldown > 0.0 {
        return;
    }

    for (entity, mut transform, health) in players.iter_mut() {
        if health.is_dead() {
            continue;
        }

        let position = transform.translation;
        let nearest = enemies
            .iter()
            .map(|enemy| enemy.translation)
            .filter(|target| target.distance_squared(position) > f32::EPSILON)
            .min_by(|a, b| a.distance_squared(position).total_cmp(&b.distance_squared(position)));
        let Some(target) = nearest else {
            continue;
        };

        let distance = target.distance(position);
        if distance < 3.0 {
            // Отскок от врага
            transform.look_at(position * 2.0 - target.with_y(position.y), Vec3::Y);
            requests.write(AbilityActivationRequested {
                actor: entity,
                kind: AbilityKind::Dash,
            });
        } else {
            transform.look_at(target.with_y(position.y), Vec3::Y);
            requests.write(AbilityActivationRequested {
                actor: entity,
                kind: AbilityKind::Grenade,
            });
        }
        *cooldown = DEMO_GRENADE_INTERVAL;
    }
}

/// Demo physics: снаряд рядом с актором → CollisionOccurred
fn detect_proximity_collisions(
    projectiles: Query<(Entity, &Transform, &Projectile), Without<Dormant>>,
    actors: Query<(Entity, &Transform), (With<Actor>, Without<Dormant>, Without<Projectile>)>,
    mut collisions: EventWriter<CollisionOccurred>,
) {
    for (projectile_entity, projectile_transform, projectile) in projectiles.iter() {
        if projectile.spent {
            continue;
        }

        let hit = actors.iter().find(|(actor, transform)| {
            Some(*actor) != projectile.owner
                && transform.translation.distance(projectile_transform.translation)
                    <= DEMO_HIT_RADIUS
        });

        if let Some((actor, transform)) = hit {
            collisions.write(CollisionOccurred {
                a: projectile_entity,
                b: actor,
                contact_point: transform.translation,
            });
        }
    }
}
