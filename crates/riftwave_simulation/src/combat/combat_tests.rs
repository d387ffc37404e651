//! Tests for damage application, melee reach and projectile collisions.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::ecs::system::RunSystemOnce;
    use bevy::prelude::*;

    use super::super::*;
    use crate::components::{Actor, Health};
    use crate::pool::{tick_pools, Dormant, EntityPool, Pooled, PrototypeId};

    const PLAYER_FACTION: u64 = 1;
    const ENEMY_FACTION: u64 = 2;

    /// Helper: App с combat цепочкой в Update (без fixed timestep)
    fn combat_app() -> App {
        let mut app = App::new();
        app.init_resource::<CombatConfig>()
            .insert_resource(EntityPool::new(8))
            .insert_resource(Time::<Fixed>::default())
            .add_event::<CollisionOccurred>()
            .add_event::<MeleeStrike>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_systems(
                Update,
                (
                    resolve_enemy_attacks,
                    process_collisions,
                    detonate_explosives,
                    apply_damage,
                )
                    .chain(),
            );
        app
    }

    fn spawn_actor(app: &mut App, position: Vec3, faction_id: u64, health: u32) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_translation(position),
                Actor { faction_id },
                Health::new(health),
            ))
            .id()
    }

    fn bolt(owner: Entity, faction_id: u64, damage: u32) -> ProjectileLaunch {
        ProjectileLaunch {
            prototype: PrototypeId::new("grenade"),
            origin: Vec3::ZERO,
            direction: Vec3::X,
            speed: 10.0,
            damage,
            max_range: 15.0,
            owner: Some(owner),
            faction_id: Some(faction_id),
            explosive: None,
            impact_effect: None,
        }
    }

    fn launch(app: &mut App, owner: Entity, faction_id: u64, damage: u32) -> Entity {
        launch_with(app, bolt(owner, faction_id, damage))
    }

    fn launch_with(app: &mut App, launch: ProjectileLaunch) -> Entity {
        app.world_mut()
            .run_system_once(move |mut pool: ResMut<EntityPool>, mut commands: Commands| {
                launch_projectile(&mut pool, &mut commands, &launch)
            })
            .unwrap()
            .unwrap()
    }

    /// Сдвинуть fixed время на `seconds` и прогнать одну систему.
    /// Потом delta обнуляется, чтобы `app.update()` не тикал таймеры ещё раз.
    fn step_system<M>(app: &mut App, seconds: f32, system: impl IntoSystem<(), (), M>) {
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(Duration::from_secs_f32(seconds));
        app.world_mut().run_system_once(system).unwrap();
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(Duration::ZERO);
    }

    fn collide(app: &mut App, a: Entity, b: Entity) {
        app.world_mut().send_event(CollisionOccurred {
            a,
            b,
            contact_point: Vec3::ZERO,
        });
    }

    fn events<E: Event + Clone>(app: &App) -> Vec<E> {
        app.world()
            .resource::<Events<E>>()
            .iter_current_update_events()
            .cloned()
            .collect()
    }

    fn health(app: &App, entity: Entity) -> u32 {
        app.world().get::<Health>(entity).unwrap().current
    }

    #[test]
    fn test_hit_reduces_health() {
        let mut app = combat_app();
        let target = spawn_actor(&mut app, Vec3::ZERO, ENEMY_FACTION, 100);

        app.world_mut().send_event(HitLanded {
            attacker: None,
            target,
            damage: 30,
            source: DamageSource::Melee,
        });
        app.update();

        assert_eq!(health(&app, target), 70);
        let dealt = events::<DamageDealt>(&app);
        assert_eq!(dealt.len(), 1);
        assert!(!dealt[0].target_died);
        assert!(events::<EntityDied>(&app).is_empty());
    }

    #[test]
    fn test_death_notified_once() {
        let mut app = combat_app();
        let killer = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let target = spawn_actor(&mut app, Vec3::X, ENEMY_FACTION, 20);

        // Два смертельных удара в одном кадре
        for _ in 0..2 {
            app.world_mut().send_event(HitLanded {
                attacker: Some(killer),
                target,
                damage: 50,
                source: DamageSource::Projectile,
            });
        }
        app.update();

        let died = events::<EntityDied>(&app);
        assert_eq!(died.len(), 1);
        assert_eq!(died[0].entity, target);
        assert_eq!(died[0].killer, Some(killer));
        assert_eq!(events::<DamageDealt>(&app).len(), 1);
        assert_eq!(health(&app, target), 0);
    }

    #[test]
    fn test_invulnerable_target_takes_nothing() {
        let mut app = combat_app();
        let target = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        app.world_mut().get_mut::<Health>(target).unwrap().invulnerable = true;

        app.world_mut().send_event(HitLanded {
            attacker: None,
            target,
            damage: 40,
            source: DamageSource::Melee,
        });
        app.update();

        assert_eq!(health(&app, target), 100);
        assert!(events::<DamageDealt>(&app).is_empty());
    }

    #[test]
    fn test_melee_reach_checked_at_strike() {
        let mut app = combat_app();
        let attacker = spawn_actor(&mut app, Vec3::ZERO, ENEMY_FACTION, 100);
        let near = spawn_actor(&mut app, Vec3::new(2.4, 0.0, 0.0), PLAYER_FACTION, 100);
        let far = spawn_actor(&mut app, Vec3::new(3.0, 0.0, 0.0), PLAYER_FACTION, 100);

        for target in [near, far] {
            app.world_mut().send_event(MeleeStrike {
                attacker,
                target,
                damage: 10,
                reach: 2.0,
            });
        }
        app.update();

        // 2.4m ≤ 2.0 + tolerance, 3.0m: мимо
        assert_eq!(health(&app, near), 90);
        assert_eq!(health(&app, far), 100);
    }

    #[test]
    fn test_dead_attacker_does_not_strike() {
        let mut app = combat_app();
        let attacker = spawn_actor(&mut app, Vec3::ZERO, ENEMY_FACTION, 100);
        let target = spawn_actor(&mut app, Vec3::X, PLAYER_FACTION, 100);
        app.world_mut().get_mut::<Health>(attacker).unwrap().current = 0;

        app.world_mut().send_event(MeleeStrike {
            attacker,
            target,
            damage: 10,
            reach: 2.0,
        });
        app.update();

        assert_eq!(health(&app, target), 100);
    }

    #[test]
    fn test_projectile_hit_damages_and_releases() {
        let mut app = combat_app();
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let enemy = spawn_actor(&mut app, Vec3::X * 5.0, ENEMY_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 60);

        collide(&mut app, projectile, enemy);
        app.update();

        assert_eq!(health(&app, enemy), 40);
        assert!(app.world().get::<Dormant>(projectile).is_some());
        assert!(app.world().get::<Pooled>(projectile).is_none());

        let stats = app
            .world()
            .resource::<EntityPool>()
            .stats(&PrototypeId::new("grenade"))
            .unwrap();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.free, 1);
    }

    #[test]
    fn test_projectile_hits_only_once() {
        let mut app = combat_app();
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let first = spawn_actor(&mut app, Vec3::X, ENEMY_FACTION, 100);
        let second = spawn_actor(&mut app, Vec3::X * 2.0, ENEMY_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 25);

        collide(&mut app, first, projectile); // порядок a/b не важен
        collide(&mut app, projectile, second);
        app.update();

        assert_eq!(health(&app, first), 75);
        assert_eq!(health(&app, second), 100);
        assert_eq!(events::<HitLanded>(&app).len(), 1);
    }

    #[test]
    fn test_owner_collision_ignored() {
        let mut app = combat_app();
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 60);

        collide(&mut app, projectile, shooter);
        app.update();

        assert_eq!(health(&app, shooter), 100);
        assert!(app.world().get::<Dormant>(projectile).is_none());
        assert!(!app.world().get::<Projectile>(projectile).unwrap().spent);
    }

    #[test]
    fn test_allied_hit_without_friendly_fire() {
        let mut app = combat_app();
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let ally = spawn_actor(&mut app, Vec3::X, PLAYER_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 60);
        let handle = app.world().get::<Pooled>(projectile).unwrap().handle;

        collide(&mut app, projectile, ally);
        app.update();

        assert_eq!(health(&app, ally), 100);
        assert!(events::<HitLanded>(&app).is_empty());

        // Release отложен на 0.1s
        let pool = app.world().resource::<EntityPool>();
        assert!(pool.is_release_pending(&handle));
        assert!(pool.is_active(&handle));
    }

    #[test]
    fn test_allied_hit_with_friendly_fire() {
        let mut app = combat_app();
        app.world_mut().resource_mut::<CombatConfig>().friendly_fire = true;
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let ally = spawn_actor(&mut app, Vec3::X, PLAYER_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 60);

        collide(&mut app, projectile, ally);
        app.update();

        assert_eq!(health(&app, ally), 40);
    }

    #[test]
    fn test_projectile_released_past_max_range() {
        let mut app = combat_app();
        let shooter = spawn_actor(&mut app, Vec3::ZERO, PLAYER_FACTION, 100);
        let projectile = launch(&mut app, shooter, PLAYER_FACTION, 60);

        let step = |app: &mut App| step_system(app, 1.0, move_projectiles);

        // 10 m/s × 1s = 10m < 15m
        step(&mut app);
        let transform = app.world().get::<Transform>(projectile).unwrap();
        assert!((transform.translation.x - 10.0).abs() < 1e-4);
        assert!(app.world().get::<Dormant>(projectile).is_none());

        // 20m ≥ 15m → release
        step(&mut app);
        assert!(app.world().get::<Dormant>(projectile).is_some());
        assert!(app.world().get::<Projectile>(projectile).unwrap().spent);
    }

    #[test]
    fn test_explosion_damage_falloff() {
        let charge = ExplosiveCharge {
            fuse: 3.0,
            radius: 5.0,
            damage: 50,
        };
        assert_eq!(charge.damage_at(0.0), 50);
        assert_eq!(charge.damage_at(2.0), 30);
        assert_eq!(charge.damage_at(2.5), 25);
        assert_eq!(charge.damage_at(5.0), 0);
        assert_eq!(charge.damage_at(7.0), 0);
    }

    #[test]
    fn test_grenade_rests_on_contact_then_explodes() {
        let mut app = combat_app();
        let thrower = spawn_actor(&mut app, Vec3::new(-1.0, 0.0, 0.0), PLAYER_FACTION, 100);
        let near = spawn_actor(&mut app, Vec3::new(2.0, 0.0, 0.0), ENEMY_FACTION, 100);
        let far = spawn_actor(&mut app, Vec3::new(6.0, 0.0, 0.0), ENEMY_FACTION, 100);

        let mut launch = bolt(thrower, PLAYER_FACTION, 0);
        launch.explosive = Some(ExplosiveCharge {
            fuse: 1.0,
            radius: 5.0,
            damage: 50,
        });
        launch.impact_effect = Some(PrototypeId::new("grenade_explosion"));
        let grenade = launch_with(&mut app, launch);

        // Контакт: без урона, граната остаётся лежать
        collide(&mut app, grenade, near);
        app.update();
        assert_eq!(health(&app, near), 100);
        let projectile = app.world().get::<Projectile>(grenade).unwrap();
        assert!(projectile.is_resting());
        assert!(!projectile.spent);

        // Полфьюза: ещё не взорвалась
        step_system(&mut app, 0.5, detonate_explosives);
        app.update();
        assert_eq!(health(&app, near), 100);
        assert!(app.world().get::<Dormant>(grenade).is_none());

        step_system(&mut app, 0.5, detonate_explosives);
        app.update();

        // d = 2m из 5m → round(50 × 0.6)
        assert_eq!(health(&app, near), 70);
        assert_eq!(health(&app, far), 100);
        assert_eq!(health(&app, thrower), 100);
        assert!(app.world().get::<Dormant>(grenade).is_some());

        let stats = app
            .world()
            .resource::<EntityPool>()
            .stats(&PrototypeId::new("grenade_explosion"))
            .unwrap();
        assert_eq!(stats.active, 1);
    }

    #[test]
    fn test_impact_effect_spawned_and_released() {
        let mut app = combat_app();
        let thrower = spawn_actor(&mut app, Vec3::ZERO, ENEMY_FACTION, 100);
        let target = spawn_actor(&mut app, Vec3::X * 3.0, PLAYER_FACTION, 100);
        let spark = PrototypeId::new("axe_impact");

        let mut launch = bolt(thrower, ENEMY_FACTION, 15);
        launch.impact_effect = Some(spark.clone());
        let axe = launch_with(&mut app, launch);

        app.world_mut().send_event(CollisionOccurred {
            a: axe,
            b: target,
            contact_point: Vec3::new(3.0, 1.0, 0.0),
        });
        app.update();

        assert_eq!(health(&app, target), 85);
        let active_sparks = |app: &App| app.world().resource::<EntityPool>().stats(&spark).unwrap().active;
        assert_eq!(active_sparks(&app), 1);

        // Эффект живёт IMPACT_EFFECT_LIFETIME
        step_system(&mut app, IMPACT_EFFECT_LIFETIME, tick_pools);
        app.update();
        assert_eq!(active_sparks(&app), 0);
    }
}
