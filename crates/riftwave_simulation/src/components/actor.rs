//! Базовые компоненты акторов: Actor, Health, Stamina

use bevy::prelude::*;

/// Актор (игрок или враг): базовый компонент для живых существ
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Actor {
    /// Stable ID фракции (friendly fire, target selection)
    pub faction_id: u64,
}

/// Результат нанесения урона
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChange {
    /// Урон поглощён (invulnerable или уже мертв)
    Ignored,
    Damaged,
    /// Этот вызов опустил HP до нуля (ровно один раз за жизнь)
    Died,
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
    /// Dash i-frames: damage is ignored while set
    pub invulnerable: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
            invulnerable: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Reduce health. Death is reported once: hits on a corpse are ignored.
    pub fn reduce_health(&mut self, amount: u32) -> HealthChange {
        if self.invulnerable || self.is_dead() {
            return HealthChange::Ignored;
        }

        self.current = self.current.saturating_sub(amount);
        if self.is_dead() {
            HealthChange::Died
        } else {
            HealthChange::Damaged
        }
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

/// Выносливость (stamina): ресурс для способностей
///
/// Инвариант: 0.0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
    pub regen_rate: f32, // units per second
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 10.0,
        }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    pub fn consume(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    pub fn regenerate(&mut self, delta_time: f32) {
        self.current = (self.current + self.regen_rate * delta_time).min(self.max);
    }
}

/// System: regenerate stamina (FixedUpdate)
pub fn regenerate_stamina(mut query: Query<&mut Stamina>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut stamina in query.iter_mut() {
        if stamina.current < stamina.max {
            stamina.regenerate(delta);
        }
    }
}
