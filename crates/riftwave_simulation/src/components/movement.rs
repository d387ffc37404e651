//! Movement компоненты

use bevy::prelude::*;

/// Desired movement this tick (direction × speed), written by AI/abilities.
///
/// Headless: `apply_movement` integrates it straight into `Transform`
/// (navigation/physics живут вне симуляции).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    /// Normalized direction (or zero)
    pub direction: Vec3,
    /// Meters per second
    pub speed: f32,
}

impl MovementInput {
    pub fn stop(&mut self) {
        self.direction = Vec3::ZERO;
        self.speed = 0.0;
    }

    pub fn velocity(&self) -> Vec3 {
        self.direction * self.speed
    }
}

/// System: integrate `MovementInput` into `Transform`.
pub fn apply_movement(
    mut query: Query<(&mut Transform, &MovementInput), Without<crate::pool::Dormant>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut transform, input) in query.iter_mut() {
        transform.translation += input.velocity() * delta;
    }
}
