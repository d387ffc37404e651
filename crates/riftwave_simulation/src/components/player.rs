//! Player control marker component
//!
//! Отмечает entity которым управляет игрок через input (в отличие от AI).

use bevy::prelude::Component;

/// Marker component для player-controlled entity
///
/// - Enemy brains ищут цель через `With<Player>`
/// - Ability requests от input layer адресуются этому entity
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;
