//! ECS Components для игровых entity
//!
//! - actor: faction, health, stamina
//! - movement: MovementInput (headless kinematics)
//! - player: player control marker

pub mod actor;
pub mod movement;
pub mod player;

pub use actor::*;
pub use movement::*;
pub use player::*;
