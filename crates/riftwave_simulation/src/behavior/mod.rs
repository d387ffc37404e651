//! Behavior state machines for AI entities
//!
//! Framework only: конкретный граф состояний врагов живёт в `enemy`.

pub mod machine;

#[cfg(test)]
mod machine_tests;

pub use machine::{BehaviorStateMachine, StateHandler};
