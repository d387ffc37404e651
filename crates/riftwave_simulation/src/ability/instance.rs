//! Timed ability state machine (one per actor per ability kind).
//!
//! ```text
//! Ready → Activating → Active → Cooldown → Ready
//!   ↓         └──────┬──┘
//! Disabled        Cancel → Ready (без cooldown)
//! ```
//!
//! Таймеры: countdown поля, двигаются только через `tick(delta)` раз в кадр.

use std::sync::Arc;

use bevy::prelude::*;

use super::definition::{AbilityCost, AbilityDefinition, AbilityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AbilityState {
    Ready,
    Activating,
    Active,
    Cooldown,
    Disabled,
}

/// What happened inside an instance, in order. Collected by the owner and
/// turned into ECS events/effects afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbilitySignal {
    StateChanged {
        kind: AbilityKind,
        from: AbilityState,
        to: AbilityState,
    },
    /// Resources consumed, activation effects due (once per activation)
    Activated { kind: AbilityKind },
    /// Main effect fires (once, on entering `Active`)
    Executed { kind: AbilityKind },
    /// Active phase ended normally, cooldown started
    Completed { kind: AbilityKind },
    /// Interrupted from `Activating`/`Active`, no cooldown
    Cancelled { kind: AbilityKind },
}

/// Actor-side capability an ability checks and spends against.
pub trait AbilityActor {
    fn is_alive(&self) -> bool {
        true
    }

    fn is_moving(&self) -> bool {
        false
    }

    fn is_attacking(&self) -> bool {
        false
    }

    fn can_afford(&self, cost: &AbilityCost) -> bool;

    fn consume(&mut self, cost: &AbilityCost);
}

#[derive(Debug, Clone)]
pub struct AbilityInstance {
    definition: Arc<AbilityDefinition>,
    state: AbilityState,
    cooldown_remaining: f32,
    cast_elapsed: f32,
    active_remaining: f32,
    charges: Option<u32>,
}

impl AbilityInstance {
    pub fn new(definition: Arc<AbilityDefinition>) -> Self {
        let charges = definition.max_charges;
        Self {
            definition,
            state: AbilityState::Ready,
            cooldown_remaining: 0.0,
            cast_elapsed: 0.0,
            active_remaining: 0.0,
            charges,
        }
    }

    pub fn definition(&self) -> &Arc<AbilityDefinition> {
        &self.definition
    }

    pub fn kind(&self) -> AbilityKind {
        self.definition.kind
    }

    pub fn state(&self) -> AbilityState {
        self.state
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn active_remaining(&self) -> f32 {
        self.active_remaining
    }

    pub fn charges(&self) -> Option<u32> {
        self.charges
    }

    /// `Activating` or `Active`
    pub fn is_busy(&self) -> bool {
        matches!(self.state, AbilityState::Activating | AbilityState::Active)
    }

    /// Cast progress in [0, 1] (1 once past the cast phase).
    pub fn cast_progress(&self) -> f32 {
        match self.state {
            AbilityState::Activating if self.definition.cast_time > 0.0 => {
                (self.cast_elapsed / self.definition.cast_time).clamp(0.0, 1.0)
            }
            AbilityState::Activating => 0.0,
            _ => 1.0,
        }
    }

    /// Cooldown progress in [0, 1] (1 = ready).
    pub fn cooldown_progress(&self) -> f32 {
        if self.definition.cooldown <= 0.0 {
            return 1.0;
        }
        (1.0 - self.cooldown_remaining / self.definition.cooldown).clamp(0.0, 1.0)
    }

    pub fn can_activate<A: AbilityActor + ?Sized>(&self, actor: &A) -> bool {
        let definition = &self.definition;

        self.state == AbilityState::Ready
            && self.charges != Some(0)
            && actor.is_alive()
            && (definition.can_use_while_moving || !actor.is_moving())
            && (definition.can_use_while_attacking || !actor.is_attacking())
            && actor.can_afford(&definition.cost)
    }

    /// Try to start the ability. Returns false (no state change) when it
    /// cannot activate right now.
    pub fn activate<A: AbilityActor + ?Sized>(
        &mut self,
        actor: &mut A,
        signals: &mut Vec<AbilitySignal>,
    ) -> bool {
        if !self.can_activate(&*actor) {
            return false;
        }

        self.set_state(AbilityState::Activating, signals);
        actor.consume(&self.definition.cost);
        if let Some(charges) = self.charges.as_mut() {
            *charges -= 1;
        }
        self.cast_elapsed = 0.0;
        signals.push(AbilitySignal::Activated { kind: self.kind() });

        if self.definition.cast_time <= 0.0 {
            self.execute(signals);
        }
        true
    }

    /// Advance timers by `delta` seconds.
    pub fn tick(&mut self, delta: f32, signals: &mut Vec<AbilitySignal>) {
        match self.state {
            AbilityState::Activating => {
                self.cast_elapsed += delta;
                if self.cast_elapsed >= self.definition.cast_time {
                    self.cast_elapsed = self.definition.cast_time;
                    self.execute(signals);
                }
            }
            AbilityState::Active => {
                self.active_remaining -= delta;
                if self.active_remaining <= 0.0 {
                    self.active_remaining = 0.0;
                    self.complete(signals);
                }
            }
            AbilityState::Cooldown => {
                self.cooldown_remaining = (self.cooldown_remaining - delta).max(0.0);
                if self.cooldown_remaining <= 0.0 {
                    self.set_state(AbilityState::Ready, signals);
                }
            }
            AbilityState::Ready | AbilityState::Disabled => {}
        }
    }

    /// Interrupt from `Activating`/`Active` back to `Ready` without cooldown.
    pub fn cancel(&mut self, signals: &mut Vec<AbilitySignal>) -> bool {
        if !self.is_busy() {
            return false;
        }

        self.cast_elapsed = 0.0;
        self.active_remaining = 0.0;
        self.set_state(AbilityState::Ready, signals);
        signals.push(AbilitySignal::Cancelled { kind: self.kind() });
        true
    }

    /// Force back to `Ready` with every timer cleared and charges refilled.
    pub fn reset(&mut self, signals: &mut Vec<AbilitySignal>) {
        if self.is_busy() {
            signals.push(AbilitySignal::Cancelled { kind: self.kind() });
        }
        self.cooldown_remaining = 0.0;
        self.cast_elapsed = 0.0;
        self.active_remaining = 0.0;
        self.charges = self.definition.max_charges;
        self.set_state(AbilityState::Ready, signals);
    }

    /// `Ready → Disabled`. No-op from any other state.
    pub fn disable(&mut self, signals: &mut Vec<AbilitySignal>) -> bool {
        if self.state != AbilityState::Ready {
            return false;
        }
        self.set_state(AbilityState::Disabled, signals);
        true
    }

    /// `Disabled → Ready`.
    pub fn enable(&mut self, signals: &mut Vec<AbilitySignal>) -> bool {
        if self.state != AbilityState::Disabled {
            return false;
        }
        self.set_state(AbilityState::Ready, signals);
        true
    }

    fn execute(&mut self, signals: &mut Vec<AbilitySignal>) {
        self.set_state(AbilityState::Active, signals);
        self.active_remaining = self.definition.duration.max(0.0);
        signals.push(AbilitySignal::Executed { kind: self.kind() });

        if self.active_remaining <= 0.0 {
            self.complete(signals);
        }
    }

    fn complete(&mut self, signals: &mut Vec<AbilitySignal>) {
        self.set_state(AbilityState::Cooldown, signals);
        self.cooldown_remaining = self.definition.cooldown.max(0.0);
        signals.push(AbilitySignal::Completed { kind: self.kind() });

        if self.cooldown_remaining <= 0.0 {
            self.set_state(AbilityState::Ready, signals);
        }
    }

    fn set_state(&mut self, to: AbilityState, signals: &mut Vec<AbilitySignal>) {
        if self.state == to {
            return;
        }
        signals.push(AbilitySignal::StateChanged {
            kind: self.kind(),
            from: self.state,
            to,
        });
        self.state = to;
    }
}
