//! Ability scheduler: one instance per ability kind for an actor.
//!
//! Per tick: every instance ticks once (definition order), then at most
//! one pending activation request is resolved. Requests never queue.

use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;

use super::definition::{AbilityDefinition, AbilityKind};
use super::instance::{AbilityActor, AbilityInstance, AbilitySignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("ability {0:?} already registered (first registration wins)")]
    DuplicateAbility(AbilityKind),

    #[error("ability {0:?} is not registered for this actor")]
    UnknownAbility(AbilityKind),
}

#[derive(Component, Debug, Default)]
pub struct AbilityScheduler {
    abilities: Vec<AbilityInstance>,
    /// Latest activation request this frame (overwrites earlier ones)
    pending: Option<AbilityKind>,
    signals: Vec<AbilitySignal>,
}

impl AbilityScheduler {
    /// Build from a loadout; duplicates are logged and dropped.
    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = Arc<AbilityDefinition>>,
    {
        let mut scheduler = Self::default();
        for definition in definitions {
            if let Err(err) = scheduler.register(definition) {
                crate::logger::log_warning(&format!("AbilityScheduler: {}", err));
            }
        }
        scheduler
    }

    pub fn register(&mut self, definition: Arc<AbilityDefinition>) -> Result<(), AbilityError> {
        if self.get(definition.kind).is_some() {
            return Err(AbilityError::DuplicateAbility(definition.kind));
        }
        self.abilities.push(AbilityInstance::new(definition));
        Ok(())
    }

    pub fn get(&self, kind: AbilityKind) -> Option<&AbilityInstance> {
        self.abilities.iter().find(|ability| ability.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityInstance> {
        self.abilities.iter()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Input layer: request activation this frame. Only the latest request survives.
    pub fn request(&mut self, kind: AbilityKind) {
        self.pending = Some(kind);
    }

    pub fn pending_request(&self) -> Option<AbilityKind> {
        self.pending
    }

    /// One frame: tick every ability, then resolve the pending request.
    ///
    /// Returns the activation result if a request was processed.
    pub fn tick<A: AbilityActor + ?Sized>(&mut self, delta: f32, actor: &mut A) -> Option<bool> {
        for ability in &mut self.abilities {
            ability.tick(delta, &mut self.signals);
        }

        let kind = self.pending.take()?;
        Some(self.try_activate(kind, actor))
    }

    /// Activate now if possible. Never buffers: a refused request is dropped.
    pub fn try_activate<A: AbilityActor + ?Sized>(&mut self, kind: AbilityKind, actor: &mut A) -> bool {
        let Some(index) = self.abilities.iter().position(|ability| ability.kind() == kind) else {
            crate::logger::log_warning(&format!(
                "AbilityScheduler: {}",
                AbilityError::UnknownAbility(kind)
            ));
            return false;
        };

        if !self.abilities[index].can_activate(&*actor) {
            crate::logger::log(&format!(
                "Ability {:?} cannot be activated right now (state {:?}, cooldown {:.2})",
                kind,
                self.abilities[index].state(),
                self.abilities[index].cooldown_progress()
            ));
            return false;
        }

        let definition = Arc::clone(self.abilities[index].definition());
        if definition.interrupts_other_abilities {
            for (other_index, other) in self.abilities.iter_mut().enumerate() {
                if other_index != index && other.cancel(&mut self.signals) {
                    crate::logger::log(&format!("Ability {:?} interrupted by {:?}", other.kind(), kind));
                }
            }
        } else if definition.exclusive && self.exclusive_busy(index) {
            crate::logger::log(&format!(
                "Ability {:?} blocked: another exclusive ability is running",
                kind
            ));
            return false;
        }

        let activated = self.abilities[index].activate(actor, &mut self.signals);
        if activated {
            crate::logger::log(&format!("⚡ Ability {:?} activated", kind));
        }
        activated
    }

    fn exclusive_busy(&self, except: usize) -> bool {
        self.abilities
            .iter()
            .enumerate()
            .any(|(index, ability)| index != except && ability.is_busy() && ability.definition().exclusive)
    }

    /// Cancel everything in flight (death, stun). Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for ability in &mut self.abilities {
            if ability.cancel(&mut self.signals) {
                cancelled += 1;
            }
        }
        self.pending = None;
        cancelled
    }

    /// Respawn: every ability back to `Ready`, timers and charges restored.
    pub fn reset_all(&mut self) {
        for ability in &mut self.abilities {
            ability.reset(&mut self.signals);
        }
        self.pending = None;
    }

    pub fn disable(&mut self, kind: AbilityKind) -> Result<bool, AbilityError> {
        let ability = self
            .abilities
            .iter_mut()
            .find(|ability| ability.kind() == kind)
            .ok_or(AbilityError::UnknownAbility(kind))?;
        Ok(ability.disable(&mut self.signals))
    }

    pub fn enable(&mut self, kind: AbilityKind) -> Result<bool, AbilityError> {
        let ability = self
            .abilities
            .iter_mut()
            .find(|ability| ability.kind() == kind)
            .ok_or(AbilityError::UnknownAbility(kind))?;
        Ok(ability.enable(&mut self.signals))
    }

    /// Signals produced since the last drain, in order.
    pub fn signals(&self) -> &[AbilitySignal] {
        &self.signals
    }

    /// Move pending signals into `buffer` (keeps both allocations alive).
    pub fn drain_signals_into(&mut self, buffer: &mut Vec<AbilitySignal>) {
        buffer.extend(self.signals.drain(..));
    }
}
