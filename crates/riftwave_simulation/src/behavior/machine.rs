//! Generic behavior state machine
//!
//! Состояния: ключи (обычно fieldless enum), поведение, один handler
//! с tagged dispatch по ключу (`StateHandler`). Машина хранит только
//! текущее/предыдущее состояние и время пребывания.
//!
//! ```text
//! initialize(S)   → Enter(S)
//! change_state(T) → Exit(S), current = T, Enter(T)   (T == S → no-op)
//! update(dt)      → Update(S) → Some(T)? → change_state(T)
//! ```
//!
//! Переход выполняется целиком внутри одного `&mut self` вызова, поэтому
//! ни один Update не видит машину "между" Exit и Enter.

use std::fmt::Debug;

/// Per-state lifecycle hooks, dispatched on the state key.
///
/// `C` is whatever the owner passes in each frame (entity snapshot,
/// intents buffer, etc).
pub trait StateHandler<C> {
    type Key: Copy + Eq + Debug;

    fn enter(&mut self, state: Self::Key, ctx: &mut C);

    /// Called once per frame while resident. `elapsed` is time since Enter
    /// (including this frame). Returning `Some(next)` requests a transition.
    fn update(&mut self, state: Self::Key, elapsed: f32, delta: f32, ctx: &mut C) -> Option<Self::Key>;

    fn exit(&mut self, state: Self::Key, ctx: &mut C);
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorStateMachine<K> {
    current: Option<K>,
    previous: Option<K>,
    /// Residency time of the current state (seconds since Enter)
    elapsed: f32,
    transitions: u32,
}

impl<K> Default for BehaviorStateMachine<K> {
    fn default() -> Self {
        Self {
            current: None,
            previous: None,
            elapsed: 0.0,
            transitions: 0,
        }
    }
}

impl<K: Copy + Eq + Debug> BehaviorStateMachine<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<K> {
        self.current
    }

    pub fn previous(&self) -> Option<K> {
        self.previous
    }

    pub fn is_in(&self, state: K) -> bool {
        self.current == Some(state)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of `change_state` transitions since the last initialize.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Set the initial state: Enter only, no prior Exit.
    ///
    /// Returns false (no-op) if the machine is already running; use
    /// [`Self::reset`] first when reusing a pooled owner.
    pub fn initialize<C, H>(&mut self, state: K, handler: &mut H, ctx: &mut C) -> bool
    where
        H: StateHandler<C, Key = K>,
    {
        if let Some(current) = self.current {
            crate::logger::log(&format!(
                "BehaviorStateMachine: initialize({:?}) ignored, already in {:?}",
                state, current
            ));
            return false;
        }

        self.current = Some(state);
        self.previous = None;
        self.elapsed = 0.0;
        self.transitions = 0;
        handler.enter(state, ctx);
        true
    }

    /// Exit current → swap → Enter next. Same state or uninitialized → no-op.
    pub fn change_state<C, H>(&mut self, next: K, handler: &mut H, ctx: &mut C) -> bool
    where
        H: StateHandler<C, Key = K>,
    {
        let Some(current) = self.current else {
            crate::logger::log(&format!(
                "BehaviorStateMachine: change_state({:?}) before initialize",
                next
            ));
            return false;
        };
        if current == next {
            return false;
        }

        handler.exit(current, ctx);
        self.previous = Some(current);
        self.current = Some(next);
        self.elapsed = 0.0;
        self.transitions = self.transitions.wrapping_add(1);
        handler.enter(next, ctx);
        true
    }

    /// One frame of the current state. Returns the state entered this
    /// frame, if the handler requested a (non no-op) transition.
    pub fn update<C, H>(&mut self, delta: f32, handler: &mut H, ctx: &mut C) -> Option<K>
    where
        H: StateHandler<C, Key = K>,
    {
        let current = self.current?;
        self.elapsed += delta;

        let next = handler.update(current, self.elapsed, delta, ctx)?;
        self.change_state(next, handler, ctx).then_some(next)
    }

    /// Forget the current state without calling Exit (pooled reuse).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
