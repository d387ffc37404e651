//! Tests for the generic behavior state machine.

#[cfg(test)]
mod tests {
    use super::super::machine::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        Yellow,
        Red,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Hook {
        Enter(Light),
        Update(Light),
        Exit(Light),
    }

    /// Green → Yellow after 2s, Yellow → Red after 1s, Red stays.
    #[derive(Default)]
    struct Recorder {
        /// Between Exit and Enter
        mid_transition: bool,
    }

    impl StateHandler<Vec<Hook>> for Recorder {
        type Key = Light;

        fn enter(&mut self, state: Light, log: &mut Vec<Hook>) {
            self.mid_transition = false;
            log.push(Hook::Enter(state));
        }

        fn update(&mut self, state: Light, elapsed: f32, _delta: f32, log: &mut Vec<Hook>) -> Option<Light> {
            assert!(!self.mid_transition, "update observed a half-finished transition");
            log.push(Hook::Update(state));
            match state {
                Light::Green if elapsed >= 2.0 => Some(Light::Yellow),
                Light::Yellow if elapsed >= 1.0 => Some(Light::Red),
                _ => None,
            }
        }

        fn exit(&mut self, state: Light, log: &mut Vec<Hook>) {
            self.mid_transition = true;
            log.push(Hook::Exit(state));
        }
    }

    #[test]
    fn test_initialize_calls_enter_only() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        assert!(machine.initialize(Light::Green, &mut handler, &mut log));
        assert_eq!(log, vec![Hook::Enter(Light::Green)]);
        assert_eq!(machine.current(), Some(Light::Green));
        assert_eq!(machine.previous(), None);

        // Повторный initialize: no-op
        assert!(!machine.initialize(Light::Red, &mut handler, &mut log));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_change_state_exit_then_enter() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        machine.initialize(Light::Green, &mut handler, &mut log);
        log.clear();

        assert!(machine.change_state(Light::Red, &mut handler, &mut log));
        assert_eq!(log, vec![Hook::Exit(Light::Green), Hook::Enter(Light::Red)]);
        assert_eq!(machine.previous(), Some(Light::Green));
        assert_eq!(machine.transitions(), 1);
    }

    #[test]
    fn test_change_into_current_state_is_noop() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        machine.initialize(Light::Yellow, &mut handler, &mut log);
        machine.update(0.5, &mut handler, &mut log);
        log.clear();

        assert!(!machine.change_state(Light::Yellow, &mut handler, &mut log));
        assert!(log.is_empty());
        // Residency timer не сбрасывается
        assert_eq!(machine.elapsed(), 0.5);
    }

    #[test]
    fn test_change_before_initialize_is_noop() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        assert!(!machine.change_state(Light::Red, &mut handler, &mut log));
        assert!(log.is_empty());
        assert_eq!(machine.update(1.0, &mut handler, &mut log), None);
        assert!(!machine.is_initialized());
    }

    #[test]
    fn test_update_drives_timed_transitions() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        machine.initialize(Light::Green, &mut handler, &mut log);

        assert_eq!(machine.update(1.0, &mut handler, &mut log), None);
        assert_eq!(machine.elapsed(), 1.0);
        assert_eq!(machine.update(1.0, &mut handler, &mut log), Some(Light::Yellow));
        assert_eq!(machine.elapsed(), 0.0);
        assert_eq!(machine.update(1.0, &mut handler, &mut log), Some(Light::Red));
        assert_eq!(machine.update(100.0, &mut handler, &mut log), None);
        assert!(machine.is_in(Light::Red));

        assert_eq!(
            log,
            vec![
                Hook::Enter(Light::Green),
                Hook::Update(Light::Green),
                Hook::Update(Light::Green),
                Hook::Exit(Light::Green),
                Hook::Enter(Light::Yellow),
                Hook::Update(Light::Yellow),
                Hook::Exit(Light::Yellow),
                Hook::Enter(Light::Red),
                Hook::Update(Light::Red),
            ]
        );
    }

    #[test]
    fn test_one_exit_one_enter_per_transition() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        machine.initialize(Light::Green, &mut handler, &mut log);
        let sequence = [Light::Red, Light::Yellow, Light::Yellow, Light::Green, Light::Red];
        for next in sequence {
            log.clear();
            let changed = machine.change_state(next, &mut handler, &mut log);
            let exits = log.iter().filter(|hook| matches!(hook, Hook::Exit(_))).count();
            let enters = log.iter().filter(|hook| matches!(hook, Hook::Enter(_))).count();
            if changed {
                assert_eq!((exits, enters), (1, 1));
                assert!(matches!(log[0], Hook::Exit(_)));
            } else {
                assert_eq!((exits, enters), (0, 0));
            }
        }
        assert_eq!(machine.transitions(), 4);
    }

    #[test]
    fn test_reset_allows_reinitialize() {
        let mut machine = BehaviorStateMachine::new();
        let mut handler = Recorder::default();
        let mut log = Vec::new();

        machine.initialize(Light::Red, &mut handler, &mut log);
        machine.reset();
        log.clear();

        assert!(machine.initialize(Light::Green, &mut handler, &mut log));
        // Reset не вызывает Exit
        assert_eq!(log, vec![Hook::Enter(Light::Green)]);
    }
}
