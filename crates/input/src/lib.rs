//! Input handling: key events in, discrete game intents out.
//!
//! The game never polls keys. Every held-key behaviour (steering) is modelled as a
//! start edge and a stop edge, and toggles fire once per press.

use std::collections::HashSet;

/// A discrete event delivered to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameInput {
    StartSteerLeft,
    StopSteerLeft,
    StartSteerRight,
    StopSteerRight,
    ToggleDebugCamera,
    TogglePause,
}

/// Key bindings for the game's intents.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub steer_left: Vec<KeyCode>,
    pub steer_right: Vec<KeyCode>,
    pub debug_camera: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            steer_left: vec![KeyCode::ArrowLeft, KeyCode::KeyA],
            steer_right: vec![KeyCode::ArrowRight, KeyCode::KeyD],
            debug_camera: vec![KeyCode::KeyC],
            pause: vec![KeyCode::KeyP, KeyCode::Escape],
        }
    }
}

/// Turns raw keyboard events into [`GameInput`] edges.
#[derive(Debug, Default)]
pub struct InputMapper {
    bindings: KeyBindings,
    /// Keys currently held down (filters OS key repeat).
    keys_held: HashSet<KeyCode>,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            keys_held: HashSet::new(),
        }
    }

    /// Process a keyboard event. Returns the intent edge it produces, if any.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> Option<GameInput> {
        let pressed = match state {
            ElementState::Pressed => {
                if !self.keys_held.insert(key) {
                    // Auto-repeat.
                    return None;
                }
                true
            }
            ElementState::Released => {
                if !self.keys_held.remove(&key) {
                    return None;
                }
                false
            }
        };

        let b = &self.bindings;
        let event = if b.steer_left.contains(&key) {
            Some(if pressed { GameInput::StartSteerLeft } else { GameInput::StopSteerLeft })
        } else if b.steer_right.contains(&key) {
            Some(if pressed { GameInput::StartSteerRight } else { GameInput::StopSteerRight })
        } else if pressed && b.debug_camera.contains(&key) {
            Some(GameInput::ToggleDebugCamera)
        } else if pressed && b.pause.contains(&key) {
            Some(GameInput::TogglePause)
        } else {
            None
        };
        if let Some(e) = event {
            log::trace!("{:?} {:?} -> {:?}", key, state, e);
        }
        event
    }

    /// Release every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) -> Vec<GameInput> {
        let held: Vec<KeyCode> = self.keys_held.iter().copied().collect();
        held.into_iter()
            .filter_map(|k| self.process_keyboard(k, ElementState::Released))
            .collect()
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steering_produces_start_and_stop_edges() {
        let mut input = InputMapper::default();
        assert_eq!(
            input.process_keyboard(KeyCode::ArrowLeft, ElementState::Pressed),
            Some(GameInput::StartSteerLeft)
        );
        assert_eq!(
            input.process_keyboard(KeyCode::ArrowLeft, ElementState::Released),
            Some(GameInput::StopSteerLeft)
        );
    }

    #[test]
    fn key_repeat_is_filtered() {
        let mut input = InputMapper::default();
        assert!(input.process_keyboard(KeyCode::KeyD, ElementState::Pressed).is_some());
        assert_eq!(input.process_keyboard(KeyCode::KeyD, ElementState::Pressed), None);
        assert!(input.is_key_held(KeyCode::KeyD));
    }

    #[test]
    fn toggles_fire_on_press_only() {
        let mut input = InputMapper::default();
        assert_eq!(
            input.process_keyboard(KeyCode::KeyP, ElementState::Pressed),
            Some(GameInput::TogglePause)
        );
        assert_eq!(input.process_keyboard(KeyCode::KeyP, ElementState::Released), None);
    }

    #[test]
    fn release_all_stops_held_steering() {
        let mut input = InputMapper::default();
        input.process_keyboard(KeyCode::ArrowRight, ElementState::Pressed);
        assert_eq!(input.release_all(), vec![GameInput::StopSteerRight]);
        assert!(!input.is_key_held(KeyCode::ArrowRight));
    }
}
