// Keyboard state for the viewer's toggle keys.
// Turns winit key events into held / pressed-this-frame queries so each
// toggle flips exactly once per key press, regardless of OS key repeat.

use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Default)]
pub struct InputState {
    keys_held:    HashSet<KeyCode>,
    // Keys that went down since the last end_frame().
    keys_pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit WindowEvent into the input state.
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                self.process_key(key, event.state);
            }
        }
    }

    fn process_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Call once per frame after the frame's toggles have been read.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }

    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_does_not_press_twice() {
        let mut input = InputState::new();
        input.process_key(KeyCode::F1, ElementState::Pressed);
        assert!(input.was_key_pressed(KeyCode::F1));
        input.end_frame();

        // OS key repeat delivers another Pressed without a Released.
        input.process_key(KeyCode::F1, ElementState::Pressed);
        assert!(!input.was_key_pressed(KeyCode::F1));
    }

    #[test]
    fn release_then_press_toggles_again() {
        let mut input = InputState::new();
        input.process_key(KeyCode::Tab, ElementState::Pressed);
        input.end_frame();
        input.process_key(KeyCode::Tab, ElementState::Released);
        assert!(!input.was_key_pressed(KeyCode::Tab));
        input.process_key(KeyCode::Tab, ElementState::Pressed);
        assert!(input.was_key_pressed(KeyCode::Tab));
    }
}
