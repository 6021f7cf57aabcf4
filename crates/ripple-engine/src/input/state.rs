use std::collections::HashSet;

use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Held-input state for the window, plus per-frame accumulators.
///
/// The runtime feeds every translated event through `apply` and calls
/// `end_frame` after each rendered frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in logical pixels; `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,

    // Per-frame.
    keys_pressed: HashSet<Key>,
    pointer_delta: (f32, f32),
    wheel_lines: f32,
}

impl InputState {
    pub fn apply(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = m,

            InputEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    // Releases are not delivered while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                if let Some((px, py)) = self.pointer_pos {
                    self.pointer_delta.0 += x - px;
                    self.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((x, y));
            }

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(key) {
                        self.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                ButtonState::Pressed => {
                    self.buttons_down.insert(button);
                }
                ButtonState::Released => {
                    self.buttons_down.remove(&button);
                }
            },

            InputEvent::MouseWheel(delta) => self.wheel_lines += delta.lines_y(),
        }
    }

    /// Clears the per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel_lines = 0.0;
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Pressed since the last `end_frame`.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Pointer motion since the last `end_frame`, in logical pixels.
    pub fn pointer_delta(&self) -> (f32, f32) {
        self.pointer_delta
    }

    /// Wheel motion since the last `end_frame`, in lines.
    pub fn wheel_lines(&self) -> f32 {
        self.wheel_lines
    }
}
