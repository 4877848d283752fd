//! Input mapping - discrete key events to movement intents and actions

use super::movement::MoveIntent;
use super::player::LookController;

/// Buttons the core understands; the embedding layer maps physical keys
/// and mouse buttons onto these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Fire,
    Reload,
}

/// Input events delivered from the platform layer
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    ButtonDown(Button),
    ButtonUp(Button),
    /// Raw pointer movement; only honored while pointer lock is active
    PointerDelta { dx: f32, dy: f32 },
    /// Pointer-lock state change reported by the platform
    PointerLock(bool),
    SetSensitivity(f32),
}

/// Held-button state accumulated between simulation steps
#[derive(Debug, Default)]
pub struct InputState {
    pub intent: MoveIntent,
    pub fire_held: bool,
    pointer_locked: bool,
    reload_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one input event into the held state, steering look angles
    /// directly for pointer deltas
    pub fn apply(&mut self, event: InputEvent, look: &mut LookController) {
        match event {
            InputEvent::ButtonDown(button) => self.set_button(button, true),
            InputEvent::ButtonUp(button) => self.set_button(button, false),
            InputEvent::PointerDelta { dx, dy } => {
                if self.pointer_locked {
                    look.apply_pointer_delta(dx, dy);
                }
            }
            InputEvent::PointerLock(locked) => self.pointer_locked = locked,
            InputEvent::SetSensitivity(setting) => look.set_sensitivity(setting),
        }
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::Forward => self.intent.forward = pressed,
            Button::Backward => self.intent.backward = pressed,
            Button::Left => self.intent.left = pressed,
            Button::Right => self.intent.right = pressed,
            Button::Jump => self.intent.jump = pressed,
            Button::Fire => self.fire_held = pressed,
            Button::Reload => {
                if pressed {
                    self.reload_requested = true;
                }
            }
        }
    }

    /// Edge-triggered reload request; consumed by the session step
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Drop held state, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.intent = MoveIntent::default();
        self.fire_held = false;
        self.reload_requested = false;
    }
}
