//! Platform-agnostic input handling

use std::time::{Duration, Instant};

use tracing::trace;

/// Hold time before a pressed key starts repeating
pub const REPEAT_DELAY: Duration = Duration::from_millis(150);
/// Time between repeats once a held key is repeating
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(150);

/// Keys the demo reacts to; everything else collapses to `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Other,
}

/// Platform-independent input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Window lost keyboard focus; held keys stop repeating
    FocusLost,
    CloseRequested,
}

/// State change requested by a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Rotate faster counter-clockwise (left arrow)
    SpeedUp,
    /// Rotate faster clockwise (right arrow)
    SpeedDown,
    /// Zoom in faster (down arrow)
    ZoomSpeedUp,
    /// Zoom out faster (up arrow)
    ZoomSpeedDown,
    /// Halt rotation and zoom (space)
    Stop,
}

impl ControlAction {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::ArrowLeft => Some(ControlAction::SpeedUp),
            Key::ArrowRight => Some(ControlAction::SpeedDown),
            Key::ArrowDown => Some(ControlAction::ZoomSpeedUp),
            Key::ArrowUp => Some(ControlAction::ZoomSpeedDown),
            Key::Space => Some(ControlAction::Stop),
            Key::Other => None,
        }
    }
}

/// Most recently pressed key, repeated while it stays down
#[derive(Debug, Clone, Copy)]
struct HeldKey {
    key: Key,
    next_repeat: Instant,
}

/// Input collected between two frames
#[derive(Debug, Default)]
pub struct InputState {
    pending: Vec<ControlAction>,
    held: Option<HeldKey>,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event received at `now` and update state
    pub fn process_event(&mut self, event: &InputEvent, now: Instant) {
        match event {
            InputEvent::KeyDown(key) => {
                self.press(*key);
                self.held = Some(HeldKey {
                    key: *key,
                    next_repeat: now + REPEAT_DELAY,
                });
            }
            InputEvent::KeyUp(key) => {
                if self.held.is_some_and(|held| held.key == *key) {
                    self.held = None;
                }
            }
            InputEvent::FocusLost => self.held = None,
            InputEvent::CloseRequested => self.quit = true,
        }
    }

    /// Queue a press for every repeat of the held key that fell due by `now`.
    /// Only the last key pressed repeats.
    pub fn repeat_held(&mut self, now: Instant) {
        let Some(mut held) = self.held else {
            return;
        };
        while held.next_repeat <= now {
            self.press(held.key);
            held.next_repeat += REPEAT_INTERVAL;
        }
        self.held = Some(held);
    }

    fn press(&mut self, key: Key) {
        if let Some(action) = ControlAction::from_key(key) {
            self.pending.push(action);
        } else {
            trace!(?key, "ignoring key");
        }
    }

    /// Take every action queued since the last frame, oldest first
    pub fn drain(&mut self) -> Vec<ControlAction> {
        std::mem::take(&mut self.pending)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent};
    use winit::keyboard::{KeyCode, PhysicalKey};

    pub fn key_from_code(code: KeyCode) -> Key {
        match code {
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,
            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::Space => Key::Space,
            _ => Key::Other,
        }
    }

    /// Platform repeats are dropped; `InputState` runs its own repeat timer.
    pub fn keyboard_event_to_input(event: &KeyEvent) -> Option<InputEvent> {
        if event.repeat {
            return None;
        }
        let key = match event.physical_key {
            PhysicalKey::Code(code) => key_from_code(code),
            PhysicalKey::Unidentified(_) => Key::Other,
        };
        match event.state {
            ElementState::Pressed => Some(InputEvent::KeyDown(key)),
            ElementState::Released => Some(InputEvent::KeyUp(key)),
        }
    }
}
