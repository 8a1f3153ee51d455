// Input event module
// Platform-independent input events consumed by the application state

use std::time::{Duration, Instant};

/// Hold time before a held key starts repeating
pub const REPEAT_DELAY: Duration = Duration::from_millis(500);
/// Time between repeats once a held key is repeating
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(40);

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Left,
    Right,
    Up,
    Down,
    Plus,
    Minus,
    /// Restore the initial view
    Reset,
}

impl Key {
    /// Whether holding the key keeps stepping the view
    pub fn repeats(self) -> bool {
        matches!(
            self,
            Key::Left | Key::Right | Key::Up | Key::Down | Key::Plus | Key::Minus
        )
    }
}

/// Pointer buttons the viewer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Other(u32),
}

/// Scroll wheel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// One input event, already translated from the windowing backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Window close request
    Quit,
    KeyPressed(Key),
    /// One wheel notch at the last known pointer position
    Wheel(WheelDirection),
    PointerDown {
        button: Button,
        x: f64,
        y: f64,
    },
    PointerUp {
        button: Button,
    },
    PointerMotion {
        x: f64,
        y: f64,
    },
    /// Pointer left the window
    PointerLeave,
    /// Window content area changed size
    Resized {
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    code: u32,
    key: Key,
    next_fire: Instant,
}

/// Client-side key repeat for the last pressed pan/zoom key
///
/// Keys are identified by the backend's raw key code so a release still
/// matches when modifiers changed the symbol in between.
#[derive(Debug, Default)]
pub struct KeyRepeat {
    held: Option<HeldKey>,
}

impl KeyRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a pressed key. A press of any other key stops the
    /// previous repeat.
    pub fn press(&mut self, code: u32, key: Key, now: Instant) {
        self.held = key.repeats().then(|| HeldKey {
            code,
            key,
            next_fire: now + REPEAT_DELAY,
        });
    }

    pub fn release(&mut self, code: u32) {
        if self.held.is_some_and(|held| held.code == code) {
            self.held = None;
        }
    }

    /// Drop any held key, e.g. when keyboard focus is lost
    pub fn cancel(&mut self) {
        self.held = None;
    }

    /// Emit at most one repeat that is due at `now`.
    ///
    /// A late poll does not replay the missed repeats, the next one is
    /// scheduled one interval after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Key> {
        let held = self.held.as_mut()?;
        if now < held.next_fire {
            return None;
        }
        held.next_fire = now + REPEAT_INTERVAL;
        Some(held.key)
    }
}
