//! Keyboard and pointer input state.
//!
//! The host writes events into an [`InputState`] (usually through a
//! [`SharedInput`] handle, from whatever thread its event loop runs on). Once
//! per frame the game driver captures an immutable [`InputSnapshot`], which is
//! what scenes read. A key press that starts and ends between two frames still
//! shows up as both just-pressed and just-released in the next snapshot.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::math::Vec2;

/// Tracks the state of a set of inputs (keys or buttons).
///
/// - `pressed`: down right now
/// - `just_pressed`: pressed since the previous snapshot
/// - `just_released`: released since the previous snapshot
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Clone> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Down right now, whether or not it went down this frame.
    pub fn pressed(&self, input: &T) -> bool {
        self.pressed.contains(input)
    }

    /// Went down since the previous frame.
    pub fn just_pressed(&self, input: &T) -> bool {
        self.just_pressed.contains(input)
    }

    /// Came up since the previous frame.
    pub fn just_released(&self, input: &T) -> bool {
        self.just_released.contains(input)
    }

    pub(crate) fn press(&mut self, input: T) {
        if self.pressed.insert(input.clone()) {
            self.just_pressed.insert(input);
        }
    }

    pub(crate) fn release(&mut self, input: &T) {
        if self.pressed.remove(input) {
            self.just_released.insert(input.clone());
        }
    }

    /// Clear per-frame state.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Clone> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer (mouse or touch) state as seen by one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    /// Position in view coordinates.
    pub position: Vec2,
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

// ── InputState ──────────────────────────────────────────────────────────

/// Mutable input state, written by the host's event handler.
#[derive(Debug, Default)]
pub struct InputState {
    keys: Input<String>,
    pointer: Pointer,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, name: &str) {
        self.keys.press(name.to_string());
    }

    pub fn key_up(&mut self, name: &str) {
        self.keys.release(&name.to_string());
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.pointer.position = position;
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.pointer.position = position;
        if !self.pointer.pressed {
            self.pointer.pressed = true;
            self.pointer.just_pressed = true;
        }
    }

    pub fn pointer_up(&mut self, position: Vec2) {
        self.pointer.position = position;
        if self.pointer.pressed {
            self.pointer.pressed = false;
            self.pointer.just_released = true;
        }
    }

    /// Capture the current state and start a new frame of just-pressed /
    /// just-released tracking.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            keys: self.keys.clone(),
            pointer: self.pointer,
        };
        self.keys.clear_just();
        self.pointer.just_pressed = false;
        self.pointer.just_released = false;
        snapshot
    }
}

/// Input state shared between the host's event thread and the game loop.
pub type SharedInput = Arc<Mutex<InputState>>;

pub(crate) fn capture(shared: &SharedInput) -> InputSnapshot {
    shared
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .snapshot()
}

// ── InputSnapshot ───────────────────────────────────────────────────────

/// Read-only input for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keys: Input<String>,
    pointer: Pointer,
}

impl InputSnapshot {
    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    /// Whether `key` is down right now.
    pub fn key_down(&self, name: &str) -> bool {
        self.keys.pressed(&name.to_string())
    }

    /// Returns `true` if the key went down this frame.
    pub fn key_pressed(&self, name: &str) -> bool {
        self.keys.just_pressed(&name.to_string())
    }

    /// Returns `true` if the key went up this frame.
    pub fn key_released(&self, name: &str) -> bool {
        self.keys.just_released(&name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_hold() {
        let mut state = InputState::new();
        state.key_down("Space");
        let frame1 = state.snapshot();
        assert!(frame1.key_down("Space"));
        assert!(frame1.key_pressed("Space"));

        let frame2 = state.snapshot();
        assert!(frame2.key_down("Space"));
        assert!(!frame2.key_pressed("Space"));

        state.key_up("Space");
        let frame3 = state.snapshot();
        assert!(!frame3.key_down("Space"));
        assert!(frame3.key_released("Space"));
    }

    #[test]
    fn tap_between_frames_is_seen() {
        let mut state = InputState::new();
        state.key_down("KeyA");
        state.key_up("KeyA");
        let frame = state.snapshot();
        assert!(!frame.key_down("KeyA"));
        assert!(frame.key_pressed("KeyA"));
        assert!(frame.key_released("KeyA"));
    }

    #[test]
    fn repeated_key_down_is_one_press() {
        let mut input = Input::<String>::new();
        input.press("a".into());
        input.clear_just();
        input.press("a".into());
        assert!(!input.just_pressed(&"a".to_string()));
    }

    #[test]
    fn pointer_tracking() {
        let shared: SharedInput = Arc::new(Mutex::new(InputState::new()));
        shared
            .lock()
            .unwrap()
            .pointer_down(Vec2::new(10.0, 20.0));

        let frame = capture(&shared);
        let pointer = frame.pointer();
        assert!(pointer.pressed && pointer.just_pressed);
        assert_eq!(pointer.position, Vec2::new(10.0, 20.0));

        shared.lock().unwrap().pointer_up(Vec2::new(12.0, 20.0));
        let pointer = capture(&shared).pointer();
        assert!(!pointer.pressed && pointer.just_released && !pointer.just_pressed);
    }
}
