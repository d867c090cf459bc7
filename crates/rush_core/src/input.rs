//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Steering, pitch and boost read this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()`. The host uses
//!   these for one-shot actions such as starting or restarting a run.
//!
//! Key events arrive from the host between frames; the simulation reads a
//! snapshot once per frame on the same thread, so no locking is involved.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    Q,
    E,
    R,
    Shift,
    Space,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Replace the held set with `keys`, emitting press/release edges for the
    /// difference. Scripted drivers use this to apply one frame of input.
    pub fn apply_held(&mut self, keys: &[Key]) {
        let next: HashSet<Key> = keys.iter().copied().collect();
        let released: Vec<Key> = self.held.difference(&next).copied().collect();
        for key in released {
            self.key_up(key);
        }
        for key in next {
            self.key_down(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Drop every held key without emitting release edges. The runner calls
    /// this on restart so keys held through the crash do not carry over.
    pub fn clear(&mut self) {
        self.held.clear();
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        assert!(input.is_held(Key::A));
        assert!(input.is_just_pressed(Key::A));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Shift);
        input.key_up(Key::Shift);
        assert!(!input.is_held(Key::Shift));
        assert!(input.is_just_released(Key::Shift));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Q);
        assert!(!input.is_just_released(Key::Q));
        assert!(!input.is_held(Key::Q));
    }

    #[test]
    fn test_end_frame_keeps_held_clears_edges() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Space);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Right));
        assert!(!input.is_just_pressed(Key::Space));
        assert!(input.is_held(Key::Right));
        assert!(input.is_held(Key::Space));
    }

    #[test]
    fn test_apply_held_emits_edges_for_difference() {
        let mut input = InputState::new();
        input.apply_held(&[Key::Left, Key::Shift]);
        input.end_frame();

        input.apply_held(&[Key::Shift, Key::Up]);
        assert!(input.is_just_released(Key::Left));
        assert!(input.is_just_pressed(Key::Up));
        // Shift stayed down: no fresh edge.
        assert!(!input.is_just_pressed(Key::Shift));
        assert!(input.is_held(Key::Shift));
        assert!(!input.is_held(Key::Left));
    }

    #[test]
    fn test_any_held() {
        let mut input = InputState::new();
        input.key_down(Key::E);
        assert!(input.any_held(&[Key::Right, Key::D, Key::E]));
        assert!(!input.any_held(&[Key::Left, Key::A]));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.clear();
        assert!(!input.is_held(Key::W));
        assert!(!input.is_just_pressed(Key::W));
        assert!(!input.is_just_released(Key::W));
    }

    #[test]
    fn test_key_deserializes_from_name() {
        let keys: Vec<Key> = serde_json::from_str(r#"["Shift","Left","Space"]"#).unwrap();
        assert_eq!(keys, vec![Key::Shift, Key::Left, Key::Space]);
    }
}
