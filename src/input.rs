//! Input boundary
//!
//! The simulation never sees raw device events. Hosts translate keyboard and
//! touch into a [`KeyState`] plus a list of pointer positions, once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::WORLD_WIDTH;

/// Keys the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Fire,
    Escape,
    DebugToggle,
    FastForward,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::Up,
        Key::Down,
        Key::Fire,
        Key::Escape,
        Key::DebugToggle,
        Key::FastForward,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Boolean key map (held = true)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    bits: u8,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for hosts and tests
    pub fn with(mut self, key: Key) -> Self {
        self.set(key, true);
        self
    }

    pub fn set(&mut self, key: Key, held: bool) {
        if held {
            self.bits |= key.bit();
        } else {
            self.bits &= !key.bit();
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.bits & key.bit() != 0
    }

    pub fn any(&self) -> bool {
        self.bits != 0
    }

    /// Keys held in either state
    pub fn union(&self, other: KeyState) -> KeyState {
        KeyState {
            bits: self.bits | other.bits,
        }
    }

    /// Keys held now that were not held in `previous`
    pub fn pressed_since(&self, previous: KeyState) -> KeyState {
        KeyState {
            bits: self.bits & !previous.bits,
        }
    }
}

/// Half-height of the band around the ship where a left-side touch is ignored
pub const POINTER_DEAD_ZONE: f32 = 12.0;

/// Map touch/pointer positions to keys.
///
/// Left half steers toward the pointer relative to the ship's y, right half
/// fires.
pub fn pointer_keys(pointers: &[Vec2], ship_y: f32) -> KeyState {
    let mut keys = KeyState::new();
    for p in pointers {
        if p.x >= WORLD_WIDTH / 2.0 {
            keys.set(Key::Fire, true);
        } else if p.y < ship_y - POINTER_DEAD_ZONE {
            keys.set(Key::Up, true);
        } else if p.y > ship_y + POINTER_DEAD_ZONE {
            keys.set(Key::Down, true);
        }
    }
    keys
}

/// Everything the host hands the simulation for one tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held keys
    pub keys: KeyState,
    /// Active pointer/touch positions in world coordinates
    pub pointers: Vec<Vec2>,
    /// Monotonic timestamp in seconds (only used by the shot gate)
    pub now: f64,
}

impl TickInput {
    pub fn keys(keys: KeyState, now: f64) -> Self {
        Self {
            keys,
            pointers: Vec::new(),
            now,
        }
    }
}

/// Rising-edge detector for one screen.
///
/// A latch is armed with whatever is held at `enter`, so a key still held from
/// the previous screen never counts as a fresh press. Disarmed latches report
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    previous: KeyState,
    armed: bool,
}

impl InputLatch {
    pub fn arm(&mut self, held: KeyState) {
        self.previous = held;
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.previous = KeyState::new();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feed this tick's held keys, returning keys newly pressed
    pub fn poll(&mut self, held: KeyState) -> KeyState {
        if !self.armed {
            return KeyState::new();
        }
        let pressed = held.pressed_since(self.previous);
        self.previous = held;
        pressed
    }
}
