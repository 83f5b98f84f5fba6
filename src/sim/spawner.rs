//! Difficulty ramps and the asteroid spawner
//!
//! Every ramp is a pure function of elapsed game time. Anchors sit at 0, 60,
//! 120 and 180 seconds; past 180 seconds everything holds its last value.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::asteroid::{Asteroid, SizeClass};
use crate::piecewise_linear;

/// Seconds between spawns
const SPAWN_INTERVAL_ANCHORS: [(f32, f32); 4] =
    [(0.0, 3.0), (60.0, 1.0), (120.0, 0.5), (180.0, 0.25)];

/// Share of Large asteroids (spans the whole 0-180s range)
const LARGE_RATIO_ANCHORS: [(f32, f32); 2] = [(0.0, 0.10), (180.0, 0.50)];

/// Max angled-spawn deflection in degrees, from 60s on
const DEFLECTION_ANCHORS: [(f32, f32); 3] = [(60.0, 5.0), (120.0, 10.0), (180.0, 20.0)];

/// Exploding-variant chance, from 60s on
const EXPLOSIVE_ANCHORS: [(f32, f32); 2] = [(60.0, 0.10), (180.0, 0.20)];

/// Game time at which angled and exploding spawns unlock
pub const HAZARD_UNLOCK_SECS: f32 = 60.0;

/// Small:Medium split of the non-Large share
const SMALL_SHARE: f32 = 4.0 / 9.0;

pub fn spawn_interval(game_time: f32) -> f32 {
    piecewise_linear(game_time, &SPAWN_INTERVAL_ANCHORS)
}

pub fn large_ratio(game_time: f32) -> f32 {
    piecewise_linear(game_time, &LARGE_RATIO_ANCHORS)
}

/// Probabilities of (Small, Medium, Large)
pub fn size_probabilities(game_time: f32) -> (f32, f32, f32) {
    let large = large_ratio(game_time);
    let rest = 1.0 - large;
    (rest * SMALL_SHARE, rest * (1.0 - SMALL_SHARE), large)
}

/// Max deflection in degrees; 0 while angled spawns are locked
pub fn max_deflection_deg(game_time: f32) -> f32 {
    if game_time < HAZARD_UNLOCK_SECS {
        0.0
    } else {
        piecewise_linear(game_time, &DEFLECTION_ANCHORS)
    }
}

pub fn explosive_chance(game_time: f32) -> f32 {
    if game_time < HAZARD_UNLOCK_SECS {
        0.0
    } else {
        piecewise_linear(game_time, &EXPLOSIVE_ANCHORS)
    }
}

/// Pick a size class for the current ramp state
pub fn roll_size<R: Rng + ?Sized>(rng: &mut R, game_time: f32) -> SizeClass {
    let (small, medium, _) = size_probabilities(game_time);
    let roll: f32 = rng.random();
    if roll < small {
        SizeClass::Small
    } else if roll < small + medium {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

/// Signed deflection for a new asteroid: 0 unless unlocked and the coin flip
/// says angled, then uniform in [0, max] with a uniform sign
pub fn roll_deflection<R: Rng + ?Sized>(rng: &mut R, game_time: f32) -> f32 {
    let max = max_deflection_deg(game_time);
    if max <= 0.0 || !rng.random_bool(0.5) {
        return 0.0;
    }
    let angle = rng.random_range(0.0..=max);
    if rng.random_bool(0.5) { angle } else { -angle }
}

/// Countdown-driven asteroid spawner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    countdown: f32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawner {
    pub fn new() -> Self {
        Self {
            countdown: spawn_interval(0.0),
        }
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    /// Advance by `dt` of game time. Returns a new asteroid when one is due.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        game_time: f32,
        rng: &mut R,
    ) -> Option<Asteroid> {
        let interval = spawn_interval(game_time);

        // Desync guard: after a game-time jump the stale countdown would
        // otherwise delay (or burst) spawns
        if self.countdown > interval * 2.0 {
            log::debug!("spawn countdown {:.2}s resynced to {:.2}s", self.countdown, interval);
            self.countdown = interval;
        }

        self.countdown -= dt.max(0.0);
        if self.countdown > 0.0 {
            return None;
        }
        self.countdown = interval;

        let size = roll_size(rng, game_time);
        let exploding = rng.random_bool(explosive_chance(game_time).clamp(0.0, 1.0) as f64);
        let deflection = roll_deflection(rng, game_time);
        log::debug!(
            "spawn {:?} exploding={} deflection={:.1} at t={:.1}",
            size,
            exploding,
            deflection,
            game_time
        );
        Some(Asteroid::spawn(rng, size, exploding, deflection))
    }
}
