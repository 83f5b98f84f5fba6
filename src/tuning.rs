//! Data-driven game balance
//!
//! Session-level knobs. Per-size asteroid numbers live on
//! [`SizeClass`](crate::sim::SizeClass) and the difficulty ramps live in
//! [`spawner`](crate::sim::spawner) because their shapes are part of the rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Lives at session start
    pub lives: u32,

    /// Ship resting x during play
    pub ship_x: f32,
    /// Ship collision radius
    pub ship_radius: f32,
    /// Vertical speed (pixels/s)
    pub ship_speed: f32,

    /// Minimum time between shots (seconds)
    pub shot_interval: f32,
    /// Heat added per shot
    pub heat_per_shot: f32,
    /// Heat removed when the overheat cooldown ends
    pub overheat_drop: f32,

    /// Bullet speed (pixels/s, rightward)
    pub bullet_speed: f32,
    pub bullet_radius: f32,

    /// Post-respawn invincibility (seconds)
    pub invincibility_secs: f32,
    /// Visibility toggle period while invincible
    pub blink_interval: f32,

    /// Hit-freeze on a destructive collision (doubled for explosions)
    pub hit_freeze_secs: f32,
    /// Camera shake added per destroyed asteroid
    pub hit_shake: f32,

    /// Ship explosion sequence length (real seconds)
    pub explosion_secs: f32,
    /// Time scale while the ship explosion plays
    pub slow_motion_scale: f32,
    /// Game time removed on death (floored at zero)
    pub death_penalty_secs: f32,

    /// Game time added by the fast-forward key
    pub fast_forward_secs: f32,

    /// Intro entrance length
    pub intro_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lives: 3,

            ship_x: 120.0,
            ship_radius: 18.0,
            ship_speed: 320.0,

            shot_interval: 0.12,
            heat_per_shot: 2.0,
            overheat_drop: 3.0,

            bullet_speed: 720.0,
            bullet_radius: 4.0,

            invincibility_secs: 3.0,
            blink_interval: 0.1,

            hit_freeze_secs: 0.05,
            hit_shake: 0.35,

            explosion_secs: 2.0,
            slow_motion_scale: 0.3,
            death_penalty_secs: 60.0,

            fast_forward_secs: 20.0,

            intro_secs: 1.6,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load balance overrides from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning in {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Overheat cooldown length
    pub fn overheat_cooldown(&self) -> f32 {
        self.shot_interval * 5.0
    }

    /// Period of the one-point heat decay
    pub fn heat_decay_period(&self) -> f32 {
        self.shot_interval * 2.0
    }
}
