//! Scripted ship entrance before play starts
//!
//! The ship flies in from beyond the left edge and overshoots its play
//! position slightly before settling (ease-out-back). Player input is ignored
//! throughout. Near the end it fires one salute shot, and the ship plus any
//! bullets still in flight are handed to the session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::bullet::Bullet;
use super::ship::Ship;
use crate::consts::WORLD_HEIGHT;
use crate::tuning::Tuning;

/// Overshoot amount of the back easing
const BACK_OVERSHOOT: f32 = 1.70158;

/// Progress at which the salute shot leaves the gun
const SALUTE_AT: f32 = 0.8;

/// Ease-out-back over t in [0, 1]: passes 1 and then settles on it
pub fn ease_out_back(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let c3 = BACK_OVERSHOOT + 1.0;
    let u = t - 1.0;
    1.0 + c3 * u * u * u + BACK_OVERSHOOT * u * u
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroSequence {
    pub ship: Ship,
    pub bullets: Arena<Bullet>,
    elapsed: f32,
    duration: f32,
    start_x: f32,
    end_x: f32,
    saluted: bool,
    bullet_speed: f32,
    bullet_radius: f32,
}

impl IntroSequence {
    pub fn new(tuning: &Tuning) -> Self {
        let start_x = -tuning.ship_radius * 2.0;
        let mut ship = Ship::new(tuning, Vec2::new(start_x, WORLD_HEIGHT / 2.0));
        ship.controllable = false;
        ship.collision_enabled = false;
        Self {
            ship,
            bullets: Arena::new(),
            elapsed: 0.0,
            duration: tuning.intro_secs.max(0.0),
            start_x,
            end_x: tuning.ship_x,
            saluted: false,
            bullet_speed: tuning.bullet_speed,
            bullet_radius: tuning.bullet_radius,
        }
    }

    /// 0 at the start, 1 once the entrance is over
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_done(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance the entrance. Returns true once it has finished.
    pub fn update(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        let t = self.progress();
        self.ship.pos.x = self.start_x + (self.end_x - self.start_x) * ease_out_back(t);

        if !self.saluted && t >= SALUTE_AT {
            self.saluted = true;
            self.bullets.insert(Bullet::new(
                self.ship.muzzle(),
                self.bullet_speed,
                self.bullet_radius,
            ));
        }
        self.bullets.update_all(dt);
        self.bullets.sweep();
        self.is_done()
    }

    /// Hand the ship (parked on its mark) and live bullets over
    pub fn finish(mut self) -> (Ship, Arena<Bullet>) {
        self.ship.pos.x = self.end_x;
        self.ship.reset_motion();
        (self.ship, self.bullets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_back_overshoots_and_settles() {
        assert!(ease_out_back(0.0).abs() < 1e-6);
        assert!((ease_out_back(1.0) - 1.0).abs() < 1e-6);
        let peak = (1..100)
            .map(|i| ease_out_back(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_intro_flies_in_and_hands_off() {
        let tuning = Tuning::default();
        let mut intro = IntroSequence::new(&tuning);
        assert!(intro.ship.pos.x < 0.0);
        assert!(!intro.ship.controllable);

        let mut overshot = false;
        let mut done = false;
        for _ in 0..1000 {
            done = intro.update(1.0 / 120.0);
            overshot |= intro.ship.pos.x > tuning.ship_x + 0.5;
            if done {
                break;
            }
        }
        assert!(done);
        assert!(overshot);
        assert_eq!(intro.bullets.active_count(), 1);

        let (ship, bullets) = intro.finish();
        assert_eq!(ship.pos.x, tuning.ship_x);
        assert_eq!(bullets.len(), 1);
    }

    #[test]
    fn test_zero_length_intro_finishes_at_once() {
        let tuning = Tuning {
            intro_secs: 0.0,
            ..Default::default()
        };
        let mut intro = IntroSequence::new(&tuning);
        assert!(intro.update(0.0));
    }
}
