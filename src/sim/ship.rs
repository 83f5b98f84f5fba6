//! The player ship and its weapon heat

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::entity::{Collidable, Entity, EntityKind};
use crate::consts::{PLAY_BOTTOM, PLAY_TOP, WORLD_HEIGHT};
use crate::tuning::Tuning;

/// Heat ceiling; reaching it overheats the gun
pub const HEAT_MAX: f32 = 10.0;

/// Weapon heat sub-state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeatState {
    /// Can fire; heat decays one point per decay period
    Cool { decay_timer: f32 },
    /// Locked out until the cooldown runs down
    Overheated { cooldown: f32 },
}

/// Weapon heat in [0, HEAT_MAX] with overheat lockout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponHeat {
    heat: f32,
    state: HeatState,
    /// Minimum time between shots
    shot_interval: f32,
    /// Lockout length once overheated
    cooldown_secs: f32,
    /// One point of heat is shed per period while cool
    decay_period: f32,
    per_shot: f32,
    overheat_drop: f32,
    /// Timestamp of the last shot (monotonic seconds)
    last_shot: Option<f64>,
}

impl WeaponHeat {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            heat: 0.0,
            state: HeatState::Cool { decay_timer: 0.0 },
            shot_interval: tuning.shot_interval,
            cooldown_secs: tuning.overheat_cooldown(),
            decay_period: tuning.heat_decay_period(),
            per_shot: tuning.heat_per_shot,
            overheat_drop: tuning.overheat_drop,
            last_shot: None,
        }
    }

    pub fn heat(&self) -> f32 {
        self.heat
    }

    /// 0-1 for HUD bars
    pub fn fraction(&self) -> f32 {
        self.heat / HEAT_MAX
    }

    pub fn is_overheated(&self) -> bool {
        matches!(self.state, HeatState::Overheated { .. })
    }

    /// Force a heat level (debug and tests); clamped to the valid range
    pub fn set_heat(&mut self, heat: f32) {
        self.heat = heat.clamp(0.0, HEAT_MAX);
        self.state = if self.heat >= HEAT_MAX {
            HeatState::Overheated {
                cooldown: self.cooldown_secs,
            }
        } else {
            HeatState::Cool { decay_timer: 0.0 }
        };
    }

    pub fn can_fire(&self, now: f64) -> bool {
        if self.is_overheated() {
            return false;
        }
        match self.last_shot {
            Some(last) => now - last >= self.shot_interval as f64,
            None => true,
        }
    }

    /// Try to fire at `now`. Returns true if a shot leaves the gun.
    pub fn try_fire(&mut self, now: f64) -> bool {
        if !self.can_fire(now) {
            return false;
        }
        self.last_shot = Some(now);
        self.heat = (self.heat + self.per_shot).min(HEAT_MAX);
        if self.heat >= HEAT_MAX {
            self.state = HeatState::Overheated {
                cooldown: self.cooldown_secs,
            };
        } else {
            // A shot restarts the decay period
            self.state = HeatState::Cool { decay_timer: 0.0 };
        }
        true
    }

    /// Advance cooldown or decay. Exactly one of the two runs per call.
    /// Returns true on the update the overheat lockout ends.
    pub fn update(&mut self, dt: f32) -> bool {
        let dt = dt.max(0.0);
        match &mut self.state {
            HeatState::Overheated { cooldown } => {
                *cooldown -= dt;
                if *cooldown <= 0.0 {
                    self.heat = (self.heat - self.overheat_drop).max(0.0);
                    self.state = HeatState::Cool { decay_timer: 0.0 };
                    return true;
                }
            }
            HeatState::Cool { decay_timer } => {
                if self.heat <= 0.0 {
                    *decay_timer = 0.0;
                    return false;
                }
                *decay_timer += dt;
                let period = self.decay_period;
                while *decay_timer >= period && self.heat > 0.0 {
                    *decay_timer -= period;
                    self.heat = (self.heat - 1.0).max(0.0);
                }
            }
        }
        false
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    /// Vertical velocity (pixels/s)
    pub vel_y: f32,
    pub radius: f32,
    pub speed: f32,
    pub visible: bool,
    pub controllable: bool,
    pub collision_enabled: bool,
    pub active: bool,
    pub weapon: WeaponHeat,
    /// Steering input for the next update (-1 up, +1 down)
    #[serde(skip)]
    steer: f32,
}

impl Ship {
    pub fn new(tuning: &Tuning, pos: Vec2) -> Self {
        Self {
            pos,
            vel_y: 0.0,
            radius: tuning.ship_radius,
            speed: tuning.ship_speed,
            visible: true,
            controllable: true,
            collision_enabled: true,
            active: true,
            weapon: WeaponHeat::new(tuning),
            steer: 0.0,
        }
    }

    /// Ship parked at the play position, vertically centered
    pub fn at_play_position(tuning: &Tuning) -> Self {
        Self::new(tuning, Vec2::new(tuning.ship_x, WORLD_HEIGHT / 2.0))
    }

    /// Set vertical steering; ignored while not controllable
    pub fn steer(&mut self, up: bool, down: bool) {
        self.steer = if !self.controllable {
            0.0
        } else {
            match (up, down) {
                (true, false) => -1.0,
                (false, true) => 1.0,
                _ => 0.0,
            }
        };
    }

    /// Where bullets leave the ship
    pub fn muzzle(&self) -> Vec2 {
        self.pos + Vec2::new(self.radius, 0.0)
    }

    /// Where exhaust particles leave the ship
    pub fn exhaust(&self) -> Vec2 {
        self.pos - Vec2::new(self.radius * 0.9, 0.0)
    }

    /// Vertical range the ship center may occupy
    pub fn y_limits(&self) -> (f32, f32) {
        (PLAY_TOP + self.radius, PLAY_BOTTOM - self.radius)
    }

    /// Clear transient flight state (respawn)
    pub fn reset_motion(&mut self) {
        self.vel_y = 0.0;
        self.steer = 0.0;
    }
}

impl Entity for Ship {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.vel_y = self.steer * self.speed;
        self.pos.y += self.vel_y * dt;

        let (min_y, max_y) = self.y_limits();
        if self.pos.y <= min_y {
            self.pos.y = min_y;
            self.vel_y = self.vel_y.max(0.0);
        } else if self.pos.y >= max_y {
            self.pos.y = max_y;
            self.vel_y = self.vel_y.min(0.0);
        }
    }
}

impl Collidable for Ship {
    fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    fn bounds(&self) -> Bounds {
        Bounds::circle(self.position(), self.radius)
    }

    fn targets(&self, other: EntityKind) -> bool {
        other == EntityKind::Asteroid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning {
            shot_interval: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_shot_gate_respects_interval() {
        let mut heat = WeaponHeat::new(&tuning());
        assert!(heat.try_fire(0.0));
        assert!(!heat.try_fire(0.05));
        assert!(heat.try_fire(0.2));
        assert_eq!(heat.heat(), 4.0);
    }

    #[test]
    fn test_overheat_drops_three_at_once() {
        let mut heat = WeaponHeat::new(&tuning());
        heat.set_heat(8.0);
        assert!(heat.try_fire(1.0));
        assert_eq!(heat.heat(), 10.0);
        assert!(heat.is_overheated());
        assert!(!heat.try_fire(2.0));

        // 5 x 0.1s cooldown in small steps: no gradual decay on the way
        let dt = 0.01;
        let mut ended = false;
        for _ in 0..49 {
            ended |= heat.update(dt);
            assert_eq!(heat.heat(), 10.0);
        }
        for _ in 0..3 {
            ended |= heat.update(dt);
        }
        assert!(ended);
        assert_eq!(heat.heat(), 7.0);
        assert!(!heat.is_overheated());
        assert!(heat.try_fire(3.0));
    }

    #[test]
    fn test_decay_one_point_per_two_intervals() {
        let mut heat = WeaponHeat::new(&tuning());
        heat.set_heat(5.0);
        heat.update(0.19);
        assert_eq!(heat.heat(), 5.0);
        heat.update(0.02);
        assert_eq!(heat.heat(), 4.0);
        heat.update(0.6);
        assert_eq!(heat.heat(), 1.0);
        heat.update(10.0);
        assert_eq!(heat.heat(), 0.0);
    }

    #[test]
    fn test_heat_saturates() {
        let mut heat = WeaponHeat::new(&tuning());
        heat.set_heat(9.0);
        heat.try_fire(0.0);
        assert_eq!(heat.heat(), HEAT_MAX);
        heat.set_heat(-4.0);
        assert_eq!(heat.heat(), 0.0);
    }

    #[test]
    fn test_ship_clamped_to_play_area() {
        let mut ship = Ship::at_play_position(&tuning());
        ship.steer(true, false);
        for _ in 0..600 {
            ship.update(1.0 / 60.0);
        }
        let (min_y, max_y) = ship.y_limits();
        assert_eq!(ship.pos.y, min_y);
        assert_eq!(ship.vel_y, 0.0);

        ship.steer(false, true);
        for _ in 0..600 {
            ship.update(1.0 / 60.0);
        }
        assert_eq!(ship.pos.y, max_y);
    }

    #[test]
    fn test_uncontrollable_ship_ignores_steering() {
        let mut ship = Ship::at_play_position(&tuning());
        let y = ship.pos.y;
        ship.controllable = false;
        ship.steer(true, false);
        ship.update(0.5);
        assert_eq!(ship.pos.y, y);
    }

    #[test]
    fn test_ship_only_targets_asteroids() {
        let ship = Ship::at_play_position(&tuning());
        assert!(ship.can_collide_with(EntityKind::Asteroid));
        assert!(!ship.can_collide_with(EntityKind::Bullet));
        assert!(!ship.can_collide_with(EntityKind::Ship));
    }
}
