//! Visual-only effects: particles and the starfield
//!
//! Nothing in here feeds back into gameplay. The session only asks whether
//! particles are still alive so the death sequence can let an explosion
//! finish before respawning.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Particle flavor, used by the renderer for color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Rock fragments
    Debris,
    /// Bright sparks from a blast or the ship
    Spark,
    /// Engine exhaust
    Exhaust,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    /// Seconds left
    pub life: f32,
    /// Initial life, for fading
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    /// 1 at birth, 0 at death
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// Velocity damping per second
const PARTICLE_DRAG: f32 = 1.5;

/// Capped pool of particles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    max: usize,
}

impl ParticleSystem {
    pub fn new(max: usize) -> Self {
        Self {
            particles: VecDeque::with_capacity(max.min(256)),
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn push(&mut self, particle: Particle) {
        if self.max == 0 {
            return;
        }
        if self.particles.len() >= self.max {
            // Oldest goes first
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
    }

    /// Radial burst of `count` particles
    pub fn burst<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        center: Vec2,
        count: usize,
        speed: (f32, f32),
        kind: ParticleKind,
    ) {
        for _ in 0..count {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let v = rng.random_range(speed.0..=speed.1);
            let life = rng.random_range(0.4..=0.9);
            self.push(Particle {
                pos: center,
                vel: Vec2::from_angle(angle) * v,
                kind,
                life,
                max_life: life,
                size: rng.random_range(1.5..=4.0),
            });
        }
    }

    /// Rock debris plus a few sparks, scaled by the rock radius
    pub fn asteroid_explosion<R: Rng + ?Sized>(&mut self, rng: &mut R, center: Vec2, radius: f32) {
        let count = (radius * 0.6) as usize + 6;
        self.burst(rng, center, count, (40.0, 160.0), ParticleKind::Debris);
        self.burst(rng, center, count / 3, (120.0, 260.0), ParticleKind::Spark);
    }

    /// Area-damage flash
    pub fn blast<R: Rng + ?Sized>(&mut self, rng: &mut R, center: Vec2, radius: f32) {
        let count = (radius * 0.4) as usize + 10;
        self.burst(rng, center, count, (radius * 1.5, radius * 3.0), ParticleKind::Spark);
    }

    /// Ship destruction
    pub fn ship_explosion<R: Rng + ?Sized>(&mut self, rng: &mut R, center: Vec2) {
        self.burst(rng, center, 48, (60.0, 240.0), ParticleKind::Spark);
        self.burst(rng, center, 24, (20.0, 90.0), ParticleKind::Debris);
    }

    /// One exhaust puff drifting left
    pub fn exhaust<R: Rng + ?Sized>(&mut self, rng: &mut R, at: Vec2) {
        let life = rng.random_range(0.15..=0.3);
        self.push(Particle {
            pos: at + Vec2::new(0.0, rng.random_range(-3.0..=3.0)),
            vel: Vec2::new(-rng.random_range(120.0..=200.0), rng.random_range(-15.0..=15.0)),
            kind: ParticleKind::Exhaust,
            life,
            max_life: life,
            size: rng.random_range(2.0..=3.5),
        });
    }

    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let damping = (1.0 - PARTICLE_DRAG * dt).max(0.0);
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.vel *= damping;
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    /// Parallax speed (pixels/s leftward)
    pub speed: f32,
    pub brightness: f32,
}

/// Scrolling parallax background
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Starfield {
    pub stars: Vec<Star>,
}

impl Starfield {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        let stars = (0..count)
            .map(|_| {
                let depth: f32 = rng.random_range(0.2..=1.0);
                Star {
                    pos: Vec2::new(
                        rng.random_range(0.0..WORLD_WIDTH),
                        rng.random_range(0.0..WORLD_HEIGHT),
                    ),
                    speed: 20.0 + depth * 140.0,
                    brightness: depth,
                }
            })
            .collect();
        Self { stars }
    }

    /// Scroll left, wrapping at the edge
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for star in &mut self.stars {
            star.pos.x -= star.speed * dt;
            if star.pos.x < 0.0 {
                star.pos.x = star.pos.x.rem_euclid(WORLD_WIDTH);
                if star.pos.x >= WORLD_WIDTH {
                    star.pos.x = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_particles_expire() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut particles = ParticleSystem::new(512);
        particles.asteroid_explosion(&mut rng, Vec2::new(100.0, 100.0), 26.0);
        assert!(!particles.is_empty());
        for _ in 0..120 {
            particles.update(1.0 / 60.0);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut particles = ParticleSystem::new(10);
        particles.burst(&mut rng, Vec2::ZERO, 25, (10.0, 20.0), ParticleKind::Spark);
        assert_eq!(particles.len(), 10);

        // A fresh puff evicts the front of the queue, not the newest spark
        let newest = particles.iter().last().map(|p| p.life);
        particles.exhaust(&mut rng, Vec2::ZERO);
        assert_eq!(particles.len(), 10);
        let kinds: Vec<ParticleKind> = particles.iter().map(|p| p.kind).collect();
        assert_eq!(kinds[9], ParticleKind::Exhaust);
        assert_eq!(particles.iter().nth(8).map(|p| p.life), newest);

        let mut none = ParticleSystem::new(0);
        none.ship_explosion(&mut rng, Vec2::ZERO);
        assert!(none.is_empty());
    }

    #[test]
    fn test_zero_dt_freezes_particles() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut particles = ParticleSystem::new(64);
        particles.exhaust(&mut rng, Vec2::new(50.0, 50.0));
        let before: Vec<_> = particles.iter().map(|p| (p.pos, p.life)).collect();
        particles.update(0.0);
        particles.update(-1.0);
        let after: Vec<_> = particles.iter().map(|p| (p.pos, p.life)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_starfield_wraps() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut field = Starfield::new(&mut rng, 50);
        for _ in 0..1000 {
            field.update(1.0 / 30.0);
        }
        assert_eq!(field.stars.len(), 50);
        assert!(field.stars.iter().all(|s| s.pos.x >= 0.0 && s.pos.x < WORLD_WIDTH));
    }
}
