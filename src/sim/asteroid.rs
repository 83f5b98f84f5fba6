//! Asteroids: size classes, splitting and the exploding variant

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::entity::{Collidable, Entity, EntityKind};
use crate::consts::{PLAY_BOTTOM, PLAY_TOP, WORLD_HEIGHT, WORLD_WIDTH};
use crate::rotate_deg;

/// Asteroid size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn radius(self) -> f32 {
        match self {
            SizeClass::Small => 14.0,
            SizeClass::Medium => 26.0,
            SizeClass::Large => 42.0,
        }
    }

    /// Points for destroying one
    pub fn points(self) -> u64 {
        match self {
            SizeClass::Small => 50,
            SizeClass::Medium => 20,
            SizeClass::Large => 10,
        }
    }

    /// Class of the two children, or `None` for Small
    pub fn split_target(self) -> Option<SizeClass> {
        match self {
            SizeClass::Small => None,
            SizeClass::Medium => Some(SizeClass::Small),
            SizeClass::Large => Some(SizeClass::Medium),
        }
    }

    /// Child deflection range in degrees
    pub fn split_angle_range(self) -> (f32, f32) {
        match self {
            SizeClass::Small => (0.0, 0.0),
            SizeClass::Medium => (10.0, 30.0),
            SizeClass::Large => (5.0, 10.0),
        }
    }

    /// Leftward speed range at spawn (pixels/s)
    pub fn speed_range(self) -> (f32, f32) {
        match self {
            SizeClass::Small => (150.0, 210.0),
            SizeClass::Medium => (110.0, 160.0),
            SizeClass::Large => (70.0, 110.0),
        }
    }

    /// Area-damage radius when the exploding variant goes off
    pub fn blast_radius(self) -> f32 {
        match self {
            SizeClass::Small => 60.0,
            SizeClass::Medium => 95.0,
            SizeClass::Large => 140.0,
        }
    }

    /// Auto-detonation delay range (seconds)
    pub fn fuse_range(self) -> (f32, f32) {
        match self {
            SizeClass::Small => (1.7, 2.0),
            SizeClass::Medium => (1.3, 1.7),
            SizeClass::Large => (1.0, 1.3),
        }
    }

    fn vertex_count(self) -> usize {
        match self {
            SizeClass::Small => 7,
            SizeClass::Medium => 9,
            SizeClass::Large => 12,
        }
    }
}

/// Flash toggle period of an armed fuse
pub const FUSE_FLASH_INTERVAL: f32 = 0.1;

/// Children keep this share of the parent's speed
pub const SPLIT_SPEED_FACTOR: f32 = 0.8;

/// Armed detonation timer of the exploding variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fuse {
    /// Seconds until auto-detonation
    pub remaining: f32,
    flash_timer: f32,
    /// Render highlight state
    pub flash_on: bool,
}

impl Fuse {
    pub fn new(delay: f32) -> Self {
        Self {
            remaining: delay,
            flash_timer: 0.0,
            flash_on: true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    fn update(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
        self.flash_timer += dt;
        while self.flash_timer >= FUSE_FLASH_INTERVAL {
            self.flash_timer -= FUSE_FLASH_INTERVAL;
            self.flash_on = !self.flash_on;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: SizeClass,
    /// Present on the exploding variant
    pub fuse: Option<Fuse>,
    /// Render-only outline, relative to `pos`, unrotated
    pub silhouette: Vec<Vec2>,
    pub rotation: f32,
    pub spin: f32,
    pub active: bool,
    pub collision_enabled: bool,
}

impl Asteroid {
    /// Build an asteroid with a fresh silhouette
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        size: SizeClass,
        pos: Vec2,
        vel: Vec2,
        exploding: bool,
    ) -> Self {
        let fuse = exploding.then(|| {
            let (lo, hi) = size.fuse_range();
            Fuse::new(rng.random_range(lo..=hi))
        });
        Self {
            pos,
            vel,
            size,
            fuse,
            silhouette: silhouette(rng, size),
            rotation: rng.random_range(0.0..std::f32::consts::TAU),
            spin: rng.random_range(-1.5..=1.5),
            active: true,
            collision_enabled: true,
        }
    }

    /// Spawn just past the right edge at a random height, heading left with
    /// an optional deflection in degrees (positive = downward).
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        size: SizeClass,
        exploding: bool,
        deflection_deg: f32,
    ) -> Self {
        let r = size.radius();
        let y = rng.random_range((PLAY_TOP + r)..=(PLAY_BOTTOM - r).max(PLAY_TOP + r));
        let (lo, hi) = size.speed_range();
        let speed = rng.random_range(lo..=hi);
        // Screen y grows downward, so a positive math rotation of a leftward
        // vector points it down-screen; flip to keep "positive = downward".
        let vel = rotate_deg(Vec2::new(-speed, 0.0), -deflection_deg);
        Self::new(rng, size, Vec2::new(WORLD_WIDTH + r, y), vel, exploding)
    }

    pub fn radius(&self) -> f32 {
        self.size.radius()
    }

    pub fn is_exploding(&self) -> bool {
        self.fuse.is_some()
    }

    /// Armed fuse ran out this tick
    pub fn should_detonate(&self) -> bool {
        self.active && self.fuse.is_some_and(|f| f.is_expired())
    }

    /// Two children one class down, diverging from the parent heading.
    ///
    /// Returns `None` for Small and for the exploding variant.
    pub fn split<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<[Asteroid; 2]> {
        if self.is_exploding() {
            return None;
        }
        let child = self.size.split_target()?;
        let (lo, hi) = self.size.split_angle_range();
        let base = self.vel * SPLIT_SPEED_FACTOR;
        let up = rotate_deg(base, rng.random_range(lo..=hi));
        let down = rotate_deg(base, -rng.random_range(lo..=hi));
        Some([
            Asteroid::new(rng, child, self.pos, up, false),
            Asteroid::new(rng, child, self.pos, down, false),
        ])
    }

    /// Fully left the world (or drifted far above/below it)
    fn is_offscreen(&self) -> bool {
        let margin = self.radius() * 2.0;
        self.pos.x < -margin
            || self.pos.y < -margin
            || self.pos.y > WORLD_HEIGHT + margin
            || self.pos.x > WORLD_WIDTH + margin * 2.0
    }
}

/// Jagged polygon outline around the origin
fn silhouette<R: Rng + ?Sized>(rng: &mut R, size: SizeClass) -> Vec<Vec2> {
    let n = size.vertex_count();
    let r = size.radius();
    (0..n)
        .map(|i| {
            let theta = i as f32 / n as f32 * std::f32::consts::TAU;
            let jitter = rng.random_range(0.75..=1.0);
            Vec2::new(theta.cos(), theta.sin()) * r * jitter
        })
        .collect()
}

impl Entity for Asteroid {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.pos += self.vel * dt;
        self.rotation = (self.rotation + self.spin * dt) % std::f32::consts::TAU;
        if let Some(fuse) = &mut self.fuse {
            fuse.update(dt);
        }
        if self.is_offscreen() {
            self.active = false;
        }
    }
}

impl Collidable for Asteroid {
    fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    fn bounds(&self) -> Bounds {
        Bounds::circle(self.position(), self.radius())
    }

    fn targets(&self, other: EntityKind) -> bool {
        matches!(other, EntityKind::Ship | EntityKind::Bullet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signed_angle_deg;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn check_children(parent_size: SizeClass, child_size: SizeClass, band: (f32, f32)) {
        let mut rng = Pcg32::seed_from_u64(1234);
        for _ in 0..200 {
            let vel = Vec2::new(-rng.random_range(50.0..200.0), rng.random_range(-40.0..40.0));
            let parent = Asteroid::new(&mut rng, parent_size, Vec2::new(300.0, 250.0), vel, false);
            let children = parent.split(&mut rng).expect("splits");

            let mut signs = Vec::new();
            for child in &children {
                assert_eq!(child.size, child_size);
                assert_eq!(child.pos, parent.pos);
                assert!(!child.is_exploding());
                assert!((child.vel.length() - vel.length() * SPLIT_SPEED_FACTOR).abs() < 0.01);
                let angle = signed_angle_deg(vel, child.vel);
                assert!(
                    angle.abs() >= band.0 - 0.01 && angle.abs() <= band.1 + 0.01,
                    "deflection {angle} outside {band:?}"
                );
                signs.push(angle.signum());
            }
            assert_ne!(signs[0], signs[1], "children must diverge");
        }
    }

    #[test]
    fn test_large_splits_into_two_medium() {
        check_children(SizeClass::Large, SizeClass::Medium, (5.0, 10.0));
    }

    #[test]
    fn test_medium_splits_into_two_small() {
        check_children(SizeClass::Medium, SizeClass::Small, (10.0, 30.0));
    }

    #[test]
    fn test_small_and_exploding_never_split() {
        let mut rng = Pcg32::seed_from_u64(9);
        let small = Asteroid::new(&mut rng, SizeClass::Small, Vec2::ZERO, Vec2::X, false);
        assert!(small.split(&mut rng).is_none());
        let bomb = Asteroid::new(&mut rng, SizeClass::Large, Vec2::ZERO, Vec2::X, true);
        assert!(bomb.split(&mut rng).is_none());
    }

    #[test]
    fn test_radius_strictly_by_class() {
        assert!(SizeClass::Small.radius() < SizeClass::Medium.radius());
        assert!(SizeClass::Medium.radius() < SizeClass::Large.radius());
        assert!(SizeClass::Small.blast_radius() < SizeClass::Medium.blast_radius());
        assert!(SizeClass::Medium.blast_radius() < SizeClass::Large.blast_radius());
    }

    #[test]
    fn test_fuse_delay_in_class_range_and_detonates() {
        let mut rng = Pcg32::seed_from_u64(77);
        for size in [SizeClass::Small, SizeClass::Medium, SizeClass::Large] {
            let mut a = Asteroid::new(&mut rng, size, Vec2::new(400.0, 250.0), Vec2::ZERO, true);
            let (lo, hi) = size.fuse_range();
            let delay = a.fuse.map(|f| f.remaining).unwrap_or_default();
            assert!(delay >= lo && delay <= hi);

            a.update(lo - 0.05);
            assert!(!a.should_detonate());
            a.update(hi);
            assert!(a.should_detonate());
        }
    }

    #[test]
    fn test_fuse_flashes_on_fixed_interval() {
        let mut fuse = Fuse::new(2.0);
        let start = fuse.flash_on;
        fuse.update(FUSE_FLASH_INTERVAL * 0.5);
        assert_eq!(fuse.flash_on, start);
        fuse.update(FUSE_FLASH_INTERVAL * 0.6);
        assert_ne!(fuse.flash_on, start);
    }

    #[test]
    fn test_spawn_enters_from_right_and_leaves_left() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut a = Asteroid::spawn(&mut rng, SizeClass::Medium, false, 0.0);
        assert!(a.pos.x > WORLD_WIDTH);
        assert!(a.vel.x < 0.0);
        assert!(a.vel.y.abs() < 1e-3);
        for _ in 0..2000 {
            a.update(1.0 / 60.0);
        }
        assert!(!a.is_active());
    }

    #[test]
    fn test_positive_deflection_heads_down_screen() {
        let mut rng = Pcg32::seed_from_u64(6);
        let a = Asteroid::spawn(&mut rng, SizeClass::Large, false, 15.0);
        assert!(a.vel.y > 0.0);
        let b = Asteroid::spawn(&mut rng, SizeClass::Large, false, -15.0);
        assert!(b.vel.y < 0.0);
    }

    #[test]
    fn test_silhouette_within_radius() {
        let mut rng = Pcg32::seed_from_u64(3);
        let a = Asteroid::new(&mut rng, SizeClass::Large, Vec2::ZERO, Vec2::ZERO, false);
        assert_eq!(a.silhouette.len(), 12);
        assert!(a.silhouette.iter().all(|v| v.length() <= a.radius() + 1e-3));
    }
}
