//! Player bullets

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::entity::{Collidable, Entity, EntityKind};
use crate::consts::WORLD_WIDTH;

/// A straight rightward shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub speed: f32,
    pub radius: f32,
    pub active: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, speed: f32, radius: f32) -> Self {
        Self {
            pos,
            speed,
            radius,
            active: true,
        }
    }
}

impl Entity for Bullet {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32) {
        self.pos.x += self.speed * dt.max(0.0);
        if self.pos.x - self.radius > WORLD_WIDTH {
            self.active = false;
        }
    }
}

impl Collidable for Bullet {
    fn collision_enabled(&self) -> bool {
        true
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

    #[test]
    fn test_bullet_moves_right_and_expires() {
        let mut b = Bullet::new(Vec2::new(WORLD_WIDTH - 10.0, 100.0), 600.0, 4.0);
        b.update(0.01);
        assert!((b.pos.x - (WORLD_WIDTH - 4.0)).abs() < 1e-3);
        assert!(b.is_active());
        b.update(0.1);
        assert!(!b.is_active());
    }

    #[test]
    fn test_negative_dt_is_ignored() {
        let mut b = Bullet::new(Vec2::new(100.0, 100.0), 600.0, 4.0);
        b.update(-1.0);
        assert_eq!(b.pos.x, 100.0);
    }

    #[test]
    fn test_bullet_only_targets_asteroids() {
        let b = Bullet::new(Vec2::ZERO, 600.0, 4.0);
        assert!(b.can_collide_with(EntityKind::Asteroid));
        assert!(!b.can_collide_with(EntityKind::Ship));
        assert!(!b.can_collide_with(EntityKind::Bullet));

        let mut spent = b.clone();
        spent.active = false;
        assert!(!spent.can_collide_with(EntityKind::Asteroid));
    }
}
