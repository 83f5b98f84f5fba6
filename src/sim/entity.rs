//! Entity capabilities shared by the ship, asteroids and bullets

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Handle;
use super::collision::{Bounds, Collider};

/// Closed set of entity kinds taking part in collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    Asteroid,
    Bullet,
}

/// Identity of a collidable inside one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Ship,
    Asteroid(Handle),
    Bullet(Handle),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Ship => EntityKind::Ship,
            EntityId::Asteroid(_) => EntityKind::Asteroid,
            EntityId::Bullet(_) => EntityKind::Bullet,
        }
    }
}

/// Anything that lives in the world and advances with the clock
pub trait Entity {
    fn position(&self) -> Vec2;

    /// False once the entity should be removed; never flips back
    fn is_active(&self) -> bool;

    fn update(&mut self, dt: f32);
}

/// An entity that takes part in pairwise overlap checks
pub trait Collidable: Entity {
    /// Independent of `is_active`: an entity may be visible but not collide
    fn collision_enabled(&self) -> bool;

    fn bounds(&self) -> Bounds;

    /// Kinds this entity accepts as collision partners
    fn targets(&self, other: EntityKind) -> bool;

    fn can_collide_with(&self, other: EntityKind) -> bool {
        self.is_active() && self.collision_enabled() && self.targets(other)
    }

    /// Snapshot for the collision pass, or `None` if filtered out
    fn collider(&self, id: EntityId) -> Option<Collider> {
        if !self.is_active() || !self.collision_enabled() {
            return None;
        }
        Some(Collider {
            id,
            bounds: self.bounds(),
            accepts: [
                EntityKind::Ship,
                EntityKind::Asteroid,
                EntityKind::Bullet,
            ]
            .map(|k| self.can_collide_with(k)),
        })
    }
}
