//! Collision detection and dispatch
//!
//! Everything is approximated as circles. The engine only reads a snapshot of
//! colliders and reports pairs to a [`CollisionContext`]; all mutation is up
//! to the context.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityKind};

/// Collision shape of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bounds {
    Circle { center: Vec2, radius: f32 },
    /// Reserved. Never collides.
    Rect { min: Vec2, max: Vec2 },
    /// No shape at all
    Empty,
}

impl Bounds {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Bounds::Circle { center, radius }
    }

    /// Center and radius if this is a well-formed circle
    fn as_circle(&self) -> Option<(Vec2, f32)> {
        match *self {
            Bounds::Circle { center, radius }
                if center.is_finite() && radius.is_finite() && radius >= 0.0 =>
            {
                Some((center, radius))
            }
            _ => None,
        }
    }
}

/// Overlap test.
///
/// Circles collide iff `distance < ra + rb`; touching is not a collision.
/// Every other combination, including malformed circles, is a miss.
pub fn check_bounds(a: &Bounds, b: &Bounds) -> bool {
    match (a.as_circle(), b.as_circle()) {
        (Some((ca, ra)), Some((cb, rb))) => ca.distance(cb) < ra + rb,
        _ => false,
    }
}

/// One entry of the per-tick collision snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: EntityId,
    pub bounds: Bounds,
    /// Per-kind eligibility, indexed by [`EntityKind`]
    pub accepts: [bool; 3],
}

impl Collider {
    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.accepts[kind as usize]
    }
}

/// Receiver of collision notifications for one tick
pub trait CollisionContext {
    /// Whether `id` may still take part in a collision this tick
    fn is_live(&self, id: EntityId) -> bool;

    /// `this` was hit by `other`. Called once per side for every pair.
    fn on_collision(&mut self, this: EntityId, other: EntityId);
}

/// Check every pair of the snapshot and notify `ctx`.
///
/// Brute force O(n²) with no spatial index: entity counts stay small because
/// the spawn ramp bounds arrivals and everything is culled off-screen. A pair
/// only collides if both sides accept each other and both are still live
/// when the pair is reached, so an entity consumed earlier in the pass is
/// skipped afterwards. Returns the number of dispatched pairs.
pub fn resolve_collisions(colliders: &[Collider], ctx: &mut impl CollisionContext) -> usize {
    let mut hits = 0;
    for (i, a) in colliders.iter().enumerate() {
        for b in &colliders[i + 1..] {
            if !(a.accepts(b.id.kind()) && b.accepts(a.id.kind())) {
                continue;
            }
            if !check_bounds(&a.bounds, &b.bounds) {
                continue;
            }
            if !(ctx.is_live(a.id) && ctx.is_live(b.id)) {
                continue;
            }
            log::trace!("collision {:?} <-> {:?}", a.id, b.id);
            ctx.on_collision(a.id, b.id);
            ctx.on_collision(b.id, a.id);
            hits += 1;
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Handle;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn handle(index: u32) -> Handle {
        Handle {
            index,
            generation: 0,
        }
    }

    fn collider(id: EntityId, center: Vec2, radius: f32) -> Collider {
        let accepts = match id.kind() {
            EntityKind::Ship => [false, true, false],
            EntityKind::Asteroid => [true, false, true],
            EntityKind::Bullet => [false, true, false],
        };
        Collider {
            id,
            bounds: Bounds::circle(center, radius),
            accepts,
        }
    }

    /// Records calls and consumes bullets on first hit
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(EntityId, EntityId)>,
        dead: HashSet<EntityId>,
    }

    impl CollisionContext for Recorder {
        fn is_live(&self, id: EntityId) -> bool {
            !self.dead.contains(&id)
        }

        fn on_collision(&mut self, this: EntityId, other: EntityId) {
            self.calls.push((this, other));
            if matches!(this, EntityId::Bullet(_)) {
                self.dead.insert(this);
            }
        }
    }

    #[test]
    fn test_tangent_circles_do_not_collide() {
        let a = Bounds::circle(Vec2::ZERO, 10.0);
        let b = Bounds::circle(Vec2::new(20.0, 0.0), 10.0);
        assert!(!check_bounds(&a, &b));
        let c = Bounds::circle(Vec2::new(19.99, 0.0), 10.0);
        assert!(check_bounds(&a, &c));
    }

    #[test]
    fn test_malformed_and_reserved_bounds_miss() {
        let ok = Bounds::circle(Vec2::ZERO, 10.0);
        let nan = Bounds::circle(Vec2::new(f32::NAN, 0.0), 10.0);
        let negative = Bounds::circle(Vec2::ZERO, -1.0);
        let rect = Bounds::Rect {
            min: Vec2::splat(-5.0),
            max: Vec2::splat(5.0),
        };
        assert!(!check_bounds(&ok, &nan));
        assert!(!check_bounds(&ok, &negative));
        assert!(!check_bounds(&ok, &rect));
        assert!(!check_bounds(&rect, &rect));
        assert!(!check_bounds(&ok, &Bounds::Empty));
    }

    #[test]
    fn test_dispatch_is_symmetric_source_first() {
        let asteroid = EntityId::Asteroid(handle(0));
        let bullet = EntityId::Bullet(handle(0));
        let snapshot = [
            collider(asteroid, Vec2::new(200.0, 200.0), 15.0),
            collider(bullet, Vec2::new(200.0, 200.0), 4.0),
        ];
        let mut ctx = Recorder::default();
        assert_eq!(resolve_collisions(&snapshot, &mut ctx), 1);
        assert_eq!(ctx.calls, vec![(asteroid, bullet), (bullet, asteroid)]);
    }

    #[test]
    fn test_one_sided_acceptance_is_not_enough() {
        let a = EntityId::Asteroid(handle(0));
        let b = EntityId::Asteroid(handle(1));
        // Asteroids never accept each other
        let snapshot = [
            collider(a, Vec2::ZERO, 20.0),
            collider(b, Vec2::new(5.0, 0.0), 20.0),
        ];
        let mut ctx = Recorder::default();
        assert_eq!(resolve_collisions(&snapshot, &mut ctx), 0);

        // Bullet accepts asteroid, but this asteroid has been made to refuse bullets
        let bullet = EntityId::Bullet(handle(0));
        let mut refusing = collider(a, Vec2::ZERO, 20.0);
        refusing.accepts = [true, false, false];
        let snapshot = [refusing, collider(bullet, Vec2::ZERO, 4.0)];
        assert_eq!(resolve_collisions(&snapshot, &mut ctx), 0);
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_consumed_bullet_skips_later_pairs() {
        let bullet = EntityId::Bullet(handle(0));
        let first = EntityId::Asteroid(handle(0));
        let second = EntityId::Asteroid(handle(1));
        let snapshot = [
            collider(bullet, Vec2::ZERO, 4.0),
            collider(first, Vec2::new(5.0, 0.0), 15.0),
            collider(second, Vec2::new(-5.0, 0.0), 15.0),
        ];
        let mut ctx = Recorder::default();
        assert_eq!(resolve_collisions(&snapshot, &mut ctx), 1);
        assert!(ctx.calls.iter().all(|&(_, other)| other != second));
    }

    proptest! {
        #[test]
        fn prop_circle_overlap_matches_distance(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0, ar in 0.0f32..100.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0, br in 0.0f32..100.0,
        ) {
            let a = Bounds::circle(Vec2::new(ax, ay), ar);
            let b = Bounds::circle(Vec2::new(bx, by), br);
            let expected = Vec2::new(ax, ay).distance(Vec2::new(bx, by)) < ar + br;
            prop_assert_eq!(check_bounds(&a, &b), expected);
            prop_assert_eq!(check_bounds(&a, &b), check_bounds(&b, &a));
        }
    }
}
