//! Simulation module
//!
//! All gameplay logic lives here, free of rendering, audio and platform code:
//! - Fixed timestep only
//! - Randomness comes from an injected RNG
//! - Entities live in index-stable arenas, compacted once per tick

pub mod arena;
pub mod asteroid;
pub mod bullet;
pub mod clock;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod intro;
pub mod session;
pub mod ship;
pub mod spawner;
pub mod state;
pub mod tick;

pub use arena::{Arena, Handle};
pub use asteroid::{Asteroid, SizeClass};
pub use bullet::Bullet;
pub use clock::{Shake, TimeScale};
pub use collision::{Bounds, Collider, CollisionContext, check_bounds, resolve_collisions};
pub use effects::{ParticleSystem, Starfield};
pub use entity::{Collidable, Entity, EntityId, EntityKind};
pub use intro::IntroSequence;
pub use session::{
    DebugOverlay, DestroyCause, Session, SessionEvent, SessionInput, SessionStats, SessionStatus,
};
pub use ship::{HeatState, Ship, WeaponHeat};
pub use state::{Game, Screen, ScreenKind};
pub use tick::FrameStepper;
