//! The Playing session
//!
//! Owns everything that lives only while a run is in progress: score, lives,
//! the ship, both entity arenas, the spawner, particles, camera shake and the
//! time scale. One call to [`Session::tick`] advances it by one real step in
//! a fixed order:
//!
//! 1. shake decay and freeze countdown (a finished freeze may hand out a cue)
//! 2. while frozen nothing else moves
//! 3. during the ship explosion only the environment advances
//! 4. otherwise game time, invincibility, ship, gun, bullets, asteroids,
//!    spawner and particles update
//! 5. collisions, queued blasts, then arena compaction

use std::fmt;

use glam::Vec2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Handle};
use super::asteroid::{Asteroid, SizeClass};
use super::bullet::Bullet;
use super::clock::{Shake, TimeScale};
use super::collision::{self, Bounds, CollisionContext, check_bounds};
use super::effects::ParticleSystem;
use super::entity::{Collidable, Entity, EntityId};
use super::ship::{Ship, WeaponHeat};
use super::spawner::{self, Spawner};
use crate::consts::WORLD_HEIGHT;
use crate::input::{Key, KeyState};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Seconds between exhaust puffs
const EXHAUST_PERIOD: f32 = 0.03;

/// Shortest blink period honored, keeps the toggle loop bounded
const MIN_BLINK_INTERVAL: f32 = 0.01;

/// Shake added when the ship blows up
const SHIP_DEATH_SHAKE: f32 = 1.0;

/// Slowest slow motion honored, so the explosion always plays out
const MIN_SLOW_MOTION_SCALE: f32 = 0.05;

/// Deferred work handed out when a hit-freeze ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCue {
    /// Switch the base time scale to slow motion for the ship explosion
    BeginSlowMotion,
}

/// What destroyed an asteroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    Bullet,
    /// Flew into the ship
    Rammed,
    /// Caught in another asteroid's blast
    Blast,
    /// Own fuse ran out
    Fuse,
}

impl DestroyCause {
    fn awards_points(self) -> bool {
        matches!(self, DestroyCause::Bullet | DestroyCause::Blast)
    }
}

/// Notifications for audio and HUD, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    ShotFired,
    Overheated,
    /// Overheat lockout ended
    Cooled,
    AsteroidDestroyed {
        size: SizeClass,
        exploding: bool,
        points: u64,
        cause: DestroyCause,
    },
    /// A parent of `size` broke into two children
    AsteroidSplit { size: SizeClass },
    Detonation { center: Vec2, radius: f32 },
    ShipDestroyed { lives_left: u32 },
    Respawned,
    GameOver { score: u64 },
    FastForward { game_time: f32 },
}

/// Result of one session tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// Out of lives and the last explosion has played out
    Over,
}

/// Held keys plus this tick's press edges
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionInput {
    pub held: KeyState,
    pub pressed: KeyState,
    /// Monotonic timestamp for the shot gate
    pub now: f64,
}

/// Running totals for the end-of-run summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub shots: u32,
    pub asteroids_destroyed: u32,
    pub detonations: u32,
    pub deaths: u32,
}

/// Pending area damage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Blast {
    center: Vec2,
    radius: f32,
}

/// Ship explosion in progress
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ExplosionSequence {
    /// Real seconds left before a respawn may happen
    remaining: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    tuning: Tuning,
    score: u64,
    lives: u32,
    /// Elapsed game time driving the difficulty ramps
    game_time: f32,
    /// Post-respawn invincibility left (scaled seconds)
    invincibility: f32,
    blink_timer: f32,
    exhaust_timer: f32,
    debug: bool,
    over: bool,

    pub ship: Ship,
    pub asteroids: Arena<Asteroid>,
    pub bullets: Arena<Bullet>,
    pub particles: ParticleSystem,
    pub shake: Shake,
    spawner: Spawner,
    time: TimeScale<SessionCue>,
    explosion: Option<ExplosionSequence>,
    pending_blasts: Vec<Blast>,

    #[serde(skip)]
    events: Vec<SessionEvent>,
    stats: SessionStats,
}

impl Session {
    /// Fresh session with the ship at its play position
    pub fn new(tuning: Tuning, settings: &Settings) -> Self {
        let ship = Ship::at_play_position(&tuning);
        Self::with_ship(tuning, settings, ship, Arena::new())
    }

    /// Session taking over a ship and bullets from the intro
    pub fn with_ship(
        tuning: Tuning,
        settings: &Settings,
        mut ship: Ship,
        bullets: Arena<Bullet>,
    ) -> Self {
        ship.visible = true;
        ship.controllable = true;
        ship.collision_enabled = true;
        log::info!("Session started with {} lives", tuning.lives);
        Self {
            score: 0,
            lives: tuning.lives,
            game_time: 0.0,
            invincibility: 0.0,
            blink_timer: 0.0,
            exhaust_timer: 0.0,
            debug: settings.debug_overlay,
            over: false,
            ship,
            asteroids: Arena::new(),
            bullets,
            particles: ParticleSystem::new(settings.max_particles()),
            shake: Shake::new(settings.effective_screen_shake()),
            spawner: Spawner::new(),
            time: TimeScale::new(),
            explosion: None,
            pending_blasts: Vec::new(),
            events: Vec::new(),
            stats: SessionStats::default(),
            tuning,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Jump the difficulty clock (debug)
    pub fn set_game_time(&mut self, t: f32) {
        self.game_time = t.max(0.0);
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    /// Ship explosion sequence running
    pub fn is_dying(&self) -> bool {
        self.explosion.is_some()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn is_frozen(&self) -> bool {
        self.time.is_frozen()
    }

    /// Current effective time scale (0 while frozen)
    pub fn time_scale(&self) -> f32 {
        self.time.scale()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Overlay snapshot while the debug overlay is on
    pub fn debug_overlay(&self) -> Option<DebugOverlay> {
        self.debug.then(|| DebugOverlay::capture(self))
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance by one real step
    pub fn tick(
        &mut self,
        real_dt: f32,
        input: &SessionInput,
        rng: &mut dyn RngCore,
    ) -> SessionStatus {
        if self.over {
            return SessionStatus::Over;
        }
        let real_dt = if real_dt.is_finite() { real_dt.max(0.0) } else { 0.0 };

        self.handle_toggles(input.pressed);

        self.shake.update(real_dt);
        if let Some(cue) = self.time.update(real_dt) {
            self.dispatch_cue(cue);
        }
        if self.time.is_frozen() {
            return SessionStatus::Running;
        }
        let dt = self.time.scaled(real_dt);

        if self.explosion.is_some() {
            self.advance_explosion(real_dt, dt, rng);
            return self.status();
        }

        self.advance_play(dt, input, rng);
        self.resolve_collisions(rng);
        self.process_blasts(rng);
        self.compact();
        self.status()
    }

    fn status(&self) -> SessionStatus {
        if self.over {
            SessionStatus::Over
        } else {
            SessionStatus::Running
        }
    }

    fn handle_toggles(&mut self, pressed: KeyState) {
        if pressed.is_held(Key::DebugToggle) {
            self.debug = !self.debug;
            log::info!("Debug overlay {}", if self.debug { "on" } else { "off" });
        }
        if pressed.is_held(Key::FastForward) {
            self.game_time += self.tuning.fast_forward_secs;
            log::info!("Fast-forward to t={:.1}s", self.game_time);
            self.events.push(SessionEvent::FastForward {
                game_time: self.game_time,
            });
        }
    }

    fn dispatch_cue(&mut self, cue: SessionCue) {
        match cue {
            SessionCue::BeginSlowMotion => {
                if self.explosion.is_some() {
                    self.time
                        .set_base(self.tuning.slow_motion_scale.max(MIN_SLOW_MOTION_SCALE));
                }
            }
        }
    }

    fn advance_play(&mut self, dt: f32, input: &SessionInput, rng: &mut dyn RngCore) {
        self.game_time += dt;
        self.update_invincibility(dt);

        let held = input.held;
        self.ship.steer(held.is_held(Key::Up), held.is_held(Key::Down));
        self.ship.update(dt);

        if self.ship.weapon.update(dt) {
            log::debug!("Weapon cooled down");
            self.events.push(SessionEvent::Cooled);
        }
        if held.is_held(Key::Fire) && self.ship.controllable {
            self.fire(input.now);
        }

        self.advance_environment(dt, rng);

        if let Some(asteroid) = self.spawner.update(dt, self.game_time, rng) {
            self.asteroids.insert(asteroid);
        }

        if self.ship.visible {
            self.exhaust_timer += dt;
            while self.exhaust_timer >= EXHAUST_PERIOD {
                self.exhaust_timer -= EXHAUST_PERIOD;
                self.particles.exhaust(rng, self.ship.exhaust());
            }
        }
        self.particles.update(dt);
    }

    /// Bullets, asteroids and fuse detonations
    fn advance_environment(&mut self, dt: f32, rng: &mut dyn RngCore) {
        self.bullets.update_all(dt);
        self.asteroids.update_all(dt);

        let due: Vec<Handle> = self
            .asteroids
            .iter()
            .filter(|(_, a)| a.should_detonate())
            .map(|(h, _)| h)
            .collect();
        for handle in due {
            self.destroy_asteroid(handle, DestroyCause::Fuse, rng);
        }
    }

    fn advance_explosion(&mut self, real_dt: f32, dt: f32, rng: &mut dyn RngCore) {
        self.advance_environment(dt, rng);
        self.particles.update(dt);
        self.process_blasts(rng);
        self.compact();

        let Some(sequence) = self.explosion.as_mut() else {
            return;
        };
        sequence.remaining -= real_dt;
        if sequence.remaining <= 0.0 && self.particles.is_empty() {
            self.finish_explosion();
        }
    }

    fn update_invincibility(&mut self, dt: f32) {
        if self.invincibility <= 0.0 {
            return;
        }
        self.invincibility -= dt;
        if self.invincibility <= 0.0 {
            self.invincibility = 0.0;
            self.blink_timer = 0.0;
            self.ship.visible = true;
            self.ship.collision_enabled = true;
            return;
        }
        self.blink_timer += dt;
        let interval = self.tuning.blink_interval.max(MIN_BLINK_INTERVAL);
        while self.blink_timer >= interval {
            self.blink_timer -= interval;
            self.ship.visible = !self.ship.visible;
        }
    }

    fn fire(&mut self, now: f64) {
        if !self.ship.weapon.try_fire(now) {
            return;
        }
        let bullet = Bullet::new(
            self.ship.muzzle(),
            self.tuning.bullet_speed,
            self.tuning.bullet_radius,
        );
        self.bullets.insert(bullet);
        self.stats.shots += 1;
        self.events.push(SessionEvent::ShotFired);
        if self.ship.weapon.is_overheated() {
            log::debug!("Weapon overheated");
            self.events.push(SessionEvent::Overheated);
        }
    }

    /// Run one collision pass over a snapshot of everything collidable.
    /// Returns the number of colliding pairs.
    pub fn resolve_collisions(&mut self, rng: &mut dyn RngCore) -> usize {
        let mut colliders = Vec::with_capacity(1 + self.asteroids.len() + self.bullets.len());
        colliders.extend(self.ship.collider(EntityId::Ship));
        colliders.extend(
            self.asteroids
                .iter()
                .filter_map(|(h, a)| a.collider(EntityId::Asteroid(h))),
        );
        colliders.extend(
            self.bullets
                .iter()
                .filter_map(|(h, b)| b.collider(EntityId::Bullet(h))),
        );

        let mut hits = Hits { session: self, rng };
        collision::resolve_collisions(&colliders, &mut hits)
    }

    fn is_live(&self, id: EntityId) -> bool {
        match id {
            EntityId::Ship => self.ship.active && self.ship.collision_enabled,
            EntityId::Asteroid(h) => self
                .asteroids
                .get(h)
                .is_some_and(|a| a.active && a.collision_enabled),
            EntityId::Bullet(h) => self.bullets.get(h).is_some_and(|b| b.active),
        }
    }

    /// Destroy an asteroid: points, debris, shake, hit-freeze, then a split
    /// or a blast depending on the variant.
    ///
    /// No-op (returns false) for a stale handle or an already destroyed
    /// asteroid, so one asteroid never pays out twice.
    pub fn destroy_asteroid(
        &mut self,
        handle: Handle,
        cause: DestroyCause,
        rng: &mut dyn RngCore,
    ) -> bool {
        let Some(asteroid) = self.asteroids.get_mut(handle) else {
            return false;
        };
        if !asteroid.active {
            return false;
        }
        asteroid.active = false;
        asteroid.collision_enabled = false;
        let (pos, size, exploding) = (asteroid.pos, asteroid.size, asteroid.is_exploding());
        let children = asteroid.split(rng);

        let points = if cause.awards_points() { size.points() } else { 0 };
        self.score = self.score.saturating_add(points);
        self.stats.asteroids_destroyed += 1;
        self.particles.asteroid_explosion(rng, pos, size.radius());
        self.shake.add(self.tuning.hit_shake);

        if exploding && cause != DestroyCause::Blast {
            let radius = size.blast_radius();
            log::debug!("Detonation at ({:.0}, {:.0}) r={:.0}", pos.x, pos.y, radius);
            self.pending_blasts.push(Blast { center: pos, radius });
            self.particles.blast(rng, pos, radius);
            self.shake.add(self.tuning.hit_shake);
            self.time.start_freeze(self.tuning.hit_freeze_secs * 2.0, None);
            self.stats.detonations += 1;
            self.events.push(SessionEvent::Detonation { center: pos, radius });
        } else {
            self.time.start_freeze(self.tuning.hit_freeze_secs, None);
        }

        if let Some(children) = children {
            log::debug!("{:?} split", size);
            for child in children {
                self.asteroids.insert(child);
            }
            self.events.push(SessionEvent::AsteroidSplit { size });
        }

        self.events.push(SessionEvent::AsteroidDestroyed {
            size,
            exploding,
            points,
            cause,
        });
        true
    }

    /// Blow up the ship and start the explosion sequence
    fn destroy_ship(&mut self, rng: &mut dyn RngCore) {
        if !self.is_live(EntityId::Ship) {
            return;
        }
        self.ship.collision_enabled = false;
        self.ship.visible = false;
        self.ship.controllable = false;
        self.ship.reset_motion();
        self.invincibility = 0.0;
        self.lives = self.lives.saturating_sub(1);
        self.stats.deaths += 1;

        self.particles.ship_explosion(rng, self.ship.pos);
        self.shake.add(SHIP_DEATH_SHAKE);
        self.time.start_freeze(
            self.tuning.hit_freeze_secs * 2.0,
            Some(SessionCue::BeginSlowMotion),
        );
        self.explosion = Some(ExplosionSequence {
            remaining: self.tuning.explosion_secs,
        });

        log::info!("Ship destroyed, {} lives left", self.lives);
        self.events.push(SessionEvent::ShipDestroyed {
            lives_left: self.lives,
        });
    }

    /// Explosion played out: respawn or end the run
    fn finish_explosion(&mut self) {
        self.explosion = None;
        self.time.set_base(1.0);

        if self.lives == 0 {
            self.over = true;
            log::info!("Game over with score {}", self.score);
            self.events.push(SessionEvent::GameOver { score: self.score });
            return;
        }

        let before = self.game_time;
        self.game_time = (self.game_time - self.tuning.death_penalty_secs).max(0.0);

        self.ship.pos = Vec2::new(self.tuning.ship_x, WORLD_HEIGHT / 2.0);
        self.ship.reset_motion();
        self.ship.weapon = WeaponHeat::new(&self.tuning);
        self.ship.visible = true;
        self.ship.controllable = true;
        self.invincibility = self.tuning.invincibility_secs.max(0.0);
        self.blink_timer = 0.0;
        self.ship.collision_enabled = self.invincibility <= 0.0;

        log::info!(
            "Respawned, game time {:.1}s -> {:.1}s",
            before,
            self.game_time
        );
        self.events.push(SessionEvent::Respawned);
    }

    /// Apply queued area damage. Blast victims never queue another blast,
    /// so this always drains.
    fn process_blasts(&mut self, rng: &mut dyn RngCore) {
        while let Some(blast) = self.pending_blasts.pop() {
            let area = Bounds::circle(blast.center, blast.radius);

            if self.is_live(EntityId::Ship) && check_bounds(&area, &self.ship.bounds()) {
                self.destroy_ship(rng);
            }

            let victims: Vec<Handle> = self
                .asteroids
                .iter()
                .filter(|(_, a)| a.active && a.collision_enabled)
                .filter(|(_, a)| check_bounds(&area, &a.bounds()))
                .map(|(h, _)| h)
                .collect();
            for handle in victims {
                self.destroy_asteroid(handle, DestroyCause::Blast, rng);
            }
        }
    }

    fn compact(&mut self) {
        self.asteroids.sweep();
        self.bullets.sweep();
    }
}

/// Collision receiver for one pass
struct Hits<'a> {
    session: &'a mut Session,
    rng: &'a mut dyn RngCore,
}

impl CollisionContext for Hits<'_> {
    fn is_live(&self, id: EntityId) -> bool {
        self.session.is_live(id)
    }

    fn on_collision(&mut self, this: EntityId, other: EntityId) {
        match (this, other) {
            (EntityId::Asteroid(h), EntityId::Bullet(_)) => {
                self.session.destroy_asteroid(h, DestroyCause::Bullet, self.rng);
            }
            (EntityId::Asteroid(h), EntityId::Ship) => {
                self.session.destroy_asteroid(h, DestroyCause::Rammed, self.rng);
            }
            (EntityId::Bullet(h), EntityId::Asteroid(_)) => {
                if let Some(bullet) = self.session.bullets.get_mut(h) {
                    bullet.active = false;
                }
            }
            (EntityId::Ship, EntityId::Asteroid(_)) => {
                self.session.destroy_ship(self.rng);
            }
            (EntityId::Asteroid(_), EntityId::Asteroid(_))
            | (EntityId::Ship | EntityId::Bullet(_), EntityId::Ship | EntityId::Bullet(_)) => {
                log::trace!("ignored pair {:?} <-> {:?}", this, other);
            }
        }
    }
}

/// Ramp and heat readout for the debug overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugOverlay {
    pub game_time: f32,
    pub spawn_interval: f32,
    pub small_chance: f32,
    pub medium_chance: f32,
    pub large_chance: f32,
    pub explosive_chance: f32,
    pub max_deflection_deg: f32,
    pub heat: f32,
    pub overheated: bool,
    pub asteroids: usize,
    pub bullets: usize,
    pub particles: usize,
    pub time_scale: f32,
}

impl DebugOverlay {
    pub fn capture(session: &Session) -> Self {
        let t = session.game_time;
        let (small, medium, large) = spawner::size_probabilities(t);
        Self {
            game_time: t,
            spawn_interval: spawner::spawn_interval(t),
            small_chance: small,
            medium_chance: medium,
            large_chance: large,
            explosive_chance: spawner::explosive_chance(t),
            max_deflection_deg: spawner::max_deflection_deg(t),
            heat: session.ship.weapon.heat(),
            overheated: session.ship.weapon.is_overheated(),
            asteroids: session.asteroids.active_count(),
            bullets: session.bullets.active_count(),
            particles: session.particles.len(),
            time_scale: session.time.scale(),
        }
    }
}

impl fmt::Display for DebugOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "time {:.1}s (x{:.2})", self.game_time, self.time_scale)?;
        writeln!(f, "spawn interval {:.2}s", self.spawn_interval)?;
        writeln!(
            f,
            "size S {:.0}% M {:.0}% L {:.0}%",
            self.small_chance * 100.0,
            self.medium_chance * 100.0,
            self.large_chance * 100.0
        )?;
        writeln!(
            f,
            "explosive {:.0}%  angled max {:.1}deg",
            self.explosive_chance * 100.0,
            self.max_deflection_deg
        )?;
        writeln!(
            f,
            "heat {:.0}{}",
            self.heat,
            if self.overheated { " OVERHEAT" } else { "" }
        )?;
        write!(
            f,
            "entities: {} asteroids, {} bullets, {} particles",
            self.asteroids, self.bullets, self.particles
        )
    }
}
