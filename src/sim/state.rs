//! Top-level screen state machine
//!
//! MainMenu -> Intro -> Playing -> GameOver -> MainMenu. Exactly one screen
//! is live. Transitions are synchronous: the old screen exits (its input
//! latch is disarmed) and the new one enters (the latch re-arms with whatever
//! is held right now) within the same update.

use std::fmt;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::Starfield;
use super::intro::IntroSequence;
use super::session::{Session, SessionEvent, SessionInput, SessionStatus};
use crate::consts::WORLD_HEIGHT;
use crate::input::{InputLatch, Key, KeyState, TickInput, pointer_keys};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Seconds the game-over screen ignores input
pub const GAME_OVER_ACCEPT_DELAY: f32 = 0.75;

/// Which screen is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenKind {
    MainMenu,
    Intro,
    Playing,
    GameOver,
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenKind::MainMenu => "main menu",
            ScreenKind::Intro => "intro",
            ScreenKind::Playing => "playing",
            ScreenKind::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// A screen and the simulation it owns
#[derive(Debug, Clone)]
pub enum Screen {
    MainMenu,
    Intro(Box<IntroSequence>),
    Playing(Box<Session>),
    GameOver {
        score: u64,
        /// Seconds shown so far
        shown: f32,
    },
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::MainMenu => ScreenKind::MainMenu,
            Screen::Intro(_) => ScreenKind::Intro,
            Screen::Playing(_) => ScreenKind::Playing,
            Screen::GameOver { .. } => ScreenKind::GameOver,
        }
    }
}

/// Requested screen change, applied after the live screen updated
enum Transition {
    ToIntro,
    ToPlaying,
    ToMainMenu,
    ToGameOver(u64),
}

/// The whole game: settings, balance, the live screen and the shared
/// background
pub struct Game {
    pub settings: Settings,
    pub tuning: Tuning,
    screen: Screen,
    latch: InputLatch,
    /// Keys held on the last update, used to arm the next screen's latch
    held: KeyState,
    starfield: Starfield,
    rng: Box<dyn RngCore>,
    events: Vec<SessionEvent>,
    last_score: Option<u64>,
}

impl Game {
    pub fn new(settings: Settings, tuning: Tuning, mut rng: Box<dyn RngCore>) -> Self {
        let starfield = Starfield::new(&mut *rng, settings.quality.star_count());
        let mut latch = InputLatch::default();
        latch.arm(KeyState::new());
        log::info!("Entering {}", ScreenKind::MainMenu);
        Self {
            settings,
            tuning,
            screen: Screen::MainMenu,
            latch,
            held: KeyState::new(),
            starfield,
            rng,
            events: Vec::new(),
            last_score: None,
        }
    }

    /// Default settings and balance with a seeded PCG stream
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            Settings::default(),
            Tuning::default(),
            Box::new(Pcg32::seed_from_u64(seed)),
        )
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.screen {
            Screen::Playing(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.screen {
            Screen::Playing(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    /// Score of the most recently finished run
    pub fn last_score(&self) -> Option<u64> {
        self.last_score
    }

    /// Session events forwarded since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Held keys plus pointer zones, relative to the ship when there is one
    fn held_keys(&self, input: &TickInput) -> KeyState {
        let ship_y = self
            .session()
            .map_or(WORLD_HEIGHT / 2.0, |session| session.ship.pos.y);
        input.keys.union(pointer_keys(&input.pointers, ship_y))
    }

    /// Update the live screen by one step
    pub fn update(&mut self, input: &TickInput, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let held = self.held_keys(input);
        self.held = held;
        let pressed = self.latch.poll(held);

        let transition = match &mut self.screen {
            Screen::MainMenu => {
                self.starfield.update(dt);
                pressed.any().then_some(Transition::ToIntro)
            }
            Screen::Intro(intro) => {
                self.starfield.update(dt);
                intro.update(dt).then_some(Transition::ToPlaying)
            }
            Screen::Playing(session) => {
                if pressed.is_held(Key::Escape) {
                    log::info!("Run abandoned at score {}", session.score());
                    Some(Transition::ToMainMenu)
                } else {
                    let session_input = SessionInput {
                        held,
                        pressed,
                        now: input.now,
                    };
                    let status = session.tick(dt, &session_input, &mut *self.rng);
                    self.starfield.update(dt * session.time_scale());
                    self.events.extend(session.drain_events());
                    (status == SessionStatus::Over)
                        .then(|| Transition::ToGameOver(session.score()))
                }
            }
            Screen::GameOver { shown, .. } => {
                self.starfield.update(dt);
                *shown += dt;
                (*shown >= GAME_OVER_ACCEPT_DELAY && pressed.any())
                    .then_some(Transition::ToMainMenu)
            }
        };

        if let Some(transition) = transition {
            self.apply(transition);
        }
    }

    fn apply(&mut self, transition: Transition) {
        self.exit_screen();
        let previous = std::mem::replace(&mut self.screen, Screen::MainMenu);
        let next = match (transition, previous) {
            (Transition::ToIntro, _) => Screen::Intro(Box::new(IntroSequence::new(&self.tuning))),
            (Transition::ToPlaying, Screen::Intro(intro)) => {
                let (ship, bullets) = intro.finish();
                Screen::Playing(Box::new(Session::with_ship(
                    self.tuning.clone(),
                    &self.settings,
                    ship,
                    bullets,
                )))
            }
            (Transition::ToPlaying, _) => {
                Screen::Playing(Box::new(Session::new(self.tuning.clone(), &self.settings)))
            }
            (Transition::ToGameOver(score), _) => {
                self.last_score = Some(score);
                Screen::GameOver { score, shown: 0.0 }
            }
            (Transition::ToMainMenu, _) => Screen::MainMenu,
        };
        self.enter_screen(next);
    }

    fn exit_screen(&mut self) {
        log::debug!("Leaving {}", self.screen.kind());
        self.latch.disarm();
    }

    fn enter_screen(&mut self, screen: Screen) {
        log::info!("Entering {}", screen.kind());
        self.screen = screen;
        self.latch.arm(self.held);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::{Asteroid, SizeClass};
    use glam::Vec2;

    const DT: f32 = 1.0 / 120.0;

    fn keys(held: &[Key]) -> TickInput {
        let mut state = KeyState::new();
        for key in held {
            state.set(*key, true);
        }
        TickInput::keys(state, 0.0)
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    /// Press and release `key` over two updates
    fn tap(game: &mut Game, key: Key) {
        game.update(&keys(&[key]), DT);
        game.update(&idle(), DT);
    }

    fn run_until(game: &mut Game, kind: ScreenKind, max_ticks: usize) {
        for _ in 0..max_ticks {
            if game.screen_kind() == kind {
                return;
            }
            game.update(&idle(), DT);
        }
        assert_eq!(game.screen_kind(), kind);
    }

    fn short_game() -> Game {
        let tuning = Tuning {
            lives: 1,
            ..Default::default()
        };
        Game::new(
            Settings::default(),
            tuning,
            Box::new(Pcg32::seed_from_u64(42)),
        )
    }

    #[test]
    fn test_full_screen_cycle() {
        let mut game = short_game();
        assert_eq!(game.screen_kind(), ScreenKind::MainMenu);

        tap(&mut game, Key::Fire);
        assert_eq!(game.screen_kind(), ScreenKind::Intro);

        run_until(&mut game, ScreenKind::Playing, 1000);
        let session = game.session_mut().expect("playing");
        let ship_pos = session.ship.pos;
        session.asteroids.insert(Asteroid::new(
            &mut Pcg32::seed_from_u64(1),
            SizeClass::Small,
            ship_pos,
            Vec2::ZERO,
            false,
        ));

        run_until(&mut game, ScreenKind::GameOver, 3600);
        assert_eq!(game.last_score(), Some(0));
        let events = game.drain_events();
        assert!(events.iter().any(|e| matches!(e, SessionEvent::ShipDestroyed { .. })));
        assert!(events.iter().any(|e| matches!(e, SessionEvent::GameOver { .. })));

        // Presses during the accept delay are ignored
        tap(&mut game, Key::Fire);
        assert_eq!(game.screen_kind(), ScreenKind::GameOver);

        for _ in 0..120 {
            game.update(&idle(), DT);
        }
        tap(&mut game, Key::Fire);
        assert_eq!(game.screen_kind(), ScreenKind::MainMenu);
    }

    #[test]
    fn test_intro_ignores_input() {
        let mut game = Game::seeded(3);
        tap(&mut game, Key::Up);
        assert_eq!(game.screen_kind(), ScreenKind::Intro);
        tap(&mut game, Key::Escape);
        assert_eq!(game.screen_kind(), ScreenKind::Intro);
    }

    #[test]
    fn test_escape_abandons_run() {
        let mut game = Game::seeded(4);
        tap(&mut game, Key::Fire);
        run_until(&mut game, ScreenKind::Playing, 1000);

        tap(&mut game, Key::Escape);
        assert_eq!(game.screen_kind(), ScreenKind::MainMenu);
        assert!(game.session().is_none());
        assert_eq!(game.last_score(), None);
    }

    #[test]
    fn test_held_key_does_not_carry_into_next_screen() {
        let mut game = Game::seeded(5);
        // Escape held from the playing screen into the menu
        tap(&mut game, Key::Fire);
        run_until(&mut game, ScreenKind::Playing, 1000);
        for _ in 0..30 {
            game.update(&keys(&[Key::Escape]), DT);
        }
        assert_eq!(game.screen_kind(), ScreenKind::MainMenu);

        // Still holding: no fresh edge, menu stays
        for _ in 0..30 {
            game.update(&keys(&[Key::Escape]), DT);
        }
        assert_eq!(game.screen_kind(), ScreenKind::MainMenu);

        game.update(&idle(), DT);
        game.update(&keys(&[Key::Escape]), DT);
        assert_eq!(game.screen_kind(), ScreenKind::Intro);
    }

    #[test]
    fn test_pointer_tap_starts_game() {
        let mut game = Game::seeded(6);
        let mut input = idle();
        input.pointers.push(Vec2::new(800.0, 200.0));
        game.update(&input, DT);
        assert_eq!(game.screen_kind(), ScreenKind::Intro);
    }

    #[test]
    fn test_starfield_keeps_scrolling_in_menu() {
        let mut game = Game::seeded(7);
        let before: Vec<f32> = game.starfield().stars.iter().map(|s| s.pos.x).collect();
        for _ in 0..10 {
            game.update(&idle(), DT);
        }
        let after: Vec<f32> = game.starfield().stars.iter().map(|s| s.pos.x).collect();
        assert_ne!(before, after);
    }
}
