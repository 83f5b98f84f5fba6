//! Rock Runner headless driver
//!
//! Runs the simulation without a window: a simple autopilot plays through
//! menu, intro and sessions for a fixed stretch of real time, then prints a
//! JSON summary. Useful for soak-testing balance changes.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use rock_runner::sim::{FrameStepper, Game, ScreenKind, SessionEvent};
use rock_runner::{Key, KeyState, QualityPreset, Settings, TickInput, Tuning};

#[derive(Parser, Debug)]
#[command(name = "rock-runner")]
#[command(about = "Headless Rock Runner autopilot run with a JSON summary")]
struct Cli {
    /// RNG seed for the run
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Real seconds to simulate
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Host frame rate fed to the fixed-step driver
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Stop after this many finished runs
    #[arg(long)]
    max_runs: Option<u32>,
    /// Settings JSON (defaults when missing)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Balance JSON (defaults when missing)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Quality preset override: low, medium or high
    #[arg(long, value_parser = parse_quality)]
    quality: Option<QualityPreset>,
}

fn parse_quality(s: &str) -> Result<QualityPreset, String> {
    QualityPreset::parse(s).ok_or_else(|| format!("unknown quality preset '{s}'"))
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    frames: u64,
    seconds: f64,
    final_screen: Option<ScreenKind>,
    scores: Vec<u64>,
    best_score: u64,
    shots: u32,
    asteroids_destroyed: u32,
    detonations: u32,
    deaths: u32,
}

impl Summary {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ShotFired => self.shots += 1,
            SessionEvent::AsteroidDestroyed { .. } => self.asteroids_destroyed += 1,
            SessionEvent::Detonation { .. } => self.detonations += 1,
            SessionEvent::ShipDestroyed { .. } => self.deaths += 1,
            SessionEvent::GameOver { score } => {
                self.scores.push(*score);
                self.best_score = self.best_score.max(*score);
            }
            _ => {}
        }
    }
}

/// Keys for this frame: tap through menus, chase the nearest rock in play
fn autopilot(game: &Game, frame: u64) -> KeyState {
    let mut keys = KeyState::new();
    match game.screen_kind() {
        ScreenKind::MainMenu | ScreenKind::GameOver => {
            // Alternate so the screen latch sees fresh presses
            keys.set(Key::Fire, frame % 2 == 0);
        }
        ScreenKind::Intro => {}
        ScreenKind::Playing => {
            let Some(session) = game.session() else {
                return keys;
            };
            let ship = &session.ship;
            let target = session
                .asteroids
                .values()
                .filter(|a| a.active && a.pos.x > ship.pos.x)
                .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
            if let Some(rock) = target {
                let dy = rock.pos.y - ship.pos.y;
                keys.set(Key::Up, dy < -ship.radius * 0.5);
                keys.set(Key::Down, dy > ship.radius * 0.5);
            }
            // Let the gun breathe before it locks up
            keys.set(Key::Fire, ship.weapon.fraction() < 0.8);
        }
    }
    keys
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.fps == 0 {
        bail!("--fps must be positive");
    }
    if !(cli.seconds.is_finite() && cli.seconds >= 0.0) {
        bail!("--seconds must be a non-negative number");
    }

    let mut settings = cli
        .settings
        .as_ref()
        .map_or_else(Settings::default, |path| Settings::load(path));
    if let Some(quality) = cli.quality {
        settings.quality = quality;
    }
    log::info!("Quality preset: {}", settings.quality.as_str());
    let tuning = cli
        .tuning
        .as_ref()
        .map_or_else(Tuning::default, |path| Tuning::load(path));

    let mut game = Game::new(settings, tuning, Box::new(Pcg32::seed_from_u64(cli.seed)));
    let mut stepper = FrameStepper::new();
    let frame_dt = 1.0 / cli.fps as f32;
    let total_frames = (cli.seconds * cli.fps as f32).round() as u64;

    let mut summary = Summary {
        seed: cli.seed,
        ..Default::default()
    };

    for frame in 0..total_frames {
        let now = frame as f64 * f64::from(frame_dt);
        let input = TickInput::keys(autopilot(&game, frame), now);
        stepper.run_frame(&mut game, &input, frame_dt);
        for event in game.drain_events() {
            summary.record(&event);
        }
        summary.frames = frame + 1;

        if cli
            .max_runs
            .is_some_and(|max| summary.scores.len() as u32 >= max)
        {
            break;
        }
    }

    summary.seconds = summary.frames as f64 * f64::from(frame_dt);
    summary.final_screen = Some(game.screen_kind());
    log::info!(
        "Simulated {:.1}s, {} runs finished, best score {}",
        summary.seconds,
        summary.scores.len(),
        summary.best_score
    );

    let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
    println!("{json}");
    Ok(())
}
