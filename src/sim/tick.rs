//! Fixed timestep driver
//!
//! Hosts hand over variable frame times; the stepper turns them into whole
//! `SIM_DT` steps so the simulation always advances by the same amount.

use super::state::Game;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::input::TickInput;

/// Accumulates frame time and hands out fixed steps
#[derive(Debug, Clone)]
pub struct FrameStepper {
    accumulator: f32,
    pub step: f32,
    pub max_substeps: u32,
}

impl Default for FrameStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStepper {
    pub fn new() -> Self {
        Self {
            accumulator: 0.0,
            step: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    /// Add a frame's worth of time and return how many steps to run.
    ///
    /// Frame time is clamped (a stalled tab must not replay minutes of game),
    /// and backlog past `max_substeps` is dropped instead of piling up.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            log::debug!("Dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        steps
    }

    /// Leftover fraction of a step, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Run every step due for this frame. The shot-gate timestamp advances
    /// by one step per substep. Returns the number of steps run.
    pub fn run_frame(&mut self, game: &mut Game, input: &TickInput, frame_dt: f32) -> u32 {
        let steps = self.advance(frame_dt);
        let mut step_input = input.clone();
        for i in 0..steps {
            step_input.now = input.now + f64::from(i) * f64::from(self.step);
            game.update(&step_input, self.step);
        }
        steps
    }
}
