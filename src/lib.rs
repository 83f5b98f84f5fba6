//! Rock Runner - a side-scrolling asteroid shooter
//!
//! Core modules:
//! - `sim`: Gameplay simulation (entities, collisions, time scaling, screens)
//! - `input`: Key state, pointer zones and edge detection
//! - `settings`: Player-facing preferences
//! - `tuning`: Data-driven game balance

pub mod input;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use input::{Key, KeyState, TickInput};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the host before clamping
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World dimensions (pixels, y grows downward)
    pub const WORLD_WIDTH: f32 = 960.0;
    pub const WORLD_HEIGHT: f32 = 540.0;

    /// Vertical band the ship and spawns are confined to
    pub const PLAY_TOP: f32 = 40.0;
    pub const PLAY_BOTTOM: f32 = WORLD_HEIGHT - 40.0;
}

/// Rotate a vector by `degrees` (positive = counter-clockwise in math space)
#[inline]
pub fn rotate_deg(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Signed angle in degrees from `from` to `to`
#[inline]
pub fn signed_angle_deg(from: Vec2, to: Vec2) -> f32 {
    from.perp_dot(to).atan2(from.dot(to)).to_degrees()
}

/// Piecewise-linear interpolation through sorted `(x, y)` anchors.
///
/// Values left of the first anchor take its `y`, values right of the last
/// anchor take the last `y`.
pub fn piecewise_linear(x: f32, anchors: &[(f32, f32)]) -> f32 {
    let Some(&(first_x, first_y)) = anchors.first() else {
        return 0.0;
    };
    if x <= first_x {
        return first_y;
    }
    for pair in anchors.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let span = x1 - x0;
            if span <= 0.0 {
                return y1;
            }
            let t = (x - x0) / span;
            return y0 + (y1 - y0) * t;
        }
    }
    anchors.last().map(|&(_, y)| y).unwrap_or(first_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_and_measure() {
        let v = Vec2::new(100.0, 0.0);
        let r = rotate_deg(v, 30.0);
        assert!((signed_angle_deg(v, r) - 30.0).abs() < 0.01);
        assert!((r.length() - 100.0).abs() < 0.01);

        let r = rotate_deg(v, -12.5);
        assert!((signed_angle_deg(v, r) + 12.5).abs() < 0.01);
    }

    #[test]
    fn test_piecewise_linear_clamps() {
        let anchors = [(0.0, 3.0), (60.0, 1.0), (120.0, 0.5)];
        assert_eq!(piecewise_linear(-5.0, &anchors), 3.0);
        assert_eq!(piecewise_linear(0.0, &anchors), 3.0);
        assert!((piecewise_linear(30.0, &anchors) - 2.0).abs() < 1e-5);
        assert!((piecewise_linear(90.0, &anchors) - 0.75).abs() < 1e-5);
        assert_eq!(piecewise_linear(500.0, &anchors), 0.5);
        assert_eq!(piecewise_linear(1.0, &[]), 0.0);
    }
}
