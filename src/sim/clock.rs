//! Global time scaling and camera shake
//!
//! [`TimeScale`] is the single authority for how much simulated time one real
//! tick advances. A hit-freeze zeroes it for a fixed real duration; when the
//! freeze runs out the base scale comes back and the registered cue is handed
//! out exactly once.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeScale<C> {
    /// Scale restored after a freeze (1.0, or slow motion)
    base: f32,
    /// Real seconds of freeze left
    freeze_remaining: f32,
    /// Cue handed out when the freeze ends
    pending: Option<C>,
}

impl<C> Default for TimeScale<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimeScale<C> {
    pub fn new() -> Self {
        Self {
            base: 1.0,
            freeze_remaining: 0.0,
            pending: None,
        }
    }

    /// Effective scale right now
    pub fn scale(&self) -> f32 {
        if self.is_frozen() { 0.0 } else { self.base }
    }

    /// Change the persistent scale (slow motion on/off)
    pub fn set_base(&mut self, base: f32) {
        self.base = base.max(0.0);
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_remaining > 0.0
    }

    /// Scale a real delta
    pub fn scaled(&self, real_dt: f32) -> f32 {
        real_dt.max(0.0) * self.scale()
    }

    /// Freeze for `duration` real seconds.
    ///
    /// Overlapping freezes keep the longer remaining time. An already pending
    /// cue is kept; a new cue only registers when none is pending.
    pub fn start_freeze(&mut self, duration: f32, cue: Option<C>) {
        if duration <= 0.0 && cue.is_none() {
            return;
        }
        self.freeze_remaining = self.freeze_remaining.max(duration.max(f32::EPSILON));
        if self.pending.is_none() {
            self.pending = cue;
        }
    }

    /// Advance the freeze by real time. Returns the cue on the tick the
    /// freeze ends.
    pub fn update(&mut self, real_dt: f32) -> Option<C> {
        if !self.is_frozen() {
            return None;
        }
        self.freeze_remaining -= real_dt.max(0.0);
        if self.freeze_remaining <= 0.0 {
            self.freeze_remaining = 0.0;
            return self.pending.take();
        }
        None
    }

    /// Drop any freeze and pending cue (state exit)
    pub fn reset(&mut self) {
        self.base = 1.0;
        self.freeze_remaining = 0.0;
        self.pending = None;
    }
}

/// Camera shake, visual only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shake {
    /// Current intensity (0-1)
    pub intensity: f32,
    enabled: bool,
}

/// Fraction of intensity lost per second
const SHAKE_DECAY_PER_SEC: f32 = 4.0;

/// Maximum camera offset at full intensity (pixels)
pub const SHAKE_MAX_OFFSET: f32 = 12.0;

impl Shake {
    pub fn new(enabled: bool) -> Self {
        Self {
            intensity: 0.0,
            enabled,
        }
    }

    pub fn add(&mut self, amount: f32) {
        if self.enabled {
            self.intensity = (self.intensity + amount).min(1.0);
        }
    }

    /// Decays with real time so freezes still settle the camera
    pub fn update(&mut self, real_dt: f32) {
        let decay = real_dt.max(0.0) * SHAKE_DECAY_PER_SEC * self.intensity.max(0.1);
        self.intensity = (self.intensity - decay).max(0.0);
        if self.intensity < 0.01 {
            self.intensity = 0.0;
        }
    }

    /// Camera offset for the renderer at time `t`
    pub fn offset(&self, t: f32) -> (f32, f32) {
        let amp = self.intensity * self.intensity * SHAKE_MAX_OFFSET;
        ((t * 71.0).sin() * amp, (t * 53.0).cos() * amp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_restores_and_fires_once() {
        let mut clock: TimeScale<u32> = TimeScale::new();
        clock.start_freeze(0.5, Some(42));
        assert_eq!(clock.scale(), 0.0);
        assert_eq!(clock.scaled(0.016), 0.0);

        let mut fired = Vec::new();
        let mut elapsed = 0.0;
        for _ in 0..100 {
            let dt = 1.0 / 60.0;
            elapsed += dt;
            if let Some(cue) = clock.update(dt) {
                fired.push((cue, elapsed));
            }
        }
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 42);
        assert!(fired[0].1 >= 0.5 - 1e-4);
        assert_eq!(clock.scale(), 1.0);
    }

    #[test]
    fn test_freeze_restores_base_scale() {
        let mut clock: TimeScale<()> = TimeScale::new();
        clock.set_base(0.3);
        clock.start_freeze(0.1, None);
        assert_eq!(clock.scale(), 0.0);
        clock.update(0.2);
        assert!((clock.scale() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_freeze_keeps_first_cue_and_longest_time() {
        let mut clock: TimeScale<&str> = TimeScale::new();
        clock.start_freeze(0.2, Some("ship"));
        clock.start_freeze(0.05, Some("rock"));
        assert_eq!(clock.update(0.1), None);
        assert!(clock.is_frozen());
        assert_eq!(clock.update(0.1), Some("ship"));
        assert_eq!(clock.update(0.1), None);
    }

    #[test]
    fn test_negative_dt_does_not_advance() {
        let mut clock: TimeScale<()> = TimeScale::new();
        clock.start_freeze(0.1, Some(()));
        assert_eq!(clock.update(-5.0), None);
        assert!(clock.is_frozen());
        assert_eq!(clock.scaled(-1.0), 0.0);
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut shake = Shake::new(true);
        shake.add(0.8);
        assert!(shake.intensity > 0.0);
        for _ in 0..240 {
            shake.update(1.0 / 120.0);
        }
        assert_eq!(shake.intensity, 0.0);
        assert_eq!(shake.offset(1.0), (0.0, 0.0));
    }

    #[test]
    fn test_disabled_shake_ignores_hits() {
        let mut shake = Shake::new(false);
        shake.add(1.0);
        assert_eq!(shake.intensity, 0.0);
    }
}
