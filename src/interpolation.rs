// Rate-limited exponential smoothing of per-leg foot targets.
//
// Each applied update moves every foot a fixed fraction of the way to its
// target. Calls arriving faster than `step_time` are coalesced: they return
// the previous output unchanged.

use std::time::{Duration, Instant};

use crate::kinematics::{LegMap, Position3};

/// Minimum spacing between applied updates in walk mode
pub const WALK_STEP_TIME: Duration = Duration::from_millis(5);

/// Fraction of the remaining distance covered per applied update in walk mode
pub const WALK_SPEED: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct Interpolator {
    step_time: Duration,
    speed: f32,
    current: Option<LegMap<Position3>>,
    last_update: Option<Instant>,
}

impl Interpolator {
    /// Create an interpolator; `speed` is clamped into (0, 1]
    pub fn new(step_time: Duration, speed: f32) -> Self {
        Self {
            step_time,
            speed: speed.clamp(f32::MIN_POSITIVE, 1.0),
            current: None,
            last_update: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Smoothed positions, or `None` before the first applied update
    pub fn current(&self) -> Option<&LegMap<Position3>> {
        self.current.as_ref()
    }

    /// Advance towards `targets` and return the smoothed positions
    ///
    /// The first call always applies and starts every leg at its target.
    pub fn update(&mut self, targets: &LegMap<Position3>, now: Instant) -> LegMap<Position3> {
        if let (Some(last), Some(current)) = (self.last_update, self.current) {
            if now.saturating_duration_since(last) < self.step_time {
                return current;
            }
        }

        let next = match &self.current {
            Some(current) => current.map(|leg, position| position.approach(&targets[leg], self.speed)),
            None => *targets,
        };

        self.current = Some(next);
        self.last_update = Some(now);
        next
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(WALK_STEP_TIME, WALK_SPEED)
    }
}
