// Gait generation for the quadruped
//
// Provides:
// - Swing/stance foot profiles shared by all gaits
// - Crawl gait (time-derived phase, one leg in swing)
// - Trot gait (diagonal pairs, self-paced phase)
// - GaitController holding the step command and the active strategy

pub mod crawl;
pub mod step;
pub mod trot;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::kinematics::{LegMap, Position3};
pub use crawl::CrawlGait;
pub use step::{LIFT_HEIGHT, StepShape};
pub use trot::TrotGait;

/// Step length limits (cm)
pub const STEP_LENGTH_MIN: f32 = -5.0;
pub const STEP_LENGTH_MAX: f32 = 5.0;

/// Wrap a phase into [0, 1)
pub(crate) fn wrap_unit(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Step command shared with the active strategy
#[derive(Debug, Clone, PartialEq)]
pub struct GaitState {
    pub step_length: f32,
    pub lift_height: f32,
    pub just_started: bool,
}

impl GaitState {
    pub fn new() -> Self {
        Self {
            step_length: 0.0,
            lift_height: LIFT_HEIGHT,
            just_started: true,
        }
    }

    pub fn shape(&self) -> StepShape {
        StepShape {
            step_length: self.step_length,
            lift_height: self.lift_height,
            just_started: self.just_started,
        }
    }
}

impl Default for GaitState {
    fn default() -> Self {
        Self::new()
    }
}

/// A scheduling policy that turns a body position into per-leg foot targets
pub trait GaitStrategy: Send {
    fn name(&self) -> &'static str;

    /// Foot targets at `now`
    ///
    /// `current` holds the smoothed positions actually being commanded, if any.
    fn targets(
        &mut self,
        body: Position3,
        state: &mut GaitState,
        now: Instant,
        current: Option<&LegMap<Position3>>,
    ) -> LegMap<Position3>;

    /// Which legs are in swing at `now`
    fn swing_legs(&self, now: Instant) -> LegMap<bool>;
}

/// Selectable gait policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GaitKind {
    Crawl,
    Trot,
}

pub struct GaitController {
    state: GaitState,
    strategy: Box<dyn GaitStrategy>,
}

impl GaitController {
    /// Create a controller for `kind`; time-based gaits start their cycle at `anchor`
    pub fn new(kind: GaitKind, anchor: Instant) -> Self {
        let strategy: Box<dyn GaitStrategy> = match kind {
            GaitKind::Crawl => Box::new(CrawlGait::new(anchor)),
            GaitKind::Trot => Box::new(TrotGait::new()),
        };
        Self::with_strategy(strategy)
    }

    pub fn with_strategy(strategy: Box<dyn GaitStrategy>) -> Self {
        Self {
            state: GaitState::new(),
            strategy,
        }
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Set the stride, clamped to the supported range
    pub fn set_step_length(&mut self, step_length: f32) {
        self.state.step_length = step_length.clamp(STEP_LENGTH_MIN, STEP_LENGTH_MAX);
    }

    pub fn step_length(&self) -> f32 {
        self.state.step_length
    }

    pub fn targets(
        &mut self,
        body: Position3,
        now: Instant,
        current: Option<&LegMap<Position3>>,
    ) -> LegMap<Position3> {
        self.strategy.targets(body, &mut self.state, now, current)
    }

    pub fn swing_legs(&self, now: Instant) -> LegMap<bool> {
        self.strategy.swing_legs(now)
    }
}
