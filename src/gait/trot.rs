// Trot gait: diagonal pairs alternate, phase advances only when the legs keep up.

use std::time::Instant;

use super::step::{square_step, stance_slide};
use super::{GaitState, GaitStrategy, wrap_unit};
use crate::kinematics::{LegId, LegMap, Position3};

/// Phase advance per call once every foot has reached its target
pub const PHASE_INCREMENT: f32 = 0.1;

/// Distance under which a foot counts as arrived (cm)
pub const ARRIVAL_TOLERANCE: f32 = 0.3;

/// Legs that swing during the first half of the cycle
const FIRST_PAIR: [LegId; 2] = [LegId::FrontRight, LegId::BackLeft];

#[derive(Debug, Clone)]
pub struct TrotGait {
    phase: f32,
    phase_increment: f32,
    tolerance: f32,
}

impl TrotGait {
    pub fn new() -> Self {
        Self::with_params(PHASE_INCREMENT, ARRIVAL_TOLERANCE)
    }

    pub fn with_params(phase_increment: f32, tolerance: f32) -> Self {
        Self {
            phase: 0.0,
            phase_increment,
            tolerance,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Phase of one leg; the second pair runs half a cycle behind
    pub fn leg_phase(&self, leg: LegId) -> f32 {
        if FIRST_PAIR.contains(&leg) {
            self.phase
        } else {
            wrap_unit(self.phase + 0.5)
        }
    }
}

impl Default for TrotGait {
    fn default() -> Self {
        Self::new()
    }
}

impl GaitStrategy for TrotGait {
    fn name(&self) -> &'static str {
        "trot"
    }

    fn targets(
        &mut self,
        body: Position3,
        state: &mut GaitState,
        _now: Instant,
        current: Option<&LegMap<Position3>>,
    ) -> LegMap<Position3> {
        let shape = state.shape();

        let targets = LegMap::from_fn(|leg| {
            let base = Position3::new(body.x + leg.hip_x_offset(), body.y, body.z);
            let leg_phase = self.leg_phase(leg);
            let sub_phase = wrap_unit(leg_phase * 2.0);
            if leg_phase < 0.5 {
                square_step(sub_phase, base, &shape)
            } else {
                stance_slide(sub_phase, base, shape.step_length)
            }
        });

        // Legs with no smoothed position yet count as arrived
        let all_arrived = targets.iter().all(|(leg, target)| {
            current
                .map(|positions| positions[leg].distance(target) <= self.tolerance)
                .unwrap_or(true)
        });

        if all_arrived {
            self.phase = wrap_unit(self.phase + self.phase_increment);
            if self.phase >= 0.5 {
                state.just_started = false;
            }
        }

        targets
    }

    fn swing_legs(&self, _now: Instant) -> LegMap<bool> {
        LegMap::from_fn(|leg| self.leg_phase(leg) < 0.5)
    }
}
