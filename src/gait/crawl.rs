// Crawl gait: one leg in swing at a time, phase derived from elapsed time.
//
// The cycle is split into NUM_PHASES equal slots. Each leg swings during one
// slot, rotated by its own offset, so the legs circulate FL -> FR -> BR -> BL
// with three feet always planted.

use std::time::{Duration, Instant};

use super::step::{square_step, stance_push};
use super::{GaitState, GaitStrategy, wrap_unit};
use crate::kinematics::{LegId, LegMap, Position3};

/// Number of equal slots in one crawl cycle
pub const NUM_PHASES: u32 = 8;

/// Duration of one slot
pub const STEP_DURATION: Duration = Duration::from_millis(500);

/// Lateral shift applied to every foot while one front leg swings (cm)
pub const BODY_SHIFT: f32 = 2.0;

/// Slot in which each leg starts its swing
pub fn phase_offset(leg: LegId) -> u32 {
    match leg {
        LegId::BackLeft => 0,
        LegId::FrontLeft => 2,
        LegId::BackRight => 4,
        LegId::FrontRight => 6,
    }
}

/// Width of the swing window as a fraction of the cycle
fn swing_window() -> f32 {
    1.0 / NUM_PHASES as f32
}

pub struct CrawlGait {
    anchor: Instant,
    step_duration: Duration,
}

impl CrawlGait {
    /// Start a crawl whose phase 0 is `anchor`
    pub fn new(anchor: Instant) -> Self {
        Self::with_step_duration(anchor, STEP_DURATION)
    }

    pub fn with_step_duration(anchor: Instant, step_duration: Duration) -> Self {
        Self {
            anchor,
            step_duration,
        }
    }

    /// Length of a full cycle (every leg swings once)
    pub fn cycle(&self) -> Duration {
        self.step_duration * NUM_PHASES
    }

    /// Global phase in [0, 1) at `now`
    ///
    /// Instants before the anchor read as phase 0.
    pub fn phase_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.anchor).as_secs_f64();
        let cycle = self.cycle().as_secs_f64();
        wrap_unit(((elapsed % cycle) / cycle) as f32)
    }

    /// Phase of one leg: the global phase rotated back by the leg's offset
    pub fn leg_phase(&self, leg: LegId, now: Instant) -> f32 {
        let offset = phase_offset(leg) as f32 / NUM_PHASES as f32;
        wrap_unit(self.phase_at(now) - offset)
    }

    pub fn is_swinging(&self, leg: LegId, now: Instant) -> bool {
        self.leg_phase(leg, now) < swing_window()
    }

    /// Lateral shift towards the side whose front leg is planted
    pub fn body_shift(&self, now: Instant) -> f32 {
        let left = self.is_swinging(LegId::FrontLeft, now);
        let right = self.is_swinging(LegId::FrontRight, now);
        match (left, right) {
            (true, false) => BODY_SHIFT,
            (false, true) => -BODY_SHIFT,
            _ => 0.0,
        }
    }
}

impl GaitStrategy for CrawlGait {
    fn name(&self) -> &'static str {
        "crawl"
    }

    fn targets(
        &mut self,
        body: Position3,
        state: &mut GaitState,
        now: Instant,
        _current: Option<&LegMap<Position3>>,
    ) -> LegMap<Position3> {
        if now.saturating_duration_since(self.anchor) >= self.cycle() {
            state.just_started = false;
        }

        let shape = state.shape();
        let base = Position3::new(body.x + self.body_shift(now), body.y, body.z);

        LegMap::from_fn(|leg| {
            let leg_phase = self.leg_phase(leg, now);
            if leg_phase < swing_window() {
                square_step(leg_phase * NUM_PHASES as f32, base, &shape)
            } else {
                let progress = (leg_phase - swing_window()) / (1.0 - swing_window());
                stance_push(progress, base, shape.step_length)
            }
        })
    }

    fn swing_legs(&self, now: Instant) -> LegMap<bool> {
        LegMap::from_fn(|leg| self.is_swinging(leg, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(anchor: Instant, secs: f64) -> Instant {
        anchor + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_phase_is_derived_from_elapsed_time() {
        let anchor = Instant::now();
        let gait = CrawlGait::new(anchor);

        assert_eq!(gait.phase_at(anchor), 0.0);
        assert!((gait.phase_at(at(anchor, 1.0)) - 0.25).abs() < 1e-6);
        // One full cycle later the phase repeats
        assert!((gait.phase_at(at(anchor, 5.0)) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_at_most_one_leg_swings() {
        let anchor = Instant::now();
        let gait = CrawlGait::new(anchor);

        for i in 0..4000 {
            let now = at(anchor, i as f64 * 0.001 * 2.0);
            let swinging = gait.swing_legs(now).iter().filter(|(_, s)| **s).count();
            assert!(swinging <= 1, "{} legs swinging at sample {}", swinging, i);
        }
    }

    #[test]
    fn test_each_leg_swings_one_slot_per_cycle() {
        let anchor = Instant::now();
        let gait = CrawlGait::new(anchor);
        let samples = 8000;
        let cycle = gait.cycle().as_secs_f64();

        let mut counts = LegMap::splat(0u32);
        for i in 0..samples {
            let now = at(anchor, cycle * i as f64 / samples as f64);
            for leg in LegId::ALL {
                if gait.is_swinging(leg, now) {
                    counts[leg] += 1;
                }
            }
        }

        let expected = samples / NUM_PHASES;
        for (leg, &count) in counts.iter() {
            assert!(
                count.abs_diff(expected) <= 2,
                "{} swung for {} of {} samples (expected {})",
                leg,
                count,
                samples,
                expected
            );
        }
    }

    #[test]
    fn test_swing_order_follows_offsets() {
        let anchor = Instant::now();
        let gait = CrawlGait::new(anchor);
        // Middle of each slot in turn
        let order = [
            (0.25, LegId::BackLeft),
            (1.25, LegId::FrontLeft),
            (2.25, LegId::BackRight),
            (3.25, LegId::FrontRight),
        ];
        for (secs, leg) in order {
            assert!(gait.is_swinging(leg, at(anchor, secs)), "{} should swing at {}s", leg, secs);
        }
    }

    #[test]
    fn test_body_shift_follows_front_swing() {
        let anchor = Instant::now();
        let gait = CrawlGait::new(anchor);

        assert_eq!(gait.body_shift(at(anchor, 1.25)), BODY_SHIFT);
        assert_eq!(gait.body_shift(at(anchor, 3.25)), -BODY_SHIFT);
        assert_eq!(gait.body_shift(at(anchor, 0.25)), 0.0);
        assert_eq!(gait.body_shift(at(anchor, 2.25)), 0.0);
    }

    #[test]
    fn test_targets_lift_only_the_swinging_leg() {
        let anchor = Instant::now();
        let mut gait = CrawlGait::new(anchor);
        let mut state = GaitState::new();
        state.step_length = 4.0;
        let body = Position3::new(0.0, 0.0, -16.0);

        // BL is a third of the way through its swing: lifting
        let now = at(anchor, 0.1);
        let targets = gait.targets(body, &mut state, now, None);

        assert!(targets[LegId::BackLeft].z > body.z);
        for leg in [LegId::FrontLeft, LegId::FrontRight, LegId::BackRight] {
            assert_eq!(targets[leg].z, body.z, "{} should be planted", leg);
        }
        // First cycle: the lift starts from base y
        assert_eq!(targets[LegId::BackLeft].y, body.y);
    }

    #[test]
    fn test_just_started_clears_after_first_cycle() {
        let anchor = Instant::now();
        let mut gait = CrawlGait::new(anchor);
        let mut state = GaitState::new();
        state.step_length = 4.0;
        let body = Position3::new(0.0, 0.0, -16.0);

        gait.targets(body, &mut state, at(anchor, 3.9), None);
        assert!(state.just_started);

        let targets = gait.targets(body, &mut state, at(anchor, 4.1), None);
        assert!(!state.just_started);
        assert_eq!(targets[LegId::BackLeft].y, body.y - 4.0);
    }

    #[test]
    fn test_stance_pushes_backward() {
        let anchor = Instant::now();
        let mut gait = CrawlGait::new(anchor);
        let mut state = GaitState::new();
        state.step_length = 4.0;
        let body = Position3::new(0.0, 0.0, -16.0);

        // FR is planted for the first six slots; its y should fall steadily
        let early = gait.targets(body, &mut state, at(anchor, 0.1), None);
        let later = gait.targets(body, &mut state, at(anchor, 1.1), None);
        assert!(later[LegId::FrontRight].y < early[LegId::FrontRight].y);
        assert!(early[LegId::FrontRight].y <= body.y + 2.0);
        assert!(later[LegId::FrontRight].y >= body.y - 2.0);
    }
}
