// Control pipeline for one tick
//
// Provides:
// - Stick conditioning and range maps (input)
// - Translate / Rotate / Walk modes with an edge-triggered toggle (mode)
// - Controller: sticks -> pose or stride -> foot targets -> joint angles

pub mod input;
pub mod mode;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::gait::{GaitController, GaitKind};
use crate::interpolation::Interpolator;
use crate::kinematics::{BodyPose, JointAngles, LegId, LegMap, Position3, apply_rotation, solve};
use crate::messages::{GamepadState, JointTelemetry};
use crate::sensor::Orientation;
use input::{BUTTON_MODE_TOGGLE, Sticks, capped_offset};
pub use mode::{BASE_HEIGHT, Mode, ModeCommand, ModeToggle};

/// Fraction of the remaining pose error removed per tick
pub const SMOOTHING_SPEED: f32 = 0.2;

/// Constant centre-of-gravity trim added to every foot target (cm)
pub const COG_TRIM_X: f32 = 0.0;
pub const COG_TRIM_Y: f32 = 2.0;

// Tilt compensation gains and limits
const TILT_PITCH_RATIO: f32 = 0.5;
const TILT_PITCH_CAP: f32 = 3.0;
const TILT_ROLL_RATIO: f32 = 1.0;
const TILT_ROLL_CAP: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub gait: GaitKind,
    pub cog_trim_x: f32,
    pub cog_trim_y: f32,
    /// Shift the feet against measured body tilt while walking
    pub tilt_compensation: bool,
    pub interpolator: Interpolator,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            gait: GaitKind::Crawl,
            cog_trim_x: COG_TRIM_X,
            cog_trim_y: COG_TRIM_Y,
            tilt_compensation: false,
            interpolator: Interpolator::default(),
        }
    }
}

/// Everything computed during one tick
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub mode: Mode,
    pub pose: BodyPose,
    pub targets: LegMap<Position3>,
    /// `None` for a leg that has never had a reachable target
    pub angles: LegMap<Option<JointAngles>>,
    pub swinging: LegMap<bool>,
}

/// Owns all per-session control state
pub struct Controller {
    toggle: ModeToggle,
    gait: GaitController,
    interpolator: Interpolator,
    smoothed: BodyPose,
    cog_trim_x: f32,
    cog_trim_y: f32,
    tilt_compensation: bool,
    last_good: LegMap<Option<JointAngles>>,
}

impl Controller {
    /// Create a controller starting in Translate mode, standing at base height
    pub fn new(config: ControllerConfig, now: Instant) -> Self {
        info!(
            "Controller ready: gait={:?}, cog trim=({}, {}), tilt compensation={}",
            config.gait, config.cog_trim_x, config.cog_trim_y, config.tilt_compensation
        );
        Self {
            toggle: ModeToggle::new(Mode::Translate),
            gait: GaitController::new(config.gait, now),
            interpolator: config.interpolator,
            smoothed: BodyPose::standing(BASE_HEIGHT),
            cog_trim_x: config.cog_trim_x,
            cog_trim_y: config.cog_trim_y,
            tilt_compensation: config.tilt_compensation,
            last_good: LegMap::splat(None),
        }
    }

    pub fn mode(&self) -> Mode {
        self.toggle.mode()
    }

    pub fn gait(&self) -> &GaitController {
        &self.gait
    }

    /// Run one control tick
    pub fn tick(&mut self, pad: &GamepadState, tilt: Option<Orientation>, now: Instant) -> TickOutput {
        if let Some(mode) = self.toggle.update(pad.button(BUTTON_MODE_TOGGLE)) {
            info!("Mode -> {:?}", mode);
        }
        let mode = self.toggle.mode();

        let sticks = Sticks::from_gamepad(pad);
        let command = mode.command(&sticks);
        if let Some(step_length) = command.step_length {
            self.gait.set_step_length(step_length);
        }

        self.smoothed = self.smoothed.approach(&command.pose, SMOOTHING_SPEED);

        let raw_targets = match mode {
            Mode::Walk => self.walk_targets(&command, now),
            Mode::Translate | Mode::Rotate => self.pose_targets(),
        };

        let (trim_x, trim_y) = self.cog_trim(mode, tilt);
        let targets = raw_targets.map(|_, target| target.offset(trim_x, trim_y));

        let angles = self.solve_all(&targets, self.smoothed.pitch, self.smoothed.roll);
        let swinging = match mode {
            Mode::Walk => self.gait.swing_legs(now),
            Mode::Translate | Mode::Rotate => LegMap::splat(false),
        };

        TickOutput {
            mode,
            pose: self.smoothed,
            targets,
            angles,
            swinging,
        }
    }

    /// Angles for the level standing pose, used when stopping
    pub fn neutral(&mut self) -> LegMap<Option<JointAngles>> {
        let stand = BodyPose::standing(BASE_HEIGHT).position();
        let targets = LegMap::splat(stand.offset(self.cog_trim_x, self.cog_trim_y));
        self.solve_all(&targets, 0.0, 0.0)
    }

    /// Telemetry snapshot for a tick's output
    pub fn telemetry(&self, output: &TickOutput) -> JointTelemetry {
        JointTelemetry {
            mode: output.mode,
            gait: self.gait.name(),
            step_length: self.gait.step_length(),
            pose: output.pose,
            angles: output.angles,
            swinging: output.swinging,
        }
    }

    fn walk_targets(&mut self, command: &ModeCommand, now: Instant) -> LegMap<Position3> {
        let body = Position3::new(command.pose.pos_x, command.pose.pos_y, BASE_HEIGHT);
        let raw = self.gait.targets(body, now, self.interpolator.current());
        self.interpolator.update(&raw, now)
    }

    fn pose_targets(&self) -> LegMap<Position3> {
        let foot = self.smoothed.position();
        LegMap::from_fn(|leg| apply_rotation(foot, leg, 0.0, 0.0, self.smoothed.yaw))
    }

    fn cog_trim(&self, mode: Mode, tilt: Option<Orientation>) -> (f32, f32) {
        let mut trim = (self.cog_trim_x, self.cog_trim_y);
        if mode == Mode::Walk && self.tilt_compensation {
            if let Some(tilt) = tilt {
                trim.0 += capped_offset(tilt.roll, TILT_ROLL_RATIO, TILT_ROLL_CAP);
                trim.1 += capped_offset(tilt.pitch, TILT_PITCH_RATIO, TILT_PITCH_CAP);
            }
        }
        trim
    }

    /// IK for every leg; an unreachable target holds that leg's last good angles
    fn solve_all(&mut self, targets: &LegMap<Position3>, pitch: f32, roll: f32) -> LegMap<Option<JointAngles>> {
        LegMap::from_fn(|leg: LegId| match solve(targets[leg], leg, pitch, roll) {
            Ok(angles) => {
                self.last_good[leg] = Some(angles);
                Some(angles)
            }
            Err(e) => {
                warn!("IK rejected, holding last angles: {}", e);
                debug!("{} rejected target: {:?}", leg, targets[leg]);
                self.last_good[leg]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pad(axes: &[(usize, f32)], toggle: bool) -> GamepadState {
        let mut state = GamepadState {
            axes: vec![0.0; 6],
            buttons: vec![false, toggle],
        };
        for &(i, v) in axes {
            state.axes[i] = v;
        }
        state
    }

    fn controller(now: Instant) -> Controller {
        Controller::new(ControllerConfig::default(), now)
    }

    /// Press and release the toggle until `target` is active
    fn switch_to(ctl: &mut Controller, target: Mode, now: Instant) {
        while ctl.mode() != target {
            ctl.tick(&pad(&[], true), None, now);
            ctl.tick(&pad(&[], false), None, now);
        }
    }

    #[test]
    fn test_starts_in_translate_and_cycles() {
        let now = Instant::now();
        let mut ctl = controller(now);
        assert_eq!(ctl.mode(), Mode::Translate);

        assert_eq!(ctl.tick(&pad(&[], true), None, now).mode, Mode::Rotate);
        // Held: no further change
        assert_eq!(ctl.tick(&pad(&[], true), None, now).mode, Mode::Rotate);
        ctl.tick(&pad(&[], false), None, now);
        assert_eq!(ctl.tick(&pad(&[], true), None, now).mode, Mode::Walk);
    }

    #[test]
    fn test_neutral_translate_stands_on_all_legs() {
        let now = Instant::now();
        let mut ctl = controller(now);
        let out = ctl.tick(&pad(&[], false), None, now);

        for leg in LegId::ALL {
            let angles = out.angles[leg].expect("standing pose must be reachable");
            assert!(angles.is_finite());
            assert_eq!(out.targets[leg].y, COG_TRIM_Y);
        }
    }

    #[test]
    fn test_pose_is_smoothed() {
        let now = Instant::now();
        let mut ctl = controller(now);

        // Full right on the right stick: x target is -10 after sign conditioning
        let out = ctl.tick(&pad(&[(3, 1.0)], false), None, now);
        assert!((out.pose.pos_x - (-10.0 * SMOOTHING_SPEED)).abs() < 1e-5);

        let mut last = out.pose.pos_x;
        for _ in 0..50 {
            let out = ctl.tick(&pad(&[(3, 1.0)], false), None, now);
            assert!(out.pose.pos_x <= last);
            last = out.pose.pos_x;
        }
        assert!((last - -10.0).abs() < 0.01);
    }

    #[test]
    fn test_deadzone_matches_centred_sticks_in_every_mode() {
        let now = Instant::now();
        for mode in [Mode::Translate, Mode::Rotate, Mode::Walk] {
            let mut centred = controller(now);
            let mut jittery = controller(now);
            switch_to(&mut centred, mode, now);
            switch_to(&mut jittery, mode, now);

            let noise = [(0, 0.04), (1, -0.049), (3, 0.03), (4, -0.02)];
            let a = centred.tick(&pad(&[], false), None, now);
            let b = jittery.tick(&pad(&noise, false), None, now);

            assert_eq!(a.pose, b.pose, "{:?} pose differs", mode);
            assert_eq!(a.angles, b.angles, "{:?} angles differ", mode);
            assert_eq!(centred.gait().step_length(), 0.0);
            assert_eq!(jittery.gait().step_length(), 0.0);
        }
    }

    #[test]
    fn test_walk_drives_the_gait() {
        let t0 = Instant::now();
        let mut ctl = controller(t0);
        switch_to(&mut ctl, Mode::Walk, t0);

        // Stick forward: full positive stride
        let forward = pad(&[(4, -1.0)], false);
        let mut lifted = false;
        for i in 0..400 {
            let now = t0 + Duration::from_millis(20 * i);
            let out = ctl.tick(&forward, None, now);
            assert_eq!(out.mode, Mode::Walk);
            assert!(out.swinging.iter().filter(|(_, s)| **s).count() <= 1);
            for leg in LegId::ALL {
                assert!(out.angles[leg].is_some(), "{} lost its angles at tick {}", leg, i);
                if out.targets[leg].z > BASE_HEIGHT + 1.0 {
                    lifted = true;
                }
            }
        }
        assert_eq!(ctl.gait().step_length(), 5.0);
        assert!(lifted, "no foot left the ground in 8 seconds of walking");
    }

    #[test]
    fn test_tilt_compensation_only_while_walking() {
        let now = Instant::now();
        let config = ControllerConfig {
            tilt_compensation: true,
            ..ControllerConfig::default()
        };
        let mut ctl = Controller::new(config, now);
        let tilt = Orientation { pitch: 20.0, roll: -1.5 };

        let out = ctl.tick(&pad(&[], false), Some(tilt), now);
        assert_eq!(out.targets[LegId::FrontLeft].y, COG_TRIM_Y);

        assert_eq!(ctl.cog_trim(Mode::Walk, Some(tilt)), (-1.5, COG_TRIM_Y + 3.0));
        assert_eq!(ctl.cog_trim(Mode::Walk, None), (COG_TRIM_X, COG_TRIM_Y));
    }

    #[test]
    fn test_unreachable_target_holds_last_angles() {
        let now = Instant::now();
        let mut ctl = controller(now);
        let good = ctl.neutral();
        assert!(good[LegId::FrontLeft].is_some());

        // Inside the hip radius for the left legs
        let bad = LegMap::splat(Position3::new(6.25, 0.0, -1.0));
        let held = ctl.solve_all(&bad, 0.0, 0.0);
        assert_eq!(held[LegId::FrontLeft], good[LegId::FrontLeft]);
        assert_eq!(held[LegId::BackLeft], good[LegId::BackLeft]);
    }

    #[test]
    fn test_fresh_controller_skips_unreachable_legs() {
        let now = Instant::now();
        let mut ctl = controller(now);
        let bad = LegMap::splat(Position3::new(6.25, 0.0, -1.0));
        let out = ctl.solve_all(&bad, 0.0, 0.0);
        assert_eq!(out[LegId::FrontLeft], None);
    }
}
