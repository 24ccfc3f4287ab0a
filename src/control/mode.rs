// Operating modes and their stick-to-command handlers.

use serde::Serialize;

use super::input::{Sticks, map_range, map_split};
use crate::gait::{STEP_LENGTH_MAX, STEP_LENGTH_MIN};
use crate::kinematics::BodyPose;

/// Standing height used by Rotate and Walk (cm)
pub const BASE_HEIGHT: f32 = -16.0;

// Translate limits (cm)
pub const X_MIN: f32 = -10.0;
pub const X_MAX: f32 = 10.0;
pub const Y_MIN: f32 = -10.0;
pub const Y_MAX: f32 = 10.0;
pub const Z_MIN: f32 = -22.0;
pub const Z_MAX: f32 = -11.0;

// Rotate limits (degrees)
pub const PITCH_MIN: f32 = -10.0;
pub const PITCH_MAX: f32 = 20.0;
pub const ROLL_MIN: f32 = -20.0;
pub const ROLL_MAX: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Sticks move the body in x, y, z
    Translate,
    /// Sticks tilt the body in pitch and roll
    Rotate,
    /// Stick sets the stride of the active gait
    Walk,
}

/// What a mode asks of the rest of the pipeline this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeCommand {
    pub pose: BodyPose,
    /// Present only in Walk
    pub step_length: Option<f32>,
}

impl Mode {
    /// Next mode in the toggle cycle
    pub fn next(self) -> Mode {
        match self {
            Mode::Translate => Mode::Rotate,
            Mode::Rotate => Mode::Walk,
            Mode::Walk => Mode::Translate,
        }
    }

    pub fn command(self, sticks: &Sticks) -> ModeCommand {
        match self {
            Mode::Translate => handle_translate(sticks),
            Mode::Rotate => handle_rotate(sticks),
            Mode::Walk => handle_walk(sticks),
        }
    }
}

fn handle_translate(sticks: &Sticks) -> ModeCommand {
    let pose = BodyPose {
        pos_x: map_range(sticks.rx, -1.0, 1.0, X_MIN, X_MAX),
        pos_y: map_range(sticks.ry, -1.0, 1.0, Y_MIN, Y_MAX),
        pos_z: map_range(-sticks.ly, -1.0, 1.0, Z_MIN, Z_MAX),
        ..BodyPose::default()
    };
    ModeCommand {
        pose,
        step_length: None,
    }
}

fn handle_rotate(sticks: &Sticks) -> ModeCommand {
    let pose = BodyPose {
        pitch: map_split(sticks.ry, PITCH_MIN, PITCH_MAX),
        roll: -map_range(sticks.lx, -1.0, 1.0, ROLL_MIN, ROLL_MAX),
        ..BodyPose::standing(BASE_HEIGHT)
    };
    ModeCommand {
        pose,
        step_length: None,
    }
}

fn handle_walk(sticks: &Sticks) -> ModeCommand {
    let step_length = -map_range(sticks.ry, -1.0, 1.0, STEP_LENGTH_MIN, STEP_LENGTH_MAX);
    ModeCommand {
        pose: BodyPose::standing(BASE_HEIGHT),
        step_length: Some(step_length),
    }
}

/// Edge-triggered mode cycling; a held button changes the mode once
#[derive(Debug, Clone)]
pub struct ModeToggle {
    mode: Mode,
    ready: bool,
}

impl ModeToggle {
    pub fn new(mode: Mode) -> Self {
        Self { mode, ready: true }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feed the button state; returns the new mode on a press edge
    pub fn update(&mut self, pressed: bool) -> Option<Mode> {
        if !pressed {
            self.ready = true;
            return None;
        }
        if !self.ready {
            return None;
        }
        self.ready = false;
        self.mode = self.mode.next();
        Some(self.mode)
    }
}
