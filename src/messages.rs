// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::control::Mode;
use crate::kinematics::{BodyPose, JointAngles, LegMap};

// Gamepad snapshot from the teleop side -> runtime
// Axes are normalised to [-1, 1], buttons are pressed = true
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadState {
    #[serde(default)]
    pub axes: Vec<f32>,
    #[serde(default)]
    pub buttons: Vec<bool>,
}

impl GamepadState {
    /// Axis value, 0 when missing or not a number
    pub fn axis(&self, index: usize) -> f32 {
        match self.axes.get(index) {
            Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Orientation sample from the IMU publisher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImuSample {
    /// Game rotation vector (unit quaternion)
    Quaternion { w: f32, x: f32, y: f32, z: f32 },
    /// Raw accelerometer reading, any unit
    Accel { x: f32, y: f32, z: f32 },
}

// Commanded joint state published every tick
#[derive(Debug, Clone, Serialize)]
pub struct JointTelemetry {
    pub mode: Mode,
    pub gait: &'static str,
    pub step_length: f32,
    pub pose: BodyPose,
    pub angles: LegMap<Option<JointAngles>>,
    pub swinging: LegMap<bool>,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
