// High-level servo driver for the four legs
//
// Maps (leg, joint) to a servo channel, applies the calibration offset,
// clamps to the servo range and writes through the backend. A failed write
// is logged and the remaining joints are still written.

use tracing::{debug, info, warn};

use super::calibration::Calibration;
use super::{ServoError, ServoOutput};
use crate::kinematics::{Joint, JointAngles, LegId, LegMap};

/// Servo travel limits (degrees)
pub const ANGLE_MIN: f32 = 0.0;
pub const ANGLE_MAX: f32 = 180.0;

/// Every channel in use, leg by leg in hip/thigh/shin order
pub const ALL_CHANNELS: [u8; 12] = [8, 9, 10, 12, 13, 14, 4, 5, 6, 0, 1, 2];

/// Servo channel driving `joint` of `leg`
pub fn channel(leg: LegId, joint: Joint) -> u8 {
    let hip = match leg {
        LegId::FrontLeft => 8,
        LegId::FrontRight => 12,
        LegId::BackLeft => 4,
        LegId::BackRight => 0,
    };
    match joint {
        Joint::Hip => hip,
        Joint::Thigh => hip + 1,
        Joint::Shin => hip + 2,
    }
}

pub struct ServoDriver<O: ServoOutput> {
    output: O,
    calibration: Calibration,
}

impl<O: ServoOutput> ServoDriver<O> {
    pub fn new(output: O, calibration: Calibration) -> Self {
        Self { output, calibration }
    }

    /// Bring every leg servo up; must succeed before walking
    ///
    /// On failure, servos that were already powered are released again.
    pub fn initialize(&mut self) -> Result<(), ServoError> {
        info!("Initializing {} leg servos", ALL_CHANNELS.len());
        if let Err(e) = self.output.prepare(&ALL_CHANNELS) {
            warn!("Servo initialization failed: {}", e);
            if let Err(release_err) = self.release() {
                warn!("Failed to release servos: {}", release_err);
            }
            return Err(e);
        }
        info!("Servos initialized successfully");
        Ok(())
    }

    /// Write one joint; returns false if the write did not happen
    pub fn set_joint(&mut self, channel: u8, angle: f32) -> bool {
        if !angle.is_finite() {
            warn!("Skipping non-finite angle {} for channel {}", angle, channel);
            return false;
        }
        let command = (angle + self.calibration.offset(channel)).clamp(ANGLE_MIN, ANGLE_MAX);
        match self.output.write_angle(channel, command) {
            Ok(()) => true,
            Err(e) => {
                warn!("Servo write failed on channel {}: {}", channel, e);
                false
            }
        }
    }

    /// Write every leg that has angles; returns how many joints were written
    pub fn apply(&mut self, angles: &LegMap<Option<JointAngles>>) -> usize {
        let mut written = 0;
        for (leg, leg_angles) in angles.iter() {
            let Some(leg_angles) = leg_angles else {
                debug!("No angles for {}, leaving servos as they are", leg);
                continue;
            };
            for joint in Joint::ALL {
                if self.set_joint(channel(leg, joint), leg_angles.get(joint)) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Disable holding torque on every leg servo
    pub fn release(&mut self) -> Result<(), ServoError> {
        info!("Releasing leg servos");
        self.output.release(&ALL_CHANNELS)
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
