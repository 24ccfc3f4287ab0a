// Servo output for the twelve leg joints
//
// Provides:
// - ServoOutput: the backend seam (hardware bus or simulation)
// - Feetech STS serial protocol in position mode
// - Per-channel calibration offsets
// - ServoDriver: channel map, offset, clamp and failure isolation

pub mod calibration;
mod driver;
pub mod feetech;
pub mod sim;

pub use calibration::{Calibration, CalibrationError};
pub use driver::{ALL_CHANNELS, ANGLE_MAX, ANGLE_MIN, ServoDriver, channel};
pub use feetech::{FeetechBus, FeetechError};
pub use sim::SimulatedServos;

#[derive(Debug, thiserror::Error)]
pub enum ServoError {
    #[error("Servo bus error: {0}")]
    Bus(#[from] FeetechError),

    #[error("Servo on channel {channel} is not responding")]
    Disconnected { channel: u8 },
}

/// A sink for joint angles, one channel per servo
pub trait ServoOutput: Send {
    /// Command `channel` to `angle` degrees (already calibrated and clamped)
    fn write_angle(&mut self, channel: u8, angle: f32) -> Result<(), ServoError>;

    /// Bring the given channels up before the first write
    fn prepare(&mut self, _channels: &[u8]) -> Result<(), ServoError> {
        Ok(())
    }

    /// Let the given channels go limp
    fn release(&mut self, _channels: &[u8]) -> Result<(), ServoError> {
        Ok(())
    }
}

impl<T: ServoOutput + ?Sized> ServoOutput for Box<T> {
    fn write_angle(&mut self, channel: u8, angle: f32) -> Result<(), ServoError> {
        (**self).write_angle(channel, angle)
    }

    fn prepare(&mut self, channels: &[u8]) -> Result<(), ServoError> {
        (**self).prepare(channels)
    }

    fn release(&mut self, channels: &[u8]) -> Result<(), ServoError> {
        (**self).release(channels)
    }
}
