// Simulated servo backend for dry runs and tests

use std::collections::BTreeMap;

use tracing::debug;

use super::{ServoError, ServoOutput};

/// Remembers the last angle written to each channel
#[derive(Debug, Default)]
pub struct SimulatedServos {
    angles: BTreeMap<u8, f32>,
}

impl SimulatedServos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn angle(&self, channel: u8) -> Option<f32> {
        self.angles.get(&channel).copied()
    }
}

impl ServoOutput for SimulatedServos {
    fn write_angle(&mut self, channel: u8, angle: f32) -> Result<(), ServoError> {
        debug!("sim servo {} -> {:.2}", channel, angle);
        self.angles.insert(channel, angle);
        Ok(())
    }

    fn release(&mut self, channels: &[u8]) -> Result<(), ServoError> {
        for channel in channels {
            self.angles.remove(channel);
        }
        Ok(())
    }
}
