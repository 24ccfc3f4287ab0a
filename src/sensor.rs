// Orientation sensing: IMU sample hand-off and pitch/roll estimation.
//
// Samples arrive on their own task at whatever rate the sensor runs. They are
// handed to the control task through a bounded queue that drops the oldest
// sample when full. The control task drains it without blocking once per tick.

use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::messages::ImuSample;

/// Queue depth between the sensor task and the control task
pub const SENSOR_QUEUE_CAPACITY: usize = 128;

/// Low-pass weight of a new tick's average (0 = frozen, 1 = unfiltered)
pub const EMA_ALPHA: f32 = 0.15;

/// Estimates older than this are ignored
pub const SENSOR_STALE_AFTER: Duration = Duration::from_millis(500);

/// Body tilt in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub roll: f32,
}

/// Pitch/roll from a unit quaternion (w, x, y, z)
pub fn quat_to_pitch_roll(w: f32, x: f32, y: f32, z: f32) -> Orientation {
    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
    Orientation {
        pitch: sin_pitch.asin().to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Pitch/roll from the gravity direction of an accelerometer reading
pub fn accel_to_pitch_roll(x: f32, y: f32, z: f32) -> Orientation {
    Orientation {
        pitch: x.atan2((y * y + z * z).sqrt()).to_degrees(),
        roll: y.atan2((x * x + z * z).sqrt()).to_degrees(),
    }
}

impl From<&ImuSample> for Orientation {
    fn from(sample: &ImuSample) -> Self {
        match *sample {
            ImuSample::Quaternion { w, x, y, z } => quat_to_pitch_roll(w, x, y, z),
            ImuSample::Accel { x, y, z } => accel_to_pitch_roll(x, y, z),
        }
    }
}

/// Remove a +-360 jump relative to the previous angle
pub fn unwrap_angle(angle: f32, last: Option<f32>) -> f32 {
    let Some(last) = last else {
        return angle;
    };
    let delta = angle - last;
    if delta > 180.0 {
        angle - 360.0
    } else if delta < -180.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Map any angle into [-180, 180)
pub fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Producer half of the sample queue
#[derive(Clone)]
pub struct SampleSender {
    tx: broadcast::Sender<ImuSample>,
}

impl SampleSender {
    /// Queue a sample; overwrites the oldest one when the queue is full
    pub fn push(&self, sample: ImuSample) {
        // Fails only when the control task is gone
        if self.tx.send(sample).is_err() {
            debug!("Dropping IMU sample: no consumer");
        }
    }
}

/// Consumer half of the sample queue
pub struct SampleReceiver {
    rx: broadcast::Receiver<ImuSample>,
    dropped: u64,
}

impl SampleReceiver {
    /// Take every queued sample without waiting
    pub fn drain(&mut self) -> Vec<ImuSample> {
        let mut samples = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(sample) => samples.push(sample),
                Err(TryRecvError::Lagged(missed)) => {
                    self.dropped += missed;
                    warn!("IMU queue overflow, dropped {} oldest samples", missed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        samples
    }

    /// Total samples lost to overflow
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Bounded drop-oldest queue for IMU samples
pub fn sample_queue(capacity: usize) -> (SampleSender, SampleReceiver) {
    let (tx, rx) = broadcast::channel(capacity);
    (SampleSender { tx }, SampleReceiver { rx, dropped: 0 })
}

/// Averages each tick's samples and low-pass filters the result
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    alpha: f32,
    last_raw: Option<Orientation>,
    filtered: Option<Orientation>,
    updated_at: Option<Instant>,
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self::with_alpha(EMA_ALPHA)
    }

    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            last_raw: None,
            filtered: None,
            updated_at: None,
        }
    }

    /// Fold in the samples drained this tick; an empty batch changes nothing
    pub fn ingest(&mut self, samples: &[ImuSample], now: Instant) {
        if samples.is_empty() {
            return;
        }

        let mut sum = Orientation::default();
        for sample in samples {
            let raw = Orientation::from(sample);
            let pitch = unwrap_angle(raw.pitch, self.last_raw.map(|o| o.pitch));
            let roll = unwrap_angle(raw.roll, self.last_raw.map(|o| o.roll));
            self.last_raw = Some(Orientation { pitch, roll });
            sum.pitch += pitch;
            sum.roll += roll;
        }
        let count = samples.len() as f32;
        let average = Orientation {
            pitch: sum.pitch / count,
            roll: sum.roll / count,
        };

        self.filtered = Some(match self.filtered {
            None => average,
            Some(prev) => Orientation {
                pitch: (1.0 - self.alpha) * prev.pitch + self.alpha * average.pitch,
                roll: (1.0 - self.alpha) * prev.roll + self.alpha * average.roll,
            },
        });
        self.updated_at = Some(now);
    }

    /// Current estimate, or `None` if nothing fresh has arrived
    pub fn estimate(&self, now: Instant) -> Option<Orientation> {
        let updated_at = self.updated_at?;
        if now.saturating_duration_since(updated_at) > SENSOR_STALE_AFTER {
            return None;
        }
        self.filtered.map(|o| Orientation {
            pitch: wrap_degrees(o.pitch),
            roll: wrap_degrees(o.roll),
        })
    }
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new()
    }
}
