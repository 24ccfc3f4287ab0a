// 50 Hz control loop with input watchdog
//
// Each tick: drain the gamepad topic, drain queued IMU samples, run the
// controller, write the servos, publish telemetry and health.
// If teleop goes quiet the sticks read as centred; if it stays quiet the
// runtime stands the robot up level and exits.

use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::Subscriber;
use zenoh::sample::Sample;

use crate::config::{
    CMD_TIMEOUT, Cli, INPUT_LOST_TIMEOUT, INPUT_STARTUP_TIMEOUT, LOOP_HZ, TOPIC_CMD_GAMEPAD, TOPIC_HEALTH,
    TOPIC_RT_JOINTS, TOPIC_SENSOR_IMU,
};
use crate::control::{Controller, ControllerConfig};
use crate::interpolation::Interpolator;
use crate::messages::{GamepadState, ImuSample, RuntimeHealth};
use crate::sensor::{OrientationEstimator, SENSOR_QUEUE_CAPACITY, SampleSender, sample_queue};
use crate::servo::{Calibration, FeetechBus, ServoDriver, ServoOutput, SimulatedServos};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("No gamepad input on {topic} within {waited:?}")]
    InputUnavailable { topic: &'static str, waited: Duration },

    #[error("Gamepad input lost for {silent:?}")]
    InputLost { silent: Duration },
}

/// Tracks the latest gamepad state and how old it is
pub struct Watchdog {
    latest: Option<GamepadState>,
    received_at: Option<Instant>,
    health: RuntimeHealth,
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            latest: None,
            received_at: None,
            health: RuntimeHealth::CmdStale, // Start stale until first input
        }
    }

    pub fn on_input(&mut self, pad: GamepadState, now: Instant) {
        self.latest = Some(pad);
        self.received_at = Some(now);
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Input to act on this tick; centred sticks once the latest is stale
    pub fn current_input(&mut self, now: Instant) -> GamepadState {
        let fresh = match (&self.latest, self.received_at) {
            (Some(pad), Some(at)) if now.saturating_duration_since(at) <= CMD_TIMEOUT => Some(pad.clone()),
            _ => None,
        };

        match fresh {
            Some(pad) => {
                if self.health != RuntimeHealth::Ok {
                    info!("Gamepad input fresh");
                }
                self.health = RuntimeHealth::Ok;
                pad
            }
            None => {
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Gamepad input stale, centring sticks");
                }
                self.health = RuntimeHealth::CmdStale;
                GamepadState::default()
            }
        }
    }

    /// How long input has been silent, if past the lost threshold
    pub fn input_lost(&self, now: Instant) -> Option<Duration> {
        let silent = now.saturating_duration_since(self.received_at?);
        (silent > INPUT_LOST_TIMEOUT).then_some(silent)
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_gamepad(sample: &Sample) -> Option<GamepadState> {
    let payload = sample.payload().to_bytes();
    match serde_json::from_slice::<GamepadState>(&payload) {
        Ok(pad) => Some(pad),
        Err(e) => {
            warn!("Failed to parse gamepad state: {}", e);
            None
        }
    }
}

/// Block until the first valid gamepad message arrives
async fn first_gamepad(sub: &Subscriber<FifoChannelHandler<Sample>>) -> Result<GamepadState, BoxError> {
    loop {
        let sample = sub.recv_async().await?;
        if let Some(pad) = parse_gamepad(&sample) {
            return Ok(pad);
        }
    }
}

/// Forward IMU samples into the control queue until the subscriber closes
async fn forward_imu(sub: Subscriber<FifoChannelHandler<Sample>>, tx: SampleSender) {
    while let Ok(sample) = sub.recv_async().await {
        let payload = sample.payload().to_bytes();
        match serde_json::from_slice::<ImuSample>(&payload) {
            Ok(imu) => tx.push(imu),
            Err(e) => warn!("Failed to parse IMU sample: {}", e),
        }
    }
}

fn open_servos(cli: &Cli) -> Result<ServoDriver<Box<dyn ServoOutput>>, BoxError> {
    let calibration = match &cli.offsets {
        Some(path) => Calibration::load(path)?,
        None => Calibration::default(),
    };

    let output: Box<dyn ServoOutput> = if cli.dry_run {
        info!("Dry run: servo writes are simulated");
        Box::new(SimulatedServos::new())
    } else {
        Box::new(FeetechBus::open(&cli.servo_port)?)
    };

    let mut driver = ServoDriver::new(output, calibration);
    driver.initialize()?;
    Ok(driver)
}

pub async fn run(cli: Cli) -> Result<(), BoxError> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let gamepad_sub = session.declare_subscriber(TOPIC_CMD_GAMEPAD).await?;
    let imu_sub = session.declare_subscriber(TOPIC_SENSOR_IMU).await?;
    let pub_joints = session.declare_publisher(TOPIC_RT_JOINTS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let (imu_tx, mut imu_rx) = sample_queue(SENSOR_QUEUE_CAPACITY);
    let imu_task = tokio::spawn(forward_imu(imu_sub, imu_tx));

    info!("Waiting for gamepad on {}...", TOPIC_CMD_GAMEPAD);
    let first = tokio::time::timeout(INPUT_STARTUP_TIMEOUT, first_gamepad(&gamepad_sub))
        .await
        .map_err(|_| RuntimeError::InputUnavailable {
            topic: TOPIC_CMD_GAMEPAD,
            waited: INPUT_STARTUP_TIMEOUT,
        })??;

    let mut watchdog = Watchdog::new();
    watchdog.on_input(first, Instant::now());

    // Servos are powered only once teleop is known to be up
    let mut servos = match open_servos(&cli) {
        Ok(servos) => servos,
        Err(e) => {
            imu_task.abort();
            return Err(e);
        }
    };

    let config = ControllerConfig {
        gait: cli.gait,
        cog_trim_x: cli.cog_x,
        cog_trim_y: cli.cog_y,
        tilt_compensation: cli.tilt_compensation,
        interpolator: Interpolator::default(),
    };
    let mut controller = Controller::new(config, Instant::now());
    let mut estimator = OrientationEstimator::new();

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_GAMEPAD, TOPIC_SENSOR_IMU);
    info!("Publishing to: {}, {}", TOPIC_RT_JOINTS, TOPIC_HEALTH);

    let outcome = loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, stopping");
                break Ok(());
            }
        }
        let now = Instant::now();

        // 1. Drain pending gamepad messages, keep latest
        while let Ok(Some(sample)) = gamepad_sub.try_recv() {
            if let Some(pad) = parse_gamepad(&sample) {
                watchdog.on_input(pad, now);
            }
        }
        if let Some(silent) = watchdog.input_lost(now) {
            warn!("No gamepad input for {:?}, stopping", silent);
            break Err(RuntimeError::InputLost { silent });
        }
        let pad = watchdog.current_input(now);

        // 2. Fold in orientation samples
        estimator.ingest(&imu_rx.drain(), now);
        let tilt = estimator.estimate(now);

        // 3. Control and actuate
        let output = controller.tick(&pad, tilt, now);
        servos.apply(&output.angles);

        // 4. Publish telemetry and health
        let joints_json = serde_json::to_string(&controller.telemetry(&output))?;
        if let Err(e) = pub_joints.put(joints_json).await {
            warn!("Failed to publish joints: {}", e);
        }
        let health_json = serde_json::to_string(&watchdog.health())?;
        if let Err(e) = pub_health.put(health_json).await {
            warn!("Failed to publish health: {}", e);
        }
    };

    info!("Commanding neutral stance");
    let written = servos.apply(&controller.neutral());
    info!("Neutral stance written to {} joints", written);
    if imu_rx.dropped() > 0 {
        info!("{} IMU samples dropped this session", imu_rx.dropped());
    }
    imu_task.abort();

    outcome.map_err(Into::into)
}
