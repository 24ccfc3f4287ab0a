// Timeouts, topics, servo configuration and command-line options
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::control::{COG_TRIM_X, COG_TRIM_Y};
use crate::gait::GaitKind;

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Gamepad older than this is treated as centred sticks
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// How long to wait for the first gamepad message at startup
pub const INPUT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

// Gamepad silent for this long stops the runtime
pub const INPUT_LOST_TIMEOUT: Duration = Duration::from_secs(5);

// Zenoh topics
pub const TOPIC_CMD_GAMEPAD: &str = "quadruped/cmd/gamepad"; // teleop input
pub const TOPIC_SENSOR_IMU: &str = "quadruped/sensor/imu"; // orientation samples
pub const TOPIC_RT_JOINTS: &str = "quadruped/rt/joints"; // commanded joints
pub const TOPIC_HEALTH: &str = "quadruped/state/health"; // health status

// Serial port for the Feetech leg servo bus
pub const SERVO_PORT: &str = "/dev/ttyACM0";

#[derive(Debug, Clone, Parser)]
#[command(name = "quadruped-control", about = "Gamepad-driven quadruped leg controller")]
pub struct Cli {
    /// Serial port of the servo bus
    #[arg(long, default_value = SERVO_PORT)]
    pub servo_port: String,

    /// Run without hardware, logging servo writes instead
    #[arg(long)]
    pub dry_run: bool,

    /// JSON table of per-channel angle offsets
    #[arg(long, value_name = "JSON")]
    pub offsets: Option<PathBuf>,

    /// Gait used in walk mode
    #[arg(long, value_enum, default_value_t = GaitKind::Crawl)]
    pub gait: GaitKind,

    /// Shift the feet against measured body tilt while walking
    #[arg(long)]
    pub tilt_compensation: bool,

    /// Centre-of-gravity trim along x (cm)
    #[arg(long, default_value_t = COG_TRIM_X, allow_hyphen_values = true)]
    pub cog_x: f32,

    /// Centre-of-gravity trim along y (cm)
    #[arg(long, default_value_t = COG_TRIM_Y, allow_hyphen_values = true)]
    pub cog_y: f32,
}
