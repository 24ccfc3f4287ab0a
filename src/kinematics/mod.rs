// Leg kinematics for the quadruped
//
// Provides:
// - Leg identifiers and body-frame data types
// - Analytic 3-DOF inverse kinematics
// - Whole-body rotation of foot targets

pub mod ik;
mod leg;
pub mod rotation;

pub use ik::{IkError, solve};
pub use leg::{BodyPose, Joint, JointAngles, LegId, LegMap, Position3};
pub use rotation::apply_rotation;
