// Whole-body rotation of a foot target about the body centre.

use super::ik::{BODY_LENGTH, BODY_WIDTH};
use super::leg::{LegId, Position3};

/// Rotate a foot target by a body pitch/roll/yaw (degrees)
///
/// Pitch and roll become a vertical shift proportional to the leg's lever arm
/// from the body centre. Yaw rotates the (x, y) target about the centre.
pub fn apply_rotation(foot: Position3, leg: LegId, pitch: f32, roll: f32, yaw: f32) -> Position3 {
    let dx = if leg.is_front() {
        -BODY_LENGTH / 2.0
    } else {
        BODY_LENGTH / 2.0
    };
    let dy = if leg.is_left() {
        BODY_WIDTH / 2.0
    } else {
        -BODY_WIDTH / 2.0
    };

    let dz = dx * pitch.to_radians().tan() + dy * roll.to_radians().tan();

    let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
    Position3 {
        x: foot.x * cos_yaw - foot.y * sin_yaw,
        y: foot.x * sin_yaw + foot.y * cos_yaw,
        z: foot.z + dz,
    }
}
