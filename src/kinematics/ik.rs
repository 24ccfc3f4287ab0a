// Analytic inverse kinematics for the 3-DOF leg (hip, thigh, shin).
//
// Coordinates are centimetres in the body frame, angles are degrees in the
// servo convention (0..180, 90 = horn centred).

use thiserror::Error;

use super::leg::{JointAngles, LegId, Position3};

/// Lateral bias between the caller's x origin and the hip pivot (cm).
/// Every caller is calibrated against this value.
pub const HIP_X_BIAS: f32 = 6.25;

/// Perpendicular distance from the hip axis to the thigh plane (cm)
pub const HIP_OFFSET: f32 = 6.2;

/// Link lengths (cm)
pub const THIGH_LENGTH: f32 = 10.5;
pub const SHIN_LENGTH: f32 = 13.0;

/// Lever arms used to turn body pitch/roll into per-foot height changes (cm)
pub const BODY_LENGTH: f32 = 29.5;
pub const BODY_WIDTH: f32 = 8.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IkError {
    /// The foot lies inside the circle swept by the hip offset; no hip angle reaches it
    #[error("{leg} target is inside the hip radius ({radius:.2} cm from the hip axis)")]
    InsideHipRadius { leg: LegId, radius: f32 },

    #[error("{leg} solution is not finite: {angles:?}")]
    NonFinite { leg: LegId, angles: JointAngles },
}

/// Solve joint angles for one leg
///
/// # Arguments
/// * `target` - Foot position in the body frame (cm)
/// * `leg` - Which leg; selects mirroring and pitch/roll lever signs
/// * `pitch` - Body pitch in degrees (positive = nose up)
/// * `roll` - Body roll in degrees
///
/// An out-of-reach foot distance is clamped to the nearest reachable shin
/// angle. A target inside the hip radius is rejected with
/// [`IkError::InsideHipRadius`].
pub fn solve(target: Position3, leg: LegId, pitch: f32, roll: f32) -> Result<JointAngles, IkError> {
    let Position3 { mut x, y, z } = target;

    // Left leg frames face the opposite way
    if leg.is_left() {
        x = -x;
    }
    x += HIP_X_BIAS;

    let pitch_offset = leg.pitch_multiplier() * BODY_LENGTH * pitch.to_radians().tan();
    let roll_offset = leg.roll_multiplier() * BODY_WIDTH * roll.to_radians().tan();

    // Positive-down from here on
    let z = -(z + pitch_offset + roll_offset);

    // Hip: project out the hip offset to get the thigh-plane distance d
    let radicand = x * x + z * z - HIP_OFFSET * HIP_OFFSET;
    if radicand < 0.0 {
        return Err(IkError::InsideHipRadius {
            leg,
            radius: (x * x + z * z).sqrt(),
        });
    }
    let d = radicand.sqrt();
    let hip = ((x / z).atan() + (d / HIP_OFFSET).atan()).to_degrees();

    // Thigh/shin: planar two-link problem in the (d, y) plane
    let g = (d * d + y * y).sqrt();
    let cos_shin = (THIGH_LENGTH * THIGH_LENGTH + SHIN_LENGTH * SHIN_LENGTH - g * g)
        / (2.0 * THIGH_LENGTH * SHIN_LENGTH);
    let shin = cos_shin.clamp(-1.0, 1.0).acos();
    let thigh = (-y / d).atan() + (SHIN_LENGTH * shin.sin() / g).asin();

    let mut angles = JointAngles {
        hip,
        thigh: 90.0 - thigh.to_degrees() + pitch,
        shin: 180.0 - (shin.to_degrees() - 45.0),
    };

    if leg.is_left() {
        angles.hip += roll;
    } else {
        angles.hip -= roll;
    }

    // Right-side horns are mounted mirrored
    if !leg.is_left() {
        angles = JointAngles {
            hip: 180.0 - angles.hip,
            thigh: 180.0 - angles.thigh,
            shin: 180.0 - angles.shin,
        };
    }

    if !angles.is_finite() {
        return Err(IkError::NonFinite { leg, angles });
    }
    Ok(angles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32, what: &str) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "{what}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_golden_front_left_stance() {
        let angles = solve(Position3::new(0.0, 0.0, -16.0), LegId::FrontLeft, 0.0, 0.0).unwrap();
        println!("FL (0, 0, -16): {:?}", angles);

        assert_close(angles.hip, 90.17894, "hip");
        assert_close(angles.thigh, 36.02878, "thigh");
        assert_close(angles.shin, 139.75439, "shin");
    }

    #[test]
    fn test_golden_case_is_bit_reproducible() {
        let target = Position3::new(0.0, 0.0, -16.0);
        let first = solve(target, LegId::FrontLeft, 0.0, 0.0).unwrap();
        for _ in 0..100 {
            let again = solve(target, LegId::FrontLeft, 0.0, 0.0).unwrap();
            assert_eq!(first.hip.to_bits(), again.hip.to_bits());
            assert_eq!(first.thigh.to_bits(), again.thigh.to_bits());
            assert_eq!(first.shin.to_bits(), again.shin.to_bits());
        }
    }

    #[test]
    fn test_pitch_and_roll_compensation() {
        let angles = solve(Position3::new(0.0, 3.0, -14.0), LegId::BackLeft, 5.0, -3.0).unwrap();
        println!("BL (0, 3, -14) pitch=5 roll=-3: {:?}", angles);

        assert_close(angles.hip, 87.18470, "hip");
        assert_close(angles.thigh, 51.09265, "thigh");
        assert_close(angles.shin, 141.17697, "shin");
    }

    #[test]
    fn test_neutral_x_points_hip_straight_down() {
        // Internal x is zero when the bias is cancelled: +6.25 on the left, -6.25 on the right
        let z: f32 = -16.0;
        let d = (z * z - HIP_OFFSET * HIP_OFFSET).sqrt();
        let straight_down = (d / HIP_OFFSET).atan().to_degrees();

        for leg in LegId::ALL {
            let x = if leg.is_left() { HIP_X_BIAS } else { -HIP_X_BIAS };
            let angles = solve(Position3::new(x, 0.0, z), leg, 0.0, 0.0).unwrap();
            let expected = if leg.is_left() { straight_down } else { 180.0 - straight_down };
            assert_close(angles.hip, expected, leg.code());
        }
    }

    #[test]
    fn test_left_right_mirror_law() {
        let cases = [
            (0.0, 0.0, -16.0, 0.0, 0.0),
            (1.5, -2.0, -18.0, 4.0, 0.0),
            (-3.0, 4.0, -13.0, -7.5, 0.0),
            (2.0, 1.0, -20.0, 12.0, 0.0),
            (1.5, -2.0, -18.0, 4.0, 7.0),
            (-1.0, 2.5, -15.0, -3.0, -12.0),
            (0.5, 0.0, -17.0, 0.0, 20.0),
        ];

        // The right side sees the roll from the opposite direction
        for (x, y, z, pitch, roll) in cases {
            for (left, right) in [
                (LegId::FrontLeft, LegId::FrontRight),
                (LegId::BackLeft, LegId::BackRight),
            ] {
                let l = solve(Position3::new(x, y, z), left, pitch, roll).unwrap();
                let r = solve(Position3::new(-x, y, z), right, pitch, -roll).unwrap();
                println!("{left} {:?} / {right} {:?} at roll {roll}", l, r);

                assert_eq!(r.thigh, 180.0 - l.thigh, "thigh mirror for {left}/{right}, roll {roll}");
                assert_eq!(r.shin, 180.0 - l.shin, "shin mirror for {left}/{right}, roll {roll}");
                assert_eq!(r.hip, 180.0 - l.hip, "hip mirror for {left}/{right}, roll {roll}");
            }
        }
    }

    #[test]
    fn test_unreachable_foot_is_clamped() {
        // Far beyond thigh + shin: the shin straightens out instead of failing
        let angles = solve(Position3::new(0.0, 0.0, -40.0), LegId::FrontLeft, 0.0, 0.0).unwrap();
        println!("FL (0, 0, -40): {:?}", angles);

        assert_close(angles.shin, 45.0, "shin");
        assert_close(angles.thigh, 90.0, "thigh");
        assert!(angles.is_finite());
    }

    #[test]
    fn test_inside_hip_radius_is_rejected() {
        // Internal x = 0 and a foot only 2 cm below the hip
        let result = solve(Position3::new(HIP_X_BIAS, 0.0, -2.0), LegId::FrontLeft, 0.0, 0.0);
        match result {
            Err(IkError::InsideHipRadius { leg, radius }) => {
                assert_eq!(leg, LegId::FrontLeft);
                assert!(radius < HIP_OFFSET);
            }
            other => panic!("expected InsideHipRadius, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_target_is_not_finite() {
        // Exactly on the hip circle with no fore/aft offset: g = 0
        let result = solve(Position3::new(HIP_X_BIAS, 0.0, -HIP_OFFSET), LegId::FrontLeft, 0.0, 0.0);
        assert!(
            matches!(result, Err(IkError::NonFinite { .. }) | Err(IkError::InsideHipRadius { .. })),
            "degenerate target must not produce angles: {:?}",
            result
        );
    }
}
