// Stick conditioning: axis layout, deadzone and range maps.

use crate::messages::GamepadState;

/// Axis values with a smaller magnitude read as exactly zero
pub const DEADZONE: f32 = 0.05;

// Axis/button layout of the gamepad
pub const AXIS_LEFT_X: usize = 0;
pub const AXIS_LEFT_Y: usize = 1;
pub const AXIS_RIGHT_X: usize = 3;
pub const AXIS_RIGHT_Y: usize = 4;
pub const BUTTON_MODE_TOGGLE: usize = 1;

pub fn apply_deadzone(value: f32) -> f32 {
    if value.abs() < DEADZONE { 0.0 } else { value }
}

/// Linearly map `value` from [in_min, in_max] to [out_min, out_max]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Map [-1, 0] onto [neg_min, 0] and [0, 1] onto [0, pos_max]
///
/// Lets the two stick directions cover ranges of different size.
pub fn map_split(value: f32, neg_min: f32, pos_max: f32) -> f32 {
    if value < 0.0 {
        neg_min + (value + 1.0) * (0.0 - neg_min)
    } else {
        value * pos_max
    }
}

/// Scale an angle into an offset, saturating at `cap`
pub fn capped_offset(angle: f32, ratio: f32, cap: f32) -> f32 {
    (angle * ratio).clamp(-cap, cap)
}

/// Stick positions after sign conditioning and deadzone
///
/// Up/right read positive on `ly` and `rx`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sticks {
    pub lx: f32,
    pub ly: f32,
    pub rx: f32,
    pub ry: f32,
}

impl Sticks {
    pub fn from_gamepad(pad: &GamepadState) -> Self {
        Self {
            lx: apply_deadzone(pad.axis(AXIS_LEFT_X)),
            ly: apply_deadzone(-pad.axis(AXIS_LEFT_Y)),
            rx: apply_deadzone(-pad.axis(AXIS_RIGHT_X)),
            ry: apply_deadzone(pad.axis(AXIS_RIGHT_Y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadzone() {
        assert_eq!(apply_deadzone(0.049), 0.0);
        assert_eq!(apply_deadzone(-0.049), 0.0);
        assert_eq!(apply_deadzone(0.05), 0.05);
        assert_eq!(apply_deadzone(-0.8), -0.8);
    }

    #[test]
    fn test_map_range() {
        assert_eq!(map_range(0.0, -1.0, 1.0, -10.0, 10.0), 0.0);
        assert_eq!(map_range(1.0, -1.0, 1.0, -22.0, -11.0), -11.0);
        assert_eq!(map_range(-1.0, -1.0, 1.0, -22.0, -11.0), -22.0);
    }

    #[test]
    fn test_map_split_uses_separate_ranges() {
        assert_eq!(map_split(0.0, -10.0, 20.0), 0.0);
        assert_eq!(map_split(1.0, -10.0, 20.0), 20.0);
        assert_eq!(map_split(-1.0, -10.0, 20.0), -10.0);
        assert_eq!(map_split(-0.5, -10.0, 20.0), -5.0);
    }

    #[test]
    fn test_capped_offset() {
        assert_eq!(capped_offset(4.0, 0.5, 3.0), 2.0);
        assert_eq!(capped_offset(20.0, 0.5, 3.0), 3.0);
        assert_eq!(capped_offset(-20.0, 1.0, 4.0), -4.0);
    }

    #[test]
    fn test_sticks_apply_sign_and_deadzone() {
        let pad = GamepadState {
            axes: vec![0.02, -0.5, 0.0, 0.6, 0.04],
            buttons: vec![],
        };
        let sticks = Sticks::from_gamepad(&pad);
        assert_eq!(sticks.lx, 0.0);
        assert_eq!(sticks.ly, 0.5);
        assert_eq!(sticks.rx, -0.6);
        assert_eq!(sticks.ry, 0.0);
    }
}
