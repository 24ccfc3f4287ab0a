// Swing and stance foot profiles shared by every gait strategy.

use crate::kinematics::Position3;

/// Height the foot is raised during swing (cm)
pub const LIFT_HEIGHT: f32 = 5.0;

/// Parameters of one step, fixed for the duration of a call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepShape {
    /// Signed stride in y (cm); positive walks forward
    pub step_length: f32,
    pub lift_height: f32,
    /// First swing after start: lift straight up instead of from the swing-start y
    pub just_started: bool,
}

/// Foot target during swing, `phase` normalised to 0..1 within the swing window
///
/// The foot traces a rectangle: lift, slide forward, lower, slide back.
pub fn square_step(phase: f32, base: Position3, shape: &StepShape) -> Position3 {
    let StepShape {
        step_length,
        lift_height,
        just_started,
    } = *shape;
    let swing_start_y = base.y - step_length;

    let (y, z) = if phase < 0.25 {
        let y = if just_started { base.y } else { swing_start_y };
        (y, base.z + lift_height * (phase / 0.25))
    } else if phase < 0.5 {
        let progress = (phase - 0.25) / 0.25;
        (base.y + step_length * progress, base.z + lift_height)
    } else if phase < 0.75 {
        let progress = (phase - 0.5) / 0.25;
        (base.y + step_length, base.z + lift_height * (1.0 - progress))
    } else {
        // Back along the ground to the swing-start y
        let progress = (phase - 0.75) / 0.25;
        (base.y + step_length - 2.0 * step_length * progress, base.z)
    };

    Position3::new(base.x, y, z)
}

/// Foot target while planted, sliding back only in the last quarter of `phase`
pub fn stance_slide(phase: f32, base: Position3, step_length: f32) -> Position3 {
    if phase < 0.75 {
        return base;
    }
    let progress = (phase - 0.75) / 0.25;
    Position3::new(base.x, base.y - step_length * progress, base.z)
}

/// Foot target while planted, sliding linearly over the whole stance
///
/// Moves from `base.y + L/2` at `progress = 0` to `base.y - L/2` at `progress = 1`.
pub fn stance_push(progress: f32, base: Position3, step_length: f32) -> Position3 {
    let y = base.y + step_length / 2.0 - step_length * progress;
    Position3::new(base.x, y, base.z)
}
