pub mod config;
pub mod control;
pub mod gait;
pub mod interpolation;
pub mod kinematics;
pub mod messages;
pub mod runtime;
pub mod sensor;
pub mod servo;
