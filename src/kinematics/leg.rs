// Leg identifiers and the body-frame data model shared by IK, gait and control.

use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize, Serializer};

/// One of the four legs, named by body corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegId {
    #[serde(rename = "FL")]
    FrontLeft,
    #[serde(rename = "FR")]
    FrontRight,
    #[serde(rename = "BL")]
    BackLeft,
    #[serde(rename = "BR")]
    BackRight,
}

impl LegId {
    /// All legs in storage order
    pub const ALL: [LegId; 4] = [
        LegId::FrontLeft,
        LegId::FrontRight,
        LegId::BackLeft,
        LegId::BackRight,
    ];

    pub fn is_left(self) -> bool {
        matches!(self, LegId::FrontLeft | LegId::BackLeft)
    }

    pub fn is_front(self) -> bool {
        matches!(self, LegId::FrontLeft | LegId::FrontRight)
    }

    /// Scales the pitch-induced height offset: front legs +0.5, back legs -0.5
    pub fn pitch_multiplier(self) -> f32 {
        if self.is_front() { 0.5 } else { -0.5 }
    }

    /// Scales the roll-induced height offset: left legs +0.5, right legs -0.5
    pub fn roll_multiplier(self) -> f32 {
        if self.is_left() { 0.5 } else { -0.5 }
    }

    /// Hip x position relative to the body centre (cm)
    pub fn hip_x_offset(self) -> f32 {
        if self.is_left() { 6.2 } else { -6.2 }
    }

    /// Short corner code used in logs and telemetry
    pub fn code(self) -> &'static str {
        match self {
            LegId::FrontLeft => "FL",
            LegId::FrontRight => "FR",
            LegId::BackLeft => "BL",
            LegId::BackRight => "BR",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Foot target in body-relative centimetres (z negative = down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Moves a fraction `speed` of the way towards `target`
    pub fn approach(&self, target: &Position3, speed: f32) -> Position3 {
        Position3 {
            x: self.x + (target.x - self.x) * speed,
            y: self.y + (target.y - self.y) * speed,
            z: self.z + (target.z - self.z) * speed,
        }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Position3 {
        Position3::new(self.x + dx, self.y + dy, self.z)
    }
}

/// Servo-convention joint angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointAngles {
    pub hip: f32,
    pub thigh: f32,
    pub shin: f32,
}

impl JointAngles {
    pub fn is_finite(&self) -> bool {
        self.hip.is_finite() && self.thigh.is_finite() && self.shin.is_finite()
    }

    pub fn get(&self, joint: Joint) -> f32 {
        match joint {
            Joint::Hip => self.hip,
            Joint::Thigh => self.thigh,
            Joint::Shin => self.shin,
        }
    }
}

/// The three actuated joints of a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Hip,
    Thigh,
    Shin,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Hip, Joint::Thigh, Joint::Shin];
}

/// Desired body pose: translation in cm, rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyPose {
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

impl BodyPose {
    /// Level body at the given height
    pub fn standing(height: f32) -> Self {
        Self {
            pos_z: height,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Position3 {
        Position3::new(self.pos_x, self.pos_y, self.pos_z)
    }

    /// Exponential approach of every component towards `target`
    pub fn approach(&self, target: &BodyPose, speed: f32) -> BodyPose {
        let step = |from: f32, to: f32| from + (to - from) * speed;
        BodyPose {
            pos_x: step(self.pos_x, target.pos_x),
            pos_y: step(self.pos_y, target.pos_y),
            pos_z: step(self.pos_z, target.pos_z),
            pitch: step(self.pitch, target.pitch),
            roll: step(self.roll, target.roll),
            yaw: step(self.yaw, target.yaw),
        }
    }
}

/// Fixed four-slot container with one value per leg
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LegMap<T> {
    slots: [T; 4],
}

impl<T> LegMap<T> {
    /// Builds a map by evaluating `f` for every leg
    pub fn from_fn(mut f: impl FnMut(LegId) -> T) -> Self {
        Self {
            slots: LegId::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LegId, &T)> {
        LegId::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(LegId, &T) -> U) -> LegMap<U> {
        LegMap::from_fn(|leg| f(leg, &self[leg]))
    }
}

impl<T: Copy> LegMap<T> {
    pub fn splat(value: T) -> Self {
        Self { slots: [value; 4] }
    }
}

// Serialized as an object keyed by corner code: {"FL": .., "FR": .., ..}
impl<T: Serialize> Serialize for LegMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(leg, value)| (leg.code(), value)))
    }
}

impl<T> Index<LegId> for LegMap<T> {
    type Output = T;

    fn index(&self, leg: LegId) -> &Self::Output {
        &self.slots[leg.slot()]
    }
}

impl<T> IndexMut<LegId> for LegMap<T> {
    fn index_mut(&mut self, leg: LegId) -> &mut Self::Output {
        &mut self.slots[leg.slot()]
    }
}
