//! State published to the animation consumer and the contract it implements.

use serde::Deserialize;

use crate::math::{Rotator, Vec3};
use crate::state::{
    Gait, MovementAction, MovementState, OverlayState, RotationMode, Stance, ViewMode,
};

/// Name of an animation montage asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct MontageId(pub String);

impl MontageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MontageId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How the animation consumer extracts root motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RootMotionMode {
    NoExtraction,
    IgnoreRootMotion,
    #[default]
    RootMotionFromMontagesOnly,
    RootMotionFromEverything,
}

/// Locomotion values mirrored into the animation consumer.
///
/// The character writes a field as soon as the underlying value changes; the
/// consumer reads it once per frame before building a pose.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimState {
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub movement_input: Vec3,
    pub is_moving: bool,
    pub has_movement_input: bool,
    pub speed: f32,
    pub movement_input_amount: f32,
    pub aiming_rotation: Rotator,
    pub aim_yaw_rate: f32,

    pub movement_state: MovementState,
    pub prev_movement_state: MovementState,
    pub movement_action: MovementAction,
    pub rotation_mode: RotationMode,
    pub gait: Gait,
    pub stance: Stance,
    pub overlay_state: OverlayState,
    pub view_mode: ViewMode,
}

/// The animation instance driving the character's skeletal mesh.
pub trait AnimationConsumer {
    fn state(&self) -> &AnimState;

    fn state_mut(&mut self) -> &mut AnimState;

    /// Value of a named animation curve this frame, zero when absent.
    fn curve_value(&self, name: &str) -> f32;

    /// Play a montage and return its length (zero if it could not play).
    fn montage_play(&mut self, montage: &MontageId, play_rate: f32, start_position: f32) -> f32;

    fn montage_stop(&mut self, blend_out: f32);

    fn save_pose_snapshot(&mut self, name: &str);

    fn set_root_motion_mode(&mut self, mode: RootMotionMode);

    fn on_jumped(&mut self) {}
}
