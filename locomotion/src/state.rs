//! Locomotion state enums.

use serde::Deserialize;

/// Coarse locomotion mode, driven by the physics movement mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    #[default]
    None,
    Grounded,
    Freefall,
    Flight,
    Swimming,
    Mantling,
    Ragdoll,
}

/// Action layered over the movement state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementAction {
    #[default]
    None,
    LowMantle,
    HighMantle,
    Rolling,
    GettingUp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

/// Speed tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gait {
    #[default]
    Slow,
    Normal,
    Fast,
}

/// What the character faces while moving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    VelocityDirection,
    #[default]
    LookingDirection,
    Aiming,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightMode {
    #[default]
    None,
    Neutral,
    Raising,
    Lowering,
    Hovering,
}

/// When a hit cancels flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightCancelCondition {
    Disabled,
    AnyHit,
    #[default]
    VelocityThreshold,
    Custom,
    CustomOrThreshold,
    CustomAndThreshold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    ThirdPerson,
    FirstPerson,
}

/// Animation overlay layered on top of locomotion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    #[default]
    Default,
    Masculine,
    Feminine,
    Injured,
    HandsTied,
    Rifle,
    PistolOneHanded,
    PistolTwoHanded,
    Bow,
    Torch,
    Binoculars,
    Box,
    Barrel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MantleType {
    HighMantle,
    LowMantle,
    FallingCatch,
}

/// Quadrant of movement relative to the facing direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementDirection {
    #[default]
    Forward,
    Right,
    Left,
    Backward,
}

/// Movement mode of the host's physics movement component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementMode {
    #[default]
    None,
    Walking,
    NavWalking,
    Falling,
    Swimming,
    Flying,
    Custom,
}

impl MovementMode {
    /// Movement state implied by a physics movement mode.
    pub fn movement_state(self) -> MovementState {
        match self {
            MovementMode::Walking | MovementMode::NavWalking => MovementState::Grounded,
            MovementMode::Falling => MovementState::Freefall,
            MovementMode::Swimming => MovementState::Swimming,
            MovementMode::Flying => MovementState::Flight,
            MovementMode::None | MovementMode::Custom => MovementState::None,
        }
    }

    #[inline]
    pub fn is_walking(self) -> bool {
        matches!(self, MovementMode::Walking | MovementMode::NavWalking)
    }
}
