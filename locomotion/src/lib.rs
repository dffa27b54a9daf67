pub mod anim;
pub mod bitmask_flags;
pub mod character;
pub mod collision;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod host;
pub mod math;
pub mod net;
pub mod settings;
pub mod state;
pub mod timer;

#[cfg(test)]
mod testing;

pub use anim::{AnimState, AnimationConsumer, MontageId, RootMotionMode};
pub use character::{Character, CharacterKind, CharacterLocomotionState, DynamicMovementStrategy};
pub use collision::{
    CapsuleSpec, CollisionChannel, CollisionWorld, ComponentId, QueryHit, StaticWorld,
};
pub use config::LocomotionConfig;
pub use error::ConfigError;
pub use host::{
    ActorForward, ControlRelative, DefaultPolicy, LocomotionHost, LocomotionPolicy,
    MovementDirectionProvider,
};
pub use math::{Rotator, Transform, Vec3};
pub use net::{NetContext, NetRole, Outbound, RemoteCall, ReplicatedProperty};
pub use settings::{MovementModel, MovementSettings};
pub use state::{
    FlightMode, Gait, MantleType, MovementAction, MovementMode, MovementState, OverlayState,
    RotationMode, Stance, ViewMode,
};
