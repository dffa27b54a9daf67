/*!
Collaborator contracts.

The character drives an actor it does not own the physics of. Everything it
reads from or writes to the engine (actor transform, capsule, movement
component, skeletal mesh physics, animation instance, scene queries) goes
through [`LocomotionHost`]. Gameplay override points are injected as a
[`LocomotionPolicy`], and the direction mantle probes are cast along comes
from a [`MovementDirectionProvider`].
*/

use crate::anim::MontageId;
use crate::collision::{CapsuleSpec, CollisionWorld, QueryHit};
use crate::config::{MantleAsset, MantleConfig, RagdollConfig};
use crate::math::{Rotator, Vec3};
use crate::state::{MantleType, MovementMode};

pub use crate::anim::AnimationConsumer;

/// Kind of world the character lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorldKind {
    #[default]
    Game,
    /// Editor preview scene; the only place a missing animation instance is allowed.
    EditorPreview,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionEnabled {
    NoCollision,
    QueryOnly,
    PhysicsOnly,
    #[default]
    QueryAndPhysics,
}

/// Object type the skeletal mesh reports to collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshObjectType {
    #[default]
    Pawn,
    PhysicsBody,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimTickOption {
    AlwaysTickPoseAndRefreshBones,
    AlwaysTickPose,
    #[default]
    OnlyTickPoseWhenRendered,
    OnlyTickMontagesWhenNotRendered,
}

/// Tunable fields of the physics movement component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementTuning {
    pub max_walk_speed: f32,
    pub max_walk_speed_crouched: f32,
    pub max_fly_speed: f32,
    pub max_swim_speed: f32,
    pub max_acceleration: f32,
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_flying: f32,
    pub braking_deceleration_swimming: f32,
    pub ground_friction: f32,
    pub braking_friction_factor: f32,
    pub max_step_height: f32,
    /// Minimum normal Z of a surface the character can stand on.
    pub walkable_floor_z: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            max_walk_speed: 600.0,
            max_walk_speed_crouched: 300.0,
            max_fly_speed: 600.0,
            max_swim_speed: 300.0,
            max_acceleration: 2048.0,
            braking_deceleration_walking: 2048.0,
            braking_deceleration_flying: 0.0,
            braking_deceleration_swimming: 0.0,
            ground_friction: 8.0,
            braking_friction_factor: 2.0,
            max_step_height: 45.0,
            walkable_floor_z: 0.71,
        }
    }
}

/// The actor a [`Character`](crate::character::Character) drives.
///
/// Setters here are plain writes: the host never calls back into the
/// character. Engine-originated changes (landing, async crouch completion,
/// hits) are reported by the embedding through the character's event methods.
pub trait LocomotionHost {
    type World: CollisionWorld;
    type Anim: AnimationConsumer;

    fn world(&self) -> &Self::World;

    fn world_kind(&self) -> WorldKind {
        WorldKind::Game
    }

    fn anim(&self) -> Option<&Self::Anim>;

    fn anim_mut(&mut self) -> Option<&mut Self::Anim>;

    // Actor and controller.

    fn location(&self) -> Vec3;

    fn rotation(&self) -> Rotator;

    fn set_location_and_rotation(&mut self, location: Vec3, rotation: Rotator);

    fn set_rotation(&mut self, rotation: Rotator) {
        let location = self.location();
        self.set_location_and_rotation(location, rotation);
    }

    /// Rotate the actor by `delta` on top of its current rotation.
    fn add_world_rotation(&mut self, delta: Rotator) {
        let rotation = (self.rotation() + delta).normalized();
        self.set_rotation(rotation);
    }

    fn capsule(&self) -> CapsuleSpec;

    fn control_rotation(&self) -> Rotator;

    fn add_control_input(&mut self, pitch: f32, yaw: f32, roll: f32);

    // Movement component.

    fn velocity(&self) -> Vec3;

    fn set_velocity(&mut self, velocity: Vec3);

    fn movement_mode(&self) -> MovementMode;

    fn set_movement_mode(&mut self, mode: MovementMode);

    /// Acceleration currently requested by input.
    fn current_acceleration(&self) -> Vec3;

    fn tuning(&self) -> &MovementTuning;

    fn tuning_mut(&mut self) -> &mut MovementTuning;

    /// Normal of the floor the character stands on, `+Z` when unknown.
    fn floor_normal(&self) -> Vec3 {
        Vec3::z()
    }

    fn has_any_root_motion(&self) -> bool {
        false
    }

    fn add_movement_input(&mut self, direction: Vec3, scale: f32, force: bool);

    fn jump(&mut self);

    fn stop_jumping(&mut self);

    /// Request a crouch. Returns true when the capsule changed immediately.
    fn crouch(&mut self) -> bool;

    /// Request an uncrouch. Returns true when the capsule changed immediately.
    fn uncrouch(&mut self) -> bool;

    fn set_ignore_client_movement_error_checks(&mut self, ignore: bool);

    fn set_replicate_movement(&mut self, replicate: bool);

    // Skeletal mesh.

    fn socket_location(&self, socket: &str) -> Vec3;

    fn socket_rotation(&self, socket: &str) -> Rotator;

    fn bone_linear_velocity(&self, bone: &str) -> Vec3;

    fn set_all_motors_angular_drive(&mut self, spring: f32, damping: f32, force_limit: f32);

    fn set_mesh_gravity_enabled(&mut self, enabled: bool);

    fn add_force_to_bone(&mut self, force: Vec3, bone: &str, accel_change: bool);

    fn set_capsule_collision(&mut self, enabled: CollisionEnabled);

    fn set_mesh_collision(&mut self, object_type: MeshObjectType, enabled: CollisionEnabled);

    fn set_bodies_below_simulate_physics(&mut self, bone: &str, simulate: bool);

    fn set_all_bodies_simulate_physics(&mut self, simulate: bool);

    fn anim_tick_option(&self) -> AnimTickOption;

    fn set_anim_tick_option(&mut self, option: AnimTickOption);
}

/// Gameplay override points.
///
/// Every method has the stock behavior as its default, so a policy only
/// overrides what it changes.
pub trait LocomotionPolicy {
    fn can_mantle(&self, _mantle_type: MantleType) -> bool {
        true
    }

    /// Extra gameplay condition for entering flight.
    fn flight_check(&self) -> bool {
        true
    }

    /// Custom flight interruption test for the `Custom*` cancel conditions.
    fn flight_interrupt_custom_check(&self, _hit: &QueryHit) -> bool {
        false
    }

    fn mantle_asset(&self, config: &MantleConfig, mantle_type: MantleType) -> MantleAsset {
        config.asset(mantle_type).clone()
    }

    fn roll_animation(&self, config: &RagdollConfig) -> MontageId {
        config.roll.clone()
    }

    /// Get-up montage after a ragdoll; lying face up means getting up from the back.
    fn get_up_animation(&self, config: &RagdollConfig, face_up: bool) -> MontageId {
        if face_up {
            config.get_up_back.clone()
        } else {
            config.get_up_front.clone()
        }
    }
}

/// The stock policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPolicy;

impl LocomotionPolicy for DefaultPolicy {}

/// Last values of the movement input axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputAxes {
    /// Forward / backward.
    pub x: f32,
    /// Right / left.
    pub y: f32,
    /// Up / down (flight and swimming).
    pub z: f32,
}

/// Direction the mantle probes are cast along.
pub trait MovementDirectionProvider {
    fn movement_direction(
        &self,
        actor_rotation: Rotator,
        aiming_rotation: Rotator,
        input: InputAxes,
    ) -> Vec3;
}

/// The actor's own forward vector. Used by AI characters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActorForward;

impl MovementDirectionProvider for ActorForward {
    fn movement_direction(
        &self,
        actor_rotation: Rotator,
        _aiming_rotation: Rotator,
        _input: InputAxes,
    ) -> Vec3 {
        actor_rotation.forward()
    }
}

/// The input direction relative to the aim yaw. Used by player characters.
///
/// Zero when there is no planar input.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlRelative;

impl MovementDirectionProvider for ControlRelative {
    fn movement_direction(
        &self,
        _actor_rotation: Rotator,
        aiming_rotation: Rotator,
        input: InputAxes,
    ) -> Vec3 {
        let control = aiming_rotation.yaw_only();
        let direction = control.forward() * input.x + control.right() * input.y;
        direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_relative_follows_aim_yaw_and_both_axes() {
        let aim = Rotator::new(30.0, 90.0, 0.0);
        let input = InputAxes { x: 1.0, y: 1.0, z: 0.0 };
        let dir = ControlRelative.movement_direction(Rotator::ZERO, aim, input);
        // Forward at yaw 90 is +Y, right is -X.
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!((dir - expected).norm() < 1e-5, "{dir:?}");
    }

    #[test]
    fn control_relative_without_input_is_zero() {
        let dir = ControlRelative.movement_direction(
            Rotator::ZERO,
            Rotator::from_yaw(45.0),
            InputAxes::default(),
        );
        assert_eq!(dir, Vec3::zeros());
    }

    #[test]
    fn actor_forward_ignores_input() {
        let input = InputAxes { x: 0.0, y: 1.0, z: 0.0 };
        let dir = ActorForward.movement_direction(Rotator::from_yaw(180.0), Rotator::ZERO, input);
        assert!((dir - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn default_policy_uses_config_assets() {
        let mantle = MantleConfig::default();
        let ragdoll = RagdollConfig::default();
        let policy = DefaultPolicy;
        assert!(policy.can_mantle(MantleType::HighMantle));
        assert_eq!(policy.mantle_asset(&mantle, MantleType::HighMantle), mantle.high);
        assert_eq!(policy.get_up_animation(&ragdoll, true), MontageId::new("ALS_GetUp_Back"));
        assert_eq!(policy.get_up_animation(&ragdoll, false), MontageId::new("ALS_GetUp_Front"));
        assert_eq!(policy.roll_animation(&ragdoll), MontageId::new("ALS_N_Roll_F"));
    }
}
