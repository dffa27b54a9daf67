//! In-memory host, animation consumer and character builders for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::anim::{AnimState, AnimationConsumer, MontageId, RootMotionMode};
use crate::character::Character;
use crate::collision::{CapsuleSpec, StaticWorld};
use crate::config::LocomotionConfig;
use crate::host::{
    ActorForward, AnimTickOption, CollisionEnabled, ControlRelative, DefaultPolicy, LocomotionHost,
    LocomotionPolicy, MeshObjectType, MovementTuning, WorldKind,
};
use crate::math::{Rotator, Vec3};
use crate::net::NetContext;
use crate::settings::MovementModel;
use crate::state::MovementMode;

/// Records every call the character makes on its animation instance.
#[derive(Debug, Default)]
pub struct TestAnim {
    pub state: AnimState,
    pub curves: HashMap<String, f32>,
    pub montages: Vec<(MontageId, f32, f32)>,
    pub montage_stops: usize,
    pub snapshots: Vec<String>,
    pub root_motion: RootMotionMode,
    pub jumps: usize,
}

impl AnimationConsumer for TestAnim {
    fn state(&self) -> &AnimState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnimState {
        &mut self.state
    }

    fn curve_value(&self, name: &str) -> f32 {
        self.curves.get(name).copied().unwrap_or(0.0)
    }

    fn montage_play(&mut self, montage: &MontageId, play_rate: f32, start_position: f32) -> f32 {
        self.montages.push((montage.clone(), play_rate, start_position));
        1.0
    }

    fn montage_stop(&mut self, _blend_out: f32) {
        self.montage_stops += 1;
    }

    fn save_pose_snapshot(&mut self, name: &str) {
        self.snapshots.push(name.to_string());
    }

    fn set_root_motion_mode(&mut self, mode: RootMotionMode) {
        self.root_motion = mode;
    }

    fn on_jumped(&mut self) {
        self.jumps += 1;
    }
}

/// A character actor with plain fields instead of an engine behind it.
///
/// Crouching takes effect immediately. Sockets and bones that were never
/// set report the actor transform and zero velocity.
#[derive(Debug)]
pub struct TestHost {
    pub world: StaticWorld,
    pub world_kind: WorldKind,
    pub anim: Option<TestAnim>,

    pub location: Vec3,
    pub rotation: Rotator,
    pub capsule: CapsuleSpec,
    pub control_rotation: Rotator,
    pub velocity: Vec3,
    pub movement_mode: MovementMode,
    pub acceleration: Vec3,
    pub tuning: MovementTuning,
    pub floor_normal: Vec3,
    pub root_motion: bool,

    pub movement_inputs: Vec<(Vec3, f32, bool)>,
    pub jumps: usize,
    pub stop_jumps: usize,
    pub crouched: bool,

    pub sockets: HashMap<String, (Vec3, Rotator)>,
    pub bone_velocities: HashMap<String, Vec3>,
    pub forces: Vec<(Vec3, String, bool)>,
    pub motor_drive: (f32, f32, f32),
    pub gravity_enabled: bool,
    pub capsule_collision: CollisionEnabled,
    pub mesh_collision: (MeshObjectType, CollisionEnabled),
    pub simulating_below: Option<String>,
    pub tick_option: AnimTickOption,
    pub replicate_movement: bool,
    pub ignore_movement_errors: bool,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            world: StaticWorld::new(),
            world_kind: WorldKind::Game,
            anim: Some(TestAnim::default()),
            location: Vec3::zeros(),
            rotation: Rotator::ZERO,
            capsule: CapsuleSpec::new(35.0, 90.0),
            control_rotation: Rotator::ZERO,
            velocity: Vec3::zeros(),
            movement_mode: MovementMode::None,
            acceleration: Vec3::zeros(),
            tuning: MovementTuning::default(),
            floor_normal: Vec3::z(),
            root_motion: false,
            movement_inputs: Vec::new(),
            jumps: 0,
            stop_jumps: 0,
            crouched: false,
            sockets: HashMap::new(),
            bone_velocities: HashMap::new(),
            forces: Vec::new(),
            motor_drive: (0.0, 0.0, 0.0),
            gravity_enabled: true,
            capsule_collision: CollisionEnabled::QueryAndPhysics,
            mesh_collision: (MeshObjectType::Pawn, CollisionEnabled::QueryAndPhysics),
            simulating_below: None,
            tick_option: AnimTickOption::OnlyTickPoseWhenRendered,
            replicate_movement: true,
            ignore_movement_errors: false,
        }
    }
}

impl TestHost {
    /// Walking on a floor at z 0 with the capsule resting on it.
    pub fn on_ground() -> Self {
        let mut world = StaticWorld::new();
        world.add_ground(0.0);
        Self {
            world,
            location: Vec3::new(0.0, 0.0, 90.0),
            movement_mode: MovementMode::Walking,
            ..Self::default()
        }
    }

    pub fn anim_ref(&self) -> &TestAnim {
        self.anim.as_ref().expect("test host has no animation instance")
    }

    pub fn anim_mut_ref(&mut self) -> &mut TestAnim {
        self.anim.as_mut().expect("test host has no animation instance")
    }
}

impl LocomotionHost for TestHost {
    type World = StaticWorld;
    type Anim = TestAnim;

    fn world(&self) -> &StaticWorld {
        &self.world
    }

    fn world_kind(&self) -> WorldKind {
        self.world_kind
    }

    fn anim(&self) -> Option<&TestAnim> {
        self.anim.as_ref()
    }

    fn anim_mut(&mut self) -> Option<&mut TestAnim> {
        self.anim.as_mut()
    }

    fn location(&self) -> Vec3 {
        self.location
    }

    fn rotation(&self) -> Rotator {
        self.rotation
    }

    fn set_location_and_rotation(&mut self, location: Vec3, rotation: Rotator) {
        self.location = location;
        self.rotation = rotation;
    }

    fn capsule(&self) -> CapsuleSpec {
        self.capsule
    }

    fn control_rotation(&self) -> Rotator {
        self.control_rotation
    }

    fn add_control_input(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.control_rotation = self.control_rotation + Rotator::new(pitch, yaw, roll);
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn movement_mode(&self) -> MovementMode {
        self.movement_mode
    }

    fn set_movement_mode(&mut self, mode: MovementMode) {
        self.movement_mode = mode;
    }

    fn current_acceleration(&self) -> Vec3 {
        self.acceleration
    }

    fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    fn tuning_mut(&mut self) -> &mut MovementTuning {
        &mut self.tuning
    }

    fn floor_normal(&self) -> Vec3 {
        self.floor_normal
    }

    fn has_any_root_motion(&self) -> bool {
        self.root_motion
    }

    fn add_movement_input(&mut self, direction: Vec3, scale: f32, force: bool) {
        self.movement_inputs.push((direction, scale, force));
    }

    fn jump(&mut self) {
        self.jumps += 1;
    }

    fn stop_jumping(&mut self) {
        self.stop_jumps += 1;
    }

    fn crouch(&mut self) -> bool {
        !std::mem::replace(&mut self.crouched, true)
    }

    fn uncrouch(&mut self) -> bool {
        std::mem::replace(&mut self.crouched, false)
    }

    fn set_ignore_client_movement_error_checks(&mut self, ignore: bool) {
        self.ignore_movement_errors = ignore;
    }

    fn set_replicate_movement(&mut self, replicate: bool) {
        self.replicate_movement = replicate;
    }

    fn socket_location(&self, socket: &str) -> Vec3 {
        self.sockets.get(socket).map_or(self.location, |(location, _)| *location)
    }

    fn socket_rotation(&self, socket: &str) -> Rotator {
        self.sockets.get(socket).map_or(self.rotation, |(_, rotation)| *rotation)
    }

    fn bone_linear_velocity(&self, bone: &str) -> Vec3 {
        self.bone_velocities.get(bone).copied().unwrap_or_else(Vec3::zeros)
    }

    fn set_all_motors_angular_drive(&mut self, spring: f32, damping: f32, force_limit: f32) {
        self.motor_drive = (spring, damping, force_limit);
    }

    fn set_mesh_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    fn add_force_to_bone(&mut self, force: Vec3, bone: &str, accel_change: bool) {
        self.forces.push((force, bone.to_string(), accel_change));
    }

    fn set_capsule_collision(&mut self, enabled: CollisionEnabled) {
        self.capsule_collision = enabled;
    }

    fn set_mesh_collision(&mut self, object_type: MeshObjectType, enabled: CollisionEnabled) {
        self.mesh_collision = (object_type, enabled);
    }

    fn set_bodies_below_simulate_physics(&mut self, bone: &str, simulate: bool) {
        self.simulating_below = simulate.then(|| bone.to_string());
    }

    fn set_all_bodies_simulate_physics(&mut self, simulate: bool) {
        if !simulate {
            self.simulating_below = None;
        }
    }

    fn anim_tick_option(&self) -> AnimTickOption {
        self.tick_option
    }

    fn set_anim_tick_option(&mut self, option: AnimTickOption) {
        self.tick_option = option;
    }
}

pub fn ai(host: TestHost, net: NetContext) -> Character<TestHost> {
    ai_with_config(host, net, LocomotionConfig::default())
}

pub fn ai_with_config(
    host: TestHost,
    net: NetContext,
    config: LocomotionConfig,
) -> Character<TestHost> {
    Character::new(
        host,
        Arc::new(config),
        net,
        &MovementModel::builtin(),
        DefaultPolicy,
        ActorForward,
    )
}

/// Standalone AI character with a custom policy.
pub fn ai_with_policy(
    host: TestHost,
    config: LocomotionConfig,
    policy: impl LocomotionPolicy + 'static,
) -> Character<TestHost> {
    Character::new(
        host,
        Arc::new(config),
        NetContext::standalone(),
        &MovementModel::builtin(),
        policy,
        ActorForward,
    )
}

pub fn player(host: TestHost, net: NetContext) -> Character<TestHost> {
    player_with_config(host, net, LocomotionConfig::default())
}

pub fn player_with_config(
    host: TestHost,
    net: NetContext,
    config: LocomotionConfig,
) -> Character<TestHost> {
    Character::new_player(
        host,
        Arc::new(config),
        net,
        &MovementModel::builtin(),
        DefaultPolicy,
        ControlRelative,
    )
}
