/*!
The locomotion character.

[`Character`] owns one [`CharacterLocomotionState`] and drives a
[`LocomotionHost`] once per simulation tick. State is only ever changed
through the named setters in `state_machine`; everything else reads it.

Submodules split the behavior by concern:
- state_machine: guarded setters and their transition hooks
- essentials:    per-tick kinematic values
- movement:      gait resolution and dynamic movement settings
- rotation:      per movement state rotation smoothing
- mantle:        ledge detection and the mantle blend
- ragdoll:       physical simulation on and off
- flight:        flight gate, altitude and hover
- replication:   outbound calls and inbound messages
- events:        notifications from the physics engine
- input:         player actions
*/

mod essentials;
mod events;
mod flight;
mod input;
mod mantle;
mod movement;
mod ragdoll;
mod replication;
mod rotation;
mod state_machine;

use std::sync::Arc;

use log::{debug, warn};

use crate::anim::{AnimState, MontageId, RootMotionMode};
use crate::collision::ComponentId;
use crate::config::LocomotionConfig;
use crate::curve::VectorCurve;
use crate::host::{
    AnimTickOption, AnimationConsumer, InputAxes, LocomotionHost, LocomotionPolicy,
    MovementDirectionProvider, WorldKind,
};
use crate::math::{Rotator, Transform, Vec3};
use crate::net::{NetContext, NetMode, NetRole, Outbound, Outbox};
use crate::settings::{MovementModel, MovementSettings, MovementStateSettings};
use crate::state::{
    FlightMode, Gait, MovementAction, MovementState, OverlayState, RotationMode, Stance, ViewMode,
};
use crate::timer::{TimerEvent, TimerHandle, TimerQueue};

pub use movement::DynamicMovementStrategy;

/// Base character or the player-controlled variant with view modes and input actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharacterKind {
    #[default]
    Ai,
    Player,
}

/// Values derived from velocity and input every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Kinematics {
    pub acceleration: Vec3,
    pub speed: f32,
    pub is_moving: bool,
    pub has_movement_input: bool,
    pub movement_input_amount: f32,
    pub aim_yaw_rate: f32,
    pub last_velocity_rotation: Rotator,
    pub last_movement_input_rotation: Rotator,
    /// Control rotation smoothed toward the replicated control rotation.
    pub aiming_rotation: Rotator,
    pub replicated_current_acceleration: Vec3,
    pub replicated_control_rotation: Rotator,
    pub eased_max_acceleration: f32,
    pub previous_velocity: Vec3,
    pub previous_aim_yaw: f32,
}

/// Parameters of the running mantle, resolved from the mantle asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MantleParams {
    pub montage: MontageId,
    pub position_correction_curve: VectorCurve,
    pub starting_offset: Vec3,
    pub starting_position: f32,
    pub play_rate: f32,
}

/// Progress accumulator standing in for the mantle timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MantleTimeline {
    pub position: f32,
    pub length: f32,
    pub play_rate: f32,
    pub playing: bool,
}

impl MantleTimeline {
    pub fn play_from_start(&mut self, length: f32, play_rate: f32) {
        self.position = 0.0;
        self.length = length.max(0.0);
        self.play_rate = play_rate;
        self.playing = true;
    }

    /// Advance by `dt` at the play rate. Returns true once the end is reached.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.playing {
            return false;
        }
        self.position = (self.position + dt * self.play_rate).clamp(0.0, self.length);
        self.position >= self.length
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MantleState {
    pub params: MantleParams,
    /// Ledge the character climbs to, in world space.
    pub target: Transform,
    pub actual_start_offset: Transform,
    pub animated_start_offset: Transform,
    /// Ledge transform relative to `component` (world space when `None`).
    pub ledge_ls: Transform,
    pub component: Option<ComponentId>,
    pub timeline: MantleTimeline,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RagdollState {
    pub target_location: Vec3,
    pub last_velocity: Vec3,
    pub on_ground: bool,
    pub face_up: bool,
    /// Strength pulling a remote ragdoll toward the authoritative location.
    pub server_pull: f32,
    pub saved_tick_option: Option<AnimTickOption>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightState {
    pub relative_altitude: f32,
    pub temperature: f32,
    pub effective_weight: f32,
    /// Multipliers for (grounded, flying, swimming).
    pub temperature_affect: Vec3,
    pub weight_affect: Vec3,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            relative_altitude: 0.0,
            temperature: 0.0,
            effective_weight: 0.0,
            temperature_affect: Vec3::repeat(1.0),
            weight_affect: Vec3::repeat(1.0),
        }
    }
}

/// Max speeds requested by the owning client, applied after the movement update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeedSync {
    pub walk: f32,
    pub fly: f32,
    pub swim: f32,
    pub change_requested: bool,
}

/// Per-player input bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub axes: InputAxes,
    pub last_stance_input_time: Option<f64>,
    pub camera_action_pressed_time: f64,
    pub camera_swap_timer: Option<TimerHandle>,
}

/// Everything the locomotion core knows about one character.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharacterLocomotionState {
    pub movement_state: MovementState,
    pub prev_movement_state: MovementState,
    pub movement_action: MovementAction,
    pub stance: Stance,
    pub desired_stance: Stance,
    pub gait: Gait,
    pub desired_gait: Gait,
    pub rotation_mode: RotationMode,
    pub desired_rotation_mode: RotationMode,
    pub flight_mode: FlightMode,
    pub overlay_state: OverlayState,
    pub view_mode: ViewMode,
    pub right_shoulder: bool,
    pub restrict_aiming: bool,
    pub breakfall_on_next_landing: bool,

    pub kinematics: Kinematics,
    pub target_rotation: Rotator,
    pub in_air_rotation: Rotator,
    /// Smoothed incline multiplier for walking speed.
    pub walking_speed_multiplier: f32,

    pub mantle: MantleState,
    pub ragdoll: RagdollState,
    pub flight: FlightState,
    pub speed_sync: SpeedSync,
    pub input: InputState,
    pub land_friction_timer: Option<TimerHandle>,
}

/// A locomotion character bound to its host.
pub struct Character<H: LocomotionHost> {
    host: H,
    config: Arc<LocomotionConfig>,
    net: NetContext,
    kind: CharacterKind,
    movement_data: MovementStateSettings,
    /// Lookup key of the movement settings resolved by the last movement update.
    settings_key: (RotationMode, MovementState, Stance),
    policy: Box<dyn LocomotionPolicy>,
    direction: Box<dyn MovementDirectionProvider>,
    strategy: DynamicMovementStrategy,
    state: CharacterLocomotionState,
    outbox: Outbox,
    timers: TimerQueue,
    time: f64,
}

impl<H: LocomotionHost> Character<H> {
    /// Create a base (AI) character and run its begin-play synchronisation.
    ///
    /// Panics if the host has no animation consumer outside an editor preview world.
    pub fn new(
        host: H,
        config: Arc<LocomotionConfig>,
        net: NetContext,
        model: &MovementModel,
        policy: impl LocomotionPolicy + 'static,
        direction: impl MovementDirectionProvider + 'static,
    ) -> Self {
        Self::build(
            CharacterKind::Ai,
            host,
            config,
            net,
            model,
            Box::new(policy),
            Box::new(direction),
        )
    }

    /// Create a player character: a base character with view modes.
    pub fn new_player(
        host: H,
        config: Arc<LocomotionConfig>,
        net: NetContext,
        model: &MovementModel,
        policy: impl LocomotionPolicy + 'static,
        direction: impl MovementDirectionProvider + 'static,
    ) -> Self {
        Self::build(
            CharacterKind::Player,
            host,
            config,
            net,
            model,
            Box::new(policy),
            Box::new(direction),
        )
    }

    fn build(
        kind: CharacterKind,
        host: H,
        config: Arc<LocomotionConfig>,
        net: NetContext,
        model: &MovementModel,
        policy: Box<dyn LocomotionPolicy>,
        direction: Box<dyn MovementDirectionProvider>,
    ) -> Self {
        assert!(
            host.anim().is_some() || host.world_kind() == WorldKind::EditorPreview,
            "character has no animation consumer assigned outside an editor preview world"
        );

        let row_name = config.movement.movement_model_row.as_str();
        let movement_data = match model.row(row_name) {
            Ok(row) => row.clone(),
            Err(err) => {
                warn!("{err}; falling back to the built-in movement model");
                MovementModel::builtin()
                    .row("normal")
                    .map(Clone::clone)
                    .unwrap_or_default()
            }
        };
        let strategy = DynamicMovementStrategy::resolve(config.movement.dynamic_settings, net.mode);

        let tuning = *host.tuning();
        let initial = config.initial.clone();
        let state = CharacterLocomotionState {
            desired_gait: initial.gait,
            desired_stance: initial.stance,
            desired_rotation_mode: initial.rotation_mode,
            walking_speed_multiplier: 1.0,
            kinematics: Kinematics {
                eased_max_acceleration: tuning.max_acceleration,
                ..Default::default()
            },
            speed_sync: SpeedSync {
                walk: tuning.max_walk_speed,
                fly: tuning.max_fly_speed,
                swim: tuning.max_swim_speed,
                change_requested: false,
            },
            ..Default::default()
        };

        let mut character = Self {
            host,
            config,
            net,
            kind,
            movement_data,
            settings_key: (RotationMode::VelocityDirection, MovementState::None, Stance::Standing),
            policy,
            direction,
            strategy,
            state,
            outbox: Outbox::default(),
            timers: TimerQueue::default(),
            time: 0.0,
        };
        character.begin_play(initial.overlay_state, initial.temperature, initial.weight);
        character
    }

    fn begin_play(&mut self, overlay_state: OverlayState, temperature: f32, weight: f32) {
        // Pick up the movement mode the host spawned with.
        self.on_movement_mode_changed();

        let desired_gait = self.state.desired_gait;
        let desired_stance = self.state.desired_stance;
        let desired_rotation_mode = self.state.desired_rotation_mode;
        let movement_state = self.state.movement_state;
        let prev_movement_state = self.state.prev_movement_state;
        if let Some(anim) = self.anim_state() {
            anim.gait = desired_gait;
            anim.stance = desired_stance;
            anim.rotation_mode = desired_rotation_mode;
            anim.overlay_state = overlay_state;
            anim.movement_state = movement_state;
            anim.prev_movement_state = prev_movement_state;
        }

        self.set_gait(desired_gait);
        self.set_stance(desired_stance);
        self.set_rotation_mode(desired_rotation_mode);
        self.set_overlay_state(overlay_state);
        match self.state.stance {
            Stance::Standing => self.uncrouch(),
            Stance::Crouching => self.crouch(),
        }

        let rotation = self.host.rotation();
        self.state.target_rotation = rotation;
        self.state.kinematics.last_velocity_rotation = rotation;
        self.state.kinematics.last_movement_input_rotation = rotation;

        self.set_temperature(temperature);
        self.set_weight(weight);
        self.settings_key = (
            self.state.rotation_mode,
            self.state.movement_state,
            self.state.stance,
        );

        if self.net.role == NetRole::RemoteObserving {
            if let Some(anim) = self.host.anim_mut() {
                anim.set_root_motion_mode(RootMotionMode::IgnoreRootMotion);
            }
        }

        if self.kind == CharacterKind::Player {
            let view_mode = self.config.player.initial_view_mode;
            if let Some(anim) = self.anim_state() {
                anim.view_mode = view_mode;
            }
            self.set_view_mode(view_mode);
        }

        debug!(
            "character ready ({:?}, {:?}, strategy {:?}, state {:?})",
            self.kind, self.net.role, self.strategy, self.state.movement_state
        );
    }

    /// Advance the character by `dt` seconds.
    ///
    /// Ticks with a non-positive delta time are skipped.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            warn!("skipping locomotion tick with delta time {dt}");
            return;
        }
        self.time += f64::from(dt);
        self.fire_due_timers();

        self.set_essential_values(dt);

        match self.state.movement_state {
            MovementState::None => {}
            MovementState::Grounded => {
                self.update_character_movement(dt);
                self.update_grounded_rotation(dt);
                if self.state.kinematics.has_movement_input
                    && self.config.mantle.use_auto_vault
                    && self.net.locally_controlled
                {
                    self.mantle_check_vault();
                }
            }
            MovementState::Freefall => {
                self.update_falling_rotation(dt);
                if self.state.kinematics.has_movement_input
                    || self.config.mantle.always_catch_if_falling
                {
                    self.mantle_check_falling();
                }
            }
            MovementState::Flight => {
                self.update_relative_altitude();
                self.update_character_movement(dt);
                self.update_flight_rotation(dt);
                if self.net.is_authority() || self.net.role == NetRole::LocalPredicting {
                    self.update_flight_movement(dt);
                }
            }
            MovementState::Swimming => {
                self.update_character_movement(dt);
                self.update_swimming_rotation(dt);
            }
            MovementState::Mantling => self.advance_mantle(dt),
            MovementState::Ragdoll => self.ragdoll_update(dt),
        }

        self.apply_movement_settings_change();

        self.state.kinematics.previous_velocity = self.host.velocity();
        self.state.kinematics.previous_aim_yaw = self.state.kinematics.aiming_rotation.yaw;
    }

    fn fire_due_timers(&mut self) {
        for event in self.timers.take_due(self.time) {
            match event {
                TimerEvent::LandFrictionReset => {
                    self.state.land_friction_timer = None;
                    self.host.tuning_mut().braking_friction_factor = 0.0;
                }
                TimerEvent::CameraModeSwap => {
                    self.state.input.camera_swap_timer = None;
                    self.on_switch_camera_mode();
                }
            }
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access for the embedding (moving the actor, feeding velocity).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> &CharacterLocomotionState {
        &self.state
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn net(&self) -> NetContext {
        self.net
    }

    pub fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub fn strategy(&self) -> DynamicMovementStrategy {
        self.strategy
    }

    /// Simulation time accumulated by [`tick`](Self::tick), in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Take every pending outbound message for the transport.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        self.outbox.drain().collect()
    }

    /// Movement settings entry the last movement update resolved.
    pub fn current_movement_settings(&self) -> &MovementSettings {
        let (rotation_mode, movement_state, stance) = self.settings_key;
        self.movement_data.target_settings(rotation_mode, movement_state, stance)
    }

    pub(crate) fn anim_state(&mut self) -> Option<&mut AnimState> {
        self.host.anim_mut().map(|anim| anim.state_mut())
    }

    /// Named animation curve value, zero without an animation consumer.
    pub(crate) fn anim_curve(&self, name: &str) -> f32 {
        self.host.anim().map_or(0.0, |anim| anim.curve_value(name))
    }

    fn is_standalone(&self) -> bool {
        self.net.mode == NetMode::Standalone
    }
}
