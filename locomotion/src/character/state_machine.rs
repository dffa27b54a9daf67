//! Guarded setters for every locomotion state and their transition hooks.
//!
//! A setter is a no-op when the value does not change. Otherwise it stores the
//! new value, runs the matching `on_*_changed` hook exactly once, forwards the
//! value to the server from the owning client and queues it for replication
//! on the authority.

use log::{debug, trace};

use super::{Character, CharacterKind, MantleState, RagdollState};
use crate::host::LocomotionHost;
use crate::net::{NetRole, RemoteCall, ReplicatedProperty};
use crate::state::{
    FlightMode, Gait, MovementAction, MovementMode, MovementState, OverlayState, RotationMode,
    Stance, ViewMode,
};

impl<H: LocomotionHost> Character<H> {
    pub fn set_movement_state(&mut self, new_state: MovementState) {
        if self.state.movement_state == new_state {
            return;
        }
        let previous = self.state.movement_state;
        self.state.prev_movement_state = previous;
        self.state.movement_state = new_state;
        if let Some(anim) = self.anim_state() {
            anim.prev_movement_state = previous;
            anim.movement_state = new_state;
        }
        debug!("movement state {previous:?} -> {new_state:?}");
        self.on_movement_state_changed(previous);
    }

    fn on_movement_state_changed(&mut self, previous: MovementState) {
        match self.state.movement_state {
            MovementState::Freefall => match self.state.movement_action {
                MovementAction::None => {
                    self.state.in_air_rotation = self.host.rotation();
                    if self.state.stance == Stance::Crouching {
                        self.uncrouch();
                    }
                }
                MovementAction::Rolling if self.config.ragdoll.ragdoll_on_rollfall => {
                    self.replicated_ragdoll_start();
                }
                _ => {}
            },
            MovementState::Ragdoll if previous == MovementState::Mantling => {
                self.state.mantle.timeline.stop();
            }
            _ => {}
        }

        // Mantle and ragdoll data only lives as long as its state.
        match previous {
            MovementState::Mantling => self.state.mantle = MantleState::default(),
            MovementState::Ragdoll => self.state.ragdoll = RagdollState::default(),
            _ => {}
        }
    }

    pub fn set_movement_action(&mut self, new_action: MovementAction) {
        if self.state.movement_action == new_action {
            return;
        }
        let previous = self.state.movement_action;
        self.state.movement_action = new_action;
        if let Some(anim) = self.anim_state() {
            anim.movement_action = new_action;
        }
        debug!("movement action {previous:?} -> {new_action:?}");
        self.on_movement_action_changed(previous);
    }

    fn on_movement_action_changed(&mut self, previous: MovementAction) {
        if self.state.movement_action == MovementAction::Rolling {
            self.crouch();
        }
        if previous == MovementAction::Rolling {
            match self.state.desired_stance {
                Stance::Standing => self.uncrouch(),
                Stance::Crouching => self.crouch(),
            }
        }
    }

    pub fn set_stance(&mut self, new_stance: Stance) {
        if self.state.stance == new_stance {
            return;
        }
        let previous = self.state.stance;
        self.state.stance = new_stance;
        if let Some(anim) = self.anim_state() {
            anim.stance = new_stance;
        }
        debug!("stance {previous:?} -> {new_stance:?}");
    }

    pub fn set_gait(&mut self, new_gait: Gait) {
        if self.state.gait == new_gait {
            return;
        }
        let previous = self.state.gait;
        self.state.gait = new_gait;
        if let Some(anim) = self.anim_state() {
            anim.gait = new_gait;
        }
        debug!("gait {previous:?} -> {new_gait:?}");
    }

    pub fn set_desired_stance(&mut self, stance: Stance) {
        let changed = self.state.desired_stance != stance;
        self.state.desired_stance = stance;
        self.forward_to_server(RemoteCall::ServerSetDesiredStance(stance));
        if changed {
            self.replicate(ReplicatedProperty::DesiredStance(stance));
        }
    }

    pub fn set_desired_gait(&mut self, gait: Gait) {
        let changed = self.state.desired_gait != gait;
        self.state.desired_gait = gait;
        self.forward_to_server(RemoteCall::ServerSetDesiredGait(gait));
        if changed {
            self.replicate(ReplicatedProperty::DesiredGait(gait));
        }
    }

    pub fn set_desired_rotation_mode(&mut self, rotation_mode: RotationMode) {
        let changed = self.state.desired_rotation_mode != rotation_mode;
        self.state.desired_rotation_mode = rotation_mode;
        self.forward_to_server(RemoteCall::ServerSetDesiredRotationMode(rotation_mode));
        if changed {
            self.replicate(ReplicatedProperty::DesiredRotationMode(rotation_mode));
        }
    }

    pub fn set_rotation_mode(&mut self, new_mode: RotationMode) {
        if self.state.rotation_mode == new_mode {
            return;
        }
        let previous = self.state.rotation_mode;
        self.state.rotation_mode = new_mode;
        debug!("rotation mode {previous:?} -> {new_mode:?}");
        self.forward_to_server(RemoteCall::ServerSetRotationMode(new_mode));
        self.replicate(ReplicatedProperty::RotationMode(new_mode));
        self.on_rotation_mode_changed(previous);
    }

    pub(super) fn on_rotation_mode_changed(&mut self, _previous: RotationMode) {
        let rotation_mode = self.state.rotation_mode;
        if let Some(anim) = self.anim_state() {
            anim.rotation_mode = rotation_mode;
        }
        if self.kind == CharacterKind::Player
            && rotation_mode == RotationMode::VelocityDirection
            && self.state.view_mode == ViewMode::FirstPerson
        {
            self.set_view_mode(ViewMode::ThirdPerson);
        }
    }

    /// Change the flight mode. Entering any mode other than `None` requires
    /// [`can_fly`](Self::can_fly); otherwise the call does nothing.
    pub fn set_flight_mode(&mut self, new_mode: FlightMode) {
        if self.state.flight_mode == new_mode {
            return;
        }
        if new_mode != FlightMode::None && !self.can_fly() {
            trace!("flight mode {new_mode:?} refused");
            return;
        }
        let previous = self.state.flight_mode;
        self.state.flight_mode = new_mode;
        debug!("flight mode {previous:?} -> {new_mode:?}");
        self.forward_to_server(RemoteCall::ServerSetFlightMode(new_mode));
        self.replicate(ReplicatedProperty::FlightMode(new_mode));
        self.on_flight_mode_changed(previous);
    }

    pub(super) fn on_flight_mode_changed(&mut self, previous: FlightMode) {
        if self.state.flight_mode == FlightMode::None {
            self.set_movement_mode(MovementMode::Falling);
        } else if previous == FlightMode::None {
            self.set_movement_mode(MovementMode::Flying);
        }
    }

    pub fn set_overlay_state(&mut self, new_state: OverlayState) {
        if self.state.overlay_state == new_state {
            return;
        }
        let previous = self.state.overlay_state;
        self.state.overlay_state = new_state;
        debug!("overlay state {previous:?} -> {new_state:?}");
        self.forward_to_server(RemoteCall::ServerSetOverlayState(new_state));
        self.replicate(ReplicatedProperty::OverlayState(new_state));
        self.on_overlay_state_changed(previous);
    }

    pub(super) fn on_overlay_state_changed(&mut self, _previous: OverlayState) {
        let overlay_state = self.state.overlay_state;
        if let Some(anim) = self.anim_state() {
            anim.overlay_state = overlay_state;
        }
    }

    /// Switch between first and third person. Only player characters have a view mode.
    pub fn set_view_mode(&mut self, new_mode: ViewMode) {
        if self.kind != CharacterKind::Player || self.state.view_mode == new_mode {
            return;
        }
        let previous = self.state.view_mode;
        self.state.view_mode = new_mode;
        debug!("view mode {previous:?} -> {new_mode:?}");
        self.forward_to_server(RemoteCall::ServerSetViewMode(new_mode));
        self.replicate(ReplicatedProperty::ViewMode(new_mode));
        self.on_view_mode_changed(previous);
    }

    pub(super) fn on_view_mode_changed(&mut self, _previous: ViewMode) {
        let view_mode = self.state.view_mode;
        if let Some(anim) = self.anim_state() {
            anim.view_mode = view_mode;
        }
        match view_mode {
            ViewMode::ThirdPerson => {
                if matches!(
                    self.state.rotation_mode,
                    RotationMode::VelocityDirection | RotationMode::LookingDirection
                ) {
                    self.set_rotation_mode(self.state.desired_rotation_mode);
                }
                self.state.restrict_aiming = self.state.rotation_mode == RotationMode::Aiming;
            }
            ViewMode::FirstPerson => {
                self.state.restrict_aiming = true;
                if self.state.rotation_mode == RotationMode::VelocityDirection {
                    self.set_rotation_mode(RotationMode::LookingDirection);
                }
            }
        }
    }

    /// Whether the character may enter flight right now.
    pub fn can_fly(&self) -> bool {
        let flight = &self.config.flight;
        let [low, high] = flight.temperature_bounds;
        self.policy.flight_check()
            && flight.enabled
            && (low..=high).contains(&self.state.flight.temperature)
            && self.state.flight.effective_weight < flight.weight_cutoff
    }

    fn forward_to_server(&mut self, call: RemoteCall) {
        if self.net.role == NetRole::LocalPredicting {
            self.outbox.push_call(call);
        }
    }
}
