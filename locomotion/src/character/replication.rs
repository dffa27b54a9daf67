/*!
Outbound remote calls and the handlers for inbound messages.

`Server*` calls made on the authority run in place, the owning client
queues them, and any other copy drops them. `Multicast*` calls made on the
authority are queued for every peer and also run locally.
*/

use log::trace;

use super::Character;
use crate::anim::{AnimationConsumer, MontageId};
use crate::host::LocomotionHost;
use crate::net::{NetRole, RemoteCall, RepCondition, ReplicatedProperty};
use crate::state::MovementState;

impl<H: LocomotionHost> Character<H> {
    pub(super) fn call_server(&mut self, call: RemoteCall) {
        match self.net.role {
            NetRole::Authority => self.handle_remote_call(call),
            NetRole::LocalPredicting => self.outbox.push_call(call),
            NetRole::RemoteObserving => trace!("dropping {call:?} on a non-owning copy"),
        }
    }

    pub(super) fn multicast(&mut self, call: RemoteCall) {
        if self.net.is_authority() && !self.is_standalone() {
            self.outbox.push_call(call.clone());
        }
        self.handle_remote_call(call);
    }

    pub(super) fn replicate(&mut self, property: ReplicatedProperty) {
        if self.net.is_authority() && !self.is_standalone() {
            self.outbox.push_property(property);
        }
    }

    /// Run a remote call delivered by the transport.
    ///
    /// Every handler tolerates duplicate delivery.
    pub fn handle_remote_call(&mut self, call: RemoteCall) {
        trace!("remote call {call:?}");
        match call {
            RemoteCall::ServerSetDesiredStance(stance) => self.set_desired_stance(stance),
            RemoteCall::ServerSetDesiredGait(gait) => self.set_desired_gait(gait),
            RemoteCall::ServerSetDesiredRotationMode(mode) => self.set_desired_rotation_mode(mode),
            RemoteCall::ServerSetRotationMode(mode) => self.set_rotation_mode(mode),
            RemoteCall::ServerSetFlightMode(mode) => self.set_flight_mode(mode),
            RemoteCall::ServerSetOverlayState(state) => self.set_overlay_state(state),
            RemoteCall::ServerSetViewMode(mode) => self.set_view_mode(mode),
            RemoteCall::ServerMantleStart(params) => {
                self.multicast(RemoteCall::MulticastMantleStart(params));
            }
            RemoteCall::MulticastMantleStart(params) => {
                if !self.net.locally_controlled {
                    self.mantle_start(
                        params.height,
                        params.ledge,
                        params.component,
                        params.mantle_type,
                    );
                }
            }
            RemoteCall::ServerPlayMontage { montage, play_rate } => {
                self.multicast(RemoteCall::MulticastPlayMontage { montage, play_rate });
            }
            RemoteCall::MulticastPlayMontage { montage, play_rate } => {
                if !self.net.locally_controlled {
                    if let Some(anim) = self.host.anim_mut() {
                        anim.montage_play(&montage, play_rate, 0.0);
                    }
                }
            }
            RemoteCall::ServerRagdollStart => self.multicast(RemoteCall::MulticastRagdollStart),
            RemoteCall::MulticastRagdollStart => {
                if self.state.movement_state != MovementState::Ragdoll {
                    self.ragdoll_start();
                }
            }
            RemoteCall::ServerRagdollEnd { location } => {
                self.multicast(RemoteCall::MulticastRagdollEnd { location });
            }
            RemoteCall::MulticastRagdollEnd { .. } => {
                if self.state.movement_state == MovementState::Ragdoll {
                    self.ragdoll_end();
                }
            }
            RemoteCall::MulticastOnLanded => {
                if !self.net.locally_controlled {
                    self.event_on_landed();
                }
            }
            RemoteCall::MulticastOnJumped => {
                if !self.net.locally_controlled {
                    self.event_on_jumped();
                }
            }
            RemoteCall::ServerSetMeshLocationDuringRagdoll(location) => {
                self.state.ragdoll.target_location = location;
                self.replicate(ReplicatedProperty::TargetRagdollLocation(location));
            }
            RemoteCall::ServerSetMaxWalkingSpeed(speed) => self.state.speed_sync.walk = speed,
            RemoteCall::ServerSetMaxFlyingSpeed(speed) => self.state.speed_sync.fly = speed,
            RemoteCall::ServerSetMaxSwimmingSpeed(speed) => self.state.speed_sync.swim = speed,
        }
    }

    /// Apply a property update received from the authority.
    ///
    /// Fields that have a change hook run it after the new value is stored.
    /// Owner-skipped properties are ignored on the locally controlled copy.
    pub fn apply_replicated(&mut self, property: ReplicatedProperty) {
        if property.condition() == RepCondition::SkipOwner && self.net.locally_controlled {
            trace!("ignoring owner-skipped {property:?}");
            return;
        }
        match property {
            ReplicatedProperty::TargetRagdollLocation(location) => {
                self.state.ragdoll.target_location = location;
            }
            ReplicatedProperty::ReplicatedCurrentAcceleration(acceleration) => {
                self.state.kinematics.replicated_current_acceleration = acceleration;
            }
            ReplicatedProperty::ReplicatedControlRotation(rotation) => {
                self.state.kinematics.replicated_control_rotation = rotation;
            }
            ReplicatedProperty::DesiredGait(gait) => self.state.desired_gait = gait,
            ReplicatedProperty::DesiredStance(stance) => self.state.desired_stance = stance,
            ReplicatedProperty::DesiredRotationMode(mode) => {
                self.state.desired_rotation_mode = mode;
            }
            ReplicatedProperty::RotationMode(mode) => {
                let previous = std::mem::replace(&mut self.state.rotation_mode, mode);
                if previous != mode {
                    self.on_rotation_mode_changed(previous);
                }
            }
            ReplicatedProperty::OverlayState(state) => {
                let previous = std::mem::replace(&mut self.state.overlay_state, state);
                if previous != state {
                    self.on_overlay_state_changed(previous);
                }
            }
            ReplicatedProperty::FlightMode(mode) => {
                let previous = std::mem::replace(&mut self.state.flight_mode, mode);
                if previous != mode {
                    self.on_flight_mode_changed(previous);
                }
            }
            ReplicatedProperty::ViewMode(mode) => {
                let previous = std::mem::replace(&mut self.state.view_mode, mode);
                if previous != mode {
                    self.on_view_mode_changed(previous);
                }
            }
        }
    }

    /// Start the ragdoll on every copy.
    pub fn replicated_ragdoll_start(&mut self) {
        if self.net.is_authority() {
            self.multicast(RemoteCall::MulticastRagdollStart);
        } else {
            self.call_server(RemoteCall::ServerRagdollStart);
        }
    }

    /// End the ragdoll on every copy.
    pub fn replicated_ragdoll_end(&mut self) {
        let location = self.host.location();
        if self.net.is_authority() {
            self.multicast(RemoteCall::MulticastRagdollEnd { location });
        } else {
            self.call_server(RemoteCall::ServerRagdollEnd { location });
        }
    }

    /// Play a montage here and on every other copy.
    pub fn replicated_play_montage(&mut self, montage: MontageId, play_rate: f32) {
        if let Some(anim) = self.host.anim_mut() {
            anim.montage_play(&montage, play_rate, 0.0);
        }
        self.call_server(RemoteCall::ServerPlayMontage { montage, play_rate });
    }
}
