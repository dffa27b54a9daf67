//! Notifications from the physics engine and the thin wrappers that raise them.
//!
//! The host never calls back into the character, so every host write that the
//! engine would answer with a notification (movement mode, crouch) goes
//! through a wrapper here that raises it.

use log::{debug, trace};

use super::Character;
use crate::anim::AnimationConsumer;
use crate::collision::QueryHit;
use crate::constants::{
    BREAKFALL_PLAY_RATE, JUMP_VELOCITY_ROTATION_SPEED, LAND_BRAKING_FRICTION_WITH_INPUT,
    LAND_BRAKING_FRICTION_WITHOUT_INPUT, LAND_FRICTION_RESET_DELAY,
};
use crate::host::LocomotionHost;
use crate::math::Vec3;
use crate::net::RemoteCall;
use crate::state::{FlightCancelCondition, FlightMode, MovementMode, Stance};
use crate::timer::TimerEvent;

impl<H: LocomotionHost> Character<H> {
    /// Set the host movement mode and react to the change.
    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        let previous = self.host.movement_mode();
        self.host.set_movement_mode(mode);
        if previous != mode {
            self.on_movement_mode_changed();
        }
    }

    /// The host movement mode changed; mirror it into the movement state.
    pub fn on_movement_mode_changed(&mut self) {
        let state = self.host.movement_mode().movement_state();
        self.set_movement_state(state);
    }

    pub fn crouch(&mut self) {
        if self.host.crouch() {
            self.on_start_crouch();
        }
    }

    pub fn uncrouch(&mut self) {
        if self.host.uncrouch() {
            self.on_end_crouch();
        }
    }

    /// The capsule finished shrinking.
    pub fn on_start_crouch(&mut self) {
        self.set_stance(Stance::Crouching);
    }

    /// The capsule finished growing back.
    pub fn on_end_crouch(&mut self) {
        self.set_stance(Stance::Standing);
    }

    /// The character touched the ground after falling.
    pub fn on_landed(&mut self) {
        if self.net.locally_controlled {
            self.event_on_landed();
        }
        if self.net.is_authority() {
            self.multicast(RemoteCall::MulticastOnLanded);
        }
    }

    /// The character left the ground by jumping.
    pub fn on_jumped(&mut self) {
        if self.net.locally_controlled {
            self.event_on_jumped();
        }
        if self.net.is_authority() {
            self.multicast(RemoteCall::MulticastOnJumped);
        }
    }

    pub(super) fn event_on_landed(&mut self) {
        let velocity_z = self.host.velocity().z.abs();
        let ragdoll = &self.config.ragdoll;
        let has_input = self.state.kinematics.has_movement_input;

        if ragdoll.ragdoll_on_land && velocity_z > ragdoll.ragdoll_on_land_velocity {
            self.replicated_ragdoll_start();
        } else if ragdoll.breakfall_on_land
            && ((has_input && velocity_z >= ragdoll.breakfall_on_land_velocity)
                || self.state.breakfall_on_next_landing)
        {
            self.on_breakfall();
            self.state.breakfall_on_next_landing = false;
        } else {
            self.host.tuning_mut().braking_friction_factor = if has_input {
                LAND_BRAKING_FRICTION_WITH_INPUT
            } else {
                LAND_BRAKING_FRICTION_WITHOUT_INPUT
            };
            if let Some(handle) = self.state.land_friction_timer.take() {
                self.timers.clear(handle);
            }
            let handle = self
                .timers
                .schedule(self.time, LAND_FRICTION_RESET_DELAY, TimerEvent::LandFrictionReset);
            self.state.land_friction_timer = Some(handle);
        }
    }

    pub(super) fn event_on_jumped(&mut self) {
        self.state.in_air_rotation = if self.state.kinematics.speed > JUMP_VELOCITY_ROTATION_SPEED {
            self.state.kinematics.last_velocity_rotation
        } else {
            self.host.rotation()
        };
        if let Some(anim) = self.host.anim_mut() {
            anim.on_jumped();
        }
    }

    fn on_breakfall(&mut self) {
        let montage = self.policy.roll_animation(&self.config.ragdoll);
        self.replicated_play_montage(montage, BREAKFALL_PLAY_RATE);
    }

    /// Roll on the next landing regardless of fall speed.
    pub fn set_breakfall_on_next_landing(&mut self, enabled: bool) {
        self.state.breakfall_on_next_landing = enabled;
    }

    /// The capsule hit something while moving.
    pub fn notify_hit(&mut self, hit: &QueryHit) {
        if self.state.flight_mode == FlightMode::None {
            return;
        }
        let cancel = match self.config.flight.cancel_condition {
            FlightCancelCondition::Disabled => false,
            FlightCancelCondition::AnyHit => true,
            FlightCancelCondition::VelocityThreshold => self.flight_interrupt_threshold_check(),
            FlightCancelCondition::Custom => self.policy.flight_interrupt_custom_check(hit),
            FlightCancelCondition::CustomOrThreshold => {
                self.flight_interrupt_threshold_check()
                    || self.policy.flight_interrupt_custom_check(hit)
            }
            FlightCancelCondition::CustomAndThreshold => {
                self.flight_interrupt_threshold_check()
                    && self.policy.flight_interrupt_custom_check(hit)
            }
        };
        if cancel {
            debug!("flight cancelled by a hit at {:?}", hit.impact_point);
            self.set_flight_mode(FlightMode::None);
        }
    }

    /// Whether the absolute velocity is fast enough for a hit to cancel flight.
    pub fn flight_interrupt_threshold_check(&self) -> bool {
        self.host.velocity().abs().norm() >= self.config.flight.interrupt_threshold
    }

    /// Forward movement input to the host. Climbing while flying is scaled by
    /// the atmosphere pressure.
    pub fn add_movement_input(&mut self, mut direction: Vec3, scale: f32, force: bool) {
        if self.host.movement_mode() == MovementMode::Flying && direction.z > 0.0 {
            direction.z *= self.atmosphere_pressure();
        }
        trace!("movement input {direction:?} x {scale}");
        self.host.add_movement_input(direction, scale, force);
    }
}
