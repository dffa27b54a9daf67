//! Per-tick kinematic values derived from the host's velocity and input.

use log::trace;

use super::Character;
use crate::constants::{AIM_INTERP_SPEED, MOVING_SPEED_THRESHOLD};
use crate::host::LocomotionHost;
use crate::math::{Rotator, Vec3, rinterp_to};
use crate::net::{NetRole, ReplicatedProperty};

impl<H: LocomotionHost> Character<H> {
    pub(super) fn set_essential_values(&mut self, dt: f32) {
        let max_acceleration = self.host.tuning().max_acceleration;
        if self.net.role != NetRole::RemoteObserving {
            let acceleration = self.host.current_acceleration();
            let control_rotation = self.host.control_rotation();
            let kinematics = &mut self.state.kinematics;
            let acceleration_changed = kinematics.replicated_current_acceleration != acceleration;
            let rotation_changed = kinematics.replicated_control_rotation != control_rotation;
            kinematics.replicated_current_acceleration = acceleration;
            kinematics.replicated_control_rotation = control_rotation;
            kinematics.eased_max_acceleration = max_acceleration;
            if acceleration_changed {
                self.replicate(ReplicatedProperty::ReplicatedCurrentAcceleration(acceleration));
            }
            if rotation_changed {
                self.replicate(ReplicatedProperty::ReplicatedControlRotation(control_rotation));
            }
        } else {
            let kinematics = &mut self.state.kinematics;
            kinematics.eased_max_acceleration = if max_acceleration != 0.0 {
                max_acceleration
            } else {
                kinematics.eased_max_acceleration / 2.0
            };
        }

        let locally_controlled = self.net.locally_controlled;
        let velocity = self.host.velocity();
        let k = &mut self.state.kinematics;

        k.aiming_rotation =
            rinterp_to(k.aiming_rotation, k.replicated_control_rotation, dt, AIM_INTERP_SPEED);

        // Remote copies see zero between updates; decay instead of snapping.
        let raw_acceleration = (velocity - k.previous_velocity) / dt;
        k.acceleration = if raw_acceleration != Vec3::zeros() || locally_controlled {
            raw_acceleration
        } else {
            k.acceleration / 2.0
        };

        k.speed = velocity.xy().norm();
        k.is_moving = k.speed > MOVING_SPEED_THRESHOLD;
        if k.is_moving {
            k.last_velocity_rotation = Rotator::from_direction(velocity);
        }

        k.movement_input_amount = if k.eased_max_acceleration > 0.0 {
            k.replicated_current_acceleration.norm() / k.eased_max_acceleration
        } else {
            0.0
        };
        k.has_movement_input = k.movement_input_amount > 0.0;
        if k.has_movement_input {
            k.last_movement_input_rotation =
                Rotator::from_direction(k.replicated_current_acceleration);
        }

        k.aim_yaw_rate = ((k.aiming_rotation.yaw - k.previous_aim_yaw) / dt).abs();

        let k = *k;
        if let Some(anim) = self.anim_state() {
            anim.velocity = velocity;
            anim.acceleration = k.acceleration;
            anim.movement_input = k.replicated_current_acceleration;
            anim.is_moving = k.is_moving;
            anim.has_movement_input = k.has_movement_input;
            anim.speed = k.speed;
            anim.movement_input_amount = k.movement_input_amount;
            anim.aiming_rotation = k.aiming_rotation;
            anim.aim_yaw_rate = k.aim_yaw_rate;
        }
        trace!(
            "speed {:.1} input {:.2} accel {:?} aim yaw rate {:.1}",
            k.speed, k.movement_input_amount, k.acceleration, k.aim_yaw_rate
        );
    }

    /// Input acceleration direction in the actor's local frame.
    pub fn movement_input_local(&self) -> Vec3 {
        let input = self
            .state
            .kinematics
            .replicated_current_acceleration
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros);
        self.host.rotation().unrotate_vector(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{NetContext, Outbound};
    use crate::testing::{TestHost, ai};

    #[test]
    fn remote_acceleration_halves_while_updates_are_missing() {
        let mut host = TestHost::on_ground();
        host.velocity = Vec3::new(10.0, 0.0, 0.0);
        let mut character = ai(host, NetContext::observer());

        character.tick(0.1);
        let initial = character.state().kinematics.acceleration;
        assert!((initial - Vec3::new(100.0, 0.0, 0.0)).norm() < 1e-3);

        for k in 1..=4 {
            character.tick(0.1);
            let expected = initial / 2f32.powi(k);
            assert!((character.state().kinematics.acceleration - expected).norm() < 1e-3);
        }
    }

    #[test]
    fn local_acceleration_snaps_to_zero() {
        let mut host = TestHost::on_ground();
        host.velocity = Vec3::new(10.0, 0.0, 0.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.1);
        character.tick(0.1);
        assert_eq!(character.state().kinematics.acceleration, Vec3::zeros());
    }

    #[test]
    fn speed_ignores_vertical_velocity_and_keeps_the_last_heading() {
        let mut host = TestHost::on_ground();
        host.velocity = Vec3::new(0.0, -300.0, -900.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.1);
        let k = character.state().kinematics;
        assert!((k.speed - 300.0).abs() < 1e-3);
        assert!(k.is_moving);
        assert!((k.last_velocity_rotation.yaw + 90.0).abs() < 1e-3);

        character.host_mut().velocity = Vec3::new(0.5, 0.0, 0.0);
        character.tick(0.1);
        let k = character.state().kinematics;
        assert!(!k.is_moving);
        assert!((k.last_velocity_rotation.yaw + 90.0).abs() < 1e-3);
        assert_eq!(character.host().anim_ref().state.speed, k.speed);
    }

    #[test]
    fn input_amount_is_relative_to_max_acceleration() {
        let mut host = TestHost::on_ground();
        host.acceleration = Vec3::new(0.0, 1024.0, 0.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.1);
        let k = character.state().kinematics;
        assert!((k.movement_input_amount - 0.5).abs() < 1e-5);
        assert!(k.has_movement_input);
        assert!((k.last_movement_input_rotation.yaw - 90.0).abs() < 1e-3);
        assert!(character.host().anim_ref().state.has_movement_input);
    }

    #[test]
    fn aim_follows_the_control_rotation() {
        let mut host = TestHost::on_ground();
        host.control_rotation = Rotator::from_yaw(90.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.01);
        let k = character.state().kinematics;
        // 30 * 0.01 of the way there.
        assert!((k.aiming_rotation.yaw - 27.0).abs() < 1e-3);
        assert!((k.aim_yaw_rate - 2700.0).abs() < 1e-1);
    }

    #[test]
    fn server_replicates_input_only_when_it_changes() {
        let mut host = TestHost::on_ground();
        host.acceleration = Vec3::new(500.0, 0.0, 0.0);
        let mut character = ai(host, NetContext::listen_host());
        character.drain_outbound();
        character.tick(0.1);
        let sent = character.drain_outbound();
        assert!(sent.contains(&Outbound::Property(ReplicatedProperty::ReplicatedCurrentAcceleration(
            Vec3::new(500.0, 0.0, 0.0)
        ))));
        assert!(!sent.iter().any(|m| matches!(
            m,
            Outbound::Property(ReplicatedProperty::ReplicatedControlRotation(_))
        )));

        character.tick(0.1);
        assert!(!character.drain_outbound().iter().any(|m| matches!(
            m,
            Outbound::Property(ReplicatedProperty::ReplicatedCurrentAcceleration(_))
        )));
    }

    #[test]
    fn observers_keep_replicated_input() {
        let mut character = ai(TestHost::on_ground(), NetContext::observer());
        character.apply_replicated(ReplicatedProperty::ReplicatedCurrentAcceleration(Vec3::new(
            2048.0, 0.0, 0.0,
        )));
        character.tick(0.1);
        assert!((character.state().kinematics.movement_input_amount - 1.0).abs() < 1e-5);
    }
}
