/*!
Rotation controller.

Each movement state eases the actor toward a target rotation. Targets come
from velocity, input, aim or animation curves; the interpolation is always
two-staged: the stored target rotation moves at a constant rate toward the
requested target, and the actor eases toward the stored target.
*/

use super::Character;
use crate::constants::*;
use crate::host::LocomotionHost;
use crate::math::{
    Rotator, Vec3, finterp_to, map_range_clamped, map_range_unclamped, normalize_axis,
    rinterp_constant_to, rinterp_to,
};
use crate::net::NetRole;
use crate::state::{Gait, MovementAction, RotationMode};

impl<H: LocomotionHost> Character<H> {
    /// Ease the target rotation toward `target` at a constant rate, then the
    /// actor toward the target rotation.
    pub fn smooth_character_rotation(
        &mut self,
        target: Rotator,
        target_speed: f32,
        actor_speed: f32,
        dt: f32,
    ) {
        self.state.target_rotation =
            rinterp_constant_to(self.state.target_rotation, target, dt, target_speed);
        let rotation =
            rinterp_to(self.host.rotation(), self.state.target_rotation, dt, actor_speed);
        self.host.set_rotation(rotation);
    }

    /// Keep the actor within `[min_yaw, max_yaw]` of the aim yaw.
    pub fn limit_rotation(&mut self, min_yaw: f32, max_yaw: f32, interp_speed: f32, dt: f32) {
        let delta = (self.state.kinematics.aiming_rotation - self.host.rotation()).normalized().yaw;
        if delta < min_yaw || delta > max_yaw {
            let limit = if delta > 0.0 { min_yaw } else { max_yaw };
            let target = Rotator::from_yaw(self.state.kinematics.aiming_rotation.yaw + limit);
            self.smooth_character_rotation(target, 0.0, interp_speed, dt);
        }
    }

    pub fn set_actor_location_and_target_rotation(&mut self, location: Vec3, rotation: Rotator) {
        self.host.set_location_and_rotation(location, rotation);
        self.state.target_rotation = rotation;
    }

    /// Rotation-rate curve at the mapped speed, sped up while the camera turns quickly.
    fn grounded_rotation_rate(&self) -> f32 {
        let curve = self
            .current_movement_settings()
            .rotation_rate_curve
            .sample(self.mapped_speed());
        let aim_yaw_rate = self.state.kinematics.aim_yaw_rate;
        curve * map_range_clamped(AIM_YAW_RATE_RANGE, AIM_YAW_RATE_MULTIPLIER, aim_yaw_rate)
    }

    pub(super) fn update_grounded_rotation(&mut self, dt: f32) {
        let k = self.state.kinematics;
        match self.state.movement_action {
            MovementAction::None => {
                let moving = (k.is_moving && k.has_movement_input)
                    || k.speed > GROUNDED_ROTATION_MIN_SPEED;
                let can_update_moving = moving && !self.host.has_any_root_motion();
                if can_update_moving {
                    self.update_moving_grounded_rotation(dt);
                } else {
                    self.update_idle_grounded_rotation(dt);
                }
            }
            MovementAction::Rolling => {
                if k.has_movement_input {
                    let target = Rotator::from_yaw(k.last_movement_input_rotation.yaw);
                    self.smooth_character_rotation(target, 0.0, ROLLING_ACTOR_SPEED, dt);
                }
            }
            _ => {}
        }
    }

    fn update_moving_grounded_rotation(&mut self, dt: f32) {
        let rate = self.grounded_rotation_rate();
        let k = self.state.kinematics;
        match self.state.rotation_mode {
            RotationMode::VelocityDirection => {
                let target = Rotator::from_yaw(k.last_velocity_rotation.yaw);
                self.smooth_character_rotation(target, VELOCITY_DIRECTION_TARGET_SPEED, rate, dt);
            }
            RotationMode::LookingDirection => {
                let yaw = if self.state.gait == Gait::Fast {
                    k.last_velocity_rotation.yaw
                } else {
                    k.aiming_rotation.yaw + self.anim_curve(YAW_OFFSET_CURVE)
                };
                let target = Rotator::from_yaw(yaw);
                self.smooth_character_rotation(target, LOOKING_DIRECTION_TARGET_SPEED, rate, dt);
            }
            RotationMode::Aiming => {
                let target = Rotator::from_yaw(k.aiming_rotation.yaw);
                self.smooth_character_rotation(target, AIMING_TARGET_SPEED, AIMING_ACTOR_SPEED, dt);
            }
        }
    }

    fn update_idle_grounded_rotation(&mut self, dt: f32) {
        if self.state.restrict_aiming {
            self.limit_rotation(
                RESTRICTED_AIM_YAW_MIN,
                RESTRICTED_AIM_YAW_MAX,
                RESTRICTED_AIM_INTERP_SPEED,
                dt,
            );
        }

        // Turn-in-place animations drive the yaw directly.
        let amount = self.anim_curve(ROTATION_AMOUNT_CURVE);
        if amount.abs() > ROTATION_AMOUNT_EPS {
            let step = amount * dt * TURN_IN_PLACE_REFERENCE_FPS;
            if self.net.role == NetRole::LocalPredicting {
                self.state.target_rotation.yaw =
                    normalize_axis(self.state.target_rotation.yaw + step);
                let target = self.state.target_rotation;
                self.host.set_rotation(target);
            } else {
                self.host.add_world_rotation(Rotator::from_yaw(step));
            }
            self.state.target_rotation = self.host.rotation();
        }
    }

    pub(super) fn update_falling_rotation(&mut self, dt: f32) {
        match self.state.rotation_mode {
            RotationMode::VelocityDirection | RotationMode::LookingDirection => {
                let target = Rotator::from_yaw(self.state.in_air_rotation.yaw);
                self.smooth_character_rotation(target, 0.0, FALLING_ACTOR_SPEED, dt);
            }
            RotationMode::Aiming => {
                let target = Rotator::from_yaw(self.state.kinematics.aiming_rotation.yaw);
                self.smooth_character_rotation(target, 0.0, FALLING_AIMING_ACTOR_SPEED, dt);
                self.state.in_air_rotation = self.host.rotation();
            }
        }
    }

    /// Lean into the input, more so high above the ground and at speed.
    pub(super) fn update_flight_rotation(&mut self, dt: f32) {
        let mapped_speed = self.mapped_speed();
        let check_altitude = mapped_speed * FLIGHT_CHECK_ALTITUDE_PER_MAPPED_SPEED;
        let altitude = self.state.flight.relative_altitude;
        let altitude_alpha = map_range_clamped((0.0, check_altitude), (0.0, 1.0), altitude);
        let rotation_alpha = altitude_alpha * (mapped_speed / MAPPED_SPEED_MAX);

        let flight = &self.config.flight;
        let max_rate = flight.max_rotation_rate;
        let lean = self.movement_input_local() * flight.max_lean * rotation_alpha;

        let actor = self.host.rotation();
        let pitch = finterp_to(actor.pitch, -lean.x, dt, max_rate);
        let roll = finterp_to(actor.roll, lean.y, dt, max_rate);
        let aim_yaw = self.state.kinematics.aiming_rotation.yaw;

        if self.state.kinematics.has_movement_input {
            match self.state.rotation_mode {
                RotationMode::VelocityDirection | RotationMode::LookingDirection => {
                    let speed = map_range_clamped(
                        (0.0, MAPPED_SPEED_MAX),
                        (FLIGHT_MIN_INTERP_SPEED, max_rate),
                        mapped_speed,
                    );
                    let target = Rotator::new(pitch, aim_yaw, roll);
                    self.smooth_character_rotation(target, 0.0, speed, dt);
                }
                RotationMode::Aiming => {
                    let target = Rotator::new(pitch, aim_yaw, roll / 2.0);
                    self.smooth_character_rotation(target, 0.0, max_rate, dt);
                }
            }
        } else {
            self.smooth_character_rotation(Rotator::from_yaw(actor.yaw), 0.0, max_rate, dt);
        }
        self.state.in_air_rotation = self.host.rotation();
    }

    pub(super) fn update_swimming_rotation(&mut self, dt: f32) {
        let lean =
            map_range_unclamped((0.0, MAPPED_SPEED_MAX), (0.0, SWIM_MAX_LEAN), self.mapped_speed());
        let target = Rotator::new(
            lean * -self.movement_input_local().x,
            self.state.kinematics.aiming_rotation.yaw,
            0.0,
        );
        self.smooth_character_rotation(target, 0.0, SWIMMING_ACTOR_SPEED, dt);
    }
}
