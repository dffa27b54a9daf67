/*!
Gait resolution and the dynamic movement settings update.

Every grounded, flying or swimming tick resolves the gait the character is
allowed to move at, the gait its real speed corresponds to, and then pushes
the matching speed cap (and optionally the movement curve) into the host's
movement component through one of three strategies.
*/

use log::trace;

use super::Character;
use crate::config::DynamicSettingsMode;
use crate::constants::{GAIT_SPEED_MARGIN, SPRINT_MAX_AIM_DELTA, SPRINT_MIN_INPUT_AMOUNT};
use crate::host::LocomotionHost;
use crate::math::{Rotator, finterp_to};
use crate::net::{NetMode, RemoteCall};
use crate::state::{Gait, MovementMode, RotationMode, Stance};

/// How movement settings reach the movement component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynamicMovementStrategy {
    /// Speed cap and movement curve every tick.
    Standalone,
    /// Speed cap only, and only when it changed.
    Networked,
    /// Speed cap and movement curve, only when the cap changed.
    Full,
}

impl DynamicMovementStrategy {
    pub fn resolve(mode: DynamicSettingsMode, net_mode: NetMode) -> Self {
        match mode {
            DynamicSettingsMode::Auto if net_mode == NetMode::Standalone => Self::Standalone,
            DynamicSettingsMode::Auto => Self::Networked,
            DynamicSettingsMode::Standalone => Self::Standalone,
            DynamicSettingsMode::Networked => Self::Networked,
            DynamicSettingsMode::Full => Self::Full,
        }
    }
}

/// Movement component speed cap a strategy writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpeedCap {
    Walk,
    Fly,
    Swim,
}

impl<H: LocomotionHost> Character<H> {
    pub(super) fn update_character_movement(&mut self, dt: f32) {
        let allowed_gait = self.allowed_gait();
        let actual_gait = self.actual_gait(allowed_gait);
        self.set_gait(actual_gait);
        self.update_dynamic_movement_settings(dt, allowed_gait);
    }

    fn update_dynamic_movement_settings(&mut self, dt: f32, allowed_gait: Gait) {
        self.settings_key = (
            self.state.rotation_mode,
            self.state.movement_state,
            self.state.stance,
        );
        let settings = self.current_movement_settings();
        let new_max_speed = settings.speed_for_gait(allowed_gait);
        let curve = settings.movement_curve.sample(self.mapped_speed());

        let (cap, speed) = match self.host.movement_mode() {
            mode if mode.is_walking() => {
                (SpeedCap::Walk, self.adjusted_walking_speed(dt, new_max_speed))
            }
            MovementMode::Flying => (SpeedCap::Fly, self.adjusted_flying_speed(new_max_speed)),
            MovementMode::Swimming => (SpeedCap::Swim, self.adjusted_swimming_speed(new_max_speed)),
            _ => return,
        };

        let write_curve = match self.strategy {
            DynamicMovementStrategy::Standalone => {
                self.request_max_speed(cap, speed);
                true
            }
            DynamicMovementStrategy::Networked | DynamicMovementStrategy::Full => {
                if self.net.locally_controlled || self.net.is_authority() {
                    let changed = self.max_speed(cap) != speed;
                    if changed {
                        self.request_max_speed(cap, speed);
                    }
                    changed && self.strategy == DynamicMovementStrategy::Full
                } else {
                    self.set_max_speed_directly(cap, speed);
                    false
                }
            }
        };

        if write_curve {
            let tuning = self.host.tuning_mut();
            tuning.max_acceleration = curve.x;
            match cap {
                SpeedCap::Walk => {
                    tuning.braking_deceleration_walking = curve.y;
                    tuning.ground_friction = curve.z;
                }
                SpeedCap::Fly => tuning.braking_deceleration_flying = curve.y,
                SpeedCap::Swim => tuning.braking_deceleration_swimming = curve.y,
            }
        }
        trace!("{cap:?} speed cap {speed} for {allowed_gait:?}");
    }

    fn max_speed(&self, cap: SpeedCap) -> f32 {
        let tuning = self.host.tuning();
        match cap {
            SpeedCap::Walk => tuning.max_walk_speed,
            SpeedCap::Fly => tuning.max_fly_speed,
            SpeedCap::Swim => tuning.max_swim_speed,
        }
    }

    fn set_max_speed_directly(&mut self, cap: SpeedCap, speed: f32) {
        let tuning = self.host.tuning_mut();
        match cap {
            SpeedCap::Walk => tuning.max_walk_speed = speed,
            SpeedCap::Fly => tuning.max_fly_speed = speed,
            SpeedCap::Swim => tuning.max_swim_speed = speed,
        }
    }

    fn request_max_speed(&mut self, cap: SpeedCap, speed: f32) {
        match cap {
            SpeedCap::Walk => self.set_max_walking_speed(speed),
            SpeedCap::Fly => self.set_max_flying_speed(speed),
            SpeedCap::Swim => self.set_max_swimming_speed(speed),
        }
    }

    /// Request a new walking speed cap. Applied at the end of the tick.
    pub fn set_max_walking_speed(&mut self, speed: f32) {
        if self.net.locally_controlled {
            self.state.speed_sync.walk = speed;
            self.call_server(RemoteCall::ServerSetMaxWalkingSpeed(speed));
        }
        self.state.speed_sync.change_requested = true;
    }

    pub fn set_max_flying_speed(&mut self, speed: f32) {
        if self.net.locally_controlled {
            self.state.speed_sync.fly = speed;
            self.call_server(RemoteCall::ServerSetMaxFlyingSpeed(speed));
        }
        self.state.speed_sync.change_requested = true;
    }

    pub fn set_max_swimming_speed(&mut self, speed: f32) {
        if self.net.locally_controlled {
            self.state.speed_sync.swim = speed;
            self.call_server(RemoteCall::ServerSetMaxSwimmingSpeed(speed));
        }
        self.state.speed_sync.change_requested = true;
    }

    pub(super) fn apply_movement_settings_change(&mut self) {
        let sync = self.state.speed_sync;
        if !sync.change_requested {
            return;
        }
        let tuning = self.host.tuning_mut();
        tuning.max_walk_speed = sync.walk;
        tuning.max_walk_speed_crouched = sync.walk;
        tuning.max_fly_speed = sync.fly;
        tuning.max_swim_speed = sync.swim;
        self.state.speed_sync.change_requested = false;
    }

    /// Walking speed scaled by the floor incline, temperature and weight.
    fn adjusted_walking_speed(&mut self, dt: f32, speed: f32) -> f32 {
        let mut speed = speed;
        if self.host.velocity() == crate::math::Vec3::zeros() {
            self.state.walking_speed_multiplier = 1.0;
        } else {
            let movement = &self.config.movement;
            let target = self.host.floor_normal().z.powf(movement.walking_speed_incline_bias);
            self.state.walking_speed_multiplier = finterp_to(
                self.state.walking_speed_multiplier,
                target,
                dt,
                movement.walking_speed_interp_rate,
            );
            speed *= self.state.walking_speed_multiplier;
        }
        let flight = &self.state.flight;
        speed * flight.temperature_affect.x * flight.weight_affect.x
    }

    fn adjusted_flying_speed(&self, speed: f32) -> f32 {
        let flight = &self.state.flight;
        speed * flight.temperature_affect.y * flight.weight_affect.y
    }

    fn adjusted_swimming_speed(&self, speed: f32) -> f32 {
        let flight = &self.state.flight;
        speed * flight.temperature_affect.z * flight.weight_affect.z
    }

    /// Current speed on the 0 (still) / 1 (slow) / 2 (normal) / 3 (fast) scale.
    pub fn mapped_speed(&self) -> f32 {
        self.current_movement_settings().mapped_speed(self.state.kinematics.speed)
    }

    pub fn can_sprint(&self) -> bool {
        let kinematics = &self.state.kinematics;
        if !kinematics.has_movement_input {
            return false;
        }
        match self.state.rotation_mode {
            RotationMode::VelocityDirection => {
                kinematics.movement_input_amount > SPRINT_MIN_INPUT_AMOUNT
            }
            RotationMode::LookingDirection => {
                let input = Rotator::from_direction(kinematics.replicated_current_acceleration);
                let delta = (input - kinematics.aiming_rotation).normalized();
                kinematics.movement_input_amount > SPRINT_MIN_INPUT_AMOUNT
                    && delta.yaw.abs() < SPRINT_MAX_AIM_DELTA
            }
            RotationMode::Aiming => false,
        }
    }

    /// Fastest gait the current stance and rotation mode permit.
    pub fn allowed_gait(&self) -> Gait {
        let desired = self.state.desired_gait;
        if self.state.stance == Stance::Standing
            && self.state.rotation_mode != RotationMode::Aiming
        {
            return match desired {
                Gait::Fast if self.can_sprint() => Gait::Fast,
                Gait::Fast => Gait::Normal,
                other => other,
            };
        }
        match desired {
            Gait::Slow => Gait::Slow,
            _ => Gait::Normal,
        }
    }

    /// Gait the character is really moving at. Lags behind the allowed gait
    /// while the character speeds up or slows down.
    pub fn actual_gait(&self, allowed_gait: Gait) -> Gait {
        let settings = self.current_movement_settings();
        let speed = self.state.kinematics.speed;
        if speed > settings.normal_speed + GAIT_SPEED_MARGIN {
            if allowed_gait == Gait::Fast {
                return Gait::Fast;
            }
            return Gait::Normal;
        }
        if speed >= settings.slow_speed + GAIT_SPEED_MARGIN {
            return Gait::Normal;
        }
        Gait::Slow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionConfig;
    use crate::math::Vec3;
    use crate::net::{NetContext, Outbound};
    use crate::testing::{TestHost, ai, ai_with_config};

    #[test]
    fn auto_strategy_follows_the_net_mode() {
        use DynamicMovementStrategy as S;
        assert_eq!(S::resolve(DynamicSettingsMode::Auto, NetMode::Standalone), S::Standalone);
        assert_eq!(S::resolve(DynamicSettingsMode::Auto, NetMode::Client), S::Networked);
        assert_eq!(S::resolve(DynamicSettingsMode::Auto, NetMode::DedicatedServer), S::Networked);
        assert_eq!(S::resolve(DynamicSettingsMode::Full, NetMode::Standalone), S::Full);
        assert_eq!(
            S::resolve(DynamicSettingsMode::Standalone, NetMode::ListenServer),
            S::Standalone
        );
    }

    #[test]
    fn standing_velocity_direction_with_full_input_can_sprint() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        character.set_rotation_mode(RotationMode::VelocityDirection);
        character.set_desired_gait(Gait::Fast);
        character.state.kinematics.has_movement_input = true;
        character.state.kinematics.movement_input_amount = 1.0;

        assert!(character.can_sprint());
        assert_eq!(character.allowed_gait(), Gait::Fast);

        character.state.kinematics.movement_input_amount = 0.5;
        assert_eq!(character.allowed_gait(), Gait::Normal);
    }

    #[test]
    fn looking_direction_sprint_needs_input_along_the_aim() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        character.set_desired_gait(Gait::Fast);
        let kinematics = &mut character.state.kinematics;
        kinematics.has_movement_input = true;
        kinematics.movement_input_amount = 1.0;
        kinematics.aiming_rotation = Rotator::from_yaw(0.0);
        kinematics.replicated_current_acceleration = Vec3::new(1.0, 0.5, 0.0);
        assert!(character.can_sprint());

        character.state.kinematics.replicated_current_acceleration = Vec3::new(0.0, 1.0, 0.0);
        assert!(!character.can_sprint());
    }

    #[test]
    fn crouching_and_aiming_cap_the_gait_at_normal() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        character.set_desired_gait(Gait::Fast);
        character.state.kinematics.has_movement_input = true;
        character.state.kinematics.movement_input_amount = 1.0;
        character.set_rotation_mode(RotationMode::Aiming);
        assert!(!character.can_sprint());
        assert_eq!(character.allowed_gait(), Gait::Normal);

        character.set_rotation_mode(RotationMode::LookingDirection);
        character.crouch();
        assert_eq!(character.allowed_gait(), Gait::Normal);
        character.set_desired_gait(Gait::Slow);
        assert_eq!(character.allowed_gait(), Gait::Slow);
    }

    #[test]
    fn actual_gait_lags_behind_the_allowed_gait() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        // Looking direction standing: slow 165, normal 375.
        character.state.kinematics.speed = 500.0;
        assert_eq!(character.actual_gait(Gait::Fast), Gait::Fast);
        assert_eq!(character.actual_gait(Gait::Normal), Gait::Normal);
        character.state.kinematics.speed = 385.0;
        assert_eq!(character.actual_gait(Gait::Fast), Gait::Normal);
        character.state.kinematics.speed = 175.0;
        assert_eq!(character.actual_gait(Gait::Normal), Gait::Normal);
        character.state.kinematics.speed = 174.0;
        assert_eq!(character.actual_gait(Gait::Fast), Gait::Slow);
    }

    #[test]
    fn standalone_writes_speed_cap_and_curve() {
        let mut character = ai(TestHost::on_ground(), NetContext::standalone());
        character.tick(0.1);

        let tuning = character.host().tuning;
        assert_eq!(tuning.max_walk_speed, 375.0);
        assert_eq!(tuning.max_walk_speed_crouched, 375.0);
        assert_eq!(tuning.max_acceleration, 600.0);
        assert_eq!(tuning.braking_deceleration_walking, 2000.0);
        assert_eq!(tuning.ground_friction, 8.0);
        assert_eq!(character.state().gait, Gait::Slow);
        assert!(!character.state().speed_sync.change_requested);
        assert!(character.drain_outbound().is_empty());
    }

    #[test]
    fn incline_slows_walking() {
        let mut host = TestHost::on_ground();
        host.floor_normal = Vec3::new(0.6, 0.0, 0.8);
        host.velocity = Vec3::new(100.0, 0.0, 0.0);
        let mut character = ai(host, NetContext::standalone());
        character.tick(0.1);
        // Multiplier eases from 1 toward 0.8 by half the gap.
        assert!((character.state().walking_speed_multiplier - 0.9).abs() < 1e-5);
        assert!((character.host().tuning.max_walk_speed - 337.5).abs() < 1e-3);
    }

    #[test]
    fn owning_client_sends_the_speed_cap_to_the_server() {
        let mut character = ai(TestHost::on_ground(), NetContext::owning_client());
        character.drain_outbound();
        character.tick(0.1);
        assert_eq!(character.host().tuning.max_walk_speed, 375.0);
        assert_eq!(
            character.drain_outbound(),
            vec![Outbound::Call(RemoteCall::ServerSetMaxWalkingSpeed(375.0))]
        );

        // Unchanged cap: nothing new to send.
        character.tick(0.1);
        assert!(character.drain_outbound().is_empty());
    }

    #[test]
    fn networked_skips_the_curve_and_full_applies_it() {
        let mut character = ai(TestHost::on_ground(), NetContext::owning_client());
        character.tick(0.1);
        assert_eq!(character.host().tuning.max_acceleration, 2048.0);

        let mut config = LocomotionConfig::default();
        config.movement.dynamic_settings = DynamicSettingsMode::Full;
        let mut character =
            ai_with_config(TestHost::on_ground(), NetContext::owning_client(), config);
        assert_eq!(character.strategy(), DynamicMovementStrategy::Full);
        character.tick(0.1);
        assert_eq!(character.host().tuning.max_acceleration, 600.0);
    }

    #[test]
    fn observers_write_the_cap_without_a_request() {
        let mut character = ai(TestHost::on_ground(), NetContext::observer());
        character.tick(0.1);
        assert_eq!(character.host().tuning.max_walk_speed, 375.0);
        // The crouched cap only moves with a requested change.
        assert_eq!(character.host().tuning.max_walk_speed_crouched, 300.0);
        assert!(!character.state().speed_sync.change_requested);
    }
}
