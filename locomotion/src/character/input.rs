/*!
Player actions.

The embedding input layer forwards axis values every frame and button
presses as they happen. Movement axes are relative to the aim rotation.
*/

use log::debug;

use super::Character;
use crate::constants::STANCE_ROLL_PLAY_RATE;
use crate::host::LocomotionHost;
use crate::math::{Rotator, fix_diagonal_gamepad_values, normalize_axis};
use crate::state::{
    FlightMode, Gait, MovementAction, MovementMode, MovementState, RotationMode, Stance, ViewMode,
};
use crate::timer::TimerEvent;

impl<H: LocomotionHost> Character<H> {
    /// Forward/backward axis.
    ///
    /// While flying, the aim pitch is limited by the max forward angle, with
    /// the climbing side scaled down by the atmosphere pressure.
    pub fn movement_input_x(&mut self, value: f32) {
        let previous = std::mem::replace(&mut self.state.input.axes.x, value);
        if previous == 0.0 && value == 0.0 {
            return;
        }
        let (scale, _) = fix_diagonal_gamepad_values(value, self.state.input.axes.y);

        let aim = self.state.kinematics.aiming_rotation;
        let mut pitch = aim.pitch;
        if self.host.movement_mode() == MovementMode::Flying {
            let max_angle = self.config.flight.max_forward_angle;
            let pressure = self.atmosphere_pressure().max(0.0);
            let (low, high) = if value >= 0.0 {
                (-max_angle, max_angle * pressure)
            } else {
                (-max_angle * pressure, max_angle)
            };
            pitch = normalize_axis(pitch).max(low).min(high);
        }
        let direction = Rotator::new(pitch, aim.yaw, 0.0).forward();
        self.add_movement_input(direction, scale, false);
    }

    /// Right/left axis.
    pub fn movement_input_y(&mut self, value: f32) {
        let previous = std::mem::replace(&mut self.state.input.axes.y, value);
        if previous == 0.0 && value == 0.0 {
            return;
        }
        let (_, scale) = fix_diagonal_gamepad_values(self.state.input.axes.x, value);
        let direction = Rotator::from_yaw(self.state.kinematics.aiming_rotation.yaw).right();
        self.add_movement_input(direction, scale, false);
    }

    /// Up/down axis, used while flying or swimming.
    pub fn movement_input_z(&mut self, value: f32) {
        let previous = std::mem::replace(&mut self.state.input.axes.z, value);
        if previous == 0.0 && value == 0.0 {
            return;
        }
        let direction = Rotator::from_yaw(self.state.kinematics.aiming_rotation.yaw).up();
        self.add_movement_input(direction, value, false);
    }

    pub fn camera_pitch_input(&mut self, value: f32) {
        let rate = self.config.player.look_pitch_rate;
        self.host.add_control_input(rate * value, 0.0, 0.0);
    }

    pub fn camera_yaw_input(&mut self, value: f32) {
        let rate = self.config.player.look_yaw_rate;
        self.host.add_control_input(0.0, rate * value, 0.0);
    }

    pub fn camera_roll_input(&mut self, value: f32) {
        let rate = self.config.player.look_roll_rate;
        self.host.add_control_input(0.0, 0.0, rate * value);
    }

    /// Jump pressed: mantle if possible, otherwise jump, stand up, take off,
    /// stop descending or get up, depending on the movement state.
    pub fn jump_action(&mut self) {
        if self.state.movement_action != MovementAction::None {
            return;
        }
        match self.state.movement_state {
            MovementState::Grounded => {
                if self.state.kinematics.has_movement_input && self.mantle_check_grounded() {
                    return;
                }
                match self.state.stance {
                    Stance::Standing => self.host.jump(),
                    Stance::Crouching => self.uncrouch(),
                }
            }
            MovementState::Freefall => {
                if !self.mantle_check_falling() {
                    self.set_flight_mode(FlightMode::Neutral);
                }
            }
            MovementState::Flight => {
                if self.state.flight_mode == FlightMode::Lowering {
                    self.set_flight_mode(FlightMode::Neutral);
                }
            }
            MovementState::Ragdoll => self.replicated_ragdoll_end(),
            _ => {}
        }
    }

    pub fn jump_action_release(&mut self) {
        self.host.stop_jumping();
    }

    pub fn sprint_action(&mut self) {
        self.set_desired_gait(Gait::Fast);
    }

    pub fn sprint_action_release(&mut self) {
        self.set_desired_gait(Gait::Normal);
    }

    pub fn aim_action(&mut self) {
        self.set_rotation_mode(RotationMode::Aiming);
    }

    /// Leave aiming for the desired rotation mode (third person) or looking
    /// direction (first person).
    pub fn aim_action_release(&mut self) {
        match self.state.view_mode {
            ViewMode::ThirdPerson => self.set_rotation_mode(self.state.desired_rotation_mode),
            ViewMode::FirstPerson => self.set_rotation_mode(RotationMode::LookingDirection),
        }
    }

    /// Camera button pressed. Holding it past the switch time swaps the view mode.
    pub fn camera_action(&mut self) {
        self.state.input.camera_action_pressed_time = self.time;
        if let Some(handle) = self.state.input.camera_swap_timer.take() {
            self.timers.clear(handle);
        }
        let hold_time = self.config.player.view_mode_switch_hold_time;
        let handle = self.timers.schedule(self.time, hold_time, TimerEvent::CameraModeSwap);
        self.state.input.camera_swap_timer = Some(handle);
    }

    /// Camera button released. A tap swaps shoulders instead of the view mode.
    pub fn camera_action_release(&mut self) {
        if self.state.view_mode == ViewMode::FirstPerson {
            return;
        }
        let held = self.time - self.state.input.camera_action_pressed_time;
        if held < f64::from(self.config.player.view_mode_switch_hold_time) {
            self.set_right_shoulder(!self.state.right_shoulder);
            if let Some(handle) = self.state.input.camera_swap_timer.take() {
                self.timers.clear(handle);
            }
        }
    }

    pub(super) fn on_switch_camera_mode(&mut self) {
        let next = match self.state.view_mode {
            ViewMode::FirstPerson => ViewMode::ThirdPerson,
            ViewMode::ThirdPerson => ViewMode::FirstPerson,
        };
        self.set_view_mode(next);
    }

    pub fn set_right_shoulder(&mut self, right_shoulder: bool) {
        self.state.right_shoulder = right_shoulder;
        debug!("right shoulder {right_shoulder}");
    }

    /// Toggle crouching; a second press within the double tap timeout rolls.
    pub fn stance_action(&mut self) {
        if self.state.movement_action != MovementAction::None {
            return;
        }
        let previous = self.state.input.last_stance_input_time.replace(self.time);
        let double_tap = previous.is_some_and(|previous| {
            self.time - previous <= f64::from(self.config.player.roll_double_tap_timeout)
        });

        if double_tap {
            let montage = self.policy.roll_animation(&self.config.ragdoll);
            self.replicated_play_montage(montage, STANCE_ROLL_PLAY_RATE);
            match self.state.stance {
                Stance::Standing => self.set_desired_stance(Stance::Crouching),
                Stance::Crouching => self.set_desired_stance(Stance::Standing),
            }
            return;
        }

        if self.state.movement_state == MovementState::Grounded {
            match self.state.stance {
                Stance::Standing => {
                    self.set_desired_stance(Stance::Crouching);
                    self.crouch();
                }
                Stance::Crouching => {
                    self.set_desired_stance(Stance::Standing);
                    self.uncrouch();
                }
            }
        }
    }

    /// Toggle between walking and running.
    pub fn gait_action(&mut self) {
        match self.state.desired_gait {
            Gait::Slow => self.set_desired_gait(Gait::Normal),
            Gait::Normal => self.set_desired_gait(Gait::Slow),
            Gait::Fast => {}
        }
    }

    pub fn ragdoll_action(&mut self) {
        if self.state.movement_state == MovementState::Ragdoll {
            self.replicated_ragdoll_end();
        } else {
            self.replicated_ragdoll_start();
        }
    }

    pub fn velocity_direction_action(&mut self) {
        self.set_desired_rotation_mode(RotationMode::VelocityDirection);
        self.set_rotation_mode(RotationMode::VelocityDirection);
    }

    pub fn looking_direction_action(&mut self) {
        self.set_desired_rotation_mode(RotationMode::LookingDirection);
        self.set_rotation_mode(RotationMode::LookingDirection);
    }
}
