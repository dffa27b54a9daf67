/*!
Flight and atmosphere model.

Temperature and weight scale every movement mode's speed cap through the
affect curves. While flying, the wings push down against whatever lies
below (ground pressure) to produce the auto-hover input, and climbing input
is weakened by the atmospheric pressure at the current altitude.
*/

use log::{debug, trace};

use super::Character;
use crate::collision::CollisionWorld;
use crate::constants::FLIGHT_PRESSURE_SPEED_SCALE;
use crate::host::LocomotionHost;
use crate::math::{Rotator, Vec3, map_range_clamped};
use crate::state::FlightMode;

impl<H: LocomotionHost> Character<H> {
    pub fn set_temperature(&mut self, temperature: f32) {
        let flight = &mut self.state.flight;
        flight.temperature = temperature;
        flight.temperature_affect = match &self.config.flight.temperature_affect {
            Some(curve) => curve.sample(temperature),
            None => Vec3::repeat(1.0),
        };
        debug!("temperature {temperature}, affect {:?}", flight.temperature_affect);
    }

    pub fn set_weight(&mut self, weight: f32) {
        let scale = self.config.flight.weight_affect_scale;
        let flight = &mut self.state.flight;
        flight.effective_weight = weight;
        flight.weight_affect = match &self.config.flight.weight_affect {
            Some(curve) => curve.sample(weight / scale),
            None => Vec3::repeat(1.0),
        };
        debug!("weight {weight}, affect {:?}", flight.weight_affect);
    }

    /// Height above sea level.
    pub fn absolute_altitude(&self) -> f32 {
        self.host.location().z - self.config.world.sea_altitude
    }

    /// Air pressure at the current altitude; 1 when no falloff curve is configured.
    pub fn atmosphere_pressure(&self) -> f32 {
        match &self.config.flight.atmospheric_pressure_falloff {
            Some(curve) => {
                curve.sample(self.absolute_altitude() / self.config.world.troposphere_height)
            }
            None => 1.0,
        }
    }

    /// Distance from the bottom of the capsule to the first blocking surface
    /// along `direction`, or `distance` when nothing is in range.
    pub fn flight_distance_check(&self, distance: f32, direction: Vec3) -> f32 {
        let start = self.host.location() - Vec3::new(0.0, 0.0, self.host.capsule().half_height);
        let end = start + direction * distance;
        self.host
            .world()
            .line_trace(start, end, self.config.world.flight_check_channel)
            .map_or(distance, |hit| hit.distance)
    }

    pub(super) fn update_relative_altitude(&mut self) {
        let altitude = self.flight_distance_check(self.config.world.troposphere_height, -Vec3::z());
        self.state.flight.relative_altitude = altitude;
    }

    pub(super) fn update_flight_movement(&mut self, _dt: f32) {
        if self.config.flight.always_check_conditions && !self.can_fly() {
            debug!("flight conditions no longer met");
            self.set_flight_mode(FlightMode::None);
            return;
        }

        let flight = &self.config.flight;
        let weight = self.state.flight.effective_weight.max(f32::EPSILON);
        let wing_pressure_depth = flight.strength_passive / weight;

        let velocity = self.host.velocity();
        let speed = velocity.norm();
        let velocity_direction = velocity.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
        let max_fly_speed = self.host.tuning().max_fly_speed;
        let full_pressure_speed = max_fly_speed * FLIGHT_PRESSURE_SPEED_SCALE;
        let velocity_alpha = map_range_clamped((0.0, full_pressure_speed), (0.0, 1.0), speed);
        let pressure_direction = (-Vec3::z()).lerp(&-velocity_direction, velocity_alpha);

        let pressure_alpha = if wing_pressure_depth > 0.0 {
            let distance = self.flight_distance_check(wing_pressure_depth, pressure_direction);
            distance / wing_pressure_depth
        } else {
            1.0
        };
        let ground_pressure = flight
            .ground_pressure_falloff
            .as_ref()
            .map_or(1.0, |curve| curve.sample(pressure_alpha));

        let temperature = self.state.flight.temperature_affect.y;
        let weight = self.state.flight.weight_affect.y;
        let active = flight.strength_active;

        let auto_hover = match self.state.flight_mode {
            FlightMode::None => return,
            FlightMode::Neutral => (ground_pressure + 0.5) / 1.5 * temperature * weight,
            FlightMode::Raising => (ground_pressure + active) * temperature * (weight * 1.5),
            FlightMode::Lowering => {
                ground_pressure * 0.5 + (-active + (temperature - 1.0)) - weight
            }
            FlightMode::Hovering => (ground_pressure + 0.5) / 1.5 * temperature * (weight / 2.0),
        };
        trace!("auto hover {auto_hover} (ground pressure {ground_pressure})");

        let up = Rotator::from_yaw(self.state.kinematics.aiming_rotation.yaw).up();
        self.add_movement_input(up, auto_hover, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionConfig;
    use crate::curve::{FloatCurve, VectorCurve};
    use crate::net::NetContext;
    use crate::state::{MovementMode, MovementState};
    use crate::testing::{TestHost, ai_with_config};

    fn flight_config() -> LocomotionConfig {
        let mut config = LocomotionConfig::default();
        config.flight.enabled = true;
        config
    }

    fn airborne(config: LocomotionConfig, altitude: f32) -> Character<TestHost> {
        let mut host = TestHost::on_ground();
        host.location = Vec3::new(0.0, 0.0, altitude + 90.0);
        ai_with_config(host, NetContext::standalone(), config)
    }

    fn last_hover(character: &Character<TestHost>) -> (Vec3, f32, bool) {
        *character.host().movement_inputs.last().expect("no hover input")
    }

    #[test]
    fn affect_curves_default_to_one() {
        let character = airborne(LocomotionConfig::default(), 0.0);
        assert_eq!(character.state().flight.temperature_affect, Vec3::repeat(1.0));
        assert_eq!(character.state().flight.weight_affect, Vec3::repeat(1.0));
    }

    #[test]
    fn affect_curves_scale_speeds_per_mode() {
        let mut config = LocomotionConfig::default();
        config.flight.temperature_affect = Some(VectorCurve::new(vec![
            (0.0, [1.0, 1.0, 1.0]),
            (40.0, [0.5, 1.0, 0.25]),
        ]));
        config.flight.weight_affect = Some(VectorCurve::new(vec![
            (0.0, [1.0, 1.0, 1.0]),
            (2.0, [0.5, 0.5, 0.5]),
        ]));
        let mut character = airborne(config, 0.0);

        character.set_temperature(40.0);
        assert_eq!(character.state().flight.temperature_affect, Vec3::new(0.5, 1.0, 0.25));
        character.set_weight(200.0);
        assert_eq!(character.state().flight.weight_affect, Vec3::repeat(0.5));

        character.tick(0.1);
        // 375 * 0.5 * 0.5
        assert!((character.host().tuning.max_walk_speed - 93.75).abs() < 1e-3);
    }

    #[test]
    fn pressure_falls_off_with_altitude() {
        let mut config = flight_config();
        config.world.troposphere_height = 1000.0;
        config.flight.atmospheric_pressure_falloff =
            Some(FloatCurve::new(vec![(0.0, 1.0), (1.0, 0.0)]));
        let character = airborne(config, 160.0);
        // Actor at z 250.
        assert!((character.atmosphere_pressure() - 0.75).abs() < 1e-5);
        assert_eq!(airborne(flight_config(), 160.0).atmosphere_pressure(), 1.0);
    }

    #[test]
    fn distance_check_measures_from_the_capsule_bottom() {
        let character = airborne(flight_config(), 500.0);
        assert!((character.flight_distance_check(1000.0, -Vec3::z()) - 500.0).abs() < 1e-2);
        assert_eq!(character.flight_distance_check(200.0, -Vec3::z()), 200.0);
        assert_eq!(character.flight_distance_check(200.0, Vec3::z()), 200.0);
    }

    #[test]
    fn flying_tick_tracks_relative_altitude() {
        let mut character = airborne(flight_config(), 300.0);
        character.set_flight_mode(FlightMode::Neutral);
        character.tick(0.1);
        assert!((character.state().flight.relative_altitude - 300.0).abs() < 1e-2);
    }

    #[test]
    fn hover_strength_per_flight_mode() {
        let cases = [
            (FlightMode::Neutral, 1.0),
            (FlightMode::Raising, 3.0),
            (FlightMode::Lowering, -1.5),
            (FlightMode::Hovering, 0.5),
        ];
        for (mode, expected) in cases {
            let mut character = airborne(flight_config(), 1000.0);
            character.set_flight_mode(mode);
            character.update_flight_movement(0.1);
            let (direction, scale, force) = last_hover(&character);
            assert!((direction - Vec3::z()).norm() < 1e-5, "{mode:?}");
            assert!((scale - expected).abs() < 1e-5, "{mode:?}: {scale}");
            assert!(force);
        }
    }

    #[test]
    fn ground_pressure_uses_the_depth_alpha() {
        let mut config = flight_config();
        config.flight.ground_pressure_falloff = Some(FloatCurve::new(vec![(0.0, 2.5), (1.0, 1.0)]));
        // Wing depth 200 / 100 = 2 units; the ground is far out of reach.
        let mut high = airborne(config.clone(), 1000.0);
        high.set_flight_mode(FlightMode::Neutral);
        high.update_flight_movement(0.1);
        assert!((last_hover(&high).1 - 1.0).abs() < 1e-5);

        // One unit above the ground: alpha 0.5, pressure 1.75.
        let mut low = airborne(config, 1.0);
        low.set_flight_mode(FlightMode::Neutral);
        low.update_flight_movement(0.1);
        assert!((last_hover(&low).1 - 1.5).abs() < 1e-3);
    }

    #[test]
    fn always_check_drops_out_of_flight() {
        let mut config = flight_config();
        config.flight.always_check_conditions = true;
        let mut character = airborne(config, 1000.0);
        character.set_flight_mode(FlightMode::Raising);
        assert_eq!(character.state().movement_state, MovementState::Flight);

        character.set_temperature(90.0);
        character.tick(0.1);
        assert_eq!(character.state().flight_mode, FlightMode::None);
        assert_eq!(character.host().movement_mode, MovementMode::Falling);
        assert!(character.host().movement_inputs.is_empty());
    }

    #[test]
    fn without_always_check_flight_survives_bad_conditions() {
        let mut character = airborne(flight_config(), 1000.0);
        character.set_flight_mode(FlightMode::Neutral);
        character.set_weight(500.0);
        character.tick(0.1);
        assert_eq!(character.state().flight_mode, FlightMode::Neutral);
        assert!(!character.host().movement_inputs.is_empty());
    }
}
