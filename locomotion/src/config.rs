/*!
Character configuration.

One `LocomotionConfig` is built per character archetype (usually loaded from
TOML) and shared by every character of that archetype. Every section and
field is optional in the file; missing values take the defaults below.
*/

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::anim::MontageId;
use crate::collision::CollisionChannel;
use crate::curve::{FloatCurve, VectorCurve};
use crate::error::{ConfigError, Result, read_file};
use crate::math::Vec3;
use crate::state::{
    FlightCancelCondition, Gait, MantleType, OverlayState, RotationMode, Stance, ViewMode,
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub world: WorldSettings,
    pub movement: MovementConfig,
    pub mantle: MantleConfig,
    pub ragdoll: RagdollConfig,
    pub flight: FlightConfig,
    pub player: PlayerConfig,
    pub initial: InitialState,
}

/// Input axis names the embedding input layer binds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InputAxisNames {
    pub x_axis: String,
    pub y_axis: String,
    pub z_axis: String,
    pub pitch: String,
    pub yaw: String,
    pub roll: String,
}

impl Default for InputAxisNames {
    fn default() -> Self {
        Self {
            x_axis: "MoveForward".into(),
            y_axis: "MoveRight".into(),
            z_axis: "MoveUp".into(),
            pitch: "LookUp".into(),
            yaw: "LookRight".into(),
            roll: "LookRoll".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub sea_altitude: f32,
    pub troposphere_height: f32,
    pub mantle_check_channel: CollisionChannel,
    pub flight_check_channel: CollisionChannel,
    pub visibility_channel: CollisionChannel,
    /// Channel the character's own capsule collides on; used for room checks.
    pub character_channel: CollisionChannel,
    pub input: InputAxisNames,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            sea_altitude: 0.0,
            troposphere_height: 1_000_000.0,
            mantle_check_channel: CollisionChannel::WorldStatic,
            flight_check_channel: CollisionChannel::WorldStatic,
            visibility_channel: CollisionChannel::Visibility,
            character_channel: CollisionChannel::Pawn,
            input: InputAxisNames::default(),
        }
    }
}

/// Which dynamic movement settings update runs every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicSettingsMode {
    /// Standalone when the net mode is standalone, networked otherwise.
    #[default]
    Auto,
    Standalone,
    Networked,
    Full,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub movement_model_row: String,
    pub dynamic_settings: DynamicSettingsMode,
    pub walking_speed_incline_bias: f32,
    pub walking_speed_interp_rate: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            movement_model_row: "normal".into(),
            dynamic_settings: DynamicSettingsMode::Auto,
            walking_speed_incline_bias: 1.0,
            walking_speed_interp_rate: 5.0,
        }
    }
}

/// Geometry of the mantle probes.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct MantleTraceSettings {
    pub max_ledge_height: f32,
    pub min_ledge_height: f32,
    pub reach_distance: f32,
    pub forward_trace_radius: f32,
    pub downward_trace_radius: f32,
}

impl MantleTraceSettings {
    fn validate(&self, field: &'static str) -> Result<()> {
        let values = [
            self.max_ledge_height,
            self.min_ledge_height,
            self.reach_distance,
            self.forward_trace_radius,
            self.downward_trace_radius,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid(field, "values must be finite"));
        }
        if self.max_ledge_height <= self.min_ledge_height {
            return Err(invalid(
                field,
                format!(
                    "max ledge height {} must exceed min ledge height {}",
                    self.max_ledge_height, self.min_ledge_height
                ),
            ));
        }
        Ok(())
    }
}

/// Montage and curves for one kind of mantle.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MantleAsset {
    pub montage: MontageId,
    /// Time to (position alpha, xy correction alpha, z correction alpha).
    pub position_correction_curve: VectorCurve,
    /// (unused, distance behind the ledge, height below the ledge) where the animation starts.
    pub starting_offset: [f32; 3],
    pub low_height: f32,
    pub low_play_rate: f32,
    pub low_start_position: f32,
    pub high_height: f32,
    pub high_play_rate: f32,
    pub high_start_position: f32,
}

impl MantleAsset {
    fn climb(montage: &str, starting_offset: [f32; 3], low: [f32; 3], high: [f32; 3]) -> Self {
        Self {
            montage: MontageId::new(montage),
            position_correction_curve: VectorCurve::new(vec![
                (0.0, [0.0, 0.0, 0.0]),
                (0.5, [0.2, 1.0, 1.0]),
                (1.0, [1.0, 1.0, 1.0]),
            ]),
            starting_offset,
            low_height: low[0],
            low_play_rate: low[1],
            low_start_position: low[2],
            high_height: high[0],
            high_play_rate: high[1],
            high_start_position: high[2],
        }
    }

    pub fn starting_offset(&self) -> Vec3 {
        Vec3::from(self.starting_offset)
    }
}

impl Default for MantleAsset {
    fn default() -> Self {
        Self::climb("ALS_Mantle_1m", [0.0, 65.0, 100.0], [50.0, 1.0, 0.5], [100.0, 1.0, 0.0])
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MantleConfig {
    pub grounded: MantleTraceSettings,
    pub automatic: MantleTraceSettings,
    pub falling: MantleTraceSettings,
    pub use_auto_vault: bool,
    pub always_catch_if_falling: bool,
    /// Blend-in alpha over the mantle timeline.
    pub timeline_curve: FloatCurve,
    pub high: MantleAsset,
    pub low: MantleAsset,
    pub falling_catch: MantleAsset,
}

impl Default for MantleConfig {
    fn default() -> Self {
        let trace = |max, min, reach| MantleTraceSettings {
            max_ledge_height: max,
            min_ledge_height: min,
            reach_distance: reach,
            forward_trace_radius: 30.0,
            downward_trace_radius: 30.0,
        };
        Self {
            grounded: trace(250.0, 50.0, 75.0),
            automatic: trace(80.0, 40.0, 50.0),
            falling: trace(150.0, 50.0, 70.0),
            use_auto_vault: true,
            always_catch_if_falling: true,
            timeline_curve: FloatCurve::new(vec![(0.0, 0.0), (0.25, 1.0)]),
            high: MantleAsset::climb(
                "ALS_Mantle_2m",
                [0.0, 65.0, 200.0],
                [125.0, 1.2, 0.6],
                [200.0, 1.2, 0.0],
            ),
            low: MantleAsset::default(),
            falling_catch: MantleAsset::default(),
        }
    }
}

impl MantleConfig {
    pub fn asset(&self, mantle_type: MantleType) -> &MantleAsset {
        match mantle_type {
            MantleType::HighMantle => &self.high,
            MantleType::LowMantle => &self.low,
            MantleType::FallingCatch => &self.falling_catch,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RagdollConfig {
    pub ragdoll_on_land: bool,
    pub ragdoll_on_land_velocity: f32,
    pub ragdoll_on_rollfall: bool,
    pub breakfall_on_land: bool,
    pub breakfall_on_land_velocity: f32,
    pub get_up_front: MontageId,
    pub get_up_back: MontageId,
    pub roll: MontageId,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            ragdoll_on_land: false,
            ragdoll_on_land_velocity: 1000.0,
            ragdoll_on_rollfall: false,
            breakfall_on_land: true,
            breakfall_on_land_velocity: 600.0,
            get_up_front: MontageId::new("ALS_GetUp_Front"),
            get_up_back: MontageId::new("ALS_GetUp_Back"),
            roll: MontageId::new("ALS_N_Roll_F"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub enabled: bool,
    /// Re-check flight eligibility every tick while flying.
    pub always_check_conditions: bool,
    /// Inclusive temperature range in which flight is possible.
    pub temperature_bounds: [f32; 2],
    pub weight_cutoff: f32,
    pub weight_affect_scale: f32,
    pub strength_passive: f32,
    pub strength_active: f32,
    pub max_lean: f32,
    pub max_rotation_rate: f32,
    pub max_forward_angle: f32,
    pub interrupt_threshold: f32,
    pub cancel_condition: FlightCancelCondition,
    pub atmospheric_pressure_falloff: Option<FloatCurve>,
    pub ground_pressure_falloff: Option<FloatCurve>,
    pub temperature_affect: Option<VectorCurve>,
    pub weight_affect: Option<VectorCurve>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            always_check_conditions: false,
            temperature_bounds: [-50.0, 60.0],
            weight_cutoff: 200.0,
            weight_affect_scale: 100.0,
            strength_passive: 200.0,
            strength_active: 1.0,
            max_lean: 30.0,
            max_rotation_rate: 5.0,
            max_forward_angle: 85.0,
            interrupt_threshold: 600.0,
            cancel_condition: FlightCancelCondition::VelocityThreshold,
            atmospheric_pressure_falloff: None,
            ground_pressure_falloff: None,
            temperature_affect: None,
            weight_affect: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub roll_double_tap_timeout: f32,
    pub view_mode_switch_hold_time: f32,
    pub initial_view_mode: ViewMode,
    pub look_pitch_rate: f32,
    pub look_yaw_rate: f32,
    pub look_roll_rate: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            roll_double_tap_timeout: 0.3,
            view_mode_switch_hold_time: 0.2,
            initial_view_mode: ViewMode::ThirdPerson,
            look_pitch_rate: 1.25,
            look_yaw_rate: 1.25,
            look_roll_rate: 1.25,
        }
    }
}

/// Desired values the character starts with.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub gait: Gait,
    pub stance: Stance,
    pub rotation_mode: RotationMode,
    pub overlay_state: OverlayState,
    pub temperature: f32,
    pub weight: f32,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            gait: Gait::Normal,
            stance: Stance::Standing,
            rotation_mode: RotationMode::LookingDirection,
            overlay_state: OverlayState::Default,
            temperature: 20.0,
            weight: 100.0,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl LocomotionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        debug!(
            "loaded locomotion config (row '{}', dynamic settings {:?})",
            config.movement.movement_model_row, config.movement.dynamic_settings
        );
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if !world.sea_altitude.is_finite() {
            return Err(invalid("world.sea_altitude", "must be finite"));
        }
        if !(world.troposphere_height.is_finite() && world.troposphere_height > 0.0) {
            return Err(invalid("world.troposphere_height", "must be finite and positive"));
        }

        self.mantle.grounded.validate("mantle.grounded")?;
        self.mantle.automatic.validate("mantle.automatic")?;
        self.mantle.falling.validate("mantle.falling")?;

        let flight = &self.flight;
        let [low, high] = flight.temperature_bounds;
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(invalid(
                "flight.temperature_bounds",
                format!("expected finite [low, high] with low <= high, got [{low}, {high}]"),
            ));
        }
        if !(flight.weight_affect_scale.is_finite() && flight.weight_affect_scale != 0.0) {
            return Err(invalid("flight.weight_affect_scale", "must be finite and non-zero"));
        }
        if !flight.strength_passive.is_finite() || !flight.weight_cutoff.is_finite() {
            return Err(invalid("flight", "strengths and cutoffs must be finite"));
        }
        if !(self.initial.weight.is_finite() && self.initial.weight > 0.0) {
            return Err(invalid("initial.weight", "must be finite and positive"));
        }

        let player = &self.player;
        if player.roll_double_tap_timeout < 0.0 || player.view_mode_switch_hold_time < 0.0 {
            return Err(invalid("player", "timeouts must be non-negative"));
        }
        Ok(())
    }
}
