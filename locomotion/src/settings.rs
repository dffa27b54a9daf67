/*!
Movement Settings Model.

A data table of rows, each keyed by name. A row holds one [`MovementSettings`]
entry per rotation mode and stance (plus flying and swimming). Rows are
immutable after loading; the character resolves one row at start-up and then
looks entries up every tick.

TOML layout:

```toml
[normal.looking_direction.standing]
slow_speed = 165.0
normal_speed = 375.0
fast_speed = 600.0
movement_curve = [[0.0, [600.0, 1500.0, 8.0]], [3.0, [800.0, 2000.0, 8.0]]]
rotation_rate_curve = [[0.0, 5.0], [3.0, 20.0]]
```
*/

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::curve::{FloatCurve, VectorCurve};
use crate::error::{ConfigError, Result, read_file};
use crate::math::map_range_clamped;
use crate::state::{Gait, MovementState, RotationMode, Stance};

/// Speed caps and curves for one rotation mode / stance / movement state.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MovementSettings {
    pub slow_speed: f32,
    pub normal_speed: f32,
    pub fast_speed: f32,
    /// Mapped speed to (max acceleration, braking deceleration, ground friction).
    #[serde(default)]
    pub movement_curve: VectorCurve,
    /// Mapped speed to grounded rotation rate.
    #[serde(default)]
    pub rotation_rate_curve: FloatCurve,
}

impl MovementSettings {
    pub fn speed_for_gait(&self, gait: Gait) -> f32 {
        match gait {
            Gait::Slow => self.slow_speed,
            Gait::Normal => self.normal_speed,
            Gait::Fast => self.fast_speed,
        }
    }

    /// Map a speed onto `0..3`: 0 stopped, 1 slow, 2 normal, 3 fast.
    pub fn mapped_speed(&self, speed: f32) -> f32 {
        if speed > self.normal_speed {
            return map_range_clamped((self.normal_speed, self.fast_speed), (2.0, 3.0), speed);
        }
        if speed > self.slow_speed {
            return map_range_clamped((self.slow_speed, self.normal_speed), (1.0, 2.0), speed);
        }
        map_range_clamped((0.0, self.slow_speed), (0.0, 1.0), speed)
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        let speeds = [self.slow_speed, self.normal_speed, self.fast_speed];
        if speeds.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("speeds must be finite and non-negative, got {speeds:?}"),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementStanceSettings {
    pub standing: MovementSettings,
    pub crouching: MovementSettings,
    pub flying: MovementSettings,
    pub swimming: MovementSettings,
}

/// One data-table row.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementStateSettings {
    pub velocity_direction: MovementStanceSettings,
    pub looking_direction: MovementStanceSettings,
    pub aiming: MovementStanceSettings,
}

impl MovementStateSettings {
    /// Entry for the current rotation mode, movement state and stance.
    ///
    /// States without an entry (ragdoll, mantling, freefall) fall back to
    /// velocity direction standing.
    pub fn target_settings(
        &self,
        rotation_mode: RotationMode,
        movement_state: MovementState,
        stance: Stance,
    ) -> &MovementSettings {
        let by_mode = match rotation_mode {
            RotationMode::VelocityDirection => &self.velocity_direction,
            RotationMode::LookingDirection => &self.looking_direction,
            RotationMode::Aiming => &self.aiming,
        };
        match (movement_state, stance) {
            (MovementState::Grounded, Stance::Standing) => &by_mode.standing,
            (MovementState::Grounded, Stance::Crouching) => &by_mode.crouching,
            (MovementState::Flight, _) => &by_mode.flying,
            (MovementState::Swimming, _) => &by_mode.swimming,
            _ => &self.velocity_direction.standing,
        }
    }

    fn validate(&self) -> Result<()> {
        for stances in [&self.velocity_direction, &self.looking_direction, &self.aiming] {
            stances.standing.validate("standing")?;
            stances.crouching.validate("crouching")?;
            stances.flying.validate("flying")?;
            stances.swimming.validate("swimming")?;
        }
        Ok(())
    }
}

/// Named rows of movement settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MovementModel {
    rows: BTreeMap<String, MovementStateSettings>,
}

impl MovementModel {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let model: Self = toml::from_str(content)?;
        for row in model.rows.values() {
            row.validate()?;
        }
        debug!("loaded movement model with {} rows", model.rows.len());
        Ok(model)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    pub fn insert(&mut self, name: impl Into<String>, row: MovementStateSettings) {
        self.rows.insert(name.into(), row);
    }

    pub fn row(&self, name: &str) -> Result<&MovementStateSettings> {
        self.rows
            .get(name)
            .ok_or_else(|| ConfigError::MissingRow(name.to_string()))
    }

    /// The stock "normal" row used when no data table is supplied.
    pub fn builtin() -> Self {
        let movement_curve = VectorCurve::new(vec![
            (0.0, [600.0, 2000.0, 8.0]),
            (1.0, [600.0, 1500.0, 8.0]),
            (2.0, [800.0, 1000.0, 8.0]),
            (3.0, [800.0, 1000.0, 6.0]),
        ]);
        let rotation_rate_curve =
            FloatCurve::new(vec![(0.0, 5.0), (1.0, 7.5), (2.0, 10.0), (3.0, 20.0)]);
        let entry = |slow, normal, fast| MovementSettings {
            slow_speed: slow,
            normal_speed: normal,
            fast_speed: fast,
            movement_curve: movement_curve.clone(),
            rotation_rate_curve: rotation_rate_curve.clone(),
        };
        let stances =
            |standing: MovementSettings, crouching: MovementSettings| MovementStanceSettings {
                flying: entry(300.0, 600.0, 1200.0),
                swimming: entry(100.0, 200.0, 350.0),
                standing,
                crouching,
            };
        let row = MovementStateSettings {
            velocity_direction: stances(entry(165.0, 350.0, 600.0), entry(150.0, 200.0, 300.0)),
            looking_direction: stances(entry(165.0, 375.0, 600.0), entry(150.0, 200.0, 300.0)),
            aiming: stances(entry(165.0, 350.0, 350.0), entry(150.0, 200.0, 200.0)),
        };
        let mut model = Self::default();
        model.insert("normal", row);
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_speed_covers_three_bands() {
        let settings = MovementSettings {
            slow_speed: 100.0,
            normal_speed: 300.0,
            fast_speed: 600.0,
            ..Default::default()
        };
        assert_eq!(settings.mapped_speed(0.0), 0.0);
        assert!((settings.mapped_speed(50.0) - 0.5).abs() < 1e-6);
        assert!((settings.mapped_speed(200.0) - 1.5).abs() < 1e-6);
        assert!((settings.mapped_speed(450.0) - 2.5).abs() < 1e-6);
        assert_eq!(settings.mapped_speed(1000.0), 3.0);
    }

    #[test]
    fn target_settings_picks_entry_by_mode_state_and_stance() {
        let model = MovementModel::builtin();
        let row = model.row("normal").unwrap();
        let aiming =
            row.target_settings(RotationMode::Aiming, MovementState::Grounded, Stance::Standing);
        assert_eq!(aiming.fast_speed, 350.0);
        let crouch = row.target_settings(
            RotationMode::LookingDirection,
            MovementState::Grounded,
            Stance::Crouching,
        );
        assert_eq!(crouch.normal_speed, 200.0);
        let fly = row.target_settings(
            RotationMode::VelocityDirection,
            MovementState::Flight,
            Stance::Standing,
        );
        assert_eq!(fly.fast_speed, 1200.0);
        let fallback =
            row.target_settings(RotationMode::Aiming, MovementState::Ragdoll, Stance::Crouching);
        assert_eq!(fallback, &row.velocity_direction.standing);
    }

    #[test]
    fn missing_row_is_reported_by_name() {
        let model = MovementModel::builtin();
        match model.row("heavy") {
            Err(ConfigError::MissingRow(name)) => assert_eq!(name, "heavy"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rows_parse_from_toml() {
        let model = MovementModel::from_toml_str(
            r#"
            [heavy.velocity_direction.standing]
            slow_speed = 100.0
            normal_speed = 200.0
            fast_speed = 300.0
            rotation_rate_curve = [[0.0, 2.0], [3.0, 4.0]]
            "#,
        )
        .unwrap();
        let row = model.row("heavy").unwrap();
        assert_eq!(row.velocity_direction.standing.speed_for_gait(Gait::Fast), 300.0);
        assert_eq!(row.velocity_direction.standing.rotation_rate_curve.sample(1.5), 3.0);
        assert_eq!(row.aiming.crouching, MovementSettings::default());
    }

    #[test]
    fn negative_speeds_are_rejected() {
        let err = MovementModel::from_toml_str(
            "[bad.aiming.standing]\nslow_speed = -1.0\nnormal_speed = 2.0\nfast_speed = 3.0",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
