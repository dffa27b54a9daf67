/// Rate at which the aiming rotation eases toward the control rotation.
pub const AIM_INTERP_SPEED: f32 = 30.0;

/// Horizontal speed above which the character counts as moving.
pub const MOVING_SPEED_THRESHOLD: f32 = 1.0;

/// Above this speed grounded rotation keeps following velocity even without input.
pub const GROUNDED_ROTATION_MIN_SPEED: f32 = 150.0;

/// Constant-rate targets (deg/s) for the grounded rotation modes.
pub const VELOCITY_DIRECTION_TARGET_SPEED: f32 = 800.0;
pub const LOOKING_DIRECTION_TARGET_SPEED: f32 = 500.0;
pub const AIMING_TARGET_SPEED: f32 = 1000.0;
pub const AIMING_ACTOR_SPEED: f32 = 20.0;

/// Aim-relative yaw window enforced while aiming is restricted and idle.
pub const RESTRICTED_AIM_YAW_MIN: f32 = -100.0;
pub const RESTRICTED_AIM_YAW_MAX: f32 = 100.0;
pub const RESTRICTED_AIM_INTERP_SPEED: f32 = 20.0;

/// Turn-in-place curves are authored at this frame rate.
pub const TURN_IN_PLACE_REFERENCE_FPS: f32 = 30.0;

/// Rotation-amount curve values at or below this are ignored.
pub const ROTATION_AMOUNT_EPS: f32 = 0.001;

pub const ROLLING_ACTOR_SPEED: f32 = 2.0;
pub const FALLING_ACTOR_SPEED: f32 = 5.0;
pub const FALLING_AIMING_ACTOR_SPEED: f32 = 15.0;
pub const SWIMMING_ACTOR_SPEED: f32 = 2.5;

/// Aim yaw rate range (deg/s) mapped onto the grounded rotation multiplier.
pub const AIM_YAW_RATE_RANGE: (f32, f32) = (0.0, 300.0);
pub const AIM_YAW_RATE_MULTIPLIER: (f32, f32) = (1.0, 3.0);

/// Margin over a gait speed before the next gait is reported.
pub const GAIT_SPEED_MARGIN: f32 = 10.0;

/// Movement input needed to sprint.
pub const SPRINT_MIN_INPUT_AMOUNT: f32 = 0.9;

/// Largest yaw between input and aim that still allows sprinting in looking direction.
pub const SPRINT_MAX_AIM_DELTA: f32 = 50.0;

/// Mantles taller than this use the high mantle asset.
pub const LOW_MANTLE_MAX_HEIGHT: f32 = 125.0;

/// Capsule base offset used by every mantle probe.
pub const MANTLE_CAPSULE_BASE_OFFSET: f32 = 2.0;

/// Distance the forward mantle sweep starts behind the character.
pub const MANTLE_TRACE_BACKSTEP: f32 = 30.0;

/// Distance past the wall the downward mantle sweep is placed.
pub const MANTLE_LEDGE_INSET: f32 = 15.0;

/// Ragdoll speed (0..1000) maps onto joint spring stiffness (0..25000).
pub const RAGDOLL_SPRING_VELOCITY_RANGE: (f32, f32) = (0.0, 1000.0);
pub const RAGDOLL_SPRING_RANGE: (f32, f32) = (0.0, 25000.0);

/// Gravity on the ragdoll is cut while falling faster than this.
pub const RAGDOLL_GRAVITY_CUTOFF_Z: f32 = -4000.0;

pub const RAGDOLL_PULL_TARGET: f32 = 750.0;
pub const RAGDOLL_PULL_INTERP_SPEED: f32 = 0.6;

/// Above this planar ragdoll speed the pull force grabs the spine instead of the pelvis.
pub const RAGDOLL_SPINE_PULL_SPEED: f32 = 300.0;

pub const RAGDOLL_GROUND_MARGIN: f32 = 2.0;
pub const RAGDOLL_MONTAGE_BLEND_OUT: f32 = 0.2;

/// Above this speed a jump keeps the velocity heading as its in-air rotation.
pub const JUMP_VELOCITY_ROTATION_SPEED: f32 = 100.0;

pub const LAND_FRICTION_RESET_DELAY: f32 = 0.5;
pub const LAND_BRAKING_FRICTION_WITH_INPUT: f32 = 0.5;
pub const LAND_BRAKING_FRICTION_WITHOUT_INPUT: f32 = 3.0;

pub const BREAKFALL_PLAY_RATE: f32 = 1.35;
pub const STANCE_ROLL_PLAY_RATE: f32 = 1.15;

/// Mapped speed window used by flight rotation and hover probing.
pub const MAPPED_SPEED_MAX: f32 = 3.0;
pub const FLIGHT_CHECK_ALTITUDE_PER_MAPPED_SPEED: f32 = 100.0;
pub const FLIGHT_MIN_INTERP_SPEED: f32 = 0.1;
pub const FLIGHT_PRESSURE_SPEED_SCALE: f32 = 1.5;
pub const SWIM_MAX_LEAN: f32 = 90.0;

pub const PELVIS_BONE: &str = "pelvis";
pub const ROOT_BONE: &str = "root";
pub const SPINE_BONE: &str = "spine_03";
pub const RAGDOLL_POSE_SNAPSHOT: &str = "RagdollPose";

pub const YAW_OFFSET_CURVE: &str = "YawOffset";
pub const ROTATION_AMOUNT_CURVE: &str = "RotationAmount";
