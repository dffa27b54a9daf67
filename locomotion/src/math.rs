/*!
Math and geometry helpers shared by every locomotion subsystem.

Conventions used throughout the crate:
- Z is up, X is forward, Y is right for a zero rotation.
- Angles are degrees. `Rotator` stores pitch (nose up), yaw (about +Z) and
  roll (right side down) as independent axes so that transforms can be added
  and subtracted component-wise.
- Distances are world units (the tuned constants assume centimetre scale).
*/

use std::ops::{Add, Mul, Neg, Sub};

use nalgebra as na;
use num_traits::Float;
use serde::Deserialize;

use crate::collision::{CapsuleSpec, CollisionChannel, CollisionWorld, QueryShape};
use crate::state::MovementDirection;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Squared distance under which interpolation snaps to its target.
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Per-axis tolerance used when comparing rotators.
pub const ROTATOR_TOLERANCE: f32 = 1.0e-4;

/// Wrap an angle in degrees into `(-180, 180]`.
#[inline]
pub fn normalize_axis(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    if a > 180.0 {
        a -= 360.0;
    }
    a
}

/// Euler rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    #[inline]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// A yaw-only rotator.
    #[inline]
    pub const fn from_yaw(yaw: f32) -> Self {
        Self {
            pitch: 0.0,
            yaw,
            roll: 0.0,
        }
    }

    /// Keep only the yaw component.
    #[inline]
    pub fn yaw_only(self) -> Self {
        Self::from_yaw(self.yaw)
    }

    /// Every axis wrapped into `(-180, 180]`.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            pitch: normalize_axis(self.pitch),
            yaw: normalize_axis(self.yaw),
            roll: normalize_axis(self.roll),
        }
    }

    pub fn is_nearly_zero(self, tolerance: f32) -> bool {
        normalize_axis(self.pitch).abs() <= tolerance
            && normalize_axis(self.yaw).abs() <= tolerance
            && normalize_axis(self.roll).abs() <= tolerance
    }

    /// Compare orientations axis by axis, ignoring full turns.
    pub fn equals(self, other: Rotator, tolerance: f32) -> bool {
        (self - other).is_nearly_zero(tolerance)
    }

    /// Orientation of a direction vector. Roll is always zero.
    pub fn from_direction(v: Vec3) -> Self {
        let yaw = v.y.atan2(v.x).to_degrees();
        let pitch = v.z.atan2((v.x * v.x + v.y * v.y).sqrt()).to_degrees();
        Self {
            pitch,
            yaw,
            roll: 0.0,
        }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler_angles(
            -self.roll.to_radians(),
            -self.pitch.to_radians(),
            self.yaw.to_radians(),
        )
    }

    pub fn from_quat(q: &Quat) -> Self {
        let (roll, pitch, yaw) = q.euler_angles();
        Self {
            pitch: -pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            roll: -roll.to_degrees(),
        }
    }

    /// Unit vector the rotator points along.
    pub fn forward(self) -> Vec3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vec3::new(cp * cy, cp * sy, sp)
    }

    pub fn right(self) -> Vec3 {
        self.to_quat() * Vec3::y()
    }

    pub fn up(self) -> Vec3 {
        self.to_quat() * Vec3::z()
    }

    #[inline]
    pub fn rotate_vector(self, v: Vec3) -> Vec3 {
        self.to_quat() * v
    }

    /// Express a world vector in this rotator's local frame.
    #[inline]
    pub fn unrotate_vector(self, v: Vec3) -> Vec3 {
        self.to_quat().inverse() * v
    }
}

impl Add for Rotator {
    type Output = Rotator;
    fn add(self, rhs: Rotator) -> Rotator {
        Rotator::new(
            self.pitch + rhs.pitch,
            self.yaw + rhs.yaw,
            self.roll + rhs.roll,
        )
    }
}

impl Sub for Rotator {
    type Output = Rotator;
    fn sub(self, rhs: Rotator) -> Rotator {
        Rotator::new(
            self.pitch - rhs.pitch,
            self.yaw - rhs.yaw,
            self.roll - rhs.roll,
        )
    }
}

impl Mul<f32> for Rotator {
    type Output = Rotator;
    fn mul(self, rhs: f32) -> Rotator {
        Rotator::new(self.pitch * rhs, self.yaw * rhs, self.roll * rhs)
    }
}

impl Neg for Rotator {
    type Output = Rotator;
    fn neg(self) -> Rotator {
        Rotator::new(-self.pitch, -self.yaw, -self.roll)
    }
}

/// Location, rotation and scale in world space.
///
/// Rotation is kept as a `Rotator` so that `transform_add(transform_sub(a, b), b)`
/// reproduces `a` exactly, which the mantle blend relies on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::new(0.0, 0.0, 0.0),
        rotation: Rotator::ZERO,
        scale: Vec3::new(1.0, 1.0, 1.0),
    };

    #[inline]
    pub fn new(translation: Vec3, rotation: Rotator) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::repeat(1.0),
        }
    }

    /// Rigid part of the transform as an nalgebra isometry (scale dropped).
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation.to_quat(),
        )
    }

    #[inline]
    pub fn from_iso(iso: &Iso) -> Self {
        Self::new(iso.translation.vector, Rotator::from_quat(&iso.rotation))
    }

    pub fn approx_eq(&self, other: &Transform, tolerance: f32) -> bool {
        (self.translation - other.translation).abs().max() <= tolerance
            && (self.scale - other.scale).abs().max() <= tolerance
            && self.rotation.equals(other.rotation, tolerance)
    }
}

/// Component-wise difference of two transforms.
pub fn transform_sub(a: &Transform, b: &Transform) -> Transform {
    Transform {
        translation: a.translation - b.translation,
        rotation: a.rotation - b.rotation,
        scale: a.scale - b.scale,
    }
}

/// Component-wise sum of two transforms.
pub fn transform_add(a: &Transform, b: &Transform) -> Transform {
    Transform {
        translation: a.translation + b.translation,
        rotation: a.rotation + b.rotation,
        scale: a.scale + b.scale,
    }
}

/// Blend two transforms. Rotation takes the shortest arc.
pub fn tlerp(a: &Transform, b: &Transform, alpha: f32) -> Transform {
    if alpha <= 0.0 {
        return *a;
    }
    if alpha >= 1.0 {
        return *b;
    }
    let qa = a.rotation.to_quat();
    let qb = b.rotation.to_quat();
    let mut target = *qb.quaternion();
    if qa.quaternion().dot(&target) < 0.0 {
        target = -target;
    }
    let blended = Quat::new_normalize(qa.quaternion().lerp(&target, alpha));
    Transform {
        translation: a.translation.lerp(&b.translation, alpha),
        rotation: Rotator::from_quat(&blended),
        scale: a.scale.lerp(&b.scale, alpha),
    }
}

/// Re-express a world transform in the frame of `component`.
pub fn world_to_component_local(world: &Transform, component: &Iso) -> Transform {
    Transform::from_iso(&(component.inverse() * world.iso()))
}

/// Bring a transform stored relative to `component` back into world space.
///
/// The component may have moved or rotated since the local transform was
/// captured; the result follows it.
pub fn mantle_component_local_to_world(local: &Transform, component: &Iso) -> Transform {
    Transform::from_iso(&(component * local.iso()))
}

/// Exponential approach of `current` toward `target`.
///
/// A non-positive `speed` snaps to the target.
pub fn finterp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist * dist < SMALL_NUMBER {
        return target;
    }
    current + dist * (dt * speed).clamp(0.0, 1.0)
}

/// Exponential approach of a rotator, axis by axis along the shortest path.
pub fn rinterp_to(current: Rotator, target: Rotator, dt: f32, speed: f32) -> Rotator {
    if dt == 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let delta = (target - current).normalized();
    if delta.is_nearly_zero(ROTATOR_TOLERANCE) {
        return target;
    }
    (current + delta * (speed * dt).clamp(0.0, 1.0)).normalized()
}

/// Constant-rate approach of a rotator: each axis moves by at most `speed * dt` degrees.
pub fn rinterp_constant_to(current: Rotator, target: Rotator, dt: f32, speed: f32) -> Rotator {
    if dt == 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let step = speed * dt;
    let delta = (target - current).normalized();
    Rotator::new(
        current.pitch + delta.pitch.clamp(-step, step),
        current.yaw + delta.yaw.clamp(-step, step),
        current.roll + delta.roll.clamp(-step, step),
    )
    .normalized()
}

fn range_pct<T: Float>(min: T, max: T, value: T) -> T {
    let divisor = max - min;
    if divisor.abs() <= T::epsilon() {
        return if value >= max { T::one() } else { T::zero() };
    }
    (value - min) / divisor
}

/// Map `value` from `input` onto `output`, clamping to the output range.
pub fn map_range_clamped<T: Float>(input: (T, T), output: (T, T), value: T) -> T {
    let pct = range_pct(input.0, input.1, value).max(T::zero()).min(T::one());
    output.0 + (output.1 - output.0) * pct
}

/// Map `value` from `input` onto `output` without clamping.
pub fn map_range_unclamped<T: Float>(input: (T, T), output: (T, T), value: T) -> T {
    output.0 + (output.1 - output.0) * range_pct(input.0, input.1, value)
}

/// Point `z_offset` units below the bottom of an upright capsule.
#[inline]
pub fn capsule_base_location(center: Vec3, capsule: CapsuleSpec, z_offset: f32) -> Vec3 {
    center - Vec3::z() * (capsule.half_height + z_offset)
}

/// Capsule centre for a capsule whose base (minus `z_offset`) sits at `base`.
#[inline]
pub fn capsule_location_from_base(base: Vec3, z_offset: f32, capsule: CapsuleSpec) -> Vec3 {
    Vec3::new(base.x, base.y, base.z + capsule.half_height + z_offset)
}

/// Whether an upright capsule fits at `target`.
///
/// Sweeps a sphere (capsule radius + `radius_offset`) vertically through the
/// capsule's cylinder section. Any blocking or start-penetrating hit fails.
pub fn capsule_has_room<W: CollisionWorld + ?Sized>(
    world: &W,
    capsule: CapsuleSpec,
    target: Vec3,
    height_offset: f32,
    radius_offset: f32,
    channel: CollisionChannel,
) -> bool {
    let z_target = capsule.half_height_without_hemisphere() - radius_offset + height_offset;
    let start = Vec3::new(target.x, target.y, target.z + z_target);
    let end = Vec3::new(target.x, target.y, target.z - z_target);
    let shape = QueryShape::Sphere {
        radius: capsule.radius + radius_offset,
    };
    world.sweep(start, end, shape, channel).is_none()
}

/// Whether `angle` lies inside `[min, max]`, widened or narrowed by `buffer`.
pub fn angle_in_range(angle: f32, min: f32, max: f32, buffer: f32, increase_buffer: bool) -> bool {
    if increase_buffer {
        angle >= min - buffer && angle <= max + buffer
    } else {
        angle >= min + buffer && angle <= max - buffer
    }
}

/// Classify a movement angle into a quadrant with hysteresis.
///
/// The axis the character is already moving along (forward/backward or
/// left/right) gets its range widened by `buffer`, the other one narrowed.
pub fn calculate_quadrant(
    current: MovementDirection,
    fr_threshold: f32,
    fl_threshold: f32,
    br_threshold: f32,
    bl_threshold: f32,
    buffer: f32,
    angle: f32,
) -> MovementDirection {
    let on_forward_axis = matches!(
        current,
        MovementDirection::Forward | MovementDirection::Backward
    );
    let on_side_axis = !on_forward_axis;

    if angle_in_range(angle, fl_threshold, fr_threshold, buffer, on_forward_axis) {
        return MovementDirection::Forward;
    }
    if angle_in_range(angle, fr_threshold, br_threshold, buffer, on_side_axis) {
        return MovementDirection::Right;
    }
    if angle_in_range(angle, bl_threshold, fl_threshold, buffer, on_side_axis) {
        return MovementDirection::Left;
    }
    MovementDirection::Backward
}

/// Boost diagonal gamepad input so a half-tilted stick still reaches full speed.
///
/// Returns `(forward, right)` for stick axes `(x, y)`.
pub fn fix_diagonal_gamepad_values(x: f32, y: f32) -> (f32, f32) {
    let forward = (x * map_range_clamped((0.0, 0.6), (1.0, 1.2), y.abs())).clamp(-1.0, 1.0);
    let right = (y * map_range_clamped((0.0, 0.6), (1.0, 1.2), x.abs())).clamp(-1.0, 1.0);
    (forward, right)
}
