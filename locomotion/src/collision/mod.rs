/*!
Collision query contract used by the locomotion core, plus a parry3d-backed
static world that implements it.

The core never talks to a physics engine directly. Every geometric probe
(mantle sweeps, ragdoll ground trace, flight altitude checks) goes through
[`CollisionWorld`]. Hosts embedded in a full engine implement the trait over
their own scene; tests and headless tools use [`StaticWorld`].

- types:        static shapes and bodies
- narrow_phase: thin wrappers over parry3d shape casts, contacts and rays
- world:        `StaticWorld`, the channel-filtered scene of static bodies
*/

pub mod narrow_phase;
pub mod types;
pub mod world;

use serde::Deserialize;

use crate::bitmask_flags::BitmaskFlags;
use crate::math::{Iso, Vec3};

pub use types::{StaticBody, StaticShape};
pub use world::StaticWorld;

crate::define_bitmask_flags!(CollisionChannel, u32, {
    WorldStatic,
    WorldDynamic,
    Pawn,
    Visibility,
    Camera,
    PhysicsBody,
    Climbable,
});

/// Set of channels a body blocks.
pub type ChannelMask = BitmaskFlags<u32>;

/// Identifies the scene component a body belongs to.
///
/// Mantle targets are stored relative to the component they were found on,
/// so a component that moves carries the target with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ComponentId(pub u32);

/// Upright (Z-aligned) capsule.
///
/// `half_height` is the total half height including the hemisphere, so a
/// capsule of radius 35 and half height 90 is 180 units tall.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    pub const fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
        }
    }

    /// Half length of the cylindrical section.
    #[inline]
    pub fn half_height_without_hemisphere(&self) -> f32 {
        (self.half_height - self.radius).max(0.0)
    }
}

/// Shape swept through the world by a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QueryShape {
    Capsule(CapsuleSpec),
    Sphere { radius: f32 },
}

/// Nearest blocking result of a sweep or trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryHit {
    /// Position of the swept shape's centre at impact.
    pub location: Vec3,
    /// Contact point on the surface that was hit.
    pub impact_point: Vec3,
    /// Outward surface normal of the body that was hit.
    pub impact_normal: Vec3,
    pub distance: f32,
    /// Fraction of the trace travelled, in `[0, 1]`.
    pub time: f32,
    pub trace_start: Vec3,
    pub trace_end: Vec3,
    /// The shape already overlapped the body at the start of the trace.
    pub start_penetrating: bool,
    pub component: ComponentId,
}

impl QueryHit {
    /// A blocking hit that did not start inside the body.
    #[inline]
    pub fn is_valid_blocking_hit(&self) -> bool {
        !self.start_penetrating
    }
}

/// Whether a character could stand on the surface that was hit.
pub fn is_walkable(hit: &QueryHit, walkable_floor_z: f32) -> bool {
    hit.is_valid_blocking_hit()
        && hit.impact_normal.z >= f32::EPSILON
        && hit.impact_normal.z >= walkable_floor_z
}

/// Geometric queries the locomotion core needs from its scene.
///
/// Implementations report only blocking hits and exclude the querying
/// character's own collision.
pub trait CollisionWorld {
    fn sweep(
        &self,
        start: Vec3,
        end: Vec3,
        shape: QueryShape,
        channel: CollisionChannel,
    ) -> Option<QueryHit>;

    fn line_trace(&self, start: Vec3, end: Vec3, channel: CollisionChannel) -> Option<QueryHit>;

    /// Current world pose of a component, `None` once it no longer exists.
    fn component_to_world(&self, component: ComponentId) -> Option<Iso>;
}
