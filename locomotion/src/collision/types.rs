/*!
Static shapes and the bodies that place them in a [`StaticWorld`](super::StaticWorld).

Shapes are described in body-local space and positioned by the body's pose,
so re-posing a body moves its shape without rebuilding it.
*/

use nalgebra as na;
use rapier3d::parry::shape::SharedShape;

use super::{CapsuleSpec, ChannelMask, ComponentId};
use crate::math::{Iso, Vec3};

/// Local-space collision shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaticShape {
    /// Solid half-space below the plane through the body origin.
    HalfSpace {
        /// Local-space outward normal.
        normal: Vec3,
    },
    Cuboid {
        half_extents: Vec3,
    },
    Ball {
        radius: f32,
    },
    /// Z-aligned capsule.
    Capsule(CapsuleSpec),
}

impl StaticShape {
    /// Build the parry3d shape used by narrow-phase queries.
    pub fn to_shared(&self) -> SharedShape {
        match *self {
            StaticShape::HalfSpace { normal } => {
                SharedShape::halfspace(na::Unit::new_normalize(normal))
            }
            StaticShape::Cuboid { half_extents } => {
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            StaticShape::Ball { radius } => SharedShape::ball(radius),
            StaticShape::Capsule(dims) => {
                SharedShape::capsule_z(dims.half_height_without_hemisphere(), dims.radius)
            }
        }
    }
}

/// A shape placed in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticBody {
    pub component: ComponentId,
    pub pose: Iso,
    pub shape: StaticShape,
    /// Channels this body blocks.
    pub channels: ChannelMask,
}
