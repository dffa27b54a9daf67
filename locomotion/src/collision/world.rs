use log::trace;
use rapier3d::parry::shape::{Ball, Capsule};

use super::narrow_phase::{BodyHit, cast_against_body, ray_against_body};
use super::types::{StaticBody, StaticShape};
use super::{ChannelMask, CollisionChannel, CollisionWorld, ComponentId, QueryHit, QueryShape};
use crate::math::{Iso, Vec3};

/// A scene of static (but re-posable) bodies answering locomotion queries.
#[derive(Clone, Debug, Default)]
pub struct StaticWorld {
    bodies: Vec<StaticBody>,
    next_component: u32,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body as its own component and return the component id.
    pub fn add(&mut self, pose: Iso, shape: StaticShape, channels: ChannelMask) -> ComponentId {
        let component = ComponentId(self.next_component);
        self.next_component += 1;
        self.bodies.push(StaticBody {
            component,
            pose,
            shape,
            channels,
        });
        component
    }

    /// Infinite floor at `height`, blocking every channel.
    pub fn add_ground(&mut self, height: f32) -> ComponentId {
        self.add(
            Iso::translation(0.0, 0.0, height),
            StaticShape::HalfSpace { normal: Vec3::z() },
            ChannelMask::all(),
        )
    }

    /// Axis-aligned box blocking every channel.
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> ComponentId {
        self.add(
            Iso::translation(center.x, center.y, center.z),
            StaticShape::Cuboid { half_extents },
            ChannelMask::all(),
        )
    }

    /// Move every body of `component`. Returns `false` for an unknown component.
    pub fn set_component_pose(&mut self, component: ComponentId, pose: Iso) -> bool {
        let mut found = false;
        for body in self.bodies.iter_mut().filter(|b| b.component == component) {
            body.pose = pose;
            found = true;
        }
        found
    }

    pub fn remove_component(&mut self, component: ComponentId) {
        self.bodies.retain(|b| b.component != component);
    }

    pub fn bodies(&self) -> &[StaticBody] {
        &self.bodies
    }

    fn nearest(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        mut cast: impl FnMut(&StaticBody) -> Option<BodyHit>,
    ) -> Option<QueryHit> {
        let delta = end - start;
        let mut best: Option<(BodyHit, ComponentId)> = None;
        for body in self.bodies.iter().filter(|b| b.channels.has(channel)) {
            if let Some(hit) = cast(body)
                && best.as_ref().is_none_or(|(b, _)| hit.fraction < b.fraction)
            {
                best = Some((hit, body.component));
            }
        }
        let (hit, component) = best?;
        trace!(
            "query {:?} hit component {:?} at t={:.3}",
            channel, component, hit.fraction
        );
        Some(QueryHit {
            location: start + delta * hit.fraction,
            impact_point: hit.point,
            impact_normal: hit.normal,
            distance: delta.norm() * hit.fraction,
            time: hit.fraction,
            trace_start: start,
            trace_end: end,
            start_penetrating: hit.start_penetrating,
            component,
        })
    }
}

impl CollisionWorld for StaticWorld {
    fn sweep(
        &self,
        start: Vec3,
        end: Vec3,
        shape: QueryShape,
        channel: CollisionChannel,
    ) -> Option<QueryHit> {
        let translation = end - start;
        match shape {
            QueryShape::Capsule(probe) => {
                let capsule = Capsule::new_z(probe.half_height_without_hemisphere(), probe.radius);
                self.nearest(start, end, channel, |body| {
                    cast_against_body(start, translation, &capsule, body)
                })
            }
            QueryShape::Sphere { radius } => {
                let ball = Ball::new(radius);
                self.nearest(start, end, channel, |body| {
                    cast_against_body(start, translation, &ball, body)
                })
            }
        }
    }

    fn line_trace(&self, start: Vec3, end: Vec3, channel: CollisionChannel) -> Option<QueryHit> {
        let translation = end - start;
        self.nearest(start, end, channel, |body| ray_against_body(start, translation, body))
    }

    fn component_to_world(&self, component: ComponentId) -> Option<Iso> {
        self.bodies
            .iter()
            .find(|b| b.component == component)
            .map(|b| b.pose)
    }
}
