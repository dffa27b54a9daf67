use rapier3d::parry::{
    query::{self, Ray, RayCast as _, ShapeCastOptions},
    shape::Shape,
};

use nalgebra as na;

use super::types::StaticBody;
use crate::math::{Iso, Vec3};

/// Earliest contact between a query and one body, in world space.
#[derive(Clone, Copy, Debug)]
pub struct BodyHit {
    /// Fraction (0..1) of the tested translation where the hit occurred.
    pub fraction: f32,
    pub point: Vec3,
    /// Outward normal of the body at `point`.
    pub normal: Vec3,
    pub start_penetrating: bool,
}

/// Contact for a shape that already overlaps `body` at `shape_iso`.
fn penetration_at(
    shape_iso: &Iso,
    shape: &dyn Shape,
    body: &StaticBody,
    target: &dyn Shape,
) -> Option<BodyHit> {
    let overlapping = query::intersection_test(shape_iso, shape, &body.pose, target).ok()?;
    if !overlapping {
        return None;
    }
    let contact = query::contact(shape_iso, shape, &body.pose, target, 0.0).ok().flatten();
    let (point, normal) = match contact {
        Some(c) => (c.point2.coords, c.normal2.into_inner()),
        None => (shape_iso.translation.vector, Vec3::z()),
    };
    Some(BodyHit {
        fraction: 0.0,
        point,
        normal,
        start_penetrating: true,
    })
}

/// Sweep `shape` (unrotated, centred at `start`) by `translation` against a single body.
///
/// A zero translation degenerates to an overlap test.
pub fn cast_against_body(
    start: Vec3,
    translation: Vec3,
    shape: &dyn Shape,
    body: &StaticBody,
) -> Option<BodyHit> {
    let target = body.shape.to_shared();
    let start_iso = Iso::translation(start.x, start.y, start.z);

    if let Some(hit) = penetration_at(&start_iso, shape, body, &*target) {
        return Some(hit);
    }
    if translation.norm_squared() <= f32::EPSILON {
        return None;
    }

    let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
    opts.stop_at_penetration = true;
    let hit = query::cast_shapes(
        &start_iso,
        &translation,
        shape,
        &body.pose,
        &na::Vector3::zeros(),
        &*target,
        opts,
    )
    .ok()
    .flatten()?;

    let mut normal = body.pose.rotation * hit.normal2.into_inner();
    if normal.dot(&translation) > 0.0 {
        normal = -normal;
    }
    Some(BodyHit {
        fraction: hit.time_of_impact,
        point: (body.pose * hit.witness2).coords,
        normal,
        start_penetrating: false,
    })
}

/// Cast a ray segment from `origin` along `translation` against a single body.
pub fn ray_against_body(origin: Vec3, translation: Vec3, body: &StaticBody) -> Option<BodyHit> {
    if translation.norm_squared() <= f32::EPSILON {
        return None;
    }
    let target = body.shape.to_shared();
    let ray = Ray::new(na::Point3::from(origin), translation);
    let hit = target.cast_ray_and_get_normal(&body.pose, &ray, 1.0, true)?;
    Some(BodyHit {
        fraction: hit.time_of_impact,
        point: origin + translation * hit.time_of_impact,
        normal: hit.normal,
        start_penetrating: hit.time_of_impact <= 0.0,
    })
}
