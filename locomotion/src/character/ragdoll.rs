//! Ragdoll on and off, and keeping the capsule with the simulated body.

use log::debug;

use super::Character;
use crate::anim::AnimationConsumer;
use crate::collision::CollisionWorld;
use crate::constants::{
    PELVIS_BONE, RAGDOLL_GRAVITY_CUTOFF_Z, RAGDOLL_GROUND_MARGIN, RAGDOLL_MONTAGE_BLEND_OUT,
    RAGDOLL_POSE_SNAPSHOT, RAGDOLL_PULL_INTERP_SPEED, RAGDOLL_PULL_TARGET, RAGDOLL_SPINE_PULL_SPEED,
    RAGDOLL_SPRING_RANGE, RAGDOLL_SPRING_VELOCITY_RANGE, ROOT_BONE, SPINE_BONE,
};
use crate::host::{AnimTickOption, CollisionEnabled, LocomotionHost, MeshObjectType};
use crate::math::{Rotator, Vec3, finterp_to, map_range_clamped, normalize_axis};
use crate::net::RemoteCall;
use crate::state::{MovementMode, MovementState};

impl<H: LocomotionHost> Character<H> {
    pub(super) fn ragdoll_start(&mut self) {
        self.host.set_ignore_client_movement_error_checks(true);

        // A dedicated server renders nothing but still has to pose the body.
        if self.net.is_dedicated_server() {
            self.state.ragdoll.saved_tick_option = Some(self.host.anim_tick_option());
            self.host
                .set_anim_tick_option(AnimTickOption::AlwaysTickPoseAndRefreshBones);
        }

        let pelvis = self.host.socket_location(PELVIS_BONE);
        self.set_movement_mode(MovementMode::None);
        self.set_movement_state(MovementState::Ragdoll);
        self.state.ragdoll.target_location = pelvis;
        self.state.ragdoll.server_pull = 0.0;

        self.host.set_capsule_collision(CollisionEnabled::NoCollision);
        self.host
            .set_mesh_collision(MeshObjectType::PhysicsBody, CollisionEnabled::QueryAndPhysics);
        self.host.set_bodies_below_simulate_physics(PELVIS_BONE, true);

        if let Some(anim) = self.host.anim_mut() {
            anim.montage_stop(RAGDOLL_MONTAGE_BLEND_OUT);
        }
        self.host.set_replicate_movement(false);
        debug!("ragdoll start at {pelvis:?}");
    }

    pub(super) fn ragdoll_update(&mut self, dt: f32) {
        let velocity = self.host.bone_linear_velocity(ROOT_BONE);
        let ragdoll = &mut self.state.ragdoll;
        ragdoll.last_velocity = if velocity != Vec3::zeros() || self.net.locally_controlled {
            velocity
        } else {
            ragdoll.last_velocity / 2.0
        };
        let last_velocity = ragdoll.last_velocity;

        // Faster bodies get stiffer joints.
        let spring = map_range_clamped(
            RAGDOLL_SPRING_VELOCITY_RANGE,
            RAGDOLL_SPRING_RANGE,
            last_velocity.norm(),
        );
        self.host.set_all_motors_angular_drive(spring, 0.0, 0.0);
        self.host
            .set_mesh_gravity_enabled(last_velocity.z > RAGDOLL_GRAVITY_CUTOFF_Z);

        self.set_actor_location_during_ragdoll(dt);
    }

    /// Move the capsule to follow the pelvis.
    ///
    /// The owning copy samples the pelvis and reports it to the server; every
    /// other copy pulls its simulated body toward the reported location.
    pub fn set_actor_location_during_ragdoll(&mut self, dt: f32) {
        if self.net.locally_controlled {
            let pelvis = self.host.socket_location(PELVIS_BONE);
            self.state.ragdoll.target_location = pelvis;
            if !self.net.is_authority() {
                self.call_server(RemoteCall::ServerSetMeshLocationDuringRagdoll(pelvis));
            }
        }

        let pelvis_rotation = self.host.socket_rotation(PELVIS_BONE);
        let face_up = pelvis_rotation.roll < 0.0;
        let yaw = if face_up {
            normalize_axis(pelvis_rotation.yaw - 180.0)
        } else {
            pelvis_rotation.yaw
        };
        let target_rotation = Rotator::from_yaw(yaw);

        let target = self.state.ragdoll.target_location;
        let half_height = self.host.capsule().half_height;
        let trace_end = Vec3::new(target.x, target.y, target.z - half_height);
        let ground = self
            .host
            .world()
            .line_trace(target, trace_end, self.config.world.visibility_channel)
            .filter(|hit| hit.is_valid_blocking_hit());

        let mut location = target;
        if let Some(hit) = &ground {
            let impact_distance = (hit.impact_point.z - hit.trace_start.z).abs();
            location.z += half_height - impact_distance + RAGDOLL_GROUND_MARGIN;
        }

        let ragdoll = &mut self.state.ragdoll;
        ragdoll.face_up = face_up;
        ragdoll.on_ground = ground.is_some();

        if !self.net.locally_controlled {
            ragdoll.server_pull = finterp_to(
                ragdoll.server_pull,
                RAGDOLL_PULL_TARGET,
                dt,
                RAGDOLL_PULL_INTERP_SPEED,
            );
            let planar_speed = ragdoll.last_velocity.xy().norm();
            let bone = if planar_speed > RAGDOLL_SPINE_PULL_SPEED {
                SPINE_BONE
            } else {
                PELVIS_BONE
            };
            let pull = ragdoll.server_pull;
            let force = (target - self.host.socket_location(bone)) * pull;
            self.host.add_force_to_bone(force, bone, true);
        }

        self.set_actor_location_and_target_rotation(location, target_rotation);
    }

    pub(super) fn ragdoll_end(&mut self) {
        let ragdoll = self.state.ragdoll;
        if self.net.is_dedicated_server() {
            if let Some(option) = ragdoll.saved_tick_option {
                self.host.set_anim_tick_option(option);
            }
        }
        self.host.set_ignore_client_movement_error_checks(false);
        self.host.set_replicate_movement(true);

        if let Some(anim) = self.host.anim_mut() {
            anim.save_pose_snapshot(RAGDOLL_POSE_SNAPSHOT);
        }

        if ragdoll.on_ground {
            self.set_movement_mode(MovementMode::Walking);
            let montage = self.policy.get_up_animation(&self.config.ragdoll, ragdoll.face_up);
            if !montage.is_empty() {
                if let Some(anim) = self.host.anim_mut() {
                    anim.montage_play(&montage, 1.0, 0.0);
                }
            }
        } else {
            self.set_movement_mode(MovementMode::Falling);
            self.host.set_velocity(ragdoll.last_velocity);
        }

        self.host.set_capsule_collision(CollisionEnabled::QueryAndPhysics);
        self.host
            .set_mesh_collision(MeshObjectType::Pawn, CollisionEnabled::QueryOnly);
        self.host.set_all_bodies_simulate_physics(false);
        debug!(
            "ragdoll end ({}, {})",
            if ragdoll.on_ground { "on ground" } else { "in air" },
            if ragdoll.face_up { "face up" } else { "face down" }
        );
    }
}
